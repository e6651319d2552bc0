//! # World Configuration
//!
//! The constants the streaming world consumes are supplied from outside the core:
//! `{chunk_edge, vertical_limit, retention_radius, scheduler_capacity,
//! autosave_interval_seconds}` plus the step delays of the block simulations.
//! Configuration is read from a JSON file; every field is optional and falls back
//! to its default.

use std::{fs, io::ErrorKind, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Externally supplied settings for one world session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Edge length of a cubic chunk, in blocks.
    pub chunk_edge: u32,
    /// Chunks are only built for vertical chunk coordinates in `[0, vertical_limit)`.
    pub vertical_limit: i32,
    /// Build radius and eviction radius, in chunks.
    pub retention_radius: u32,
    /// Maximum number of simultaneously active cooperative tasks.
    pub scheduler_capacity: usize,
    /// Interval between two autosaves of changed chunks.
    pub autosave_interval_seconds: f32,
    /// Settling delay between two liquid flow steps.
    pub flow_step_delay_ms: u64,
    /// Delay between two steps of a falling block.
    pub fall_step_delay_ms: u64,
    /// Directory the file-backed chunk store writes to.
    pub save_directory: PathBuf,
    /// Seed for the procedural terrain.
    pub terrain_seed: u32,
    /// Number of frames the native demo runs before shutting down.
    pub demo_frames: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_edge: 16,
            vertical_limit: 16,
            retention_radius: 4,
            scheduler_capacity: 64,
            autosave_interval_seconds: 10.0,
            flow_step_delay_ms: 1000,
            fall_step_delay_ms: 100,
            save_directory: PathBuf::from("saves"),
            terrain_seed: 0,
            demo_frames: 600,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from a JSON document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    ///
    /// A missing file is not an error: the defaults are returned instead, so a fresh
    /// checkout runs without any setup.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(json) => Self::from_json_str(&json),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                log::info!("No config at {:?}, using defaults", path);
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Rejects values the world cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_edge == 0 || self.chunk_edge > i32::MAX as u32 {
            return Err(ConfigError::Invalid {
                field: "chunk_edge",
                reason: format!("must be a positive block count, got {}", self.chunk_edge),
            });
        }
        if self.vertical_limit <= 0 {
            return Err(ConfigError::Invalid {
                field: "vertical_limit",
                reason: format!("must be positive, got {}", self.vertical_limit),
            });
        }
        if self.scheduler_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "scheduler_capacity",
                reason: "at least one task must be able to run".to_string(),
            });
        }
        if !self.autosave_interval_seconds.is_finite() || self.autosave_interval_seconds <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "autosave_interval_seconds",
                reason: format!("must be positive, got {}", self.autosave_interval_seconds),
            });
        }
        Ok(())
    }

    /// The chunk edge as a signed block count, for coordinate arithmetic.
    pub fn edge(&self) -> i32 {
        self.chunk_edge as i32
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs_f32(self.autosave_interval_seconds)
    }

    pub fn flow_step_delay(&self) -> Duration {
        Duration::from_millis(self.flow_step_delay_ms)
    }

    pub fn fall_step_delay(&self) -> Duration {
        Duration::from_millis(self.fall_step_delay_ms)
    }

    /// Distance from the observer beyond which a chunk is evicted, in blocks.
    pub fn eviction_distance(&self) -> f32 {
        self.retention_radius as f32 * self.chunk_edge as f32
    }
}
