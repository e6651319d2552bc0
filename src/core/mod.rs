//! # Core Module
//!
//! This module provides the fundamental building blocks shared by every part of the
//! streaming world: configuration, error types and the cancellation primitive used
//! by cooperative task trees.
//!
//! ## Key Components
//! - `WorldConfig`: Externally supplied constants (chunk edge, radii, scheduler capacity...)
//! - `CancellationToken`: Shared flag that stops an entire tree of submitted tasks
//! - `VoxelError`: Top-level error wrapping configuration and persistence failures
//!
//! ## Usage
//! ```rust
//! use voxel_streaming::core::{CancellationToken, WorldConfig};
//!
//! let config = WorldConfig::default();
//! assert!(config.validate().is_ok());
//!
//! let token = CancellationToken::new();
//! let child = token.clone();
//! token.cancel();
//! assert!(child.is_cancelled());
//! ```

pub mod cancellation;
pub mod config;
pub mod error;

pub use cancellation::CancellationToken;
pub use config::WorldConfig;
pub use error::{ConfigError, PersistenceError, VoxelError};
