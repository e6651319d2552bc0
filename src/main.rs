//! # Voxel Streaming Demo Entry Point
//!
//! Calls into the library's `run()` function, which walks an observer through a
//! procedurally generated world and saves it on exit.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- world.json
//! ```

fn main() {
    if let Err(error) = voxel_streaming::run() {
        log::error!("{}", error);
        eprintln!("voxel-streaming: {}", error);
        std::process::exit(1);
    }
}
