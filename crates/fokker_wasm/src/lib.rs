//! WASM bindings for the Fokker core library.
//!
//! `WasmSimulation` wraps a single grid and trap for one-shot queries, while
//! `WasmPropagationRunner` produces trajectory frames in batches so the UI can
//! report progress between calls.

mod runner;
mod simulation;
mod utils;

pub use runner::WasmPropagationRunner;
pub use simulation::WasmSimulation;
pub use utils::{gaussian_density, value_to_vector};
