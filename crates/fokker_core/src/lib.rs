pub mod animation;
pub mod boundary;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod grid;
pub mod master;
pub mod pdf;
pub mod physics;
pub mod potential;
pub mod simulation;
pub mod solvers;
pub mod trajectory;
/// The `fokker_core` crate provides the numerical engine for Fokker.
/// It evolves the probability density of an overdamped Brownian particle in a
/// potential by integrating a discrete master equation on a regular grid.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `Generator` (right-hand sides), `Steppable` (Solvers).
/// - **Broadcast / Pdf**: scalar-or-vector parameters and closed-form initial densities.
/// - **Master**: sparse transition-rate generator with reflecting or periodic walls.
/// - **Simulation**: steady states, interval propagation and probability currents.
/// - **Trajectory / Animation**: JSON persistence and frame plans for front-ends.
pub mod traits;

pub use broadcast::{value_to_vector, ParamValue};
pub use pdf::{gaussian_pdf, DensityFunction, GaussianPdf};
pub use simulation::{FokkerPlanck, Interval};
