//! External potentials and force fields acting on the diffusing particle.

use crate::broadcast::{value_to_vector, ParamValue};
use crate::error::ShapeError;
use serde::{Deserialize, Serialize};

/// Potential energy landscape in joules over positions in meters.
pub trait Potential: Send + Sync {
    fn energy(&self, point: &[f64]) -> f64;
}

impl<F> Potential for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn energy(&self, point: &[f64]) -> f64 {
        self(point)
    }
}

/// Non-conservative (or otherwise externally specified) force in newtons.
pub trait ForceField: Send + Sync {
    fn ndim(&self) -> usize;
    fn force(&self, point: &[f64], out: &mut [f64]);
}

/// Quadratic well `½ Σ_i k_i (x_i − c_i)²`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicPotential {
    center: Vec<f64>,
    stiffness: Vec<f64>,
}

impl HarmonicPotential {
    pub fn center(&self) -> &[f64] {
        &self.center
    }

    pub fn stiffness(&self) -> &[f64] {
        &self.stiffness
    }

    pub fn ndim(&self) -> usize {
        self.center.len()
    }

    /// Restoring force `−k_i (x_i − c_i)`.
    pub fn restoring_force(&self, point: &[f64], out: &mut [f64]) {
        for i in 0..self.center.len() {
            out[i] = -self.stiffness[i] * (point[i] - self.center[i]);
        }
    }
}

impl Potential for HarmonicPotential {
    fn energy(&self, point: &[f64]) -> f64 {
        point
            .iter()
            .zip(&self.center)
            .zip(&self.stiffness)
            .map(|((x, c), k)| 0.5 * k * (x - c) * (x - c))
            .sum()
    }
}

pub fn harmonic_potential(
    center: impl Into<ParamValue<f64>>,
    stiffness: impl Into<ParamValue<f64>>,
) -> Result<HarmonicPotential, ShapeError> {
    let center = center.into().to_vec();
    if center.is_empty() {
        return Err(ShapeError::EmptyCenter);
    }
    let stiffness = value_to_vector(stiffness, center.len())?;
    Ok(HarmonicPotential { center, stiffness })
}

/// The same force everywhere, e.g. a tilt on a periodic track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformForce {
    pub force: Vec<f64>,
}

impl ForceField for UniformForce {
    fn ndim(&self) -> usize {
        self.force.len()
    }

    fn force(&self, _point: &[f64], out: &mut [f64]) {
        out.copy_from_slice(&self.force);
    }
}
