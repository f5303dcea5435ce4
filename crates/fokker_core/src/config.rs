//! Simulation parameters, integration settings and named experiment presets.

use crate::boundary::Boundary;
use crate::broadcast::ParamValue;
use crate::pdf::{gaussian_pdf, GaussianPdf};
use crate::physics::{stokes_drag, NANOMETER};
use crate::potential::harmonic_potential;
use crate::simulation::{FokkerPlanck, Interval};
use crate::trajectory::Trajectory;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Physical setup of a Fokker-Planck run. Vector-valued fields may be given
/// once for all axes; `extent` fixes the dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub temperature: f64,
    pub drag: ParamValue<f64>,
    pub extent: ParamValue<f64>,
    pub resolution: ParamValue<f64>,
    #[serde(default = "default_boundary")]
    pub boundary: ParamValue<Boundary>,
}

fn default_boundary() -> ParamValue<Boundary> {
    ParamValue::Scalar(Boundary::Reflecting)
}

/// Controls RK4 substepping during propagation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropagationSettings {
    /// Largest `h * spectral_bound` allowed per substep.
    pub stability: f64,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self { stability: 2.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicSpec {
    pub center: ParamValue<f64>,
    pub stiffness: ParamValue<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianSpec {
    pub center: ParamValue<f64>,
    pub width: ParamValue<f64>,
}

/// A complete experiment: trap, starting distribution and time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub potential: Option<HarmonicSpec>,
    pub initial: GaussianSpec,
    pub duration: f64,
    pub steps: usize,
    #[serde(default = "default_normalize")]
    pub normalize: bool,
    #[serde(default)]
    pub propagation: PropagationSettings,
}

fn default_normalize() -> bool {
    true
}

/// Drag on a 2 nm radius particle in water, the particle used by every preset.
fn water_drag() -> f64 {
    stokes_drag(1e-3, 20e-10)
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse scenario JSON.")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize scenario.")
    }

    pub fn build(&self) -> Result<FokkerPlanck> {
        let potential = match &self.potential {
            Some(spec) => Some(harmonic_potential(spec.center.clone(), spec.stiffness.clone())?),
            None => None,
        };
        let simulation = FokkerPlanck::new(
            &self.simulation,
            potential.as_ref().map(|u| u as &dyn crate::potential::Potential),
            None,
        )?;
        Ok(simulation.with_settings(self.propagation))
    }

    pub fn initial_pdf(&self) -> Result<GaussianPdf> {
        Ok(gaussian_pdf(self.initial.center.clone(), self.initial.width.clone())?)
    }

    pub fn run(&self) -> Result<Trajectory> {
        let simulation = self
            .build()
            .with_context(|| format!("Failed to build scenario '{}'.", self.name))?;
        let pdf = self.initial_pdf()?;
        simulation.propagate_interval(&pdf, self.duration, Interval::Steps(self.steps), self.normalize)
    }

    /// 1-D trap at −75 nm on a 350 nm box with 1 nm cells.
    pub fn harmonic_1d() -> Self {
        Self {
            name: "harmonic_1d".to_string(),
            simulation: SimulationConfig {
                temperature: 300.0,
                drag: ParamValue::Scalar(water_drag()),
                extent: ParamValue::Scalar(350.0 * NANOMETER),
                resolution: ParamValue::Scalar(1.0 * NANOMETER),
                boundary: default_boundary(),
            },
            potential: Some(HarmonicSpec {
                center: ParamValue::Scalar(-75.0 * NANOMETER),
                stiffness: ParamValue::Scalar(3e-7),
            }),
            initial: GaussianSpec {
                center: ParamValue::Scalar(75.0 * NANOMETER),
                width: ParamValue::Scalar(50.0 * NANOMETER),
            },
            duration: 2e-4,
            steps: 200,
            normalize: false,
            propagation: PropagationSettings::default(),
        }
    }

    /// 2-D trap at (50, 50) nm on a 200 nm square with 2 nm cells.
    pub fn harmonic_2d() -> Self {
        Self {
            name: "harmonic_2d".to_string(),
            simulation: SimulationConfig {
                temperature: 300.0,
                drag: ParamValue::Scalar(water_drag()),
                extent: ParamValue::Vector(vec![200.0 * NANOMETER, 200.0 * NANOMETER]),
                resolution: ParamValue::Scalar(2.0 * NANOMETER),
                boundary: default_boundary(),
            },
            potential: Some(HarmonicSpec {
                center: ParamValue::Vector(vec![50.0 * NANOMETER, 50.0 * NANOMETER]),
                stiffness: ParamValue::Scalar(0.2e-5),
            }),
            initial: GaussianSpec {
                center: ParamValue::Vector(vec![-50.0 * NANOMETER, -50.0 * NANOMETER]),
                width: ParamValue::Scalar(30.0 * NANOMETER),
            },
            duration: 3e-5,
            steps: 100,
            normalize: false,
            propagation: PropagationSettings::default(),
        }
    }

    /// 2-D trap at the origin on 10 nm cells, run until it has relaxed.
    pub fn harmonic_2d_coarse() -> Self {
        Self {
            name: "harmonic_2d_coarse".to_string(),
            simulation: SimulationConfig {
                temperature: 300.0,
                drag: ParamValue::Scalar(water_drag()),
                extent: ParamValue::Vector(vec![200.0 * NANOMETER, 200.0 * NANOMETER]),
                resolution: ParamValue::Scalar(10.0 * NANOMETER),
                boundary: default_boundary(),
            },
            potential: Some(HarmonicSpec {
                center: ParamValue::Vector(vec![0.0, 0.0]),
                stiffness: ParamValue::Scalar(3e-7),
            }),
            initial: GaussianSpec {
                center: ParamValue::Vector(vec![-75.0 * NANOMETER, -75.0 * NANOMETER]),
                width: ParamValue::Scalar(30.0 * NANOMETER),
            },
            duration: 2e-3,
            steps: 200,
            normalize: true,
            propagation: PropagationSettings::default(),
        }
    }
}
