//! Frame plans for surface animations of a trajectory.
//!
//! Rendering and video encoding belong to the front-end; this module decides
//! which frames to show, at what rate, on which axes and with which titles.

use crate::grid::Grid;
use crate::physics::NANOMETER;
use crate::trajectory::Trajectory;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationSettings {
    pub fps: f64,
    /// Show at most this many frames from the start of the trajectory.
    pub frame_limit: Option<usize>,
    /// Axis coordinates are divided by this length before display.
    pub length_unit: f64,
    pub z_limits: Option<(f64, f64)>,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            fps: 15.0,
            frame_limit: None,
            length_unit: NANOMETER,
            z_limits: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceFrame {
    pub index: usize,
    pub time: f64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationPlan {
    pub interval_ms: f64,
    pub axes: Vec<Vec<f64>>,
    pub z_limits: (f64, f64),
    pub frames: Vec<SurfaceFrame>,
}

impl AnimationPlan {
    /// Playback length in seconds.
    pub fn duration(&self) -> f64 {
        self.frames.len() as f64 * self.interval_ms / 1000.0
    }
}

pub fn plan_animation(
    trajectory: &Trajectory,
    grid: &Grid,
    settings: &AnimationSettings,
) -> Result<AnimationPlan> {
    if !(settings.fps.is_finite() && settings.fps > 0.0) {
        bail!("fps must be positive.");
    }
    if !(settings.length_unit.is_finite() && settings.length_unit > 0.0) {
        bail!("length_unit must be positive.");
    }
    if trajectory.shape.as_slice() != grid.shape() {
        bail!(
            "Trajectory shape {:?} does not match grid shape {:?}.",
            trajectory.shape,
            grid.shape()
        );
    }
    if trajectory.is_empty() {
        bail!("Trajectory has no frames to animate.");
    }

    let count = settings
        .frame_limit
        .map_or(trajectory.len(), |limit| limit.min(trajectory.len()));
    let frames = trajectory
        .times
        .iter()
        .take(count)
        .enumerate()
        .map(|(index, &time)| SurfaceFrame {
            index,
            time,
            title: format!("t = {:.2e} s", time),
        })
        .collect();

    let z_limits = match settings.z_limits {
        Some((lo, hi)) => {
            if !(lo < hi) {
                bail!("z_limits must satisfy lower < upper.");
            }
            (lo, hi)
        }
        None => {
            let peak = trajectory.max_value();
            (0.0, if peak > 0.0 { peak } else { 1.0 })
        }
    };

    let axes = grid
        .axes()
        .iter()
        .map(|axis| axis.iter().map(|x| x / settings.length_unit).collect())
        .collect();

    Ok(AnimationPlan {
        interval_ms: 1000.0 / settings.fps,
        axes,
        z_limits,
        frames,
    })
}
