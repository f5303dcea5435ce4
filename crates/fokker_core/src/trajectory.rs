//! Time series of probability fields and their JSON persistence.

use crate::error::PersistenceError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Frames of a propagated density. `frames[k]` is the row-major field at `times[k]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub shape: Vec<usize>,
    pub frames: Vec<Vec<f64>>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&[f64]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    pub fn last_frame(&self) -> Option<&[f64]> {
        self.frames.last().map(Vec::as_slice)
    }

    pub fn total_probability(&self, index: usize) -> Option<f64> {
        self.frame(index).map(|frame| frame.iter().sum())
    }

    /// Largest value over all frames; `0` for an empty trajectory.
    pub fn max_value(&self) -> f64 {
        self.frames
            .iter()
            .flat_map(|frame| frame.iter().copied())
            .fold(0.0, f64::max)
    }

    /// Checks that times, frames and shape agree with each other.
    pub fn validate(&self) -> Result<(), PersistenceError> {
        if self.times.len() != self.frames.len() {
            return Err(PersistenceError::InvalidTrajectory(format!(
                "{} times for {} frames",
                self.times.len(),
                self.frames.len()
            )));
        }
        let cells: usize = self.shape.iter().product();
        if let Some(k) = self.frames.iter().position(|frame| frame.len() != cells) {
            return Err(PersistenceError::InvalidTrajectory(format!(
                "frame {} has {} values, shape {:?} needs {}",
                k,
                self.frames[k].len(),
                self.shape,
                cells
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, PersistenceError> {
        let trajectory: Trajectory = serde_json::from_str(text)?;
        trajectory.validate()?;
        Ok(trajectory)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let reader = BufReader::new(File::open(path)?);
        let trajectory: Trajectory = serde_json::from_reader(reader)?;
        trajectory.validate()?;
        Ok(trajectory)
    }
}
