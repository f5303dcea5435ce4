//! Fokker-Planck propagation of probability densities on a grid.

use crate::boundary::Boundary;
use crate::broadcast::value_to_vector;
use crate::config::{PropagationSettings, SimulationConfig};
use crate::grid::Grid;
use crate::master::{FieldSamples, MasterEquation};
use crate::pdf::DensityFunction;
use crate::physics::{beta, diffusion_coefficient};
use crate::potential::{ForceField, Potential};
use crate::solvers::{substeps_for, RK4, RK4_DISK_STABILITY};
use crate::trajectory::Trajectory;
use anyhow::{anyhow, bail, Context, Result};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Largest grid for which the steady state is obtained by a dense solve.
/// Larger grids fall back to Gauss-Seidel sweeps on the sparse generator.
pub const DENSE_STEADY_STATE_LIMIT: usize = 4096;

/// L1 change per sweep below which the iterative steady state is accepted.
pub const STEADY_STATE_TOLERANCE: f64 = 1e-13;

pub const MAX_STEADY_STATE_SWEEPS: usize = 200_000;

/// Upper bound on the number of frames a single propagation may produce.
pub const MAX_FRAMES: usize = 1_000_000;

/// How frames of a propagated trajectory are spaced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    /// Exactly this many frames, including the initial one.
    Steps(usize),
    /// Frame count `ceil(duration / dt)`.
    Dt(f64),
}

impl Interval {
    pub fn frame_count(self, duration: f64) -> Result<usize> {
        let frames = match self {
            Interval::Steps(steps) => steps as f64,
            Interval::Dt(dt) => {
                if !(dt.is_finite() && dt > 0.0) {
                    bail!("dt must be positive and finite.");
                }
                (duration / dt).ceil()
            }
        };
        if frames > MAX_FRAMES as f64 {
            bail!("Propagation would need {} frames (limit {}).", frames, MAX_FRAMES);
        }
        if !(frames >= 1.0) {
            bail!("Propagation needs at least one frame.");
        }
        Ok(frames as usize)
    }
}

/// `n` evenly spaced samples on `[start, stop]`, endpoint included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|k| if k + 1 == n { stop } else { start + k as f64 * step })
                .collect()
        }
    }
}

/// Overdamped particle in a potential and/or force field, discretized on a grid.
pub struct FokkerPlanck {
    temperature: f64,
    beta: f64,
    drag: Vec<f64>,
    diffusion: Vec<f64>,
    boundaries: Vec<Boundary>,
    potential_values: Option<Vec<f64>>,
    force_values: Option<Vec<Vec<f64>>>,
    master: MasterEquation,
    settings: PropagationSettings,
}

impl FokkerPlanck {
    pub fn new(
        config: &SimulationConfig,
        potential: Option<&dyn Potential>,
        force: Option<&dyn ForceField>,
    ) -> Result<Self> {
        if !(config.temperature.is_finite() && config.temperature > 0.0) {
            bail!("temperature must be positive and finite.");
        }
        let extent = config.extent.to_vec();
        let ndim = extent.len();
        let resolution = value_to_vector(config.resolution.clone(), ndim)
            .context("Invalid resolution.")?;
        let drag = value_to_vector(config.drag.clone(), ndim).context("Invalid drag.")?;
        if drag.iter().any(|d| !(d.is_finite() && *d > 0.0)) {
            bail!("drag must be positive and finite.");
        }
        let boundaries =
            value_to_vector(config.boundary.clone(), ndim).context("Invalid boundary.")?;
        let grid = Grid::new(&extent, &resolution)?;

        let temperature = config.temperature;
        let beta = beta(temperature);
        let diffusion: Vec<f64> = drag
            .iter()
            .map(|&d| diffusion_coefficient(temperature, d))
            .collect();

        let n = grid.len();
        let mut point = vec![0.0; ndim];

        let potential_values = potential.map(|u| {
            (0..n)
                .map(|x| {
                    grid.point(x, &mut point);
                    u.energy(&point)
                })
                .collect::<Vec<f64>>()
        });
        if let Some(values) = &potential_values {
            if values.iter().any(|v| !v.is_finite()) {
                bail!("Potential must be finite on every grid cell.");
            }
        }

        let force_values = match force {
            Some(field) => {
                if field.ndim() != ndim {
                    bail!(
                        "Force field dimension mismatch. Expected {}, got {}.",
                        ndim,
                        field.ndim()
                    );
                }
                let mut values = vec![vec![0.0; n]; ndim];
                let mut out = vec![0.0; ndim];
                for x in 0..n {
                    grid.point(x, &mut point);
                    field.force(&point, &mut out);
                    for axis in 0..ndim {
                        values[axis][x] = out[axis];
                    }
                }
                Some(values)
            }
            None => None,
        };

        let fields = FieldSamples {
            potential: potential_values.as_deref(),
            force: force_values.as_deref(),
        };
        let master = MasterEquation::new(grid, &diffusion, beta, fields, &boundaries)?;

        Ok(Self {
            temperature,
            beta,
            drag,
            diffusion,
            boundaries,
            potential_values,
            force_values,
            master,
            settings: PropagationSettings::default(),
        })
    }

    pub fn with_settings(mut self, settings: PropagationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> PropagationSettings {
        self.settings
    }

    pub fn grid(&self) -> &Grid {
        self.master.grid()
    }

    pub fn ndim(&self) -> usize {
        self.grid().ndim()
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn drag(&self) -> &[f64] {
        &self.drag
    }

    pub fn diffusion(&self) -> &[f64] {
        &self.diffusion
    }

    pub fn mobility(&self) -> Vec<f64> {
        self.drag.iter().map(|d| 1.0 / d).collect()
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    pub fn potential_values(&self) -> Option<&[f64]> {
        self.potential_values.as_deref()
    }

    pub fn master(&self) -> &MasterEquation {
        &self.master
    }

    /// Stationary distribution, normalized to unit sum.
    pub fn steady_state(&self) -> Result<Vec<f64>> {
        let n = self.grid().len();
        let detailed_balance = self.force_values.is_none()
            && self.boundaries.iter().all(|b| *b == Boundary::Reflecting);

        let mut steady: Vec<f64> = if detailed_balance {
            self.boltzmann_weights()
        } else if n > DENSE_STEADY_STATE_LIMIT {
            let guess = self.boltzmann_weights();
            self.master
                .stationary_gauss_seidel(&guess, STEADY_STATE_TOLERANCE, MAX_STEADY_STATE_SWEEPS)
                .context("Sparse steady-state solve failed.")?
        } else {
            // Row 0 becomes the normalization constraint, scaled to the rates.
            let scale = self.master.max_exit_rate().max(1.0);
            let mut dense = self.master.to_dense();
            for j in 0..n {
                dense[(0, j)] = scale;
            }
            let mut rhs = DVector::zeros(n);
            rhs[0] = scale;
            let solution = dense
                .lu()
                .solve(&rhs)
                .ok_or_else(|| anyhow!("Master matrix is singular; steady state is not unique."))?;
            solution.iter().map(|v| v.max(0.0)).collect::<Vec<f64>>()
        };

        let total: f64 = steady.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            bail!("Steady state could not be normalized (sum = {}).", total);
        }
        for value in &mut steady {
            *value /= total;
        }
        Ok(steady)
    }

    /// Unnormalized `exp(−βU)`, shifted so the deepest cell has weight one.
    fn boltzmann_weights(&self) -> Vec<f64> {
        match &self.potential_values {
            Some(u) => {
                let u_min = u.iter().cloned().fold(f64::INFINITY, f64::min);
                u.iter().map(|e| (-self.beta * (e - u_min)).exp()).collect()
            }
            None => vec![1.0; self.grid().len()],
        }
    }

    /// Samples `pdf` on the grid, optionally scaling it to unit sum.
    pub fn initial_state(&self, pdf: &dyn DensityFunction, normalize: bool) -> Result<Vec<f64>> {
        if pdf.ndim() != self.ndim() {
            bail!(
                "Initial density dimension mismatch. Expected {}, got {}.",
                self.ndim(),
                pdf.ndim()
            );
        }
        let coordinates = self.grid().coordinates();
        let refs: Vec<&[f64]> = coordinates.iter().map(Vec::as_slice).collect();
        let p0 = pdf.evaluate(&refs)?;
        self.prepare_state(p0, normalize)
    }

    fn prepare_state(&self, mut p0: Vec<f64>, normalize: bool) -> Result<Vec<f64>> {
        let n = self.grid().len();
        if p0.len() != n {
            bail!("Initial state length ({}) does not match grid size ({}).", p0.len(), n);
        }
        if p0.iter().any(|v| !v.is_finite()) {
            bail!("Initial state contains non-finite values.");
        }
        if normalize {
            let total: f64 = p0.iter().sum();
            if total <= 0.0 {
                bail!("Initial state cannot be normalized (sum = {}).", total);
            }
            for value in &mut p0 {
                *value /= total;
            }
        }
        Ok(p0)
    }

    /// Advances `state` in place by `span` seconds.
    pub fn advance(&self, solver: &mut RK4<f64>, state: &mut [f64], span: f64) {
        let substeps = substeps_for(span, self.master.spectral_bound(), self.settings.stability);
        let mut t = 0.0;
        solver.advance(&self.master, &mut t, state, span, substeps);
    }

    /// Density at `time` starting from `pdf`.
    pub fn propagate(
        &self,
        pdf: &dyn DensityFunction,
        time: f64,
        normalize: bool,
    ) -> Result<Vec<f64>> {
        if !(time.is_finite() && time >= 0.0) {
            bail!("Propagation time must be non-negative and finite.");
        }
        self.validate_settings()?;
        let mut state = self.initial_state(pdf, normalize)?;
        let mut solver = RK4::new(state.len());
        self.advance(&mut solver, &mut state, time);
        Ok(state)
    }

    /// Frames at `linspace(0, duration, frames)` starting from `pdf`.
    pub fn propagate_interval(
        &self,
        pdf: &dyn DensityFunction,
        duration: f64,
        interval: Interval,
        normalize: bool,
    ) -> Result<Trajectory> {
        let p0 = self.initial_state(pdf, normalize)?;
        self.propagate_interval_from(p0, duration, interval, false)
    }

    /// Same as [`propagate_interval`](Self::propagate_interval) for a sampled initial state.
    pub fn propagate_interval_from(
        &self,
        p0: Vec<f64>,
        duration: f64,
        interval: Interval,
        normalize: bool,
    ) -> Result<Trajectory> {
        let mut runner = PropagationRunner::new(self, p0, duration, interval, normalize)?;
        runner.run_frames(self, usize::MAX)?;
        Ok(runner.into_trajectory())
    }

    pub fn probability_current(&self, p: &[f64]) -> Result<Vec<Vec<f64>>> {
        self.master.probability_current(p)
    }

    fn validate_settings(&self) -> Result<()> {
        let stability = self.settings.stability;
        if !(stability > 0.0 && stability <= RK4_DISK_STABILITY) {
            bail!(
                "stability must lie in (0, {}], got {}.",
                RK4_DISK_STABILITY,
                stability
            );
        }
        Ok(())
    }
}

/// Snapshot of a frame-by-frame propagation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropagationProgress {
    pub done: bool,
    pub frames_done: usize,
    pub total_frames: usize,
    pub time: f64,
    pub total_probability: f64,
}

/// Resumable propagation that produces trajectory frames in batches.
pub struct PropagationRunner {
    times: Vec<f64>,
    frames: Vec<Vec<f64>>,
    state: Vec<f64>,
    shape: Vec<usize>,
    solver: RK4<f64>,
}

impl PropagationRunner {
    pub fn new(
        simulation: &FokkerPlanck,
        p0: Vec<f64>,
        duration: f64,
        interval: Interval,
        normalize: bool,
    ) -> Result<Self> {
        if !(duration.is_finite() && duration >= 0.0) {
            bail!("Duration must be non-negative and finite.");
        }
        simulation.validate_settings()?;
        let frame_count = interval.frame_count(duration)?;
        let state = simulation.prepare_state(p0, normalize)?;
        Ok(Self {
            times: linspace(0.0, duration, frame_count),
            frames: vec![state.clone()],
            solver: RK4::new(state.len()),
            state,
            shape: simulation.grid().shape().to_vec(),
        })
    }

    pub fn is_done(&self) -> bool {
        self.frames.len() >= self.times.len()
    }

    /// Computes up to `batch` further frames.
    pub fn run_frames(
        &mut self,
        simulation: &FokkerPlanck,
        batch: usize,
    ) -> Result<PropagationProgress> {
        if simulation.grid().shape() != self.shape.as_slice() {
            bail!("Runner was created for a grid of shape {:?}.", self.shape);
        }
        let mut remaining = batch;
        while remaining > 0 && !self.is_done() {
            let k = self.frames.len();
            let span = self.times[k] - self.times[k - 1];
            simulation.advance(&mut self.solver, &mut self.state, span);
            self.frames.push(self.state.clone());
            remaining -= 1;
        }
        Ok(self.progress())
    }

    pub fn progress(&self) -> PropagationProgress {
        let frames_done = self.frames.len();
        PropagationProgress {
            done: self.is_done(),
            frames_done,
            total_frames: self.times.len(),
            time: self.times[frames_done - 1],
            total_probability: self.state.iter().sum(),
        }
    }

    /// Frames computed so far, with their times.
    pub fn into_trajectory(self) -> Trajectory {
        let mut times = self.times;
        times.truncate(self.frames.len());
        Trajectory {
            times,
            shape: self.shape,
            frames: self.frames,
        }
    }
}
