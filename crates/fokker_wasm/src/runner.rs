//! Batched propagation runner.

use crate::simulation::{build_simulation, param_from, to_js_error};
use fokker_core::animation::{plan_animation, AnimationSettings};
use fokker_core::pdf::gaussian_pdf;
use fokker_core::simulation::{FokkerPlanck, Interval, PropagationProgress, PropagationRunner};
use fokker_core::trajectory::Trajectory;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

/// The inner runner is taken once its last frame is computed, leaving the
/// finished trajectory in its place.
#[wasm_bindgen]
pub struct WasmPropagationRunner {
    simulation: FokkerPlanck,
    runner: Option<PropagationRunner>,
    trajectory: Option<Trajectory>,
}

#[wasm_bindgen]
impl WasmPropagationRunner {
    #[wasm_bindgen(constructor)]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        temperature: f64,
        drag: Vec<f64>,
        extent: Vec<f64>,
        resolution: Vec<f64>,
        boundary: &str,
        trap_center: Vec<f64>,
        trap_stiffness: Vec<f64>,
        initial_center: Vec<f64>,
        initial_width: Vec<f64>,
        duration: f64,
        steps: u32,
        normalize: bool,
    ) -> Result<WasmPropagationRunner, JsValue> {
        console_error_panic_hook::set_once();

        let simulation = build_simulation(
            temperature,
            drag,
            extent,
            resolution,
            boundary,
            trap_center,
            trap_stiffness,
        )?;
        let pdf = gaussian_pdf(initial_center, param_from(initial_width))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let p0 = simulation.initial_state(&pdf, normalize).map_err(to_js_error)?;
        let runner = PropagationRunner::new(
            &simulation,
            p0,
            duration,
            Interval::Steps(steps as usize),
            false,
        )
        .map_err(to_js_error)?;

        Ok(WasmPropagationRunner {
            simulation,
            runner: Some(runner),
            trajectory: None,
        })
    }

    pub fn is_done(&self) -> bool {
        self.runner.as_ref().map_or(true, PropagationRunner::is_done)
    }

    pub fn run_steps(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let progress = self.advance(batch_size as usize)?;
        to_value(&progress).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn get_progress(&self) -> Result<JsValue, JsValue> {
        let progress = self.snapshot()?;
        to_value(&progress).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn get_result(&self) -> Result<JsValue, JsValue> {
        let trajectory = self.finished_trajectory()?;
        to_value(trajectory).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn get_animation_plan(&self, fps: f64) -> Result<JsValue, JsValue> {
        let trajectory = self.finished_trajectory()?;
        let settings = AnimationSettings {
            fps,
            ..AnimationSettings::default()
        };
        let plan =
            plan_animation(trajectory, self.simulation.grid(), &settings).map_err(to_js_error)?;
        to_value(&plan).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

impl WasmPropagationRunner {
    fn advance(&mut self, batch: usize) -> Result<PropagationProgress, JsValue> {
        let runner = match self.runner.as_mut() {
            Some(runner) => runner,
            None => return self.finished_progress(),
        };
        let progress = runner
            .run_frames(&self.simulation, batch)
            .map_err(to_js_error)?;

        if progress.done {
            if let Some(runner) = self.runner.take() {
                self.trajectory = Some(runner.into_trajectory());
            }
        }
        Ok(progress)
    }

    fn snapshot(&self) -> Result<PropagationProgress, JsValue> {
        match &self.runner {
            Some(runner) => Ok(runner.progress()),
            None => self.finished_progress(),
        }
    }

    fn finished_progress(&self) -> Result<PropagationProgress, JsValue> {
        let trajectory = self.finished_trajectory()?;
        let last = trajectory.len().saturating_sub(1);
        Ok(PropagationProgress {
            done: true,
            frames_done: trajectory.len(),
            total_frames: trajectory.len(),
            time: trajectory.times.get(last).copied().unwrap_or(0.0),
            total_probability: trajectory.total_probability(last).unwrap_or(0.0),
        })
    }

    fn finished_trajectory(&self) -> Result<&Trajectory, JsValue> {
        self.trajectory
            .as_ref()
            .ok_or_else(|| JsValue::from_str("Propagation has not finished yet."))
    }
}

#[cfg(test)]
mod tests {
    use super::WasmPropagationRunner;

    const NM: f64 = 1e-9;
    const DRAG: f64 = 3.769911184307752e-11;

    fn runner(steps: u32) -> WasmPropagationRunner {
        WasmPropagationRunner::new(
            300.0,
            vec![DRAG],
            vec![100.0 * NM],
            vec![5.0 * NM],
            "reflecting",
            vec![-10.0 * NM],
            vec![3e-6],
            vec![20.0 * NM],
            vec![10.0 * NM],
            1e-5,
            steps,
            true,
        )
        .expect("runner should build")
    }

    #[test]
    fn runner_advances_in_batches_until_done() {
        let mut runner = runner(4);
        assert!(!runner.is_done());

        let progress = runner.advance(2).expect("first batch");
        assert_eq!(progress.frames_done, 3);
        assert!(!progress.done);
        assert!(!runner.is_done());

        let progress = runner.advance(5).expect("second batch");
        assert!(progress.done);
        assert_eq!(progress.frames_done, 4);
        assert!(runner.is_done());

        let trajectory = runner.finished_trajectory().expect("trajectory");
        assert_eq!(trajectory.len(), 4);
        assert!((trajectory.total_probability(3).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn runner_reports_finished_progress_after_completion() {
        let mut runner = runner(2);
        runner.advance(10).expect("run");
        let progress = runner.snapshot().expect("snapshot");
        assert!(progress.done);
        assert_eq!(progress.total_frames, 2);
        assert!((progress.time - 1e-5).abs() < 1e-18);
        let again = runner.advance(1).expect("idempotent");
        assert_eq!(again, progress);
        assert!(runner.runner.is_none());
        assert_eq!(runner.finished_trajectory().expect("trajectory").len(), 2);
    }

    #[cfg(target_arch = "wasm32")]
    #[wasm_bindgen_test::wasm_bindgen_test]
    fn runner_result_requires_completion() {
        let runner = runner(3);
        assert!(runner.get_result().is_err());
    }
}
