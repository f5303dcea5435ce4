//! Core WASM simulation wrapper and parameter conversion helpers.

use fokker_core::boundary::Boundary;
use fokker_core::broadcast::ParamValue;
use fokker_core::config::SimulationConfig;
use fokker_core::pdf::gaussian_pdf;
use fokker_core::potential::{harmonic_potential, Potential};
use fokker_core::simulation::{FokkerPlanck, Interval};
use js_sys::Float64Array;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmSimulation {
    pub(crate) simulation: FokkerPlanck,
}

/// JS arrays of length one stand for scalars that apply to every axis.
pub(crate) fn param_from(values: Vec<f64>) -> ParamValue<f64> {
    if values.len() == 1 {
        ParamValue::Scalar(values[0])
    } else {
        ParamValue::Vector(values)
    }
}

pub(crate) fn parse_boundary(name: &str) -> Result<Boundary, JsValue> {
    match name {
        "reflecting" => Ok(Boundary::Reflecting),
        "periodic" => Ok(Boundary::Periodic),
        _ => Err(JsValue::from_str("Unknown boundary")),
    }
}

pub(crate) fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

/// Builds a simulation with an optional harmonic trap (empty `trap_center` means none).
#[allow(clippy::too_many_arguments)]
pub(crate) fn build_simulation(
    temperature: f64,
    drag: Vec<f64>,
    extent: Vec<f64>,
    resolution: Vec<f64>,
    boundary: &str,
    trap_center: Vec<f64>,
    trap_stiffness: Vec<f64>,
) -> Result<FokkerPlanck, JsValue> {
    let config = SimulationConfig {
        temperature,
        drag: param_from(drag),
        extent: ParamValue::Vector(extent),
        resolution: param_from(resolution),
        boundary: ParamValue::Scalar(parse_boundary(boundary)?),
    };

    let trap = if trap_center.is_empty() {
        None
    } else {
        Some(
            harmonic_potential(trap_center, param_from(trap_stiffness))
                .map_err(|e| JsValue::from_str(&e.to_string()))?,
        )
    };

    FokkerPlanck::new(&config, trap.as_ref().map(|u| u as &dyn Potential), None)
        .map_err(to_js_error)
}

#[wasm_bindgen]
impl WasmSimulation {
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
    ) -> Result<WasmSimulation, JsValue> {
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
        Ok(WasmSimulation { simulation })
    }

    pub fn ndim(&self) -> usize {
        self.simulation.ndim()
    }

    pub fn shape(&self) -> Vec<u32> {
        self.simulation
            .grid()
            .shape()
            .iter()
            .map(|&n| n as u32)
            .collect()
    }

    /// Meshgrid coordinates, axis-major: `ndim` consecutive blocks of one value per cell.
    pub fn grid_coordinates(&self) -> Float64Array {
        Float64Array::from(self.simulation.grid().coordinates().concat().as_slice())
    }

    pub fn diffusion(&self) -> Vec<f64> {
        self.simulation.diffusion().to_vec()
    }

    pub fn steady_state(&self) -> Result<Vec<f64>, JsValue> {
        self.simulation.steady_state().map_err(to_js_error)
    }

    pub fn propagate_gaussian(
        &self,
        center: Vec<f64>,
        width: Vec<f64>,
        time: f64,
        normalize: bool,
    ) -> Result<Vec<f64>, JsValue> {
        let pdf = gaussian_pdf(center, param_from(width))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.simulation
            .propagate(&pdf, time, normalize)
            .map_err(to_js_error)
    }

    pub fn propagate_interval_gaussian(
        &self,
        center: Vec<f64>,
        width: Vec<f64>,
        duration: f64,
        steps: u32,
        normalize: bool,
    ) -> Result<JsValue, JsValue> {
        let pdf = gaussian_pdf(center, param_from(width))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let trajectory = self
            .simulation
            .propagate_interval(&pdf, duration, Interval::Steps(steps as usize), normalize)
            .map_err(to_js_error)?;
        to_value(&trajectory).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Current per axis, axis-major like `grid_coordinates`.
    pub fn probability_current(&self, p: &[f64]) -> Result<Vec<f64>, JsValue> {
        self.simulation
            .probability_current(p)
            .map(|current| current.concat())
            .map_err(to_js_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::wasm_bindgen_test;

    const NM: f64 = 1e-9;
    const DRAG: f64 = 3.769911184307752e-11;

    fn trapped() -> WasmSimulation {
        WasmSimulation::new(
            300.0,
            vec![DRAG],
            vec![100.0 * NM],
            vec![5.0 * NM],
            "reflecting",
            vec![-10.0 * NM],
            vec![3e-6],
        )
        .expect("simulation should build")
    }

    #[test]
    fn param_from_treats_single_values_as_scalars() {
        assert_eq!(param_from(vec![2.0]), ParamValue::Scalar(2.0));
        assert_eq!(param_from(vec![1.0, 2.0]), ParamValue::Vector(vec![1.0, 2.0]));
    }

    #[test]
    fn wasm_simulation_reports_grid() {
        let sim = WasmSimulation::new(
            300.0,
            vec![DRAG],
            vec![40.0 * NM, 30.0 * NM],
            vec![10.0 * NM],
            "periodic",
            Vec::new(),
            Vec::new(),
        )
        .expect("simulation should build");

        assert_eq!(sim.ndim(), 2);
        assert_eq!(sim.shape(), vec![4, 3]);
        assert_eq!(sim.diffusion().len(), 2);
    }

    #[test]
    fn wasm_simulation_steady_state_is_normalized() {
        let steady = trapped().steady_state().expect("steady state");
        assert_eq!(steady.len(), 20);
        assert!((steady.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn wasm_simulation_propagation_conserves_mass() {
        let sim = trapped();
        let p = sim
            .propagate_gaussian(vec![20.0 * NM], vec![10.0 * NM], 1e-6, true)
            .expect("propagation");
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-10);
        let current = sim.probability_current(&p).expect("current");
        assert_eq!(current.len(), 20);
        assert_eq!(current[19], 0.0);
    }

    #[cfg(target_arch = "wasm32")]
    #[wasm_bindgen_test]
    fn wasm_simulation_grid_coordinates_are_axis_major() {
        let coords = trapped().grid_coordinates().to_vec();
        assert_eq!(coords.len(), 20);
        assert!(coords.windows(2).all(|w| w[0] < w[1]));
    }

    #[cfg(target_arch = "wasm32")]
    #[wasm_bindgen_test]
    fn wasm_simulation_rejects_unknown_boundary() {
        let result = WasmSimulation::new(
            300.0,
            vec![DRAG],
            vec![100.0 * NM],
            vec![5.0 * NM],
            "absorbing",
            Vec::new(),
            Vec::new(),
        );
        assert!(result.is_err(), "expected unknown boundary error");
    }

    #[cfg(target_arch = "wasm32")]
    #[wasm_bindgen_test]
    fn wasm_simulation_rejects_mismatched_width() {
        let result = trapped().propagate_gaussian(vec![0.0], vec![1.0, 2.0], 1e-6, true);
        assert!(result.is_err(), "expected width mismatch error");
    }
}
