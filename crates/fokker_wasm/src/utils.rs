//! Stateless helpers exported to JS.

use crate::simulation::param_from;
use fokker_core::broadcast::value_to_vector as core_value_to_vector;
use fokker_core::pdf::{gaussian_pdf, DensityFunction};
use wasm_bindgen::prelude::*;

/// Broadcasts `values` (one entry meaning a scalar) to `ndim` entries.
#[wasm_bindgen]
pub fn value_to_vector(values: Vec<f64>, ndim: usize) -> Result<Vec<f64>, JsValue> {
    core_value_to_vector(param_from(values), ndim).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Evaluates an unnormalized Gaussian over axis-major coordinates.
///
/// `coordinates` holds `center.len()` consecutive blocks of equal length.
#[wasm_bindgen]
pub fn gaussian_density(
    center: Vec<f64>,
    width: Vec<f64>,
    coordinates: &[f64],
) -> Result<Vec<f64>, JsValue> {
    let pdf =
        gaussian_pdf(center, param_from(width)).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let ndim = pdf.ndim();
    if coordinates.len() % ndim != 0 {
        return Err(JsValue::from_str(
            "Coordinate array length must be a multiple of the dimension.",
        ));
    }
    let block = coordinates.len() / ndim;
    let axes: Vec<&[f64]> = coordinates.chunks(block.max(1)).take(ndim).collect();
    pdf.evaluate(&axes)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{gaussian_density, value_to_vector};

    #[test]
    fn value_to_vector_repeats_single_value() {
        let vec = value_to_vector(vec![1.5], 3).expect("broadcast");
        assert_eq!(vec, vec![1.5, 1.5, 1.5]);
    }

    #[test]
    fn value_to_vector_passes_matching_vectors() {
        let vec = value_to_vector(vec![1.0, 2.0], 2).expect("passthrough");
        assert_eq!(vec, vec![1.0, 2.0]);
    }

    #[test]
    fn gaussian_density_splits_axis_blocks() {
        let coords = [0.0, 1.0, 0.0, 0.0];
        let values = gaussian_density(vec![0.0, 0.0], vec![1.0], &coords).expect("density");
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], 1.0);
        assert!((values[1] - (-1.0f64).exp()).abs() < 1e-15);
    }

    #[cfg(target_arch = "wasm32")]
    #[wasm_bindgen_test::wasm_bindgen_test]
    fn value_to_vector_rejects_mismatch() {
        assert!(value_to_vector(vec![1.0, 2.0], 3).is_err());
    }
}
