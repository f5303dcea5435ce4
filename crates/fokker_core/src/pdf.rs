//! Closed-form initial probability densities sampled onto simulation grids.

use crate::broadcast::{value_to_vector, ParamValue};
use crate::error::ShapeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A stateless density over `ndim`-dimensional space.
pub trait DensityFunction: Send + Sync {
    fn ndim(&self) -> usize;

    /// Density at a single point of length `ndim`.
    fn density(&self, point: &[f64]) -> f64;

    /// Evaluates the density elementwise over `ndim` coordinate arrays.
    ///
    /// Arrays must share a length, except that length-1 arrays broadcast
    /// against the others. The output has the broadcast length.
    fn evaluate(&self, coords: &[&[f64]]) -> Result<Vec<f64>, ShapeError> {
        let ndim = self.ndim();
        if coords.len() != ndim {
            return Err(ShapeError::ArgumentCount {
                expected: ndim,
                got: coords.len(),
            });
        }
        let len = broadcast_len(coords)?;
        let mut point = vec![0.0; ndim];
        let mut out = Vec::with_capacity(len);
        for k in 0..len {
            for (axis, values) in coords.iter().enumerate() {
                point[axis] = if values.len() == 1 { values[0] } else { values[k] };
            }
            out.push(self.density(&point));
        }
        Ok(out)
    }
}

/// Common length of coordinate arrays under length-1 broadcasting.
pub fn broadcast_len(coords: &[&[f64]]) -> Result<usize, ShapeError> {
    let mut target = 1usize;
    for values in coords {
        if values.len() == 1 {
            continue;
        }
        if target == 1 {
            target = values.len();
        } else if values.len() != target {
            return Err(ShapeError::IncompatibleShapes {
                lengths: coords.iter().map(|c| c.len()).collect(),
            });
        }
    }
    Ok(target)
}

/// Unnormalized separable Gaussian `Π_i exp(−((x_i − c_i)/w_i)²)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianPdf {
    center: Vec<f64>,
    width: Vec<f64>,
}

impl GaussianPdf {
    pub fn center(&self) -> &[f64] {
        &self.center
    }

    pub fn width(&self) -> &[f64] {
        &self.width
    }
}

impl DensityFunction for GaussianPdf {
    fn ndim(&self) -> usize {
        self.center.len()
    }

    fn density(&self, point: &[f64]) -> f64 {
        let mut value = 1.0;
        for ((x, c), w) in point.iter().zip(&self.center).zip(&self.width) {
            let z = (x - c) / w;
            value *= (-z * z).exp();
        }
        value
    }
}

/// Builds a Gaussian density from a center and a width.
///
/// The center fixes the dimension; a scalar width is shared by all axes.
pub fn gaussian_pdf(
    center: impl Into<ParamValue<f64>>,
    width: impl Into<ParamValue<f64>>,
) -> Result<GaussianPdf, ShapeError> {
    let center = center.into().to_vec();
    if center.is_empty() {
        return Err(ShapeError::EmptyCenter);
    }
    let width = value_to_vector(width, center.len())?;
    Ok(GaussianPdf { center, width })
}

/// Indicator density: `1` where the predicate holds, `0` elsewhere.
#[derive(Clone)]
pub struct UniformPdf {
    ndim: usize,
    region: Arc<dyn Fn(&[f64]) -> bool + Send + Sync>,
}

impl UniformPdf {
    pub fn new(ndim: usize, region: impl Fn(&[f64]) -> bool + Send + Sync + 'static) -> Self {
        Self {
            ndim,
            region: Arc::new(region),
        }
    }
}

impl fmt::Debug for UniformPdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniformPdf").field("ndim", &self.ndim).finish()
    }
}

impl DensityFunction for UniformPdf {
    fn ndim(&self) -> usize {
        self.ndim
    }

    fn density(&self, point: &[f64]) -> f64 {
        if (self.region)(point) {
            1.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{broadcast_len, gaussian_pdf, DensityFunction, UniformPdf};
    use crate::error::ShapeError;
    use std::f64::consts::E;

    #[test]
    fn gaussian_peaks_at_center() {
        let pdf = gaussian_pdf(0.3, 0.2).unwrap();
        assert_eq!(pdf.ndim(), 1);
        assert_eq!(pdf.density(&[0.3]), 1.0);
    }

    #[test]
    fn gaussian_is_one_over_e_one_width_away() {
        let pdf = gaussian_pdf(-50e-9, 30e-9).unwrap();
        let left = pdf.density(&[-80e-9]);
        let right = pdf.density(&[-20e-9]);
        assert!((left - 1.0 / E).abs() < 1e-12);
        assert!((right - 1.0 / E).abs() < 1e-12);
        assert!((left - 0.3679).abs() < 1e-4);
    }

    #[test]
    fn gaussian_factors_over_axes() {
        let f2 = gaussian_pdf([1.0, 1.0], 0.5).unwrap();
        let f1 = gaussian_pdf(1.0, 0.5).unwrap();
        for &(x, y) in &[(0.0, 0.0), (1.2, 0.7), (-0.4, 2.1)] {
            let joint = f2.density(&[x, y]);
            let product = f1.density(&[x]) * f1.density(&[y]);
            assert!((joint - product).abs() < 1e-15);
        }
    }

    #[test]
    fn gaussian_is_symmetric_about_center() {
        let pdf = gaussian_pdf(vec![0.5, -1.0, 2.0], vec![0.3, 1.5, 0.8]).unwrap();
        let d = [0.2, -0.7, 1.1];
        let plus: Vec<f64> = pdf.center().iter().zip(&d).map(|(c, d)| c + d).collect();
        let minus: Vec<f64> = pdf.center().iter().zip(&d).map(|(c, d)| c - d).collect();
        assert!((pdf.density(&plus) - pdf.density(&minus)).abs() < 1e-15);
    }

    #[test]
    fn gaussian_rejects_mismatched_width() {
        let err = gaussian_pdf([0.0, 0.0], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, ShapeError::DimensionMismatch { ndim: 2, .. }));
        assert_eq!(gaussian_pdf(Vec::new(), 1.0).unwrap_err(), ShapeError::EmptyCenter);
    }

    #[test]
    fn gaussian_width_zero_follows_float_semantics() {
        let pdf = gaussian_pdf(0.0, 0.0).unwrap();
        assert!(pdf.density(&[0.0]).is_nan());
        assert_eq!(pdf.density(&[1.0]), 0.0);
    }

    #[test]
    fn evaluate_broadcasts_length_one_arrays() {
        let pdf = gaussian_pdf([0.0, 0.0], 1.0).unwrap();
        let xs = [0.0, 1.0, 2.0];
        let ys = [1.0];
        let values = pdf.evaluate(&[&xs, &ys]).unwrap();
        assert_eq!(values.len(), 3);
        for (value, x) in values.iter().zip(xs) {
            assert!((value - pdf.density(&[x, 1.0])).abs() < 1e-15);
        }
    }

    #[test]
    fn evaluate_validates_arguments() {
        let pdf = gaussian_pdf([0.0, 0.0], 1.0).unwrap();
        let xs = [0.0, 1.0];
        let err = pdf.evaluate(&[&xs]).unwrap_err();
        assert_eq!(err, ShapeError::ArgumentCount { expected: 2, got: 1 });
        let ys = [0.0, 1.0, 2.0];
        let err = pdf.evaluate(&[&xs, &ys]).unwrap_err();
        assert!(matches!(err, ShapeError::IncompatibleShapes { .. }));
    }

    #[test]
    fn evaluate_is_reentrant_across_threads() {
        let pdf = gaussian_pdf(0.0, 1.0).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|k| {
                let pdf = pdf.clone();
                std::thread::spawn(move || {
                    let xs: Vec<f64> = (0..16).map(|i| i as f64 * 0.1 + k as f64).collect();
                    pdf.evaluate(&[&xs]).unwrap()
                })
            })
            .collect();
        for (k, handle) in handles.into_iter().enumerate() {
            let values = handle.join().unwrap();
            let expected = pdf.density(&[k as f64]);
            assert!((values[0] - expected).abs() < 1e-15);
        }
    }

    #[test]
    fn broadcast_len_handles_scalars() {
        assert_eq!(broadcast_len(&[&[1.0], &[2.0]]).unwrap(), 1);
        assert_eq!(broadcast_len(&[&[1.0], &[2.0, 3.0]]).unwrap(), 2);
    }

    #[test]
    fn uniform_pdf_is_an_indicator() {
        let pdf = UniformPdf::new(1, |x| x[0] > 1.0 && x[0] < 2.0);
        let values = pdf.evaluate(&[&[0.5, 1.5, 2.5]]).unwrap();
        assert_eq!(values, vec![0.0, 1.0, 0.0]);
    }
}
