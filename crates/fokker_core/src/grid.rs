//! Regular rectangular grids centred on the origin.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on the total number of cells in a grid.
pub const MAX_CELLS: usize = 1 << 26;

/// Cell-centred grid with row-major (`ij`) flattening, last axis fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    shape: Vec<usize>,
    resolution: Vec<f64>,
    axes: Vec<Vec<f64>>,
    strides: Vec<usize>,
}

impl Grid {
    pub fn new(extent: &[f64], resolution: &[f64]) -> Result<Self> {
        if extent.is_empty() {
            bail!("Grid extent must have at least one dimension.");
        }
        if extent.len() != resolution.len() {
            bail!(
                "Resolution dimension mismatch. Expected {}, got {}.",
                extent.len(),
                resolution.len()
            );
        }

        let mut shape = Vec::with_capacity(extent.len());
        let mut axes = Vec::with_capacity(extent.len());
        for (axis, (&ext, &res)) in extent.iter().zip(resolution).enumerate() {
            if !(ext.is_finite() && ext > 0.0) {
                bail!("Extent along axis {} must be positive and finite.", axis);
            }
            if !(res.is_finite() && res > 0.0) {
                bail!("Resolution along axis {} must be positive and finite.", axis);
            }
            // extent / resolution can land a hair above an integer.
            let count = (ext / res * (1.0 - 1e-9)).ceil();
            if count > MAX_CELLS as f64 {
                bail!("Axis {} would need {} cells (limit {}).", axis, count, MAX_CELLS);
            }
            let cells = count as usize;
            if cells == 0 {
                bail!("Axis {} has no cells.", axis);
            }
            let mean = (cells - 1) as f64 * res / 2.0;
            axes.push((0..cells).map(|k| k as f64 * res - mean).collect());
            shape.push(cells);
        }

        match shape.iter().try_fold(1usize, |acc, &cells| acc.checked_mul(cells)) {
            Some(total) if total <= MAX_CELLS => {}
            _ => bail!("Grid of shape {:?} exceeds {} cells.", shape, MAX_CELLS),
        }

        let mut strides = vec![1usize; shape.len()];
        for i in (0..shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }

        Ok(Self {
            shape,
            resolution: resolution.to_vec(),
            axes,
            strides,
        })
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn resolution(&self) -> &[f64] {
        &self.resolution
    }

    pub fn axes(&self) -> &[Vec<f64>] {
        &self.axes
    }

    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ravel(&self, index: &[usize]) -> usize {
        index.iter().zip(&self.strides).map(|(i, s)| i * s).sum()
    }

    pub fn unravel(&self, mut flat: usize, out: &mut [usize]) {
        for (axis, stride) in self.strides.iter().enumerate() {
            out[axis] = flat / stride;
            flat %= stride;
        }
    }

    /// Flat index of the adjacent cell along `axis`, wrapping around the ends.
    pub fn neighbor(&self, flat: usize, axis: usize, forward: bool) -> usize {
        let stride = self.strides[axis];
        let n = self.shape[axis];
        let pos = (flat / stride) % n;
        let next = if forward { (pos + 1) % n } else { (pos + n - 1) % n };
        flat - pos * stride + next * stride
    }

    /// Position along `axis` of the cell with flat index `flat`.
    pub fn axis_position(&self, flat: usize, axis: usize) -> usize {
        (flat / self.strides[axis]) % self.shape[axis]
    }

    pub fn point(&self, flat: usize, out: &mut [f64]) {
        for axis in 0..self.ndim() {
            out[axis] = self.axes[axis][self.axis_position(flat, axis)];
        }
    }

    /// Flattened meshgrid coordinates, one array per axis.
    pub fn coordinates(&self) -> Vec<Vec<f64>> {
        let n = self.len();
        (0..self.ndim())
            .map(|axis| {
                (0..n)
                    .map(|flat| self.axes[axis][self.axis_position(flat, axis)])
                    .collect()
            })
            .collect()
    }

    /// Flat index of the cell closest to `point`.
    pub fn nearest(&self, point: &[f64]) -> usize {
        let mut index = vec![0usize; self.ndim()];
        for axis in 0..self.ndim() {
            let first = self.axes[axis][0];
            let k = ((point[axis] - first) / self.resolution[axis]).round();
            index[axis] = k.clamp(0.0, (self.shape[axis] - 1) as f64) as usize;
        }
        self.ravel(&index)
    }
}
