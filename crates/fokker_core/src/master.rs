//! Discrete master equation for overdamped diffusion on a grid.
//!
//! Each cell exchanges probability with its axis neighbours at Arrhenius-like
//! rates `D/Δ² · exp(−βΔU/2)`, which satisfy detailed balance with respect to
//! the Boltzmann weights of the potential. The generator is stored as a CSR
//! matrix whose columns sum to zero.

use crate::boundary::Boundary;
use crate::grid::Grid;
use crate::traits::Generator;
use anyhow::{bail, Result};
use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Energy landscape sampled on the grid, plus an optional external force per axis.
pub struct FieldSamples<'a> {
    pub potential: Option<&'a [f64]>,
    pub force: Option<&'a [Vec<f64>]>,
}

pub struct MasterEquation {
    grid: Grid,
    right: Vec<Vec<f64>>,
    left: Vec<Vec<f64>>,
    matrix: CsrMatrix<f64>,
    max_exit_rate: f64,
}

impl MasterEquation {
    pub fn new(
        grid: Grid,
        diffusion: &[f64],
        beta: f64,
        fields: FieldSamples<'_>,
        boundaries: &[Boundary],
    ) -> Result<Self> {
        let ndim = grid.ndim();
        let n = grid.len();
        if diffusion.len() != ndim || boundaries.len() != ndim {
            bail!(
                "Per-axis parameters must have {} entries (diffusion: {}, boundaries: {}).",
                ndim,
                diffusion.len(),
                boundaries.len()
            );
        }
        if let Some(u) = fields.potential {
            if u.len() != n {
                bail!("Potential samples ({}) do not match grid size ({}).", u.len(), n);
            }
        }
        if let Some(f) = fields.force {
            if f.len() != ndim || f.iter().any(|axis| axis.len() != n) {
                bail!("Force samples must have {} axes of {} values.", ndim, n);
            }
        }

        let mut right = vec![vec![0.0; n]; ndim];
        let mut left = vec![vec![0.0; n]; ndim];

        for axis in 0..ndim {
            let dx = grid.resolution()[axis];
            let base = diffusion[axis] / (dx * dx);
            let cells = grid.shape()[axis];
            let total_force = total_force_along(&grid, axis, &fields);

            for x in 0..n {
                let pos = grid.axis_position(x, axis);
                let next = grid.neighbor(x, axis, true);
                let prev = grid.neighbor(x, axis, false);

                right[axis][x] = if pos + 1 < cells {
                    base * (-beta * hop_energy(&fields, axis, dx, x, next, 1.0) / 2.0).exp()
                } else {
                    match boundaries[axis] {
                        Boundary::Reflecting => 0.0,
                        Boundary::Periodic => {
                            let du = -(total_force[next] + total_force[x]) / 2.0 * dx;
                            base * (-beta * du / 2.0).exp()
                        }
                    }
                };

                left[axis][x] = if pos > 0 {
                    base * (-beta * hop_energy(&fields, axis, dx, x, prev, -1.0) / 2.0).exp()
                } else {
                    match boundaries[axis] {
                        Boundary::Reflecting => 0.0,
                        Boundary::Periodic => {
                            let du = (total_force[prev] + total_force[x]) / 2.0 * dx;
                            base * (-beta * du / 2.0).exp()
                        }
                    }
                };
            }
        }

        let mut coo = CooMatrix::new(n, n);
        let mut max_exit_rate = 0.0f64;
        for x in 0..n {
            let exit: f64 = (0..ndim).map(|axis| right[axis][x] + left[axis][x]).sum();
            max_exit_rate = max_exit_rate.max(exit);
            coo.push(x, x, -exit);
            for axis in 0..ndim {
                let next = grid.neighbor(x, axis, true);
                let prev = grid.neighbor(x, axis, false);
                if left[axis][next] != 0.0 {
                    coo.push(x, next, left[axis][next]);
                }
                if right[axis][prev] != 0.0 {
                    coo.push(x, prev, right[axis][prev]);
                }
            }
        }
        if !max_exit_rate.is_finite() {
            bail!("Transition rates overflowed; check temperature and potential scale.");
        }

        Ok(Self {
            grid,
            right,
            left,
            matrix: CsrMatrix::from(&coo),
            max_exit_rate,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn matrix(&self) -> &CsrMatrix<f64> {
        &self.matrix
    }

    /// Rates of hopping towards `+e_axis`, one per cell.
    pub fn right_rates(&self, axis: usize) -> &[f64] {
        &self.right[axis]
    }

    /// Rates of hopping towards `−e_axis`, one per cell.
    pub fn left_rates(&self, axis: usize) -> &[f64] {
        &self.left[axis]
    }

    pub fn max_exit_rate(&self) -> f64 {
        self.max_exit_rate
    }

    /// Column Gershgorin bound on the generator's spectrum: every eigenvalue
    /// lies in a disk centred at `−exit(j)` with radius `exit(j)`.
    pub fn spectral_bound(&self) -> f64 {
        2.0 * self.max_exit_rate
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let n = self.grid.len();
        let mut dense = DMatrix::zeros(n, n);
        for (i, j, v) in self.matrix.triplet_iter() {
            dense[(i, j)] += *v;
        }
        dense
    }

    /// Net probability current through the `+e_axis` face of every cell.
    pub fn probability_current(&self, p: &[f64]) -> Result<Vec<Vec<f64>>> {
        let n = self.grid.len();
        if p.len() != n {
            bail!("Probability field length ({}) does not match grid size ({}).", p.len(), n);
        }
        let mut current = vec![vec![0.0; n]; self.grid.ndim()];
        for (axis, out) in current.iter_mut().enumerate() {
            let dx = self.grid.resolution()[axis];
            for x in 0..n {
                let next = self.grid.neighbor(x, axis, true);
                out[x] = (self.right[axis][x] * p[x] - self.left[axis][next] * p[next]) * dx;
            }
        }
        Ok(current)
    }

    /// Solves `M p = 0` by Gauss-Seidel sweeps from `guess`, renormalizing
    /// to unit sum after each sweep. Stops once the L1 change of a sweep
    /// drops below `tolerance`.
    pub fn stationary_gauss_seidel(
        &self,
        guess: &[f64],
        tolerance: f64,
        max_sweeps: usize,
    ) -> Result<Vec<f64>> {
        let n = self.grid.len();
        if guess.len() != n {
            bail!("Initial guess length ({}) does not match grid size ({}).", guess.len(), n);
        }
        let mut p = guess.to_vec();
        let mut total: f64 = p.iter().sum();
        if !(total.is_finite() && total > 0.0) || p.iter().any(|v| *v < 0.0) {
            bail!("Initial guess must be non-negative with a positive finite sum.");
        }
        p.iter_mut().for_each(|v| *v /= total);

        for _ in 0..max_sweeps {
            let mut change = 0.0;
            for i in 0..n {
                let row = self.matrix.row(i);
                let mut inflow = 0.0;
                let mut diagonal = 0.0;
                for (&j, &v) in row.col_indices().iter().zip(row.values()) {
                    if j == i {
                        diagonal += v;
                    } else {
                        inflow += v * p[j];
                    }
                }
                // Cells nobody leaves keep their mass.
                if diagonal < 0.0 {
                    let updated = inflow / -diagonal;
                    change += (updated - p[i]).abs();
                    p[i] = updated;
                }
            }
            total = p.iter().sum();
            if !(total.is_finite() && total > 0.0) {
                bail!("Gauss-Seidel sweeps lost all probability (sum = {}).", total);
            }
            p.iter_mut().for_each(|v| *v /= total);
            if change / total < tolerance {
                return Ok(p);
            }
        }
        bail!("Gauss-Seidel steady state did not converge in {} sweeps.", max_sweeps)
    }
}

impl Generator<f64> for MasterEquation {
    fn dimension(&self) -> usize {
        self.grid.len()
    }

    fn apply(&self, _t: f64, p: &[f64], out: &mut [f64]) {
        for (i, row) in self.matrix.row_iter().enumerate() {
            let mut acc = 0.0;
            for (&j, &v) in row.col_indices().iter().zip(row.values()) {
                acc += v * p[j];
            }
            out[i] = acc;
        }
    }
}

/// Energy change of hopping from `from` to its neighbour `to` (`direction` is
/// `+1` for `+e_axis`). External forces contribute their trapezoid work.
fn hop_energy(
    fields: &FieldSamples<'_>,
    axis: usize,
    dx: f64,
    from: usize,
    to: usize,
    direction: f64,
) -> f64 {
    let mut du = 0.0;
    if let Some(u) = fields.potential {
        du += u[to] - u[from];
    }
    if let Some(f) = fields.force {
        du -= direction * (f[axis][to] + f[axis][from]) / 2.0 * dx;
    }
    du
}

/// External force minus the potential gradient along `axis`.
fn total_force_along(grid: &Grid, axis: usize, fields: &FieldSamples<'_>) -> Vec<f64> {
    let n = grid.len();
    let mut total = match fields.force {
        Some(f) => f[axis].clone(),
        None => vec![0.0; n],
    };
    if let Some(u) = fields.potential {
        let gradient = axis_gradient(grid, axis, u);
        for (t, g) in total.iter_mut().zip(gradient) {
            *t -= g;
        }
    }
    total
}

/// Second-order central differences in the interior, one-sided at the ends.
fn axis_gradient(grid: &Grid, axis: usize, values: &[f64]) -> Vec<f64> {
    let dx = grid.resolution()[axis];
    let cells = grid.shape()[axis];
    (0..grid.len())
        .map(|x| {
            if cells < 2 {
                return 0.0;
            }
            let pos = grid.axis_position(x, axis);
            let next = grid.neighbor(x, axis, true);
            let prev = grid.neighbor(x, axis, false);
            if pos == 0 {
                (values[next] - values[x]) / dx
            } else if pos + 1 == cells {
                (values[x] - values[prev]) / dx
            } else {
                (values[next] - values[prev]) / (2.0 * dx)
            }
        })
        .collect()
}
