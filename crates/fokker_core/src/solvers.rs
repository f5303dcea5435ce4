use crate::traits::{Generator, Scalar, Steppable};

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            tmp: vec![z; dim],
        }
    }

    /// Integrates from `t` to `t + span` in `substeps` equal RK4 steps.
    pub fn advance(
        &mut self,
        generator: &impl Generator<T>,
        t: &mut T,
        state: &mut [T],
        span: T,
        substeps: usize,
    ) {
        if substeps == 0 {
            return;
        }
        let count = T::from_usize(substeps).unwrap_or_else(T::one);
        let h = span / count;
        for _ in 0..substeps {
            self.step(generator, t, state, h);
        }
    }
}

/// `out = state + scale * slope`, elementwise.
fn shifted<T: Scalar>(out: &mut [T], state: &[T], slope: &[T], scale: T) {
    for ((o, &p), &k) in out.iter_mut().zip(state).zip(slope) {
        *o = p + scale * k;
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, generator: &impl Generator<T>, t: &mut T, state: &mut [T], dt: T) {
        let two = T::one() + T::one();
        let half = dt / two;
        let third = dt / (two + T::one());
        let sixth = third / two;
        let t0 = *t;

        generator.apply(t0, state, &mut self.k1);
        shifted(&mut self.tmp, state, &self.k1, half);
        generator.apply(t0 + half, &self.tmp, &mut self.k2);
        shifted(&mut self.tmp, state, &self.k2, half);
        generator.apply(t0 + half, &self.tmp, &mut self.k3);
        shifted(&mut self.tmp, state, &self.k3, dt);
        generator.apply(t0 + dt, &self.tmp, &mut self.k4);

        for (i, p) in state.iter_mut().enumerate() {
            *p = *p + sixth * (self.k1[i] + self.k4[i]) + third * (self.k2[i] + self.k3[i]);
        }
        *t = t0 + dt;
    }
}

/// Largest `h * bound` for which RK4 stays stable on a disk of diameter
/// `bound` touching the origin from the left. Generators whose Gershgorin
/// disks fit this bound cannot blow up, complex spectra included.
pub const RK4_DISK_STABILITY: f64 = 2.78;

/// Number of RK4 substeps needed to cover `span` when the generator's
/// spectrum lies within `spectral_bound` of the origin and each substep may
/// reach `stability` in `h * spectral_bound`.
pub fn substeps_for(span: f64, spectral_bound: f64, stability: f64) -> usize {
    if span <= 0.0 {
        return 0;
    }
    if spectral_bound <= 0.0 || !spectral_bound.is_finite() {
        return 1;
    }
    ((span * spectral_bound / stability).ceil() as usize).max(1)
}
