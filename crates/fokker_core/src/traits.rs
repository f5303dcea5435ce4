use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in probability fields.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Right-hand side of a time-continuous evolution `dp/dt = G(t, p)`.
///
/// For the master equation `G` is the sparse generator matrix applied to the
/// flattened probability field, but any autonomous or time-dependent flow fits.
pub trait Generator<T: Scalar> {
    /// Number of entries in the state vector (grid cells).
    fn dimension(&self) -> usize;

    /// Writes `G(t, p)` into `out`.
    fn apply(&self, t: T, p: &[T], out: &mut [T]);
}

/// A trait for solvers that can step a generator forward.
pub trait Steppable<T: Scalar> {
    /// Advances `state` by `dt`, updating `t` in place.
    fn step(&mut self, generator: &impl Generator<T>, t: &mut T, state: &mut [T], dt: T);
}
