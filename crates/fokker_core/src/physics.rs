//! Physical constants and small closed-form helpers for overdamped Brownian motion.

use std::f64::consts::PI;

/// Boltzmann constant in J/K.
pub const BOLTZMANN: f64 = 1.380649e-23;

/// One nanometer in meters.
pub const NANOMETER: f64 = 1e-9;

/// Stokes drag `6πηr` of a sphere of `radius` in a fluid of dynamic `viscosity`.
pub fn stokes_drag(viscosity: f64, radius: f64) -> f64 {
    6.0 * PI * viscosity * radius
}

/// Einstein relation `D = k_B T / γ`.
pub fn diffusion_coefficient(temperature: f64, drag: f64) -> f64 {
    BOLTZMANN * temperature / drag
}

/// Inverse thermal energy `1 / (k_B T)`.
pub fn beta(temperature: f64) -> f64 {
    1.0 / (BOLTZMANN * temperature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_drag_on_two_nanometer_particle() {
        let drag = stokes_drag(1e-3, 20e-10);
        assert!((drag - 3.769911184307752e-11).abs() < 1e-20);
    }

    #[test]
    fn einstein_relation_inverts_drag() {
        let drag = stokes_drag(1e-3, 20e-10);
        let d = diffusion_coefficient(300.0, drag);
        assert!((d * drag - BOLTZMANN * 300.0).abs() < 1e-30);
        assert!((beta(300.0) * BOLTZMANN * 300.0 - 1.0).abs() < 1e-12);
    }
}
