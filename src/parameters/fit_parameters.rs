//! The named parameter record threaded between fits.
//!
//! The solver works on a flat vector laid out as
//! `[z1, phi1, gamma1, z2, phi2, gamma2, z3, phi3, gamma3, background]`.
//! [`FitParameters`] is the named view of that vector; [`FitParameters::to_array`]
//! and [`FitParameters::from_slice`] convert between the two.

use std::f64::consts::PI;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{DcmFitError, Result};

/// Number of absorption lines in the composite model.
pub const RESONANCE_COUNT: usize = 3;

/// Values per resonance: strength, phase, width.
pub const VALUES_PER_RESONANCE: usize = 3;

/// Length of the flat parameter vector.
pub const PARAMETER_COUNT: usize = VALUES_PER_RESONANCE * RESONANCE_COUNT + 1;

/// Line-shape parameters of a single resonance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResonanceParams {
    /// Dimensionless line strength `z`
    pub strength: f64,
    /// Dipole phase `phi` in radians
    pub phase: f64,
    /// Line width `gamma` in eV
    pub width: f64,
}

impl ResonanceParams {
    pub fn new(strength: f64, phase: f64, width: f64) -> Self {
        Self {
            strength,
            phase,
            width,
        }
    }
}

/// Parameters of the three-line composite model plus the constant background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitParameters {
    pub resonances: [ResonanceParams; RESONANCE_COUNT],
    pub background: f64,
}

impl FitParameters {
    pub fn new(resonances: [ResonanceParams; RESONANCE_COUNT], background: f64) -> Self {
        Self {
            resonances,
            background,
        }
    }

    /// Decode a flat solver vector.
    ///
    /// # Errors
    ///
    /// * `DcmFitError::DimensionMismatch` if the slice does not hold exactly
    ///   [`PARAMETER_COUNT`] values
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        if values.len() != PARAMETER_COUNT {
            return Err(DcmFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                PARAMETER_COUNT,
                values.len()
            )));
        }

        let mut resonances = [ResonanceParams::new(0.0, 0.0, 0.0); RESONANCE_COUNT];
        for (i, resonance) in resonances.iter_mut().enumerate() {
            let base = i * VALUES_PER_RESONANCE;
            *resonance = ResonanceParams::new(values[base], values[base + 1], values[base + 2]);
        }

        Ok(Self::new(resonances, values[PARAMETER_COUNT - 1]))
    }

    /// Decode a flat solver vector held in an ndarray.
    pub fn from_array(values: &Array1<f64>) -> Result<Self> {
        Self::from_slice(&values.to_vec())
    }

    /// Encode into the flat solver vector.
    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(self.to_vec())
    }

    pub fn to_vec(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(PARAMETER_COUNT);
        for resonance in &self.resonances {
            values.push(resonance.strength);
            values.push(resonance.phase);
            values.push(resonance.width);
        }
        values.push(self.background);
        values
    }

    /// Apply the between-fit normalization policy.
    ///
    /// Phases are wrapped into `(-π, π]`, strengths and widths are made
    /// non-negative. The background is left untouched.
    pub fn normalized(&self) -> Self {
        let mut out = *self;
        for resonance in out.resonances.iter_mut() {
            resonance.strength = resonance.strength.abs();
            resonance.phase = wrap_phase(resonance.phase);
            resonance.width = resonance.width.abs();
        }
        out
    }

    /// Whether every value is finite.
    pub fn is_finite(&self) -> bool {
        self.to_vec().iter().all(|v| v.is_finite())
    }
}

/// Wrap a phase into the half-open interval `(-π, π]`.
///
/// Values already inside the interval are returned unchanged, which makes the
/// operation idempotent. Non-finite input is returned as is.
pub fn wrap_phase(phase: f64) -> f64 {
    if !phase.is_finite() || (phase > -PI && phase <= PI) {
        return phase;
    }

    let wrapped = (phase + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        PI
    } else {
        wrapped.min(PI)
    }
}
