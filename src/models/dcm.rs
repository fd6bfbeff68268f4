//! Dipole control model (DCM) line shapes.
//!
//! A single absorption line contributes the real part of a complex Lorentzian
//! rotated by the dipole phase `phi`:
//!
//! ```text
//! L(E) = z · [ (γ/2)·cos φ − (E − E_r)·sin φ ] / [ (E − E_r)² + γ²/4 ]
//! ```
//!
//! The composite model sums three such lines, scales the sum by the photon
//! energy and the line-shape constant, and adds a constant background. No
//! convolution with the spectrometer resolution is applied.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Model;
use crate::parameters::{FitParameters, PARAMETER_COUNT, RESONANCE_COUNT};

/// A fixed absorption line: calibrated resonance energy and nominal width (eV).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resonance {
    pub energy: f64,
    pub nominal_width: f64,
}

impl Resonance {
    pub fn new(energy: f64, nominal_width: f64) -> Self {
        Self {
            energy,
            nominal_width,
        }
    }
}

/// DCM line shape of one absorption line evaluated on `energy_axis`.
///
/// # Arguments
///
/// * `energy_axis` - Photon energies
/// * `z` - Line strength
/// * `phi` - Dipole phase
/// * `resonance_energy` - Center of the line
/// * `gamma` - Line width
pub fn dcm_lineshape(
    energy_axis: ArrayView1<f64>,
    z: f64,
    phi: f64,
    resonance_energy: f64,
    gamma: f64,
) -> Array1<f64> {
    let (sin_phi, cos_phi) = phi.sin_cos();
    let half_gamma = gamma / 2.0;
    let quarter_gamma_sq = gamma * gamma / 4.0;

    energy_axis.mapv(|e| {
        let detuning = e - resonance_energy;
        z * (half_gamma * cos_phi - detuning * sin_phi) / (detuning * detuning + quarter_gamma_sq)
    })
}

/// Three DCM lines, energy-scaled, on a constant background.
///
/// Each line's strength argument is `z_i · γ_i`, which makes the fitted `z`
/// dimensionless.
#[derive(Debug, Clone, PartialEq)]
pub struct DcmModel {
    resonances: [Resonance; RESONANCE_COUNT],
    lineshape_constant: f64,
}

impl DcmModel {
    /// Create a model for the given lines and line-shape constant.
    pub fn new(resonances: [Resonance; RESONANCE_COUNT], lineshape_constant: f64) -> Self {
        Self {
            resonances,
            lineshape_constant,
        }
    }

    pub fn resonances(&self) -> &[Resonance; RESONANCE_COUNT] {
        &self.resonances
    }

    pub fn lineshape_constant(&self) -> f64 {
        self.lineshape_constant
    }

    /// Modeled optical density on `energy_axis`.
    pub fn evaluate(&self, energy_axis: ArrayView1<f64>, params: &FitParameters) -> Array1<f64> {
        let mut model = Array1::zeros(energy_axis.len());

        for (resonance, line) in self.resonances.iter().zip(params.resonances.iter()) {
            model += &dcm_lineshape(
                energy_axis,
                line.strength * line.width,
                line.phase,
                resonance.energy,
                line.width,
            );
        }

        model *= &energy_axis;
        model *= self.lineshape_constant;
        model += params.background;
        model
    }
}

impl Model for DcmModel {
    fn parameter_count(&self) -> usize {
        PARAMETER_COUNT
    }

    fn eval(&self, x: ArrayView1<f64>, params: &Array1<f64>) -> Result<Array1<f64>> {
        let params = FitParameters::from_array(params)?;
        Ok(self.evaluate(x, &params))
    }
}
