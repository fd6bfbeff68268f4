//! Run configuration.
//!
//! Every constant of the fitting pipeline lives in [`FitConfig`]. All fields
//! have serde defaults, so an empty JSON object (or no file at all)
//! reproduces the standard three-line analysis.

use std::f64::consts::{LN_10, PI};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::EnergyAxis;
use crate::error::{DcmFitError, Result};
use crate::lm::LmConfig;
use crate::models::Resonance;
use crate::parameters::{Bounds, FitParameters, ResonanceParams, PARAMETER_COUNT, RESONANCE_COUNT};

/// Top-level configuration of a sequential fit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub energy_axis: EnergyAxisConfig,
    pub roi: RoiConfig,
    pub intensities: Vec<f64>,
    pub resonances: [Resonance; RESONANCE_COUNT],
    pub physics: PhysicsConfig,
    /// Number of leading spectrum rows averaged into the seed spectrum.
    pub seed_rows: usize,
    pub bounds: BoundsPolicy,
    pub initial_guess: InitialGuess,
    pub data: DataConfig,
    pub output: OutputConfig,
    pub solver: LmConfig,
    pub failure: FailurePolicy,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            energy_axis: EnergyAxisConfig::default(),
            roi: RoiConfig::default(),
            intensities: default_intensities(),
            resonances: default_resonances(),
            physics: PhysicsConfig::default(),
            seed_rows: 7,
            bounds: BoundsPolicy::default(),
            initial_guess: InitialGuess::default(),
            data: DataConfig::default(),
            output: OutputConfig::default(),
            solver: LmConfig::default(),
            failure: FailurePolicy::default(),
        }
    }
}

fn default_intensities() -> Vec<f64> {
    vec![1.3, 1.6, 1.9, 2.2, 2.5]
}

fn default_resonances() -> [Resonance; RESONANCE_COUNT] {
    [
        Resonance::new(55.38, 0.122),
        Resonance::new(55.98, 0.122),
        Resonance::new(57.27, 0.122),
    ]
}

impl FitConfig {
    /// Read a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: FitConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the configuration for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let axis = &self.energy_axis;
        if axis.samples < 2 {
            return Err(DcmFitError::Config(format!(
                "energy_axis.samples must be at least 2, got {}",
                axis.samples
            )));
        }
        if !(axis.start < axis.stop) {
            return Err(DcmFitError::Config(format!(
                "energy_axis must be ascending, got [{}, {}]",
                axis.start, axis.stop
            )));
        }
        if !(self.roi.lower < self.roi.upper) {
            return Err(DcmFitError::Config(format!(
                "roi bounds are inverted: [{}, {}]",
                self.roi.lower, self.roi.upper
            )));
        }
        if self.intensities.is_empty() {
            return Err(DcmFitError::Config("intensities must not be empty".to_string()));
        }
        if let Some(bad) = self.intensities.iter().find(|i| !i.is_finite()) {
            return Err(DcmFitError::Config(format!("intensity {} is not finite", bad)));
        }
        if self.seed_rows == 0 {
            return Err(DcmFitError::Config("seed_rows must be at least 1".to_string()));
        }
        if let Some(r) = self.resonances.iter().find(|r| !(r.nominal_width > 0.0)) {
            return Err(DcmFitError::Config(format!(
                "resonance at {} eV needs a positive nominal width",
                r.energy
            )));
        }
        if self.solver.max_iterations == 0 {
            return Err(DcmFitError::Config("solver.max_iterations must be at least 1".to_string()));
        }

        // Surfaces empty or NaN bounds as configuration errors
        self.bounds.parameter_bounds(&self.resonances)?;
        Ok(())
    }

    /// Build the energy axis described by `energy_axis`.
    pub fn energy_axis(&self) -> Result<EnergyAxis> {
        EnergyAxis::linspace(self.energy_axis.start, self.energy_axis.stop, self.energy_axis.samples)
    }

    /// Physical scaling constant applied to the summed line shapes.
    pub fn lineshape_constant(&self) -> f64 {
        self.physics.lineshape_constant()
    }

    /// Bounds for every entry of the flat parameter vector.
    pub fn parameter_bounds(&self) -> Result<Vec<Bounds>> {
        self.bounds.parameter_bounds(&self.resonances)
    }

    /// Starting point of the unconstrained seed fit.
    pub fn seed_guess(&self) -> FitParameters {
        self.initial_guess.parameters(&self.resonances)
    }
}

/// Evenly spaced photon-energy grid of the spectrometer (eV).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyAxisConfig {
    pub start: f64,
    pub stop: f64,
    pub samples: usize,
}

impl Default for EnergyAxisConfig {
    fn default() -> Self {
        Self {
            start: 51.012496,
            stop: 67.000271,
            samples: 1962,
        }
    }
}

/// Energy thresholds bounding the fitted sub-band (eV).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    pub lower: f64,
    pub upper: f64,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            lower: 55.15,
            upper: 57.45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Path-length density product in atomic units.
    pub path_length_density_au: f64,
    pub fine_structure_constant: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            path_length_density_au: 0.77,
            fine_structure_constant: 7.2973525693e-3,
        }
    }
}

impl PhysicsConfig {
    /// `pldp / ln(10) · 4π · α`
    pub fn lineshape_constant(&self) -> f64 {
        self.path_length_density_au / LN_10 * 4.0 * PI * self.fine_structure_constant
    }
}

/// Box constraints applied to every time-delay fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsPolicy {
    pub strength_min: f64,
    /// Phases are limited to `[-phase_limit, phase_limit]`.
    pub phase_limit: f64,
    /// Width bounds as multiples of each line's nominal width.
    pub width_min_factor: f64,
    pub width_max_factor: f64,
    pub background_min: f64,
    pub background_max: f64,
}

impl Default for BoundsPolicy {
    fn default() -> Self {
        Self {
            strength_min: 1e-6,
            phase_limit: 2.0 * PI,
            width_min_factor: 0.4,
            width_max_factor: 2.7,
            background_min: -15.0,
            background_max: 20.0,
        }
    }
}

impl BoundsPolicy {
    /// Per-parameter bounds in flat-vector order.
    ///
    /// # Errors
    ///
    /// * `DcmFitError::Config` if any resulting interval is empty or NaN
    pub fn parameter_bounds(&self, resonances: &[Resonance; RESONANCE_COUNT]) -> Result<Vec<Bounds>> {
        let interval = |min: f64, max: f64, what: &str| {
            Bounds::new(min, max).map_err(|e| DcmFitError::Config(format!("{} bounds: {}", what, e)))
        };

        let mut bounds = Vec::with_capacity(PARAMETER_COUNT);
        for resonance in resonances {
            bounds.push(interval(self.strength_min, f64::INFINITY, "strength")?);
            bounds.push(interval(-self.phase_limit, self.phase_limit, "phase")?);
            bounds.push(interval(
                self.width_min_factor * resonance.nominal_width,
                self.width_max_factor * resonance.nominal_width,
                "width",
            )?);
        }
        bounds.push(interval(self.background_min, self.background_max, "background")?);
        Ok(bounds)
    }
}

/// Starting point of the seed fit; widths start at each nominal width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialGuess {
    pub strength: f64,
    pub phase: f64,
    pub background: f64,
}

impl Default for InitialGuess {
    fn default() -> Self {
        Self {
            strength: 1.0,
            phase: 0.0,
            background: 0.0,
        }
    }
}

impl InitialGuess {
    pub fn parameters(&self, resonances: &[Resonance; RESONANCE_COUNT]) -> FitParameters {
        FitParameters::new(
            resonances.map(|r| ResonanceParams::new(self.strength, self.phase, r.nominal_width)),
            self.background,
        )
    }
}

/// Location and naming of the per-intensity spectrum files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub directory: PathBuf,
    pub prefix: String,
    pub suffix: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            prefix: "int".into(),
            suffix: ".csv".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("op.csv"),
        }
    }
}

/// What the driver does when a fit fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePolicy {
    /// Extra attempts per failing row, restarting from the intensity's seed.
    pub retries: usize,
    /// Skip an intensity whose fits fail instead of aborting the run.
    pub isolate_intensities: bool,
}
