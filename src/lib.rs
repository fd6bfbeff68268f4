//! # dcm-fit
//!
//! `dcm-fit` extracts line strength, dipole phase and line width of three
//! absorption resonances from time-resolved optical-density spectra recorded
//! at several pump intensities.
//!
//! The library provides:
//! - The dipole control model (DCM) line shape and its three-line composite
//! - A Levenberg-Marquardt solver with box constraints and covariance estimates
//! - A sequential driver that seeds each intensity from an averaged spectrum
//!   and warm-starts every time-delay fit from the previous one
//! - CSV input of spectra and CSV output of the fitted parameters
//!
//! ## Basic Usage
//!
//! ```no_run
//! use dcm_fit::{FitConfig, SequentialFitDriver};
//!
//! let config = FitConfig::default();
//! let report = SequentialFitDriver::from_config(&config)?.run()?;
//! report.table.write_csv(&config.output.path)?;
//! # Ok::<(), dcm_fit::DcmFitError>(())
//! ```

// Public modules
pub mod config;
pub mod data;
pub mod driver;
pub mod error;
pub mod fit;
pub mod lm;
pub mod model;
pub mod models;
pub mod parameters;
pub mod problem;
pub mod results;
pub mod uncertainty;

mod utils;

// Re-exports for convenience
pub use config::FitConfig;
pub use data::{CsvSpectrumSource, EnergyAxis, RegionOfInterest, Spectrum, SpectrumSource};
pub use driver::{DriverReport, IntensityFit, SequentialFitDriver};
pub use error::{DcmFitError, Result};
pub use fit::{FitEngine, FitOutcome};
pub use lm::LevenbergMarquardt;
pub use models::{DcmModel, Resonance};
pub use parameters::{wrap_phase, FitParameters, ResonanceParams};
pub use problem::Problem;
pub use results::ResultTable;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
