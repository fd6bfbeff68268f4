//! # Spectral Data
//!
//! The energy grid, the per-intensity spectra and where they are loaded from.

pub mod energy_axis;
pub mod loader;
pub mod spectrum;

pub use energy_axis::{EnergyAxis, RegionOfInterest};
pub use loader::{read_spectrum_csv, CsvSpectrumSource, SpectrumSource};
pub use spectrum::Spectrum;

/// Format a float the way file names, column labels and output cells spell it.
///
/// Whole numbers keep one decimal place (`2.0`), anything else uses the
/// shortest representation that round-trips (`1.3`).
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
