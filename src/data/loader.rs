//! Reading per-intensity spectra from CSV files.
//!
//! Each file holds one column per time delay, headed by the delay value, and
//! one row per energy sample. Spectra are transposed on load so that rows are
//! time delays.

use std::path::{Path, PathBuf};

use log::debug;
use ndarray::{Array1, Array2};

use super::{format_float, Spectrum};
use crate::error::{DcmFitError, Result};

/// Source of the spectrum recorded at a given intensity.
pub trait SpectrumSource {
    /// Load the spectrum for `intensity`.
    fn load(&self, intensity: f64) -> Result<Spectrum>;
}

/// Spectra stored as `{directory}/{prefix}{intensity}{suffix}`.
#[derive(Debug, Clone)]
pub struct CsvSpectrumSource {
    directory: PathBuf,
    prefix: String,
    suffix: String,
}

impl CsvSpectrumSource {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file holding the spectrum for `intensity`.
    pub fn path_for(&self, intensity: f64) -> PathBuf {
        self.directory
            .join(format!("{}{}{}", self.prefix, format_float(intensity), self.suffix))
    }
}

impl SpectrumSource for CsvSpectrumSource {
    fn load(&self, intensity: f64) -> Result<Spectrum> {
        let path = self.path_for(intensity);
        if !path.is_file() {
            return Err(DcmFitError::DataNotFound { path });
        }

        debug!("Reading spectrum from {}", path.display());
        read_spectrum_csv(&path)
    }
}

/// Parse a spectrum CSV file with time-delay headers.
pub fn read_spectrum_csv(path: &Path) -> Result<Spectrum> {
    let mut reader = csv::Reader::from_path(path)?;

    let time_delays = reader
        .headers()?
        .iter()
        .map(|h| parse_value(h, path, "header"))
        .collect::<Result<Vec<f64>>>()?;

    if time_delays.is_empty() {
        return Err(DcmFitError::DataFormat(format!(
            "{} has no time-delay columns",
            path.display()
        )));
    }

    let mut values = Vec::new();
    let mut n_energies = 0;
    for record in reader.records() {
        let record = record?;
        for field in record.iter() {
            values.push(parse_value(field, path, "value")?);
        }
        n_energies += 1;
    }

    // Stored as [energy, delay]; fitting works row-per-delay.
    let od = Array2::from_shape_vec((n_energies, time_delays.len()), values)
        .map_err(|e| DcmFitError::DataFormat(format!("{}: {}", path.display(), e)))?
        .reversed_axes()
        .as_standard_layout()
        .to_owned();

    Spectrum::new(od, Array1::from(time_delays))
}

fn parse_value(field: &str, path: &Path, what: &str) -> Result<f64> {
    field.trim().parse::<f64>().map_err(|_| {
        DcmFitError::DataFormat(format!(
            "{}: non-numeric {} {:?}",
            path.display(),
            what,
            field
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dcm-fit-loader-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_path_for_intensity() {
        let source = CsvSpectrumSource::new("/data", "int", ".csv");
        assert_eq!(source.path_for(1.3), PathBuf::from("/data/int1.3.csv"));
        assert_eq!(source.path_for(2.0), PathBuf::from("/data/int2.0.csv"));
    }

    #[test]
    fn test_load_transposes() {
        let dir = scratch_dir("transpose");
        fs::write(dir.join("int1.6.csv"), "-10.0,0.0,25.5\n1,2,3\n4,5,6\n").unwrap();

        let spectrum = CsvSpectrumSource::new(&dir, "int", ".csv").load(1.6).unwrap();
        assert_eq!(spectrum.n_delays(), 3);
        assert_eq!(spectrum.n_energies(), 2);
        assert_eq!(spectrum.time_delays().to_vec(), vec![-10.0, 0.0, 25.5]);
        assert_eq!(spectrum.row(0).to_vec(), vec![1.0, 4.0]);
        assert_eq!(spectrum.row(2).to_vec(), vec![3.0, 6.0]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file() {
        let dir = scratch_dir("missing");
        match CsvSpectrumSource::new(&dir, "int", ".csv").load(2.5) {
            Err(DcmFitError::DataNotFound { path }) => assert!(path.ends_with("int2.5.csv")),
            other => panic!("Expected DataNotFound, got {:?}", other),
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_non_numeric_header() {
        let dir = scratch_dir("header");
        fs::write(dir.join("int1.9.csv"), "delay_a,delay_b\n1,2\n").unwrap();

        let result = CsvSpectrumSource::new(&dir, "int", ".csv").load(1.9);
        assert!(matches!(result, Err(DcmFitError::DataFormat(_))));
        fs::remove_dir_all(&dir).ok();
    }
}
