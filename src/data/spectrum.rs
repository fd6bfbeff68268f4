//! Time-resolved optical-density spectrum for one intensity.

use ndarray::{s, Array1, Array2, ArrayView1, Axis};

use crate::error::{DcmFitError, Result};

/// Optical density indexed by `[time delay, energy sample]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    od: Array2<f64>,
    time_delays: Array1<f64>,
}

impl Spectrum {
    /// Create a spectrum whose rows are aligned with `time_delays`.
    ///
    /// # Errors
    ///
    /// * `DcmFitError::DataFormat` if the row count differs from the number of
    ///   time delays
    pub fn new(od: Array2<f64>, time_delays: Array1<f64>) -> Result<Self> {
        if od.nrows() != time_delays.len() {
            return Err(DcmFitError::DataFormat(format!(
                "Spectrum has {} rows but {} time delays",
                od.nrows(),
                time_delays.len()
            )));
        }

        Ok(Self { od, time_delays })
    }

    pub fn od(&self) -> &Array2<f64> {
        &self.od
    }

    pub fn time_delays(&self) -> ArrayView1<f64> {
        self.time_delays.view()
    }

    /// Number of time delays (rows).
    pub fn n_delays(&self) -> usize {
        self.od.nrows()
    }

    /// Number of energy samples per row.
    pub fn n_energies(&self) -> usize {
        self.od.ncols()
    }

    pub fn row(&self, index: usize) -> ArrayView1<f64> {
        self.od.row(index)
    }

    /// Element-wise mean of the first `count` rows.
    ///
    /// Uses every available row when the spectrum has fewer than `count`.
    ///
    /// # Errors
    ///
    /// * `DcmFitError::DataFormat` if the spectrum has no rows or `count` is zero
    pub fn mean_of_first_rows(&self, count: usize) -> Result<Array1<f64>> {
        let n = count.min(self.n_delays());
        if n == 0 {
            return Err(DcmFitError::DataFormat(
                "Cannot average zero spectrum rows".to_string(),
            ));
        }

        self.od
            .slice(s![..n, ..])
            .mean_axis(Axis(0))
            .ok_or_else(|| DcmFitError::DataFormat("Spectrum rows are empty".to_string()))
    }
}
