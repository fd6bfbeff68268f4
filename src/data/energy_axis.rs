//! Photon-energy grid and the region of interest used for fitting.

use std::ops::Range;

use ndarray::{s, Array1, ArrayView1};

use crate::error::{DcmFitError, Result};

/// Ascending photon-energy axis of the spectrometer (eV).
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyAxis {
    values: Array1<f64>,
}

impl EnergyAxis {
    /// Evenly spaced axis from `start` to `stop` inclusive.
    ///
    /// # Errors
    ///
    /// * `DcmFitError::InvalidInput` if fewer than two samples are requested
    ///   or the endpoints are not finite and ascending
    pub fn linspace(start: f64, stop: f64, samples: usize) -> Result<Self> {
        if samples < 2 {
            return Err(DcmFitError::InvalidInput(format!(
                "Energy axis needs at least 2 samples, got {}",
                samples
            )));
        }
        if !(start.is_finite() && stop.is_finite() && start < stop) {
            return Err(DcmFitError::InvalidInput(format!(
                "Energy axis bounds must be finite and ascending, got [{}, {}]",
                start, stop
            )));
        }

        Ok(Self {
            values: Array1::linspace(start, stop, samples),
        })
    }

    /// Wrap explicit energies, which must be strictly ascending.
    pub fn from_values(values: Array1<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(DcmFitError::InvalidInput("Energy axis is empty".to_string()));
        }
        if values.windows(2).into_iter().any(|w| !(w[0] < w[1])) {
            return Err(DcmFitError::InvalidInput(
                "Energy axis must be strictly ascending".to_string(),
            ));
        }

        Ok(Self { values })
    }

    pub fn values(&self) -> ArrayView1<f64> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Region of interest between two threshold energies.
    ///
    /// `first` is the first index whose energy is strictly greater than
    /// `lower`, `last` the first index strictly greater than `upper`.
    ///
    /// # Errors
    ///
    /// * `DcmFitError::RegionOfInterest` if either threshold has no axis
    ///   energy above it, or the resulting range is empty
    pub fn region_of_interest(&self, lower: f64, upper: f64) -> Result<RegionOfInterest> {
        let first = self.first_index_above(lower);
        let last = self.first_index_above(upper);

        match (first, last) {
            (Some(first), Some(last)) if first < last => Ok(RegionOfInterest { first, last }),
            (None, _) => Err(DcmFitError::RegionOfInterest {
                bound: lower,
                first,
                last,
            }),
            _ => Err(DcmFitError::RegionOfInterest {
                bound: upper,
                first,
                last,
            }),
        }
    }

    /// Energies inside `roi`.
    pub fn slice(&self, roi: &RegionOfInterest) -> ArrayView1<f64> {
        self.values.slice(s![roi.first..roi.last])
    }

    fn first_index_above(&self, threshold: f64) -> Option<usize> {
        self.values.iter().position(|&e| e > threshold)
    }
}

/// Contiguous index range `[first, last)` into an [`EnergyAxis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionOfInterest {
    first: usize,
    last: usize,
}

impl RegionOfInterest {
    pub fn first(&self) -> usize {
        self.first
    }

    pub fn last(&self) -> usize {
        self.last
    }

    pub fn range(&self) -> Range<usize> {
        self.first..self.last
    }

    pub fn len(&self) -> usize {
        self.last - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.first == self.last
    }

    /// Restrict a whole-axis row to the region of interest.
    ///
    /// # Errors
    ///
    /// * `DcmFitError::DataFormat` if the row is shorter than the region's end
    pub fn apply<'a>(&self, row: ArrayView1<'a, f64>) -> Result<ArrayView1<'a, f64>> {
        if row.len() < self.last {
            return Err(DcmFitError::DataFormat(format!(
                "Spectrum has {} energy samples, region of interest needs {}",
                row.len(),
                self.last
            )));
        }
        Ok(row.slice_move(s![self.first..self.last]))
    }
}
