//! # Uncertainty Calculation
//!
//! Covariance, correlation and standard errors of fitted parameters, estimated
//! from the Jacobian at the optimum in the same way as lmfit-py and
//! `scipy.optimize.curve_fit` (covariance scaled by the reduced chi-square).

mod covariance;

pub use covariance::{calculate_correlation, calculate_covariance, standard_errors_from_covariance};

use ndarray::{Array1, Array2};

use crate::error::Result;

/// Calculator for parameter uncertainties.
#[derive(Debug, Clone)]
pub struct UncertaintyCalculator {
    /// Degrees of freedom (n_points - n_parameters)
    pub nfree: usize,
    /// Chi-square value at minimum
    pub chisqr: f64,
    /// Reduced chi-square (chi^2 / nfree)
    pub redchi: f64,
}

impl UncertaintyCalculator {
    /// Create a calculator for a fit of `nvarys` parameters to `ndata` points.
    pub fn new(ndata: usize, nvarys: usize, chisqr: f64) -> Self {
        let nfree = ndata.saturating_sub(nvarys);
        let redchi = if nfree > 0 {
            chisqr / nfree as f64
        } else {
            f64::INFINITY
        };

        Self {
            nfree,
            chisqr,
            redchi,
        }
    }

    /// Covariance matrix; infinite everywhere when there are no degrees of freedom.
    pub fn calculate_covariance(&self, jacobian: &Array2<f64>) -> Result<Array2<f64>> {
        if self.nfree == 0 {
            let n = jacobian.ncols();
            return Ok(Array2::from_elem((n, n), f64::INFINITY));
        }
        calculate_covariance(jacobian, self.redchi)
    }

    /// Standard errors from a covariance matrix.
    pub fn calculate_standard_errors(&self, covar: &Array2<f64>) -> Array1<f64> {
        standard_errors_from_covariance(covar)
    }

    /// Correlation matrix from a covariance matrix.
    pub fn calculate_correlation(&self, covar: &Array2<f64>) -> Array2<f64> {
        calculate_correlation(covar)
    }
}
