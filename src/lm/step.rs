//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! This module computes the damped Gauss-Newton step
//! `(JᵀJ + λD) δ = -Jᵀr`, with `D` the diagonal of `JᵀJ` (Marquardt scaling).

use ndarray::{Array1, Array2};

use crate::error::{DcmFitError, Result};
use crate::lm::trust_region::TrustRegion;
use crate::utils::matrix_convert::{nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra};

/// Relative floor applied to the scaling diagonal so flat directions stay damped.
const MIN_RELATIVE_SCALE: f64 = 1e-10;

/// Result of a Levenberg-Marquardt step calculation.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The calculated step vector
    pub step: Array1<f64>,

    /// The predicted reduction in the sum of squared residuals
    pub predicted_reduction: f64,

    /// The damping parameter used to calculate the step
    pub lambda: f64,
}

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Calculates the Levenberg-Marquardt step.
    ///
    /// # Arguments
    ///
    /// * `jacobian` - The Jacobian matrix at the current position
    /// * `residuals` - The residuals at the current position
    /// * `trust_region` - The trust region controller
    pub fn calculate_step(
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        trust_region: &TrustRegion,
    ) -> Result<StepResult> {
        let j_t_j = jacobian.t().dot(jacobian);
        let j_t_r = jacobian.t().dot(residuals);

        let max_diag = j_t_j.diag().iter().fold(0.0_f64, |acc, &d| acc.max(d));
        let floor = (max_diag * MIN_RELATIVE_SCALE).max(f64::MIN_POSITIVE);

        let mut augmented = j_t_j.clone();
        for i in 0..augmented.nrows() {
            let scale = augmented[[i, i]].max(floor);
            augmented[[i, i]] += trust_region.lambda * scale;
        }

        let step = Self::solve(&augmented, &-&j_t_r)?;
        let predicted_reduction = Self::predicted_reduction(&j_t_j, &j_t_r, &step);

        Ok(StepResult {
            step,
            predicted_reduction,
            lambda: trust_region.lambda,
        })
    }

    /// Solves `A x = b`, trying Cholesky first and falling back to LU.
    fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
        let a_na = ndarray_to_nalgebra(a);
        let b_na = ndarray_vec_to_nalgebra(b);

        let x = match a_na.clone().cholesky() {
            Some(chol) => chol.solve(&b_na),
            None => a_na.lu().solve(&b_na).ok_or_else(|| {
                DcmFitError::LinearAlgebraError("Linear system solution failed".to_string())
            })?,
        };

        let x = nalgebra_vec_to_ndarray(&x);
        if x.iter().all(|v| v.is_finite()) {
            Ok(x)
        } else {
            Err(DcmFitError::SingularMatrix)
        }
    }

    /// Reduction of the sum of squares predicted by the linearized model.
    ///
    /// For `S(p) = |r|²` the linear model gives
    /// `S(p + δ) ≈ S(p) + 2 δ·Jᵀr + δᵀ JᵀJ δ`.
    fn predicted_reduction(j_t_j: &Array2<f64>, j_t_r: &Array1<f64>, step: &Array1<f64>) -> f64 {
        -(2.0 * step.dot(j_t_r) + step.dot(&j_t_j.dot(step)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_small_lambda_gives_gauss_newton_step() {
        // r = J p - y with J = I, so the Gauss-Newton step is -r
        let jacobian = array![[1.0, 0.0], [0.0, 1.0]];
        let residuals = array![2.0, -4.0];
        let mut tr = TrustRegion::new();
        tr.lambda = 1e-12;

        let result = LmStep::calculate_step(&jacobian, &residuals, &tr).unwrap();
        assert_relative_eq!(result.step[0], -2.0, epsilon = 1e-8);
        assert_relative_eq!(result.step[1], 4.0, epsilon = 1e-8);

        // Full Gauss-Newton step removes all of |r|² = 20
        assert_relative_eq!(result.predicted_reduction, 20.0, epsilon = 1e-6);
    }

    #[test]
    fn test_large_lambda_shrinks_step() {
        let jacobian = array![[1.0, 0.0], [0.0, 2.0], [1.0, 1.0]];
        let residuals = array![1.0, 1.0, 1.0];
        let mut tr = TrustRegion::new();

        tr.lambda = 1e-6;
        let small_damping = LmStep::calculate_step(&jacobian, &residuals, &tr).unwrap();
        tr.lambda = 1e6;
        let large_damping = LmStep::calculate_step(&jacobian, &residuals, &tr).unwrap();

        let norm = |v: &Array1<f64>| v.dot(v).sqrt();
        assert!(norm(&large_damping.step) < norm(&small_damping.step));
        assert!(large_damping.predicted_reduction > 0.0);
    }

    #[test]
    fn test_zero_column_is_handled() {
        // Second parameter has no influence on the residuals
        let jacobian = array![[1.0, 0.0], [2.0, 0.0]];
        let residuals = array![1.0, 2.0];
        let tr = TrustRegion::new();

        let result = LmStep::calculate_step(&jacobian, &residuals, &tr).unwrap();
        assert_eq!(result.step[1], 0.0);
        assert!(result.step[0] < 0.0);
    }
}
