//! Finite difference methods for numerical differentiation.
//!
//! The composite line-shape model has no hand-written derivatives, so the
//! solver and the covariance estimate both rely on the forward-difference
//! Jacobian computed here.

use crate::error::{DcmFitError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default relative step size for finite differences (about `sqrt(f64::EPSILON)`).
const DEFAULT_EPSILON: f64 = 1.5e-8;

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j].
///
/// The step for parameter `j` is `epsilon * max(|param_j|, 1)`, which keeps
/// the step from collapsing for parameters close to zero.
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The relative step size (optional)
pub fn jacobian<P: Problem + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    let residuals = problem.eval(params)?;

    if residuals.len() != n_residuals {
        return Err(DcmFitError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            n_residuals,
            residuals.len()
        )));
    }

    let mut jac = Array2::zeros((n_residuals, n_params));

    for j in 0..n_params {
        let mut params_perturbed = params.clone();
        let eps_j = eps * params[j].abs().max(1.0);
        params_perturbed[j] += eps_j;

        // Use the step actually taken after rounding
        let h = params_perturbed[j] - params[j];

        let residuals_perturbed = problem.eval(&params_perturbed)?;
        for i in 0..n_residuals {
            jac[[i, j]] = (residuals_perturbed[i] - residuals[i]) / h;
        }
    }

    Ok(jac)
}
