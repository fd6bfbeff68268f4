//! Problem definition trait and implementations.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem to be solved with the Levenberg-Marquardt algorithm.
//! It also provides [`BoundedProblem`], which exposes a box-constrained problem
//! to the solver as an unconstrained one.

use ndarray::{Array1, Array2};

use crate::error::{DcmFitError, Result};
use crate::parameters::{Bounds, BoundsTransform};

/// A trait representing a nonlinear least squares problem.
///
/// This trait defines the interface for problems that can be solved using
/// the Levenberg-Marquardt algorithm.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the residuals
    ///
    /// # Returns
    ///
    /// * A vector of residuals, or an error if the evaluation fails
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix at the given parameters.
    ///
    /// The Jacobian is the matrix of partial derivatives of the residuals with respect
    /// to the parameters. The default implementation uses forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

/// Adapter that maps unbounded internal parameters onto a bounded problem.
///
/// The solver iterates on internal values; every evaluation converts them to
/// external values inside the bounds before calling the wrapped problem.
pub struct BoundedProblem<'a, P: Problem + ?Sized> {
    inner: &'a P,
    transforms: Vec<BoundsTransform>,
}

impl<'a, P: Problem + ?Sized> BoundedProblem<'a, P> {
    /// Wrap `inner` with one bounds entry per parameter.
    pub fn new(inner: &'a P, bounds: &[Bounds]) -> Result<Self> {
        if bounds.len() != inner.parameter_count() {
            return Err(DcmFitError::DimensionMismatch(format!(
                "Expected {} bounds, got {}",
                inner.parameter_count(),
                bounds.len()
            )));
        }

        Ok(Self {
            inner,
            transforms: bounds.iter().copied().map(BoundsTransform::new).collect(),
        })
    }

    /// Convert internal solver values to external (bounded) values.
    pub fn to_external(&self, internal: &Array1<f64>) -> Array1<f64> {
        internal
            .iter()
            .zip(self.transforms.iter())
            .map(|(&value, transform)| transform.to_external(value))
            .collect()
    }

    /// Convert external values to internal solver values.
    pub fn to_internal(&self, external: &Array1<f64>) -> Result<Array1<f64>> {
        if external.len() != self.transforms.len() {
            return Err(DcmFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                self.transforms.len(),
                external.len()
            )));
        }

        external
            .iter()
            .zip(self.transforms.iter())
            .map(|(&value, transform)| transform.to_internal(value).map_err(DcmFitError::from))
            .collect()
    }

    /// Clamp external values into the bounds.
    pub fn clamp(&self, external: &Array1<f64>) -> Array1<f64> {
        external
            .iter()
            .zip(self.transforms.iter())
            .map(|(&value, transform)| transform.bounds().clamp(value))
            .collect()
    }
}

impl<'a, P: Problem + ?Sized> Problem for BoundedProblem<'a, P> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.inner.eval(&self.to_external(params))
    }

    fn parameter_count(&self) -> usize {
        self.transforms.len()
    }

    fn residual_count(&self) -> usize {
        self.inner.residual_count()
    }
}
