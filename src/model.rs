//! Model trait and its adapter to the solver.
//!
//! This module defines the Model trait, a parametric curve evaluated on an
//! independent-variable axis, and [`ModelProblem`], which turns a model plus
//! observed data into a least-squares [`Problem`].

use ndarray::{Array1, ArrayView1};

use crate::error::{DcmFitError, Result};
use crate::problem::Problem;

/// A trait representing a model that can be fit to data.
///
/// Models are stateless with respect to their parameters: the flat parameter
/// vector is passed on every evaluation, which lets the solver probe many
/// candidate vectors without mutating the model.
pub trait Model {
    /// Number of parameters the model expects.
    fn parameter_count(&self) -> usize;

    /// Evaluates the model at the given x values.
    ///
    /// # Arguments
    ///
    /// * `x` - The independent variable values at which to evaluate the model
    /// * `params` - The flat parameter vector
    ///
    /// # Returns
    ///
    /// * The model's predicted values, one per x value
    fn eval(&self, x: ArrayView1<f64>, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Calculates the residuals (y_pred - y_obs).
    fn residuals(&self, x: ArrayView1<f64>, y: ArrayView1<f64>, params: &Array1<f64>) -> Result<Array1<f64>> {
        let y_pred = self.eval(x, params)?;

        if y.len() != y_pred.len() {
            return Err(DcmFitError::DimensionMismatch(format!(
                "Expected {} observed values, got {}",
                y_pred.len(),
                y.len()
            )));
        }

        Ok(y_pred - &y)
    }
}

/// An adapter that implements Problem for Model implementations
///
/// This adapter allows Model implementations to be used with the LevenbergMarquardt
/// optimizer by pairing them with the data they are fit to.
pub struct ModelProblem<'a, M: Model + ?Sized> {
    /// The model being adapted
    model: &'a M,
    /// The x data for the fit
    x_data: ArrayView1<'a, f64>,
    /// The y data for the fit
    y_data: ArrayView1<'a, f64>,
}

impl<'a, M: Model + ?Sized> ModelProblem<'a, M> {
    /// Create a new ModelProblem adapter for a Model implementation
    ///
    /// # Errors
    ///
    /// * `DcmFitError::DimensionMismatch` if x and y differ in length
    pub fn new(model: &'a M, x_data: ArrayView1<'a, f64>, y_data: ArrayView1<'a, f64>) -> Result<Self> {
        if x_data.len() != y_data.len() {
            return Err(DcmFitError::DimensionMismatch(format!(
                "Expected x and y data to have the same length, got {} and {}",
                x_data.len(),
                y_data.len()
            )));
        }

        Ok(Self {
            model,
            x_data,
            y_data,
        })
    }

    /// Get a reference to the model
    pub fn model(&self) -> &M {
        self.model
    }

    /// Get the number of data points
    pub fn ndata(&self) -> usize {
        self.x_data.len()
    }

    /// Get the number of varying parameters
    pub fn nvarys(&self) -> usize {
        self.model.parameter_count()
    }
}

impl<'a, M: Model + ?Sized> Problem for ModelProblem<'a, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.model.residuals(self.x_data, self.y_data, params)
    }

    fn parameter_count(&self) -> usize {
        self.model.parameter_count()
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }
}
