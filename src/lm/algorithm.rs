//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core implementation of the Levenberg-Marquardt algorithm
//! for nonlinear least-squares optimization.

use log::debug;
use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{DcmFitError, Result};
use crate::problem::Problem;

use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;
use super::trust_region::TrustRegion;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization succeeded
    pub success: bool,

    /// Why the iteration stopped
    pub status: ConvergenceStatus,

    /// A message describing the result
    pub message: String,

    /// The Jacobian matrix at the solution (if requested)
    pub jacobian: Option<Array2<f64>>,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// Outcome of the search for an acceptable step within one iteration.
enum StepOutcome {
    Accepted {
        params: Array1<f64>,
        residuals: Array1<f64>,
        cost: f64,
        predicted_reduction: f64,
    },
    Stopped(ConvergenceStatus),
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set whether to calculate and return the Jacobian at the solution.
    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.config.calc_jacobian = calc_jacobian;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// A run that stops without converging (iteration budget exhausted,
    /// damping saturated, non-finite cost) is reported through
    /// `LmResult::success == false`, not as an error. Errors are reserved for
    /// problems that cannot be evaluated at all.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    pub fn minimize<P: Problem + ?Sized>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
    ) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(DcmFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let criteria = ConvergenceCriteria::new(
            self.config.xtol,
            self.config.ftol,
            self.config.gtol,
            self.config.max_iterations,
        );
        let mut trust_region = TrustRegion::from_config(&self.config);

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut cost = sum_of_squares(&residuals);
        let mut func_evals = 1;
        let mut iterations = 0;

        let status = if cost.is_finite() {
            loop {
                if iterations >= self.config.max_iterations {
                    break ConvergenceStatus::MaxIterationsReached;
                }

                let jacobian = problem.jacobian(&params)?;
                func_evals += n_params;

                let gradient = jacobian.t().dot(&residuals);
                let gradient_norm = gradient.iter().fold(0.0_f64, |acc, g| acc.max(g.abs()));
                if criteria.gradient_converged(gradient_norm) {
                    break ConvergenceStatus::GradientConvergence;
                }

                let outcome = self.search_step(
                    problem,
                    &criteria,
                    &mut trust_region,
                    &jacobian,
                    &params,
                    &residuals,
                    cost,
                    &mut func_evals,
                );

                match outcome {
                    StepOutcome::Accepted {
                        params: new_params,
                        residuals: new_residuals,
                        cost: new_cost,
                        predicted_reduction,
                    } => {
                        iterations += 1;
                        let status = criteria.check(
                            &params,
                            &new_params,
                            cost,
                            new_cost,
                            predicted_reduction,
                            iterations,
                        );

                        debug!(
                            "LM iteration {}: cost {:.6e} -> {:.6e}, lambda {:.2e}",
                            iterations, cost, new_cost, trust_region.lambda
                        );

                        params = new_params;
                        residuals = new_residuals;
                        cost = new_cost;

                        if status.is_terminated() {
                            break status;
                        }
                    }
                    StepOutcome::Stopped(status) => break status,
                }
            }
        } else {
            ConvergenceStatus::NumericalError
        };

        let jacobian = if self.config.calc_jacobian {
            Some(problem.jacobian(&params)?)
        } else {
            None
        };

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success: status.is_converged(),
            status,
            message: status.description(),
            jacobian,
        })
    }

    /// Increase the damping until a step reduces the cost or the search stalls.
    #[allow(clippy::too_many_arguments)]
    fn search_step<P: Problem + ?Sized>(
        &self,
        problem: &P,
        criteria: &ConvergenceCriteria,
        trust_region: &mut TrustRegion,
        jacobian: &Array2<f64>,
        params: &Array1<f64>,
        residuals: &Array1<f64>,
        cost: f64,
        func_evals: &mut usize,
    ) -> StepOutcome {
        loop {
            let step = match LmStep::calculate_step(jacobian, residuals, trust_region) {
                Ok(step) => step,
                Err(err) => {
                    debug!("LM step failed at lambda {:.2e}: {}", trust_region.lambda, err);
                    if trust_region.is_saturated() {
                        return StepOutcome::Stopped(ConvergenceStatus::NumericalError);
                    }
                    trust_region.increase();
                    continue;
                }
            };

            let new_params = params + &step.step;
            let new_residuals = match problem.eval(&new_params) {
                Ok(r) => r,
                Err(err) => {
                    debug!("LM trial evaluation failed: {}", err);
                    Array1::from_elem(residuals.len(), f64::NAN)
                }
            };
            *func_evals += 1;
            let new_cost = sum_of_squares(&new_residuals);

            let gain = TrustRegion::gain_ratio(cost, new_cost, step.predicted_reduction);
            if trust_region.update_lambda(gain) {
                return StepOutcome::Accepted {
                    params: new_params,
                    residuals: new_residuals,
                    cost: new_cost,
                    predicted_reduction: step.predicted_reduction,
                };
            }

            // Rejected: stop if even the linear model sees no meaningful improvement
            if criteria.reduction_converged(cost, cost, step.predicted_reduction) {
                return StepOutcome::Stopped(ConvergenceStatus::FunctionValueConvergence);
            }

            if trust_region.is_saturated() {
                return StepOutcome::Stopped(ConvergenceStatus::DampingSaturated);
            }
        }
    }
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r.powi(2)).sum()
}
