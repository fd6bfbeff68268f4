//! Fit engine.
//!
//! Fits the three-line [`DcmModel`] to one spectrum slice with the
//! Levenberg-Marquardt solver, either unconstrained or inside per-parameter
//! bounds, and estimates the parameter covariance at the optimum.

use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{DcmFitError, Result};
use crate::lm::{ConvergenceStatus, LevenbergMarquardt, LmConfig, LmResult};
use crate::model::ModelProblem;
use crate::models::DcmModel;
use crate::parameters::{Bounds, FitParameters};
use crate::problem::{BoundedProblem, Problem};
use crate::uncertainty::UncertaintyCalculator;

/// Parameters and uncertainties of one converged fit.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub params: FitParameters,
    /// One standard error per parameter, `sqrt(|diag(cov)|)`.
    pub std_errors: FitParameters,
    pub covariance: Array2<f64>,
    pub correlation: Array2<f64>,
    /// Sum of squared residuals at the optimum.
    pub cost: f64,
    pub iterations: usize,
    pub func_evals: usize,
    pub status: ConvergenceStatus,
}

/// Least-squares fitting of a [`DcmModel`] to measured spectra.
#[derive(Debug, Clone)]
pub struct FitEngine {
    model: DcmModel,
    solver: LevenbergMarquardt,
}

impl FitEngine {
    pub fn new(model: DcmModel, config: LmConfig) -> Self {
        Self {
            model,
            solver: LevenbergMarquardt::with_config(config),
        }
    }

    pub fn model(&self) -> &DcmModel {
        &self.model
    }

    pub fn max_iterations(&self) -> usize {
        self.solver.config().max_iterations
    }

    /// Copy of this engine with a different solver iteration budget.
    pub fn with_max_iterations(&self, max_iterations: usize) -> Self {
        Self {
            model: self.model.clone(),
            solver: self.solver.clone().with_max_iterations(max_iterations),
        }
    }

    /// Fit without bounds.
    ///
    /// # Arguments
    ///
    /// * `energies` - Energy sub-axis the data is sampled on
    /// * `data` - Measured optical density, one value per energy
    /// * `guess` - Starting parameters
    ///
    /// # Errors
    ///
    /// * `DcmFitError::FitConvergence` if the solver stops without converging
    /// * `DcmFitError::DimensionMismatch` if `energies` and `data` differ in length
    pub fn fit_unconstrained(
        &self,
        energies: ArrayView1<f64>,
        data: ArrayView1<f64>,
        guess: &FitParameters,
    ) -> Result<FitOutcome> {
        let problem = ModelProblem::new(&self.model, energies.reborrow(), data.reborrow())?;

        let lm = self.solver.minimize(&problem, guess.to_array())?;
        ensure_converged(&lm)?;

        let params = lm.params.clone();
        self.finish(&problem, params, &lm)
    }

    /// Fit with one [`Bounds`] per parameter.
    ///
    /// A guess outside the bounds is clamped into them before fitting.
    ///
    /// # Errors
    ///
    /// Same as [`fit_unconstrained`](Self::fit_unconstrained), plus
    /// `DcmFitError::DimensionMismatch` if the number of bounds is wrong.
    pub fn fit_bounded(
        &self,
        energies: ArrayView1<f64>,
        data: ArrayView1<f64>,
        guess: &FitParameters,
        bounds: &[Bounds],
    ) -> Result<FitOutcome> {
        let problem = ModelProblem::new(&self.model, energies.reborrow(), data.reborrow())?;
        let bounded = BoundedProblem::new(&problem, bounds)?;

        let external = guess.to_array();
        let clamped = bounded.clamp(&external);
        if clamped != external {
            warn!("Initial guess outside bounds, clamped: {:?} -> {:?}", external, clamped);
        }

        let internal = bounded.to_internal(&clamped)?;
        let lm = self.solver.minimize(&bounded, internal)?;
        ensure_converged(&lm)?;

        let params = bounded.to_external(&lm.params);
        self.finish(&problem, params, &lm)
    }

    /// Covariance in external parameters at the optimum.
    fn finish(&self, problem: &ModelProblem<'_, DcmModel>, params: Array1<f64>, lm: &LmResult) -> Result<FitOutcome> {
        let n = params.len();
        let calc = UncertaintyCalculator::new(problem.ndata(), problem.nvarys(), lm.cost);

        let covariance = match problem
            .jacobian(&params)
            .and_then(|jacobian| calc.calculate_covariance(&jacobian))
        {
            Ok(covariance) => covariance,
            Err(err) => {
                warn!("Covariance of the parameters could not be estimated: {}", err);
                Array2::from_elem((n, n), f64::INFINITY)
            }
        };
        let std_errors = calc.calculate_standard_errors(&covariance);
        let correlation = calc.calculate_correlation(&covariance);

        debug!(
            "Fit converged after {} iterations ({}), cost {:.6e}",
            lm.iterations, lm.message, lm.cost
        );

        Ok(FitOutcome {
            params: FitParameters::from_array(&params)?,
            std_errors: FitParameters::from_array(&std_errors)?,
            covariance,
            correlation,
            cost: lm.cost,
            iterations: lm.iterations,
            func_evals: lm.func_evals,
            status: lm.status,
        })
    }
}

fn ensure_converged(lm: &LmResult) -> Result<()> {
    if lm.success {
        Ok(())
    } else {
        Err(DcmFitError::FitConvergence(format!(
            "{} after {} iterations (cost {:.6e})",
            lm.message, lm.iterations, lm.cost
        )))
    }
}
