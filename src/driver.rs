//! Sequential fit driver.
//!
//! For every intensity the driver
//!
//! 1. loads the spectrum and averages its leading rows into a seed spectrum,
//! 2. fits the seed without bounds to obtain a starting point,
//! 3. fits every row in stored order inside the parameter bounds, each fit
//!    warm-started from the previous row's result after normalization.
//!
//! Intensities are independent of each other: nothing but the result table
//! carries over from one to the next.

use log::{info, warn};
use ndarray::{Array1, ArrayView1};

use crate::config::{FailurePolicy, FitConfig};
use crate::data::{format_float, CsvSpectrumSource, EnergyAxis, RegionOfInterest, Spectrum, SpectrumSource};
use crate::error::{DcmFitError, Result};
use crate::fit::{FitEngine, FitOutcome};
use crate::models::DcmModel;
use crate::parameters::{Bounds, FitParameters};
use crate::results::ResultTable;

/// All fits of one intensity, in spectrum row order.
#[derive(Debug, Clone)]
pub struct IntensityFit {
    pub intensity: f64,
    pub time_delays: Array1<f64>,
    /// Unconstrained fit of the averaged seed spectrum.
    pub seed: FitOutcome,
    pub rows: Vec<FitOutcome>,
    /// Rows that only converged after a retry.
    pub retried_rows: Vec<usize>,
}

/// Outcome of a full run.
#[derive(Debug)]
pub struct DriverReport {
    pub table: ResultTable,
    /// Intensities skipped because their fits failed, with the cause.
    pub failed: Vec<(f64, DcmFitError)>,
}

impl DriverReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs the seed-then-chain fit over every configured intensity.
pub struct SequentialFitDriver<S: SpectrumSource> {
    source: S,
    engine: FitEngine,
    axis: EnergyAxis,
    roi: RegionOfInterest,
    intensities: Vec<f64>,
    seed_rows: usize,
    seed_guess: FitParameters,
    bounds: Vec<Bounds>,
    failure: FailurePolicy,
    current_guess: FitParameters,
    results: ResultTable,
}

impl SequentialFitDriver<CsvSpectrumSource> {
    /// Driver reading `{prefix}{intensity}{suffix}` files from the configured directory.
    pub fn from_config(config: &FitConfig) -> Result<Self> {
        let source = CsvSpectrumSource::new(
            config.data.directory.clone(),
            config.data.prefix.clone(),
            config.data.suffix.clone(),
        );
        Self::new(config, source)
    }
}

impl<S: SpectrumSource> SequentialFitDriver<S> {
    /// Create a driver for `config` reading spectra from `source`.
    ///
    /// # Errors
    ///
    /// * `DcmFitError::Config` if the configuration is invalid
    /// * `DcmFitError::RegionOfInterest` if the ROI bounds do not fall on the axis
    pub fn new(config: &FitConfig, source: S) -> Result<Self> {
        config.validate()?;

        let axis = config.energy_axis()?;
        let roi = axis.region_of_interest(config.roi.lower, config.roi.upper)?;
        let model = DcmModel::new(config.resonances, config.lineshape_constant());
        let seed_guess = config.seed_guess();

        Ok(Self {
            source,
            engine: FitEngine::new(model, config.solver.clone()),
            axis,
            roi,
            intensities: config.intensities.clone(),
            seed_rows: config.seed_rows,
            seed_guess,
            bounds: config.parameter_bounds()?,
            failure: config.failure.clone(),
            current_guess: seed_guess,
            results: ResultTable::new(),
        })
    }

    pub fn roi(&self) -> RegionOfInterest {
        self.roi
    }

    pub fn engine(&self) -> &FitEngine {
        &self.engine
    }

    /// Guess the next row fit will start from (before normalization).
    pub fn current_guess(&self) -> &FitParameters {
        &self.current_guess
    }

    pub fn results(&self) -> &ResultTable {
        &self.results
    }

    /// Fit every intensity and return the collected results.
    ///
    /// Without `isolate_intensities` the first failure aborts the run and
    /// discards all results.
    pub fn run(mut self) -> Result<DriverReport> {
        let mut failed = Vec::new();

        for intensity in self.intensities.clone() {
            let outcome = self
                .fit_intensity(intensity)
                .and_then(|fit| self.results.insert(fit.intensity, fit.time_delays.view(), &fit.rows));

            match outcome {
                Ok(()) => {}
                Err(err) if self.failure.isolate_intensities => {
                    warn!("Skipping intensity {}: {}", format_float(intensity), err);
                    failed.push((intensity, err));
                }
                Err(err) => return Err(err),
            }
        }

        Ok(DriverReport {
            table: self.results,
            failed,
        })
    }

    /// Seed and chain-fit a single intensity.
    pub fn fit_intensity(&mut self, intensity: f64) -> Result<IntensityFit> {
        let spectrum = self.source.load(intensity)?;
        let seed = self.seed(&spectrum)?;
        info!(
            "Intensity {}: seed fit converged in {} iterations",
            format_float(intensity),
            seed.iterations
        );

        self.current_guess = seed.params;
        let energies = self.axis.slice(&self.roi).to_owned();

        let mut rows = Vec::with_capacity(spectrum.n_delays());
        let mut retried_rows = Vec::new();
        for row in 0..spectrum.n_delays() {
            info!("{:.1}  {}", intensity, row);

            let data = self.roi.apply(spectrum.row(row))?;
            let (outcome, retries) = self.fit_row(energies.view(), data, &seed.params)?;
            if retries > 0 {
                retried_rows.push(row);
            }

            self.current_guess = outcome.params;
            rows.push(outcome);
        }

        Ok(IntensityFit {
            intensity,
            time_delays: spectrum.time_delays().to_owned(),
            seed,
            rows,
            retried_rows,
        })
    }

    /// Unconstrained fit of the mean of the leading `seed_rows` rows.
    pub fn seed(&self, spectrum: &Spectrum) -> Result<FitOutcome> {
        if spectrum.n_delays() < self.seed_rows {
            warn!(
                "Spectrum has only {} rows, seeding from all of them instead of {}",
                spectrum.n_delays(),
                self.seed_rows
            );
        }

        let mean = spectrum.mean_of_first_rows(self.seed_rows)?;
        let data = self.roi.apply(mean.view())?;
        let energies = self.axis.slice(&self.roi);

        self.engine.fit_unconstrained(energies, data, &self.seed_guess)
    }

    /// Bounded fit of one row from the normalized current guess.
    ///
    /// Convergence failures are retried up to `failure.retries` times from
    /// `fallback`. Retry `k` runs with `2^k` times the configured iteration
    /// budget, so no retry repeats an earlier attempt. Returns the outcome and
    /// the number of retries it took.
    fn fit_row(
        &self,
        energies: ArrayView1<f64>,
        data: ArrayView1<f64>,
        fallback: &FitParameters,
    ) -> Result<(FitOutcome, usize)> {
        let guess = self.current_guess.normalized();
        let mut err = match self.engine.fit_bounded(energies, data, &guess, &self.bounds) {
            Ok(outcome) => return Ok((outcome, 0)),
            Err(err) => err,
        };

        let guess = fallback.normalized();
        for attempt in 1..=self.failure.retries {
            if !err.is_convergence_failure() {
                break;
            }

            let budget = self
                .engine
                .max_iterations()
                .saturating_mul(2usize.saturating_pow(attempt as u32));
            warn!(
                "Row fit failed ({}), retry {}/{} from the seed parameters with {} iterations",
                err, attempt, self.failure.retries, budget
            );

            match self
                .engine
                .with_max_iterations(budget)
                .fit_bounded(energies, data, &guess, &self.bounds)
            {
                Ok(outcome) => return Ok((outcome, attempt)),
                Err(next) => err = next,
            }
        }

        Err(err)
    }
}
