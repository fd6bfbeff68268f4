//! Integration tests for LM optimization algorithm.

use approx::assert_relative_eq;
use dcm_fit::lm::{ConvergenceStatus, LevenbergMarquardt, LmConfig};
use dcm_fit::parameters::Bounds;
use dcm_fit::problem::BoundedProblem;
use dcm_fit::{DcmFitError, Problem, Result};
use ndarray::{array, Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// A simple linear model for testing: f(x) = a * x + b
struct LinearModel {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl Problem for LinearModel {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != 2 {
            return Err(DcmFitError::DimensionMismatch(format!(
                "Expected 2 parameters, got {}",
                params.len()
            )));
        }

        let (a, b) = (params[0], params[1]);
        Ok(self
            .x_data
            .iter()
            .zip(self.y_data.iter())
            .map(|(x, y)| a * x + b - y)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }

    // Custom Jacobian implementation for the linear model
    fn jacobian(&self, _params: &Array1<f64>) -> Result<Array2<f64>> {
        let n = self.x_data.len();
        let mut jac = Array2::zeros((n, 2));
        for i in 0..n {
            jac[[i, 0]] = self.x_data[i];
            jac[[i, 1]] = 1.0;
        }
        Ok(jac)
    }
}

/// f(x) = a * exp(-b * x), finite-difference Jacobian
struct ExponentialModel {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl Problem for ExponentialModel {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (a, b) = (params[0], params[1]);
        Ok(self
            .x_data
            .iter()
            .zip(self.y_data.iter())
            .map(|(x, y)| a * (-b * x).exp() - y)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }
}

/// Rosenbrock function as a least-squares problem: r = [10(y - x²), 1 - x]
struct RosenbrockProblem;

impl Problem for RosenbrockProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (x, y) = (params[0], params[1]);
        Ok(array![10.0 * (y - x * x), 1.0 - x])
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        2
    }
}

/// Lorentzian peak: f(x) = h / (1 + ((x - c) / w)²)
struct LorentzianProblem {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl Problem for LorentzianProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (h, c, w) = (params[0], params[1], params[2]);
        Ok(self
            .x_data
            .iter()
            .zip(self.y_data.iter())
            .map(|(x, y)| h / (1.0 + ((x - c) / w).powi(2)) - y)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        3
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }
}

fn noisy(values: Array1<f64>, sigma: f64, seed: u64) -> Array1<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sigma).unwrap();
    values.mapv(|v| v + noise.sample(&mut rng))
}

#[test]
fn test_linear_fit() {
    let x = Array1::<f64>::linspace(0.0, 10.0, 20);
    let y = noisy(x.mapv(|v| 2.0 * v + 3.0), 0.05, 1);
    let model = LinearModel { x_data: x, y_data: y };

    let result = LevenbergMarquardt::new().minimize(&model, array![1.0, 1.0]).unwrap();

    assert!(result.success);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 0.05);
    assert_relative_eq!(result.params[1], 3.0, epsilon = 0.1);
    assert!(result.cost < 0.2);
}

#[test]
fn test_exponential_fit() {
    let x = Array1::<f64>::linspace(0.0, 5.0, 30);
    let y = x.mapv(|v| 2.0 * (-0.5 * v).exp());
    let model = ExponentialModel { x_data: x, y_data: y };

    let result = LevenbergMarquardt::new().minimize(&model, array![1.0, 0.1]).unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 1e-5);
    assert_relative_eq!(result.params[1], 0.5, epsilon = 1e-5);
    assert!(result.cost < 1e-10);
}

#[test]
fn test_rosenbrock_optimization() {
    let lm = LevenbergMarquardt::new().with_max_iterations(1000);
    let result = lm.minimize(&RosenbrockProblem, array![-1.2, 1.0]).unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.params[0], 1.0, epsilon = 1e-4);
    assert_relative_eq!(result.params[1], 1.0, epsilon = 1e-4);
    assert!(result.cost < 1e-8);
}

#[test]
fn test_max_iterations() {
    let lm = LevenbergMarquardt::new().with_max_iterations(2);
    let result = lm.minimize(&RosenbrockProblem, array![-1.2, 1.0]).unwrap();

    assert!(!result.success);
    assert_eq!(result.status, ConvergenceStatus::MaxIterationsReached);
    assert!(result.message.contains("maximum iterations"));
    assert_eq!(result.iterations, 2);
}

#[test]
fn test_wrong_initial_length() {
    let result = LevenbergMarquardt::new().minimize(&RosenbrockProblem, array![1.0]);
    assert!(matches!(result, Err(DcmFitError::DimensionMismatch(_))));
}

#[test]
fn test_damping_parameter() {
    let x = Array1::<f64>::linspace(0.0, 10.0, 20);
    let y = x.mapv(|v| 2.0 * v + 3.0);
    let model = LinearModel { x_data: x, y_data: y };

    for lambda in [1e-6, 1e3] {
        let config = LmConfig {
            initial_lambda: lambda,
            ..LmConfig::default()
        };
        let result = LevenbergMarquardt::with_config(config)
            .minimize(&model, array![0.0, 0.0])
            .unwrap();

        assert!(result.success, "lambda {}: {}", lambda, result);
        assert_relative_eq!(result.params[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(result.params[1], 3.0, epsilon = 1e-6);
    }
}

#[test]
fn test_calc_jacobian() {
    let x = array![0.0, 1.0, 2.0];
    let model = LinearModel {
        x_data: x.clone(),
        y_data: array![1.0, 3.0, 5.0],
    };

    let result = LevenbergMarquardt::new()
        .with_calc_jacobian(true)
        .minimize(&model, array![0.0, 0.0])
        .unwrap();

    let jacobian = result.jacobian.expect("jacobian requested");
    assert_eq!(jacobian.shape(), &[3, 2]);
    assert_eq!(jacobian[[2, 0]], 2.0);
}

#[test]
fn test_bounded_lorentzian() {
    let x = Array1::<f64>::linspace(-5.0, 5.0, 101);
    let y = noisy(x.mapv(|v| 3.0 / (1.0 + ((v - 0.5) / 0.8).powi(2))), 0.01, 7);
    let problem = LorentzianProblem { x_data: x, y_data: y };

    let bounds = [
        Bounds::min_only(0.0),
        Bounds::new(-1.0, 1.0).unwrap(),
        Bounds::new(0.1, 2.0).unwrap(),
    ];
    let bounded = BoundedProblem::new(&problem, &bounds).unwrap();
    let initial = bounded.to_internal(&array![1.0, 0.0, 1.5]).unwrap();

    let result = LevenbergMarquardt::new().minimize(&bounded, initial).unwrap();
    let fitted = bounded.to_external(&result.params);

    assert!(result.success, "{}", result);
    assert_relative_eq!(fitted[0], 3.0, epsilon = 0.05);
    assert_relative_eq!(fitted[1], 0.5, epsilon = 0.02);
    assert_relative_eq!(fitted[2], 0.8, epsilon = 0.02);
}

#[test]
fn test_bound_active_at_optimum() {
    // True center lies outside the allowed interval; the fit stops on the bound
    let x = Array1::<f64>::linspace(-5.0, 5.0, 101);
    let y = x.mapv(|v| 3.0 / (1.0 + ((v - 2.0) / 0.8).powi(2)));
    let problem = LorentzianProblem { x_data: x, y_data: y };

    let bounds = [
        Bounds::unbounded(),
        Bounds::new(-1.0, 1.0).unwrap(),
        Bounds::new(0.1, 5.0).unwrap(),
    ];
    let bounded = BoundedProblem::new(&problem, &bounds).unwrap();
    let initial = bounded.to_internal(&array![1.0, 0.0, 1.0]).unwrap();

    let result = LevenbergMarquardt::new().minimize(&bounded, initial).unwrap();
    let fitted = bounded.to_external(&result.params);

    assert!(fitted[1] <= 1.0 && fitted[1] > 0.95, "center {}", fitted[1]);
}
