//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides the damped least-squares solver behind every spectrum
//! fit. Bounds are not handled here; bounded fits wrap their problem in
//! [`BoundedProblem`](crate::problem::BoundedProblem) first.

pub mod algorithm;
pub mod config;
pub mod convergence;
pub mod step;
pub mod trust_region;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::LmConfig;
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
pub use step::{LmStep, StepResult};
pub use trust_region::TrustRegion;
