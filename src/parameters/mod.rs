//! # Parameter System
//!
//! - [`FitParameters`]: the named record of three `(strength, phase, width)`
//!   triples plus a background offset, with conversion to and from the flat
//!   vector the solver works on
//! - [`Bounds`] and [`BoundsTransform`]: box constraints handled through the
//!   Minuit-style internal/external transformation

pub mod bounds;
pub mod fit_parameters;

// Re-export key types
pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use fit_parameters::{
    wrap_phase, FitParameters, ResonanceParams, PARAMETER_COUNT, RESONANCE_COUNT,
    VALUES_PER_RESONANCE,
};
