//! Built-in model implementations.
//!
//! The only model this crate fits is the three-line dipole control model in
//! [`dcm`].

pub mod dcm;

pub use dcm::{dcm_lineshape, DcmModel, Resonance};
