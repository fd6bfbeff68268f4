//! Utility functions and helpers for the dcm-fit library.

pub mod finite_difference;
pub mod matrix_convert;
