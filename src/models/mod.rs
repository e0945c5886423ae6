//! Polynomial surface model.
//!
//! The model is implemented as small, pure functions so that fitting, resampling
//! and diagnostics can share it.

pub mod polynomial;

pub use polynomial::*;
