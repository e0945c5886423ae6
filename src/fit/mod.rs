//! Surface fitting orchestration.
//!
//! Responsibilities:
//!
//! - run one fit end to end (`fitter`)
//! - verify the zero-gradient condition after the solve (`diagnostic`)
//! - resample a fitted surface on a regular pixel grid (`grid`)

pub mod diagnostic;
pub mod fitter;
pub mod grid;

pub use diagnostic::*;
pub use fitter::*;
pub use grid::*;
