//! Mathematical building blocks: monomial basis, coordinate normalization and
//! normal-equations least squares.

pub mod basis;
pub mod normalize;
pub mod ols;

pub use basis::*;
pub use normalize::*;
pub use ols::*;
