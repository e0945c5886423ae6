//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input observations (`DataPoint`) and their summary stats
//! - the monomial basis term (`BasisTerm`) and coordinate transform (`NormalizationParams`)
//! - fit configuration and outputs (`FitConfig`, `FittedPoint`, `FitDiagnostics`)

pub mod types;

pub use types::*;
