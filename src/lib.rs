//! `surface-fit` library crate.
//!
//! Least-squares fitting of a bivariate polynomial surface `z = Σ a_pq x^p y^q`
//! to scattered `(x, y, z)` points, via the normal equations.
//!
//! The binary (`sfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the fitter can be embedded without the CLI

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
