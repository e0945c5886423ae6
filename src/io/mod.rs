//! Input/output helpers.
//!
//! - whitespace text ingest + validation (`ingest`)
//! - fitted-vs-data and surface grid tables (`export`)
//! - polynomial JSON read/write (`polynomial`)

pub mod export;
pub mod ingest;
pub mod polynomial;

pub use export::*;
pub use ingest::*;
pub use polynomial::*;
