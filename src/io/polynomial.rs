//! Read/write fitted polynomial JSON files.
//!
//! Polynomial JSON is the "portable" representation of a fit:
//! - degree and the normalization params needed to evaluate at raw pixels
//! - the `(p, q, coefficient)` terms in basis order
//! - fit quality (chi-squared, point count)
//!
//! On read, the term list must agree exactly with the basis enumerated for the
//! stored degree; anything else would silently reorder coefficients.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::NormalizationParams;
use crate::error::{FitError, Result};
use crate::fit::SurfaceFit;
use crate::math::basis_terms;
use crate::models::FittedPolynomial;

/// One coefficient entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolynomialTerm {
    pub p: u32,
    pub q: u32,
    pub coefficient: f64,
}

/// On-disk schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialFile {
    pub tool: String,
    pub degree: u32,
    pub normalization: NormalizationParams,
    pub terms: Vec<PolynomialTerm>,
    pub chi_squared: f64,
    pub n_points: usize,
}

impl PolynomialFile {
    pub fn from_fit(fit: &SurfaceFit) -> Self {
        Self {
            tool: "sfit".to_string(),
            degree: fit.degree(),
            normalization: fit.normalization,
            terms: fit
                .polynomial
                .terms()
                .map(|(t, coefficient)| PolynomialTerm {
                    p: t.p,
                    q: t.q,
                    coefficient,
                })
                .collect(),
            chi_squared: fit.chi_squared,
            n_points: fit.n_points(),
        }
    }

    /// Rebuild the polynomial, validating the term order against the basis.
    pub fn to_fitted(&self) -> Result<FittedPolynomial> {
        let basis = basis_terms(self.degree);
        if basis.len() != self.terms.len() {
            return Err(FitError::MalformedInput {
                line: 0,
                message: format!(
                    "degree {} needs {} terms, file has {}",
                    self.degree,
                    basis.len(),
                    self.terms.len()
                ),
            });
        }
        if let Some((i, t)) = basis
            .iter()
            .zip(&self.terms)
            .enumerate()
            .find(|(_, (b, t))| b.p != t.p || b.q != t.q)
            .map(|(i, (_, t))| (i, t))
        {
            return Err(FitError::MalformedInput {
                line: 0,
                message: format!(
                    "term {i} is x^{} y^{}, expected x^{} y^{}",
                    t.p, t.q, basis[i].p, basis[i].q
                ),
            });
        }
        let coefficients = self.terms.iter().map(|t| t.coefficient).collect();
        FittedPolynomial::from_basis(basis, coefficients).ok_or(FitError::MalformedInput {
            line: 0,
            message: "empty term list".to_string(),
        })
    }
}

/// Write a polynomial JSON file.
pub fn write_polynomial_json(path: &Path, fit: &SurfaceFit) -> Result<()> {
    let file = File::create(path).map_err(|e| FitError::io(path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &PolynomialFile::from_fit(fit))
        .map_err(|e| FitError::io(path, e))?;
    Ok(())
}

/// Read a polynomial JSON file.
pub fn read_polynomial_json(path: &Path) -> Result<PolynomialFile> {
    let file = File::open(path).map_err(|e| FitError::io(path, e))?;
    serde_json::from_reader(file).map_err(|e| FitError::MalformedInput {
        line: e.line(),
        message: format!("invalid polynomial JSON '{}': {e}", path.display()),
    })
}
