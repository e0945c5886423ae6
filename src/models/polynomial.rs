//! Bivariate polynomial model.
//!
//! The fitter relies on two primitive operations:
//! - build a design row (the monomial values) for a point, used by the diagnostic
//! - evaluate `p(x, y)` given the coefficients, used for residuals and grids
//!
//! Both work in normalized coordinates and take the basis list explicitly.

use serde::{Deserialize, Serialize};

use crate::domain::BasisTerm;
use crate::math::basis::{basis_terms, max_degree, powers};

/// A basis list paired with its coefficients; `coefficients[i]` multiplies `basis[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPolynomial {
    degree: u32,
    basis: Vec<BasisTerm>,
    coefficients: Vec<f64>,
}

impl FittedPolynomial {
    /// Pair `coefficients` with the canonical basis of `degree`.
    ///
    /// Returns `None` when the coefficient count does not match the basis size.
    pub fn new(degree: u32, coefficients: Vec<f64>) -> Option<Self> {
        Self::from_basis(basis_terms(degree), coefficients)
    }

    /// Pair `coefficients` with an already enumerated basis list.
    pub fn from_basis(basis: Vec<BasisTerm>, coefficients: Vec<f64>) -> Option<Self> {
        if basis.is_empty() || basis.len() != coefficients.len() {
            return None;
        }
        Some(Self {
            degree: max_degree(&basis),
            basis,
            coefficients,
        })
    }

    pub fn degree(&self) -> u32 {
        self.degree
    }

    pub fn basis(&self) -> &[BasisTerm] {
        &self.basis
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Iterate `(term, coefficient)` pairs in basis order.
    pub fn terms(&self) -> impl Iterator<Item = (BasisTerm, f64)> + '_ {
        self.basis.iter().copied().zip(self.coefficients.iter().copied())
    }
}

/// Fill `out` with `x^p y^q` for every term of `basis`.
///
/// # Panics
/// Panics if `out.len() != basis.len()`.
pub fn fill_design_row(basis: &[BasisTerm], x: f64, y: f64, out: &mut [f64]) {
    assert_eq!(out.len(), basis.len(), "design row length must match basis");
    let n = max_degree(basis) as usize;
    let xs = powers(x, n);
    let ys = powers(y, n);
    for (slot, t) in out.iter_mut().zip(basis) {
        *slot = xs[t.p as usize] * ys[t.q as usize];
    }
}

/// Evaluate `Σ_i a_i x^{p_i} y^{q_i}` at a normalized point.
///
/// No domain restriction is applied; extrapolation is the caller's concern.
pub fn evaluate(poly: &FittedPolynomial, x: f64, y: f64) -> f64 {
    let n = poly.degree as usize;
    let xs = powers(x, n);
    let ys = powers(y, n);
    poly.terms()
        .map(|(t, a)| a * xs[t.p as usize] * ys[t.q as usize])
        .sum()
}
