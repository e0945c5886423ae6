//! Post-fit derivative check.
//!
//! For every basis term `(p, q)` we recompute
//!
//! ```text
//! dChi2/da_pq ∝ Σ_k (p(x_k, y_k) - z_k) · x_k^p y_k^q
//! ```
//!
//! directly from the fitted polynomial, independently of the assembled matrix.
//! These are exactly the equations the assembler set to zero, so a successful
//! solve leaves each value at rounding-noise level. The check never feeds back
//! into the coefficients.

use rayon::prelude::*;

use crate::domain::DataPoint;
use crate::error::{FitError, Result};
use crate::models::{FittedPolynomial, evaluate, fill_design_row};

/// Gradient values (basis order) and the largest relative deviation among them.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeCheck {
    pub gradient: Vec<f64>,
    pub max_deviation: f64,
}

/// Compute the gradient for already-normalized `points`.
///
/// Each term's deviation is `|g| / max(Σ_k (Σ_j |a_j φ_j(k)| + |z_k|)·|x_k^p y_k^q|, 1)`.
pub fn derivative_gradient(points: &[DataPoint], poly: &FittedPolynomial) -> DerivativeCheck {
    let basis = poly.basis();
    let fitted: Vec<f64> = points.iter().map(|pt| evaluate(poly, pt.x, pt.y)).collect();
    let rows: Vec<Vec<f64>> = points
        .iter()
        .map(|pt| {
            let mut row = vec![0.0; basis.len()];
            fill_design_row(basis, pt.x, pt.y, &mut row);
            row
        })
        .collect();

    // Σ_j |a_j φ_j| per point bounds the rounding in p(x_k, y_k) even when terms cancel.
    let magnitudes: Vec<f64> = rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(poly.coefficients())
                .map(|(phi, a)| (phi * a).abs())
                .sum::<f64>()
        })
        .collect();

    let per_term: Vec<(f64, f64)> = (0..basis.len())
        .into_par_iter()
        .map(|i| {
            let mut g = 0.0;
            let mut scale = 0.0;
            for (k, pt) in points.iter().enumerate() {
                let phi = rows[k][i];
                g += (fitted[k] - pt.z) * phi;
                scale += (magnitudes[k] + pt.z.abs()) * phi.abs();
            }
            (g, g.abs() / scale.max(1.0))
        })
        .collect();

    let max_deviation = per_term.iter().fold(0.0_f64, |acc, &(_, d)| {
        if d.is_nan() { f64::INFINITY } else { acc.max(d) }
    });

    DerivativeCheck {
        gradient: per_term.into_iter().map(|(g, _)| g).collect(),
        max_deviation,
    }
}

/// Compute the gradient and fail with `FitValidation` if any term exceeds `tolerance`.
pub fn derivative_diagnostic(
    points: &[DataPoint],
    poly: &FittedPolynomial,
    tolerance: f64,
) -> Result<DerivativeCheck> {
    let check = derivative_gradient(points, poly);
    for (t, g) in poly.basis().iter().zip(&check.gradient) {
        tracing::debug!("dChi2/d{} = {g:.8}", t.label());
    }
    if !(check.max_deviation <= tolerance) {
        return Err(FitError::FitValidation {
            check: "derivative diagnostic",
            max_deviation: check.max_deviation,
            tolerance,
            degree: poly.degree(),
            points: points.len(),
        });
    }
    Ok(check)
}
