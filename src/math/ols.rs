//! Normal-equations least squares.
//!
//! We minimize
//!
//! ```text
//! Chi2 = Σ_k (p(x_k, y_k) - z_k)^2,    p(x, y) = Σ_i a_i x^{p_i} y^{q_i}
//! ```
//!
//! by setting `dChi2/da_i = 0` for every basis term, which gives the square system
//! `A·a = b` with
//!
//! ```text
//! A[row][col] = Σ_k x_k^(p_row + p_col) y_k^(q_row + q_col)
//! b[row]      = Σ_k z_k x_k^p_row y_k^q_row
//! ```
//!
//! Implementation choices:
//! - `A` only depends on the exponent sums, so we accumulate a moment table
//!   `M[a][b] = Σ_k x_k^a y_k^b` for `a + b <= 2n` and fill `A` from it. This
//!   makes `A` exactly symmetric and keeps every entry a sequential sum in
//!   input order (deterministic), while rayon spreads moment rows over threads.
//! - The system is solved with LU (partial pivoting). Forming the normal
//!   equations squares the condition number of the design matrix, so high
//!   condition numbers are expected and accepted; the post-solve checks judge
//!   the result. Only a numerically rank-deficient matrix is refused: smallest
//!   singular value `<= m · ε · σ_max`, the usual matrix-rank tolerance.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{BasisTerm, DataPoint};
use crate::math::basis::{max_degree, powers};

/// Reciprocal condition below which an `m × m` matrix counts as rank deficient.
pub fn rank_tolerance(m: usize) -> f64 {
    m.max(1) as f64 * f64::EPSILON
}

/// The assembled `m × m` system; index `i` corresponds to `basis[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalEquations {
    pub matrix: DMatrix<f64>,
    pub rhs: DVector<f64>,
}

impl NormalEquations {
    pub fn size(&self) -> usize {
        self.rhs.len()
    }

    /// Gram structure check: `A[a][b] == A[b][a]` for all entries.
    pub fn is_symmetric(&self) -> bool {
        let m = self.size();
        (0..m).all(|i| (0..i).all(|j| self.matrix[(i, j)] == self.matrix[(j, i)]))
    }

    /// Largest per-row relative deviation `|(A·a)_i - b_i| / max(Σ_j |A_ij a_j| + |b_i|, 1)`.
    pub fn max_relative_residual(&self, coefficients: &[f64]) -> f64 {
        let m = self.size();
        let mut worst = 0.0_f64;
        for i in 0..m {
            let b_i = self.rhs[i];
            let mut lhs = 0.0;
            let mut magnitude = b_i.abs();
            for (j, &a_j) in coefficients.iter().enumerate().take(m) {
                let term = self.matrix[(i, j)] * a_j;
                lhs += term;
                magnitude += term.abs();
            }
            let deviation = (lhs - b_i).abs() / magnitude.max(1.0);
            if deviation.is_nan() {
                return f64::INFINITY;
            }
            worst = worst.max(deviation);
        }
        worst
    }
}

/// Successful solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Solved {
    pub coefficients: Vec<f64>,
    /// Largest / smallest singular value of `A`.
    pub condition: f64,
}

/// The system could not be solved; carries the condition estimate for context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Singular {
    pub condition: f64,
}

/// Build the normal equations for already-normalized `points`.
pub fn assemble_normal_equations(points: &[DataPoint], basis: &[BasisTerm]) -> NormalEquations {
    let m = basis.len();
    let max_pow = 2 * max_degree(basis) as usize;

    let x_pows: Vec<Vec<f64>> = points.iter().map(|p| powers(p.x, max_pow)).collect();
    let y_pows: Vec<Vec<f64>> = points.iter().map(|p| powers(p.y, max_pow)).collect();

    // moments[a][b] = Σ_k x_k^a y_k^b, for b <= max_pow - a.
    let moments: Vec<Vec<f64>> = (0..=max_pow)
        .into_par_iter()
        .map(|a| {
            (0..=(max_pow - a))
                .map(|b| {
                    x_pows
                        .iter()
                        .zip(&y_pows)
                        .map(|(xs, ys)| xs[a] * ys[b])
                        .sum::<f64>()
                })
                .collect()
        })
        .collect();

    let mut matrix = DMatrix::<f64>::zeros(m, m);
    for (row, r) in basis.iter().enumerate() {
        for (col, c) in basis.iter().enumerate() {
            matrix[(row, col)] = moments[(r.p + c.p) as usize][(r.q + c.q) as usize];
        }
    }

    let rhs: Vec<f64> = basis
        .par_iter()
        .map(|t| {
            points
                .iter()
                .zip(x_pows.iter().zip(&y_pows))
                .map(|(pt, (xs, ys))| pt.z * xs[t.p as usize] * ys[t.q as usize])
                .sum::<f64>()
        })
        .collect();

    NormalEquations {
        matrix,
        rhs: DVector::from_vec(rhs),
    }
}

/// Condition estimate `σ_max / σ_min` of a square matrix (infinite when singular).
pub fn condition_estimate(matrix: &DMatrix<f64>) -> f64 {
    let sv = matrix.clone().svd(false, false).singular_values;
    if sv.is_empty() {
        return f64::INFINITY;
    }
    let max = sv.max();
    let min = sv.min();
    if !(min > 0.0) || !max.is_finite() {
        return f64::INFINITY;
    }
    max / min
}

/// Solve `A·a = b`.
pub fn solve_normal_equations(system: &NormalEquations) -> Result<Solved, Singular> {
    let condition = condition_estimate(&system.matrix);
    if !(condition.is_finite() && 1.0 / condition > rank_tolerance(system.size())) {
        return Err(Singular { condition });
    }

    let solution = system
        .matrix
        .clone()
        .lu()
        .solve(&system.rhs)
        .ok_or(Singular { condition })?;

    if !solution.iter().all(|v| v.is_finite()) {
        return Err(Singular { condition });
    }

    Ok(Solved {
        coefficients: solution.iter().copied().collect(),
        condition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::basis::basis_terms;

    fn plane_points() -> Vec<DataPoint> {
        // z = 1 + 2y - 3x on a small grid in [-1, 1]^2.
        let mut pts = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                let x = -1.0 + 0.5 * i as f64;
                let y = -1.0 + 0.5 * j as f64;
                pts.push(DataPoint::new(x, y, 1.0 + 2.0 * y - 3.0 * x));
            }
        }
        pts
    }

    #[test]
    fn assembled_matrix_matches_power_sums() {
        let pts = plane_points();
        let basis = basis_terms(2);
        let sys = assemble_normal_equations(&pts, &basis);
        assert_eq!(sys.size(), 6);

        for (row, r) in basis.iter().enumerate() {
            for (col, c) in basis.iter().enumerate() {
                let direct: f64 = pts
                    .iter()
                    .map(|p| p.x.powi((r.p + c.p) as i32) * p.y.powi((r.q + c.q) as i32))
                    .sum();
                assert!((sys.matrix[(row, col)] - direct).abs() < 1e-12);
            }
            let direct_b: f64 = pts
                .iter()
                .map(|p| p.z * p.x.powi(r.p as i32) * p.y.powi(r.q as i32))
                .sum();
            assert!((sys.rhs[row] - direct_b).abs() < 1e-12);
        }
        assert!(sys.is_symmetric());
        // A[0][0] is the point count.
        assert_eq!(sys.matrix[(0, 0)], 25.0);
    }

    #[test]
    fn solves_plane_exactly() {
        let pts = plane_points();
        let basis = basis_terms(1);
        let sys = assemble_normal_equations(&pts, &basis);
        let solved = solve_normal_equations(&sys).unwrap();
        // basis order: (0,0), (0,1), (1,0)
        let expected = [1.0, 2.0, -3.0];
        for (a, e) in solved.coefficients.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "got {a}, expected {e}");
        }
        assert!(solved.condition.is_finite() && solved.condition >= 1.0);
        assert!(sys.max_relative_residual(&solved.coefficients) < 1e-12);
    }

    #[test]
    fn collinear_points_are_singular() {
        // On x == y the six quadratic monomials collapse to 1, t, t^2.
        let pts: Vec<DataPoint> = (0..10)
            .map(|i| {
                let t = -1.0 + 0.2 * i as f64;
                DataPoint::new(t, t, 3.0 * t)
            })
            .collect();
        let sys = assemble_normal_equations(&pts, &basis_terms(2));
        assert!(solve_normal_equations(&sys).is_err());
    }

    #[test]
    fn ill_conditioned_but_full_rank_system_is_solved() {
        // Degree 7 on a corner of [-1, 1]^2: condition ~1e13, still well determined.
        let mut pts = Vec::new();
        for j in 0..30 {
            for i in 0..30 {
                let x = (100.0 * i as f64 - 4096.0) / 4096.0;
                let y = (100.0 * j as f64 - 4096.0) / 4096.0;
                pts.push(DataPoint::new(x, y, 1.0 + x - 2.0 * y * y));
            }
        }
        let sys = assemble_normal_equations(&pts, &basis_terms(7));
        let solved = solve_normal_equations(&sys).unwrap();
        assert!(solved.condition > 1e10, "condition {}", solved.condition);
        assert!(sys.max_relative_residual(&solved.coefficients) < 1e-8);
    }

    #[test]
    fn residual_flags_wrong_coefficients() {
        let pts = plane_points();
        let sys = assemble_normal_equations(&pts, &basis_terms(1));
        assert!(sys.max_relative_residual(&[1.0, 2.0, -2.5]) > 1e-3);
    }
}
