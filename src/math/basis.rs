//! Monomial basis enumeration for bivariate polynomials of total degree `n`.
//!
//! The basis list is the single source of coefficient ordering: ascending `p`,
//! then ascending `q`, for every `p + q <= n`. Coefficient `i` of a fitted
//! polynomial always multiplies `basis[i]`, so every consumer (assembler,
//! evaluator, diagnostic, writers) receives this list rather than re-deriving it.

use crate::domain::BasisTerm;

/// Number of monomials of total degree `<= n`: `(n+1)(n+2)/2`.
///
/// Saturates at `usize::MAX` instead of overflowing.
pub fn basis_len(degree: u32) -> usize {
    let n = u128::from(degree);
    usize::try_from((n + 1) * (n + 2) / 2).unwrap_or(usize::MAX)
}

/// Enumerate the basis terms for total degree `degree`.
pub fn basis_terms(degree: u32) -> Vec<BasisTerm> {
    let mut terms = Vec::with_capacity(basis_len(degree));
    for p in 0..=degree {
        for q in 0..=(degree - p) {
            terms.push(BasisTerm::new(p, q));
        }
    }
    terms
}

/// Highest total degree present in `basis` (0 for an empty list).
pub fn max_degree(basis: &[BasisTerm]) -> u32 {
    basis.iter().map(BasisTerm::degree).max().unwrap_or(0)
}

/// `[v^0, v^1, ..., v^max]`.
pub fn powers(v: f64, max: usize) -> Vec<f64> {
    (0..=max).map(|k| v.powi(k as i32)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn cubic_basis_order() {
        let got: Vec<(u32, u32)> = basis_terms(3).iter().map(|t| (t.p, t.q)).collect();
        assert_eq!(
            got,
            vec![
                (0, 0),
                (0, 1),
                (0, 2),
                (0, 3),
                (1, 0),
                (1, 1),
                (1, 2),
                (2, 0),
                (2, 1),
                (3, 0)
            ]
        );
    }

    #[test]
    fn basis_is_complete_and_unique() {
        for n in 0..=9 {
            let terms = basis_terms(n);
            assert_eq!(terms.len(), basis_len(n));
            let unique: HashSet<_> = terms.iter().collect();
            assert_eq!(unique.len(), terms.len());
            assert!(terms.iter().all(|t| t.p + t.q <= n));
            assert_eq!(max_degree(&terms), n);
        }
    }

    #[test]
    fn degree_zero_is_constant() {
        assert_eq!(basis_terms(0), vec![BasisTerm::new(0, 0)]);
    }

    #[test]
    fn huge_degree_length_does_not_overflow() {
        let n = i32::MAX as u128;
        let exact = (n + 1) * (n + 2) / 2;
        assert_eq!(basis_len(i32::MAX as u32), usize::try_from(exact).unwrap_or(usize::MAX));
        assert!(basis_len(u32::MAX) >= basis_len(i32::MAX as u32));
    }
}
