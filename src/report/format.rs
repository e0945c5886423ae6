//! Formatted terminal output for a fit.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{BasisTerm, FitConfig};
use crate::fit::SurfaceFit;
use crate::io::ingest::InputData;
use crate::math::NormalEquations;
use crate::models::FittedPolynomial;

/// Format the full run summary (input stats, basis, coefficients, checks).
pub fn format_fit_summary(input: &InputData, fit: &SurfaceFit, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== sfit - polynomial surface fit ===\n");
    if let Some(path) = &input.source {
        out.push_str(&format!("Input: {}\n", path.display()));
    }
    out.push_str(&format!(
        "Points: n={} | x=[{:.3}, {:.3}] | y=[{:.3}, {:.3}] | z=[{:.8}, {:.8}]\n",
        input.stats.n_points,
        input.stats.x_min,
        input.stats.x_max,
        input.stats.y_min,
        input.stats.y_max,
        input.stats.z_min,
        input.stats.z_max,
    ));
    out.push_str(&format!(
        "Polynomial order: {} -> {} parameters\n",
        fit.degree(),
        fit.polynomial.basis().len()
    ));
    for (k, t) in fit.polynomial.basis().iter().enumerate() {
        out.push_str(&format!("{k:>3} : {} x^{} * y^{}\n", t.label(), t.p, t.q));
    }
    let n = &fit.normalization;
    out.push_str(&format!(
        "Normalization: {} | center=({:.3}, {:.3}) scale=({:.3}, {:.3})\n",
        match config.image_size {
            Some(s) if s > 0 => format!("image size {s}"),
            _ => "bounding box".to_string(),
        },
        n.center_x,
        n.center_y,
        n.scale_x,
        n.scale_y,
    ));

    out.push_str("\nPolynomial coefficients:\n");
    for (t, a) in fit.polynomial.terms() {
        out.push_str(&format!("\t {} = {a:.8}\n", t.label()));
    }
    out.push_str(&format!(
        "\nFitted polynomial p_n(x,y) = {}\n",
        format_polynomial(&fit.polynomial)
    ));

    let d = &fit.diagnostics;
    out.push_str(&format!(
        "\nSolution ok = true (max |A·a - b| rel={:.3e}, condition={:.3e})\n",
        d.max_solve_deviation, d.condition
    ));
    out.push_str(&format!(
        "chi2 = {:.8} | rmse = {:.8}\n",
        fit.chi_squared,
        fit.rmse()
    ));

    out.push_str("\nDerivatives by a_pq:\n");
    for (t, g) in fit.polynomial.basis().iter().zip(&d.gradient) {
        out.push_str(&format!("dChi2/d{} = {g:.8}\n", t.label()));
    }

    out
}

/// `c*(x**p)*(y**q) + ...` in basis order.
pub fn format_polynomial(poly: &FittedPolynomial) -> String {
    let mut out = String::new();
    for (i, (t, a)) in poly.terms().enumerate() {
        if i == 0 {
            out.push_str(&format!("{a:.8}"));
        } else if a < 0.0 {
            out.push_str(&format!(" - {:.8}", -a));
        } else {
            out.push_str(&format!(" + {a:.8}"));
        }
        out.push_str(&format!("*(x**{})*(y**{})", t.p, t.q));
    }
    out
}

/// One line per equation: `dChi^2/da_pq : c*a_00 +c*a_01 ... = rhs`.
pub fn format_equations(system: &NormalEquations, basis: &[BasisTerm]) -> String {
    let mut out = String::new();
    out.push_str("Equations:\n");
    for (row, r) in basis.iter().enumerate() {
        out.push_str(&format!("dChi^2/d{} : ", r.label()));
        for (col, c) in basis.iter().enumerate() {
            let v = system.matrix[(row, col)];
            let sign = if col == 0 || v < 0.0 { "" } else { "+" };
            out.push_str(&format!("{sign}{v:.8}*{} ", c.label()));
        }
        out.push_str(&format!("= {:.8}\n", system.rhs[row]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::fit_with_equations;
    use crate::io::ingest::parse_points;

    #[test]
    fn polynomial_string_handles_signs() {
        let poly = FittedPolynomial::new(1, vec![1.5, -2.0, 0.25]).unwrap();
        assert_eq!(
            format_polynomial(&poly),
            "1.50000000*(x**0)*(y**0) - 2.00000000*(x**0)*(y**1) + 0.25000000*(x**1)*(y**0)"
        );
    }

    #[test]
    fn summary_lists_coefficients_and_derivatives() {
        let text = "0 0 1\n100 0 2\n0 100 3\n100 100 4\n50 50 2.5\n";
        let input = parse_points(text.as_bytes(), 2).unwrap();
        let config = FitConfig {
            degree: 1,
            image_size: None,
            ..FitConfig::default()
        };
        let (fit, system) = fit_with_equations(&input.points, &config).unwrap();

        let summary = format_fit_summary(&input, &fit, &config);
        assert!(summary.contains("Polynomial order: 1 -> 3 parameters"));
        assert!(summary.contains("bounding box"));
        assert!(summary.contains("  2 : a_10 x^1 * y^0\n"));
        assert!(summary.contains("\t a_00 = 2.50000000"));
        assert!(summary.contains("dChi2/da_10 = "));
        assert!(summary.contains("chi2 = "));

        let eqs = format_equations(&system, fit.polynomial.basis());
        let first = eqs.lines().nth(1).unwrap();
        assert!(first.starts_with("dChi^2/da_00 : 5.00000000*a_00 "), "{first}");
        assert!(first.ends_with("= 12.50000000"), "{first}");
    }
}
