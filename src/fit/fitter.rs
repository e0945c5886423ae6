//! Fit orchestration for a single polynomial surface.
//!
//! Given raw `(x, y, z)` points and a [`FitConfig`] we:
//! - validate the degree and the input points
//! - enumerate the basis list once (it is threaded through every later step)
//! - normalize coordinates
//! - assemble and solve the normal equations
//! - check `A·a ≈ b`
//! - evaluate fitted values, residuals and chi-squared
//! - run the derivative diagnostic
//!
//! Every step either succeeds or returns a [`FitError`]; there is no partial result.

use std::collections::HashSet;

use crate::domain::{DataPoint, FitConfig, FitDiagnostics, FittedPoint, NormalizationParams};
use crate::error::{FitError, Result};
use crate::fit::diagnostic::derivative_diagnostic;
use crate::fit::grid::{SurfaceGrid, resample_grid};
use crate::math::{
    NormalEquations, assemble_normal_equations, basis_len, basis_terms, normalize_points,
    solve_normal_equations,
};
use crate::models::{FittedPolynomial, evaluate};

/// Everything produced by one successful fit.
#[derive(Debug, Clone)]
pub struct SurfaceFit {
    pub polynomial: FittedPolynomial,
    /// Transform used for fitting; reuse it for every later evaluation.
    pub normalization: NormalizationParams,
    /// Fitted value and residual per input point, in input order.
    pub fitted: Vec<FittedPoint>,
    /// `Σ (fit - z)^2`.
    pub chi_squared: f64,
    pub diagnostics: FitDiagnostics,
}

impl SurfaceFit {
    pub fn degree(&self) -> u32 {
        self.polynomial.degree()
    }

    pub fn n_points(&self) -> usize {
        self.fitted.len()
    }

    pub fn rmse(&self) -> f64 {
        if self.fitted.is_empty() {
            return 0.0;
        }
        (self.chi_squared / self.fitted.len() as f64).sqrt()
    }

    /// Evaluate the surface at raw (pixel) coordinates.
    pub fn predict(&self, x: f64, y: f64) -> f64 {
        let (xn, yn) = self.normalization.apply(x, y);
        evaluate(&self.polynomial, xn, yn)
    }

    /// Lazy grid over `[0, size)²` using the stored normalization.
    pub fn grid(&self, size: u32, step: u32) -> Result<SurfaceGrid<'_>> {
        resample_grid(&self.polynomial, self.normalization, size, step)
    }
}

/// Fit a surface of total degree `degree`.
///
/// `image_size = Some(S)` normalizes with `center = scale = S/2`; `None` uses the
/// data bounding box. Tolerance and grid settings come from [`FitConfig::default`].
pub fn fit(points: &[DataPoint], degree: i32, image_size: Option<u32>) -> Result<SurfaceFit> {
    let config = FitConfig {
        degree,
        image_size,
        ..FitConfig::default()
    };
    fit_surface(points, &config)
}

/// Fit a surface using an explicit configuration.
pub fn fit_surface(points: &[DataPoint], config: &FitConfig) -> Result<SurfaceFit> {
    fit_with_equations(points, config).map(|(fit, _)| fit)
}

/// Fit a surface and also return the assembled normal equations.
pub fn fit_with_equations(
    points: &[DataPoint],
    config: &FitConfig,
) -> Result<(SurfaceFit, NormalEquations)> {
    let degree = u32::try_from(config.degree).map_err(|_| FitError::InvalidDegree {
        degree: config.degree,
    })?;

    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(FitError::NonFinitePoint { index });
    }

    // Checked before enumerating the basis: a huge degree must not allocate.
    let required = basis_len(degree);
    let distinct = count_distinct_xy(points);
    if distinct < required {
        return Err(FitError::InsufficientData {
            points: points.len(),
            distinct,
            required,
            degree,
        });
    }

    let basis = basis_terms(degree);
    let n = points.len();
    tracing::info!(
        "Fitting order {degree} polynomial to {n} data points -> {required} parameters and {required} equations"
    );
    for (i, t) in basis.iter().enumerate() {
        tracing::debug!("{i} : {} x^{} * y^{}", t.label(), t.p, t.q);
    }

    let (normalization, normalized) = normalize_points(points, config.image_size);
    tracing::debug!(?normalization, "coordinates normalized");

    let system = assemble_normal_equations(&normalized, &basis);

    let solved = solve_normal_equations(&system).map_err(|s| FitError::SingularSystem {
        degree,
        points: n,
        condition: s.condition,
    })?;
    tracing::debug!(condition = solved.condition, "normal equations solved");

    let max_solve_deviation = system.max_relative_residual(&solved.coefficients);
    if !(max_solve_deviation <= config.tolerance) {
        return Err(FitError::FitValidation {
            check: "solve residual",
            max_deviation: max_solve_deviation,
            tolerance: config.tolerance,
            degree,
            points: n,
        });
    }

    let polynomial = FittedPolynomial::from_basis(basis, solved.coefficients).ok_or(
        FitError::FitValidation {
            check: "coefficient count",
            max_deviation: f64::INFINITY,
            tolerance: config.tolerance,
            degree,
            points: n,
        },
    )?;
    for (t, a) in polynomial.terms() {
        tracing::debug!("{} = {a:.8}", t.label());
    }

    let mut chi_squared = 0.0;
    let fitted: Vec<FittedPoint> = points
        .iter()
        .zip(&normalized)
        .map(|(raw, norm)| {
            let value = evaluate(&polynomial, norm.x, norm.y);
            chi_squared += (value - raw.z) * (value - raw.z);
            FittedPoint {
                point: *raw,
                fit: value,
                residual: raw.z - value,
            }
        })
        .collect();
    tracing::info!("chi2 = {chi_squared:.8}");

    let derivatives = derivative_diagnostic(&normalized, &polynomial, config.tolerance)?;

    let fit = SurfaceFit {
        polynomial,
        normalization,
        fitted,
        chi_squared,
        diagnostics: FitDiagnostics {
            max_solve_deviation,
            gradient: derivatives.gradient,
            max_gradient_deviation: derivatives.max_deviation,
            condition: solved.condition,
        },
    };
    Ok((fit, system))
}

fn count_distinct_xy(points: &[DataPoint]) -> usize {
    // `+ 0.0` folds -0.0 into 0.0 so both hash the same.
    points
        .iter()
        .map(|p| ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits()))
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{GeneratorConfig, SurfaceModel, generate_grid};

    #[test]
    fn recovers_reference_cubic_on_8192_grid() {
        let points = generate_grid(&GeneratorConfig::default()).unwrap();
        assert_eq!(points.len(), 82 * 82);

        let fit = fit(&points, 3, Some(8192)).unwrap();
        let expected = [10.0, 1.0, 0.0, 0.0, 3.0, 4.0, 3.0, 0.0, 1.0, 2.0];
        assert_eq!(fit.polynomial.coefficients().len(), expected.len());
        for ((t, a), e) in fit.polynomial.terms().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{}: got {a}, expected {e}", t.label());
        }
        assert!(fit.chi_squared < 1e-12);
    }

    #[test]
    fn recovers_quadratic_with_bounding_box_normalization() {
        // Raw pixels in [100, 900] x [200, 600]; bbox params: cx=500 sx=400, cy=400 sy=200.
        let truth = |xn: f64, yn: f64| 5.0 - 2.0 * yn + 0.5 * yn * yn + 1.5 * xn - 0.75 * xn * yn + 3.0 * xn * xn;
        let mut points = Vec::new();
        for i in 0..=16 {
            for j in 0..=8 {
                let x = 100.0 + 50.0 * i as f64;
                let y = 200.0 + 50.0 * j as f64;
                points.push(DataPoint::new(x, y, truth((x - 500.0) / 400.0, (y - 400.0) / 200.0)));
            }
        }
        let fit = fit(&points, 2, None).unwrap();
        assert_eq!(fit.normalization.center_x, 500.0);
        assert_eq!(fit.normalization.scale_y, 200.0);

        // (0,0) (0,1) (0,2) (1,0) (1,1) (2,0)
        let expected = [5.0, -2.0, 0.5, 1.5, -0.75, 3.0];
        for (a, e) in fit.polynomial.coefficients().iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "got {a}, expected {e}");
        }
        assert!((fit.predict(300.0, 500.0) - truth(-0.5, 0.5)).abs() < 1e-9);
    }

    #[test]
    fn degree_zero_is_the_mean() {
        let points: Vec<DataPoint> = (0..17)
            .map(|i| DataPoint::new(i as f64 * 3.0, (i * i) as f64, (i as f64).sin() * 4.0 + 1.0))
            .collect();
        let mean = points.iter().map(|p| p.z).sum::<f64>() / points.len() as f64;
        let fit = fit(&points, 0, None).unwrap();
        assert_eq!(fit.polynomial.coefficients().len(), 1);
        assert!((fit.polynomial.coefficients()[0] - mean).abs() < 1e-12);
    }

    #[test]
    fn chi_squared_never_increases_with_degree() {
        let config = GeneratorConfig {
            size: 1000,
            step: 40,
            noise_sigma: 0.3,
            seed: 7,
            model: SurfaceModel::default(),
        };
        let points = generate_grid(&config).unwrap();

        let mut previous = f64::INFINITY;
        for degree in 0..=6 {
            let fit = fit(&points, degree, Some(1000)).unwrap();
            assert!(
                fit.chi_squared <= previous * (1.0 + 1e-9) + 1e-12,
                "degree {degree}: chi2 {} > {previous}",
                fit.chi_squared
            );
            previous = fit.chi_squared;
        }
        assert!(previous > 0.0);
    }

    #[test]
    fn successful_fit_satisfies_both_checks() {
        let config = GeneratorConfig {
            size: 2048,
            step: 64,
            noise_sigma: 0.05,
            seed: 11,
            model: SurfaceModel::default(),
        };
        let points = generate_grid(&config).unwrap();
        let fit_config = FitConfig {
            degree: 5,
            image_size: Some(2048),
            ..FitConfig::default()
        };
        let (fit, system) = fit_with_equations(&points, &fit_config).unwrap();
        assert!(system.is_symmetric());
        assert!(fit.diagnostics.max_solve_deviation < fit_config.tolerance);
        assert!(fit.diagnostics.max_gradient_deviation < fit_config.tolerance);
        assert_eq!(fit.diagnostics.gradient.len(), 21);
        assert!(fit.diagnostics.condition >= 1.0);

        let chi2: f64 = fit.fitted.iter().map(|f| f.residual * f.residual).sum();
        assert!((chi2 - fit.chi_squared).abs() <= 1e-9 * fit.chi_squared.max(1.0));
    }

    #[test]
    fn too_few_points_is_insufficient_data() {
        for degree in 0..=4_i32 {
            let m = ((degree + 1) * (degree + 2) / 2) as usize;
            let points: Vec<DataPoint> = (0..m - 1)
                .map(|i| DataPoint::new(i as f64, (i * 7 % 5) as f64, 1.0))
                .collect();
            let err = fit(&points, degree, None).unwrap_err();
            assert!(
                matches!(err, FitError::InsufficientData { required, .. } if required == m),
                "degree {degree}: {err}"
            );
        }
    }

    #[test]
    fn duplicate_points_do_not_count_as_distinct() {
        let points = vec![DataPoint::new(1.0, 1.0, 2.0); 20];
        let err = fit(&points, 1, None).unwrap_err();
        assert!(matches!(
            err,
            FitError::InsufficientData {
                points: 20,
                distinct: 1,
                required: 3,
                ..
            }
        ));
    }

    #[test]
    fn negative_degree_is_rejected() {
        let points = vec![DataPoint::new(0.0, 0.0, 1.0)];
        assert_eq!(
            fit(&points, -1, None).unwrap_err(),
            FitError::InvalidDegree { degree: -1 }
        );
    }

    #[test]
    fn collinear_points_are_singular() {
        let points: Vec<DataPoint> = (0..20)
            .map(|i| DataPoint::new(i as f64 * 5.0, i as f64 * 5.0, i as f64))
            .collect();
        let err = fit(&points, 2, Some(100)).unwrap_err();
        assert!(matches!(err, FitError::SingularSystem { degree: 2, points: 20, .. }));
    }

    #[test]
    fn huge_degree_is_insufficient_data_not_a_panic() {
        let points: Vec<DataPoint> = (0..20)
            .map(|i| DataPoint::new(i as f64, (i * 3 % 7) as f64, 1.0))
            .collect();
        let err = fit(&points, i32::MAX, None).unwrap_err();
        assert!(
            matches!(
                err,
                FitError::InsufficientData {
                    points: 20,
                    distinct: 20,
                    degree,
                    ..
                } if degree == i32::MAX as u32
            ),
            "{err}"
        );
    }

    #[test]
    fn default_degree_on_partial_image_coverage() {
        // 30x30 points in the 0..2900 px corner of an 8192 image, CLI defaults.
        let model = SurfaceModel::default();
        let mut points = Vec::new();
        for j in 0..30 {
            for i in 0..30 {
                let x = 100.0 * i as f64;
                let y = 100.0 * j as f64;
                points.push(DataPoint::new(x, y, model.value((x - 4096.0) / 4096.0, (y - 4096.0) / 4096.0)));
            }
        }
        let config = FitConfig::default();
        let fit = fit_surface(&points, &config).unwrap();

        assert_eq!(fit.degree(), 7);
        assert_eq!(fit.polynomial.coefficients().len(), 36);
        assert!(fit.diagnostics.condition > 1e10, "condition {}", fit.diagnostics.condition);
        assert!(fit.diagnostics.max_solve_deviation < config.tolerance);
        assert!(fit.diagnostics.max_gradient_deviation < config.tolerance);
        let worst = fit.fitted.iter().map(|f| f.residual.abs()).fold(0.0, f64::max);
        assert!(worst < 1e-6, "max |residual| {worst}");
        assert!((fit.polynomial.coefficients()[0] - 10.0).abs() < 1e-3);
    }

    #[test]
    fn solve_residual_above_tolerance_fails_validation() {
        let points = generate_grid(&GeneratorConfig {
            size: 1024,
            step: 64,
            noise_sigma: 0.5,
            seed: 3,
            model: SurfaceModel::default(),
        })
        .unwrap();
        let config = FitConfig {
            degree: 3,
            image_size: Some(1024),
            tolerance: 1e-300,
            ..FitConfig::default()
        };
        let err = fit_surface(&points, &config).unwrap_err();
        assert!(
            matches!(
                err,
                FitError::FitValidation {
                    check: "solve residual",
                    degree: 3,
                    points: 256,
                    ..
                }
            ),
            "{err}"
        );
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let mut points: Vec<DataPoint> = (0..10).map(|i| DataPoint::new(i as f64, 0.0, 1.0)).collect();
        points[4].z = f64::NAN;
        assert_eq!(
            fit(&points, 0, None).unwrap_err(),
            FitError::NonFinitePoint { index: 4 }
        );
    }

    #[test]
    fn grid_uses_fit_normalization() {
        let points = generate_grid(&GeneratorConfig::default()).unwrap();
        let fit = fit(&points, 3, Some(8192)).unwrap();
        let grid = fit.grid(8192, 1024).unwrap();
        assert_eq!(grid.len(), 64);
        for s in grid.iter() {
            let xn = (s.x - 4096.0) / 4096.0;
            let yn = (s.y - 4096.0) / 4096.0;
            let truth = 2.0 * xn.powi(3) + xn * xn * yn + 3.0 * xn * yn * yn + 4.0 * xn * yn + 3.0 * xn + yn + 10.0;
            assert!((s.value - truth).abs() < 1e-6);
            assert!((s.value - fit.predict(s.x, s.y)).abs() < 1e-12);
        }
    }
}
