//! Synthetic surface generation.
//!
//! Samples a known polynomial surface on a regular pixel grid so fits can be
//! checked against the coefficients that produced the data. Coordinates are
//! normalized with `center = scale = size/2` before the surface is evaluated,
//! matching what the fitter does for an explicit image size.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::DataPoint;
use crate::error::{FitError, Result};

/// One term `coefficient · x^p · y^q` of a generating surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTerm {
    pub coefficient: f64,
    pub p: u32,
    pub q: u32,
}

/// A polynomial surface in normalized coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceModel {
    pub terms: Vec<SurfaceTerm>,
}

impl Default for SurfaceModel {
    /// `2x³ + x²y + 3xy² + 4xy + 3x + y + 10`.
    fn default() -> Self {
        let t = |coefficient, p, q| SurfaceTerm { coefficient, p, q };
        Self {
            terms: vec![
                t(2.0, 3, 0),
                t(1.0, 2, 1),
                t(3.0, 1, 2),
                t(4.0, 1, 1),
                t(3.0, 1, 0),
                t(1.0, 0, 1),
                t(10.0, 0, 0),
            ],
        }
    }
}

impl SurfaceModel {
    pub fn value(&self, x: f64, y: f64) -> f64 {
        self.terms
            .iter()
            .map(|t| t.coefficient * x.powi(t.p as i32) * y.powi(t.q as i32))
            .sum()
    }

    /// Highest total degree among the terms.
    pub fn degree(&self) -> u32 {
        self.terms.iter().map(|t| t.p + t.q).max().unwrap_or(0)
    }
}

/// Grid and noise settings for [`generate_grid`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Image size `S`; pixels run over `0..S`.
    pub size: u32,
    pub step: u32,
    /// Standard deviation of additive Gaussian noise (0 = exact surface).
    pub noise_sigma: f64,
    pub seed: u64,
    pub model: SurfaceModel,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            size: 8192,
            step: 100,
            noise_sigma: 0.0,
            seed: 42,
            model: SurfaceModel::default(),
        }
    }
}

/// Sample the surface at every `(x, y)` with `x, y ∈ {0, step, ...} < size`,
/// rows of constant `y` first.
pub fn generate_grid(config: &GeneratorConfig) -> Result<Vec<DataPoint>> {
    if config.size == 0 || config.step == 0 {
        return Err(FitError::InvalidGrid {
            message: format!(
                "generator needs size > 0 and step > 0 (size={}, step={})",
                config.size, config.step
            ),
        });
    }
    if !(config.noise_sigma.is_finite() && config.noise_sigma >= 0.0) {
        return Err(FitError::InvalidGrid {
            message: format!("noise sigma must be finite and >= 0, got {}", config.noise_sigma),
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = if config.noise_sigma > 0.0 {
        Some(Normal::new(0.0, config.noise_sigma).map_err(|e| FitError::InvalidGrid {
            message: format!("noise distribution error: {e}"),
        })?)
    } else {
        None
    };

    let center = f64::from(config.size) / 2.0;
    let per_axis = config.size.div_ceil(config.step) as usize;
    let mut points = Vec::with_capacity(per_axis * per_axis);

    for y in (0..config.size).step_by(config.step as usize) {
        for x in (0..config.size).step_by(config.step as usize) {
            let xp = (f64::from(x) - center) / center;
            let yp = (f64::from(y) - center) / center;
            let mut z = config.model.value(xp, yp);
            if let Some(dist) = &noise {
                z += dist.sample(&mut rng);
            }
            points.push(DataPoint::new(f64::from(x), f64::from(y), z));
        }
    }

    tracing::info!(
        "Generated {} points (size={}, step={}, noise={})",
        points.len(),
        config.size,
        config.step,
        config.noise_sigma
    );
    Ok(points)
}

/// Write points as `X Y Z` lines (`%.4f %.4f %.8f`).
pub fn write_points(path: &Path, points: &[DataPoint]) -> Result<()> {
    let file = File::create(path).map_err(|e| FitError::io(path, e))?;
    let mut out = BufWriter::new(file);
    for p in points {
        writeln!(out, "{:.4} {:.4} {:.8}", p.x, p.y, p.z).map_err(|e| FitError::io(path, e))?;
    }
    out.flush().map_err(|e| FitError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_matches_reference_layout() {
        let points = generate_grid(&GeneratorConfig::default()).unwrap();
        assert_eq!(points.len(), 82 * 82);
        assert_eq!((points[0].x, points[0].y), (0.0, 0.0));
        assert_eq!((points[1].x, points[1].y), (100.0, 0.0));
        assert_eq!((points[82].x, points[82].y), (0.0, 100.0));
        // At the image centre only the constant term survives.
        let centre = SurfaceModel::default().value(0.0, 0.0);
        assert_eq!(centre, 10.0);
        // x = y = -1: -2 - 1 - 3 + 4 - 3 - 1 + 10 = 4
        assert!((points[0].z - 4.0).abs() < 1e-12);
    }

    #[test]
    fn noise_is_seeded() {
        let config = GeneratorConfig {
            size: 500,
            step: 50,
            noise_sigma: 0.5,
            seed: 3,
            model: SurfaceModel::default(),
        };
        let a = generate_grid(&config).unwrap();
        let b = generate_grid(&config).unwrap();
        assert_eq!(a, b);

        let exact = generate_grid(&GeneratorConfig {
            noise_sigma: 0.0,
            ..config.clone()
        })
        .unwrap();
        assert!(a.iter().zip(&exact).any(|(n, e)| n.z != e.z));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let bad_step = GeneratorConfig {
            step: 0,
            ..GeneratorConfig::default()
        };
        assert!(generate_grid(&bad_step).is_err());

        let bad_noise = GeneratorConfig {
            noise_sigma: -1.0,
            ..GeneratorConfig::default()
        };
        assert!(generate_grid(&bad_noise).is_err());
    }

    #[test]
    fn written_points_use_fixed_precision() {
        let path = std::env::temp_dir().join(format!("sfit_points_{}.txt", std::process::id()));
        write_points(&path, &[DataPoint::new(0.0, 100.0, 4.0), DataPoint::new(1.5, 2.25, -0.125)]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(text, "0.0000 100.0000 4.00000000\n1.5000 2.2500 -0.12500000\n");
    }
}
