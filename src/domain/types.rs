//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to text tables / JSON
//! - reloaded later for evaluation or resampling

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single `(x, y, z)` measurement in raw (pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl DataPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Exponents of a single monomial `x^p · y^q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasisTerm {
    pub p: u32,
    pub q: u32,
}

impl BasisTerm {
    pub fn new(p: u32, q: u32) -> Self {
        Self { p, q }
    }

    /// Total degree `p + q`.
    pub fn degree(&self) -> u32 {
        self.p + self.q
    }

    /// Coefficient label used in reports, e.g. `a_21`.
    pub fn label(&self) -> String {
        format!("a_{}{}", self.p, self.q)
    }
}

/// Affine transform applied to raw coordinates before fitting:
/// `x' = (x - center_x) / scale_x`, and likewise for `y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub center_x: f64,
    pub center_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl NormalizationParams {
    /// Map a raw coordinate pair into normalized space.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.center_x) / self.scale_x,
            (y - self.center_y) / self.scale_y,
        )
    }
}

/// Core fitting configuration.
///
/// Passed explicitly into the fitter; there is no process-wide option state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Total polynomial degree `n`.
    pub degree: i32,
    /// Image size `S` used for normalization (`center = scale = S/2`).
    /// `None` normalizes from the data bounding box instead.
    pub image_size: Option<u32>,
    /// Relative tolerance for the post-solve and derivative checks.
    pub tolerance: f64,
    /// Pixel step of the fitted-surface grid.
    pub grid_step: u32,
    /// Whether result tables should be written.
    pub save_files: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            degree: 7,
            image_size: Some(8192),
            tolerance: 1e-8,
            grid_step: 10,
            save_files: true,
        }
    }
}

/// Application-level settings for one `sfit fit` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub input: PathBuf,
    /// Index of the `z` column in the input file.
    pub z_column: usize,
    /// Directory receiving the text tables.
    pub output_dir: PathBuf,
    /// Optional polynomial JSON export.
    pub export_json: Option<PathBuf>,
    /// Print the assembled normal equations.
    pub show_equations: bool,
    pub fit: FitConfig,
}

/// Fitted value and residual for one input point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedPoint {
    /// The raw input point.
    pub point: DataPoint,
    pub fit: f64,
    /// `z - fit`.
    pub residual: f64,
}

/// Results of the consistency checks run after the solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    /// Largest relative deviation of `A·a` from `b` over all rows.
    pub max_solve_deviation: f64,
    /// `dChi2/da_pq` for every basis term, in basis order.
    pub gradient: Vec<f64>,
    /// Largest relative magnitude among `gradient`.
    pub max_gradient_deviation: f64,
    /// Condition estimate of the normal-equations matrix (largest / smallest
    /// singular value).
    pub condition: f64,
}

/// Summary stats about the loaded points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl DatasetStats {
    /// Compute stats over `points`; `None` if there are no points.
    pub fn from_points(points: &[DataPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut stats = DatasetStats {
            n_points: points.len(),
            x_min: first.x,
            x_max: first.x,
            y_min: first.y,
            y_max: first.y,
            z_min: first.z,
            z_max: first.z,
        };
        for p in &points[1..] {
            stats.x_min = stats.x_min.min(p.x);
            stats.x_max = stats.x_max.max(p.x);
            stats.y_min = stats.y_min.min(p.y);
            stats.y_max = stats.y_max.max(p.y);
            stats.z_min = stats.z_min.min(p.z);
            stats.z_max = stats.z_max.max(p.z);
        }
        Some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_maps_pixels_per_axis() {
        let params = NormalizationParams {
            center_x: 4096.0,
            center_y: 2048.0,
            scale_x: 4096.0,
            scale_y: 1024.0,
        };
        assert_eq!(params.apply(0.0, 3072.0), (-1.0, 1.0));
        assert_eq!(params.apply(4096.0, 2048.0), (0.0, 0.0));
    }

    #[test]
    fn stats_cover_all_points() {
        let pts = [
            DataPoint::new(1.0, 5.0, -2.0),
            DataPoint::new(-3.0, 2.0, 7.0),
            DataPoint::new(0.5, 9.0, 1.0),
        ];
        let s = DatasetStats::from_points(&pts).unwrap();
        assert_eq!(s.n_points, 3);
        assert_eq!((s.x_min, s.x_max), (-3.0, 1.0));
        assert_eq!((s.y_min, s.y_max), (2.0, 9.0));
        assert_eq!((s.z_min, s.z_max), (-2.0, 7.0));
        assert!(DatasetStats::from_points(&[]).is_none());
    }
}
