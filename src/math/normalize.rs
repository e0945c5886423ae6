//! Coordinate normalization.
//!
//! Raw pixel coordinates (up to several thousand) raised to powers up to `2n`
//! in the normal equations would lose most of their precision, so every point is
//! mapped into roughly `[-1, 1]` before assembly. The same params are used again
//! for evaluation and grid resampling.

use crate::domain::{DataPoint, NormalizationParams};

/// Compute normalization params.
///
/// - `Some(S)` with `S > 0`: `center = scale = S/2` on both axes.
/// - otherwise: centre and half-range of the data bounding box per axis.
///   A degenerate axis (zero extent) keeps a scale of `1.0`.
pub fn normalization_params(points: &[DataPoint], image_size: Option<u32>) -> NormalizationParams {
    if let Some(size) = image_size.filter(|&s| s > 0) {
        let half = f64::from(size) / 2.0;
        return NormalizationParams {
            center_x: half,
            center_y: half,
            scale_x: half,
            scale_y: half,
        };
    }

    let (cx, sx) = center_and_half_range(points.iter().map(|p| p.x));
    let (cy, sy) = center_and_half_range(points.iter().map(|p| p.y));
    NormalizationParams {
        center_x: cx,
        center_y: cy,
        scale_x: sx,
        scale_y: sy,
    }
}

/// Compute params and return the points mapped into normalized space.
pub fn normalize_points(
    points: &[DataPoint],
    image_size: Option<u32>,
) -> (NormalizationParams, Vec<DataPoint>) {
    let params = normalization_params(points, image_size);
    let normalized = points
        .iter()
        .map(|p| {
            let (x, y) = params.apply(p.x, p.y);
            DataPoint::new(x, y, p.z)
        })
        .collect();
    (params, normalized)
}

fn center_and_half_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !(min.is_finite() && max.is_finite()) {
        return (0.0, 1.0);
    }
    let center = (min + max) / 2.0;
    let half = (max - min) / 2.0;
    if half > 0.0 && half.is_finite() {
        (center, half)
    } else {
        (center, 1.0)
    }
}
