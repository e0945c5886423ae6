//! Dense regular-grid resampling of a fitted surface.
//!
//! The grid walks raw pixel coordinates `0, s, 2s, ... < S` on both axes (rows of
//! constant `y` outermost) and normalizes each pixel with the params stored at fit
//! time before evaluating, so the surface matches the one that was fitted.

use serde::{Deserialize, Serialize};

use crate::domain::NormalizationParams;
use crate::error::{FitError, Result};
use crate::models::{FittedPolynomial, evaluate};

/// One resampled pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSample {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// A finite, restartable grid over a fitted surface.
///
/// Nothing is evaluated until the grid is iterated; [`SurfaceGrid::iter`] can be
/// called any number of times and always yields the same sequence.
#[derive(Debug, Clone)]
pub struct SurfaceGrid<'a> {
    polynomial: &'a FittedPolynomial,
    normalization: NormalizationParams,
    size: u32,
    step: u32,
}

impl<'a> SurfaceGrid<'a> {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    /// Samples per axis.
    pub fn axis_len(&self) -> usize {
        self.size.div_ceil(self.step) as usize
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.axis_len() * self.axis_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> GridIter<'a> {
        GridIter {
            polynomial: self.polynomial,
            normalization: self.normalization,
            step: self.step,
            axis_len: self.axis_len(),
            index: 0,
        }
    }
}

impl<'a> IntoIterator for &SurfaceGrid<'a> {
    type Item = GridSample;
    type IntoIter = GridIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`SurfaceGrid`].
#[derive(Debug, Clone)]
pub struct GridIter<'a> {
    polynomial: &'a FittedPolynomial,
    normalization: NormalizationParams,
    step: u32,
    axis_len: usize,
    index: usize,
}

impl Iterator for GridIter<'_> {
    type Item = GridSample;

    fn next(&mut self) -> Option<GridSample> {
        if self.index >= self.axis_len * self.axis_len {
            return None;
        }
        let row = self.index / self.axis_len;
        let col = self.index % self.axis_len;
        self.index += 1;

        let x = (col as u64 * u64::from(self.step)) as f64;
        let y = (row as u64 * u64::from(self.step)) as f64;
        let (xn, yn) = self.normalization.apply(x, y);
        Some(GridSample {
            x,
            y,
            value: evaluate(self.polynomial, xn, yn),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.axis_len * self.axis_len).saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridIter<'_> {}

/// Build a lazy grid over `[0, size) × [0, size)` with pixel `step`.
pub fn resample_grid(
    polynomial: &FittedPolynomial,
    normalization: NormalizationParams,
    size: u32,
    step: u32,
) -> Result<SurfaceGrid<'_>> {
    if step == 0 {
        return Err(FitError::InvalidGrid {
            message: "grid step must be > 0".to_string(),
        });
    }
    if !(normalization.scale_x.is_finite()
        && normalization.scale_y.is_finite()
        && normalization.scale_x != 0.0
        && normalization.scale_y != 0.0)
    {
        return Err(FitError::InvalidGrid {
            message: "normalization scale must be finite and non-zero".to_string(),
        });
    }
    Ok(SurfaceGrid {
        polynomial,
        normalization,
        size,
        step,
    })
}
