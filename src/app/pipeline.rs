//! Shared "fit pipeline" logic used by the `fit` command.
//!
//! Keeping this in one place avoids mixing the core workflow
//! (load -> normalize/fit/check -> tables) with terminal presentation.

use std::path::PathBuf;

use crate::domain::{DatasetStats, RunConfig};
use crate::error::AppError;
use crate::fit::{SurfaceFit, fit_with_equations};
use crate::io::export::{
    fitted_vs_data_filename, surface_grid_filename, write_fitted_vs_data, write_surface_grid,
};
use crate::io::ingest::{InputData, load_points};
use crate::math::NormalEquations;

/// All computed outputs of a single `sfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub input: InputData,
    pub fit: SurfaceFit,
    pub equations: NormalEquations,
}

/// Load the input file and fit it.
pub fn run_fit(config: &RunConfig) -> Result<RunOutput, AppError> {
    let input = load_points(&config.input, config.z_column)?;
    let (fit, equations) = fit_with_equations(&input.points, &config.fit)?;
    Ok(RunOutput {
        input,
        fit,
        equations,
    })
}

/// Extent of the fitted-surface table.
///
/// The image size when one was given, otherwise the smallest whole pixel count
/// covering the data on both axes.
pub fn grid_extent(config: &RunConfig, stats: &DatasetStats) -> u32 {
    match config.fit.image_size {
        Some(size) if size > 0 => size,
        _ => {
            let max = stats.x_max.max(stats.y_max).max(0.0).floor() + 1.0;
            if max >= u32::MAX as f64 { u32::MAX } else { max as u32 }
        }
    }
}

/// Write both result tables into `config.output_dir`; returns the written paths.
pub fn write_tables(config: &RunConfig, run: &RunOutput) -> Result<Vec<PathBuf>, AppError> {
    std::fs::create_dir_all(&config.output_dir).map_err(|e| {
        AppError::new(
            2,
            format!(
                "Failed to create output directory '{}': {e}",
                config.output_dir.display()
            ),
        )
    })?;

    let degree = run.fit.degree();
    let vs_data = config.output_dir.join(fitted_vs_data_filename(degree));
    write_fitted_vs_data(&vs_data, &run.fit)?;

    let grid = run
        .fit
        .grid(grid_extent(config, &run.input.stats), config.fit.grid_step)?;
    let surface = config.output_dir.join(surface_grid_filename(degree));
    write_surface_grid(&surface, &grid)?;

    tracing::info!(
        fitted_vs_data = %vs_data.display(),
        surface = %surface.display(),
        size = grid.size(),
        samples = grid.len(),
        "wrote result tables"
    );
    Ok(vec![vs_data, surface])
}
