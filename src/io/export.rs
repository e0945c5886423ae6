//! Text table exports.
//!
//! Two fixed-format tables are produced per fit, both meant to be easy to feed
//! into plotting scripts:
//!
//! - fitted vs data: `X Y FIT DATA DATA-FIT` for every input point
//! - fitted surface: `X Y FIT` on a regular pixel grid
//!
//! Coordinates are written with 3 decimals, values with 8.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{FitError, Result};
use crate::fit::{SurfaceFit, SurfaceGrid};

/// `fitted_vs_data_order03.txt` for degree 3.
pub fn fitted_vs_data_filename(degree: u32) -> String {
    format!("fitted_vs_data_order{degree:02}.txt")
}

/// `fitted_order03.txt` for degree 3.
pub fn surface_grid_filename(degree: u32) -> String {
    format!("fitted_order{degree:02}.txt")
}

/// Write the per-point fitted-vs-data table (raw coordinates).
pub fn write_fitted_vs_data(path: &Path, fit: &SurfaceFit) -> Result<()> {
    let file = File::create(path).map_err(|e| FitError::io(path, e))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "# X  Y  FIT   DATA  DATA-FIT").map_err(|e| FitError::io(path, e))?;
    for f in &fit.fitted {
        writeln!(
            out,
            "{:.3} {:.3} {:.8} {:.8} {:.8}",
            f.point.x, f.point.y, f.fit, f.point.z, f.residual
        )
        .map_err(|e| FitError::io(path, e))?;
    }
    out.flush().map_err(|e| FitError::io(path, e))?;
    Ok(())
}

/// Write the fitted-surface grid table.
pub fn write_surface_grid(path: &Path, grid: &SurfaceGrid<'_>) -> Result<()> {
    let file = File::create(path).map_err(|e| FitError::io(path, e))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "# X  Y  FIT").map_err(|e| FitError::io(path, e))?;
    writeln!(out, "# X,Y steps {} pixels", grid.step()).map_err(|e| FitError::io(path, e))?;
    for s in grid {
        writeln!(out, "{:.3} {:.3} {:.8}", s.x, s.y, s.value).map_err(|e| FitError::io(path, e))?;
    }
    out.flush().map_err(|e| FitError::io(path, e))?;
    Ok(())
}
