//! Whitespace-delimited text ingest.
//!
//! Turns a text file of `x y ... z ...` rows into [`DataPoint`]s.
//!
//! Format rules:
//! - fields are separated by arbitrary whitespace
//! - lines whose first character is `#` are comments
//! - blank lines are ignored
//! - `x` is column 0, `y` is column 1, `z` is a configurable column (default 2)
//!
//! Unlike a lenient CSV ingest, a single malformed row fails the whole load: a
//! calibration surface fitted from silently truncated data is worse than no fit.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::domain::{DataPoint, DatasetStats};
use crate::error::{FitError, Result};

/// Default index of the `z` column.
pub const DEFAULT_Z_COLUMN: usize = 2;

/// Ingest output: points in file order plus bookkeeping.
#[derive(Debug, Clone)]
pub struct InputData {
    pub source: Option<PathBuf>,
    pub points: Vec<DataPoint>,
    pub stats: DatasetStats,
    pub z_column: usize,
    pub lines_read: usize,
    pub comments_skipped: usize,
}

/// Load points from `path`.
pub fn load_points(path: &Path, z_column: usize) -> Result<InputData> {
    let file = File::open(path).map_err(|e| FitError::io(path, e))?;

    let mut data = parse_points(BufReader::new(file), z_column)?;
    data.source = Some(path.to_path_buf());
    tracing::info!("READ {} values from file {}", data.points.len(), path.display());
    Ok(data)
}

/// Parse points from any buffered reader.
pub fn parse_points<R: BufRead>(reader: R, z_column: usize) -> Result<InputData> {
    let required_columns = z_column.max(1) + 1;
    let mut points = Vec::new();
    let mut lines_read = 0usize;
    let mut comments_skipped = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| FitError::MalformedInput {
            line: line_no,
            message: format!("read error: {e}"),
        })?;
        lines_read += 1;

        if line.starts_with('#') {
            comments_skipped += 1;
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < required_columns {
            return Err(FitError::MalformedInput {
                line: line_no,
                message: format!(
                    "expected at least {required_columns} columns, found {}",
                    fields.len()
                ),
            });
        }

        let x = parse_field(fields[0], line_no, "x")?;
        let y = parse_field(fields[1], line_no, "y")?;
        let z = parse_field(fields[z_column], line_no, "z")?;
        points.push(DataPoint::new(x, y, z));
    }

    let stats = DatasetStats::from_points(&points).ok_or_else(|| FitError::MalformedInput {
        line: 0,
        message: "no data points found".to_string(),
    })?;

    Ok(InputData {
        source: None,
        points,
        stats,
        z_column,
        lines_read,
        comments_skipped,
    })
}

fn parse_field(raw: &str, line: usize, name: &str) -> Result<f64> {
    let v: f64 = raw.parse().map_err(|_| FitError::MalformedInput {
        line,
        message: format!("`{name}` value '{raw}' is not a number"),
    })?;
    if !v.is_finite() {
        return Err(FitError::MalformedInput {
            line,
            message: format!("`{name}` value '{raw}' is not finite"),
        });
    }
    Ok(v)
}
