//! Command-line parsing for the polynomial surface fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/math code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sfit", version, about = "Fit a 2D polynomial surface to X Y Z text data")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a polynomial surface, print coefficients/diagnostics and write result tables.
    Fit(FitArgs),
    /// Generate synthetic X Y Z test data from the reference cubic surface.
    Generate(GenerateArgs),
    /// Evaluate a saved polynomial JSON at a raw pixel position.
    Eval(EvalArgs),
    /// Resample a saved polynomial JSON on a regular pixel grid.
    Grid(GridArgs),
}

/// Options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Whitespace-delimited text file with X Y ... Z columns.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Total polynomial order.
    #[arg(
        long,
        visible_aliases = ["poly-order", "polynomial-order"],
        default_value_t = 7,
        allow_negative_numbers = true
    )]
    pub order: i32,

    /// Image size used to normalize coordinates (center = scale = size/2).
    #[arg(long, visible_alias = "size", default_value_t = 8192)]
    pub image_size: u32,

    /// Normalize from the data bounding box instead of the image size.
    #[arg(long, conflicts_with = "image_size")]
    pub bbox: bool,

    /// Index of the Z column (0-based).
    #[arg(long, default_value_t = crate::io::ingest::DEFAULT_Z_COLUMN)]
    pub z_column: usize,

    /// Pixel step of the fitted-surface grid.
    #[arg(long, default_value_t = 10)]
    pub step: u32,

    /// Relative tolerance for the solve and derivative checks.
    #[arg(long, default_value_t = 1e-8)]
    pub tolerance: f64,

    /// Do not write result tables.
    #[arg(long, visible_alias = "no-savefiles")]
    pub no_files: bool,

    /// Directory for result tables.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Export the fitted polynomial (with normalization) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Print the assembled normal equations.
    #[arg(long)]
    pub show_equations: bool,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// Output text file.
    #[arg(long, short, default_value = "test.txt")]
    pub output: PathBuf,

    /// Image size in pixels.
    #[arg(long, default_value_t = 8192)]
    pub size: u32,

    /// Pixel step between samples.
    #[arg(long, default_value_t = 100)]
    pub step: u32,

    /// Standard deviation of additive Gaussian noise.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for evaluating a saved polynomial.
#[derive(Debug, Parser, Clone)]
pub struct EvalArgs {
    /// Polynomial JSON produced by `sfit fit --export-json`.
    #[arg(long, value_name = "JSON")]
    pub poly: PathBuf,

    /// Raw X pixel coordinate.
    #[arg(allow_negative_numbers = true)]
    pub x: f64,

    /// Raw Y pixel coordinate.
    #[arg(allow_negative_numbers = true)]
    pub y: f64,
}

/// Options for resampling a saved polynomial.
#[derive(Debug, Parser, Clone)]
pub struct GridArgs {
    /// Polynomial JSON produced by `sfit fit --export-json`.
    #[arg(long, value_name = "JSON")]
    pub poly: PathBuf,

    /// Grid extent in pixels (defaults to the image size the fit was normalized with).
    #[arg(long)]
    pub size: Option<u32>,

    /// Pixel step.
    #[arg(long, default_value_t = 10)]
    pub step: u32,

    /// Output text file.
    #[arg(long, short)]
    pub output: PathBuf,
}
