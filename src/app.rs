//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs the log subscriber
//! - loads X Y Z data and runs the surface fit
//! - prints reports
//! - writes result tables and optional exports

use clap::Parser;
use tracing::Level;

use crate::cli::{Command, EvalArgs, FitArgs, GenerateArgs, GridArgs};
use crate::data::synthetic::GeneratorConfig;
use crate::domain::{FitConfig, NormalizationParams, RunConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `sfit` binary.
pub fn run() -> Result<(), AppError> {
    // `sfit data.txt --order 3` is shorthand for `sfit fit data.txt --order 3`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Generate(args) => handle_generate(args),
        Command::Eval(args) => handle_eval(args),
        Command::Grid(args) => handle_grid(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_fit_summary(&run.input, &run.fit, &config.fit)
    );
    if config.show_equations {
        println!(
            "{}",
            crate::report::format_equations(&run.equations, run.fit.polynomial.basis())
        );
    }

    if config.fit.save_files {
        pipeline::write_tables(&config, &run)?;
    } else {
        tracing::warn!("saving output files is not required");
    }

    if let Some(path) = &config.export_json {
        crate::io::polynomial::write_polynomial_json(path, &run.fit)?;
        tracing::info!("wrote polynomial JSON {}", path.display());
    }

    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let config = GeneratorConfig {
        size: args.size,
        step: args.step,
        noise_sigma: args.noise,
        seed: args.seed,
        ..Default::default()
    };
    let points = crate::data::synthetic::generate_grid(&config)?;
    crate::data::synthetic::write_points(&args.output, &points)?;
    println!("Wrote {} points to {}", points.len(), args.output.display());
    println!("{}", generate_fit_hint(&args.output, &config));
    Ok(())
}

/// Command line that fits generated data with the matching order and image size.
fn generate_fit_hint(output: &std::path::Path, config: &GeneratorConfig) -> String {
    let order = config.model.degree();
    format!(
        "Surface is order {order}; fit with: sfit fit {} --order {order} --image-size {}",
        output.display(),
        config.size
    )
}

fn handle_eval(args: EvalArgs) -> Result<(), AppError> {
    let file = crate::io::polynomial::read_polynomial_json(&args.poly)?;
    let poly = file.to_fitted()?;
    let (xn, yn) = file.normalization.apply(args.x, args.y);
    println!("{:.8}", crate::models::evaluate(&poly, xn, yn));
    Ok(())
}

fn handle_grid(args: GridArgs) -> Result<(), AppError> {
    let file = crate::io::polynomial::read_polynomial_json(&args.poly)?;
    let poly = file.to_fitted()?;
    let size = match args.size {
        Some(size) => size,
        None => image_size_of(&file.normalization).ok_or_else(|| {
            AppError::new(
                2,
                "polynomial was not normalized by image size; pass --size explicitly",
            )
        })?,
    };

    let grid = crate::fit::resample_grid(&poly, file.normalization, size, args.step)?;
    crate::io::export::write_surface_grid(&args.output, &grid)?;
    println!("Wrote {} samples to {}", grid.len(), args.output.display());
    Ok(())
}

/// Recover `S` from image-size normalization (`center = scale = S/2` on both axes).
fn image_size_of(n: &NormalizationParams) -> Option<u32> {
    let image_normalized = n.center_x == n.scale_x
        && n.center_y == n.scale_y
        && n.center_x == n.center_y
        && n.center_x.is_finite()
        && n.center_x > 0.0;
    if !image_normalized {
        return None;
    }
    let size = 2.0 * n.center_x;
    (size.fract() == 0.0 && size <= u32::MAX as f64).then_some(size as u32)
}

pub fn run_config_from_args(args: &FitArgs) -> Result<RunConfig, AppError> {
    if !(args.tolerance.is_finite() && args.tolerance > 0.0) {
        return Err(AppError::new(
            2,
            format!("--tolerance must be a positive number (got {})", args.tolerance),
        ));
    }
    Ok(RunConfig {
        input: args.input.clone(),
        z_column: args.z_column,
        output_dir: args.output_dir.clone(),
        export_json: args.export_json.clone(),
        show_equations: args.show_equations,
        fit: FitConfig {
            degree: args.order,
            image_size: (!args.bbox).then_some(args.image_size),
            tolerance: args.tolerance,
            grid_step: args.step,
            save_files: !args.no_files,
        },
    })
}

/// Rewrite argv so a bare input file defaults to `sfit fit`.
///
/// Rules:
/// - `sfit`                       -> unchanged (clap prints usage)
/// - `sfit --help/--version/-h`   -> unchanged
/// - `sfit <subcommand> ...`      -> unchanged
/// - `sfit data.txt ...`          -> `sfit fit data.txt ...`
/// - `sfit --order 3 data.txt`    -> `sfit fit --order 3 data.txt`
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    // `-v` is a global flag; look past leading verbosity flags.
    let first_real = argv[1..]
        .iter()
        .map(String::as_str)
        .find(|a| !is_verbosity_flag(a));
    match first_real {
        None | Some("fit" | "generate" | "eval" | "grid" | "help") => return argv,
        Some(_) => {}
    }

    argv.insert(1, "fit".to_string());
    argv
}

fn is_verbosity_flag(arg: &str) -> bool {
    match arg.strip_prefix('-') {
        Some("-verbose") => true,
        Some(flags) => !flags.is_empty() && flags.chars().all(|c| c == 'v'),
        None => false,
    }
}
