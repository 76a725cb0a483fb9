use std::{fs, path::Path, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use depth_extrinsics::{
    CalibrationError, CalibrationSession, Collection, Intrinsics, Pixel, PoseReport,
    SessionConfig, WorldPointTable,
};
use log::{debug, error, info, warn};

/// Solve the depth camera pose from a replayed click log.
#[derive(Debug, Parser)]
#[command(author, version, about = "Depth camera extrinsic calibration")]
struct Args {
    /// Depth camera intrinsics (camera_info yaml).
    #[arg(long)]
    intrinsics: PathBuf,

    /// Ground-truth table, one `id, x, y, z` row per world point.
    #[arg(long)]
    ground_truth: PathBuf,

    /// Click log, one `u, v, depth` row per click in world point order.
    #[arg(long)]
    clicks: PathBuf,

    /// Optional session configuration yaml. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Click {
    line: usize,
    pixel: Pixel,
    depth: f64,
}

fn parse_clicks(text: &str) -> Result<Vec<Click>> {
    let mut clicks = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            bail!("click log line {}: expected `u, v, depth`", line_no);
        }
        let x = fields[0]
            .parse::<i32>()
            .with_context(|| format!("click log line {}: bad column", line_no))?;
        let y = fields[1]
            .parse::<i32>()
            .with_context(|| format!("click log line {}: bad row", line_no))?;
        let depth = fields[2]
            .parse::<f64>()
            .with_context(|| format!("click log line {}: bad depth", line_no))?;

        clicks.push(Click {
            line: line_no,
            pixel: Pixel::new(x, y),
            depth,
        });
    }
    Ok(clicks)
}

fn run_from_files(
    intrinsics_path: &Path,
    ground_truth_path: &Path,
    clicks_path: &Path,
    config_path: Option<&Path>,
) -> Result<Vec<PoseReport>> {
    let intrinsics = Intrinsics::load(intrinsics_path)
        .with_context(|| format!("loading intrinsics from {}", intrinsics_path.display()))?;
    let world = WorldPointTable::load(ground_truth_path)
        .with_context(|| format!("loading ground truth from {}", ground_truth_path.display()))?;
    let config = match config_path {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SessionConfig::default(),
    };
    let text = fs::read_to_string(clicks_path)
        .with_context(|| format!("reading clicks from {}", clicks_path.display()))?;
    let clicks = parse_clicks(&text)?;

    let mut session = CalibrationSession::new(intrinsics, world, config)?;
    let mut reports = Vec::new();

    for click in clicks {
        match session.add_correspondence(click.pixel, click.depth) {
            Ok(Collection::Pending {
                collected,
                required,
            }) => debug!("line {}: {}/{} collected", click.line, collected, required),
            Ok(Collection::Solved(pose)) => {
                info!("line {}: pass {} solved", click.line, reports.len() + 1);
                reports.push(pose.report());
            }
            Err(err) if err.is_recoverable() => {
                warn!("line {}: click skipped: {}", click.line, err)
            }
            Err(CalibrationError::DegenerateGeometry(err)) => {
                error!("line {}: pass failed: {}", click.line, err)
            }
            Err(err) => return Err(err.into()),
        }
    }

    if session.collected() > 0 {
        warn!(
            "{} of {} clicks of an unfinished pass were ignored",
            session.collected(),
            session.required()
        );
    }
    Ok(reports)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = try_main() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let reports = run_from_files(
        &args.intrinsics,
        &args.ground_truth,
        &args.clicks,
        args.config.as_deref(),
    )?;
    if reports.is_empty() {
        bail!("no calibration pass completed");
    }
    for report in reports.iter() {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}
