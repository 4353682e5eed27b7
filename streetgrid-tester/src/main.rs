mod reports;
mod run;
mod seeds;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use run::{RunConfig, RunOutcome, run_seed};
use seeds::{parse_cell, resolve_seeds, split_csv};
use streetgrid_mdp::{Cell, ValueIterationSolver};

#[derive(Debug, Parser)]
#[command(name = "streetgrid-tester", version)]
#[command(about = "Solve random street grids with value iteration and report the policies")]
struct Args {
    /// JSON file with `grid` and `solver` sections; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seeds to run (comma-separated, decimal or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Grid side length
    #[arg(long)]
    size: Option<usize>,

    /// Number of explicit delay buckets before the tail
    #[arg(long)]
    horizon: Option<usize>,

    /// Residual below which sweeping may stop
    #[arg(long)]
    tolerance: Option<f64>,

    /// Sweeps always performed before the residual is checked
    #[arg(long)]
    min_sweeps: Option<usize>,

    /// Hard cap on sweeps
    #[arg(long)]
    max_sweeps: Option<usize>,

    /// Discount factor in (0, 1]
    #[arg(long)]
    discount: Option<f64>,

    /// Cell the reported route starts from
    #[arg(long, default_value = "0,0")]
    start: String,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Print per-sweep residuals in the console report
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let cfg = build_run_config(&args)?;
    let solver = ValueIterationSolver::new(cfg.solver.clone())?;
    let (x, y) = parse_cell(&args.start)?;
    let start = Cell::new(x, y);
    let seeds = resolve_seeds(&split_csv(&args.seeds))?;

    if args.report == "console" && args.output.is_none() {
        announce_banner();
    }

    let start_time = Instant::now();
    let outcomes: Vec<RunOutcome> = seeds
        .iter()
        .map(|&seed| {
            log::info!("solving seed {seed} on a {0}x{0} grid", cfg.grid.size);
            run_seed(&cfg, &solver, seed, start)
        })
        .collect();

    write_reports(&args, &outcomes, start_time)?;

    if outcomes.iter().any(|o| !o.is_solved()) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🚦 Street Grid Solver".bright_cyan().bold());
    println!("{}", "=====================".cyan());
}

fn build_run_config(args: &Args) -> Result<RunConfig> {
    let mut cfg = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(size) = args.size {
        cfg.grid.size = size;
    }
    if let Some(horizon) = args.horizon {
        cfg.grid.horizon = horizon;
    }
    if let Some(tolerance) = args.tolerance {
        cfg.solver.tolerance = tolerance;
    }
    if let Some(min_sweeps) = args.min_sweeps {
        cfg.solver.min_sweeps = min_sweeps;
    }
    if let Some(max_sweeps) = args.max_sweeps {
        cfg.solver.max_sweeps = max_sweeps;
    }
    if let Some(discount) = args.discount {
        cfg.solver.discount = discount;
    }
    cfg.grid.validate().context("invalid grid configuration")?;
    Ok(cfg)
}

fn write_reports(args: &Args, outcomes: &[RunOutcome], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(output_target.writer(), outcomes)?,
        "markdown" => reports::generate_markdown_report(output_target.writer(), outcomes)?,
        "csv" => reports::generate_csv_report(output_target.writer(), outcomes)?,
        _ => {
            let duration = start_time.elapsed();
            reports::generate_console_report(
                output_target.writer(),
                outcomes,
                args.verbose,
                duration,
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streetgrid_mdp::{GridConfig, SolverConfig};

    fn base_args() -> Args {
        Args {
            config: None,
            seeds: "1337".to_string(),
            size: None,
            horizon: None,
            tolerance: None,
            min_sweeps: None,
            max_sweeps: None,
            discount: None,
            start: "0,0".to_string(),
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "streetgrid-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn defaults_match_library_defaults() {
        let cfg = build_run_config(&base_args()).unwrap();
        assert_eq!(cfg.grid, GridConfig::default());
        assert_eq!(cfg.solver, SolverConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let path = temp_path("cfg");
        std::fs::write(
            &path,
            r#"{"grid": {"size": 4, "horizon": 6}, "solver": {"min_sweeps": 3}}"#,
        )
        .unwrap();
        let mut args = base_args();
        args.config = Some(path.clone());
        args.size = Some(5);
        args.discount = Some(0.9);
        let cfg = build_run_config(&args).unwrap();
        assert_eq!(cfg.grid.size, 5);
        assert_eq!(cfg.grid.horizon, 6);
        assert_eq!(cfg.solver.min_sweeps, 3);
        assert!((cfg.solver.discount - 0.9).abs() < f64::EPSILON);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut args = base_args();
        args.size = Some(0);
        assert!(build_run_config(&args).is_err());
    }

    #[test]
    fn output_target_writes_to_file() {
        let path = temp_path("out");
        let mut target = OutputTarget::new(Some(path.clone())).unwrap();
        writeln!(target.writer(), "hello").unwrap();
        target.flush_inner().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn reports_write_to_requested_file() {
        let path = temp_path("report");
        let mut args = base_args();
        args.size = Some(3);
        args.output = Some(path.clone());
        let cfg = build_run_config(&args).unwrap();
        let solver = ValueIterationSolver::new(cfg.solver.clone()).unwrap();
        let outcomes = vec![run_seed(&cfg, &solver, 1337, Cell::new(0, 0))];
        write_reports(&args, &outcomes, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"status\": \"solved\""));
        let _ = std::fs::remove_file(path);
    }
}
