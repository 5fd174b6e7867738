use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::{eyre::WrapErr, Result};
use serde::Serialize;
use tracing::info;

use scenario_core::{
    load_calibration_catalog_from_env, load_scenario_config_from_env, report, run_robustness,
    run_scenario, run_social_roi, run_sweep, trace_path, CalibrationCatalog, SimulationConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Monte Carlo scenarios of fusion timing and world output", long_about = None)]
struct Cli {
    /// Scenario config JSON. Defaults to SCENARIO_CONFIG_PATH, then the built-in config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[arg(long, global = true)]
    paths: Option<usize>,
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate one configuration and summarize its outcomes.
    Run {
        /// Pin every path to this fusion year instead of the configured prior.
        #[arg(long)]
        fusion_year: Option<i32>,
    },
    /// Sweep fixed fusion years.
    Sweep {
        #[arg(long)]
        from: Option<i32>,
        #[arg(long)]
        to: Option<i32>,
        #[arg(long)]
        step: Option<u32>,
    },
    /// Re-run the baseline under alternative calibrations.
    Robustness {
        /// Calibration catalog JSON. Defaults to CALIBRATION_VARIATIONS_PATH, then the built-in catalog.
        #[arg(long)]
        variations: Option<PathBuf>,
    },
    /// Value a year of fusion acceleration against cumulative capex.
    Roi {
        #[arg(long)]
        early: Option<i32>,
        #[arg(long)]
        late: Option<i32>,
    },
    /// Print one noise-free path with latent draws at their means.
    Trace {
        #[arg(long, default_value_t = 2040)]
        fusion_year: i32,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    info!(
        seed = config.seed,
        paths = config.paths,
        fusion = %config.fusion.label(),
        "scenario.config_resolved"
    );

    match cli.command {
        Command::Run { fusion_year } => {
            let config = match fusion_year {
                Some(year) => config.with_fixed_fusion(year),
                None => config,
            };
            let result = run_scenario(&config).wrap_err("run failed")?;
            emit(cli.format, &result, || report::render_run(&result))
        }
        Command::Sweep { from, to, step } => {
            let mut sweep = config.sweep.clone();
            sweep.from = from.unwrap_or(sweep.from);
            sweep.to = to.unwrap_or(sweep.to);
            sweep.step = step.unwrap_or(sweep.step);
            let config = SimulationConfig { sweep, ..config };
            config.validate()?;
            let result =
                run_sweep(&config, &config.sweep.years(), None).wrap_err("sweep failed")?;
            emit(cli.format, &result, || report::render_sweep(&result))
        }
        Command::Robustness { variations } => {
            let catalog = match variations {
                Some(path) => CalibrationCatalog::from_file(&path)
                    .wrap_err_with(|| format!("loading {}", path.display()))?
                    .into(),
                None => load_calibration_catalog_from_env(),
            };
            let rows = run_robustness(&config, &catalog, None).wrap_err("robustness failed")?;
            emit(cli.format, &rows, || report::render_robustness(&rows))
        }
        Command::Roi { early, late } => {
            let mut config = config;
            config.roi.early_year = early.unwrap_or(config.roi.early_year);
            config.roi.late_year = late.unwrap_or(config.roi.late_year);
            config.validate()?;
            let roi = run_social_roi(&config, None).wrap_err("roi failed")?;
            emit(cli.format, &roi, || report::render_roi(&roi))
        }
        Command::Trace { fusion_year } => {
            let rows = trace_path(&config, fusion_year).wrap_err("trace failed")?;
            emit(cli.format, &rows, || report::render_trace(fusion_year, &rows))
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_file(path)
            .wrap_err_with(|| format!("loading {}", path.display()))?,
        None => load_scenario_config_from_env().0,
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(paths) = cli.paths {
        config.paths = paths;
    }
    config.validate()?;
    Ok(config)
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, table: impl FnOnce() -> String) -> Result<()> {
    match format {
        OutputFormat::Table => print!("{}", table()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
