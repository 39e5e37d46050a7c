//! casekit - nested, parallel-aware unit test harness
//!
//! Runs the built-in demonstration suite and benchmarks.
//!
//! ## Usage
//!
//! ```bash
//! # Run every case
//! casekit test
//!
//! # Run one subtest, skipping long cases
//! casekit test --short --run Divide/zero
//!
//! # JSON output saved to disk
//! casekit test --format json --output run.json
//!
//! # Benchmarks with a 200ms minimum per benchmark
//! casekit bench --benchtime 200
//!
//! # List registered cases
//! casekit list
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info};

mod cli;

use casekit::config::{print_env_help, EnvConfig, RunnerConfig};
use casekit::output::{write_run_document, OutputFormat, ResultFormatter};
use casekit::utils::{init_logger, LogLevel};
use casekit::{sample, BenchmarkRunner, CaseFilter, Executor, Registry, Reporter};
use cli::{Args, BenchArgs, Command, TestArgs};

const EXIT_FAILED: u8 = 1;
const EXIT_HARNESS_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("casekit: {err:#}");
            ExitCode::from(EXIT_HARNESS_ERROR)
        }
    }
}

/// Errors returned here are harness errors, never case failures
async fn run(args: Args) -> Result<ExitCode> {
    let env = EnvConfig::load();
    let (config, level) = load_config(&args, &env)?;
    init_logger(level);
    if env.has_any() {
        debug!("Environment overrides active: {:?}", env);
    }

    let registry = sample::suite().context("Failed to register demonstration suite")?;

    match args.command {
        Command::Test(test_args) => run_tests(&registry, config, test_args).await,
        Command::Bench(bench_args) => run_benchmarks(&registry, config, bench_args).await,
        Command::List => {
            list_cases(&registry);
            Ok(ExitCode::SUCCESS)
        }
        Command::Env => {
            print_env_help();
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Resolve file and environment configuration, then apply global CLI options
fn load_config(args: &Args, env: &EnvConfig) -> Result<(RunnerConfig, LogLevel)> {
    let mut config = RunnerConfig::resolve(args.config.as_deref(), env)?;
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if args.no_color {
        config.color = false;
    }

    let level = config
        .log_level
        .parse::<LogLevel>()
        .map_err(anyhow::Error::msg)?;
    Ok((config, level))
}

fn formatter_for(format: &str, config: &RunnerConfig) -> Result<ResultFormatter> {
    let format = format.parse::<OutputFormat>().map_err(anyhow::Error::msg)?;

    let formatter = ResultFormatter::new(format).verbose(config.verbose);
    Ok(if config.color {
        formatter
    } else {
        formatter.no_color()
    })
}

async fn run_tests(
    registry: &Registry,
    mut config: RunnerConfig,
    args: TestArgs,
) -> Result<ExitCode> {
    if args.short {
        config.short = true;
    }
    if args.verbose {
        config.verbose = true;
    }
    if let Some(parallel) = args.parallel {
        config.max_parallel = parallel.max(1);
    }
    if let Some(format) = args.format {
        config.format = format;
    }

    let formatter = formatter_for(&config.format, &config)?;
    let executor = Executor::new()
        .max_parallel(config.max_parallel)
        .short_mode(config.short)
        .filter(CaseFilter::from_option(args.run.as_deref()));

    let report = match executor.run(registry).await {
        Ok(report) => report,
        Err(err) => {
            error!("Run aborted: {}", err);
            eprintln!("casekit: {err}");
            return Ok(ExitCode::from(EXIT_HARNESS_ERROR));
        }
    };

    let summary = Reporter::summarize(&report);
    println!("{}", formatter.format_report(&report, &summary));

    if let Some(path) = &args.output {
        write_run_document(path, &report, &summary)?;
        info!("Saved run document to {}", path.display());
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILED)
    })
}

async fn run_benchmarks(
    registry: &Registry,
    mut config: RunnerConfig,
    args: BenchArgs,
) -> Result<ExitCode> {
    if let Some(ms) = args.benchtime {
        config.benchmark.min_time_ms = ms;
    }
    if let Some(max) = args.max_iterations {
        config.benchmark.max_iterations = max.max(1);
    }
    if let Some(format) = args.format {
        config.format = format;
    }

    let formatter = formatter_for(&config.format, &config)?;
    let runner = BenchmarkRunner::new(config.benchmark.clone());
    let filter = CaseFilter::from_option(args.bench.as_deref());

    match Executor::new()
        .run_benchmarks(registry, runner, &filter)
        .await
    {
        Ok(results) => {
            print!("{}", formatter.format_benchmarks(&results));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!("Benchmarks aborted: {}", err);
            eprintln!("casekit: {err}");
            Ok(ExitCode::from(EXIT_HARNESS_ERROR))
        }
    }
}

fn list_cases(registry: &Registry) {
    println!("\nTest cases ({} total)", registry.len());
    println!("──────────────────────────────────────────");
    for case in registry.cases() {
        println!("  {}", case.name());
    }

    println!("\nBenchmarks ({} total)", registry.benchmarks().len());
    println!("──────────────────────────────────────────");
    for bench in registry.benchmarks() {
        println!("  {}", bench.name());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = Args::parse_from(["casekit", "--config", "/nonexistent/casekit.yaml", "list"]);
        assert!(load_config(&args, &EnvConfig::default()).is_err());
        assert!(tokio_test::block_on(run(args)).is_err());
    }

    #[test]
    fn test_invalid_log_level_is_rejected() {
        let args = Args::parse_from(["casekit", "--log-level", "loud", "list"]);
        let err = load_config(&args, &EnvConfig::default()).unwrap_err();
        assert!(err.to_string().contains("unknown log level: loud"));

        let env = EnvConfig {
            log_level: Some("chatty".to_string()),
            ..Default::default()
        };
        let args = Args::parse_from(["casekit", "list"]);
        assert!(load_config(&args, &env).is_err());
    }

    #[test]
    fn test_cli_options_override_config() {
        let args = Args::parse_from(["casekit", "--log-level", "debug", "--no-color", "list"]);
        let (config, level) = load_config(&args, &EnvConfig::default()).unwrap();
        assert_eq!(level, LogLevel::Debug);
        assert!(!config.color);
    }
}
