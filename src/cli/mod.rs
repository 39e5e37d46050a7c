//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Nested, parallel-aware unit test harness
#[derive(Parser, Debug)]
#[command(name = "casekit")]
#[command(version)]
#[command(about = "Run the casekit demonstration suite and benchmarks")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (YAML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Harness log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run test cases
    Test(TestArgs),

    /// Run benchmarks
    Bench(BenchArgs),

    /// List registered cases and benchmarks
    List,

    /// Show supported environment variables
    Env,
}

/// Arguments for test command
#[derive(Parser, Debug)]
pub struct TestArgs {
    /// Only run cases matching this slash-separated pattern
    #[arg(long)]
    pub run: Option<String>,

    /// Enable short mode
    #[arg(short, long)]
    pub short: bool,

    /// Maximum number of parallel cases
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Print logs of passing cases
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Save a JSON run document to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for bench command
#[derive(Parser, Debug)]
pub struct BenchArgs {
    /// Only run benchmarks whose name contains this pattern
    #[arg(long)]
    pub bench: Option<String>,

    /// Minimum measured time per benchmark in milliseconds
    #[arg(long)]
    pub benchtime: Option<u64>,

    /// Iteration cap per benchmark round
    #[arg(long)]
    pub max_iterations: Option<u64>,

    /// Output format (text, json, json-pretty, csv)
    #[arg(short, long)]
    pub format: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_test_command() {
        let args = Args::parse_from([
            "casekit", "test", "--short", "--run", "Divide/zero", "-p", "2",
        ]);
        match args.command {
            Command::Test(test) => {
                assert!(test.short);
                assert_eq!(test.run.as_deref(), Some("Divide/zero"));
                assert_eq!(test.parallel, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_bench_command() {
        let args = Args::parse_from(["casekit", "--no-color", "bench", "--benchtime", "50"]);
        assert!(args.no_color);
        match args.command {
            Command::Bench(bench) => assert_eq!(bench.benchtime, Some(50)),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
