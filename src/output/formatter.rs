//! Output formatters for run results
//!
//! Provides text, JSON, CSV and summary output formats.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use crate::benchmark::BenchmarkResult;
use crate::models::{CaseRecord, ExecutionReport, Outcome};
use crate::reporter::Summary;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "table" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Ok(OutputFormat::JsonPretty),
            "csv" => Ok(OutputFormat::Csv),
            "summary" => Ok(OutputFormat::Summary),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    path: &'a str,
    outcome: Outcome,
    duration_ms: f64,
    parallel: bool,
    message: &'a str,
}

#[derive(Serialize)]
struct ReportJson<'a> {
    summary: &'a Summary,
    cases: &'a [CaseRecord],
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
    verbose: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
            verbose: false,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Show logs of passing cases too
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Format a whole run
    pub fn format_report(&self, report: &ExecutionReport, summary: &Summary) -> String {
        match self.format {
            OutputFormat::Text => self.format_text(report, summary),
            OutputFormat::Json => {
                serde_json::to_string(&ReportJson {
                    summary,
                    cases: &report.cases,
                })
                .unwrap_or_default()
            }
            OutputFormat::JsonPretty => serde_json::to_string_pretty(&ReportJson {
                summary,
                cases: &report.cases,
            })
            .unwrap_or_default(),
            OutputFormat::Csv => format_csv(report).unwrap_or_default(),
            OutputFormat::Summary => self.format_summary_line(summary),
        }
    }

    fn status(&self, outcome: Outcome) -> String {
        if !self.colorize {
            return outcome.to_string();
        }
        match outcome {
            Outcome::Passed => "\x1b[32mPASS\x1b[0m".to_string(),
            Outcome::Failed => "\x1b[31mFAIL\x1b[0m".to_string(),
            Outcome::Skipped => "\x1b[33mSKIP\x1b[0m".to_string(),
        }
    }

    /// One `--- STATUS: path (0.00s)` line per case, details indented below
    pub fn format_case(&self, case: &CaseRecord) -> String {
        let indent = "    ".repeat(case.depth);
        let detail_indent = "    ".repeat(case.depth + 1);
        let mut output = format!(
            "{indent}--- {}: {} ({:.2}s)\n",
            self.status(case.outcome),
            case.path,
            case.duration_ms / 1000.0
        );

        for message in &case.failures {
            let _ = writeln!(output, "{detail_indent}{message}");
        }
        if let Some(reason) = &case.skip_reason {
            let _ = writeln!(output, "{detail_indent}{reason}");
        }
        if self.verbose || case.outcome == Outcome::Failed {
            for line in &case.logs {
                let _ = writeln!(output, "{detail_indent}{line}");
            }
        }
        output
    }

    fn format_text(&self, report: &ExecutionReport, summary: &Summary) -> String {
        let mut output = String::new();
        for case in &report.cases {
            output.push_str(&self.format_case(case));
        }

        let verdict = if summary.is_success() { "PASS" } else { "FAIL" };
        let _ = writeln!(output, "{verdict}");
        output.push_str(&self.format_summary_line(summary));
        output
    }

    fn format_summary_line(&self, summary: &Summary) -> String {
        let verdict = if summary.is_success() { "ok" } else { "FAIL" };
        let verdict = if self.colorize {
            if summary.is_success() {
                format!("\x1b[32m{verdict}\x1b[0m")
            } else {
                format!("\x1b[31m{verdict}\x1b[0m")
            }
        } else {
            verdict.to_string()
        };

        format!(
            "{verdict}  {} passed, {} failed, {} skipped ({} cases, {:.2}s)",
            summary.passed,
            summary.failed,
            summary.skipped,
            summary.total,
            summary.elapsed_ms / 1000.0
        )
    }

    /// Format benchmark results
    pub fn format_benchmarks(&self, results: &[BenchmarkResult]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string(results).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(results).unwrap_or_default(),
            OutputFormat::Csv => format_benchmarks_csv(results).unwrap_or_default(),
            OutputFormat::Text | OutputFormat::Summary => {
                let mut output = String::new();
                for result in results {
                    let _ = writeln!(output, "{result}");
                }
                output
            }
        }
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Text)
    }
}

fn format_csv(report: &ExecutionReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for case in &report.cases {
        let message = case
            .failures
            .first()
            .or(case.skip_reason.as_ref())
            .map(String::as_str)
            .unwrap_or("");
        writer.serialize(CsvRow {
            path: &case.path,
            outcome: case.outcome,
            duration_ms: case.duration_ms,
            parallel: case.parallel,
            message,
        })?;
    }
    into_string(writer)
}

fn format_benchmarks_csv(results: &[BenchmarkResult]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["name", "iterations", "elapsed_ns", "ns_per_iter"])?;
    for result in results {
        writer.write_record([
            result.name.clone(),
            result.iterations.to_string(),
            result.elapsed_ns.to_string(),
            format!("{:.3}", result.ns_per_iter()),
        ])?;
    }
    into_string(writer)
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush CSV output")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// Saved record of one run
#[derive(Serialize)]
pub struct RunDocument<'a> {
    pub finished_at: DateTime<Utc>,
    pub short_mode: bool,
    pub summary: &'a Summary,
    pub cases: &'a [CaseRecord],
}

/// Write a JSON run document to a file
pub fn write_run_document(
    path: impl AsRef<Path>,
    report: &ExecutionReport,
    summary: &Summary,
) -> Result<()> {
    let document = RunDocument {
        finished_at: Utc::now(),
        short_mode: report.short_mode,
        summary,
        cases: &report.cases,
    };
    let content =
        serde_json::to_string_pretty(&document).context("Failed to serialize run document")?;

    std::fs::write(path.as_ref(), content)
        .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CaseId, FailureDetail};
    use crate::reporter::Reporter;

    fn sample_report() -> ExecutionReport {
        let case = |id, parent: Option<usize>, path: &str, outcome| CaseRecord {
            id: CaseId(id),
            parent: parent.map(CaseId),
            path: path.to_string(),
            depth: path.matches('/').count(),
            outcome,
            parallel: false,
            duration_ms: 1.0,
            failures: Vec::new(),
            skip_reason: None,
            logs: Vec::new(),
        };

        let mut zero = case(2, Some(0), "TestDivide/division_by_zero", Outcome::Failed);
        zero.failures.push("expected error, got none".to_string());
        zero.logs.push("dividing 10 by 0".to_string());

        ExecutionReport {
            cases: vec![
                case(0, None, "TestDivide", Outcome::Failed),
                case(1, Some(0), "TestDivide/success", Outcome::Passed),
                zero,
            ],
            failures: vec![FailureDetail {
                path: "TestDivide/division_by_zero".to_string(),
                message: "expected error, got none".to_string(),
            }],
            elapsed_ms: 3.0,
            short_mode: false,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("TABLE".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("unknown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_text_output() {
        let report = sample_report();
        let summary = Reporter::summarize(&report);
        let output = ResultFormatter::new(OutputFormat::Text)
            .no_color()
            .format_report(&report, &summary);

        assert!(output.contains("--- FAIL: TestDivide (0.00s)"));
        assert!(output.contains("    --- PASS: TestDivide/success"));
        assert!(output.contains("        expected error, got none"));
        assert!(output.contains("        dividing 10 by 0"));
        assert!(output.contains("FAIL  1 passed, 2 failed, 0 skipped"));
    }

    #[test]
    fn test_passing_logs_only_when_verbose() {
        let mut report = sample_report();
        report.cases[1].logs.push("quiet".to_string());
        let summary = Reporter::summarize(&report);

        let quiet = ResultFormatter::new(OutputFormat::Text)
            .no_color()
            .format_report(&report, &summary);
        assert!(!quiet.contains("quiet"));

        let loud = ResultFormatter::new(OutputFormat::Text)
            .no_color()
            .verbose(true)
            .format_report(&report, &summary);
        assert!(loud.contains("quiet"));
    }

    #[test]
    fn test_csv_output() {
        let report = sample_report();
        let summary = Reporter::summarize(&report);
        let output = ResultFormatter::new(OutputFormat::Csv).format_report(&report, &summary);

        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("path,outcome,duration_ms,parallel,message")
        );
        assert_eq!(lines.count(), 3);
        assert!(output.contains("TestDivide/division_by_zero,failed"));
    }

    #[test]
    fn test_json_output() {
        let report = sample_report();
        let summary = Reporter::summarize(&report);
        let output = ResultFormatter::new(OutputFormat::Json).format_report(&report, &summary);

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["summary"]["failed"], 2);
        assert_eq!(value["cases"][1]["outcome"], "passed");
    }

    #[test]
    fn test_write_run_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let report = sample_report();
        let summary = Reporter::summarize(&report);

        write_run_document(&path, &report, &summary).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["summary"]["total"], 3);
        assert!(value["finished_at"].is_string());
    }
}
