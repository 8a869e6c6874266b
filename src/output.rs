//! Output formatting for validation runs and argument tables
//!
//! Human output uses ANSI colors when stdout is a terminal. JSON output goes
//! through [`ValidationReport`] so both subcommands share one failure shape.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::arguments::ArgumentTable;
use crate::cli::VerbosityLevel;
use crate::config::{Config, OutputFormatConfig};
use crate::convert;
use crate::error::{ArgumentError, Result};
use crate::json::{self, JsonSettings};
use crate::report::{ValidationReport, ValidationSummary};
use crate::validator::DocumentValidation;

/// Counts over one batch of documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTotals {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: usize,
}

impl BatchTotals {
    pub fn from_results(results: &[DocumentValidation]) -> Self {
        let mut totals = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match &result.result {
                Ok(issues) if issues.is_empty() => totals.valid += 1,
                Ok(_) => totals.invalid += 1,
                Err(_) => totals.errors += 1,
            }
        }
        totals
    }

    pub fn all_valid(&self) -> bool {
        self.valid == self.total
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.valid as f64 * 100.0 / self.total as f64
    }
}

#[derive(Serialize)]
struct DocumentOutput<'a> {
    document: String,
    #[serde(flatten)]
    summary: ValidationSummary<'a>,
}

/// Output formatter configured from [`Config`]
pub struct Output {
    verbosity: VerbosityLevel,
    format: OutputFormatConfig,
    json: JsonSettings,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel, format: OutputFormatConfig, json: JsonSettings) -> Self {
        Self {
            verbosity,
            format,
            json,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let verbosity = if config.output.quiet {
            VerbosityLevel::Quiet
        } else if config.output.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        };
        Self::new(verbosity, config.output.format, config.output.json)
    }

    /// Disable ANSI colors regardless of the terminal
    pub fn without_colors(mut self) -> Self {
        self.show_colors = false;
        self
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Render a batch of document results in the configured format
    pub fn format_validation(
        &self,
        results: &[DocumentValidation],
        namespace: Option<&str>,
        duration: Duration,
    ) -> Result<String> {
        match self.format {
            OutputFormatConfig::Json => self.format_validation_json(results),
            OutputFormatConfig::Summary => {
                Ok(self.format_summary(&BatchTotals::from_results(results), namespace, duration))
            }
            OutputFormatConfig::Human => Ok(self.format_human(results, namespace, duration)),
        }
    }

    fn format_human(
        &self,
        results: &[DocumentValidation],
        namespace: Option<&str>,
        duration: Duration,
    ) -> String {
        let totals = BatchTotals::from_results(results);
        let mut output = String::new();

        if self.verbosity == VerbosityLevel::Quiet {
            for result in results.iter().filter(|r| !r.is_valid()) {
                output.push_str(&self.format_document(result));
                output.push('\n');
            }
            return output;
        }

        for result in results {
            output.push_str(&self.format_document(result));
            output.push('\n');
        }
        output.push('\n');
        output.push_str(&self.format_summary(&totals, namespace, duration));
        output
    }

    /// One line per document, followed by its issues in verbose mode
    pub fn format_document(&self, result: &DocumentValidation) -> String {
        let path_display = display_name(&result.path);

        match &result.result {
            Ok(issues) if issues.is_empty() => {
                format!("{}  {}", self.colorize("✓ VALID", "32"), path_display)
            }
            Ok(issues) => {
                let mut output = format!(
                    "{}  {} - {} issue{}",
                    self.colorize("✗ INVALID", "31"),
                    path_display,
                    issues.len(),
                    if issues.len() == 1 { "" } else { "s" }
                );

                if self.verbosity >= VerbosityLevel::Verbose {
                    for issue in issues {
                        let severity =
                            convert::capitalize_first_letter(&issue.severity.to_string(), false);
                        let position = issue
                            .position()
                            .map(|p| format!(" ({p})"))
                            .unwrap_or_default();
                        output.push_str(&format!("\n    {severity}{position}: {}", issue.message));
                    }
                }
                output
            }
            Err(err) => {
                format!(
                    "{}  {} - {}",
                    self.colorize("⚠ ERROR", "33"),
                    path_display,
                    err
                )
            }
        }
    }

    pub fn format_summary(
        &self,
        totals: &BatchTotals,
        namespace: Option<&str>,
        duration: Duration,
    ) -> String {
        let mut output = String::new();
        output.push_str("Validation Summary:\n");
        output.push_str(&format!(
            "  Namespace: {}\n",
            convert::or_default(namespace, "(any)")
        ));
        output.push_str(&format!("  Total documents: {}\n", totals.total));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Valid:", "32"),
            totals.valid
        ));

        if totals.invalid > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Invalid:", "31"),
                totals.invalid
            ));
        }
        if totals.errors > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Errors:", "33"),
                totals.errors
            ));
        }

        output.push_str(&format!("  Success rate: {:.1}%\n", totals.success_rate()));
        output.push_str(&format!("  Duration: {}\n", format_duration(duration)));
        output
    }

    fn format_validation_json(&self, results: &[DocumentValidation]) -> Result<String> {
        let reports: Vec<(String, ValidationReport)> = results
            .iter()
            .map(|result| (result.path.display().to_string(), document_report(result)))
            .collect();

        let documents: Vec<DocumentOutput<'_>> = reports
            .iter()
            .map(|(document, report)| DocumentOutput {
                document: document.clone(),
                summary: report.summary(),
            })
            .collect();

        json::serialize(&documents, &self.json)
    }

    /// Render a parsed argument table
    pub fn format_arguments(&self, table: &ArgumentTable) -> Result<String> {
        match self.format {
            OutputFormatConfig::Json => json::serialize(table.arguments(), &self.json),
            OutputFormatConfig::Summary => Ok(format!("{} argument(s)", table.len())),
            OutputFormatConfig::Human => Ok(table
                .arguments()
                .iter()
                .map(|(key, value)| format!("{key} = {value}"))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Render the tokens that failed to parse
    pub fn format_argument_errors(&self, errors: &[ArgumentError]) -> Result<String> {
        let mut report = ValidationReport::new();
        report.add_argument_errors(errors);

        match self.format {
            OutputFormatConfig::Json => report.to_json(&self.json),
            OutputFormatConfig::Summary => {
                Ok(format!("{} malformed argument(s)", report.failures().count()))
            }
            OutputFormatConfig::Human => Ok(report
                .failures()
                .map(|f| format!("{}  {}", self.colorize("✗", "31"), f.message))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }
}

/// Findings for one document: its schema issues, or the hard error that stopped it
pub fn document_report(result: &DocumentValidation) -> ValidationReport {
    let mut report = ValidationReport::new();
    match &result.result {
        Ok(issues) => report.add_schema_issues(issues),
        Err(err) => report.add_failure("document", err.to_string()),
    }
    report
}

/// Display name used in output for a path
pub fn display_name(path: &Path) -> String {
    convert::truncate(&path.display().to_string(), 120, "...")
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
