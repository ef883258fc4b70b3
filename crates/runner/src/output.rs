//! Output formatting for the CLI

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use finprobe_validator::ValidationReport;
use serde::Serialize;

use crate::runner::{CaseResult, SuiteResult};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl TableDisplay for CaseResult {
    fn headers() -> Vec<&'static str> {
        vec!["Case", "Result", "Status", "Time (ms)", "Warnings", "Error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            if self.success { "✓ pass" } else { "✗ fail" }.to_string(),
            self.status.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
            self.duration_ms.to_string(),
            self.warnings.len().to_string(),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

fn table_with<T: TableDisplay>(items: &[T]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(T::headers());
    for item in items {
        table.add_row(item.row());
    }
    table
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Print the results of one or more suites
pub fn print_suites(results: &[SuiteResult], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            for suite in results {
                println!("{} ({})", suite.name, suite.run_id);
                println!("{}", table_with(&suite.results));
                println!(
                    "{} passed, {} failed, {} total ({} ms)",
                    suite.passed, suite.failed, suite.total, suite.duration_ms
                );
                println!();
            }
        }
        OutputFormat::Json => print_json(results),
    }
}

/// Print the report of a single offline check
pub fn print_report(report: &ValidationReport, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if report.has_warnings() {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic);
                table.set_header(vec!["Kind", "Path", "Message"]);
                for warning in &report.warnings {
                    table.add_row(vec![
                        format!("{:?}", warning.kind),
                        warning.path.clone().unwrap_or_else(|| "-".into()),
                        warning.message.clone(),
                    ]);
                }
                println!("{table}");
            }
            print_success(&format!("{} check(s) passed", report.checks_run.len()));
        }
        OutputFormat::Json => print_json(report),
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("⚠️  {}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_row() {
        let result = CaseResult {
            name: "get-balance".into(),
            success: false,
            status: None,
            duration_ms: 12,
            warnings: vec![],
            error: Some("connection refused".into()),
            error_category: None,
            captured: 0,
        };
        let row = result.row();
        assert_eq!(row.len(), CaseResult::headers().len());
        assert_eq!(row[1], "✗ fail");
        assert_eq!(row[2], "-");
        assert_eq!(row[5], "connection refused");
    }
}
