use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use dumpscope_core::config::ValidationThresholds;
use dumpscope_core::validate::{validate, DataDir, Level, ValidationReport, Verdict};
use serde::Serialize;

use crate::{load_schema, require_exists};

#[derive(Serialize)]
struct ValidationOutput<'a> {
    verdict: Verdict,
    fail: usize,
    warn: usize,
    #[serde(flatten)]
    report: &'a ValidationReport,
}

/// Validate extracted instance files in `data_dir` against a schema.
///
/// Returns the exit code of the verdict: 0 pass, 1 warnings, 2 failures or
/// no extracted data at all.
pub fn validate_command(
    schema_path: &Path,
    data_dir: &Path,
    thresholds: &ValidationThresholds,
    json: bool,
) -> Result<u8> {
    let schema = load_schema(schema_path)?;
    require_exists(data_dir, "Data directory")?;
    let source = DataDir::open(data_dir)
        .with_context(|| format!("Failed to open data directory: {}", data_dir.display()))?;

    let report = validate(&schema, &source, thresholds);
    let verdict = report.verdict();

    if json {
        let output = ValidationOutput {
            verdict,
            fail: report.count(Level::Fail),
            warn: report.count(Level::Warn),
            report: &report,
        };
        let body = serde_json::to_string_pretty(&output)
            .context("Failed to serialize validation report")?;
        println!("{body}");
    } else {
        print!("{}", render_validation(&report, schema_path, data_dir));
    }

    Ok(verdict.exit_code())
}

/// Text report: header, one section per check, overall line.
pub fn render_validation(
    report: &ValidationReport,
    schema_path: &Path,
    data_dir: &Path,
) -> String {
    ValidationText { report, schema_path, data_dir }.to_string()
}

struct ValidationText<'a> {
    report: &'a ValidationReport,
    schema_path: &'a Path,
    data_dir: &'a Path,
}

impl fmt::Display for ValidationText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "=== Extraction Validation Report ===")?;
        writeln!(f, "Schema: {}", self.schema_path.display())?;
        writeln!(f, "Data:   {}", self.data_dir.display())?;

        for (title, records) in report.sections() {
            if report.no_data && records.is_empty() {
                continue;
            }
            writeln!(f, "\n--- {title} ---")?;
            for record in records {
                writeln!(f, "{} {}", record.level.tag(), record.message)?;
            }
        }

        if report.no_data {
            return writeln!(f, "\nNo extracted data found. Cannot run further checks.");
        }

        writeln!(
            f,
            "\n=== OVERALL: {} FAIL, {} WARN ===",
            report.count(Level::Fail),
            report.count(Level::Warn)
        )
    }
}
