use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use dumpscope_core::diff::SchemaDiff;

use crate::{load_schema, short_hash, EXIT_HARD_FAILURE, EXIT_OK};

/// Compare two schema files. Returns the exit code: 2 when anything critical
/// changed, 0 otherwise.
pub fn diff_command(old_path: &Path, new_path: &Path, json: bool) -> Result<u8> {
    let old = load_schema(old_path)?;
    let new = load_schema(new_path)?;
    let diff = SchemaDiff::between(&old, &new);
    tracing::debug!(
        changes = diff.change_count(),
        critical = diff.critical_count(),
        "compared schemas"
    );

    if json {
        let body = serde_json::to_string_pretty(&diff).context("Failed to serialize diff")?;
        println!("{body}");
    } else {
        print!("{}", render_diff(&diff, old_path, new_path));
    }

    Ok(if diff.has_critical() { EXIT_HARD_FAILURE } else { EXIT_OK })
}

/// Text report: header, one section per grain, summary line.
pub fn render_diff(diff: &SchemaDiff, old_path: &Path, new_path: &Path) -> String {
    DiffText { diff, old_path, new_path }.to_string()
}

struct DiffText<'a> {
    diff: &'a SchemaDiff,
    old_path: &'a Path,
    new_path: &'a Path,
}

impl fmt::Display for DiffText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let diff = self.diff;
        writeln!(f, "=== Schema Diff Report ===")?;
        writeln!(f, "Old: {} (hash: {}...)", self.old_path.display(), short_hash(&diff.old_hash))?;
        writeln!(f, "New: {} (hash: {}...)", self.new_path.display(), short_hash(&diff.new_hash))?;

        for (title, records) in diff.sections() {
            writeln!(f, "\n--- {title} ---")?;
            if records.is_empty() {
                writeln!(f, "     No changes")?;
            }
            for record in records {
                writeln!(f, "{} {}", record.severity.tag(), record.message)?;
            }
        }

        writeln!(
            f,
            "\n=== SUMMARY: {} changes, {} critical ===",
            diff.change_count(),
            diff.critical_count()
        )?;
        if diff.has_critical() {
            writeln!(f, "\n*** CRITICAL CHANGES DETECTED ***")?;
            writeln!(f, "Extraction code MUST be regenerated before running against new build.")?;
        }
        Ok(())
    }
}
