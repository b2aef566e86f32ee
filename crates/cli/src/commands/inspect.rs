use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use dumpscope_core::model::Schema;
use serde::Serialize;

use crate::{load_schema, short_hash};

#[derive(Serialize)]
struct InspectSnapshot<'a> {
    version: &'a str,
    dump_hash: &'a str,
    #[serde(flatten)]
    summary: dumpscope_core::model::SchemaSummary,
}

/// Print the counts of an existing schema file.
pub fn inspect_command(schema_path: &Path, json: bool) -> Result<()> {
    let schema = load_schema(schema_path)?;

    if json {
        let snapshot = InspectSnapshot {
            version: &schema.version,
            dump_hash: &schema.content_hash,
            summary: schema.summary(),
        };
        let body = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize schema summary")?;
        println!("{body}");
        return Ok(());
    }

    println!("Schema: {}", schema_path.display());
    print!("{}", render_summary(&schema));
    Ok(())
}

/// Human-readable counts for a schema.
pub fn render_summary(schema: &Schema) -> String {
    SummaryText(schema).to_string()
}

struct SummaryText<'a>(&'a Schema);

impl fmt::Display for SummaryText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schema = self.0;
        let s = schema.summary();
        writeln!(f, "  Version:          {}", schema.version)?;
        writeln!(f, "  Dump hash:        {}...", short_hash(&schema.content_hash))?;
        writeln!(f, "  Enums:            {}", s.enums)?;
        writeln!(f, "  Structs:          {}", s.structs)?;
        writeln!(f, "  Embedded classes: {}", s.embedded_classes)?;
        writeln!(
            f,
            "  Templates:        {} ({} concrete, {} abstract)",
            s.templates, s.concrete_templates, s.abstract_templates
        )?;
        writeln!(f, "  Template fields:  {}", s.template_fields)?;
        writeln!(f, "  Inheritance:      {} chains", s.inheritance_chains)
    }
}
