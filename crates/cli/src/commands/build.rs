use std::path::Path;

use anyhow::{Context, Result};
use dumpscope_core::config::DumpscopeConfig;
use dumpscope_core::schema::SchemaBuilder;

use crate::commands::render_summary;
use crate::read_dump;

/// Build a schema from `dump` and write it to `output`.
pub fn build_command(dump: &Path, output: &Path, config: &DumpscopeConfig) -> Result<()> {
    let bytes = read_dump(dump)?;
    tracing::info!(path = %dump.display(), bytes = bytes.len(), "read dump");

    let schema = SchemaBuilder::new(&config.rules).build_bytes(&bytes);
    schema
        .save(output)
        .with_context(|| format!("Failed to write schema: {}", output.display()))?;

    println!("Schema written to {}", output.display());
    print!("{}", render_summary(&schema));
    Ok(())
}
