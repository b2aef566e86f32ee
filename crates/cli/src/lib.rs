use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use dumpscope_core::config::DumpscopeConfig;
use dumpscope_core::model::Schema;
use tracing_subscriber::EnvFilter;

pub mod commands;

/// Successful run, or a diff with no critical changes.
pub const EXIT_OK: u8 = 0;
/// Missing input, or validation with warnings only.
pub const EXIT_SOFT_FAILURE: u8 = 1;
/// Critical diff, failed validation, or no extracted data.
pub const EXIT_HARD_FAILURE: u8 = 2;

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects `debug` and the
/// default is `info`.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    // Already installed when commands run in-process more than once.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Fail with a readable message when an input path does not exist.
pub fn require_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!("{what} not found: {}", path.display()));
    }
    Ok(())
}

/// Read a schema file, failing early when it is missing.
pub fn load_schema(path: &Path) -> Result<Schema> {
    require_exists(path, "Schema file")?;
    Schema::load(path).with_context(|| format!("Failed to load schema: {}", path.display()))
}

/// Read the config file if one was given, else the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<DumpscopeConfig> {
    if let Some(p) = path {
        require_exists(p, "Config file")?;
    }
    DumpscopeConfig::load_or_default(path).context("Failed to load config")
}

/// Raw bytes of the dump file.
pub fn read_dump(path: &Path) -> Result<Vec<u8>> {
    require_exists(path, "Dump file")?;
    fs::read(path).with_context(|| format!("Failed to read dump file: {}", path.display()))
}

/// First 16 hex characters of a content hash, for display.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}
