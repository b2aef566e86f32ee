use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dumpscope::commands::{build_command, diff_command, inspect_command, validate_command};
use dumpscope::{init_tracing, load_config, EXIT_OK, EXIT_SOFT_FAILURE};

/// Schema tooling for IL2CPP reflection dumps.
///
/// Subcommands load their inputs, hand them to `dumpscope_core` and print the
/// resulting report. Reports go to stdout, logs to stderr.
#[derive(Parser, Debug)]
#[command(
    name = "dumpscope",
    version,
    about = "Build, diff and validate schemas from IL2CPP reflection dumps",
    long_about = None
)]
struct Cli {
    /// JSON or YAML file overriding classification rules and validation thresholds.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug detail to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a dump file and write its schema.
    Build {
        /// Reflection dump to read.
        #[arg(default_value = "il2cpp_dump/dump.cs")]
        dump: PathBuf,

        /// Schema JSON to write. Parent directories are created.
        #[arg(default_value = "generated/schema.json")]
        output: PathBuf,
    },

    /// Compare two schemas. Exits 2 when any change is critical.
    Diff {
        /// Schema of the previous build.
        old: PathBuf,

        /// Schema of the new build.
        new: PathBuf,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Check extracted instance files against a schema.
    ///
    /// Exits 0 on pass, 1 on warnings, 2 on failures or when no data exists.
    Validate {
        /// Schema JSON to validate against.
        #[arg(long)]
        schema: PathBuf,

        /// Directory of `<Template>.json` instance files.
        #[arg(long)]
        data: PathBuf,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the counts of an existing schema.
    Inspect {
        /// Schema JSON to summarize.
        schema: PathBuf,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(EXIT_SOFT_FAILURE)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Build { dump, output } => {
            build_command(&dump, &output, &config)?;
            Ok(EXIT_OK)
        }
        Command::Diff { old, new, json } => diff_command(&old, &new, json),
        Command::Validate { schema, data, json } => {
            validate_command(&schema, &data, &config.validation, json)
        }
        Command::Inspect { schema, json } => {
            inspect_command(&schema, json)?;
            Ok(EXIT_OK)
        }
    }
}
