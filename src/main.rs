//! Calltrace CLI
//!
//! Records synthetic workloads through the call recorder and inspects
//! the trace artifacts it produces.

use anyhow::Result;
use calltrace_recorder::commands::{
    display_format, display_version, execute_demo, validate_args, validate_trace_file, DemoArgs,
};
use calltrace_recorder::utils::config::{
    default_output_path, TraceFormat, FORMAT_ENV_VAR, OUTPUT_ENV_VAR,
};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

/// Calltrace - per-method call timing traces
#[derive(Parser, Debug)]
#[command(name = "calltrace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a synthetic multi-threaded workload
    Demo {
        /// Artifact path (defaults to perfdata.<ext>)
        #[arg(short, long, env = OUTPUT_ENV_VAR)]
        output: Option<PathBuf>,

        /// Artifact format: text or container
        #[arg(short, long, env = FORMAT_ENV_VAR, default_value = "text")]
        format: String,

        /// Worker threads
        #[arg(long, default_value = "4")]
        threads: usize,

        /// Root calls per thread
        #[arg(long, default_value = "1000")]
        iterations: usize,

        /// Nesting depth of each root call
        #[arg(long, default_value = "4")]
        depth: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a trace artifact
    Validate {
        /// Path to the artifact
        #[arg(short, long)]
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display artifact format information
    Format {
        /// Show full layout details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Demo {
            output,
            format,
            threads,
            iterations,
            depth,
            summary,
        } => {
            let format: TraceFormat = format.parse()?;
            let args = DemoArgs {
                output: output.unwrap_or_else(|| default_output_path(format)),
                format,
                threads,
                iterations,
                depth,
                print_summary: summary,
            };

            validate_args(&args)?;

            let report = execute_demo(&args)?;
            if !report.is_valid() {
                anyhow::bail!("Recorded trace failed validation: {:?}", report.problems);
            }
        }

        Commands::Validate { file, json } => {
            let report = validate_trace_file(&file, json)?;
            if !report.is_valid() {
                std::process::exit(2);
            }
        }

        Commands::Format { show } => {
            display_format(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
