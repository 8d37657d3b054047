//! Demo command implementation.
//!
//! The demo command:
//! 1. Opens a recording session
//! 2. Runs a synthetic nested workload on several threads
//! 3. Finalizes the artifact
//! 4. Reads it back and validates it

use crate::reader::{read_trace, validate_artifact, ValidationReport};
use crate::recorder::RecordingSession;
use crate::utils::config::{default_output_path, RecorderConfig, TraceFormat};
use anyhow::{Context, Result};
use log::{debug, info};
use std::hint::black_box;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

/// Names used by the synthetic workload, outermost first
const LEVEL_NAMES: &[&str] = &[
    "demo::worker::run",
    "demo::pipeline::stage",
    "demo::codec::encode",
    "demo::codec::checksum",
    "demo::buffer::fill",
    "demo::buffer::grow",
    "demo::alloc::chunk",
    "demo::alloc::zero",
];

/// Arguments for the demo command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct DemoArgs {
    /// Artifact path
    pub output: PathBuf,

    /// Serialization variant
    pub format: TraceFormat,

    /// Worker threads
    pub threads: usize,

    /// Root calls per thread
    pub iterations: usize,

    /// Nesting depth of each root call
    pub depth: usize,

    /// Print a summary to stdout
    pub print_summary: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            output: default_output_path(TraceFormat::Text),
            format: TraceFormat::Text,
            threads: 4,
            iterations: 1_000,
            depth: 4,
            print_summary: false,
        }
    }
}

/// Validate demo arguments
///
/// **Public** - can be called before execute_demo for early validation
pub fn validate_args(args: &DemoArgs) -> Result<()> {
    if args.output.as_os_str().is_empty() {
        anyhow::bail!("Output path cannot be empty");
    }

    if args.threads == 0 {
        anyhow::bail!("threads must be greater than 0");
    }

    if args.threads > 1024 {
        anyhow::bail!("threads is too large (max 1024)");
    }

    if args.depth == 0 || args.depth > LEVEL_NAMES.len() {
        anyhow::bail!("depth must be between 1 and {}", LEVEL_NAMES.len());
    }

    Ok(())
}

/// Execute the demo command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// Validation report of the artifact that was written
pub fn execute_demo(args: &DemoArgs) -> Result<ValidationReport> {
    let start_time = Instant::now();

    info!("Step 1/3: Opening recording session...");
    let config = RecorderConfig::new(args.format).with_output_path(&args.output);
    let session = RecordingSession::new(&config)
        .with_context(|| format!("Failed to open trace at {}", args.output.display()))?;

    info!(
        "Step 2/3: Recording {} threads x {} calls (depth {})...",
        args.threads, args.iterations, args.depth
    );
    thread::scope(|scope| {
        for _ in 0..args.threads {
            let session = &session;
            scope.spawn(move || {
                for i in 0..args.iterations {
                    nested_call(session, 0, args.depth, i as u64);
                }
            });
        }
    });

    info!("Step 3/3: Finalizing and validating...");
    let path = session
        .shutdown()
        .context("Failed to finalize trace")?
        .unwrap_or_else(|| args.output.clone());

    let artifact = read_trace(&path).context("Failed to read back trace")?;
    let report = validate_artifact(&artifact);
    debug!("Validation problems: {:?}", report.problems);

    if args.print_summary {
        println!("\n{}", "=".repeat(60));
        println!("RECORDING SUMMARY");
        println!("{}", "=".repeat(60));
        println!("Artifact:  {}", path.display());
        println!("Format:    {}", args.format);
        println!("Events:    {}", report.event_count);
        println!("Methods:   {}", report.method_count);
        println!("Threads:   {}", report.thread_count);
        println!("Duration:  {} ns", report.duration_nanos);
        println!("Max depth: {}", report.max_depth);
        println!("Valid:     {}", report.is_valid());
        println!("{}", "=".repeat(60));
    }

    info!("Demo completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(report)
}

/// One instrumented frame of the workload
fn nested_call(session: &RecordingSession, level: usize, depth: usize, seed: u64) -> u64 {
    let _guard = session.enter(LEVEL_NAMES[level]);

    let mut acc = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    for step in 0..16u64 {
        acc = black_box(acc.rotate_left(5) ^ step);
    }

    if level + 1 < depth {
        acc ^= nested_call(session, level + 1, depth, acc);
    }
    acc
}
