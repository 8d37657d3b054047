use crate::reader::{read_trace, validate_artifact, ValidationReport};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct JsonReport<'a> {
    file: String,
    format: String,
    valid: bool,
    checked_at: String,
    #[serde(flatten)]
    report: &'a ValidationReport,
}

/// Validate a trace artifact and print the result
pub fn validate_trace_file(file_path: &Path, as_json: bool) -> Result<ValidationReport> {
    let artifact = read_trace(file_path)
        .with_context(|| format!("Failed to read trace {}", file_path.display()))?;
    let report = validate_artifact(&artifact);

    if as_json {
        let json = JsonReport {
            file: file_path.display().to_string(),
            format: artifact.format.to_string(),
            valid: report.is_valid(),
            checked_at: chrono::Utc::now().to_rfc3339(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(report);
    }

    println!("Validating trace: {}", file_path.display());
    if report.is_valid() {
        println!("✓ Valid {} trace", artifact.format);
    } else {
        println!("✗ Invalid {} trace", artifact.format);
        for problem in &report.problems {
            println!("  - {}", problem);
        }
    }
    println!("  Events:   {}", report.event_count);
    println!("  Methods:  {}", report.method_count);
    println!("  Threads:  {}", report.thread_count);
    println!("  Duration: {} ns", report.duration_nanos);

    Ok(report)
}

/// Display artifact layout information
pub fn display_format(show_details: bool) {
    println!("Calltrace Artifact Formats");
    println!("  text      - single stream, default file perfdata.trace");
    println!("  container - zip archive, default file perfdata.zip");
    println!();

    if show_details {
        println!("Event line (both formats):");
        println!("  threadId|startOffset|elapsedNanos|methodId|depth");
        println!("    threadId: number     - Recording thread");
        println!("    startOffset: number  - Nanoseconds since session start");
        println!("    elapsedNanos: number - Wall time of the call");
        println!("    methodId: number     - Key into the method table");
        println!("    depth: number        - Pending calls at exit, root = 1");
        println!();
        println!("Text format, after the events:");
        println!("  methods:   then one 'id|name' line per method");
        println!("  threads:   then one '|'-joined line of thread ids");
        println!("  duration:  then the session duration in nanoseconds");
        println!();
        println!("Container format entries:");
        println!("  data      - event lines");
        println!("  methods   - 'id|name' lines");
        println!("  header    - ';'-joined thread ids, newline, duration");
    } else {
        println!("Use --show for detailed layout information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Calltrace Recorder v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Per-method call timing recorder with durable trace artifacts.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecordingSession;
    use crate::utils::config::{RecorderConfig, TraceFormat};

    #[test]
    fn test_validate_trace_file_reports_counts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("perfdata.trace");

        let session =
            RecordingSession::new(&RecorderConfig::new(TraceFormat::Text).with_output_path(&path))
                .unwrap();
        session.on_enter("main");
        session.on_exit("main").unwrap();
        session.shutdown().unwrap();

        let report = validate_trace_file(&path, false).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.event_count, 1);
        assert_eq!(report.method_count, 1);
    }

    #[test]
    fn test_validate_trace_file_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_trace_file(&temp_dir.path().join("absent.trace"), false).is_err());
    }
}
