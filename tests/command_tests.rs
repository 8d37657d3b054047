use calltrace_recorder::commands::{execute_demo, validate_args, validate_trace_file, DemoArgs};
use calltrace_recorder::TraceFormat;

#[test]
fn test_demo_text_produces_valid_trace() {
    let temp_dir = tempfile::tempdir().unwrap();
    let args = DemoArgs {
        output: temp_dir.path().join("demo.trace"),
        format: TraceFormat::Text,
        threads: 3,
        iterations: 20,
        depth: 3,
        print_summary: false,
    };

    validate_args(&args).unwrap();
    let report = execute_demo(&args).unwrap();

    assert!(report.is_valid(), "{:?}", report.problems);
    assert_eq!(report.event_count, 3 * 20 * 3);
    assert_eq!(report.method_count, 3);
    assert_eq!(report.thread_count, 3);
    assert_eq!(report.max_depth, 3);
}

#[test]
fn test_demo_container_then_validate() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = temp_dir.path().join("demo.zip");
    let args = DemoArgs {
        output: output.clone(),
        format: TraceFormat::Container,
        threads: 2,
        iterations: 10,
        depth: 2,
        print_summary: true,
    };

    execute_demo(&args).unwrap();

    let report = validate_trace_file(&output, true).unwrap();
    assert!(report.is_valid());
    assert_eq!(report.event_count, 2 * 10 * 2);
}

#[test]
fn test_validate_args_rejects_too_many_threads() {
    let args = DemoArgs {
        threads: 5000,
        ..Default::default()
    };
    assert!(validate_args(&args).is_err());
}
