// Engine subprocess tests, using `sh` as a stand-in engine

#![cfg(unix)]

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;

use cstep::engine::{record_trace, EngineProcess, SnapshotFeed};
use cstep::trace::TraceStep;
use tempfile::NamedTempFile;

const STEP_ONE: &str = r#"{"line":0,"column":0,"vars":[{"function":"main","name":"x","type":"Int","address":100,"unit_size":4,"value":1},"_dummy"]}"#;
const STEP_TWO: &str = r#"{"line":1,"column":2,"vars":[{"function":"main","name":"x","type":"Int","address":100,"unit_size":4,"value":2},"_dummy"]}"#;

fn script(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn stepping_script() -> NamedTempFile {
    script(&format!(
        "echo '{}' >&2\nread _ignored\necho '{}' >&2\nread _ignored\nexit 0\n",
        STEP_ONE, STEP_TWO
    ))
}

#[test]
fn test_record_trace_collects_all_steps() {
    let program = stepping_script();
    let result = record_trace(Path::new("sh"), program.path(), 1).unwrap();

    assert_eq!(result.trace.len(), 2);
    assert!(!result.is_error());
    match &result.trace[1] {
        TraceStep::Step(view) => {
            let x = view.stack.variable("main()", "x").unwrap();
            assert!(x.changed);
            assert_eq!(x.value, "2");
        }
        other => panic!("Expected a step, got {:?}", other),
    }
}

#[test]
fn test_record_trace_engine_failure() {
    let program = script("printf '4\\n7\\nundeclared identifier' >&2\nexit 1\n");
    let result = record_trace(Path::new("sh"), program.path(), 1).unwrap();

    assert!(result.is_error());
    match &result.trace[0] {
        TraceStep::Error(step) => {
            assert_eq!(step.line, "4");
            assert_eq!(step.offset, "7");
            assert_eq!(step.exception_msg, "undeclared identifier");
        }
        other => panic!("Expected an error step, got {:?}", other),
    }
}

#[test]
fn test_engine_process_paces_steps() {
    let program = stepping_script();
    let mut feed: Box<dyn SnapshotFeed> =
        Box::new(EngineProcess::spawn(Path::new("sh"), program.path(), Stdio::null()).unwrap());

    let first = feed.next_snapshot().unwrap();
    assert_eq!(first.line, 0);
    feed.resume().unwrap();

    let second = feed.next_snapshot().unwrap();
    assert_eq!((second.line, second.column), (1, 2));
    feed.resume().unwrap();

    assert!(feed.next_snapshot().is_none());
    assert_eq!(feed.close().unwrap(), None);
}

#[test]
fn test_engine_process_reports_failure_on_close() {
    let program = script(&format!(
        "echo '{}' >&2\nread _ignored\nprintf '9\\n3\\ndivision by zero' >&2\nexit 2\n",
        STEP_ONE
    ));
    let mut feed = EngineProcess::spawn(Path::new("sh"), program.path(), Stdio::null()).unwrap();

    assert!(feed.next_snapshot().is_some());
    feed.resume().unwrap();
    assert!(feed.next_snapshot().is_none());

    let outcome = feed.finish().unwrap();
    assert!(!outcome.status.success());
    let error = outcome.error.unwrap();
    assert_eq!(error.line, "9");
    assert_eq!(error.offset, "3");
    assert_eq!(error.exception_msg, "division by zero");
}

#[test]
fn test_spawn_missing_engine() {
    let program = stepping_script();
    let err = EngineProcess::spawn(Path::new("/nonexistent/engine"), program.path(), Stdio::null())
        .err()
        .unwrap();
    assert!(err.to_string().contains("failed to start engine"));
}

#[test]
fn test_program_output_goes_to_given_stdout() {
    let program = script(&format!(
        "echo hello from program\necho '{}' >&2\nread _ignored\nexit 0\n",
        STEP_ONE
    ));
    let output = NamedTempFile::new().unwrap();
    let stdout = output.reopen().unwrap();

    let mut feed = EngineProcess::spawn(Path::new("sh"), program.path(), stdout).unwrap();
    assert!(feed.next_snapshot().is_some());
    feed.resume().unwrap();
    assert!(feed.next_snapshot().is_none());
    assert!(feed.finish().unwrap().error.is_none());

    let printed = fs::read_to_string(output.path()).unwrap();
    assert_eq!(printed, "hello from program\n");
}

#[test]
fn test_close_mid_trace_stops_engine() {
    // The engine would never exit on its own after the first step
    let program = script(&format!(
        "echo '{}' >&2\nwhile :; do :; done\n",
        STEP_ONE
    ));
    let mut feed = EngineProcess::spawn(Path::new("sh"), program.path(), Stdio::null()).unwrap();
    assert!(feed.next_snapshot().is_some());

    let outcome = feed.finish().unwrap();
    assert!(!outcome.status.success());
    assert!(outcome.error.is_none());
}
