// tests/lifecycle.rs

//! Lifecycle of a single tool: phases, layering and reports.

mod common;

use common::{Probe, ProbeFailure, SharedBuffer, args, system, system_with_home};
use pretty_assertions::assert_eq;
use stagekit::core::options::{OptionError, ParseError, ParseOutcome};
use stagekit::tool::{LifecycleState, RunOutcome, Tool, ToolError};
use std::fs;
use tempfile::tempdir;

fn parsed(probe: &Probe, params: &[&str]) -> stagekit::core::property::PropertyTree {
    match probe.base().parser().parse(&args(params)).unwrap() {
        ParseOutcome::Properties(tree) => tree,
        other => panic!("unexpected parse outcome: {:?}", other),
    }
}

#[test]
fn test_pre_execute_fills_prefix_and_core_count() {
    let mut probe = Probe::new("probe", system(3));
    let input = parsed(&probe, &["-quiet", "-x", "1"]);
    assert!(!input.contains("prefix"));
    assert_eq!(input.get_str("nb-cores").unwrap(), "0");

    probe.run(input).unwrap();

    let seen = probe.seen_input.as_ref().unwrap();
    assert_eq!(seen.get_str("prefix").unwrap(), "tmp.");
    assert_eq!(seen.get_int("nb-cores").unwrap(), 3);
    assert_eq!(seen.get_str("x").unwrap(), "1");
    assert_eq!(probe.base().dispatcher().unwrap().nb_cores(), 3);
    assert_eq!(probe.base().state(), LifecycleState::PostExecuted);
}

#[test]
fn test_explicit_values_are_kept() {
    let mut probe = Probe::new("probe", system(3));
    probe
        .run_args(&args(&["-nb-cores", "2", "-prefix", "run42.", "-quiet"]))
        .unwrap();

    let seen = probe.seen_input.as_ref().unwrap();
    assert_eq!(seen.get_int("nb-cores").unwrap(), 2);
    assert_eq!(seen.get_str("prefix").unwrap(), "run42.");
    assert_eq!(probe.base().dispatcher().unwrap().nb_cores(), 2);
}

#[test]
fn test_outputs_and_info_after_run() {
    let mut probe = Probe::new("probe", system(1)).emitting("answer", "42");
    let input = parsed(&probe, &["-quiet"]);
    let output = probe.run(input).unwrap();
    assert_eq!(output.get_int("answer").unwrap(), 42);

    let info = probe.base().info();
    let sections: Vec<_> = info.entries().iter().filter_map(|p| p.key()).collect();
    assert_eq!(sections, vec!["input", "time", "output"]);
    assert!(info.contains("pre_execute"));
    assert!(info.contains("execute"));
}

#[test]
fn test_execute_failure_propagates_unchanged() {
    let mut probe = Probe::new("probe", system(1)).failing();
    let err = probe.run_args(&args(&["-quiet"])).unwrap_err();

    let failure = err.downcast_ref::<ProbeFailure>().unwrap();
    assert_eq!(failure.0, "probe");
    assert_eq!(probe.base().state(), LifecycleState::PreExecuted);
}

#[test]
fn test_second_run_is_rejected() {
    let mut probe = Probe::new("probe", system(1));
    probe.run_args(&args(&["-quiet"])).unwrap();

    let err = probe.run_args(&args(&["-quiet"])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::InvalidState {
            from: LifecycleState::PostExecuted,
            to: LifecycleState::Parsed,
            ..
        })
    ));
}

#[test]
fn test_help_and_version_do_not_run() {
    let mut probe = Probe::new("probe", system(1));

    match probe.run_args(&args(&["-x", "1", "-help", "-bogus"])).unwrap() {
        RunOutcome::Help(text) => {
            assert!(text.starts_with("[probe options]"));
            assert!(text.contains("-nb-cores"));
        }
        other => panic!("expected help, got {:?}", other),
    }
    match probe.run_args(&args(&["-version"])).unwrap() {
        RunOutcome::Version(library) => {
            assert_eq!(library.get_str("version").unwrap(), env!("CARGO_PKG_VERSION"));
        }
        other => panic!("expected version, got {:?}", other),
    }
    assert_eq!(probe.base().state(), LifecycleState::Created);
    assert!(probe.seen_input.is_none());
}

#[test]
fn test_parse_errors_are_reported_together() {
    let mut probe = Probe::new("probe", system(1));
    let err = probe.run_args(&args(&["-bogus", "-x"])).unwrap_err();

    let parse_error = err.downcast_ref::<ParseError>().unwrap();
    assert_eq!(
        parse_error.violations,
        vec![
            OptionError::UnknownOption("-bogus".to_string()),
            OptionError::MissingValue("-x".to_string()),
        ]
    );
    assert_eq!(probe.base().state(), LifecycleState::Created);
}

#[test]
fn test_config_file_is_shadowed_by_command_line() {
    let home = tempdir().unwrap();
    fs::write(
        home.path().join(".probe"),
        "x = \"from-config\"\ny = \"from-config\"\nprefix = \"cfg.\"\nnb-cores = 7\n",
    )
    .unwrap();

    let mut probe = Probe::new("probe", system_with_home(home.path().to_path_buf(), 2));
    probe.run_args(&args(&["-x", "from-cli", "-quiet"])).unwrap();

    let seen = probe.seen_input.as_ref().unwrap();
    assert_eq!(seen.get_str("x").unwrap(), "from-cli");
    assert_eq!(seen.get_str("y").unwrap(), "from-config");
    assert_eq!(seen.get_str("prefix").unwrap(), "cfg.");
    // The command-line default "0" comes first, so the detected count wins.
    assert_eq!(seen.get_int("nb-cores").unwrap(), 2);
}

#[test]
fn test_broken_config_file_is_ignored() {
    let home = tempdir().unwrap();
    fs::write(home.path().join(".probe"), "x = [unterminated").unwrap();

    let mut probe = Probe::new("probe", system_with_home(home.path().to_path_buf(), 1));
    probe.run_args(&args(&["-quiet"])).unwrap();

    assert!(!probe.seen_input.as_ref().unwrap().contains("x"));
}

#[test]
fn test_boolean_config_entries_follow_flag_convention() {
    let home = tempdir().unwrap();
    fs::write(home.path().join(".probe"), "quiet = false\nno-progress-bar = true\n").unwrap();

    let sink = SharedBuffer::default();
    let mut probe = Probe::new("probe", system_with_home(home.path().to_path_buf(), 1));
    probe.base_mut().set_report_sink(Box::new(sink.clone()));
    probe.run_args(&args(&[])).unwrap();

    let seen = probe.seen_input.as_ref().unwrap();
    assert!(!seen.contains("quiet"));
    assert!(seen.contains("no-progress-bar"));
    assert!(sink.contents().starts_with("[probe]\n"));
}

#[test]
fn test_readable_report_goes_to_sink() {
    let sink = SharedBuffer::default();
    let mut probe = Probe::new("probe", system(1)).emitting("answer", "42");
    probe.base_mut().set_report_sink(Box::new(sink.clone()));
    probe.run_args(&args(&["-x", "cli"])).unwrap();

    let report = sink.contents();
    assert!(report.starts_with("[probe]\n"));
    assert!(report.contains("\n    [input]\n"));
    assert!(report.contains("\n        x : cli\n"));
    assert!(report.contains("\n    [output]\n        answer : 42\n"));
}

#[test]
fn test_quiet_suppresses_readable_report() {
    let sink = SharedBuffer::default();
    let mut probe = Probe::new("probe", system(1));
    probe.base_mut().set_report_sink(Box::new(sink.clone()));
    probe.run_args(&args(&["-quiet"])).unwrap();

    assert_eq!(sink.contents(), "");
}

#[test]
fn test_stats_file_holds_one_record() {
    let dir = tempdir().unwrap();
    let stats = dir.path().join("stats.xml");
    let stats_arg = stats.display().to_string();

    let mut probe = Probe::new("probe", system(1)).emitting("answer", "42");
    probe
        .run_args(&args(&["-quiet", "-stats", &stats_arg]))
        .unwrap();

    let xml = fs::read_to_string(&stats).unwrap();
    assert!(xml.starts_with("<?xml"));
    assert_eq!(xml.matches("<probe>").count(), 1);
    assert!(xml.contains("<answer>42</answer>"));
    assert!(xml.contains("<quiet/>"));
    assert!(xml.trim_end().ends_with("</properties>"));
}

#[test]
fn test_report_failure_keeps_output() {
    let dir = tempdir().unwrap();
    let stats_arg = dir.path().display().to_string();

    let mut probe = Probe::new("probe", system(1)).emitting("answer", "42");
    let err = probe
        .run_args(&args(&["-quiet", "-stats", &stats_arg]))
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::Report(_))
    ));
    assert_eq!(probe.base().output().get_int("answer").unwrap(), 42);
    assert_eq!(probe.base().state(), LifecycleState::Executed);
}

#[test]
fn test_listener_is_silent_under_no_progress_bar() {
    let mut probe = Probe::new("probe", system(1));
    // Before a run there is no input: always silent.
    let listener = probe.create_iterator_listener(10, "before");
    listener.inc(10);
    listener.finish();

    probe
        .run_args(&args(&["-quiet", "-no-progress-bar"]))
        .unwrap();
    let listener = probe.create_iterator_listener(5, "after");
    listener.inc(5);
    listener.finish();
}
