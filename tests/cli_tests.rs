// CLI limit resolution: config file loading, flag overrides, validation.

use phase_vm::cli::{LimitArgs, LimitsResolveError};
use phase_vm::Limits;
use std::io::Write;

fn limits_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_apply_when_nothing_is_given() {
    let limits = LimitArgs::default().resolve(false).unwrap();
    assert_eq!(limits, Limits::default());
}

#[test]
fn trace_flag_reaches_the_limits_record() {
    let limits = LimitArgs::default().resolve(true).unwrap();
    assert!(limits.trace_enabled);
}

#[test]
fn config_file_supplies_base_values() {
    let file = limits_file(r#"{"max_ops": 500, "max_stack": 16}"#);
    let args = LimitArgs {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let limits = args.resolve(false).unwrap();
    assert_eq!(limits.max_ops, 500);
    assert_eq!(limits.max_stack, 16);
    assert_eq!(limits.max_saturate, Limits::default().max_saturate);
}

#[test]
fn flags_override_the_config_file() {
    let file = limits_file(r#"{"max_ops": 500}"#);
    let args = LimitArgs {
        config: Some(file.path().to_path_buf()),
        max_ops: Some(7),
        ..Default::default()
    };
    assert_eq!(args.resolve(false).unwrap().max_ops, 7);
}

#[test]
fn unknown_keys_in_the_config_file_are_rejected() {
    let file = limits_file(r#"{"max_opz": 500}"#);
    let args = LimitArgs {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    assert!(matches!(
        args.resolve(false),
        Err(LimitsResolveError::Json { .. })
    ));
}

#[test]
fn missing_config_file_is_an_io_error() {
    let args = LimitArgs {
        config: Some("/nonexistent/limits.json".into()),
        ..Default::default()
    };
    assert!(matches!(
        args.resolve(false),
        Err(LimitsResolveError::Io { .. })
    ));
}

#[test]
fn out_of_range_file_values_fail_validation() {
    let file = limits_file(r#"{"max_stack": 100000}"#);
    let args = LimitArgs {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    assert!(matches!(
        args.resolve(false),
        Err(LimitsResolveError::Config(_))
    ));
}

#[test]
fn run_subcommand_round_trips_a_program_as_json() {
    let mut program = tempfile::NamedTempFile::new().unwrap();
    program
        .write_all(b"MAIN { PUSH \"a\" PUSH \"b\" INVERT HALT }")
        .unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_pvm"))
        .args(["run", program.path().to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["status"], "HALTED");
    assert_eq!(result["final_stack"][0], "b");
    assert_eq!(result["final_stack"][1], "a");
    assert_eq!(result["op_count"], 3);
}

#[test]
fn check_subcommand_fails_with_the_structural_exit_code() {
    let mut program = tempfile::NamedTempFile::new().unwrap();
    program.write_all(b"BROKEN { PUSH }").unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_pvm"))
        .args(["check", program.path().to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["status"], "ERR_ARITY");
}
