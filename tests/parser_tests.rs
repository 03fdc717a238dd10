// Grammar, arity, and condition validation through the public pipeline.

use phase_vm::{check, run, Limits, Status};

fn status_of(source: &str) -> Status {
    run(source.as_bytes(), &Limits::default()).status
}

#[test]
fn empty_source_is_a_parse_error() {
    assert_eq!(status_of(""), Status::ErrParse);
    assert_eq!(status_of("# only a comment\n"), Status::ErrParse);
}

#[test]
fn empty_phase_body_is_a_parse_error() {
    assert_eq!(status_of("P { }"), Status::ErrParse);
}

#[test]
fn missing_closing_brace_is_a_parse_error() {
    assert_eq!(status_of("P { HALT"), Status::ErrParse);
}

#[test]
fn operator_word_cannot_name_a_phase() {
    assert_eq!(status_of("PUSH { HALT }"), Status::ErrParse);
}

#[test]
fn unknown_operator_is_invalid_op() {
    let result = run(b"P { FROB }", &Limits::default());
    assert_eq!(result.status, Status::ErrInvalidOp);
    assert!(result.message.as_deref().unwrap().contains("FROB"));
    assert_eq!(result.phase_name.as_deref(), Some("P"));
}

#[test]
fn arity_violations_per_operator() {
    // Missing arguments.
    assert_eq!(status_of("P { PUSH }"), Status::ErrArity);
    assert_eq!(status_of(r#"P { BIND "k" }"#), Status::ErrArity);
    assert_eq!(status_of("P { RELEASE }"), Status::ErrArity);
    assert_eq!(status_of("P { GATE }"), Status::ErrArity);
    // Trailing extras land in operation position and are arity errors too.
    assert_eq!(status_of(r#"P { INVERT "extra" }"#), Status::ErrArity);
    assert_eq!(status_of(r#"P { PUSH "a" "b" }"#), Status::ErrArity);
}

#[test]
fn gate_condition_shapes_are_validated() {
    assert_eq!(status_of("P { GATE depth 3 }"), Status::ErrCondition);
    assert_eq!(status_of("P { GATE depth < }"), Status::ErrCondition);
    assert_eq!(status_of(r#"P { GATE depth == "x" }"#), Status::ErrCondition);
    assert_eq!(status_of("P { GATE sideways 3 }"), Status::ErrCondition);
    assert_eq!(status_of("P { GATE 3 }"), Status::ErrCondition);
    assert_eq!(
        status_of("P { GATE depth < 99999999999999999999 }"),
        Status::ErrCondition
    );
}

#[test]
fn gate_keys_accept_string_int_and_ref_forms() {
    let result = run(
        br#"P { BIND "done" "v" GATE bound "done" BIND 7 "v" GATE bound 007 BIND "low" "v" GATE bound low PUSH "ok" }"#,
        &Limits::default(),
    );
    assert_eq!(result.status, Status::Complete);
    assert_eq!(result.final_stack, vec!["ok"]);
}

#[test]
fn saturate_requires_a_block() {
    assert_eq!(status_of(r#"P { SATURATE "x" }"#), Status::ErrArity);
    assert_eq!(status_of("P { SATURATE { } }"), Status::ErrParse);
}

#[test]
fn nesting_beyond_the_limit_is_rejected() {
    let limits = Limits {
        max_nesting: 2,
        ..Default::default()
    };
    let shallow = "P { SATURATE { SATURATE { HALT } } }";
    assert_eq!(run(shallow.as_bytes(), &limits).status, Status::Halted);

    let deep = "P { SATURATE { SATURATE { SATURATE { HALT } } } }";
    assert_eq!(
        run(deep.as_bytes(), &limits).status,
        Status::ErrNestingTooDeep
    );
}

#[test]
fn check_reports_phases_and_warnings_without_executing() {
    let report = check(
        b"A { PUSH \"x\" } A { HALT }",
        &Limits::default(),
    )
    .unwrap();
    assert_eq!(report.phases, 2);
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn check_surfaces_the_same_error_record_as_run() {
    let source = b"BROKEN { PUSH }";
    let limits = Limits::default();
    let check_err = check(source, &limits).unwrap_err();
    let run_result = run(source, &limits);
    assert_eq!(check_err, run_result);
}

#[test]
fn first_error_wins_across_phases() {
    // Both phases are broken; the error must come from the first.
    let result = run(b"A { FROB } B { PUSH }", &Limits::default());
    assert_eq!(result.status, Status::ErrInvalidOp);
    assert_eq!(result.phase_name.as_deref(), Some("A"));
}
