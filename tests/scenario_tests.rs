// End-to-end scenarios exercising the full pipeline through `run`.

use phase_vm::{run, Limits, Status};

fn run_with_defaults(source: &str) -> phase_vm::RunResult {
    run(source.as_bytes(), &Limits::default())
}

#[test]
fn inversion_and_bind_across_three_phases() {
    let source = r#"
        BEGIN { PUSH "above" PUSH "below" WITNESS }
        TRANSFORM { INVERT WITNESS }
        RESOLVE { BIND "above" "below" HALT }
    "#;
    let result = run_with_defaults(source);
    assert_eq!(result.status, Status::Halted);
    assert_eq!(result.final_stack, vec!["below", "above"]);
    assert_eq!(result.final_bindings.len(), 1);
    assert_eq!(result.final_bindings["above"], "below");
    assert_eq!(result.phases_entered, 3);
    assert_eq!(result.op_count, 6);
    assert_eq!(result.phase_name.as_deref(), Some("RESOLVE"));
}

#[test]
fn saturate_exits_through_its_gate_after_three_passes() {
    let source = r#"LOOP { SATURATE { PUSH "x" GATE depth < 3 } }"#;
    let result = run_with_defaults(source);
    assert_eq!(result.status, Status::Complete);
    assert_eq!(result.final_stack, vec!["x", "x", "x"]);
    // Three body passes of two operations each, plus the SATURATE itself.
    assert_eq!(result.op_count, 7);
}

#[test]
fn saturate_converges_once_the_binding_exists() {
    let source = r#"CONVERGE { SATURATE { GATE unbound "done" BIND "done" "yes" } }"#;
    let result = run_with_defaults(source);
    assert_eq!(result.status, Status::Complete);
    assert!(result.final_stack.is_empty());
    assert_eq!(result.final_bindings.len(), 1);
    assert_eq!(result.final_bindings["done"], "yes");
}

#[test]
fn unbounded_growth_hits_the_cycle_limit() {
    let limits = Limits {
        max_stack: 4096,
        ..Default::default()
    };
    let result = run(br#"EXPAND { SATURATE { PUSH "layer" } }"#, &limits);
    assert_eq!(result.status, Status::TermCycleLimit);
    assert_eq!(result.final_stack.len(), 1000);
    assert_eq!(result.phase_name.as_deref(), Some("EXPAND"));
}

#[test]
fn stack_overflow_fires_before_the_cycle_limit() {
    // Same program under the default max_stack of 256: the 257th PUSH
    // overflows long before 1000 SATURATE passes complete.
    let result = run_with_defaults(r#"EXPAND { SATURATE { PUSH "layer" } }"#);
    assert_eq!(result.status, Status::ErrStackOverflow);
    assert_eq!(result.final_stack.len(), 256);
    assert_eq!(result.op_count, 256);
}

#[test]
fn missing_push_argument_fails_before_execution() {
    let result = run_with_defaults("BROKEN { PUSH }");
    assert_eq!(result.status, Status::ErrArity);
    assert_eq!(result.op_count, 0);
    assert_eq!(result.phases_entered, 0);
    assert!(result.final_stack.is_empty());
    assert_eq!(result.phase_name.as_deref(), Some("BROKEN"));
}
