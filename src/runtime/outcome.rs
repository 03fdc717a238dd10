use crate::parser::warnings::ParseWarning;
use crate::runtime::engine::{ExecError, TerminalState, Termination};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Exit status of one VM invocation. Serialized exactly as the wire names
/// (`COMPLETE`, `TERM_OP_LIMIT`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Complete,
    Halted,
    TermOpLimit,
    TermCycleLimit,
    TermCancel,
    ErrStackOverflow,
    ErrBindingsOverflow,
    ErrParse,
    ErrArity,
    ErrCondition,
    ErrInvalidOp,
    ErrNestingTooDeep,
    ErrConfig,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Complete => "COMPLETE",
            Status::Halted => "HALTED",
            Status::TermOpLimit => "TERM_OP_LIMIT",
            Status::TermCycleLimit => "TERM_CYCLE_LIMIT",
            Status::TermCancel => "TERM_CANCEL",
            Status::ErrStackOverflow => "ERR_STACK_OVERFLOW",
            Status::ErrBindingsOverflow => "ERR_BINDINGS_OVERFLOW",
            Status::ErrParse => "ERR_PARSE",
            Status::ErrArity => "ERR_ARITY",
            Status::ErrCondition => "ERR_CONDITION",
            Status::ErrInvalidOp => "ERR_INVALID_OP",
            Status::ErrNestingTooDeep => "ERR_NESTING_TOO_DEEP",
            Status::ErrConfig => "ERR_CONFIG",
        }
    }

    /// True for the two clean terminations (HALT or natural completion).
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Complete | Status::Halted)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One WITNESS record: the observable VM state at a point in execution.
/// `op_count` is the number of operations completed before the WITNESS
/// itself executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub phase_name: String,
    pub op_count: u64,
    pub stack: Vec<String>,
    pub bindings: BTreeMap<String, String>,
}

/// The result record: the only output of a VM invocation. Serialization is
/// deterministic (ordered map, fixed field order), so identical
/// (source, config) pairs produce byte-identical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_name: Option<String>,
    pub op_count: u64,
    pub phases_entered: u64,
    pub final_stack: Vec<String>,
    pub final_bindings: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<Checkpoint>>,
}

impl RunResult {
    /// Result record for a failure before any execution began (lex, parse,
    /// or configuration): empty initial state, zero counters.
    pub fn structural(status: Status, message: String) -> Self {
        Self {
            status,
            message: Some(message),
            phase_name: None,
            op_count: 0,
            phases_entered: 0,
            final_stack: Vec::new(),
            final_bindings: BTreeMap::new(),
            warnings: Vec::new(),
            trace: None,
        }
    }

    /// Same, but with the parse phase context attached when available.
    pub fn structural_in_phase(status: Status, message: String, phase: Option<String>) -> Self {
        Self {
            phase_name: phase,
            ..Self::structural(status, message)
        }
    }
}

/// Classify a runtime fault into its exit status.
fn fault_status(err: &ExecError) -> Status {
    match err {
        ExecError::StackOverflow { .. } => Status::ErrStackOverflow,
        ExecError::BindingsOverflow { .. } => Status::ErrBindingsOverflow,
        ExecError::OpLimit { .. } => Status::TermOpLimit,
        ExecError::CycleLimit { .. } => Status::TermCycleLimit,
        ExecError::Cancelled { .. } => Status::TermCancel,
    }
}

/// The finalizer: total function from the executor's terminal state to the
/// result record. Always produces a record, including after a mid-operation
/// abort (partial state up to the last successful operation is preserved).
pub fn finalize(
    state: TerminalState,
    warnings: &[ParseWarning],
    trace_enabled: bool,
) -> RunResult {
    let (status, message) = match &state.termination {
        Termination::Completed => (
            Status::Complete,
            "program ran to completion".to_string(),
        ),
        Termination::Halted => (
            Status::Halted,
            match &state.phase_name {
                Some(name) => format!("HALT executed in phase {}", name),
                None => "HALT executed".to_string(),
            },
        ),
        Termination::Faulted(err) => (fault_status(err), err.to_string()),
    };

    RunResult {
        status,
        message: Some(message),
        phase_name: state.phase_name,
        op_count: state.op_count,
        phases_entered: state.phases_entered,
        final_stack: state.stack,
        final_bindings: state.bindings,
        warnings: warnings.iter().map(|w| w.message.clone()).collect(),
        trace: if trace_enabled {
            Some(state.trace)
        } else {
            None
        },
    }
}
