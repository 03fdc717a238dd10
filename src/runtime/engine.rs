use crate::parser::ast::{GateCond, Operation, Program};
use crate::runtime::config::Limits;
use crate::runtime::control_flow::BlockSignal;
use crate::runtime::outcome::Checkpoint;
use crate::runtime::snapshot::Snapshot;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// How one invocation ended: naturally, via HALT, or at a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Completed,
    Halted,
    Faulted(ExecError),
}

/// The executor's state at the moment the finalizer takes over. Partial
/// state up to the last successful operation survives a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalState {
    pub stack: Vec<String>,
    pub bindings: BTreeMap<String, String>,
    pub op_count: u64,
    pub phases_entered: u64,
    pub trace: Vec<Checkpoint>,
    pub phase_name: Option<String>,
    pub termination: Termination,
}

/// Runtime resource faults, detected at the guard site immediately before
/// or during the mutating step. GATE breaks and fixed points are control
/// flow, never faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("stack overflow: PUSH would exceed max_stack {max} in phase {phase}")]
    StackOverflow { max: usize, phase: String },

    #[error("bindings overflow: BIND would exceed max_bindings {max} in phase {phase}")]
    BindingsOverflow { max: usize, phase: String },

    #[error("operation limit reached: max_ops {max} in phase {phase}")]
    OpLimit { max: u64, phase: String },

    #[error("cycle limit reached: SATURATE hit max_saturate {max} in phase {phase}")]
    CycleLimit { max: u64, phase: String },

    #[error("execution cancelled in phase {phase}")]
    Cancelled { phase: String },
}

/// The executor: owns stack, bindings, counters, and trace for one
/// invocation, and drives phases and SATURATE loops over an immutable AST.
///
/// Between every two operations it runs the guard chain (halted, external
/// cancel, op limit) in that priority order; `op_count` increments after a
/// successful dispatch. HALT short-circuits before its own increment and
/// drains straight to the finalizer.
pub struct Executor<'p> {
    program: &'p Program,
    limits: Limits,
    cancel: Option<Arc<AtomicBool>>,
    stack: Vec<String>,
    bindings: BTreeMap<String, String>,
    op_count: u64,
    phases_entered: u64,
    trace: Vec<Checkpoint>,
    halted: bool,
    current_phase: Option<String>,
}

impl<'p> Executor<'p> {
    pub fn new(program: &'p Program, limits: Limits) -> Self {
        Self {
            program,
            limits,
            cancel: None,
            stack: Vec::new(),
            bindings: BTreeMap::new(),
            op_count: 0,
            phases_entered: 0,
            trace: Vec::new(),
            halted: false,
            current_phase: None,
        }
    }

    /// Attach an external cancel flag. The flag is only ever set by the
    /// embedder; program code has no way to reach it. A set flag surfaces
    /// as TERM_CANCEL at the same checkpoint where `max_ops` is examined.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Run every phase in source order and return the terminal state.
    pub fn execute(mut self) -> TerminalState {
        let program = self.program;
        for phase in &program.phases {
            if self.halted {
                break;
            }
            self.phases_entered += 1;
            self.current_phase = Some(phase.name.clone());
            debug!(phase = %phase.name, op_count = self.op_count, "entering phase");

            match self.run_block(&phase.body) {
                Ok(BlockSignal::Continue) => {}
                // A false GATE with no enclosing SATURATE ends the phase
                // cleanly; the next phase still runs.
                Ok(BlockSignal::BreakBlock) => {
                    trace!(phase = %phase.name, "gate ended phase");
                }
                Ok(BlockSignal::Halted) => break,
                Err(err) => return self.into_terminal(Termination::Faulted(err)),
            }
        }

        let termination = if self.halted {
            Termination::Halted
        } else {
            Termination::Completed
        };
        self.into_terminal(termination)
    }

    /// Execute a linear operation sequence (a phase body or one SATURATE
    /// body pass), running the guard chain before each operation.
    fn run_block(&mut self, ops: &[Operation]) -> Result<BlockSignal, ExecError> {
        for op in ops {
            if self.halted {
                return Ok(BlockSignal::Halted);
            }
            if let Some(flag) = &self.cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(ExecError::Cancelled {
                        phase: self.phase_name(),
                    });
                }
            }
            if self.op_count >= self.limits.max_ops {
                return Err(ExecError::OpLimit {
                    max: self.limits.max_ops,
                    phase: self.phase_name(),
                });
            }

            let signal = self.dispatch(op)?;
            match signal {
                BlockSignal::Continue => self.op_count += 1,
                BlockSignal::BreakBlock => {
                    // The false GATE itself counts as executed.
                    self.op_count += 1;
                    return Ok(BlockSignal::BreakBlock);
                }
                // HALT drains immediately and is not counted.
                BlockSignal::Halted => return Ok(BlockSignal::Halted),
            }
        }
        Ok(BlockSignal::Continue)
    }

    fn dispatch(&mut self, op: &Operation) -> Result<BlockSignal, ExecError> {
        match op {
            Operation::Push(symbol) => {
                if self.stack.len() + 1 > self.limits.max_stack {
                    return Err(ExecError::StackOverflow {
                        max: self.limits.max_stack,
                        phase: self.phase_name(),
                    });
                }
                self.stack.push(symbol.clone());
                Ok(BlockSignal::Continue)
            }
            Operation::Invert => {
                // No-op on an empty stack.
                self.stack.reverse();
                Ok(BlockSignal::Continue)
            }
            Operation::Bind(key, value) => {
                if !self.bindings.contains_key(key)
                    && self.bindings.len() + 1 > self.limits.max_bindings
                {
                    return Err(ExecError::BindingsOverflow {
                        max: self.limits.max_bindings,
                        phase: self.phase_name(),
                    });
                }
                self.bindings.insert(key.clone(), value.clone());
                Ok(BlockSignal::Continue)
            }
            Operation::Release(key) => {
                // Absent key is a no-op.
                self.bindings.remove(key);
                Ok(BlockSignal::Continue)
            }
            Operation::Gate(cond) => {
                if self.eval_gate(cond) {
                    Ok(BlockSignal::Continue)
                } else {
                    Ok(BlockSignal::BreakBlock)
                }
            }
            Operation::Saturate(body) => self.run_saturate(body),
            Operation::Witness => {
                if self.limits.trace_enabled {
                    self.trace.push(Checkpoint {
                        phase_name: self.phase_name(),
                        op_count: self.op_count,
                        stack: self.stack.clone(),
                        bindings: self.bindings.clone(),
                    });
                }
                Ok(BlockSignal::Continue)
            }
            Operation::Halt => {
                self.halted = true;
                Ok(BlockSignal::Halted)
            }
        }
    }

    /// The SATURATE fixed-point loop. Each invocation gets a fresh local
    /// iteration counter; nested loops are independent. Exits: HALT in the
    /// body, a false GATE in the body (consumed here, successful exit), or
    /// pre/post snapshot equality. `max_saturate` passes without
    /// convergence is a cycle-limit fault.
    fn run_saturate(&mut self, body: &[Operation]) -> Result<BlockSignal, ExecError> {
        let mut iterations: u64 = 0;
        loop {
            let pre = Snapshot::capture(&self.stack, &self.bindings);

            let signal = self.run_block(body)?;
            if signal.is_halted() {
                return Ok(BlockSignal::Halted);
            }
            if signal.is_break() {
                trace!(iterations, "saturate exited via gate");
                return Ok(BlockSignal::Continue);
            }

            let post = Snapshot::capture(&self.stack, &self.bindings);
            if pre == post {
                trace!(iterations, "saturate reached fixed point");
                return Ok(BlockSignal::Continue);
            }

            iterations += 1;
            if iterations >= self.limits.max_saturate {
                return Err(ExecError::CycleLimit {
                    max: self.limits.max_saturate,
                    phase: self.phase_name(),
                });
            }
        }
    }

    /// Side-effect free condition evaluation.
    fn eval_gate(&self, cond: &GateCond) -> bool {
        let depth = self.stack.len() as u64;
        match cond {
            GateCond::DepthLt(n) => depth < *n,
            GateCond::DepthGt(n) => depth > *n,
            GateCond::DepthEq(n) => depth == *n,
            GateCond::Bound(key) => self.bindings.contains_key(key),
            GateCond::Unbound(key) => !self.bindings.contains_key(key),
        }
    }

    fn phase_name(&self) -> String {
        self.current_phase.clone().unwrap_or_default()
    }

    fn into_terminal(self, termination: Termination) -> TerminalState {
        TerminalState {
            stack: self.stack,
            bindings: self.bindings,
            op_count: self.op_count,
            phases_entered: self.phases_entered,
            trace: self.trace,
            phase_name: self.current_phase,
            termination,
        }
    }
}

/// Convenience used by tests and embedders that already hold an AST.
pub fn execute_program(program: &Program, limits: Limits) -> TerminalState {
    Executor::new(program, limits).execute()
}
