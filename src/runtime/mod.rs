pub mod config;
pub mod control_flow;
pub mod engine;
pub mod outcome;
pub mod snapshot;

pub use config::{ConfigError, Limits};
pub use control_flow::BlockSignal;
pub use engine::{execute_program, ExecError, Executor, TerminalState, Termination};
pub use outcome::{finalize, Checkpoint, RunResult, Status};
pub use snapshot::Snapshot;
