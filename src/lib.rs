// phase_vm library
// Deterministic sandboxed VM: lexer -> parser -> executor -> finalizer.

#![allow(clippy::result_large_err)]

pub mod cli;
pub mod lexer;
pub mod parser;
pub mod reporting;
pub mod runtime;

// Re-export main components for easy access
pub use lexer::{tokens::Token, Lexer, LexerError};
pub use parser::{ast, error::ParserError, ParseWarning, Parser};
pub use runtime::{
    finalize, Checkpoint, ConfigError, ExecError, Executor, Limits, RunResult, Status,
};

use parser::warnings::collect_warnings;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use thiserror::Error;

/// A failure anywhere in the front half of the pipeline (lexing or
/// parsing). Carries enough to format a source-anchored diagnostic and to
/// classify the exit status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parser(#[from] ParserError),
}

impl FrontendError {
    pub fn status(&self) -> Status {
        match self {
            FrontendError::Lexer(_) => Status::ErrParse,
            FrontendError::Parser(err) => match err {
                ParserError::Arity { .. } => Status::ErrArity,
                ParserError::Condition { .. } => Status::ErrCondition,
                ParserError::InvalidOp { .. } => Status::ErrInvalidOp,
                ParserError::NestingTooDeep { .. } => Status::ErrNestingTooDeep,
                ParserError::UnexpectedToken { .. }
                | ParserError::UnexpectedEof { .. }
                | ParserError::EmptyBlock { .. } => Status::ErrParse,
            },
        }
    }

    pub fn line_column(&self) -> Option<(usize, usize)> {
        match self {
            FrontendError::Lexer(err) => err.line_column(),
            FrontendError::Parser(err) => err.line_column(),
        }
    }

    /// The error as a result record (no execution happened; counters zero).
    pub fn to_result(&self) -> RunResult {
        let phase = match self {
            FrontendError::Parser(err) => err.phase().map(str::to_string),
            FrontendError::Lexer(_) => None,
        };
        RunResult::structural_in_phase(self.status(), self.to_string(), phase)
    }
}

/// Successful `check`: phase count and any non-fatal warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub phases: usize,
    pub warnings: Vec<String>,
}

/// Decode raw source bytes, enforcing the size limit before anything else
/// and rejecting invalid UTF-8 with the offending byte offset.
pub fn decode_source<'a>(source_bytes: &'a [u8], limits: &Limits) -> Result<&'a str, LexerError> {
    if source_bytes.len() > limits.max_source_bytes {
        return Err(LexerError::SourceTooLarge {
            len: source_bytes.len(),
            max: limits.max_source_bytes,
        });
    }
    std::str::from_utf8(source_bytes).map_err(|e| LexerError::InvalidUtf8 {
        offset: e.valid_up_to(),
    })
}

/// Lex and parse decoded source text. Returns the immutable AST plus parse
/// warnings (duplicate phase names); the first error wins and no partial
/// AST is produced.
pub fn parse_program(
    source_text: &str,
    limits: &Limits,
) -> Result<(ast::Program, Vec<ParseWarning>), FrontendError> {
    let tokens = Lexer::new(source_text, limits.max_tokens, limits.max_symbol_len).tokenize()?;
    let program = Parser::new(tokens, limits.max_nesting).parse()?;
    let warnings = collect_warnings(&program);
    Ok((program, warnings))
}

/// Run the lexer and parser only; no execution.
pub fn check(source_bytes: &[u8], limits: &Limits) -> Result<CheckReport, RunResult> {
    let limits = match limits.clone().validated() {
        Ok(limits) => limits,
        Err(err) => return Err(RunResult::structural(Status::ErrConfig, err.to_string())),
    };
    let text = decode_source(source_bytes, &limits)
        .map_err(|e| RunResult::structural(Status::ErrParse, e.to_string()))?;
    match parse_program(text, &limits) {
        Ok((program, warnings)) => Ok(CheckReport {
            phases: program.phases.len(),
            warnings: warnings.into_iter().map(|w| w.message).collect(),
        }),
        Err(err) => Err(err.to_result()),
    }
}

/// Run the full pipeline. Total: every input produces a result record, and
/// identical (source, config) pairs produce identical records.
pub fn run(source_bytes: &[u8], limits: &Limits) -> RunResult {
    run_inner(source_bytes, limits, None)
}

/// [`run`] with an embedder-owned cancel flag; a set flag surfaces as
/// TERM_CANCEL at the next inter-operation checkpoint. Program code cannot
/// trigger it.
pub fn run_with_cancel(
    source_bytes: &[u8],
    limits: &Limits,
    cancel: Arc<AtomicBool>,
) -> RunResult {
    run_inner(source_bytes, limits, Some(cancel))
}

fn run_inner(
    source_bytes: &[u8],
    limits: &Limits,
    cancel: Option<Arc<AtomicBool>>,
) -> RunResult {
    let limits = match limits.clone().validated() {
        Ok(limits) => limits,
        Err(err) => return RunResult::structural(Status::ErrConfig, err.to_string()),
    };
    let text = match decode_source(source_bytes, &limits) {
        Ok(text) => text,
        Err(err) => return RunResult::structural(Status::ErrParse, err.to_string()),
    };
    let (program, warnings) = match parse_program(text, &limits) {
        Ok(parsed) => parsed,
        Err(err) => return err.to_result(),
    };

    let trace_enabled = limits.trace_enabled;
    let mut executor = Executor::new(&program, limits);
    if let Some(flag) = cancel {
        executor = executor.with_cancel_flag(flag);
    }
    let state = executor.execute();
    finalize(state, &warnings, trace_enabled)
}
