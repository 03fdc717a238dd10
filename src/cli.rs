//! CLI framework using clap.
//!
//! Limit flags mirror the configuration record one-to-one; `--config` loads
//! a JSON limits file and individual flags override it.

use crate::runtime::{ConfigError, Limits};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// phase_vm (pvm) — deterministic sandboxed VM for phase programs
#[derive(Parser, Debug)]
#[command(
    name = "pvm",
    about = "Deterministic sandboxed VM for phase-structured stack programs",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Minimal output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a program and print the result record
    Run {
        file: String,

        /// Record WITNESS checkpoints in the result
        #[arg(long)]
        trace: bool,

        /// Print the raw JSON result record instead of the pretty rendering
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Parse and validate without executing
    Check {
        file: String,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        limits: LimitArgs,
    },
}

/// Resource-bound overrides; unset flags fall back to the config file (if
/// given) and then to the defaults.
#[derive(Args, Debug, Default)]
pub struct LimitArgs {
    /// JSON limits file (same field names as the configuration record)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "N")]
    pub max_ops: Option<u64>,

    #[arg(long, value_name = "N")]
    pub max_stack: Option<usize>,

    #[arg(long, value_name = "N")]
    pub max_saturate: Option<u64>,

    #[arg(long, value_name = "N")]
    pub max_bindings: Option<usize>,

    #[arg(long, value_name = "N")]
    pub max_nesting: Option<usize>,

    #[arg(long, value_name = "N")]
    pub max_tokens: Option<usize>,

    #[arg(long, value_name = "N")]
    pub max_source_bytes: Option<usize>,

    #[arg(long, value_name = "N")]
    pub max_symbol_len: Option<usize>,
}

/// Failure to assemble a validated `Limits` from file plus flags.
#[derive(Debug, thiserror::Error)]
pub enum LimitsResolveError {
    #[error("cannot read limits file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid limits file {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LimitArgs {
    /// Base limits (file or defaults), flag overrides applied, then bounds
    /// validation. Rejection here is ERR_CONFIG territory.
    pub fn resolve(&self, trace_enabled: bool) -> Result<Limits, LimitsResolveError> {
        let mut limits = match &self.config {
            Some(path) => {
                let text =
                    std::fs::read_to_string(path).map_err(|source| LimitsResolveError::Io {
                        path: path.display().to_string(),
                        source,
                    })?;
                serde_json::from_str::<Limits>(&text).map_err(|source| {
                    LimitsResolveError::Json {
                        path: path.display().to_string(),
                        source,
                    }
                })?
            }
            None => Limits::default(),
        };

        if let Some(v) = self.max_ops {
            limits.max_ops = v;
        }
        if let Some(v) = self.max_stack {
            limits.max_stack = v;
        }
        if let Some(v) = self.max_saturate {
            limits.max_saturate = v;
        }
        if let Some(v) = self.max_bindings {
            limits.max_bindings = v;
        }
        if let Some(v) = self.max_nesting {
            limits.max_nesting = v;
        }
        if let Some(v) = self.max_tokens {
            limits.max_tokens = v;
        }
        if let Some(v) = self.max_source_bytes {
            limits.max_source_bytes = v;
        }
        if let Some(v) = self.max_symbol_len {
            limits.max_symbol_len = v;
        }
        limits.trace_enabled = trace_enabled;

        Ok(limits.validated()?)
    }
}

impl Cli {
    /// Parse args; handles --help and --version via clap.
    pub fn parse_args() -> Self {
        Self::parse_from(std::env::args())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = LimitArgs {
            max_ops: Some(10),
            max_stack: Some(4),
            ..Default::default()
        };
        let limits = args.resolve(true).unwrap();
        assert_eq!(limits.max_ops, 10);
        assert_eq!(limits.max_stack, 4);
        assert!(limits.trace_enabled);
        assert_eq!(limits.max_saturate, Limits::default().max_saturate);
    }

    #[test]
    fn out_of_range_flag_is_a_config_error() {
        let args = LimitArgs {
            max_ops: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            args.resolve(false),
            Err(LimitsResolveError::Config(_))
        ));
    }
}
