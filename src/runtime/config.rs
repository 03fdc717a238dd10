use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Immutable resource bounds for one VM invocation. Every structure the
/// executor owns is bounded by one of these fields; no "unlimited" value is
/// representable.
///
/// Construct with struct-update syntax over [`Limits::default`] and call
/// [`Limits::validated`] before use; out-of-range values are rejected with
/// [`ConfigError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    pub max_ops: u64,
    pub max_stack: usize,
    pub max_saturate: u64,
    pub max_bindings: usize,
    pub max_nesting: usize,
    pub max_tokens: usize,
    pub max_source_bytes: usize,
    pub max_symbol_len: usize,
    pub trace_enabled: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_ops: 100_000,
            max_stack: 256,
            max_saturate: 1000,
            max_bindings: 1024,
            max_nesting: 32,
            max_tokens: 100_000,
            max_source_bytes: 1_048_576,
            max_symbol_len: 4096,
            trace_enabled: false,
        }
    }
}

/// Inclusive (min, max) bound per field.
const BOUNDS: &[(&str, u64, u64)] = &[
    ("max_ops", 1, 1_000_000),
    ("max_stack", 1, 4096),
    ("max_saturate", 1, 10_000),
    ("max_bindings", 1, 8192),
    ("max_nesting", 1, 64),
    ("max_tokens", 1, 1_000_000),
    ("max_source_bytes", 1, 16_777_216),
    ("max_symbol_len", 1, 65_536),
];

impl Limits {
    /// Validate every field against its bound, returning the record itself
    /// so construction reads `Limits { max_ops: 10, ..Default::default() }.validated()?`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let values = [
            self.max_ops,
            self.max_stack as u64,
            self.max_saturate,
            self.max_bindings as u64,
            self.max_nesting as u64,
            self.max_tokens as u64,
            self.max_source_bytes as u64,
            self.max_symbol_len as u64,
        ];
        for (&value, &(field, min, max)) in values.iter().zip(BOUNDS) {
            if value < min || value > max {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("configuration field {field} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}
