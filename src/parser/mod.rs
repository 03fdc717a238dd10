pub mod ast;
pub mod error;
pub mod parser;
pub mod warnings;

pub use parser::*;
pub use warnings::{collect_warnings, ParseWarning};
