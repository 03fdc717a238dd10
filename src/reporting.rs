//! Central error and result formatting for the CLI.
//!
//! Lexer and parser errors are shown with the file path, the offending
//! source line, and a caret under the column, in a consistent way across
//! entry points. Result records get a compact human-readable rendering;
//! `--json` bypasses this module entirely.

use crate::runtime::RunResult;
use crate::FrontendError;

/// Format a front-half (lex/parse) error for display: message, optional
/// file path, and source line with caret.
pub fn format_frontend_error(
    err: &FrontendError,
    file_path: Option<&str>,
    source: Option<&str>,
) -> String {
    let mut out = String::new();
    if let Some(path) = file_path {
        if !path.is_empty() {
            out.push_str(&format!("  --> {}\n", path));
        }
    }
    out.push_str(&format!("{}\n", err));
    if let (Some(src), Some((line, col))) = (source, err.line_column()) {
        let lines: Vec<&str> = src.lines().collect();
        if line > 0 && line <= lines.len() {
            let line_content = lines[line - 1];
            out.push_str(&format!("  --> Line {}: {}\n", line, line_content));
            let pad = " ".repeat(col.saturating_sub(1));
            out.push_str(&format!("      {}^\n", pad));
        }
    }
    out
}

/// Format parse warnings for display (e.g. duplicate phase name).
pub fn format_warnings(warnings: &[String], file_path: Option<&str>) -> String {
    if warnings.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    if let Some(path) = file_path {
        if !path.is_empty() {
            out.push_str(&format!("  --> {}\n", path));
        }
    }
    out.push_str(&format!("warnings ({}):\n", warnings.len()));
    for warning in warnings {
        out.push_str(&format!("  - {}\n", warning));
    }
    out
}

/// Compact human-readable rendering of a result record.
pub fn render_result(result: &RunResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("status: {}\n", result.status));
    if let Some(message) = &result.message {
        out.push_str(&format!("message: {}\n", message));
    }
    if let Some(phase) = &result.phase_name {
        out.push_str(&format!("phase: {}\n", phase));
    }
    out.push_str(&format!(
        "ops: {}  phases: {}\n",
        result.op_count, result.phases_entered
    ));

    out.push_str(&format!("stack ({}):\n", result.final_stack.len()));
    for symbol in &result.final_stack {
        out.push_str(&format!("  {}\n", symbol));
    }

    out.push_str(&format!("bindings ({}):\n", result.final_bindings.len()));
    for (key, value) in &result.final_bindings {
        out.push_str(&format!("  {} = {}\n", key, value));
    }

    if !result.warnings.is_empty() {
        out.push_str(&format_warnings(&result.warnings, None));
    }

    if let Some(trace) = &result.trace {
        out.push_str(&format!("trace ({} checkpoints):\n", trace.len()));
        for checkpoint in trace {
            out.push_str(&format!(
                "  [{} @ op {}] stack depth {}, {} bindings\n",
                checkpoint.phase_name,
                checkpoint.op_count,
                checkpoint.stack.len(),
                checkpoint.bindings.len()
            ));
        }
    }

    out
}
