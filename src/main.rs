use phase_vm::cli::{Cli, Commands, LimitArgs};
use phase_vm::reporting::{format_frontend_error, format_warnings, render_result};
use phase_vm::runtime::{finalize, Executor, Limits, RunResult, Status};
use phase_vm::{decode_source, parse_program};
use tracing_subscriber::EnvFilter;

fn main() {
    // Diagnostics go to stderr and never touch program-observable behavior.
    // PVM_LOG follows the usual env-filter syntax (e.g. PVM_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("PVM_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();
    let code = match cli.command {
        Commands::Run {
            ref file,
            trace,
            json,
            ref limits,
        } => run_command(file, trace, json, limits, cli.quiet),
        Commands::Check {
            ref file,
            json,
            ref limits,
        } => check_command(file, json, limits, cli.quiet),
    };
    std::process::exit(code);
}

/// Process exit code per status family: 0 clean, 2 structural, 3 runtime
/// termination, 4 configuration.
fn exit_code(status: Status) -> i32 {
    match status {
        Status::Complete | Status::Halted => 0,
        Status::ErrParse
        | Status::ErrArity
        | Status::ErrCondition
        | Status::ErrInvalidOp
        | Status::ErrNestingTooDeep => 2,
        Status::TermOpLimit
        | Status::TermCycleLimit
        | Status::TermCancel
        | Status::ErrStackOverflow
        | Status::ErrBindingsOverflow => 3,
        Status::ErrConfig => 4,
    }
}

fn resolve_limits(args: &LimitArgs, trace: bool, json: bool, quiet: bool) -> Result<Limits, i32> {
    match args.resolve(trace) {
        Ok(limits) => Ok(limits),
        Err(err) => {
            let result = RunResult::structural(Status::ErrConfig, err.to_string());
            emit(&result, json, quiet);
            Err(exit_code(Status::ErrConfig))
        }
    }
}

fn read_source(path: &str, json: bool, quiet: bool) -> Result<Vec<u8>, i32> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) => {
            if json {
                eprintln!("cannot read {}: {}", path, err);
            } else if !quiet {
                eprintln!("error: cannot read {}: {}", path, err);
            }
            Err(1)
        }
    }
}

fn emit(result: &RunResult, json: bool, quiet: bool) {
    if json {
        // serde_json cannot fail on this shape (string keys, no non-string maps)
        println!("{}", serde_json::to_string_pretty(result).unwrap());
    } else if quiet {
        if !result.status.is_success() {
            eprintln!("{}: {}", result.status, result.message.as_deref().unwrap_or(""));
        }
    } else {
        print!("{}", render_result(result));
    }
}

fn run_command(file: &str, trace: bool, json: bool, args: &LimitArgs, quiet: bool) -> i32 {
    let limits = match resolve_limits(args, trace, json, quiet) {
        Ok(limits) => limits,
        Err(code) => return code,
    };
    let bytes = match read_source(file, json, quiet) {
        Ok(bytes) => bytes,
        Err(code) => return code,
    };

    // Drive the pipeline stepwise rather than through `run()` so parse
    // failures can be shown with a source line and caret.
    let text = match decode_source(&bytes, &limits) {
        Ok(text) => text,
        Err(err) => {
            let result = RunResult::structural(Status::ErrParse, err.to_string());
            emit(&result, json, quiet);
            return exit_code(result.status);
        }
    };
    let (program, warnings) = match parse_program(text, &limits) {
        Ok(parsed) => parsed,
        Err(err) => {
            if !json && !quiet {
                eprint!("{}", format_frontend_error(&err, Some(file), Some(text)));
            }
            let result = err.to_result();
            emit(&result, json, quiet);
            return exit_code(result.status);
        }
    };

    let trace_enabled = limits.trace_enabled;
    let state = Executor::new(&program, limits).execute();
    let result = finalize(state, &warnings, trace_enabled);
    emit(&result, json, quiet);
    exit_code(result.status)
}

fn check_command(file: &str, json: bool, args: &LimitArgs, quiet: bool) -> i32 {
    let limits = match resolve_limits(args, false, json, quiet) {
        Ok(limits) => limits,
        Err(code) => return code,
    };
    let bytes = match read_source(file, json, quiet) {
        Ok(bytes) => bytes,
        Err(code) => return code,
    };

    let text = match decode_source(&bytes, &limits) {
        Ok(text) => text,
        Err(err) => {
            let result = RunResult::structural(Status::ErrParse, err.to_string());
            emit(&result, json, quiet);
            return exit_code(result.status);
        }
    };
    match parse_program(text, &limits) {
        Ok((program, warnings)) => {
            let warnings: Vec<String> = warnings.into_iter().map(|w| w.message).collect();
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "ok": true,
                        "phases": program.phases.len(),
                        "warnings": warnings,
                    })
                );
            } else if !quiet {
                println!("ok: {} phase(s)", program.phases.len());
                print!("{}", format_warnings(&warnings, Some(file)));
            }
            0
        }
        Err(err) => {
            if !json && !quiet {
                eprint!("{}", format_frontend_error(&err, Some(file), Some(text)));
            }
            let result = err.to_result();
            emit(&result, json, quiet);
            exit_code(result.status)
        }
    }
}
