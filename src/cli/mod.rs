//! CLI module for od-sanitize
//!
//! Provides command-line interface for:
//! - check: sanitize JSON lines from stdin against a step chain or object schema
//! - steps: list registered step names

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, compile, run, run_command, steps, LOG_ENV};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_values, write_error, write_response};
