//! od-sanitize CLI entry point
//!
//! Parses arguments, dispatches to the CLI module and prints fatal errors to
//! stderr. Validation failures are not fatal: they are written to stdout as
//! JSON error lines by the `check` command.

use od_sanitizer::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
