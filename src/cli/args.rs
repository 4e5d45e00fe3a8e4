//! CLI argument definitions using clap
//!
//! Commands:
//! - od-sanitize check --config <path> (--steps a,b | --field name=a,b ...)
//! - od-sanitize steps

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::sanitizer::DEFAULT_CONFIG_PATH;

/// od-sanitize - validate JSON values against declared sanitizers
#[derive(Parser, Debug)]
#[command(name = "od-sanitize")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sanitize one JSON value per stdin line
    Check {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Comma-separated step chain applied to each value
        #[arg(long, value_delimiter = ',', conflicts_with = "field")]
        steps: Vec<String>,

        /// Object field as name=step,step (repeatable)
        #[arg(long = "field", value_name = "NAME=STEPS")]
        field: Vec<String>,

        /// Fail when a declared field is missing from the output
        #[arg(long, requires = "field")]
        require_all_fields: bool,

        /// 1 normalizes field errors, 2 propagates them unchanged
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
        schema_version: u8,
    },

    /// List step names usable in --steps and --field
    Steps,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
