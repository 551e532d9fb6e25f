//! CLI module for probe-report
//!
//! This module handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};

use crate::utils::logging::{LogFormat, LogLevel};

pub mod args;
pub mod commands;

pub use args::{ProbeArgs, SectionsArgs};

/// probe-report
///
/// Inspect a media container and write a structured, machine-readable report
/// of its format and streams.
#[derive(Parser, Debug)]
#[command(name = "probe-report")]
#[command(about = "Structured media stream reports")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Logging output format: pretty, compact or json
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe a media file and write its report
    Probe(ProbeArgs),
    /// Print the section catalog
    Sections(SectionsArgs),
}
