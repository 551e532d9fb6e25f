//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::app::SourceKind;
use crate::output::{HashAlgorithm, PrintFormat, ShowOptionalFields, StringValidation};

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Input media file path
    #[arg(short, long)]
    pub input: String,

    /// Report destination, stdout when absent or `-`
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Replace an existing output file
    #[arg(long)]
    pub overwrite: bool,

    /// Output syntax
    #[arg(long)]
    pub print_format: Option<PrintFormat>,

    /// Keep the fields of each object on one line
    #[arg(long)]
    pub compact: bool,

    /// Policy for invalid UTF-8: fail, replace or ignore
    #[arg(long)]
    pub string_validation: Option<StringValidation>,

    /// Text substituted for invalid sequences under `replace`
    #[arg(long)]
    pub string_validation_replacement: Option<String>,

    /// Fields to show, e.g. `stream=index,codec_name:format`
    #[arg(long)]
    pub show_entries: Option<String>,

    /// Policy for N/A and unknown fields: always, never or auto
    #[arg(long)]
    pub show_optional_fields: Option<ShowOptionalFields>,

    /// Hash algorithm for binary payloads (SHA224, SHA256, SHA384, SHA512)
    #[arg(long)]
    pub show_data_hash: Option<HashAlgorithm>,

    /// Include hex dumps of binary payloads
    #[arg(long)]
    pub show_data: bool,

    /// Media source
    #[arg(long, value_enum, default_value_t = SourceKind::Auto)]
    pub source: SourceKind,

    /// Configuration file (default: probe_report.toml or config/probe_report.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the sections command
#[derive(Args, Debug)]
pub struct SectionsArgs {
    /// Print the catalog as JSON instead of a tree
    #[arg(long)]
    pub json: bool,
}
