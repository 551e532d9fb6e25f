//! Error handling module for probe-report

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for report generation
#[derive(Error, Debug)]
pub enum ReportError {
    /// Section lookup outside the catalog
    #[error("Unknown section: {name}")]
    UnknownSection { name: String },

    /// Section opened under a parent that does not admit it
    #[error("Section '{child}' is not a valid child of '{parent}'")]
    InvalidChild {
        parent: &'static str,
        child: &'static str,
    },

    /// Nesting deeper than the writer allows
    #[error("Cannot open section '{section}': maximum nesting depth of {max} levels reached")]
    DepthExceeded { section: &'static str, max: usize },

    /// Close or field emission with no open section
    #[error("No section is currently open")]
    EmptyStack,

    /// Report ended while sections other than the root were still open
    #[error("Report ended with {open} open section(s), expected only the root")]
    UnbalancedSections { open: usize },

    /// Invalid UTF-8 found in a field under the `fail` validation policy
    #[error("Invalid UTF-8 sequence {bytes} found in string '{text}'")]
    InvalidEncoding { bytes: String, text: String },

    /// Replacement string configured for string validation is itself invalid
    #[error("Invalid UTF-8 sequence {bytes} found in string validation replacement '{replacement}'")]
    InvalidReplacement { bytes: String, replacement: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    ConfigError { message: String },

    /// Media probe error
    #[error("Failed to probe media file: {0}")]
    Probe(#[from] DomainError),

    /// Output destination error
    #[error("Failed to write report output: {message}")]
    OutputError { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ReportError {
    /// Errors that indicate a defect in the calling code rather than bad input
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ReportError::UnknownSection { .. }
                | ReportError::InvalidChild { .. }
                | ReportError::DepthExceeded { .. }
                | ReportError::EmptyStack
                | ReportError::UnbalancedSections { .. }
        )
    }
}

/// Result type alias for report operations
pub type ReportResult<T> = std::result::Result<T, ReportError>;
