//! probe-report library
//!
//! Hierarchical structured-report writer for media containers: a static
//! section catalog, a writer engine that enforces nesting and visibility
//! rules, string sanitizing, value formatting and pluggable output backends,
//! plus the report builder and media sources that feed it.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod output;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::report_interactor::render_report;
pub use domain::errors::DomainError;
pub use domain::model::{FormatInfo, MediaInfo, StreamInfo};
pub use error::{ReportError, ReportResult};
pub use output::{ReportWriter, SectionId, WriterOptions};
