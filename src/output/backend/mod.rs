//! Output syntaxes
//!
//! A backend turns the writer's structural events into the tokens of one
//! output syntax. Separator decisions are driven by the writer's per-level
//! item counters, passed in as `first` flags.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};
use crate::output::section::Section;

pub mod json;

pub use json::JsonBackend;

/// Token emission for one output syntax
pub trait Backend {
    /// Short name of the syntax
    fn name(&self) -> &'static str;

    /// Whether optional fields are shown under the `auto` policy
    fn displays_optional_fields(&self) -> bool {
        false
    }

    /// Open `section`; `first` is true when nothing precedes it in `parent`
    fn section_start(
        &mut self,
        section: &Section,
        parent: Option<&Section>,
        first: bool,
    ) -> ReportResult<()>;

    /// Close `section`; `is_root` is true for the document root
    fn section_end(&mut self, section: &Section, is_root: bool) -> ReportResult<()>;

    fn field_string(&mut self, key: &str, value: &str, first: bool) -> ReportResult<()>;

    fn field_integer(&mut self, key: &str, value: i64, first: bool) -> ReportResult<()>;

    /// Push buffered output to the sink
    fn flush(&mut self) -> ReportResult<()>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn displays_optional_fields(&self) -> bool {
        (**self).displays_optional_fields()
    }

    fn section_start(
        &mut self,
        section: &Section,
        parent: Option<&Section>,
        first: bool,
    ) -> ReportResult<()> {
        (**self).section_start(section, parent, first)
    }

    fn section_end(&mut self, section: &Section, is_root: bool) -> ReportResult<()> {
        (**self).section_end(section, is_root)
    }

    fn field_string(&mut self, key: &str, value: &str, first: bool) -> ReportResult<()> {
        (**self).field_string(key, value, first)
    }

    fn field_integer(&mut self, key: &str, value: i64, first: bool) -> ReportResult<()> {
        (**self).field_integer(key, value, first)
    }

    fn flush(&mut self) -> ReportResult<()> {
        (**self).flush()
    }
}

/// Registered output syntaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintFormat {
    #[default]
    Json,
}

impl PrintFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            PrintFormat::Json => "json",
        }
    }

    /// Instantiate the backend for this syntax over `sink`
    pub fn create_backend<'a>(self, sink: Box<dyn Write + 'a>, compact: bool) -> Box<dyn Backend + 'a> {
        match self {
            PrintFormat::Json => Box::new(JsonBackend::new(sink, compact)),
        }
    }
}

impl fmt::Display for PrintFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrintFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(PrintFormat::Json),
            other => Err(ReportError::ConfigError {
                message: format!("Unknown output format '{}'", other),
            }),
        }
    }
}
