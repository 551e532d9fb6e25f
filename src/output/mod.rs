//! Structured report output
//!
//! The section catalog, the writer engine and everything it needs to turn a
//! tree of records into a serialized document: entry selection, string
//! sanitizing, value formatting, content hashing, backends and sinks.

pub mod backend;
pub mod entries;
pub mod formatter;
pub mod hash;
pub mod sanitizer;
pub mod section;
pub mod sink;
pub mod writer;

pub use backend::{Backend, JsonBackend, PrintFormat};
pub use entries::{EntryFilter, EntrySelection};
pub use formatter::{IntegerLayout, IntegerWidth};
pub use hash::{ContentHasher, HashAlgorithm};
pub use sanitizer::{StringSanitizer, StringValidation};
pub use section::{lookup, Section, SectionFlags, SectionId, SECTIONS};
pub use sink::{OverwritePolicy, ReportSink};
pub use writer::{
    FieldFlags, FieldValue, ReportWriter, ShowOptionalFields, WriterOptions, MAX_NESTING_DEPTH,
};
