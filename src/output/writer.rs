//! Report writer engine
//!
//! [`ReportWriter`] walks the report tree on behalf of the caller. It checks
//! every open against the section catalog, keeps the per-level item counters
//! the backend needs for separators, filters fields through the active entry
//! selection, sanitizes untrusted text and formats values before handing
//! them to the [`Backend`].

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::domain::model::Rational;
use crate::error::{ReportError, ReportResult};
use crate::output::backend::Backend;
use crate::output::entries::EntrySelection;
use crate::output::formatter::{self, IntegerLayout, NOT_AVAILABLE};
use crate::output::hash::{ContentHasher, HashAlgorithm};
use crate::output::sanitizer::{StringSanitizer, StringValidation, DEFAULT_REPLACEMENT};
use crate::output::section::{Section, SectionId};

/// Deepest nesting a report may reach, the root included
pub const MAX_NESTING_DEPTH: usize = 10;

/// Policy for fields flagged optional (`N/A`, `unknown`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowOptionalFields {
    /// Always emit them
    #[default]
    Always,
    /// Never emit them
    Never,
    /// Emit them only if the backend displays optional fields
    Auto,
}

impl FromStr for ShowOptionalFields {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(ShowOptionalFields::Always),
            "never" => Ok(ShowOptionalFields::Never),
            "auto" => Ok(ShowOptionalFields::Auto),
            other => Err(ReportError::ConfigError {
                message: format!(
                    "Unknown optional field policy '{}', expected always, never or auto",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for ShowOptionalFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShowOptionalFields::Always => "always",
            ShowOptionalFields::Never => "never",
            ShowOptionalFields::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// Per-report writer configuration
#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub string_validation: StringValidation,
    /// Raw replacement bytes, validated when the writer starts
    pub replacement: Vec<u8>,
    pub show_optional_fields: ShowOptionalFields,
    /// Algorithm for `*_hash` fields; none means no hash fields
    pub hash: Option<HashAlgorithm>,
    pub entries: EntrySelection,
    pub max_depth: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            string_validation: StringValidation::default(),
            replacement: DEFAULT_REPLACEMENT.as_bytes().to_vec(),
            show_optional_fields: ShowOptionalFields::default(),
            hash: None,
            entries: EntrySelection::default(),
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

/// Emission flags of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldFlags {
    /// Placeholder value subject to the optional field policy
    pub optional: bool,
    /// Untrusted text that must go through the sanitizer
    pub validate: bool,
}

impl FieldFlags {
    pub const NONE: FieldFlags = FieldFlags {
        optional: false,
        validate: false,
    };
    pub const OPTIONAL: FieldFlags = FieldFlags {
        optional: true,
        validate: false,
    };
    pub const VALIDATE: FieldFlags = FieldFlags {
        optional: false,
        validate: true,
    };
}

/// Value of a single field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// Text, possibly not valid UTF-8
    Text(&'a [u8]),
    Integer(i64),
    /// Rational shown as `num<sep>den`
    Rational(Rational, char),
    /// Binary payload shown as a hex dump
    Data(&'a [u8]),
}

#[derive(Debug)]
struct Level {
    section: &'static Section,
    items: usize,
}

/// Stateful, single-document report writer
pub struct ReportWriter<B: Backend> {
    backend: B,
    levels: Vec<Level>,
    sanitizer: StringSanitizer,
    show_optional: bool,
    hasher: Option<Box<dyn ContentHasher + Send + Sync>>,
    entries: EntrySelection,
    max_depth: usize,
    packets: u64,
    frames: u64,
    interleave_index: u64,
}

impl<B: Backend> ReportWriter<B> {
    /// Start a report under the standard document root
    pub fn begin(backend: B, options: WriterOptions) -> ReportResult<Self> {
        Self::begin_with_root(backend, SectionId::Root, options)
    }

    /// Start a report under `root`, which must be a wrapper section
    pub fn begin_with_root(
        backend: B,
        root: SectionId,
        options: WriterOptions,
    ) -> ReportResult<Self> {
        let sanitizer = StringSanitizer::new(options.string_validation, &options.replacement)?;
        let show_optional = match options.show_optional_fields {
            ShowOptionalFields::Always => true,
            ShowOptionalFields::Never => false,
            ShowOptionalFields::Auto => backend.displays_optional_fields(),
        };

        let mut writer = Self {
            backend,
            levels: Vec::with_capacity(options.max_depth),
            sanitizer,
            show_optional,
            hasher: options
                .hash
                .map(|algo| Box::new(algo) as Box<dyn ContentHasher + Send + Sync>),
            entries: options.entries,
            max_depth: options.max_depth,
            packets: 0,
            frames: 0,
            interleave_index: 0,
        };
        writer.open_section(root)?;
        Ok(writer)
    }

    /// Replace the hash algorithm used for `*_hash` fields
    pub fn set_hasher(&mut self, hasher: Box<dyn ContentHasher + Send + Sync>) {
        self.hasher = Some(hasher);
    }

    /// Number of open sections, the root included
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Packets closed under the current interleaved array
    pub fn packet_count(&self) -> u64 {
        self.packets
    }

    /// Frames and subtitles closed under the current interleaved array
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Position of the open interleaved element among those of its kind
    pub fn interleave_index(&self) -> u64 {
        self.interleave_index
    }

    pub fn current_section(&self) -> Option<SectionId> {
        self.levels.last().map(|level| level.section.id)
    }

    /// Whether the entry selection wants `id` opened
    pub fn is_shown(&self, id: SectionId) -> bool {
        self.entries.shows_section(id)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Open a child of the current section
    pub fn open_section(&mut self, id: SectionId) -> ReportResult<()> {
        let section = id.section();

        if self.levels.len() >= self.max_depth {
            return Err(ReportError::DepthExceeded {
                section: section.qualified_name(),
                max: self.max_depth,
            });
        }

        let (parent, first) = match self.levels.last() {
            Some(level) => {
                if !level.section.admits(id) {
                    return Err(ReportError::InvalidChild {
                        parent: level.section.qualified_name(),
                        child: section.qualified_name(),
                    });
                }
                (Some(level.section), level.items == 0)
            }
            None if section.is_wrapper() => (None, true),
            None => {
                return Err(ReportError::InvalidChild {
                    parent: "document",
                    child: section.qualified_name(),
                });
            }
        };

        self.backend.section_start(section, parent, first)?;
        self.levels.push(Level { section, items: 0 });

        if id == SectionId::PacketsAndFrames {
            self.packets = 0;
            self.frames = 0;
            self.interleave_index = 0;
        }

        // Interleaved elements carry their kind so readers can tell them apart
        if parent.is_some_and(|p| p.id == SectionId::PacketsAndFrames) {
            self.interleave_index = if id == SectionId::Packet {
                self.packets
            } else {
                self.frames
            };
            self.backend.field_string("type", section.name, true)?;
            if let Some(level) = self.levels.last_mut() {
                level.items += 1;
            }
        }
        Ok(())
    }

    /// Close the innermost open section
    pub fn close_section(&mut self) -> ReportResult<()> {
        let level = self.levels.last().ok_or(ReportError::EmptyStack)?;
        let section = level.section;
        let is_root = self.levels.len() == 1;

        self.backend.section_end(section, is_root)?;
        self.levels.pop();

        if let Some(parent) = self.levels.last_mut() {
            parent.items += 1;
            if parent.section.id == SectionId::PacketsAndFrames {
                match section.id {
                    SectionId::Packet => self.packets += 1,
                    SectionId::Frame | SectionId::Subtitle => self.frames += 1,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Close every open section except the root
    pub fn close_all(&mut self) -> ReportResult<()> {
        while self.levels.len() > 1 {
            self.close_section()?;
        }
        Ok(())
    }

    /// Close the root and flush the backend
    pub fn end_report(&mut self) -> ReportResult<()> {
        if self.levels.len() != 1 {
            return Err(ReportError::UnbalancedSections {
                open: self.levels.len(),
            });
        }
        self.close_section()?;
        self.backend.flush()
    }

    /// Emit one field in the current section.
    ///
    /// Hidden fields are a silent no-op. A field whose text fails validation
    /// is not written and the error is returned.
    pub fn emit_field(&mut self, key: &str, value: FieldValue<'_>, flags: FieldFlags) -> ReportResult<()> {
        self.write_field(key.as_bytes(), value, flags)
    }

    fn write_field(&mut self, key: &[u8], value: FieldValue<'_>, flags: FieldFlags) -> ReportResult<()> {
        let level = self.levels.last().ok_or(ReportError::EmptyStack)?;
        let section = level.section;
        let first = level.items == 0;

        if flags.optional && !self.show_optional {
            return Ok(());
        }
        let key_text = String::from_utf8_lossy(key);
        if !self.entries.field_visible(section, &key_text) {
            return Ok(());
        }

        match value {
            FieldValue::Integer(v) => {
                let key = self.field_key(key, &key_text, flags, section)?;
                self.backend.field_integer(&key, v, first)?;
            }
            FieldValue::Text(bytes) => {
                let key = self.field_key(key, &key_text, flags, section)?;
                let text = if flags.validate {
                    self.sanitize(bytes, &key_text, section)?
                } else {
                    String::from_utf8_lossy(bytes).into_owned()
                };
                self.backend.field_string(&key, &text, first)?;
            }
            FieldValue::Rational(q, sep) => {
                let key = self.field_key(key, &key_text, flags, section)?;
                self.backend
                    .field_string(&key, &formatter::format_rational(q, sep), first)?;
            }
            FieldValue::Data(bytes) => {
                let key = self.field_key(key, &key_text, flags, section)?;
                self.backend.field_string(&key, &formatter::hex_dump(bytes), first)?;
            }
        }

        if let Some(level) = self.levels.last_mut() {
            level.items += 1;
        }
        Ok(())
    }

    fn field_key<'k>(
        &self,
        key: &'k [u8],
        key_text: &'k str,
        flags: FieldFlags,
        section: &Section,
    ) -> ReportResult<Cow<'k, str>> {
        if flags.validate {
            Ok(Cow::Owned(self.sanitize(key, key_text, section)?))
        } else {
            Ok(Cow::Borrowed(key_text))
        }
    }

    fn sanitize(&self, bytes: &[u8], key: &str, section: &Section) -> ReportResult<String> {
        self.sanitizer
            .sanitize(bytes)
            .map(|sanitized| sanitized.text)
            .map_err(|e| {
                error!(
                    "Invalid key=value string combination {}={} in section {}",
                    key,
                    String::from_utf8_lossy(bytes),
                    section.qualified_name()
                );
                e
            })
    }

    pub fn emit_str(&mut self, key: &str, value: &str) -> ReportResult<()> {
        self.emit_field(key, FieldValue::Text(value.as_bytes()), FieldFlags::NONE)
    }

    /// Placeholder text subject to the optional field policy
    pub fn emit_str_opt(&mut self, key: &str, value: &str) -> ReportResult<()> {
        self.emit_field(key, FieldValue::Text(value.as_bytes()), FieldFlags::OPTIONAL)
    }

    /// Untrusted text, sanitized before emission
    pub fn emit_str_validate(&mut self, key: &str, value: &[u8]) -> ReportResult<()> {
        self.emit_field(key, FieldValue::Text(value), FieldFlags::VALIDATE)
    }

    pub fn emit_int(&mut self, key: &str, value: i64) -> ReportResult<()> {
        self.emit_field(key, FieldValue::Integer(value), FieldFlags::NONE)
    }

    pub fn emit_q(&mut self, key: &str, q: Rational, sep: char) -> ReportResult<()> {
        self.emit_field(key, FieldValue::Rational(q, sep), FieldFlags::NONE)
    }

    /// Tick converted to seconds, `N/A` when unset
    pub fn emit_time(
        &mut self,
        key: &str,
        ts: i64,
        time_base: Rational,
        is_duration: bool,
    ) -> ReportResult<()> {
        match formatter::format_time(ts, time_base, is_duration) {
            Some(text) => self.emit_str(key, &text),
            None => self.emit_str_opt(key, NOT_AVAILABLE),
        }
    }

    /// Raw tick, `N/A` when unset
    pub fn emit_ts(&mut self, key: &str, ts: i64, is_duration: bool) -> ReportResult<()> {
        match formatter::format_ts(ts, is_duration) {
            Some(ts) => self.emit_int(key, ts),
            None => self.emit_str_opt(key, NOT_AVAILABLE),
        }
    }

    /// Magnitude carrying a unit, shown as plain integer text
    pub fn emit_unit_value(&mut self, key: &str, value: i64) -> ReportResult<()> {
        self.emit_str(key, &formatter::format_unit_value(value))
    }

    /// Binary payload as a hex dump
    pub fn emit_data(&mut self, key: &str, data: &[u8]) -> ReportResult<()> {
        self.emit_field(key, FieldValue::Data(data), FieldFlags::NONE)
    }

    /// Digest of a binary payload; nothing without a hash algorithm
    pub fn emit_data_hash(&mut self, key: &str, data: &[u8]) -> ReportResult<()> {
        let Some(hasher) = self.hasher.as_ref() else {
            return Ok(());
        };
        let fingerprint = hasher.fingerprint(data);
        self.emit_str(key, &fingerprint)
    }

    /// Columned dump of `count` host-order integers
    pub fn emit_integers(
        &mut self,
        key: &str,
        data: &[u8],
        count: usize,
        layout: IntegerLayout,
    ) -> ReportResult<()> {
        self.emit_str(key, &formatter::integer_dump(data, count, layout))
    }

    /// Metadata entry, key and value both sanitized
    pub fn emit_tag(&mut self, key: &[u8], value: &[u8]) -> ReportResult<()> {
        debug!("Emitting tag {}", String::from_utf8_lossy(key));
        self.write_field(key, FieldValue::Text(value), FieldFlags::VALIDATE)
    }
}
