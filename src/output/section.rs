//! Static catalog of report sections
//!
//! Every record kind the report can contain is described once here: its
//! display name, structural flags, the children it admits and whether its
//! fields are shown by default. The catalog is immutable; per-run field
//! selection lives in [`crate::output::entries::EntrySelection`].

use std::fmt;
use std::ops::BitOr;

use crate::error::{ReportError, ReportResult};

/// Structural flags of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionFlags(u8);

impl SectionFlags {
    pub const NONE: SectionFlags = SectionFlags(0);
    /// Document-level container that contributes no key of its own
    pub const IS_WRAPPER: SectionFlags = SectionFlags(1);
    /// Ordered collection of child records
    pub const IS_ARRAY: SectionFlags = SectionFlags(2);
    /// Field keys are data (tags), not fixed by the schema
    pub const HAS_VARIABLE_FIELDS: SectionFlags = SectionFlags(4);

    pub const fn contains(self, other: SectionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    const fn union(self, other: SectionFlags) -> SectionFlags {
        SectionFlags(self.0 | other.0)
    }
}

impl BitOr for SectionFlags {
    type Output = SectionFlags;

    fn bitor(self, rhs: SectionFlags) -> SectionFlags {
        self.union(rhs)
    }
}

/// Identifier of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionId {
    Chapter,
    ChapterTags,
    Chapters,
    Error,
    Format,
    FormatTags,
    Frame,
    Frames,
    FrameTags,
    FrameSideDataList,
    FrameSideData,
    FrameSideDataTimecodeList,
    FrameSideDataTimecode,
    FrameSideDataComponentList,
    FrameSideDataComponent,
    FrameSideDataPieceList,
    FrameSideDataPiece,
    FrameLog,
    FrameLogs,
    LibraryVersion,
    LibraryVersions,
    Packet,
    PacketTags,
    Packets,
    PacketsAndFrames,
    PacketSideDataList,
    PacketSideData,
    PixelFormat,
    PixelFormatFlags,
    PixelFormatComponent,
    PixelFormatComponents,
    PixelFormats,
    ProgramStreamDisposition,
    ProgramStreamTags,
    Program,
    ProgramStreams,
    ProgramStream,
    ProgramTags,
    ProgramVersion,
    Programs,
    Root,
    Stream,
    StreamDisposition,
    Streams,
    StreamTags,
    StreamSideDataList,
    StreamSideData,
    Subtitle,
}

impl SectionId {
    /// Catalog index of the section
    pub fn index(self) -> usize {
        self as usize
    }

    /// Resolve a raw catalog index
    pub fn from_index(index: usize) -> ReportResult<SectionId> {
        SECTIONS
            .get(index)
            .map(|section| section.id)
            .ok_or_else(|| ReportError::UnknownSection {
                name: format!("#{}", index),
            })
    }

    /// Catalog entry for this id
    pub fn section(self) -> &'static Section {
        &SECTIONS[self.index()]
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section().qualified_name())
    }
}

/// Immutable description of one kind of record
#[derive(Debug)]
pub struct Section {
    pub id: SectionId,
    /// Name as rendered in the output
    pub name: &'static str,
    pub flags: SectionFlags,
    /// Sections that may be opened directly inside this one
    pub children: &'static [SectionId],
    /// Name of the elements of a variable-length collection
    pub element_name: Option<&'static str>,
    /// Disambiguates display names shared by several sections
    pub unique_name: Option<&'static str>,
    /// Whether every field is shown when no per-run selection applies
    pub show_all_entries: bool,
}

impl Section {
    pub fn is_wrapper(&self) -> bool {
        self.flags.contains(SectionFlags::IS_WRAPPER)
    }

    pub fn is_array(&self) -> bool {
        self.flags.contains(SectionFlags::IS_ARRAY)
    }

    pub fn has_variable_fields(&self) -> bool {
        self.flags.contains(SectionFlags::HAS_VARIABLE_FIELDS)
    }

    /// Whether `child` may be opened inside this section
    pub fn admits(&self, child: SectionId) -> bool {
        self.children.contains(&child)
    }

    /// Unique name if there is one, display name otherwise
    pub fn qualified_name(&self) -> &'static str {
        self.unique_name.unwrap_or(self.name)
    }

    /// Whether `name` designates this section
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.unique_name == Some(name)
    }
}

const fn section(
    id: SectionId,
    name: &'static str,
    flags: SectionFlags,
    children: &'static [SectionId],
) -> Section {
    Section {
        id,
        name,
        flags,
        children,
        element_name: None,
        unique_name: None,
        show_all_entries: false,
    }
}

const fn tags_section(id: SectionId, unique_name: &'static str, show_all_entries: bool) -> Section {
    Section {
        id,
        name: "tags",
        flags: SectionFlags::HAS_VARIABLE_FIELDS,
        children: &[],
        element_name: Some("tag"),
        unique_name: Some(unique_name),
        show_all_entries,
    }
}

const fn named(mut section: Section, unique_name: &'static str) -> Section {
    section.unique_name = Some(unique_name);
    section
}

const fn elements(mut section: Section, element_name: &'static str) -> Section {
    section.element_name = Some(element_name);
    section
}

const fn shown(mut section: Section) -> Section {
    section.show_all_entries = true;
    section
}

use SectionId as S;

const ARRAY: SectionFlags = SectionFlags::IS_ARRAY;
const PLAIN: SectionFlags = SectionFlags::NONE;

/// The section catalog, indexed by [`SectionId::index`]
pub static SECTIONS: [Section; 48] = [
    section(S::Chapter, "chapter", PLAIN, &[S::ChapterTags]),
    tags_section(S::ChapterTags, "chapter_tags", false),
    section(S::Chapters, "chapters", ARRAY, &[S::Chapter]),
    section(S::Error, "error", PLAIN, &[]),
    shown(section(S::Format, "format", PLAIN, &[S::FormatTags])),
    tags_section(S::FormatTags, "format_tags", true),
    section(
        S::Frame,
        "frame",
        PLAIN,
        &[S::FrameTags, S::FrameSideDataList, S::FrameLogs],
    ),
    section(S::Frames, "frames", ARRAY, &[S::Frame, S::Subtitle]),
    tags_section(S::FrameTags, "frame_tags", false),
    elements(
        named(
            section(S::FrameSideDataList, "side_data_list", ARRAY, &[S::FrameSideData]),
            "frame_side_data_list",
        ),
        "side_data",
    ),
    named(
        section(
            S::FrameSideData,
            "side_data",
            PLAIN,
            &[S::FrameSideDataTimecodeList, S::FrameSideDataComponentList],
        ),
        "frame_side_data",
    ),
    section(S::FrameSideDataTimecodeList, "timecodes", ARRAY, &[S::FrameSideDataTimecode]),
    section(S::FrameSideDataTimecode, "timecode", PLAIN, &[]),
    section(S::FrameSideDataComponentList, "components", ARRAY, &[S::FrameSideDataComponent]),
    section(S::FrameSideDataComponent, "component", PLAIN, &[S::FrameSideDataPieceList]),
    section(S::FrameSideDataPieceList, "pieces", ARRAY, &[S::FrameSideDataPiece]),
    named(section(S::FrameSideDataPiece, "section", PLAIN, &[]), "piece"),
    section(S::FrameLog, "log", PLAIN, &[]),
    section(S::FrameLogs, "logs", ARRAY, &[S::FrameLog]),
    section(S::LibraryVersion, "library_version", PLAIN, &[]),
    section(S::LibraryVersions, "library_versions", ARRAY, &[S::LibraryVersion]),
    section(S::Packet, "packet", PLAIN, &[S::PacketTags, S::PacketSideDataList]),
    tags_section(S::PacketTags, "packet_tags", false),
    section(S::Packets, "packets", ARRAY, &[S::Packet]),
    section(
        S::PacketsAndFrames,
        "packets_and_frames",
        ARRAY,
        &[S::Packet, S::Frame, S::Subtitle],
    ),
    elements(
        named(
            section(S::PacketSideDataList, "side_data_list", ARRAY, &[S::PacketSideData]),
            "packet_side_data_list",
        ),
        "side_data",
    ),
    named(section(S::PacketSideData, "side_data", PLAIN, &[]), "packet_side_data"),
    shown(section(
        S::PixelFormat,
        "pixel_format",
        PLAIN,
        &[S::PixelFormatFlags, S::PixelFormatComponents],
    )),
    named(section(S::PixelFormatFlags, "flags", PLAIN, &[]), "pixel_format_flags"),
    section(S::PixelFormatComponent, "component", PLAIN, &[]),
    named(
        section(S::PixelFormatComponents, "components", ARRAY, &[S::PixelFormatComponent]),
        "pixel_format_components",
    ),
    section(S::PixelFormats, "pixel_formats", ARRAY, &[S::PixelFormat]),
    named(
        section(S::ProgramStreamDisposition, "disposition", PLAIN, &[]),
        "program_stream_disposition",
    ),
    tags_section(S::ProgramStreamTags, "program_stream_tags", false),
    section(S::Program, "program", PLAIN, &[S::ProgramTags, S::ProgramStreams]),
    named(
        section(S::ProgramStreams, "streams", ARRAY, &[S::ProgramStream]),
        "program_streams",
    ),
    shown(named(
        section(
            S::ProgramStream,
            "stream",
            PLAIN,
            &[S::ProgramStreamDisposition, S::ProgramStreamTags],
        ),
        "program_stream",
    )),
    tags_section(S::ProgramTags, "program_tags", false),
    section(S::ProgramVersion, "program_version", PLAIN, &[]),
    section(S::Programs, "programs", ARRAY, &[S::Program]),
    section(
        S::Root,
        "root",
        SectionFlags::IS_WRAPPER,
        &[
            S::Chapters,
            S::Format,
            S::Frames,
            S::Programs,
            S::Streams,
            S::Packets,
            S::PacketsAndFrames,
            S::Error,
            S::ProgramVersion,
            S::LibraryVersions,
            S::PixelFormats,
        ],
    ),
    shown(section(
        S::Stream,
        "stream",
        PLAIN,
        &[S::StreamDisposition, S::StreamTags, S::StreamSideDataList],
    )),
    shown(named(
        section(S::StreamDisposition, "disposition", PLAIN, &[]),
        "stream_disposition",
    )),
    shown(section(S::Streams, "streams", ARRAY, &[S::Stream])),
    tags_section(S::StreamTags, "stream_tags", true),
    shown(elements(
        named(
            section(S::StreamSideDataList, "side_data_list", ARRAY, &[S::StreamSideData]),
            "stream_side_data_list",
        ),
        "side_data",
    )),
    shown(named(
        section(S::StreamSideData, "side_data", PLAIN, &[]),
        "stream_side_data",
    )),
    section(S::Subtitle, "subtitle", PLAIN, &[]),
];

/// Catalog entry for an id
pub fn lookup(id: SectionId) -> &'static Section {
    id.section()
}

/// Every section whose display name or unique name is `name`
pub fn find_by_name(name: &str) -> ReportResult<Vec<&'static Section>> {
    let matches: Vec<&'static Section> = SECTIONS.iter().filter(|s| s.matches(name)).collect();
    if matches.is_empty() {
        return Err(ReportError::UnknownSection {
            name: name.to_string(),
        });
    }
    Ok(matches)
}

/// Render the catalog as an indented tree rooted at `root`.
///
/// Each line carries three flag markers (`W` wrapper, `A` array,
/// `V` variable fields) followed by the section name and its unique name.
pub fn catalog_tree(root: SectionId) -> Vec<String> {
    let mut lines = Vec::new();
    describe(root.section(), 0, &mut lines);
    lines
}

fn describe(section: &Section, depth: usize, lines: &mut Vec<String>) {
    let marker = |on: bool, c: char| if on { c } else { '.' };
    let mut line = format!(
        "{}{}{}{}  {}",
        marker(section.is_wrapper(), 'W'),
        marker(section.is_array(), 'A'),
        marker(section.has_variable_fields(), 'V'),
        " ".repeat((depth * 4).max(1)),
        section.name
    );
    if let Some(unique) = section.unique_name {
        line.push('/');
        line.push_str(unique);
    }
    lines.push(line);

    for child in section.children {
        describe(child.section(), depth + 1, lines);
    }
}
