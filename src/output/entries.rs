//! Per-run field selection
//!
//! A selection overrides the catalog's default visibility for the sections it
//! names. It is built once per report (usually from a `show_entries`
//! expression) and discarded with the writer.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use crate::error::{ReportError, ReportResult};
use crate::output::section::{find_by_name, Section, SectionId};

/// Visibility policy installed for one section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryFilter {
    /// Every field is shown
    All,
    /// Only the listed keys are shown
    Only(BTreeSet<String>),
}

/// Request-scoped visibility overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySelection {
    filters: HashMap<SectionId, EntryFilter>,
}

impl EntrySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `section[=key,key...][:section...]` expression
    pub fn parse(expr: &str) -> ReportResult<Self> {
        let mut selection = Self::new();
        for item in expr.split(':').map(str::trim).filter(|s| !s.is_empty()) {
            let (name, keys) = match item.split_once('=') {
                Some((name, keys)) => (name.trim(), Some(keys)),
                None => (item, None),
            };

            for section in find_by_name(name)? {
                match keys {
                    Some(keys) => selection.set_visible_fields(
                        section.id,
                        keys.split(',').map(str::trim).filter(|k| !k.is_empty()),
                    ),
                    None => selection.show_all_entries(section.id),
                }
            }
        }
        Ok(selection)
    }

    /// Restrict a section to the given field keys, merging with earlier keys
    pub fn set_visible_fields<I, K>(&mut self, id: SectionId, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let filter = self
            .filters
            .entry(id)
            .or_insert_with(|| EntryFilter::Only(BTreeSet::new()));
        if let EntryFilter::Only(allowed) = filter {
            allowed.extend(keys.into_iter().map(Into::into));
        }
    }

    /// Show every field of a section and of all its descendants
    pub fn show_all_entries(&mut self, id: SectionId) {
        self.filters.insert(id, EntryFilter::All);
        for child in id.section().children {
            self.show_all_entries(*child);
        }
    }

    /// Drop every override
    pub fn reset(&mut self) {
        self.filters.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filter(&self, id: SectionId) -> Option<&EntryFilter> {
        self.filters.get(&id)
    }

    /// Whether `key` is shown in `section`.
    ///
    /// The override for the section wins. Without any override the catalog
    /// default applies; once a selection is active, sections it does not
    /// name show nothing.
    pub fn field_visible(&self, section: &Section, key: &str) -> bool {
        match self.filters.get(&section.id) {
            Some(EntryFilter::All) => true,
            Some(EntryFilter::Only(keys)) => keys.contains(key),
            None => self.filters.is_empty() && section.show_all_entries,
        }
    }

    /// Whether a section should be opened at all.
    ///
    /// Without overrides every section is shown. With overrides a section is
    /// shown when it or one of its descendants was selected.
    pub fn shows_section(&self, id: SectionId) -> bool {
        if self.filters.is_empty() {
            return true;
        }
        self.selects_subtree(id)
    }

    fn selects_subtree(&self, id: SectionId) -> bool {
        self.filters.contains_key(&id)
            || id
                .section()
                .children
                .iter()
                .any(|child| self.selects_subtree(*child))
    }
}

impl FromStr for EntrySelection {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::section::lookup;

    #[test]
    fn test_defaults_follow_catalog() {
        let selection = EntrySelection::new();
        assert!(selection.field_visible(lookup(SectionId::Stream), "index"));
        assert!(!selection.field_visible(lookup(SectionId::Packet), "pts"));
        assert!(selection.shows_section(SectionId::Packets));
    }

    #[test]
    fn test_parse_key_list() {
        let selection = EntrySelection::parse("stream=index,codec_name").unwrap();
        let stream = lookup(SectionId::Stream);
        assert!(selection.field_visible(stream, "index"));
        assert!(selection.field_visible(stream, "codec_name"));
        assert!(!selection.field_visible(stream, "width"));

        // Unselected children are neither opened nor populated
        assert!(!selection.shows_section(SectionId::StreamDisposition));
        assert!(!selection.field_visible(lookup(SectionId::StreamDisposition), "default"));
        assert!(selection.shows_section(SectionId::Streams));
        assert!(!selection.shows_section(SectionId::Format));
    }

    #[test]
    fn test_parse_bare_section_shows_descendants() {
        let selection = EntrySelection::parse("packet").unwrap();
        assert!(selection.field_visible(lookup(SectionId::Packet), "pts"));
        assert!(selection.field_visible(lookup(SectionId::PacketTags), "title"));
        assert!(selection.field_visible(lookup(SectionId::PacketSideData), "side_data_type"));
    }

    #[test]
    fn test_parse_shared_display_name() {
        let selection = EntrySelection::parse("format=filename:tags=title").unwrap();
        assert_eq!(
            selection.filter(SectionId::StreamTags),
            Some(&EntryFilter::Only(BTreeSet::from(["title".to_string()])))
        );
        assert!(selection.filter(SectionId::ChapterTags).is_some());
        assert!(selection.shows_section(SectionId::Format));
        assert!(selection.shows_section(SectionId::Stream));
        assert!(!selection.field_visible(lookup(SectionId::Stream), "index"));
    }

    #[test]
    fn test_parse_unknown_section() {
        let err = EntrySelection::parse("stream=index:nonsense").unwrap_err();
        assert!(matches!(err, ReportError::UnknownSection { name } if name == "nonsense"));
    }

    #[test]
    fn test_set_visible_fields_merges_and_reset_clears() {
        let mut selection = EntrySelection::new();
        selection.set_visible_fields(SectionId::Format, ["filename"]);
        selection.set_visible_fields(SectionId::Format, ["duration"]);
        let format = lookup(SectionId::Format);
        assert!(selection.field_visible(format, "filename"));
        assert!(selection.field_visible(format, "duration"));
        assert!(!selection.field_visible(format, "size"));

        selection.reset();
        assert!(selection.is_empty());
        assert!(selection.field_visible(format, "size"));
    }
}
