//! JSON backend

use std::io::Write;

use crate::error::ReportResult;
use crate::output::backend::Backend;
use crate::output::section::Section;

/// Escape a key or string value for a JSON string literal
pub fn escape_json(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for c in src.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 32 => out.push_str(&format!("\\u00{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Renders the report as a JSON document.
///
/// Pretty mode indents four spaces per level and puts one item per line;
/// compact mode keeps the fields of an object on a single line.
pub struct JsonBackend<W: Write> {
    out: W,
    indent_level: usize,
    compact: bool,
    item_sep: &'static str,
    item_start_end: &'static str,
}

impl<W: Write> JsonBackend<W> {
    pub fn new(out: W, compact: bool) -> Self {
        Self {
            out,
            indent_level: 0,
            compact,
            item_sep: if compact { ", " } else { ",\n" },
            item_start_end: if compact { " " } else { "\n" },
        }
    }

    /// Give back the sink
    pub fn into_inner(self) -> W {
        self.out
    }

    fn indent(&mut self) -> ReportResult<()> {
        let width = (self.indent_level * 4).max(1);
        write!(self.out, "{:width$}", "", width = width)?;
        Ok(())
    }

    fn item_prefix(&mut self, first: bool) -> ReportResult<()> {
        if !first {
            self.out.write_all(self.item_sep.as_bytes())?;
        }
        if !self.compact {
            self.indent()?;
        }
        Ok(())
    }
}

impl<W: Write> Backend for JsonBackend<W> {
    fn name(&self) -> &'static str {
        "json"
    }

    fn section_start(
        &mut self,
        section: &Section,
        parent: Option<&Section>,
        first: bool,
    ) -> ReportResult<()> {
        if parent.is_some() && !first {
            self.out.write_all(b",\n")?;
        }

        if section.is_wrapper() {
            self.out.write_all(b"{\n")?;
            self.indent_level += 1;
            return Ok(());
        }

        let name = escape_json(section.name);
        self.indent()?;
        self.indent_level += 1;

        if section.is_array() {
            write!(self.out, "\"{}\": [\n", name)?;
        } else if parent.is_some_and(|p| !p.is_array()) {
            write!(self.out, "\"{}\": {{{}", name, self.item_start_end)?;
        } else {
            write!(self.out, "{{{}", self.item_start_end)?;
        }
        Ok(())
    }

    fn section_end(&mut self, section: &Section, is_root: bool) -> ReportResult<()> {
        if is_root {
            self.indent_level = self.indent_level.saturating_sub(1);
            self.out.write_all(b"\n}\n")?;
        } else if section.is_array() {
            self.out.write_all(b"\n")?;
            self.indent_level = self.indent_level.saturating_sub(1);
            self.indent()?;
            self.out.write_all(b"]")?;
        } else {
            self.out.write_all(self.item_start_end.as_bytes())?;
            self.indent_level = self.indent_level.saturating_sub(1);
            if !self.compact {
                self.indent()?;
            }
            self.out.write_all(b"}")?;
        }
        Ok(())
    }

    fn field_string(&mut self, key: &str, value: &str, first: bool) -> ReportResult<()> {
        self.item_prefix(first)?;
        write!(self.out, "\"{}\": \"{}\"", escape_json(key), escape_json(value))?;
        Ok(())
    }

    fn field_integer(&mut self, key: &str, value: i64, first: bool) -> ReportResult<()> {
        self.item_prefix(first)?;
        write!(self.out, "\"{}\": {}", escape_json(key), value)?;
        Ok(())
    }

    fn flush(&mut self) -> ReportResult<()> {
        self.out.flush()?;
        Ok(())
    }
}
