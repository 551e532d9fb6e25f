//! Value formatters
//!
//! Pure functions turning numeric, rational and binary values into the text
//! the report shows for them.

use crate::domain::model::{Rational, NOPTS_VALUE};

/// Text shown for a value that is not available
pub const NOT_AVAILABLE: &str = "N/A";

/// `num<sep>den`, never reduced
pub fn format_rational(q: Rational, sep: char) -> String {
    format!("{}{}{}", q.num, sep, q.den)
}

/// Whether a tick carries no information.
///
/// Timestamps are unknown when they hold the sentinel, durations when zero.
pub fn is_unset_tick(ts: i64, is_duration: bool) -> bool {
    (!is_duration && ts == NOPTS_VALUE) || (is_duration && ts == 0)
}

/// Seconds represented by `ts` ticks of `time_base`, six decimals
pub fn format_time(ts: i64, time_base: Rational, is_duration: bool) -> Option<String> {
    if is_unset_tick(ts, is_duration) {
        return None;
    }
    Some(format!("{:.6}", ts as f64 * time_base.to_f64()))
}

/// Raw tick value, unconverted
pub fn format_ts(ts: i64, is_duration: bool) -> Option<i64> {
    (!is_unset_tick(ts, is_duration)).then_some(ts)
}

/// Magnitude with a unit, rendered as a plain integer
pub fn format_unit_value(value: i64) -> String {
    value.to_string()
}

/// Offset, hex and printable ASCII rows of sixteen bytes
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::from("\n");
    for (row, chunk) in data.chunks(16).enumerate() {
        out.push_str(&format!("{:08x}: ", row * 16));
        for (i, byte) in chunk.iter().enumerate() {
            out.push_str(&format!("{:02x}", byte));
            if i & 1 == 1 {
                out.push(' ');
            }
        }
        let len = chunk.len();
        out.push_str(&" ".repeat(41 - 2 * len - len / 2));
        for &byte in chunk {
            out.push(if (32..127).contains(&byte) { byte as char } else { '.' });
        }
        out.push('\n');
    }
    out
}

/// Width of each element in a columned integer dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerWidth {
    U8,
    U16,
    I32,
}

impl IntegerWidth {
    pub fn bytes(self) -> usize {
        match self {
            IntegerWidth::U8 => 1,
            IntegerWidth::U16 => 2,
            IntegerWidth::I32 => 4,
        }
    }
}

/// Shape of a columned integer dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerLayout {
    pub width: IntegerWidth,
    pub columns: usize,
    /// Amount the row offset advances per row
    pub offset_step: usize,
    /// Minimum rendered width of each element
    pub pad: usize,
}

impl IntegerLayout {
    /// 3x3 matrix of host-order 32-bit integers
    pub const DISPLAY_MATRIX: IntegerLayout = IntegerLayout {
        width: IntegerWidth::I32,
        columns: 3,
        offset_step: 1,
        pad: 11,
    };
}

/// Rows of `columns` host-order integers read from `data`.
///
/// At most `count` elements are rendered; a trailing partial element is
/// ignored.
pub fn integer_dump(data: &[u8], count: usize, layout: IntegerLayout) -> String {
    let size = layout.width.bytes();
    let values: Vec<i64> = data
        .chunks_exact(size)
        .take(count)
        .map(|chunk| match layout.width {
            IntegerWidth::U8 => chunk[0] as i64,
            IntegerWidth::U16 => u16::from_ne_bytes([chunk[0], chunk[1]]) as i64,
            IntegerWidth::I32 => i32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as i64,
        })
        .collect();

    let mut out = String::from("\n");
    let mut offset = 0;
    for row in values.chunks(layout.columns.max(1)) {
        out.push_str(&format!("{:08x}: ", offset));
        for value in row {
            out.push_str(&format!(" {:>width$}", value, width = layout.pad));
        }
        out.push('\n');
        offset += layout.offset_step;
    }
    out
}

/// Four-character code with non-printable bytes shown as `[n]`
pub fn fourcc(tag: u32) -> String {
    let mut out = String::new();
    for byte in tag.to_le_bytes() {
        let c = byte as char;
        if c.is_ascii_alphanumeric() || matches!(c, '.' | ' ' | '-' | '_') {
            out.push(c);
        } else {
            out.push_str(&format!("[{}]", byte));
        }
    }
    out
}

/// Codec tag as zero-padded hex
pub fn codec_tag_hex(tag: u32) -> String {
    format!("0x{:04x}", tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::display_matrix_bytes;

    #[test]
    fn test_format_rational() {
        assert_eq!(format_rational(Rational::new(30000, 1001), '/'), "30000/1001");
        assert_eq!(format_rational(Rational::new(32, 18), ':'), "32:18");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(
            format_time(90000, Rational::new(1, 90000), false).as_deref(),
            Some("1.000000")
        );
        assert_eq!(
            format_time(1_500_000, Rational::new(1, 1_000_000), true).as_deref(),
            Some("1.500000")
        );
        assert_eq!(format_time(NOPTS_VALUE, Rational::new(1, 90000), false), None);
        assert_eq!(format_time(0, Rational::new(1, 90000), true), None);
        assert_eq!(
            format_time(0, Rational::new(1, 90000), false).as_deref(),
            Some("0.000000")
        );
    }

    #[test]
    fn test_format_ts() {
        assert_eq!(format_ts(1234, false), Some(1234));
        assert_eq!(format_ts(NOPTS_VALUE, false), None);
        assert_eq!(format_ts(0, true), None);
    }

    #[test]
    fn test_hex_dump_short_row() {
        let dump = hex_dump(&[0x41, 0x00, 0xFF]);
        let expected = format!("\n00000000: 4100 ff{}A..\n", " ".repeat(41 - 6 - 1));
        assert_eq!(dump, expected);
    }

    #[test]
    fn test_hex_dump_full_rows() {
        let data: Vec<u8> = (0x30..0x50).collect();
        let dump = hex_dump(&data);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "00000000: 3031 3233 3435 3637 3839 3a3b 3c3d 3e3f  0123456789:;<=>?"
        );
        assert!(lines[2].starts_with("00000010: 4041"));
        assert!(lines[2].ends_with("@ABCDEFGHIJKLMNO"));
    }

    #[test]
    fn test_integer_dump_display_matrix() {
        let matrix = [65536, 0, 0, 0, 65536, 0, 0, 0, 1 << 30];
        let dump = integer_dump(&display_matrix_bytes(&matrix), 9, IntegerLayout::DISPLAY_MATRIX);
        let expected = concat!(
            "\n",
            "00000000:        65536           0           0\n",
            "00000001:            0       65536           0\n",
            "00000002:            0           0  1073741824\n",
        );
        assert_eq!(dump, expected);
    }

    #[test]
    fn test_integer_dump_bytes_are_unsigned() {
        let layout = IntegerLayout {
            width: IntegerWidth::U8,
            columns: 4,
            offset_step: 4,
            pad: 3,
        };
        let dump = integer_dump(&[1, 2, 0xFF, 0, 7], 5, layout);
        assert_eq!(dump, "\n00000000:    1   2 255   0\n00000004:    7\n");

        // Only `count` elements are shown
        assert_eq!(integer_dump(&[1, 2, 3], 2, layout), "\n00000000:    1   2\n");
    }

    #[test]
    fn test_integer_dump_u16() {
        let layout = IntegerLayout {
            width: IntegerWidth::U16,
            columns: 2,
            offset_step: 4,
            pad: 5,
        };
        let mut data: Vec<u8> = [0xFFFFu16, 1, 300]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        // Trailing partial element
        data.push(9);

        let dump = integer_dump(&data, 8, layout);
        assert_eq!(dump, "\n00000000:  65535      1\n00000004:    300\n");

        // Values wider than the padding are not truncated
        let narrow = IntegerLayout { pad: 2, ..layout };
        assert_eq!(integer_dump(&data, 1, narrow), "\n00000000:  65535\n");
    }

    #[test]
    fn test_fourcc() {
        assert_eq!(fourcc(u32::from_le_bytes(*b"avc1")), "avc1");
        assert_eq!(fourcc(0), "[0][0][0][0]");
        assert_eq!(fourcc(u32::from_le_bytes([b'm', b'p', b'4', 0x01])), "mp4[1]");
        assert_eq!(codec_tag_hex(0x31637661), "0x31637661");
        assert_eq!(codec_tag_hex(0x1b), "0x001b");
    }

    #[test]
    fn test_unit_value_has_no_prefix() {
        assert_eq!(format_unit_value(48000), "48000");
        assert_eq!(format_unit_value(1_234_567), "1234567");
    }
}
