//! UTF-8 validation of untrusted text
//!
//! Container metadata is arbitrary bytes. Before it is embedded in the report
//! it is decoded with strict rules and invalid sequences are handled according
//! to a [`StringValidation`] policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{ReportError, ReportResult};

/// Default text spliced in place of an invalid sequence
pub const DEFAULT_REPLACEMENT: &str = "\u{FFFD}";

/// What to do with an invalid UTF-8 sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringValidation {
    /// Reject the whole string
    Fail,
    /// Substitute the replacement text
    #[default]
    Replace,
    /// Drop the offending bytes
    Ignore,
}

impl FromStr for StringValidation {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(StringValidation::Fail),
            "replace" => Ok(StringValidation::Replace),
            "ignore" => Ok(StringValidation::Ignore),
            other => Err(ReportError::ConfigError {
                message: format!(
                    "Unknown string validation policy '{}', expected fail, replace or ignore",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for StringValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StringValidation::Fail => "fail",
            StringValidation::Replace => "replace",
            StringValidation::Ignore => "ignore",
        };
        f.write_str(name)
    }
}

/// Outcome of sanitizing one string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub text: String,
    /// Number of invalid sequences found
    pub invalid: usize,
}

/// Smallest code point that needs a given number of continuation bytes
const OVERLONG_LIMITS: [u32; 6] = [0, 0x80, 0x800, 0x1_0000, 0x20_0000, 0x400_0000];

/// Decode one code point from the front of `bytes`.
///
/// Returns the decoded value (or `None` when the sequence is invalid) and the
/// number of bytes consumed. Malformed or truncated sequences consume only
/// their lead byte; well-formed but disallowed ones consume the whole
/// sequence.
pub fn decode_code_point(bytes: &[u8]) -> (Option<char>, usize) {
    let Some(&lead) = bytes.first() else {
        return (None, 0);
    };
    if lead & 0xC0 == 0x80 || lead >= 0xFE {
        return (None, 1);
    }

    let mut code = lead as u32;
    let mut top = (code & 0x80) >> 1;
    let mut consumed = 1;
    let mut tail_len = 0;
    while code & top != 0 {
        tail_len += 1;
        let Some(&next) = bytes.get(consumed) else {
            return (None, 1);
        };
        if next & 0xC0 != 0x80 {
            return (None, 1);
        }
        code = (code << 6) + (next as u32 - 0x80);
        consumed += 1;
        top <<= 5;
    }
    code &= (top << 1).wrapping_sub(1);

    let disallowed = code >= 1 << 31
        || code < OVERLONG_LIMITS[tail_len]
        || code > 0x10_FFFF
        || (0xD800..=0xDFFF).contains(&code)
        || code == 0xFFFE
        || code == 0xFFFF;
    if disallowed {
        return (None, consumed);
    }
    (char::from_u32(code), consumed)
}

/// Uppercase hex rendering of raw bytes, e.g. `0XC3 0X28`
pub fn describe_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0X{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validate `bytes` under `policy`, splicing `replacement` where needed
pub fn sanitize(
    bytes: &[u8],
    policy: StringValidation,
    replacement: &str,
) -> ReportResult<Sanitized> {
    let mut text = String::with_capacity(bytes.len());
    let mut invalid = 0;
    let mut rest = bytes;

    while !rest.is_empty() {
        let (decoded, consumed) = decode_code_point(rest);
        let (sequence, tail) = rest.split_at(consumed);
        rest = tail;

        match decoded {
            Some(c) => text.push(c),
            None => {
                invalid += 1;
                let source = String::from_utf8_lossy(bytes);
                debug!(
                    "Invalid UTF-8 sequence {} found in string '{}'",
                    describe_bytes(sequence),
                    source
                );
                match policy {
                    StringValidation::Fail => {
                        error!("Invalid UTF-8 sequence found in string '{}'", source);
                        return Err(ReportError::InvalidEncoding {
                            bytes: describe_bytes(sequence),
                            text: source.into_owned(),
                        });
                    }
                    StringValidation::Replace => text.push_str(replacement),
                    StringValidation::Ignore => {}
                }
            }
        }
    }

    if invalid > 0 && policy == StringValidation::Replace {
        warn!(
            "{} invalid UTF-8 sequence(s) found in string '{}', replaced with '{}'",
            invalid,
            String::from_utf8_lossy(bytes),
            replacement
        );
    }

    Ok(Sanitized { text, invalid })
}

/// Sanitizer bound to one policy and a validated replacement
#[derive(Debug, Clone)]
pub struct StringSanitizer {
    policy: StringValidation,
    replacement: String,
}

impl StringSanitizer {
    /// Create a sanitizer, rejecting a replacement that is not itself valid
    pub fn new(policy: StringValidation, replacement: &[u8]) -> ReportResult<Self> {
        let mut rest = replacement;
        while !rest.is_empty() {
            let (decoded, consumed) = decode_code_point(rest);
            if decoded.is_none() {
                let bytes = describe_bytes(&rest[..consumed]);
                let replacement = String::from_utf8_lossy(replacement).into_owned();
                error!(
                    "Invalid UTF-8 sequence {} found in string validation replacement '{}'",
                    bytes, replacement
                );
                return Err(ReportError::InvalidReplacement { bytes, replacement });
            }
            rest = &rest[consumed..];
        }

        Ok(Self {
            policy,
            replacement: String::from_utf8_lossy(replacement).into_owned(),
        })
    }

    pub fn sanitize(&self, bytes: &[u8]) -> ReportResult<Sanitized> {
        sanitize(bytes, self.policy, &self.replacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_text_passes_through() {
        let out = sanitize("h\u{e9}llo \u{1F600}".as_bytes(), StringValidation::Fail, "?").unwrap();
        assert_eq!(out.text, "h\u{e9}llo \u{1F600}");
        assert_eq!(out.invalid, 0);
    }

    #[test]
    fn test_replace_single_invalid_byte() {
        let out = sanitize(b"desc\xFF", StringValidation::Replace, "?").unwrap();
        assert_eq!(out.text, "desc?");
        assert_eq!(out.invalid, 1);
    }

    #[test]
    fn test_replace_is_idempotent() {
        let first = sanitize(b"a\xC3(b\xED\xA0\x80", StringValidation::Replace, "?").unwrap();
        let second = sanitize(first.text.as_bytes(), StringValidation::Replace, "?").unwrap();
        assert_eq!(first.text, second.text);
        assert_eq!(second.invalid, 0);
    }

    #[test]
    fn test_ignore_drops_invalid_bytes() {
        let out = sanitize(b"ab\x80c", StringValidation::Ignore, "?").unwrap();
        assert_eq!(out.text, "abc");
        assert_eq!(out.invalid, 1);
    }

    #[test]
    fn test_fail_reports_offending_bytes() {
        let err = sanitize(b"ok\xC3(", StringValidation::Fail, "?").unwrap_err();
        match err {
            ReportError::InvalidEncoding { bytes, .. } => assert_eq!(bytes, "0XC3"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_sequence_consumes_lead_only() {
        // 0xE2 0x82 is a truncated three byte sequence, 'A' must survive
        assert_eq!(decode_code_point(b"\xE2\x82A"), (None, 1));
        let out = sanitize(b"\xE2\x82A", StringValidation::Replace, "?").unwrap();
        assert_eq!(out.text, "??A");
        assert_eq!(out.invalid, 2);
    }

    #[test]
    fn test_disallowed_sequences_consume_whole_sequence() {
        // overlong '/'
        assert_eq!(decode_code_point(b"\xC0\xAF"), (None, 2));
        // surrogate
        assert_eq!(decode_code_point(b"\xED\xA0\x80"), (None, 3));
        // U+FFFE
        assert_eq!(decode_code_point(b"\xEF\xBF\xBE"), (None, 3));
        // above U+10FFFF
        assert_eq!(decode_code_point(b"\xF4\x90\x80\x80"), (None, 4));
        assert_eq!(decode_code_point(b"\xFE"), (None, 1));
    }

    #[test]
    fn test_decode_valid_sequences() {
        assert_eq!(decode_code_point(b"A"), (Some('A'), 1));
        assert_eq!(decode_code_point("\u{e9}".as_bytes()), (Some('\u{e9}'), 2));
        assert_eq!(decode_code_point("\u{10FFFF}".as_bytes()), (Some('\u{10FFFF}'), 4));
    }

    #[test]
    fn test_invalid_replacement_rejected() {
        let err = StringSanitizer::new(StringValidation::Replace, b"\xFF").unwrap_err();
        assert!(matches!(err, ReportError::InvalidReplacement { .. }));

        let sanitizer = StringSanitizer::new(StringValidation::Replace, b"<?>").unwrap();
        assert_eq!(sanitizer.sanitize(b"x\xFF").unwrap().text, "x<?>");
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("FAIL".parse::<StringValidation>().unwrap(), StringValidation::Fail);
        assert_eq!("ignore".parse::<StringValidation>().unwrap(), StringValidation::Ignore);
        assert!("drop".parse::<StringValidation>().is_err());
    }
}
