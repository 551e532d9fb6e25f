// Domain models - Read-only view of a probed container

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::errors::DomainError;

pub mod side_data;

pub use side_data::*;

/// Sentinel tick value for an unknown timestamp
pub const NOPTS_VALUE: i64 = i64::MIN;

/// Internal time base of container-level timestamps (microseconds)
pub const TIME_BASE_Q: Rational = Rational { num: 1, den: 1_000_000 };

/// Profile id reported when the codec profile is unknown
pub const PROFILE_UNKNOWN: i32 = -99;

/// Exact rational number, e.g. a time base or frame rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Convert to floating point
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Reduce `num/den` to a fraction whose terms do not exceed `max`.
    ///
    /// Exact when the reduced terms fit, otherwise the closest continued
    /// fraction convergent within bounds. The flag reports exactness.
    pub fn reduce(num: i64, den: i64, max: i64) -> (Rational, bool) {
        let negative = (num < 0) ^ (den < 0);
        let mut num = num.unsigned_abs() as i64;
        let mut den = den.unsigned_abs() as i64;
        let divisor = gcd(num, den);
        if divisor != 0 {
            num /= divisor;
            den /= divisor;
        }

        let (mut a0n, mut a0d) = (0i64, 1i64);
        let (mut a1n, mut a1d) = (1i64, 0i64);
        if num <= max && den <= max {
            a1n = num;
            a1d = den;
            den = 0;
        }

        while den != 0 {
            let x = num / den;
            let next_den = num - den * x;
            let a2n = x * a1n + a0n;
            let a2d = x * a1d + a0d;

            if a2n > max || a2d > max {
                let mut x = x;
                if a1n != 0 {
                    x = (max - a0n) / a1n;
                }
                if a1d != 0 {
                    x = x.min((max - a0d) / a1d);
                }
                if den * (2 * x * a1d + a0d) > num * a1d {
                    a1n = x * a1n + a0n;
                    a1d = x * a1d + a0d;
                }
                break;
            }

            a0n = a1n;
            a0d = a1d;
            a1n = a2n;
            a1d = a2d;
            num = den;
            den = next_den;
        }

        let reduced = Rational {
            num: if negative { -(a1n as i32) } else { a1n as i32 },
            den: a1d as i32,
        };
        (reduced, den == 0)
    }
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for Rational {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, den) = s
            .split_once(|c| c == '/' || c == ':')
            .ok_or_else(|| DomainError::BadArgs(format!("Invalid rational '{}'", s)))?;
        let num = num
            .trim()
            .parse()
            .map_err(|_| DomainError::BadArgs(format!("Invalid numerator in '{}'", s)))?;
        let den = den
            .trim()
            .parse()
            .map_err(|_| DomainError::BadArgs(format!("Invalid denominator in '{}'", s)))?;
        Ok(Self { num, den })
    }
}

impl TryFrom<String> for Rational {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rational> for String {
    fn from(value: Rational) -> Self {
        value.to_string()
    }
}

/// Text of unknown encoding as handed over by the container
///
/// Serialized as a string when it is valid UTF-8, as a byte array otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawTextRepr", into = "RawTextRepr")]
pub struct RawText(pub Vec<u8>);

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTextRepr {
    Text(String),
    Bytes(Vec<u8>),
}

impl From<RawTextRepr> for RawText {
    fn from(value: RawTextRepr) -> Self {
        match value {
            RawTextRepr::Text(text) => RawText(text.into_bytes()),
            RawTextRepr::Bytes(bytes) => RawText(bytes),
        }
    }
}

impl From<RawText> for RawTextRepr {
    fn from(value: RawText) -> Self {
        match String::from_utf8(value.0) {
            Ok(text) => RawTextRepr::Text(text),
            Err(err) => RawTextRepr::Bytes(err.into_bytes()),
        }
    }
}

impl RawText {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for RawText {
    fn from(value: &str) -> Self {
        RawText(value.as_bytes().to_vec())
    }
}

impl From<&[u8]> for RawText {
    fn from(value: &[u8]) -> Self {
        RawText(value.to_vec())
    }
}

/// Single metadata entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: RawText,
    pub value: RawText,
}

/// Free-form metadata dictionary, kept in container order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tags(Vec<Tag>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, replacing the value of an existing key
    pub fn insert(&mut self, key: impl Into<RawText>, value: impl Into<RawText>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|tag| tag.key == key) {
            Some(tag) => tag.value = value,
            None => self.0.push(Tag { key, value }),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for tag in &self.0 {
            map.serialize_entry(&String::from_utf8_lossy(tag.key.as_bytes()), &tag.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TagsVisitor;

        impl<'de> Visitor<'de> for TagsVisitor {
            type Value = Tags;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of metadata tags")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Tags, A::Error> {
                let mut tags = Tags::new();
                while let Some((key, value)) = access.next_entry::<String, RawText>()? {
                    tags.insert(RawText(key.into_bytes()), value);
                }
                Ok(tags)
            }
        }

        deserializer.deserialize_map(TagsVisitor)
    }
}

/// Media type of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
    Data,
    Subtitle,
    Attachment,
}

impl MediaType {
    pub fn name(self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Data => "data",
            MediaType::Subtitle => "subtitle",
            MediaType::Attachment => "attachment",
        }
    }
}

/// Field (interlacing) order of a video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldOrder {
    #[default]
    Unknown,
    Progressive,
    Tt,
    Bb,
    Tb,
    Bt,
}

impl FieldOrder {
    /// Display name, `None` when unknown
    pub fn name(self) -> Option<&'static str> {
        match self {
            FieldOrder::Unknown => None,
            FieldOrder::Progressive => Some("progressive"),
            FieldOrder::Tt => Some("tt"),
            FieldOrder::Bb => Some("bb"),
            FieldOrder::Tb => Some("tb"),
            FieldOrder::Bt => Some("bt"),
        }
    }
}

/// Role flags attached to a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Disposition {
    pub default: bool,
    pub dub: bool,
    pub original: bool,
    pub comment: bool,
    pub lyrics: bool,
    pub karaoke: bool,
    pub forced: bool,
    pub hearing_impaired: bool,
    pub visual_impaired: bool,
    pub clean_effects: bool,
    pub attached_pic: bool,
    pub timed_thumbnails: bool,
    pub captions: bool,
    pub descriptions: bool,
    pub metadata: bool,
    pub dependent: bool,
    pub still_image: bool,
}

impl Disposition {
    /// Flags in report order
    pub fn entries(&self) -> [(&'static str, bool); 17] {
        [
            ("default", self.default),
            ("dub", self.dub),
            ("original", self.original),
            ("comment", self.comment),
            ("lyrics", self.lyrics),
            ("karaoke", self.karaoke),
            ("forced", self.forced),
            ("hearing_impaired", self.hearing_impaired),
            ("visual_impaired", self.visual_impaired),
            ("clean_effects", self.clean_effects),
            ("attached_pic", self.attached_pic),
            ("timed_thumbnails", self.timed_thumbnails),
            ("captions", self.captions),
            ("descriptions", self.descriptions),
            ("metadata", self.metadata),
            ("dependent", self.dependent),
            ("still_image", self.still_image),
        ]
    }
}

/// Properties only known once a decoder has been opened for the stream
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderProps {
    pub coded_width: i32,
    pub coded_height: i32,
    pub closed_captions: bool,
    pub film_grain: bool,
    pub refs: i32,
    pub max_bit_rate: i64,
    pub bits_per_raw_sample: i32,
}

/// Video-specific codec parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoParams {
    pub width: i32,
    pub height: i32,
    pub has_b_frames: i32,
    pub sample_aspect_ratio: Option<Rational>,
    pub pix_fmt: Option<String>,
    pub level: i32,
    pub color_range: Option<String>,
    pub color_space: Option<String>,
    pub color_transfer: Option<String>,
    pub color_primaries: Option<String>,
    pub chroma_location: Option<String>,
    pub field_order: FieldOrder,
}

impl VideoParams {
    /// Display aspect ratio derived from the frame size and sample aspect ratio
    pub fn display_aspect_ratio(&self) -> Option<Rational> {
        let sar = self.sample_aspect_ratio.filter(|sar| sar.num != 0)?;
        let (dar, _) = Rational::reduce(
            self.width as i64 * sar.num as i64,
            self.height as i64 * sar.den as i64,
            1024 * 1024,
        );
        Some(dar)
    }
}

/// Audio-specific codec parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioParams {
    pub sample_fmt: Option<String>,
    pub sample_rate: i32,
    pub channels: i32,
    pub channel_layout: Option<String>,
    pub bits_per_sample: i32,
}

/// Subtitle-specific codec parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleParams {
    pub width: i32,
    pub height: i32,
}

/// Media-type dependent parameters of a stream
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "codec_type", rename_all = "lowercase")]
pub enum MediaParams {
    Video(VideoParams),
    Audio(AudioParams),
    Subtitle(SubtitleParams),
    Data,
    Attachment,
    #[default]
    Unknown,
}

impl MediaParams {
    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            MediaParams::Video(_) => Some(MediaType::Video),
            MediaParams::Audio(_) => Some(MediaType::Audio),
            MediaParams::Subtitle(_) => Some(MediaType::Subtitle),
            MediaParams::Data => Some(MediaType::Data),
            MediaParams::Attachment => Some(MediaType::Attachment),
            MediaParams::Unknown => None,
        }
    }
}

fn nopts() -> i64 {
    NOPTS_VALUE
}

fn unknown_profile() -> i32 {
    PROFILE_UNKNOWN
}

/// One elementary stream of the container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub index: i32,
    /// Format-specific stream id, only meaningful when the format shows ids
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default)]
    pub codec_long_name: Option<String>,
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default = "unknown_profile")]
    pub profile: i32,
    #[serde(default)]
    pub codec_tag: u32,
    #[serde(flatten)]
    pub params: MediaParams,
    #[serde(default)]
    pub decoder: Option<DecoderProps>,
    #[serde(default)]
    pub r_frame_rate: Rational,
    #[serde(default)]
    pub avg_frame_rate: Rational,
    #[serde(default)]
    pub time_base: Rational,
    #[serde(default = "nopts")]
    pub start_time: i64,
    #[serde(default = "nopts")]
    pub duration: i64,
    #[serde(default)]
    pub bit_rate: i64,
    #[serde(default)]
    pub nb_frames: i64,
    #[serde(default)]
    pub nb_read_frames: u64,
    #[serde(default)]
    pub nb_read_packets: u64,
    #[serde(default)]
    pub extradata: Vec<u8>,
    #[serde(default)]
    pub disposition: Disposition,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub side_data: Vec<SideData>,
}

impl StreamInfo {
    /// Create an empty stream description of the given kind
    pub fn new(index: i32, params: MediaParams) -> Self {
        Self {
            index,
            id: 0,
            codec_name: None,
            codec_long_name: None,
            profile_name: None,
            profile: PROFILE_UNKNOWN,
            codec_tag: 0,
            params,
            decoder: None,
            r_frame_rate: Rational::new(0, 1),
            avg_frame_rate: Rational::new(0, 1),
            time_base: Rational::new(1, 1),
            start_time: NOPTS_VALUE,
            duration: NOPTS_VALUE,
            bit_rate: 0,
            nb_frames: 0,
            nb_read_frames: 0,
            nb_read_packets: 0,
            extradata: Vec::new(),
            disposition: Disposition::default(),
            tags: Tags::new(),
            side_data: Vec::new(),
        }
    }

    pub fn media_type(&self) -> Option<MediaType> {
        self.params.media_type()
    }

    /// Frame width for streams that have one
    pub fn width(&self) -> i32 {
        match &self.params {
            MediaParams::Video(video) => video.width,
            MediaParams::Subtitle(subtitle) => subtitle.width,
            _ => 0,
        }
    }

    /// Frame height for streams that have one
    pub fn height(&self) -> i32 {
        match &self.params {
            MediaParams::Video(video) => video.height,
            MediaParams::Subtitle(subtitle) => subtitle.height,
            _ => 0,
        }
    }
}

/// Container-level information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    #[serde(default)]
    pub filename: RawText,
    #[serde(default)]
    pub nb_programs: u32,
    pub format_name: String,
    #[serde(default)]
    pub format_long_name: Option<String>,
    #[serde(default = "nopts")]
    pub start_time: i64,
    #[serde(default = "nopts")]
    pub duration: i64,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub bit_rate: i64,
    #[serde(default)]
    pub probe_score: i32,
    /// Whether the container format exposes native stream ids
    #[serde(default)]
    pub show_ids: bool,
    #[serde(default)]
    pub tags: Tags,
}

impl FormatInfo {
    pub fn new(filename: impl Into<RawText>, format_name: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            nb_programs: 0,
            format_name: format_name.into(),
            format_long_name: None,
            start_time: NOPTS_VALUE,
            duration: NOPTS_VALUE,
            size: None,
            bit_rate: 0,
            probe_score: 0,
            show_ids: false,
            tags: Tags::new(),
        }
    }
}

/// Complete description of a probed container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub format: FormatInfo,
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
}

impl MediaInfo {
    pub fn new(format: FormatInfo, streams: Vec<StreamInfo>) -> Self {
        Self { format, streams }
    }

    /// Total number of streams
    pub fn total_streams(&self) -> usize {
        self.streams.len()
    }

    /// Total number of side-data records across all streams
    pub fn total_side_data(&self) -> usize {
        self.streams.iter().map(|s| s.side_data.len()).sum()
    }
}

#[cfg(test)]
mod tests;
