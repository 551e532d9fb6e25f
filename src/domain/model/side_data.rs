//! Tag-discriminated side-data records attached to streams

use serde::{Deserialize, Serialize};

use super::Rational;

/// Stereoscopic packing of a video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stereo3dType {
    TwoD,
    SideBySide,
    TopBottom,
    FrameSequence,
    Checkerboard,
    SideBySideQuincunx,
    Lines,
    Columns,
    Unspecified,
    Unknown,
}

impl Stereo3dType {
    /// Map a raw libavutil stereo type value
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => Stereo3dType::TwoD,
            1 => Stereo3dType::SideBySide,
            2 => Stereo3dType::TopBottom,
            3 => Stereo3dType::FrameSequence,
            4 => Stereo3dType::Checkerboard,
            5 => Stereo3dType::SideBySideQuincunx,
            6 => Stereo3dType::Lines,
            7 => Stereo3dType::Columns,
            8 => Stereo3dType::Unspecified,
            _ => Stereo3dType::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stereo3dType::TwoD => "2D",
            Stereo3dType::SideBySide => "side by side",
            Stereo3dType::TopBottom => "top and bottom",
            Stereo3dType::FrameSequence => "frame alternate",
            Stereo3dType::Checkerboard => "checkerboard",
            Stereo3dType::SideBySideQuincunx => "side by side (quincunx subsampling)",
            Stereo3dType::Lines => "interleaved lines",
            Stereo3dType::Columns => "interleaved columns",
            Stereo3dType::Unspecified => "unspecified",
            Stereo3dType::Unknown => "unknown",
        }
    }
}

/// Projection of a spherical (360 degree) video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SphericalProjection {
    Equirectangular,
    Cubemap,
    EquirectangularTile,
    HalfEquirectangular,
    Rectilinear,
    Fisheye,
    Unknown,
}

impl SphericalProjection {
    /// Map a raw libavutil projection value
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => SphericalProjection::Equirectangular,
            1 => SphericalProjection::Cubemap,
            2 => SphericalProjection::EquirectangularTile,
            3 => SphericalProjection::HalfEquirectangular,
            4 => SphericalProjection::Rectilinear,
            5 => SphericalProjection::Fisheye,
            _ => SphericalProjection::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SphericalProjection::Equirectangular => "equirectangular",
            SphericalProjection::Cubemap => "cubemap",
            SphericalProjection::EquirectangularTile => "tiled equirectangular",
            SphericalProjection::HalfEquirectangular => "half equirectangular",
            SphericalProjection::Rectilinear => "rectilinear",
            SphericalProjection::Fisheye => "fisheye",
            SphericalProjection::Unknown => "unknown",
        }
    }
}

/// Spherical mapping; angles are 16.16 fixed point, bounds 0.32 fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SphericalMapping {
    pub projection: SphericalProjection,
    #[serde(default)]
    pub yaw: i32,
    #[serde(default)]
    pub pitch: i32,
    #[serde(default)]
    pub roll: i32,
    #[serde(default)]
    pub bound_left: u32,
    #[serde(default)]
    pub bound_top: u32,
    #[serde(default)]
    pub bound_right: u32,
    #[serde(default)]
    pub bound_bottom: u32,
    #[serde(default)]
    pub padding: u32,
}

impl SphericalMapping {
    /// Tile bounds in pixels as (left, top, right, bottom) for a frame size
    pub fn tile_bounds(&self, width: i32, height: i32) -> (i64, i64, i64, i64) {
        const FULL: u128 = u32::MAX as u128;
        let width = width.max(0) as u128;
        let height = height.max(0) as u128;

        let span_x = u32::MAX
            .wrapping_sub(self.bound_right)
            .wrapping_sub(self.bound_left) as u128;
        let span_y = u32::MAX
            .wrapping_sub(self.bound_bottom)
            .wrapping_sub(self.bound_top) as u128;
        if span_x == 0 || span_y == 0 {
            return (0, 0, 0, 0);
        }

        let orig_width = width * FULL / span_x;
        let orig_height = height * FULL / span_y;

        let left = (orig_width * self.bound_left as u128 + FULL - 1) / FULL;
        let top = (orig_height * self.bound_top as u128 + FULL - 1) / FULL;
        let right = orig_width as i128 - width as i128 - left as i128;
        let bottom = orig_height as i128 - height as i128 - top as i128;

        (left as i64, top as i64, right as i64, bottom as i64)
    }

    /// Whole degrees of a 16.16 angle, truncated toward zero
    pub fn degrees(angle: i32) -> i64 {
        (angle as f64 / 65536.0) as i64
    }
}

/// Color volume of the mastering display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPrimaries {
    pub red: [Rational; 2],
    pub green: [Rational; 2],
    pub blue: [Rational; 2],
    pub white_point: [Rational; 2],
}

/// Luminance range of the mastering display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Luminance {
    pub min: Rational,
    pub max: Rational,
}

/// SMPTE 2086 mastering display metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MasteringDisplayMetadata {
    pub primaries: Option<DisplayPrimaries>,
    pub luminance: Option<Luminance>,
}

/// Dolby Vision decoder configuration record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DoviConfig {
    pub dv_version_major: u8,
    pub dv_version_minor: u8,
    pub dv_profile: u8,
    pub dv_level: u8,
    pub rpu_present_flag: u8,
    pub el_present_flag: u8,
    pub bl_present_flag: u8,
    pub dv_bl_signal_compatibility_id: u8,
}

/// Coded picture buffer properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CpbProperties {
    pub max_bitrate: i64,
    pub min_bitrate: i64,
    pub avg_bitrate: i64,
    pub buffer_size: i64,
    pub vbv_delay: u64,
}

/// Side-data record attached to a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SideData {
    DisplayMatrix {
        matrix: [i32; 9],
    },
    Stereo3d {
        kind: Stereo3dType,
        #[serde(default)]
        inverted: bool,
    },
    Spherical(SphericalMapping),
    SkipSamples {
        skip_samples: u32,
        discard_padding: u32,
        skip_reason: u8,
        discard_reason: u8,
    },
    MasteringDisplay(MasteringDisplayMetadata),
    ContentLightLevel {
        max_content: u32,
        max_average: u32,
    },
    DoviConfig(DoviConfig),
    AudioServiceType {
        service_type: i32,
    },
    MpegTsStreamId {
        id: u8,
    },
    CpbProperties(CpbProperties),
    WebVttIdentifier {
        data: Vec<u8>,
    },
    WebVttSettings {
        data: Vec<u8>,
    },
    ActiveFormat {
        active_format: u8,
    },
    /// Record without a specific rendering, or too short to decode
    Other {
        #[serde(default)]
        name: Option<String>,
    },
}

impl SideData {
    /// Type name as reported in `side_data_type`
    pub fn type_name(&self) -> &str {
        match self {
            SideData::DisplayMatrix { .. } => "Display Matrix",
            SideData::Stereo3d { .. } => "Stereo 3D",
            SideData::Spherical(_) => "Spherical Mapping",
            SideData::SkipSamples { .. } => "Skip Samples",
            SideData::MasteringDisplay(_) => "Mastering display metadata",
            SideData::ContentLightLevel { .. } => "Content light level metadata",
            SideData::DoviConfig(_) => "DOVI configuration record",
            SideData::AudioServiceType { .. } => "Audio service type",
            SideData::MpegTsStreamId { .. } => "MPEGTS Stream ID",
            SideData::CpbProperties(_) => "CPB properties",
            SideData::WebVttIdentifier { .. } => "WebVTT ID",
            SideData::WebVttSettings { .. } => "WebVTT Settings",
            SideData::ActiveFormat { .. } => "Active format description",
            SideData::Other { name } => name.as_deref().unwrap_or("unknown"),
        }
    }

    /// Decode a display matrix payload (nine host-order 32-bit integers)
    pub fn display_matrix_from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 9 * 4 {
            return None;
        }
        let mut matrix = [0i32; 9];
        for (value, chunk) in matrix.iter_mut().zip(data.chunks_exact(4)) {
            *value = i32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Some(SideData::DisplayMatrix { matrix })
    }

    /// Decode a skip-samples payload (exactly ten little-endian bytes)
    pub fn skip_samples_from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() != 10 {
            return None;
        }
        Some(SideData::SkipSamples {
            skip_samples: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            discard_padding: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            skip_reason: data[8],
            discard_reason: data[9],
        })
    }
}

/// Raw bytes of a display matrix in host order
pub fn display_matrix_bytes(matrix: &[i32; 9]) -> Vec<u8> {
    matrix.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

/// Counter-clockwise rotation in degrees encoded by a display matrix.
///
/// NaN when the matrix has a degenerate scale.
pub fn display_rotation(matrix: &[i32; 9]) -> f64 {
    let fixed = |v: i32| v as f64 / 65536.0;
    let scale_x = fixed(matrix[0]).hypot(fixed(matrix[3]));
    let scale_y = fixed(matrix[1]).hypot(fixed(matrix[4]));
    if scale_x == 0.0 || scale_y == 0.0 {
        return f64::NAN;
    }
    let rotation =
        (fixed(matrix[1]) / scale_y).atan2(fixed(matrix[0]) / scale_x) * 180.0 / std::f64::consts::PI;
    -rotation
}
