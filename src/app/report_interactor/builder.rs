//! Report builder
//!
//! Walks a [`MediaInfo`] and drives a [`ReportWriter`] through the `streams`
//! and `format` sections, emitting fields in catalog order.

use tracing::{debug, error, warn};

use crate::domain::model::*;
use crate::error::ReportResult;
use crate::output::formatter::{codec_tag_hex, fourcc, NOT_AVAILABLE};
use crate::output::{Backend, IntegerLayout, ReportWriter, SectionId};

/// Label shown when a name cannot be resolved
const UNKNOWN: &str = "unknown";

/// Render the whole document and end the report.
///
/// On failure the open sections are closed and the report is ended before
/// the error is returned, so the output stays well-formed.
pub fn render_report<B: Backend>(
    w: &mut ReportWriter<B>,
    media: &MediaInfo,
    show_data: bool,
) -> ReportResult<()> {
    let body = show_streams(w, media, show_data).and_then(|_| show_format(w, media));

    if let Err(e) = body {
        if e.is_structural() {
            error!("Report builder misused the section catalog: {}", e);
        } else {
            warn!("Report aborted at depth {}: {}", w.depth(), e);
        }
        w.close_all()?;
        w.end_report()?;
        return Err(e);
    }
    w.end_report()
}

/// The `streams` array, one element per stream
pub fn show_streams<B: Backend>(
    w: &mut ReportWriter<B>,
    media: &MediaInfo,
    show_data: bool,
) -> ReportResult<()> {
    if !w.is_shown(SectionId::Streams) {
        return Ok(());
    }
    w.open_section(SectionId::Streams)?;
    for stream in &media.streams {
        show_stream(w, &media.format, stream, show_data)?;
    }
    w.close_section()
}

pub fn show_stream<B: Backend>(
    w: &mut ReportWriter<B>,
    format: &FormatInfo,
    stream: &StreamInfo,
    show_data: bool,
) -> ReportResult<()> {
    debug!("Rendering stream #{}", stream.index);
    w.open_section(SectionId::Stream)?;

    w.emit_int("index", stream.index as i64)?;
    match &stream.codec_name {
        Some(name) => {
            w.emit_str("codec_name", name)?;
            w.emit_str(
                "codec_long_name",
                stream.codec_long_name.as_deref().unwrap_or(UNKNOWN),
            )?;
        }
        None => {
            w.emit_str_opt("codec_name", UNKNOWN)?;
            w.emit_str_opt("codec_long_name", UNKNOWN)?;
        }
    }
    match (&stream.profile_name, stream.profile) {
        (Some(name), _) => w.emit_str("profile", name)?,
        (None, PROFILE_UNKNOWN) => w.emit_str_opt("profile", UNKNOWN)?,
        (None, profile) => w.emit_str("profile", &profile.to_string())?,
    }
    match stream.media_type() {
        Some(kind) => w.emit_str("codec_type", kind.name())?,
        None => w.emit_str_opt("codec_type", UNKNOWN)?,
    }
    w.emit_str("codec_tag_string", &fourcc(stream.codec_tag))?;
    w.emit_str("codec_tag", &codec_tag_hex(stream.codec_tag))?;

    match &stream.params {
        MediaParams::Video(video) => show_video_params(w, video, stream.decoder.as_ref())?,
        MediaParams::Audio(audio) => show_audio_params(w, audio)?,
        MediaParams::Subtitle(subtitle) => {
            nonzero_or_na(w, "width", subtitle.width as i64)?;
            nonzero_or_na(w, "height", subtitle.height as i64)?;
        }
        _ => {}
    }

    if format.show_ids {
        w.emit_str("id", &format!("0x{:x}", stream.id))?;
    } else {
        w.emit_str_opt("id", NOT_AVAILABLE)?;
    }
    w.emit_q("r_frame_rate", stream.r_frame_rate, '/')?;
    w.emit_q("avg_frame_rate", stream.avg_frame_rate, '/')?;
    w.emit_q("time_base", stream.time_base, '/')?;
    w.emit_ts("start_pts", stream.start_time, false)?;
    w.emit_time("start_time", stream.start_time, stream.time_base, false)?;
    w.emit_ts("duration_ts", stream.duration, false)?;
    w.emit_time("duration", stream.duration, stream.time_base, false)?;

    let decoder = stream.decoder.as_ref();
    positive_unit_or_na(w, "bit_rate", stream.bit_rate)?;
    positive_unit_or_na(w, "max_bit_rate", decoder.map_or(0, |d| d.max_bit_rate))?;
    positive_text_or_na(
        w,
        "bits_per_raw_sample",
        decoder.map_or(0, |d| d.bits_per_raw_sample as i64),
    )?;
    nonzero_text_or_na(w, "nb_frames", stream.nb_frames)?;
    nonzero_text_or_na(w, "nb_read_frames", stream.nb_read_frames as i64)?;
    nonzero_text_or_na(w, "nb_read_packets", stream.nb_read_packets as i64)?;

    if show_data {
        w.emit_data("extradata", &stream.extradata)?;
    }
    if !stream.extradata.is_empty() {
        w.emit_int("extradata_size", stream.extradata.len() as i64)?;
        w.emit_data_hash("extradata_hash", &stream.extradata)?;
    }

    if w.is_shown(SectionId::StreamDisposition) {
        w.open_section(SectionId::StreamDisposition)?;
        for (key, set) in stream.disposition.entries() {
            w.emit_int(key, set as i64)?;
        }
        w.close_section()?;
    }

    // A failing tag still lets the side data through; its error is reported
    // once the stream is closed
    let tagged = show_tags(w, &stream.tags, SectionId::StreamTags);

    if !stream.side_data.is_empty() && w.is_shown(SectionId::StreamSideDataList) {
        w.open_section(SectionId::StreamSideDataList)?;
        for side_data in &stream.side_data {
            print_side_data(w, stream, side_data, show_data)?;
        }
        w.close_section()?;
    }

    w.close_section()?;
    tagged
}

fn show_video_params<B: Backend>(
    w: &mut ReportWriter<B>,
    video: &VideoParams,
    decoder: Option<&DecoderProps>,
) -> ReportResult<()> {
    w.emit_int("width", video.width as i64)?;
    w.emit_int("height", video.height as i64)?;
    if let Some(decoder) = decoder {
        w.emit_int("coded_width", decoder.coded_width as i64)?;
        w.emit_int("coded_height", decoder.coded_height as i64)?;
        w.emit_int("closed_captions", decoder.closed_captions as i64)?;
        w.emit_int("film_grain", decoder.film_grain as i64)?;
    }
    w.emit_int("has_b_frames", video.has_b_frames as i64)?;

    match (video.sample_aspect_ratio, video.display_aspect_ratio()) {
        (Some(sar), Some(dar)) => {
            w.emit_q("sample_aspect_ratio", sar, ':')?;
            w.emit_q("display_aspect_ratio", dar, ':')?;
        }
        _ => {
            w.emit_str_opt("sample_aspect_ratio", NOT_AVAILABLE)?;
            w.emit_str_opt("display_aspect_ratio", NOT_AVAILABLE)?;
        }
    }

    name_or_unknown(w, "pix_fmt", video.pix_fmt.as_deref())?;
    w.emit_int("level", video.level as i64)?;
    name_or_unknown(w, "color_range", video.color_range.as_deref())?;
    name_or_unknown(w, "color_space", video.color_space.as_deref())?;
    name_or_unknown(w, "color_transfer", video.color_transfer.as_deref())?;
    name_or_unknown(w, "color_primaries", video.color_primaries.as_deref())?;
    name_or_unknown(w, "chroma_location", video.chroma_location.as_deref())?;
    name_or_unknown(w, "field_order", video.field_order.name())?;
    if let Some(decoder) = decoder {
        w.emit_int("refs", decoder.refs as i64)?;
    }
    Ok(())
}

fn show_audio_params<B: Backend>(w: &mut ReportWriter<B>, audio: &AudioParams) -> ReportResult<()> {
    name_or_unknown(w, "sample_fmt", audio.sample_fmt.as_deref())?;
    w.emit_unit_value("sample_rate", audio.sample_rate as i64)?;
    w.emit_int("channels", audio.channels as i64)?;
    name_or_unknown(w, "channel_layout", audio.channel_layout.as_deref())?;
    w.emit_int("bits_per_sample", audio.bits_per_sample as i64)
}

/// The `format` object
pub fn show_format<B: Backend>(w: &mut ReportWriter<B>, media: &MediaInfo) -> ReportResult<()> {
    if !w.is_shown(SectionId::Format) {
        return Ok(());
    }
    let format = &media.format;
    w.open_section(SectionId::Format)?;

    w.emit_str_validate("filename", format.filename.as_bytes())?;
    w.emit_int("nb_streams", media.total_streams() as i64)?;
    w.emit_int("nb_programs", format.nb_programs as i64)?;
    w.emit_str("format_name", &format.format_name)?;
    match &format.format_long_name {
        Some(name) => w.emit_str("format_long_name", name)?,
        None => w.emit_str_opt("format_long_name", UNKNOWN)?,
    }
    w.emit_time("start_time", format.start_time, TIME_BASE_Q, false)?;
    w.emit_time("duration", format.duration, TIME_BASE_Q, true)?;
    match format.size {
        Some(size) if size >= 0 => w.emit_unit_value("size", size)?,
        _ => w.emit_str_opt("size", NOT_AVAILABLE)?,
    }
    positive_unit_or_na(w, "bit_rate", format.bit_rate)?;
    w.emit_int("probe_score", format.probe_score as i64)?;

    let tagged = show_tags(w, &format.tags, SectionId::FormatTags);
    w.close_section()?;
    tagged
}

/// A tags section holding every metadata entry, skipped when there is none.
///
/// A failing entry stops the listing; the section is still closed before the
/// error is returned.
pub fn show_tags<B: Backend>(
    w: &mut ReportWriter<B>,
    tags: &Tags,
    id: SectionId,
) -> ReportResult<()> {
    if tags.is_empty() || !w.is_shown(id) {
        return Ok(());
    }
    w.open_section(id)?;
    let listed = tags
        .iter()
        .try_for_each(|tag| w.emit_tag(tag.key.as_bytes(), tag.value.as_bytes()));
    w.close_section()?;
    listed
}

/// One element of a stream's `side_data_list`
pub fn print_side_data<B: Backend>(
    w: &mut ReportWriter<B>,
    stream: &StreamInfo,
    side_data: &SideData,
    show_data: bool,
) -> ReportResult<()> {
    w.open_section(SectionId::StreamSideData)?;
    w.emit_str("side_data_type", side_data.type_name())?;

    match side_data {
        SideData::DisplayMatrix { matrix } => {
            let rotation = display_rotation(matrix);
            let rotation = if rotation.is_nan() { 0.0 } else { rotation };
            w.emit_integers(
                "displaymatrix",
                &display_matrix_bytes(matrix),
                9,
                IntegerLayout::DISPLAY_MATRIX,
            )?;
            w.emit_int("rotation", rotation as i64)?;
        }
        SideData::Stereo3d { kind, inverted } => {
            w.emit_str("type", kind.name())?;
            w.emit_int("inverted", *inverted as i64)?;
        }
        SideData::Spherical(mapping) => {
            w.emit_str("projection", mapping.projection.name())?;
            match mapping.projection {
                SphericalProjection::Cubemap => w.emit_int("padding", mapping.padding as i64)?,
                SphericalProjection::EquirectangularTile => {
                    let (left, top, right, bottom) =
                        mapping.tile_bounds(stream.width(), stream.height());
                    w.emit_int("bound_left", left)?;
                    w.emit_int("bound_top", top)?;
                    w.emit_int("bound_right", right)?;
                    w.emit_int("bound_bottom", bottom)?;
                }
                _ => {}
            }
            w.emit_int("yaw", SphericalMapping::degrees(mapping.yaw))?;
            w.emit_int("pitch", SphericalMapping::degrees(mapping.pitch))?;
            w.emit_int("roll", SphericalMapping::degrees(mapping.roll))?;
        }
        SideData::SkipSamples {
            skip_samples,
            discard_padding,
            skip_reason,
            discard_reason,
        } => {
            w.emit_int("skip_samples", *skip_samples as i64)?;
            w.emit_int("discard_padding", *discard_padding as i64)?;
            w.emit_int("skip_reason", *skip_reason as i64)?;
            w.emit_int("discard_reason", *discard_reason as i64)?;
        }
        SideData::MasteringDisplay(metadata) => {
            if let Some(primaries) = &metadata.primaries {
                for (name, point) in [
                    ("red", primaries.red),
                    ("green", primaries.green),
                    ("blue", primaries.blue),
                    ("white_point", primaries.white_point),
                ] {
                    w.emit_q(&format!("{}_x", name), point[0], '/')?;
                    w.emit_q(&format!("{}_y", name), point[1], '/')?;
                }
            }
            if let Some(luminance) = &metadata.luminance {
                w.emit_q("min_luminance", luminance.min, '/')?;
                w.emit_q("max_luminance", luminance.max, '/')?;
            }
        }
        SideData::ContentLightLevel {
            max_content,
            max_average,
        } => {
            w.emit_int("max_content", *max_content as i64)?;
            w.emit_int("max_average", *max_average as i64)?;
        }
        SideData::DoviConfig(dovi) => {
            w.emit_int("dv_version_major", dovi.dv_version_major as i64)?;
            w.emit_int("dv_version_minor", dovi.dv_version_minor as i64)?;
            w.emit_int("dv_profile", dovi.dv_profile as i64)?;
            w.emit_int("dv_level", dovi.dv_level as i64)?;
            w.emit_int("rpu_present_flag", dovi.rpu_present_flag as i64)?;
            w.emit_int("el_present_flag", dovi.el_present_flag as i64)?;
            w.emit_int("bl_present_flag", dovi.bl_present_flag as i64)?;
            w.emit_int(
                "dv_bl_signal_compatibility_id",
                dovi.dv_bl_signal_compatibility_id as i64,
            )?;
        }
        SideData::AudioServiceType { service_type } => {
            w.emit_int("service_type", *service_type as i64)?;
        }
        SideData::MpegTsStreamId { id } => w.emit_int("id", *id as i64)?,
        SideData::CpbProperties(cpb) => {
            w.emit_int("max_bitrate", cpb.max_bitrate)?;
            w.emit_int("min_bitrate", cpb.min_bitrate)?;
            w.emit_int("avg_bitrate", cpb.avg_bitrate)?;
            w.emit_int("buffer_size", cpb.buffer_size)?;
            w.emit_int("vbv_delay", cpb.vbv_delay as i64)?;
        }
        SideData::WebVttIdentifier { data } | SideData::WebVttSettings { data } => {
            if show_data {
                w.emit_data("data", data)?;
            }
            w.emit_data_hash("data_hash", data)?;
        }
        SideData::ActiveFormat { active_format } => {
            w.emit_int("active_format", *active_format as i64)?;
        }
        SideData::Other { .. } => {}
    }

    w.close_section()
}

fn name_or_unknown<B: Backend>(
    w: &mut ReportWriter<B>,
    key: &str,
    name: Option<&str>,
) -> ReportResult<()> {
    match name {
        Some(name) => w.emit_str(key, name),
        None => w.emit_str_opt(key, UNKNOWN),
    }
}

fn nonzero_or_na<B: Backend>(w: &mut ReportWriter<B>, key: &str, value: i64) -> ReportResult<()> {
    if value != 0 {
        w.emit_int(key, value)
    } else {
        w.emit_str_opt(key, NOT_AVAILABLE)
    }
}

fn nonzero_text_or_na<B: Backend>(
    w: &mut ReportWriter<B>,
    key: &str,
    value: i64,
) -> ReportResult<()> {
    if value != 0 {
        w.emit_str(key, &value.to_string())
    } else {
        w.emit_str_opt(key, NOT_AVAILABLE)
    }
}

fn positive_text_or_na<B: Backend>(
    w: &mut ReportWriter<B>,
    key: &str,
    value: i64,
) -> ReportResult<()> {
    if value > 0 {
        w.emit_str(key, &value.to_string())
    } else {
        w.emit_str_opt(key, NOT_AVAILABLE)
    }
}

fn positive_unit_or_na<B: Backend>(
    w: &mut ReportWriter<B>,
    key: &str,
    value: i64,
) -> ReportResult<()> {
    if value > 0 {
        w.emit_unit_value(key, value)
    } else {
        w.emit_str_opt(key, NOT_AVAILABLE)
    }
}
