// Probe LibAV adapter - Media file analysis using libav

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use async_trait::async_trait;
use ffmpeg_next::ffi;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::Path;
use tracing::{debug, info, warn};

/// LibAV-based media probing adapter
pub struct ProbeLibavAdapter;

impl ProbeLibavAdapter {
    /// Create new LibAV probing adapter
    pub fn new() -> Result<Self, DomainError> {
        ffmpeg_next::init()
            .map_err(|e| DomainError::ProbeFail(format!("FFmpeg initialization failed: {}", e)))?;
        Ok(Self)
    }

    /// Open the container and map it into a media description
    fn probe_blocking(file_path: &str) -> Result<MediaInfo, DomainError> {
        let ictx = ffmpeg_next::format::input(&file_path)
            .map_err(|e| DomainError::ProbeFail(format!("Failed to open '{}': {}", file_path, e)))?;

        let format_ctx = unsafe { &*ictx.as_ptr() };
        let input_format = ictx.format();
        let show_ids = input_format_shows_ids(format_ctx);

        let mut format = FormatInfo::new(file_path, input_format.name());
        format.format_long_name = Some(input_format.description().to_string());
        format.nb_programs = format_ctx.nb_programs;
        format.start_time = format_ctx.start_time;
        format.duration = ictx.duration();
        format.bit_rate = ictx.bit_rate();
        format.probe_score = format_ctx.probe_score;
        format.show_ids = show_ids;
        format.size = std::fs::metadata(file_path).ok().map(|m| m.len() as i64);
        format.tags = map_tags(ictx.metadata().iter());

        let streams = ictx
            .streams()
            .map(|stream| map_stream(&stream))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MediaInfo::new(format, streams))
    }
}

fn input_format_shows_ids(format_ctx: &ffi::AVFormatContext) -> bool {
    if format_ctx.iformat.is_null() {
        return false;
    }
    let flags = unsafe { (*format_ctx.iformat).flags };
    flags & ffi::AVFMT_SHOW_IDS as i32 != 0
}

fn c_name(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

fn rational(q: ffi::AVRational) -> Rational {
    Rational::new(q.num, q.den)
}

fn map_tags<'a>(entries: impl Iterator<Item = (&'a str, &'a str)>) -> Tags {
    let mut tags = Tags::new();
    for (key, value) in entries {
        tags.insert(key, value);
    }
    tags
}

fn map_stream(stream: &ffmpeg_next::format::stream::Stream) -> Result<StreamInfo, DomainError> {
    let st = unsafe { &*stream.as_ptr() };
    let par = unsafe { &*st.codecpar };
    let codec_id = par.codec_id;

    let params = match stream.parameters().medium() {
        ffmpeg_next::media::Type::Video => MediaParams::Video(video_params(par)),
        ffmpeg_next::media::Type::Audio => MediaParams::Audio(audio_params(par)),
        ffmpeg_next::media::Type::Subtitle => MediaParams::Subtitle(SubtitleParams {
            width: par.width,
            height: par.height,
        }),
        ffmpeg_next::media::Type::Data => MediaParams::Data,
        ffmpeg_next::media::Type::Attachment => MediaParams::Attachment,
        _ => MediaParams::Unknown,
    };

    let mut info = StreamInfo::new(stream.index() as i32, params);
    info.id = st.id;

    let descriptor = unsafe { ffi::avcodec_descriptor_get(codec_id) };
    if !descriptor.is_null() {
        let descriptor = unsafe { &*descriptor };
        info.codec_name = c_name(descriptor.name);
        info.codec_long_name = c_name(descriptor.long_name);
    }
    info.profile = par.profile;
    info.profile_name = c_name(unsafe { ffi::avcodec_profile_name(codec_id, par.profile) });
    info.codec_tag = par.codec_tag;
    info.decoder = decoder_props(stream);

    info.r_frame_rate = rational(st.r_frame_rate);
    info.avg_frame_rate = rational(st.avg_frame_rate);
    info.time_base = rational(st.time_base);
    info.start_time = st.start_time;
    info.duration = st.duration;
    info.bit_rate = par.bit_rate;
    info.nb_frames = st.nb_frames;
    if !par.extradata.is_null() && par.extradata_size > 0 {
        info.extradata =
            unsafe { std::slice::from_raw_parts(par.extradata, par.extradata_size as usize) }
                .to_vec();
    }
    info.disposition = map_disposition(st.disposition);
    info.tags = map_tags(stream.metadata().iter());
    info.side_data = coded_side_data(par, info.index);

    debug!(
        "Mapped stream #{} ({})",
        info.index,
        info.codec_name.as_deref().unwrap_or("unknown")
    );
    Ok(info)
}

fn video_params(par: &ffi::AVCodecParameters) -> VideoParams {
    let sar = rational(par.sample_aspect_ratio);
    unsafe {
        VideoParams {
            width: par.width,
            height: par.height,
            has_b_frames: par.video_delay,
            sample_aspect_ratio: (sar.num != 0).then_some(sar),
            pix_fmt: c_name(ffi::av_get_pix_fmt_name(std::mem::transmute::<i32, ffi::AVPixelFormat>(
                par.format,
            ))),
            level: par.level,
            color_range: c_name(ffi::av_color_range_name(par.color_range)),
            color_space: c_name(ffi::av_color_space_name(par.color_space)),
            color_transfer: c_name(ffi::av_color_transfer_name(par.color_trc)),
            color_primaries: c_name(ffi::av_color_primaries_name(par.color_primaries)),
            chroma_location: c_name(ffi::av_chroma_location_name(par.chroma_location)),
            field_order: match par.field_order {
                ffi::AVFieldOrder::AV_FIELD_PROGRESSIVE => FieldOrder::Progressive,
                ffi::AVFieldOrder::AV_FIELD_TT => FieldOrder::Tt,
                ffi::AVFieldOrder::AV_FIELD_BB => FieldOrder::Bb,
                ffi::AVFieldOrder::AV_FIELD_TB => FieldOrder::Tb,
                ffi::AVFieldOrder::AV_FIELD_BT => FieldOrder::Bt,
                _ => FieldOrder::Unknown,
            },
        }
    }
}

fn audio_params(par: &ffi::AVCodecParameters) -> AudioParams {
    let mut layout = [0 as c_char; 128];
    let described = unsafe {
        ffi::av_channel_layout_describe(&par.ch_layout, layout.as_mut_ptr(), layout.len())
    };
    let channel_layout = if described > 0 && par.ch_layout.order != ffi::AVChannelOrder::AV_CHANNEL_ORDER_UNSPEC {
        c_name(layout.as_ptr())
    } else {
        None
    };

    unsafe {
        AudioParams {
            sample_fmt: c_name(ffi::av_get_sample_fmt_name(std::mem::transmute::<
                i32,
                ffi::AVSampleFormat,
            >(par.format))),
            sample_rate: par.sample_rate,
            channels: par.ch_layout.nb_channels,
            channel_layout,
            bits_per_sample: ffi::av_get_bits_per_sample(par.codec_id),
        }
    }
}

/// Open a decoder to read the properties only a codec context knows
fn decoder_props(stream: &ffmpeg_next::format::stream::Stream) -> Option<DecoderProps> {
    let context = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| warn!("Cannot create codec context for stream #{}: {}", stream.index(), e))
        .ok()?;
    let ctx = unsafe { &*context.as_ptr() };
    Some(DecoderProps {
        coded_width: ctx.coded_width,
        coded_height: ctx.coded_height,
        closed_captions: ctx.properties & ffi::FF_CODEC_PROPERTY_CLOSED_CAPTIONS as u32 != 0,
        film_grain: ctx.properties & ffi::FF_CODEC_PROPERTY_FILM_GRAIN as u32 != 0,
        refs: ctx.refs,
        max_bit_rate: ctx.rc_max_rate,
        bits_per_raw_sample: ctx.bits_per_raw_sample,
    })
}

fn map_disposition(flags: i32) -> Disposition {
    let has = |flag: u32| flags & flag as i32 != 0;
    Disposition {
        default: has(ffi::AV_DISPOSITION_DEFAULT),
        dub: has(ffi::AV_DISPOSITION_DUB),
        original: has(ffi::AV_DISPOSITION_ORIGINAL),
        comment: has(ffi::AV_DISPOSITION_COMMENT),
        lyrics: has(ffi::AV_DISPOSITION_LYRICS),
        karaoke: has(ffi::AV_DISPOSITION_KARAOKE),
        forced: has(ffi::AV_DISPOSITION_FORCED),
        hearing_impaired: has(ffi::AV_DISPOSITION_HEARING_IMPAIRED),
        visual_impaired: has(ffi::AV_DISPOSITION_VISUAL_IMPAIRED),
        clean_effects: has(ffi::AV_DISPOSITION_CLEAN_EFFECTS),
        attached_pic: has(ffi::AV_DISPOSITION_ATTACHED_PIC),
        timed_thumbnails: has(ffi::AV_DISPOSITION_TIMED_THUMBNAILS),
        captions: has(ffi::AV_DISPOSITION_CAPTIONS),
        descriptions: has(ffi::AV_DISPOSITION_DESCRIPTIONS),
        metadata: has(ffi::AV_DISPOSITION_METADATA),
        dependent: has(ffi::AV_DISPOSITION_DEPENDENT),
        still_image: has(ffi::AV_DISPOSITION_STILL_IMAGE),
    }
}

fn coded_side_data(par: &ffi::AVCodecParameters, stream_index: i32) -> Vec<SideData> {
    if par.coded_side_data.is_null() || par.nb_coded_side_data <= 0 {
        return Vec::new();
    }
    let entries = unsafe {
        std::slice::from_raw_parts(par.coded_side_data, par.nb_coded_side_data as usize)
    };
    entries
        .iter()
        .map(|entry| {
            let data = if entry.data.is_null() {
                &[][..]
            } else {
                unsafe { std::slice::from_raw_parts(entry.data, entry.size) }
            };
            map_side_data(entry.type_, data).unwrap_or_else(|| {
                let name = c_name(unsafe { ffi::av_packet_side_data_name(entry.type_) });
                debug!(
                    "Stream #{}: side data {} kept without detail",
                    stream_index,
                    name.as_deref().unwrap_or("unknown")
                );
                SideData::Other { name }
            })
        })
        .collect()
}

/// Read a C struct out of a side-data payload that is large enough to hold it
fn payload<T: Copy>(data: &[u8]) -> Option<T> {
    if data.len() < std::mem::size_of::<T>() {
        return None;
    }
    Some(unsafe { std::ptr::read_unaligned(data.as_ptr() as *const T) })
}

fn map_side_data(kind: ffi::AVPacketSideDataType, data: &[u8]) -> Option<SideData> {
    use ffi::AVPacketSideDataType::*;

    match kind {
        AV_PKT_DATA_DISPLAYMATRIX => SideData::display_matrix_from_bytes(data),
        AV_PKT_DATA_SKIP_SAMPLES => SideData::skip_samples_from_bytes(data),
        AV_PKT_DATA_STEREO3D => {
            let stereo: ffi::AVStereo3D = payload(data)?;
            Some(SideData::Stereo3d {
                kind: Stereo3dType::from_raw(stereo.type_ as i32),
                inverted: stereo.flags & ffi::AV_STEREO3D_FLAG_INVERT as i32 != 0,
            })
        }
        AV_PKT_DATA_SPHERICAL => {
            let spherical: ffi::AVSphericalMapping = payload(data)?;
            Some(SideData::Spherical(SphericalMapping {
                projection: SphericalProjection::from_raw(spherical.projection as i32),
                yaw: spherical.yaw,
                pitch: spherical.pitch,
                roll: spherical.roll,
                bound_left: spherical.bound_left,
                bound_top: spherical.bound_top,
                bound_right: spherical.bound_right,
                bound_bottom: spherical.bound_bottom,
                padding: spherical.padding,
            }))
        }
        AV_PKT_DATA_MASTERING_DISPLAY_METADATA => {
            let mastering: ffi::AVMasteringDisplayMetadata = payload(data)?;
            let pair = |p: [ffi::AVRational; 2]| [rational(p[0]), rational(p[1])];
            Some(SideData::MasteringDisplay(MasteringDisplayMetadata {
                primaries: (mastering.has_primaries != 0).then(|| DisplayPrimaries {
                    red: pair(mastering.display_primaries[0]),
                    green: pair(mastering.display_primaries[1]),
                    blue: pair(mastering.display_primaries[2]),
                    white_point: pair(mastering.white_point),
                }),
                luminance: (mastering.has_luminance != 0).then(|| Luminance {
                    min: rational(mastering.min_luminance),
                    max: rational(mastering.max_luminance),
                }),
            }))
        }
        AV_PKT_DATA_CONTENT_LIGHT_LEVEL => {
            let light: ffi::AVContentLightMetadata = payload(data)?;
            Some(SideData::ContentLightLevel {
                max_content: light.MaxCLL,
                max_average: light.MaxFALL,
            })
        }
        AV_PKT_DATA_DOVI_CONF => {
            let dovi: ffi::AVDOVIDecoderConfigurationRecord = payload(data)?;
            Some(SideData::DoviConfig(DoviConfig {
                dv_version_major: dovi.dv_version_major,
                dv_version_minor: dovi.dv_version_minor,
                dv_profile: dovi.dv_profile,
                dv_level: dovi.dv_level,
                rpu_present_flag: dovi.rpu_present_flag,
                el_present_flag: dovi.el_present_flag,
                bl_present_flag: dovi.bl_present_flag,
                dv_bl_signal_compatibility_id: dovi.dv_bl_signal_compatibility_id,
            }))
        }
        AV_PKT_DATA_AUDIO_SERVICE_TYPE => {
            let service_type: i32 = payload(data)?;
            Some(SideData::AudioServiceType { service_type })
        }
        AV_PKT_DATA_MPEGTS_STREAM_ID => Some(SideData::MpegTsStreamId { id: *data.first()? }),
        AV_PKT_DATA_CPB_PROPERTIES => {
            let cpb: ffi::AVCPBProperties = payload(data)?;
            Some(SideData::CpbProperties(CpbProperties {
                max_bitrate: cpb.max_bitrate,
                min_bitrate: cpb.min_bitrate,
                avg_bitrate: cpb.avg_bitrate,
                buffer_size: cpb.buffer_size,
                vbv_delay: cpb.vbv_delay,
            }))
        }
        AV_PKT_DATA_WEBVTT_IDENTIFIER => Some(SideData::WebVttIdentifier {
            data: data.to_vec(),
        }),
        AV_PKT_DATA_WEBVTT_SETTINGS => Some(SideData::WebVttSettings {
            data: data.to_vec(),
        }),
        AV_PKT_DATA_AFD => Some(SideData::ActiveFormat {
            active_format: *data.first()?,
        }),
        _ => None,
    }
}

#[async_trait]
impl ProbePort for ProbeLibavAdapter {
    async fn probe_media(&self, file_path: &str) -> Result<MediaInfo, DomainError> {
        if !Path::new(file_path).exists() {
            return Err(DomainError::FileNotFound(file_path.to_string()));
        }

        let path = file_path.to_string();
        let media = tokio::task::spawn_blocking(move || Self::probe_blocking(&path))
            .await
            .map_err(|e| DomainError::ProbeFail(format!("Probe task failed: {}", e)))??;

        info!(
            "Probed {}: {} streams, {} side-data records",
            file_path,
            media.total_streams(),
            media.total_side_data()
        );
        Ok(media)
    }

    fn source_name(&self) -> &'static str {
        "libav"
    }
}
