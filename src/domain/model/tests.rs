// Unit tests for domain models

#[cfg(test)]
mod tests {
    use crate::domain::model::*;

    #[test]
    fn test_rational_parse_and_display() {
        let rate: Rational = "30000/1001".parse().unwrap();
        assert_eq!(rate, Rational::new(30000, 1001));
        assert_eq!(rate.to_string(), "30000/1001");

        let ratio: Rational = "16:9".parse().unwrap();
        assert_eq!(ratio, Rational::new(16, 9));
    }

    #[test]
    fn test_rational_parse_invalid() {
        assert!("30000".parse::<Rational>().is_err());
        assert!("a/b".parse::<Rational>().is_err());
        assert!("1/".parse::<Rational>().is_err());
    }

    #[test]
    fn test_rational_reduce_exact() {
        let (q, exact) = Rational::reduce(1920, 1080, 1024 * 1024);
        assert_eq!(q, Rational::new(16, 9));
        assert!(exact);

        let (q, exact) = Rational::reduce(-3, 6, 100);
        assert_eq!(q, Rational::new(-1, 2));
        assert!(exact);
    }

    #[test]
    fn test_rational_reduce_approximates_within_bound() {
        let (q, exact) = Rational::reduce(355, 113, 100);
        assert_eq!(q, Rational::new(22, 7));
        assert!(!exact);

        let (q, exact) = Rational::reduce(1_000_001, 1_000_000, 1000);
        assert_eq!(q, Rational::new(1, 1));
        assert!(!exact);
    }

    #[test]
    fn test_display_aspect_ratio() {
        let video = VideoParams {
            width: 720,
            height: 576,
            sample_aspect_ratio: Some(Rational::new(64, 45)),
            ..Default::default()
        };
        assert_eq!(video.display_aspect_ratio(), Some(Rational::new(16, 9)));

        let unknown_sar = VideoParams {
            width: 720,
            height: 576,
            sample_aspect_ratio: Some(Rational::new(0, 1)),
            ..Default::default()
        };
        assert_eq!(unknown_sar.display_aspect_ratio(), None);
    }

    #[test]
    fn test_tags_preserve_order_and_replace() {
        let mut tags = Tags::new();
        tags.insert("title", "first");
        tags.insert("encoder", "x");
        tags.insert("title", "second");

        let keys: Vec<&[u8]> = tags.iter().map(|t| t.key.as_bytes()).collect();
        assert_eq!(keys, vec![b"title".as_slice(), b"encoder".as_slice()]);
        assert_eq!(tags.iter().next().unwrap().value.as_bytes(), b"second");
    }

    #[test]
    fn test_tags_deserialize_keeps_container_order() {
        let tags: Tags = serde_json::from_str(r#"{"z": "1", "a": "2", "m": [100, 255]}"#).unwrap();
        let keys: Vec<&[u8]> = tags.iter().map(|t| t.key.as_bytes()).collect();
        assert_eq!(keys, vec![b"z".as_slice(), b"a".as_slice(), b"m".as_slice()]);
        assert_eq!(tags.iter().nth(2).unwrap().value.as_bytes(), &[100u8, 255]);
    }

    #[test]
    fn test_raw_text_serializes_invalid_bytes_as_array() {
        let text = RawText(b"ok".to_vec());
        assert_eq!(serde_json::to_string(&text).unwrap(), r#""ok""#);

        let bytes = RawText(vec![0x64, 0xff]);
        assert_eq!(serde_json::to_string(&bytes).unwrap(), "[100,255]");
    }

    #[test]
    fn test_stream_info_deserialize_defaults() {
        let stream: StreamInfo = serde_json::from_str(
            r#"{"index": 0, "codec_type": "video", "width": 1920, "height": 1080,
                "sample_aspect_ratio": "1/1", "time_base": "1/90000"}"#,
        )
        .unwrap();

        assert_eq!(stream.media_type(), Some(MediaType::Video));
        assert_eq!(stream.width(), 1920);
        assert_eq!(stream.height(), 1080);
        assert_eq!(stream.time_base, Rational::new(1, 90000));
        assert_eq!(stream.start_time, NOPTS_VALUE);
        assert_eq!(stream.duration, NOPTS_VALUE);
        assert_eq!(stream.profile, PROFILE_UNKNOWN);
        assert!(stream.tags.is_empty());
    }

    #[test]
    fn test_disposition_entries_order() {
        let disposition = Disposition {
            default: true,
            still_image: true,
            ..Default::default()
        };
        let entries = disposition.entries();
        assert_eq!(entries[0], ("default", true));
        assert_eq!(entries[16], ("still_image", true));
        assert_eq!(entries.iter().filter(|(_, on)| *on).count(), 2);
    }

    #[test]
    fn test_side_data_type_names() {
        assert_eq!(
            SideData::DisplayMatrix { matrix: [0; 9] }.type_name(),
            "Display Matrix"
        );
        assert_eq!(
            SideData::ContentLightLevel {
                max_content: 1000,
                max_average: 400
            }
            .type_name(),
            "Content light level metadata"
        );
        assert_eq!(SideData::Other { name: None }.type_name(), "unknown");
    }

    #[test]
    fn test_side_data_deserialize_tagged() {
        let side: SideData =
            serde_json::from_str(r#"{"type": "stereo3d", "kind": "side_by_side"}"#).unwrap();
        assert_eq!(
            side,
            SideData::Stereo3d {
                kind: Stereo3dType::SideBySide,
                inverted: false
            }
        );
        assert_eq!(Stereo3dType::SideBySide.name(), "side by side");
        assert_eq!(Stereo3dType::from_raw(42), Stereo3dType::Unknown);
    }

    #[test]
    fn test_display_rotation() {
        let identity = [65536, 0, 0, 0, 65536, 0, 0, 0, 1 << 30];
        assert_eq!(display_rotation(&identity) as i64, 0);

        let rotated = [0, -65536, 0, 65536, 0, 0, 0, 0, 1 << 30];
        assert_eq!(display_rotation(&rotated).round() as i64, 90);

        assert!(display_rotation(&[0; 9]).is_nan());
    }

    #[test]
    fn test_display_matrix_bytes_round_trip() {
        let matrix = [65536, 0, 0, 0, 65536, 0, 0, 0, 1 << 30];
        let bytes = display_matrix_bytes(&matrix);
        assert_eq!(bytes.len(), 36);
        assert_eq!(
            SideData::display_matrix_from_bytes(&bytes),
            Some(SideData::DisplayMatrix { matrix })
        );
        assert_eq!(SideData::display_matrix_from_bytes(&bytes[..35]), None);
    }

    #[test]
    fn test_skip_samples_from_bytes() {
        let data = [0x10, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 1, 2];
        assert_eq!(
            SideData::skip_samples_from_bytes(&data),
            Some(SideData::SkipSamples {
                skip_samples: 16,
                discard_padding: 32,
                skip_reason: 1,
                discard_reason: 2
            })
        );
        assert_eq!(SideData::skip_samples_from_bytes(&data[..9]), None);
    }

    #[test]
    fn test_spherical_tile_bounds() {
        let full = SphericalMapping {
            projection: SphericalProjection::EquirectangularTile,
            yaw: 0,
            pitch: 0,
            roll: 0,
            bound_left: 0,
            bound_top: 0,
            bound_right: 0,
            bound_bottom: 0,
            padding: 0,
        };
        assert_eq!(full.tile_bounds(1920, 960), (0, 0, 0, 0));

        let half = SphericalMapping {
            bound_right: u32::MAX / 2,
            ..full
        };
        let (left, top, right, bottom) = half.tile_bounds(1920, 960);
        assert_eq!((left, top, bottom), (0, 0, 0));
        assert!((1919..=1921).contains(&right));

        assert_eq!(SphericalMapping::degrees(90 << 16), 90);
        assert_eq!(SphericalMapping::degrees(-(45 << 16) - 1), -45);
    }
}
