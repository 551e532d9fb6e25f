// Probe fixture adapter - Media descriptions read from serialized JSON

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

/// Probing adapter that reads a prepared `MediaInfo` document
///
/// The document is the JSON form of [`MediaInfo`]. Tag keys and values may
/// be given as byte arrays to describe text that is not valid UTF-8.
pub struct ProbeFixtureAdapter;

impl ProbeFixtureAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Decode a media description from its JSON text
    pub fn parse(content: &str) -> Result<MediaInfo, DomainError> {
        let media: MediaInfo = serde_json::from_str(content)
            .map_err(|e| DomainError::InvalidFormat(format!("Invalid media description: {}", e)))?;
        validate_stream_indices(&media)?;
        Ok(media)
    }
}

impl Default for ProbeFixtureAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_stream_indices(media: &MediaInfo) -> Result<(), DomainError> {
    for (position, stream) in media.streams.iter().enumerate() {
        if stream.index != position as i32 {
            return Err(DomainError::InvalidFormat(format!(
                "Stream at position {} has index {}",
                position, stream.index
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl ProbePort for ProbeFixtureAdapter {
    async fn probe_media(&self, file_path: &str) -> Result<MediaInfo, DomainError> {
        if !Path::new(file_path).exists() {
            return Err(DomainError::FileNotFound(file_path.to_string()));
        }

        let content = tokio::fs::read_to_string(file_path)
            .await
            .map_err(|e| DomainError::ProbeFail(format!("Cannot read '{}': {}", file_path, e)))?;
        debug!("Read {} bytes of media description", content.len());

        let mut media = Self::parse(&content)?;
        if media.format.filename.is_empty() {
            media.format.filename = RawText::from(file_path);
        }

        info!(
            "Loaded media description: {} streams, format {}",
            media.total_streams(),
            media.format.format_name
        );
        Ok(media)
    }

    fn source_name(&self) -> &'static str {
        "fixture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DESCRIPTION: &str = r#"{
        "format": {
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
            "duration": 10000000,
            "tags": { "title": [100, 101, 115, 99, 255] }
        },
        "streams": [
            { "index": 0, "codec_type": "video", "width": 1280, "height": 720 },
            { "index": 1, "codec_type": "audio", "sample_rate": 48000, "channels": 2 }
        ]
    }"#;

    #[test]
    fn test_parse_description() {
        let media = ProbeFixtureAdapter::parse(DESCRIPTION).unwrap();
        assert_eq!(media.total_streams(), 2);
        assert_eq!(media.streams[0].width(), 1280);
        assert_eq!(media.streams[1].media_type(), Some(MediaType::Audio));
        let title = media.format.tags.iter().next().unwrap();
        assert_eq!(title.value.as_bytes(), b"desc\xFF");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            ProbeFixtureAdapter::parse("{ not json"),
            Err(DomainError::InvalidFormat(_))
        ));

        let misnumbered = r#"{ "format": { "format_name": "wav" },
            "streams": [ { "index": 3, "codec_type": "audio" } ] }"#;
        assert!(matches!(
            ProbeFixtureAdapter::parse(misnumbered),
            Err(DomainError::InvalidFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_probe_media_fills_filename() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DESCRIPTION.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let media = ProbeFixtureAdapter::new().probe_media(&path).await.unwrap();
        assert_eq!(media.format.filename.as_bytes(), path.as_bytes());
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let result = ProbeFixtureAdapter::new()
            .probe_media("/nonexistent/media.json")
            .await;
        assert!(matches!(result, Err(DomainError::FileNotFound(_))));
    }
}
