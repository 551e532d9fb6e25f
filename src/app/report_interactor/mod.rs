// Report interactor - Orchestrates the probe-and-report use case

use std::sync::Arc;

use tracing::info;

use crate::domain::model::*;
use crate::error::ReportResult;
use crate::output::{PrintFormat, ReportSink, ReportWriter, StringSanitizer, WriterOptions};
use crate::ports::*;

pub mod builder;

pub use builder::render_report;

/// Everything needed to produce one report
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub input_path: String,
    pub sink: ReportSink,
    pub print_format: PrintFormat,
    pub compact: bool,
    /// Include hex dumps of binary payloads
    pub show_data: bool,
    pub writer: WriterOptions,
}

impl ReportRequest {
    pub fn new(input_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            sink: ReportSink::Stdout,
            print_format: PrintFormat::default(),
            compact: false,
            show_data: false,
            writer: WriterOptions::default(),
        }
    }
}

/// Summary of a written report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportResponse {
    pub streams: usize,
    pub side_data: usize,
    pub destination: String,
}

/// Interactor for the report use case
pub struct ReportInteractor {
    probe_port: Arc<dyn ProbePort>,
}

impl ReportInteractor {
    /// Create new report interactor with injected ports
    pub fn new(probe_port: Arc<dyn ProbePort>) -> Self {
        Self { probe_port }
    }

    /// Probe the input and write its report to the requested sink
    pub async fn execute(&self, request: ReportRequest) -> ReportResult<ReportResponse> {
        info!(
            "Probing {} with the {} source",
            request.input_path,
            self.probe_port.source_name()
        );
        let media = self.probe_port.probe_media(&request.input_path).await?;
        info!(
            "Media file probed successfully: {} streams",
            media.total_streams()
        );

        Self::write_report(&media, &request)?;

        info!("Report written to {}", request.sink.describe());
        Ok(ReportResponse {
            streams: media.total_streams(),
            side_data: media.total_side_data(),
            destination: request.sink.describe(),
        })
    }

    /// Render `media` to the request's sink
    pub fn write_report(media: &MediaInfo, request: &ReportRequest) -> ReportResult<()> {
        // Reject a bad replacement before the sink truncates an existing file
        StringSanitizer::new(request.writer.string_validation, &request.writer.replacement)?;
        let sink = request.sink.open()?;
        let backend = request.print_format.create_backend(sink, request.compact);
        let mut writer = ReportWriter::begin(backend, request.writer.clone())?;
        render_report(&mut writer, media, request.show_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::error::ReportError;
    use crate::output::OverwritePolicy;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct StaticProbe(MediaInfo);

    #[async_trait]
    impl ProbePort for StaticProbe {
        async fn probe_media(&self, _file_path: &str) -> Result<MediaInfo, DomainError> {
            Ok(self.0.clone())
        }

        fn source_name(&self) -> &'static str {
            "static"
        }
    }

    struct FailingProbe;

    #[async_trait]
    impl ProbePort for FailingProbe {
        async fn probe_media(&self, file_path: &str) -> Result<MediaInfo, DomainError> {
            Err(DomainError::FileNotFound(file_path.to_string()))
        }

        fn source_name(&self) -> &'static str {
            "failing"
        }
    }

    fn media() -> MediaInfo {
        let mut stream = StreamInfo::new(0, MediaParams::Audio(AudioParams::default()));
        stream.side_data.push(SideData::AudioServiceType { service_type: 1 });
        MediaInfo::new(FormatInfo::new("a.wav", "wav"), vec![stream])
    }

    #[tokio::test]
    async fn test_execute_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let interactor = ReportInteractor::new(Arc::new(StaticProbe(media())));

        let mut request = ReportRequest::new("a.wav");
        request.sink = ReportSink::from_path(Some(&path), OverwritePolicy::Never);
        request.compact = true;

        let response = interactor.execute(request).await.unwrap();
        assert_eq!(response.streams, 1);
        assert_eq!(response.side_data, 1);
        assert_eq!(response.destination, path.display().to_string());

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["format"]["format_name"], "wav");
        assert_eq!(doc["streams"][0]["side_data_list"][0]["service_type"], 1);
    }

    #[tokio::test]
    async fn test_bad_replacement_keeps_existing_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, "previous").unwrap();
        let interactor = ReportInteractor::new(Arc::new(StaticProbe(media())));

        let mut request = ReportRequest::new("a.wav");
        request.sink = ReportSink::from_path(Some(&path), OverwritePolicy::Always);
        request.writer.replacement = b"\xC3(".to_vec();

        let result = interactor.execute(request).await;
        assert!(matches!(result, Err(ReportError::InvalidReplacement { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");

        let fresh = dir.path().join("fresh.json");
        let mut request = ReportRequest::new("a.wav");
        request.sink = ReportSink::from_path(Some(&fresh), OverwritePolicy::Never);
        request.writer.replacement = b"\xFF".to_vec();
        assert!(interactor.execute(request).await.is_err());
        assert!(!fresh.exists());
    }

    #[tokio::test]
    async fn test_execute_reports_probe_failure() {
        let interactor = ReportInteractor::new(Arc::new(FailingProbe));
        let result = interactor.execute(ReportRequest::new("missing.mkv")).await;
        assert!(matches!(
            result,
            Err(ReportError::Probe(DomainError::FileNotFound(_)))
        ));
    }
}
