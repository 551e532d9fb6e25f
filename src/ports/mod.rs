// Ports - Interface definitions (contracts)

use crate::domain::errors::*;
use crate::domain::model::*;
use async_trait::async_trait;

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a media file and return its read-only description
    async fn probe_media(&self, file_path: &str) -> Result<MediaInfo, DomainError>;

    /// Short name of the media source, used in logs
    fn source_name(&self) -> &'static str;
}
