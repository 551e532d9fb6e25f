use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use tracing::info;

#[cfg(feature = "libav")]
use crate::adapters::ProbeLibavAdapter;
use crate::adapters::ProbeFixtureAdapter;
use crate::app::report_interactor::ReportInteractor;
use crate::domain::errors::DomainError;
use crate::ports::ProbePort;

/// Where media descriptions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SourceKind {
    /// libav when compiled in, fixture otherwise
    #[default]
    Auto,
    /// Open real containers through FFmpeg
    Libav,
    /// Read serialized media descriptions (JSON)
    Fixture,
}

impl SourceKind {
    /// Resolve `Auto` against the features of this build
    pub fn resolve(self) -> SourceKind {
        match self {
            SourceKind::Auto if cfg!(feature = "libav") => SourceKind::Libav,
            SourceKind::Auto => SourceKind::Fixture,
            other => other,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Auto => "auto",
            SourceKind::Libav => "libav",
            SourceKind::Fixture => "fixture",
        };
        f.write_str(name)
    }
}

pub trait AppContainer: Send + Sync {
    fn report_interactor(&self) -> Arc<ReportInteractor>;
}

pub struct DefaultAppContainer {
    report_interactor: Arc<ReportInteractor>,
}

impl DefaultAppContainer {
    pub fn new(source: SourceKind) -> Result<Self, DomainError> {
        let probe_port = Self::probe_port(source.resolve())?;
        info!("Using the {} media source", probe_port.source_name());

        Ok(Self {
            report_interactor: Arc::new(ReportInteractor::new(probe_port)),
        })
    }

    fn probe_port(source: SourceKind) -> Result<Arc<dyn ProbePort>, DomainError> {
        match source {
            SourceKind::Fixture => Ok(Arc::new(ProbeFixtureAdapter::new()) as Arc<dyn ProbePort>),
            #[cfg(feature = "libav")]
            SourceKind::Libav | SourceKind::Auto => {
                Ok(Arc::new(ProbeLibavAdapter::new()?) as Arc<dyn ProbePort>)
            }
            #[cfg(not(feature = "libav"))]
            SourceKind::Libav | SourceKind::Auto => Err(DomainError::SourceUnavailable(
                "this build has no libav support, rebuild with --features libav".to_string(),
            )),
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn report_interactor(&self) -> Arc<ReportInteractor> {
        Arc::clone(&self.report_interactor)
    }
}
