// Application layer - Use case interactors and wiring

pub mod container;
pub mod report_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer, SourceKind};
pub use report_interactor::{ReportInteractor, ReportRequest, ReportResponse};
