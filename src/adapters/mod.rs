// Adapters - External system implementations

pub mod probe_fixture;
#[cfg(feature = "libav")]
pub mod probe_libav;
pub mod toml_config;

// Re-export adapters
pub use probe_fixture::ProbeFixtureAdapter;
#[cfg(feature = "libav")]
pub use probe_libav::ProbeLibavAdapter;
pub use toml_config::{ReportSettings, TomlConfigAdapter};
