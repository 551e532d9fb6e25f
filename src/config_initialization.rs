//! Configuration initialization and hierarchy management

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::{ReportSettings, TomlConfigAdapter};
use crate::cli::{Cli, Commands};
use crate::error::ReportResult;
use crate::output::sanitizer::DEFAULT_REPLACEMENT;
use crate::output::{
    EntrySelection, HashAlgorithm, PrintFormat, ShowOptionalFields, StringValidation,
    WriterOptions,
};
use crate::utils::logging::{LogFormat, LogLevel, LoggingConfig};

/// Settings in effect once every layer has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub print_format: PrintFormat,
    pub compact: bool,
    pub string_validation: StringValidation,
    pub string_validation_replacement: String,
    pub show_optional_fields: ShowOptionalFields,
    pub show_data_hash: Option<HashAlgorithm>,
    pub show_entries: Option<String>,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        let logging = LoggingConfig::default();
        Self {
            print_format: PrintFormat::default(),
            compact: false,
            string_validation: StringValidation::default(),
            string_validation_replacement: DEFAULT_REPLACEMENT.to_string(),
            show_optional_fields: ShowOptionalFields::default(),
            show_data_hash: None,
            show_entries: None,
            log_level: logging.level,
            log_format: logging.format,
        }
    }
}

impl EffectiveConfig {
    /// Apply one layer of settings on top of these
    pub fn apply(self, layer: ReportSettings) -> Self {
        Self {
            print_format: layer.print_format.unwrap_or(self.print_format),
            compact: layer.compact.unwrap_or(self.compact),
            string_validation: layer.string_validation.unwrap_or(self.string_validation),
            string_validation_replacement: layer
                .string_validation_replacement
                .unwrap_or(self.string_validation_replacement),
            show_optional_fields: layer
                .show_optional_fields
                .unwrap_or(self.show_optional_fields),
            show_data_hash: layer.show_data_hash.or(self.show_data_hash),
            show_entries: layer.show_entries.or(self.show_entries),
            log_level: layer.log_level.unwrap_or(self.log_level),
            log_format: layer.log_format.unwrap_or(self.log_format),
        }
    }

    /// Writer options for one report
    pub fn writer_options(&self) -> ReportResult<WriterOptions> {
        let entries = match &self.show_entries {
            Some(expr) => EntrySelection::parse(expr)?,
            None => EntrySelection::default(),
        };
        Ok(WriterOptions {
            string_validation: self.string_validation,
            replacement: self.string_validation_replacement.clone().into_bytes(),
            show_optional_fields: self.show_optional_fields,
            hash: self.show_data_hash,
            entries,
            ..WriterOptions::default()
        })
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level,
            format: self.log_format,
            ..LoggingConfig::default()
        }
    }

    /// Log the settings in effect
    pub fn log_summary(&self) {
        info!(
            "Report settings: format={}, compact={}, string_validation={}, show_optional_fields={}",
            self.print_format, self.compact, self.string_validation, self.show_optional_fields
        );
        if let Some(algo) = self.show_data_hash {
            info!("Data hash algorithm: {}", algo);
        }
        if let Some(entries) = &self.show_entries {
            info!("Entry selection: {}", entries);
        }
    }
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> Result<EffectiveConfig> {
    info!("Initializing configuration hierarchy");

    // Step 1: Defaults
    let config = EffectiveConfig::default();

    // Step 2: Configuration file
    let explicit = match &cli.command {
        Commands::Probe(args) => args.config.as_deref(),
        Commands::Sections(_) => None,
    };
    let config = config.apply(load_config_file(explicit)?);

    // Step 3: Environment variables
    let config = config.apply(load_environment_variables()?);

    // Step 4: CLI arguments
    let config = config.apply(apply_cli_configuration_overrides(cli));

    info!("Configuration hierarchy initialized successfully");
    Ok(config)
}

/// Load configuration from file
fn load_config_file(explicit: Option<&Path>) -> Result<ReportSettings> {
    match TomlConfigAdapter::discover(explicit).context("Configuration file not found")? {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            TomlConfigAdapter::load_file(&path)
                .with_context(|| format!("Invalid configuration file {}", path.display()))
        }
        None => {
            info!("No configuration file loaded");
            Ok(ReportSettings::default())
        }
    }
}

/// Load environment variables
fn load_environment_variables() -> Result<ReportSettings> {
    TomlConfigAdapter::from_env().context("Invalid environment override")
}

/// Collect the settings given on the command line
fn apply_cli_configuration_overrides(cli: &Cli) -> ReportSettings {
    let mut settings = ReportSettings {
        log_level: cli.log_level,
        log_format: cli.log_format,
        ..ReportSettings::default()
    };

    if let Commands::Probe(args) = &cli.command {
        settings.print_format = args.print_format;
        settings.compact = args.compact.then_some(true);
        settings.string_validation = args.string_validation;
        settings.string_validation_replacement = args.string_validation_replacement.clone();
        settings.show_optional_fields = args.show_optional_fields;
        settings.show_data_hash = args.show_data_hash;
        settings.show_entries = args.show_entries.clone();
    }

    if settings.count() > 0 {
        info!("Applied {} CLI configuration overrides", settings.count());
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let config = EffectiveConfig::default();
        assert_eq!(config.string_validation, StringValidation::Replace);
        assert_eq!(config.string_validation_replacement, "\u{FFFD}");
        assert_eq!(config.show_optional_fields, ShowOptionalFields::Always);
        assert!(!config.compact);
    }

    #[test]
    fn test_layers_apply_in_order() {
        let file = ReportSettings {
            compact: Some(true),
            show_entries: Some("format".to_string()),
            string_validation: Some(StringValidation::Ignore),
            ..Default::default()
        };
        let env = ReportSettings {
            string_validation: Some(StringValidation::Fail),
            ..Default::default()
        };
        let cli = ReportSettings {
            show_entries: Some("stream=index".to_string()),
            ..Default::default()
        };

        let config = EffectiveConfig::default().apply(file).apply(env).apply(cli);
        assert!(config.compact);
        assert_eq!(config.string_validation, StringValidation::Fail);
        assert_eq!(config.show_entries.as_deref(), Some("stream=index"));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "probe-report",
            "--log-level",
            "debug",
            "probe",
            "--input",
            "in.json",
            "--compact",
            "--show-data-hash",
            "sha512",
        ]);
        let settings = apply_cli_configuration_overrides(&cli);
        assert_eq!(settings.log_level, Some(LogLevel::Debug));
        assert_eq!(settings.compact, Some(true));
        assert_eq!(settings.show_data_hash, Some(HashAlgorithm::Sha512));
        assert_eq!(settings.print_format, None);
    }

    #[test]
    fn test_writer_options() {
        let config = EffectiveConfig {
            show_entries: Some("format=filename".to_string()),
            string_validation_replacement: "?".to_string(),
            ..Default::default()
        };
        let options = config.writer_options().unwrap();
        assert_eq!(options.replacement, b"?");
        assert!(!options.entries.is_empty());

        let bad = EffectiveConfig {
            show_entries: Some("nonsense".to_string()),
            ..Default::default()
        };
        assert!(bad.writer_options().is_err());
    }
}
