// TOML config adapter - Report settings from TOML files and the environment

use crate::domain::errors::*;
use crate::output::{HashAlgorithm, PrintFormat, ShowOptionalFields, StringValidation};
use crate::utils::logging::{LogFormat, LogLevel};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Configuration files looked up when no explicit path is given
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["probe_report.toml", "config/probe_report.toml"];

/// Prefix of the environment overrides
pub const ENV_PREFIX: &str = "PROBE_REPORT_";

/// One layer of report settings; unset keys defer to lower layers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    pub print_format: Option<PrintFormat>,
    pub compact: Option<bool>,
    pub string_validation: Option<StringValidation>,
    pub string_validation_replacement: Option<String>,
    pub show_optional_fields: Option<ShowOptionalFields>,
    pub show_data_hash: Option<HashAlgorithm>,
    pub show_entries: Option<String>,
    pub log_level: Option<LogLevel>,
    pub log_format: Option<LogFormat>,
}

impl ReportSettings {
    /// Layer `higher` on top of `self`, keeping every key `higher` sets
    pub fn overlay(self, higher: ReportSettings) -> ReportSettings {
        ReportSettings {
            print_format: higher.print_format.or(self.print_format),
            compact: higher.compact.or(self.compact),
            string_validation: higher.string_validation.or(self.string_validation),
            string_validation_replacement: higher
                .string_validation_replacement
                .or(self.string_validation_replacement),
            show_optional_fields: higher.show_optional_fields.or(self.show_optional_fields),
            show_data_hash: higher.show_data_hash.or(self.show_data_hash),
            show_entries: higher.show_entries.or(self.show_entries),
            log_level: higher.log_level.or(self.log_level),
            log_format: higher.log_format.or(self.log_format),
        }
    }

    /// Number of keys set in this layer
    pub fn count(&self) -> usize {
        [
            self.print_format.is_some(),
            self.compact.is_some(),
            self.string_validation.is_some(),
            self.string_validation_replacement.is_some(),
            self.show_optional_fields.is_some(),
            self.show_data_hash.is_some(),
            self.show_entries.is_some(),
            self.log_level.is_some(),
            self.log_format.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    report: ReportSettings,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse the `[report]` table of a TOML document
    pub fn parse(toml_content: &str) -> Result<ReportSettings, DomainError> {
        let parsed: ConfigFile = toml::from_str(toml_content)
            .map_err(|e| DomainError::BadArgs(format!("Failed to parse TOML config: {}", e)))?;
        Ok(parsed.report)
    }

    /// Load a configuration file
    pub fn load_file(path: &Path) -> Result<ReportSettings, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::BadArgs(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let settings = Self::parse(&content)?;
        info!(
            "Loaded {} setting(s) from configuration file: {}",
            settings.count(),
            path.display()
        );
        Ok(settings)
    }

    /// Find the configuration file to use.
    ///
    /// An explicit path must exist. Otherwise the first existing default
    /// path is used, and having none is not an error.
    pub fn discover(explicit: Option<&Path>) -> Result<Option<PathBuf>, DomainError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(DomainError::FileNotFound(path.display().to_string()));
            }
            return Ok(Some(path.to_path_buf()));
        }

        let found = DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists());
        if found.is_none() {
            debug!("No configuration file found");
        }
        Ok(found)
    }

    /// Read the overrides from the process environment
    pub fn from_env() -> Result<ReportSettings, DomainError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the overrides through `lookup`, keyed by variable name
    pub fn from_lookup<F>(lookup: F) -> Result<ReportSettings, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            let name = format!("{}{}", ENV_PREFIX, key.to_ascii_uppercase());
            let value = lookup(&name);
            if let Some(value) = &value {
                info!("Found environment override: {} = {}", name, value);
            }
            value.map(|value| (name, value))
        };

        let settings = ReportSettings {
            print_format: parse_var(var("print_format"))?,
            compact: parse_var(var("compact"))?,
            string_validation: parse_var(var("string_validation"))?,
            string_validation_replacement: var("string_validation_replacement")
                .map(|(_, value)| value),
            show_optional_fields: parse_var(var("show_optional_fields"))?,
            show_data_hash: parse_var(var("show_data_hash"))?,
            show_entries: var("show_entries").map(|(_, value)| value),
            log_level: parse_var(var("log_level"))?,
            log_format: parse_var(var("log_format"))?,
        };

        if settings.count() > 0 {
            info!("Applied {} environment variable overrides", settings.count());
        }
        Ok(settings)
    }
}

fn parse_var<T>(entry: Option<(String, String)>) -> Result<Option<T>, DomainError>
where
    T: FromStr,
    T::Err: Display,
{
    entry
        .map(|(name, value)| {
            value
                .trim()
                .parse()
                .map_err(|e| DomainError::BadArgs(format!("Invalid value for {}: {}", name, e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_parse_report_table() {
        let settings = TomlConfigAdapter::parse(
            r#"
            [report]
            print_format = "json"
            compact = true
            string_validation = "fail"
            show_data_hash = "sha256"
            show_entries = "stream=index,codec_name"
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(settings.print_format, Some(PrintFormat::Json));
        assert_eq!(settings.compact, Some(true));
        assert_eq!(settings.string_validation, Some(StringValidation::Fail));
        assert_eq!(settings.show_data_hash, Some(HashAlgorithm::Sha256));
        assert_eq!(settings.show_entries.as_deref(), Some("stream=index,codec_name"));
        assert_eq!(settings.log_level, Some(LogLevel::Debug));
        assert_eq!(settings.log_format, None);
        assert_eq!(settings.count(), 6);
    }

    #[test]
    fn test_parse_without_report_table() {
        let settings = TomlConfigAdapter::parse("[other]\nkey = 1\n").unwrap();
        assert_eq!(settings, ReportSettings::default());
    }

    #[test]
    fn test_parse_rejects_unknown_keys_and_values() {
        assert!(TomlConfigAdapter::parse("[report]\ncolour = true\n").is_err());
        assert!(TomlConfigAdapter::parse("[report]\nstring_validation = \"strict\"\n").is_err());
        assert!(TomlConfigAdapter::parse("[report]\nshow_data_hash = \"MD5\"\n").is_err());
    }

    #[test]
    fn test_overlay_precedence() {
        let file = ReportSettings {
            compact: Some(false),
            show_entries: Some("format".to_string()),
            ..Default::default()
        };
        let env = ReportSettings {
            compact: Some(true),
            ..Default::default()
        };
        let merged = file.overlay(env);
        assert_eq!(merged.compact, Some(true));
        assert_eq!(merged.show_entries.as_deref(), Some("format"));
    }

    #[test]
    fn test_env_lookup() {
        let vars: HashMap<&str, &str> = [
            ("PROBE_REPORT_COMPACT", "true"),
            ("PROBE_REPORT_SHOW_OPTIONAL_FIELDS", "never"),
            ("PROBE_REPORT_STRING_VALIDATION_REPLACEMENT", "?"),
        ]
        .into_iter()
        .collect();
        let settings =
            TomlConfigAdapter::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.compact, Some(true));
        assert_eq!(settings.show_optional_fields, Some(ShowOptionalFields::Never));
        assert_eq!(settings.string_validation_replacement.as_deref(), Some("?"));
        assert_eq!(settings.count(), 3);
    }

    #[test]
    fn test_env_lookup_invalid_value() {
        let result = TomlConfigAdapter::from_lookup(|name| {
            (name == "PROBE_REPORT_COMPACT").then(|| "sometimes".to_string())
        });
        assert!(matches!(result, Err(DomainError::BadArgs(_))));
    }

    #[test]
    fn test_discover_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        assert!(matches!(
            TomlConfigAdapter::discover(Some(&path)),
            Err(DomainError::FileNotFound(_))
        ));

        std::fs::write(&path, "[report]\ncompact = true\n").unwrap();
        let found = TomlConfigAdapter::discover(Some(&path)).unwrap();
        assert_eq!(found.as_deref(), Some(path.as_path()));
        assert_eq!(
            TomlConfigAdapter::load_file(&path).unwrap().compact,
            Some(true)
        );
    }
}
