//! Report destinations

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ReportError, ReportResult};

/// What to do when the output file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Replace the existing file
    Always,
    /// Refuse to touch the existing file
    #[default]
    Never,
}

/// Where the report is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSink {
    Stdout,
    File {
        path: PathBuf,
        overwrite: OverwritePolicy,
    },
}

impl ReportSink {
    /// Stdout when `path` is absent or `-`, a file otherwise
    pub fn from_path(path: Option<&Path>, overwrite: OverwritePolicy) -> Self {
        match path {
            Some(path) if path != Path::new("-") => ReportSink::File {
                path: path.to_path_buf(),
                overwrite,
            },
            _ => ReportSink::Stdout,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ReportSink::Stdout => "stdout".to_string(),
            ReportSink::File { path, .. } => path.display().to_string(),
        }
    }

    /// Open a buffered writer on the destination
    pub fn open(&self) -> ReportResult<Box<dyn Write + Send>> {
        match self {
            ReportSink::Stdout => Ok(Box::new(BufWriter::new(io::stdout()))),
            ReportSink::File { path, overwrite } => {
                check_overwrite_policy(path, *overwrite)?;
                ensure_output_directory(path)?;
                let file = File::create(path).map_err(|e| ReportError::OutputError {
                    message: format!("Failed to create '{}': {}", path.display(), e),
                })?;
                info!("Writing report to {}", path.display());
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }
}

fn check_overwrite_policy(path: &Path, overwrite: OverwritePolicy) -> ReportResult<()> {
    if path.exists() {
        match overwrite {
            OverwritePolicy::Always => {
                debug!("Overwriting existing file: {}", path.display());
            }
            OverwritePolicy::Never => {
                return Err(ReportError::OutputError {
                    message: format!("Output file already exists: {}", path.display()),
                });
            }
        }
    }
    Ok(())
}

fn ensure_output_directory(path: &Path) -> ReportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| ReportError::OutputError {
                message: format!("Failed to create output directory '{}': {}", parent.display(), e),
            })?;
            debug!("Created output directory: {}", parent.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_from_path() {
        assert_eq!(ReportSink::from_path(None, OverwritePolicy::Never), ReportSink::Stdout);
        assert_eq!(
            ReportSink::from_path(Some(Path::new("-")), OverwritePolicy::Never),
            ReportSink::Stdout
        );
        assert!(matches!(
            ReportSink::from_path(Some(Path::new("out.json")), OverwritePolicy::Always),
            ReportSink::File { .. }
        ));
    }

    #[test]
    fn test_file_sink_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/report.json");
        let sink = ReportSink::from_path(Some(&path), OverwritePolicy::Never);

        let mut out = sink.open().unwrap();
        out.write_all(b"{}\n").unwrap();
        out.flush().unwrap();
        drop(out);

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[test]
    fn test_overwrite_policy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        fs::write(&path, "old").unwrap();

        let refused = ReportSink::from_path(Some(&path), OverwritePolicy::Never).open();
        assert!(matches!(refused, Err(ReportError::OutputError { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");

        let mut out = ReportSink::from_path(Some(&path), OverwritePolicy::Always)
            .open()
            .unwrap();
        out.write_all(b"new").unwrap();
        out.flush().unwrap();
        drop(out);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }
}
