use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Test utilities for driving the binary against fixture files
mod test_utils {
    use super::*;

    pub const FIXTURE: &str = r#"{
        "format": {
            "format_name": "wav",
            "format_long_name": "WAV / WAVE (Waveform Audio)",
            "start_time": 0,
            "duration": 1000000,
            "size": 176444,
            "bit_rate": 1411552,
            "probe_score": 99,
            "tags": { "title": "tone" }
        },
        "streams": [
            {
                "index": 0,
                "codec_type": "audio",
                "codec_name": "pcm_s16le",
                "codec_long_name": "PCM signed 16-bit little-endian",
                "codec_tag": 1,
                "sample_fmt": "s16",
                "sample_rate": 44100,
                "channels": 2,
                "channel_layout": "stereo",
                "bits_per_sample": 16,
                "time_base": "1/44100",
                "start_time": 0,
                "duration": 44100,
                "bit_rate": 1411200,
                "side_data": [ { "type": "audio_service_type", "service_type": 0 } ]
            }
        ]
    }"#;

    /// Create a workspace holding the fixture; commands run inside it so no
    /// stray configuration file is picked up
    pub fn workspace() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("tone.json");
        fs::write(&input, FIXTURE).unwrap();
        (dir, input)
    }

    pub fn probe_report(dir: &Path) -> Command {
        let mut cmd = Command::cargo_bin("probe-report").unwrap();
        cmd.current_dir(dir).env_remove("RUST_LOG");
        cmd
    }

    pub fn run_probe(dir: &Path, input: &Path, extra: &[&str]) -> Value {
        let output = probe_report(dir)
            .args(["probe", "--source", "fixture", "--input"])
            .arg(input)
            .args(extra)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "probe failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

use test_utils::*;

#[test]
fn test_probe_fixture_to_stdout() {
    let (dir, input) = workspace();
    let doc = run_probe(dir.path(), &input, &[]);

    let stream = &doc["streams"][0];
    assert_eq!(stream["codec_name"], "pcm_s16le");
    assert_eq!(stream["codec_tag_string"], "[1][0][0][0]");
    assert_eq!(stream["codec_tag"], "0x0001");
    assert_eq!(stream["sample_rate"], "44100");
    assert_eq!(stream["duration"], "1.000000");
    assert_eq!(stream["side_data_list"][0]["side_data_type"], "Audio service type");

    let format = &doc["format"];
    assert_eq!(format["filename"], input.display().to_string());
    assert_eq!(format["nb_streams"], 1);
    assert_eq!(format["duration"], "1.000000");
    assert_eq!(format["tags"]["title"], "tone");
}

#[test]
fn test_compact_output_is_same_document() {
    let (dir, input) = workspace();
    let pretty = run_probe(dir.path(), &input, &[]);
    let compact = run_probe(dir.path(), &input, &["--compact"]);
    assert_eq!(pretty, compact);
}

#[test]
fn test_show_entries_limits_report() {
    let (dir, input) = workspace();
    let doc = run_probe(
        dir.path(),
        &input,
        &["--show-entries", "stream=index,codec_name"],
    );

    assert_eq!(doc["streams"][0], serde_json::json!({"index": 0, "codec_name": "pcm_s16le"}));
    assert!(doc.get("format").is_none());
}

#[test]
fn test_show_data_hash() {
    let (dir, input) = workspace();
    let doc = run_probe(
        dir.path(),
        &input,
        &["--show-entries", "format=filename", "--show-data-hash", "sha256"],
    );
    assert_eq!(doc["format"].as_object().unwrap().len(), 1);
}

#[test]
fn test_output_file_and_overwrite() {
    let (dir, input) = workspace();
    let report = dir.path().join("out").join("report.json");

    probe_report(dir.path())
        .args(["probe", "--source", "fixture", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let doc: Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(doc["format"]["format_name"], "wav");

    probe_report(dir.path())
        .args(["probe", "--source", "fixture", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&report)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    probe_report(dir.path())
        .args(["probe", "--source", "fixture", "--overwrite", "--compact", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&report)
        .assert()
        .success();
}

#[test]
fn test_config_file_and_cli_precedence() {
    let (dir, input) = workspace();
    fs::write(
        dir.path().join("probe_report.toml"),
        "[report]\nshow_entries = \"format=format_name\"\n",
    )
    .unwrap();

    let doc = run_probe(dir.path(), &input, &[]);
    assert_eq!(doc, serde_json::json!({"format": {"format_name": "wav"}}));

    let doc = run_probe(dir.path(), &input, &["--show-entries", "stream=index"]);
    assert_eq!(doc, serde_json::json!({"streams": [{"index": 0}]}));
}

#[test]
fn test_invalid_show_entries_fails() {
    let (dir, input) = workspace();
    probe_report(dir.path())
        .args(["probe", "--source", "fixture", "--show-entries", "nonsense", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonsense"));
}

#[test]
fn test_missing_input_fails() {
    let (dir, _) = workspace();
    probe_report(dir.path())
        .args(["probe", "--source", "fixture", "--input", "absent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.json"));
}

#[test]
fn test_sections_listing() {
    let (dir, _) = workspace();
    probe_report(dir.path())
        .arg("sections")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Sections:"))
        .stdout(predicate::str::contains("disposition/stream_disposition"))
        .stdout(predicate::str::contains("packets_and_frames"));

    let output = probe_report(dir.path())
        .args(["sections", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let catalog: Value = serde_json::from_slice(&output.stdout).unwrap();
    let root = catalog
        .as_array()
        .unwrap()
        .iter()
        .find(|section| section["name"] == "root")
        .unwrap();
    assert_eq!(root["wrapper"], true);
}
