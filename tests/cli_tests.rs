//! Command-line tests against an isolated data directory

use std::collections::BTreeMap;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `clipshelf` confined to `dir`: no user config, storage and clips inside `dir`
fn clipshelf(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("clipshelf").unwrap();
    cmd.current_dir(dir)
        .env_clear()
        .env("HOME", dir)
        .env("XDG_DATA_HOME", dir.join("data"))
        .env("CLIPSHELF_STORAGE_PATH", dir.join("storage.json"))
        .env("CLIPSHELF_DOCUMENT_DIR", dir.join("clips"))
        .env("CLIPSHELF_FFMPEG_PATH", dir.join("no-such-ffmpeg"))
        .env("CLIPSHELF_FFPROBE_PATH", dir.join("no-such-ffprobe"))
        .env("CLIPSHELF_LOG_LEVEL", "error");
    cmd
}

/// Write a storage file holding one catalog snapshot
fn seed_catalog(dir: &Path, videos: serde_json::Value) {
    let snapshot = serde_json::json!({ "state": { "videos": videos }, "version": 0 });
    let mut items = BTreeMap::new();
    items.insert("video-storage".to_string(), snapshot.to_string());
    std::fs::write(
        dir.join("storage.json"),
        serde_json::to_string(&items).unwrap(),
    )
    .unwrap();
}

fn sample_videos() -> serde_json::Value {
    serde_json::json!([
        {
            "id": "1700000000000",
            "uri": "/clips/1700000000000.mp4",
            "name": "Kickoff",
            "description": "First whistle",
            "start": 3.0,
            "end": 8.0
        },
        {
            "id": "1700000000001",
            "uri": "/clips/1700000000001.mp4",
            "name": "Goal",
            "description": "",
            "start": 61.5,
            "end": 66.5
        }
    ])
}

#[test]
fn test_list_empty_catalog() {
    let dir = TempDir::new().unwrap();
    clipshelf(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No clips added yet"));
}

#[test]
fn test_list_in_insertion_order() {
    let dir = TempDir::new().unwrap();
    seed_catalog(dir.path(), sample_videos());

    let output = clipshelf(dir.path()).arg("list").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let kickoff = stdout.find("Kickoff").unwrap();
    let goal = stdout.find("Goal").unwrap();
    assert!(kickoff < goal);
}

#[test]
fn test_list_json() {
    let dir = TempDir::new().unwrap();
    seed_catalog(dir.path(), sample_videos());

    let output = clipshelf(dir.path()).args(["list", "--json"]).assert().success();
    let clips: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(clips.as_array().unwrap().len(), 2);
    assert_eq!(clips[1]["name"], "Goal");
}

#[test]
fn test_show_prints_duration() {
    let dir = TempDir::new().unwrap();
    seed_catalog(dir.path(), sample_videos());

    clipshelf(dir.path())
        .args(["show", "1700000000000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kickoff"))
        .stdout(predicate::str::contains("First whistle"))
        .stdout(predicate::str::contains("Duration: 5s"));
}

#[test]
fn test_show_unknown_clip_fails() {
    let dir = TempDir::new().unwrap();
    clipshelf(dir.path())
        .args(["show", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Clip not found"));
}

#[test]
fn test_remove_clip() {
    let dir = TempDir::new().unwrap();
    seed_catalog(dir.path(), sample_videos());

    clipshelf(dir.path())
        .args(["remove", "1700000000000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed clip 1700000000000"));
    clipshelf(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Kickoff").not())
        .stdout(predicate::str::contains("Goal"));
}

#[test]
fn test_remove_unknown_clip_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    clipshelf(dir.path())
        .args(["remove", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing removed"));
    assert!(!dir.path().join("storage.json").exists());
}

#[test]
fn test_clip_with_missing_transcoder_is_not_created() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("source.mp4"), b"not really a video").unwrap();

    clipshelf(dir.path())
        .args([
            "clip",
            "--source",
            "source.mp4",
            "--start",
            "0:03",
            "--source-duration",
            "20",
            "--name",
            "Test",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Clip not created"));

    clipshelf(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No clips added yet"));
}

#[test]
fn test_clip_json_outcome_for_missing_source() {
    let dir = TempDir::new().unwrap();

    let output = clipshelf(dir.path())
        .args([
            "clip",
            "--source",
            "content://media/nothing-here.mp4",
            "--source-duration",
            "20",
            "--json",
        ])
        .assert()
        .failure();
    let outcome: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(outcome["outcome"]["status"], "failure");
    assert_eq!(outcome["outcome"]["stage"], "resolve");
}

#[test]
fn test_end_and_duration_conflict() {
    let dir = TempDir::new().unwrap();
    clipshelf(dir.path())
        .args([
            "clip", "--source", "a.mp4", "--end", "8", "--duration", "5",
        ])
        .assert()
        .failure();
}

#[test]
fn test_invalid_log_level_is_rejected() {
    let dir = TempDir::new().unwrap();
    clipshelf(dir.path())
        .args(["--log-level", "loud", "list"])
        .assert()
        .failure();
}

#[test]
fn test_config_file_in_working_directory() {
    let dir = TempDir::new().unwrap();
    let library = dir.path().join("library");
    std::fs::create_dir_all(&library).unwrap();
    seed_catalog(&library, sample_videos());
    std::fs::write(
        dir.path().join("clipshelf.toml"),
        format!(
            "[clipshelf]\nstorage_path = {:?}\n",
            library.join("storage.json").display().to_string()
        ),
    )
    .unwrap();

    // The environment wins over the file
    clipshelf(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No clips added yet"));

    let mut cmd = clipshelf(dir.path());
    cmd.env_remove("CLIPSHELF_STORAGE_PATH");
    cmd.arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Kickoff"));
}
