use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PROBE_JSON: &str = r#"{
    "streams": [
        { "index": 0, "codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
          "color_primaries": "bt709" },
        { "index": 1, "codec_type": "audio", "codec_name": "aac", "channels": 2,
          "tags": { "language": "eng" }, "disposition": { "default": 1 } },
        { "index": 2, "codec_type": "subtitle", "codec_name": "subrip",
          "tags": { "language": "eng" } },
        { "index": 3, "codec_type": "subtitle", "codec_name": "subrip",
          "tags": { "language": "eng", "title": "English SDH" } }
    ]
}"#;

fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("batch-encoder").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("BATCH_ENCODER_WORK_DIR")
        .env_remove("BATCH_ENCODER_JOB_DIR")
        .env("BATCH_ENCODER_FFPROBE", "batch-encoder-missing-ffprobe");
    cmd
}

#[test]
fn test_profiles_lists_builtin_keys() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("profiles")
        .assert()
        .success()
        .stdout(predicate::str::contains("opus-8-6"))
        .stdout(predicate::str::contains("bitrate|bitvid=1200"))
        .stdout(predicate::str::contains("(.mka)"));
}

#[test]
fn test_plan_json_from_saved_probe() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Ep 01.json"), PROBE_JSON).unwrap();

    cmd(&dir)
        .args(["plan", "--file", "Ep 01.json", "--json", "--out-path", "R:/enc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"VIDEO_ENCODE\""))
        .stdout(predicate::str::contains("\"effective_audio_profile\": \"copy\""))
        .stdout(predicate::str::contains("R:/enc/Ep 01_eng_2.srt"))
        .stdout(predicate::str::contains("Ep 01_eng_3").not());
}

#[test]
fn test_plan_text_output() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("movie.json"), PROBE_JSON).unwrap();

    cmd(&dir)
        .args(["plan", "--file", "movie.json", "--video", "copy", "--title", "Movie"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Audio:  default -> copy"))
        .stdout(predicate::str::contains("MUX"))
        .stdout(predicate::str::contains("title=Movie"))
        .stdout(predicate::str::contains("VIDEO_ENCODE").not());
}

#[test]
fn test_unknown_profile_fails_before_planning() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.mkv"), b"").unwrap();

    cmd(&dir)
        .args(["encode", "--path", ".", "--prefix", "T", "--audio", "mp3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown Audio profile 'mp3'"));
    assert!(!dir.path().join("output").exists());
}

#[test]
fn test_invalid_crop_fails() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["encode", "--path", ".", "--prefix", "T", "--crop", "10,10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid crop format '10,10'"));
}

#[test]
fn test_encode_writes_four_scripts_with_degraded_probe() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("videos")).unwrap();
    fs::write(dir.path().join("videos/b.mkv"), b"").unwrap();
    fs::write(dir.path().join("videos/a.MP4"), b"").unwrap();
    fs::write(dir.path().join("videos/notes.txt"), b"").unwrap();

    cmd(&dir)
        .args([
            "encode", "--path", "videos", "--prefix", "BATCH", "--job-path", "jobs", "--out-path",
            "work",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("BATCH_del.ps1"));

    let video = fs::read_to_string(dir.path().join("jobs/BATCH_vid.ps1")).unwrap();
    assert_eq!(video.lines().count(), 2);
    assert!(video.lines().next().unwrap().contains("a.MP4"));

    let cleanup = fs::read_to_string(dir.path().join("jobs/BATCH_del.ps1")).unwrap();
    assert!(cleanup.lines().all(|l| l.starts_with("Remove-Item \"work\\")));
    for suffix in ["_aud.ps1", "_mux.ps1"] {
        assert!(dir.path().join(format!("jobs/BATCH{}", suffix)).is_file());
    }
}

#[test]
fn test_dry_run_prints_without_writing() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.mkv"), b"").unwrap();

    cmd(&dir)
        .args(["encode", "--path", "a.mkv", "--prefix", "DRY", "--job-path", "jobs", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# jobs/DRY_vid.ps1"))
        .stdout(predicate::str::contains("NVEncC64.exe"));
    assert!(!dir.path().join("jobs").exists());
}
