use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs::{self, File, FileTimes};
use std::io::Read;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn aged_file(dir: &Path, name: &str, days_old: u64) -> std::io::Result<()> {
    let path = dir.join(name);
    fs::write(&path, format!("contents of {name}\n"))?;
    let when = SystemTime::now() - Duration::from_secs(days_old * 24 * 60 * 60);
    File::options().write(true).open(&path)?.set_times(FileTimes::new().set_modified(when))
}

fn zip_members(archive: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let zip = zip::ZipArchive::new(File::open(archive)?)?;
    Ok(zip.file_names().map(str::to_string).collect())
}

#[test]
fn test_rotate_deletes_archives_and_skips() -> TestResult {
    let dir = tempdir()?;
    aged_file(dir.path(), "a.log", 400)?;
    aged_file(dir.path(), "b.log", 100)?;
    aged_file(dir.path(), "c.zip", 400)?;
    aged_file(dir.path(), "m.log", 200)?;

    let mut cmd = Command::cargo_bin("rotarch")?;
    cmd.arg("rotate")
        .arg(dir.path())
        .args(["--property", "last-write-time", "--unit", "day"])
        .args(["--compression", "180", "--deletion", "365"]);
    cmd.assert()
        .success()
        .stdout(
            predicate::str::contains("Delete")
                .and(predicate::str::contains("a.log"))
                .and(predicate::str::contains("Compress"))
                .and(predicate::str::contains("m.zip"))
                .and(predicate::str::contains("b.log").not())
                .and(predicate::str::contains("c.zip").not()),
        );

    assert!(!dir.path().join("a.log").exists());
    assert!(!dir.path().join("a.zip").exists(), "deleted, never archived");
    assert!(dir.path().join("b.log").exists());
    assert_eq!(fs::read_to_string(dir.path().join("c.zip"))?, "contents of c.zip\n");
    assert!(!dir.path().join("m.log").exists());
    assert_eq!(zip_members(&dir.path().join("m.zip"))?, ["m.log"]);
    Ok(())
}

#[test]
fn test_rotate_rejects_inverted_thresholds() -> TestResult {
    let dir = tempdir()?;
    aged_file(dir.path(), "ancient.log", 2000)?;

    let mut cmd = Command::cargo_bin("rotarch")?;
    cmd.arg("rotate")
        .arg(dir.path())
        .args(["--unit", "month", "--compression", "9", "--deletion", "6"]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("more recent than deletion cutoff"));

    assert!(dir.path().join("ancient.log").exists());
    Ok(())
}

#[test]
fn test_rotate_missing_root_touches_nothing() -> TestResult {
    let dir = tempdir()?;
    aged_file(dir.path(), "ancient.log", 2000)?;

    let mut cmd = Command::cargo_bin("rotarch")?;
    cmd.arg("rotate")
        .arg(dir.path())
        .arg(dir.path().join("missing"))
        .args(["--unit", "day", "--deletion", "1"]);
    cmd.assert().failure().stderr(predicate::str::contains("Path not found"));

    assert!(dir.path().join("ancient.log").exists());
    Ok(())
}

#[test]
fn test_rotate_dry_run_only_reports_the_deletion() -> TestResult {
    let dir = tempdir()?;
    aged_file(dir.path(), "ancient.log", 400)?;

    let mut cmd = Command::cargo_bin("rotarch")?;
    cmd.env_remove("ROTARCH_LOG")
        .arg("rotate")
        .arg(dir.path())
        .args(["-v", "--dry-run", "--property", "last-write-time", "--unit", "day"])
        .args(["--compression", "180", "--deletion", "365"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(
            predicate::str::contains("would delete")
                .and(predicate::str::contains("would compress").not()),
        );

    assert!(dir.path().join("ancient.log").exists());
    assert!(!dir.path().join("ancient.zip").exists());
    Ok(())
}

#[test]
fn test_compress_twice_overwrites_archive() -> TestResult {
    let dir = tempdir()?;
    aged_file(dir.path(), "app.log", 40)?;

    for _ in 0..2 {
        let mut cmd = Command::cargo_bin("rotarch")?;
        cmd.arg("compress")
            .arg(dir.path())
            .args(["--property", "last-write-time", "--unit", "day"])
            .args(["--older-than", "30", "--yes"]);
        cmd.assert().success().stdout(predicate::str::contains("app.zip"));
    }

    assert!(dir.path().join("app.log").exists());
    let mut zip = zip::ZipArchive::new(File::open(dir.path().join("app.zip"))?)?;
    assert_eq!(zip.len(), 1);
    let mut body = String::new();
    zip.by_name("app.log")?.read_to_string(&mut body)?;
    assert_eq!(body, "contents of app.log\n");
    Ok(())
}

#[test]
fn test_compress_into_new_destination_and_remove_originals() -> TestResult {
    let dir = tempdir()?;
    let dest = dir.path().join("archive").join("2024");
    aged_file(dir.path(), "old.txt", 10)?;

    let mut cmd = Command::cargo_bin("rotarch")?;
    cmd.arg("compress")
        .arg(dir.path())
        .args(["--property", "last-write-time", "--unit", "day"])
        .args(["--older-than", "5", "-y", "--remove-after"])
        .arg("--destination")
        .arg(&dest);
    cmd.assert().success();

    assert!(!dir.path().join("old.txt").exists());
    assert_eq!(zip_members(&dest.join("old.zip"))?, ["old.txt"]);
    Ok(())
}

#[test]
fn test_remove_asks_by_default() -> TestResult {
    let dir = tempdir()?;
    aged_file(dir.path(), "a.log", 10)?;
    aged_file(dir.path(), "b.log", 10)?;

    // No answer on stdin: nothing is deleted.
    let mut cmd = Command::cargo_bin("rotarch")?;
    cmd.arg("remove")
        .arg(dir.path())
        .args(["--property", "last-write-time", "--unit", "day", "--older-than", "5"]);
    cmd.assert().success().stdout(predicate::str::is_empty());
    assert!(dir.path().join("a.log").exists());

    // "Yes to all" deletes both.
    assert_cmd::Command::cargo_bin("rotarch")?
        .arg("remove")
        .arg(dir.path())
        .args(["--property", "last-write-time", "--unit", "day", "--older-than", "5"])
        .write_stdin("a\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.log").and(predicate::str::contains("b.log")));
    assert!(!dir.path().join("a.log").exists());
    assert!(!dir.path().join("b.log").exists());
    Ok(())
}

#[test]
fn test_remove_dry_run_and_json_output() -> TestResult {
    let dir = tempdir()?;
    aged_file(dir.path(), "a.log", 10)?;
    fs::create_dir(dir.path().join("fresh"))?;

    let mut cmd = Command::cargo_bin("rotarch")?;
    cmd.arg("remove")
        .arg(dir.path())
        .args(["--property", "last-write-time", "--unit", "day", "--older-than", "5", "--dry-run"]);
    cmd.assert().success().stdout(predicate::str::is_empty());
    assert!(dir.path().join("a.log").exists());

    let output = Command::cargo_bin("rotarch")?
        .arg("remove")
        .arg(dir.path())
        .args(["--property", "last-write-time", "--unit", "day"])
        .args(["--older-than", "5", "-y", "--json"])
        .output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: serde_json::Value = serde_json::from_str(lines[0])?;
    assert_eq!(record["action"], "Delete");
    assert_eq!(record["kind"], "File");
    assert_eq!(record["attribute"], "LastWriteTime");
    assert!(record["path"].as_str().is_some_and(|p| p.ends_with("a.log")));
    assert!(dir.path().join("fresh").exists());
    Ok(())
}

#[test]
fn test_invalid_timestamp_fails() -> TestResult {
    let dir = tempdir()?;
    let mut cmd = Command::cargo_bin("rotarch")?;
    cmd.arg("remove").arg(dir.path()).args(["--before", "yesterday-ish", "-y"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timestamp 'yesterday-ish'"));
    Ok(())
}

#[test]
fn test_standalone_missing_root_is_reported_but_not_fatal() -> TestResult {
    let dir = tempdir()?;
    aged_file(dir.path(), "a.log", 10)?;

    let mut cmd = Command::cargo_bin("rotarch")?;
    cmd.arg("remove")
        .arg(dir.path().join("missing"))
        .arg(dir.path())
        .args(["--property", "last-write-time", "--unit", "day", "--older-than", "5", "-y"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("a.log"))
        .stderr(predicate::str::contains("Path not found"));
    assert!(!dir.path().join("a.log").exists());
    Ok(())
}
