//! End-to-end tests driving the snapwatch binary

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// A scratch root plus a config pointing at it
struct Fixture {
    _temp_dir: TempDir,
    root: PathBuf,
    config: PathBuf,
}

impl Fixture {
    fn new(extra: &str) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("watched");
        fs::create_dir_all(&root)?;

        let config = temp_dir.path().join("snapwatch.toml");
        fs::write(
            &config,
            format!(
                "hash_cache = \"data/hashing.db\"\n[[watch]]\npaths = [{:?}]\n{}",
                root.to_string_lossy(),
                extra
            ),
        )?;

        Ok(Self {
            _temp_dir: temp_dir,
            root,
            config,
        })
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new(env!("CARGO_BIN_EXE_snapwatch"))
            .arg("--config")
            .arg(&self.config)
            .arg("--quiet")
            .args(args)
            .env("NO_COLOR", "1")
            .env("RUST_LOG", "warn")
            .output()
            .context("Failed to run snapwatch")
    }

    fn scan(&self) -> Result<String> {
        let output = self.run(&["scan"])?;
        assert!(
            output.status.success(),
            "scan failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn write(&self, name: &str, content: &str) -> Result<()> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}

fn lines_with<'a>(stdout: &'a str, needle: &str) -> Vec<&'a str> {
    stdout.lines().filter(|l| l.contains(needle)).collect()
}

#[test]
fn test_config_example_prints_toml() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_snapwatch"))
        .args(["config", "example"])
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hash_algorithm = \"blake3\""));
    assert!(stdout.contains("[[watch]]"));
    Ok(())
}

#[test]
fn test_first_scan_then_rename() -> Result<()> {
    let fixture = Fixture::new("")?;
    fixture.write("a.txt", "first")?;
    fixture.write("b.txt", "second")?;
    fixture.write("c.txt", "third")?;

    let first = fixture.scan()?;
    assert_eq!(lines_with(&first, " CREATE ").len(), 3, "{}", first);
    assert!(fixture.root.join(".snapwatch.db").exists());
    assert!(fixture.config.parent().unwrap().join("data/hashing.db").exists());

    let quiet = fixture.scan()?;
    assert!(lines_with(&quiet, " CREATE ").is_empty(), "{}", quiet);
    assert!(quiet.contains("no changes"), "{}", quiet);

    fs::rename(fixture.root.join("a.txt"), fixture.root.join("renamed.txt"))?;
    let renamed = fixture.scan()?;
    let events = lines_with(&renamed, " RENAME ");
    assert_eq!(events.len(), 1, "{}", renamed);
    assert!(events[0].contains("\"renamed.txt\""));
    assert!(lines_with(&renamed, " REMOVE ").is_empty());
    Ok(())
}

#[test]
fn test_actions_filter_events() -> Result<()> {
    let fixture = Fixture::new("actions = [\"remove\"]\n")?;
    fixture.write("keep.txt", "k")?;
    fixture.write("drop.txt", "d")?;

    let first = fixture.scan()?;
    assert!(lines_with(&first, " CREATE ").is_empty(), "{}", first);

    fs::remove_file(fixture.root.join("drop.txt"))?;
    let second = fixture.scan()?;
    let removed = lines_with(&second, " REMOVE ");
    assert_eq!(removed.len(), 1, "{}", second);
    assert!(removed[0].contains("drop.txt"));
    Ok(())
}

#[test]
fn test_status_json_after_scan() -> Result<()> {
    let fixture = Fixture::new("")?;
    fixture.write("docs/readme.md", "hello")?;

    let before = fixture.run(&["status", "--json"])?;
    assert!(before.status.success());
    let statuses: serde_json::Value = serde_json::from_slice(&before.stdout)?;
    assert!(statuses[0]["saved_at"].is_null());

    fixture.scan()?;

    let after = fixture.run(&["status", "--json"])?;
    assert!(after.status.success());
    let statuses: serde_json::Value = serde_json::from_slice(&after.stdout)?;
    assert_eq!(statuses[0]["hash_algorithm"], "blake3");
    assert_eq!(statuses[0]["stats"]["file_count"], 1);
    assert_eq!(statuses[0]["stats"]["dir_count"], 1);

    let text = fixture.run(&["status"])?;
    assert!(text.status.success());
    let stdout = String::from_utf8_lossy(&text.stdout);
    let cache = fixture.config.parent().unwrap().join("data/hashing.db");
    let line = stdout.lines().find(|l| l.starts_with("Hash cache:")).unwrap_or_default();
    assert!(line.contains(&cache.display().to_string()), "{}", stdout);
    Ok(())
}

#[test]
fn test_missing_root_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = temp_dir.path().join("snapwatch.toml");
    fs::write(
        &config,
        format!(
            "[[watch]]\npaths = [{:?}]\n",
            temp_dir.path().join("missing").to_string_lossy()
        ),
    )?;

    let output = Command::new(env!("CARGO_BIN_EXE_snapwatch"))
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .output()?;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("path does not exist"));
    Ok(())
}

#[test]
fn test_missing_config_hints_at_example() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = Command::new(env!("CARGO_BIN_EXE_snapwatch"))
        .arg("--config")
        .arg(temp_dir.path().join("absent.toml"))
        .arg("scan")
        .output()?;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("snapwatch config example"));
    Ok(())
}
