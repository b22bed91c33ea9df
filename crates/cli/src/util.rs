//! Shared utilities for CLI commands

use crate::config::{self, Config};
use crate::progress::BarProgress;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use store::SledSnapshotStore;
use sw_core::byte_count_iec;
use watcher::{ContentHasher, LogProgress, ScanReport, Watcher};

/// Resolve `--config`, falling back to the file next to the executable
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => config::default_config_path().context("Could not determine config file path"),
    }
}

/// Load the config, with a hint when the default file is missing
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = config_path(explicit)?;
    if !path.exists() {
        anyhow::bail!(
            "Config file not found: {}\nCreate one with: snapwatch config example > {}",
            path.display(),
            path.display()
        );
    }
    Config::load(&path).with_context(|| format!("Invalid configuration in {}", path.display()))
}

/// Watcher with every configured root registered
pub fn build_watcher(config: &Config, quiet: bool) -> Result<Watcher> {
    let mut hasher = ContentHasher::new(config.algorithm()).with_lock_timeout(config.lock_timeout());
    hasher = if quiet {
        hasher.with_progress(Arc::new(LogProgress::new()))
    } else {
        hasher.with_progress(Arc::new(BarProgress::new()))
    };
    if let Some(cache) = config.hash_cache_path() {
        hasher = hasher.with_cache(cache);
    }

    let store = SledSnapshotStore::new().with_lock_timeout(config.lock_timeout());
    let mut watcher = Watcher::new(store, hasher);

    for (index, group) in config.watch.iter().enumerate() {
        let options = group
            .options()
            .with_context(|| format!("Invalid [[watch]] #{}", index))?;
        for path in &group.paths {
            watcher
                .add(path, options.clone())
                .with_context(|| format!("Failed to watch {}", path.display()))?;
        }
    }

    Ok(watcher)
}

/// Print the events and summary of each report
pub fn print_reports(watcher: &Watcher, reports: &[ScanReport]) {
    for report in reports {
        let ops = watcher
            .options(&report.root)
            .map(|o| o.ops)
            .unwrap_or(watcher::OpSet::ALL);

        for event in report.events(ops) {
            match &event.old_path {
                Some(old) => println!("{} {}", event, format!("(from {})", old).dimmed()),
                None => println!("{}", event),
            }
        }
        print_summary(report);
    }
}

/// One line per root: counts, colored by kind
pub fn print_summary(report: &ScanReport) {
    let root = report.root.display().to_string();

    if let Some(error) = &report.error {
        println!("{} {}: {}", "✗".red(), root.cyan(), error.red());
        return;
    }

    let summary = report.summary();
    if summary.total() == 0 {
        println!("{} {}: {}", "✓".green(), root.cyan(), "no changes".dimmed());
        return;
    }

    println!(
        "{} {}: created: {}, updated: {}, deleted: {}, moved: {}, renamed: {} {}",
        "✓".green(),
        root.cyan(),
        summary.created.to_string().green(),
        summary.updated.to_string().yellow(),
        summary.deleted.to_string().red(),
        summary.moved.to_string().blue(),
        summary.renamed.to_string().magenta(),
        format!(
            "({} files, {} directories, {})",
            report.stats.file_count,
            report.stats.dir_count,
            byte_count_iec(report.stats.total_size)
        )
        .dimmed()
    );
}

/// Format a timestamp as local absolute time
pub fn format_absolute_time(time: SystemTime) -> String {
    let datetime: DateTime<Local> = time.into();
    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format a timestamp as relative time ("2 hours ago")
pub fn format_relative_time(time: SystemTime) -> String {
    let elapsed = match SystemTime::now().duration_since(time) {
        Ok(elapsed) => elapsed.as_secs(),
        Err(_) => return "in the future".to_string(),
    };

    if elapsed < 60 {
        format!("{} seconds ago", elapsed)
    } else if elapsed < 3600 {
        format!("{} minutes ago", elapsed / 60)
    } else if elapsed < 86400 {
        format!("{} hours ago", elapsed / 3600)
    } else {
        format!("{} days ago", elapsed / 86400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_relative_time() {
        let now = SystemTime::now();
        assert_eq!(format_relative_time(now - Duration::from_secs(5)), "5 seconds ago");
        assert_eq!(format_relative_time(now - Duration::from_secs(120)), "2 minutes ago");
        assert_eq!(format_relative_time(now - Duration::from_secs(7200)), "2 hours ago");
        assert_eq!(format_relative_time(now - Duration::from_secs(3 * 86400)), "3 days ago");
        assert_eq!(format_relative_time(now + Duration::from_secs(3600)), "in the future");
    }

    #[test]
    fn test_build_watcher_registers_every_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();

        let config: Config = toml::from_str(&format!(
            "hash_cache = {:?}\n[[watch]]\npaths = [{:?}]\n[[watch]]\npaths = [{:?}]\nactions = [\"create\"]\n",
            temp_dir.path().join("hashing.db").to_string_lossy(),
            a.to_string_lossy(),
            b.to_string_lossy()
        ))
        .unwrap();

        let watcher = build_watcher(&config, true).unwrap();
        assert_eq!(watcher.roots().count(), 2);
        assert_eq!(watcher.options(&b).unwrap().ops.to_string(), "CREATE");
    }

    #[test]
    fn test_build_watcher_rejects_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config: Config = toml::from_str(&format!(
            "[[watch]]\npaths = [{:?}]\n",
            temp_dir.path().join("missing").to_string_lossy()
        ))
        .unwrap();

        let error = build_watcher(&config, true).err().unwrap();
        assert!(format!("{:#}", error).contains("path does not exist"));
    }
}
