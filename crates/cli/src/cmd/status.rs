//! Show the persisted state of every configured root

use crate::util;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;
use sw_core::{byte_count_iec, FileStats};

#[derive(Serialize)]
struct RootStatus {
    root: String,
    saved_at: Option<String>,
    hash_algorithm: Option<String>,
    stats: Option<FileStats>,
}

pub async fn run(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = util::load_config(config_path)?;
    let mut watcher = util::build_watcher(&config, true)?;
    watcher.load_all().context("Failed to read saved state")?;

    let roots: Vec<_> = watcher.roots().map(Path::to_path_buf).collect();

    if json {
        let statuses: Vec<RootStatus> = roots
            .iter()
            .map(|root| {
                let setting = watcher.setting(root);
                RootStatus {
                    root: root.display().to_string(),
                    saved_at: setting.map(|s| DateTime::<Utc>::from(s.saved_at).to_rfc3339()),
                    hash_algorithm: setting.map(|s| s.hash_algorithm.clone()),
                    stats: setting.map(|s| s.stats),
                }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!("{}", "Watched Roots".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    match watcher.hasher().cache_path() {
        Some(cache) => println!("Hash cache:    {}", cache.display().to_string().dimmed()),
        None => println!("Hash cache:    {}", "disabled".dimmed()),
    }

    for root in &roots {
        println!();
        println!("Root:          {}", root.display().to_string().cyan());

        let Some(setting) = watcher.setting(root) else {
            println!("  {}", "Never scanned".dimmed());
            continue;
        };

        println!(
            "  Last save:   {} ({})",
            util::format_relative_time(setting.saved_at),
            util::format_absolute_time(setting.saved_at).dimmed()
        );
        println!("  Algorithm:   {}", setting.hash_algorithm);
        println!("  Files:       {}", setting.stats.file_count);
        println!("  Directories: {}", setting.stats.dir_count);
        println!("  Symlinks:    {}", setting.stats.link_count);
        println!("  Total size:  {}", byte_count_iec(setting.stats.total_size));

        if setting.hash_algorithm != config.algorithm().name() {
            println!(
                "  {}",
                format!(
                    "Note: saved with {}, now configured for {}; the next scan rehashes every file",
                    setting.hash_algorithm,
                    config.algorithm()
                )
                .yellow()
            );
        }
    }

    Ok(())
}
