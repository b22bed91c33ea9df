//! One scan of every configured root

use crate::util;
use anyhow::Result;
use std::path::Path;
use tracing::warn;

pub async fn run(config_path: Option<&Path>, quiet: bool) -> Result<()> {
    let config = util::load_config(config_path)?;
    let mut watcher = util::build_watcher(&config, quiet)?;

    if let Err(e) = watcher.load_all() {
        warn!("Some roots start without prior state: {}", e);
    }

    let (watcher, reports) = tokio::task::spawn_blocking(move || {
        let reports = watcher.scan_all();
        (watcher, reports)
    })
    .await?;

    util::print_reports(&watcher, &reports);

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} roots failed", failed, reports.len());
    }
    Ok(())
}
