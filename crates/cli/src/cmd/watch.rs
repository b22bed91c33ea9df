//! Periodic scanning until Ctrl-C

use crate::util;
use anyhow::Result;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub async fn run(config_path: Option<&Path>, interval: Option<u64>, quiet: bool) -> Result<()> {
    let config = util::load_config(config_path)?;
    let period = interval.unwrap_or(config.interval_secs);
    if period == 0 {
        anyhow::bail!("Interval must be at least 1 second");
    }

    let mut watcher = util::build_watcher(&config, quiet)?;
    if let Err(e) = watcher.load_all() {
        warn!("Some roots start without prior state: {}", e);
    }

    let shared = Arc::new(Mutex::new(watcher));
    let printer = Arc::clone(&shared);

    watcher::run(shared, Duration::from_secs(period), move |reports| {
        let watcher = printer.lock();
        let changed: Vec<_> = reports
            .into_iter()
            .filter(|r| r.error.is_some() || !r.is_unchanged())
            .collect();
        util::print_reports(&watcher, &changed);
    })
    .await?;

    Ok(())
}
