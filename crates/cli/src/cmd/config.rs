//! Configuration file helpers

use crate::config;
use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

/// Show the config file path and whether it exists
pub async fn run_path(config_path: Option<&Path>) -> Result<()> {
    let path = util::config_path(config_path)?;
    println!("{}", path.display());
    if !path.exists() {
        println!(
            "{}",
            "File does not exist. Use 'snapwatch config example' to create one.".yellow()
        );
    }
    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}
