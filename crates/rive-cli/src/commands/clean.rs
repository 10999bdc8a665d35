use crate::config::Config;
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;

pub fn execute() -> Result<()> {
    let (_, root) = Config::find()?;
    let target = root.join("target");
    if target.exists() {
        fs::remove_dir_all(&target)
            .with_context(|| format!("failed to remove {}", target.display()))?;
        println!("     {} target directory", "Removed".green().bold());
    }
    Ok(())
}
