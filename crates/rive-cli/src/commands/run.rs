use crate::compiler::Compiler;
use crate::config::Config;
use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;

pub fn execute(release: bool) -> Result<()> {
    let (config, root) = Config::find()?;
    let compiler = Compiler::with_config(root, config);
    let (binary, _) = compiler.build(release)?;

    println!(
        "     {} `{}`",
        "Running".green().bold(),
        binary.display()
    );
    let status = Command::new(&binary)
        .status()
        .with_context(|| format!("failed to run {}", binary.display()))?;

    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }
    Ok(())
}
