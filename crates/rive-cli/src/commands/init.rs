use crate::commands::new::scaffold;
use crate::config::MANIFEST_NAME;
use anyhow::{bail, Context, Result};
use colored::Colorize;

pub fn execute() -> Result<()> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    if cwd.join(MANIFEST_NAME).exists() {
        bail!("`{MANIFEST_NAME}` already exists in this directory");
    }

    let name = cwd
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("rive-project")
        .to_string();
    scaffold(&cwd, &name)?;
    println!(
        "     {} `{}` project in current directory",
        "Created".green().bold(),
        name
    );
    Ok(())
}
