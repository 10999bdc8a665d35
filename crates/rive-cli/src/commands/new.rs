use crate::config::{Config, MANIFEST_NAME};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

const HELLO_WORLD: &str = "fun main() {\n    print(\"Hello, world!\")\n}\n";
const GITIGNORE: &str = "/target\n";

pub fn execute(name: &str) -> Result<()> {
    let dir = Path::new(name);
    if dir.exists() {
        bail!("destination `{name}` already exists");
    }
    fs::create_dir_all(dir).with_context(|| format!("failed to create `{name}`"))?;
    scaffold(dir, name)?;
    println!(
        "     {} `{}` project",
        "Created".green().bold(),
        name
    );
    Ok(())
}

/// Writes a fresh project layout into `dir`.
pub fn scaffold(dir: &Path, name: &str) -> Result<()> {
    Config::new(name).save(dir.join(MANIFEST_NAME))?;

    let src_dir = dir.join("src");
    fs::create_dir_all(&src_dir).context("failed to create src directory")?;
    fs::write(src_dir.join("main.rive"), HELLO_WORLD)
        .context("failed to write src/main.rive")?;
    fs::write(dir.join(".gitignore"), GITIGNORE).context("failed to write .gitignore")?;
    Ok(())
}
