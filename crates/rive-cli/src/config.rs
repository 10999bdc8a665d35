//! `rive.toml` project manifests.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_NAME: &str = "rive.toml";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub package: Package,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    #[serde(default = "default_edition")]
    pub edition: String,
}

fn default_edition() -> String {
    "2025".to_string()
}

impl Config {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            package: Package {
                name: name.into(),
                version: "0.1.0".to_string(),
                edition: default_edition(),
            },
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self).context("failed to serialize manifest")?;
        fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Walks up from the current directory to the nearest `rive.toml`.
    pub fn find() -> Result<(Self, PathBuf)> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::find_from(&cwd)
    }

    /// Walks up from `dir` to the nearest `rive.toml`.
    pub fn find_from(dir: &Path) -> Result<(Self, PathBuf)> {
        let mut current = dir.to_path_buf();
        loop {
            let manifest = current.join(MANIFEST_NAME);
            if manifest.exists() {
                let config = Self::load(&manifest)?;
                return Ok((config, current));
            }
            if !current.pop() {
                bail!(
                    "could not find {MANIFEST_NAME} in `{}` or any parent directory",
                    dir.display()
                );
            }
        }
    }
}
