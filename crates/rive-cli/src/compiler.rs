//! Project compilation: pipeline → generated Rust → native binary.

use crate::config::Config;
use crate::pipeline;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use which::which;

pub const SOURCE_PATH: &str = "src/main.rive";

pub struct Compiler {
    project_root: PathBuf,
    config: Config,
}

impl Compiler {
    pub fn new(project_root: PathBuf) -> Result<Self> {
        let config = Config::load(project_root.join(crate::config::MANIFEST_NAME))?;
        Ok(Self {
            project_root,
            config,
        })
    }

    pub fn with_config(project_root: PathBuf, config: Config) -> Self {
        Self {
            project_root,
            config,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn read_source(&self) -> Result<String> {
        let source_path = self.project_root.join(SOURCE_PATH);
        fs::read_to_string(&source_path)
            .with_context(|| format!("failed to read {}", source_path.display()))
    }

    /// Compiles the project to a native binary in `target/`.
    pub fn build(&self, release: bool) -> Result<(PathBuf, Duration)> {
        let start = Instant::now();
        println!(
            "   {} {} v{} ({})",
            "Compiling".green().bold(),
            self.config.package.name,
            self.config.package.version,
            self.project_root.display()
        );

        let source = self.read_source()?;
        let rust_code = pipeline::build_pipeline(SOURCE_PATH, &source)?;

        let target_dir = self.project_root.join("target");
        fs::create_dir_all(&target_dir).context("failed to create target directory")?;
        fs::write(target_dir.join("main.rs"), &rust_code)
            .context("failed to save generated Rust code")?;

        let temp_dir = TempDir::new().context("failed to create temporary build directory")?;
        self.create_rust_project(&temp_dir, &rust_code)?;
        let binary = self.compile_rust(&temp_dir, release)?;

        let final_path = target_dir.join(binary_name(&self.config.package.name));
        fs::copy(&binary, &final_path).context("failed to copy binary into target")?;

        let elapsed = start.elapsed();
        println!(
            "    {} `{}` profile in {:.2}s",
            "Finished".green().bold(),
            if release { "release" } else { "dev" },
            elapsed.as_secs_f64()
        );
        Ok((final_path, elapsed))
    }

    /// Runs the pipeline without invoking rustc.
    pub fn check(&self) -> Result<Duration> {
        let start = Instant::now();
        println!(
            "    {} {} v{} ({})",
            "Checking".green().bold(),
            self.config.package.name,
            self.config.package.version,
            self.project_root.display()
        );

        let source = self.read_source()?;
        pipeline::check_pipeline(SOURCE_PATH, &source)?;

        let elapsed = start.elapsed();
        println!(
            "    {} in {:.2}s",
            "Finished".green().bold(),
            elapsed.as_secs_f64()
        );
        Ok(elapsed)
    }

    /// Lowers the project and returns the RIR dump.
    pub fn dump_rir(&self) -> Result<String> {
        let source = self.read_source()?;
        let module = pipeline::lower_pipeline(SOURCE_PATH, &source)?;
        Ok(module.dump())
    }

    fn create_rust_project(&self, temp_dir: &TempDir, rust_code: &str) -> Result<()> {
        let manifest = format!(
            "[package]\nname = \"{}\"\nversion = \"{}\"\nedition = \"2021\"\n\n[dependencies]\n",
            self.config.package.name, self.config.package.version
        );
        fs::write(temp_dir.path().join("Cargo.toml"), manifest)
            .context("failed to write scratch Cargo.toml")?;

        let src_dir = temp_dir.path().join("src");
        fs::create_dir(&src_dir).context("failed to create scratch src directory")?;
        fs::write(src_dir.join("main.rs"), rust_code).context("failed to write main.rs")?;
        Ok(())
    }

    fn compile_rust(&self, temp_dir: &TempDir, release: bool) -> Result<PathBuf> {
        if which("cargo").is_ok() {
            self.compile_with_cargo(temp_dir, release)
        } else if which("rustc").is_ok() {
            self.compile_with_rustc(temp_dir)
        } else {
            bail!(
                "neither cargo nor rustc found in PATH; install Rust from https://rustup.rs/"
            );
        }
    }

    fn compile_with_cargo(&self, temp_dir: &TempDir, release: bool) -> Result<PathBuf> {
        let mut cmd = Command::new("cargo");
        cmd.arg("build").current_dir(temp_dir.path());
        if release {
            cmd.arg("--release");
        }

        let output = cmd.output().context("failed to run cargo build")?;
        if !output.status.success() {
            bail!(
                "rust compilation failed:\n{}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let profile = if release { "release" } else { "debug" };
        Ok(temp_dir
            .path()
            .join("target")
            .join(profile)
            .join(binary_name(&self.config.package.name)))
    }

    fn compile_with_rustc(&self, temp_dir: &TempDir) -> Result<PathBuf> {
        let output_path = temp_dir.path().join(binary_name(&self.config.package.name));
        let output = Command::new("rustc")
            .arg(temp_dir.path().join("src/main.rs"))
            .arg("-o")
            .arg(&output_path)
            .output()
            .context("failed to run rustc")?;

        if !output.status.success() {
            bail!(
                "rust compilation failed:\n{}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(output_path)
    }
}

fn binary_name(package: &str) -> String {
    if cfg!(windows) {
        format!("{package}.exe")
    } else {
        package.to_string()
    }
}
