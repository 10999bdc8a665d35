use crate::compiler::Compiler;
use crate::config::Config;
use anyhow::Result;

pub fn execute(release: bool) -> Result<()> {
    let (config, root) = Config::find()?;
    let compiler = Compiler::with_config(root, config);
    compiler.build(release)?;
    Ok(())
}
