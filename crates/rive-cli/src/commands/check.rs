use crate::compiler::Compiler;
use crate::config::Config;
use anyhow::Result;

pub fn execute(emit_rir: bool) -> Result<()> {
    let (config, root) = Config::find()?;
    let compiler = Compiler::with_config(root, config);
    if emit_rir {
        print!("{}", compiler.dump_rir()?);
        return Ok(());
    }
    compiler.check()?;
    Ok(())
}
