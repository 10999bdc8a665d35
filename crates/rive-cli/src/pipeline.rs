//! Compilation pipeline: source → AST → checked AST → RIR → Rust.

use anyhow::Result;
use rive_core::{Error, SourceMap};
use rive_ir::opt::Optimizer;
use rive_ir::RirModule;
use tracing::debug;

/// Runs the front and middle end, returning the optimized module.
pub fn lower_pipeline(file_name: &str, source: &str) -> Result<RirModule> {
    let source_map = SourceMap::new(file_name, source);

    let stages = || -> rive_core::Result<RirModule> {
        let start = std::time::Instant::now();
        let (program, registry) = rive_parser::parse(source)?;
        debug!(stage = "parse", elapsed = ?start.elapsed(), items = program.items.len());

        let start = std::time::Instant::now();
        let registry = rive_semantic::analyze(&program, registry)?;
        debug!(stage = "analyze", elapsed = ?start.elapsed());

        let start = std::time::Instant::now();
        let mut module = rive_ir::lower(&program, registry)?;
        debug!(stage = "lower", elapsed = ?start.elapsed(), functions = module.functions.len());

        let start = std::time::Instant::now();
        Optimizer::new().optimize(&mut module);
        debug!(stage = "optimize", elapsed = ?start.elapsed());

        Ok(module)
    };

    stages().map_err(|err| diagnostic(&source_map, &err))
}

/// Runs the full pipeline and returns generated Rust source.
pub fn build_pipeline(file_name: &str, source: &str) -> Result<String> {
    let module = lower_pipeline(file_name, source)?;
    let start = std::time::Instant::now();
    let rust = rive_codegen::generate(&module)
        .map_err(|err| diagnostic(&SourceMap::new(file_name, source), &err))?;
    debug!(stage = "codegen", elapsed = ?start.elapsed(), bytes = rust.len());
    Ok(rust)
}

/// Runs every stage without producing output, for `rive check`.
pub fn check_pipeline(file_name: &str, source: &str) -> Result<()> {
    build_pipeline(file_name, source).map(|_| ())
}

/// Renders a compiler error as a caret diagnostic when it has a span.
pub fn diagnostic(source_map: &SourceMap, err: &Error) -> anyhow::Error {
    match err.span() {
        Some(span) => anyhow::anyhow!(
            "{}",
            source_map
                .render_diagnostic(err.stage(), &err.to_string(), span)
                .trim_end()
        ),
        None => anyhow::anyhow!("error[{}]: {err}", err.stage()),
    }
}
