#![forbid(unsafe_code)]

//! Rust code generation from RIR.
//!
//! RIR maps onto Rust almost one-to-one: tokens are assembled with
//! `quote`, validated with `syn`, and pretty-printed with `prettyplease`,
//! so the output is always well-formed, formatted Rust source.

mod codegen;
mod control_flow;

pub use codegen::CodeGenerator;

use rive_core::Result;
use rive_ir::RirModule;

/// Generates a complete Rust program from a lowered module.
pub fn generate(module: &RirModule) -> Result<String> {
    CodeGenerator::new(module).generate()
}
