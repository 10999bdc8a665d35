#![forbid(unsafe_code)]

//! RIR — the Rive intermediate representation.
//!
//! RIR is structured and fully typed: it keeps `if`/`while`/`for`/`loop`/
//! `match` instead of basic blocks, and annotates every node with its
//! type and memory strategy. That keeps it easy to optimize and trivially
//! mappable to Rust source.

mod display;
mod expression;
mod lower;
mod module;
mod statement;

/// Optimization passes over RIR.
pub mod opt;

pub use expression::{BinaryOp, RirExpression, RirFormatPart, UnaryOp};
pub use lower::AstLowering;
pub use module::{RirBlock, RirFunction, RirModule, RirParameter};
pub use statement::{RirPattern, RirStatement};

use rive_core::types::TypeRegistry;
use rive_core::Result;
use rive_parser::ast::Program;

/// Lowers a checked program to RIR.
pub fn lower(program: &Program, registry: TypeRegistry) -> Result<RirModule> {
    let mut lowering = AstLowering::new(registry);
    lowering.lower_program(program)
}
