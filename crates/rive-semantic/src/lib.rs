#![forbid(unsafe_code)]

//! Semantic analysis for Rive programs: symbol resolution, mutability
//! enforcement, and type checking over the AST.
//!
//! The checker may intern new types (nullable wrappers, function types),
//! so it takes the registry produced by the parser and hands it back
//! extended for the lowering stage.

mod checker;
mod symbols;

pub use checker::TypeChecker;
pub use symbols::{Symbol, SymbolTable};

use rive_core::types::TypeRegistry;
use rive_core::Result;
use rive_parser::ast::Program;

/// Checks a whole program, returning the (possibly extended) registry.
pub fn analyze(program: &Program, registry: TypeRegistry) -> Result<TypeRegistry> {
    let mut checker = TypeChecker::new(registry);
    checker.check_program(program)?;
    Ok(checker.into_type_registry())
}
