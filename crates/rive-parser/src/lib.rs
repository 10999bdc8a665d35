#![forbid(unsafe_code)]

//! Recursive-descent parser for the Rive language.
//!
//! Parsing turns source text into the [`ast`] and interns every type
//! annotation it sees, so the result is an AST plus the populated
//! [`TypeRegistry`].

pub mod ast;
pub mod control_flow;
mod parser;

pub use parser::Parser;

use ast::Program;
use rive_core::types::TypeRegistry;
use rive_core::Result;

/// Parses Rive source into a program AST and its type registry.
pub fn parse(source: &str) -> Result<(Program, TypeRegistry)> {
    let mut parser = Parser::new(source)?;
    let program = parser.parse_program()?;
    Ok((program, parser.into_type_registry()))
}
