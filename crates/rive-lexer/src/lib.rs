#![forbid(unsafe_code)]

//! Lexical analysis for the Rive language.
//!
//! The parser drives [`Lexer`] as a stream; [`tokenize`] scans a whole
//! input at once for tests and tooling.

mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{StrPart, Token, TokenKind};

use rive_core::Result;

/// Scans `source` to completion, returning every token including the
/// trailing [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = matches!(token.kind, TokenKind::Eof);
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
