mod exprs;
mod stmts;

use crate::ast::{Block, Function, FunctionBody, Item, Parameter, Program};
use rive_core::types::{TypeId, TypeRegistry};
use rive_core::{Error, Result, Span};
use rive_lexer::{Lexer, Token, TokenKind};

/// Single-lookahead recursive-descent parser over a streaming [`Lexer`].
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Token,
    registry: TypeRegistry,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Result<Self> {
        Self::from_parts(src, 0, TypeRegistry::new())
    }

    /// Parser over a source fragment at `base_offset` within the file,
    /// used for string-interpolation bodies.
    pub fn with_base_offset(src: &'a str, base_offset: usize) -> Result<Self> {
        Self::from_parts(src, base_offset, TypeRegistry::new())
    }

    fn from_parts(src: &'a str, base_offset: usize, registry: TypeRegistry) -> Result<Self> {
        let mut lexer = Lexer::with_base_offset(src, base_offset);
        let lookahead = lexer.next_token()?;
        Ok(Self {
            lexer,
            lookahead,
            registry,
        })
    }

    pub fn type_registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn into_type_registry(self) -> TypeRegistry {
        self.registry
    }

    pub fn parse_program(&mut self) -> Result<Program> {
        let mut items = Vec::new();
        while !self.at(&TokenKind::Eof) {
            items.push(self.parse_item()?);
        }
        Ok(Program { items })
    }

    /// Parses one expression spanning the whole input.
    pub fn parse_expr_eof(&mut self) -> Result<crate::ast::Expression> {
        let expr = self.parse_expression()?;
        if !self.at(&TokenKind::Eof) {
            return Err(self.error_here(format!(
                "expected end of expression, found {}",
                self.lookahead.kind.describe()
            )));
        }
        Ok(expr)
    }

    fn parse_item(&mut self) -> Result<Item> {
        if self.at(&TokenKind::KwFun) {
            Ok(Item::Function(self.parse_function()?))
        } else {
            Err(self.error_here(format!(
                "expected function declaration, found {}",
                self.lookahead.kind.describe()
            )))
        }
    }

    fn parse_function(&mut self) -> Result<Function> {
        let start = self.expect(TokenKind::KwFun)?.span;
        let (name, _) = self.expect_ident()?;

        self.expect(TokenKind::LParen)?;
        let params = self.parse_parameter_list()?;
        self.expect(TokenKind::RParen)?;

        let return_type = if self.eat(&TokenKind::Colon)? {
            self.parse_type()?
        } else {
            TypeId::UNIT
        };

        // Expression body `= expr` or block body `{ ... }`.
        let (body, end) = if self.eat(&TokenKind::Assign)? {
            let expr = self.parse_expression()?;
            let span = expr.span();
            (FunctionBody::Expression(expr), span)
        } else {
            let block = self.parse_block()?;
            let span = block.span;
            (FunctionBody::Block(block), span)
        };

        Ok(Function {
            name,
            params,
            return_type,
            body,
            span: start.merge(end),
        })
    }

    fn parse_parameter_list(&mut self) -> Result<Vec<Parameter>> {
        let mut params = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                let (name, span) = self.expect_ident()?;
                self.expect(TokenKind::Colon)?;
                let param_type = self.parse_type()?;
                params.push(Parameter {
                    name,
                    param_type,
                    span,
                });
                if !self.eat(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        Ok(params)
    }

    /// Parses a type annotation, interning it in the registry.
    pub(crate) fn parse_type(&mut self) -> Result<TypeId> {
        let base = match self.lookahead.kind.clone() {
            TokenKind::Ident(name) => {
                let span = self.lookahead.span;
                self.bump()?;
                match name.as_str() {
                    "Int" => TypeId::INT,
                    "Float" => TypeId::FLOAT,
                    "Text" => TypeId::TEXT,
                    "Bool" => TypeId::BOOL,
                    _ => {
                        return Err(Error::parse(format!("unknown type `{name}`"), span));
                    }
                }
            }
            TokenKind::LBracket => {
                self.bump()?;
                let element = self.parse_type()?;
                self.expect(TokenKind::Semi)?;
                let size_token = self.bump()?;
                let TokenKind::Int(size) = size_token.kind else {
                    return Err(Error::parse("expected array size", size_token.span));
                };
                let size = usize::try_from(size)
                    .map_err(|_| Error::parse("invalid array size", size_token.span))?;
                self.expect(TokenKind::RBracket)?;
                self.registry.array_of(element, size)
            }
            other => {
                return Err(self.error_here(format!("expected type, found {}", other.describe())));
            }
        };

        if self.eat(&TokenKind::Question)? {
            Ok(self.registry.optional_of(base))
        } else {
            Ok(base)
        }
    }

    pub(crate) fn parse_block(&mut self) -> Result<Block> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut statements = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        let end = self.expect(TokenKind::RBrace)?.span;
        Ok(Block {
            statements,
            span: start.merge(end),
        })
    }

    // ---- token plumbing ----

    pub(crate) fn at(&self, kind: &TokenKind) -> bool {
        &self.lookahead.kind == kind
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.lookahead
    }

    pub(crate) fn bump(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> Result<bool> {
        if self.at(kind) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.at(&kind) {
            self.bump()
        } else {
            Err(self.error_here(format!(
                "expected `{kind}`, found {}",
                self.lookahead.kind.describe()
            )))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Result<(String, Span)> {
        if let TokenKind::Ident(name) = self.lookahead.kind.clone() {
            let token = self.bump()?;
            Ok((name, token.span))
        } else {
            Err(self.error_here(format!(
                "expected identifier, found {}",
                self.lookahead.kind.describe()
            )))
        }
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> Error {
        Error::parse(message, self.lookahead.span)
    }

    /// Re-parses a string-interpolation fragment with the main registry.
    pub(crate) fn parse_embedded_expr(
        &mut self,
        src: &str,
        base_offset: usize,
    ) -> Result<crate::ast::Expression> {
        let registry = std::mem::take(&mut self.registry);
        let mut sub = Parser::from_parts(src, base_offset, registry)?;
        let result = sub.parse_expr_eof();
        self.registry = sub.into_type_registry();
        result
    }
}
