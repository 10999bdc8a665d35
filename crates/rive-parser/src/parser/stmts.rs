use super::Parser;
use crate::ast::{Expression, Statement};
use crate::control_flow::{Break, Continue};
use rive_core::types::TypeId;
use rive_core::Result;
use rive_lexer::TokenKind;

impl<'a> Parser<'a> {
    pub(crate) fn parse_statement(&mut self) -> Result<Statement> {
        match self.peek().kind {
            TokenKind::KwLet => self.parse_let(),
            TokenKind::KwConst => self.parse_const(),
            TokenKind::KwReturn => self.parse_return(),
            TokenKind::KwBreak => self.parse_break(),
            TokenKind::KwContinue => self.parse_continue(),
            _ => self.parse_expression_or_assignment(),
        }
    }

    fn parse_let(&mut self) -> Result<Statement> {
        let start = self.expect(TokenKind::KwLet)?.span;
        let mutable = self.eat(&TokenKind::KwMut)?;
        let (name, _) = self.expect_ident()?;

        let infer_nullable = self.eat(&TokenKind::Question)?;
        let var_type = self.parse_binding_annotation(&name, infer_nullable)?;

        self.expect(TokenKind::Assign)?;
        let initializer = self.parse_expression()?;
        let span = start.merge(initializer.span());

        Ok(Statement::Let {
            name,
            mutable,
            infer_nullable,
            var_type,
            initializer,
            span,
        })
    }

    fn parse_const(&mut self) -> Result<Statement> {
        let start = self.expect(TokenKind::KwConst)?.span;
        if self.at(&TokenKind::KwMut) {
            return Err(self.error_here("`const` bindings cannot be `mut`"));
        }
        let (name, _) = self.expect_ident()?;

        let infer_nullable = self.eat(&TokenKind::Question)?;
        let var_type = self.parse_binding_annotation(&name, infer_nullable)?;

        self.expect(TokenKind::Assign)?;
        let initializer = self.parse_expression()?;
        let span = start.merge(initializer.span());

        Ok(Statement::Const {
            name,
            infer_nullable,
            var_type,
            initializer,
            span,
        })
    }

    /// Parses the optional `: Type` of a binding, rejecting the
    /// `name?: Type` combination (`name?` already infers nullability).
    fn parse_binding_annotation(
        &mut self,
        name: &str,
        infer_nullable: bool,
    ) -> Result<Option<TypeId>> {
        // `name?:` lexes the `?:` as elvis; catch it for a better message.
        if self.at(&TokenKind::Elvis) || (infer_nullable && self.at(&TokenKind::Colon)) {
            return Err(self.error_here(format!(
                "cannot combine `{name}?` with an explicit type annotation; \
                 write `: Type?` instead"
            )));
        }
        if self.eat(&TokenKind::Colon)? {
            Ok(Some(self.parse_type()?))
        } else {
            Ok(None)
        }
    }

    fn parse_return(&mut self) -> Result<Statement> {
        let start = self.expect(TokenKind::KwReturn)?.span;
        let value = if self.at(&TokenKind::RBrace) || self.at(&TokenKind::Eof) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let span = value.as_ref().map_or(start, |v| start.merge(v.span()));
        Ok(Statement::Return { value, span })
    }

    fn parse_break(&mut self) -> Result<Statement> {
        let start = self.expect(TokenKind::KwBreak)?.span;
        let (value, span) = if self.eat(&TokenKind::KwWith)? {
            let expr = self.parse_expression()?;
            let span = start.merge(expr.span());
            (Some(Box::new(expr)), span)
        } else {
            (None, start)
        };
        Ok(Statement::Break(Break { value, span }))
    }

    fn parse_continue(&mut self) -> Result<Statement> {
        let span = self.expect(TokenKind::KwContinue)?.span;
        Ok(Statement::Continue(Continue { span }))
    }

    /// Parses an expression statement, re-interpreting `lhs = rhs` as an
    /// assignment when the left side is a valid target.
    fn parse_expression_or_assignment(&mut self) -> Result<Statement> {
        let expression = self.parse_expression()?;

        if !self.eat(&TokenKind::Assign)? {
            let span = expression.span();
            return Ok(Statement::Expression { expression, span });
        }

        let value = self.parse_expression()?;
        let span = expression.span().merge(value.span());
        match expression {
            Expression::Variable { name, .. } => Ok(Statement::Assign { name, value, span }),
            Expression::Index { array, index, .. } => match *array {
                Expression::Variable { name, .. } => Ok(Statement::AssignIndex {
                    name,
                    index: *index,
                    value,
                    span,
                }),
                other => Err(rive_core::Error::parse(
                    "invalid assignment target: only variables and their elements are assignable",
                    other.span(),
                )),
            },
            other => Err(rive_core::Error::parse(
                "invalid assignment target",
                other.span(),
            )),
        }
    }
}
