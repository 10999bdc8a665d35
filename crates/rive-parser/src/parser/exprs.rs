use super::Parser;
use crate::ast::{BinaryOperator, Expression, StringPart, UnaryOperator};
use crate::control_flow::{ElseIf, For, If, Loop, Match, MatchArm, Pattern, Range, While};
use rive_core::{Error, Result};
use rive_lexer::{StrPart, TokenKind};

impl<'a> Parser<'a> {
    pub(crate) fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_elvis()
    }

    /// `value ?: fallback` — lowest precedence, left-associative.
    fn parse_elvis(&mut self) -> Result<Expression> {
        let mut expr = self.parse_or()?;
        while self.eat(&TokenKind::Elvis)? {
            let fallback = self.parse_or()?;
            let span = expr.span().merge(fallback.span());
            expr = Expression::Elvis {
                value: Box::new(expr),
                fallback: Box::new(fallback),
                span,
            };
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut expr = self.parse_and()?;
        while self.eat(&TokenKind::OrOr)? {
            let right = self.parse_and()?;
            expr = binary(expr, BinaryOperator::Or, right);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut expr = self.parse_equality()?;
        while self.eat(&TokenKind::AndAnd)? {
            let right = self.parse_equality()?;
            expr = binary(expr, BinaryOperator::And, right);
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut expr = self.parse_comparison()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::EqEq => BinaryOperator::Equal,
                TokenKind::NotEq => BinaryOperator::NotEqual,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_comparison()?;
            expr = binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let mut expr = self.parse_term()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Lt => BinaryOperator::Less,
                TokenKind::LtEq => BinaryOperator::LessEqual,
                TokenKind::Gt => BinaryOperator::Greater,
                TokenKind::GtEq => BinaryOperator::GreaterEqual,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_term()?;
            expr = binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expression> {
        let mut expr = self.parse_range()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_range()?;
            expr = binary(expr, operator, right);
        }
        Ok(expr)
    }

    /// `start..end` / `start..=end`, binding tighter than `+`/`-`.
    fn parse_range(&mut self) -> Result<Expression> {
        let expr = self.parse_factor()?;
        let inclusive = match self.peek().kind {
            TokenKind::DotDot => false,
            TokenKind::DotDotEq => true,
            _ => return Ok(expr),
        };
        self.bump()?;
        let end = self.parse_factor()?;
        let span = expr.span().merge(end.span());
        Ok(Expression::Range(Box::new(Range {
            start: Box::new(expr),
            end: Box::new(end),
            inclusive,
            span,
        })))
    }

    fn parse_factor(&mut self) -> Result<Expression> {
        let mut expr = self.parse_unary()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                TokenKind::Percent => BinaryOperator::Modulo,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_unary()?;
            expr = binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let operator = match self.peek().kind {
            TokenKind::Minus => UnaryOperator::Negate,
            TokenKind::Bang => UnaryOperator::Not,
            _ => return self.parse_postfix(),
        };
        let start = self.bump()?.span;
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span());
        Ok(Expression::Unary {
            operator,
            operand: Box::new(operand),
            span,
        })
    }

    /// Calls `f(args)` and indexing `a[i]`, left to right.
    fn parse_postfix(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.at(&TokenKind::LParen) {
                self.bump()?;
                let arguments = self.parse_argument_list()?;
                let end = self.expect(TokenKind::RParen)?.span;

                let Expression::Variable { name, .. } = &expr else {
                    return Err(Error::parse(
                        "only identifiers can be called",
                        expr.span(),
                    ));
                };
                let span = expr.span().merge(end);
                expr = Expression::Call {
                    callee: name.clone(),
                    arguments,
                    span,
                };
            } else if self.at(&TokenKind::LBracket) {
                self.bump()?;
                let index = self.parse_expression()?;
                let end = self.expect(TokenKind::RBracket)?.span;
                let span = expr.span().merge(end);
                expr = Expression::Index {
                    array: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_argument_list(&mut self) -> Result<Vec<Expression>> {
        let mut arguments = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                arguments.push(self.parse_expression()?);
                if !self.eat(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let span = self.peek().span;
        match self.peek().kind.clone() {
            TokenKind::Int(value) => {
                self.bump()?;
                Ok(Expression::Int { value, span })
            }
            TokenKind::Float(value) => {
                self.bump()?;
                Ok(Expression::Float { value, span })
            }
            TokenKind::Str(parts) => {
                self.bump()?;
                self.build_string(parts, span)
            }
            TokenKind::KwTrue => {
                self.bump()?;
                Ok(Expression::Bool { value: true, span })
            }
            TokenKind::KwFalse => {
                self.bump()?;
                Ok(Expression::Bool { value: false, span })
            }
            TokenKind::KwNull => {
                self.bump()?;
                Ok(Expression::Null { span })
            }
            TokenKind::Ident(name) => {
                self.bump()?;
                Ok(Expression::Variable { name, span })
            }
            TokenKind::LParen => {
                self.bump()?;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.bump()?;
                let mut elements = Vec::new();
                if !self.at(&TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if !self.eat(&TokenKind::Comma)? {
                            break;
                        }
                    }
                }
                let end = self.expect(TokenKind::RBracket)?.span;
                Ok(Expression::Array {
                    elements,
                    span: span.merge(end),
                })
            }
            TokenKind::KwIf => Ok(Expression::If(Box::new(self.parse_if()?))),
            TokenKind::KwWhile => Ok(Expression::While(Box::new(self.parse_while()?))),
            TokenKind::KwFor => Ok(Expression::For(Box::new(self.parse_for()?))),
            TokenKind::KwLoop => Ok(Expression::Loop(Box::new(self.parse_loop()?))),
            TokenKind::KwMatch => Ok(Expression::Match(Box::new(self.parse_match()?))),
            other => Err(self.error_here(format!("unexpected token {}", other.describe()))),
        }
    }

    /// Turns lexer string parts into a literal or interpolation node,
    /// re-parsing embedded expressions at their original offsets.
    fn build_string(
        &mut self,
        parts: Vec<StrPart>,
        span: rive_core::Span,
    ) -> Result<Expression> {
        let only_text = parts
            .iter()
            .all(|part| matches!(part, StrPart::Text(_)));
        if only_text {
            let value = parts
                .into_iter()
                .map(|part| match part {
                    StrPart::Text(text) => text,
                    StrPart::Expr { .. } => unreachable!("filtered above"),
                })
                .collect::<String>();
            return Ok(Expression::Text { value, span });
        }

        let mut ast_parts = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                StrPart::Text(text) => ast_parts.push(StringPart::Text(text)),
                StrPart::Expr { src, base_offset } => {
                    let expr = self.parse_embedded_expr(&src, base_offset)?;
                    ast_parts.push(StringPart::Expr(expr));
                }
            }
        }
        Ok(Expression::Interpolation {
            parts: ast_parts,
            span,
        })
    }

    // ---- control flow ----

    pub(crate) fn parse_if(&mut self) -> Result<If> {
        let start = self.expect(TokenKind::KwIf)?.span;
        let condition = Box::new(self.parse_expression()?);
        let then_block = self.parse_block()?;

        let mut else_if_branches = Vec::new();
        let mut else_block = None;
        while self.at(&TokenKind::KwElse) {
            self.bump()?;
            if self.at(&TokenKind::KwIf) {
                let branch_start = self.expect(TokenKind::KwIf)?.span;
                let condition = Box::new(self.parse_expression()?);
                let block = self.parse_block()?;
                let branch_span = branch_start.merge(block.span);
                else_if_branches.push(ElseIf {
                    condition,
                    block,
                    span: branch_span,
                });
            } else {
                else_block = Some(self.parse_block()?);
                break;
            }
        }

        let end = else_block.as_ref().map_or_else(
            || {
                else_if_branches
                    .last()
                    .map_or(then_block.span, |branch| branch.span)
            },
            |block| block.span,
        );

        Ok(If {
            condition,
            then_block,
            else_if_branches,
            else_block,
            span: start.merge(end),
        })
    }

    fn parse_while(&mut self) -> Result<While> {
        let start = self.expect(TokenKind::KwWhile)?.span;
        let condition = Box::new(self.parse_expression()?);
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Ok(While {
            condition,
            body,
            span,
        })
    }

    fn parse_for(&mut self) -> Result<For> {
        let start = self.expect(TokenKind::KwFor)?.span;
        let (variable, _) = self.expect_ident()?;
        self.expect(TokenKind::KwIn)?;
        let iterable = Box::new(self.parse_expression()?);
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Ok(For {
            variable,
            iterable,
            body,
            span,
        })
    }

    fn parse_loop(&mut self) -> Result<Loop> {
        let start = self.expect(TokenKind::KwLoop)?.span;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Ok(Loop { body, span })
    }

    fn parse_match(&mut self) -> Result<Match> {
        let start = self.expect(TokenKind::KwMatch)?.span;
        let scrutinee = Box::new(self.parse_expression()?);
        self.expect(TokenKind::LBrace)?;

        let mut arms = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            arms.push(self.parse_match_arm()?);
            // Optional separating comma.
            self.eat(&TokenKind::Comma)?;
        }
        let end = self.expect(TokenKind::RBrace)?.span;

        if arms.is_empty() {
            return Err(Error::parse(
                "match expression must have at least one arm",
                start.merge(end),
            ));
        }

        Ok(Match {
            scrutinee,
            arms,
            span: start.merge(end),
        })
    }

    fn parse_match_arm(&mut self) -> Result<MatchArm> {
        let start = self.peek().span;

        let mut patterns = vec![self.parse_pattern()?];
        while self.eat(&TokenKind::Comma)? {
            patterns.push(self.parse_pattern()?);
        }

        self.expect(TokenKind::Arrow)?;
        let body = if self.at(&TokenKind::LBrace) {
            Expression::Block(Box::new(self.parse_block()?))
        } else {
            self.parse_expression()?
        };
        let span = start.merge(body.span());

        Ok(MatchArm {
            patterns,
            body: Box::new(body),
            span,
        })
    }

    fn parse_pattern(&mut self) -> Result<Pattern> {
        let span = self.peek().span;
        match self.peek().kind.clone() {
            TokenKind::Underscore => {
                self.bump()?;
                Ok(Pattern::Wildcard { span })
            }
            TokenKind::Int(value) => {
                self.bump()?;
                Ok(Pattern::Int { value, span })
            }
            TokenKind::Float(value) => {
                self.bump()?;
                Ok(Pattern::Float { value, span })
            }
            TokenKind::Minus => {
                self.bump()?;
                let literal = self.bump()?;
                let span = span.merge(literal.span);
                match literal.kind {
                    TokenKind::Int(value) => Ok(Pattern::Int {
                        value: -value,
                        span,
                    }),
                    TokenKind::Float(value) => Ok(Pattern::Float {
                        value: -value,
                        span,
                    }),
                    other => Err(Error::parse(
                        format!("expected numeric literal after `-`, found {}", other.describe()),
                        literal.span,
                    )),
                }
            }
            TokenKind::Str(parts) => {
                self.bump()?;
                let value = text_only(parts).ok_or_else(|| {
                    Error::parse("string patterns cannot contain interpolation", span)
                })?;
                Ok(Pattern::Text { value, span })
            }
            TokenKind::KwTrue => {
                self.bump()?;
                Ok(Pattern::Bool { value: true, span })
            }
            TokenKind::KwFalse => {
                self.bump()?;
                Ok(Pattern::Bool { value: false, span })
            }
            TokenKind::KwIn => self.parse_range_pattern(),
            other => Err(self.error_here(format!(
                "expected pattern (literal, `_`, or `in range`), found {}",
                other.describe()
            ))),
        }
    }

    /// `in start..end` / `in start..=end`; bounds must be numeric
    /// literals so they stay valid Rust range patterns.
    fn parse_range_pattern(&mut self) -> Result<Pattern> {
        let start_span = self.expect(TokenKind::KwIn)?.span;
        let start = self.parse_pattern_bound()?;

        let inclusive = match self.peek().kind {
            TokenKind::DotDot => false,
            TokenKind::DotDotEq => true,
            _ => return Err(self.error_here("expected `..` or `..=`")),
        };
        self.bump()?;

        let end = self.parse_pattern_bound()?;
        let span = start_span.merge(end.span());

        Ok(Pattern::Range {
            start: Box::new(start),
            end: Box::new(end),
            inclusive,
            span,
        })
    }

    fn parse_pattern_bound(&mut self) -> Result<Expression> {
        let span = self.peek().span;
        let negate = self.eat(&TokenKind::Minus)?;
        let token = self.bump()?;
        match token.kind {
            TokenKind::Int(value) => Ok(Expression::Int {
                value: if negate { -value } else { value },
                span: span.merge(token.span),
            }),
            TokenKind::Float(value) => Ok(Expression::Float {
                value: if negate { -value } else { value },
                span: span.merge(token.span),
            }),
            other => Err(Error::parse(
                format!("range bounds must be numeric literals, found {}", other.describe()),
                token.span,
            )),
        }
    }
}

fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
    let span = left.span().merge(right.span());
    Expression::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        span,
    }
}

fn text_only(parts: Vec<StrPart>) -> Option<String> {
    let mut out = String::new();
    for part in parts {
        match part {
            StrPart::Text(text) => out.push_str(&text),
            StrPart::Expr { .. } => return None,
        }
    }
    Some(out)
}
