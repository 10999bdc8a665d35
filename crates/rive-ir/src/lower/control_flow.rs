use super::{AstLowering, BlockCtx, LoopFrame};
use crate::{RirBlock, RirExpression, RirPattern, RirStatement};
use rive_core::types::TypeId;
use rive_core::{Error, Result};
use rive_parser::ast::Expression;
use rive_parser::control_flow::{Break, For, If, Loop, Match, Pattern, While};

impl AstLowering {
    /// Lowers a value-position `if`, flattening the else-if chain into
    /// nested if-expressions and coercing every branch to the joined type.
    pub(crate) fn lower_if_expr(&mut self, if_expr: &If) -> Result<RirExpression> {
        let condition = self.lower_expression(&if_expr.condition)?;
        let then_block = self.lower_block(&if_expr.then_block, BlockCtx::Value)?;

        let else_ast = if_expr
            .else_block
            .as_ref()
            .ok_or_else(|| Error::lower("`if` expression without `else`", if_expr.span))?;
        let mut else_block = self.lower_block(else_ast, BlockCtx::Value)?;

        // Fold else-if branches from the back into nested expressions.
        for branch in if_expr.else_if_branches.iter().rev() {
            let branch_cond = self.lower_expression(&branch.condition)?;
            let branch_then = self.lower_block(&branch.block, BlockCtx::Value)?;
            let result_type =
                self.join(branch_then.value_type(), else_block.value_type());
            let nested = RirExpression::If {
                condition: Box::new(branch_cond),
                then_block: branch_then,
                else_block,
                result_type,
                span: branch.span,
            };
            let mut wrapper = RirBlock::new(branch.span);
            wrapper.final_expr = Some(Box::new(nested));
            else_block = wrapper;
        }

        let result_type = self.join(then_block.value_type(), else_block.value_type());
        let mut then_block = then_block;
        let mut else_block = else_block;
        self.coerce_block_value(&mut then_block, result_type);
        self.coerce_block_value(&mut else_block, result_type);

        Ok(RirExpression::If {
            condition: Box::new(condition),
            then_block,
            else_block,
            result_type,
            span: if_expr.span,
        })
    }

    /// Lowers a statement-position `if`, nesting the else-if chain.
    pub(crate) fn lower_if_stmt(&mut self, if_expr: &If) -> Result<RirStatement> {
        let condition = self.lower_expression(&if_expr.condition)?;
        let then_block = self.lower_block(&if_expr.then_block, BlockCtx::Stmt)?;

        let mut else_block = if_expr
            .else_block
            .as_ref()
            .map(|block| self.lower_block(block, BlockCtx::Stmt))
            .transpose()?;

        for branch in if_expr.else_if_branches.iter().rev() {
            let branch_cond = self.lower_expression(&branch.condition)?;
            let branch_then = self.lower_block(&branch.block, BlockCtx::Stmt)?;
            let nested = RirStatement::If {
                condition: Box::new(branch_cond),
                then_block: branch_then,
                else_block,
                span: branch.span,
            };
            else_block = Some(RirBlock::with_statements(vec![nested], branch.span));
        }

        Ok(RirStatement::If {
            condition: Box::new(condition),
            then_block,
            else_block,
            span: if_expr.span,
        })
    }

    pub(crate) fn lower_while_stmt(&mut self, while_loop: &While) -> Result<RirStatement> {
        let condition = self.lower_expression(&while_loop.condition)?;
        self.loops.push(LoopFrame {
            is_loop: false,
            break_type: None,
        });
        let body = self.lower_block(&while_loop.body, BlockCtx::Stmt);
        self.loops.pop();
        Ok(RirStatement::While {
            condition: Box::new(condition),
            body: body?,
            span: while_loop.span,
        })
    }

    pub(crate) fn lower_for_stmt(&mut self, for_loop: &For) -> Result<RirStatement> {
        let Expression::Range(range) = for_loop.iterable.as_ref() else {
            return Err(Error::lower(
                "`for` loop iterable must be a range",
                for_loop.iterable.span(),
            ));
        };
        let start = self.lower_expression(&range.start)?;
        let end = self.lower_expression(&range.end)?;

        self.enter_scope();
        self.define(for_loop.variable.clone(), TypeId::INT, false);
        self.loops.push(LoopFrame {
            is_loop: false,
            break_type: None,
        });
        let body = self.lower_block(&for_loop.body, BlockCtx::Stmt);
        self.loops.pop();
        self.exit_scope();

        Ok(RirStatement::For {
            variable: for_loop.variable.clone(),
            start: Box::new(start),
            end: Box::new(end),
            inclusive: range.inclusive,
            body: body?,
            span: for_loop.span,
        })
    }

    /// Lowers a `loop`. Its type is the joined type of its `break with`
    /// statements; once known, every break value is coerced to it.
    pub(crate) fn lower_loop_expr(&mut self, loop_expr: &Loop) -> Result<RirExpression> {
        self.loops.push(LoopFrame {
            is_loop: true,
            break_type: None,
        });
        let body = self.lower_block(&loop_expr.body, BlockCtx::Stmt);
        let frame = self.loops.pop().expect("loop frame pushed above");
        let mut body = body?;

        let result_type = frame.break_type.unwrap_or(TypeId::UNIT);
        if result_type != TypeId::UNIT {
            self.coerce_breaks_in_block(&mut body, result_type);
        }

        Ok(RirExpression::Loop {
            body,
            result_type,
            span: loop_expr.span,
        })
    }

    pub(crate) fn lower_break(&mut self, break_stmt: &Break) -> Result<RirStatement> {
        let value = break_stmt
            .value
            .as_ref()
            .map(|expr| self.lower_expression(expr))
            .transpose()?;

        if let Some(value) = &value {
            let value_type = value.type_id();
            let innermost = self.loops.last().copied();
            if let Some(frame) = innermost {
                if frame.is_loop {
                    let joined = match frame.break_type {
                        Some(existing) => self.join(existing, value_type),
                        None => value_type,
                    };
                    if let Some(frame) = self.loops.last_mut() {
                        frame.break_type = Some(joined);
                    }
                }
            }
        }

        Ok(RirStatement::Break {
            value: value.map(Box::new),
            span: break_stmt.span,
        })
    }

    pub(crate) fn lower_match_expr(&mut self, match_expr: &Match) -> Result<RirExpression> {
        let scrutinee = self.lower_expression(&match_expr.scrutinee)?;

        let mut arms = Vec::with_capacity(match_expr.arms.len());
        let mut result_type: Option<TypeId> = None;
        for arm in &match_expr.arms {
            let pattern = self.lower_patterns(&arm.patterns)?;
            let body = self.lower_expression(&arm.body)?;
            result_type = Some(match result_type {
                Some(existing) => self.join(existing, body.type_id()),
                None => body.type_id(),
            });
            arms.push((pattern, Box::new(body)));
        }
        let result_type = result_type.unwrap_or(TypeId::UNIT);

        let arms = arms
            .into_iter()
            .map(|(pattern, body)| {
                let coerced = self.coerce(*body, result_type);
                (pattern, Box::new(coerced))
            })
            .collect();

        Ok(RirExpression::Match {
            scrutinee: Box::new(scrutinee),
            arms,
            result_type,
            span: match_expr.span,
        })
    }

    pub(crate) fn lower_match_stmt(&mut self, match_expr: &Match) -> Result<RirStatement> {
        let scrutinee = self.lower_expression(&match_expr.scrutinee)?;

        let mut arms = Vec::with_capacity(match_expr.arms.len());
        for arm in &match_expr.arms {
            let pattern = self.lower_patterns(&arm.patterns)?;
            let body = self.lower_arm_body_stmt(&arm.body)?;
            arms.push((pattern, body));
        }

        Ok(RirStatement::Match {
            scrutinee: Box::new(scrutinee),
            arms,
            span: match_expr.span,
        })
    }

    /// A statement-position arm body becomes a block of statements.
    fn lower_arm_body_stmt(&mut self, body: &Expression) -> Result<RirBlock> {
        match body {
            Expression::Block(block) => self.lower_block(block, BlockCtx::Stmt),
            Expression::If(if_expr) => {
                let stmt = self.lower_if_stmt(if_expr)?;
                Ok(RirBlock::with_statements(vec![stmt], if_expr.span))
            }
            Expression::Match(match_expr) => {
                let stmt = self.lower_match_stmt(match_expr)?;
                Ok(RirBlock::with_statements(vec![stmt], match_expr.span))
            }
            other => {
                let lowered = self.lower_expression(other)?;
                let stmt = self.demote_to_statement(lowered);
                let span = stmt.span();
                Ok(RirBlock::with_statements(vec![stmt], span))
            }
        }
    }

    fn lower_patterns(&mut self, patterns: &[Pattern]) -> Result<RirPattern> {
        let mut lowered = patterns
            .iter()
            .map(|pattern| self.lower_pattern(pattern))
            .collect::<Result<Vec<_>>>()?;
        if lowered.len() == 1 {
            Ok(lowered.remove(0))
        } else {
            let span = patterns
                .first()
                .map(Pattern::span)
                .unwrap_or(rive_core::Span::at(0))
                .merge(patterns.last().map(Pattern::span).unwrap_or(rive_core::Span::at(0)));
            Ok(RirPattern::Or {
                patterns: lowered,
                span,
            })
        }
    }

    fn lower_pattern(&mut self, pattern: &Pattern) -> Result<RirPattern> {
        match pattern {
            Pattern::Int { value, span } => Ok(RirPattern::IntLiteral {
                value: *value,
                span: *span,
            }),
            Pattern::Text { value, span } => Ok(RirPattern::StringLiteral {
                value: value.clone(),
                span: *span,
            }),
            Pattern::Bool { value, span } => Ok(RirPattern::BoolLiteral {
                value: *value,
                span: *span,
            }),
            Pattern::Wildcard { span } => Ok(RirPattern::Wildcard { span: *span }),
            Pattern::Float { span, .. } => Err(Error::lower(
                "`Float` values cannot be matched by pattern",
                *span,
            )),
            Pattern::Range {
                start,
                end,
                inclusive,
                span,
            } => {
                let start = pattern_bound(start)?;
                let end = pattern_bound(end)?;
                Ok(RirPattern::Range {
                    start,
                    end,
                    inclusive: *inclusive,
                    span: *span,
                })
            }
        }
    }

    /// Coerces a block's trailing value to `target`.
    fn coerce_block_value(&mut self, block: &mut RirBlock, target: TypeId) {
        if let Some(final_expr) = block.final_expr.take() {
            let coerced = self.coerce(*final_expr, target);
            block.final_expr = Some(Box::new(coerced));
        }
    }

    /// Rewrites the `break with` values belonging to the current loop so
    /// they carry the loop's joined result type. Nested loops own their
    /// breaks and are skipped.
    fn coerce_breaks_in_block(&mut self, block: &mut RirBlock, target: TypeId) {
        for statement in &mut block.statements {
            self.coerce_breaks_in_stmt(statement, target);
        }
        let final_expr = block.final_expr.take();
        if let Some(mut final_expr) = final_expr {
            self.coerce_breaks_in_expr(&mut final_expr, target);
            block.final_expr = Some(final_expr);
        }
    }

    fn coerce_breaks_in_stmt(&mut self, statement: &mut RirStatement, target: TypeId) {
        match statement {
            RirStatement::Break { value: Some(value), .. } => {
                let old = std::mem::replace(
                    value.as_mut(),
                    RirExpression::Unit {
                        span: rive_core::Span::at(0),
                    },
                );
                **value = self.coerce(old, target);
            }
            RirStatement::If {
                then_block,
                else_block,
                ..
            } => {
                self.coerce_breaks_in_block(then_block, target);
                if let Some(else_block) = else_block {
                    self.coerce_breaks_in_block(else_block, target);
                }
            }
            RirStatement::Match { arms, .. } => {
                for (_, body) in arms {
                    self.coerce_breaks_in_block(body, target);
                }
            }
            RirStatement::Block { block, .. } => self.coerce_breaks_in_block(block, target),
            RirStatement::Let { value, .. }
            | RirStatement::Assign { value, .. }
            | RirStatement::Expression { expr: value, .. } => {
                self.coerce_breaks_in_expr(value, target);
            }
            // Nested loops capture their own breaks.
            RirStatement::While { .. }
            | RirStatement::For { .. }
            | RirStatement::Loop { .. }
            | RirStatement::Return { .. }
            | RirStatement::Break { .. }
            | RirStatement::Continue { .. }
            | RirStatement::AssignIndex { .. } => {}
        }
    }

    /// Descends into block-bearing expressions looking for break
    /// statements of the current loop.
    fn coerce_breaks_in_expr(&mut self, expr: &mut RirExpression, target: TypeId) {
        match expr {
            RirExpression::If {
                then_block,
                else_block,
                ..
            } => {
                self.coerce_breaks_in_block(then_block, target);
                self.coerce_breaks_in_block(else_block, target);
            }
            RirExpression::Match { arms, .. } => {
                for (_, body) in arms {
                    self.coerce_breaks_in_expr(body, target);
                }
            }
            RirExpression::Block { block, .. } => {
                self.coerce_breaks_in_block(block, target);
            }
            _ => {}
        }
    }
}

fn pattern_bound(bound: &Expression) -> Result<i64> {
    match bound {
        Expression::Int { value, .. } => Ok(*value),
        other => Err(Error::lower(
            "range pattern bounds must be `Int` literals",
            other.span(),
        )),
    }
}
