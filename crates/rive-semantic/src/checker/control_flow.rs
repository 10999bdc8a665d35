use super::TypeChecker;
use rive_core::types::TypeId;
use rive_core::{Error, Result, Span};
use rive_parser::ast::Expression;
use rive_parser::control_flow::{Break, Continue, For, If, Loop, Match, Pattern, While};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LoopKind {
    While,
    For,
    Loop,
}

/// One entry per enclosing loop; `break_value` accumulates the agreed
/// `break with` type of a `loop`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LoopContext {
    pub(crate) kind: LoopKind,
    pub(crate) break_value: Option<TypeId>,
}

impl TypeChecker {
    /// Checks an `if`. In expression position (`as_expr`) an `else` is
    /// required and every branch must agree on one type.
    pub(crate) fn check_if(&mut self, if_expr: &If, as_expr: bool) -> Result<TypeId> {
        self.check_condition(&if_expr.condition)?;
        let then_type = self.check_block(&if_expr.then_block)?;

        let mut result = then_type;
        for branch in &if_expr.else_if_branches {
            self.check_condition(&branch.condition)?;
            let branch_type = self.check_block(&branch.block)?;
            if as_expr {
                result = self.join_types(result, branch_type, branch.span, "if branches")?;
            }
        }

        match &if_expr.else_block {
            Some(else_block) => {
                let else_type = self.check_block(else_block)?;
                if as_expr {
                    result = self.join_types(result, else_type, if_expr.span, "if branches")?;
                }
            }
            None if as_expr => {
                return Err(Error::semantic(
                    "`if` used as an expression must have an `else` branch",
                    if_expr.span,
                ));
            }
            None => {}
        }

        Ok(if as_expr { result } else { TypeId::UNIT })
    }

    pub(crate) fn check_while(&mut self, while_loop: &While) -> Result<TypeId> {
        self.check_condition(&while_loop.condition)?;
        self.loop_stack.push(LoopContext {
            kind: LoopKind::While,
            break_value: None,
        });
        let result = self.check_block(&while_loop.body);
        self.loop_stack.pop();
        result?;
        Ok(TypeId::UNIT)
    }

    pub(crate) fn check_for(&mut self, for_loop: &For) -> Result<TypeId> {
        let Expression::Range(range) = for_loop.iterable.as_ref() else {
            return Err(Error::semantic(
                "`for` loop iterable must be a range",
                for_loop.iterable.span(),
            ));
        };

        let start_type = self.check_expression(&range.start)?;
        let end_type = self.check_expression(&range.end)?;
        for (ty, expr) in [(start_type, &range.start), (end_type, &range.end)] {
            if ty != TypeId::INT {
                return Err(Error::semantic(
                    format!(
                        "range bounds must be `Int`, found `{}`",
                        self.registry.display_name(ty)
                    ),
                    expr.span(),
                ));
            }
        }

        self.symbols.enter_scope();
        self.define(
            crate::symbols::Symbol::new(for_loop.variable.clone(), TypeId::INT, false),
            for_loop.span,
        )?;
        self.loop_stack.push(LoopContext {
            kind: LoopKind::For,
            break_value: None,
        });
        let result = self.check_block(&for_loop.body);
        self.loop_stack.pop();
        self.symbols.exit_scope();
        result?;
        Ok(TypeId::UNIT)
    }

    /// `loop` is the one loop form with a value: its type is the agreed
    /// type of its `break with` statements, `Unit` when it has none.
    pub(crate) fn check_loop(&mut self, loop_expr: &Loop) -> Result<TypeId> {
        self.loop_stack.push(LoopContext {
            kind: LoopKind::Loop,
            break_value: None,
        });
        let body = self.check_block(&loop_expr.body);
        let context = self.loop_stack.pop().expect("loop context pushed above");
        body?;
        Ok(context.break_value.unwrap_or(TypeId::UNIT))
    }

    pub(crate) fn check_break(&mut self, break_stmt: &Break) -> Result<()> {
        if self.loop_stack.is_empty() {
            return Err(Error::semantic("`break` outside of a loop", break_stmt.span));
        }

        let Some(value) = &break_stmt.value else {
            return Ok(());
        };

        let value_type = self.check_expression(value)?;
        let context = self
            .loop_stack
            .last()
            .copied()
            .expect("checked non-empty above");
        if context.kind != LoopKind::Loop {
            return Err(Error::semantic(
                "`break with` is only allowed inside `loop`",
                break_stmt.span,
            ));
        }

        let joined = match context.break_value {
            Some(existing) => {
                self.join_types(existing, value_type, break_stmt.span, "`break with` values")?
            }
            None => value_type,
        };
        if let Some(context) = self.loop_stack.last_mut() {
            context.break_value = Some(joined);
        }
        Ok(())
    }

    pub(crate) fn check_continue(&mut self, continue_stmt: &Continue) -> Result<()> {
        if self.loop_stack.is_empty() {
            return Err(Error::semantic(
                "`continue` outside of a loop",
                continue_stmt.span,
            ));
        }
        Ok(())
    }

    /// Checks a `match`. In expression position all arms must agree on a
    /// type and the match must be exhaustive.
    pub(crate) fn check_match(&mut self, match_expr: &Match, as_expr: bool) -> Result<TypeId> {
        let scrutinee_type = self.check_expression(&match_expr.scrutinee)?;
        if !matches!(scrutinee_type, TypeId::INT | TypeId::TEXT | TypeId::BOOL) {
            return Err(Error::semantic(
                format!(
                    "cannot match on `{}`; match supports `Int`, `Text`, and `Bool`",
                    self.registry.display_name(scrutinee_type)
                ),
                match_expr.scrutinee.span(),
            ));
        }

        let mut result: Option<TypeId> = None;
        let mut saw_wildcard = false;
        let mut saw_true = false;
        let mut saw_false = false;

        for arm in &match_expr.arms {
            for pattern in &arm.patterns {
                self.check_pattern(pattern, scrutinee_type)?;
                match pattern {
                    Pattern::Wildcard { .. } => saw_wildcard = true,
                    Pattern::Bool { value: true, .. } => saw_true = true,
                    Pattern::Bool { value: false, .. } => saw_false = true,
                    _ => {}
                }
            }

            let arm_type = self.check_expression(&arm.body)?;
            if as_expr {
                result = Some(match result {
                    Some(existing) => {
                        self.join_types(existing, arm_type, arm.span, "match arms")?
                    }
                    None => arm_type,
                });
            }
        }

        if as_expr {
            let exhaustive =
                saw_wildcard || (scrutinee_type == TypeId::BOOL && saw_true && saw_false);
            if !exhaustive {
                return Err(Error::semantic(
                    "match used as an expression must end with a `_` arm",
                    match_expr.span,
                ));
            }
        }

        Ok(match result {
            Some(ty) if as_expr => ty,
            _ => TypeId::UNIT,
        })
    }

    fn check_pattern(&mut self, pattern: &Pattern, scrutinee: TypeId) -> Result<()> {
        let expect = |expected: TypeId, span: Span, checker: &Self| {
            if scrutinee == expected {
                Ok(())
            } else {
                Err(Error::semantic(
                    format!(
                        "pattern type `{}` does not match scrutinee type `{}`",
                        checker.registry.display_name(expected),
                        checker.registry.display_name(scrutinee)
                    ),
                    span,
                ))
            }
        };

        match pattern {
            Pattern::Wildcard { .. } => Ok(()),
            Pattern::Int { span, .. } => expect(TypeId::INT, *span, self),
            Pattern::Text { span, .. } => expect(TypeId::TEXT, *span, self),
            Pattern::Bool { span, .. } => expect(TypeId::BOOL, *span, self),
            Pattern::Float { span, .. } => Err(Error::semantic(
                "`Float` values cannot be matched by pattern; compare with `==` instead",
                *span,
            )),
            Pattern::Range {
                start, end, span, ..
            } => {
                expect(TypeId::INT, *span, self)?;
                for bound in [start.as_ref(), end.as_ref()] {
                    if !matches!(bound, Expression::Int { .. }) {
                        return Err(Error::semantic(
                            "range pattern bounds must be `Int` literals",
                            bound.span(),
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    fn check_condition(&mut self, condition: &Expression) -> Result<()> {
        let ty = self.check_expression(condition)?;
        if ty != TypeId::BOOL {
            return Err(Error::semantic(
                format!(
                    "condition must be `Bool`, found `{}`",
                    self.registry.display_name(ty)
                ),
                condition.span(),
            ));
        }
        Ok(())
    }
}
