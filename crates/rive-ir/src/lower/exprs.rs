use super::{AstLowering, BlockCtx};
use crate::{BinaryOp, RirExpression, RirFormatPart, UnaryOp};
use rive_core::types::TypeId;
use rive_core::{Error, Result};
use rive_parser::ast::{BinaryOperator, Expression, StringPart, UnaryOperator};

impl AstLowering {
    pub(crate) fn lower_expression(&mut self, expression: &Expression) -> Result<RirExpression> {
        match expression {
            Expression::Int { value, span } => Ok(RirExpression::IntLiteral {
                value: *value,
                span: *span,
            }),
            Expression::Float { value, span } => Ok(RirExpression::FloatLiteral {
                value: *value,
                span: *span,
            }),
            Expression::Text { value, span } => Ok(RirExpression::StringLiteral {
                value: value.clone(),
                span: *span,
            }),
            Expression::Bool { value, span } => Ok(RirExpression::BoolLiteral {
                value: *value,
                span: *span,
            }),
            Expression::Null { span } => Ok(RirExpression::NullLiteral {
                type_id: TypeId::NULL,
                span: *span,
            }),

            Expression::Interpolation { parts, span } => {
                let mut lowered = Vec::with_capacity(parts.len());
                for part in parts {
                    lowered.push(match part {
                        StringPart::Text(text) => RirFormatPart::Text(text.clone()),
                        StringPart::Expr(expr) => {
                            RirFormatPart::Value(self.lower_expression(expr)?)
                        }
                    });
                }
                Ok(RirExpression::FormatText {
                    parts: lowered,
                    span: *span,
                })
            }

            Expression::Variable { name, span } => {
                let type_id = self.variable_type(name).ok_or_else(|| {
                    Error::lower(format!("undefined variable `{name}`"), *span)
                })?;
                Ok(RirExpression::Variable {
                    name: name.clone(),
                    type_id,
                    span: *span,
                })
            }

            Expression::Binary {
                left,
                operator,
                right,
                span,
            } => {
                let left = self.lower_expression(left)?;
                let right = self.lower_expression(right)?;
                let op = lower_binary_op(*operator);
                let result_type = if op.is_comparison() || op.is_logical() {
                    TypeId::BOOL
                } else {
                    left.type_id()
                };
                Ok(RirExpression::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    result_type,
                    span: *span,
                })
            }

            Expression::Unary {
                operator,
                operand,
                span,
            } => {
                let operand = self.lower_expression(operand)?;
                let op = match operator {
                    UnaryOperator::Negate => UnaryOp::Negate,
                    UnaryOperator::Not => UnaryOp::Not,
                };
                let result_type = operand.type_id();
                Ok(RirExpression::Unary {
                    op,
                    operand: Box::new(operand),
                    result_type,
                    span: *span,
                })
            }

            Expression::Call {
                callee,
                arguments,
                span,
            } => {
                if callee == "print" {
                    let arguments = arguments
                        .iter()
                        .map(|arg| self.lower_expression(arg))
                        .collect::<Result<Vec<_>>>()?;
                    return Ok(RirExpression::Call {
                        function: callee.clone(),
                        arguments,
                        return_type: TypeId::UNIT,
                        span: *span,
                    });
                }

                let (params, return_type) = self
                    .function_signature(callee)
                    .cloned()
                    .ok_or_else(|| {
                        Error::lower(format!("undefined function `{callee}`"), *span)
                    })?;

                let mut lowered = Vec::with_capacity(arguments.len());
                for (argument, param) in arguments.iter().zip(params) {
                    let expr = self.lower_expression(argument)?;
                    lowered.push(self.coerce(expr, param));
                }

                Ok(RirExpression::Call {
                    function: callee.clone(),
                    arguments: lowered,
                    return_type,
                    span: *span,
                })
            }

            Expression::Array { elements, span } => {
                let lowered = elements
                    .iter()
                    .map(|element| self.lower_expression(element))
                    .collect::<Result<Vec<_>>>()?;
                let element_type = lowered
                    .first()
                    .map_or(TypeId::UNIT, RirExpression::type_id);
                let array_type = self.registry.array_of(element_type, lowered.len());
                Ok(RirExpression::ArrayLiteral {
                    elements: lowered,
                    element_type,
                    array_type,
                    span: *span,
                })
            }

            Expression::Index { array, index, span } => {
                let array = self.lower_expression(array)?;
                let element_type = match self.registry.kind(array.type_id()) {
                    Some(rive_core::types::TypeKind::Array { element, .. }) => *element,
                    _ => {
                        return Err(Error::lower("indexed value is not an array", *span));
                    }
                };
                let index = self.lower_expression(index)?;
                Ok(RirExpression::Index {
                    array: Box::new(array),
                    index: Box::new(index),
                    element_type,
                    span: *span,
                })
            }

            Expression::Elvis {
                value,
                fallback,
                span,
            } => self.lower_elvis(value, fallback, *span),

            Expression::If(if_expr) => self.lower_if_expr(if_expr),
            Expression::Match(match_expr) => self.lower_match_expr(match_expr),
            Expression::Loop(loop_expr) => self.lower_loop_expr(loop_expr),

            // Unit-typed loops reaching value position become blocks.
            Expression::While(while_loop) => {
                let stmt = self.lower_while_stmt(while_loop)?;
                Ok(self.statement_as_unit_block(stmt))
            }
            Expression::For(for_loop) => {
                let stmt = self.lower_for_stmt(for_loop)?;
                Ok(self.statement_as_unit_block(stmt))
            }

            Expression::Range(range) => Err(Error::lower(
                "range expressions are only valid as `for` loop iterables",
                range.span,
            )),

            Expression::Block(block) => {
                let lowered = self.lower_block(block, BlockCtx::Value)?;
                let result_type = lowered.value_type();
                let span = lowered.span;
                Ok(RirExpression::Block {
                    block: lowered,
                    result_type,
                    span,
                })
            }
        }
    }

    /// `value ?: fallback`. A non-nullable left side makes the fallback
    /// dead; a nullable fallback keeps the result nullable (`or`),
    /// otherwise the fallback unwraps the value.
    fn lower_elvis(
        &mut self,
        value: &Expression,
        fallback: &Expression,
        span: rive_core::Span,
    ) -> Result<RirExpression> {
        let value = self.lower_expression(value)?;

        if value.type_id() == TypeId::NULL {
            // `null ?: b` is just `b`.
            return self.lower_expression(fallback);
        }

        let Some(inner) = self.registry.nullable_inner(value.type_id()) else {
            // Never null: the fallback can never run.
            return Ok(value);
        };

        let fallback = self.lower_expression(fallback)?;
        let (fallback, result_type) = if fallback.type_id() == value.type_id() {
            let ty = value.type_id();
            (fallback, ty)
        } else {
            (self.coerce(fallback, inner), inner)
        };

        Ok(RirExpression::Elvis {
            value: Box::new(value),
            fallback: Box::new(fallback),
            result_type,
            span,
        })
    }

    fn statement_as_unit_block(&mut self, stmt: crate::RirStatement) -> RirExpression {
        let span = stmt.span();
        let block = crate::RirBlock::with_statements(vec![stmt], span);
        RirExpression::Block {
            block,
            result_type: TypeId::UNIT,
            span,
        }
    }
}

fn lower_binary_op(op: BinaryOperator) -> BinaryOp {
    match op {
        BinaryOperator::Add => BinaryOp::Add,
        BinaryOperator::Subtract => BinaryOp::Subtract,
        BinaryOperator::Multiply => BinaryOp::Multiply,
        BinaryOperator::Divide => BinaryOp::Divide,
        BinaryOperator::Modulo => BinaryOp::Modulo,
        BinaryOperator::Equal => BinaryOp::Equal,
        BinaryOperator::NotEqual => BinaryOp::NotEqual,
        BinaryOperator::Less => BinaryOp::LessThan,
        BinaryOperator::LessEqual => BinaryOp::LessEqual,
        BinaryOperator::Greater => BinaryOp::GreaterThan,
        BinaryOperator::GreaterEqual => BinaryOp::GreaterEqual,
        BinaryOperator::And => BinaryOp::And,
        BinaryOperator::Or => BinaryOp::Or,
    }
}
