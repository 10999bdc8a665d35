use super::TypeChecker;
use rive_core::types::{TypeId, TypeKind};
use rive_core::{Error, Result, Span};
use rive_parser::ast::{BinaryOperator, Expression, StringPart, UnaryOperator};

impl TypeChecker {
    pub(crate) fn check_expression(&mut self, expression: &Expression) -> Result<TypeId> {
        match expression {
            Expression::Int { .. } => Ok(TypeId::INT),
            Expression::Float { .. } => Ok(TypeId::FLOAT),
            Expression::Text { .. } => Ok(TypeId::TEXT),
            Expression::Bool { .. } => Ok(TypeId::BOOL),
            Expression::Null { .. } => Ok(TypeId::NULL),

            Expression::Interpolation { parts, .. } => self.check_interpolation(parts),

            Expression::Variable { name, span } => self
                .symbols
                .lookup(name)
                .map(|symbol| symbol.type_id)
                .ok_or_else(|| Error::semantic(format!("undefined variable `{name}`"), *span)),

            Expression::Binary {
                left,
                operator,
                right,
                span,
            } => self.check_binary(left, *operator, right, *span),

            Expression::Unary {
                operator,
                operand,
                span,
            } => self.check_unary(*operator, operand, *span),

            Expression::Call {
                callee,
                arguments,
                span,
            } => self.check_call(callee, arguments, *span),

            Expression::Array { elements, span } => self.check_array(elements, *span),

            Expression::Index { array, index, span } => {
                let array_type = self.check_expression(array)?;
                let element = self.element_type(array_type, array.span())?;
                let index_type = self.check_expression(index)?;
                if index_type != TypeId::INT {
                    return Err(Error::semantic(
                        format!(
                            "array index must be `Int`, found `{}`",
                            self.registry.display_name(index_type)
                        ),
                        *span,
                    ));
                }
                Ok(element)
            }

            Expression::Elvis {
                value,
                fallback,
                span,
            } => self.check_elvis(value, fallback, *span),

            Expression::If(if_expr) => self.check_if(if_expr, true),
            Expression::While(while_loop) => self.check_while(while_loop),
            Expression::For(for_loop) => self.check_for(for_loop),
            Expression::Loop(loop_expr) => self.check_loop(loop_expr),
            Expression::Match(match_expr) => self.check_match(match_expr, true),

            Expression::Range(range) => Err(Error::semantic(
                "range expressions are only valid as `for` loop iterables",
                range.span,
            )),

            Expression::Block(block) => self.check_block(block),
        }
    }

    fn check_binary(
        &mut self,
        left: &Expression,
        operator: BinaryOperator,
        right: &Expression,
        span: Span,
    ) -> Result<TypeId> {
        let lhs = self.check_expression(left)?;
        let rhs = self.check_expression(right)?;
        let type_name = |checker: &Self, id| checker.registry.display_name(id);

        use BinaryOperator::*;
        match operator {
            Add => match (lhs, rhs) {
                (TypeId::INT, TypeId::INT) => Ok(TypeId::INT),
                (TypeId::FLOAT, TypeId::FLOAT) => Ok(TypeId::FLOAT),
                // `+` on texts is concatenation.
                (TypeId::TEXT, TypeId::TEXT) => Ok(TypeId::TEXT),
                _ => Err(Error::semantic(
                    format!(
                        "cannot add `{}` and `{}`",
                        type_name(self, lhs),
                        type_name(self, rhs)
                    ),
                    span,
                )),
            },
            Subtract | Multiply | Divide | Modulo => match (lhs, rhs) {
                (TypeId::INT, TypeId::INT) => Ok(TypeId::INT),
                (TypeId::FLOAT, TypeId::FLOAT) => Ok(TypeId::FLOAT),
                _ => Err(Error::semantic(
                    format!(
                        "arithmetic needs two `Int` or two `Float` operands, found `{}` and `{}`",
                        type_name(self, lhs),
                        type_name(self, rhs)
                    ),
                    span,
                )),
            },
            Less | LessEqual | Greater | GreaterEqual => match (lhs, rhs) {
                (TypeId::INT, TypeId::INT) | (TypeId::FLOAT, TypeId::FLOAT) => Ok(TypeId::BOOL),
                _ => Err(Error::semantic(
                    format!(
                        "cannot order `{}` and `{}`",
                        type_name(self, lhs),
                        type_name(self, rhs)
                    ),
                    span,
                )),
            },
            Equal | NotEqual => {
                let comparable = lhs == rhs
                    || (lhs == TypeId::NULL && self.registry.nullable_inner(rhs).is_some())
                    || (rhs == TypeId::NULL && self.registry.nullable_inner(lhs).is_some());
                if comparable {
                    Ok(TypeId::BOOL)
                } else {
                    Err(Error::semantic(
                        format!(
                            "cannot compare `{}` with `{}`",
                            type_name(self, lhs),
                            type_name(self, rhs)
                        ),
                        span,
                    ))
                }
            }
            And | Or => {
                if lhs == TypeId::BOOL && rhs == TypeId::BOOL {
                    Ok(TypeId::BOOL)
                } else {
                    Err(Error::semantic(
                        format!(
                            "logical operators need `Bool` operands, found `{}` and `{}`",
                            type_name(self, lhs),
                            type_name(self, rhs)
                        ),
                        span,
                    ))
                }
            }
        }
    }

    fn check_unary(
        &mut self,
        operator: UnaryOperator,
        operand: &Expression,
        span: Span,
    ) -> Result<TypeId> {
        let operand_type = self.check_expression(operand)?;
        match operator {
            UnaryOperator::Negate => match operand_type {
                TypeId::INT | TypeId::FLOAT => Ok(operand_type),
                _ => Err(Error::semantic(
                    format!(
                        "cannot negate `{}`",
                        self.registry.display_name(operand_type)
                    ),
                    span,
                )),
            },
            UnaryOperator::Not => {
                if operand_type == TypeId::BOOL {
                    Ok(TypeId::BOOL)
                } else {
                    Err(Error::semantic(
                        format!(
                            "`!` needs a `Bool` operand, found `{}`",
                            self.registry.display_name(operand_type)
                        ),
                        span,
                    ))
                }
            }
        }
    }

    fn check_call(
        &mut self,
        callee: &str,
        arguments: &[Expression],
        span: Span,
    ) -> Result<TypeId> {
        // `print` is the one builtin.
        if callee == "print" {
            if arguments.is_empty() {
                return Err(Error::semantic(
                    "`print` needs at least one argument",
                    span,
                ));
            }
            for argument in arguments {
                let ty = self.check_expression(argument)?;
                if ty == TypeId::UNIT {
                    return Err(Error::semantic(
                        "cannot print a `Unit` value",
                        argument.span(),
                    ));
                }
                if ty == TypeId::NULL {
                    return Err(Error::semantic(
                        "cannot print a bare `null`; bind it to a nullable value first",
                        argument.span(),
                    ));
                }
            }
            return Ok(TypeId::UNIT);
        }

        let sig = self
            .functions
            .get(callee)
            .cloned()
            .ok_or_else(|| Error::semantic(format!("undefined function `{callee}`"), span))?;

        if arguments.len() != sig.params.len() {
            return Err(Error::semantic(
                format!(
                    "`{callee}` takes {} argument(s), found {}",
                    sig.params.len(),
                    arguments.len()
                ),
                span,
            ));
        }

        for (argument, &param) in arguments.iter().zip(&sig.params) {
            let arg_type = self.check_expression(argument)?;
            self.require_assignable(param, arg_type, argument.span(), "argument")?;
        }

        Ok(sig.ret)
    }

    fn check_array(&mut self, elements: &[Expression], span: Span) -> Result<TypeId> {
        let Some(first) = elements.first() else {
            return Err(Error::semantic(
                "cannot infer the element type of an empty array literal",
                span,
            ));
        };
        let element = self.check_expression(first)?;
        if element == TypeId::NULL || element == TypeId::UNIT {
            return Err(Error::semantic(
                format!(
                    "array elements cannot have type `{}`",
                    self.registry.display_name(element)
                ),
                first.span(),
            ));
        }
        for other in &elements[1..] {
            let other_type = self.check_expression(other)?;
            if other_type != element {
                return Err(Error::semantic(
                    format!(
                        "array elements must all be `{}`, found `{}`",
                        self.registry.display_name(element),
                        self.registry.display_name(other_type)
                    ),
                    other.span(),
                ));
            }
        }
        Ok(self.registry.array_of(element, elements.len()))
    }

    /// `value ?: fallback` — unwraps a nullable with a default.
    fn check_elvis(
        &mut self,
        value: &Expression,
        fallback: &Expression,
        span: Span,
    ) -> Result<TypeId> {
        let value_type = self.check_expression(value)?;
        let fallback_type = self.check_expression(fallback)?;

        // A bare null on the left contributes nothing; the result is the
        // fallback.
        if value_type == TypeId::NULL {
            return Ok(fallback_type);
        }

        let Some(inner) = self.registry.nullable_inner(value_type) else {
            // Non-nullable left side: the elvis is redundant but legal.
            return Ok(value_type);
        };

        if fallback_type == value_type {
            return Ok(value_type); // T? ?: T? -> T?
        }
        if self.registry.is_assignable(inner, fallback_type) {
            return Ok(inner); // T? ?: T -> T
        }
        Err(Error::semantic(
            format!(
                "elvis fallback must be `{}` or `{}`, found `{}`",
                self.registry.display_name(inner),
                self.registry.display_name(value_type),
                self.registry.display_name(fallback_type)
            ),
            span,
        ))
    }

    fn check_interpolation(&mut self, parts: &[StringPart]) -> Result<TypeId> {
        for part in parts {
            let StringPart::Expr(expr) = part else {
                continue;
            };
            let ty = self.check_expression(expr)?;
            if ty == TypeId::UNIT {
                return Err(Error::semantic(
                    "cannot interpolate a `Unit` value",
                    expr.span(),
                ));
            }
            if ty == TypeId::NULL {
                return Err(Error::semantic(
                    "cannot interpolate a bare `null`; bind it to a nullable value first",
                    expr.span(),
                ));
            }
            if matches!(self.registry.kind(ty), Some(TypeKind::Function { .. })) {
                return Err(Error::semantic(
                    "cannot interpolate a function value",
                    expr.span(),
                ));
            }
        }
        Ok(TypeId::TEXT)
    }
}
