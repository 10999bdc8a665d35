//! Constant folding.

use super::OptimizationPass;
use crate::{BinaryOp, RirBlock, RirExpression, RirModule, RirStatement, UnaryOp};
use rive_core::types::TypeId;

/// Folds operations over literal operands and reduces branches with
/// literal conditions. Folding never introduces a panic the program would
/// not have had: division and modulo by a literal zero are left alone.
pub struct ConstantFolding;

impl OptimizationPass for ConstantFolding {
    fn name(&self) -> &str {
        "constant-folding"
    }

    fn run(&self, module: &mut RirModule) -> bool {
        let mut changed = false;
        for function in &mut module.functions {
            changed |= fold_block(&mut function.body);
        }
        changed
    }
}

fn fold_block(block: &mut RirBlock) -> bool {
    let mut changed = false;
    for statement in &mut block.statements {
        changed |= fold_statement(statement);
    }
    if let Some(final_expr) = block.final_expr.as_mut() {
        changed |= fold_expr(final_expr);
    }
    changed
}

fn fold_statement(statement: &mut RirStatement) -> bool {
    match statement {
        RirStatement::Let { value, .. }
        | RirStatement::Assign { value, .. }
        | RirStatement::Expression { expr: value, .. } => fold_expr(value),
        RirStatement::AssignIndex { index, value, .. } => {
            let mut changed = fold_expr(index);
            changed |= fold_expr(value);
            changed
        }
        RirStatement::Return { value, .. } => value
            .as_mut()
            .map_or(false, |value| fold_expr(value)),
        RirStatement::If {
            condition,
            then_block,
            else_block,
            span,
        } => {
            let mut changed = fold_expr(condition);
            changed |= fold_block(then_block);
            if let Some(else_block) = else_block {
                changed |= fold_block(else_block);
            }

            // A literal condition picks its branch statically.
            if let RirExpression::BoolLiteral { value, .. } = **condition {
                let span = *span;
                let block = if value {
                    std::mem::replace(then_block, RirBlock::new(span))
                } else {
                    match else_block.take() {
                        Some(block) => block,
                        None => RirBlock::new(span),
                    }
                };
                *statement = RirStatement::Block { block, span };
                return true;
            }
            changed
        }
        RirStatement::While {
            condition, body, ..
        } => {
            let mut changed = fold_expr(condition);
            changed |= fold_block(body);
            changed
        }
        RirStatement::For {
            start, end, body, ..
        } => {
            let mut changed = fold_expr(start);
            changed |= fold_expr(end);
            changed |= fold_block(body);
            changed
        }
        RirStatement::Loop { body, .. } => fold_block(body),
        RirStatement::Break { value, .. } => value
            .as_mut()
            .map_or(false, |value| fold_expr(value)),
        RirStatement::Match {
            scrutinee, arms, ..
        } => {
            let mut changed = fold_expr(scrutinee);
            for (_, body) in arms {
                changed |= fold_block(body);
            }
            changed
        }
        RirStatement::Block { block, .. } => fold_block(block),
        RirStatement::Continue { .. } => false,
    }
}

fn fold_expr(expr: &mut RirExpression) -> bool {
    let mut changed = match expr {
        RirExpression::Binary { left, right, .. } => {
            let mut changed = fold_expr(left);
            changed |= fold_expr(right);
            changed
        }
        RirExpression::Unary { operand, .. } => fold_expr(operand),
        RirExpression::Call { arguments, .. } => {
            let mut changed = false;
            for argument in arguments {
                changed |= fold_expr(argument);
            }
            changed
        }
        RirExpression::ArrayLiteral { elements, .. } => {
            let mut changed = false;
            for element in elements {
                changed |= fold_expr(element);
            }
            changed
        }
        RirExpression::Index { array, index, .. } => {
            let mut changed = fold_expr(array);
            changed |= fold_expr(index);
            changed
        }
        RirExpression::WrapOptional { value, .. } => fold_expr(value),
        RirExpression::Elvis {
            value, fallback, ..
        } => {
            let mut changed = fold_expr(value);
            changed |= fold_expr(fallback);
            changed
        }
        RirExpression::FormatText { parts, .. } => {
            let mut changed = false;
            for part in parts {
                if let crate::RirFormatPart::Value(value) = part {
                    changed |= fold_expr(value);
                }
            }
            changed
        }
        RirExpression::If {
            condition,
            then_block,
            else_block,
            ..
        } => {
            let mut changed = fold_expr(condition);
            changed |= fold_block(then_block);
            changed |= fold_block(else_block);
            changed
        }
        RirExpression::Match {
            scrutinee, arms, ..
        } => {
            let mut changed = fold_expr(scrutinee);
            for (_, body) in arms {
                changed |= fold_expr(body);
            }
            changed
        }
        RirExpression::Block { block, .. } => fold_block(block),
        RirExpression::Loop { body, .. } => fold_block(body),
        _ => false,
    };

    if let Some(folded) = try_fold(expr) {
        *expr = folded;
        changed = true;
    }
    changed
}

fn try_fold(expr: &RirExpression) -> Option<RirExpression> {
    match expr {
        RirExpression::Binary {
            op,
            left,
            right,
            result_type,
            span,
        } => fold_binary(*op, left, right, *result_type, *span),
        RirExpression::Unary {
            op, operand, span, ..
        } => fold_unary(*op, operand, *span),
        _ => None,
    }
}

fn fold_binary(
    op: BinaryOp,
    left: &RirExpression,
    right: &RirExpression,
    result_type: TypeId,
    span: rive_core::Span,
) -> Option<RirExpression> {
    use RirExpression::*;

    // Logical short-circuit identities that keep evaluation order sound:
    // a literal left side either selects the right side or, when the
    // right side is pure, the literal itself.
    if op.is_logical() {
        if let BoolLiteral { value, .. } = left {
            return match (op, *value) {
                (BinaryOp::And, true) | (BinaryOp::Or, false) => Some(right.clone()),
                (BinaryOp::And, false) | (BinaryOp::Or, true) => {
                    right.is_pure().then(|| BoolLiteral { value: *value, span })
                }
                _ => None,
            };
        }
    }

    match (left, right) {
        (IntLiteral { value: a, .. }, IntLiteral { value: b, .. }) => {
            let int = |value: i64| IntLiteral { value, span };
            let boolean = |value: bool| BoolLiteral { value, span };
            Some(match op {
                BinaryOp::Add => int(a.checked_add(*b)?),
                BinaryOp::Subtract => int(a.checked_sub(*b)?),
                BinaryOp::Multiply => int(a.checked_mul(*b)?),
                BinaryOp::Divide => int(a.checked_div(*b)?),
                BinaryOp::Modulo => int(a.checked_rem(*b)?),
                BinaryOp::Equal => boolean(a == b),
                BinaryOp::NotEqual => boolean(a != b),
                BinaryOp::LessThan => boolean(a < b),
                BinaryOp::LessEqual => boolean(a <= b),
                BinaryOp::GreaterThan => boolean(a > b),
                BinaryOp::GreaterEqual => boolean(a >= b),
                BinaryOp::And | BinaryOp::Or => return None,
            })
        }
        (FloatLiteral { value: a, .. }, FloatLiteral { value: b, .. }) => {
            let float = |value: f64| FloatLiteral { value, span };
            let boolean = |value: bool| BoolLiteral { value, span };
            Some(match op {
                BinaryOp::Add => float(a + b),
                BinaryOp::Subtract => float(a - b),
                BinaryOp::Multiply => float(a * b),
                BinaryOp::Divide => float(a / b),
                BinaryOp::Modulo => float(a % b),
                BinaryOp::Equal => boolean(a == b),
                BinaryOp::NotEqual => boolean(a != b),
                BinaryOp::LessThan => boolean(a < b),
                BinaryOp::LessEqual => boolean(a <= b),
                BinaryOp::GreaterThan => boolean(a > b),
                BinaryOp::GreaterEqual => boolean(a >= b),
                BinaryOp::And | BinaryOp::Or => return None,
            })
        }
        (StringLiteral { value: a, .. }, StringLiteral { value: b, .. }) => Some(match op {
            BinaryOp::Add if result_type == TypeId::TEXT => StringLiteral {
                value: format!("{a}{b}"),
                span,
            },
            BinaryOp::Equal => BoolLiteral { value: a == b, span },
            BinaryOp::NotEqual => BoolLiteral { value: a != b, span },
            _ => return None,
        }),
        (BoolLiteral { value: a, .. }, BoolLiteral { value: b, .. }) => Some(match op {
            BinaryOp::And => BoolLiteral { value: *a && *b, span },
            BinaryOp::Or => BoolLiteral { value: *a || *b, span },
            BinaryOp::Equal => BoolLiteral { value: a == b, span },
            BinaryOp::NotEqual => BoolLiteral { value: a != b, span },
            _ => return None,
        }),
        _ => None,
    }
}

fn fold_unary(op: UnaryOp, operand: &RirExpression, span: rive_core::Span) -> Option<RirExpression> {
    match (op, operand) {
        (UnaryOp::Negate, RirExpression::IntLiteral { value, .. }) => {
            Some(RirExpression::IntLiteral {
                value: value.checked_neg()?,
                span,
            })
        }
        (UnaryOp::Negate, RirExpression::FloatLiteral { value, .. }) => {
            Some(RirExpression::FloatLiteral {
                value: -value,
                span,
            })
        }
        (UnaryOp::Not, RirExpression::BoolLiteral { value, .. }) => {
            Some(RirExpression::BoolLiteral {
                value: !value,
                span,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> rive_core::Span {
        rive_core::Span::new(0, 0)
    }

    fn int(value: i64) -> RirExpression {
        RirExpression::IntLiteral {
            value,
            span: span(),
        }
    }

    fn binary(op: BinaryOp, left: RirExpression, right: RirExpression) -> RirExpression {
        RirExpression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            result_type: TypeId::INT,
            span: span(),
        }
    }

    #[test]
    fn folds_nested_arithmetic() {
        // (1 + 2) * 3 -> 9
        let mut expr = binary(
            BinaryOp::Multiply,
            binary(BinaryOp::Add, int(1), int(2)),
            int(3),
        );
        assert!(fold_expr(&mut expr));
        assert!(matches!(expr, RirExpression::IntLiteral { value: 9, .. }));
    }

    #[test]
    fn leaves_division_by_zero_alone() {
        let mut expr = binary(BinaryOp::Divide, int(1), int(0));
        assert!(!fold_expr(&mut expr));
        assert!(matches!(expr, RirExpression::Binary { .. }));
    }

    #[test]
    fn leaves_overflow_alone() {
        let mut expr = binary(BinaryOp::Add, int(i64::MAX), int(1));
        assert!(!fold_expr(&mut expr));
    }

    #[test]
    fn folds_comparisons_to_bools() {
        let mut expr = binary(BinaryOp::LessThan, int(1), int(2));
        fold_expr(&mut expr);
        assert!(matches!(
            expr,
            RirExpression::BoolLiteral { value: true, .. }
        ));
    }

    #[test]
    fn true_and_selects_right_operand() {
        let mut expr = RirExpression::Binary {
            op: BinaryOp::And,
            left: Box::new(RirExpression::BoolLiteral {
                value: true,
                span: span(),
            }),
            right: Box::new(RirExpression::Variable {
                name: "flag".to_string(),
                type_id: TypeId::BOOL,
                span: span(),
            }),
            result_type: TypeId::BOOL,
            span: span(),
        };
        fold_expr(&mut expr);
        assert!(matches!(expr, RirExpression::Variable { .. }));
    }

    #[test]
    fn false_and_impure_right_is_kept() {
        let mut expr = RirExpression::Binary {
            op: BinaryOp::And,
            left: Box::new(RirExpression::BoolLiteral {
                value: false,
                span: span(),
            }),
            right: Box::new(RirExpression::Call {
                function: "f".to_string(),
                arguments: vec![],
                return_type: TypeId::BOOL,
                span: span(),
            }),
            result_type: TypeId::BOOL,
            span: span(),
        };
        assert!(!fold_expr(&mut expr));
        assert!(matches!(expr, RirExpression::Binary { .. }));
    }

    #[test]
    fn folds_string_concatenation() {
        let mut expr = RirExpression::Binary {
            op: BinaryOp::Add,
            left: Box::new(RirExpression::StringLiteral {
                value: "a".to_string(),
                span: span(),
            }),
            right: Box::new(RirExpression::StringLiteral {
                value: "b".to_string(),
                span: span(),
            }),
            result_type: TypeId::TEXT,
            span: span(),
        };
        fold_expr(&mut expr);
        assert!(matches!(
            expr,
            RirExpression::StringLiteral { ref value, .. } if value == "ab"
        ));
    }

    #[test]
    fn literal_if_condition_selects_a_branch() {
        let then_block = RirBlock::with_statements(
            vec![RirStatement::Expression {
                expr: Box::new(int(1)),
                span: span(),
            }],
            span(),
        );
        let mut statement = RirStatement::If {
            condition: Box::new(RirExpression::BoolLiteral {
                value: true,
                span: span(),
            }),
            then_block,
            else_block: None,
            span: span(),
        };
        assert!(fold_statement(&mut statement));
        assert!(matches!(statement, RirStatement::Block { .. }));
    }
}
