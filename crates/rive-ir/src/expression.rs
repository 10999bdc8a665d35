//! RIR expressions.

use crate::module::RirBlock;
use crate::statement::RirPattern;
use rive_core::types::TypeId;
use rive_core::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide | Self::Modulo
        )
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::LessThan
                | Self::LessEqual
                | Self::GreaterThan
                | Self::GreaterEqual
        )
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

/// One piece of a lowered string interpolation.
#[derive(Clone, Debug)]
pub enum RirFormatPart {
    Text(String),
    Value(RirExpression),
}

/// A typed RIR expression. `type_id` is total: every node knows its type.
#[derive(Clone, Debug)]
pub enum RirExpression {
    IntLiteral {
        value: i64,
        span: Span,
    },
    FloatLiteral {
        value: f64,
        span: Span,
    },
    StringLiteral {
        value: String,
        span: Span,
    },
    BoolLiteral {
        value: bool,
        span: Span,
    },
    Unit {
        span: Span,
    },
    /// `null`, typed as the nullable type it flows into.
    NullLiteral {
        type_id: TypeId,
        span: Span,
    },
    Variable {
        name: String,
        type_id: TypeId,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<RirExpression>,
        right: Box<RirExpression>,
        result_type: TypeId,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<RirExpression>,
        result_type: TypeId,
        span: Span,
    },
    Call {
        function: String,
        arguments: Vec<RirExpression>,
        return_type: TypeId,
        span: Span,
    },
    ArrayLiteral {
        elements: Vec<RirExpression>,
        element_type: TypeId,
        array_type: TypeId,
        span: Span,
    },
    Index {
        array: Box<RirExpression>,
        index: Box<RirExpression>,
        element_type: TypeId,
        span: Span,
    },
    /// The explicit `T → T?` coercion.
    WrapOptional {
        value: Box<RirExpression>,
        result_type: TypeId,
        span: Span,
    },
    /// `value ?: fallback`. An optional `result_type` means both sides are
    /// nullable (`a.or(b)`); otherwise the fallback unwraps (`a.unwrap_or(b)`).
    Elvis {
        value: Box<RirExpression>,
        fallback: Box<RirExpression>,
        result_type: TypeId,
        span: Span,
    },
    /// Lowered string interpolation; always `Text`.
    FormatText {
        parts: Vec<RirFormatPart>,
        span: Span,
    },
    If {
        condition: Box<RirExpression>,
        then_block: RirBlock,
        else_block: RirBlock,
        result_type: TypeId,
        span: Span,
    },
    Match {
        scrutinee: Box<RirExpression>,
        arms: Vec<(RirPattern, Box<RirExpression>)>,
        result_type: TypeId,
        span: Span,
    },
    Block {
        block: RirBlock,
        result_type: TypeId,
        span: Span,
    },
    /// A `loop` in value position; its `break with` statements carry the
    /// values out.
    Loop {
        body: RirBlock,
        result_type: TypeId,
        span: Span,
    },
}

impl RirExpression {
    pub fn span(&self) -> Span {
        match self {
            Self::IntLiteral { span, .. }
            | Self::FloatLiteral { span, .. }
            | Self::StringLiteral { span, .. }
            | Self::BoolLiteral { span, .. }
            | Self::Unit { span }
            | Self::NullLiteral { span, .. }
            | Self::Variable { span, .. }
            | Self::Binary { span, .. }
            | Self::Unary { span, .. }
            | Self::Call { span, .. }
            | Self::ArrayLiteral { span, .. }
            | Self::Index { span, .. }
            | Self::WrapOptional { span, .. }
            | Self::Elvis { span, .. }
            | Self::FormatText { span, .. }
            | Self::If { span, .. }
            | Self::Match { span, .. }
            | Self::Block { span, .. }
            | Self::Loop { span, .. } => *span,
        }
    }

    pub fn type_id(&self) -> TypeId {
        match self {
            Self::IntLiteral { .. } => TypeId::INT,
            Self::FloatLiteral { .. } => TypeId::FLOAT,
            Self::StringLiteral { .. } | Self::FormatText { .. } => TypeId::TEXT,
            Self::BoolLiteral { .. } => TypeId::BOOL,
            Self::Unit { .. } => TypeId::UNIT,
            Self::NullLiteral { type_id, .. } | Self::Variable { type_id, .. } => *type_id,
            Self::Binary { result_type, .. }
            | Self::Unary { result_type, .. }
            | Self::WrapOptional { result_type, .. }
            | Self::Elvis { result_type, .. }
            | Self::If { result_type, .. }
            | Self::Match { result_type, .. }
            | Self::Block { result_type, .. }
            | Self::Loop { result_type, .. } => *result_type,
            Self::Call { return_type, .. } => *return_type,
            Self::ArrayLiteral { array_type, .. } => *array_type,
            Self::Index { element_type, .. } => *element_type,
        }
    }

    pub const fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::IntLiteral { .. }
                | Self::FloatLiteral { .. }
                | Self::StringLiteral { .. }
                | Self::BoolLiteral { .. }
                | Self::Unit { .. }
                | Self::NullLiteral { .. }
        )
    }

    /// Whether evaluating this expression can have side effects. Function
    /// calls are the only effectful leaves; everything else is pure if its
    /// operands are.
    pub fn is_pure(&self) -> bool {
        match self {
            Self::Call { .. } => false,
            Self::IntLiteral { .. }
            | Self::FloatLiteral { .. }
            | Self::StringLiteral { .. }
            | Self::BoolLiteral { .. }
            | Self::Unit { .. }
            | Self::NullLiteral { .. }
            | Self::Variable { .. } => true,
            Self::Binary { left, right, .. } => left.is_pure() && right.is_pure(),
            Self::Unary { operand, .. } => operand.is_pure(),
            Self::ArrayLiteral { elements, .. } => elements.iter().all(Self::is_pure),
            Self::Index { array, index, .. } => array.is_pure() && index.is_pure(),
            Self::WrapOptional { value, .. } => value.is_pure(),
            Self::Elvis {
                value, fallback, ..
            } => value.is_pure() && fallback.is_pure(),
            Self::FormatText { parts, .. } => parts.iter().all(|part| match part {
                RirFormatPart::Text(_) => true,
                RirFormatPart::Value(expr) => expr.is_pure(),
            }),
            // Control flow in value position may run arbitrary statements.
            Self::If { .. } | Self::Match { .. } | Self::Block { .. } | Self::Loop { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 0)
    }

    #[test]
    fn literal_types_are_intrinsic() {
        assert_eq!(
            RirExpression::IntLiteral {
                value: 1,
                span: span()
            }
            .type_id(),
            TypeId::INT
        );
        assert_eq!(
            RirExpression::BoolLiteral {
                value: true,
                span: span()
            }
            .type_id(),
            TypeId::BOOL
        );
    }

    #[test]
    fn purity_is_recursive() {
        let pure = RirExpression::Binary {
            op: BinaryOp::Add,
            left: Box::new(RirExpression::IntLiteral {
                value: 1,
                span: span(),
            }),
            right: Box::new(RirExpression::Variable {
                name: "x".to_string(),
                type_id: TypeId::INT,
                span: span(),
            }),
            result_type: TypeId::INT,
            span: span(),
        };
        assert!(pure.is_pure());

        let impure = RirExpression::Binary {
            op: BinaryOp::Add,
            left: Box::new(RirExpression::IntLiteral {
                value: 1,
                span: span(),
            }),
            right: Box::new(RirExpression::Call {
                function: "f".to_string(),
                arguments: vec![],
                return_type: TypeId::INT,
                span: span(),
            }),
            result_type: TypeId::INT,
            span: span(),
        };
        assert!(!impure.is_pure());
    }

    #[test]
    fn operator_categories() {
        assert!(BinaryOp::Add.is_arithmetic());
        assert!(BinaryOp::Equal.is_comparison());
        assert!(BinaryOp::And.is_logical());
        assert!(!BinaryOp::And.is_comparison());
    }
}
