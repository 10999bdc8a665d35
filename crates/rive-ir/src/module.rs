//! Top-level RIR structure: modules, functions, parameters, blocks.

use crate::{RirExpression, RirStatement};
use rive_core::types::{MemoryStrategy, TypeId, TypeRegistry};
use rive_core::Span;

/// A complete lowered program.
#[derive(Clone, Debug)]
pub struct RirModule {
    pub functions: Vec<RirFunction>,
    pub type_registry: TypeRegistry,
}

impl RirModule {
    pub fn new(type_registry: TypeRegistry) -> Self {
        Self {
            functions: Vec::new(),
            type_registry,
        }
    }

    pub fn add_function(&mut self, function: RirFunction) {
        self.functions.push(function);
    }

    pub fn function(&self, name: &str) -> Option<&RirFunction> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct RirFunction {
    pub name: String,
    pub parameters: Vec<RirParameter>,
    pub return_type: TypeId,
    pub body: RirBlock,
    pub span: Span,
}

impl RirFunction {
    pub fn is_main(&self) -> bool {
        self.name == "main"
    }

    pub fn returns_unit(&self) -> bool {
        self.return_type == TypeId::UNIT
    }
}

#[derive(Clone, Debug)]
pub struct RirParameter {
    pub name: String,
    pub type_id: TypeId,
    pub strategy: MemoryStrategy,
    pub span: Span,
}

/// A block of statements with an optional trailing value expression.
#[derive(Clone, Debug)]
pub struct RirBlock {
    pub statements: Vec<RirStatement>,
    pub final_expr: Option<Box<RirExpression>>,
    pub span: Span,
}

impl RirBlock {
    pub fn new(span: Span) -> Self {
        Self {
            statements: Vec::new(),
            final_expr: None,
            span,
        }
    }

    pub fn with_statements(statements: Vec<RirStatement>, span: Span) -> Self {
        Self {
            statements,
            final_expr: None,
            span,
        }
    }

    /// The type a block evaluates to.
    pub fn value_type(&self) -> TypeId {
        self.final_expr
            .as_ref()
            .map_or(TypeId::UNIT, |expr| expr.type_id())
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty() && self.final_expr.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 0)
    }

    #[test]
    fn function_lookup_by_name() {
        let mut module = RirModule::new(TypeRegistry::new());
        module.add_function(RirFunction {
            name: "main".to_string(),
            parameters: vec![],
            return_type: TypeId::UNIT,
            body: RirBlock::new(span()),
            span: span(),
        });
        assert!(module.function("main").is_some_and(RirFunction::is_main));
        assert!(module.function("missing").is_none());
    }

    #[test]
    fn block_value_type_follows_final_expr() {
        let mut block = RirBlock::new(span());
        assert_eq!(block.value_type(), TypeId::UNIT);
        assert!(block.is_empty());

        block.final_expr = Some(Box::new(RirExpression::IntLiteral {
            value: 1,
            span: span(),
        }));
        assert_eq!(block.value_type(), TypeId::INT);
        assert!(!block.is_empty());
    }
}
