mod control_flow;
mod exprs;

use crate::{RirBlock, RirExpression, RirFunction, RirModule, RirParameter, RirStatement};
use rive_core::types::{TypeId, TypeRegistry};
use rive_core::{Error, Result};
use rive_parser::ast::{
    Block, Expression, Function, FunctionBody, Item, Program, Statement,
};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug)]
struct VarInfo {
    type_id: TypeId,
    #[allow(dead_code)]
    mutable: bool,
}

/// One enclosing loop during lowering; `break_type` accumulates the
/// joined `break with` type of a `loop`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LoopFrame {
    pub(crate) is_loop: bool,
    pub(crate) break_type: Option<TypeId>,
}

/// How a block's trailing value is used, which decides whether it may
/// become the block's `final_expr`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockCtx {
    /// The value is consumed (if/match branches, block expressions).
    Value,
    /// The value is discarded (loop bodies, statement branches); trailing
    /// expressions stay statements so emitted blocks type as unit.
    Stmt,
    /// The value becomes the function result, coerced to the return type.
    Coerce(TypeId),
}

/// Lowers the checked AST into RIR, re-deriving types as it goes and
/// making implicit coercions (`T → T?`) explicit.
pub struct AstLowering {
    pub(crate) registry: TypeRegistry,
    scopes: Vec<HashMap<String, VarInfo>>,
    functions: HashMap<String, (Vec<TypeId>, TypeId)>,
    pub(crate) loops: Vec<LoopFrame>,
    current_return: Option<TypeId>,
}

impl AstLowering {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            scopes: vec![HashMap::new()],
            functions: HashMap::new(),
            loops: Vec::new(),
            current_return: None,
        }
    }

    pub fn lower_program(&mut self, program: &Program) -> Result<RirModule> {
        for item in &program.items {
            let Item::Function(func) = item;
            let params = func.params.iter().map(|p| p.param_type).collect();
            self.functions
                .insert(func.name.clone(), (params, func.return_type));
        }

        let mut functions = Vec::new();
        for item in &program.items {
            let Item::Function(func) = item;
            functions.push(self.lower_function(func)?);
        }

        let mut module = RirModule::new(self.registry.clone());
        module.functions = functions;
        Ok(module)
    }

    fn lower_function(&mut self, func: &Function) -> Result<RirFunction> {
        self.enter_scope();
        self.current_return = Some(func.return_type);

        let parameters: Vec<RirParameter> = func
            .params
            .iter()
            .map(|p| {
                self.define(p.name.clone(), p.param_type, false);
                RirParameter {
                    name: p.name.clone(),
                    type_id: p.param_type,
                    strategy: self.registry.strategy(p.param_type),
                    span: p.span,
                }
            })
            .collect();

        let body = match &func.body {
            FunctionBody::Block(block) => {
                let ctx = if func.return_type == TypeId::UNIT {
                    BlockCtx::Stmt
                } else {
                    BlockCtx::Coerce(func.return_type)
                };
                self.lower_block(block, ctx)?
            }
            FunctionBody::Expression(expr) => {
                let mut block = RirBlock::new(expr.span());
                let lowered = self.lower_expression(expr)?;
                if func.return_type == TypeId::UNIT {
                    block.statements.push(self.demote_to_statement(lowered));
                } else {
                    let coerced = self.coerce(lowered, func.return_type);
                    block.final_expr = Some(Box::new(coerced));
                }
                block
            }
        };

        self.current_return = None;
        self.exit_scope();

        Ok(RirFunction {
            name: func.name.clone(),
            parameters,
            return_type: func.return_type,
            body,
            span: func.span,
        })
    }

    /// Lowers a block. In value contexts a trailing value-producing
    /// expression statement becomes the block's `final_expr`.
    pub(crate) fn lower_block(&mut self, block: &Block, ctx: BlockCtx) -> Result<RirBlock> {
        self.enter_scope();
        let mut rir_block = RirBlock::new(block.span);
        let last = block.statements.len().checked_sub(1);

        for (idx, statement) in block.statements.iter().enumerate() {
            if Some(idx) == last {
                if let Statement::Expression { expression, .. } = statement {
                    if is_value_candidate(expression) {
                        let lowered = self.lower_expression(expression)?;
                        if lowered.type_id() != TypeId::UNIT && ctx != BlockCtx::Stmt {
                            let lowered = match ctx {
                                BlockCtx::Coerce(target) => self.coerce(lowered, target),
                                _ => lowered,
                            };
                            rir_block.final_expr = Some(Box::new(lowered));
                            continue;
                        }
                        rir_block.statements.push(self.demote_to_statement(lowered));
                        continue;
                    }
                }
            }
            let lowered = self.lower_statement(statement)?;
            rir_block.statements.push(lowered);
        }

        self.exit_scope();
        Ok(rir_block)
    }

    fn lower_statement(&mut self, statement: &Statement) -> Result<RirStatement> {
        match statement {
            Statement::Let {
                name,
                mutable,
                infer_nullable,
                var_type,
                initializer,
                span,
            } => self.lower_binding(name, *mutable, *infer_nullable, *var_type, initializer, *span),

            Statement::Const {
                name,
                infer_nullable,
                var_type,
                initializer,
                span,
            } => self.lower_binding(name, false, *infer_nullable, *var_type, initializer, *span),

            Statement::Assign { name, value, span } => {
                let target = self.lookup(name).ok_or_else(|| {
                    Error::lower(format!("undefined variable `{name}`"), *span)
                })?;
                let lowered = self.lower_expression(value)?;
                let lowered = self.coerce(lowered, target.type_id);
                Ok(RirStatement::Assign {
                    name: name.clone(),
                    value: Box::new(lowered),
                    span: *span,
                })
            }

            Statement::AssignIndex {
                name,
                index,
                value,
                span,
            } => {
                let array = self.lookup(name).ok_or_else(|| {
                    Error::lower(format!("undefined variable `{name}`"), *span)
                })?;
                let element = match self.registry.kind(array.type_id) {
                    Some(rive_core::types::TypeKind::Array { element, .. }) => *element,
                    _ => {
                        return Err(Error::lower(
                            format!("`{name}` is not an array"),
                            *span,
                        ));
                    }
                };
                let index = self.lower_expression(index)?;
                let lowered = self.lower_expression(value)?;
                let lowered = self.coerce(lowered, element);
                Ok(RirStatement::AssignIndex {
                    array: name.clone(),
                    index: Box::new(index),
                    value: Box::new(lowered),
                    span: *span,
                })
            }

            Statement::Return { value, span } => {
                let target = self.current_return.unwrap_or(TypeId::UNIT);
                let value = value
                    .as_ref()
                    .map(|expr| {
                        let lowered = self.lower_expression(expr)?;
                        Ok::<_, Error>(self.coerce(lowered, target))
                    })
                    .transpose()?
                    .map(Box::new);
                Ok(RirStatement::Return { value, span: *span })
            }

            Statement::Break(break_stmt) => self.lower_break(break_stmt),
            Statement::Continue(continue_stmt) => Ok(RirStatement::Continue {
                span: continue_stmt.span,
            }),

            Statement::Expression { expression, span } => match expression {
                Expression::If(if_expr) => self.lower_if_stmt(if_expr),
                Expression::Match(match_expr) => self.lower_match_stmt(match_expr),
                Expression::While(while_loop) => self.lower_while_stmt(while_loop),
                Expression::For(for_loop) => self.lower_for_stmt(for_loop),
                Expression::Loop(loop_expr) => {
                    let lowered = self.lower_loop_expr(loop_expr)?;
                    Ok(self.demote_to_statement(lowered))
                }
                _ => {
                    let lowered = self.lower_expression(expression)?;
                    Ok(RirStatement::Expression {
                        expr: Box::new(lowered),
                        span: *span,
                    })
                }
            },
        }
    }

    fn lower_binding(
        &mut self,
        name: &str,
        mutable: bool,
        infer_nullable: bool,
        var_type: Option<TypeId>,
        initializer: &Expression,
        span: rive_core::Span,
    ) -> Result<RirStatement> {
        let value = self.lower_expression(initializer)?;
        let declared = match var_type {
            Some(annotated) => annotated,
            None if infer_nullable => self.registry.optional_of(value.type_id()),
            None => value.type_id(),
        };
        let value = self.coerce(value, declared);
        self.define(name.to_string(), declared, mutable);

        Ok(RirStatement::Let {
            name: name.to_string(),
            type_id: declared,
            mutable,
            strategy: self.registry.strategy(declared),
            value: Box::new(value),
            span,
        })
    }

    /// Turns an expression in statement position back into statement
    /// form. Non-unit loops and blocks stay expressions so codegen can
    /// sink their value.
    pub(crate) fn demote_to_statement(&mut self, expr: RirExpression) -> RirStatement {
        let is_unit = expr.type_id() == TypeId::UNIT;
        match expr {
            RirExpression::Loop { body, span, .. } if is_unit => {
                RirStatement::Loop { body, span }
            }
            RirExpression::Block { block, span, .. } if is_unit => {
                RirStatement::Block { block, span }
            }
            other => {
                let span = other.span();
                RirStatement::Expression {
                    expr: Box::new(other),
                    span,
                }
            }
        }
    }

    /// Makes an implicit coercion to `target` explicit; identity when no
    /// coercion applies.
    pub(crate) fn coerce(&mut self, expr: RirExpression, target: TypeId) -> RirExpression {
        let source = expr.type_id();
        if source == target {
            return expr;
        }
        if let RirExpression::NullLiteral { span, .. } = expr {
            if self.registry.nullable_inner(target).is_some() {
                return RirExpression::NullLiteral {
                    type_id: target,
                    span,
                };
            }
        }
        if self.registry.needs_optional_wrap(target, source) {
            let span = expr.span();
            return RirExpression::WrapOptional {
                value: Box::new(expr),
                result_type: target,
                span,
            };
        }
        expr
    }

    /// The common type of two branches; mirrors the checker's join rule.
    pub(crate) fn join(&mut self, a: TypeId, b: TypeId) -> TypeId {
        if a == b {
            return a;
        }
        if a == TypeId::NULL {
            return self.registry.optional_of(b);
        }
        if b == TypeId::NULL {
            return self.registry.optional_of(a);
        }
        if self.registry.is_assignable(a, b) {
            return a;
        }
        if self.registry.is_assignable(b, a) {
            return b;
        }
        // Unreachable after checking; prefer the first branch.
        a
    }

    // ---- scopes ----

    pub(crate) fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(crate) fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    pub(crate) fn define(&mut self, name: String, type_id: TypeId, mutable: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, VarInfo { type_id, mutable });
        }
    }

    fn lookup(&self, name: &str) -> Option<VarInfo> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .copied()
    }

    pub(crate) fn variable_type(&self, name: &str) -> Option<TypeId> {
        self.lookup(name).map(|info| info.type_id)
    }

    pub(crate) fn function_signature(&self, name: &str) -> Option<&(Vec<TypeId>, TypeId)> {
        self.functions.get(name)
    }
}

/// Whether a trailing expression statement may carry the block's value.
/// Calls and statement-style control flow never do.
fn is_value_candidate(expression: &Expression) -> bool {
    !matches!(
        expression,
        Expression::Call { .. }
            | Expression::If(_)
            | Expression::Match(_)
            | Expression::While(_)
            | Expression::For(_)
    )
}
