mod control_flow;
mod exprs;

use crate::symbols::{Symbol, SymbolTable};
use control_flow::LoopContext;
use rive_core::types::{TypeId, TypeRegistry};
use rive_core::{Error, Result, Span};
use rive_parser::ast::{
    Block, Expression, Function, FunctionBody, Item, Program, Statement,
};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub(crate) struct FnSig {
    pub(crate) params: Vec<TypeId>,
    pub(crate) ret: TypeId,
}

/// Type checker for Rive programs.
///
/// Walks the AST after parsing, resolving names, enforcing mutability,
/// and computing a type for every expression.
pub struct TypeChecker {
    pub(crate) registry: TypeRegistry,
    pub(crate) symbols: SymbolTable,
    pub(crate) functions: HashMap<String, FnSig>,
    pub(crate) current_return: Option<TypeId>,
    pub(crate) loop_stack: Vec<LoopContext>,
}

impl TypeChecker {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            symbols: SymbolTable::new(),
            functions: HashMap::new(),
            current_return: None,
            loop_stack: Vec::new(),
        }
    }

    pub fn into_type_registry(self) -> TypeRegistry {
        self.registry
    }

    pub fn check_program(&mut self, program: &Program) -> Result<()> {
        // First pass: register every function signature so definition
        // order never matters.
        for item in &program.items {
            let Item::Function(func) = item;
            if self.functions.contains_key(&func.name) {
                return Err(Error::semantic(
                    format!("function `{}` is defined twice", func.name),
                    func.span,
                ));
            }
            let params: Vec<TypeId> = func.params.iter().map(|p| p.param_type).collect();
            self.functions.insert(
                func.name.clone(),
                FnSig {
                    params,
                    ret: func.return_type,
                },
            );
        }

        let Some(main) = self.functions.get("main") else {
            return Err(Error::semantic(
                "program must define a `main` function",
                Span::at(0),
            ));
        };
        if !main.params.is_empty() || main.ret != TypeId::UNIT {
            let Item::Function(func) = program
                .items
                .iter()
                .find(|item| matches!(item, Item::Function(f) if f.name == "main"))
                .expect("main exists");
            return Err(Error::semantic(
                "`main` takes no parameters and returns no value",
                func.span,
            ));
        }

        // Second pass: check every body.
        for item in &program.items {
            let Item::Function(func) = item;
            self.check_function(func)?;
        }
        Ok(())
    }

    fn check_function(&mut self, func: &Function) -> Result<()> {
        self.symbols.enter_scope();
        self.current_return = Some(func.return_type);

        for param in &func.params {
            if param.param_type == TypeId::UNIT || param.param_type == TypeId::NULL {
                return Err(Error::semantic(
                    format!(
                        "parameter `{}` cannot have type `{}`",
                        param.name,
                        self.registry.display_name(param.param_type)
                    ),
                    param.span,
                ));
            }
            self.define(
                Symbol::new(param.name.clone(), param.param_type, false),
                param.span,
            )?;
        }

        match &func.body {
            FunctionBody::Expression(expr) => {
                let value_type = self.check_expression(expr)?;
                self.require_assignable(func.return_type, value_type, expr.span(), "return value")?;
            }
            FunctionBody::Block(block) => {
                let block_type = self.check_block(block)?;
                if func.return_type != TypeId::UNIT {
                    let implicit_ok = self
                        .registry
                        .is_assignable(func.return_type, block_type);
                    if !implicit_ok && !guarantees_return(block) {
                        return Err(Error::semantic(
                            format!(
                                "function `{}` must return `{}` on every path",
                                func.name,
                                self.registry.display_name(func.return_type)
                            ),
                            func.span,
                        ));
                    }
                }
            }
        }

        self.symbols.exit_scope();
        self.current_return = None;
        Ok(())
    }

    /// Checks a block and returns its value type: the type of a trailing
    /// value-producing expression statement, `Unit` otherwise.
    pub(crate) fn check_block(&mut self, block: &Block) -> Result<TypeId> {
        self.symbols.enter_scope();
        let mut block_type = TypeId::UNIT;
        let last = block.statements.len().checked_sub(1);

        for (idx, statement) in block.statements.iter().enumerate() {
            let value = self.check_statement(statement)?;
            if Some(idx) == last {
                if let Statement::Expression { expression, .. } = statement {
                    if produces_block_value(expression) {
                        block_type = value;
                    }
                }
            }
        }

        self.symbols.exit_scope();
        Ok(block_type)
    }

    /// Checks one statement, returning the type of expression statements
    /// (`Unit` for everything else).
    fn check_statement(&mut self, statement: &Statement) -> Result<TypeId> {
        match statement {
            Statement::Let {
                name,
                mutable,
                infer_nullable,
                var_type,
                initializer,
                span,
            } => {
                let ty =
                    self.check_binding(name, *infer_nullable, *var_type, initializer, *span)?;
                self.define(Symbol::new(name.clone(), ty, *mutable), *span)?;
                Ok(TypeId::UNIT)
            }

            Statement::Const {
                name,
                infer_nullable,
                var_type,
                initializer,
                span,
            } => {
                let ty =
                    self.check_binding(name, *infer_nullable, *var_type, initializer, *span)?;
                self.define(Symbol::new(name.clone(), ty, false), *span)?;
                Ok(TypeId::UNIT)
            }

            Statement::Assign { name, value, span } => {
                let (mutable, expected) = {
                    let symbol = self.symbols.lookup(name).ok_or_else(|| {
                        Error::semantic(format!("undefined variable `{name}`"), *span)
                    })?;
                    (symbol.mutable, symbol.type_id)
                };
                if !mutable {
                    return Err(Error::semantic(
                        format!("cannot assign to immutable variable `{name}`"),
                        *span,
                    ));
                }
                let value_type = self.check_expression(value)?;
                self.require_assignable(expected, value_type, *span, "assignment")?;
                Ok(TypeId::UNIT)
            }

            Statement::AssignIndex {
                name,
                index,
                value,
                span,
            } => {
                let (mutable, array_type) = {
                    let symbol = self.symbols.lookup(name).ok_or_else(|| {
                        Error::semantic(format!("undefined variable `{name}`"), *span)
                    })?;
                    (symbol.mutable, symbol.type_id)
                };
                if !mutable {
                    return Err(Error::semantic(
                        format!("cannot assign into immutable array `{name}`"),
                        *span,
                    ));
                }
                let element = self.element_type(array_type, *span)?;
                let index_type = self.check_expression(index)?;
                if index_type != TypeId::INT {
                    return Err(Error::semantic(
                        format!(
                            "array index must be `Int`, found `{}`",
                            self.registry.display_name(index_type)
                        ),
                        index.span(),
                    ));
                }
                let value_type = self.check_expression(value)?;
                self.require_assignable(element, value_type, *span, "element assignment")?;
                Ok(TypeId::UNIT)
            }

            Statement::Return { value, span } => {
                let expected = self.current_return.ok_or_else(|| {
                    Error::semantic("`return` outside of a function", *span)
                })?;
                let value_type = match value {
                    Some(expr) => self.check_expression(expr)?,
                    None => TypeId::UNIT,
                };
                self.require_assignable(expected, value_type, *span, "return value")?;
                Ok(TypeId::UNIT)
            }

            Statement::Break(break_stmt) => {
                self.check_break(break_stmt)?;
                Ok(TypeId::UNIT)
            }
            Statement::Continue(continue_stmt) => {
                self.check_continue(continue_stmt)?;
                Ok(TypeId::UNIT)
            }

            Statement::Expression { expression, .. } => match expression {
                // In statement position, `if`/`match` need no else branch
                // and no arm agreement.
                Expression::If(if_expr) => self.check_if(if_expr, false),
                Expression::Match(match_expr) => self.check_match(match_expr, false),
                _ => self.check_expression(expression),
            },
        }
    }

    fn check_binding(
        &mut self,
        name: &str,
        infer_nullable: bool,
        var_type: Option<TypeId>,
        initializer: &Expression,
        span: Span,
    ) -> Result<TypeId> {
        let init_type = self.check_expression(initializer)?;

        if init_type == TypeId::UNIT {
            return Err(Error::semantic(
                format!("cannot bind `{name}` to a value of type `Unit`"),
                span,
            ));
        }

        if let Some(annotated) = var_type {
            self.require_assignable(annotated, init_type, span, "initializer")?;
            return Ok(annotated);
        }

        if infer_nullable {
            if init_type == TypeId::NULL {
                return Err(Error::semantic(
                    format!("cannot infer the type of `{name}?` from `null`; annotate it"),
                    span,
                ));
            }
            return Ok(self.registry.optional_of(init_type));
        }

        if init_type == TypeId::NULL {
            return Err(Error::semantic(
                format!("cannot infer a type for `{name}` from `null`; annotate it"),
                span,
            ));
        }

        Ok(init_type)
    }

    // ---- shared helpers ----

    pub(crate) fn define(&mut self, symbol: Symbol, span: Span) -> Result<()> {
        self.symbols
            .define(symbol)
            .map_err(|message| Error::semantic(message, span))
    }

    pub(crate) fn require_assignable(
        &self,
        target: TypeId,
        source: TypeId,
        span: Span,
        what: &str,
    ) -> Result<()> {
        if self.registry.is_assignable(target, source) {
            Ok(())
        } else {
            Err(Error::semantic(
                format!(
                    "type mismatch in {what}: expected `{}`, found `{}`",
                    self.registry.display_name(target),
                    self.registry.display_name(source)
                ),
                span,
            ))
        }
    }

    /// The common type of two branches/arms, widening across `null`.
    pub(crate) fn join_types(
        &mut self,
        a: TypeId,
        b: TypeId,
        span: Span,
        what: &str,
    ) -> Result<TypeId> {
        if a == b {
            return Ok(a);
        }
        if a == TypeId::NULL {
            return Ok(self.registry.optional_of(b));
        }
        if b == TypeId::NULL {
            return Ok(self.registry.optional_of(a));
        }
        if self.registry.is_assignable(a, b) {
            return Ok(a);
        }
        if self.registry.is_assignable(b, a) {
            return Ok(b);
        }
        Err(Error::semantic(
            format!(
                "{what} have incompatible types: `{}` vs `{}`",
                self.registry.display_name(a),
                self.registry.display_name(b)
            ),
            span,
        ))
    }

    pub(crate) fn element_type(&self, array_type: TypeId, span: Span) -> Result<TypeId> {
        match self.registry.kind(array_type) {
            Some(rive_core::types::TypeKind::Array { element, .. }) => Ok(*element),
            _ => Err(Error::semantic(
                format!(
                    "expected an array, found `{}`",
                    self.registry.display_name(array_type)
                ),
                span,
            )),
        }
    }
}

/// Whether an expression in trailing statement position yields the block's
/// value. Calls and statement-style control flow do not; this mirrors the
/// lowering rule exactly.
pub(crate) fn produces_block_value(expression: &Expression) -> bool {
    !matches!(
        expression,
        Expression::Call { .. } | Expression::If(_) | Expression::Match(_)
    )
}

/// Conservative return-path analysis for non-Unit functions.
fn guarantees_return(block: &Block) -> bool {
    block.statements.iter().any(statement_guarantees_return)
}

fn statement_guarantees_return(statement: &Statement) -> bool {
    match statement {
        Statement::Return { .. } => true,
        Statement::Expression { expression, .. } => match expression {
            Expression::If(if_expr) => {
                let Some(else_block) = &if_expr.else_block else {
                    return false;
                };
                guarantees_return(&if_expr.then_block)
                    && if_expr
                        .else_if_branches
                        .iter()
                        .all(|branch| guarantees_return(&branch.block))
                    && guarantees_return(else_block)
            }
            Expression::Match(match_expr) => match_expr.arms.iter().all(|arm| {
                match arm.body.as_ref() {
                    Expression::Block(block) => guarantees_return(block),
                    _ => false,
                }
            }),
            _ => false,
        },
        _ => false,
    }
}
