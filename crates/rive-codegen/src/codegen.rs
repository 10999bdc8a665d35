use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use rive_core::types::{TypeId, TypeKind};
use rive_core::{Error, Result};
use rive_ir::{
    BinaryOp, RirBlock, RirExpression, RirFormatPart, RirFunction, RirModule, RirParameter,
    RirStatement, UnaryOp,
};

/// Emits one Rust source file for a [`RirModule`].
pub struct CodeGenerator<'a> {
    module: &'a RirModule,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(module: &'a RirModule) -> Self {
        Self { module }
    }

    pub fn generate(&self) -> Result<String> {
        let mut items = Vec::new();
        for function in &self.module.functions {
            items.push(self.generate_function(function)?);
        }

        let tokens = quote! { #(#items)* };
        let file = syn::parse2::<syn::File>(tokens)
            .map_err(|e| Error::codegen(format!("generated code failed to parse: {e}")))?;
        Ok(prettyplease::unparse(&file))
    }

    fn generate_function(&self, function: &RirFunction) -> Result<TokenStream> {
        let name = format_ident!("{}", function.name);
        let params = function
            .parameters
            .iter()
            .map(|param| self.generate_parameter(param))
            .collect::<Result<Vec<_>>>()?;
        let return_type = if function.returns_unit() {
            quote! {}
        } else {
            let ty = self.rust_type(function.return_type)?;
            quote! { -> #ty }
        };
        let body = self.generate_block(&function.body)?;

        if self.should_inline(function) {
            Ok(quote! {
                #[inline]
                fn #name(#(#params),*) #return_type {
                    #body
                }
            })
        } else {
            Ok(quote! {
                fn #name(#(#params),*) #return_type {
                    #body
                }
            })
        }
    }

    fn generate_parameter(&self, param: &RirParameter) -> Result<TokenStream> {
        let name = format_ident!("{}", param.name);
        let ty = self.rust_type(param.type_id)?;
        Ok(quote! { #name: #ty })
    }

    /// Maps a Rive type to its Rust spelling.
    pub(crate) fn rust_type(&self, type_id: TypeId) -> Result<TokenStream> {
        let registry = &self.module.type_registry;
        let Some(kind) = registry.kind(type_id) else {
            return Err(Error::codegen(format!("unknown type {type_id}")));
        };
        Ok(match kind {
            TypeKind::Int => quote! { i64 },
            TypeKind::Float => quote! { f64 },
            TypeKind::Text => quote! { String },
            TypeKind::Bool => quote! { bool },
            TypeKind::Unit => quote! { () },
            TypeKind::Null => {
                return Err(Error::codegen(
                    "the null type has no Rust spelling; it must be coerced first",
                ));
            }
            TypeKind::Array { element, size } => {
                let element = self.rust_type(*element)?;
                let size = proc_macro2::Literal::usize_unsuffixed(*size);
                quote! { [#element; #size] }
            }
            TypeKind::Optional { inner } => {
                let inner = self.rust_type(*inner)?;
                quote! { Option<#inner> }
            }
            TypeKind::Function { params, ret } => {
                let params = params
                    .iter()
                    .map(|p| self.rust_type(*p))
                    .collect::<Result<Vec<_>>>()?;
                let ret = self.rust_type(*ret)?;
                quote! { fn(#(#params),*) -> #ret }
            }
        })
    }

    pub(crate) fn generate_block(&self, block: &RirBlock) -> Result<TokenStream> {
        let statements = block
            .statements
            .iter()
            .map(|statement| self.generate_statement(statement))
            .collect::<Result<Vec<_>>>()?;

        if let Some(final_expr) = &block.final_expr {
            let value = self.consumed(final_expr)?;
            Ok(quote! {
                #(#statements)*
                #value
            })
        } else {
            Ok(quote! { #(#statements)* })
        }
    }

    pub(crate) fn generate_statement(&self, statement: &RirStatement) -> Result<TokenStream> {
        match statement {
            RirStatement::Let {
                name,
                mutable,
                value,
                ..
            } => {
                let name = format_ident!("{}", name);
                let value = self.consumed(value)?;
                if *mutable {
                    Ok(quote! { let mut #name = #value; })
                } else {
                    Ok(quote! { let #name = #value; })
                }
            }
            RirStatement::Assign { name, value, .. } => {
                let name = format_ident!("{}", name);
                let value = self.consumed(value)?;
                Ok(quote! { #name = #value; })
            }
            RirStatement::AssignIndex {
                array,
                index,
                value,
                ..
            } => {
                let array = format_ident!("{}", array);
                let index = self.generate_expression(index)?;
                let value = self.consumed(value)?;
                Ok(quote! { #array[#index as usize] = #value; })
            }
            RirStatement::Return { value, .. } => match value {
                Some(value) => {
                    let value = self.consumed(value)?;
                    Ok(quote! { return #value; })
                }
                None => Ok(quote! { return; }),
            },
            RirStatement::Expression { expr, .. } => {
                // Block-shaped expressions with a value need it sunk for
                // the statement to type as unit.
                let needs_sink = expr.type_id() != TypeId::UNIT
                    && matches!(
                        &**expr,
                        RirExpression::Loop { .. }
                            | RirExpression::Block { .. }
                            | RirExpression::If { .. }
                            | RirExpression::Match { .. }
                    );
                let tokens = self.generate_expression(expr)?;
                if needs_sink {
                    Ok(quote! { let _ = #tokens; })
                } else {
                    Ok(quote! { #tokens; })
                }
            }
            RirStatement::If {
                condition,
                then_block,
                else_block,
                ..
            } => self.generate_if_stmt(condition, then_block, else_block.as_ref()),
            RirStatement::While {
                condition, body, ..
            } => self.generate_while(condition, body),
            RirStatement::For {
                variable,
                start,
                end,
                inclusive,
                body,
                ..
            } => self.generate_for(variable, start, end, *inclusive, body),
            RirStatement::Loop { body, .. } => self.generate_loop(body),
            RirStatement::Break { value, .. } => self.generate_break(value.as_deref()),
            RirStatement::Continue { .. } => Ok(quote! { continue; }),
            RirStatement::Match {
                scrutinee, arms, ..
            } => self.generate_match_stmt(scrutinee, arms),
            RirStatement::Block { block, .. } => {
                let body = self.generate_block(block)?;
                Ok(quote! { { #body } })
            }
        }
    }

    /// Generates an expression, parenthesized when it is block-shaped so
    /// it can serve as an operand or method receiver.
    pub(crate) fn generate_operand_expr(&self, expr: &RirExpression) -> Result<TokenStream> {
        let tokens = self.generate_expression(expr)?;
        if matches!(
            expr,
            RirExpression::If { .. }
                | RirExpression::Match { .. }
                | RirExpression::Block { .. }
                | RirExpression::Loop { .. }
        ) {
            Ok(quote! { (#tokens) })
        } else {
            Ok(tokens)
        }
    }

    /// Generates an expression for a value-consuming position, cloning
    /// non-copy places so bindings keep value semantics.
    pub(crate) fn consumed(&self, expr: &RirExpression) -> Result<TokenStream> {
        let tokens = self.generate_expression(expr)?;
        let needs_clone = match expr {
            RirExpression::Variable { type_id, .. } => {
                !self.module.type_registry.strategy(*type_id).is_copy()
            }
            RirExpression::Index { element_type, .. } => {
                !self.module.type_registry.strategy(*element_type).is_copy()
            }
            _ => false,
        };
        if needs_clone {
            Ok(quote! { #tokens.clone() })
        } else {
            Ok(tokens)
        }
    }

    pub(crate) fn generate_expression(&self, expr: &RirExpression) -> Result<TokenStream> {
        match expr {
            RirExpression::Unit { .. } => Ok(quote! { () }),
            RirExpression::IntLiteral { value, .. } => {
                let lit = proc_macro2::Literal::i64_unsuffixed(*value);
                Ok(quote! { #lit })
            }
            RirExpression::FloatLiteral { value, .. } => {
                let lit = proc_macro2::Literal::f64_unsuffixed(*value);
                Ok(quote! { #lit })
            }
            RirExpression::StringLiteral { value, .. } => {
                let lit = proc_macro2::Literal::string(value);
                Ok(quote! { #lit.to_string() })
            }
            RirExpression::BoolLiteral { value, .. } => Ok(quote! { #value }),
            RirExpression::NullLiteral { .. } => Ok(quote! { None }),
            RirExpression::Variable { name, .. } => {
                let name = format_ident!("{}", name);
                Ok(quote! { #name })
            }
            RirExpression::Binary {
                op,
                left,
                right,
                result_type,
                ..
            } => self.generate_binary(*op, left, right, *result_type),
            RirExpression::Unary { op, operand, .. } => {
                let operand = self.generate_operand_expr(operand)?;
                Ok(match op {
                    UnaryOp::Negate => quote! { (-#operand) },
                    UnaryOp::Not => quote! { (!#operand) },
                })
            }
            RirExpression::Call {
                function,
                arguments,
                ..
            } => self.generate_call(function, arguments),
            RirExpression::ArrayLiteral { elements, .. } => {
                let elements = elements
                    .iter()
                    .map(|element| self.consumed(element))
                    .collect::<Result<Vec<_>>>()?;
                Ok(quote! { [#(#elements),*] })
            }
            RirExpression::Index { array, index, .. } => {
                let array = self.generate_operand_expr(array)?;
                let index = self.generate_expression(index)?;
                Ok(quote! { #array[#index as usize] })
            }
            RirExpression::WrapOptional { value, .. } => {
                let value = self.consumed(value)?;
                Ok(quote! { Some(#value) })
            }
            RirExpression::Elvis {
                value,
                fallback,
                result_type,
                ..
            } => self.generate_elvis(value, fallback, *result_type),
            RirExpression::FormatText { parts, .. } => self.generate_format_text(parts),
            RirExpression::If {
                condition,
                then_block,
                else_block,
                ..
            } => self.generate_if_expr(condition, then_block, else_block),
            RirExpression::Match {
                scrutinee, arms, ..
            } => self.generate_match_expr(scrutinee, arms),
            RirExpression::Block { block, .. } => {
                let body = self.generate_block(block)?;
                Ok(quote! { { #body } })
            }
            RirExpression::Loop { body, .. } => self.generate_loop_expr(body),
        }
    }

    fn generate_binary(
        &self,
        op: BinaryOp,
        left: &RirExpression,
        right: &RirExpression,
        result_type: TypeId,
    ) -> Result<TokenStream> {
        // Text concatenation becomes a format! call.
        if op == BinaryOp::Add && result_type == TypeId::TEXT {
            let left = self.generate_expression(left)?;
            let right = self.generate_expression(right)?;
            return Ok(quote! { format!("{}{}", #left, #right) });
        }

        let left = self.generate_operand(left, op, true)?;
        let right = self.generate_operand(right, op, false)?;
        let operator = match op {
            BinaryOp::Add => quote! { + },
            BinaryOp::Subtract => quote! { - },
            BinaryOp::Multiply => quote! { * },
            BinaryOp::Divide => quote! { / },
            BinaryOp::Modulo => quote! { % },
            BinaryOp::Equal => quote! { == },
            BinaryOp::NotEqual => quote! { != },
            BinaryOp::LessThan => quote! { < },
            BinaryOp::LessEqual => quote! { <= },
            BinaryOp::GreaterThan => quote! { > },
            BinaryOp::GreaterEqual => quote! { >= },
            BinaryOp::And => quote! { && },
            BinaryOp::Or => quote! { || },
        };
        Ok(quote! { #left #operator #right })
    }

    /// Emitted tokens re-enter Rust's own precedence rules, so operands
    /// that bind looser than their parent get explicit parentheses.
    fn generate_operand(
        &self,
        operand: &RirExpression,
        parent: BinaryOp,
        is_left: bool,
    ) -> Result<TokenStream> {
        let tokens = self.generate_operand_expr(operand)?;
        if let RirExpression::Binary { op: child, .. } = operand {
            let needs_parens = precedence(*child) < precedence(parent)
                || (precedence(*child) == precedence(parent) && !is_left);
            if needs_parens {
                return Ok(quote! { (#tokens) });
            }
        }
        Ok(tokens)
    }

    fn generate_call(&self, function: &str, arguments: &[RirExpression]) -> Result<TokenStream> {
        if function == "print" {
            let mut format = String::new();
            for argument in arguments {
                format.push_str(display_placeholder(argument.type_id()));
            }
            let args = arguments
                .iter()
                .map(|argument| self.generate_expression(argument))
                .collect::<Result<Vec<_>>>()?;
            return Ok(quote! { println!(#format, #(#args),*) });
        }

        let name = format_ident!("{}", function);
        let args = arguments
            .iter()
            .map(|argument| self.consumed(argument))
            .collect::<Result<Vec<_>>>()?;
        Ok(quote! { #name(#(#args),*) })
    }

    fn generate_elvis(
        &self,
        value: &RirExpression,
        fallback: &RirExpression,
        result_type: TypeId,
    ) -> Result<TokenStream> {
        let value_tokens = match value {
            RirExpression::If { .. }
            | RirExpression::Match { .. }
            | RirExpression::Block { .. }
            | RirExpression::Loop { .. } => {
                let tokens = self.generate_expression(value)?;
                quote! { (#tokens) }
            }
            _ => self.consumed(value)?,
        };
        let fallback_tokens = self.consumed(fallback)?;

        // Both sides nullable: keep the option, take the first non-null.
        if self
            .module
            .type_registry
            .nullable_inner(result_type)
            .is_some()
        {
            return Ok(quote! { #value_tokens.or(#fallback_tokens) });
        }

        // Cheap fallbacks evaluate eagerly, everything else lazily.
        if fallback.is_literal() || matches!(fallback, RirExpression::Variable { .. }) {
            Ok(quote! { #value_tokens.unwrap_or(#fallback_tokens) })
        } else {
            Ok(quote! { #value_tokens.unwrap_or_else(|| #fallback_tokens) })
        }
    }

    fn generate_format_text(&self, parts: &[RirFormatPart]) -> Result<TokenStream> {
        let mut format = String::new();
        let mut args = Vec::new();
        for part in parts {
            match part {
                RirFormatPart::Text(text) => {
                    format.push_str(&text.replace('{', "{{").replace('}', "}}"));
                }
                RirFormatPart::Value(value) => {
                    format.push_str(display_placeholder(value.type_id()));
                    args.push(self.generate_expression(value)?);
                }
            }
        }
        Ok(quote! { format!(#format, #(#args),*) })
    }

    /// Small leaf helpers inline well; `main`, loops, matches, and
    /// recursion opt out.
    fn should_inline(&self, function: &RirFunction) -> bool {
        if function.is_main() {
            return false;
        }
        if count_statements(&function.body) > 5 {
            return false;
        }
        if has_complex_control_flow(&function.body) {
            return false;
        }
        !calls_in_block(&function.body, &function.name)
    }
}

/// `{}` for text, `{:?}` for everything else (options included).
fn display_placeholder(type_id: TypeId) -> &'static str {
    if type_id == TypeId::TEXT {
        "{}"
    } else {
        "{:?}"
    }
}

fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 1,
        BinaryOp::And => 2,
        BinaryOp::Equal | BinaryOp::NotEqual => 3,
        BinaryOp::LessThan
        | BinaryOp::LessEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterEqual => 4,
        BinaryOp::Add | BinaryOp::Subtract => 5,
        BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 6,
    }
}

fn count_statements(block: &RirBlock) -> usize {
    let mut count = block.statements.len();
    for statement in &block.statements {
        match statement {
            RirStatement::Block { block, .. } => count += count_statements(block),
            RirStatement::If {
                then_block,
                else_block,
                ..
            } => {
                count += count_statements(then_block);
                if let Some(else_block) = else_block {
                    count += count_statements(else_block);
                }
            }
            RirStatement::While { body, .. }
            | RirStatement::For { body, .. }
            | RirStatement::Loop { body, .. } => count += count_statements(body),
            RirStatement::Match { arms, .. } => {
                for (_, body) in arms {
                    count += count_statements(body);
                }
            }
            _ => {}
        }
    }
    count
}

fn has_complex_control_flow(block: &RirBlock) -> bool {
    block.statements.iter().any(|statement| match statement {
        RirStatement::While { .. }
        | RirStatement::For { .. }
        | RirStatement::Loop { .. }
        | RirStatement::Match { .. } => true,
        RirStatement::If {
            then_block,
            else_block,
            ..
        } => {
            has_complex_control_flow(then_block)
                || else_block.as_ref().is_some_and(has_complex_control_flow)
        }
        RirStatement::Block { block, .. } => has_complex_control_flow(block),
        _ => false,
    })
}

fn calls_in_block(block: &RirBlock, name: &str) -> bool {
    let expr_calls = |expr: &RirExpression| calls_in_expr(expr, name);
    block.statements.iter().any(|statement| match statement {
        RirStatement::Let { value, .. }
        | RirStatement::Assign { value, .. }
        | RirStatement::Expression { expr: value, .. } => expr_calls(value),
        RirStatement::AssignIndex { index, value, .. } => {
            expr_calls(index) || expr_calls(value)
        }
        RirStatement::Return { value, .. } | RirStatement::Break { value, .. } => {
            value.as_deref().is_some_and(expr_calls)
        }
        RirStatement::If {
            condition,
            then_block,
            else_block,
            ..
        } => {
            expr_calls(condition)
                || calls_in_block(then_block, name)
                || else_block
                    .as_ref()
                    .is_some_and(|block| calls_in_block(block, name))
        }
        RirStatement::While {
            condition, body, ..
        } => expr_calls(condition) || calls_in_block(body, name),
        RirStatement::For {
            start, end, body, ..
        } => expr_calls(start) || expr_calls(end) || calls_in_block(body, name),
        RirStatement::Loop { body, .. } => calls_in_block(body, name),
        RirStatement::Match {
            scrutinee, arms, ..
        } => {
            expr_calls(scrutinee)
                || arms.iter().any(|(_, body)| calls_in_block(body, name))
        }
        RirStatement::Block { block, .. } => calls_in_block(block, name),
        RirStatement::Continue { .. } => false,
    }) || block.final_expr.as_deref().is_some_and(expr_calls)
}

fn calls_in_expr(expr: &RirExpression, name: &str) -> bool {
    match expr {
        RirExpression::Call {
            function,
            arguments,
            ..
        } => function == name || arguments.iter().any(|arg| calls_in_expr(arg, name)),
        RirExpression::Binary { left, right, .. } => {
            calls_in_expr(left, name) || calls_in_expr(right, name)
        }
        RirExpression::Unary { operand, .. } => calls_in_expr(operand, name),
        RirExpression::ArrayLiteral { elements, .. } => {
            elements.iter().any(|element| calls_in_expr(element, name))
        }
        RirExpression::Index { array, index, .. } => {
            calls_in_expr(array, name) || calls_in_expr(index, name)
        }
        RirExpression::WrapOptional { value, .. } => calls_in_expr(value, name),
        RirExpression::Elvis {
            value, fallback, ..
        } => calls_in_expr(value, name) || calls_in_expr(fallback, name),
        RirExpression::FormatText { parts, .. } => parts.iter().any(|part| match part {
            RirFormatPart::Value(value) => calls_in_expr(value, name),
            RirFormatPart::Text(_) => false,
        }),
        RirExpression::If {
            condition,
            then_block,
            else_block,
            ..
        } => {
            calls_in_expr(condition, name)
                || calls_in_block(then_block, name)
                || calls_in_block(else_block, name)
        }
        RirExpression::Match {
            scrutinee, arms, ..
        } => {
            calls_in_expr(scrutinee, name)
                || arms.iter().any(|(_, body)| calls_in_expr(body, name))
        }
        RirExpression::Block { block, .. } | RirExpression::Loop { body: block, .. } => {
            calls_in_block(block, name)
        }
        _ => false,
    }
}
