//! Control-flow code generation: branches, loops, match.

use crate::codegen::CodeGenerator;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use rive_core::types::TypeId;
use rive_core::Result;
use rive_ir::{RirBlock, RirExpression, RirPattern};

impl<'a> CodeGenerator<'a> {
    pub(crate) fn generate_if_stmt(
        &self,
        condition: &RirExpression,
        then_block: &RirBlock,
        else_block: Option<&RirBlock>,
    ) -> Result<TokenStream> {
        let condition = self.generate_expression(condition)?;
        let then_body = self.generate_block(then_block)?;
        match else_block {
            Some(else_block) => {
                let else_body = self.generate_block(else_block)?;
                Ok(quote! {
                    if #condition {
                        #then_body
                    } else {
                        #else_body
                    }
                })
            }
            None => Ok(quote! {
                if #condition {
                    #then_body
                }
            }),
        }
    }

    pub(crate) fn generate_if_expr(
        &self,
        condition: &RirExpression,
        then_block: &RirBlock,
        else_block: &RirBlock,
    ) -> Result<TokenStream> {
        let condition = self.generate_expression(condition)?;
        let then_body = self.generate_block(then_block)?;
        let else_body = self.generate_block(else_block)?;
        Ok(quote! {
            if #condition {
                #then_body
            } else {
                #else_body
            }
        })
    }

    pub(crate) fn generate_while(
        &self,
        condition: &RirExpression,
        body: &RirBlock,
    ) -> Result<TokenStream> {
        let condition = self.generate_expression(condition)?;
        let body = self.generate_block(body)?;
        Ok(quote! {
            while #condition {
                #body
            }
        })
    }

    pub(crate) fn generate_for(
        &self,
        variable: &str,
        start: &RirExpression,
        end: &RirExpression,
        inclusive: bool,
        body: &RirBlock,
    ) -> Result<TokenStream> {
        let variable = format_ident!("{}", variable);
        let start = self.generate_expression(start)?;
        let end = self.generate_expression(end)?;
        let body = self.generate_block(body)?;
        let range = if inclusive {
            quote! { #start..=#end }
        } else {
            quote! { #start..#end }
        };
        Ok(quote! {
            for #variable in #range {
                #body
            }
        })
    }

    pub(crate) fn generate_loop(&self, body: &RirBlock) -> Result<TokenStream> {
        let body = self.generate_block(body)?;
        Ok(quote! {
            loop {
                #body
            }
        })
    }

    pub(crate) fn generate_loop_expr(&self, body: &RirBlock) -> Result<TokenStream> {
        let body = self.generate_block(body)?;
        Ok(quote! {
            loop {
                #body
            }
        })
    }

    pub(crate) fn generate_break(&self, value: Option<&RirExpression>) -> Result<TokenStream> {
        match value {
            Some(value) => {
                let value = self.consumed(value)?;
                Ok(quote! { break #value; })
            }
            None => Ok(quote! { break; }),
        }
    }

    pub(crate) fn generate_match_stmt(
        &self,
        scrutinee: &RirExpression,
        arms: &[(RirPattern, RirBlock)],
    ) -> Result<TokenStream> {
        let scrutinee_tokens = self.generate_scrutinee(scrutinee)?;
        let arms = arms
            .iter()
            .map(|(pattern, body)| {
                let pattern = generate_pattern(pattern);
                let body = self.generate_block(body)?;
                Ok(quote! { #pattern => { #body } })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(quote! {
            match #scrutinee_tokens {
                #(#arms)*
            }
        })
    }

    pub(crate) fn generate_match_expr(
        &self,
        scrutinee: &RirExpression,
        arms: &[(RirPattern, Box<RirExpression>)],
    ) -> Result<TokenStream> {
        let scrutinee_tokens = self.generate_scrutinee(scrutinee)?;
        let arms = arms
            .iter()
            .map(|(pattern, body)| {
                let pattern = generate_pattern(pattern);
                let body = self.consumed(body)?;
                Ok(quote! { #pattern => #body, })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(quote! {
            match #scrutinee_tokens {
                #(#arms)*
            }
        })
    }

    /// Text scrutinees match as `&str` so string patterns stay literal.
    fn generate_scrutinee(&self, scrutinee: &RirExpression) -> Result<TokenStream> {
        if scrutinee.type_id() == TypeId::TEXT {
            let tokens = self.generate_expression(scrutinee)?;
            Ok(quote! { (#tokens).as_str() })
        } else {
            self.generate_operand_expr(scrutinee)
        }
    }
}

fn generate_pattern(pattern: &RirPattern) -> TokenStream {
    match pattern {
        RirPattern::IntLiteral { value, .. } => {
            let lit = proc_macro2::Literal::i64_unsuffixed(*value);
            quote! { #lit }
        }
        RirPattern::StringLiteral { value, .. } => {
            let lit = proc_macro2::Literal::string(value);
            quote! { #lit }
        }
        RirPattern::BoolLiteral { value, .. } => quote! { #value },
        RirPattern::Wildcard { .. } => quote! { _ },
        RirPattern::Range {
            start,
            end,
            inclusive,
            ..
        } => {
            let start = proc_macro2::Literal::i64_unsuffixed(*start);
            let end = proc_macro2::Literal::i64_unsuffixed(*end);
            if *inclusive {
                quote! { #start..=#end }
            } else {
                quote! { #start..#end }
            }
        }
        RirPattern::Or { patterns, .. } => {
            let patterns = patterns.iter().map(generate_pattern);
            quote! { #(#patterns)|* }
        }
    }
}
