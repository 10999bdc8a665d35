//! Human-readable RIR dump for compiler debugging (`--emit-rir`).

use crate::{
    RirBlock, RirExpression, RirFormatPart, RirModule, RirPattern, RirStatement,
};
use crate::{BinaryOp, UnaryOp};
use rive_core::types::TypeRegistry;
use std::fmt::Write;

impl RirModule {
    /// Renders the module as indented pseudo-code.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for function in &self.functions {
            let params = function
                .parameters
                .iter()
                .map(|p| {
                    format!(
                        "{}: {} [{}]",
                        p.name,
                        self.type_registry.display_name(p.type_id),
                        p.strategy
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                out,
                "fun {}({}) -> {}",
                function.name,
                params,
                self.type_registry.display_name(function.return_type)
            );
            dump_block(&mut out, &function.body, &self.type_registry, 1);
        }
        out
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn dump_block(out: &mut String, block: &RirBlock, registry: &TypeRegistry, depth: usize) {
    for statement in &block.statements {
        dump_statement(out, statement, registry, depth);
    }
    if let Some(final_expr) = &block.final_expr {
        indent(out, depth);
        let _ = writeln!(out, "yield {}", expr_str(final_expr, registry));
    }
}

fn dump_statement(
    out: &mut String,
    statement: &RirStatement,
    registry: &TypeRegistry,
    depth: usize,
) {
    indent(out, depth);
    match statement {
        RirStatement::Let {
            name,
            type_id,
            mutable,
            strategy,
            value,
            ..
        } => {
            let _ = writeln!(
                out,
                "let {}{}: {} [{}] = {}",
                if *mutable { "mut " } else { "" },
                name,
                registry.display_name(*type_id),
                strategy,
                expr_str(value, registry)
            );
        }
        RirStatement::Assign { name, value, .. } => {
            let _ = writeln!(out, "{} = {}", name, expr_str(value, registry));
        }
        RirStatement::AssignIndex {
            array,
            index,
            value,
            ..
        } => {
            let _ = writeln!(
                out,
                "{}[{}] = {}",
                array,
                expr_str(index, registry),
                expr_str(value, registry)
            );
        }
        RirStatement::Return { value, .. } => match value {
            Some(value) => {
                let _ = writeln!(out, "return {}", expr_str(value, registry));
            }
            None => {
                let _ = writeln!(out, "return");
            }
        },
        RirStatement::If {
            condition,
            then_block,
            else_block,
            ..
        } => {
            let _ = writeln!(out, "if {} {{", expr_str(condition, registry));
            dump_block(out, then_block, registry, depth + 1);
            if let Some(else_block) = else_block {
                indent(out, depth);
                out.push_str("} else {\n");
                dump_block(out, else_block, registry, depth + 1);
            }
            indent(out, depth);
            out.push_str("}\n");
        }
        RirStatement::While {
            condition, body, ..
        } => {
            let _ = writeln!(out, "while {} {{", expr_str(condition, registry));
            dump_block(out, body, registry, depth + 1);
            indent(out, depth);
            out.push_str("}\n");
        }
        RirStatement::For {
            variable,
            start,
            end,
            inclusive,
            body,
            ..
        } => {
            let _ = writeln!(
                out,
                "for {} in {}{}{} {{",
                variable,
                expr_str(start, registry),
                if *inclusive { "..=" } else { ".." },
                expr_str(end, registry)
            );
            dump_block(out, body, registry, depth + 1);
            indent(out, depth);
            out.push_str("}\n");
        }
        RirStatement::Loop { body, .. } => {
            out.push_str("loop {\n");
            dump_block(out, body, registry, depth + 1);
            indent(out, depth);
            out.push_str("}\n");
        }
        RirStatement::Break { value, .. } => match value {
            Some(value) => {
                let _ = writeln!(out, "break with {}", expr_str(value, registry));
            }
            None => {
                let _ = writeln!(out, "break");
            }
        },
        RirStatement::Continue { .. } => {
            out.push_str("continue\n");
        }
        RirStatement::Match {
            scrutinee, arms, ..
        } => {
            let _ = writeln!(out, "match {} {{", expr_str(scrutinee, registry));
            for (pattern, body) in arms {
                indent(out, depth + 1);
                let _ = writeln!(out, "{} => {{", pattern_str(pattern));
                dump_block(out, body, registry, depth + 2);
                indent(out, depth + 1);
                out.push_str("}\n");
            }
            indent(out, depth);
            out.push_str("}\n");
        }
        RirStatement::Expression { expr, .. } => {
            let _ = writeln!(out, "{}", expr_str(expr, registry));
        }
        RirStatement::Block { block, .. } => {
            out.push_str("{\n");
            dump_block(out, block, registry, depth + 1);
            indent(out, depth);
            out.push_str("}\n");
        }
    }
}

fn expr_str(expr: &RirExpression, registry: &TypeRegistry) -> String {
    match expr {
        RirExpression::IntLiteral { value, .. } => value.to_string(),
        RirExpression::FloatLiteral { value, .. } => format!("{value:?}"),
        RirExpression::StringLiteral { value, .. } => format!("{value:?}"),
        RirExpression::BoolLiteral { value, .. } => value.to_string(),
        RirExpression::Unit { .. } => "()".to_string(),
        RirExpression::NullLiteral { .. } => "null".to_string(),
        RirExpression::Variable { name, .. } => name.clone(),
        RirExpression::Binary {
            op, left, right, ..
        } => format!(
            "({} {} {})",
            expr_str(left, registry),
            binary_op_str(*op),
            expr_str(right, registry)
        ),
        RirExpression::Unary { op, operand, .. } => format!(
            "({}{})",
            match op {
                UnaryOp::Negate => "-",
                UnaryOp::Not => "!",
            },
            expr_str(operand, registry)
        ),
        RirExpression::Call {
            function,
            arguments,
            ..
        } => {
            let args = arguments
                .iter()
                .map(|a| expr_str(a, registry))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{function}({args})")
        }
        RirExpression::ArrayLiteral { elements, .. } => {
            let elems = elements
                .iter()
                .map(|e| expr_str(e, registry))
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{elems}]")
        }
        RirExpression::Index { array, index, .. } => format!(
            "{}[{}]",
            expr_str(array, registry),
            expr_str(index, registry)
        ),
        RirExpression::WrapOptional { value, .. } => {
            format!("some({})", expr_str(value, registry))
        }
        RirExpression::Elvis {
            value, fallback, ..
        } => format!(
            "({} ?: {})",
            expr_str(value, registry),
            expr_str(fallback, registry)
        ),
        RirExpression::FormatText { parts, .. } => {
            let mut text = String::from("format(");
            for (idx, part) in parts.iter().enumerate() {
                if idx > 0 {
                    text.push_str(", ");
                }
                match part {
                    RirFormatPart::Text(literal) => {
                        let _ = write!(text, "{literal:?}");
                    }
                    RirFormatPart::Value(value) => text.push_str(&expr_str(value, registry)),
                }
            }
            text.push(')');
            text
        }
        RirExpression::If { .. } => "if-expr".to_string(),
        RirExpression::Match { .. } => "match-expr".to_string(),
        RirExpression::Block { .. } => "block-expr".to_string(),
        RirExpression::Loop { .. } => "loop-expr".to_string(),
    }
}

fn binary_op_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Subtract => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
        BinaryOp::Modulo => "%",
        BinaryOp::Equal => "==",
        BinaryOp::NotEqual => "!=",
        BinaryOp::LessThan => "<",
        BinaryOp::LessEqual => "<=",
        BinaryOp::GreaterThan => ">",
        BinaryOp::GreaterEqual => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
    }
}

fn pattern_str(pattern: &RirPattern) -> String {
    match pattern {
        RirPattern::IntLiteral { value, .. } => value.to_string(),
        RirPattern::StringLiteral { value, .. } => format!("{value:?}"),
        RirPattern::BoolLiteral { value, .. } => value.to_string(),
        RirPattern::Wildcard { .. } => "_".to_string(),
        RirPattern::Range {
            start,
            end,
            inclusive,
            ..
        } => format!("{start}{}{end}", if *inclusive { "..=" } else { ".." }),
        RirPattern::Or { patterns, .. } => patterns
            .iter()
            .map(pattern_str)
            .collect::<Vec<_>>()
            .join(" | "),
    }
}
