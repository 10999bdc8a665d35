use rive_core::Span;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// One piece of a string literal.
///
/// Plain strings are a single `Text` part (or none, for `""`). `$ident`
/// and `${expr}` interpolations carry their raw source so the parser can
/// re-parse them in place, with `base_offset` preserving global spans.
#[derive(Clone, Debug, PartialEq)]
pub enum StrPart {
    Text(String),
    Expr { src: String, base_offset: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Eof,

    Ident(String),
    Int(i64),
    Float(f64),
    Str(Vec<StrPart>),

    // Keywords.
    KwLet,
    KwConst,
    KwMut,
    KwFun,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwLoop,
    KwMatch,
    KwReturn,
    KwBreak,
    KwContinue,
    KwIn,
    KwWith,
    KwTrue,
    KwFalse,
    KwNull,

    // Delimiters.
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semi,
    Dot,
    Underscore,
    Arrow,

    // Operators.
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    Question,
    Elvis,
    DotDot,
    DotDotEq,
}

impl TokenKind {
    /// Short description used in `expected X, found Y` diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Eof => "end of input".to_string(),
            Self::Ident(name) => format!("`{name}`"),
            Self::Int(_) => "integer literal".to_string(),
            Self::Float(_) => "float literal".to_string(),
            Self::Str(_) => "string literal".to_string(),
            other => format!("`{other}`"),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Eof => "<eof>",
            Self::Ident(name) => return write!(f, "{name}"),
            Self::Int(value) => return write!(f, "{value}"),
            Self::Float(value) => return write!(f, "{value}"),
            Self::Str(_) => "<string>",

            Self::KwLet => "let",
            Self::KwConst => "const",
            Self::KwMut => "mut",
            Self::KwFun => "fun",
            Self::KwIf => "if",
            Self::KwElse => "else",
            Self::KwWhile => "while",
            Self::KwFor => "for",
            Self::KwLoop => "loop",
            Self::KwMatch => "match",
            Self::KwReturn => "return",
            Self::KwBreak => "break",
            Self::KwContinue => "continue",
            Self::KwIn => "in",
            Self::KwWith => "with",
            Self::KwTrue => "true",
            Self::KwFalse => "false",
            Self::KwNull => "null",

            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Semi => ";",
            Self::Dot => ".",
            Self::Underscore => "_",
            Self::Arrow => "->",

            Self::Assign => "=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Bang => "!",
            Self::Question => "?",
            Self::Elvis => "?:",
            Self::DotDot => "..",
            Self::DotDotEq => "..=",
        };
        write!(f, "{text}")
    }
}
