use crate::source::Span;
use thiserror::Error;

/// Result type alias used throughout the compiler crates.
pub type Result<T> = std::result::Result<T, Error>;

/// The compiler error type, one variant per pipeline stage.
///
/// Stages that point at source carry the span of the offending code so the
/// driver can render a caret diagnostic via [`crate::SourceMap`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Lex { message: String, span: Span },

    #[error("{message}")]
    Parse { message: String, span: Span },

    #[error("{message}")]
    Semantic { message: String, span: Span },

    #[error("{message}")]
    Lower { message: String, span: Span },

    #[error("{message}")]
    Codegen { message: String },

    #[error("{0}")]
    Config(String),
}

impl Error {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::Lex {
            message: message.into(),
            span,
        }
    }

    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self::Semantic {
            message: message.into(),
            span,
        }
    }

    pub fn lower(message: impl Into<String>, span: Span) -> Self {
        Self::Lower {
            message: message.into(),
            span,
        }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        Self::Codegen {
            message: message.into(),
        }
    }

    /// The source span this error points at, if any.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lex { span, .. }
            | Self::Parse { span, .. }
            | Self::Semantic { span, .. }
            | Self::Lower { span, .. } => Some(*span),
            Self::Io(_) | Self::Codegen { .. } | Self::Config(_) => None,
        }
    }

    /// Short stage name used in diagnostic headers.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Lex { .. } => "lex",
            Self::Parse { .. } => "parse",
            Self::Semantic { .. } => "semantic",
            Self::Lower { .. } => "lower",
            Self::Codegen { .. } => "codegen",
            Self::Config(_) => "config",
        }
    }
}
