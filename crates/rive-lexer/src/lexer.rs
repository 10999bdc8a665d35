use crate::token::{StrPart, Token, TokenKind};
use rive_core::{Error, Result, Span};

/// Hand-rolled scanner over a UTF-8 source string.
///
/// `base_offset` shifts every produced span; the parser uses it to lex
/// string-interpolation fragments with their original file positions.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    base_offset: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            base_offset: 0,
        }
    }

    pub fn with_base_offset(src: &'a str, base_offset: usize) -> Self {
        Self {
            src,
            pos: 0,
            base_offset,
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_ws_and_comments()?;

        let start = self.pos;
        let Some(ch) = self.peek_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: self.span(start, start),
            });
        };

        if is_ident_start(ch) {
            return Ok(self.lex_ident_or_keyword());
        }

        if ch.is_ascii_digit() {
            return self.lex_number();
        }

        if ch == '"' {
            return self.lex_string();
        }

        let kind = match ch {
            '(' => {
                self.bump_char();
                TokenKind::LParen
            }
            ')' => {
                self.bump_char();
                TokenKind::RParen
            }
            '{' => {
                self.bump_char();
                TokenKind::LBrace
            }
            '}' => {
                self.bump_char();
                TokenKind::RBrace
            }
            '[' => {
                self.bump_char();
                TokenKind::LBracket
            }
            ']' => {
                self.bump_char();
                TokenKind::RBracket
            }
            ',' => {
                self.bump_char();
                TokenKind::Comma
            }
            ';' => {
                self.bump_char();
                TokenKind::Semi
            }
            ':' => {
                self.bump_char();
                TokenKind::Colon
            }
            '.' => {
                self.bump_char();
                if self.peek_char() == Some('.') {
                    self.bump_char();
                    if self.peek_char() == Some('=') {
                        self.bump_char();
                        TokenKind::DotDotEq
                    } else {
                        TokenKind::DotDot
                    }
                } else {
                    TokenKind::Dot
                }
            }
            '-' => {
                self.bump_char();
                if self.peek_char() == Some('>') {
                    self.bump_char();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '=' => {
                self.bump_char();
                if self.peek_char() == Some('=') {
                    self.bump_char();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                self.bump_char();
                if self.peek_char() == Some('=') {
                    self.bump_char();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '?' => {
                self.bump_char();
                if self.peek_char() == Some(':') {
                    self.bump_char();
                    TokenKind::Elvis
                } else {
                    TokenKind::Question
                }
            }
            '<' => {
                self.bump_char();
                if self.peek_char() == Some('=') {
                    self.bump_char();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                self.bump_char();
                if self.peek_char() == Some('=') {
                    self.bump_char();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '+' => {
                self.bump_char();
                TokenKind::Plus
            }
            '*' => {
                self.bump_char();
                TokenKind::Star
            }
            '/' => {
                self.bump_char();
                TokenKind::Slash
            }
            '%' => {
                self.bump_char();
                TokenKind::Percent
            }
            '&' => {
                self.bump_char();
                if self.peek_char() == Some('&') {
                    self.bump_char();
                    TokenKind::AndAnd
                } else {
                    return Err(self.error_here("unexpected `&` (expected `&&`)"));
                }
            }
            '|' => {
                self.bump_char();
                if self.peek_char() == Some('|') {
                    self.bump_char();
                    TokenKind::OrOr
                } else {
                    return Err(self.error_here("unexpected `|` (expected `||`)"));
                }
            }
            _ => {
                return Err(Error::lex(
                    format!("unexpected character `{ch}`"),
                    self.span(start, self.pos + ch.len_utf8()),
                ));
            }
        };

        Ok(Token {
            kind,
            span: self.span(start, self.pos),
        })
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let start = self.pos;
        self.bump_char();
        while let Some(ch) = self.peek_char() {
            if is_ident_continue(ch) {
                self.bump_char();
            } else {
                break;
            }
        }
        let text = &self.src[start..self.pos];
        let kind = match text {
            "_" => TokenKind::Underscore,
            "let" => TokenKind::KwLet,
            "const" => TokenKind::KwConst,
            "mut" => TokenKind::KwMut,
            "fun" => TokenKind::KwFun,
            "if" => TokenKind::KwIf,
            "else" => TokenKind::KwElse,
            "while" => TokenKind::KwWhile,
            "for" => TokenKind::KwFor,
            "loop" => TokenKind::KwLoop,
            "match" => TokenKind::KwMatch,
            "return" => TokenKind::KwReturn,
            "break" => TokenKind::KwBreak,
            "continue" => TokenKind::KwContinue,
            "in" => TokenKind::KwIn,
            "with" => TokenKind::KwWith,
            "true" => TokenKind::KwTrue,
            "false" => TokenKind::KwFalse,
            "null" => TokenKind::KwNull,
            _ => TokenKind::Ident(text.to_string()),
        };
        Token {
            kind,
            span: self.span(start, self.pos),
        }
    }

    fn lex_number(&mut self) -> Result<Token> {
        let start = self.pos;
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.bump_char();
        }

        // A float needs a digit after the dot; `1..5` stays Int DotDot Int.
        let is_float = self.peek_char() == Some('.')
            && self.peek_nth_char(1).is_some_and(|c| c.is_ascii_digit());

        if is_float {
            self.bump_char();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.bump_char();
            }
            let value: f64 = self.src[start..self.pos].parse().map_err(|_| {
                Error::lex("invalid float literal", self.span(start, self.pos))
            })?;
            return Ok(Token {
                kind: TokenKind::Float(value),
                span: self.span(start, self.pos),
            });
        }

        let value: i64 = self.src[start..self.pos].parse().map_err(|_| {
            Error::lex(
                "integer literal out of range",
                self.span(start, self.pos),
            )
        })?;
        Ok(Token {
            kind: TokenKind::Int(value),
            span: self.span(start, self.pos),
        })
    }

    fn lex_string(&mut self) -> Result<Token> {
        let start = self.pos;
        let parts = self.scan_string_parts()?;
        Ok(Token {
            kind: TokenKind::Str(parts),
            span: self.span(start, self.pos),
        })
    }

    fn scan_string_parts(&mut self) -> Result<Vec<StrPart>> {
        // Assumes the current char is `"`.
        let quote_start = self.pos;
        self.bump_char();

        let mut parts = Vec::new();
        let mut text = String::new();
        loop {
            let Some(ch) = self.peek_char() else {
                return Err(Error::lex(
                    "unterminated string literal",
                    self.span(quote_start, self.pos),
                ));
            };

            if ch == '"' {
                self.bump_char();
                break;
            }

            if ch == '\\' {
                text.push(self.scan_escape()?);
                continue;
            }

            if ch == '$' {
                if self.peek_nth_char(1) == Some('$') {
                    self.pos += 2;
                    text.push('$');
                    continue;
                }

                // `${expr}` interpolation.
                if self.peek_nth_char(1) == Some('{') {
                    if !text.is_empty() {
                        parts.push(StrPart::Text(std::mem::take(&mut text)));
                    }
                    self.bump_char(); // '$'
                    self.bump_char(); // '{'

                    let expr_base_offset = self.base_offset + self.pos;
                    let expr_start = self.pos;
                    self.scan_interpolation_expr()?;
                    let expr_src = self.src[expr_start..self.pos].to_string();

                    if self.peek_char() != Some('}') {
                        return Err(self.error_here("unterminated `${...}` in string"));
                    }
                    self.bump_char(); // '}'

                    parts.push(StrPart::Expr {
                        src: expr_src,
                        base_offset: expr_base_offset,
                    });
                    continue;
                }

                // `$ident` interpolation.
                if self.peek_nth_char(1).is_some_and(is_ident_start) {
                    if !text.is_empty() {
                        parts.push(StrPart::Text(std::mem::take(&mut text)));
                    }
                    self.bump_char(); // '$'

                    let expr_base_offset = self.base_offset + self.pos;
                    let ident_start = self.pos;
                    self.bump_char();
                    while self.peek_char().is_some_and(is_ident_continue) {
                        self.bump_char();
                    }
                    parts.push(StrPart::Expr {
                        src: self.src[ident_start..self.pos].to_string(),
                        base_offset: expr_base_offset,
                    });
                    continue;
                }

                // A lone `$` is plain text.
                text.push('$');
                self.bump_char();
                continue;
            }

            text.push(ch);
            self.bump_char();
        }

        if !text.is_empty() {
            parts.push(StrPart::Text(text));
        }

        Ok(parts)
    }

    fn scan_escape(&mut self) -> Result<char> {
        // Assumes the current char is `\`.
        self.bump_char();
        let Some(esc) = self.peek_char() else {
            return Err(self.error_here("unterminated escape"));
        };
        self.bump_char();
        let ch = match esc {
            '\\' => '\\',
            '"' => '"',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            '$' => '$',
            'u' => {
                if self.peek_char() != Some('{') {
                    return Err(self.error_here("expected `u{...}` escape"));
                }
                self.bump_char();
                let hex_start = self.pos;
                while let Some(h) = self.peek_char() {
                    if h == '}' {
                        break;
                    }
                    if h.is_ascii_hexdigit() {
                        self.bump_char();
                    } else {
                        return Err(self.error_here("invalid unicode escape"));
                    }
                }
                if self.peek_char() != Some('}') {
                    return Err(self.error_here("unterminated unicode escape"));
                }
                let hex = &self.src[hex_start..self.pos];
                self.bump_char();
                let code = u32::from_str_radix(hex, 16)
                    .map_err(|_| self.error_here("invalid unicode escape"))?;
                char::from_u32(code)
                    .ok_or_else(|| self.error_here("invalid unicode scalar value"))?
            }
            _ => {
                return Err(Error::lex(
                    format!("unknown escape `\\{esc}`"),
                    self.span(self.pos.saturating_sub(2), self.pos),
                ));
            }
        };
        Ok(ch)
    }

    /// Consumes a `${...}` interpolation body up to (not including) the
    /// closing `}`, skipping over nested strings, comments, and braces.
    fn scan_interpolation_expr(&mut self) -> Result<()> {
        let mut brace_depth: i64 = 0;
        loop {
            let Some(ch) = self.peek_char() else {
                return Err(self.error_here("unterminated `${...}` in string"));
            };

            if brace_depth == 0 && ch == '}' {
                return Ok(());
            }

            if self.peek_str("//") {
                self.skip_line_comment();
                continue;
            }
            if self.peek_str("/*") {
                self.skip_block_comment()?;
                continue;
            }

            if ch == '"' {
                self.skip_nested_string()?;
                continue;
            }

            if ch == '{' {
                brace_depth += 1;
                self.bump_char();
                continue;
            }
            if ch == '}' {
                brace_depth -= 1;
                if brace_depth < 0 {
                    return Err(self.error_here("unexpected `}` in interpolation"));
                }
                self.bump_char();
                continue;
            }

            self.bump_char();
        }
    }

    fn skip_nested_string(&mut self) -> Result<()> {
        // Assumes the current char is `"`.
        let quote_start = self.pos;
        self.bump_char();
        loop {
            let Some(ch) = self.peek_char() else {
                return Err(Error::lex(
                    "unterminated string literal",
                    self.span(quote_start, self.pos),
                ));
            };
            if ch == '"' {
                self.bump_char();
                return Ok(());
            }
            if ch == '\\' {
                self.bump_char();
                if self.peek_char().is_some() {
                    self.bump_char();
                }
                continue;
            }
            self.bump_char();
        }
    }

    fn skip_ws_and_comments(&mut self) -> Result<()> {
        loop {
            while self.peek_char().is_some_and(|c| c.is_whitespace()) {
                self.bump_char();
            }
            if self.peek_str("//") {
                self.skip_line_comment();
                continue;
            }
            if self.peek_str("/*") {
                self.skip_block_comment()?;
                continue;
            }
            break;
        }
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        debug_assert!(self.peek_str("//"));
        self.pos += 2;
        while let Some(ch) = self.peek_char() {
            self.bump_char();
            if ch == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        debug_assert!(self.peek_str("/*"));
        let start = self.pos;
        self.pos += 2;
        let mut depth = 1usize;
        while depth > 0 {
            if self.pos >= self.src.len() {
                return Err(Error::lex(
                    "unterminated block comment",
                    self.span(start, self.pos),
                ));
            }
            if self.peek_str("/*") {
                self.pos += 2;
                depth += 1;
                continue;
            }
            if self.peek_str("*/") {
                self.pos += 2;
                depth -= 1;
                continue;
            }
            self.bump_char();
        }
        Ok(())
    }

    fn bump_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth_char(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn peek_str(&self, s: &str) -> bool {
        self.src[self.pos..].starts_with(s)
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.base_offset + start, self.base_offset + end)
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        Error::lex(message, self.span(self.pos, self.pos))
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic()
}

fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}
