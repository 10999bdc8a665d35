use pretty_assertions::assert_eq;
use rive_core::Span;
use rive_lexer::{tokenize, StrPart, TokenKind};

fn kinds(src: &str) -> Vec<TokenKind> {
    tokenize(src)
        .expect("tokenize")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn lexes_a_let_binding() {
    assert_eq!(
        kinds("let mut answer = 42"),
        vec![
            TokenKind::KwLet,
            TokenKind::KwMut,
            TokenKind::Ident("answer".to_string()),
            TokenKind::Assign,
            TokenKind::Int(42),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lexes_all_keywords() {
    let src = "let const mut fun if else while for loop match return break continue in with true false null";
    let toks = kinds(src);
    assert_eq!(toks.len(), 19);
    assert!(!toks
        .iter()
        .any(|t| matches!(t, TokenKind::Ident(_))));
}

#[test]
fn identifiers_may_shadow_keyword_prefixes() {
    assert_eq!(
        kinds("letter iffy match_all"),
        vec![
            TokenKind::Ident("letter".to_string()),
            TokenKind::Ident("iffy".to_string()),
            TokenKind::Ident("match_all".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lexes_numbers() {
    assert_eq!(
        kinds("0 42 3.25"),
        vec![
            TokenKind::Int(0),
            TokenKind::Int(42),
            TokenKind::Float(3.25),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn range_after_int_is_not_a_float() {
    assert_eq!(
        kinds("1..5"),
        vec![
            TokenKind::Int(1),
            TokenKind::DotDot,
            TokenKind::Int(5),
            TokenKind::Eof,
        ]
    );
    assert_eq!(
        kinds("1..=5"),
        vec![
            TokenKind::Int(1),
            TokenKind::DotDotEq,
            TokenKind::Int(5),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn elvis_lexes_as_one_token() {
    assert_eq!(
        kinds("name ?: fallback"),
        vec![
            TokenKind::Ident("name".to_string()),
            TokenKind::Elvis,
            TokenKind::Ident("fallback".to_string()),
            TokenKind::Eof,
        ]
    );
    // A bare `?` stays its own token (nullable marker).
    assert_eq!(
        kinds("Int ?"),
        vec![
            TokenKind::Ident("Int".to_string()),
            TokenKind::Question,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lexes_operators_and_delimiters() {
    assert_eq!(
        kinds("( ) { } [ ] , : ; -> _ == != <= >= && || ! % ."),
        vec![
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::Comma,
            TokenKind::Colon,
            TokenKind::Semi,
            TokenKind::Arrow,
            TokenKind::Underscore,
            TokenKind::EqEq,
            TokenKind::NotEq,
            TokenKind::LtEq,
            TokenKind::GtEq,
            TokenKind::AndAnd,
            TokenKind::OrOr,
            TokenKind::Bang,
            TokenKind::Percent,
            TokenKind::Dot,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn plain_string_is_a_single_text_part() {
    assert_eq!(
        kinds(r#""hello\nworld""#),
        vec![
            TokenKind::Str(vec![StrPart::Text("hello\nworld".to_string())]),
            TokenKind::Eof,
        ]
    );
    assert_eq!(kinds(r#""""#), vec![TokenKind::Str(vec![]), TokenKind::Eof]);
}

#[test]
fn unicode_escapes_decode() {
    assert_eq!(
        kinds(r#""\u{1F980}""#),
        vec![
            TokenKind::Str(vec![StrPart::Text("🦀".to_string())]),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn dollar_ident_interpolation_splits_parts() {
    let src = r#""Hello $name!""#;
    let toks = kinds(src);
    assert_eq!(
        toks[0],
        TokenKind::Str(vec![
            StrPart::Text("Hello ".to_string()),
            StrPart::Expr {
                src: "name".to_string(),
                base_offset: 8,
            },
            StrPart::Text("!".to_string()),
        ])
    );
}

#[test]
fn braced_interpolation_keeps_raw_source_and_offset() {
    let src = r#""sum: ${a + b}""#;
    let toks = kinds(src);
    assert_eq!(
        toks[0],
        TokenKind::Str(vec![
            StrPart::Text("sum: ".to_string()),
            StrPart::Expr {
                src: "a + b".to_string(),
                base_offset: 8,
            },
        ])
    );
}

#[test]
fn interpolation_skips_nested_strings_and_braces() {
    let src = r#""${ if ok { "y}" } else { "n" } }""#;
    let toks = tokenize(src).expect("tokenize");
    let TokenKind::Str(parts) = &toks[0].kind else {
        panic!("expected string token");
    };
    assert_eq!(parts.len(), 1);
    let StrPart::Expr { src: expr, .. } = &parts[0] else {
        panic!("expected interpolation part");
    };
    assert_eq!(expr.trim(), r#"if ok { "y}" } else { "n" }"#);
}

#[test]
fn doubled_dollar_is_literal() {
    assert_eq!(
        kinds(r#""costs $$5""#),
        vec![
            TokenKind::Str(vec![StrPart::Text("costs $5".to_string())]),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comments_are_skipped() {
    assert_eq!(
        kinds("1 // line\n/* block /* nested */ */ 2"),
        vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]
    );
}

#[test]
fn spans_are_byte_offsets() {
    let toks = tokenize("let x = 1").expect("tokenize");
    assert_eq!(toks[0].span, Span::new(0, 3));
    assert_eq!(toks[1].span, Span::new(4, 5));
    assert_eq!(toks[2].span, Span::new(6, 7));
    assert_eq!(toks[3].span, Span::new(8, 9));
}

#[test]
fn unterminated_string_is_an_error() {
    assert!(tokenize(r#""oops"#).is_err());
    assert!(tokenize(r#""${a"#).is_err());
    assert!(tokenize("/* open").is_err());
}

#[test]
fn unknown_characters_are_errors() {
    let err = tokenize("let # = 1").unwrap_err();
    assert!(err.to_string().contains('#'));
}
