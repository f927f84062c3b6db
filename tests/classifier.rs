use scopetrace::classifier::RULES;
use scopetrace::{LexErrorKind, NumberKind, TokenKind, classify};

fn kinds(input: &str) -> Vec<TokenKind> {
    classify(input)
        .expect("classify failed")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn rules_are_tried_in_priority_order() {
    let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
    assert_eq!(
        names,
        [
            "integer",
            "arithmetic",
            "paren",
            "assign",
            "separator",
            "number",
            "function",
            "identifier",
            "comma",
            "not_equal",
        ]
    );
}

#[test]
fn first_matching_rule_wins() {
    // Both the integer and number rules accept "42"; integer comes first.
    assert_eq!(RULES[0].matches(b"42"), Some((2, TokenKind::Integer)));
    assert_eq!(
        RULES[5].matches(b"42"),
        Some((2, TokenKind::Number(NumberKind::Decimal)))
    );
    assert_eq!(kinds("42"), [TokenKind::Integer]);
}

#[test]
fn arithmetic_statement() {
    assert_eq!(
        kinds("total := (price + 2.5) * qty / 3;"),
        [
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::LeftParen,
            TokenKind::Identifier,
            TokenKind::Plus,
            TokenKind::Number(NumberKind::PointFloat),
            TokenKind::RightParen,
            TokenKind::Star,
            TokenKind::Identifier,
            TokenKind::Slash,
            TokenKind::Integer,
            TokenKind::Semicolon,
        ]
    );
}

#[test]
fn call_with_arguments() {
    let tokens = classify("f(a, 0x10, b != c)").expect("classify failed");
    let lexemes: Vec<_> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
    assert_eq!(lexemes, ["f", "(", "a", ",", "0x10", ",", "b", "!=", "c", ")"]);
    assert_eq!(tokens[0].kind, TokenKind::Function);
    assert_eq!(tokens[4].kind, TokenKind::Number(NumberKind::Hex));
}

#[test]
fn tags_match_token_names() {
    let tags: Vec<_> = classify("x:=f(1.5)-2")
        .expect("classify failed")
        .iter()
        .map(|t| t.kind.tag())
        .collect();
    assert_eq!(
        tags,
        ["ID", "ASSIGN", "FUNCTION", "LPAREN", "NUMBER", "RPAREN", "MINUS", "INTEGER"]
    );
}

#[test]
fn lone_equals_is_rejected() {
    let err = classify("x = 1").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('='));
    assert_eq!((err.span.line, err.span.column), (1, 3));
    assert_eq!(err.to_string(), "invalid token: = at line 1, column 3");
}

#[test]
fn error_location_on_later_line() {
    let err = classify("a := 1\nb := 2 @ 3").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('@'));
    assert_eq!((err.span.line, err.span.column), (2, 8));
}
