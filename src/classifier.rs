//! Rule-table token classifier.
//!
//! Whitespace is removed before matching. At every position the rules in
//! [`RULES`] are tried in order against the remaining suffix and the first
//! match wins, so specific forms have to be declared ahead of the generic
//! identifier and number fallbacks.

use std::fmt;

use tracing::trace;

use crate::token::{NumberKind, Span, Token, TokenKind};

/// Classifies a classifier error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// No rule matches at this character.
    UnexpectedCharacter(char),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(ch) => write!(f, "invalid token: {ch}"),
        }
    }
}

/// Error produced when no classification rule matches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

type Matcher = fn(&[u8]) -> Option<(usize, TokenKind)>;

/// A named classification rule.
pub struct Rule {
    pub name: &'static str,
    matcher: Matcher,
}

impl Rule {
    /// Length and kind of the match at the start of `input`, if any.
    #[must_use]
    pub fn matches(&self, input: &[u8]) -> Option<(usize, TokenKind)> {
        (self.matcher)(input)
    }
}

/// Classification rules in priority order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "integer",
        matcher: match_integer,
    },
    Rule {
        name: "arithmetic",
        matcher: match_arithmetic,
    },
    Rule {
        name: "paren",
        matcher: match_paren,
    },
    Rule {
        name: "assign",
        matcher: match_assign,
    },
    Rule {
        name: "separator",
        matcher: match_separator,
    },
    Rule {
        name: "number",
        matcher: match_number,
    },
    Rule {
        name: "function",
        matcher: match_function,
    },
    Rule {
        name: "identifier",
        matcher: match_identifier,
    },
    Rule {
        name: "comma",
        matcher: match_comma,
    },
    Rule {
        name: "not_equal",
        matcher: match_not_equal,
    },
];

/// Classify `input` into tokens.
///
/// # Errors
///
/// Returns `LexError` for the first character no rule matches. Nothing
/// after that character is classified.
pub fn classify(input: &str) -> Result<Vec<Token>, LexError> {
    Classifier::new(input).classify()
}

struct Classifier<'a> {
    source: &'a str,
    /// Input with whitespace removed.
    stripped: Vec<u8>,
    /// Original byte offset of every byte in `stripped`.
    origins: Vec<usize>,
    line_starts: Vec<usize>,
}

impl<'a> Classifier<'a> {
    fn new(source: &'a str) -> Self {
        let mut stripped = Vec::with_capacity(source.len());
        let mut origins = Vec::with_capacity(source.len());
        for (offset, ch) in source.char_indices() {
            if ch.is_whitespace() {
                continue;
            }
            let mut buf = [0u8; 4];
            for (i, byte) in ch.encode_utf8(&mut buf).bytes().enumerate() {
                stripped.push(byte);
                origins.push(offset + i);
            }
        }

        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            source,
            stripped,
            origins,
            line_starts,
        }
    }

    fn classify(self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < self.stripped.len() {
            let rest = &self.stripped[pos..];
            let Some((len, kind)) = RULES.iter().find_map(|rule| rule.matches(rest)) else {
                let offset = self.origins[pos];
                let ch = self.source[offset..].chars().next().unwrap_or('\u{FFFD}');
                return Err(LexError {
                    kind: LexErrorKind::UnexpectedCharacter(ch),
                    span: self.span_at(offset),
                });
            };

            let lexeme = String::from_utf8_lossy(&rest[..len]).into_owned();
            trace!(%kind, lexeme = %lexeme, "classified token");
            tokens.push(Token {
                kind,
                lexeme,
                span: self.span_at(self.origins[pos]),
            });
            pos += len;
        }

        Ok(tokens)
    }

    fn span_at(&self, offset: usize) -> Span {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self.source[line_start..offset].chars().count() + 1;
        Span::new(offset, line, column)
    }
}

fn match_integer(input: &[u8]) -> Option<(usize, TokenKind)> {
    let run = input.iter().take_while(|b| b.is_ascii_digit()).count();
    if run == 0 {
        return None;
    }
    // A digit run that continues into a richer literal belongs to the
    // number rule.
    if number_literal(input).is_some_and(|(len, _)| len > run) {
        return None;
    }
    Some((run, TokenKind::Integer))
}

fn match_arithmetic(input: &[u8]) -> Option<(usize, TokenKind)> {
    let kind = match input.first()? {
        b'+' => TokenKind::Plus,
        b'-' => TokenKind::Minus,
        b'*' => TokenKind::Star,
        b'/' => TokenKind::Slash,
        _ => return None,
    };
    Some((1, kind))
}

fn match_paren(input: &[u8]) -> Option<(usize, TokenKind)> {
    match input.first()? {
        b'(' => Some((1, TokenKind::LeftParen)),
        b')' => Some((1, TokenKind::RightParen)),
        _ => None,
    }
}

fn match_assign(input: &[u8]) -> Option<(usize, TokenKind)> {
    input.starts_with(b":=").then_some((2, TokenKind::Assign))
}

fn match_separator(input: &[u8]) -> Option<(usize, TokenKind)> {
    match input.first()? {
        b';' => Some((1, TokenKind::Semicolon)),
        b':' => Some((1, TokenKind::Colon)),
        _ => None,
    }
}

fn match_number(input: &[u8]) -> Option<(usize, TokenKind)> {
    number_literal(input).map(|(len, kind)| (len, TokenKind::Number(kind)))
}

fn match_function(input: &[u8]) -> Option<(usize, TokenKind)> {
    let len = identifier_len(input);
    (len > 0 && input.get(len) == Some(&b'(')).then_some((len, TokenKind::Function))
}

fn match_identifier(input: &[u8]) -> Option<(usize, TokenKind)> {
    let len = identifier_len(input);
    (len > 0).then_some((len, TokenKind::Identifier))
}

fn match_comma(input: &[u8]) -> Option<(usize, TokenKind)> {
    (input.first() == Some(&b',')).then_some((1, TokenKind::Comma))
}

fn match_not_equal(input: &[u8]) -> Option<(usize, TokenKind)> {
    input.starts_with(b"!=").then_some((2, TokenKind::NotEqual))
}

fn identifier_len(input: &[u8]) -> usize {
    match input.first() {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => input
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
            .count(),
        _ => 0,
    }
}

/// Match the numeric literal grammar at the start of `input`.
///
/// Alternatives are tried imaginary, float, integer; the first that
/// matches wins, mirroring an ordered regex alternation.
#[must_use]
pub fn number_literal(input: &[u8]) -> Option<(usize, NumberKind)> {
    imaginary(input)
        .map(|len| (len, NumberKind::Imaginary))
        .or_else(|| float(input))
        .or_else(|| integer(input))
}

/// Match a float that starts at its decimal point (`.5`, `.5e3`, `.5j`).
///
/// Not part of the classifier's rule table; the full-grammar tokenizer
/// accepts these forms.
#[must_use]
pub fn leading_dot_number(input: &[u8]) -> Option<(usize, NumberKind)> {
    if input.first() != Some(&b'.') {
        return None;
    }
    let digits = digit_part(&input[1..], u8::is_ascii_digit);
    if digits == 0 {
        return None;
    }
    let mut len = 1 + digits;
    if let Some(exp) = exponent(&input[len..]) {
        len += exp;
    }
    if is_j(input.get(len)) {
        Some((len + 1, NumberKind::Imaginary))
    } else {
        Some((len, NumberKind::PointFloat))
    }
}

fn is_j(byte: Option<&u8>) -> bool {
    matches!(byte, Some(b'j' | b'J'))
}

fn imaginary(input: &[u8]) -> Option<usize> {
    let digits = digit_part(input, u8::is_ascii_digit);
    if digits > 0 && is_j(input.get(digits)) {
        return Some(digits + 1);
    }
    let (len, _) = float(input)?;
    is_j(input.get(len)).then_some(len + 1)
}

fn float(input: &[u8]) -> Option<(usize, NumberKind)> {
    point_float(input)
        .map(|len| (len, NumberKind::PointFloat))
        .or_else(|| exponent_float(input).map(|len| (len, NumberKind::ExponentFloat)))
}

fn point_float(input: &[u8]) -> Option<usize> {
    let whole = digit_part(input, u8::is_ascii_digit);
    if whole == 0 || input.get(whole) != Some(&b'.') {
        return None;
    }
    let mut len = whole + 1;
    len += digit_part(&input[len..], u8::is_ascii_digit);
    if let Some(exp) = exponent(&input[len..]) {
        len += exp;
    }
    Some(len)
}

fn exponent_float(input: &[u8]) -> Option<usize> {
    let whole = digit_part(input, u8::is_ascii_digit);
    if whole == 0 {
        return None;
    }
    exponent(&input[whole..]).map(|exp| whole + exp)
}

fn exponent(input: &[u8]) -> Option<usize> {
    if !matches!(input.first(), Some(b'e' | b'E')) {
        return None;
    }
    let sign = usize::from(matches!(input.get(1), Some(b'+' | b'-')));
    let digits = digit_part(&input[1 + sign..], u8::is_ascii_digit);
    (digits > 0).then_some(1 + sign + digits)
}

fn integer(input: &[u8]) -> Option<(usize, NumberKind)> {
    prefixed(input, b'x', u8::is_ascii_hexdigit)
        .map(|len| (len, NumberKind::Hex))
        .or_else(|| {
            prefixed(input, b'b', |b: &u8| matches!(*b, b'0' | b'1'))
                .map(|len| (len, NumberKind::Binary))
        })
        .or_else(|| {
            prefixed(input, b'o', |b: &u8| matches!(*b, b'0'..=b'7'))
                .map(|len| (len, NumberKind::Octal))
        })
        .or_else(|| decimal(input).map(|len| (len, NumberKind::Decimal)))
}

/// `0<prefix>` followed by one or more digits, each optionally preceded
/// by `_`.
fn prefixed(input: &[u8], prefix: u8, is_digit: fn(&u8) -> bool) -> Option<usize> {
    let has_prefix = input.get(1).is_some_and(|b| b.eq_ignore_ascii_case(&prefix));
    if input.first() != Some(&b'0') || !has_prefix {
        return None;
    }
    let mut len = 2;
    loop {
        match input.get(len) {
            Some(b'_') if input.get(len + 1).is_some_and(is_digit) => len += 2,
            Some(b) if is_digit(b) => len += 1,
            _ => break,
        }
    }
    (len > 2).then_some(len)
}

fn decimal(input: &[u8]) -> Option<usize> {
    match input.first()? {
        b'0' => {
            let mut len = 1;
            loop {
                match input.get(len) {
                    Some(b'_') if input.get(len + 1) == Some(&b'0') => len += 2,
                    Some(b'0') => len += 1,
                    _ => break,
                }
            }
            Some(len)
        }
        b'1'..=b'9' => Some(digit_part(input, u8::is_ascii_digit)),
        _ => None,
    }
}

/// A digit followed by digits, each optionally preceded by `_`.
fn digit_part(input: &[u8], is_digit: fn(&u8) -> bool) -> usize {
    if !input.first().is_some_and(is_digit) {
        return 0;
    }
    let mut len = 1;
    loop {
        match input.get(len) {
            Some(b'_') if input.get(len + 1).is_some_and(is_digit) => len += 2,
            Some(b) if is_digit(b) => len += 1,
            _ => break,
        }
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        classify(input)
            .expect("should classify")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn assignment_expression() {
        let tokens = classify("x := 3 + 4").expect("should classify");
        let pairs: Vec<_> = tokens.iter().map(|t| (t.kind, t.lexeme.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                (TokenKind::Identifier, "x"),
                (TokenKind::Assign, ":="),
                (TokenKind::Integer, "3"),
                (TokenKind::Plus, "+"),
                (TokenKind::Integer, "4"),
            ]
        );
    }

    #[test]
    fn unmatched_character() {
        let err = classify("@").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('@'));
        assert_eq!(err.span, Span::new(0, 1, 1));
    }

    #[test]
    fn error_stops_classification() {
        let err = classify("a + b = c").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('='));
        assert_eq!(err.span.column, 7);
    }

    #[test]
    fn colon_versus_assign() {
        assert_eq!(
            kinds("a:b;c:=d"),
            vec![
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn numeric_forms() {
        let cases = [
            ("0x1F", NumberKind::Hex),
            ("0b1_01", NumberKind::Binary),
            ("0o755", NumberKind::Octal),
            ("1_000", NumberKind::Decimal),
            ("3.14", NumberKind::PointFloat),
            ("1.", NumberKind::PointFloat),
            ("2.5e-3", NumberKind::PointFloat),
            ("1e10", NumberKind::ExponentFloat),
            ("3j", NumberKind::Imaginary),
            ("2.5J", NumberKind::Imaginary),
        ];
        for (input, expected) in cases {
            let tokens = classify(input).expect("should classify");
            assert_eq!(tokens.len(), 1, "{input}");
            assert_eq!(tokens[0].kind, TokenKind::Number(expected), "{input}");
            assert_eq!(tokens[0].lexeme, input);
        }
    }

    #[test]
    fn plain_digits_are_integers() {
        assert_eq!(kinds("007"), vec![TokenKind::Integer]);
        assert_eq!(kinds("42"), vec![TokenKind::Integer]);
    }

    #[test]
    fn function_name_before_paren() {
        let tokens = classify("max(a, b)").expect("should classify");
        assert_eq!(tokens[0].kind, TokenKind::Function);
        assert_eq!(tokens[0].lexeme, "max");
        assert_eq!(tokens[1].kind, TokenKind::LeftParen);
        assert_eq!(tokens[3].kind, TokenKind::Comma);
    }

    #[test]
    fn not_equal() {
        assert_eq!(
            kinds("a != b"),
            vec![TokenKind::Identifier, TokenKind::NotEqual, TokenKind::Identifier]
        );
    }

    #[test]
    fn whitespace_is_stripped_before_matching() {
        let tokens = classify("ab  cd\n\t+ 1 2").expect("should classify");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].lexeme, "abcd");
        assert_eq!(tokens[1].kind, TokenKind::Plus);
        assert_eq!(tokens[2].lexeme, "12");
    }

    #[test]
    fn spans_point_into_original_text() {
        let tokens = classify("a\n  + 1").expect("should classify");
        assert_eq!(tokens[1].span, Span::new(4, 2, 3));
        assert_eq!(tokens[2].span, Span::new(6, 2, 5));
    }

    #[test]
    fn empty_input() {
        assert!(classify("").expect("should classify").is_empty());
        assert!(classify(" \n\t ").expect("should classify").is_empty());
    }

    #[test]
    fn non_ascii_error_character() {
        let err = classify("x := é").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('é'));
        assert_eq!(err.span.column, 6);
    }
}
