//! Full-grammar tokenizer.
//!
//! Produces the token stream the parser consumes: names, numbers, strings,
//! operators and comments, plus the layout tokens (`NEWLINE`, `NL`,
//! `INDENT`, `DEDENT`) that encode significant whitespace. Every token
//! carries an integer kind code so listings can print it the way the
//! reference tokenizer does.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::classifier::{leading_dot_number, number_literal};
use crate::token::Span;

/// Kinds of full-grammar tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostTokenKind {
    EndMarker,
    Name,
    Number,
    String,
    Newline,
    Indent,
    Dedent,
    Op,
    Comment,
    Nl,
    ErrorToken,
    Encoding,
}

impl HostTokenKind {
    const ALL: [Self; 12] = [
        Self::EndMarker,
        Self::Name,
        Self::Number,
        Self::String,
        Self::Newline,
        Self::Indent,
        Self::Dedent,
        Self::Op,
        Self::Comment,
        Self::Nl,
        Self::ErrorToken,
        Self::Encoding,
    ];

    /// Integer kind code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::EndMarker => 0,
            Self::Name => 1,
            Self::Number => 2,
            Self::String => 3,
            Self::Newline => 4,
            Self::Indent => 5,
            Self::Dedent => 6,
            Self::Op => 55,
            Self::Comment => 65,
            Self::Nl => 66,
            Self::ErrorToken => 67,
            Self::Encoding => 68,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Upper-case kind name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EndMarker => "ENDMARKER",
            Self::Name => "NAME",
            Self::Number => "NUMBER",
            Self::String => "STRING",
            Self::Newline => "NEWLINE",
            Self::Indent => "INDENT",
            Self::Dedent => "DEDENT",
            Self::Op => "OP",
            Self::Comment => "COMMENT",
            Self::Nl => "NL",
            Self::ErrorToken => "ERRORTOKEN",
            Self::Encoding => "ENCODING",
        }
    }
}

/// Name for a kind code, if the code is known.
#[must_use]
pub fn tok_name(code: u8) -> Option<&'static str> {
    HostTokenKind::from_code(code).map(HostTokenKind::name)
}

/// A full-grammar token.
///
/// The kind is stored as its raw code; tokens built outside this module
/// may carry codes that do not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostToken {
    pub code: u8,
    pub text: String,
    pub start: Span,
    pub end: Span,
}

impl HostToken {
    #[must_use]
    pub fn new(kind: HostTokenKind, text: impl Into<String>, start: Span, end: Span) -> Self {
        Self {
            code: kind.code(),
            text: text.into(),
            start,
            end,
        }
    }

    #[must_use]
    pub fn kind(&self) -> Option<HostTokenKind> {
        HostTokenKind::from_code(self.code)
    }

    #[must_use]
    pub const fn is(&self, kind: HostTokenKind) -> bool {
        self.code == kind.code()
    }

    /// True for an `OP` or `NAME` token with exactly this text.
    #[must_use]
    pub fn is_text(&self, text: &str) -> bool {
        (self.is(HostTokenKind::Op) || self.is(HostTokenKind::Name)) && self.text == text
    }
}

/// One row of a token listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenExplanation {
    pub id: u8,
    pub kind: &'static str,
    pub text: String,
}

/// A token kind code with no known name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown token kind code: {0}")]
pub struct UnknownKindCode(pub u8);

/// Describe a token as `(code, kind name, text)`.
///
/// # Errors
///
/// Returns `UnknownKindCode` when the token's code has no name.
pub fn explain_token(token: &HostToken) -> Result<TokenExplanation, UnknownKindCode> {
    let kind = tok_name(token.code).ok_or(UnknownKindCode(token.code))?;
    Ok(TokenExplanation {
        id: token.code,
        kind,
        text: token.text.clone(),
    })
}

/// Classifies a tokenizer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeErrorKind {
    /// Single-quoted string reaches end of line or input.
    UnterminatedString,
    /// Triple-quoted string reaches end of input.
    UnterminatedTripleQuote,
    /// Opening bracket never closed.
    UnclosedBracket(char),
    /// Closing bracket does not match the innermost open one.
    MismatchedBracket { open: char, close: char },
    /// Closing bracket with nothing open.
    UnmatchedBracket(char),
    /// Dedent to a column that was never an indentation level.
    InconsistentDedent,
    /// Character that cannot start any token.
    UnexpectedCharacter(char),
    /// Something other than a newline after `\`.
    CharacterAfterContinuation,
    /// Input ends right after `\`.
    EofInContinuation,
}

impl fmt::Display for TokenizeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedTripleQuote => {
                write!(f, "unterminated triple-quoted string literal")
            }
            Self::UnclosedBracket(open) => write!(f, "'{open}' was never closed"),
            Self::MismatchedBracket { open, close } => write!(
                f,
                "closing parenthesis '{close}' does not match \
                 opening parenthesis '{open}'"
            ),
            Self::UnmatchedBracket(close) => write!(f, "unmatched '{close}'"),
            Self::InconsistentDedent => {
                write!(f, "unindent does not match any outer indentation level")
            }
            Self::UnexpectedCharacter(ch) => {
                write!(f, "invalid character '{ch}' (U+{:04X})", u32::from(*ch))
            }
            Self::CharacterAfterContinuation => {
                write!(f, "unexpected character after line continuation character")
            }
            Self::EofInContinuation => write!(f, "unexpected EOF while parsing"),
        }
    }
}

/// Error produced while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct TokenizeError {
    pub kind: TokenizeErrorKind,
    pub span: Span,
    /// Source line containing the error, without its line break.
    pub line_text: Option<String>,
}

/// Error from [`tokenize_file`].
#[derive(Debug, thiserror::Error)]
pub enum TokenizeFileError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
}

/// Tokenize a source string with the full grammar.
///
/// # Errors
///
/// Returns `TokenizeError` on unterminated strings, unbalanced brackets,
/// inconsistent indentation and characters that start no token.
pub fn tokenize(input: &str) -> Result<Vec<HostToken>, TokenizeError> {
    Lexer::new(input).tokenize()
}

/// Read and tokenize a file.
///
/// # Errors
///
/// Returns `TokenizeFileError::Io` when the file cannot be read and
/// `TokenizeFileError::Tokenize` when its contents do not tokenize.
pub fn tokenize_file(path: impl AsRef<Path>) -> Result<Vec<HostToken>, TokenizeFileError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| TokenizeFileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let tokens = tokenize(&source)?;
    debug!(path = %path.display(), count = tokens.len(), "tokenized file");
    Ok(tokens)
}

const OPERATORS: [&str; 48] = [
    "**=", "//=", ">>=", "<<=", "...", "!=", "%=", "&=", "**", "*=", "+=", "-=", "->", "//", "/=",
    ":=", "<<", "<=", "==", ">=", ">>", "@=", "^=", "|=", "(", ")", "[", "]", "{", "}", ":", ",",
    ";", "+", "-", "*", "/", "|", "&", "<", ">", "=", ".", "%", "~", "^", "@", "!",
];

struct Lexer<'a> {
    source: &'a str,
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
    tokens: Vec<HostToken>,
    indents: Vec<usize>,
    brackets: Vec<(char, Span)>,
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        let start = if source.starts_with('\u{FEFF}') { 3 } else { 0 };
        Self {
            source,
            input: source.as_bytes(),
            pos: start,
            line: 1,
            col: 1,
            tokens: Vec::new(),
            indents: vec![0],
            brackets: Vec::new(),
            at_line_start: true,
        }
    }

    fn tokenize(mut self) -> Result<Vec<HostToken>, TokenizeError> {
        let origin = Span::new(0, 0, 0);
        self.tokens
            .push(HostToken::new(HostTokenKind::Encoding, "utf-8", origin, origin));

        while self.pos < self.input.len() {
            if self.at_line_start && self.brackets.is_empty() {
                self.read_indentation()?;
                continue;
            }

            match self.peek() {
                Some(b' ' | b'\t' | b'\x0c') => self.advance(),
                Some(b'\n' | b'\r') => {
                    let kind = if self.brackets.is_empty() {
                        self.at_line_start = true;
                        HostTokenKind::Newline
                    } else {
                        HostTokenKind::Nl
                    };
                    self.read_line_break(kind);
                }
                Some(b'#') => self.read_comment(),
                Some(b'\\') => self.read_continuation()?,
                Some(b'"' | b'\'') => self.read_string(self.span())?,
                Some(b) if b.is_ascii_digit() => self.read_number(),
                Some(b'.') if self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => {
                    self.read_number();
                }
                _ => {
                    let ch = self.current_char();
                    if is_name_start(ch) {
                        self.read_name()?;
                    } else {
                        self.read_operator(ch)?;
                    }
                }
            }
        }

        self.finish()
    }

    fn finish(mut self) -> Result<Vec<HostToken>, TokenizeError> {
        if let Some(&(open, span)) = self.brackets.first() {
            return Err(self.error(TokenizeErrorKind::UnclosedBracket(open), span));
        }

        let end = self.span();
        let needs_newline = self.tokens.last().is_some_and(|last| {
            !matches!(
                last.kind(),
                Some(
                    HostTokenKind::Newline
                        | HostTokenKind::Nl
                        | HostTokenKind::Encoding
                        | HostTokenKind::Dedent
                )
            )
        });
        if needs_newline {
            self.tokens
                .push(HostToken::new(HostTokenKind::Newline, "", end, end));
        }

        while self.indents.len() > 1 {
            self.indents.pop();
            self.tokens
                .push(HostToken::new(HostTokenKind::Dedent, "", end, end));
        }
        self.tokens
            .push(HostToken::new(HostTokenKind::EndMarker, "", end, end));

        debug!(count = self.tokens.len(), "tokenized source");
        Ok(self.tokens)
    }

    const fn span(&self) -> Span {
        Span::new(self.pos, self.line, self.col)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn current_char(&self) -> char {
        self.source[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self) {
        let Some(ch) = self.source[self.pos..].chars().next() else {
            return;
        };
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
    }

    fn push(&mut self, kind: HostTokenKind, start: Span) {
        let text = &self.source[start.offset..self.pos];
        let end = self.span();
        self.tokens.push(HostToken::new(kind, text, start, end));
    }

    fn error(&self, kind: TokenizeErrorKind, span: Span) -> TokenizeError {
        let line_start = self.source[..span.offset].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.source[line_start..]
            .find(['\n', '\r'])
            .map_or(self.source.len(), |i| line_start + i);
        TokenizeError {
            kind,
            span,
            line_text: Some(self.source[line_start..line_end].to_string()),
        }
    }

    /// Measure the indentation of a new logical line and emit `INDENT` /
    /// `DEDENT` tokens. Blank and comment-only lines produce `NL` instead.
    fn read_indentation(&mut self) -> Result<(), TokenizeError> {
        let start = self.span();
        let mut column = 0;
        loop {
            match self.peek() {
                Some(b' ') => column += 1,
                Some(b'\t') => column = (column / 8 + 1) * 8,
                Some(b'\x0c') => column = 0,
                _ => break,
            }
            self.advance();
        }

        match self.peek() {
            None => return Ok(()),
            Some(b'\n' | b'\r') => {
                self.read_line_break(HostTokenKind::Nl);
                return Ok(());
            }
            Some(b'#') => {
                self.read_comment();
                if self.peek().is_none() {
                    let end = self.span();
                    self.tokens.push(HostToken::new(HostTokenKind::Nl, "", end, end));
                } else {
                    self.read_line_break(HostTokenKind::Nl);
                }
                return Ok(());
            }
            _ => {}
        }

        self.at_line_start = false;
        let current = self.indents.last().copied().unwrap_or(0);
        if column > current {
            self.indents.push(column);
            self.push(HostTokenKind::Indent, start);
        } else if column < current {
            while self.indents.last().is_some_and(|&level| level > column) {
                self.indents.pop();
                let here = self.span();
                self.tokens
                    .push(HostToken::new(HostTokenKind::Dedent, "", here, here));
            }
            if self.indents.last() != Some(&column) {
                return Err(self.error(TokenizeErrorKind::InconsistentDedent, self.span()));
            }
        }
        Ok(())
    }

    fn read_line_break(&mut self, kind: HostTokenKind) {
        let start = self.span();
        if self.peek() == Some(b'\r') {
            self.advance();
            if self.peek() == Some(b'\n') {
                self.pos += 1;
            }
            self.line += 1;
            self.col = 1;
        } else {
            self.advance();
        }
        let end = self.span();
        self.tokens.push(HostToken::new(kind, "\n", start, end));
    }

    fn read_comment(&mut self) {
        let start = self.span();
        while self.peek().is_some_and(|b| b != b'\n' && b != b'\r') {
            self.advance();
        }
        self.push(HostTokenKind::Comment, start);
    }

    fn read_continuation(&mut self) -> Result<(), TokenizeError> {
        let start = self.span();
        self.advance(); // skip backslash
        match self.peek() {
            Some(b'\n') => self.advance(),
            Some(b'\r') => {
                self.advance();
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
                self.line += 1;
                self.col = 1;
            }
            None => return Err(self.error(TokenizeErrorKind::EofInContinuation, start)),
            Some(_) => {
                return Err(self.error(TokenizeErrorKind::CharacterAfterContinuation, start));
            }
        }
        if self.peek().is_none() {
            return Err(self.error(TokenizeErrorKind::EofInContinuation, start));
        }
        Ok(())
    }

    fn read_number(&mut self) {
        let start = self.span();
        let rest = &self.input[self.pos..];
        let len = number_literal(rest)
            .or_else(|| leading_dot_number(rest))
            .map_or(1, |(len, _)| len);
        for _ in 0..len {
            self.advance();
        }
        self.push(HostTokenKind::Number, start);
    }

    fn read_name(&mut self) -> Result<(), TokenizeError> {
        let start = self.span();
        while is_name_continue(self.current_char()) && self.pos < self.input.len() {
            self.advance();
        }
        let word = &self.source[start.offset..self.pos];
        if is_string_prefix(word) && matches!(self.peek(), Some(b'"' | b'\'')) {
            return self.read_string(start);
        }
        self.push(HostTokenKind::Name, start);
        Ok(())
    }

    /// Read a string literal whose prefix (if any) began at `start`; the
    /// cursor sits on the opening quote.
    fn read_string(&mut self, start: Span) -> Result<(), TokenizeError> {
        let quote = self.input[self.pos];
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        let quote_len = if triple { 3 } else { 1 };
        for _ in 0..quote_len {
            self.advance();
        }

        loop {
            match self.peek() {
                None => {
                    let kind = if triple {
                        TokenizeErrorKind::UnterminatedTripleQuote
                    } else {
                        TokenizeErrorKind::UnterminatedString
                    };
                    return Err(self.error(kind, start));
                }
                Some(b'\\') => {
                    self.advance();
                    self.advance();
                }
                Some(b'\n' | b'\r') if !triple => {
                    return Err(self.error(TokenizeErrorKind::UnterminatedString, start));
                }
                Some(b) if b == quote => {
                    if !triple {
                        self.advance();
                        break;
                    }
                    if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                        for _ in 0..3 {
                            self.advance();
                        }
                        break;
                    }
                    self.advance();
                }
                Some(_) => self.advance(),
            }
        }

        self.push(HostTokenKind::String, start);
        Ok(())
    }

    fn read_operator(&mut self, ch: char) -> Result<(), TokenizeError> {
        let start = self.span();
        let rest = &self.source[self.pos..];
        let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            return Err(self.error(TokenizeErrorKind::UnexpectedCharacter(ch), start));
        };

        match *op {
            "(" | "[" | "{" => self.brackets.push((ch, start)),
            ")" | "]" | "}" => match self.brackets.pop() {
                None => {
                    return Err(self.error(TokenizeErrorKind::UnmatchedBracket(ch), start));
                }
                Some((open, _)) if closing_for(open) != ch => {
                    return Err(self.error(
                        TokenizeErrorKind::MismatchedBracket { open, close: ch },
                        start,
                    ));
                }
                Some(_) => {}
            },
            _ => {}
        }

        for _ in 0..op.len() {
            self.advance();
        }
        self.push(HostTokenKind::Op, start);
        Ok(())
    }
}

const fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn is_name_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

fn is_name_continue(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

fn is_string_prefix(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<HostTokenKind> {
        tokenize(input)
            .expect("should tokenize")
            .iter()
            .filter_map(HostToken::kind)
            .collect()
    }

    #[test]
    fn simple_assignment() {
        use HostTokenKind::{Encoding, EndMarker, Name, Newline, Number, Op};
        assert_eq!(
            kinds("x = 1\n"),
            vec![Encoding, Name, Op, Number, Newline, EndMarker]
        );
    }

    #[test]
    fn missing_trailing_newline() {
        let tokens = tokenize("x").expect("should tokenize");
        assert!(tokens[2].is(HostTokenKind::Newline));
        assert_eq!(tokens[2].text, "");
    }

    #[test]
    fn indentation() {
        use HostTokenKind::{Dedent, Indent};
        let kinds = kinds("def f():\n    return 1\nx = 2\n");
        assert_eq!(kinds.iter().filter(|k| **k == Indent).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == Dedent).count(), 1);
    }

    #[test]
    fn dedent_at_eof() {
        let tokens = tokenize("if x:\n  if y:\n    z\n").expect("should tokenize");
        let dedents = tokens.iter().filter(|t| t.is(HostTokenKind::Dedent)).count();
        assert_eq!(dedents, 2);
        assert!(tokens.last().is_some_and(|t| t.is(HostTokenKind::EndMarker)));
    }

    #[test]
    fn blank_and_comment_lines_are_nl() {
        use HostTokenKind::{Comment, Encoding, EndMarker, Name, Newline, Nl};
        assert_eq!(
            kinds("\n# note\nx\n"),
            vec![Encoding, Nl, Comment, Nl, Name, Newline, EndMarker]
        );
    }

    #[test]
    fn newline_inside_brackets_is_nl() {
        let tokens = tokenize("f(1,\n  2)\n").expect("should tokenize");
        let nl = tokens.iter().filter(|t| t.is(HostTokenKind::Nl)).count();
        assert_eq!(nl, 1);
        assert!(!tokens.iter().any(|t| t.is(HostTokenKind::Indent)));
    }

    #[test]
    fn strings_with_prefixes_and_triple_quotes() {
        let tokens = tokenize("a = rb'x\\'y'\nb = \"\"\"one\ntwo\"\"\"\n").expect("should tokenize");
        let strings: Vec<_> = tokens
            .iter()
            .filter(|t| t.is(HostTokenKind::String))
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(strings, vec!["rb'x\\'y'", "\"\"\"one\ntwo\"\"\""]);
    }

    #[test]
    fn longest_operator_wins() {
        let tokens = tokenize("a **= b // c\n").expect("should tokenize");
        let ops: Vec<_> = tokens
            .iter()
            .filter(|t| t.is(HostTokenKind::Op))
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(ops, vec!["**=", "//"]);
    }

    #[test]
    fn numbers() {
        let tokens = tokenize("0x1F 1_000 3.5e2 .5 2j\n").expect("should tokenize");
        let numbers: Vec<_> = tokens
            .iter()
            .filter(|t| t.is(HostTokenKind::Number))
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(numbers, vec!["0x1F", "1_000", "3.5e2", ".5", "2j"]);
    }

    #[test]
    fn unterminated_string() {
        let err = tokenize("x = 'abc\n").unwrap_err();
        assert_eq!(err.kind, TokenizeErrorKind::UnterminatedString);
        assert_eq!(err.span.line, 1);
        assert_eq!(err.span.column, 5);
        assert_eq!(err.line_text.as_deref(), Some("x = 'abc"));
    }

    #[test]
    fn unclosed_bracket() {
        let err = tokenize("print(1,\n").unwrap_err();
        assert_eq!(err.kind, TokenizeErrorKind::UnclosedBracket('('));
        assert_eq!(err.to_string(), "'(' was never closed at line 1, column 6");
    }

    #[test]
    fn mismatched_bracket() {
        let err = tokenize("[1)\n").unwrap_err();
        assert_eq!(
            err.kind,
            TokenizeErrorKind::MismatchedBracket {
                open: '[',
                close: ')'
            }
        );
    }

    #[test]
    fn inconsistent_dedent() {
        let err = tokenize("if x:\n    y\n  z\n").unwrap_err();
        assert_eq!(err.kind, TokenizeErrorKind::InconsistentDedent);
        assert_eq!(err.span.line, 3);
    }

    #[test]
    fn invalid_character() {
        let err = tokenize("x = $\n").unwrap_err();
        assert_eq!(err.kind, TokenizeErrorKind::UnexpectedCharacter('$'));
    }

    #[test]
    fn explain_known_and_unknown_codes() {
        let tokens = tokenize("x\n").expect("should tokenize");
        let row = explain_token(&tokens[1]).expect("known code");
        assert_eq!(row.id, 1);
        assert_eq!(row.kind, "NAME");
        assert_eq!(row.text, "x");

        let bogus = HostToken {
            code: 200,
            text: String::new(),
            start: Span::default(),
            end: Span::default(),
        };
        assert_eq!(explain_token(&bogus), Err(UnknownKindCode(200)));
    }

    #[test]
    fn code_round_trip_for_every_kind() {
        for kind in HostTokenKind::ALL {
            assert_eq!(HostTokenKind::from_code(kind.code()), Some(kind));
        }
    }
}
