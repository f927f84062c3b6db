use std::fmt;

use tracing::debug;

use crate::ast::{
    Alias, Assign, BinOp, BoolOp, ClassDef, CmpOp, ComprehensionKind, ExceptHandler, Expr,
    FunctionDef, Generator, Keyword, Module, Param, Parameters, Stmt, UnaryOp, WithItem,
};
use crate::lexer::{HostToken, HostTokenKind, TokenizeError, TokenizeErrorKind, tokenize};
use crate::value::Value;

/// Nesting depth at which the parser gives up instead of recursing.
///
/// Brackets, blocks, prefix operators and each link of an operator,
/// call or `elif` chain all count against it.
pub const MAX_NESTING: usize = 200;

const KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield",
];

const AUGMENTED: [&str; 13] = [
    "+=", "-=", "*=", "@=", "/=", "//=", "%=", "**=", "<<=", ">>=", "|=", "^=", "&=",
];

/// Classifies a syntax error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// Token that cannot appear here.
    InvalidSyntax,
    /// A specific token was required.
    Expected(&'static str),
    /// Block header not followed by an indented body.
    ExpectedIndentedBlock { construct: &'static str, line: usize },
    /// Indented line that does not open a block.
    UnexpectedIndent,
    /// Assignment to something that is not a target.
    CannotAssign(&'static str),
    /// Augmented assignment to something that is not a single target.
    IllegalAugmentedTarget(&'static str),
    /// Annotation on something that is not a single target.
    IllegalAnnotationTarget,
    /// `try` without `except` or `finally`.
    MissingExceptOrFinally,
    /// Numeric literal the literal grammar rejects.
    InvalidNumber,
    /// Bad escape or mixed string prefixes.
    InvalidString(&'static str),
    /// Nesting beyond [`MAX_NESTING`].
    TooDeeplyNested,
    /// Operator, call or `elif` chain longer than [`MAX_NESTING`] links.
    TooComplex,
    /// The tokenizer rejected the input.
    Tokenize(TokenizeErrorKind),
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSyntax => write!(f, "invalid syntax"),
            Self::Expected(what) => write!(f, "expected '{what}'"),
            Self::ExpectedIndentedBlock { construct, line } => {
                write!(f, "expected an indented block after {construct} on line {line}")
            }
            Self::UnexpectedIndent => write!(f, "unexpected indent"),
            Self::CannotAssign(what) => write!(f, "cannot assign to {what}"),
            Self::IllegalAugmentedTarget(what) => {
                write!(f, "'{what}' is an illegal expression for augmented assignment")
            }
            Self::IllegalAnnotationTarget => {
                write!(f, "only single target (not tuple) can be annotated")
            }
            Self::MissingExceptOrFinally => write!(f, "expected 'except' or 'finally' block"),
            Self::InvalidNumber => write!(f, "invalid decimal literal"),
            Self::InvalidString(reason) => f.write_str(reason),
            Self::TooDeeplyNested => write!(f, "too many nested parentheses"),
            Self::TooComplex => write!(f, "too complex to parse"),
            Self::Tokenize(kind) => write!(f, "{kind}"),
        }
    }
}

/// Structured parse failure.
///
/// `line` is 1-based, `offset` is the 1-based column of the offending
/// token, and `text` is the source line it sits on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (line {line})")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub line: usize,
    pub text: Option<String>,
    pub offset: Option<usize>,
}

impl SyntaxError {
    /// Human-readable message without location.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Offending source line, or a placeholder when it is unavailable.
    #[must_use]
    pub fn text_or_placeholder(&self) -> &str {
        self.text.as_deref().unwrap_or("No text available")
    }
}

impl From<TokenizeError> for SyntaxError {
    fn from(err: TokenizeError) -> Self {
        Self {
            kind: SyntaxErrorKind::Tokenize(err.kind),
            line: err.span.line.max(1),
            text: err.line_text,
            offset: Some(err.span.column),
        }
    }
}

/// Parse source text into a syntax tree.
///
/// # Errors
///
/// Returns `SyntaxError` when the text does not tokenize or does not
/// match the grammar. Exactly one of tree and error is produced.
pub fn parse(source: &str) -> Result<Module, SyntaxError> {
    let tokens: Vec<HostToken> = tokenize(source)?
        .into_iter()
        .filter(|t| {
            !t.is(HostTokenKind::Comment) && !t.is(HostTokenKind::Nl) && !t.is(HostTokenKind::Encoding)
        })
        .collect();
    let parser = Parser::new(source, &tokens);
    parser.check_bracket_depth()?;
    let module = parser.parse()?;
    debug!(statements = module.body.len(), "parsed module");
    Ok(module)
}

type PResult<T> = Result<T, SyntaxError>;

struct Parser<'a> {
    lines: Vec<&'a str>,
    tokens: &'a [HostToken],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: &'a [HostToken]) -> Self {
        Self {
            lines: source.lines().collect(),
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Reject bracket nesting beyond [`MAX_NESTING`] before recursing.
    fn check_bracket_depth(&self) -> PResult<()> {
        let mut depth = 0usize;
        for tok in self.tokens.iter().filter(|t| t.is(HostTokenKind::Op)) {
            match tok.text.as_str() {
                "(" | "[" | "{" => {
                    depth += 1;
                    if depth > MAX_NESTING {
                        return Err(self.error_at(tok, SyntaxErrorKind::TooDeeplyNested));
                    }
                }
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        Ok(())
    }

    fn parse(mut self) -> PResult<Module> {
        let mut body = Vec::new();
        while !self.at_kind(HostTokenKind::EndMarker) {
            if self.eat_kind(HostTokenKind::Newline) {
                continue;
            }
            body.extend(self.parse_statement()?);
        }
        Ok(Module { body })
    }

    // -- token helpers --

    fn peek(&self) -> &'a HostToken {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &'a HostToken {
        let tokens = self.tokens;
        let index = (self.pos + offset).min(tokens.len().saturating_sub(1));
        &tokens[index]
    }

    fn bump(&mut self) -> &'a HostToken {
        let tok = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_kind(&self, kind: HostTokenKind) -> bool {
        self.pos >= self.tokens.len() || self.peek().is(kind)
    }

    fn eat_kind(&mut self, kind: HostTokenKind) -> bool {
        if self.pos < self.tokens.len() && self.peek().is(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_op(&self, op: &str) -> bool {
        let tok = self.peek();
        tok.is(HostTokenKind::Op) && tok.text == op
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        let tok = self.peek();
        tok.is(HostTokenKind::Name) && tok.text == keyword
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &'static str) -> PResult<()> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.error(SyntaxErrorKind::Expected(op)))
        }
    }

    fn expect_keyword(&mut self, keyword: &'static str) -> PResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(SyntaxErrorKind::Expected(keyword)))
        }
    }

    fn expect_newline(&mut self) -> PResult<()> {
        if self.eat_kind(HostTokenKind::Newline) || self.at_kind(HostTokenKind::EndMarker) {
            Ok(())
        } else {
            Err(self.error(SyntaxErrorKind::InvalidSyntax))
        }
    }

    fn expect_name(&mut self) -> PResult<String> {
        let tok = self.peek();
        if tok.is(HostTokenKind::Name) && !is_keyword(&tok.text) {
            self.pos += 1;
            Ok(tok.text.clone())
        } else {
            Err(self.error(SyntaxErrorKind::InvalidSyntax))
        }
    }

    fn error(&self, kind: SyntaxErrorKind) -> SyntaxError {
        let tok = self.peek();
        self.error_at(tok, kind)
    }

    fn error_at(&self, tok: &HostToken, kind: SyntaxErrorKind) -> SyntaxError {
        let line = tok.start.line.max(1);
        SyntaxError {
            kind,
            line,
            text: self.lines.get(line - 1).map(|l| (*l).to_string()),
            offset: Some(tok.start.column.max(1)),
        }
    }

    /// Run a left-associative fold. Each [`Parser::deepen`] inside `f`
    /// spends one nesting level until `f` returns.
    fn chained<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let depth = self.depth;
        let result = f(self);
        self.depth = depth;
        result
    }

    fn deepen(&mut self) -> PResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(SyntaxErrorKind::TooComplex));
        }
        self.depth += 1;
        Ok(())
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(SyntaxErrorKind::TooDeeplyNested));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // -- statements --

    fn parse_statement(&mut self) -> PResult<Vec<Stmt>> {
        if self.at_kind(HostTokenKind::Indent) {
            return Err(self.error(SyntaxErrorKind::UnexpectedIndent));
        }
        let tok = self.peek();
        if tok.is(HostTokenKind::Op) && tok.text == "@" {
            return Ok(vec![self.parse_decorated()?]);
        }
        if tok.is_text("async")
            && ["def", "for", "with"].iter().any(|kw| self.peek_at(1).is_text(kw))
        {
            self.bump();
            return self.parse_statement();
        }
        if tok.is(HostTokenKind::Name) {
            let compound = match tok.text.as_str() {
                "def" => Some(self.parse_function_def(Vec::new())?),
                "class" => Some(self.parse_class_def(Vec::new())?),
                "if" => Some(self.parse_if()?),
                "while" => Some(self.parse_while()?),
                "for" => Some(self.parse_for()?),
                "try" => Some(self.parse_try()?),
                "with" => Some(self.parse_with()?),
                _ => None,
            };
            if let Some(stmt) = compound {
                return Ok(vec![stmt]);
            }
        }
        self.parse_simple_statements()
    }

    fn parse_simple_statements(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            stmts.push(self.parse_small_statement()?);
            if !self.eat_op(";") || self.at_kind(HostTokenKind::Newline) {
                break;
            }
        }
        self.expect_newline()?;
        Ok(stmts)
    }

    fn parse_small_statement(&mut self) -> PResult<Stmt> {
        let tok = self.peek();
        if tok.is(HostTokenKind::Name) {
            match tok.text.as_str() {
                "pass" => {
                    self.bump();
                    return Ok(Stmt::Pass);
                }
                "break" => {
                    self.bump();
                    return Ok(Stmt::Break);
                }
                "continue" => {
                    self.bump();
                    return Ok(Stmt::Continue);
                }
                "return" => {
                    self.bump();
                    let value = if self.at_statement_end() {
                        None
                    } else {
                        Some(self.parse_star_expressions()?)
                    };
                    return Ok(Stmt::Return(value));
                }
                "raise" => return self.parse_raise(),
                "global" | "nonlocal" => {
                    self.bump();
                    let mut names = vec![self.expect_name()?];
                    while self.eat_op(",") {
                        names.push(self.expect_name()?);
                    }
                    return Ok(if tok.text == "global" {
                        Stmt::Global(names)
                    } else {
                        Stmt::Nonlocal(names)
                    });
                }
                "del" => {
                    self.bump();
                    let targets = self.parse_target_list()?;
                    let targets = match targets {
                        Expr::Tuple(items) => items,
                        single => vec![single],
                    };
                    for target in &targets {
                        self.check_target(tok, target)?;
                    }
                    return Ok(Stmt::Delete(targets));
                }
                "assert" => {
                    self.bump();
                    let test = self.parse_test()?;
                    let msg = if self.eat_op(",") {
                        Some(self.parse_test()?)
                    } else {
                        None
                    };
                    return Ok(Stmt::Assert { test, msg });
                }
                "import" => return self.parse_import(),
                "from" => return self.parse_from_import(),
                _ => {}
            }
        }
        self.parse_expression_statement()
    }

    fn at_statement_end(&self) -> bool {
        self.at_kind(HostTokenKind::Newline)
            || self.at_kind(HostTokenKind::EndMarker)
            || self.at_op(";")
    }

    fn parse_expression_statement(&mut self) -> PResult<Stmt> {
        let start = self.peek();
        let first = if self.at_keyword("yield") {
            self.parse_yield()?
        } else {
            self.parse_star_expressions()?
        };

        if self.eat_op(":") {
            if !matches!(first, Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. }) {
                return Err(self.error_at(start, SyntaxErrorKind::IllegalAnnotationTarget));
            }
            let annotation = self.parse_test()?;
            let value = if self.eat_op("=") {
                Some(self.parse_assigned_value()?)
            } else {
                None
            };
            return Ok(Stmt::AnnAssign {
                target: first,
                annotation,
                value,
            });
        }

        let tok = self.peek();
        if tok.is(HostTokenKind::Op) && AUGMENTED.contains(&tok.text.as_str()) {
            if !matches!(first, Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. }) {
                return Err(self.error_at(
                    start,
                    SyntaxErrorKind::IllegalAugmentedTarget(describe(&first)),
                ));
            }
            self.bump();
            let op = BinOp::from_symbol(tok.text.trim_end_matches('='))
                .ok_or_else(|| self.error_at(tok, SyntaxErrorKind::InvalidSyntax))?;
            let value = self.parse_assigned_value()?;
            return Ok(Stmt::AugAssign {
                target: first,
                op,
                value,
            });
        }

        if !self.at_op("=") {
            return Ok(Stmt::Expr(first));
        }

        let mut targets = vec![first];
        while self.eat_op("=") {
            targets.push(self.parse_assigned_value()?);
        }
        let value = targets.pop().ok_or_else(|| self.error(SyntaxErrorKind::InvalidSyntax))?;
        for target in &targets {
            self.check_target(start, target)?;
        }
        Ok(Stmt::Assign(Assign {
            targets,
            value,
            line: start.start.line,
        }))
    }

    fn parse_assigned_value(&mut self) -> PResult<Expr> {
        if self.at_keyword("yield") {
            self.parse_yield()
        } else {
            self.parse_star_expressions()
        }
    }

    fn check_target(&self, at: &HostToken, target: &Expr) -> PResult<()> {
        match target {
            Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. } => Ok(()),
            Expr::Starred(inner) => self.check_target(at, inner),
            Expr::Tuple(items) | Expr::List(items) => {
                items.iter().try_for_each(|item| self.check_target(at, item))
            }
            other => Err(self.error_at(at, SyntaxErrorKind::CannotAssign(describe(other)))),
        }
    }

    fn parse_raise(&mut self) -> PResult<Stmt> {
        self.bump();
        if self.at_statement_end() {
            return Ok(Stmt::Raise {
                exc: None,
                cause: None,
            });
        }
        let exc = self.parse_test()?;
        let cause = if self.eat_keyword("from") {
            Some(self.parse_test()?)
        } else {
            None
        };
        Ok(Stmt::Raise {
            exc: Some(exc),
            cause,
        })
    }

    fn parse_dotted_name(&mut self) -> PResult<String> {
        let mut name = self.expect_name()?;
        while self.eat_op(".") {
            name.push('.');
            name.push_str(&self.expect_name()?);
        }
        Ok(name)
    }

    fn parse_alias(&mut self, dotted: bool) -> PResult<Alias> {
        let name = if dotted {
            self.parse_dotted_name()?
        } else {
            self.expect_name()?
        };
        let asname = if self.eat_keyword("as") {
            Some(self.expect_name()?)
        } else {
            None
        };
        Ok(Alias { name, asname })
    }

    fn parse_import(&mut self) -> PResult<Stmt> {
        self.bump();
        let mut names = vec![self.parse_alias(true)?];
        while self.eat_op(",") {
            names.push(self.parse_alias(true)?);
        }
        Ok(Stmt::Import(names))
    }

    fn parse_from_import(&mut self) -> PResult<Stmt> {
        self.bump();
        let mut level = 0;
        loop {
            if self.eat_op(".") {
                level += 1;
            } else if self.eat_op("...") {
                level += 3;
            } else {
                break;
            }
        }
        let module = if self.at_keyword("import") {
            None
        } else {
            Some(self.parse_dotted_name()?)
        };
        if module.is_none() && level == 0 {
            return Err(self.error(SyntaxErrorKind::InvalidSyntax));
        }
        self.expect_keyword("import")?;

        let names = if self.eat_op("*") {
            vec![Alias {
                name: "*".to_string(),
                asname: None,
            }]
        } else {
            let parenthesized = self.eat_op("(");
            let mut names = vec![self.parse_alias(false)?];
            while self.eat_op(",") {
                if parenthesized && self.at_op(")") {
                    break;
                }
                names.push(self.parse_alias(false)?);
            }
            if parenthesized {
                self.expect_op(")")?;
            }
            names
        };
        Ok(Stmt::ImportFrom {
            module,
            names,
            level,
        })
    }

    /// Parse an indented block or a same-line suite after `:`.
    fn parse_block(&mut self, construct: &'static str, line: usize) -> PResult<Vec<Stmt>> {
        if !self.eat_kind(HostTokenKind::Newline) {
            return self.parse_simple_statements();
        }
        if !self.eat_kind(HostTokenKind::Indent) {
            return Err(self.error(SyntaxErrorKind::ExpectedIndentedBlock { construct, line }));
        }
        self.nested(|p| {
            let mut body = Vec::new();
            while !p.eat_kind(HostTokenKind::Dedent) {
                if p.at_kind(HostTokenKind::EndMarker) {
                    break;
                }
                body.extend(p.parse_statement()?);
            }
            Ok(body)
        })
    }

    fn parse_decorated(&mut self) -> PResult<Stmt> {
        let mut decorators = Vec::new();
        while self.eat_op("@") {
            decorators.push(self.parse_named_expr()?);
            self.expect_newline()?;
        }
        if self.at_keyword("def") {
            self.parse_function_def(decorators)
        } else if self.at_keyword("class") {
            self.parse_class_def(decorators)
        } else {
            Err(self.error(SyntaxErrorKind::InvalidSyntax))
        }
    }

    fn parse_function_def(&mut self, decorators: Vec<Expr>) -> PResult<Stmt> {
        let line = self.bump().start.line;
        let name = self.expect_name()?;
        self.expect_op("(")?;
        let params = self.parse_parameters(")", true)?;
        self.expect_op(")")?;
        let returns = if self.eat_op("->") {
            Some(self.parse_test()?)
        } else {
            None
        };
        self.expect_op(":")?;
        let body = self.parse_block("function definition", line)?;
        Ok(Stmt::FunctionDef(FunctionDef {
            name,
            params,
            body,
            decorators,
            returns,
            line,
        }))
    }

    fn parse_parameters(&mut self, closing: &str, annotated: bool) -> PResult<Parameters> {
        let mut params = Parameters::default();
        let mut keyword_only = false;

        while !self.at_op(closing) {
            if self.eat_op("/") {
                // positional-only marker
            } else if self.eat_op("**") {
                params.kwarg = Some(self.parse_param(annotated, false)?);
            } else if self.eat_op("*") {
                keyword_only = true;
                if !self.at_op(",") && !self.at_op(closing) {
                    params.vararg = Some(self.parse_param(annotated, false)?);
                }
            } else {
                let param = self.parse_param(annotated, true)?;
                if keyword_only {
                    params.kwonly.push(param);
                } else {
                    params.args.push(param);
                }
            }
            if !self.eat_op(",") {
                break;
            }
        }
        Ok(params)
    }

    fn parse_param(&mut self, annotated: bool, with_default: bool) -> PResult<Param> {
        let name = self.expect_name()?;
        let annotation = if annotated && self.eat_op(":") {
            Some(self.parse_test()?)
        } else {
            None
        };
        let default = if with_default && self.eat_op("=") {
            Some(self.parse_test()?)
        } else {
            None
        };
        Ok(Param {
            name,
            annotation,
            default,
        })
    }

    fn parse_class_def(&mut self, decorators: Vec<Expr>) -> PResult<Stmt> {
        let line = self.bump().start.line;
        let name = self.expect_name()?;
        let (bases, keywords) = if self.eat_op("(") {
            self.parse_call_arguments()?
        } else {
            (Vec::new(), Vec::new())
        };
        self.expect_op(":")?;
        let body = self.parse_block("class definition", line)?;
        Ok(Stmt::ClassDef(ClassDef {
            name,
            bases,
            keywords,
            body,
            decorators,
            line,
        }))
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let line = self.bump().start.line;
        let test = self.parse_named_expr()?;
        self.expect_op(":")?;
        let body = self.parse_block("'if' statement", line)?;
        let orelse = if self.at_keyword("elif") {
            self.chained(|p| {
                p.deepen()?;
                Ok(vec![p.parse_if()?])
            })?
        } else {
            self.parse_else()?
        };
        Ok(Stmt::If { test, body, orelse })
    }

    fn parse_else(&mut self) -> PResult<Vec<Stmt>> {
        if !self.at_keyword("else") {
            return Ok(Vec::new());
        }
        let line = self.bump().start.line;
        self.expect_op(":")?;
        self.parse_block("'else' statement", line)
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let line = self.bump().start.line;
        let test = self.parse_named_expr()?;
        self.expect_op(":")?;
        let body = self.parse_block("'while' statement", line)?;
        let orelse = self.parse_else()?;
        Ok(Stmt::While { test, body, orelse })
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let keyword = self.bump();
        let line = keyword.start.line;
        let target = self.parse_target_list()?;
        self.check_target(keyword, &target)?;
        self.expect_keyword("in")?;
        let iter = self.parse_star_expressions()?;
        self.expect_op(":")?;
        let body = self.parse_block("'for' statement", line)?;
        let orelse = self.parse_else()?;
        Ok(Stmt::For {
            target,
            iter,
            body,
            orelse,
        })
    }

    fn parse_try(&mut self) -> PResult<Stmt> {
        let line = self.bump().start.line;
        self.expect_op(":")?;
        let body = self.parse_block("'try' statement", line)?;

        let mut handlers = Vec::new();
        while self.at_keyword("except") {
            let line = self.bump().start.line;
            let (kind, name) = if self.at_op(":") {
                (None, None)
            } else {
                let kind = self.parse_test()?;
                let name = if self.eat_keyword("as") {
                    Some(self.expect_name()?)
                } else {
                    None
                };
                (Some(kind), name)
            };
            self.expect_op(":")?;
            let body = self.parse_block("'except' statement", line)?;
            handlers.push(ExceptHandler { kind, name, body });
        }

        let orelse = self.parse_else()?;
        let finalbody = if self.at_keyword("finally") {
            let line = self.bump().start.line;
            self.expect_op(":")?;
            self.parse_block("'finally' statement", line)?
        } else {
            Vec::new()
        };

        if handlers.is_empty() && finalbody.is_empty() {
            return Err(self.error(SyntaxErrorKind::MissingExceptOrFinally));
        }
        Ok(Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
        })
    }

    fn parse_with(&mut self) -> PResult<Stmt> {
        let keyword = self.bump();
        let mut items = Vec::new();
        loop {
            let context = self.parse_test()?;
            let vars = if self.eat_keyword("as") {
                let target = self.parse_target()?;
                self.check_target(keyword, &target)?;
                Some(target)
            } else {
                None
            };
            items.push(WithItem { context, vars });
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(":")?;
        let body = self.parse_block("'with' statement", keyword.start.line)?;
        Ok(Stmt::With { items, body })
    }

    // -- expressions --

    /// Comma-separated expressions, starred allowed; several items or a
    /// trailing comma make a tuple.
    fn parse_star_expressions(&mut self) -> PResult<Expr> {
        let first = self.parse_star_or_test()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_expression_end() {
                break;
            }
            items.push(self.parse_star_or_test()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn at_expression_end(&self) -> bool {
        self.at_statement_end()
            || [")", "]", "}", "=", ":"].iter().any(|op| self.at_op(op))
            || AUGMENTED.iter().any(|op| self.at_op(op))
    }

    fn parse_star_or_test(&mut self) -> PResult<Expr> {
        if self.eat_op("*") {
            let inner = self.parse_bitwise_or()?;
            return Ok(Expr::Starred(Box::new(inner)));
        }
        self.parse_test()
    }

    /// Targets of `for` and comprehensions: stops before `in`.
    fn parse_target_list(&mut self) -> PResult<Expr> {
        let first = self.parse_target()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_keyword("in") || self.at_statement_end() {
                break;
            }
            items.push(self.parse_target()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn parse_target(&mut self) -> PResult<Expr> {
        if self.eat_op("*") {
            let inner = self.parse_bitwise_or()?;
            return Ok(Expr::Starred(Box::new(inner)));
        }
        self.parse_bitwise_or()
    }

    fn parse_named_expr(&mut self) -> PResult<Expr> {
        let tok = self.peek();
        if tok.is(HostTokenKind::Name) && !is_keyword(&tok.text) && self.peek_at(1).is_text(":=") {
            self.pos += 2;
            let value = self.parse_test()?;
            return Ok(Expr::NamedExpr {
                target: tok.text.clone(),
                value: Box::new(value),
            });
        }
        self.parse_test()
    }

    fn parse_test(&mut self) -> PResult<Expr> {
        if self.at_keyword("lambda") {
            return self.parse_lambda();
        }
        let body = self.parse_or_test()?;
        if !self.eat_keyword("if") {
            return Ok(body);
        }
        let test = self.parse_or_test()?;
        self.expect_keyword("else")?;
        let orelse = self.nested(Self::parse_test)?;
        Ok(Expr::IfExp {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        })
    }

    fn parse_lambda(&mut self) -> PResult<Expr> {
        self.bump();
        let params = self.parse_parameters(":", false)?;
        self.expect_op(":")?;
        let body = self.nested(Self::parse_test)?;
        Ok(Expr::Lambda {
            params: Box::new(params),
            body: Box::new(body),
        })
    }

    fn parse_or_test(&mut self) -> PResult<Expr> {
        let first = self.parse_and_test()?;
        if !self.at_keyword("or") {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat_keyword("or") {
            values.push(self.parse_and_test()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::Or,
            values,
        })
    }

    fn parse_and_test(&mut self) -> PResult<Expr> {
        let first = self.parse_not_test()?;
        if !self.at_keyword("and") {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat_keyword("and") {
            values.push(self.parse_not_test()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::And,
            values,
        })
    }

    fn parse_not_test(&mut self) -> PResult<Expr> {
        if self.eat_keyword("not") {
            let operand = self.nested(Self::parse_not_test)?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn comparison_operator(&mut self) -> Option<CmpOp> {
        let tok = self.peek();
        let op = if tok.is(HostTokenKind::Op) {
            match tok.text.as_str() {
                "==" => CmpOp::Eq,
                "!=" => CmpOp::NotEq,
                "<" => CmpOp::Lt,
                "<=" => CmpOp::LtE,
                ">" => CmpOp::Gt,
                ">=" => CmpOp::GtE,
                _ => return None,
            }
        } else if tok.is(HostTokenKind::Name) {
            match tok.text.as_str() {
                "in" => CmpOp::In,
                "is" if self.peek_at(1).is_text("not") => {
                    self.pos += 1;
                    CmpOp::IsNot
                }
                "is" => CmpOp::Is,
                "not" if self.peek_at(1).is_text("in") => {
                    self.pos += 1;
                    CmpOp::NotIn
                }
                _ => return None,
            }
        } else {
            return None;
        };
        self.pos += 1;
        Some(op)
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        let left = self.parse_bitwise_or()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.comparison_operator() {
            ops.push(op);
            comparators.push(self.parse_bitwise_or()?);
        }
        if ops.is_empty() {
            return Ok(left);
        }
        Ok(Expr::Compare {
            left: Box::new(left),
            ops,
            comparators,
        })
    }

    /// Left-associative binary operator level.
    fn parse_binary(
        &mut self,
        symbols: &[&str],
        next: fn(&mut Self) -> PResult<Expr>,
    ) -> PResult<Expr> {
        self.chained(|p| {
            let mut left = next(p)?;
            loop {
                let tok = p.peek();
                if !tok.is(HostTokenKind::Op) || !symbols.contains(&tok.text.as_str()) {
                    return Ok(left);
                }
                let Some(op) = BinOp::from_symbol(&tok.text) else {
                    return Ok(left);
                };
                p.deepen()?;
                p.bump();
                let right = next(p)?;
                left = Expr::BinOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                };
            }
        })
    }

    fn parse_bitwise_or(&mut self) -> PResult<Expr> {
        self.parse_binary(&["|"], Self::parse_bitwise_xor)
    }

    fn parse_bitwise_xor(&mut self) -> PResult<Expr> {
        self.parse_binary(&["^"], Self::parse_bitwise_and)
    }

    fn parse_bitwise_and(&mut self) -> PResult<Expr> {
        self.parse_binary(&["&"], Self::parse_shift)
    }

    fn parse_shift(&mut self) -> PResult<Expr> {
        self.parse_binary(&["<<", ">>"], Self::parse_arith)
    }

    fn parse_arith(&mut self) -> PResult<Expr> {
        self.parse_binary(&["+", "-"], Self::parse_term)
    }

    fn parse_term(&mut self) -> PResult<Expr> {
        self.parse_binary(&["*", "/", "//", "%", "@"], Self::parse_factor)
    }

    fn parse_factor(&mut self) -> PResult<Expr> {
        let op = match self.peek() {
            tok if tok.is_text("+") => UnaryOp::Plus,
            tok if tok.is_text("-") => UnaryOp::Minus,
            tok if tok.is_text("~") => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.bump();
        let operand = self.nested(Self::parse_factor)?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> PResult<Expr> {
        let base = if self.eat_keyword("await") {
            Expr::Await(Box::new(self.parse_primary()?))
        } else {
            self.parse_primary()?
        };
        if !self.eat_op("**") {
            return Ok(base);
        }
        let exponent = self.nested(Self::parse_factor)?;
        Ok(Expr::BinOp {
            left: Box::new(base),
            op: BinOp::Pow,
            right: Box::new(exponent),
        })
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        self.chained(|p| {
            let mut expr = p.parse_atom()?;
            loop {
                if p.at_op("(") || p.at_op("[") || p.at_op(".") {
                    p.deepen()?;
                }
                if p.eat_op("(") {
                    let (args, keywords) = p.parse_call_arguments()?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                        keywords,
                    };
                } else if p.eat_op("[") {
                    let slice = p.parse_subscript_list()?;
                    p.expect_op("]")?;
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        slice: Box::new(slice),
                    };
                } else if p.eat_op(".") {
                    let attr = p.expect_name()?;
                    expr = Expr::Attribute {
                        value: Box::new(expr),
                        attr,
                    };
                } else {
                    return Ok(expr);
                }
            }
        })
    }

    /// Arguments after `(`, consuming the closing `)`.
    fn parse_call_arguments(&mut self) -> PResult<(Vec<Expr>, Vec<Keyword>)> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while !self.at_op(")") {
            if self.eat_op("*") {
                args.push(Expr::Starred(Box::new(self.parse_test()?)));
            } else if self.eat_op("**") {
                keywords.push(Keyword {
                    arg: None,
                    value: self.parse_test()?,
                });
            } else if self.peek().is(HostTokenKind::Name) && self.peek_at(1).is_text("=") {
                let arg = self.expect_name()?;
                self.bump();
                keywords.push(Keyword {
                    arg: Some(arg),
                    value: self.parse_test()?,
                });
            } else {
                let value = self.parse_named_expr()?;
                if self.at_keyword("for") {
                    args.push(self.parse_comprehension(ComprehensionKind::Generator, value, None)?);
                } else {
                    args.push(value);
                }
            }
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(")")?;
        Ok((args, keywords))
    }

    fn parse_subscript_list(&mut self) -> PResult<Expr> {
        let first = self.parse_subscript()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_op("]") {
                break;
            }
            items.push(self.parse_subscript()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn parse_subscript(&mut self) -> PResult<Expr> {
        let lower = if self.at_op(":") {
            None
        } else {
            let value = self.parse_star_or_test()?;
            if !self.at_op(":") {
                return Ok(value);
            }
            Some(Box::new(value))
        };
        self.expect_op(":")?;
        let bound = |p: &mut Self| -> PResult<Option<Box<Expr>>> {
            if p.at_op(":") || p.at_op(",") || p.at_op("]") {
                Ok(None)
            } else {
                Ok(Some(Box::new(p.parse_test()?)))
            }
        };
        let upper = bound(self)?;
        let step = if self.eat_op(":") { bound(self)? } else { None };
        Ok(Expr::Slice { lower, upper, step })
    }

    fn parse_atom(&mut self) -> PResult<Expr> {
        let tok = self.peek();
        match tok.kind() {
            Some(HostTokenKind::Number) => {
                self.bump();
                Value::from_number_literal(&tok.text)
                    .map(Expr::Constant)
                    .ok_or_else(|| self.error_at(tok, SyntaxErrorKind::InvalidNumber))
            }
            Some(HostTokenKind::String) => self.parse_strings(),
            Some(HostTokenKind::Name) => {
                let value = match tok.text.as_str() {
                    "True" => Expr::Constant(Value::Bool(true)),
                    "False" => Expr::Constant(Value::Bool(false)),
                    "None" => Expr::Constant(Value::None),
                    name if is_keyword(name) => {
                        return Err(self.error(SyntaxErrorKind::InvalidSyntax));
                    }
                    name => Expr::Name(name.to_string()),
                };
                self.bump();
                Ok(value)
            }
            Some(HostTokenKind::Op) => match tok.text.as_str() {
                "(" => {
                    self.bump();
                    self.nested(Self::parse_paren_contents)
                }
                "[" => {
                    self.bump();
                    self.nested(Self::parse_list_contents)
                }
                "{" => {
                    self.bump();
                    self.nested(Self::parse_brace_contents)
                }
                "..." => {
                    self.bump();
                    Ok(Expr::Constant(Value::Ellipsis))
                }
                _ => Err(self.error(SyntaxErrorKind::InvalidSyntax)),
            },
            _ => Err(self.error(SyntaxErrorKind::InvalidSyntax)),
        }
    }

    fn parse_paren_contents(&mut self) -> PResult<Expr> {
        if self.eat_op(")") {
            return Ok(Expr::Tuple(Vec::new()));
        }
        if self.at_keyword("yield") {
            let value = self.parse_yield()?;
            self.expect_op(")")?;
            return Ok(value);
        }
        let first = if self.at_op("*") {
            self.parse_star_or_test()?
        } else {
            self.parse_named_expr()?
        };
        if self.at_keyword("for") {
            let comp = self.parse_comprehension(ComprehensionKind::Generator, first, None)?;
            self.expect_op(")")?;
            return Ok(comp);
        }
        if self.eat_op(")") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_op(")") {
                break;
            }
            items.push(self.parse_star_or_named()?);
        }
        self.expect_op(")")?;
        Ok(Expr::Tuple(items))
    }

    fn parse_star_or_named(&mut self) -> PResult<Expr> {
        if self.at_op("*") {
            self.parse_star_or_test()
        } else {
            self.parse_named_expr()
        }
    }

    fn parse_list_contents(&mut self) -> PResult<Expr> {
        if self.eat_op("]") {
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.parse_star_or_named()?;
        if self.at_keyword("for") {
            let comp = self.parse_comprehension(ComprehensionKind::List, first, None)?;
            self.expect_op("]")?;
            return Ok(comp);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_op("]") {
                break;
            }
            items.push(self.parse_star_or_named()?);
        }
        self.expect_op("]")?;
        Ok(Expr::List(items))
    }

    fn parse_brace_contents(&mut self) -> PResult<Expr> {
        if self.eat_op("}") {
            return Ok(Expr::Dict {
                keys: Vec::new(),
                values: Vec::new(),
            });
        }

        let first_key = if self.at_op("**") {
            None
        } else {
            Some(self.parse_star_or_test()?)
        };
        let first_key = match first_key {
            Some(first) if !self.at_op(":") => return self.parse_set_contents(first),
            other => other,
        };

        let first_value = self.parse_dict_value(first_key.is_none())?;
        if self.at_keyword("for") {
            let Some(key) = first_key else {
                return Err(self.error(SyntaxErrorKind::InvalidSyntax));
            };
            let comp = self.parse_comprehension(ComprehensionKind::Dict, key, Some(first_value))?;
            self.expect_op("}")?;
            return Ok(comp);
        }

        let mut keys = vec![first_key];
        let mut values = vec![first_value];
        while self.eat_op(",") {
            if self.at_op("}") {
                break;
            }
            if self.at_op("**") {
                keys.push(None);
                values.push(self.parse_dict_value(true)?);
            } else {
                keys.push(Some(self.parse_test()?));
                values.push(self.parse_dict_value(false)?);
            }
        }
        self.expect_op("}")?;
        Ok(Expr::Dict { keys, values })
    }

    fn parse_set_contents(&mut self, first: Expr) -> PResult<Expr> {
        if self.at_keyword("for") {
            let comp = self.parse_comprehension(ComprehensionKind::Set, first, None)?;
            self.expect_op("}")?;
            return Ok(comp);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_op("}") {
                break;
            }
            items.push(self.parse_star_or_test()?);
        }
        self.expect_op("}")?;
        Ok(Expr::Set(items))
    }

    /// The value half of a dict entry: `: value` after a key, or the
    /// mapping after `**`.
    fn parse_dict_value(&mut self, unpacking: bool) -> PResult<Expr> {
        if unpacking {
            self.expect_op("**")?;
            return self.parse_bitwise_or();
        }
        self.expect_op(":")?;
        self.parse_test()
    }

    fn parse_comprehension(
        &mut self,
        kind: ComprehensionKind,
        elt: Expr,
        value: Option<Expr>,
    ) -> PResult<Expr> {
        let mut generators = Vec::new();
        while self.at_keyword("for") {
            let keyword = self.bump();
            let target = self.parse_target_list()?;
            self.check_target(keyword, &target)?;
            self.expect_keyword("in")?;
            let iter = self.parse_or_test()?;
            let mut ifs = Vec::new();
            while self.eat_keyword("if") {
                ifs.push(self.parse_or_test()?);
            }
            generators.push(Generator { target, iter, ifs });
        }
        Ok(Expr::Comprehension {
            kind,
            elt: Box::new(elt),
            value: value.map(Box::new),
            generators,
        })
    }

    fn parse_yield(&mut self) -> PResult<Expr> {
        self.bump();
        if self.eat_keyword("from") {
            return Ok(Expr::YieldFrom(Box::new(self.parse_test()?)));
        }
        if self.at_expression_end() {
            return Ok(Expr::Yield(None));
        }
        Ok(Expr::Yield(Some(Box::new(self.parse_star_expressions()?))))
    }

    /// Adjacent string literals concatenate into one constant.
    fn parse_strings(&mut self) -> PResult<Expr> {
        let mut text = String::new();
        let mut bytes: Vec<u8> = Vec::new();
        let mut raw_parts = Vec::new();
        let mut saw_bytes = None;
        let mut formatted = false;

        while self.peek().is(HostTokenKind::String) {
            let tok = self.bump();
            let literal = split_literal(&tok.text);
            if *saw_bytes.get_or_insert(literal.bytes) != literal.bytes {
                return Err(self.error_at(
                    tok,
                    SyntaxErrorKind::InvalidString("cannot mix bytes and nonbytes literals"),
                ));
            }
            formatted |= literal.formatted;
            raw_parts.push(tok.text.as_str());
            if literal.formatted {
                continue;
            }
            let decoded = unescape(literal.body, literal.raw, literal.bytes)
                .map_err(|reason| self.error_at(tok, SyntaxErrorKind::InvalidString(reason)))?;
            if literal.bytes {
                bytes.extend(decoded.iter().map(|&c| u8::try_from(c).unwrap_or(b'?')));
            } else {
                text.extend(decoded.into_iter().map(|c| char::from_u32(c).unwrap_or('\u{FFFD}')));
            }
        }

        if formatted {
            return Ok(Expr::FString(raw_parts.join(" ")));
        }
        Ok(Expr::Constant(if saw_bytes == Some(true) {
            Value::Bytes(bytes)
        } else {
            Value::Str(text)
        }))
    }
}

fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Short description of an expression for error messages.
const fn describe(expr: &Expr) -> &'static str {
    match expr {
        Expr::Constant(_) | Expr::FString(_) => "literal",
        Expr::Call { .. } => "function call",
        Expr::NamedExpr { .. } => "named expression",
        Expr::Lambda { .. } => "lambda",
        Expr::Compare { .. } => "comparison",
        Expr::IfExp { .. } => "conditional expression",
        Expr::Dict { .. } => "dict literal",
        Expr::Set(_) => "set display",
        Expr::Comprehension { .. } => "comprehension",
        Expr::Yield(_) | Expr::YieldFrom(_) => "yield expression",
        Expr::Await(_) => "await expression",
        Expr::Tuple(_) => "tuple",
        Expr::List(_) => "list",
        Expr::Starred(_) => "starred",
        Expr::Name(_) => "name",
        Expr::Attribute { .. } => "attribute",
        Expr::Subscript { .. } => "subscript",
        Expr::Slice { .. }
        | Expr::UnaryOp { .. }
        | Expr::BinOp { .. }
        | Expr::BoolOp { .. } => "expression",
    }
}

struct StringLiteral<'a> {
    body: &'a str,
    raw: bool,
    bytes: bool,
    formatted: bool,
}

/// Split a string token into its prefix flags and the text between the
/// quotes.
fn split_literal(token: &str) -> StringLiteral<'_> {
    let quote_at = token.find(['\'', '"']).unwrap_or(0);
    let prefix = token[..quote_at].to_ascii_lowercase();
    let rest = &token[quote_at..];
    let quote_len = if rest.starts_with("\"\"\"") || rest.starts_with("'''") {
        3
    } else {
        1
    };
    let body = rest
        .get(quote_len..rest.len().saturating_sub(quote_len))
        .unwrap_or("");
    StringLiteral {
        body,
        raw: prefix.contains('r'),
        bytes: prefix.contains('b'),
        formatted: prefix.contains('f'),
    }
}

/// Decode backslash escapes into code points.
fn unescape(body: &str, raw: bool, bytes: bool) -> Result<Vec<u32>, &'static str> {
    if bytes && !body.is_ascii() {
        return Err("bytes can only contain ASCII literal characters");
    }
    if raw {
        return Ok(body.chars().map(u32::from).collect());
    }

    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(u32::from(ch));
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push(u32::from('\\'));
            break;
        };
        match esc {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(u32::from(esc)),
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'n' => out.push(0x0a),
            'r' => out.push(0x0d),
            't' => out.push(0x09),
            'v' => out.push(0x0b),
            '0'..='7' => {
                let mut value = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(value);
            }
            'x' => out.push(hex_escape(&mut chars, 2).ok_or("truncated \\xXX escape")?),
            'u' if !bytes => out.push(hex_escape(&mut chars, 4).ok_or("truncated \\uXXXX escape")?),
            'U' if !bytes => {
                out.push(hex_escape(&mut chars, 8).ok_or("truncated \\UXXXXXXXX escape")?);
            }
            other => {
                out.push(u32::from('\\'));
                out.push(u32::from(other));
            }
        }
    }
    Ok(out)
}

fn hex_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, width: usize) -> Option<u32> {
    let mut value = 0;
    for _ in 0..width {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_ok(source: &str) -> Module {
        parse(source).expect("parse failed")
    }

    #[test]
    fn simple_assignment() {
        let module = parse_ok("y = 5\n");
        assert_eq!(
            module.body,
            vec![Stmt::Assign(Assign {
                targets: vec![Expr::name("y")],
                value: Expr::int(5),
                line: 1,
            })]
        );
    }

    #[test]
    fn chained_and_tuple_targets() {
        let module = parse_ok("a = b = 1\nx, y = 1, 2\n");
        let Stmt::Assign(chained) = &module.body[0] else {
            panic!("expected assignment");
        };
        assert_eq!(chained.targets, vec![Expr::name("a"), Expr::name("b")]);
        let Stmt::Assign(unpack) = &module.body[1] else {
            panic!("expected assignment");
        };
        assert_eq!(unpack.line, 2);
        assert!(matches!(unpack.targets[0], Expr::Tuple(ref items) if items.len() == 2));
    }

    #[test]
    fn function_definition() {
        let module = parse_ok("def add(a, b=1, *rest, key, **opts):\n    return a + b\n");
        let Stmt::FunctionDef(def) = &module.body[0] else {
            panic!("expected function definition");
        };
        assert_eq!(def.name, "add");
        let names: Vec<_> = def.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "rest", "key", "opts"]);
        assert_eq!(def.params.kwonly.len(), 1);
        assert!(matches!(def.body[0], Stmt::Return(Some(Expr::BinOp { .. }))));
    }

    #[test]
    fn operator_precedence() {
        let module = parse_ok("x = 1 + 2 * 3\n");
        let Stmt::Assign(assign) = &module.body[0] else {
            panic!("expected assignment");
        };
        assert_eq!(
            assign.value,
            Expr::binop(
                Expr::int(1),
                BinOp::Add,
                Expr::binop(Expr::int(2), BinOp::Mult, Expr::int(3))
            )
        );
    }

    #[test]
    fn compound_statements() {
        let source = "\
if x > 1:
    y = 1
elif x:
    y = 2
else:
    y = 3
for i in range(3):
    pass
while False:
    break
try:
    z = 1
except ValueError as err:
    z = 2
finally:
    pass
with open(p) as fh:
    data = fh.read()
class C(Base):
    attr = 1
";
        let module = parse_ok(source);
        assert_eq!(module.body.len(), 6);
        assert!(matches!(module.body[0], Stmt::If { ref orelse, .. } if matches!(orelse[0], Stmt::If { .. })));
        assert!(matches!(module.body[3], Stmt::Try { ref handlers, .. } if handlers[0].name.as_deref() == Some("err")));
        assert!(matches!(module.body[5], Stmt::ClassDef(ref c) if c.name == "C"));
    }

    #[test]
    fn strings_concatenate_and_decode() {
        let module = parse_ok("s = 'a\\n' \"b\"\nb = b'\\x41'\nr = r'\\n'\n");
        let values: Vec<_> = module
            .body
            .iter()
            .map(|s| match s {
                Stmt::Assign(a) => a.value.clone(),
                _ => panic!("expected assignment"),
            })
            .collect();
        assert_eq!(values[0], Expr::Constant(Value::Str("a\nb".to_string())));
        assert_eq!(values[1], Expr::Constant(Value::Bytes(vec![b'A'])));
        assert_eq!(values[2], Expr::Constant(Value::Str("\\n".to_string())));
    }

    #[test]
    fn comprehensions_and_lambda() {
        let module = parse_ok("a = [x * 2 for x in xs if x]\nb = {k: v for k, v in d}\nf = lambda q: q\n");
        assert!(matches!(
            &module.body[0],
            Stmt::Assign(Assign { value: Expr::Comprehension { kind: ComprehensionKind::List, .. }, .. })
        ));
        assert!(matches!(
            &module.body[1],
            Stmt::Assign(Assign { value: Expr::Comprehension { kind: ComprehensionKind::Dict, .. }, .. })
        ));
        assert!(matches!(&module.body[2], Stmt::Assign(Assign { value: Expr::Lambda { .. }, .. })));
    }

    #[test]
    fn walrus_in_condition() {
        let module = parse_ok("if (n := 10) > 5:\n    pass\n");
        assert!(matches!(
            &module.body[0],
            Stmt::If { test: Expr::Compare { left, .. }, .. } if matches!(**left, Expr::NamedExpr { .. })
        ));
    }

    #[test]
    fn missing_colon() {
        let err = parse("def f()\n    pass\n").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Expected(":"));
        assert_eq!(err.line, 1);
        assert_eq!(err.text.as_deref(), Some("def f()"));
    }

    #[test]
    fn missing_indented_block() {
        let err = parse("def f():\nx = 1\n").unwrap_err();
        assert_eq!(
            err.kind,
            SyntaxErrorKind::ExpectedIndentedBlock {
                construct: "function definition",
                line: 1
            }
        );
        assert_eq!(err.line, 2);
        assert_eq!(
            err.message(),
            "expected an indented block after function definition on line 1"
        );
    }

    #[test]
    fn unexpected_indent() {
        let err = parse("x = 1\n    y = 2\n").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedIndent);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn cannot_assign_to_literal() {
        let err = parse("1 = x\n").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::CannotAssign("literal"));
        assert_eq!(err.offset, Some(1));
    }

    #[test]
    fn tokenizer_errors_become_syntax_errors() {
        let err = parse("x = (1,\n").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Tokenize(TokenizeErrorKind::UnclosedBracket('(')));
        assert_eq!(err.line, 1);
        assert_eq!(err.offset, Some(5));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let source = format!("x = {}1{}\n", "(".repeat(300), ")".repeat(300));
        let err = parse(&source).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::TooDeeplyNested);
    }

    #[test]
    fn placeholder_text() {
        let err = SyntaxError {
            kind: SyntaxErrorKind::InvalidSyntax,
            line: 1,
            text: None,
            offset: None,
        };
        assert_eq!(err.text_or_placeholder(), "No text available");
    }
}
