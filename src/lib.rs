//! Token classification, parsing and scope tracing for Python-like source.
//!
//! The pipeline reads a source file, explains its tokens, parses it into a
//! typed syntax tree, and walks the tree recording which literal value each
//! name is bound to. Source that parses can then be handed to an
//! [`Executor`].
//!
//! # Quick start
//!
//! ## Trace bindings in a snippet
//!
//! ```
//! use scopetrace::{AnalysisDriver, ExecutionError, Value};
//!
//! let driver = AnalysisDriver::new(|_: &str| -> Result<(), ExecutionError> { Ok(()) });
//! let analysis = driver.analyze_source("y = 5\nz = y\n").unwrap();
//! assert_eq!(analysis.scope.resolve("z"), Some(Value::Int(5)));
//! assert_eq!(analysis.trace.len(), 2);
//! ```
//!
//! ## Classify a fragment
//!
//! ```
//! use scopetrace::{classify, TokenKind};
//!
//! let tokens = classify("x := 3 + 4").unwrap();
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     [TokenKind::Identifier, TokenKind::Assign, TokenKind::Integer, TokenKind::Plus, TokenKind::Integer]
//! );
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod analyzer;
pub mod ast;
pub mod builder;
pub mod classifier;
pub mod config;
pub mod driver;
pub mod exec;
pub mod lexer;
pub mod parser;
pub mod report;
pub mod token;
pub mod trace;
pub mod value;

pub use analyzer::{AnalysisError, Node, ScopeAnalyzer, ScopeTable};
pub use ast::{Assign, Expr, FunctionDef, Module, NodeRef, Stmt};
pub use classifier::{LexError, LexErrorKind, classify};
pub use config::{Config, ConfigError};
pub use driver::{Analysis, AnalysisDriver, ReadError, ValidatedSource, read_source};
pub use exec::{ExecutionError, Executor, ProcessExecutor};
pub use lexer::{
    HostToken, HostTokenKind, TokenizeError, UnknownKindCode, explain_token, tokenize,
    tokenize_file,
};
pub use parser::{SyntaxError, SyntaxErrorKind, parse};
pub use token::{NumberKind, Span, Token, TokenKind};
pub use trace::{BindingEvent, BindingTrace, EmptyStackError};
pub use value::Value;

/// Unified error type covering every stage of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("{0}")]
    Syntax(#[from] SyntaxError),
    #[error("{0}")]
    EmptyStack(#[from] EmptyStackError),
    #[error("{0}")]
    Analysis(#[from] AnalysisError),
    #[error("{0}")]
    Execution(#[from] ExecutionError),
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Read(#[from] ReadError),
}

/// Parse and analyze a source string in one step with the default
/// recursion bound.
pub fn analyze_str(input: &str) -> Result<Analysis, Error> {
    let driver = AnalysisDriver::new(|_: &str| -> Result<(), ExecutionError> { Ok(()) });
    Ok(driver.analyze_source(input)?)
}
