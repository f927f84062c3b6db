//! Pipeline from source text to analysis and, on success, execution.

use std::path::Path;

use tracing::{debug, warn};

use crate::analyzer::{AnalysisError, DEFAULT_MAX_DEPTH, ScopeAnalyzer, ScopeTable};
use crate::classifier::classify;
use crate::exec::{ExecutionError, Executor};
use crate::parser::{SyntaxError, parse};
use crate::trace::BindingTrace;

/// Input file that is missing or unreadable.
#[derive(Debug, thiserror::Error)]
#[error("The file '{path}' cannot be accessed or does not exist.")]
pub struct ReadError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

/// Read a source file.
///
/// # Errors
///
/// Returns `ReadError` when the file does not exist or cannot be read as
/// UTF-8 text.
pub fn read_source(path: impl AsRef<Path>) -> Result<String, ReadError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| ReadError {
        path: path.display().to_string(),
        source,
    })
}

/// Source text that parsed successfully and was analyzed.
///
/// Only [`Analysis::into_validated`] produces one, so executors never see
/// text that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSource(String);

impl ValidatedSource {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of analyzing a source text that parsed.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub scope: ScopeTable,
    pub trace: BindingTrace,
    /// Failure that stopped the walk early; `scope` and `trace` keep what
    /// was recorded before it.
    pub error: Option<AnalysisError>,
    source: String,
}

impl Analysis {
    /// The analyzed text, unchanged.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn into_validated(self) -> ValidatedSource {
        ValidatedSource(self.source)
    }
}

/// Runs classification, parsing and scope analysis, and hands validated
/// text to an [`Executor`].
#[derive(Debug)]
pub struct AnalysisDriver<E> {
    executor: E,
    max_depth: usize,
}

impl<E: Executor> AnalysisDriver<E> {
    pub const fn new(executor: E) -> Self {
        Self {
            executor,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Change the analyzer recursion bound.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Analyze `text`.
    ///
    /// Classification runs first for diagnostics only; a failure there is
    /// logged and does not block parsing. On a successful parse a fresh
    /// analyzer walks the tree.
    ///
    /// # Errors
    ///
    /// Returns `SyntaxError` when `text` does not parse; the analyzer is
    /// not run in that case.
    pub fn analyze_source(&self, text: &str) -> Result<Analysis, SyntaxError> {
        match classify(text) {
            Ok(tokens) => debug!(count = tokens.len(), "classified source"),
            Err(err) => warn!(error = %err, "classification failed"),
        }

        let module = parse(text)?;

        let mut analyzer = ScopeAnalyzer::new(BindingTrace::new()).with_max_depth(self.max_depth);
        let error = analyzer.analyze(&module);
        let (scope, trace) = analyzer.into_parts();
        debug!(
            names = scope.len(),
            events = trace.len(),
            failed = error.is_some(),
            "analyzed source"
        );
        Ok(Analysis {
            scope,
            trace,
            error,
            source: text.to_string(),
        })
    }

    /// Run validated text with the injected executor.
    ///
    /// # Errors
    ///
    /// Returns the executor's `ExecutionError` unchanged.
    pub fn execute(&mut self, source: &ValidatedSource) -> Result<(), ExecutionError> {
        self.executor.execute(source.as_str())
    }

    /// Read `path` and analyze its contents.
    ///
    /// # Errors
    ///
    /// Returns `Error::Read` when the file is missing or unreadable, before
    /// any analysis, and `Error::Syntax` when it does not parse.
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<Analysis, crate::Error> {
        let text = read_source(path)?;
        Ok(self.analyze_source(&text)?)
    }
}
