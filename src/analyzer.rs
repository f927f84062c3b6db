//! Scope analysis over a parsed module.
//!
//! The analyzer walks the tree once, keeping a flat table of the value each
//! name is currently bound to and recording every simple assignment on a
//! [`BindingTrace`]. Values are only tracked through literals and name
//! references; anything else resolves to unresolved (`None`).

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::ast::{Assign, Expr, FunctionDef, Module, NodeRef, Stmt};
use crate::trace::{BindingEvent, BindingTrace};
use crate::value::Value;

/// Default recursion bound for [`ScopeAnalyzer`].
pub const DEFAULT_MAX_DEPTH: usize = 500;

/// Failure raised while walking the tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("maximum recursion depth exceeded ({depth} nested nodes)")]
    RecursionLimit { depth: usize },
}

/// Names bound during analysis and the value each currently resolves to.
///
/// Keys are unique; a later write replaces the earlier binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeTable {
    /// `None` is the unresolved marker.
    bindings: FxHashMap<String, Option<Value>>,
}

impl ScopeTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any earlier binding.
    pub fn bind(&mut self, name: impl Into<String>, value: Option<Value>) {
        self.bindings.insert(name.into(), value);
    }

    /// Binding for `name`: `None` when the name was never bound,
    /// `Some(None)` when it is bound but unresolved.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Option<Value>> {
        self.bindings.get(name)
    }

    /// Current value of `name`; absent and unresolved both yield `None`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned().flatten()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Option<Value>)> {
        self.bindings.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Bindings sorted by name.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, &Option<Value>)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// The node kinds the analyzer distinguishes.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Definition(&'a FunctionDef),
    Assignment(&'a Assign),
    NameReference(&'a str),
    Literal(&'a Value),
    Other(NodeRef<'a>),
}

impl<'a> From<NodeRef<'a>> for Node<'a> {
    fn from(node: NodeRef<'a>) -> Self {
        match node {
            NodeRef::Stmt(Stmt::FunctionDef(def)) => Self::Definition(def),
            NodeRef::Stmt(Stmt::Assign(assign)) => Self::Assignment(assign),
            NodeRef::Expr(Expr::Name(name)) => Self::NameReference(name),
            NodeRef::Expr(Expr::Constant(value)) => Self::Literal(value),
            other => Self::Other(other),
        }
    }
}

impl<'a> From<&'a Stmt> for Node<'a> {
    fn from(stmt: &'a Stmt) -> Self {
        NodeRef::Stmt(stmt).into()
    }
}

impl<'a> From<&'a Expr> for Node<'a> {
    fn from(expr: &'a Expr) -> Self {
        NodeRef::Expr(expr).into()
    }
}

type Resolution = Result<Option<Value>, AnalysisError>;

/// Tree walker that maintains a [`ScopeTable`] and a [`BindingTrace`].
#[derive(Debug)]
pub struct ScopeAnalyzer {
    scope: ScopeTable,
    trace: BindingTrace,
    max_depth: usize,
    depth: usize,
}

impl Default for ScopeAnalyzer {
    fn default() -> Self {
        Self::new(BindingTrace::new())
    }
}

impl ScopeAnalyzer {
    /// Analyzer with an empty scope that records onto `trace`.
    #[must_use]
    pub fn new(trace: BindingTrace) -> Self {
        Self {
            scope: ScopeTable::new(),
            trace,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
        }
    }

    /// Change the recursion bound.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub const fn scope(&self) -> &ScopeTable {
        &self.scope
    }

    #[must_use]
    pub const fn trace(&self) -> &BindingTrace {
        &self.trace
    }

    #[must_use]
    pub fn into_parts(self) -> (ScopeTable, BindingTrace) {
        (self.scope, self.trace)
    }

    /// Walk `module` from its root.
    ///
    /// A failure stops the walk and is returned; bindings made before it
    /// are kept.
    pub fn analyze(&mut self, module: &Module) -> Option<AnalysisError> {
        self.depth = 0;
        match self.visit(NodeRef::Module(module).into()) {
            Ok(_) => {
                trace!(
                    names = self.scope.len(),
                    events = self.trace.len(),
                    "analysis finished"
                );
                None
            }
            Err(err) => {
                warn!(error = %err, "analysis stopped");
                Some(err)
            }
        }
    }

    /// Visit one node and return what it resolves to.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::RecursionLimit` when nesting exceeds the
    /// configured bound.
    pub fn visit(&mut self, node: Node<'_>) -> Resolution {
        if self.depth >= self.max_depth {
            return Err(AnalysisError::RecursionLimit {
                depth: self.max_depth,
            });
        }
        self.depth += 1;
        let result = match node {
            Node::Definition(def) => self.visit_definition(def),
            Node::Assignment(assign) => self.visit_assignment(assign),
            Node::NameReference(name) => Ok(self.visit_name(name)),
            Node::Literal(value) => Ok(Some(value.clone())),
            Node::Other(node) => self.generic_visit(node),
        };
        self.depth -= 1;
        result
    }

    fn visit_definition(&mut self, def: &FunctionDef) -> Resolution {
        for param in def.params.iter() {
            self.scope.bind(param.name.as_str(), None);
        }
        for stmt in &def.body {
            self.visit(stmt.into())?;
        }
        Ok(None)
    }

    fn visit_assignment(&mut self, assign: &Assign) -> Resolution {
        for target in &assign.targets {
            // Only simple names are bound.
            let Expr::Name(name) = target else {
                continue;
            };
            let value = self.visit((&assign.value).into())?;
            trace!(name = %name, value = ?value, "bind");
            self.scope.bind(name.as_str(), value.clone());
            self.trace.push(BindingEvent::new(name.as_str(), value));
        }
        Ok(None)
    }

    fn visit_name(&self, name: &str) -> Option<Value> {
        self.scope.resolve(name)
    }

    fn generic_visit(&mut self, node: NodeRef<'_>) -> Resolution {
        for child in node.children() {
            self.visit(child.into())?;
        }
        Ok(None)
    }
}
