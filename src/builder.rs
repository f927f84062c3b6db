//! Fluent constructors for building syntax trees without parsing.

use crate::ast::{Assign, BinOp, Expr, FunctionDef, Keyword, Module, Param, Parameters, Stmt};
use crate::value::Value;

impl Module {
    /// Create an empty module.
    #[must_use]
    pub const fn new() -> Self {
        Self { body: Vec::new() }
    }

    /// Append a statement.
    #[must_use]
    pub fn stmt(mut self, stmt: impl Into<Stmt>) -> Self {
        self.body.push(stmt.into());
        self
    }

    /// Append `name = value`.
    #[must_use]
    pub fn assign(self, name: &str, value: Expr) -> Self {
        self.stmt(Assign::new(name, value))
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionDef {
    /// Create a definition with no parameters and an empty body.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Parameters::default(),
            body: Vec::new(),
            decorators: Vec::new(),
            returns: None,
            line: 0,
        }
    }

    /// Add a positional parameter.
    #[must_use]
    pub fn param(mut self, name: &str) -> Self {
        self.params.args.push(Param::new(name));
        self
    }

    /// Add a positional parameter with a default value.
    #[must_use]
    pub fn param_with_default(mut self, name: &str, default: Expr) -> Self {
        let mut param = Param::new(name);
        param.default = Some(default);
        self.params.args.push(param);
        self
    }

    /// Set the `*args` parameter.
    #[must_use]
    pub fn vararg(mut self, name: &str) -> Self {
        self.params.vararg = Some(Param::new(name));
        self
    }

    /// Set the `**kwargs` parameter.
    #[must_use]
    pub fn kwarg(mut self, name: &str) -> Self {
        self.params.kwarg = Some(Param::new(name));
        self
    }

    /// Append a body statement.
    #[must_use]
    pub fn stmt(mut self, stmt: impl Into<Stmt>) -> Self {
        self.body.push(stmt.into());
        self
    }
}

impl Param {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            annotation: None,
            default: None,
        }
    }
}

impl Assign {
    /// `name = value`.
    #[must_use]
    pub fn new(name: &str, value: Expr) -> Self {
        Self::to(vec![Expr::name(name)], value)
    }

    /// Assignment with arbitrary targets, e.g. `a, b = value` or
    /// `a = b = value`.
    #[must_use]
    pub const fn to(targets: Vec<Expr>, value: Expr) -> Self {
        Self {
            targets,
            value,
            line: 0,
        }
    }
}

impl Expr {
    #[must_use]
    pub fn name(name: &str) -> Self {
        Self::Name(name.to_string())
    }

    #[must_use]
    pub const fn int(value: i64) -> Self {
        Self::Constant(Value::Int(value))
    }

    #[must_use]
    pub fn str(value: &str) -> Self {
        Self::Constant(Value::Str(value.to_string()))
    }

    #[must_use]
    pub const fn constant(value: Value) -> Self {
        Self::Constant(value)
    }

    #[must_use]
    pub fn binop(left: Self, op: BinOp, right: Self) -> Self {
        Self::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn call(func: Self, args: Vec<Self>) -> Self {
        Self::Call {
            func: Box::new(func),
            args,
            keywords: Vec::<Keyword>::new(),
        }
    }

    #[must_use]
    pub const fn tuple(items: Vec<Self>) -> Self {
        Self::Tuple(items)
    }
}

impl From<FunctionDef> for Stmt {
    fn from(def: FunctionDef) -> Self {
        Self::FunctionDef(def)
    }
}

impl From<Assign> for Stmt {
    fn from(assign: Assign) -> Self {
        Self::Assign(assign)
    }
}

impl From<Expr> for Stmt {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr)
    }
}
