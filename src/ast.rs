use std::fmt;

use crate::value::Value;

/// Parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
}

/// Statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Assign(Assign),
    /// `target op= value`.
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    /// `target: annotation [= value]`.
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    Expr(Expr),
    Return(Option<Expr>),
    If {
        test: Expr,
        body: Vec<Self>,
        orelse: Vec<Self>,
    },
    While {
        test: Expr,
        body: Vec<Self>,
        orelse: Vec<Self>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Self>,
        orelse: Vec<Self>,
    },
    Pass,
    Break,
    Continue,
    Import(Vec<Alias>),
    ImportFrom {
        module: Option<String>,
        names: Vec<Alias>,
        level: usize,
    },
    Global(Vec<String>),
    Nonlocal(Vec<String>),
    Delete(Vec<Expr>),
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    Raise {
        exc: Option<Expr>,
        cause: Option<Expr>,
    },
    Try {
        body: Vec<Self>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Self>,
        finalbody: Vec<Self>,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Self>,
    },
}

/// `except [kind [as name]]: body`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub kind: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
}

/// `context [as vars]` in a `with` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context: Expr,
    pub vars: Option<Expr>,
}

/// `def name(params): body`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Parameters,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub returns: Option<Expr>,
    pub line: usize,
}

/// `class name(bases): body`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub keywords: Vec<Keyword>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub line: usize,
}

/// `t1 = t2 = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub targets: Vec<Expr>,
    pub value: Expr,
    pub line: usize,
}

/// Declared parameters of a function or lambda.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameters {
    /// Positional (and positional-or-keyword) parameters.
    pub args: Vec<Param>,
    /// `*args`.
    pub vararg: Option<Param>,
    /// Parameters after `*` or `*args`.
    pub kwonly: Vec<Param>,
    /// `**kwargs`.
    pub kwarg: Option<Param>,
}

impl Parameters {
    /// Every declared parameter in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.args
            .iter()
            .chain(self.vararg.iter())
            .chain(self.kwonly.iter())
            .chain(self.kwarg.iter())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<Expr>,
    pub default: Option<Expr>,
}

/// `name [as asname]` in an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

/// `arg=value` or `**value` in a call.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Expr,
}

/// Expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(String),
    Constant(Value),
    /// Formatted string literal, kept as written.
    FString(String),
    UnaryOp {
        op: UnaryOp,
        operand: Box<Self>,
    },
    BinOp {
        left: Box<Self>,
        op: BinOp,
        right: Box<Self>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Self>,
    },
    Compare {
        left: Box<Self>,
        ops: Vec<CmpOp>,
        comparators: Vec<Self>,
    },
    /// `body if test else orelse`.
    IfExp {
        test: Box<Self>,
        body: Box<Self>,
        orelse: Box<Self>,
    },
    /// `target := value`.
    NamedExpr {
        target: String,
        value: Box<Self>,
    },
    Call {
        func: Box<Self>,
        args: Vec<Self>,
        keywords: Vec<Keyword>,
    },
    Attribute {
        value: Box<Self>,
        attr: String,
    },
    Subscript {
        value: Box<Self>,
        slice: Box<Self>,
    },
    Slice {
        lower: Option<Box<Self>>,
        upper: Option<Box<Self>>,
        step: Option<Box<Self>>,
    },
    Starred(Box<Self>),
    Tuple(Vec<Self>),
    List(Vec<Self>),
    Set(Vec<Self>),
    /// `None` keys are `**mapping` entries.
    Dict {
        keys: Vec<Option<Self>>,
        values: Vec<Self>,
    },
    Lambda {
        params: Box<Parameters>,
        body: Box<Self>,
    },
    /// List, set, dict or generator comprehension. `value` is only set
    /// for dict comprehensions, where `elt` is the key.
    Comprehension {
        kind: ComprehensionKind,
        elt: Box<Self>,
        value: Option<Box<Self>>,
        generators: Vec<Generator>,
    },
    Yield(Option<Box<Self>>),
    YieldFrom(Box<Self>),
    Await(Box<Self>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComprehensionKind {
    List,
    Set,
    Dict,
    Generator,
}

/// `for target in iter if cond...` clause of a comprehension.
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub target: Expr,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Invert,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

impl BinOp {
    /// Operator for a binary operator token, or the stem of an augmented
    /// assignment token (`+=` -> `+`).
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mult,
            "@" => Self::MatMult,
            "/" => Self::Div,
            "//" => Self::FloorDiv,
            "%" => Self::Mod,
            "**" => Self::Pow,
            "<<" => Self::LShift,
            ">>" => Self::RShift,
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "&" => Self::BitAnd,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mult => "*",
            Self::MatMult => "@",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::LShift => "<<",
            Self::RShift => ">>",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::BitAnd => "&",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

/// Borrowed view of any tree node, used for generic traversal.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Module(&'a Module),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

impl<'a> NodeRef<'a> {
    /// Direct children in source order.
    #[must_use]
    pub fn children(self) -> Vec<Self> {
        let mut out = Vec::new();
        match self {
            Self::Module(module) => stmts(&mut out, &module.body),
            Self::Stmt(stmt) => stmt_children(&mut out, stmt),
            Self::Expr(expr) => expr_children(&mut out, expr),
        }
        out
    }
}

fn stmts<'a>(out: &mut Vec<NodeRef<'a>>, body: &'a [Stmt]) {
    out.extend(body.iter().map(NodeRef::Stmt));
}

fn exprs<'a>(out: &mut Vec<NodeRef<'a>>, items: impl IntoIterator<Item = &'a Expr>) {
    out.extend(items.into_iter().map(NodeRef::Expr));
}

fn params<'a>(out: &mut Vec<NodeRef<'a>>, params: &'a Parameters) {
    for param in params.iter() {
        exprs(out, param.annotation.iter().chain(param.default.iter()));
    }
}

fn stmt_children<'a>(out: &mut Vec<NodeRef<'a>>, stmt: &'a Stmt) {
    match stmt {
        Stmt::FunctionDef(def) => {
            exprs(out, &def.decorators);
            params(out, &def.params);
            exprs(out, def.returns.iter());
            stmts(out, &def.body);
        }
        Stmt::ClassDef(class) => {
            exprs(out, &class.decorators);
            exprs(out, &class.bases);
            exprs(out, class.keywords.iter().map(|k| &k.value));
            stmts(out, &class.body);
        }
        Stmt::Assign(assign) => {
            exprs(out, &assign.targets);
            out.push(NodeRef::Expr(&assign.value));
        }
        Stmt::AugAssign { target, value, .. } => exprs(out, [target, value]),
        Stmt::AnnAssign {
            target,
            annotation,
            value,
        } => exprs(out, [target, annotation].into_iter().chain(value.iter())),
        Stmt::Expr(value) => out.push(NodeRef::Expr(value)),
        Stmt::Return(value) => exprs(out, value.iter()),
        Stmt::If { test, body, orelse } | Stmt::While { test, body, orelse } => {
            out.push(NodeRef::Expr(test));
            stmts(out, body);
            stmts(out, orelse);
        }
        Stmt::For {
            target,
            iter,
            body,
            orelse,
        } => {
            exprs(out, [target, iter]);
            stmts(out, body);
            stmts(out, orelse);
        }
        Stmt::Delete(targets) => exprs(out, targets),
        Stmt::Assert { test, msg } => exprs(out, std::iter::once(test).chain(msg.iter())),
        Stmt::Raise { exc, cause } => exprs(out, exc.iter().chain(cause.iter())),
        Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            stmts(out, body);
            for handler in handlers {
                exprs(out, handler.kind.iter());
                stmts(out, &handler.body);
            }
            stmts(out, orelse);
            stmts(out, finalbody);
        }
        Stmt::With { items, body } => {
            for item in items {
                exprs(out, std::iter::once(&item.context).chain(item.vars.iter()));
            }
            stmts(out, body);
        }
        Stmt::Pass
        | Stmt::Break
        | Stmt::Continue
        | Stmt::Import(_)
        | Stmt::ImportFrom { .. }
        | Stmt::Global(_)
        | Stmt::Nonlocal(_) => {}
    }
}

fn expr_children<'a>(out: &mut Vec<NodeRef<'a>>, expr: &'a Expr) {
    match expr {
        Expr::Name(_) | Expr::Constant(_) | Expr::FString(_) => {}
        Expr::UnaryOp { operand, .. } => out.push(NodeRef::Expr(operand)),
        Expr::BinOp { left, right, .. } => exprs(out, [&**left, &**right]),
        Expr::BoolOp { values, .. } => exprs(out, values),
        Expr::Compare {
            left, comparators, ..
        } => {
            out.push(NodeRef::Expr(left));
            exprs(out, comparators);
        }
        Expr::IfExp { test, body, orelse } => exprs(out, [&**test, &**body, &**orelse]),
        Expr::NamedExpr { value, .. } => out.push(NodeRef::Expr(value)),
        Expr::Call {
            func,
            args,
            keywords,
        } => {
            out.push(NodeRef::Expr(func));
            exprs(out, args);
            exprs(out, keywords.iter().map(|k| &k.value));
        }
        Expr::Attribute { value, .. } | Expr::Starred(value) => out.push(NodeRef::Expr(value)),
        Expr::Subscript { value, slice } => exprs(out, [&**value, &**slice]),
        Expr::Slice { lower, upper, step } => {
            exprs(out, [lower, upper, step].into_iter().flatten().map(|e| &**e));
        }
        Expr::Tuple(items) | Expr::List(items) | Expr::Set(items) => exprs(out, items),
        Expr::Dict { keys, values } => {
            for (key, value) in keys.iter().zip(values) {
                exprs(out, key.iter());
                out.push(NodeRef::Expr(value));
            }
        }
        Expr::Lambda { params: p, body } => {
            params(out, p);
            out.push(NodeRef::Expr(body));
        }
        Expr::Comprehension {
            elt,
            value,
            generators,
            ..
        } => {
            out.push(NodeRef::Expr(elt));
            exprs(out, value.iter().map(|v| &**v));
            for generator in generators {
                exprs(out, [&generator.target, &generator.iter]);
                exprs(out, &generator.ifs);
            }
        }
        Expr::Yield(value) => exprs(out, value.iter().map(|v| &**v)),
        Expr::YieldFrom(value) | Expr::Await(value) => out.push(NodeRef::Expr(value)),
    }
}
