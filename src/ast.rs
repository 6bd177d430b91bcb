use std::rc::Rc;

use crate::runtime::version::Version;

/// A parsed program, ready to hand to [`crate::Interpreter::run`].
#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclKind {
    Var,
    Let,
    Pub,
    Priv,
    Spec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamKind {
    Normal,
    KwOnly,
    VarArg,
    VarKwArg,
}

#[derive(Debug, Clone)]
pub(crate) struct ParamDef {
    pub(crate) name: String,
    pub(crate) default: Option<Expr>,
    pub(crate) kind: ParamKind,
}

/// Declaration and assignment targets: a plain name or a `{:expr}` dynamic name.
#[derive(Debug, Clone)]
pub(crate) enum Target {
    Name { name: String, start: usize },
    Dynamic { expr: Box<Expr>, start: usize },
}

impl Target {
    pub(crate) fn start(&self) -> usize {
        match self {
            Target::Name { start, .. } | Target::Dynamic { start, .. } => *start,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum CallArg {
    Pos(Expr),
    Kw { name: String, value: Expr },
    DynKw { name: Box<Expr>, value: Expr },
    Spread(Expr),
    KwSpread(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    IdEq,
    Lt,
    Le,
    Gt,
    Ge,
    /// `x in y`: dispatches `contains` on the right operand.
    In,
    /// `y contains x`: dispatches `contains` on the left operand.
    Contains,
    Or,
    And,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicOp {
    OrOr,
    AndAnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Pos,
    Not,
    Bool,
}

#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Num(f64),
    Str(String),
    Pattern {
        source: String,
        start: usize,
    },
    Ident {
        name: String,
        start: usize,
    },
    DynamicIdent {
        expr: Box<Expr>,
        start: usize,
    },
    List(Vec<Expr>),
    Block(Vec<Stmt>),
    If {
        cond: Box<Expr>,
        then: Vec<Stmt>,
        els: Option<Vec<Stmt>>,
        start: usize,
    },
    Func {
        name: Option<String>,
        params: Vec<ParamDef>,
        body: Rc<Vec<Stmt>>,
        decos: Vec<Expr>,
        is_struct: bool,
        start: usize,
    },
    Property {
        name: String,
        body: Rc<Vec<Stmt>>,
        start: usize,
    },
    TypeDecl {
        name: String,
        check: Option<Box<Expr>>,
        static_body: Option<Vec<Stmt>>,
        init: Option<Box<Expr>>,
        start: usize,
    },
    /// The `type` keyword used as an expression: the base metatype.
    TypeAtom {
        start: usize,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        start: usize,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        start: usize,
    },
    Logic {
        op: LogicOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        target: Target,
        value: Box<Expr>,
        start: usize,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<CallArg>,
        start: usize,
    },
    /// Bracket postfix: subscripting for containers, partial application for callables.
    AltCall {
        callee: Box<Expr>,
        args: Vec<CallArg>,
        start: usize,
    },
    GetAttr {
        obj: Box<Expr>,
        name: String,
        start: usize,
    },
    Format {
        obj: Box<Expr>,
        spec: String,
        start: usize,
    },
    /// `$`, `$$`, ...: the scope object of the current frame, or an ancestor of it.
    ScopeRef {
        levels: usize,
        start: usize,
    },
    /// `\name`, `\\name`, `$name`: private attribute read through the scope chain.
    PrivRead {
        levels: usize,
        name: String,
        start: usize,
    },
}

#[derive(Debug, Clone)]
pub(crate) enum ImportNames {
    Single(String),
    Members(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VersionOp {
    Exact,
    Min,
    Max,
    Range,
}

#[derive(Debug, Clone)]
pub(crate) struct VersionReq {
    pub(crate) op: VersionOp,
    pub(crate) low: Version,
    pub(crate) high: Option<Version>,
}

#[derive(Debug, Clone)]
pub(crate) enum Stmt {
    Expr {
        expr: Expr,
        start: usize,
    },
    Decl {
        kind: DeclKind,
        target: Target,
        value: Option<Expr>,
        start: usize,
    },
    Block(Vec<Stmt>),
    While {
        cond: Expr,
        body: Vec<Stmt>,
        start: usize,
    },
    For {
        var: String,
        iterable: Expr,
        body: Vec<Stmt>,
        start: usize,
    },
    Break {
        amount: Option<Expr>,
        start: usize,
    },
    Continue {
        amount: Option<Expr>,
        start: usize,
    },
    Return {
        value: Option<Expr>,
        start: usize,
    },
    Raise {
        value: Expr,
        start: usize,
    },
    Del {
        name: String,
        start: usize,
    },
    Try {
        body: Vec<Stmt>,
        catch: Option<(Option<String>, Vec<Stmt>)>,
        els: Option<Vec<Stmt>>,
        start: usize,
    },
    Switch {
        subject: Expr,
        cases: Vec<(Expr, Vec<Stmt>)>,
        default: Option<Vec<Stmt>>,
        start: usize,
    },
    Edit {
        target: Expr,
        body: Vec<Stmt>,
        start: usize,
    },
    Import {
        names: ImportNames,
        source: String,
        source_is_url: bool,
        start: usize,
    },
    VersionCheck {
        req: VersionReq,
        start: usize,
    },
}

impl Stmt {
    pub(crate) fn start(&self) -> usize {
        match self {
            Stmt::Expr { start, .. }
            | Stmt::Decl { start, .. }
            | Stmt::While { start, .. }
            | Stmt::For { start, .. }
            | Stmt::Break { start, .. }
            | Stmt::Continue { start, .. }
            | Stmt::Return { start, .. }
            | Stmt::Raise { start, .. }
            | Stmt::Del { start, .. }
            | Stmt::Try { start, .. }
            | Stmt::Switch { start, .. }
            | Stmt::Edit { start, .. }
            | Stmt::Import { start, .. }
            | Stmt::VersionCheck { start, .. } => *start,
            Stmt::Block(stmts) => stmts.first().map(Stmt::start).unwrap_or(0),
        }
    }
}
