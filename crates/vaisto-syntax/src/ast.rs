//! Typed AST nodes produced by [`crate::lower`], annotated with [`Loc`].
//!
//! This is the contract the elaborator (`vaisto-typeck`) consumes: a parsed
//! module plus one optional trailing expression (used by `--eval` mode).

use vaisto_common::Loc;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Lit(Literal, Loc),
    /// An atom pattern, e.g. `:wrong`.
    Atom(String, Loc),
    Var(String, Loc),
    Wildcard(Loc),
    /// A sum-variant or record constructor pattern: `(Just v)`, `(Red)`.
    Ctor { name: String, args: Vec<Pattern>, loc: Loc },
    List(Vec<Pattern>, Loc),
    Cons { head: Box<Pattern>, tail: Box<Pattern>, loc: Loc },
    Tuple(Vec<Pattern>, Loc),
}

impl Pattern {
    pub fn loc(&self) -> Loc {
        match self {
            Pattern::Lit(_, l)
            | Pattern::Atom(_, l)
            | Pattern::Var(_, l)
            | Pattern::Wildcard(l)
            | Pattern::Ctor { loc: l, .. }
            | Pattern::List(_, l)
            | Pattern::Cons { loc: l, .. }
            | Pattern::Tuple(_, l) => *l,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Literal, Loc),
    /// An explicit atom literal, e.g. `:yes`.
    Atom(String, Loc),
    /// A bare identifier. Resolved during elaboration to either a bound
    /// variable or (if unbound) a universal-`Atom` literal.
    Var(String, Loc),
    If { cond: Box<Expr>, then: Box<Expr>, else_: Box<Expr>, loc: Loc },
    Let { bindings: Vec<(String, Expr)>, body: Box<Expr>, loc: Loc },
    Fn { params: Vec<String>, body: Box<Expr>, loc: Loc },
    Call { func: Box<Expr>, args: Vec<Expr>, loc: Loc },
    Do(Vec<Expr>, Loc),
    Tuple(Vec<Expr>, Loc),
    List(Vec<Expr>, Loc),
    Match { scrutinee: Box<Expr>, arms: Vec<MatchArm>, loc: Loc },
    /// `(. record :field)`
    FieldAccess { record: Box<Expr>, field: String, loc: Loc },
    /// `(spawn process-name init)`
    Spawn { process: String, init: Box<Expr>, loc: Loc },
    /// `(! pid msg)` (safe) or `(!! pid msg)` (unsafe).
    Send { safe: bool, pid: Box<Expr>, msg: Box<Expr>, loc: Loc },
}

impl Expr {
    pub fn loc(&self) -> Loc {
        match self {
            Expr::Lit(_, l)
            | Expr::Atom(_, l)
            | Expr::Var(_, l)
            | Expr::If { loc: l, .. }
            | Expr::Let { loc: l, .. }
            | Expr::Fn { loc: l, .. }
            | Expr::Call { loc: l, .. }
            | Expr::Do(_, l)
            | Expr::Tuple(_, l)
            | Expr::List(_, l)
            | Expr::Match { loc: l, .. }
            | Expr::FieldAccess { loc: l, .. }
            | Expr::Spawn { loc: l, .. }
            | Expr::Send { loc: l, .. } => *l,
        }
    }
}

/// `deftype Name (Ctor field…)…` — an algebraic sum type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct SumTypeDef {
    pub name: String,
    pub variants: Vec<VariantDef>,
    pub deriving: Vec<String>,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantDef {
    pub ctor: String,
    /// Field names; types are left to be inferred (the language has no
    /// field-type annotations in constructor position).
    pub fields: Vec<String>,
    pub loc: Loc,
}

/// `defrecord Name [field…]` — a nominal record/product type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<String>,
    pub deriving: Vec<String>,
    pub loc: Loc,
}

/// `defn name [params…] body`
#[derive(Debug, Clone, PartialEq)]
pub struct FnDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<String>,
    pub default: Option<Expr>,
    pub loc: Loc,
}

/// `defclass Name [tyvar] (method [params…] [default])…`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub tyvar: String,
    pub methods: Vec<MethodSig>,
    pub loc: Loc,
}

/// The head of an `instance` declaration: a bare primitive/type name, or a
/// constructor applied to type-variable arguments (for constrained instances).
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceHead {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceMethod {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
}

/// `instance Class Head [where [(Ci a)…]] methods…`
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDef {
    pub class: String,
    pub head: InstanceHead,
    pub constraints: Vec<(String, String)>,
    pub methods: Vec<InstanceMethod>,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessArm {
    pub tag: String,
    pub params: Vec<String>,
    pub body: Expr,
}

/// `process name init-expr :tag [params] body …`
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessDef {
    pub name: String,
    pub init: Expr,
    pub arms: Vec<ProcessArm>,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub module: String,
    pub alias: Option<String>,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Fn(FnDef),
    SumType(SumTypeDef),
    Record(RecordDef),
    Class(ClassDef),
    Instance(InstanceDef),
    Process(ProcessDef),
}

/// A fully-read module: optional `(ns M)` header, imports, declarations, and
/// (in `eval` mode) a single trailing expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub name: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub items: Vec<Item>,
    pub top_expr: Option<Expr>,
}
