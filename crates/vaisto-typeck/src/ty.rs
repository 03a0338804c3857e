//! Type representation.
//!
//! `Ty` is the term language described in the data model: primitives, type
//! variables, rows, and the handful of type constructors the elaborator
//! needs (`List`, `Tuple`, `Record`, `Sum`, `Row`, `Fn`, `PidOf`). `TyVar` is
//! the single union-find key used both for ordinary inference variables and
//! for row-tail variables -- a row tail that's still open is represented as
//! an unbound `TyVar`; closing it means unifying it with `Ty::Row(vec![],
//! RowTail::Closed)`. This keeps one `ena` table instead of two.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A type variable, indexing into the `InferCtx`'s unification table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TyVar(pub u32);

impl fmt::Display for TyVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// Whether a row's tail is closed (exactly the listed fields) or open at
/// an unresolved variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowTail {
    Closed,
    Var(TyVar),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ty {
    Int,
    Float,
    Bool,
    String,
    Unit,
    /// The bottom/universal escape hatch for values whose precise type
    /// elaboration gave up on after an error (local recovery, §7).
    Any,
    /// A singleton atom type, e.g. the type of the literal `:ok`.
    AtomTag(String),
    /// The universal atom type -- the type of an unbound bare symbol.
    Atom,
    /// An untyped process id (escape hatch; accepts any message at runtime).
    Pid,
    Var(TyVar),
    List(Box<Ty>),
    Tuple(Vec<Ty>),
    /// A nominal product type: `name` plus its declared field types in
    /// declaration order.
    Record(String, Vec<(String, Ty)>),
    /// A nominal sum type: `name` plus each variant's constructor name and
    /// field types.
    Sum(String, Vec<(String, Vec<Ty>)>),
    /// A structural, open-or-closed record used only during inference for
    /// row-polymorphic field access. Never appears in a finished signature
    /// that escapes the module (it is always unified down to a concrete
    /// `Record` or resolved away).
    Row(Vec<(String, Ty)>, RowTail),
    Fn(Vec<Ty>, Box<Ty>),
    /// A typed process identifier: the declaring process's name and the set
    /// of message tags it accepts.
    PidOf(String, Vec<String>),
}

impl Ty {
    pub fn fun(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Fn(params, Box::new(ret))
    }

    pub fn list(inner: Ty) -> Ty {
        Ty::List(Box::new(inner))
    }

    /// Whether this type, once resolved, can never be a PID -- used by the
    /// unsafe send operator's weak non-PID check (§4.4).
    pub fn obviously_non_pid(&self) -> bool {
        matches!(
            self,
            Ty::Int | Ty::Float | Ty::Bool | Ty::String | Ty::List(_) | Ty::Record(..) | Ty::Sum(..)
        )
    }

    /// The constructor name used as an instance-table lookup key (§4.5
    /// "head"), if this type has one.
    pub fn head_name(&self) -> Option<&str> {
        match self {
            Ty::Int => Some("Int"),
            Ty::Float => Some("Float"),
            Ty::Bool => Some("Bool"),
            Ty::String => Some("String"),
            Ty::Unit => Some("Unit"),
            Ty::Atom | Ty::AtomTag(_) => Some("Atom"),
            Ty::List(_) => Some("List"),
            Ty::Tuple(_) => Some("Tuple"),
            Ty::Record(name, _) => Some(name),
            Ty::Sum(name, _) => Some(name),
            Ty::PidOf(..) | Ty::Pid => Some("Pid"),
            _ => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => write!(f, "Int"),
            Ty::Float => write!(f, "Float"),
            Ty::Bool => write!(f, "Bool"),
            Ty::String => write!(f, "String"),
            Ty::Unit => write!(f, "Unit"),
            Ty::Any => write!(f, "Any"),
            Ty::AtomTag(tag) => write!(f, ":{tag}"),
            Ty::Atom => write!(f, "Atom"),
            Ty::Pid => write!(f, "Pid"),
            Ty::Var(v) => write!(f, "{v}"),
            Ty::List(inner) => write!(f, "List<{inner}>"),
            Ty::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            Ty::Record(name, fields) => {
                write!(f, "{name} {{")?;
                for (i, (fname, fty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{fname}: {fty}")?;
                }
                write!(f, "}}")
            }
            Ty::Sum(name, _) => write!(f, "{name}"),
            Ty::Row(fields, tail) => {
                write!(f, "{{")?;
                for (i, (fname, fty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{fname}: {fty}")?;
                }
                match tail {
                    RowTail::Closed => write!(f, "}}"),
                    RowTail::Var(v) => write!(f, " | {v}}}"),
                }
            }
            Ty::Fn(params, ret) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
            Ty::PidOf(process, msgs) => {
                write!(f, "Pid<{process}: [{}]>", msgs.join(", "))
            }
        }
    }
}

/// A polymorphic type scheme: `forall vars. ty`. The only place a
/// quantifier appears (invariant: prenex only).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    pub vars: Vec<TyVar>,
    pub ty: Ty,
}

impl Scheme {
    pub fn mono(ty: Ty) -> Self {
        Scheme { vars: Vec::new(), ty }
    }
}

impl ena::unify::UnifyKey for TyVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_primitives() {
        assert_eq!(Ty::Int.to_string(), "Int");
        assert_eq!(Ty::AtomTag("ok".into()).to_string(), ":ok");
    }

    #[test]
    fn display_fn_and_row() {
        let fn_ty = Ty::fun(vec![Ty::Int, Ty::String], Ty::Bool);
        assert_eq!(fn_ty.to_string(), "(Int, String) -> Bool");

        let row = Ty::Row(vec![("x".into(), Ty::Int)], RowTail::Var(TyVar(3)));
        assert_eq!(row.to_string(), "{x: Int | ?3}");
    }

    #[test]
    fn head_name_for_nominal_types() {
        let sum = Ty::Sum("Color".into(), vec![("Red".into(), vec![])]);
        assert_eq!(sum.head_name(), Some("Color"));
        assert_eq!(Ty::Int.head_name(), Some("Int"));
        assert_eq!(Ty::Var(TyVar(0)).head_name(), None);
    }
}
