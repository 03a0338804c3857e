//! Type errors, their provenance, and their `E`/`W`-code classification.
//!
//! Every error carries a [`ConstraintOrigin`] recording why the constraint
//! was generated, so the diagnostic engine can render more than "expected X,
//! found Y". Codes follow §7 of the error taxonomy: `E001-E099` type errors,
//! `E100-E199` name resolution, `E200-E299` syntax/shape, `E300-E399`
//! process/concurrency, `E9xx` internal errors.

use std::fmt;

use vaisto_common::Loc;

use crate::ty::{Ty, TyVar};

#[derive(Clone, Debug)]
pub enum ConstraintOrigin {
    FnArg { call_site: Loc, param_idx: usize },
    IfBranches { if_loc: Loc, then_loc: Loc, else_loc: Loc },
    LetBinding { binding_loc: Loc },
    Return { return_loc: Loc, fn_loc: Loc },
    MatchArms { arm_loc: Loc },
    RowAccess { field: String, loc: Loc },
    Builtin,
}

#[derive(Clone, Debug)]
pub enum TypeError {
    /// E001: two types that should be equal are not.
    Mismatch { expected: Ty, found: Ty, origin: ConstraintOrigin },
    /// E002: an infinite type would result from unification.
    InfiniteType { var: TyVar, ty: Ty, origin: ConstraintOrigin },
    /// E003: wrong number of arguments at a call site.
    ArityMismatch { expected: usize, found: usize, origin: ConstraintOrigin },
    /// E004: called a non-function value.
    NotAFunction { ty: Ty, loc: Loc },
    /// E005: a row has a missing or extra field relative to its peer.
    RowFieldMismatch { missing: Vec<String>, extra: Vec<String>, loc: Loc },
    /// E006: a record/sum name mismatch during unification.
    NominalMismatch { expected: String, found: String, loc: Loc },
    /// E007: guard or `if` condition is not `Bool`.
    NonBoolCondition { found: Ty, loc: Loc },

    /// E100: reference to an unbound variable, with an optional suggestion.
    UnboundVariable { name: String, loc: Loc, suggestion: Option<String> },
    /// E101: call to an unknown function, with an optional suggestion.
    UnknownFunction { name: String, loc: Loc, suggestion: Option<String> },
    /// E102: reference to an unknown type name.
    UnknownType { name: String, loc: Loc, suggestion: Option<String> },
    /// E103: reference to an undeclared process.
    UnknownProcess { name: String, loc: Loc, suggestion: Option<String> },
    /// E104: pattern names a constructor that doesn't exist on the scrutinee type.
    UnknownVariant { name: String, loc: Loc, suggestion: Option<String> },
    /// E105: field access on a record type that doesn't declare this field.
    UnknownField { field: String, record: String, loc: Loc, suggestion: Option<String> },
    /// E106: class/instance resolution references an undeclared class.
    UnknownClass { name: String, loc: Loc, suggestion: Option<String> },

    /// E200: malformed `defn`/`deftype`/etc shape (surfaced from the parser
    /// or from a shape check the elaborator itself performs).
    MalformedForm { message: String, loc: Loc },

    /// E300: a message tag is not among a typed PID's accepted tags.
    InvalidMessageTag { process: String, tag: String, accepted: Vec<String>, loc: Loc },
    /// E301: `send`/`spawn` target is not a PID at all.
    SendToNonPid { found: Ty, loc: Loc },
    /// E302: `spawn`'s init expression doesn't match the process's declared state type.
    SpawnStateMismatch { process: String, expected: Ty, found: Ty, loc: Loc },

    /// A non-exhaustive `match` (warning class depends on the scrutinee kind
    /// per §4.6, but this is always fatal — it's a missing-arm defect).
    NonExhaustiveMatch { scrutinee_ty: String, missing: Vec<String>, loc: Loc },
    /// W001: a match arm can never fire because earlier arms already cover
    /// every value it would match (SPEC_FULL §B.2). Collected in
    /// `InferCtx::warnings`, not `errors`.
    RedundantMatchArm { index: usize, loc: Loc },

    /// Class/instance resolver errors (§4.5).
    TraitNotSatisfied { ty: Ty, class: String, loc: Loc },
    MissingMethod { class: String, method: String, head: String, loc: Loc },
    DuplicateInstance { class: String, head: String, loc: Loc },
    ConstraintDepthExceeded { class: String, loc: Loc },
    UnsupportedDerive { class: String, type_name: String, loc: Loc },
    DerivingShowOnFieldedType { type_name: String, loc: Loc },

    /// Module interface load failure that could not be downgraded to a cache
    /// miss (e.g. corrupted payload rather than a version mismatch).
    InterfaceCorrupt { module: String, reason: String },

    /// Catch-all for defects that should not occur -- translated at the CLI
    /// boundary to `E9xx` "internal error" and never shown with a raw panic
    /// message or stack trace (§7).
    Internal { message: String },
}

impl TypeError {
    /// The structured `Exxx`/`E9xx` code used by the diagnostic engine.
    pub fn code(&self) -> &'static str {
        match self {
            TypeError::Mismatch { .. } => "E001",
            TypeError::InfiniteType { .. } => "E002",
            TypeError::ArityMismatch { .. } => "E003",
            TypeError::NotAFunction { .. } => "E004",
            TypeError::RowFieldMismatch { .. } => "E005",
            TypeError::NominalMismatch { .. } => "E006",
            TypeError::NonBoolCondition { .. } => "E007",
            TypeError::UnboundVariable { .. } => "E100",
            TypeError::UnknownFunction { .. } => "E101",
            TypeError::UnknownType { .. } => "E102",
            TypeError::UnknownProcess { .. } => "E103",
            TypeError::UnknownVariant { .. } => "E104",
            TypeError::UnknownField { .. } => "E105",
            TypeError::UnknownClass { .. } => "E106",
            TypeError::MalformedForm { .. } => "E200",
            TypeError::InvalidMessageTag { .. } => "E300",
            TypeError::SendToNonPid { .. } => "E301",
            TypeError::SpawnStateMismatch { .. } => "E302",
            TypeError::NonExhaustiveMatch { .. } => "E010",
            TypeError::RedundantMatchArm { .. } => "W001",
            TypeError::TraitNotSatisfied { .. } => "E020",
            TypeError::MissingMethod { .. } => "E021",
            TypeError::DuplicateInstance { .. } => "E022",
            TypeError::ConstraintDepthExceeded { .. } => "E023",
            TypeError::UnsupportedDerive { .. } => "E024",
            TypeError::DerivingShowOnFieldedType { .. } => "E025",
            TypeError::InterfaceCorrupt { .. } => "E900",
            TypeError::Internal { .. } => "E901",
        }
    }

    /// The primary span to underline, if this error has exactly one.
    pub fn loc(&self) -> Option<Loc> {
        match self {
            TypeError::Mismatch { origin, .. }
            | TypeError::InfiniteType { origin, .. }
            | TypeError::ArityMismatch { origin, .. } => origin.loc(),
            TypeError::NotAFunction { loc, .. }
            | TypeError::RowFieldMismatch { loc, .. }
            | TypeError::NominalMismatch { loc, .. }
            | TypeError::NonBoolCondition { loc, .. }
            | TypeError::UnboundVariable { loc, .. }
            | TypeError::UnknownFunction { loc, .. }
            | TypeError::UnknownType { loc, .. }
            | TypeError::UnknownProcess { loc, .. }
            | TypeError::UnknownVariant { loc, .. }
            | TypeError::UnknownField { loc, .. }
            | TypeError::UnknownClass { loc, .. }
            | TypeError::MalformedForm { loc, .. }
            | TypeError::InvalidMessageTag { loc, .. }
            | TypeError::SendToNonPid { loc, .. }
            | TypeError::SpawnStateMismatch { loc, .. }
            | TypeError::NonExhaustiveMatch { loc, .. }
            | TypeError::RedundantMatchArm { loc, .. }
            | TypeError::TraitNotSatisfied { loc, .. }
            | TypeError::MissingMethod { loc, .. }
            | TypeError::DuplicateInstance { loc, .. }
            | TypeError::ConstraintDepthExceeded { loc, .. }
            | TypeError::UnsupportedDerive { loc, .. }
            | TypeError::DerivingShowOnFieldedType { loc, .. } => Some(*loc),
            TypeError::InterfaceCorrupt { .. } | TypeError::Internal { .. } => None,
        }
    }

    /// A short actionable hint, when one exists beyond the message itself.
    pub fn hint(&self) -> Option<String> {
        match self {
            TypeError::UnboundVariable { suggestion: Some(s), .. }
            | TypeError::UnknownFunction { suggestion: Some(s), .. }
            | TypeError::UnknownType { suggestion: Some(s), .. }
            | TypeError::UnknownProcess { suggestion: Some(s), .. }
            | TypeError::UnknownVariant { suggestion: Some(s), .. }
            | TypeError::UnknownField { suggestion: Some(s), .. }
            | TypeError::UnknownClass { suggestion: Some(s), .. } => Some(format!("did you mean `{s}`?")),
            TypeError::UnsupportedDerive { .. } => {
                Some("only Eq and Show are derivable".to_string())
            }
            TypeError::DerivingShowOnFieldedType { .. } => {
                Some("write a manual `Show` instance for types with fields".to_string())
            }
            _ => None,
        }
    }
}

impl ConstraintOrigin {
    fn loc(&self) -> Option<Loc> {
        match self {
            ConstraintOrigin::FnArg { call_site, .. } => Some(*call_site),
            ConstraintOrigin::IfBranches { if_loc, .. } => Some(*if_loc),
            ConstraintOrigin::LetBinding { binding_loc } => Some(*binding_loc),
            ConstraintOrigin::Return { return_loc, .. } => Some(*return_loc),
            ConstraintOrigin::MatchArms { arm_loc } => Some(*arm_loc),
            ConstraintOrigin::RowAccess { loc, .. } => Some(*loc),
            ConstraintOrigin::Builtin => None,
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::Mismatch { expected, found, .. } => {
                write!(f, "type mismatch: expected `{expected}`, found `{found}`")
            }
            TypeError::InfiniteType { var, ty, .. } => {
                write!(f, "infinite type: `{var}` occurs in `{ty}`")
            }
            TypeError::ArityMismatch { expected, found, .. } => {
                write!(f, "arity mismatch: expected {expected} arguments, found {found}")
            }
            TypeError::NotAFunction { ty, .. } => write!(f, "`{ty}` is not a function"),
            TypeError::RowFieldMismatch { missing, extra, .. } => {
                write!(f, "record field mismatch")?;
                if !missing.is_empty() {
                    write!(f, ": missing [{}]", missing.join(", "))?;
                }
                if !extra.is_empty() {
                    write!(f, "; unexpected [{}]", extra.join(", "))?;
                }
                Ok(())
            }
            TypeError::NominalMismatch { expected, found, .. } => {
                write!(f, "expected type `{expected}`, found `{found}`")
            }
            TypeError::NonBoolCondition { found, .. } => {
                write!(f, "condition must be `Bool`, found `{found}`")
            }
            TypeError::UnboundVariable { name, .. } => write!(f, "unbound variable `{name}`"),
            TypeError::UnknownFunction { name, .. } => write!(f, "unknown function `{name}`"),
            TypeError::UnknownType { name, .. } => write!(f, "unknown type `{name}`"),
            TypeError::UnknownProcess { name, .. } => write!(f, "unknown process `{name}`"),
            TypeError::UnknownVariant { name, .. } => write!(f, "unknown variant `{name}`"),
            TypeError::UnknownField { field, record, .. } => {
                write!(f, "type `{record}` has no field `{field}`")
            }
            TypeError::UnknownClass { name, .. } => write!(f, "unknown class `{name}`"),
            TypeError::MalformedForm { message, .. } => write!(f, "{message}"),
            TypeError::InvalidMessageTag { process, tag, accepted, .. } => {
                write!(
                    f,
                    "process `{process}` does not accept message `:{tag}` (accepted: [{}])",
                    accepted.iter().map(|t| format!(":{t}")).collect::<Vec<_>>().join(", ")
                )
            }
            TypeError::SendToNonPid { found, .. } => {
                write!(f, "cannot send to non-PID value of type `{found}`")
            }
            TypeError::SpawnStateMismatch { process, expected, found, .. } => {
                write!(
                    f,
                    "process `{process}` expects initial state `{expected}`, found `{found}`"
                )
            }
            TypeError::NonExhaustiveMatch { scrutinee_ty, missing, .. } => {
                write!(
                    f,
                    "non-exhaustive match on `{scrutinee_ty}`: missing {}",
                    missing.join(", ")
                )
            }
            TypeError::RedundantMatchArm { index, .. } => {
                write!(f, "match arm {} is unreachable: already covered by earlier arms", index + 1)
            }
            TypeError::TraitNotSatisfied { ty, class, .. } => {
                write!(f, "type `{ty}` does not implement `{class}`")
            }
            TypeError::MissingMethod { class, method, head, .. } => {
                write!(f, "instance `{class}` for `{head}` is missing method `{method}`")
            }
            TypeError::DuplicateInstance { class, head, .. } => {
                write!(f, "duplicate instance `{class}` for `{head}`")
            }
            TypeError::ConstraintDepthExceeded { class, .. } => {
                write!(f, "constraint resolution for `{class}` exceeded the depth budget")
            }
            TypeError::UnsupportedDerive { class, type_name, .. } => {
                write!(f, "cannot derive `{class}` for `{type_name}`")
            }
            TypeError::DerivingShowOnFieldedType { type_name, .. } => {
                write!(f, "cannot derive `Show` for `{type_name}`: has fields")
            }
            TypeError::InterfaceCorrupt { module, reason } => {
                write!(f, "module interface for `{module}` is corrupt: {reason}")
            }
            TypeError::Internal { message } => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for TypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_taxonomy_ranges() {
        let mismatch = TypeError::Mismatch { expected: Ty::Int, found: Ty::Bool, origin: ConstraintOrigin::Builtin };
        assert_eq!(mismatch.code(), "E001");

        let unbound = TypeError::UnboundVariable { name: "x".into(), loc: Loc::new(0, 1), suggestion: None };
        assert_eq!(unbound.code(), "E100");

        let bad_send = TypeError::InvalidMessageTag {
            process: "counter".into(),
            tag: "wrong".into(),
            accepted: vec!["inc".into()],
            loc: Loc::new(0, 1),
        };
        assert_eq!(bad_send.code(), "E300");
    }

    #[test]
    fn hint_renders_suggestion() {
        let err = TypeError::UnknownFunction {
            name: "lenght".into(),
            loc: Loc::new(0, 1),
            suggestion: Some("length".into()),
        };
        assert_eq!(err.hint().as_deref(), Some("did you mean `length`?"));
    }
}
