//! Pattern matcher and exhaustiveness checking (§4.6).
//!
//! Implements Maranget's usefulness algorithm (constructor specialization +
//! default matrix) over an abstract pattern representation (`Pat`), not the
//! syntax AST directly. Lists are treated as the two-constructor ADT
//! `[]`/`cons`, tuples as a single-constructor product, `Bool` as a
//! two-constructor ADT (`true`/`false`), and anything else with unbounded
//! inhabitants (`Int`, `Float`, `String`, `Atom`) as infinite -- only a
//! wildcard or variable can make an infinite-type column exhaustive.

use rustc_hash::{FxHashMap, FxHashSet};

use vaisto_syntax::ast::{Literal, Pattern};

use crate::ty::Ty;

#[derive(Clone, Debug, PartialEq)]
pub enum Pat {
    Wildcard,
    /// A constructor application, covering sum variants, list `[]`/`cons`,
    /// tuples, booleans, and literals (literals are zero-arity constructors
    /// named after their textual value).
    Ctor { name: String, args: Vec<Pat> },
}

impl Pat {
    fn display(&self) -> String {
        match self {
            Pat::Wildcard => "_".to_string(),
            Pat::Ctor { name, args } if args.is_empty() => name.clone(),
            Pat::Ctor { name, args } => {
                format!("({} {})", name, args.iter().map(Pat::display).collect::<Vec<_>>().join(" "))
            }
        }
    }
}

/// Converts a syntax-level pattern into the abstract form the usefulness
/// algorithm operates on. Variable bindings collapse to `Wildcard`: binding
/// a name matches anything, which is exactly what the algorithm needs.
pub fn lower_pattern(pattern: &Pattern) -> Pat {
    match pattern {
        Pattern::Wildcard(_) | Pattern::Var(_, _) => Pat::Wildcard,
        Pattern::Atom(tag, _) => Pat::Ctor { name: format!(":{tag}"), args: Vec::new() },
        Pattern::Lit(lit, _) => Pat::Ctor { name: literal_name(lit), args: Vec::new() },
        Pattern::Ctor { name, args, .. } => {
            Pat::Ctor { name: name.clone(), args: args.iter().map(lower_pattern).collect() }
        }
        Pattern::List(items, _) => items.iter().rev().fold(Pat::Ctor { name: "[]".into(), args: vec![] }, |tail, item| {
            Pat::Ctor { name: "cons".into(), args: vec![lower_pattern(item), tail] }
        }),
        Pattern::Cons { head, tail, .. } => {
            Pat::Ctor { name: "cons".into(), args: vec![lower_pattern(head), lower_pattern(tail)] }
        }
        Pattern::Tuple(elems, _) => {
            Pat::Ctor { name: "tuple".into(), args: elems.iter().map(lower_pattern).collect() }
        }
    }
}

fn literal_name(lit: &Literal) -> String {
    match lit {
        Literal::Int(v) => v.to_string(),
        Literal::Float(v) => v.to_string(),
        Literal::Bool(v) => v.to_string(),
        Literal::Str(v) => format!("{v:?}"),
    }
}

/// What a column's type looks like to the usefulness algorithm: either a
/// known, finite constructor signature set, or unbounded.
enum Ctors {
    Finite(Vec<(String, usize)>),
    Infinite,
}

pub struct ExhaustivenessCtx<'a> {
    pub sums: &'a FxHashMap<String, Vec<(String, Vec<Ty>)>>,
}

impl<'a> ExhaustivenessCtx<'a> {
    fn ctors_for(&self, ty: &Ty) -> Ctors {
        match ty {
            Ty::Sum(name, _) => match self.sums.get(name) {
                Some(variants) => Ctors::Finite(variants.iter().map(|(c, fs)| (c.clone(), fs.len())).collect()),
                None => Ctors::Infinite,
            },
            Ty::Bool => Ctors::Finite(vec![("true".into(), 0), ("false".into(), 0)]),
            Ty::List(_) => Ctors::Finite(vec![("[]".into(), 0), ("cons".into(), 2)]),
            Ty::Tuple(elems) => Ctors::Finite(vec![("tuple".into(), elems.len())]),
            _ => Ctors::Infinite,
        }
    }

    fn arg_types(&self, ty: &Ty, ctor: &str) -> Vec<Ty> {
        match ty {
            Ty::Sum(name, _) => self
                .sums
                .get(name)
                .and_then(|variants| variants.iter().find(|(c, _)| c == ctor))
                .map(|(_, fs)| fs.clone())
                .unwrap_or_default(),
            Ty::List(inner) if ctor == "cons" => vec![(**inner).clone(), ty.clone()],
            Ty::Tuple(elems) => elems.clone(),
            _ => Vec::new(),
        }
    }
}

type Matrix = Vec<Vec<Pat>>;

fn column0_names(matrix: &Matrix) -> FxHashSet<String> {
    matrix
        .iter()
        .filter_map(|row| match row.first() {
            Some(Pat::Ctor { name, .. }) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn specialize(matrix: &Matrix, ctor: &str, arity: usize) -> Matrix {
    matrix
        .iter()
        .filter_map(|row| match &row[0] {
            Pat::Ctor { name, args } if name == ctor => {
                let mut new_row = args.clone();
                new_row.extend_from_slice(&row[1..]);
                Some(new_row)
            }
            Pat::Wildcard => {
                let mut new_row = vec![Pat::Wildcard; arity];
                new_row.extend_from_slice(&row[1..]);
                Some(new_row)
            }
            _ => None,
        })
        .collect()
}

fn default_matrix(matrix: &Matrix) -> Matrix {
    matrix
        .iter()
        .filter_map(|row| match &row[0] {
            Pat::Wildcard => Some(row[1..].to_vec()),
            _ => None,
        })
        .collect()
}

fn is_useful(matrix: &Matrix, row: &[Pat], col_tys: &[Ty], ctx: &ExhaustivenessCtx) -> bool {
    if row.is_empty() {
        return matrix.is_empty();
    }
    match &row[0] {
        Pat::Ctor { name, args } => {
            let spec_matrix = specialize(matrix, name, args.len());
            let mut new_row = args.clone();
            new_row.extend_from_slice(&row[1..]);
            let mut new_tys = ctx.arg_types(&col_tys[0], name);
            new_tys.extend_from_slice(&col_tys[1..]);
            is_useful(&spec_matrix, &new_row, &new_tys, ctx)
        }
        Pat::Wildcard => match ctx.ctors_for(&col_tys[0]) {
            Ctors::Infinite => {
                let default = default_matrix(matrix);
                is_useful(&default, &row[1..], &col_tys[1..], ctx)
            }
            Ctors::Finite(sigs) => {
                let covered = column0_names(matrix);
                let any_missing = sigs.iter().any(|(name, _)| !covered.contains(name));
                if any_missing {
                    return true;
                }
                sigs.iter().any(|(name, arity)| {
                    let spec_matrix = specialize(matrix, name, *arity);
                    let mut new_row = vec![Pat::Wildcard; *arity];
                    new_row.extend_from_slice(&row[1..]);
                    let mut new_tys = ctx.arg_types(&col_tys[0], name);
                    new_tys.extend_from_slice(&col_tys[1..]);
                    is_useful(&spec_matrix, &new_row, &new_tys, ctx)
                })
            }
        },
    }
}

fn find_witness(matrix: &Matrix, col_tys: &[Ty], ctx: &ExhaustivenessCtx) -> Option<Vec<Pat>> {
    if col_tys.is_empty() {
        return if matrix.is_empty() { Some(Vec::new()) } else { None };
    }
    match ctx.ctors_for(&col_tys[0]) {
        Ctors::Infinite => {
            let default = default_matrix(matrix);
            find_witness(&default, &col_tys[1..], ctx).map(|mut w| {
                w.insert(0, Pat::Wildcard);
                w
            })
        }
        Ctors::Finite(sigs) => {
            let covered = column0_names(matrix);
            for (name, arity) in &sigs {
                if !covered.contains(name) {
                    let mut w = vec![Pat::Ctor { name: name.clone(), args: vec![Pat::Wildcard; *arity] }];
                    w.extend(col_tys[1..].iter().map(|_| Pat::Wildcard));
                    return Some(w);
                }
            }
            for (name, arity) in &sigs {
                let spec_matrix = specialize(matrix, name, *arity);
                let mut new_tys = ctx.arg_types(&col_tys[0], name);
                new_tys.extend_from_slice(&col_tys[1..]);
                if let Some(sub) = find_witness(&spec_matrix, &new_tys, ctx) {
                    let (ctor_args, rest) = sub.split_at(*arity);
                    let mut w = vec![Pat::Ctor { name: name.clone(), args: ctor_args.to_vec() }];
                    w.extend(rest.iter().cloned());
                    return Some(w);
                }
            }
            None
        }
    }
}

/// Returns a human-readable missing-pattern witness if the arms are not
/// exhaustive against `scrutinee_ty`, or `None` if they are.
pub fn check_exhaustiveness(arms: &[Pat], scrutinee_ty: &Ty, ctx: &ExhaustivenessCtx) -> Option<String> {
    let matrix: Matrix = arms.iter().map(|p| vec![p.clone()]).collect();
    find_witness(&matrix, std::slice::from_ref(scrutinee_ty), ctx).map(|w| w[0].display())
}

/// Returns the 0-based indices of arms that are unreachable given earlier
/// arms (§4.6 "overlapping/redundant clauses are warnings").
pub fn redundant_arms(arms: &[Pat], scrutinee_ty: &Ty, ctx: &ExhaustivenessCtx) -> Vec<usize> {
    let mut redundant = Vec::new();
    for i in 0..arms.len() {
        let prior: Matrix = arms[..i].iter().map(|p| vec![p.clone()]).collect();
        if !is_useful(&prior, std::slice::from_ref(&arms[i]), std::slice::from_ref(scrutinee_ty), ctx) {
            redundant.push(i);
        }
    }
    redundant
}
