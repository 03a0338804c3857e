//! Built-in type names and compiler-known classes.
//!
//! Registers the primitive type names so they can appear as annotations
//! (not that this language has annotations today, but instance heads and
//! diagnostics reference them by name), and seeds the trait registry with
//! `Eq` and `Show`, the only two classes the deriving mechanism (§4.5)
//! knows how to synthesize.

use crate::env::TypeEnv;
use crate::traits::{ClassDef, MethodSig, TraitRegistry};
use crate::ty::{Scheme, Ty};

pub fn register_builtins(env: &mut TypeEnv, classes: &mut TraitRegistry) {
    env.insert("Int".into(), Scheme::mono(Ty::Int));
    env.insert("Float".into(), Scheme::mono(Ty::Float));
    env.insert("Bool".into(), Scheme::mono(Ty::Bool));
    env.insert("String".into(), Scheme::mono(Ty::String));
    env.insert("Unit".into(), Scheme::mono(Ty::Unit));
    env.insert("Atom".into(), Scheme::mono(Ty::Atom));
    env.insert("Pid".into(), Scheme::mono(Ty::Pid));

    classes.register_class(ClassDef {
        name: "Eq".into(),
        tyvar: "a".into(),
        methods: vec![
            MethodSig { name: "eq".into(), arity: 2, has_default: false },
            MethodSig { name: "neq".into(), arity: 2, has_default: true },
        ],
    });

    classes.register_class(ClassDef {
        name: "Show".into(),
        tyvar: "a".into(),
        methods: vec![MethodSig { name: "show".into(), arity: 1, has_default: false }],
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_primitive_names_and_classes() {
        let mut env = TypeEnv::new();
        let mut classes = TraitRegistry::new();
        register_builtins(&mut env, &mut classes);

        assert_eq!(env.lookup("Int").unwrap().ty, Ty::Int);
        assert!(classes.class("Eq").is_some());
        assert!(classes.class("Show").is_some());
    }
}
