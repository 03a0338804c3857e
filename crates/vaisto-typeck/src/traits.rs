//! Class table and instance table (§3 "Environment", §4.5).
//!
//! `TraitRegistry` only stores bookkeeping: which classes and instances
//! exist, their signatures, their constraints, and (for user-written
//! instances) their method bodies. The actual resolution algorithm --
//! matching a call's argument type against this table, handling
//! constrained instances and default methods -- lives in `infer.rs`, since
//! it needs the `InferCtx` to substitute and re-elaborate.

use rustc_hash::FxHashMap;
use vaisto_common::Loc;
use vaisto_syntax::ast::Expr;

use crate::error::TypeError;

#[derive(Clone, Debug)]
pub struct MethodSig {
    pub name: String,
    pub arity: usize,
    pub has_default: bool,
}

#[derive(Clone, Debug)]
pub struct ClassDef {
    pub name: String,
    pub tyvar: String,
    pub methods: Vec<MethodSig>,
}

impl ClassDef {
    pub fn method(&self, name: &str) -> Option<&MethodSig> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A class default method body, elaborated once per class at admission
/// (§9 "Default method bodies"), referencing the class tyvar.
#[derive(Clone, Debug)]
pub struct DefaultMethod {
    pub params: Vec<String>,
    pub body: Expr,
}

/// What a derived (vs. user-written) instance should do at resolution time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Derived {
    Eq,
    Show,
}

#[derive(Clone, Debug)]
pub struct InstanceMethodBody {
    pub params: Vec<String>,
    pub body: Expr,
}

#[derive(Clone, Debug)]
pub struct RegisteredInstance {
    pub class: String,
    pub head: String,
    /// Type-variable arguments on the head, e.g. `(Pair a b)` -> `["a", "b"]`.
    pub head_args: Vec<String>,
    /// Constraints from a `where` clause: `(class_name, head_tyvar)`.
    pub constraints: Vec<(String, String)>,
    pub methods: FxHashMap<String, InstanceMethodBody>,
    pub derived: Option<Derived>,
    pub loc: Loc,
}

#[derive(Default)]
pub struct TraitRegistry {
    classes: FxHashMap<String, ClassDef>,
    defaults: FxHashMap<(String, String), DefaultMethod>,
    instances: FxHashMap<(String, String), RegisteredInstance>,
}

impl TraitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_class(&mut self, def: ClassDef) {
        self.classes.insert(def.name.clone(), def);
    }

    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(|s| s.as_str())
    }

    /// The class (if any) that declares a method with this name -- used to
    /// decide whether a call site is a typeclass method dispatch.
    pub fn class_for_method(&self, method: &str) -> Option<&ClassDef> {
        self.classes.values().find(|c| c.method(method).is_some())
    }

    pub fn register_default(&mut self, class: &str, method: &str, default: DefaultMethod) {
        self.defaults.insert((class.to_string(), method.to_string()), default);
    }

    pub fn default_method(&self, class: &str, method: &str) -> Option<&DefaultMethod> {
        self.defaults.get(&(class.to_string(), method.to_string()))
    }

    /// Register an instance, rejecting a duplicate `(class, head)` pair
    /// (§4.5 implies uniqueness; overlapping instances would make
    /// resolution ambiguous).
    pub fn register_instance(&mut self, instance: RegisteredInstance) -> Result<(), TypeError> {
        let key = (instance.class.clone(), instance.head.clone());
        if self.instances.contains_key(&key) {
            return Err(TypeError::DuplicateInstance {
                class: instance.class,
                head: instance.head,
                loc: instance.loc,
            });
        }
        self.instances.insert(key, instance);
        Ok(())
    }

    pub fn instance(&self, class: &str, head: &str) -> Option<&RegisteredInstance> {
        self.instances.get(&(class.to_string(), head.to_string()))
    }

    pub fn has_instance(&self, class: &str, head: &str) -> bool {
        self.instances.contains_key(&(class.to_string(), head.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaisto_common::Loc;

    fn eq_class() -> ClassDef {
        ClassDef {
            name: "Eq".into(),
            tyvar: "a".into(),
            methods: vec![
                MethodSig { name: "eq".into(), arity: 2, has_default: false },
                MethodSig { name: "neq".into(), arity: 2, has_default: true },
            ],
        }
    }

    #[test]
    fn register_and_lookup_class() {
        let mut reg = TraitRegistry::new();
        reg.register_class(eq_class());
        assert!(reg.class("Eq").is_some());
        assert!(reg.class("Eq").unwrap().method("neq").unwrap().has_default);
    }

    #[test]
    fn duplicate_instance_is_rejected() {
        let mut reg = TraitRegistry::new();
        let inst = RegisteredInstance {
            class: "Eq".into(),
            head: "Color".into(),
            head_args: vec![],
            constraints: vec![],
            methods: FxHashMap::default(),
            derived: Some(Derived::Eq),
            loc: Loc::new(0, 1),
        };
        reg.register_instance(inst.clone()).unwrap();
        let err = reg.register_instance(inst).unwrap_err();
        assert!(matches!(err, TypeError::DuplicateInstance { .. }));
    }

    #[test]
    fn constrained_instance_keeps_constraints() {
        let mut reg = TraitRegistry::new();
        let inst = RegisteredInstance {
            class: "Show".into(),
            head: "Maybe".into(),
            head_args: vec!["a".into()],
            constraints: vec![("Show".into(), "a".into())],
            methods: FxHashMap::default(),
            derived: None,
            loc: Loc::new(0, 1),
        };
        reg.register_instance(inst).unwrap();
        let found = reg.instance("Show", "Maybe").unwrap();
        assert_eq!(found.constraints, vec![("Show".to_string(), "a".to_string())]);
    }
}
