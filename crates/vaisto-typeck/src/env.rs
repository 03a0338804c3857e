//! Type environment with a scope stack.
//!
//! Lookup searches from the innermost scope outward; `all_names` flattens
//! every bound name across the whole stack (locals first) for the
//! "did you mean?" lexicon (§7, SPEC_FULL §B.1).

use rustc_hash::FxHashMap;

use crate::ty::Scheme;

pub struct TypeEnv {
    scopes: Vec<FxHashMap<String, Scheme>>,
}

impl TypeEnv {
    pub fn new() -> Self {
        TypeEnv { scopes: vec![FxHashMap::default()] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }

    pub fn insert(&mut self, name: String, scheme: Scheme) {
        self.scopes.last_mut().expect("scope stack is never empty").insert(name, scheme);
    }

    pub fn lookup(&self, name: &str) -> Option<&Scheme> {
        for scope in self.scopes.iter().rev() {
            if let Some(scheme) = scope.get(name) {
                return Some(scheme);
            }
        }
        None
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Every name currently visible, innermost scope first -- the lexicon
    /// `suggest` is run against when a reference fails to resolve.
    pub fn all_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for scope in self.scopes.iter().rev() {
            names.extend(scope.keys().map(|s| s.as_str()));
        }
        names
    }

    /// The outermost (module-level) scope's bindings, for building an
    /// exported module interface once elaboration has finished.
    pub fn global_bindings(&self) -> impl Iterator<Item = (&str, &Scheme)> {
        self.scopes[0].iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}
