//! Go-to-definition: resolve an identifier to the declaration that binds it.
//!
//! Only top-level declarations are indexed -- function, sum type, record,
//! class and process names. A name bound by a local `let` or `fn` param has
//! no cross-file meaning and isn't a useful definition target anyway.

use vaisto_common::Loc;
use vaisto_syntax::ast::{Item, Module};

/// Find the declaration location for `name` among a module's top-level items.
pub fn find_definition(module: &Module, name: &str) -> Option<Loc> {
    for item in &module.items {
        let found = match item {
            Item::Fn(def) if def.name == name => Some(def.loc),
            Item::SumType(def) if def.name == name => Some(def.loc),
            Item::SumType(def) => def.variants.iter().find(|v| v.ctor == name).map(|v| v.loc),
            Item::Record(def) if def.name == name => Some(def.loc),
            Item::Class(def) if def.name == name => Some(def.loc),
            Item::Process(def) if def.name == name => Some(def.loc),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_top_level_function() {
        let (module, errors) = vaisto_syntax::parse("(defn double [x] (* x 2))");
        assert!(errors.is_empty());
        let loc = find_definition(&module, "double").unwrap();
        assert_eq!(loc.start, 0);
    }

    #[test]
    fn finds_sum_type_variant() {
        let (module, errors) = vaisto_syntax::parse("(deftype Option (Some v) (None))");
        assert!(errors.is_empty());
        assert!(find_definition(&module, "Some").is_some());
        assert!(find_definition(&module, "Option").is_some());
    }

    #[test]
    fn unknown_name_has_no_definition() {
        let (module, errors) = vaisto_syntax::parse("(defn double [x] (* x 2))");
        assert!(errors.is_empty());
        assert!(find_definition(&module, "nope").is_none());
    }
}
