//! Lexer, reader and lowering pass for the vaisto surface syntax.
//!
//! Pipeline: [`lexer::tokenize`] -> [`reader::read_all`] -> [`lower::Lowerer`].
//! Each stage collects its own errors and keeps going, so a single malformed
//! form never prevents the rest of a module from being parsed.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod lower;
pub mod reader;

use ast::Module;
use error::ParseError;

/// Parse a complete source file into a [`Module`], collecting all errors
/// encountered across the lexer, reader and lowering stages.
pub fn parse(source: &str) -> (Module, Vec<ParseError>) {
    let (tokens, lex_errors) = lexer::tokenize(source);
    let (forms, read_errors) = reader::read_all(&tokens);

    let mut lowerer = lower::Lowerer::new();
    let module = lowerer.lower_module(&forms);
    let lower_errors = lowerer.into_errors();

    let mut errors = lex_errors;
    errors.extend(read_errors);
    errors.extend(lower_errors);
    (module, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::{Expr, Item, Literal, Pattern};

    #[test]
    fn parses_ns_and_import() {
        let (module, errors) = parse("(ns my.mod)\n(import other.mod :as o)");
        assert!(errors.is_empty());
        assert_eq!(module.name.as_deref(), Some("my.mod"));
        assert_eq!(module.imports.len(), 1);
        assert_eq!(module.imports[0].module, "other.mod");
        assert_eq!(module.imports[0].alias.as_deref(), Some("o"));
    }

    #[test]
    fn parses_fn_def_with_if() {
        let (module, errors) = parse("(defn abs [x] (if (< x 0) (- x) x))");
        assert!(errors.is_empty());
        assert_eq!(module.items.len(), 1);
        match &module.items[0] {
            Item::Fn(def) => {
                assert_eq!(def.name, "abs");
                assert_eq!(def.params, vec!["x".to_string()]);
                assert!(matches!(def.body, Expr::If { .. }));
            }
            _ => panic!("expected a fn item"),
        }
    }

    #[test]
    fn parses_sum_type_with_deriving() {
        let (module, errors) = parse("(deftype Option (Some v) (None) (deriving [Eq Show]))");
        assert!(errors.is_empty());
        match &module.items[0] {
            Item::SumType(def) => {
                assert_eq!(def.name, "Option");
                assert_eq!(def.variants.len(), 2);
                assert_eq!(def.variants[0].ctor, "Some");
                assert_eq!(def.deriving, vec!["Eq".to_string(), "Show".to_string()]);
            }
            _ => panic!("expected a sum type item"),
        }
    }

    #[test]
    fn parses_match_with_cons_pattern() {
        let (module, errors) = parse("(defn sum [xs] (match xs [[h | t] (+ h (sum t))] [[] 0]))");
        assert!(errors.is_empty());
        match &module.items[0] {
            Item::Fn(def) => match &def.body {
                Expr::Match { arms, .. } => {
                    assert_eq!(arms.len(), 2);
                    assert!(matches!(arms[0].pattern, Pattern::Cons { .. }));
                    assert!(matches!(arms[1].pattern, Pattern::List(ref v, _) if v.is_empty()));
                }
                _ => panic!("expected a match expression"),
            },
            _ => panic!("expected a fn item"),
        }
    }

    #[test]
    fn parses_process_with_tagged_arms() {
        let (module, errors) =
            parse("(process counter 0 :inc [n] (! self (tuple :ok n)) :get [] self)");
        assert!(errors.is_empty());
        match &module.items[0] {
            Item::Process(def) => {
                assert_eq!(def.name, "counter");
                assert_eq!(def.arms.len(), 2);
                assert_eq!(def.arms[0].tag, "inc");
                assert_eq!(def.arms[0].params, vec!["n".to_string()]);
            }
            _ => panic!("expected a process item"),
        }
    }

    #[test]
    fn parses_instance_with_constraints() {
        let src = "(instance Eq (Pair a b) (where [(Eq a) (Eq b)]) (eq [x y] true))";
        let (module, errors) = parse(src);
        assert!(errors.is_empty());
        match &module.items[0] {
            Item::Instance(def) => {
                assert_eq!(def.class, "Eq");
                assert_eq!(def.head.name, "Pair");
                assert_eq!(def.head.args, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(def.constraints.len(), 2);
                assert_eq!(def.methods.len(), 1);
            }
            _ => panic!("expected an instance item"),
        }
    }

    #[test]
    fn malformed_if_reports_error_and_recovers() {
        let (_, errors) = parse("(if true 1)");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn bare_top_level_expr_becomes_top_expr() {
        let (module, errors) = parse("(+ 1 2)");
        assert!(errors.is_empty());
        assert!(matches!(module.top_expr, Some(Expr::Call { .. })));
    }

    #[test]
    fn field_access_lowers_field_name() {
        let (module, errors) = parse("(. point :x)");
        assert!(errors.is_empty());
        match module.top_expr {
            Some(Expr::FieldAccess { field, .. }) => assert_eq!(field, "x"),
            _ => panic!("expected a field access"),
        }
    }

    #[test]
    fn literal_atom_lowers_to_atom_expr() {
        let (module, errors) = parse(":yes");
        assert!(errors.is_empty());
        assert!(matches!(module.top_expr, Some(Expr::Atom(ref tag, _)) if tag == "yes"));
    }

    #[test]
    fn int_literal_roundtrips() {
        let (module, errors) = parse("42");
        assert!(errors.is_empty());
        assert!(matches!(module.top_expr, Some(Expr::Lit(Literal::Int(42), _))));
    }
}
