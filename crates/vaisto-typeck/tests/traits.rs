//! Integration tests for type classes: class declarations, constrained
//! instances, default methods, and missing-method diagnostics.

use vaisto_typeck::error::TypeError;
use vaisto_typeck::TypeckResult;

fn check_source(src: &str) -> TypeckResult {
    let (module, parse_errors) = vaisto_syntax::parse(src);
    assert!(parse_errors.is_empty(), "unexpected parse errors: {parse_errors:?}");
    vaisto_typeck::check("Test", &module)
}

#[test]
fn class_instance_with_constraints_type_checks() {
    let result = check_source(
        "(defclass Eq [a] (eq [x y]))\n(defrecord Pair [l r])\n(instance Eq (Pair a b) (where [(Eq a) (Eq b)]) (eq [x y] true))",
    );
    assert!(result.errors.is_empty(), "expected no errors, got: {:?}", result.errors);
}

#[test]
fn instance_missing_a_required_method_is_an_error() {
    let result = check_source("(defclass Eq [a] (eq [x y]))\n(defrecord Pair [l r])\n(instance Eq (Pair a b))");
    assert!(result.errors.iter().any(|e| matches!(e, TypeError::MissingMethod { .. })));
}

#[test]
fn instance_for_unknown_class_is_an_error() {
    let result = check_source("(defrecord Pair [l r])\n(instance Ord (Pair a b) (cmp [x y] 0))");
    assert!(result.errors.iter().any(|e| matches!(e, TypeError::UnknownClass { .. })));
}

#[test]
fn class_method_default_body_type_checks_on_its_own() {
    let result = check_source("(defclass Describable [a] (describe [x] Any \"thing\"))");
    assert!(result.errors.is_empty(), "expected no errors, got: {:?}", result.errors);
}
