//! Integration tests for record (`defrecord`) type checking: construction,
//! field access, and derived instances.

use vaisto_typeck::TypeckResult;

fn check_source(src: &str) -> TypeckResult {
    let (module, parse_errors) = vaisto_syntax::parse(src);
    assert!(parse_errors.is_empty(), "unexpected parse errors: {parse_errors:?}");
    vaisto_typeck::check("Test", &module)
}

#[test]
fn record_construction_and_field_access_type_check() {
    let result = check_source("(defrecord Point [x y] (deriving [Eq]))\n(defn origin [] (. (Point 0 0) :x))");
    assert!(result.errors.is_empty(), "expected no errors, got: {:?}", result.errors);
}

#[test]
fn record_field_access_on_unknown_field_is_an_error() {
    let result = check_source("(defrecord Point [x y])\n(defn bad [] (. (Point 0 0) :z))");
    assert!(!result.errors.is_empty());
}

#[test]
fn record_constructor_arity_mismatch_is_an_error() {
    let result = check_source("(defrecord Point [x y])\n(defn bad [] (Point 0))");
    assert!(!result.errors.is_empty());
}
