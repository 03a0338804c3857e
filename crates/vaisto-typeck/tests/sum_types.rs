//! Integration tests for algebraic sum types (`deftype`): constructors,
//! match exhaustiveness, redundant-arm warnings, and deriving.

use vaisto_typeck::error::TypeError;
use vaisto_typeck::TypeckResult;

fn check_source(src: &str) -> TypeckResult {
    let (module, parse_errors) = vaisto_syntax::parse(src);
    assert!(parse_errors.is_empty(), "unexpected parse errors: {parse_errors:?}");
    vaisto_typeck::check("Test", &module)
}

#[test]
fn sum_type_nullary_and_fielded_constructors() {
    let result = check_source(
        "(deftype Shape (Circle r) (Point) (deriving [Eq Show]))\n(defn area [s] (match s [(Circle r) r] [(Point) 0]))",
    );
    assert!(result.errors.is_empty(), "expected no errors, got: {:?}", result.errors);
}

#[test]
fn deriving_show_on_fielded_variant_is_rejected() {
    let result = check_source("(deftype Shape (Circle r) (deriving [Show]))");
    assert!(result.errors.iter().any(|e| matches!(e, TypeError::DerivingShowOnFieldedType { .. })));
}

#[test]
fn nonexhaustive_match_is_reported() {
    let result = check_source(
        "(deftype Color (Red) (Green) (Blue))\n(defn name [c] (match c [(Red) 0] [(Green) 1]))",
    );
    assert!(result.errors.iter().any(|e| matches!(e, TypeError::NonExhaustiveMatch { .. })));
}

#[test]
fn exhaustive_match_over_every_variant_is_clean() {
    let result = check_source(
        "(deftype Color (Red) (Green) (Blue))\n(defn name [c] (match c [(Red) 0] [(Green) 1] [(Blue) 2]))",
    );
    assert!(result.errors.is_empty(), "expected no errors, got: {:?}", result.errors);
}

#[test]
fn redundant_match_arm_is_a_warning_not_an_error() {
    let result = check_source("(defn pick [x] (match x [_ 1] [_ 2]))");
    assert!(result.errors.is_empty());
    assert!(result.warnings.iter().any(|w| matches!(w, TypeError::RedundantMatchArm { .. })));
}

#[test]
fn unknown_constructor_in_a_pattern_is_an_error() {
    let result = check_source("(deftype Color (Red) (Green))\n(defn name [c] (match c [(Purple) 0] [_ 1]))");
    assert!(!result.errors.is_empty());
}
