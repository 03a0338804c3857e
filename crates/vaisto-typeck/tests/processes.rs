//! Integration tests for `process` declarations: spawn, capability-typed
//! sends, and tag-mismatch diagnostics.

use vaisto_typeck::error::TypeError;
use vaisto_typeck::TypeckResult;

fn check_source(src: &str) -> TypeckResult {
    let (module, parse_errors) = vaisto_syntax::parse(src);
    assert!(parse_errors.is_empty(), "unexpected parse errors: {parse_errors:?}");
    vaisto_typeck::check("Test", &module)
}

#[test]
fn process_spawn_and_safe_send_type_check() {
    let result = check_source(
        "(process counter 0 :inc [n] (! self (tuple :ok n)) :get [] self)\n(defn main [] (spawn counter 0))",
    );
    assert!(result.errors.is_empty(), "expected no errors, got: {:?}", result.errors);
}

#[test]
fn sending_an_undeclared_tag_is_rejected() {
    let result = check_source(
        "(process counter 0 :inc [n] state)\n(defn main [] (let [p (spawn counter 0)] (! p (tuple :reset 0))))",
    );
    assert!(result.errors.iter().any(|e| matches!(e, TypeError::InvalidMessageTag { .. })));
}

#[test]
fn unsafe_send_ignores_tag_mismatch() {
    let result = check_source(
        "(process counter 0 :inc [n] state)\n(defn main [] (let [p (spawn counter 0)] (!! p (tuple :reset 0))))",
    );
    assert!(result.errors.is_empty(), "expected no errors, got: {:?}", result.errors);
}

#[test]
fn spawn_with_mismatched_state_type_is_rejected() {
    let result = check_source("(process counter 0 :inc [n] state)\n(defn main [] (spawn counter \"zero\"))");
    assert!(result.errors.iter().any(|e| matches!(e, TypeError::SpawnStateMismatch { .. })));
}
