//! End-to-end diagnostic rendering: a full source string goes through
//! parsing, elaboration, and the ariadne-backed renderer.

use vaisto_typeck::diagnostics::render_diagnostic;
use vaisto_typeck::TypeckResult;

fn check_source(src: &str) -> TypeckResult {
    let (module, parse_errors) = vaisto_syntax::parse(src);
    assert!(parse_errors.is_empty(), "unexpected parse errors: {parse_errors:?}");
    vaisto_typeck::check("Test", &module)
}

#[test]
fn diagnostic_rendering_includes_code_and_hint() {
    let src = "(defn main [] (lenght [1 2 3]))";
    let result = check_source(src);
    assert!(!result.errors.is_empty(), "expected at least one error");
    let rendered = render_diagnostic(&result.errors[0], src, "test.va");
    assert!(rendered.contains("E101"));
}

#[test]
fn nonexhaustive_match_diagnostic_names_the_missing_variants() {
    let src = "(deftype Color (Red) (Green) (Blue))\n(defn name [c] (match c [(Red) 0] [(Green) 1]))";
    let result = check_source(src);
    assert!(!result.errors.is_empty(), "expected at least one error");
    let rendered = render_diagnostic(&result.errors[0], src, "test.va");
    assert!(rendered.contains("E010"));
}

#[test]
fn redundant_arm_warning_is_distinct_from_an_error() {
    let src = "(defn pick [x] (match x [_ 1] [_ 2]))";
    let result = check_source(src);
    assert!(result.errors.is_empty());
    assert!(!result.warnings.is_empty());
    let rendered = render_diagnostic(&result.warnings[0], src, "test.va");
    assert!(rendered.contains("W001"));
}
