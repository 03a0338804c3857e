//! Integration tests for module interface extraction and round-tripping
//! through its serialized form, exercised via real elaboration rather
//! than hand-built fixtures.

use vaisto_typeck::env::TypeEnv;
use vaisto_typeck::iface::{import_into, load_interface, serialize_interface, LoadOutcome};
use vaisto_typeck::process::ProcessRegistry;

fn check_source(name: &str, src: &str) -> vaisto_typeck::TypeckResult {
    let (module, parse_errors) = vaisto_syntax::parse(src);
    assert!(parse_errors.is_empty(), "unexpected parse errors: {parse_errors:?}");
    vaisto_typeck::check(name, &module)
}

#[test]
fn module_interface_is_built_only_on_success() {
    let ok = check_source("Good", "(defn id [x] x)");
    assert!(ok.interface.is_some());

    let bad = check_source("Bad", "(defn boom [] (lenght 1))");
    assert!(bad.interface.is_none());
}

#[test]
fn module_interface_round_trips_and_imports_cleanly() {
    let result = check_source(
        "Counter",
        "(process counter 0 :inc [n] state)\n(defn start [] (spawn counter 0))",
    );
    let iface = result.interface.expect("clean module should export an interface");

    let serialized = serialize_interface(&iface).expect("serialization should succeed");
    let outcome = load_interface(&serialized).expect("same-version payload should parse");

    let LoadOutcome::Fresh(loaded) = outcome else {
        panic!("expected a fresh interface, got a stale-version signal");
    };
    assert_eq!(loaded.module_name, "Counter");
    assert!(loaded.functions.contains_key("start"));
    assert!(loaded.processes.contains_key("counter"));

    let mut env = TypeEnv::new();
    let mut processes = ProcessRegistry::new();
    import_into(&loaded, &mut env, &mut processes);
    assert!(env.lookup("start").is_some());
    assert!(processes.get("counter").is_some());
}
