//! Module interface serialization (§4.8 "Separate compilation").
//!
//! A `ModuleInterface` is the subset of a module's elaborated signature that
//! downstream modules need to import it without re-elaborating its body:
//! function schemes, sum type and record shapes, and process signatures.
//! It's versioned and serialized deterministically (`BTreeMap`, not the
//! registries' `FxHashMap`, so two elaborations of the same source produce
//! byte-identical output) so a build cache can key on a content hash.
//!
//! A version mismatch is not a hard failure: the caller treats it as a
//! cache miss and re-elaborates from source. Only a payload that claims the
//! current version but fails to parse is a real [`TypeError::InterfaceCorrupt`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::process::ProcessRegistry;
use crate::env::TypeEnv;
use crate::infer::Registries;
use crate::ty::{Scheme, Ty};

/// Bumped whenever `ModuleInterface`'s shape changes in a way that would
/// make an old cached interface unsafe to trust without re-checking it.
pub const INTERFACE_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModuleInterface {
    pub version: u32,
    pub module_name: String,
    pub functions: BTreeMap<String, Scheme>,
    pub sums: BTreeMap<String, Vec<(String, Vec<Ty>)>>,
    pub records: BTreeMap<String, Vec<(String, Ty)>>,
    pub processes: BTreeMap<String, ProcessExport>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessExport {
    pub state_ty: Ty,
    pub tags: Vec<String>,
}

/// What loading a cached interface payload produced.
pub enum LoadOutcome {
    /// Same version, parsed cleanly -- use it in place of re-elaboration.
    Fresh(ModuleInterface),
    /// Different version -- not an error, just stale; the caller should
    /// re-elaborate the module from source and overwrite the cache entry.
    Stale { found: u32 },
}

/// Build the exported interface of a module from its final environment and
/// registries. Called once elaboration has produced no errors worth hiding
/// downstream consumers from (an interface built from a failed elaboration
/// would just propagate `Ty::Any` placeholders).
pub fn build_interface(module_name: &str, env: &TypeEnv, regs: &Registries) -> ModuleInterface {
    let functions = env
        .global_bindings()
        .map(|(name, scheme)| (name.to_string(), scheme.clone()))
        .collect();

    let sums = regs.sums.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    let records = regs.records.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

    let processes = regs
        .processes
        .names()
        .filter_map(|name| {
            regs.processes
                .get(name)
                .map(|sig| (name.to_string(), ProcessExport { state_ty: sig.state_ty.clone(), tags: sig.tags.clone() }))
        })
        .collect();

    ModuleInterface { version: INTERFACE_VERSION, module_name: module_name.to_string(), functions, sums, records, processes }
}

/// Serialize an interface to its on-disk JSON form. Pretty-printed and
/// key-sorted (via `BTreeMap`) so the output is stable across runs and
/// diffable in source control if a build cache is checked in.
pub fn serialize_interface(iface: &ModuleInterface) -> Result<String, TypeError> {
    serde_json::to_string_pretty(iface).map_err(|e| TypeError::Internal { message: format!("interface serialization failed: {e}") })
}

/// Load a cached interface payload. A version mismatch is reported as
/// `LoadOutcome::Stale`, not an error -- the loader couldn't have corrupted
/// data by virtue of being an old version, it's just out of date. A parse
/// failure on a payload that claims to be the current version, by contrast,
/// means the cache file itself is corrupt.
pub fn load_interface(data: &str) -> Result<LoadOutcome, TypeError> {
    let value: serde_json::Value = serde_json::from_str(data)
        .map_err(|e| TypeError::InterfaceCorrupt { module: "<unknown>".to_string(), reason: format!("not valid JSON: {e}") })?;

    let found_version = value
        .get("version")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| TypeError::InterfaceCorrupt { module: "<unknown>".to_string(), reason: "missing version field".to_string() })?
        as u32;

    if found_version != INTERFACE_VERSION {
        return Ok(LoadOutcome::Stale { found: found_version });
    }

    let iface: ModuleInterface = serde_json::from_value(value).map_err(|e| TypeError::InterfaceCorrupt {
        module: "<unknown>".to_string(),
        reason: format!("malformed interface payload: {e}"),
    })?;

    Ok(LoadOutcome::Fresh(iface))
}

/// Bind a loaded interface's exports into a fresh scope, as `import` does
/// for a dependency module. Processes are registered separately since
/// `spawn`/`send` resolve through the process registry, not the env.
pub fn import_into(iface: &ModuleInterface, env: &mut TypeEnv, processes: &mut ProcessRegistry) {
    use crate::process::ProcessSig;
    use vaisto_common::Loc;

    for (name, scheme) in &iface.functions {
        env.insert(name.clone(), scheme.clone());
    }
    for (name, proc) in &iface.processes {
        processes.register(ProcessSig {
            name: name.clone(),
            state_ty: proc.state_ty.clone(),
            tags: proc.tags.clone(),
            loc: Loc::at(0),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Scheme;

    fn sample() -> ModuleInterface {
        let mut functions = BTreeMap::new();
        functions.insert("add".to_string(), Scheme::mono(Ty::fun(vec![Ty::Int, Ty::Int], Ty::Int)));
        ModuleInterface {
            version: INTERFACE_VERSION,
            module_name: "Math".to_string(),
            functions,
            sums: BTreeMap::new(),
            records: BTreeMap::new(),
            processes: BTreeMap::new(),
        }
    }

    #[test]
    fn roundtrips_through_json() {
        let iface = sample();
        let json = serialize_interface(&iface).unwrap();
        match load_interface(&json).unwrap() {
            LoadOutcome::Fresh(loaded) => assert_eq!(loaded, iface),
            LoadOutcome::Stale { .. } => panic!("expected a fresh load"),
        }
    }

    #[test]
    fn serialization_is_deterministic() {
        let iface = sample();
        let a = serialize_interface(&iface).unwrap();
        let b = serialize_interface(&iface).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn version_mismatch_downgrades_to_stale() {
        let mut iface = sample();
        iface.version = INTERFACE_VERSION + 1;
        let json = serialize_interface(&iface).unwrap();
        match load_interface(&json).unwrap() {
            LoadOutcome::Stale { found } => assert_eq!(found, INTERFACE_VERSION + 1),
            LoadOutcome::Fresh(_) => panic!("expected stale"),
        }
    }

    #[test]
    fn garbage_payload_is_corrupt_not_stale() {
        let err = load_interface("not json at all").unwrap_err();
        assert!(matches!(err, TypeError::InterfaceCorrupt { .. }));
    }

    #[test]
    fn import_into_binds_functions_and_processes() {
        let mut iface = sample();
        iface.processes.insert(
            "counter".to_string(),
            ProcessExport { state_ty: Ty::Int, tags: vec!["inc".to_string()] },
        );
        let mut env = TypeEnv::new();
        let mut processes = ProcessRegistry::new();
        import_into(&iface, &mut env, &mut processes);
        assert!(env.lookup("add").is_some());
        assert!(processes.get("counter").is_some());
    }
}
