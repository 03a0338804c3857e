//! Process declarations and capability-typed PIDs (§4.9).
//!
//! A `process` declaration fixes a state type (from its init expression) and
//! a tag vocabulary, one entry per `:tag` arm. `spawn` looks up the
//! declaration and produces `Ty::PidOf(name, tags)`; the send operators
//! consult the same registry to check a message's tag against the target's
//! accepted set. This diverges from a payload-typed `Pid<M>`: the PID's type
//! names which *tags* it accepts, not a single message shape, since each arm
//! can carry a different payload.

use rustc_hash::FxHashMap;
use vaisto_common::Loc;

use crate::error::TypeError;
use crate::ty::Ty;

#[derive(Clone, Debug)]
pub struct ProcessSig {
    pub name: String,
    pub state_ty: Ty,
    pub tags: Vec<String>,
    pub loc: Loc,
}

#[derive(Default)]
pub struct ProcessRegistry {
    processes: FxHashMap<String, ProcessSig>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sig: ProcessSig) {
        self.processes.insert(sig.name.clone(), sig);
    }

    pub fn get(&self, name: &str) -> Option<&ProcessSig> {
        self.processes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.processes.keys().map(|s| s.as_str())
    }

    /// The type `spawn` produces for a declared process.
    pub fn pid_ty(&self, name: &str) -> Option<Ty> {
        self.processes.get(name).map(|sig| Ty::PidOf(sig.name.clone(), sig.tags.clone()))
    }
}

/// Checks a safe send's tag against the target's accepted tags. An untyped
/// `Pid`, an unresolved variable, or `Any` all pass (escape hatches); a
/// `PidOf` enforces tag membership; any other type is not a PID at all.
pub fn check_safe_send(pid_ty: &Ty, tag: &str, loc: Loc) -> Result<(), TypeError> {
    match pid_ty {
        Ty::Pid | Ty::Any | Ty::Var(_) => Ok(()),
        Ty::PidOf(process, tags) => {
            if tags.iter().any(|t| t == tag) {
                Ok(())
            } else {
                Err(TypeError::InvalidMessageTag {
                    process: process.clone(),
                    tag: tag.to_string(),
                    accepted: tags.clone(),
                    loc,
                })
            }
        }
        other => Err(TypeError::SendToNonPid { found: other.clone(), loc }),
    }
}

/// The unsafe send operator's weak check (§4.4): skips tag validation
/// entirely, only rejecting targets that are obviously not a PID at all.
pub fn check_unsafe_send(pid_ty: &Ty, loc: Loc) -> Result<(), TypeError> {
    if pid_ty.obviously_non_pid() {
        Err(TypeError::SendToNonPid { found: pid_ty.clone(), loc })
    } else {
        Ok(())
    }
}

/// Checks a `spawn`'s init-expression type against the process's declared
/// state type. Exact equality is required here; width/row subtyping has
/// already resolved by the time this runs.
pub fn check_spawn_state(sig: &ProcessSig, init_ty: &Ty, loc: Loc) -> Result<(), TypeError> {
    if &sig.state_ty == init_ty || matches!(init_ty, Ty::Any) {
        Ok(())
    } else {
        Err(TypeError::SpawnStateMismatch {
            process: sig.name.clone(),
            expected: sig.state_ty.clone(),
            found: init_ty.clone(),
            loc,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> ProcessSig {
        ProcessSig { name: "counter".into(), state_ty: Ty::Int, tags: vec!["inc".into(), "get".into()], loc: Loc::new(0, 1) }
    }

    #[test]
    fn pid_ty_carries_process_name_and_tags() {
        let mut reg = ProcessRegistry::new();
        reg.register(counter());
        let ty = reg.pid_ty("counter").unwrap();
        assert_eq!(ty, Ty::PidOf("counter".into(), vec!["inc".into(), "get".into()]));
    }

    #[test]
    fn safe_send_accepts_declared_tag() {
        let pid = Ty::PidOf("counter".into(), vec!["inc".into(), "get".into()]);
        assert!(check_safe_send(&pid, "inc", Loc::new(0, 1)).is_ok());
    }

    #[test]
    fn safe_send_rejects_unknown_tag() {
        let pid = Ty::PidOf("counter".into(), vec!["inc".into()]);
        let err = check_safe_send(&pid, "reset", Loc::new(0, 1)).unwrap_err();
        assert!(matches!(err, TypeError::InvalidMessageTag { .. }));
    }

    #[test]
    fn safe_send_to_untyped_pid_always_ok() {
        assert!(check_safe_send(&Ty::Pid, "anything", Loc::new(0, 1)).is_ok());
    }

    #[test]
    fn safe_send_to_non_pid_is_rejected() {
        let err = check_safe_send(&Ty::Int, "inc", Loc::new(0, 1)).unwrap_err();
        assert!(matches!(err, TypeError::SendToNonPid { .. }));
    }

    #[test]
    fn unsafe_send_ignores_tag_but_rejects_obvious_non_pid() {
        let pid = Ty::PidOf("counter".into(), vec!["inc".into()]);
        assert!(check_unsafe_send(&pid, Loc::new(0, 1)).is_ok());
        assert!(check_unsafe_send(&Ty::String, Loc::new(0, 1)).is_err());
    }

    #[test]
    fn spawn_state_mismatch_is_reported() {
        let sig = counter();
        assert!(check_spawn_state(&sig, &Ty::Int, Loc::new(0, 1)).is_ok());
        let err = check_spawn_state(&sig, &Ty::String, Loc::new(0, 1)).unwrap_err();
        assert!(matches!(err, TypeError::SpawnStateMismatch { .. }));
    }
}
