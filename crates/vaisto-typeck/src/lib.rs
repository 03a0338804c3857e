//! Type checker: Hindley-Milner inference with extensions.
//!
//! Elaborates a parsed module into inferred types and diagnostics. Builds
//! on `vaisto-syntax`'s AST to assign types to every expression, catching:
//!
//! - Hindley-Milner inference with let-polymorphism
//! - `ena`-based unification with occurs checking and level-based generalization
//! - Algebraic data types with Maranget-style exhaustiveness checking
//! - Type classes with defaults, constrained instances, and derived `Eq`/`Show`
//! - Row-polymorphic record field access
//! - Capability-typed process identifiers for message passing
//!
//! # Architecture
//!
//! - [`ty`]: core type representation (`Ty`, `TyVar`, `RowTail`, `Scheme`)
//! - [`unify`]: union-find unification, occurs check, generalization
//! - [`env`]: lexically scoped type environment
//! - [`builtins`]: primitive types and the `Eq`/`Show` classes
//! - [`traits`]: class and instance tables
//! - [`process`]: process signatures and capability-typed PIDs
//! - [`patterns`]: match exhaustiveness and redundancy
//! - [`error`]: typed diagnostics with provenance
//! - [`diagnostics`]: ariadne rendering of [`error::TypeError`]
//! - [`iface`]: versioned module interface serialization
//! - [`infer`]: the elaborator tying everything together

pub mod builtins;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod iface;
pub mod infer;
pub mod patterns;
pub mod process;
pub mod traits;
pub mod ty;
pub mod unify;

pub use crate::error::TypeError;
pub use crate::iface::ModuleInterface;
pub use crate::infer::{elaborate_module, Registries, TypeckResult};
pub use crate::ty::{Scheme, Ty};

/// Type-checks a parsed module. The main entry point for downstream
/// consumers (the CLI driver, the LSP server).
pub fn check(module_name: &str, module: &vaisto_syntax::ast::Module) -> TypeckResult {
    infer::elaborate_module(module_name, module)
}
