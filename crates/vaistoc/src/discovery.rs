//! File discovery and module graph construction for multi-file builds.
//!
//! Walks a project directory for `.va` files, derives a PascalCase module
//! name from each relative path, parses every file, and wires up a
//! dependency graph straight from each module's `import` declarations
//! (already extracted by the parser, unlike a CST-walking approach).
//! Unknown imports are treated as stdlib or typos and skipped; a
//! self-import or a dependency cycle is a hard error.

use std::path::{Component, Path, PathBuf};

use vaisto_common::module_graph::{self, CycleError, ModuleGraph, ModuleId};
use vaisto_syntax::ast::Module;
use vaisto_syntax::error::ParseError;

/// Convert a snake_case string to PascalCase.
pub fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Convert a relative file path to a PascalCase module name.
///
/// `main.va` at the project root has no module name (it's the entry
/// point, addressed as `Main` in the graph but not importable by name).
///
/// - `math/vector.va` -> `Some("Math.Vector")`
/// - `utils.va` -> `Some("Utils")`
/// - `main.va` -> `None`
pub fn path_to_module_name(relative_path: &Path) -> Option<String> {
    let stem = relative_path.file_stem()?.to_str()?;
    let parent = relative_path.parent();
    let parent_is_empty = match parent {
        None => true,
        Some(p) => p.as_os_str().is_empty() || p == Path::new("."),
    };

    if stem == "main" && parent_is_empty {
        return None;
    }

    let mut parts = Vec::new();
    if let Some(parent_path) = parent {
        for component in parent_path.components() {
            if let Component::Normal(os_str) = component {
                if let Some(s) = os_str.to_str() {
                    parts.push(to_pascal_case(s));
                }
            }
        }
    }
    parts.push(to_pascal_case(stem));
    Some(parts.join("."))
}

/// Recursively discover all `.va` files under a project root, relative
/// paths sorted alphabetically for deterministic compilation order. Hidden
/// directories and files are skipped.
pub fn discover_vaisto_files(project_root: &Path) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    discover_recursive(project_root, project_root, &mut files)
        .map_err(|e| format!("failed to walk directory '{}': {e}", project_root.display()))?;
    files.sort();
    Ok(files)
}

fn discover_recursive(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if name_str.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            discover_recursive(root, &path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("va") {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            files.push(relative);
        }
    }
    Ok(())
}

/// Everything gathered for a multi-file build, indexed by `ModuleId.0`.
pub struct ProjectData {
    pub graph: ModuleGraph,
    pub compilation_order: Vec<ModuleId>,
    pub module_sources: Vec<String>,
    pub module_asts: Vec<Module>,
    pub module_parse_errors: Vec<Vec<ParseError>>,
}

/// Discover, read, parse every module in a project and build its dependency
/// graph and compilation order.
///
/// Unknown imports (stdlib, typos) are silently skipped. A module importing
/// itself, or a cycle among modules, is reported as an error.
pub fn build_project(project_root: &Path) -> Result<ProjectData, String> {
    let files = discover_vaisto_files(project_root)?;
    let mut graph = ModuleGraph::new();
    let mut module_sources = Vec::new();
    let mut module_asts = Vec::new();
    let mut module_parse_errors = Vec::new();

    for relative_path in &files {
        let full_path = project_root.join(relative_path);
        let source = std::fs::read_to_string(&full_path)
            .map_err(|e| format!("failed to read '{}': {e}", full_path.display()))?;

        let is_entry = relative_path == Path::new("main.va");
        let name = if is_entry {
            "Main".to_string()
        } else {
            path_to_module_name(relative_path)
                .ok_or_else(|| format!("cannot determine module name for '{}'", relative_path.display()))?
        };

        let (module, errors) = vaisto_syntax::parse(&source);
        graph.add_module(name, relative_path.clone(), is_entry);
        module_sources.push(source);
        module_asts.push(module);
        module_parse_errors.push(errors);
    }

    for id_val in 0..graph.module_count() {
        let id = ModuleId(id_val as u32);
        let module_name = graph.get(id).name.clone();
        for import in &module_asts[id_val].imports {
            match graph.resolve(&import.module) {
                None => {}
                Some(dep_id) if dep_id == id => {
                    return Err(format!("module '{module_name}' cannot import itself"));
                }
                Some(dep_id) => graph.add_dependency(id, dep_id),
            }
        }
    }

    let compilation_order = module_graph::topological_sort(&graph)
        .map_err(|e: CycleError| format!("circular dependency: {e}"))?;

    Ok(ProjectData { graph, compilation_order, module_sources, module_asts, module_parse_errors })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_splits_on_underscore() {
        assert_eq!(to_pascal_case("linear_algebra"), "LinearAlgebra");
        assert_eq!(to_pascal_case("vector"), "Vector");
    }

    #[test]
    fn module_name_from_nested_path() {
        let name = path_to_module_name(Path::new("math/vector.va"));
        assert_eq!(name.as_deref(), Some("Math.Vector"));
    }

    #[test]
    fn main_at_root_has_no_module_name() {
        assert_eq!(path_to_module_name(Path::new("main.va")), None);
    }

    #[test]
    fn main_in_subdir_is_a_named_module() {
        let name = path_to_module_name(Path::new("sub/main.va"));
        assert_eq!(name.as_deref(), Some("Sub.Main"));
    }

    fn write_project(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (rel, contents) in files {
            let path = dir.path().join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, contents).unwrap();
        }
        dir
    }

    #[test]
    fn builds_project_in_dependency_order() {
        let dir = write_project(&[
            ("math/vector.va", "(ns Math.Vector)\n(defn len [v] 0)"),
            ("main.va", "(import Math.Vector)\n(defn main [] 0)"),
        ]);
        let project = build_project(dir.path()).unwrap();
        assert_eq!(project.graph.module_count(), 2);
        let order_names: Vec<_> = project.compilation_order.iter().map(|id| project.graph.get(*id).name.clone()).collect();
        assert_eq!(order_names, vec!["Math.Vector".to_string(), "Main".to_string()]);
    }

    #[test]
    fn unknown_import_is_skipped_silently() {
        let dir = write_project(&[("main.va", "(import Does.Not.Exist)\n(defn main [] 0)")]);
        let project = build_project(dir.path()).unwrap();
        assert_eq!(project.graph.module_count(), 1);
    }

    #[test]
    fn self_import_is_an_error() {
        let dir = write_project(&[("math.va", "(ns Math)\n(import Math)")]);
        let err = build_project(dir.path()).unwrap_err();
        assert!(err.contains("cannot import itself"));
    }

    #[test]
    fn cycle_is_an_error() {
        let dir = write_project(&[
            ("a.va", "(ns A)\n(import B)"),
            ("b.va", "(ns B)\n(import A)"),
        ]);
        let err = build_project(dir.path()).unwrap_err();
        assert!(err.contains("circular dependency"));
    }
}
