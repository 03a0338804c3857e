//! `vaisto.toml` project manifest parsing.
//!
//! Deliberately thin compared to a full package manager's manifest: a
//! package name, an entry file, and a table of module-name -> local path
//! dependencies. No git dependencies, no version resolution -- a project
//! is just the set of local paths listed here, fed straight into
//! [`crate::discovery`]'s module graph.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub package: Package,
    #[serde(default)]
    pub dependencies: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default = "default_entry")]
    pub entry: PathBuf,
}

fn default_entry() -> PathBuf {
    PathBuf::from("src/main.va")
}

#[derive(Debug)]
pub struct ManifestError(String);

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ManifestError {}

impl Manifest {
    pub fn from_str(contents: &str) -> Result<Self, ManifestError> {
        toml::from_str(contents).map_err(|e| ManifestError(format!("invalid vaisto.toml: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError(format!("failed to read '{}': {e}", path.display())))?;
        Self::from_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_manifest() {
        let toml = r#"
            [package]
            name = "my-app"
            entry = "src/main.va"

            [dependencies]
            Math = "../math-lib"
        "#;
        let manifest = Manifest::from_str(toml).unwrap();
        assert_eq!(manifest.package.name, "my-app");
        assert_eq!(manifest.package.entry, PathBuf::from("src/main.va"));
        assert_eq!(manifest.dependencies.get("Math"), Some(&PathBuf::from("../math-lib")));
    }

    #[test]
    fn parse_minimal_manifest_defaults_entry() {
        let toml = r#"
            [package]
            name = "tiny"
        "#;
        let manifest = Manifest::from_str(toml).unwrap();
        assert_eq!(manifest.package.entry, PathBuf::from("src/main.va"));
        assert!(manifest.dependencies.is_empty());
    }

    #[test]
    fn reject_missing_package_section() {
        assert!(Manifest::from_str("name = \"x\"").is_err());
    }

    #[test]
    fn reject_missing_name() {
        let toml = r#"
            [package]
            entry = "src/main.va"
        "#;
        assert!(Manifest::from_str(toml).is_err());
    }
}
