//! `vaistoc init` -- scaffold a new project. No templates, no prompts:
//! one manifest and one entry file, enough to run `vaistoc build` on.

use std::path::Path;

pub fn scaffold(name: &str, dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir.join("src"))?;

    let manifest = format!(
        "[package]\nname = \"{name}\"\nentry = \"src/main.va\"\n\n[dependencies]\n"
    );
    std::fs::write(dir.join("vaisto.toml"), manifest)?;

    let main_src = "(defn main [] 0)\n";
    std::fs::write(dir.join("src/main.va"), main_src)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaffold_writes_manifest_and_entry() {
        let dir = tempfile::tempdir().unwrap();
        scaffold("demo", dir.path()).unwrap();
        assert!(dir.path().join("vaisto.toml").exists());
        assert!(dir.path().join("src/main.va").exists());
        let manifest = std::fs::read_to_string(dir.path().join("vaisto.toml")).unwrap();
        assert!(manifest.contains("name = \"demo\""));
    }
}
