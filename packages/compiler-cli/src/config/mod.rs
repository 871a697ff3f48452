//! Project configuration
//!
//! `poirot.json` holds a `CompilerConfig` in camelCase JSON. An explicit
//! `--config` path must exist; the default file is optional.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

use poirot_compiler::CompilerConfig;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "poirot.json";

pub fn load(path: &Path) -> anyhow::Result<CompilerConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: CompilerConfig = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

/// Config from `explicit`, else from `poirot.json` under `base_dir` when
/// present, else the defaults.
pub fn resolve(explicit: Option<&Path>, base_dir: &Path) -> anyhow::Result<CompilerConfig> {
    if let Some(path) = explicit {
        return load(path);
    }
    let default_path: PathBuf = base_dir.join(DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        load(&default_path)
    } else {
        Ok(CompilerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve(None, dir.path()).unwrap(), CompilerConfig::default());
    }

    #[test]
    fn should_read_default_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), r#"{"wrapperTag": "em"}"#).unwrap();
        assert_eq!(resolve(None, dir.path()).unwrap().wrapper_tag, "em");
    }

    #[test]
    fn should_require_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let err = resolve(Some(&missing), dir.path()).unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }
}
