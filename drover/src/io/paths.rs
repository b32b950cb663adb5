//! Canonical paths for engine-owned files under `.drover/`.

use std::path::{Path, PathBuf};

/// All engine-owned paths for a workspace root.
///
/// The engine owns everything under `.drover/`; the task catalog lives
/// outside it and is never touched by `reset`.
#[derive(Debug, Clone)]
pub struct EnginePaths {
    pub root: PathBuf,
    pub engine_dir: PathBuf,
    pub state_path: PathBuf,
    pub log_path: PathBuf,
    pub config_path: PathBuf,
}

impl EnginePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let engine_dir = root.join(".drover");
        Self {
            root: root.clone(),
            engine_dir: engine_dir.clone(),
            state_path: engine_dir.join("state.json"),
            log_path: engine_dir.join("engine.log"),
            config_path: engine_dir.join("config.toml"),
        }
    }

    /// Default catalog location when the CLI is not given one explicitly.
    pub fn default_catalog_path(&self) -> PathBuf {
        self.root.join("tasks.toml")
    }
}

/// Resolve `EnginePaths` from an optional `--dir` override.
pub fn paths_from_dir(dir: Option<&Path>) -> EnginePaths {
    match dir {
        Some(root) => EnginePaths::new(root),
        None => EnginePaths::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_stable() {
        let paths = EnginePaths::new("/work");
        assert!(paths.state_path.ends_with(".drover/state.json"));
        assert!(paths.log_path.ends_with(".drover/engine.log"));
        assert!(paths.config_path.ends_with(".drover/config.toml"));
        assert!(paths.default_catalog_path().ends_with("tasks.toml"));
    }
}
