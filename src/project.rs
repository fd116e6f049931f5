use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::util::sanitize_project_name;

/// A generated project's identity and root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
}

impl Project {
    /// Derive the project from `goal` and create its directory under
    /// `projects_root` if needed.
    pub fn create(projects_root: &Path, goal: &str) -> Result<Self> {
        let name = sanitize_project_name(goal);
        let path = projects_root.join(&name);
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create project directory {}", path.display()))?;
        Ok(Self { name, path })
    }

    /// Refer to an existing directory without creating anything.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }

    /// Project directories under `projects_root`, sorted by name.
    pub fn list(projects_root: &Path) -> Result<Vec<Self>> {
        if !projects_root.is_dir() {
            return Ok(Vec::new());
        }
        let mut projects: Vec<Self> = std::fs::read_dir(projects_root)
            .with_context(|| format!("Failed to read {}", projects_root.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .map(|entry| Self::at(entry.path()))
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }
}
