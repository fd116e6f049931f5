//! Extraction of `Filename:` code blocks from model output and confined
//! writes under the project root.
//!
//! A file block looks like:
//!
//! ````text
//! Filename: src/app.py
//! ```python
//! print("hi")
//! ```
//! ````

use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use crate::errors::WorkerError;

static FILE_BLOCK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Filename:[ \t]*([^\n]+?)[ \t]*\n```[\w+.#-]*[ \t]*\n(.*?)```").unwrap()
});

/// One file parsed out of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlock {
    pub path: String,
    pub content: String,
}

/// Find every `Filename:` block in `text`, in order.
pub fn parse_file_blocks(text: &str) -> Vec<FileBlock> {
    FILE_BLOCK_REGEX
        .captures_iter(text)
        .filter_map(|cap| {
            let raw = cap.get(1)?.as_str();
            // Models like to decorate the name: **`src/app.py`**
            let path = raw.trim().trim_matches(|c| c == '`' || c == '*' || c == '"').trim();
            if path.is_empty() {
                return None;
            }
            Some(FileBlock {
                path: path.to_string(),
                content: cap.get(2)?.as_str().to_string(),
            })
        })
        .collect()
}

/// Resolve a model-supplied relative path against `root`.
///
/// Absolute paths, drive prefixes and `..` components are rejected.
pub fn resolve_in_project(root: &Path, relative: &str) -> Result<PathBuf, WorkerError> {
    let candidate = Path::new(relative);
    let escapes = candidate.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || candidate.as_os_str().is_empty() {
        return Err(WorkerError::UnsafePath {
            path: candidate.to_path_buf(),
        });
    }
    Ok(root.join(candidate))
}

/// Write `content` to `relative` under `root`, creating parent directories.
pub fn write_project_file(root: &Path, relative: &str, content: &str) -> Result<PathBuf, WorkerError> {
    let path = resolve_in_project(root, relative)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| WorkerError::WriteFailed {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(&path, content).map_err(|source| WorkerError::WriteFailed {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Files written and rejected by [`write_file_blocks`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub written: Vec<String>,
    pub rejected: Vec<String>,
}

/// Write every block under `root`.
///
/// Blocks with unsafe paths are skipped and reported; an I/O failure stops
/// the batch.
pub fn write_file_blocks(root: &Path, blocks: &[FileBlock]) -> Result<WrittenFiles, WorkerError> {
    let mut result = WrittenFiles::default();
    for block in blocks {
        let mut content = block.content.trim().to_string();
        content.push('\n');
        match write_project_file(root, &block.path, &content) {
            Ok(_) => {
                tracing::info!(file = %block.path, "wrote file");
                result.written.push(block.path.clone());
            }
            Err(WorkerError::UnsafePath { path }) => {
                tracing::warn!(file = %path.display(), "rejected file outside project");
                result.rejected.push(block.path.clone());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(result)
}
