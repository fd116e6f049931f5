use async_trait::async_trait;
use git2::{IndexAddOption, Repository, Signature};
use serde_json::{Map, Value};
use std::path::Path;

use super::{Worker, WorkerOutput};
use crate::errors::WorkerError;
use crate::orchestrator::ProjectContext;
use crate::orchestrator::artifacts::VCS_DIR;

const GITIGNORE_FILE: &str = ".gitignore";

const EDITOR_AND_LOGS: &str = "\n# IDE\n.vscode/\n.idea/\n*.swp\n.DS_Store\n\n# Logs\n*.log\n\n# Environment\n.env\n.env.local\n";

/// Initializes version control for the generated project and commits it.
///
/// Works entirely through `git2`; no `git` binary is required.
#[derive(Debug, Default)]
pub struct GitAgent;

impl GitAgent {
    pub fn new() -> Self {
        Self
    }
}

/// Pick the ignore template for the recorded stack. Looks at `language`,
/// then `backend.language`; anything unrecognized gets the Python template.
pub fn gitignore_for(ctx: &ProjectContext) -> String {
    let language = ctx
        .language_value("language")
        .map(str::to_string)
        .or_else(|| {
            ctx.language_config
                .as_ref()?
                .get("backend")?
                .get("language")?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_default()
        .to_lowercase();

    let body = if language.contains("javascript") || language.contains("typescript") || language.contains("node") {
        "# Node\nnode_modules/\nnpm-debug.log*\nyarn-error.log*\n.pnpm-store/\n\n# Build\ndist/\n*.local\n"
    } else if language.contains("rust") {
        "# Rust\ntarget/\n**/*.rs.bk\n"
    } else if language.starts_with("go") {
        "# Go\n*.exe\n*.test\n*.out\nvendor/\ngo.work\n"
    } else if language.contains("java") {
        "# Java\n*.class\n*.jar\n*.war\ntarget/\n.gradle/\nbuild/\n"
    } else {
        "# Python\n__pycache__/\n*.py[cod]\n.venv/\nvenv/\n*.egg-info/\ndist/\nbuild/\n.pytest_cache/\n"
    };
    format!("{}{}", body, EDITOR_AND_LOGS)
}

fn signature(repo: &Repository) -> Result<Signature<'static>, git2::Error> {
    // Fall back when no user.name/user.email is configured
    repo.signature()
        .or_else(|_| Signature::now("crewforge", "crewforge@localhost"))
}

/// Stage everything and commit. Returns the new commit id, or `None` when
/// the tree matches HEAD.
fn commit_all(repo: &Repository, project_name: &str) -> Result<Option<String>, git2::Error> {
    let mut index = repo.index()?;
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
    index.write()?;

    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());

    if let Some(ref parent) = parent
        && parent.tree_id() == tree_id
    {
        return Ok(None);
    }

    let sig = signature(repo)?;
    let message = match parent {
        Some(_) => format!("Update generated project: {}", project_name),
        None => format!("Initial commit: {}", project_name),
    };
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    let oid = repo.commit(Some("HEAD"), &sig, &sig, &message, &tree, &parents)?;
    Ok(Some(oid.to_string()))
}

fn open_or_init(root: &Path) -> Result<(Repository, bool), git2::Error> {
    if root.join(VCS_DIR).is_dir() {
        Ok((Repository::open(root)?, false))
    } else {
        Ok((Repository::init(root)?, true))
    }
}

#[async_trait]
impl Worker for GitAgent {
    async fn run(&self, _task: &str, ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
        let root = ctx.project_path.as_path();
        let (repo, initialized) = open_or_init(root)?;
        if initialized {
            tracing::info!(path = %root.display(), "initialized git repository");
        }

        let ignore_path = root.join(GITIGNORE_FILE);
        let gitignore_created = !ignore_path.exists();
        if gitignore_created {
            std::fs::write(&ignore_path, gitignore_for(ctx)).map_err(|source| {
                WorkerError::WriteFailed {
                    path: ignore_path.clone(),
                    source,
                }
            })?;
        }

        let commit = commit_all(&repo, &ctx.project_name)?;
        match &commit {
            Some(id) => tracing::info!(commit = %id, "committed project"),
            None => tracing::info!("no changes to commit"),
        }

        let mut output = Map::new();
        output.insert("initialized".into(), Value::Bool(initialized));
        output.insert("gitignore_created".into(), Value::Bool(gitignore_created));
        output.insert("committed".into(), Value::Bool(commit.is_some()));
        if let Some(id) = commit {
            output.insert("commit".into(), Value::String(id));
        }
        Ok(output)
    }
}
