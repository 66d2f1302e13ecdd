//! File-level diff summaries and language detection.

use git2::{Commit, Diff, Patch, Repository};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GitError;

use super::range::resolve_reference;

/// Maximum characters of diff text kept per file.
pub const MAX_DIFF_CHARS: usize = 5000;

/// Maximum changed files reported per branch.
pub const MAX_FILES_PER_BRANCH: usize = 20;

/// Appended to diff text cut at [`MAX_DIFF_CHARS`].
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// A changed file between two refs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub path: String,
    pub additions: usize,
    pub deletions: usize,
    pub diff: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Map a file path to a language tag by its extension.
pub fn detect_language(path: &str) -> Option<&'static str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file_name.rsplit_once('.')?;

    let lang = match ext.to_lowercase().as_str() {
        "ts" => "typescript",
        "tsx" => "tsx",
        "js" => "javascript",
        "jsx" => "jsx",
        "py" => "python",
        "swift" => "swift",
        "kt" => "kotlin",
        "java" => "java",
        "cs" => "csharp",
        "go" => "go",
        "rs" => "rust",
        "rb" => "ruby",
        "php" => "php",
        "vue" => "vue",
        "svelte" => "svelte",
        "css" => "css",
        "scss" => "scss",
        "html" => "html",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "md" => "markdown",
        "sql" => "sql",
        "sh" => "bash",
        _ => return None,
    };

    Some(lang)
}

/// Cut diff text to [`MAX_DIFF_CHARS`] characters plus a marker.
pub fn truncate_diff(diff: String) -> String {
    match diff.char_indices().nth(MAX_DIFF_CHARS) {
        Some((cut, _)) => {
            let mut truncated = diff[..cut].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => diff,
    }
}

/// Paths touched by a commit relative to its first parent.
pub fn commit_files(repo: &Repository, commit: &Commit) -> Result<Vec<String>, GitError> {
    let parent = commit.parent(0).map_err(GitError::ParseCommit)?;
    let old_tree = parent.tree().map_err(GitError::ParseCommit)?;
    let new_tree = commit.tree().map_err(GitError::ParseCommit)?;

    let diff = repo
        .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)
        .map_err(GitError::Diff)?;

    Ok(diff
        .deltas()
        .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
        .map(|p| p.to_string_lossy().into_owned())
        .collect())
}

fn tree_diff<'r>(repo: &'r Repository, base: &str, head: &str) -> Result<Diff<'r>, GitError> {
    let base_commit = repo
        .find_commit(resolve_reference(repo, base)?)
        .map_err(GitError::ParseCommit)?;
    let head_commit = repo
        .find_commit(resolve_reference(repo, head)?)
        .map_err(GitError::ParseCommit)?;

    let base_tree = base_commit.tree().map_err(GitError::ParseCommit)?;
    let head_tree = head_commit.tree().map_err(GitError::ParseCommit)?;

    repo.diff_tree_to_tree(Some(&base_tree), Some(&head_tree), None)
        .map_err(GitError::Diff)
}

/// Files changed between `base` and `branch`, at most [`MAX_FILES_PER_BRANCH`].
///
/// Falls back to `HEAD~5..HEAD` when the two refs can't be diffed. A file
/// whose patch can't be rendered keeps its path with an empty diff.
pub fn files_changed(repo: &Repository, branch: &str, base: &str) -> Vec<FileChange> {
    let diff = match tree_diff(repo, base, branch) {
        Ok(diff) => diff,
        Err(e) => {
            debug!("Diff {}..{} unavailable ({}), using HEAD~5..HEAD", base, branch, e);
            match tree_diff(repo, "HEAD~5", "HEAD") {
                Ok(diff) => diff,
                Err(e) => {
                    warn!("Error getting files changed for {}: {}", branch, e);
                    return Vec::new();
                }
            }
        }
    };

    let mut changes = Vec::new();

    for (idx, delta) in diff.deltas().enumerate().take(MAX_FILES_PER_BRANCH) {
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (additions, deletions, text) = match Patch::from_diff(&diff, idx) {
            Ok(Some(mut patch)) => {
                let (_, additions, deletions) = patch.line_stats().unwrap_or((0, 0, 0));
                let text = patch
                    .to_buf()
                    .map(|buf| String::from_utf8_lossy(&buf).into_owned())
                    .unwrap_or_default();
                (additions, deletions, text)
            }
            Ok(None) => (0, 0, String::new()),
            Err(e) => {
                debug!(path = %path, "Patch unavailable: {}", e);
                (0, 0, String::new())
            }
        };

        changes.push(FileChange {
            language: detect_language(&path).map(str::to_string),
            path,
            additions,
            deletions,
            diff: truncate_diff(text),
        });
    }

    changes
}
