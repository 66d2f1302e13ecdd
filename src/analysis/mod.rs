//! Per-branch analysis: commits, changed files, PR metadata and a summary line.

use std::path::Path;

use git2::Repository;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::GitError;
use crate::git::{
    self, CommitInfo, FileChange, commits::fetch_commits, current_branch, files_changed,
    find_base_branch, merge_base,
};
use crate::github::{PrInfo, PrLookup};

/// Everything collected about one branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchAnalysis {
    pub branch_name: String,
    pub commits: Vec<CommitInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_info: Option<PrInfo>,
    pub files_changed: Vec<FileChange>,
    pub summary: String,
}

/// Git-side data for a branch, gathered before any network lookups.
struct GitSnapshot {
    branch_name: String,
    base: String,
    commits: Vec<CommitInfo>,
    files_changed: Vec<FileChange>,
}

impl GitSnapshot {
    async fn into_analysis(self, prs: &dyn PrLookup) -> BranchAnalysis {
        let pr_info = prs.find_pr(&self.branch_name, &self.base).await;
        let summary = branch_summary(&self.commits, &self.files_changed);
        BranchAnalysis {
            branch_name: self.branch_name,
            commits: self.commits,
            pr_info,
            files_changed: self.files_changed,
            summary,
        }
    }
}

fn open_repo(working_directory: &Path) -> Result<Repository, GitError> {
    Repository::discover(working_directory).map_err(GitError::OpenRepository)
}

/// Analyze every feature branch merged into `daily_branch`, in merge order.
///
/// Fails when the daily branch doesn't exist or has no merged PR branches.
/// Per-branch lookups degrade to empty data instead of failing.
pub async fn analyze_daily_branch(
    daily_branch: &str,
    working_directory: &Path,
    prs: &dyn PrLookup,
) -> Result<Vec<BranchAnalysis>, GitError> {
    info!("Analyzing daily branch: {}", daily_branch);

    let snapshots = {
        let repo = open_repo(working_directory)?;

        if !git::branch_exists(&repo, daily_branch) {
            return Err(GitError::BranchNotFound(daily_branch.to_string()));
        }

        let feature_branches = git::get_merged_branches(&repo, daily_branch);
        info!("Found {} merged PR branches", feature_branches.len());

        if feature_branches.is_empty() {
            return Err(GitError::NoMergedBranches(daily_branch.to_string()));
        }

        feature_branches
            .into_iter()
            .map(|branch| {
                info!("Analyzing branch: {}", branch);
                GitSnapshot {
                    commits: git::commits_for_branch(&repo, &branch, daily_branch),
                    files_changed: files_changed(&repo, &branch, daily_branch),
                    base: daily_branch.to_string(),
                    branch_name: branch,
                }
            })
            .collect::<Vec<_>>()
    };

    let mut analyses = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        analyses.push(snapshot.into_analysis(prs).await);
    }

    Ok(analyses)
}

/// Analyze the checked-out branch against the branch it was forked from.
///
/// Remote refs are refreshed first. Unlike the daily mode, failing to
/// compute the `merge-base..current` commit range is an error.
pub async fn analyze_current_branch_only(
    working_directory: &Path,
    prs: &dyn PrLookup,
) -> Result<BranchAnalysis, GitError> {
    info!("Fetching latest remote refs...");
    if let Err(e) = git::fetch_origin(working_directory).await {
        warn!("Could not refresh remote refs: {}", e);
    }

    let snapshot = {
        let repo = open_repo(working_directory)?;
        let current = current_branch(&repo);
        info!("Analyzing current branch: {}", current);

        let base = find_base_branch(&repo, &current)?;
        info!("Base branch detected: {}", base);

        let fork_point = merge_base(&repo, &current, &base)?;
        let head = git::range::resolve_reference(&repo, &current)?;
        let commits = fetch_commits(&repo, fork_point, head)?;
        info!("Found {} commits", commits.len());

        GitSnapshot {
            files_changed: files_changed(&repo, &current, &base),
            branch_name: current,
            base,
            commits,
        }
    };

    Ok(snapshot.into_analysis(prs).await)
}

/// One-line Korean summary of a branch's commits and file changes.
///
/// Commit types are counted in first-seen order; languages are listed once
/// each, in first-seen order.
pub fn branch_summary(commits: &[CommitInfo], files: &[FileChange]) -> String {
    let mut type_counts: Vec<(&str, usize)> = Vec::new();
    for commit in commits {
        let name = commit.commit_type.as_str();
        match type_counts.iter_mut().find(|(t, _)| *t == name) {
            Some((_, count)) => *count += 1,
            None => type_counts.push((name, 1)),
        }
    }
    let types = type_counts
        .iter()
        .map(|(t, count)| format!("{}({})", t, count))
        .collect::<Vec<_>>()
        .join(", ");

    let mut languages: Vec<&str> = Vec::new();
    for lang in files.iter().filter_map(|f| f.language.as_deref()) {
        if !languages.contains(&lang) {
            languages.push(lang);
        }
    }
    let languages = if languages.is_empty() {
        "N/A".to_string()
    } else {
        languages.join(", ")
    };

    let additions: usize = files.iter().map(|f| f.additions).sum();
    let deletions: usize = files.iter().map(|f| f.deletions).sum();

    format!(
        "{}개 커밋 ({}), {}개 파일 변경 (+{}/-{}), 주요 언어: {}",
        commits.len(),
        types,
        files.len(),
        additions,
        deletions,
        languages
    )
}
