//! Branch discovery: existence checks, base-branch detection, and the
//! feature branches merged into a daily branch.

use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;

use git2::{BranchType, Repository};
use regex_lite::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::GitError;

use super::range::{merge_base, resolve_reference};

/// Branches tried, in order, when looking for a base branch.
pub const BASE_BRANCH_CANDIDATES: [&str; 4] = ["main", "master", "develop", "dev"];

/// Marker identifying daily integration branches.
pub const DAILY_BRANCH_MARKER: &str = "daily/";

const REMOTE_PREFIX: &str = "origin/";
const RECENT_DAILY_LIMIT: usize = 10;

static FROM_ORG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"from\s+[\w-]+/(\S+)").expect("merge source regex"));

static LAX_MERGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Merge (?:pull request #\d+ from [\w-]+/|branch ')(.+?)(?:'| into)")
        .expect("merge message regex")
});

fn normalize_branch_name(name: &str) -> &str {
    name.strip_prefix(REMOTE_PREFIX).unwrap_or(name)
}

/// All local and remote branch names with the `origin/` prefix removed.
///
/// A branch present both locally and on the remote appears twice.
pub fn list_branches(repo: &Repository) -> Result<Vec<String>, GitError> {
    let mut names = Vec::new();

    for entry in repo.branches(None).map_err(GitError::ListBranches)? {
        let (branch, kind) = entry.map_err(GitError::ListBranches)?;
        let Some(name) = branch.name().map_err(GitError::ListBranches)? else {
            continue;
        };
        if kind == BranchType::Remote && name.ends_with("/HEAD") {
            continue;
        }
        names.push(normalize_branch_name(name).to_string());
    }

    Ok(names)
}

/// Whether `name` exists locally or on a remote, either exactly or as the
/// trailing `/`-separated part of a longer branch name.
pub fn branch_exists(repo: &Repository, name: &str) -> bool {
    let suffix = format!("/{}", name);
    match list_branches(repo) {
        Ok(branches) => branches.iter().any(|b| b == name || b.ends_with(&suffix)),
        Err(e) => {
            warn!("Error listing branches: {}", e);
            false
        }
    }
}

/// Name of the checked-out branch, or `main` when HEAD is detached or unborn.
pub fn current_branch(repo: &Repository) -> String {
    repo.head()
        .ok()
        .filter(|head| head.is_branch())
        .and_then(|head| head.shorthand().map(str::to_string))
        .unwrap_or_else(|| "main".to_string())
}

/// Find the branch `current` was forked from.
///
/// Tries `main`, `master`, `develop`, `dev` and then every daily branch,
/// each first as a local name and then `origin/`-prefixed, and returns the
/// first one sharing a merge base with `current`. On `main` that is `main`
/// itself.
pub fn find_base_branch(repo: &Repository, current: &str) -> Result<String, GitError> {
    let mut candidates: Vec<String> = BASE_BRANCH_CANDIDATES.iter().map(|s| s.to_string()).collect();

    match list_branches(repo) {
        Ok(branches) => {
            for daily in branches.into_iter().filter(|b| b.contains(DAILY_BRANCH_MARKER)) {
                if !candidates.contains(&daily) {
                    candidates.push(daily);
                }
            }
        }
        Err(e) => debug!("Could not list daily branches: {}", e),
    }

    let mut tried = Vec::new();

    for candidate in candidates {
        for name in [candidate.clone(), format!("{}{}", REMOTE_PREFIX, candidate)] {
            tried.push(name.clone());
            match merge_base(repo, current, &name) {
                Ok(oid) if !oid.is_zero() => return Ok(name),
                Ok(_) => {}
                Err(e) => debug!("No merge base with {}: {}", name, e),
            }
        }
    }

    Err(GitError::BaseBranchNotFound { tried })
}

/// Feature branches merged into `daily`, in first-seen order without duplicates.
///
/// Looks for `Merge pull request ... into <daily>` merge commits on any
/// branch and takes the name after `from <org>/`. If that finds nothing,
/// falls back to the merge commits on `daily` itself, accepting
/// `Merge pull request #N from org/<name> into ...` and `Merge branch '<name>'`.
/// Git errors yield an empty list.
pub fn get_merged_branches(repo: &Repository, daily: &str) -> Vec<String> {
    let result = scan_pull_request_merges(repo, daily).and_then(|found| {
        if found.is_empty() {
            scan_daily_merges(repo, daily)
        } else {
            Ok(found)
        }
    });

    result.unwrap_or_else(|e| {
        warn!("Error getting merged branches: {}", e);
        Vec::new()
    })
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

fn mentions_merge_into(message: &str, daily: &str) -> bool {
    let target = format!("into {}", daily);
    message.lines().any(|line| {
        line.find("Merge pull request")
            .is_some_and(|idx| line[idx..].contains(&target))
    })
}

fn scan_pull_request_merges(repo: &Repository, daily: &str) -> Result<Vec<String>, GitError> {
    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk.push_glob("heads").map_err(GitError::RevwalkError)?;
    revwalk.push_glob("remotes").map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(git2::Sort::TIME)
        .map_err(GitError::RevwalkError)?;

    let mut names = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;
        if commit.parent_count() < 2 {
            continue;
        }

        let message = commit.message().unwrap_or("");
        if !mentions_merge_into(message, daily) {
            continue;
        }

        let subject = commit.summary().unwrap_or("");
        if let Some(caps) = FROM_ORG_RE.captures(subject) {
            push_unique(&mut names, &caps[1]);
        }
    }

    Ok(names)
}

fn scan_daily_merges(repo: &Repository, daily: &str) -> Result<Vec<String>, GitError> {
    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk
        .push(resolve_reference(repo, daily)?)
        .map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(git2::Sort::TIME)
        .map_err(GitError::RevwalkError)?;

    let mut names = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;
        if commit.parent_count() < 2 {
            continue;
        }

        let subject = commit.summary().unwrap_or("");
        if let Some(caps) = LAX_MERGE_RE.captures(subject) {
            push_unique(&mut names, &caps[1]);
        }
    }

    Ok(names)
}

/// Up to ten daily branches, newest name first.
pub fn get_recent_daily_branches(repo: &Repository) -> Vec<String> {
    let mut daily: Vec<String> = match list_branches(repo) {
        Ok(branches) => branches
            .into_iter()
            .filter(|b| b.contains(DAILY_BRANCH_MARKER))
            .collect(),
        Err(e) => {
            debug!("Could not list branches: {}", e);
            return Vec::new();
        }
    };

    daily.sort();
    daily.dedup();
    daily.reverse();
    daily.truncate(RECENT_DAILY_LIMIT);
    daily
}

/// Refresh remote refs with `git fetch origin`.
///
/// Shells out so the user's credential helpers and SSH agent apply.
pub async fn fetch_origin(working_directory: &Path) -> Result<(), GitError> {
    let output = Command::new("git")
        .args(["fetch", "origin"])
        .current_dir(working_directory)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| GitError::FetchFailed(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::FetchFailed(stderr.trim().to_string()));
    }

    Ok(())
}
