//! Commit fetching and conventional commit parsing.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use git2::{Commit, Oid, Repository};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GitError;

use super::diff::commit_files;
use super::range::resolve_range;

/// Display length of a commit hash.
pub const SHORT_HASH_LEN: usize = 7;

/// Cap on commits returned by the keyword fallback search.
const KEYWORD_SEARCH_LIMIT: usize = 10;

// Pattern: type(scope)!: subject, scope and `!` optional.
static CONVENTIONAL_COMMIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)(?:\(([^)]+)\))?(!)?:\s*(.+)$").expect("conventional commit regex")
});

/// Conventional commit types.
///
/// Unknown types are kept verbatim in [`CommitType::Other`] so that a
/// subject like `wip: spike` still reports `wip` as its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Chore,
    Ci,
    Build,
    Revert,
    Other(String),
}

impl CommitType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Docs => "docs",
            Self::Style => "style",
            Self::Refactor => "refactor",
            Self::Perf => "perf",
            Self::Test => "test",
            Self::Chore => "chore",
            Self::Ci => "ci",
            Self::Build => "build",
            Self::Revert => "revert",
            Self::Other(raw) => raw,
        }
    }

    /// Korean label used in the daily summary's "주요 작업" list.
    pub fn work_label(&self) -> &str {
        match self {
            Self::Feat => "기능 추가",
            Self::Fix => "버그 수정",
            Self::Refactor => "리팩토링",
            Self::Docs => "문서화",
            Self::Test => "테스트",
            Self::Chore => "기타 작업",
            other => other.as_str(),
        }
    }
}

impl From<&str> for CommitType {
    fn from(s: &str) -> Self {
        match s {
            "feat" => Self::Feat,
            "fix" => Self::Fix,
            "docs" => Self::Docs,
            "style" => Self::Style,
            "refactor" => Self::Refactor,
            "perf" => Self::Perf,
            "test" => Self::Test,
            "chore" => Self::Chore,
            "ci" => Self::Ci,
            "build" => Self::Build,
            "revert" => Self::Revert,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for CommitType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<CommitType> for String {
    fn from(t: CommitType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parts of a conventional commit subject line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalSubject {
    pub commit_type: CommitType,
    pub scope: Option<String>,
    pub subject: String,
    pub breaking: bool,
}

/// Parse a subject line of the form `type(scope)!: subject`.
///
/// Lines that don't match are typed `chore` and keep the whole input as
/// their subject.
pub fn parse_conventional_commit(message: &str) -> ConventionalSubject {
    if let Some(caps) = CONVENTIONAL_COMMIT_RE.captures(message) {
        let type_str = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let subject = caps.get(4).map(|m| m.as_str()).unwrap_or("");
        return ConventionalSubject {
            commit_type: CommitType::from(type_str),
            scope: caps.get(2).map(|m| m.as_str().to_string()),
            subject: subject.to_string(),
            breaking: caps.get(3).is_some(),
        };
    }

    ConventionalSubject {
        commit_type: CommitType::Chore,
        scope: None,
        subject: message.to_string(),
        breaking: false,
    }
}

/// A commit on an analyzed branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub hash: String,
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub subject: String,
    #[serde(default)]
    pub breaking: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub files: Vec<String>,
    pub date: DateTime<FixedOffset>,
    pub author: String,
}

impl CommitInfo {
    /// Build a CommitInfo from a git2 Commit.
    ///
    /// Returns `None` when the commit has no usable subject line. The
    /// touched files come from a diff against the first parent; commits
    /// without one (or whose diff fails) get an empty file list.
    pub fn from_git2_commit(repo: &Repository, commit: &Commit) -> Option<Self> {
        let full_hash = commit.id().to_string();
        let summary = commit.summary().unwrap_or("").trim();
        if full_hash.is_empty() || summary.is_empty() {
            return None;
        }

        let parsed = parse_conventional_commit(summary);

        let files = match commit_files(repo, commit) {
            Ok(files) => files,
            Err(e) => {
                debug!(hash = %full_hash, "No file list for commit: {}", e);
                Vec::new()
            }
        };

        let body = commit
            .body()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string);

        Some(Self {
            hash: short_hash(&full_hash),
            commit_type: parsed.commit_type,
            scope: parsed.scope,
            subject: parsed.subject,
            breaking: parsed.breaking,
            body,
            files,
            date: commit_date(commit),
            author: commit.author().name().unwrap_or("unknown").to_string(),
        })
    }
}

/// Truncate a hash to its display form.
pub fn short_hash(hash: &str) -> String {
    hash.chars().take(SHORT_HASH_LEN).collect()
}

fn commit_date(commit: &Commit) -> DateTime<FixedOffset> {
    let time = commit.time();
    FixedOffset::east_opt(time.offset_minutes() * 60)
        .and_then(|offset| offset.timestamp_opt(time.seconds(), 0).single())
        .unwrap_or_else(|| Utc::now().fixed_offset())
}

/// Fetch non-merge commits reachable from `to_oid` but not from `from_oid`,
/// newest first.
pub fn fetch_commits(
    repo: &Repository,
    from_oid: Oid,
    to_oid: Oid,
) -> Result<Vec<CommitInfo>, GitError> {
    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;

    revwalk.push(to_oid).map_err(GitError::RevwalkError)?;
    revwalk.hide(from_oid).map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(git2::Sort::TIME)
        .map_err(GitError::RevwalkError)?;

    let mut commits = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;
        if commit.parent_count() > 1 {
            continue;
        }
        if let Some(info) = CommitInfo::from_git2_commit(repo, &commit) {
            commits.push(info);
        }
    }

    Ok(commits)
}

/// Search every local and remote branch for commits whose message mentions
/// `keyword`, newest first, capped at ten.
pub fn search_commits_by_keyword(
    repo: &Repository,
    keyword: &str,
) -> Result<Vec<CommitInfo>, GitError> {
    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk.push_glob("heads").map_err(GitError::RevwalkError)?;
    revwalk.push_glob("remotes").map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(git2::Sort::TIME)
        .map_err(GitError::RevwalkError)?;

    let mut commits = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;
        if !commit.message().unwrap_or("").contains(keyword) {
            continue;
        }
        if let Some(info) = CommitInfo::from_git2_commit(repo, &commit) {
            commits.push(info);
        }
        if commits.len() >= KEYWORD_SEARCH_LIMIT {
            break;
        }
    }

    Ok(commits)
}

/// Commits on `branch` that are not on `base`.
///
/// If the `base..branch` range can't be resolved (typically because the
/// feature branch only ever existed on the remote and was deleted), falls
/// back to a keyword search for the branch name across all branches. Never
/// fails: a failed fallback yields an empty list.
pub fn commits_for_branch(repo: &Repository, branch: &str, base: &str) -> Vec<CommitInfo> {
    let ranged = resolve_range(repo, base, branch)
        .and_then(|range| fetch_commits(repo, range.from, range.to));

    match ranged {
        Ok(commits) => commits,
        Err(e) => {
            debug!("Range {}..{} unavailable ({}), searching by keyword", base, branch, e);
            search_commits_by_keyword(repo, branch).unwrap_or_else(|e| {
                warn!("Error getting commits for {}: {}", branch, e);
                Vec::new()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feat_commit() {
        let parsed = parse_conventional_commit("feat: add new feature");
        assert_eq!(parsed.commit_type, CommitType::Feat);
        assert_eq!(parsed.scope, None);
        assert_eq!(parsed.subject, "add new feature");
        assert!(!parsed.breaking);
    }

    #[test]
    fn test_parse_fix_with_scope() {
        let parsed = parse_conventional_commit("fix(auth): resolve login bug");
        assert_eq!(parsed.commit_type, CommitType::Fix);
        assert_eq!(parsed.scope, Some("auth".to_string()));
        assert_eq!(parsed.subject, "resolve login bug");
    }

    #[test]
    fn test_parse_breaking_with_scope_and_exclamation() {
        let parsed = parse_conventional_commit("feat(api)!: drop v1 endpoints");
        assert_eq!(parsed.commit_type, CommitType::Feat);
        assert_eq!(parsed.scope, Some("api".to_string()));
        assert_eq!(parsed.subject, "drop v1 endpoints");
        assert!(parsed.breaking);
    }

    #[test]
    fn test_parse_unknown_type_is_preserved() {
        let parsed = parse_conventional_commit("wip(ui): half-done layout");
        assert_eq!(parsed.commit_type, CommitType::Other("wip".to_string()));
        assert_eq!(parsed.commit_type.as_str(), "wip");
        assert_eq!(parsed.scope, Some("ui".to_string()));
    }

    #[test]
    fn test_parse_type_case_is_preserved() {
        let parsed = parse_conventional_commit("Feat: capitalised");
        assert_eq!(parsed.commit_type.as_str(), "Feat");
        assert_eq!(parsed.subject, "capitalised");
    }

    #[test]
    fn test_parse_non_conventional_defaults_to_chore() {
        let message = "just a normal commit message";
        let parsed = parse_conventional_commit(message);
        assert_eq!(parsed.commit_type, CommitType::Chore);
        assert_eq!(parsed.scope, None);
        assert_eq!(parsed.subject, message);
    }

    #[test]
    fn test_parse_colon_without_subject_defaults_to_chore() {
        let parsed = parse_conventional_commit("feat:");
        assert_eq!(parsed.commit_type, CommitType::Chore);
        assert_eq!(parsed.subject, "feat:");
    }

    #[test]
    fn test_parse_korean_subject() {
        let parsed = parse_conventional_commit("fix(결제): 중복 결제 방지");
        assert_eq!(parsed.commit_type, CommitType::Fix);
        assert_eq!(parsed.scope, Some("결제".to_string()));
        assert_eq!(parsed.subject, "중복 결제 방지");
    }

    #[test]
    fn test_short_hash_is_seven_chars() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn test_commit_type_serde_roundtrip_keeps_raw_name() {
        let json = serde_json::to_string(&CommitType::Other("wip".into())).unwrap();
        assert_eq!(json, "\"wip\"");
        let back: CommitType = serde_json::from_str("\"refactor\"").unwrap();
        assert_eq!(back, CommitType::Refactor);
    }

    #[test]
    fn test_work_label_falls_back_to_type_name() {
        assert_eq!(CommitType::Feat.work_label(), "기능 추가");
        assert_eq!(CommitType::Perf.work_label(), "perf");
        assert_eq!(CommitType::Other("wip".into()).work_label(), "wip");
    }
}
