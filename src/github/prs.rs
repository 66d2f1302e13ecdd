//! Pull request lookup via octocrab.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use git2::Repository;
use octocrab::Octocrab;
use octocrab::params::State;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GitHubError;

use super::auth::get_github_token;

/// Maximum PR body length kept, in characters.
const MAX_BODY_LENGTH: usize = 10 * 1024;

/// The pull request a feature branch was merged through.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrInfo {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub url: String,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

/// Finds the PR for a head/base branch pair.
///
/// Lookup failures are reported as `None`; PR metadata only enriches the
/// analysis.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrLookup: Send + Sync {
    async fn find_pr(&self, head: &str, base: &str) -> Option<PrInfo>;
}

/// Lookup used when no GitHub remote or token is available.
pub struct NoPrLookup;

#[async_trait]
impl PrLookup for NoPrLookup {
    async fn find_pr(&self, _head: &str, _base: &str) -> Option<PrInfo> {
        None
    }
}

/// PR lookup against the GitHub REST API.
pub struct GitHubPrLookup {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubPrLookup {
    pub fn new(octocrab: Octocrab, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            octocrab,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Build a client authenticated with `token`.
    pub fn with_token(token: &str, owner: &str, repo: &str) -> Result<Self, GitHubError> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| GitHubError::FetchPRs(Box::new(e)))?;
        Ok(Self::new(octocrab, owner, repo))
    }
}

#[async_trait]
impl PrLookup for GitHubPrLookup {
    async fn find_pr(&self, head: &str, base: &str) -> Option<PrInfo> {
        match fetch_pr_for_branch(&self.octocrab, &self.owner, &self.repo, head, base).await {
            Ok(pr) => pr,
            Err(e) => {
                warn!("Could not fetch PR info for {}: {}", head, e);
                None
            }
        }
    }
}

/// Fetch the most recent PR from `head` into `base`, in any state.
pub async fn fetch_pr_for_branch(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    head: &str,
    base: &str,
) -> Result<Option<PrInfo>, GitHubError> {
    let result = octocrab
        .pulls(owner, repo)
        .list()
        .state(State::All)
        .head(format!("{}:{}", owner, head))
        .base(base)
        .per_page(1)
        .send()
        .await;

    let page = match result {
        Ok(page) => page,
        Err(e) => return Err(classify_error(e, owner, repo)),
    };

    let Some(pr) = page.items.into_iter().next() else {
        debug!("No PR found for {} -> {}", head, base);
        return Ok(None);
    };

    let labels = pr
        .labels
        .unwrap_or_default()
        .into_iter()
        .map(|l| l.name)
        .collect();

    Ok(Some(PrInfo {
        number: pr.number,
        title: pr.title.unwrap_or_default(),
        body: truncate_body(pr.body.unwrap_or_default()),
        url: pr.html_url.map(|u| u.to_string()).unwrap_or_default(),
        labels,
        merged_at: pr.merged_at,
    }))
}

fn classify_error(e: octocrab::Error, owner: &str, repo: &str) -> GitHubError {
    // octocrab surfaces GitHub's message in either Display or Debug output
    let err_display = e.to_string();
    let err_debug = format!("{:?}", e);

    if err_display.to_lowercase().contains("rate limit")
        || err_debug.to_lowercase().contains("rate limit")
    {
        return GitHubError::RateLimited {
            reset_time: "unknown".to_string(),
        };
    }
    if err_display.contains("Not Found") || err_debug.contains("Not Found") {
        return GitHubError::RepositoryNotFound {
            owner: owner.to_string(),
            repo: repo.to_string(),
        };
    }
    GitHubError::FetchPRs(Box::new(e))
}

fn truncate_body(body: String) -> String {
    match body.char_indices().nth(MAX_BODY_LENGTH) {
        Some((cut, _)) => format!("{}... [truncated]", &body[..cut]),
        None => body,
    }
}

/// Extract owner and repo from a git remote URL.
pub fn parse_github_remote(url: &str) -> Result<(String, String), GitHubError> {
    if let Some(path) = url.strip_prefix("git@github.com:") {
        return parse_owner_repo_path(path);
    }

    if let Some((_, path)) = url.split_once("github.com/") {
        return parse_owner_repo_path(path);
    }

    Err(GitHubError::InvalidRepositoryUrl)
}

fn parse_owner_repo_path(path: &str) -> Result<(String, String), GitHubError> {
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/');

    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(GitHubError::InvalidRepositoryUrl),
    }
}

/// Owner and repo of the `origin` remote, if it points at GitHub.
pub fn origin_owner_repo(repo: &Repository) -> Option<(String, String)> {
    let remote = repo.find_remote("origin").ok()?;
    parse_github_remote(remote.url()?).ok()
}

/// `https://github.com/<owner>/<repo>` for the `origin` remote, or an empty
/// string when there is no GitHub remote.
pub fn repo_web_url(repo: &Repository) -> String {
    origin_owner_repo(repo)
        .map(|(owner, name)| format!("https://github.com/{}/{}", owner, name))
        .unwrap_or_default()
}

/// Pick a PR lookup for the repository at `working_directory`.
///
/// Falls back to [`NoPrLookup`] when the remote isn't on GitHub or no token
/// can be found.
pub fn pr_lookup_for_repo(working_directory: &Path) -> Box<dyn PrLookup> {
    let Some((owner, name)) = Repository::open(working_directory)
        .ok()
        .and_then(|repo| origin_owner_repo(&repo))
    else {
        debug!("No GitHub remote; PR lookup disabled");
        return Box::new(NoPrLookup);
    };

    let lookup = get_github_token()
        .and_then(|token| GitHubPrLookup::with_token(&token, &owner, &name));

    match lookup {
        Ok(lookup) => Box::new(lookup),
        Err(e) => {
            warn!("PR lookup disabled: {}", e);
            Box::new(NoPrLookup)
        }
    }
}
