//! GitHub API operations using octocrab.

pub mod auth;
pub mod prs;

pub use auth::get_github_token;
pub use prs::{
    GitHubPrLookup, NoPrLookup, PrInfo, PrLookup, fetch_pr_for_branch, parse_github_remote,
    pr_lookup_for_repo, repo_web_url,
};
