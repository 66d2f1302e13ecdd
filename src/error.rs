//! Error types for blog-material-gen modules using thiserror.

use thiserror::Error;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to find reference '{0}': {1}")]
    ReferenceNotFound(String, #[source] git2::Error),

    #[error("Branch '{0}' does not exist. Please check the branch name and try again.")]
    BranchNotFound(String),

    #[error("No merged PR branches found in '{0}'. Make sure there are merged PRs into this branch.")]
    NoMergedBranches(String),

    #[error("Base branch not found. Tried: {}", tried.join(", "))]
    BaseBranchNotFound { tried: Vec<String> },

    #[error("Failed to list branches: {0}")]
    ListBranches(#[source] git2::Error),

    #[error("Failed to parse commit: {0}")]
    ParseCommit(#[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    RevwalkError(#[source] git2::Error),

    #[error("Failed to compute diff: {0}")]
    Diff(#[source] git2::Error),

    #[error("Failed to compute merge base of '{current}' and '{base}': {source}")]
    MergeBase {
        current: String,
        base: String,
        #[source]
        source: git2::Error,
    },

    #[error("git fetch failed: {0}")]
    FetchFailed(String),
}

/// Errors from GitHub API operations.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error(
        "GitHub authentication failed: no valid auth found. Run 'gh auth login' or set GITHUB_TOKEN environment variable"
    )]
    AuthenticationFailed,

    #[error("Failed to fetch PRs: {0}")]
    FetchPRs(#[source] Box<octocrab::Error>),

    #[error("Rate limited by GitHub API. Resets at: {reset_time}")]
    RateLimited { reset_time: String },

    #[error("Repository not found: {owner}/{repo}")]
    RepositoryNotFound { owner: String, repo: String },

    #[error("Failed to parse repository URL")]
    InvalidRepositoryUrl,
}

/// Errors from LLM provider calls.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("{provider} request failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Empty response from {0}")]
    EmptyResponse(&'static str),

    #[error("LLM returned invalid JSON: {0}")]
    InvalidJson(String),

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<LlmError>),
}

/// Errors from Notion API operations.
#[derive(Error, Debug)]
pub enum NotionError {
    #[error("Notion request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Notion API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Notion response missing field '{0}'")]
    MissingField(&'static str),
}

/// Errors from loading the user configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the home directory")]
    NoHomeDir,

    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(#[source] serde_json::Error),

    #[error("Configuration is incomplete: '{0}' is required")]
    MissingField(&'static str),
}

/// Fatal pipeline failures surfaced to the user.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to connect to Notion. Please check your API key and database ID.")]
    NotionUnreachable,

    #[error("No branches found to analyze.")]
    NoBranches,

    #[error("No commits found in current branch compared to base branch.")]
    NoCommits,

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Notion(#[from] NotionError),
}

/// Errors from writing the persisted run log.
#[derive(Error, Debug)]
pub enum RunLogError {
    #[error("Failed to create log directory: {0}")]
    CreateDir(#[source] std::io::Error),

    #[error("Failed to serialize log entry: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to write log file: {0}")]
    WriteFailed(#[source] std::io::Error),
}
