//! blog-material-gen - A CLI tool that turns a day's merged feature branches
//! into blog-writing material on Notion.
//!
//! # Overview
//!
//! blog-material-gen walks the feature branches merged into a daily
//! integration branch, collects their commits, diffs and PRs, extracts code
//! snippets and troubleshooting notes, optionally asks an LLM for a draft,
//! and publishes everything to a Notion database page for that date.

pub mod analysis;
pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod llm;
pub mod material;
pub mod notion;
pub mod notify;
pub mod pipeline;

// Re-export commonly used types
pub use analysis::BranchAnalysis;
pub use config::UserConfig;
pub use error::{
    ConfigError, GitError, GitHubError, LlmError, NotionError, PipelineError, RunLogError,
};
pub use git::{CommitInfo, CommitType, FileChange};
pub use github::PrInfo;
pub use llm::{BlogDraft, DraftProvider, LlmConfig, ProviderKind};
pub use material::{BranchMaterial, DailyBranchData};
pub use pipeline::{Pipeline, PipelineConfig, PipelineResult};
