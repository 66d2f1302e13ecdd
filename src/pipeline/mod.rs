//! The end-to-end run: connectivity check, analysis, enrichment, publish.

pub mod log;

use std::path::{Path, PathBuf};

use futures::future::join_all;
use git2::Repository;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::analysis::{BranchAnalysis, analyze_current_branch_only, analyze_daily_branch};
use crate::error::PipelineError;
use crate::github::{PrLookup, pr_lookup_for_repo, repo_web_url};
use crate::llm::{DraftProvider, LlmConfig, build_provider};
use crate::material::{BranchMaterial, DailyBranchData, daily_summary, generate_blog_idea};
use crate::notion::{NotionClient, extract_date_from_branch};

pub use log::{RunLog, RunLogEntry};

/// Tags kept on a day's page.
pub const MAX_TAGS: usize = 10;

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub working_directory: PathBuf,
    /// Daily branch to analyze. Ignored in current-branch mode.
    pub daily_branch: String,
    pub notion_api_key: String,
    pub notion_database_id: String,
    pub llm: Option<LlmConfig>,
}

/// Outcome of a run. Fatal problems end up in `errors`, never as a panic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion_url: Option<String>,
    pub branches_analyzed: usize,
    pub blog_ideas_generated: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appended: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl PipelineResult {
    pub fn failure(errors: Vec<String>) -> Self {
        Self {
            errors,
            ..Default::default()
        }
    }
}

/// Last component of the working directory, used to tag published sections.
pub fn workspace_name(working_directory: &Path) -> String {
    let resolved = std::fs::canonicalize(working_directory)
        .unwrap_or_else(|_| working_directory.to_path_buf());
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| resolved.display().to_string())
}

fn dedup_in_order(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

pub struct Pipeline {
    config: PipelineConfig,
    notion: NotionClient,
    prs: Box<dyn PrLookup>,
    drafter: Option<Box<dyn DraftProvider>>,
}

impl Pipeline {
    /// Wire the pipeline with live collaborators derived from `config`.
    pub fn new(config: PipelineConfig) -> Self {
        let notion = NotionClient::new(&config.notion_api_key);
        let prs = pr_lookup_for_repo(&config.working_directory);
        let drafter = config.llm.as_ref().map(build_provider);
        Self {
            config,
            notion,
            prs,
            drafter,
        }
    }

    pub fn with_notion_client(mut self, notion: NotionClient) -> Self {
        self.notion = notion;
        self
    }

    pub fn with_pr_lookup(mut self, prs: Box<dyn PrLookup>) -> Self {
        self.prs = prs;
        self
    }

    pub fn with_draft_provider(mut self, drafter: Option<Box<dyn DraftProvider>>) -> Self {
        self.drafter = drafter;
        self
    }

    pub fn workspace_name(&self) -> String {
        workspace_name(&self.config.working_directory)
    }

    fn repo_url(&self) -> String {
        Repository::discover(&self.config.working_directory)
            .map(|repo| repo_web_url(&repo))
            .unwrap_or_default()
    }

    async fn ensure_notion(&self) -> Result<(), PipelineError> {
        info!("Testing Notion connection...");
        if !self
            .notion
            .test_connection(&self.config.notion_database_id)
            .await
        {
            return Err(PipelineError::NotionUnreachable);
        }
        info!("Notion connection successful");
        Ok(())
    }

    /// Build the material for one branch, with an LLM draft when configured.
    async fn process_branch(&self, analysis: &BranchAnalysis, repo_url: &str) -> BranchMaterial {
        let draft = match &self.drafter {
            Some(drafter) => {
                info!(
                    "[LLM] Generating blog draft for {} via {}",
                    analysis.branch_name,
                    drafter.kind()
                );
                let draft = drafter.generate_draft(analysis).await;
                if draft.is_none() {
                    info!("[LLM] No draft for {}, using heuristics only", analysis.branch_name);
                }
                draft
            }
            None => None,
        };

        BranchMaterial::from_analysis(analysis, repo_url, draft)
    }

    async fn publish(&self, data: &DailyBranchData) -> Result<(String, bool), PipelineError> {
        let outcome = self
            .notion
            .create_or_append(&self.config.notion_database_id, data, &self.workspace_name())
            .await?;

        if outcome.appended {
            info!("Appended to existing Notion page: {}", outcome.url);
        } else {
            info!("Created new Notion page: {}", outcome.url);
        }
        Ok((outcome.url, outcome.appended))
    }

    /// Publish material for every branch merged into the configured daily branch.
    pub async fn run_daily(&self) -> PipelineResult {
        info!(
            "Starting blog material generation for {} in {}",
            self.config.daily_branch,
            self.config.working_directory.display()
        );
        self.run_guarded(self.try_run_daily()).await
    }

    /// Publish material for the checked-out branch only.
    pub async fn run_current_branch(&self) -> PipelineResult {
        info!(
            "Starting blog material generation from current branch in {}",
            self.config.working_directory.display()
        );
        self.run_guarded(self.try_run_current_branch()).await
    }

    async fn run_guarded(
        &self,
        run: impl std::future::Future<Output = Result<PipelineResult, PipelineError>>,
    ) -> PipelineResult {
        match run.await {
            Ok(result) => result,
            Err(e) => {
                error!("Pipeline failed: {}", e);
                PipelineResult::failure(vec![e.to_string()])
            }
        }
    }

    async fn try_run_daily(&self) -> Result<PipelineResult, PipelineError> {
        self.ensure_notion().await?;

        let daily = &self.config.daily_branch;
        let analyses =
            analyze_daily_branch(daily, &self.config.working_directory, self.prs.as_ref()).await?;
        info!("Analyzed {} branches", analyses.len());
        if analyses.is_empty() {
            return Err(PipelineError::NoBranches);
        }

        let repo_url = self.repo_url();
        let branches = join_all(analyses.iter().map(|a| self.process_branch(a, &repo_url))).await;
        let blog_ideas: Vec<_> = analyses.iter().map(generate_blog_idea).collect();

        let data = DailyBranchData {
            daily_branch: daily.clone(),
            date: extract_date_from_branch(daily),
            summary: daily_summary(&analyses),
            tags: dedup_in_order(blog_ideas.iter().flat_map(|i| i.tags.clone()))
                .into_iter()
                .take(MAX_TAGS)
                .collect(),
            tech: dedup_in_order(branches.iter().flat_map(|b| b.tech.clone())),
            total_commits: analyses.iter().map(|a| a.commits.len()).sum(),
            blog_ideas,
            branches,
        };

        let (url, appended) = self.publish(&data).await?;

        Ok(PipelineResult {
            success: true,
            notion_url: Some(url),
            branches_analyzed: analyses.len(),
            blog_ideas_generated: data.blog_ideas.len(),
            appended: Some(appended),
            errors: vec![],
        })
    }

    async fn try_run_current_branch(&self) -> Result<PipelineResult, PipelineError> {
        self.ensure_notion().await?;

        let analysis =
            analyze_current_branch_only(&self.config.working_directory, self.prs.as_ref()).await?;
        info!("Analyzed branch: {}", analysis.branch_name);
        if analysis.commits.is_empty() {
            return Err(PipelineError::NoCommits);
        }

        let material = self.process_branch(&analysis, &self.repo_url()).await;
        let idea = generate_blog_idea(&analysis);

        let data = DailyBranchData {
            daily_branch: analysis.branch_name.clone(),
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            summary: analysis.summary.clone(),
            tags: idea.tags.clone(),
            tech: dedup_in_order(material.tech.clone()),
            total_commits: analysis.commits.len(),
            blog_ideas: vec![idea],
            branches: vec![material],
        };

        let (url, appended) = self.publish(&data).await?;

        Ok(PipelineResult {
            success: true,
            notion_url: Some(url),
            branches_analyzed: 1,
            blog_ideas_generated: 1,
            appended: Some(appended),
            errors: vec![],
        })
    }
}
