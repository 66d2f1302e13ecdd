//! Blog material derived from branch analyses: what gets published.

pub mod code;
pub mod extract;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::BranchAnalysis;
use crate::llm::BlogDraft;

pub use code::{CodeBlock, MaskingRule, extract_code_blocks, mask_secrets};
pub use extract::{
    daily_summary, extract_learnings, extract_requirements, extract_troubleshooting,
    generate_blog_idea, languages_of,
};

/// Maximum characters of requirements text kept per branch.
pub const MAX_REQUIREMENTS_CHARS: usize = 500;

/// Code blocks extracted per branch.
pub const MAX_CODE_BLOCKS: usize = 3;

/// Values of the Notion `종류` select property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotionCategory {
    #[serde(rename = "회고")]
    Retrospective,
    #[default]
    #[serde(rename = "기술 블로그")]
    TechBlog,
    #[serde(rename = "후기")]
    Review,
    #[serde(rename = "독후감")]
    BookReport,
    #[serde(rename = "리뷰")]
    Critique,
    #[serde(rename = "소프트 스킬")]
    SoftSkill,
    #[serde(rename = "짤막 상식")]
    Trivia,
}

impl NotionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotionCategory::Retrospective => "회고",
            NotionCategory::TechBlog => "기술 블로그",
            NotionCategory::Review => "후기",
            NotionCategory::BookReport => "독후감",
            NotionCategory::Critique => "리뷰",
            NotionCategory::SoftSkill => "소프트 스킬",
            NotionCategory::Trivia => "짤막 상식",
        }
    }
}

impl fmt::Display for NotionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem/cause/solution triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TroubleshootingItem {
    pub problem: String,
    pub cause: String,
    pub solution: String,
}

/// A suggested blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogIdea {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category: NotionCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitLink {
    pub hash: String,
    /// Empty when the repository has no GitHub remote.
    pub url: String,
}

/// Presentation record for one branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchMaterial {
    pub name: String,
    pub requirements: String,
    pub tech: Vec<String>,
    pub code_blocks: Vec<CodeBlock>,
    pub troubleshooting: Vec<TroubleshootingItem>,
    pub learnings: Vec<String>,
    pub blog_idea_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    pub commit_urls: Vec<CommitLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_draft: Option<BlogDraft>,
}

impl BranchMaterial {
    /// Derive the material for `analysis`.
    ///
    /// `repo_url` is the repository's web URL (empty for none) and
    /// `llm_draft` the optional model-written draft.
    pub fn from_analysis(
        analysis: &BranchAnalysis,
        repo_url: &str,
        llm_draft: Option<BlogDraft>,
    ) -> Self {
        let requirements = match analysis.pr_info.as_ref().filter(|pr| !pr.body.is_empty()) {
            Some(pr) => extract_requirements(&pr.body),
            None => analysis
                .commits
                .iter()
                .map(|c| c.subject.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        };

        let commit_urls = analysis
            .commits
            .iter()
            .map(|c| CommitLink {
                hash: c.hash.clone(),
                url: if repo_url.is_empty() {
                    String::new()
                } else {
                    format!("{}/commit/{}", repo_url, c.hash)
                },
            })
            .collect();

        Self {
            name: analysis.branch_name.clone(),
            requirements: requirements.chars().take(MAX_REQUIREMENTS_CHARS).collect(),
            tech: languages_of(std::slice::from_ref(analysis)),
            code_blocks: extract_code_blocks(&analysis.files_changed, MAX_CODE_BLOCKS),
            troubleshooting: extract_troubleshooting(analysis),
            learnings: extract_learnings(analysis),
            blog_idea_title: generate_blog_idea(analysis).title,
            pr_url: analysis.pr_info.as_ref().map(|pr| pr.url.clone()),
            commit_urls,
            llm_draft,
        }
    }
}

/// Everything published for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBranchData {
    pub daily_branch: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub summary: String,
    pub blog_ideas: Vec<BlogIdea>,
    pub branches: Vec<BranchMaterial>,
    pub tags: Vec<String>,
    pub tech: Vec<String>,
    pub total_commits: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{CommitInfo, FileChange, parse_conventional_commit};
    use crate::github::PrInfo;
    use chrono::Utc;

    fn commit(line: &str, hash: &str) -> CommitInfo {
        let parsed = parse_conventional_commit(line);
        CommitInfo {
            hash: hash.into(),
            commit_type: parsed.commit_type,
            scope: parsed.scope,
            subject: parsed.subject,
            breaking: parsed.breaking,
            body: None,
            files: vec![],
            date: Utc::now().fixed_offset(),
            author: "dev".into(),
        }
    }

    fn analysis(pr_body: Option<&str>) -> BranchAnalysis {
        BranchAnalysis {
            branch_name: "feature/search".into(),
            commits: vec![commit("feat: add search", "aaaaaaa"), commit("fix: empty query", "bbbbbbb")],
            pr_info: pr_body.map(|body| PrInfo {
                number: 3,
                title: "Search".into(),
                body: body.into(),
                url: "https://github.com/acme/app/pull/3".into(),
                labels: vec![],
                merged_at: None,
            }),
            files_changed: vec![FileChange {
                path: "src/search.ts".into(),
                additions: 2,
                deletions: 0,
                diff: "+++ b/src/search.ts\n+export const search = () => [];\n".into(),
                language: Some("typescript".into()),
            }],
            summary: "2개 커밋".into(),
        }
    }

    #[test]
    fn test_material_without_pr_joins_subjects() {
        let material = BranchMaterial::from_analysis(&analysis(None), "", None);
        assert_eq!(material.requirements, "add search, empty query");
        assert_eq!(material.pr_url, None);
        assert!(material.commit_urls.iter().all(|c| c.url.is_empty()));
        assert_eq!(material.tech, vec!["typescript"]);
        assert_eq!(material.code_blocks.len(), 1);
        assert_eq!(material.blog_idea_title, "typescript에서 add search");
    }

    #[test]
    fn test_material_commit_urls_use_repo_url() {
        let material =
            BranchMaterial::from_analysis(&analysis(Some("본문")), "https://github.com/acme/app", None);
        assert_eq!(
            material.commit_urls[0].url,
            "https://github.com/acme/app/commit/aaaaaaa"
        );
        assert_eq!(
            material.pr_url.as_deref(),
            Some("https://github.com/acme/app/pull/3")
        );
    }

    #[test]
    fn test_material_requirements_capped() {
        let body = "가".repeat(MAX_REQUIREMENTS_CHARS + 50);
        let material = BranchMaterial::from_analysis(&analysis(Some(&body)), "", None);
        assert_eq!(material.requirements.chars().count(), MAX_REQUIREMENTS_CHARS);
    }

    #[test]
    fn test_category_serializes_korean_label() {
        assert_eq!(
            serde_json::to_string(&NotionCategory::TechBlog).unwrap(),
            "\"기술 블로그\""
        );
        assert_eq!(NotionCategory::default(), NotionCategory::TechBlog);
    }
}
