//! Regex heuristics over PR text and commit types.
//!
//! Each extractor tries its patterns in a fixed order and stops at the
//! first one that matches.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::analysis::BranchAnalysis;
use crate::git::CommitType;

use super::{BlogIdea, NotionCategory, TroubleshootingItem};

const MAX_FIX_ITEMS: usize = 2;
const MAX_IDEA_TAGS: usize = 3;
const MAX_SUMMARY_TECHS: usize = 5;
const MAX_SUMMARY_WORK_TYPES: usize = 3;

static TROUBLESHOOTING_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?is)(?:문제|problem|issue)[:\s]*(.+?)(?:원인|cause|해결|solution|$)")
            .expect("problem pattern"),
        Regex::new(r"(?is)(?:해결|fix|solved)[:\s]*(.+?)(?:\n\n|$)").expect("fix pattern"),
        Regex::new(r"(?is)(?:트러블슈팅|troubleshooting)[:\s]*(.+?)(?:\n\n|$)")
            .expect("troubleshooting pattern"),
    ]
});

static REQUIREMENT_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?is)(?:요구사항|requirements?|what)[:\s]*(.+?)(?:\n\n|##|$)")
            .expect("requirements pattern"),
        Regex::new(r"(?is)(?:summary|개요|목적)[:\s]*(.+?)(?:\n\n|##|$)")
            .expect("summary pattern"),
    ]
});

/// Distinct detected languages across `analyses`, in first-seen order.
pub fn languages_of(analyses: &[BranchAnalysis]) -> Vec<String> {
    let mut langs: Vec<String> = Vec::new();
    for lang in analyses
        .iter()
        .flat_map(|a| a.files_changed.iter())
        .filter_map(|f| f.language.as_deref())
    {
        if !langs.iter().any(|l| l == lang) {
            langs.push(lang.to_string());
        }
    }
    langs
}

/// Troubleshooting items from the PR body, then from up to two `fix` commits.
pub fn extract_troubleshooting(analysis: &BranchAnalysis) -> Vec<TroubleshootingItem> {
    let mut items = Vec::new();

    if let Some(body) = analysis
        .pr_info
        .as_ref()
        .map(|pr| pr.body.as_str())
        .filter(|b| !b.is_empty())
        && let Some(caps) = TROUBLESHOOTING_PATTERNS
            .iter()
            .find_map(|pattern| pattern.captures(body))
    {
        let problem = caps
            .get(1)
            .map(|m| m.as_str().trim())
            .filter(|p| !p.is_empty())
            .unwrap_or("PR에서 발견된 이슈");
        items.push(TroubleshootingItem {
            problem: problem.to_string(),
            cause: "분석 필요".to_string(),
            solution: "PR 참조".to_string(),
        });
    }

    for commit in analysis
        .commits
        .iter()
        .filter(|c| c.commit_type == CommitType::Fix)
        .take(MAX_FIX_ITEMS)
    {
        items.push(TroubleshootingItem {
            problem: commit.subject.clone(),
            cause: commit
                .body
                .clone()
                .unwrap_or_else(|| "커밋 메시지 참조".to_string()),
            solution: format!("{}: {}", commit.commit_type, commit.subject),
        });
    }

    items
}

/// What the branch taught, judged from its commit types and languages.
pub fn extract_learnings(analysis: &BranchAnalysis) -> Vec<String> {
    let has = |t: CommitType| analysis.commits.iter().any(|c| c.commit_type == t);
    let mut learnings = Vec::new();

    if let Some(feat) = analysis
        .commits
        .iter()
        .find(|c| c.commit_type == CommitType::Feat)
    {
        learnings.push(format!("새로운 기능 구현 경험: {}", feat.subject));
    }
    if has(CommitType::Fix) {
        learnings.push("버그 수정 및 디버깅 경험".to_string());
    }
    if has(CommitType::Refactor) {
        learnings.push("코드 리팩토링 패턴 적용".to_string());
    }
    if has(CommitType::Perf) {
        learnings.push("성능 최적화 기법 적용".to_string());
    }

    let techs = languages_of(std::slice::from_ref(analysis));
    if !techs.is_empty() {
        learnings.push(format!("사용 기술: {}", techs.join(", ")));
    }

    learnings
}

/// Requirements text from a PR body.
///
/// Falls back to the first paragraph with markdown markers removed.
pub fn extract_requirements(pr_body: &str) -> String {
    if let Some(caps) = REQUIREMENT_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(pr_body))
    {
        let text = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        return text.trim().replace('\n', " ");
    }

    let first_paragraph = pr_body.split("\n\n").next().unwrap_or_default();
    first_paragraph
        .chars()
        .filter(|c| !matches!(c, '#' | '*' | '`'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// A post idea built around the branch's main (first `feat`, else first)
/// commit.
pub fn generate_blog_idea(analysis: &BranchAnalysis) -> BlogIdea {
    let techs = languages_of(std::slice::from_ref(analysis));
    let main_commit = analysis
        .commits
        .iter()
        .find(|c| c.commit_type == CommitType::Feat)
        .or_else(|| analysis.commits.first());

    let title = match main_commit {
        Some(commit) => format!(
            "{}에서 {}",
            techs.first().map(String::as_str).unwrap_or("Development"),
            commit.subject
        ),
        None => format!("{} 작업 정리", analysis.branch_name),
    };

    BlogIdea {
        title,
        description: analysis.summary.clone(),
        tags: techs.into_iter().take(MAX_IDEA_TAGS).collect(),
        category: NotionCategory::TechBlog,
    }
}

/// One-paragraph Korean summary of a whole day's branches.
///
/// The three most frequent commit types (ties keep first-seen order) are
/// listed as the main work.
pub fn daily_summary(analyses: &[BranchAnalysis]) -> String {
    let total_commits: usize = analyses.iter().map(|a| a.commits.len()).sum();
    let total_files: usize = analyses.iter().map(|a| a.files_changed.len()).sum();

    let mut type_counts: Vec<(&CommitType, usize)> = Vec::new();
    for commit in analyses.iter().flat_map(|a| a.commits.iter()) {
        match type_counts.iter_mut().find(|(t, _)| **t == commit.commit_type) {
            Some((_, count)) => *count += 1,
            None => type_counts.push((&commit.commit_type, 1)),
        }
    }
    type_counts.sort_by(|a, b| b.1.cmp(&a.1));

    let main_work = type_counts
        .iter()
        .take(MAX_SUMMARY_WORK_TYPES)
        .map(|(t, _)| t.work_label())
        .collect::<Vec<_>>()
        .join(", ");

    let techs = languages_of(analyses);
    let techs = if techs.is_empty() {
        "N/A".to_string()
    } else {
        techs
            .into_iter()
            .take(MAX_SUMMARY_TECHS)
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "오늘은 {}개의 feature 브랜치에서 {}개의 커밋을 통해 {}개의 파일을 변경했습니다. 주요 작업: {}. 사용 기술: {}",
        analyses.len(),
        total_commits,
        total_files,
        main_work,
        techs
    )
}
