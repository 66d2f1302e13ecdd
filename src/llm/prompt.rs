//! Prompt construction for blog drafts.

use crate::analysis::BranchAnalysis;

/// Number of changed files listed in the prompt.
const PROMPT_FILE_LIMIT: usize = 5;

/// Build the draft prompt for one analyzed branch.
///
/// Every provider receives the same text.
pub fn build_prompt(analysis: &BranchAnalysis) -> String {
    let commit_summary = analysis
        .commits
        .iter()
        .map(|c| match &c.body {
            Some(body) => format!("- [{}] {}\n  {}", c.commit_type, c.subject, body),
            None => format!("- [{}] {}", c.commit_type, c.subject),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let files_summary = analysis
        .files_changed
        .iter()
        .take(PROMPT_FILE_LIMIT)
        .map(|f| format!("- {} (+{}/-{})", f.path, f.additions, f.deletions))
        .collect::<Vec<_>>()
        .join("\n");

    let pr_info = match &analysis.pr_info {
        Some(pr) => format!("PR #{}: {}\n{}", pr.number, pr.title, pr.body),
        None => "No PR information".to_string(),
    };

    format!(
        r#"당신은 기술 블로그 작성 전문가입니다. 다음 Git 브랜치 분석 데이터를 바탕으로 블로그 초안을 작성해주세요.

## 브랜치 정보
- 브랜치명: {branch}
- 요약: {summary}

## 커밋 목록
{commit_summary}

## 변경된 파일 (상위 5개)
{files_summary}

## PR 정보
{pr_info}

## 요청사항
다음 JSON 형식으로 응답해주세요:
```json
{{
  "title": "블로그 제목 (한국어)",
  "keyPoints": ["핵심 포인트 1", "핵심 포인트 2", "핵심 포인트 3"],
  "codeExplanation": "코드 변경사항에 대한 설명 (한국어, 2-3문장)"
}}
```

주의사항:
- 제목은 간결하고 매력적이어야 합니다
- 핵심 포인트는 3-5개여야 합니다
- 모든 텍스트는 한국어로 작성해주세요
- JSON만 응답해주세요 (추가 설명 없음)"#,
        branch = analysis.branch_name,
        summary = analysis.summary,
    )
}
