//! Representative code snippets from diffs, with secrets masked.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::git::FileChange;

/// Added lines kept per snippet.
pub const MAX_SNIPPET_LINES: usize = 40;

const MASK: &str = "<MASKED>";

/// A code snippet ready for publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    pub language: String,
    /// Added lines with secrets masked and common indentation removed.
    pub example_code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// A named regex replacement applied to code before it is published.
pub struct MaskingRule {
    pub pattern: Regex,
    pub replacement: &'static str,
}

impl MaskingRule {
    fn new(pattern: &str, replacement: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("masking rule regex"),
            replacement,
        }
    }
}

static MASKING_RULES: LazyLock<Vec<MaskingRule>> = LazyLock::new(|| {
    vec![
        MaskingRule::new(
            r"(https?://)[^/\s:@]+:[^/\s@]+@",
            "${1}<MASKED>@",
        ),
        MaskingRule::new(
            r"(?i)(bearer\s+)[A-Za-z0-9\-._~+/]+=*",
            "${1}<MASKED>",
        ),
        MaskingRule::new(
            r#"(?i)((?:api[_-]?key|secret|token|password|passwd|private[_-]?key|access[_-]?key)\w*["']?\s*[:=]\s*)(["'])[^"'\n]*["']"#,
            "${1}${2}<MASKED>${2}",
        ),
        MaskingRule::new(
            r#"(?m)^(\s*(?:export\s+)?[A-Z0-9_]*(?:KEY|SECRET|TOKEN|PASSWORD)[A-Z0-9_]*\s*=\s*)[^\s'"]\S*"#,
            "${1}<MASKED>",
        ),
        MaskingRule::new(
            r"\b(?:sk|pk|rk)-[A-Za-z0-9_\-]{16,}|\bgh[pousr]_[A-Za-z0-9]{20,}|\bxox[abprs]-[A-Za-z0-9\-]{10,}|\bsecret_[A-Za-z0-9]{20,}",
            MASK,
        ),
        MaskingRule::new(
            r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}",
            "user@example.com",
        ),
    ]
});

/// The masking rules, in application order.
pub fn masking_rules() -> &'static [MaskingRule] {
    &MASKING_RULES
}

/// Apply every masking rule to `code`.
pub fn mask_secrets(code: &str) -> String {
    masking_rules()
        .iter()
        .fold(code.to_string(), |acc, rule| {
            rule.pattern.replace_all(&acc, rule.replacement).into_owned()
        })
}

/// Lines added by a unified diff, without the leading `+`.
fn added_lines(diff: &str) -> Vec<&str> {
    diff.lines()
        .filter(|line| !line.starts_with("+++"))
        .filter_map(|line| line.strip_prefix('+'))
        .collect()
}

fn dedent(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Snippets from the first `max_blocks` files that have a detected language
/// and at least one non-blank added line.
pub fn extract_code_blocks(files: &[FileChange], max_blocks: usize) -> Vec<CodeBlock> {
    files
        .iter()
        .filter_map(|file| {
            let language = file.language.as_deref()?;
            let mut lines = added_lines(&file.diff);
            lines.truncate(MAX_SNIPPET_LINES);
            while lines.last().is_some_and(|l| l.trim().is_empty()) {
                lines.pop();
            }
            if lines.iter().all(|l| l.trim().is_empty()) {
                return None;
            }

            Some(CodeBlock {
                language: language.to_string(),
                example_code: mask_secrets(&dedent(&lines)),
                description: format!(
                    "{}의 주요 변경사항 (+{}/-{})",
                    file.path, file.additions, file.deletions
                ),
                file_path: Some(file.path.clone()),
            })
        })
        .take(max_blocks)
        .collect()
}
