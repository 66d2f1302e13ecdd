//! Slack webhook notifications about a run.
//!
//! Delivery is best-effort: failures are logged and never surface to the
//! caller.

use std::path::Path;

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::notion::extract_date_from_branch;
use crate::pipeline::PipelineResult;

pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

fn header(text: &str) -> Value {
    json!({
        "type": "header",
        "text": { "type": "plain_text", "text": text, "emoji": true },
    })
}

fn field(label: &str, value: impl std::fmt::Display) -> Value {
    json!({ "type": "mrkdwn", "text": format!("*{}:*\n{}", label, value) })
}

/// Block message for a successful run.
pub fn success_message(result: &PipelineResult, workspace: &str, daily_branch: &str) -> Value {
    let mode = if result.appended == Some(true) {
        "기존 페이지에 추가"
    } else {
        "새 페이지 생성"
    };

    json!({
        "blocks": [
            header("📝 블로그 소재 생성 완료"),
            {
                "type": "section",
                "fields": [
                    field("날짜", extract_date_from_branch(daily_branch)),
                    field("워크스페이스", workspace),
                    field("분석된 브랜치", format!("{}개", result.branches_analyzed)),
                    field("블로그 아이디어", format!("{}개", result.blog_ideas_generated)),
                ],
            },
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": format!("*모드:* {}", mode) },
            },
            {
                "type": "actions",
                "elements": [{
                    "type": "button",
                    "text": { "type": "plain_text", "text": "Notion에서 보기", "emoji": true },
                    "url": result.notion_url.as_deref().unwrap_or_default(),
                    "style": "primary",
                }],
            },
        ],
    })
}

/// Block message for a failed run, pointing at the run log when one was written.
pub fn failure_message(
    result: &PipelineResult,
    workspace: &str,
    daily_branch: &str,
    log_path: Option<&Path>,
) -> Value {
    let errors = if result.errors.is_empty() {
        "알 수 없는 오류".to_string()
    } else {
        result.errors.join("\n• ")
    };

    let mut blocks = vec![
        header("❌ 블로그 소재 생성 실패"),
        json!({
            "type": "section",
            "fields": [
                field("날짜", extract_date_from_branch(daily_branch)),
                field("워크스페이스", workspace),
                field("대상 브랜치", daily_branch),
            ],
        }),
        json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("*오류 내용:*\n• {}", errors) },
        }),
    ];

    if let Some(path) = log_path {
        blocks.push(json!({
            "type": "context",
            "elements": [{
                "type": "mrkdwn",
                "text": format!("📋 로그 파일: `{}`", path.display()),
            }],
        }));
    }

    json!({ "blocks": blocks })
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.into(),
        }
    }

    pub async fn notify_success(&self, result: &PipelineResult, workspace: &str, daily_branch: &str) {
        if self
            .post(&success_message(result, workspace, daily_branch))
            .await
        {
            info!("Slack notification sent");
        }
    }

    pub async fn notify_failure(
        &self,
        result: &PipelineResult,
        workspace: &str,
        daily_branch: &str,
        log_path: Option<&Path>,
    ) {
        if self
            .post(&failure_message(result, workspace, daily_branch, log_path))
            .await
        {
            info!("Slack failure notification sent");
        }
    }

    async fn post(&self, message: &Value) -> bool {
        match self.client.post(&self.webhook_url).json(message).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!("Slack notification failed ({}): {}", status, body);
                false
            }
            Err(e) => {
                warn!("Slack notification error: {}", e);
                false
            }
        }
    }
}
