//! Create-or-append publishing of a day's material to the Notion database.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::NotionError;
use crate::material::{DailyBranchData, NotionCategory};

use super::blocks::{Block, build_blocks_for_append, build_blocks_for_new};
use super::client::{NotionClient, TITLE_PROPERTY};

/// Notion's ceiling on children per request.
pub const BATCH_SIZE: usize = 100;

/// Tech option used when no detected language maps to one.
pub const DEFAULT_TECH_OPTION: &str = "공통";

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("date regex"));

/// Result of a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub id: String,
    pub url: String,
    /// `true` when content went onto an existing page for the date.
    pub appended: bool,
}

/// First `YYYY-MM-DD` in `branch`, else today's local date.
pub fn extract_date_from_branch(branch: &str) -> String {
    DATE_RE
        .find(branch)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string())
}

pub fn format_page_title(date: &str) -> String {
    format!("{} 글쓰기 소재", date)
}

/// Map detected technologies to the `기술` select option.
///
/// The first technology with a mapping wins.
pub fn determine_tech_option(techs: &[String]) -> &'static str {
    techs
        .iter()
        .find_map(|tech| match tech.to_lowercase().as_str() {
            "typescript" | "tsx" => Some("TypeScript"),
            "javascript" | "jsx" => Some("Javascript"),
            "python" => Some("Python"),
            "swift" | "kotlin" => Some("Flutter"),
            "vue" => Some("Vue"),
            "nuxt" => Some("Nuxt"),
            "astro" => Some("Astro"),
            "node" | "nodejs" => Some("NodeJS"),
            "csharp" | "c#" => Some("C#"),
            "go" | "rust" | "sql" => Some("Software"),
            _ => None,
        })
        .unwrap_or(DEFAULT_TECH_OPTION)
}

/// Database properties for a new page.
pub fn page_properties(title: &str, category: NotionCategory, tech_option: &str) -> Value {
    let mut properties = json!({
        "상태": { "status": { "name": "작성 전" } },
        "종류": { "select": { "name": category.as_str() } },
        "기술": { "select": { "name": tech_option } },
    });
    properties[TITLE_PROPERTY] = json!({ "title": [{ "text": { "content": title } }] });
    properties
}

impl NotionClient {
    /// Append `blocks` in batches of [`BATCH_SIZE`], pausing after each.
    async fn append_in_batches(&self, page_id: &str, blocks: &[Block]) -> Result<(), NotionError> {
        let total = blocks.len().div_ceil(BATCH_SIZE);
        for (index, batch) in blocks.chunks(BATCH_SIZE).enumerate() {
            info!("Appending block batch {}/{}", index + 1, total);
            self.append_children(page_id, batch).await?;
            tokio::time::sleep(self.rate_limit_delay).await;
        }
        Ok(())
    }

    /// Publish `data` to the page titled for its date.
    ///
    /// An existing page gets the append layout; otherwise a page is created
    /// with the first batch inline and the rest appended. A failed lookup is
    /// treated as "no page".
    pub async fn create_or_append(
        &self,
        database_id: &str,
        data: &DailyBranchData,
        workspace: &str,
    ) -> Result<PublishOutcome, NotionError> {
        let date = extract_date_from_branch(&data.daily_branch);
        let title = format_page_title(&date);

        let existing = match self.query_page_by_title(database_id, &title).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Error searching for existing page '{}': {}", title, e);
                None
            }
        };
        tokio::time::sleep(self.rate_limit_delay).await;

        if let Some(page) = existing {
            info!("Found existing page for {}, appending content", date);
            let blocks = build_blocks_for_append(data, workspace);
            self.append_in_batches(&page.id, &blocks).await?;
            return Ok(PublishOutcome {
                id: page.id,
                url: page.url,
                appended: true,
            });
        }

        info!("Creating new page for {}", date);
        let blocks = build_blocks_for_new(data, Some(workspace));
        let category = data
            .blog_ideas
            .first()
            .map(|idea| idea.category)
            .unwrap_or_default();
        let properties = page_properties(&title, category, determine_tech_option(&data.tech));

        let split = blocks.len().min(BATCH_SIZE);
        let (first, rest) = blocks.split_at(split);
        info!("Creating Notion page with {} blocks", blocks.len());
        let page = self.create_page(database_id, properties, first).await?;
        tokio::time::sleep(self.rate_limit_delay).await;

        self.append_in_batches(&page.id, rest).await?;

        Ok(PublishOutcome {
            id: page.id,
            url: page.url,
            appended: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_date_from_branch() {
        assert_eq!(extract_date_from_branch("daily/2024-01-15"), "2024-01-15");
        assert_eq!(extract_date_from_branch("x-2023-12-31-y-2024-01-01"), "2023-12-31");
    }

    #[test]
    fn test_extract_date_defaults_to_today() {
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        assert_eq!(extract_date_from_branch("feature/login"), today);
    }

    #[test]
    fn test_format_page_title() {
        assert_eq!(format_page_title("2024-01-15"), "2024-01-15 글쓰기 소재");
    }

    #[test]
    fn test_determine_tech_option() {
        let techs = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(determine_tech_option(&techs(&["TypeScript"])), "TypeScript");
        assert_eq!(determine_tech_option(&techs(&["markdown", "rust"])), "Software");
        assert_eq!(determine_tech_option(&techs(&["kotlin", "python"])), "Flutter");
        assert_eq!(determine_tech_option(&techs(&["markdown"])), DEFAULT_TECH_OPTION);
        assert_eq!(determine_tech_option(&[]), DEFAULT_TECH_OPTION);
    }

    #[test]
    fn test_page_properties() {
        let props = page_properties("2024-01-15 글쓰기 소재", NotionCategory::TechBlog, "Software");
        assert_eq!(props["이름"]["title"][0]["text"]["content"], "2024-01-15 글쓰기 소재");
        assert_eq!(props["상태"]["status"]["name"], "작성 전");
        assert_eq!(props["종류"]["select"]["name"], "기술 블로그");
        assert_eq!(props["기술"]["select"]["name"], "Software");
    }
}
