//! Thin Notion REST client over reqwest.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::NotionError;

use super::blocks::Block;

const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// Pause between consecutive Notion calls of one publish.
pub const RATE_LIMIT_DELAY: Duration = Duration::from_millis(350);

/// Title property of the blog-material database.
pub const TITLE_PROPERTY: &str = "이름";

/// A page identified by id and URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub id: String,
    pub url: String,
}

impl PageRef {
    fn from_response(value: &Value) -> Result<Self, NotionError> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or(NotionError::MissingField("id"))?
            .to_string();
        let url = value
            .get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://notion.so/{}", id.replace('-', "")));
        Ok(Self { id, url })
    }
}

pub struct NotionClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    pub(crate) rate_limit_delay: Duration,
}

impl NotionClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit_delay: RATE_LIMIT_DELAY,
        }
    }

    /// Point the client at another API root (ending in the version path).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, NotionError> {
        let response = request.send().await.map_err(NotionError::Request)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotionError::Api {
                status: status.as_u16(),
                body,
            });
        }
        response.json().await.map_err(NotionError::Request)
    }

    /// Fetch the database, failing if it is missing or the key is rejected.
    pub async fn retrieve_database(&self, database_id: &str) -> Result<(), NotionError> {
        self.send(self.request(reqwest::Method::GET, &format!("/databases/{}", database_id)))
            .await
            .map(|_| ())
    }

    /// Whether the key can read the database.
    pub async fn test_connection(&self, database_id: &str) -> bool {
        match self.retrieve_database(database_id).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Notion connectivity check failed: {}", e);
                false
            }
        }
    }

    /// First page in the database whose title equals `title`.
    pub async fn query_page_by_title(
        &self,
        database_id: &str,
        title: &str,
    ) -> Result<Option<PageRef>, NotionError> {
        let request = self
            .request(
                reqwest::Method::POST,
                &format!("/databases/{}/query", database_id),
            )
            .json(&json!({
                "filter": { "property": TITLE_PROPERTY, "title": { "equals": title } },
                "page_size": 1,
            }));

        let response = self.send(request).await?;
        response
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .map(PageRef::from_response)
            .transpose()
    }

    /// Create a page in the database with `properties` and initial `children`.
    pub async fn create_page(
        &self,
        database_id: &str,
        properties: Value,
        children: &[Block],
    ) -> Result<PageRef, NotionError> {
        let request = self.request(reqwest::Method::POST, "/pages").json(&json!({
            "parent": { "database_id": database_id },
            "properties": properties,
            "children": children.iter().map(Block::to_json).collect::<Vec<_>>(),
        }));

        let response = self.send(request).await?;
        PageRef::from_response(&response)
    }

    /// Append `children` to a page or block in one request.
    pub async fn append_children(
        &self,
        block_id: &str,
        children: &[Block],
    ) -> Result<(), NotionError> {
        let request = self
            .request(
                reqwest::Method::PATCH,
                &format!("/blocks/{}/children", block_id),
            )
            .json(&json!({
                "children": children.iter().map(Block::to_json).collect::<Vec<_>>(),
            }));

        self.send(request).await.map(|_| ())
    }
}
