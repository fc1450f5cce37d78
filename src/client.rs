use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::document::{decode_page, decode_post};
use crate::models::{Page, PostDocument};

/// Where posts come from. Implemented over HTTP by [`PrismicClient`];
/// tests substitute in-memory sources.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// First page of the post listing
    async fn first_page(&self, page_size: u32) -> Result<Page>;

    /// The page a previous page's `next_cursor` points to
    async fn page_at(&self, cursor: &str) -> Result<Page>;

    /// A full post, or `None` when no post has this uid
    async fn post_by_uid(&self, uid: &str) -> Result<Option<PostDocument>>;
}

#[derive(Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    id: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

/// Client for the Prismic REST API v2
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl PrismicClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("spacetraveling/0.1")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.api_endpoint.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// Fetches JSON from `url` with the given query parameters
    /// Returns an error if the request fails or the status is not a success
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let mut params: Vec<(&str, String)> = query.to_vec();
        if let Some(token) = &self.access_token {
            if !url.contains("access_token=") {
                params.push(("access_token", token.clone()));
            }
        }

        debug!(url, "GET");
        let response = self.http.get(url).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Request to {} failed: {}", url, response.status()));
        }

        let value = response
            .json::<Value>()
            .await
            .with_context(|| format!("Response from {} is not JSON", url))?;
        Ok(value)
    }

    /// The ref of the currently published content release
    async fn master_ref(&self) -> Result<String> {
        let info: ApiInfo = serde_json::from_value(self.get_json(&self.endpoint, &[]).await?)
            .context("Unexpected API description")?;

        info.refs
            .into_iter()
            .find(|r| r.is_master)
            .map(|r| r.id)
            .ok_or_else(|| anyhow!("API at {} has no master ref", self.endpoint))
    }

    async fn search(&self, predicate: String, page_size: u32) -> Result<Value> {
        let master = self.master_ref().await?;
        let url = format!("{}/documents/search", self.endpoint);
        let query = [
            ("ref", master),
            ("q", format!("[{}]", predicate)),
            ("pageSize", page_size.to_string()),
        ];
        self.get_json(&url, &query).await
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn first_page(&self, page_size: u32) -> Result<Page> {
        let value = self
            .search(r#"[at(document.type,"posts")]"#.to_string(), page_size)
            .await?;
        let page = decode_page(&value).context("Malformed listing page")?;
        debug!(
            items = page.items.len(),
            has_next = page.next_cursor.is_some(),
            "fetched first page"
        );
        Ok(page)
    }

    async fn page_at(&self, cursor: &str) -> Result<Page> {
        let value = self.get_json(cursor, &[]).await?;
        let page = decode_page(&value)
            .with_context(|| format!("Malformed listing page at {}", cursor))?;
        debug!(
            items = page.items.len(),
            has_next = page.next_cursor.is_some(),
            "fetched next page"
        );
        Ok(page)
    }

    async fn post_by_uid(&self, uid: &str) -> Result<Option<PostDocument>> {
        let predicate = format!("[at(my.posts.uid,{})]", serde_json::to_string(uid)?);
        let value = self.search(predicate, 1).await?;

        let first = value
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("Search response has no results list"))?
            .first();

        match first {
            Some(doc) => {
                let post = decode_post(doc).with_context(|| format!("Malformed post {}", uid))?;
                Ok(Some(post))
            }
            None => Ok(None),
        }
    }
}
