//! Web search tool backed by DuckDuckGo's HTML endpoint

use crate::error::Result;
use crate::impl_tool_factory;
use crate::tools::{Tool, ToolCall, ToolExample, ToolResult};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const DEFAULT_REGION: &str = "us-en";

/// A single search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub href: String,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search backend is rate limiting requests")]
    RateLimited,

    #[error("{0}")]
    Backend(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        SearchError::Backend(e.to_string())
    }
}

/// Source of web search results
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(
        &self,
        keywords: &str,
        region: &str,
        max_results: Option<usize>,
    ) -> std::result::Result<Vec<SearchHit>, SearchError>;
}

/// Scrapes the DuckDuckGo HTML results page
pub struct DuckDuckGoBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGoBackend {
    pub fn new() -> Self {
        Self::with_endpoint(DUCKDUCKGO_HTML_URL)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Default for DuckDuckGoBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoBackend {
    async fn search(
        &self,
        keywords: &str,
        region: &str,
        max_results: Option<usize>,
    ) -> std::result::Result<Vec<SearchHit>, SearchError> {
        if keywords.trim().is_empty() {
            return Err(SearchError::Backend("keywords is mandatory".to_string()));
        }

        tracing::debug!(keywords, region, "querying duckduckgo");
        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[("q", keywords), ("kl", region)])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 202 || status.as_u16() == 429 {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            return Err(SearchError::Backend(format!(
                "{} returned {}",
                self.endpoint, status
            )));
        }

        let html = response.text().await?;
        if is_anomaly_page(&html) {
            return Err(SearchError::RateLimited);
        }

        let mut hits = parse_results(&html);
        if let Some(max) = max_results {
            hits.truncate(max);
        }
        Ok(hits)
    }
}

fn is_anomaly_page(html: &str) -> bool {
    html.contains("anomaly-modal") || html.contains("bots use DuckDuckGo too")
}

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)
        .expect("valid title regex")
});
static SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#)
        .expect("valid snippet regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

/// Extract hits from a results page, skipping ads and duplicate links
pub fn parse_results(html: &str) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = Vec::new();

    for chunk in html.split("result__body").skip(1) {
        let Some(caps) = TITLE_RE.captures(chunk) else {
            continue;
        };
        let raw_href = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let Some(href) = decode_href(raw_href) else {
            continue;
        };
        if hits.iter().any(|h| h.href == href) {
            continue;
        }

        let title = clean_text(caps.get(2).map(|m| m.as_str()).unwrap_or_default());
        let body = SNIPPET_RE
            .captures(chunk)
            .and_then(|c| c.get(1))
            .map(|m| clean_text(m.as_str()))
            .unwrap_or_default();

        if title.is_empty() {
            continue;
        }
        hits.push(SearchHit { title, href, body });
    }

    hits
}

/// Resolve DuckDuckGo redirect links to the target URL; ads yield `None`
fn decode_href(raw: &str) -> Option<String> {
    let raw = html_decode(raw);
    let absolute = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw
    };

    let parsed = url::Url::parse(&absolute).ok()?;
    let is_ddg = parsed
        .host_str()
        .map(|h| h.ends_with("duckduckgo.com"))
        .unwrap_or(false);

    if !is_ddg {
        return Some(absolute);
    }
    if parsed.path().starts_with("/y.js") {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(k, _)| k == "uddg")
        .map(|(_, v)| v.into_owned())
}

fn clean_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, "");
    html_decode(stripped.trim())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn html_decode(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Tool that searches the web for up-to-date information
pub struct WebSearchTool {
    backend: Arc<dyn SearchBackend>,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self::with_backend(Arc::new(DuckDuckGoBackend::new()))
    }

    pub fn with_backend(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "websearch"
    }

    fn description(&self) -> &str {
        "Search the web to get updated information. Returns a list of results with title, href and body."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "keywords": {
                    "type": "string",
                    "description": "The search query keywords"
                },
                "region": {
                    "type": "string",
                    "description": "The search region: wt-wt, us-en, uk-en, ru-ru, etc.",
                    "default": DEFAULT_REGION
                },
                "max_results": {
                    "type": ["integer", "null"],
                    "description": "The maximum number of results to return"
                }
            },
            "required": ["keywords"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let keywords: String = call.get_parameter("keywords")?;
        let region: String = call.get_parameter_or("region", DEFAULT_REGION.to_string());
        let max_results: Option<usize> = call.get_optional_parameter("max_results")?;

        match self.backend.search(&keywords, &region, max_results).await {
            Ok(hits) if hits.is_empty() => Ok(ToolResult::success(&call.id, "No results found.")),
            Ok(hits) => {
                let data = serde_json::to_value(&hits)?;
                let content = serde_json::to_string_pretty(&hits)?;
                Ok(ToolResult::success(&call.id, content).with_data(data))
            }
            Err(SearchError::RateLimited) => {
                tracing::warn!(%keywords, "web search rate limited");
                Ok(failed(
                    &call.id,
                    "RatelimitException: Please try again after a short delay.",
                ))
            }
            Err(SearchError::Backend(detail)) => {
                tracing::warn!(%keywords, error = %detail, "web search failed");
                Ok(failed(
                    &call.id,
                    format!("DuckDuckGoSearchException: {}", detail),
                ))
            }
        }
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Look up recent news".to_string(),
            parameters: json!({"keywords": "rust 2024 edition release", "max_results": 3}),
            expected_result: "[{\"title\": \"...\", \"href\": \"https://...\", \"body\": \"...\"}]"
                .to_string(),
        }]
    }
}

// Search failures keep the search library's wording instead of the usual `Error: ` prefix.
fn failed(call_id: &str, message: impl Into<String>) -> ToolResult {
    ToolResult {
        success: false,
        ..ToolResult::success(call_id, message)
    }
}

impl_tool_factory!(
    WebSearchToolFactory,
    WebSearchTool,
    "websearch",
    "Search the web to get updated information. Returns a list of results with title, href and body."
);
