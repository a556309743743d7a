//! Web search tool: Google Custom Search plus page scraping.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use super::Tool;
use crate::config::SearchConfig;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Search the web and return the scraped text of the top results.
pub struct WebSearch {
    config: SearchConfig,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    link: String,
}

impl WebSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}?key={}&cx={}&q={}",
            self.config.endpoint,
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(&self.config.engine_id),
            urlencoding::encode(query)
        )
    }

    async fn search(&self, query: &str) -> anyhow::Result<String> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(self.config.search_timeout_secs))
            .build()?;

        let response = client.get(self.search_url(query)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Ok(format!(
                "Error: Could not reach search service (Status: {})",
                status.as_u16()
            ));
        }

        let results: SearchResponse = response.json().await?;
        if results.items.is_empty() {
            return Ok("No search results found. Try rephrasing your query.".to_string());
        }

        let mut pages = Vec::new();
        for (i, item) in results
            .items
            .iter()
            .take(self.config.max_results)
            .enumerate()
        {
            let link = item.link.trim();
            if link.is_empty() {
                continue;
            }
            let body = match self.fetch_page(&client, link).await {
                Ok(text) => text,
                Err(e) => e,
            };
            pages.push(format!("Page {}:\nURL: {}\n{}", i + 1, link, body));
        }

        tracing::debug!(query, pages = pages.len(), "Web search finished");

        if pages.is_empty() {
            Ok("No pages could be scraped successfully.".to_string())
        } else {
            Ok(join_pages(&pages))
        }
    }

    /// Fetch one result page. `Err` carries the notice shown in place of the page text.
    async fn fetch_page(&self, client: &reqwest::Client, link: &str) -> Result<String, String> {
        let url = Url::parse(link).map_err(|e| format!("Error: Invalid URL ({})", e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("Error: Unsupported URL scheme '{}'", url.scheme()));
        }

        let response = client
            .get(url)
            .timeout(Duration::from_secs(self.config.page_timeout_secs))
            .send()
            .await
            .map_err(|e| format!("Error scraping page: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!(
                "Error: Could not fetch page (Status: {})",
                status.as_u16()
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| format!("Error scraping page: {}", e))?;

        Ok(truncate_chars(
            &extract_text_from_html(&html),
            self.config.max_page_chars,
        ))
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "WebSearch"
    }

    fn description(&self) -> &str {
        "Searches the internet using Google Custom Search API and scrapes full page content for current information, facts, news, or any topic. Returns detailed content from top search results. Use this when you need recent information or facts you don't know."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let query = input.trim();
        if query.is_empty() {
            return Ok("Error: Search query is empty.".to_string());
        }

        tracing::info!("Searching the web for: {}", query);

        // Search failures are reported to the model, never propagated.
        match self.search(query).await {
            Ok(text) => Ok(text),
            Err(e) => Ok(format!("Error performing search: {}", e)),
        }
    }
}

fn join_pages(pages: &[String]) -> String {
    let separator = "=".repeat(80);
    format!(
        "{}\n\n{}",
        separator,
        pages.join(&format!("\n\n{}\n\n", separator))
    )
}

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
}

/// Extract readable text from HTML: drop scripts, styles and tags, collapse whitespace.
fn extract_text_from_html(html: &str) -> String {
    static SCRIPT: OnceLock<Regex> = OnceLock::new();
    static STYLE: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();
    static SPACE: OnceLock<Regex> = OnceLock::new();

    let text = cached(&SCRIPT, r"(?is)<script[^>]*>.*?</script>").replace_all(html, "");
    let text = cached(&STYLE, r"(?is)<style[^>]*>.*?</style>").replace_all(&text, "");
    let text = cached(&TAG, r"<[^>]+>").replace_all(&text, " ");
    let text = cached(&SPACE, r"\s+").replace_all(&text, " ");

    html_decode(text.trim())
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Keep at most `max_chars` characters, marking the cut with `...`.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
