//! HasData API client
//!
//! Two endpoints are used:
//! - `/scrape/google/serp` for organic search results
//! - `/scrape/web` for JavaScript-rendered page HTML

use async_trait::async_trait;
use cga_core::{CgaError, HasDataConfig, PageFetcher, Result, ResultRetriever, SerpResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SERVICE: &str = "HasData";

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct SerpRequest<'a> {
    q: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerpResponse {
    #[serde(default)]
    organic_results: Option<Vec<OrganicResult>>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    position: Option<u32>,
    source: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebScrapeRequest<'a> {
    url: &'a str,
    proxy_type: &'a str,
    proxy_country: &'a str,
    block_resources: bool,
    block_ads: bool,
    screenshot: bool,
    js_rendering: bool,
    exclude_html: bool,
    extract_emails: bool,
}

#[derive(Debug, Deserialize)]
struct WebScrapeResponse {
    content: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// HasData scraping API client
#[derive(Clone)]
pub struct HasDataClient {
    client: Client,
    api_key: String,
    base_url: String,
    proxy_type: String,
    proxy_country: String,
    js_rendering: bool,
    block_resources: bool,
    block_ads: bool,
}

impl HasDataClient {
    /// Create a client with default render options
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = HasDataConfig::default();
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: defaults.base_url,
            proxy_type: defaults.proxy_type,
            proxy_country: defaults.proxy_country,
            js_rendering: defaults.js_rendering,
            block_resources: defaults.block_resources,
            block_ads: defaults.block_ads,
        }
    }

    /// Create from config
    pub fn from_config(config: &HasDataConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CgaError::ConfigError("HasData API key required".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CgaError::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            proxy_type: config.proxy_type.clone(),
            proxy_country: config.proxy_country.clone(),
            js_rendering: config.js_rendering,
            block_resources: config.block_resources,
            block_ads: config.block_ads,
        })
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn web_request<'a>(&'a self, url: &'a str) -> WebScrapeRequest<'a> {
        WebScrapeRequest {
            url,
            proxy_type: &self.proxy_type,
            proxy_country: &self.proxy_country,
            block_resources: self.block_resources,
            block_ads: self.block_ads,
            screenshot: false,
            js_rendering: self.js_rendering,
            exclude_html: false,
            extract_emails: false,
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| CgaError::Http(format!("Request to {path} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CgaError::upstream(
                SERVICE,
                format!("status {}: {}", status.as_u16(), error_text),
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl ResultRetriever for HasDataClient {
    async fn retrieve(&self, keyword: &str) -> Result<Vec<SerpResult>> {
        let response = self
            .post("/scrape/google/serp", &SerpRequest { q: keyword })
            .await?;

        let parsed: SerpResponse = response
            .json()
            .await
            .map_err(|e| CgaError::upstream(SERVICE, format!("Failed to parse SERP: {e}")))?;

        let results = serp_results(parsed);
        if results.is_empty() {
            tracing::warn!("No SERP results for keyword: {}", keyword);
        } else {
            tracing::info!(
                "SERP results extracted for keyword \"{}\": {}",
                keyword,
                results.len()
            );
        }

        Ok(results)
    }

    fn name(&self) -> &str {
        "hasdata-serp"
    }
}

#[async_trait]
impl PageFetcher for HasDataClient {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.post("/scrape/web", &self.web_request(url)).await?;

        let parsed: WebScrapeResponse = response.json().await.map_err(|e| {
            CgaError::upstream(SERVICE, format!("Failed to parse page response: {e}"))
        })?;

        match parsed.content.filter(|c| !c.trim().is_empty()) {
            Some(html) => {
                tracing::info!("HTML content extracted for URL: {}", url);
                Ok(html)
            }
            None => Err(CgaError::upstream(
                SERVICE,
                format!("No HTML content returned for {url}"),
            )),
        }
    }
}

/// Convert organic results, dropping records without a link
fn serp_results(response: SerpResponse) -> Vec<SerpResult> {
    let organic = response.organic_results.unwrap_or_default();
    let total = organic.len();

    let results: Vec<SerpResult> = organic
        .into_iter()
        .filter_map(|r| {
            let link = r.link.filter(|l| !l.trim().is_empty())?;
            Some(SerpResult {
                position: r.position,
                source: r.source,
                link,
                snippet: r.snippet,
            })
        })
        .collect();

    if results.len() < total {
        tracing::debug!("Dropped {} results without a link", total - results.len());
    }

    results
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_from_config_requires_key() {
        let config = HasDataConfig::default();
        assert!(matches!(
            HasDataClient::from_config(&config),
            Err(CgaError::ConfigError(_))
        ));
    }

    #[test]
    fn test_client_from_config() {
        let config = HasDataConfig {
            api_key: Some("hd-key".to_string()),
            base_url: "http://localhost:9000/".to_string(),
            ..Default::default()
        };
        let client = HasDataClient::from_config(&config).unwrap();

        assert_eq!(client.api_key, "hd-key");
        assert_eq!(client.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_web_request_body() {
        let client = HasDataClient::new("hd-key");
        let body = serde_json::to_value(client.web_request("https://example.com")).unwrap();

        assert_eq!(
            body,
            json!({
                "url": "https://example.com",
                "proxyType": "residential",
                "proxyCountry": "US",
                "blockResources": false,
                "blockAds": false,
                "screenshot": false,
                "jsRendering": true,
                "excludeHtml": false,
                "extractEmails": false
            })
        );
    }

    #[test]
    fn test_serp_results_parsing() {
        let response: SerpResponse = serde_json::from_value(json!({
            "requestMetadata": { "status": "ok" },
            "organicResults": [
                {
                    "position": 1,
                    "title": "Paris travel guide",
                    "source": "Example",
                    "link": "https://example.com/paris",
                    "snippet": "Everything about Paris"
                },
                { "position": 2, "source": "Broken" },
                { "position": 3, "link": "https://travel.test/louvre" }
            ]
        }))
        .unwrap();

        let results = serp_results(response);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].position, Some(1));
        assert_eq!(results[0].source.as_deref(), Some("Example"));
        assert_eq!(results[0].snippet.as_deref(), Some("Everything about Paris"));
        assert_eq!(results[1].link, "https://travel.test/louvre");
        assert!(results[1].snippet.is_none());
    }

    #[test]
    fn test_serp_results_missing_organic() {
        let response: SerpResponse = serde_json::from_value(json!({})).unwrap();
        assert!(serp_results(response).is_empty());
    }
}
