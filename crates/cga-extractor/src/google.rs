//! Google Cloud Natural Language client
//!
//! Calls `documents:analyzeEntities` and returns the entities with their
//! salience scores. Service-side failures come back as the
//! `EntityResponse::Error` indicator so that one bad page never aborts a
//! batch.

use async_trait::async_trait;
use cga_core::{CgaError, EntityAnalyzer, EntityResponse, NlpConfig, RawEntity, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    document: Document<'a>,
    encoding_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    #[serde(rename = "type")]
    doc_type: &'static str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    entities: Vec<WireEntity>,
}

/// Entity as encoded by the REST API
///
/// Proto3 JSON omits zero-valued fields, so an absent salience means 0.0.
#[derive(Debug, Deserialize)]
struct WireEntity {
    name: Option<String>,
    #[serde(default)]
    salience: f64,
}

impl From<WireEntity> for RawEntity {
    fn from(entity: WireEntity) -> Self {
        RawEntity {
            name: entity.name,
            salience: Some(entity.salience),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Entity analyzer backed by the Google Natural Language API
pub struct GoogleNlpClient {
    client: Client,
    api_key: String,
    base_url: String,
    language: Option<String>,
}

impl GoogleNlpClient {
    /// Create a new client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: NlpConfig::default().base_url,
            language: None,
        }
    }

    /// Create from config
    pub fn from_config(config: &NlpConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CgaError::ConfigError("Google NLP API key required".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CgaError::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }

    /// Set a document language hint
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn request<'a>(&'a self, text: &'a str) -> AnalyzeRequest<'a> {
        AnalyzeRequest {
            document: Document {
                doc_type: "PLAIN_TEXT",
                content: text,
                language: self.language.as_deref(),
            },
            encoding_type: "UTF8",
        }
    }
}

#[async_trait]
impl EntityAnalyzer for GoogleNlpClient {
    async fn analyze(&self, text: &str) -> Result<EntityResponse> {
        if text.trim().is_empty() {
            tracing::warn!("No text provided for entity analysis");
            return Ok(EntityResponse::error("No text provided"));
        }

        let response = self
            .client
            .post(format!("{}/documents:analyzeEntities", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request(text))
            .send()
            .await
            .map_err(|e| CgaError::Http(format!("Entity analysis request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                "Entity analysis failed with status {}: {}",
                status.as_u16(),
                error_text
            );
            return Ok(EntityResponse::error(error_text));
        }

        let parsed: AnalyzeResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                return Ok(EntityResponse::error(format!(
                    "Failed to parse entity response: {e}"
                )))
            }
        };

        tracing::info!("Analyzed entities: {} returned", parsed.entities.len());
        Ok(EntityResponse::entities(
            parsed.entities.into_iter().map(RawEntity::from).collect(),
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
