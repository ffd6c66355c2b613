//! CGA Configuration Management
//!
//! Handles configuration from environment variables and TOML config files.
//! Credentials are carried in the config structs and handed to each client
//! explicitly at construction time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::DEFAULT_TOP_K;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HasData scraping API (SERP and page rendering)
    pub hasdata: HasDataConfig,

    /// Natural language (entity analysis) API
    pub nlp: NlpConfig,

    /// Aggregation and pipeline settings
    pub analysis: AnalysisConfig,

    /// Fetch cache settings
    pub cache: CacheConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError { path, message },
            other => other,
        })
    }

    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // HasData
        if let Ok(key) = std::env::var("HASDATA_API_KEY") {
            self.hasdata.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("HASDATA_BASE_URL") {
            self.hasdata.base_url = url;
        }

        // Natural language API
        if let Ok(key) = std::env::var("GOOGLE_NLP_API_KEY") {
            self.nlp.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("GOOGLE_NLP_BASE_URL") {
            self.nlp.base_url = url;
        }
        if let Ok(language) = std::env::var("NLP_LANGUAGE") {
            self.nlp.language = Some(language);
        }

        // Analysis
        if let Ok(value) = std::env::var("CGA_TOP_K") {
            self.analysis.top_k = parse_env("CGA_TOP_K", value)?;
        }
        if let Ok(value) = std::env::var("CGA_MAX_RESULTS") {
            self.analysis.max_results = Some(parse_env("CGA_MAX_RESULTS", value)?);
        }
        if let Ok(value) = std::env::var("CGA_CONCURRENCY") {
            self.analysis.concurrency = parse_env("CGA_CONCURRENCY", value)?;
        }
        if let Ok(value) = std::env::var("CGA_TIE_BREAK") {
            self.analysis.tie_break = value.parse()?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Check that the configuration can drive a full analysis
    pub fn validate(&self) -> Result<(), ConfigError> {
        if is_blank(&self.hasdata.api_key) {
            return Err(ConfigError::MissingRequired("HasData API key".to_string()));
        }
        if is_blank(&self.nlp.api_key) {
            return Err(ConfigError::MissingRequired(
                "Google NLP API key".to_string(),
            ));
        }
        self.analysis.validate()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// HasData scraping API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HasDataConfig {
    /// API key sent as `x-api-key`
    pub api_key: Option<String>,

    /// API base URL
    pub base_url: String,

    /// Proxy pool used for page rendering
    pub proxy_type: String,

    /// Proxy country code
    pub proxy_country: String,

    /// Render JavaScript before returning HTML
    pub js_rendering: bool,

    /// Block images, fonts and stylesheets
    pub block_resources: bool,

    /// Block ads
    pub block_ads: bool,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HasDataConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.hasdata.com".to_string(),
            proxy_type: "residential".to_string(),
            proxy_country: "US".to_string(),
            js_rendering: true,
            block_resources: false,
            block_ads: false,
            // JS rendering through residential proxies is slow
            timeout_secs: 120,
        }
    }
}

/// Natural language API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NlpConfig {
    /// API key passed as the `key` query parameter
    pub api_key: Option<String>,

    /// API base URL
    pub base_url: String,

    /// Document language hint (ISO-639-1); detected by the service when unset
    pub language: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://language.googleapis.com/v1".to_string(),
            language: None,
            timeout_secs: 60,
        }
    }
}

/// Aggregation and pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Entities per competitor page considered for coverage
    pub top_k: usize,

    /// Maximum number of search results to analyze
    pub max_results: Option<usize>,

    /// Pages fetched and analyzed concurrently
    pub concurrency: usize,

    /// Ordering among entries with equal coverage count
    pub tie_break: TieBreak,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_results: None,
            concurrency: 4,
            tie_break: TieBreak::FirstSeen,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                key: "analysis.top_k".to_string(),
                value: "0".to_string(),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "analysis.concurrency".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Secondary ordering for coverage entries with the same count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the order in which entities were first encountered
    #[default]
    FirstSeen,
    /// Higher summed salience first, then first-seen
    TotalSalience,
}

impl std::str::FromStr for TieBreak {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "first_seen" => Ok(Self::FirstSeen),
            "total_salience" | "salience" => Ok(Self::TotalSalience),
            _ => Err(ConfigError::InvalidValue {
                key: "CGA_TIE_BREAK".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Fetch cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache fetched pages by URL
    pub enabled: bool,

    /// Maximum number of cached pages
    pub max_capacity: u64,

    /// Time-to-live for cached pages (in seconds)
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: 1_000,
            ttl_secs: 3600,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.analysis.top_k, 30);
        assert_eq!(config.analysis.tie_break, TieBreak::FirstSeen);
        assert_eq!(config.hasdata.proxy_type, "residential");
        assert!(config.hasdata.js_rendering);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_tie_break_parse() {
        assert_eq!(
            "first_seen".parse::<TieBreak>().unwrap(),
            TieBreak::FirstSeen
        );
        assert_eq!(
            "total-salience".parse::<TieBreak>().unwrap(),
            TieBreak::TotalSalience
        );
        assert!("alphabetical".parse::<TieBreak>().is_err());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = AppConfig::from_toml_str(
            r#"
            [hasdata]
            api_key = "hd-key"

            [analysis]
            top_k = 10
            tie_break = "total_salience"
            "#,
        )
        .unwrap();

        assert_eq!(config.hasdata.api_key.as_deref(), Some("hd-key"));
        assert_eq!(config.hasdata.base_url, "https://api.hasdata.com");
        assert_eq!(config.analysis.top_k, 10);
        assert_eq!(config.analysis.concurrency, 4);
        assert_eq!(config.analysis.tie_break, TieBreak::TotalSalience);
    }

    #[test]
    fn test_from_toml_invalid() {
        let err = AppConfig::from_toml_str("[analysis]\ntop_k = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_validate_requires_keys() {
        let mut config = AppConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));

        config.hasdata.api_key = Some("hd-key".to_string());
        config.nlp.api_key = Some("  ".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));

        config.nlp.api_key = Some("nlp-key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = AppConfig::default();
        config.hasdata.api_key = Some("hd-key".to_string());
        config.nlp.api_key = Some("nlp-key".to_string());
        config.analysis.top_k = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
