//! Client configuration
//!
//! [`ClientConfig`] gathers everything the client needs before it can talk to
//! the API: the API key, the output format, the default search parameters and
//! the transport settings (rate limit, retry policy, timeout).

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WosError};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.clarivate.com/api/wos";

/// A Web of Science API key
///
/// Clarivate issues keys for two API tiers. Both authenticate the same way,
/// but the Lite tier has a higher request allowance.
#[derive(Clone, PartialEq, Eq)]
pub enum ApiKey {
    Expanded(String),
    Lite(String),
}

impl ApiKey {
    pub fn as_str(&self) -> &str {
        match self {
            ApiKey::Expanded(key) | ApiKey::Lite(key) => key,
        }
    }

    /// Requests per second allowed for this key's tier
    pub fn default_rate_limit(&self) -> f64 {
        match self {
            ApiKey::Expanded(_) => 2.0,
            ApiKey::Lite(_) => 5.0,
        }
    }
}

// Keys must never end up in logs
impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKey::Expanded(_) => f.write_str("ApiKey::Expanded(***)"),
            ApiKey::Lite(_) => f.write_str("ApiKey::Lite(***)"),
        }
    }
}

/// Representation requested from the API and produced by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// JSON responses normalised into RIS records
    #[default]
    Ris,
    /// Raw JSON record objects
    Json,
    /// Raw `<records>` XML blocks
    Xml,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Ris, OutputFormat::Json, OutputFormat::Xml];

    /// Value sent in the `Accept` header
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Ris | OutputFormat::Json => "application/json",
            OutputFormat::Xml => "application/xml",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Ris => "ris",
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = WosError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ris" => Ok(OutputFormat::Ris),
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            other => Err(WosError::ConfigurationError(format!(
                "Invalid or unsupported format: {other}"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default search parameters merged under every query
///
/// Field names serialize to the API's parameter names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    #[serde(rename = "databaseId")]
    pub database_id: String,
    pub lang: String,
    pub edition: String,
    #[serde(rename = "firstRecord")]
    pub first_record: usize,
    pub count: usize,
    #[serde(rename = "sortField")]
    pub sort_field: String,
    #[serde(rename = "optionView")]
    pub option_view: String,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            database_id: "WOS".to_string(),
            lang: "en".to_string(),
            edition: "WOS+SCI".to_string(),
            first_record: 1,
            count: 100,
            sort_field: "PY".to_string(),
            option_view: "FR".to_string(),
        }
    }
}

impl SearchDefaults {
    /// The defaults as API parameter name/value pairs
    pub fn to_params(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("databaseId".to_string(), self.database_id.clone()),
            ("lang".to_string(), self.lang.clone()),
            ("edition".to_string(), self.edition.clone()),
            ("firstRecord".to_string(), self.first_record.to_string()),
            ("count".to_string(), self.count.to_string()),
            ("sortField".to_string(), self.sort_field.clone()),
            ("optionView".to_string(), self.option_view.clone()),
        ])
    }
}

/// Configuration for the Web of Science client
///
/// # Example
///
/// ```
/// use wos_client_rs::{ClientConfig, OutputFormat};
///
/// let config = ClientConfig::new()
///     .with_api_key("your_api_key_here")
///     .with_format(OutputFormat::Xml);
///
/// assert_eq!(config.format, OutputFormat::Xml);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Option<ApiKey>,
    pub format: OutputFormat,
    pub base_url: Option<String>,
    pub search_defaults: SearchDefaults,
    /// Requests per second; `None` uses the key tier's allowance
    pub rate_limit: Option<f64>,
    /// Client side request timeout; the API reports its own timeouts as HTTP 504
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
    pub retry_config: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            api_key: None,
            format: OutputFormat::default(),
            base_url: None,
            search_defaults: SearchDefaults::default(),
            rate_limit: None,
            timeout: None,
            user_agent: None,
            retry_config: RetryConfig::default(),
        }
    }

    /// Set an Expanded tier API key
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(ApiKey::Expanded(api_key.into()));
        self
    }

    /// Set a Lite tier API key
    pub fn with_lite_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(ApiKey::Lite(api_key.into()));
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_search_defaults(mut self, defaults: SearchDefaults) -> Self {
        self.search_defaults = defaults;
        self
    }

    pub fn with_rate_limit(mut self, rate: f64) -> Self {
        self.rate_limit = Some(rate);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Load the API key and search defaults from a YAML document
    ///
    /// The document must hold a `restful_wos` mapping with a `wos_expanded`
    /// or `wos_lite` key (the expanded key wins when both are present):
    ///
    /// ```yaml
    /// restful_wos:
    ///   wos_expanded: "0123456789abcdef"
    ///   defaults:
    ///     count: 50
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;
        let section = file.restful_wos.ok_or_else(|| {
            WosError::ConfigurationError("Missing `restful_wos` section in config".to_string())
        })?;

        let api_key = section.api_key().ok_or_else(|| {
            WosError::ConfigurationError(
                "No valid API key could be found in given config file!".to_string(),
            )
        })?;
        debug!(?api_key, "Loaded API key from config");

        let mut config = Self::new();
        config.api_key = Some(api_key);
        if let Some(defaults) = section.defaults {
            config.search_defaults = defaults;
        }
        Ok(config)
    }

    /// Load configuration from a YAML file, see [`ClientConfig::from_yaml_str`]
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|err| {
            WosError::ConfigurationError(format!(
                "Could not read config file {}: {err}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("wos-client-rs/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn effective_rate_limit(&self) -> f64 {
        self.rate_limit.unwrap_or_else(|| {
            self.api_key
                .as_ref()
                .map(ApiKey::default_rate_limit)
                .unwrap_or(2.0)
        })
    }

    pub fn create_rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.effective_rate_limit())
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    restful_wos: Option<ConfigSection>,
}

#[derive(Debug, Deserialize)]
struct ConfigSection {
    wos_expanded: Option<String>,
    wos_lite: Option<String>,
    defaults: Option<SearchDefaults>,
}

impl ConfigSection {
    fn api_key(&self) -> Option<ApiKey> {
        let usable = |key: &Option<String>| key.as_ref().filter(|k| !k.trim().is_empty()).cloned();

        usable(&self.wos_expanded)
            .map(ApiKey::Expanded)
            .or_else(|| usable(&self.wos_lite).map(ApiKey::Lite))
    }
}
