//! Process-wide configuration, fixed at startup
//!
//! Everything the adapter needs from its environment is validated once into a
//! [`Config`] and then shared read-only with the backend client.

use thiserror::Error;
use url::Url;

use crate::ErrorKind;

/// Errors raised while validating startup configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing backend URL (set GIGAHARD_BACKEND_URL or --backend-url)")]
    MissingBackendUrl,

    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("Missing API key (set GIGAHARD_API_KEY or --api-key)")]
    MissingApiKey,

    #[error("API key contains characters that cannot be sent in a header")]
    InvalidApiKey,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl ConfigError {
    /// Every configuration failure is fatal at startup
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

/// Whether the process may start without an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiKeyPolicy {
    /// Start anyway and send an empty `X-MCP-API-Key` header
    #[default]
    Optional,
    /// Refuse to start without a key
    Required,
}

/// Raw, unvalidated settings as they come from flags or the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigInput {
    pub backend_url: Option<String>,
    pub api_key: Option<String>,
    pub mcp_id: Option<String>,
    pub api_key_policy: ApiKeyPolicy,
}

/// Validated adapter configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, always ending in `/` so endpoint paths join under it
    pub backend_url: Url,
    /// Credential forwarded in `X-MCP-API-Key`
    pub api_key: Option<String>,
    /// Routing identifier forwarded as the `mcpId` query parameter
    pub mcp_id: Option<String>,
}

impl Config {
    /// Validate raw settings into a configuration
    ///
    /// Blank values are treated as absent. The backend URL is mandatory; the
    /// API key is mandatory only under [`ApiKeyPolicy::Required`].
    pub fn new(input: ConfigInput) -> Result<Self, ConfigError> {
        let raw_url = non_blank(input.backend_url).ok_or(ConfigError::MissingBackendUrl)?;
        let backend_url = parse_base_url(&raw_url)?;

        let api_key = present(input.api_key);
        if api_key.is_none() && input.api_key_policy == ApiKeyPolicy::Required {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(Self {
            backend_url,
            api_key,
            mcp_id: present(input.mcp_id),
        })
    }

    /// Resolve a backend endpoint path against the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.backend_url.join(path.trim_start_matches('/'))
    }

    /// The value sent in the API key header, empty when none is configured
    pub fn api_key_header(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Like `non_blank`, but a non-blank value is kept exactly as given
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBackendUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http or https URL".to_string()));
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
