//! Worker configuration loaded from environment variables.
//!
//! Loading is fail-fast: a missing `DATABASE_URL` or any present but
//! unparsable value stops startup with a clear message.

use std::env;
use std::time::Duration;

use serde::Deserialize;
use unison_connector::RestAdapterConfig;
use unison_core::config::{parse_var, required_var};
use unison_core::{ConfigError, Provider};
use unison_sync::SyncSettings;
use unison_webhooks::{WebhookEndpoint, WebhookSettings};

const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// One provider connection as written in `UNISON_PROVIDERS`.
#[derive(Debug, Clone, Deserialize)]
struct ProviderEntry {
    provider: Provider,
    base_url: String,
    api_token: String,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

impl From<ProviderEntry> for RestAdapterConfig {
    fn from(entry: ProviderEntry) -> Self {
        let config = RestAdapterConfig::new(entry.provider, entry.base_url, entry.api_token);
        match entry.timeout_ms {
            Some(ms) => config.with_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }
}

/// Everything the worker needs to start.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub log_filter: String,
    /// Provider API connections, one adapter each.
    pub providers: Vec<RestAdapterConfig>,
    pub endpoints: Vec<WebhookEndpoint>,
    pub sync: SyncSettings,
    pub webhooks: WebhookSettings,
}

impl WorkerConfig {
    /// Load the configuration.
    ///
    /// - `DATABASE_URL` (required)
    /// - `UNISON_DB_MAX_CONNECTIONS` (default 10)
    /// - `UNISON_LOG`, then `RUST_LOG` (default `info`)
    /// - `UNISON_PROVIDERS`: JSON array of
    ///   `{"provider", "base_url", "api_token", "timeout_ms"?}`
    /// - `UNISON_WEBHOOK_ENDPOINTS`: JSON array of webhook endpoints
    ///
    /// plus the variables read by [`SyncSettings::from_env`] and
    /// [`WebhookSettings::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let log_filter = env::var("UNISON_LOG")
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        let providers = match env::var("UNISON_PROVIDERS") {
            Ok(raw) => parse_providers("UNISON_PROVIDERS", &raw)?,
            Err(_) => Vec::new(),
        };
        let endpoints = match env::var("UNISON_WEBHOOK_ENDPOINTS") {
            Ok(raw) => parse_endpoints("UNISON_WEBHOOK_ENDPOINTS", &raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            database_url: required_var("DATABASE_URL")?,
            db_max_connections: parse_var("UNISON_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            log_filter,
            providers,
            endpoints,
            sync: SyncSettings::from_env()?,
            webhooks: WebhookSettings::from_env()?,
        })
    }
}

/// Parse the provider list; a provider may appear only once.
pub fn parse_providers(var: &str, raw: &str) -> Result<Vec<RestAdapterConfig>, ConfigError> {
    let entries: Vec<ProviderEntry> = serde_json::from_str(raw)
        .map_err(|e| ConfigError::invalid(var, format!("not a provider list: {e}")))?;

    let mut seen = Vec::with_capacity(entries.len());
    for entry in &entries {
        if seen.contains(&entry.provider) {
            return Err(ConfigError::invalid(var, format!("provider {} listed twice", entry.provider)));
        }
        if entry.base_url.trim().is_empty() {
            return Err(ConfigError::invalid(var, format!("provider {} has no base_url", entry.provider)));
        }
        seen.push(entry.provider);
    }
    Ok(entries.into_iter().map(RestAdapterConfig::from).collect())
}

/// Parse the webhook endpoint list.
pub fn parse_endpoints(var: &str, raw: &str) -> Result<Vec<WebhookEndpoint>, ConfigError> {
    let endpoints: Vec<WebhookEndpoint> = serde_json::from_str(raw)
        .map_err(|e| ConfigError::invalid(var, format!("not an endpoint list: {e}")))?;
    if let Some(bad) = endpoints
        .iter()
        .find(|e| !(e.url.starts_with("https://") || e.url.starts_with("http://")))
    {
        return Err(ConfigError::invalid(var, format!("'{}' is not an http(s) url", bad.url)));
    }
    Ok(endpoints)
}
