//! HTTP adapter for the provider REST APIs.
//!
//! One adapter per provider. Each call is made exactly once; the client
//! timeout bounds it and a timeout surfaces as a remote provider failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use unison_core::{ObjectKind, Provider};

use crate::error::{truncate_body, ConnectorError, ConnectorResult};
use crate::traits::ResourceAdapter;
use crate::types::{RemoteProperty, RemoteResult, TenantContext};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Creation endpoint for a routed kind.
fn create_path(provider: Provider, kind: ObjectKind) -> Option<&'static str> {
    use ObjectKind::{Company, Contact, EngagementCall, EngagementEmail, EngagementMeeting};
    match (provider, kind) {
        (Provider::Hubspot, EngagementCall) => Some("/crm/v3/objects/calls"),
        (Provider::Hubspot, EngagementMeeting) => Some("/crm/v3/objects/meetings"),
        (Provider::Hubspot, EngagementEmail) => Some("/crm/v3/objects/emails"),
        (Provider::Hubspot, Contact) => Some("/crm/v3/objects/contacts"),
        (Provider::Hubspot, Company) => Some("/crm/v3/objects/companies"),
        (Provider::Zoho, EngagementCall) => Some("/crm/v2/Calls"),
        (Provider::Zoho, EngagementMeeting) => Some("/crm/v2/Events"),
        (Provider::Zoho, Company) => Some("/crm/v2/Accounts"),
        (Provider::Pipedrive, EngagementCall | EngagementMeeting | EngagementEmail) => {
            Some("/v1/activities")
        }
        (Provider::Pipedrive, Contact) => Some("/v1/persons"),
        (Provider::Zendesk, EngagementCall) => Some("/v2/calls"),
        (Provider::Zendesk, EngagementMeeting) => Some("/v2/appointments"),
        (Provider::Zendesk, EngagementEmail) => Some("/v2/emails"),
        (Provider::Zendesk, Contact) => Some("/v2/contacts"),
        _ => None,
    }
}

/// Property listing endpoint for a kind, if the provider exposes one.
fn properties_path(provider: Provider, kind: ObjectKind) -> Option<String> {
    match provider {
        Provider::Hubspot => {
            let object = match kind {
                ObjectKind::EngagementCall => "calls",
                ObjectKind::EngagementMeeting => "meetings",
                ObjectKind::EngagementEmail => "emails",
                ObjectKind::Contact => "contacts",
                ObjectKind::Company => "companies",
                ObjectKind::Engagement => return None,
            };
            Some(format!("/crm/v3/properties/{object}"))
        }
        Provider::Zendesk if kind == ObjectKind::Contact => {
            Some("/v2/custom_fields?resource_type=contact".to_string())
        }
        _ => None,
    }
}

/// Connection settings for one provider.
#[derive(Clone)]
pub struct RestAdapterConfig {
    pub provider: Provider,
    pub base_url: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for RestAdapterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAdapterConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_token", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RestAdapterConfig {
    pub fn new(provider: Provider, base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            provider,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`ResourceAdapter`] over a provider's public REST API.
pub struct RestAdapter {
    config: RestAdapterConfig,
    client: Client,
    produces: Vec<ObjectKind>,
}

impl std::fmt::Debug for RestAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAdapter")
            .field("config", &self.config)
            .field("produces", &self.produces)
            .finish()
    }
}

impl RestAdapter {
    /// Create an adapter with its own HTTP client.
    pub fn new(config: RestAdapterConfig) -> ConnectorResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ConnectorError::remote_transport(
                    config.provider,
                    format!("failed to build HTTP client: {e}"),
                )
            })?;

        let produces = ObjectKind::all()
            .iter()
            .copied()
            .filter(|kind| create_path(config.provider, *kind).is_some())
            .collect();

        Ok(Self {
            config,
            client,
            produces,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(header::ACCEPT, "application/json");
        match self.config.provider {
            Provider::Pipedrive => builder.query(&[("api_token", self.config.api_token.as_str())]),
            Provider::Zoho => builder.header(
                header::AUTHORIZATION,
                format!("Zoho-oauthtoken {}", self.config.api_token),
            ),
            _ => builder.bearer_auth(&self.config.api_token),
        }
    }

    fn transport_error(&self, err: &reqwest::Error) -> ConnectorError {
        if err.is_timeout() {
            let after_ms = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX);
            ConnectorError::remote_timeout(self.config.provider, after_ms)
        } else {
            ConnectorError::remote_transport(self.config.provider, err.to_string())
        }
    }

    /// Read a response, failing on non-2xx. Empty bodies read as `{}`.
    async fn read(&self, response: Response) -> ConnectorResult<(u16, Value)> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            warn!(
                provider = %self.config.provider,
                status = %status,
                "Provider rejected request"
            );
            let body = (!body.is_empty()).then(|| truncate_body(body));
            return Err(ConnectorError::remote_status(
                self.config.provider,
                status.as_u16(),
                body,
            ));
        }

        let data = if body.trim().is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(&body).map_err(|e| {
                ConnectorError::remote_transport(
                    self.config.provider,
                    format!("response is not JSON: {e}"),
                )
            })?
        };
        Ok((status.as_u16(), data))
    }
}

#[async_trait]
impl ResourceAdapter for RestAdapter {
    fn provider(&self) -> Provider {
        self.config.provider
    }

    fn produces(&self) -> &[ObjectKind] {
        &self.produces
    }

    #[instrument(skip(self, payload, ctx), fields(provider = %self.config.provider, tenant_id = %ctx.tenant_id))]
    async fn create(
        &self,
        kind: ObjectKind,
        payload: Value,
        ctx: &TenantContext,
    ) -> ConnectorResult<RemoteResult> {
        let path = create_path(self.config.provider, kind)
            .ok_or_else(|| ConnectorError::unsupported_mapping(self.config.provider, kind))?;
        let url = self.url(path);

        debug!(url = %url, kind = %kind, "Creating remote object");

        let response = self
            .authorize(self.client.post(&url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let (status_code, data) = self.read(response).await?;

        info!(kind = %kind, status = status_code, "Remote object created");
        Ok(RemoteResult::new(data, status_code))
    }

    #[instrument(skip(self, ctx), fields(provider = %self.config.provider, tenant_id = %ctx.tenant_id))]
    async fn custom_properties(
        &self,
        kind: ObjectKind,
        ctx: &TenantContext,
    ) -> ConnectorResult<Vec<RemoteProperty>> {
        let Some(path) = properties_path(self.config.provider, kind) else {
            return Ok(Vec::new());
        };
        let url = self.url(&path);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let (_, data) = self.read(response).await?;

        let properties = match self.config.provider {
            Provider::Hubspot => data
                .get("results")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| property(item, "name", "label", "type"))
                        .collect()
                })
                .unwrap_or_default(),
            Provider::Zendesk => data
                .get("items")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.get("data"))
                        .filter_map(|item| property(item, "name", "name", "type"))
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        debug!(kind = %kind, count = properties.len(), "Listed remote properties");
        Ok(properties)
    }
}

fn property(item: &Value, name: &str, label: &str, data_type: &str) -> Option<RemoteProperty> {
    let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
    Some(RemoteProperty {
        name: text(name)?,
        label: text(label),
        data_type: text(data_type),
    })
}
