//! GraphQL executor with per-tenant isolation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::{Result, SyncError};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::provider::{CircuitRegistry, TokenProvider};
use crate::rate_limit::ApiRateLimiter;
use crate::retry::{RetryConfig, with_retry};
use crate::settings::GraphQlSettings;
use crate::tenant::Tenant;

use super::queries::GraphQlQuery;

/// Executes a GraphQL query on behalf of a tenant and returns its `data`.
#[async_trait]
pub trait GraphQlClient: Send + Sync {
    async fn execute(&self, tenant: &Tenant, query: &GraphQlQuery) -> Result<Value>;
}

/// Execute and deserialize the `data` object.
pub async fn query_as<T: DeserializeOwned>(
    client: &dyn GraphQlClient,
    tenant: &Tenant,
    query: &GraphQlQuery,
) -> Result<T> {
    let data = client.execute(tenant, query).await?;
    Ok(serde_json::from_value(data)?)
}

/// Production client: circuit check, rate limit, token, timed POST, retry.
pub struct HttpGraphQlClient {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenProvider>,
    circuits: Arc<CircuitRegistry>,
    limiter: ApiRateLimiter,
    settings: GraphQlSettings,
    retry: RetryConfig,
}

impl HttpGraphQlClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenProvider>,
        circuits: Arc<CircuitRegistry>,
        settings: GraphQlSettings,
    ) -> Self {
        Self {
            transport,
            tokens,
            circuits,
            limiter: ApiRateLimiter::new(settings.requests_per_second),
            settings,
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/graphql", self.settings.api_url.trim_end_matches('/'))
    }

    async fn execute_once(&self, tenant: &Tenant, query: &GraphQlQuery) -> Result<Value> {
        self.circuits.check(tenant.id)?;
        let result = self.send(tenant, query).await;
        match &result {
            Err(err) if err.counts_as_outage() => self.circuits.record_failure(tenant.id),
            _ => self.circuits.record_success(tenant.id),
        }
        result
    }

    async fn send(&self, tenant: &Tenant, query: &GraphQlQuery) -> Result<Value> {
        self.limiter.wait().await;
        let token = self.tokens.resolve_token(tenant).await?;
        let request = HttpRequest::post_json(self.endpoint(), &query.body())
            .with_header("Authorization", format!("Bearer {token}"));

        let started = Instant::now();
        let response = match tokio::time::timeout(
            self.settings.request_timeout,
            self.transport.send(request),
        )
        .await
        {
            Ok(sent) => sent?,
            Err(_) => {
                return Err(SyncError::Timeout {
                    query: query.name.to_string(),
                    elapsed: started.elapsed(),
                });
            }
        };
        tracing::debug!(
            tenant = tenant.id,
            query = query.name,
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "graphql response"
        );

        if response.status == 401
            && let Some(installation_id) = tenant.installation_id
        {
            self.tokens.invalidate(installation_id).await;
        }
        parse_response(query, &response)
    }
}

#[async_trait]
impl GraphQlClient for HttpGraphQlClient {
    async fn execute(&self, tenant: &Tenant, query: &GraphQlQuery) -> Result<Value> {
        with_retry(
            || self.execute_once(tenant, query),
            self.retry.clone(),
            query.name,
            None,
        )
        .await
    }
}

/// Classify an HTTP response into `data` or a [`SyncError`].
fn parse_response(query: &GraphQlQuery, response: &HttpResponse) -> Result<Value> {
    if response.is_rate_limited() {
        return Err(SyncError::RateLimited {
            retry_after: response.retry_after(),
        });
    }
    if !response.is_success() {
        return Err(SyncError::UpstreamStatus {
            status: response.status,
            body: response.body_snippet(),
        });
    }

    let mut body: Value = serde_json::from_slice(&response.body)?;
    if let Some(errors) = body.get("errors").and_then(Value::as_array)
        && !errors.is_empty()
    {
        if errors
            .iter()
            .any(|e| e.get("type").and_then(Value::as_str) == Some("RATE_LIMITED"))
        {
            return Err(SyncError::RateLimited { retry_after: None });
        }
        let messages = errors
            .iter()
            .map(|e| {
                e.get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string()
            })
            .collect();
        return Err(SyncError::GraphQl {
            query: query.name.to_string(),
            messages,
        });
    }

    match body.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(SyncError::GraphQl {
            query: query.name.to_string(),
            messages: vec!["response carried no data".to_string()],
        }),
    }
}
