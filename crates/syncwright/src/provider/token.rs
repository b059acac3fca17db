//! Access tokens for outbound provider calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::{InstallationGoneReason, Result, SyncError};
use crate::http::{HttpRequest, HttpTransport};
use crate::tenant::Tenant;

/// Cached installation tokens are refreshed this long before they expire.
pub const TOKEN_REFRESH_BUFFER: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid app private key: {0}")]
    InvalidKey(String),

    #[error("failed to sign app JWT: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("tenant {0} has no installation")]
    NoInstallation(i64),
}

impl From<TokenError> for SyncError {
    fn from(err: TokenError) -> Self {
        SyncError::credentials(err.to_string())
    }
}

/// Supplies a bearer token for a tenant's outbound calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn resolve_token(&self, tenant: &Tenant) -> Result<String>;

    /// Drop any cached token for an installation.
    async fn invalidate(&self, _installation_id: i64) {}
}

/// A fixed personal access token shared by every tenant.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn resolve_token(&self, _tenant: &Tenant) -> Result<String> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Serialize)]
struct AppClaims {
    iss: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// GitHub App installation tokens, minted with an app JWT and cached.
pub struct AppTokenProvider {
    app_id: u64,
    key: EncodingKey,
    algorithm: Algorithm,
    api_url: String,
    transport: Arc<dyn HttpTransport>,
    cache: RwLock<HashMap<i64, CachedToken>>,
}

impl AppTokenProvider {
    /// Build from the app's RSA private key in PEM form.
    pub fn from_rsa_pem(
        app_id: u64,
        pem: &[u8],
        api_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> std::result::Result<Self, TokenError> {
        let key =
            EncodingKey::from_rsa_pem(pem).map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        Ok(Self::with_key(app_id, key, Algorithm::RS256, api_url, transport))
    }

    pub(crate) fn with_key(
        app_id: u64,
        key: EncodingKey,
        algorithm: Algorithm,
        api_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            app_id,
            key,
            algorithm,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            transport,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn app_jwt(&self) -> std::result::Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = AppClaims {
            iss: self.app_id.to_string(),
            // Backdated for clock skew.
            iat: now - 60,
            exp: now + 600,
        };
        Ok(encode(&Header::new(self.algorithm), &claims, &self.key)?)
    }

    async fn cached(&self, installation_id: i64) -> Option<String> {
        let cache = self.cache.read().await;
        cache
            .get(&installation_id)
            .filter(|c| Instant::now() < c.refresh_at)
            .map(|c| c.token.clone())
    }

    async fn mint(&self, installation_id: i64) -> Result<CachedToken> {
        let url = format!(
            "{}/app/installations/{installation_id}/access_tokens",
            self.api_url
        );
        let request = HttpRequest::post_json(url, &serde_json::json!({}))
            .with_header("Authorization", format!("Bearer {}", self.app_jwt()?))
            .with_header("Accept", "application/vnd.github+json")
            .with_header("X-GitHub-Api-Version", "2022-11-28");

        let response = self.transport.send(request).await?;
        if response.is_rate_limited() {
            return Err(SyncError::RateLimited {
                retry_after: response.retry_after(),
            });
        }
        match response.status {
            200 | 201 => {}
            404 => {
                return Err(SyncError::InstallationGone {
                    installation_id,
                    reason: InstallationGoneReason::Removed,
                });
            }
            403 if response.body_snippet().to_lowercase().contains("suspended") => {
                return Err(SyncError::InstallationGone {
                    installation_id,
                    reason: InstallationGoneReason::Suspended,
                });
            }
            401 => {
                return Err(SyncError::credentials(format!(
                    "app JWT rejected: {}",
                    response.body_snippet()
                )));
            }
            status => {
                return Err(SyncError::UpstreamStatus {
                    status,
                    body: response.body_snippet(),
                });
            }
        }

        let parsed: InstallationTokenResponse = serde_json::from_slice(&response.body)?;
        let lifetime = (parsed.expires_at - Utc::now())
            .to_std()
            .unwrap_or_default()
            .saturating_sub(TOKEN_REFRESH_BUFFER);
        Ok(CachedToken {
            token: parsed.token,
            refresh_at: Instant::now() + lifetime,
        })
    }
}

#[async_trait]
impl TokenProvider for AppTokenProvider {
    async fn resolve_token(&self, tenant: &Tenant) -> Result<String> {
        let installation_id = tenant
            .installation_id
            .ok_or(TokenError::NoInstallation(tenant.id))?;

        if let Some(token) = self.cached(installation_id).await {
            return Ok(token);
        }

        tracing::info!(tenant = tenant.id, installation_id, "requesting installation token");
        let fresh = self.mint(installation_id).await?;
        let token = fresh.token.clone();
        self.cache.write().await.insert(installation_id, fresh);
        Ok(token)
    }

    async fn invalidate(&self, installation_id: i64) {
        if self.cache.write().await.remove(&installation_id).is_some() {
            tracing::debug!(installation_id, "installation token evicted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, MockTransport, header_get};

    const API: &str = "https://api.github.test";
    const TOKEN_URL: &str = "https://api.github.test/app/installations/100/access_tokens";

    fn tenant() -> Tenant {
        Tenant {
            id: 1,
            organization: "acme".into(),
            installation_id: Some(100),
            repositories: vec![],
        }
    }

    fn provider(transport: &MockTransport) -> AppTokenProvider {
        AppTokenProvider::with_key(
            7,
            EncodingKey::from_secret(b"test-secret"),
            Algorithm::HS256,
            format!("{API}/"),
            Arc::new(transport.clone()),
        )
    }

    fn token_body(token: &str, ttl: chrono::Duration) -> serde_json::Value {
        serde_json::json!({"token": token, "expires_at": (Utc::now() + ttl).to_rfc3339()})
    }

    #[tokio::test(start_paused = true)]
    async fn caches_until_refresh_buffer() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            TOKEN_URL,
            201,
            token_body("ghs_one", chrono::Duration::hours(1)),
        );
        transport.push_json(
            HttpMethod::Post,
            TOKEN_URL,
            201,
            token_body("ghs_two", chrono::Duration::hours(1)),
        );
        let tokens = provider(&transport);

        assert_eq!(tokens.resolve_token(&tenant()).await.unwrap(), "ghs_one");
        assert_eq!(tokens.resolve_token(&tenant()).await.unwrap(), "ghs_one");
        assert_eq!(transport.requests().len(), 1);

        tokio::time::advance(Duration::from_secs(56 * 60)).await;
        assert_eq!(tokens.resolve_token(&tenant()).await.unwrap(), "ghs_two");

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        let auth = header_get(&requests[0].headers, "authorization").unwrap();
        assert!(auth.starts_with("Bearer "));
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            TOKEN_URL,
            201,
            token_body("ghs_one", chrono::Duration::hours(1)),
        );
        transport.push_json(
            HttpMethod::Post,
            TOKEN_URL,
            201,
            token_body("ghs_two", chrono::Duration::hours(1)),
        );
        let tokens = provider(&transport);

        tokens.resolve_token(&tenant()).await.unwrap();
        tokens.invalidate(100).await;
        assert_eq!(tokens.resolve_token(&tenant()).await.unwrap(), "ghs_two");
    }

    #[tokio::test]
    async fn missing_installation_is_gone() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            TOKEN_URL,
            404,
            serde_json::json!({"message": "Not Found"}),
        );
        let err = provider(&transport).resolve_token(&tenant()).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::InstallationGone {
                installation_id: 100,
                reason: InstallationGoneReason::Removed
            }
        ));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn suspended_installation_is_gone() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            TOKEN_URL,
            403,
            serde_json::json!({"message": "This installation has been suspended"}),
        );
        let err = provider(&transport).resolve_token(&tenant()).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::InstallationGone {
                reason: InstallationGoneReason::Suspended,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn tenant_without_installation_is_a_credentials_error() {
        let transport = MockTransport::new();
        let mut tenant = tenant();
        tenant.installation_id = None;
        let err = provider(&transport).resolve_token(&tenant).await.unwrap_err();
        assert!(matches!(err, SyncError::Credentials { .. }));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn static_provider_ignores_tenant() {
        let tokens = StaticTokenProvider::new("ghp_static");
        assert_eq!(tokens.resolve_token(&tenant()).await.unwrap(), "ghp_static");
    }

    #[test]
    fn rejects_malformed_pem() {
        let transport = MockTransport::new();
        let result = AppTokenProvider::from_rsa_pem(7, b"not a key", API, Arc::new(transport));
        assert!(matches!(result, Err(TokenError::InvalidKey(_))));
    }
}
