//! OAuth token manager for the Zoho refresh-token grant.
//!
//! Holds a single cached access token with its expiry and refreshes it lazily
//! on demand. The cache is an explicit slot inside this struct; callers share
//! one manager per process. Concurrent callers hitting an expired slot may
//! each trigger a refresh, which is acceptable: the grant is idempotent and
//! cheap.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

/// Token exchange failure.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token endpoint request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

pub struct TokenManager {
    http: reqwest::Client,
    oauth_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cache: Mutex<Option<CachedToken>>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

impl TokenManager {
    pub fn new(
        http: reqwest::Client,
        oauth_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        TokenManager {
            http,
            oauth_url: oauth_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            cache: Mutex::new(None),
        }
    }

    /// Return a valid access token, refreshing it if the cached one expired.
    pub async fn bearer(&self) -> Result<String, AuthError> {
        let now = Utc::now();

        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > now {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let response = self
            .http
            .post(&self.oauth_url)
            .form(&RefreshRequest {
                refresh_token: &self.refresh_token,
                client_id: &self.client_id,
                client_secret: &self.client_secret,
                grant_type: "refresh_token",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected { status, body });
        }

        let tokens: TokenResponse = response.json().await?;
        let expires_in = tokens.expires_in.unwrap_or(3600);

        let mut cache = self.cache.lock().await;
        *cache = Some(CachedToken {
            access_token: tokens.access_token.clone(),
            expires_at: now + Duration::seconds(expires_in),
        });

        tracing::info!("Refreshed access token; expires in {} seconds", expires_in);
        Ok(tokens.access_token)
    }
}
