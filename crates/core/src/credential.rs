use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ResourceError, Result};

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_on - Duration::seconds(EXPIRY_MARGIN_SECS) > now
    }
}

/// A source of bearer tokens for the management endpoint.
#[async_trait]
pub trait TokenCredential: Send + Sync + fmt::Debug {
    async fn get_token(&self, scope: &str) -> Result<AccessToken>;
}

/// A pre-acquired token, used as is for every request.
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenCredential").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scope: &str) -> Result<AccessToken> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: DateTime::<Utc>::MAX_UTC,
        })
    }
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Service principal authentication through the OAuth2 client credentials grant.
///
/// The token is cached until 5 minutes before expiry. Callers arriving during a
/// refresh wait for it rather than sending their own token request.
pub struct ClientSecretCredential {
    authority: Url,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    client: Client,
    cache: Mutex<Option<AccessToken>>,
}

impl fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("authority", &self.authority.as_str())
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl ClientSecretCredential {
    pub fn new(
        authority: &str,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            authority: Url::parse(authority)?,
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            client: Client::new(),
            cache: Mutex::new(None),
        })
    }

    fn token_url(&self) -> Result<Url> {
        let mut url = self.authority.clone();
        url.path_segments_mut()
            .map_err(|_| ResourceError::Config(format!("Invalid authority: {}", self.authority)))?
            .pop_if_empty()
            .extend([self.tenant_id.as_str(), "oauth2", "v2.0", "token"]);
        Ok(url)
    }

    async fn request_token(&self, scope: &str) -> Result<AccessToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope),
        ];

        let response = self
            .client
            .post(self.token_url()?)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ResourceError::Auth(format!(
                "Token request failed with status {status}: {text}"
            )));
        }

        let body: TokenResponse = response.json().await?;
        Ok(AccessToken {
            token: body.access_token,
            expires_on: Utc::now() + Duration::seconds(body.expires_in),
        })
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    #[instrument(skip(self))]
    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.clone());
        }

        debug!(tenant = %self.tenant_id, "requesting new access token");
        let token = self.request_token(scope).await?;
        *cache = Some(token.clone());
        Ok(token)
    }
}
