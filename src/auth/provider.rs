//! Service principal token acquisition
//!
//! Exchanges a client id and secret for a bearer token on the tenant's
//! OAuth2 endpoint (client-credentials grant).

use async_trait::async_trait;
use azure_core::auth::AccessToken;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use time::OffsetDateTime;
use tracing::{debug, info};
use url::Url;
use zeroize::Zeroizing;

use crate::error::{Result, SubvendError};
use crate::utils::endpoint::{token_endpoint, DEFAULT_AUTHORITY_HOST};
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};

/// Resource the token is requested for
pub const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";

/// Lifetime assumed when the token endpoint does not report one
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Service principal credentials
#[derive(Clone)]
pub struct Credentials {
    tenant_id: String,
    client_id: String,
    client_secret: Zeroizing<String>,
}

impl Credentials {
    pub fn new<S: Into<String>>(tenant_id: S, client_id: S, client_secret: S) -> Result<Self> {
        let tenant_id = tenant_id.into();
        let client_id = client_id.into();
        let client_secret = Zeroizing::new(client_secret.into());

        if tenant_id.trim().is_empty() {
            return Err(SubvendError::invalid_argument("tenant_id must not be empty"));
        }
        if client_id.trim().is_empty() {
            return Err(SubvendError::invalid_argument("client_id must not be empty"));
        }
        if client_secret.is_empty() {
            return Err(SubvendError::invalid_argument("client_secret must not be empty"));
        }

        Ok(Self {
            tenant_id,
            client_id,
            client_secret,
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Source of management-plane bearer tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get a token for the management resource
    async fn get_token(&self) -> Result<AccessToken>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    // v1 endpoints send these as strings, v2 as numbers
    expires_in: Option<Value>,
    expires_on: Option<Value>,
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl TokenResponse {
    fn expiry(&self) -> OffsetDateTime {
        if let Some(on) = self.expires_on.as_ref().and_then(as_i64) {
            if let Ok(at) = OffsetDateTime::from_unix_timestamp(on) {
                return at;
            }
        }
        let lifetime = self
            .expires_in
            .as_ref()
            .and_then(as_i64)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        OffsetDateTime::now_utc() + time::Duration::seconds(lifetime)
    }
}

/// Client secret authentication against the tenant token endpoint
pub struct ClientSecretProvider {
    credentials: Credentials,
    http_client: Client,
    token_url: Url,
    resource: String,
}

impl ClientSecretProvider {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_authority(credentials, DEFAULT_AUTHORITY_HOST)
    }

    /// Use a non-default authority host (sovereign clouds, test servers)
    pub fn with_authority(credentials: Credentials, authority_host: &str) -> Result<Self> {
        let token_url = token_endpoint(authority_host, credentials.tenant_id())?;
        let http_client = create_http_client(&NetworkConfig::for_token_exchange())?;

        Ok(Self {
            credentials,
            http_client,
            token_url,
            resource: MANAGEMENT_RESOURCE.to_string(),
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn exchange_failed(&self, error: &reqwest::Error) -> SubvendError {
        SubvendError::authentication(format!(
            "Credential exchange failed: {}",
            classify_network_error(error, self.token_url.as_str())
        ))
    }

    /// Perform the client-credentials exchange
    pub async fn acquire_token(&self) -> Result<AccessToken> {
        info!(
            tenant_id = %self.credentials.tenant_id,
            client_id = %self.credentials.client_id,
            "Authenticating service principal"
        );

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("resource", self.resource.as_str()),
        ];

        let response = self
            .http_client
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| self.exchange_failed(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.exchange_failed(&e))?;

        if !status.is_success() {
            return Err(SubvendError::authentication(format!(
                "Token endpoint returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|_| {
            SubvendError::authentication(format!("Token endpoint returned invalid JSON:\n{}", body))
        })?;

        let token = match parsed.access_token.as_deref() {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => {
                return Err(SubvendError::authentication(format!(
                    "No access_token in response:\n{}",
                    body
                )))
            }
        };

        let expires_on = parsed.expiry();
        debug!(%expires_on, "Token acquired");
        info!("Authentication successful");

        Ok(AccessToken::new(token, expires_on))
    }
}

#[async_trait]
impl TokenProvider for ClientSecretProvider {
    async fn get_token(&self) -> Result<AccessToken> {
        self.acquire_token().await
    }
}

/// One-shot token acquisition against the public cloud authority
pub async fn acquire_token(tenant_id: &str, client_id: &str, client_secret: &str) -> Result<String> {
    let credentials = Credentials::new(tenant_id, client_id, client_secret)?;
    let token = ClientSecretProvider::new(credentials)?.acquire_token().await?;
    Ok(token.token.secret().to_string())
}

/// First characters of a token, for confirming which token is in use
pub fn token_preview(token: &str, len: usize) -> String {
    let prefix: String = token.chars().take(len).collect();
    format!("{}...", prefix)
}
