use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::cache::TokenCache;
use super::TokenSource;
use crate::config::Credentials;
use crate::errors::AppError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    authorization_server_id: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenEnvelope {
    data: TokenData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenData {
    jwt_token: String,
    expires_in: Option<u64>,
}

/// Where a token handed out by [`TokenClient::get_token`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    Cached,
    Fresh,
}

/// Client for the token endpoint. Fetched tokens go straight into the cache.
pub struct TokenClient {
    http: Client,
    auth_url: String,
    credentials: Option<Credentials>,
    default_expires_in: u64,
    cache: TokenCache,
}

impl TokenClient {
    pub fn new(
        auth_url: impl Into<String>,
        credentials: Option<Credentials>,
        default_expires_in: u64,
        cache: TokenCache,
    ) -> Result<Self, AppError> {
        let http = Client::builder()
            .use_rustls_tls()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            auth_url: auth_url.into(),
            credentials,
            default_expires_in,
            cache,
        })
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Cached token when still valid, otherwise a freshly fetched one.
    pub async fn get_token(&self) -> Result<(String, TokenOrigin), AppError> {
        if let Some(token) = self.cache.read_valid().await {
            tracing::info!("using cached token");
            return Ok((token, TokenOrigin::Cached));
        }
        let token = self.fetch_token().await?;
        Ok((token, TokenOrigin::Fresh))
    }

    /// Authenticate with the configured credentials and cache the result.
    pub async fn fetch_token(&self) -> Result<String, AppError> {
        let creds = self.credentials.as_ref().ok_or_else(|| {
            AppError::TokenFetchFailed(
                "ELIG_AUTH_SERVER_ID, ELIG_CLIENT_ID and ELIG_CLIENT_SECRET must be set".into(),
            )
        })?;

        let body = TokenRequest {
            authorization_server_id: &creds.authorization_server_id,
            client_id: &creds.client_id,
            client_secret: &creds.client_secret,
        };

        let resp = self
            .http
            .post(&self.auth_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "token request failed");
                AppError::TokenFetchFailed(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %text, "token endpoint returned error");
            return Err(AppError::TokenFetchFailed(format!(
                "status={}, body={}",
                status, text
            )));
        }

        let envelope: TokenEnvelope = resp.json().await.map_err(|e| {
            tracing::error!(error = %e, "token response did not parse");
            AppError::TokenFetchFailed(format!("malformed token response: {}", e))
        })?;

        let expires_in = envelope
            .data
            .expires_in
            .filter(|secs| *secs > 0)
            .unwrap_or(self.default_expires_in);
        self.cache.save(&envelope.data.jwt_token, expires_in).await;
        tracing::info!(expires_in, "new token generated");

        Ok(envelope.data.jwt_token)
    }
}

#[async_trait]
impl TokenSource for TokenClient {
    async fn cached(&self) -> Option<String> {
        self.cache.read_valid().await
    }

    async fn authenticate(&self) -> Result<String, AppError> {
        self.fetch_token().await
    }

    async fn invalidate(&self) {
        self.cache.invalidate().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_request_uses_camel_case_keys() {
        let body = TokenRequest {
            authorization_server_id: "aus",
            client_id: "cid",
            client_secret: "secret",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["authorizationServerId"], "aus");
        assert_eq!(json["clientId"], "cid");
        assert_eq!(json["clientSecret"], "secret");
    }

    #[test]
    fn test_expires_in_is_optional() {
        let env: TokenEnvelope =
            serde_json::from_str(r#"{"data":{"jwtToken":"abc"}}"#).unwrap();
        assert_eq!(env.data.jwt_token, "abc");
        assert!(env.data.expires_in.is_none());
    }
}
