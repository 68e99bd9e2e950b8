//! Google OAuth2 authorization-code flow.
//!
//! Builds the consent URL and talks to the token endpoint for code exchange
//! and refresh. Token storage belongs to the
//! [`LinkedAccountRepository`](schedulr_core::LinkedAccountRepository).

use std::sync::Arc;

use chrono::Duration;
use reqwest::Method;
use schedulr_common::time::Clock;
use schedulr_domain::{ApiError, GoogleOAuthConfig, RefreshedToken, Result};
use serde::Deserialize;
use tracing::debug;

use crate::http::HttpClient;

pub const GOOGLE_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

const PROVIDER: &str = "google-oauth";

/// OAuth client for one registered Google application.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http_client: HttpClient,
    clock: Arc<dyn Clock>,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorization_endpoint: String,
    token_endpoint: String,
}

impl GoogleOAuthClient {
    pub fn new(config: &GoogleOAuthConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            http_client: HttpClient::new()?,
            clock,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            authorization_endpoint: GOOGLE_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
        })
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Consent URL requesting offline calendar access.
    ///
    /// `prompt=consent` forces Google to issue a refresh token on every link.
    pub fn authorization_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", GOOGLE_CALENDAR_SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ];

        let query = params
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{query}", self.authorization_endpoint)
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> std::result::Result<RefreshedToken, ApiError> {
        debug!("exchanging authorization code");
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    /// Obtain a new access token. `refresh_token` is `None` in the result
    /// unless Google rotated it.
    pub async fn refresh(&self, refresh_token: &str) -> std::result::Result<RefreshedToken, ApiError> {
        debug!("refreshing access token");
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }

    async fn token_request(
        &self,
        form: &[(&str, &str)],
    ) -> std::result::Result<RefreshedToken, ApiError> {
        let issued_at = self.clock.now_utc();
        let builder = self.http_client.request(Method::POST, &self.token_endpoint).form(form);
        let response = self.http_client.send(PROVIDER, builder).await?;

        let token: TokenResponse = response.json().await.map_err(|e| {
            ApiError::permanent(PROVIDER, format!("Failed to parse token response: {e}"))
        })?;

        let expiry = Duration::try_seconds(token.expires_in)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                ApiError::permanent(PROVIDER, format!("expires_in out of range: {}", token.expires_in))
            })?;

        Ok(RefreshedToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token.filter(|t| !t.is_empty()),
            expiry,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}
