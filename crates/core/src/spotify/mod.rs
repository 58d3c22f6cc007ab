//! Client side of the Spotify Web API and its OAuth flow.
//!
//! Only three upstream calls are made: the authorization-code grant, the
//! refresh-token grant, and the "top items" resource for the current user.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{config::SpotifyConfig, PortfolioError, Result};

/// Cookie holding the `state` value between login and callback.
pub const STATE_COOKIE: &str = "spotify_oauth_state";
/// Cookie the callback stores the long-lived refresh token in.
pub const REFRESH_TOKEN_COOKIE: &str = "spotify_refresh_token";
/// Scopes requested at login.
pub const SCOPES: &[&str] = &["user-top-read"];

const STATE_PREFIX: &str = "portfolio_";
const STATE_RANDOM_LEN: usize = 13;

/// Payload of the upstream token endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    /// Only returned by the authorization-code grant (and sometimes by a
    /// refresh when the provider rotates tokens).
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .finish()
    }
}

/// Which personal ranking to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopItemsKind {
    Tracks,
    Artists,
}

impl TopItemsKind {
    pub fn path(self) -> &'static str {
        match self {
            TopItemsKind::Tracks => "tracks",
            TopItemsKind::Artists => "artists",
        }
    }
}

impl fmt::Display for TopItemsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// The upstream calls this service depends on.
pub trait SpotifyApi: Send + Sync {
    /// Authorization-code grant, used once by the OAuth callback.
    fn exchange_code(&self, code: &str) -> impl Future<Output = Result<TokenResponse>> + Send;

    /// Refresh-token grant, producing a short-lived access token.
    fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenResponse>> + Send;

    /// `GET /me/top/{kind}` with a bearer token. The payload is passed
    /// through untouched.
    fn fetch_top_items(
        &self,
        access_token: &str,
        kind: TopItemsKind,
        limit: u32,
    ) -> impl Future<Output = Result<Value>> + Send;
}

/// [`SpotifyApi`] over HTTPS.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    config: SpotifyConfig,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Self {
        Self::with_http(reqwest::Client::new(), config)
    }

    pub fn with_http(http: reqwest::Client, config: SpotifyConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &SpotifyConfig {
        &self.config
    }

    fn token_url(&self) -> String {
        format!("{}/api/token", self.config.accounts_url.trim_end_matches('/'))
    }

    fn top_items_url(&self, kind: TopItemsKind) -> String {
        format!(
            "{}/me/top/{}",
            self.config.api_url.trim_end_matches('/'),
            kind.path()
        )
    }

    async fn request_token(&self, grant: &[(&str, &str)]) -> Result<TokenResponse> {
        let mut form = grant.to_vec();
        form.push(("client_id", self.config.client_id.as_str()));
        form.push(("client_secret", self.config.client_secret.as_str()));

        let response = self
            .http
            .post(self.token_url())
            .form(&form)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

impl SpotifyApi for SpotifyClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        debug!("exchanging authorization code");
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ])
        .await
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        debug!("refreshing access token");
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn fetch_top_items(
        &self,
        access_token: &str,
        kind: TopItemsKind,
        limit: u32,
    ) -> Result<Value> {
        debug!(%kind, limit, "fetching top items");
        let response = self
            .http
            .get(self.top_items_url(kind))
            .query(&[("limit", limit)])
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

/// Fresh value for the login `state` parameter and cookie.
pub fn generate_state() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{STATE_PREFIX}{}", &random[..STATE_RANDOM_LEN])
}

/// Provider URL the login route redirects the browser to.
pub fn authorize_url(config: &SpotifyConfig, state: &str) -> Result<String> {
    let base = format!("{}/authorize", config.accounts_url.trim_end_matches('/'));
    let scope = SCOPES.join(" ");
    let url = reqwest::Url::parse_with_params(
        &base,
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
            ("show_dialog", "true"),
        ],
    )
    .map_err(|e| PortfolioError::Config(format!("invalid accounts url `{base}`: {e}")))?;
    Ok(url.into())
}

/// Checks the `state` echoed by the provider against the one stored at login
/// and returns the authorization code. A plain comparison is enough: the
/// value binds the redirect to this browser, it is not a secret.
pub fn validate_callback<'a>(
    code: Option<&'a str>,
    returned_state: Option<&str>,
    stored_state: Option<&str>,
) -> Result<&'a str> {
    match (returned_state, stored_state) {
        (Some(returned), Some(stored)) if !stored.is_empty() && returned == stored => {}
        _ => return Err(PortfolioError::InvalidState),
    }
    code.filter(|code| !code.is_empty())
        .ok_or(PortfolioError::MissingCode)
}
