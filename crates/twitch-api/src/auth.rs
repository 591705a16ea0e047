//! App-credential token management.
//!
//! Uses the client-credentials grant: no user involved, no refresh token.
//! The token is renewed shortly before its stated expiry, either lazily by
//! the next caller or proactively by [`AppAuth::run_refresh_loop`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::TwitchError;

/// Renew this many seconds before the token's stated expiry.
const REFRESH_MARGIN_SECS: i64 = 10;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Default)]
struct TokenState {
    access_token: String,
    expires_at: i64,
}

/// Self-renewing app access token for the Helix API.
///
/// Cheap to clone; clones share the token. The internal async mutex makes
/// renewal single-flight: concurrent callers that all find the token stale
/// wait on the same request instead of issuing their own.
#[derive(Clone)]
pub struct AppAuth {
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
    state: Arc<tokio::sync::Mutex<TokenState>>,
}

impl AppAuth {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            http: reqwest::Client::new(),
            state: Arc::new(tokio::sync::Mutex::new(TokenState::default())),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// A bearer token valid for at least the refresh margin.
    pub async fn bearer_token(&self) -> Result<String, TwitchError> {
        let mut state = self.state.lock().await;
        let now = Utc::now().timestamp();

        if state.access_token.is_empty() || now >= state.expires_at - REFRESH_MARGIN_SECS {
            let token = self.request_token().await?;
            state.access_token = token.access_token;
            state.expires_at = now + token.expires_in;
            tracing::info!(expires_in = token.expires_in, "Obtained app access token");
        }

        Ok(state.access_token.clone())
    }

    /// Proactively renew the token just before it expires, until cancelled.
    pub async fn run_refresh_loop(&self, cancel: CancellationToken) {
        loop {
            let wait_secs = {
                let state = self.state.lock().await;
                (state.expires_at - Utc::now().timestamp() - REFRESH_MARGIN_SECS).max(1)
            };

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Token refresh loop stopped (shutdown)");
                    return;
                }
                _ = tokio::time::sleep(Duration::from_secs(wait_secs as u64)) => {}
            }

            if let Err(e) = self.bearer_token().await {
                tracing::warn!(error = %e, "Token renewal failed, retrying in 30s");
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Token refresh loop stopped (shutdown)");
                        return;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(30)) => {}
                }
            }
        }
    }

    async fn request_token(&self) -> Result<TokenResponse, TwitchError> {
        let mut url = Url::parse("https://id.twitch.tv/oauth2/token")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("grant_type", "client_credentials");

        let resp = self.http.post(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err: ErrorResponse = serde_json::from_str(&body).unwrap_or(ErrorResponse {
                error: Some(status.to_string()),
                message: Some(body.clone()),
            });
            return Err(TwitchError::TokenRequestFailed(format!(
                "{}: {}",
                err.error.unwrap_or_default(),
                err.message.unwrap_or_default()
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| TwitchError::TokenRequestFailed(format!("failed to parse response: {e}")))
    }
}
