//! Typed access to the Helix endpoints the aggregation pipeline uses,
//! with automatic Bearer + Client-Id header injection.

use std::collections::HashMap;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use timeout_cache::TimeoutCache;

use crate::auth::AppAuth;
use crate::models::{HelixPaginatedResponse, HelixResponse, StreamInfo, TwitchUser};
use crate::TwitchError;

const HELIX_BASE: &str = "https://api.twitch.tv/helix";

/// Hard per-request ceiling on both the users and streams endpoints.
const BATCH_LIMIT: usize = 100;

/// Twitch Helix API client.
///
/// The user cache is injected so its TTL, persistence and sweeping stay
/// under the owner's control.
#[derive(Clone)]
pub struct TwitchClient {
    http: reqwest::Client,
    auth: AppAuth,
    user_cache: TimeoutCache<String, TwitchUser>,
}

impl TwitchClient {
    pub fn new(auth: AppAuth, user_cache: TimeoutCache<String, TwitchUser>) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth,
            user_cache,
        }
    }

    async fn auth_headers(&self) -> Result<HeaderMap, TwitchError> {
        let token = self.auth.bearer_token().await?;
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {token}");
        if let Ok(value) = HeaderValue::from_str(&bearer) {
            headers.insert(AUTHORIZATION, value);
        }
        if let Ok(value) = HeaderValue::from_str(self.auth.client_id()) {
            headers.insert("Client-Id", value);
        }
        Ok(headers)
    }

    async fn authenticated_get(&self, url: &str) -> Result<String, TwitchError> {
        let headers = self.auth_headers().await?;
        let resp = self.http.get(url).headers(headers).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(TwitchError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(body)
    }

    /// Get user profiles by login, read-through cached per login.
    ///
    /// Logins that don't resolve to a user (deleted or renamed accounts) are
    /// simply absent from the result map.
    pub async fn get_users_by_logins(
        &self,
        logins: &[String],
    ) -> Result<HashMap<String, TwitchUser>, TwitchError> {
        let mut users = HashMap::new();
        let mut uncached = Vec::new();

        for login in logins {
            match self.user_cache.get(login) {
                Some(user) => {
                    users.insert(login.clone(), user);
                }
                None => uncached.push(login.clone()),
            }
        }

        for chunk in uncached.chunks(BATCH_LIMIT) {
            let query = build_users_query(chunk);
            let url = format!("{HELIX_BASE}/users?{query}");
            let body = self.authenticated_get(&url).await?;
            let resp: HelixResponse<TwitchUser> = serde_json::from_str(&body)?;

            for user in resp.data {
                self.user_cache.set(user.login.clone(), user.clone());
                users.insert(user.login.clone(), user);
            }
        }

        tracing::debug!(requested = logins.len(), found = users.len(), "Fetched Twitch users");
        Ok(users)
    }

    /// Get active streams by login, grouped per login.
    ///
    /// A login with no entry in the result map is not live.
    pub async fn get_streams_by_logins(
        &self,
        logins: &[String],
    ) -> Result<HashMap<String, Vec<StreamInfo>>, TwitchError> {
        let mut streams: HashMap<String, Vec<StreamInfo>> = HashMap::new();

        for chunk in logins.chunks(BATCH_LIMIT) {
            let mut cursor: Option<String> = None;

            loop {
                let query = build_streams_query(chunk, cursor.as_deref());
                let url = format!("{HELIX_BASE}/streams?{query}");
                let body = self.authenticated_get(&url).await?;
                let resp: HelixPaginatedResponse<StreamInfo> = serde_json::from_str(&body)?;

                for stream in resp.data {
                    streams.entry(stream.user_login.clone()).or_default().push(stream);
                }

                cursor = resp.pagination.and_then(|p| p.cursor);
                if cursor.is_none() {
                    break;
                }
            }
        }

        Ok(streams)
    }
}

pub(crate) fn build_users_query(logins: &[String]) -> String {
    logins
        .iter()
        .take(BATCH_LIMIT)
        .map(|login| format!("login={login}"))
        .collect::<Vec<_>>()
        .join("&")
}

pub(crate) fn build_streams_query(logins: &[String], after: Option<&str>) -> String {
    let limited: Vec<&String> = logins.iter().take(BATCH_LIMIT).collect();
    let first = limited.len().clamp(1, BATCH_LIMIT);
    let mut parts = vec![format!("first={first}")];
    if let Some(cursor) = after {
        parts.push(format!("after={cursor}"));
    }
    parts.extend(limited.into_iter().map(|login| format!("user_login={login}")));
    parts.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_users_query_joins_logins() {
        let logins = vec!["alpha".to_string(), "beta".to_string()];
        assert_eq!(build_users_query(&logins), "login=alpha&login=beta");
    }

    #[test]
    fn build_users_query_caps_at_batch_limit() {
        let logins = (1..=120).map(|i| format!("u{i}")).collect::<Vec<_>>();
        let query = build_users_query(&logins);
        assert!(query.contains("login=u100"));
        assert!(!query.contains("login=u101"));
    }

    #[test]
    fn build_streams_query_sets_first_to_login_count() {
        let logins = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let query = build_streams_query(&logins, None);
        assert!(query.starts_with("first=3&"));
        assert!(query.contains("user_login=a"));
        assert!(!query.contains("after="));
    }

    #[test]
    fn build_streams_query_includes_cursor_when_present() {
        let logins = vec!["a".to_string()];
        let query = build_streams_query(&logins, Some("abc"));
        assert!(query.contains("after=abc"));
    }
}
