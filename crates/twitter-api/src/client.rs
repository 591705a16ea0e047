use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::models::{FollowingResponse, TweetsResponse, UserResponse};
use crate::{Account, Tweet, TwitterError};

const API_BASE: &str = "https://api.twitter.com/2";

const USER_FIELDS: &str = "verified,description,entities,pinned_tweet_id";
const TWEET_FIELDS: &str = "author_id,entities";

/// Twitter v2 API client with bearer-token auth.
#[derive(Clone)]
pub struct TwitterClient {
    http: reqwest::Client,
    bearer_token: String,
}

impl TwitterClient {
    pub fn new(bearer_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            bearer_token,
        }
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", self.bearer_token);
        if let Ok(value) = HeaderValue::from_str(&bearer) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    async fn authenticated_get(&self, url: &str) -> Result<String, TwitterError> {
        let resp = self.http.get(url).headers(self.auth_headers()).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(TwitterError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(body)
    }

    /// Accounts the given user follows, with entity URLs expanded.
    ///
    /// Returns None when the user itself does not exist.
    pub async fn get_following(&self, user_id: &str) -> Result<Option<Vec<Account>>, TwitterError> {
        let url = format!(
            "{API_BASE}/users/{user_id}/following?max_results=1000&user.fields={USER_FIELDS}"
        );
        let body = self.authenticated_get(&url).await?;
        let resp: FollowingResponse = serde_json::from_str(&body)?;

        let Some(users) = resp.data else {
            return Ok(None);
        };

        tracing::debug!(user_id, count = users.len(), "Fetched following list");
        Ok(Some(
            users
                .into_iter()
                .map(|user| Account::from_wire(user, None))
                .collect(),
        ))
    }

    /// A single account, with its pinned tweet's links folded into
    /// `account_links` when the tweet expansion is returned.
    pub async fn get_account(&self, user_id: &str) -> Result<Option<Account>, TwitterError> {
        let url = format!(
            "{API_BASE}/users/{user_id}?user.fields={USER_FIELDS}&tweet.fields={TWEET_FIELDS}&expansions=pinned_tweet_id"
        );
        let body = self.authenticated_get(&url).await?;
        let resp: UserResponse = serde_json::from_str(&body)?;

        let Some(user) = resp.data else {
            return Ok(None);
        };

        let pinned_tweet = resp
            .includes
            .as_ref()
            .and_then(|inc| inc.tweets.as_ref())
            .and_then(|tweets| {
                let pinned_id = user.pinned_tweet_id.as_deref()?;
                tweets.iter().find(|t| t.id == pinned_id)
            });

        Ok(Some(Account::from_wire(user, pinned_tweet)))
    }

    /// Tweets by id, at most 100 per call (the endpoint's hard ceiling).
    pub async fn get_tweets_by_ids(&self, ids: &[String]) -> Result<Vec<Tweet>, TwitterError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids
            .iter()
            .take(100)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{API_BASE}/tweets?ids={joined}&tweet.fields={TWEET_FIELDS}");
        let body = self.authenticated_get(&url).await?;
        let resp: TweetsResponse = serde_json::from_str(&body)?;

        Ok(resp
            .data
            .unwrap_or_default()
            .into_iter()
            .map(Tweet::from_wire)
            .collect())
    }
}
