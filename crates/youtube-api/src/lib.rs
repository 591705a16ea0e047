//! YouTube Data API client plus the unauthenticated upload feed probe.
//!
//! The feed probe is the cheap path: it pulls recent video ids for a channel
//! without spending API quota. Full metadata then comes from the batched
//! `videos` endpoint.

mod channels;
mod duration;
mod feed;
mod videos;

pub use duration::parse_iso8601_duration;
pub use feed::parse_feed_video_ids;
pub use videos::Video;

/// Unified error type for the youtube-api crate.
#[derive(Debug, thiserror::Error)]
pub enum YoutubeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YouTube API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A successful response was missing a field the API contract requires.
    /// This signals an upstream shape change, not "no data", and must not be
    /// silently skipped.
    #[error("YouTube API contract violation: {0}")]
    ContractViolation(String),
}

/// YouTube Data API v3 client with key auth.
#[derive(Clone)]
pub struct YoutubeClient {
    http: reqwest::Client,
    api_key: String,
}

impl YoutubeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
        }
    }

    pub(crate) async fn get_text(&self, url: &str) -> Result<String, YoutubeError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(YoutubeError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(body)
    }
}
