//! Twitter/X v2 API client.
//!
//! Covers the three calls the aggregation pipeline needs: the follow list of
//! a user, a single user, and tweets by id. Responses are flattened into
//! [`Account`] and [`Tweet`] records with the entity URLs already pulled out.

mod client;
mod models;

pub use client::TwitterClient;
pub use models::{Account, Tweet};

/// Unified error type for the twitter-api crate.
#[derive(Debug, thiserror::Error)]
pub enum TwitterError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Twitter API error (status {status}): {message}")]
    ApiError { status: u16, message: String },
}
