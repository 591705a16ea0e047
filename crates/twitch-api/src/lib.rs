//! Twitch Helix API client with app-credential auth.
//!
//! Unlike a user-token integration there is no OAuth dance here: the client
//! logs in with its own credentials (client-credentials grant) and keeps the
//! resulting bearer token fresh in the background.

pub mod auth;
pub mod client;
pub mod models;

pub use auth::AppAuth;
pub use client::TwitchClient;
pub use models::{HelixPaginatedResponse, HelixPagination, HelixResponse, StreamInfo, TwitchUser};

/// Unified error type for the twitch-api crate.
#[derive(Debug, thiserror::Error)]
pub enum TwitchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token request failed: {0}")]
    TokenRequestFailed(String),

    #[error("Twitch API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}
