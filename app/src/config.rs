//! Process configuration from the environment.

use std::path::PathBuf;

use anyhow::Context;

/// Everything the process needs, resolved once at startup.
///
/// Missing credentials are fatal immediately rather than at first use.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub twitter_bearer_token: String,
    pub twitch_client_id: String,
    pub twitch_client_secret: String,
    pub youtube_api_key: String,
    pub cache_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let require = |key: &str| {
            std::env::var(key).with_context(|| format!("missing required environment variable {key}"))
        };

        Ok(Self {
            twitter_bearer_token: require("TWITTER_BEARER_TOKEN")?,
            twitch_client_id: require("TWITCH_CLIENT_ID")?,
            twitch_client_secret: require("TWITCH_CLIENT_SECRET")?,
            youtube_api_key: require("YOUTUBE_API_KEY")?,
            cache_dir: std::env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("cache")),
        })
    }
}
