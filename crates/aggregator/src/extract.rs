//! Pulling platform identifiers out of profile links and free text.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use timeout_cache::TimeoutCache;
use tracing::warn;

use crate::sources::VideoHost;

/// Custom-name lookups are stable; cache both hits and misses for a while.
pub const CHANNEL_ID_CACHE_TTL: Duration = Duration::from_secs(4 * 60 * 60);

static TWITCH_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https://(?:www\.)?twitch\.tv/([0-9a-z_]+)").expect("channel link pattern")
});

static TWITCH_LINK_EXACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https://(?:www\.)?twitch\.tv/([0-9a-z_]+)/?$")
        .expect("exact channel link pattern")
});

static YOUTUBE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.)?youtube\.com/(?:channel/([0-9A-Za-z_-]+)|(?:(?:c|u|user)/)?([0-9A-Za-z_-]+))/?")
        .expect("channel url pattern")
});

/// First Twitch login mentioned anywhere in free text, lowercased.
pub fn extract_twitch_login(text: &str) -> Option<String> {
    TWITCH_LINK_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|login| login.as_str().to_lowercase())
}

/// Twitch login from a URL that is exactly a channel link and nothing more.
pub fn extract_twitch_login_exact(url: &str) -> Option<String> {
    TWITCH_LINK_EXACT_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|login| login.as_str().to_lowercase())
}

/// First profile link that is a plain Twitch channel URL.
pub fn find_twitch_login(links: &[String]) -> Option<String> {
    links.iter().find_map(|link| extract_twitch_login_exact(link))
}

/// What a YouTube channel URL pointed at, before any API lookup.
#[derive(Debug, PartialEq)]
enum YoutubeRef {
    ChannelId(String),
    CustomName(String),
}

fn parse_youtube_link(url: &str) -> Option<YoutubeRef> {
    let caps = YOUTUBE_LINK_RE.captures(url)?;
    if let Some(id) = caps.get(1) {
        return Some(YoutubeRef::ChannelId(id.as_str().to_lowercase()));
    }
    let name = caps.get(2)?.as_str().to_lowercase();
    // Bare /watch is a video page, not a channel named "watch".
    if name == "watch" {
        return None;
    }
    Some(YoutubeRef::CustomName(name))
}

/// Turns YouTube channel URLs into stable channel ids, caching lookups.
pub struct YoutubeIdResolver<V> {
    host: V,
    cache: TimeoutCache<String, Option<String>>,
}

impl<V: Clone> Clone for YoutubeIdResolver<V> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<V: VideoHost> YoutubeIdResolver<V> {
    pub fn new(host: V, cache: TimeoutCache<String, Option<String>>) -> Self {
        Self { host, cache }
    }

    /// Channel id for one URL, if it is a channel URL at all.
    ///
    /// Direct `/channel/<id>` links never hit the API. Custom names go
    /// through the host, with hits and misses both cached; a transport
    /// failure yields None uncached so the name can be retried later.
    pub async fn resolve(&self, url: &str) -> Option<String> {
        match parse_youtube_link(url)? {
            YoutubeRef::ChannelId(id) => Some(id),
            YoutubeRef::CustomName(name) => {
                if let Some(known) = self.cache.get(&name) {
                    return known;
                }
                match self.host.channel_id_for_name(&name).await {
                    Ok(found) => {
                        self.cache.set(name, found.clone());
                        found
                    }
                    Err(err) => {
                        warn!(name, error = %err, "channel name lookup failed");
                        None
                    }
                }
            }
        }
    }

    /// First profile link that resolves to a channel id.
    pub async fn find_in_links(&self, links: &[String]) -> Option<String> {
        for link in links {
            if let Some(id) = self.resolve(link).await {
                return Some(id);
            }
        }
        None
    }
}
