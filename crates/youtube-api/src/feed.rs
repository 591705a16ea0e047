//! Upload feed probe.
//!
//! The per-channel Atom feed lists the channel's most recent uploads. The
//! real contract here is "pull up to 15 video ids cheaply", so the ids are
//! pattern-extracted rather than run through a full XML parser; swapping in
//! one later only touches [`parse_feed_video_ids`].

use std::sync::LazyLock;

use regex::Regex;

use crate::{YoutubeClient, YoutubeError};

const FEED_BASE: &str = "https://www.youtube.com/feeds/videos.xml";

/// The feed carries at most this many entries.
pub const FEED_ENTRY_LIMIT: usize = 15;

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<yt:videoId>([^<]+)</yt:videoId>").expect("video id pattern")
});

/// Pull the video ids out of a feed document, newest first, capped at the
/// feed's entry limit.
pub fn parse_feed_video_ids(feed: &str) -> Vec<String> {
    VIDEO_ID_RE
        .captures_iter(feed)
        .take(FEED_ENTRY_LIMIT)
        .map(|cap| cap[1].to_string())
        .collect()
}

impl YoutubeClient {
    /// The channel's most recent upload ids (up to 15), newest first.
    pub async fn get_recent_upload_ids(
        &self,
        channel_id: &str,
    ) -> Result<Vec<String>, YoutubeError> {
        let url = format!("{FEED_BASE}?channel_id={channel_id}");
        let feed = self.get_text(&url).await?;
        let ids = parse_feed_video_ids(&feed);
        tracing::debug!(channel_id, count = ids.len(), "Probed upload feed");
        Ok(ids)
    }
}
