//! Batched video metadata from GET /youtube/v3/videos.

use serde::{Deserialize, Serialize};

use crate::duration::parse_iso8601_duration;
use crate::{YoutubeClient, YoutubeError};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Hard per-request ceiling on the videos endpoint.
const BATCH_LIMIT: usize = 50;

/// Full metadata for one video, validated against the API contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    pub embed_html: String,
    pub duration_seconds: u64,
    pub is_live: bool,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    #[serde(default)]
    snippet: Option<Snippet>,
    #[serde(default)]
    content_details: Option<ContentDetails>,
    #[serde(default)]
    player: Option<Player>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    live_broadcast_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Player {
    #[serde(default)]
    embed_html: Option<String>,
}

impl Video {
    /// Validate a wire resource into a [`Video`].
    ///
    /// Every field below is part of the requested `part` set; its absence in
    /// a 2xx response means the API changed shape underneath us.
    fn from_wire(item: VideoResource) -> Result<Self, YoutubeError> {
        let violation =
            |what: &str, id: &str| YoutubeError::ContractViolation(format!("video {id}: {what}"));

        let id = item.id;
        let snippet = item.snippet.ok_or_else(|| violation("missing snippet", &id))?;
        let channel_id = snippet
            .channel_id
            .ok_or_else(|| violation("missing snippet.channelId", &id))?;
        let title = snippet
            .title
            .ok_or_else(|| violation("missing snippet.title", &id))?;
        let live_broadcast_content = snippet
            .live_broadcast_content
            .ok_or_else(|| violation("missing snippet.liveBroadcastContent", &id))?;
        let duration = item
            .content_details
            .and_then(|d| d.duration)
            .ok_or_else(|| violation("missing contentDetails.duration", &id))?;
        let duration_seconds = parse_iso8601_duration(&duration)
            .ok_or_else(|| violation("unparseable contentDetails.duration", &id))?;
        let embed_html = item
            .player
            .and_then(|p| p.embed_html)
            .ok_or_else(|| violation("missing player.embedHtml", &id))?;

        Ok(Self {
            id,
            channel_id,
            title,
            embed_html,
            duration_seconds,
            // "live" and "upcoming" are both broadcasts, not uploads.
            is_live: live_broadcast_content != "none",
        })
    }
}

impl YoutubeClient {
    /// Metadata for up to 50 videos by id (the endpoint's hard ceiling).
    ///
    /// Ids the API doesn't know are absent from the result; a known video
    /// with a missing required field is an error for the whole batch.
    pub async fn get_videos(&self, ids: &[String]) -> Result<Vec<Video>, YoutubeError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids
            .iter()
            .take(BATCH_LIMIT)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{API_BASE}/videos?part=snippet,contentDetails,player&id={joined}&key={}",
            self.api_key
        );

        let body = self.get_text(&url).await?;
        let resp: VideoListResponse = serde_json::from_str(&body)?;

        resp.items.into_iter().map(Video::from_wire).collect()
    }
}
