//! Channel lookup by legacy custom name.

use serde::Deserialize;

use crate::{YoutubeClient, YoutubeError};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelResource>,
}

#[derive(Debug, Deserialize)]
struct ChannelResource {
    id: String,
}

impl YoutubeClient {
    /// Resolve a custom channel name (the `/c/`, `/u/`, `/user/` URL forms)
    /// to its stable channel id. None when no channel carries that name.
    pub async fn get_channel_id_for_username(
        &self,
        username: &str,
    ) -> Result<Option<String>, YoutubeError> {
        let url = format!(
            "{API_BASE}/channels?part=id&forUsername={username}&key={}",
            self.api_key
        );

        let body = self.get_text(&url).await?;
        let resp: ChannelListResponse = serde_json::from_str(&body)?;

        Ok(resp.items.into_iter().next().map(|channel| channel.id))
    }
}
