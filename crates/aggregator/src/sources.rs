//! Collaborator seams.
//!
//! The engine only ever talks to its three upstream APIs through these
//! traits. The impls below delegate to the concrete clients; tests use
//! counting doubles instead.

use std::collections::HashMap;

use twitch_api::{StreamInfo, TwitchUser};
use twitter_api::{Account, Tweet};
use youtube_api::Video;

use crate::AggregateError;

/// The social-graph API: follow lists, single accounts, tweets by id.
pub trait SocialGraph {
    /// Accounts the user follows; None when the user itself doesn't exist.
    async fn following(&self, user_id: &str) -> Result<Option<Vec<Account>>, AggregateError>;

    async fn account(&self, user_id: &str) -> Result<Option<Account>, AggregateError>;

    /// Tweets by id, at most 100 per call.
    async fn tweets_by_ids(&self, ids: &[String]) -> Result<Vec<Tweet>, AggregateError>;
}

/// The streaming-platform API: user profiles and live-stream state.
pub trait StreamingPlatform {
    async fn users_by_logins(
        &self,
        logins: &[String],
    ) -> Result<HashMap<String, TwitchUser>, AggregateError>;

    async fn streams_by_logins(
        &self,
        logins: &[String],
    ) -> Result<HashMap<String, Vec<StreamInfo>>, AggregateError>;
}

/// The video-hosting API: upload feeds, batched metadata, name lookup.
pub trait VideoHost {
    /// The channel's most recent upload ids (up to 15), newest first.
    async fn recent_upload_ids(&self, channel_id: &str) -> Result<Vec<String>, AggregateError>;

    /// Metadata for up to 50 videos by id.
    async fn videos_by_ids(&self, ids: &[String]) -> Result<Vec<Video>, AggregateError>;

    async fn channel_id_for_name(&self, name: &str) -> Result<Option<String>, AggregateError>;
}

impl SocialGraph for twitter_api::TwitterClient {
    async fn following(&self, user_id: &str) -> Result<Option<Vec<Account>>, AggregateError> {
        Ok(self.get_following(user_id).await?)
    }

    async fn account(&self, user_id: &str) -> Result<Option<Account>, AggregateError> {
        Ok(self.get_account(user_id).await?)
    }

    async fn tweets_by_ids(&self, ids: &[String]) -> Result<Vec<Tweet>, AggregateError> {
        Ok(self.get_tweets_by_ids(ids).await?)
    }
}

impl StreamingPlatform for twitch_api::TwitchClient {
    async fn users_by_logins(
        &self,
        logins: &[String],
    ) -> Result<HashMap<String, TwitchUser>, AggregateError> {
        Ok(self.get_users_by_logins(logins).await?)
    }

    async fn streams_by_logins(
        &self,
        logins: &[String],
    ) -> Result<HashMap<String, Vec<StreamInfo>>, AggregateError> {
        Ok(self.get_streams_by_logins(logins).await?)
    }
}

impl VideoHost for youtube_api::YoutubeClient {
    async fn recent_upload_ids(&self, channel_id: &str) -> Result<Vec<String>, AggregateError> {
        Ok(self.get_recent_upload_ids(channel_id).await?)
    }

    async fn videos_by_ids(&self, ids: &[String]) -> Result<Vec<Video>, AggregateError> {
        Ok(self.get_videos(ids).await?)
    }

    async fn channel_id_for_name(&self, name: &str) -> Result<Option<String>, AggregateError> {
        Ok(self.get_channel_id_for_username(name).await?)
    }
}
