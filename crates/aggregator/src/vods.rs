//! Picking the newest stream archive per video channel.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::future::join_all;
use timeout_cache::TimeoutCache;
use tracing::warn;

use youtube_api::Video;

use crate::sources::VideoHost;
use crate::AggregateError;

pub const VIDEO_INFO_CACHE_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Anything shorter is a clip or a short, not a stream archive.
pub const DEFAULT_MIN_VOD_SECONDS: u64 = 1800;

/// Hard per-request ceiling on the video metadata endpoint.
const VIDEO_BATCH_LIMIT: usize = 50;

/// The newest qualifying upload of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Vod {
    pub channel_id: String,
    pub video_id: String,
    pub title: String,
    pub embed_html: String,
    pub duration_seconds: u64,
}

pub struct VodFinder<V> {
    host: V,
    video_cache: TimeoutCache<String, Video>,
    min_duration_seconds: u64,
}

impl<V: VideoHost> VodFinder<V> {
    pub fn new(host: V, video_cache: TimeoutCache<String, Video>) -> Self {
        Self::with_min_duration(host, video_cache, DEFAULT_MIN_VOD_SECONDS)
    }

    pub fn with_min_duration(
        host: V,
        video_cache: TimeoutCache<String, Video>,
        min_duration_seconds: u64,
    ) -> Self {
        Self {
            host,
            video_cache,
            min_duration_seconds,
        }
    }

    fn qualifies(&self, video: &Video) -> bool {
        !video.is_live && video.duration_seconds >= self.min_duration_seconds
    }

    /// Latest long-form archive for each channel, keyed by channel id.
    ///
    /// Feeds are probed concurrently; a channel whose feed fails is
    /// treated as having no uploads. Metadata comes in shared batches
    /// across channels, cached per video. A channel whose recent uploads
    /// are all live, upcoming, or short gets no entry at all.
    pub async fn find_latest_vods(
        &self,
        channel_ids: &[String],
    ) -> Result<HashMap<String, Vod>, AggregateError> {
        let feeds = join_all(channel_ids.iter().map(|channel_id| async move {
            match self.host.recent_upload_ids(channel_id).await {
                Ok(ids) => (channel_id.clone(), ids),
                Err(err) => {
                    warn!(channel_id, error = %err, "upload feed probe failed");
                    (channel_id.clone(), Vec::new())
                }
            }
        }))
        .await;

        // First feed to mention a video owns its fetch; duplicates across
        // channels are rare but the metadata is shared either way.
        let mut videos: HashMap<String, Video> = HashMap::new();
        let mut to_fetch: Vec<String> = Vec::new();
        for (_, ids) in &feeds {
            for id in ids {
                if videos.contains_key(id) || to_fetch.contains(id) {
                    continue;
                }
                match self.video_cache.get(id) {
                    Some(video) => {
                        videos.insert(id.clone(), video);
                    }
                    None => to_fetch.push(id.clone()),
                }
            }
        }

        for batch in to_fetch.chunks(VIDEO_BATCH_LIMIT) {
            match self.host.videos_by_ids(batch).await {
                Ok(fetched) => {
                    for video in fetched {
                        self.video_cache.set(video.id.clone(), video.clone());
                        videos.insert(video.id.clone(), video);
                    }
                }
                Err(err @ AggregateError::ContractViolation(_)) => return Err(err),
                Err(err) => {
                    warn!(batch = batch.len(), error = %err, "video metadata batch failed");
                }
            }
        }

        let mut latest: HashMap<String, Vod> = HashMap::new();
        for (channel_id, ids) in &feeds {
            for id in ids {
                let Some(video) = videos.get(id) else {
                    continue;
                };
                if self.qualifies(video) {
                    latest.insert(
                        channel_id.clone(),
                        Vod {
                            channel_id: channel_id.clone(),
                            video_id: video.id.clone(),
                            title: video.title.clone(),
                            embed_html: video.embed_html.clone(),
                            duration_seconds: video.duration_seconds,
                        },
                    );
                    break;
                }
            }
        }

        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::doubles::FakeVideoHost;

    fn finder(host: FakeVideoHost) -> VodFinder<FakeVideoHost> {
        VodFinder::new(host, TimeoutCache::new("videos", VIDEO_INFO_CACHE_TTL))
    }

    #[tokio::test]
    async fn first_qualifying_video_in_feed_order_wins() {
        let host = FakeVideoHost::new();
        host.add_feed("UCchan", &["v1", "v2", "v3", "v4", "v5"]);
        host.add_video("v1", "UCchan", "going live soon", 0, true);
        host.add_video("v2", "UCchan", "short clip", 90, false);
        host.add_video("v3", "UCchan", "still too short", 1799, false);
        host.add_video("v4", "UCchan", "full stream archive", 7200, false);
        host.add_video("v5", "UCchan", "older archive", 10800, false);

        let vods = finder(host).find_latest_vods(&["UCchan".to_string()]).await.unwrap();
        assert_eq!(vods["UCchan"].video_id, "v4");
    }

    #[tokio::test]
    async fn channel_with_no_qualifying_upload_gets_no_entry() {
        let host = FakeVideoHost::new();
        host.add_feed("UCchan", &["v1"]);
        host.add_video("v1", "UCchan", "a short", 30, false);

        let vods = finder(host).find_latest_vods(&["UCchan".to_string()]).await.unwrap();
        assert!(vods.is_empty());
    }

    #[tokio::test]
    async fn failed_feed_probe_only_loses_that_channel() {
        let host = FakeVideoHost::new();
        host.add_feed("UCgood", &["v1"]);
        host.add_video("v1", "UCgood", "archive", 3600, false);
        host.fail_feed("UCbad");

        let vods = finder(host)
            .find_latest_vods(&["UCbad".to_string(), "UCgood".to_string()])
            .await
            .unwrap();
        assert_eq!(vods.len(), 1);
        assert_eq!(vods["UCgood"].video_id, "v1");
    }

    #[tokio::test]
    async fn cached_metadata_is_not_refetched() {
        let host = FakeVideoHost::new();
        host.add_feed("UCchan", &["v1"]);
        host.add_video("v1", "UCchan", "archive", 3600, false);
        let finder = finder(host.clone());

        finder.find_latest_vods(&["UCchan".to_string()]).await.unwrap();
        finder.find_latest_vods(&["UCchan".to_string()]).await.unwrap();
        assert_eq!(host.video_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn contract_violation_aborts_the_whole_scan() {
        let host = FakeVideoHost::new();
        host.add_feed("UCchan", &["v1"]);
        host.break_video_contract();

        let err = finder(host)
            .find_latest_vods(&["UCchan".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AggregateError::ContractViolation(_)));
    }

    #[tokio::test]
    async fn custom_minimum_duration_is_honored() {
        let host = FakeVideoHost::new();
        host.add_feed("UCchan", &["v1"]);
        host.add_video("v1", "UCchan", "ten minutes", 600, false);
        let finder = VodFinder::with_min_duration(
            host,
            TimeoutCache::new("videos", VIDEO_INFO_CACHE_TTL),
            600,
        );

        let vods = finder.find_latest_vods(&["UCchan".to_string()]).await.unwrap();
        assert_eq!(vods["UCchan"].video_id, "v1");
    }
}
