//! In-memory collaborator doubles with call counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use twitch_api::{StreamInfo, TwitchUser};
use twitter_api::{Account, Tweet};
use youtube_api::Video;

use crate::redirect::RedirectProbe;
use crate::sources::{SocialGraph, StreamingPlatform, VideoHost};
use crate::AggregateError;

#[derive(Clone)]
pub struct FakeSocialGraph {
    following: Arc<Mutex<HashMap<String, Vec<Account>>>>,
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    tweets: Arc<Mutex<HashMap<String, Tweet>>>,
    tweets_fail: Arc<AtomicBool>,
    pub following_calls: Arc<AtomicUsize>,
    pub tweet_calls: Arc<AtomicUsize>,
}

impl FakeSocialGraph {
    pub fn new() -> Self {
        Self {
            following: Arc::new(Mutex::new(HashMap::new())),
            accounts: Arc::new(Mutex::new(HashMap::new())),
            tweets: Arc::new(Mutex::new(HashMap::new())),
            tweets_fail: Arc::new(AtomicBool::new(false)),
            following_calls: Arc::new(AtomicUsize::new(0)),
            tweet_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn add_following(&self, seed: &str, accounts: Vec<Account>) {
        self.following
            .lock()
            .unwrap()
            .insert(seed.to_string(), accounts);
    }

    pub fn add_account(&self, account: Account) {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.id.clone(), account);
    }

    pub fn add_tweet(&self, id: &str, author_id: &str, text: &str, urls: &[&str]) {
        self.tweets.lock().unwrap().insert(
            id.to_string(),
            Tweet {
                id: id.to_string(),
                author_id: Some(author_id.to_string()),
                text: text.to_string(),
                urls: urls.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    pub fn fail_tweets(&self) {
        self.tweets_fail.store(true, Ordering::SeqCst);
    }
}

impl SocialGraph for FakeSocialGraph {
    async fn following(&self, user_id: &str) -> Result<Option<Vec<Account>>, AggregateError> {
        self.following_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.following.lock().unwrap().get(user_id).cloned())
    }

    async fn account(&self, user_id: &str) -> Result<Option<Account>, AggregateError> {
        Ok(self.accounts.lock().unwrap().get(user_id).cloned())
    }

    async fn tweets_by_ids(&self, ids: &[String]) -> Result<Vec<Tweet>, AggregateError> {
        self.tweet_calls.fetch_add(1, Ordering::SeqCst);
        if self.tweets_fail.load(Ordering::SeqCst) {
            return Err(AggregateError::Upstream("tweet lookup down".to_string()));
        }
        let tweets = self.tweets.lock().unwrap();
        Ok(ids.iter().filter_map(|id| tweets.get(id).cloned()).collect())
    }
}

#[derive(Clone)]
pub struct FakeStreaming {
    users: Arc<Mutex<HashMap<String, TwitchUser>>>,
    streams: Arc<Mutex<HashMap<String, Vec<StreamInfo>>>>,
}

impl FakeStreaming {
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            streams: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn add_user(&self, login: &str, id: &str, display_name: &str) {
        self.users.lock().unwrap().insert(
            login.to_string(),
            TwitchUser {
                id: id.to_string(),
                login: login.to_string(),
                display_name: display_name.to_string(),
                description: format!("{display_name} streams things"),
                profile_image_url: format!("https://cdn.example/{login}.png"),
                offline_image_url: format!("https://cdn.example/{login}-offline.png"),
            },
        );
    }

    pub fn add_stream(&self, login: &str, stream_id: &str) {
        self.streams
            .lock()
            .unwrap()
            .entry(login.to_string())
            .or_default()
            .push(StreamInfo {
                id: stream_id.to_string(),
                user_id: format!("uid-{login}"),
                user_login: login.to_string(),
                started_at: Some("2026-02-16T00:00:00Z".to_string()),
                stream_type: "live".to_string(),
            });
    }
}

impl StreamingPlatform for FakeStreaming {
    async fn users_by_logins(
        &self,
        logins: &[String],
    ) -> Result<HashMap<String, TwitchUser>, AggregateError> {
        let users = self.users.lock().unwrap();
        Ok(logins
            .iter()
            .filter_map(|login| users.get(login).map(|u| (login.clone(), u.clone())))
            .collect())
    }

    async fn streams_by_logins(
        &self,
        logins: &[String],
    ) -> Result<HashMap<String, Vec<StreamInfo>>, AggregateError> {
        let streams = self.streams.lock().unwrap();
        Ok(logins
            .iter()
            .filter_map(|login| streams.get(login).map(|s| (login.clone(), s.clone())))
            .collect())
    }
}

#[derive(Clone)]
pub struct FakeVideoHost {
    feeds: Arc<Mutex<HashMap<String, Vec<String>>>>,
    failing_feeds: Arc<Mutex<Vec<String>>>,
    videos: Arc<Mutex<HashMap<String, Video>>>,
    channel_names: Arc<Mutex<HashMap<String, String>>>,
    contract_broken: Arc<AtomicBool>,
    pub channel_lookups: Arc<AtomicUsize>,
    pub video_fetches: Arc<AtomicUsize>,
}

impl FakeVideoHost {
    pub fn new() -> Self {
        Self {
            feeds: Arc::new(Mutex::new(HashMap::new())),
            failing_feeds: Arc::new(Mutex::new(Vec::new())),
            videos: Arc::new(Mutex::new(HashMap::new())),
            channel_names: Arc::new(Mutex::new(HashMap::new())),
            contract_broken: Arc::new(AtomicBool::new(false)),
            channel_lookups: Arc::new(AtomicUsize::new(0)),
            video_fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn add_feed(&self, channel_id: &str, video_ids: &[&str]) {
        self.feeds.lock().unwrap().insert(
            channel_id.to_string(),
            video_ids.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn fail_feed(&self, channel_id: &str) {
        self.failing_feeds
            .lock()
            .unwrap()
            .push(channel_id.to_string());
    }

    pub fn add_video(&self, id: &str, channel_id: &str, title: &str, duration: u64, live: bool) {
        self.videos.lock().unwrap().insert(
            id.to_string(),
            Video {
                id: id.to_string(),
                channel_id: channel_id.to_string(),
                title: title.to_string(),
                embed_html: format!("<iframe src=\"https://video.example/{id}\"></iframe>"),
                duration_seconds: duration,
                is_live: live,
            },
        );
    }

    pub fn add_channel_name(&self, name: &str, channel_id: &str) {
        self.channel_names
            .lock()
            .unwrap()
            .insert(name.to_string(), channel_id.to_string());
    }

    pub fn break_video_contract(&self) {
        self.contract_broken.store(true, Ordering::SeqCst);
    }
}

impl VideoHost for FakeVideoHost {
    async fn recent_upload_ids(&self, channel_id: &str) -> Result<Vec<String>, AggregateError> {
        if self
            .failing_feeds
            .lock()
            .unwrap()
            .iter()
            .any(|c| c == channel_id)
        {
            return Err(AggregateError::Upstream("feed unavailable".to_string()));
        }
        Ok(self
            .feeds
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn videos_by_ids(&self, ids: &[String]) -> Result<Vec<Video>, AggregateError> {
        self.video_fetches.fetch_add(1, Ordering::SeqCst);
        if self.contract_broken.load(Ordering::SeqCst) {
            return Err(AggregateError::ContractViolation(
                "video missing required field".to_string(),
            ));
        }
        let videos = self.videos.lock().unwrap();
        Ok(ids.iter().filter_map(|id| videos.get(id).cloned()).collect())
    }

    async fn channel_id_for_name(&self, name: &str) -> Result<Option<String>, AggregateError> {
        self.channel_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.channel_names.lock().unwrap().get(name).cloned())
    }
}

/// Probe double that records peak concurrency.
#[derive(Clone)]
pub struct CountingProbe {
    redirects: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
    pub calls: Arc<AtomicUsize>,
    pub max_concurrent: Arc<AtomicUsize>,
}

impl CountingProbe {
    pub fn new() -> Self {
        Self {
            redirects: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(AtomicUsize::new(0)),
            max_concurrent: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn map(&self, from: &str, to: &str) {
        self.redirects
            .lock()
            .unwrap()
            .insert(from.to_string(), to.to_string());
    }

    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

impl RedirectProbe for CountingProbe {
    async fn final_url(&self, url: &str) -> Result<String, AggregateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(AggregateError::Upstream("probe failed".to_string()));
        }
        let redirects = self.redirects.lock().unwrap();
        Ok(redirects.get(url).cloned().unwrap_or_else(|| url.to_string()))
    }
}
