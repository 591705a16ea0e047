//! Headless aggregation binary.
//!
//! Takes a seed account id on the command line, assembles the "who do I
//! follow that is live right now" view, and prints it as JSON. Caches are
//! loaded from disk on startup and written back while the process runs.

mod config;

use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use aggregator::extract::{CHANNEL_ID_CACHE_TTL, YoutubeIdResolver};
use aggregator::linker::IDENTIFIER_CACHE_TTL;
use aggregator::orchestrator::{ACCOUNT_CACHE_TTL, FOLLOWING_CACHE_TTL};
use aggregator::redirect::REDIRECT_CACHE_TTL;
use aggregator::vods::VIDEO_INFO_CACHE_TTL;
use aggregator::{AccountLinker, Aggregator, HttpProbe, RedirectResolver, VodFinder};
use timeout_cache::TimeoutCache;
use timeout_cache::persist::{load_snapshot, run_persist_loop, write_snapshot};
use twitch_api::{AppAuth, TwitchClient};
use twitter_api::TwitterClient;
use youtube_api::YoutubeClient;

use crate::config::AppConfig;

const USER_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

fn load_dotenv() {
    for path in [".env", "../.env"] {
        if dotenvy::from_filename(path).is_ok() {
            return;
        }
    }
}

/// Each cache persists to one file named after it.
fn snapshot_path<K, V>(dir: &Path, cache: &TimeoutCache<K, V>) -> PathBuf
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    dir.join(format!("{}.json", cache.name()))
}

/// Warm a cache from its snapshot file and keep it swept and persisted
/// until shutdown.
async fn attach_cache<K, V>(cache: &TimeoutCache<K, V>, dir: &Path, cancel: &CancellationToken)
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let path = snapshot_path(dir, cache);
    load_snapshot(cache, &path).await;

    let sweeper = cache.clone();
    let sweep_cancel = cancel.clone();
    tokio::spawn(async move { sweeper.run_sweeper(sweep_cancel).await });

    tokio::spawn(run_persist_loop(cache.clone(), path, cancel.clone()));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    load_dotenv();
    let config = AppConfig::from_env()?;
    let seed = std::env::args()
        .nth(1)
        .context("usage: stream-lens <seed-account-id>")?;

    std::fs::create_dir_all(&config.cache_dir)
        .with_context(|| format!("creating cache dir {}", config.cache_dir.display()))?;

    let cancel = CancellationToken::new();
    let dir = config.cache_dir.as_path();

    let redirect_cache = TimeoutCache::new("redirects", REDIRECT_CACHE_TTL);
    let channel_id_cache = TimeoutCache::new("channel-ids", CHANNEL_ID_CACHE_TTL);
    let identifier_cache = TimeoutCache::new("identifiers", IDENTIFIER_CACHE_TTL);
    let video_cache = TimeoutCache::new("videos", VIDEO_INFO_CACHE_TTL);
    let user_cache = TimeoutCache::new("twitch-users", USER_CACHE_TTL);
    let following_cache = TimeoutCache::new("following", FOLLOWING_CACHE_TTL);
    let account_cache = TimeoutCache::new("accounts", ACCOUNT_CACHE_TTL);

    attach_cache(&redirect_cache, dir, &cancel).await;
    attach_cache(&channel_id_cache, dir, &cancel).await;
    attach_cache(&identifier_cache, dir, &cancel).await;
    attach_cache(&video_cache, dir, &cancel).await;
    attach_cache(&user_cache, dir, &cancel).await;
    attach_cache(&following_cache, dir, &cancel).await;
    attach_cache(&account_cache, dir, &cancel).await;

    let twitter = TwitterClient::new(config.twitter_bearer_token.clone());
    let auth = AppAuth::new(
        config.twitch_client_id.clone(),
        config.twitch_client_secret.clone(),
    );
    let refresh_auth = auth.clone();
    let refresh_cancel = cancel.clone();
    tokio::spawn(async move { refresh_auth.run_refresh_loop(refresh_cancel).await });
    let twitch = TwitchClient::new(auth, user_cache.clone());
    let youtube = YoutubeClient::new(config.youtube_api_key.clone());

    let probe = HttpProbe::new()?;
    let linker = AccountLinker::new(
        twitter.clone(),
        RedirectResolver::new(probe, redirect_cache.clone()),
        YoutubeIdResolver::new(youtube.clone(), channel_id_cache.clone()),
        identifier_cache.clone(),
    );
    let vods = VodFinder::new(youtube, video_cache.clone());
    let engine = Aggregator::new(
        twitter,
        twitch,
        linker,
        vods,
        following_cache.clone(),
        account_cache.clone(),
    );

    let accounts = engine.top_accounts(&seed).await?;
    println!("{}", serde_json::to_string_pretty(&accounts)?);

    write_snapshot(&redirect_cache, &snapshot_path(dir, &redirect_cache)).await;
    write_snapshot(&channel_id_cache, &snapshot_path(dir, &channel_id_cache)).await;
    write_snapshot(&identifier_cache, &snapshot_path(dir, &identifier_cache)).await;
    write_snapshot(&video_cache, &snapshot_path(dir, &video_cache)).await;
    write_snapshot(&user_cache, &snapshot_path(dir, &user_cache)).await;
    write_snapshot(&following_cache, &snapshot_path(dir, &following_cache)).await;
    write_snapshot(&account_cache, &snapshot_path(dir, &account_cache)).await;

    cancel.cancel();
    Ok(())
}
