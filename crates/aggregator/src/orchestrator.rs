//! The merged "top accounts" view.
//!
//! One call fans out to the social graph, the streaming platform, and the
//! video host, then folds everything into a per-account summary sorted
//! with live channels first.

use std::cmp::Ordering;
use std::time::Duration;

use serde::Serialize;
use timeout_cache::TimeoutCache;
use tracing::{debug, info};

use twitter_api::Account;

use crate::linker::AccountLinker;
use crate::sources::{SocialGraph, StreamingPlatform, VideoHost};
use crate::vods::VodFinder;
use crate::{AggregateError, RedirectProbe};

/// Follow lists churn slowly; two hours of staleness is acceptable.
pub const FOLLOWING_CACHE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

pub const ACCOUNT_CACHE_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// The VOD slot of a summary, when the account has a linked video channel
/// with a recent long-form upload.
#[derive(Debug, Clone, Serialize)]
pub struct TopAccountVod {
    pub video_id: String,
    pub title: String,
    pub embed_html: String,
}

/// One followed account with its cross-platform state merged in.
#[derive(Debug, Clone, Serialize)]
pub struct TopAccount {
    pub id: String,
    pub twitter_login: String,
    pub twitter_verified: bool,
    pub twitch_id: String,
    pub twitch_login: String,
    pub twitch_stream_id: Option<String>,
    pub profile_picture_url: String,
    pub offline_cover_url: String,
    pub display_name: String,
    pub description: String,
    pub vod: Option<TopAccountVod>,
}

impl TopAccount {
    fn is_live(&self) -> bool {
        self.twitch_stream_id.is_some()
    }
}

pub struct Aggregator<G, S, V, P> {
    graph: G,
    streaming: S,
    linker: AccountLinker<G, V, P>,
    vods: VodFinder<V>,
    following_cache: TimeoutCache<String, Vec<Account>>,
    account_cache: TimeoutCache<String, Account>,
}

impl<G, S, V, P> Aggregator<G, S, V, P>
where
    G: SocialGraph,
    S: StreamingPlatform,
    V: VideoHost,
    P: RedirectProbe,
{
    pub fn new(
        graph: G,
        streaming: S,
        linker: AccountLinker<G, V, P>,
        vods: VodFinder<V>,
        following_cache: TimeoutCache<String, Vec<Account>>,
        account_cache: TimeoutCache<String, Account>,
    ) -> Self {
        Self {
            graph,
            streaming,
            linker,
            vods,
            following_cache,
            account_cache,
        }
    }

    /// The full summary list for everyone `seed_user_id` follows.
    pub async fn top_accounts(&self, seed_user_id: &str) -> Result<Vec<TopAccount>, AggregateError> {
        let following = match self.following_cache.get(&seed_user_id.to_string()) {
            Some(cached) => cached,
            None => {
                let fetched = self
                    .graph
                    .following(seed_user_id)
                    .await?
                    .ok_or(AggregateError::NotFound)?;
                self.following_cache
                    .set(seed_user_id.to_string(), fetched.clone());
                fetched
            }
        };

        let mut accounts = self.assemble(&following).await?;
        accounts.sort_by(compare_top_accounts);
        info!(
            seed = seed_user_id,
            following = following.len(),
            summarized = accounts.len(),
            "top accounts assembled"
        );
        Ok(accounts)
    }

    /// The summary for a single account, by its social-graph id.
    ///
    /// NotFound covers both an unknown account and a known one with no
    /// discoverable streaming presence.
    pub async fn top_account(&self, account_id: &str) -> Result<TopAccount, AggregateError> {
        let account = match self.account_cache.get(&account_id.to_string()) {
            Some(cached) => cached,
            None => {
                let fetched = self
                    .graph
                    .account(account_id)
                    .await?
                    .ok_or(AggregateError::NotFound)?;
                self.account_cache
                    .set(account_id.to_string(), fetched.clone());
                fetched
            }
        };

        let assembled = self.assemble(std::slice::from_ref(&account)).await?;
        assembled.into_iter().next().ok_or(AggregateError::NotFound)
    }

    /// Merge platform state into summaries, preserving input order.
    ///
    /// Accounts drop out silently when they have no Twitch link or when
    /// the linked login doesn't exist on the platform.
    async fn assemble(&self, accounts: &[Account]) -> Result<Vec<TopAccount>, AggregateError> {
        let identifiers = self.linker.link_identifiers(accounts).await?;

        let logins: Vec<String> = identifiers
            .values()
            .map(|ids| ids.twitch_login.clone())
            .collect();
        let youtube_ids: Vec<String> = identifiers
            .values()
            .filter_map(|ids| ids.youtube_id.clone())
            .collect();

        let users = self.streaming.users_by_logins(&logins).await?;
        let streams = self.streaming.streams_by_logins(&logins).await?;
        let vods = self.vods.find_latest_vods(&youtube_ids).await?;

        let mut out = Vec::new();
        for account in accounts {
            let Some(ids) = identifiers.get(&account.id) else {
                continue;
            };
            let Some(user) = users.get(&ids.twitch_login) else {
                debug!(login = %ids.twitch_login, "linked login unknown to the platform");
                continue;
            };

            let twitch_stream_id = streams
                .get(&ids.twitch_login)
                .and_then(|live| live.first())
                .map(|stream| stream.id.clone());

            let vod = ids
                .youtube_id
                .as_ref()
                .and_then(|channel_id| vods.get(channel_id))
                .map(|vod| TopAccountVod {
                    video_id: vod.video_id.clone(),
                    title: vod.title.clone(),
                    embed_html: vod.embed_html.clone(),
                });

            out.push(TopAccount {
                id: account.id.clone(),
                twitter_login: account.username.clone(),
                twitter_verified: account.verified,
                twitch_id: user.id.clone(),
                twitch_login: user.login.clone(),
                twitch_stream_id,
                profile_picture_url: user.profile_image_url.clone(),
                offline_cover_url: user.offline_image_url.clone(),
                display_name: user.display_name.clone(),
                description: account.description.clone(),
                vod,
            });
        }
        Ok(out)
    }
}

/// Live channels first, then display name, then id as the tiebreak.
fn compare_top_accounts(a: &TopAccount, b: &TopAccount) -> Ordering {
    b.is_live()
        .cmp(&a.is_live())
        .then_with(|| a.display_name.cmp(&b.display_name))
        .then_with(|| a.id.cmp(&b.id))
}
