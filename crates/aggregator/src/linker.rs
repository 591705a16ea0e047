//! Mapping social-graph accounts to their streaming and video channels.
//!
//! An account earns an entry only when its profile or pinned tweet carries
//! a usable Twitch link. The bio is checked first for the whole batch;
//! pinned tweets are fetched only for accounts the bio pass left
//! unresolved, which keeps tweet-lookup volume down to the stragglers.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use timeout_cache::TimeoutCache;
use tracing::{debug, warn};

use twitter_api::Account;

use crate::extract::{self, YoutubeIdResolver};
use crate::redirect::RedirectResolver;
use crate::sources::{SocialGraph, VideoHost};
use crate::{AggregateError, RedirectProbe};

pub const IDENTIFIER_CACHE_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Hard per-request ceiling on the tweet lookup endpoint.
const TWEET_BATCH_LIMIT: usize = 100;

/// Where an account streams, and optionally where its uploads live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountIdentifiers {
    pub twitch_login: String,
    pub youtube_id: Option<String>,
}

pub struct AccountLinker<G, V, P> {
    graph: G,
    resolver: RedirectResolver<P>,
    youtube: YoutubeIdResolver<V>,
    identifier_cache: TimeoutCache<String, AccountIdentifiers>,
}

impl<G, V, P> AccountLinker<G, V, P>
where
    G: SocialGraph,
    V: VideoHost,
    P: RedirectProbe,
{
    pub fn new(
        graph: G,
        resolver: RedirectResolver<P>,
        youtube: YoutubeIdResolver<V>,
        identifier_cache: TimeoutCache<String, AccountIdentifiers>,
    ) -> Self {
        Self {
            graph,
            resolver,
            youtube,
            identifier_cache,
        }
    }

    /// Identifiers for one text-plus-links source (a bio or a tweet).
    ///
    /// Profile links are authoritative for the Twitch login; free text is
    /// the fallback. The video channel only ever comes from links.
    async fn identifiers_from_source(
        &self,
        text: &str,
        links: &[String],
    ) -> Option<AccountIdentifiers> {
        let twitch_login = match extract::find_twitch_login(links) {
            Some(login) => Some(login),
            None => {
                let resolved = self.resolver.resolve_links_in_text(text).await;
                extract::extract_twitch_login(&resolved)
            }
        }?;

        let youtube_id = self.youtube.find_in_links(links).await;

        Some(AccountIdentifiers {
            twitch_login,
            youtube_id,
        })
    }

    /// Map each account to its identifiers, keyed by account id.
    ///
    /// Accounts with no discoverable Twitch presence are simply absent.
    pub async fn link_identifiers(
        &self,
        accounts: &[Account],
    ) -> Result<HashMap<String, AccountIdentifiers>, AggregateError> {
        let mut linked: HashMap<String, AccountIdentifiers> = HashMap::new();

        let mut uncached: Vec<&Account> = Vec::new();
        for account in accounts {
            match self.identifier_cache.get(&account.id) {
                Some(known) => {
                    linked.insert(account.id.clone(), known);
                }
                None => uncached.push(account),
            }
        }

        // Bio pass, all uncached accounts concurrently.
        let bio_results = join_all(uncached.iter().map(|account| async {
            let found = self
                .identifiers_from_source(&account.description, &account.account_links)
                .await;
            (*account, found)
        }))
        .await;

        let mut unresolved: Vec<&Account> = Vec::new();
        for (account, found) in bio_results {
            match found {
                Some(identifiers) => {
                    self.identifier_cache
                        .set(account.id.clone(), identifiers.clone());
                    linked.insert(account.id.clone(), identifiers);
                }
                None => unresolved.push(account),
            }
        }

        // Pinned-tweet pass, only where the bio said nothing.
        let with_pinned: Vec<&Account> = unresolved
            .into_iter()
            .filter(|account| account.pinned_tweet_id.is_some())
            .collect();

        for batch in with_pinned.chunks(TWEET_BATCH_LIMIT) {
            let ids: Vec<String> = batch
                .iter()
                .filter_map(|account| account.pinned_tweet_id.clone())
                .collect();

            let tweets = match self.graph.tweets_by_ids(&ids).await {
                Ok(tweets) => tweets,
                Err(err) => {
                    warn!(batch = ids.len(), error = %err, "pinned tweet batch failed");
                    continue;
                }
            };
            let by_id: HashMap<&str, &twitter_api::Tweet> =
                tweets.iter().map(|t| (t.id.as_str(), t)).collect();

            let tweet_results = join_all(batch.iter().map(|account| async {
                let tweet = account
                    .pinned_tweet_id
                    .as_deref()
                    .and_then(|id| by_id.get(id));
                let found = match tweet {
                    Some(tweet) => self.identifiers_from_source(&tweet.text, &tweet.urls).await,
                    None => None,
                };
                (*account, found)
            }))
            .await;

            for (account, found) in tweet_results {
                if let Some(identifiers) = found {
                    self.identifier_cache
                        .set(account.id.clone(), identifiers.clone());
                    linked.insert(account.id.clone(), identifiers);
                }
            }
        }

        debug!(
            accounts = accounts.len(),
            linked = linked.len(),
            "identifier linking finished"
        );
        Ok(linked)
    }
}
