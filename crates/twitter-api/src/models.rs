//! Wire models for the v2 user and tweet payloads, plus the flattened
//! records handed to callers.

use serde::{Deserialize, Serialize};

/// A Twitter account as the aggregation pipeline sees it.
///
/// `account_links` holds the expanded entity URLs in a significant order:
/// profile-url entities first, then description entities, then (when the
/// account was fetched with its pinned tweet) the pinned tweet's entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub display_name: String,
    pub username: String,
    pub verified: bool,
    pub description: String,
    pub account_links: Vec<String>,
    pub pinned_tweet_id: Option<String>,
}

/// A tweet with its expanded entity URLs pulled out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub author_id: Option<String>,
    pub text: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub data: Option<UserV2>,
    #[serde(default)]
    pub includes: Option<Includes>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FollowingResponse {
    pub data: Option<Vec<UserV2>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TweetsResponse {
    #[serde(default)]
    pub data: Option<Vec<TweetV2>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Includes {
    #[serde(default)]
    pub tweets: Option<Vec<TweetV2>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserV2 {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pinned_tweet_id: Option<String>,
    #[serde(default)]
    pub entities: Option<UserEntities>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEntities {
    #[serde(default)]
    pub url: Option<EntityUrls>,
    #[serde(default)]
    pub description: Option<EntityUrls>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntityUrls {
    #[serde(default)]
    pub urls: Option<Vec<UrlEntity>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UrlEntity {
    #[serde(default)]
    pub expanded_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TweetV2 {
    pub id: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Option<TweetEntities>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TweetEntities {
    #[serde(default)]
    pub urls: Option<Vec<UrlEntity>>,
}

impl UrlEntity {
    /// Prefer the expanded form; shortened t.co URLs are a fallback.
    fn best_url(&self) -> Option<String> {
        self.expanded_url.clone().or_else(|| self.url.clone())
    }
}

fn entity_urls(entities: Option<&EntityUrls>) -> impl Iterator<Item = String> + '_ {
    entities
        .and_then(|e| e.urls.as_deref())
        .unwrap_or(&[])
        .iter()
        .filter_map(UrlEntity::best_url)
}

impl Account {
    pub(crate) fn from_wire(user: UserV2, pinned_tweet: Option<&TweetV2>) -> Self {
        let mut account_links: Vec<String> = Vec::new();
        if let Some(entities) = &user.entities {
            account_links.extend(entity_urls(entities.url.as_ref()));
            account_links.extend(entity_urls(entities.description.as_ref()));
        }
        if let Some(tweet) = pinned_tweet {
            let urls = tweet
                .entities
                .as_ref()
                .and_then(|e| e.urls.as_deref())
                .unwrap_or(&[]);
            account_links.extend(urls.iter().filter_map(UrlEntity::best_url));
        }

        Self {
            id: user.id,
            display_name: user.name,
            username: user.username,
            verified: user.verified.unwrap_or(false),
            description: user.description.unwrap_or_default(),
            account_links,
            pinned_tweet_id: user.pinned_tweet_id,
        }
    }
}

impl Tweet {
    pub(crate) fn from_wire(tweet: TweetV2) -> Self {
        let urls = tweet
            .entities
            .as_ref()
            .and_then(|e| e.urls.as_deref())
            .unwrap_or(&[])
            .iter()
            .filter_map(UrlEntity::best_url)
            .collect();

        Self {
            id: tweet.id,
            author_id: tweet.author_id,
            text: tweet.text.unwrap_or_default(),
            urls,
        }
    }
}
