//! The account-linking and caching aggregation engine.
//!
//! Given a seed Twitter account, discovers which Twitch and YouTube channels
//! the accounts it follows are associated with, cross-references live-stream
//! state and recent uploads, and produces the merged "top accounts" view.
//! Every expensive lookup goes through an injected
//! [`timeout_cache::TimeoutCache`], and all upstream collaborators sit
//! behind traits so tests can substitute doubles.
#![allow(async_fn_in_trait)]

pub mod extract;
pub mod linker;
pub mod orchestrator;
pub mod redirect;
pub mod sources;
pub mod vods;

#[cfg(test)]
mod doubles;

pub use linker::{AccountIdentifiers, AccountLinker};
pub use orchestrator::{Aggregator, TopAccount, TopAccountVod};
pub use redirect::{HttpProbe, RedirectProbe, RedirectResolver};
pub use sources::{SocialGraph, StreamingPlatform, VideoHost};
pub use vods::{Vod, VodFinder};

/// Unified error type for the aggregation engine.
///
/// Upstream hiccups with a documented fallback never surface here; what does
/// reach the caller is one of three shapes: the requested entity does not
/// exist, an upstream call with no fallback failed, or an upstream response
/// broke its own contract.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("not found")]
    NotFound,

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("upstream contract violation: {0}")]
    ContractViolation(String),
}

impl From<twitter_api::TwitterError> for AggregateError {
    fn from(err: twitter_api::TwitterError) -> Self {
        AggregateError::Upstream(err.to_string())
    }
}

impl From<twitch_api::TwitchError> for AggregateError {
    fn from(err: twitch_api::TwitchError) -> Self {
        AggregateError::Upstream(err.to_string())
    }
}

impl From<youtube_api::YoutubeError> for AggregateError {
    fn from(err: youtube_api::YoutubeError) -> Self {
        match err {
            youtube_api::YoutubeError::ContractViolation(msg) => {
                AggregateError::ContractViolation(msg)
            }
            other => AggregateError::Upstream(other.to_string()),
        }
    }
}
