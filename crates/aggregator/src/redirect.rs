//! Shortened-link expansion.
//!
//! Link shorteners hide the destination behind a redirect chain; the
//! resolver follows the chain once, caches the final URL, and bounds how
//! many probes run at the same time so a link-heavy batch can't open
//! hundreds of sockets at once.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use futures_util::future::join_all;
use regex::Regex;
use timeout_cache::TimeoutCache;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::AggregateError;

/// Resolved destinations stay valid for a long time; six hours keeps the
/// probe volume low without going stale in practice.
pub const REDIRECT_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Ceiling on simultaneous in-flight probes.
pub const MAX_CONCURRENT_PROBES: usize = 50;

/// Probes give up quickly; a slow shortener is treated as unresolvable.
const PROBE_TIMEOUT: Duration = Duration::from_millis(1500);

static SHORTLINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://t\.co/[a-zA-Z0-9]+").expect("shortlink pattern")
});

/// A single GET that follows redirects and reports where it ended up.
pub trait RedirectProbe {
    async fn final_url(&self, url: &str) -> Result<String, AggregateError>;
}

/// Probe backed by a real HTTP client with redirect-following enabled.
#[derive(Clone)]
pub struct HttpProbe {
    http: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> Result<Self, AggregateError> {
        let http = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| AggregateError::Upstream(e.to_string()))?;
        Ok(Self { http })
    }
}

impl RedirectProbe for HttpProbe {
    async fn final_url(&self, url: &str) -> Result<String, AggregateError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AggregateError::Upstream(e.to_string()))?;
        Ok(resp.url().to_string())
    }
}

/// Caching, concurrency-bounded redirect resolver.
pub struct RedirectResolver<P> {
    probe: P,
    cache: TimeoutCache<String, String>,
    gate: Arc<Semaphore>,
}

impl<P: Clone> Clone for RedirectResolver<P> {
    fn clone(&self) -> Self {
        Self {
            probe: self.probe.clone(),
            cache: self.cache.clone(),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<P: RedirectProbe> RedirectResolver<P> {
    pub fn new(probe: P, cache: TimeoutCache<String, String>) -> Self {
        Self::with_limit(probe, cache, MAX_CONCURRENT_PROBES)
    }

    pub fn with_limit(probe: P, cache: TimeoutCache<String, String>, limit: usize) -> Self {
        Self {
            probe,
            cache,
            gate: Arc::new(Semaphore::new(limit)),
        }
    }

    /// Resolve one URL to its final destination.
    ///
    /// Never fails: any probe problem falls back to returning the input
    /// unchanged, uncached, so a later attempt can still succeed.
    pub async fn resolve(&self, url: &str) -> String {
        if let Some(found) = self.cache.get(&url.to_string()) {
            return found;
        }

        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(_) => return url.to_string(),
        };

        // Another waiter may have resolved the same URL while we queued.
        if let Some(found) = self.cache.get(&url.to_string()) {
            return found;
        }

        match self.probe.final_url(url).await {
            Ok(resolved) => {
                self.cache.set(url.to_string(), resolved.clone());
                resolved
            }
            Err(err) => {
                debug!(url, error = %err, "redirect probe failed, keeping original");
                url.to_string()
            }
        }
    }

    /// Replace every shortened link in `text` with its destination.
    ///
    /// Lookups run concurrently but splice back in scan order, so the
    /// output differs from the input only inside the matched spans.
    pub async fn resolve_links_in_text(&self, text: &str) -> String {
        let matches: Vec<regex::Match<'_>> = SHORTLINK_RE.find_iter(text).collect();
        if matches.is_empty() {
            return text.to_string();
        }

        let resolutions = join_all(matches.iter().map(|m| self.resolve(m.as_str()))).await;

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for (m, resolved) in matches.iter().zip(resolutions) {
            out.push_str(&text[cursor..m.start()]);
            out.push_str(&resolved);
            cursor = m.end();
        }
        out.push_str(&text[cursor..]);
        out
    }
}
