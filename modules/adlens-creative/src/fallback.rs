// Secondary creative lookup for ads whose search payload had nothing usable.
//
// Some advertisers' ads come back from the search scrape with only page
// imagery. For those domains the single-ad detail page can be scraped
// instead. The lookup is slow and costs a scraper run per ad, so it is
// off unless configured.

use std::collections::HashSet;
use std::sync::Arc;

use adlens_common::CreativeConfig;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::candidate::{CandidateKind, CreativeCandidate};
use crate::classify::is_creative_url;
use crate::rank::rank;
use crate::search::{ad_id_of, creative_objects, deep_search, known_shape_candidates, snapshot_of};

/// Size hint given to every fallback candidate. Detail-page payloads don't
/// follow the search payload's path conventions, so URL-based estimates
/// are not used there.
pub const FALLBACK_SIZE_HINT: u64 = 100_000;

/// Callback into the scraper for a single ad's detail page.
#[async_trait]
pub trait AdLookup: Send + Sync {
    async fn lookup_ad(&self, ad_id: &str) -> Result<Vec<Value>>;
}

#[async_trait]
pub trait FallbackStrategy: Send + Sync {
    /// Whether this strategy should run for ads found under `domain`.
    fn applies_to(&self, domain: &str) -> bool;

    /// Ranked candidate URLs from the secondary source. Not probed.
    async fn recover(&self, ad_id: &str) -> Vec<String>;
}

/// Never recovers anything.
pub struct NoFallback;

#[async_trait]
impl FallbackStrategy for NoFallback {
    fn applies_to(&self, _domain: &str) -> bool {
        false
    }

    async fn recover(&self, _ad_id: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Re-scrapes the ad's detail page and re-runs extraction on the result.
pub struct DetailPageFallback {
    lookup: Arc<dyn AdLookup>,
    enabled: bool,
    domains: HashSet<String>,
}

impl DetailPageFallback {
    pub fn new(lookup: Arc<dyn AdLookup>, config: &CreativeConfig) -> Self {
        Self {
            lookup,
            enabled: config.fallback_enabled,
            domains: config
                .fallback_domains
                .iter()
                .map(|d| d.trim().to_uppercase())
                .collect(),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Candidates from one detail-page item: the top-level image fields,
    /// the snapshot's known creative shapes and a deep search of the snapshot.
    pub fn candidates_from_item(item: &Value) -> Vec<CreativeCandidate> {
        let mut found = Vec::new();

        for key in ["original_image_url", "image_url"] {
            if let Some(url) = item.get(key).and_then(Value::as_str) {
                found.push(CreativeCandidate::new(url, key, CandidateKind::DirectField));
            }
        }

        let snapshot = snapshot_of(item);
        for (path, creative) in creative_objects(&snapshot) {
            known_shape_candidates(creative, &path, &mut found);
        }
        found.extend(deep_search(&Value::Object(snapshot.into_owned()), "snapshot"));

        found
            .into_iter()
            .filter(|c| is_creative_url(&c.url))
            .map(|c| c.with_size_hint(FALLBACK_SIZE_HINT))
            .collect()
    }

    fn pick_item<'a>(items: &'a [Value], ad_id: &str) -> Option<&'a Value> {
        if let Some(exact) = items
            .iter()
            .find(|item| ad_id_of(item).as_deref() == Some(ad_id))
        {
            return Some(exact);
        }

        let first = items.first()?;
        warn!(
            ad_id,
            returned = ?ad_id_of(first),
            "Exact ad not in fallback results, using first item"
        );
        Some(first)
    }
}

#[async_trait]
impl FallbackStrategy for DetailPageFallback {
    fn applies_to(&self, domain: &str) -> bool {
        self.enabled && self.domains.contains(&domain.trim().to_uppercase())
    }

    async fn recover(&self, ad_id: &str) -> Vec<String> {
        info!(ad_id, "Looking up ad detail page for creative");

        let items = match self.lookup.lookup_ad(ad_id).await {
            Ok(items) => items,
            Err(e) => {
                warn!(ad_id, error = %e, "Fallback lookup failed");
                return Vec::new();
            }
        };

        let Some(item) = Self::pick_item(&items, ad_id) else {
            warn!(ad_id, "Fallback lookup returned no items");
            return Vec::new();
        };

        let urls: Vec<String> = rank(Self::candidates_from_item(item))
            .into_iter()
            .map(|c| c.url)
            .collect();

        info!(ad_id, count = urls.len(), "Fallback extracted creative urls");
        urls
    }
}
