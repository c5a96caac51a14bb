use std::sync::Arc;

use adlens_common::CreativeConfig;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::candidate::{CreativeCandidate, ValidatedCreative};
use crate::fallback::{FallbackStrategy, NoFallback};
use crate::probe::{ImageFetcher, Prober};
use crate::rank::rank;
use crate::search::extract_candidates;

/// What the resolver hands back for one ad.
#[derive(Debug, Clone, Serialize)]
pub struct CreativeOutcome {
    pub creative: ValidatedCreative,
    /// The validated URL when one was found, otherwise any unvalidated URLs
    /// from the fallback lookup.
    pub urls: Vec<String>,
}

/// Extract, rank and probe one ad record at a time.
pub struct CreativeResolver {
    prober: Prober,
    fallback: Arc<dyn FallbackStrategy>,
}

impl CreativeResolver {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, config: CreativeConfig) -> Self {
        Self {
            prober: Prober::new(fetcher, config),
            fallback: Arc::new(NoFallback),
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackStrategy>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Ranked, deduplicated candidates for one record. Pure.
    pub fn candidates(record: &Value, ad_id: &str) -> Vec<CreativeCandidate> {
        rank(extract_candidates(record, ad_id))
    }

    pub fn prober(&self) -> &Prober {
        &self.prober
    }

    /// Find the creative for one ad. `domain` is the searched domain and
    /// only decides whether the fallback lookup runs.
    pub async fn resolve(&self, record: &Value, ad_id: &str, domain: &str) -> CreativeOutcome {
        let candidates = Self::candidates(record, ad_id);
        debug!(ad_id, count = candidates.len(), "ranked creative candidates");

        let creative = self.prober.probe(&candidates, ad_id).await;
        if let Some(url) = creative.url.clone() {
            return CreativeOutcome {
                creative,
                urls: vec![url],
            };
        }

        if !self.fallback.applies_to(domain) {
            info!(ad_id, domain, "No valid creative found");
            return CreativeOutcome {
                creative,
                urls: Vec::new(),
            };
        }

        info!(ad_id, domain, "No valid creative in primary data, trying fallback");
        let urls = self.fallback.recover(ad_id).await;
        CreativeOutcome { creative, urls }
    }
}
