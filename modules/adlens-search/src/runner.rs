use std::sync::Arc;

use adlens_common::AdLensError;
use adlens_creative::CreativeResolver;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info};

use crate::dates::is_date_in_range;
use crate::fields::{extract_fields, AdSummary};
use crate::query::AdSearchQuery;
use crate::scraper::AdScraper;

/// One ad as reported to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedAd {
    #[serde(flatten)]
    pub summary: AdSummary,
    /// `None` when the ad had no id and no creative lookup was attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creative_found: Option<bool>,
    pub creative_urls: Vec<String>,
    pub creative_url: Option<String>,
    #[serde(skip)]
    pub creative_bytes: Option<Bytes>,
}

impl ProcessedAd {
    fn from_summary(summary: AdSummary) -> Self {
        Self {
            summary,
            creative_found: None,
            creative_urls: Vec::new(),
            creative_url: None,
            creative_bytes: None,
        }
    }
}

pub struct AdSearchRunner {
    scraper: Arc<dyn AdScraper>,
    resolver: CreativeResolver,
}

impl AdSearchRunner {
    pub fn new(scraper: Arc<dyn AdScraper>, resolver: CreativeResolver) -> Self {
        Self { scraper, resolver }
    }

    /// Search, filter by start date and resolve each ad's creative.
    ///
    /// Only the scrape itself can fail the run. Ads whose creative can't be
    /// found are still returned, with `creative_found = false`.
    pub async fn run(&self, query: &AdSearchQuery) -> Result<Vec<ProcessedAd>, AdLensError> {
        let items = self
            .scraper
            .run_search(query)
            .await
            .map_err(|e| AdLensError::Scraping(format!("{e:#}")))?;
        info!(domain = %query.domain, count = items.len(), "Scraped ads");

        let mut processed = Vec::with_capacity(items.len());
        for item in &items {
            let summary = extract_fields(item);

            if let (Some(range), Some(start)) = (&query.date_range, &summary.start_date) {
                if !is_date_in_range(start, range) {
                    debug!(ad_id = ?summary.ad_archive_id, start, "Ad outside date range, skipping");
                    continue;
                }
            }

            let mut ad = ProcessedAd::from_summary(summary);
            if let Some(ad_id) = ad.summary.ad_archive_id.clone() {
                let outcome = self.resolver.resolve(item, &ad_id, &query.domain).await;
                ad.creative_found = Some(outcome.creative.found);
                ad.creative_url = outcome.urls.first().cloned();
                ad.creative_urls = outcome.urls;
                ad.creative_bytes = outcome.creative.bytes;
            }
            processed.push(ad);
        }

        let with_creative = processed
            .iter()
            .filter(|ad| ad.creative_found == Some(true))
            .count();
        info!(
            domain = %query.domain,
            ads = processed.len(),
            with_creative,
            "Ad search complete"
        );

        Ok(processed)
    }
}
