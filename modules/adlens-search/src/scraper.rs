use std::sync::Arc;

use adlens_common::AppConfig;
use adlens_creative::AdLookup;
use anyhow::Result;
use apify_client::{AdsLibraryInput, ApifyClient};
use async_trait::async_trait;
use serde_json::Value;

use crate::query::{ad_detail_url, ActiveStatus, AdSearchQuery};

/// Source of raw ads library items.
#[async_trait]
pub trait AdScraper: Send + Sync {
    /// Items for a keyword search.
    async fn run_search(&self, query: &AdSearchQuery) -> Result<Vec<Value>>;

    /// Items scraped from one ad's detail page.
    async fn run_single_lookup(&self, ad_id: &str) -> Result<Vec<Value>>;
}

pub struct ApifyAdScraper {
    client: ApifyClient,
    actor_id: String,
}

impl ApifyAdScraper {
    pub fn new(client: ApifyClient, actor_id: impl Into<String>) -> Self {
        Self {
            client,
            actor_id: actor_id.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ApifyClient::new(config.apify_api_token.clone()),
            config.ads_actor_id.clone(),
        )
    }
}

#[async_trait]
impl AdScraper for ApifyAdScraper {
    async fn run_search(&self, query: &AdSearchQuery) -> Result<Vec<Value>> {
        let url = query.library_url();
        tracing::info!(domain = %query.domain, %url, "Searching ads library");

        let input = AdsLibraryInput::new(url, query.count, query.active_status.as_str());
        Ok(self.client.scrape_ads_library(&self.actor_id, &input).await?)
    }

    async fn run_single_lookup(&self, ad_id: &str) -> Result<Vec<Value>> {
        let url = ad_detail_url(ad_id);
        tracing::info!(ad_id, %url, "Scraping ad detail page");

        let input = AdsLibraryInput::new(url, 1, ActiveStatus::All.as_str());
        Ok(self.client.scrape_ads_library(&self.actor_id, &input).await?)
    }
}

/// Exposes any scraper's single-ad lookup to the creative fallback.
pub struct ScraperLookup(pub Arc<dyn AdScraper>);

#[async_trait]
impl AdLookup for ScraperLookup {
    async fn lookup_ad(&self, ad_id: &str) -> Result<Vec<Value>> {
        self.0.run_single_lookup(ad_id).await
    }
}
