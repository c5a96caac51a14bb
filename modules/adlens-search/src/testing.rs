// Test mocks for the search side.
//
// - MockScraper (AdScraper): canned search results and detail lookups
// - MockAnalyzer (PromptAnalyzer): fixed analysis text
// - MockGenerator (ImageGenerator): fails on prompts containing a marker

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::query::AdSearchQuery;
use crate::scraper::AdScraper;
use crate::variants::{ImageGenerator, PromptAnalyzer, ReferenceImage};

// ---------------------------------------------------------------------------
// MockScraper
// ---------------------------------------------------------------------------

/// Search results keyed by domain, lookups keyed by ad id. Unregistered
/// keys fail, so a test that expects no network call notices one.
pub struct MockScraper {
    searches: HashMap<String, Vec<Value>>,
    lookups: HashMap<String, Vec<Value>>,
    search_calls: Mutex<Vec<String>>,
    lookup_calls: Mutex<Vec<String>>,
}

impl MockScraper {
    pub fn new() -> Self {
        Self {
            searches: HashMap::new(),
            lookups: HashMap::new(),
            search_calls: Mutex::new(Vec::new()),
            lookup_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_search(mut self, domain: &str, items: Vec<Value>) -> Self {
        self.searches.insert(domain.to_string(), items);
        self
    }

    pub fn on_lookup(mut self, ad_id: &str, items: Vec<Value>) -> Self {
        self.lookups.insert(ad_id.to_string(), items);
        self
    }

    /// Library URLs searched, in order.
    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn lookup_calls(&self) -> Vec<String> {
        self.lookup_calls.lock().unwrap().clone()
    }
}

impl Default for MockScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdScraper for MockScraper {
    async fn run_search(&self, query: &AdSearchQuery) -> Result<Vec<Value>> {
        self.search_calls.lock().unwrap().push(query.library_url());
        self.searches
            .get(&query.domain)
            .cloned()
            .ok_or_else(|| anyhow!("MockScraper: no search registered for {}", query.domain))
    }

    async fn run_single_lookup(&self, ad_id: &str) -> Result<Vec<Value>> {
        self.lookup_calls.lock().unwrap().push(ad_id.to_string());
        self.lookups
            .get(ad_id)
            .cloned()
            .ok_or_else(|| anyhow!("MockScraper: no lookup registered for {ad_id}"))
    }
}

// ---------------------------------------------------------------------------
// MockAnalyzer / MockGenerator
// ---------------------------------------------------------------------------

pub struct MockAnalyzer {
    response: Result<String, String>,
}

impl MockAnalyzer {
    pub fn replying(text: &str) -> Self {
        Self { response: Ok(text.to_string()) }
    }

    pub fn failing(message: &str) -> Self {
        Self { response: Err(message.to_string()) }
    }
}

#[async_trait]
impl PromptAnalyzer for MockAnalyzer {
    async fn analyze(&self, _images: &[ReferenceImage], _desired_count: usize) -> Result<String> {
        self.response.clone().map_err(|e| anyhow!(e))
    }
}

/// Renders every prompt to its own bytes, except prompts containing
/// `fail_on`, which error.
pub struct MockGenerator {
    fail_on: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            fail_on: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerator for MockGenerator {
    async fn generate(&self, prompt: &str, _reference_images: &[ReferenceImage]) -> Result<Vec<u8>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.fail_on {
            Some(marker) if prompt.contains(marker.as_str()) => {
                Err(anyhow!("MockGenerator: refused prompt containing {marker}"))
            }
            _ => Ok(prompt.as_bytes().to_vec()),
        }
    }
}
