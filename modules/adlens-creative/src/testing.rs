// Test mocks for the creative pipeline.
//
// - MockImageFetcher (ImageFetcher): per-URL scripted responses
// - MockAdLookup (AdLookup): ad id -> detail-page items
//
// Both record their calls so tests can assert on what was fetched.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::fallback::AdLookup;
use crate::probe::{FetchedImage, ImageFetcher};

/// A body of `len` bytes served with `content_type`.
pub fn fake_image(content_type: &str, len: usize) -> FetchedImage {
    FetchedImage {
        content_type: content_type.to_string(),
        bytes: Bytes::from(vec![0xAB; len]),
    }
}

#[derive(Clone)]
enum Scripted {
    Image(FetchedImage),
    Error,
}

// ---------------------------------------------------------------------------
// MockImageFetcher
// ---------------------------------------------------------------------------

/// Responses are queued per URL and consumed in order; the last one repeats.
/// Unregistered URLs fail.
pub struct MockImageFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
}

impl MockImageFetcher {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_image(self, url: &str, image: FetchedImage) -> Self {
        self.push(url, Scripted::Image(image))
    }

    pub fn on_error(self, url: &str) -> Self {
        self.push(url, Scripted::Error)
    }

    fn push(self, url: &str, response: Scripted) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Every URL fetched, in order, one entry per attempt.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for MockImageFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchedImage> {
        self.calls.lock().unwrap().push(url.to_string());

        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts
            .get_mut(url)
            .ok_or_else(|| anyhow!("MockImageFetcher: nothing registered for {url}"))?;
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match next {
            Some(Scripted::Image(image)) => Ok(image),
            Some(Scripted::Error) | None => Err(anyhow!("MockImageFetcher: scripted failure for {url}")),
        }
    }
}

// ---------------------------------------------------------------------------
// MockAdLookup
// ---------------------------------------------------------------------------

/// HashMap-based detail-page lookup. Returns `Err` for unregistered ids.
pub struct MockAdLookup {
    items: HashMap<String, Vec<Value>>,
    calls: Mutex<Vec<String>>,
}

impl MockAdLookup {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_lookup(mut self, ad_id: &str, items: Vec<Value>) -> Self {
        self.items.insert(ad_id.to_string(), items);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockAdLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdLookup for MockAdLookup {
    async fn lookup_ad(&self, ad_id: &str) -> Result<Vec<Value>> {
        self.calls.lock().unwrap().push(ad_id.to_string());
        self.items
            .get(ad_id)
            .cloned()
            .ok_or_else(|| anyhow!("MockAdLookup: no items registered for {ad_id}"))
    }
}
