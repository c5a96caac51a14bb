// Fetch-and-validate probing.
//
// The classifier and ranker are heuristics. The only ground truth is the
// downloaded artifact, so the download doubles as the confidence check:
// small bodies are logos or profile pictures, not creatives.

use std::sync::Arc;
use std::time::Duration;

use adlens_common::CreativeConfig;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, info, warn};

use crate::candidate::{CreativeCandidate, ValidatedCreative};

/// Extensions accepted when the server sends an unhelpful content-type.
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp", ".gif", ".svg", ".bmp"];

/// Content-type prefixes accepted as image payloads. CDNs sometimes serve
/// creatives as octet-stream.
const IMAGE_CONTENT_TYPES: &[&str] = &["image/", "application/octet-stream"];

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// The ads library viewer. CDN requests without it as referer get refused.
const ADS_LIBRARY_REFERER: &str = "https://www.facebook.com/ads/library/";

/// A downloaded body and the content-type it was served with.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub content_type: String,
    pub bytes: Bytes,
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// One GET attempt. Transport errors and non-2xx statuses are `Err`.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedImage>;
}

/// Fetches images over HTTP with a browser-like header set.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(browser_headers())
            .build()?;
        Ok(Self { client })
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(header::REFERER, HeaderValue::from_static(ADS_LIBRARY_REFERER));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("image"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("no-cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("cross-site"));
    headers
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedImage> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();
        let bytes = resp.bytes().await?;

        Ok(FetchedImage { content_type, bytes })
    }
}

/// Why a successful download was not accepted as the creative.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("unexpected content-type {content_type:?} ({size} bytes)")]
    NotAnImage { content_type: String, size: usize },

    #[error("content too small for a creative: {size} bytes")]
    TooSmall { size: usize },
}

/// Check a download against the creative criteria: image content-type or
/// image extension, and at least `min_bytes` long.
pub fn validate(url: &str, image: &FetchedImage, min_bytes: usize) -> Result<(), Rejection> {
    let size = image.bytes.len();
    let content_type = image.content_type.to_lowercase();
    let url_lower = url.to_lowercase();

    let image_type = IMAGE_CONTENT_TYPES.iter().any(|t| content_type.starts_with(t));
    let image_ext = IMAGE_EXTENSIONS.iter().any(|e| url_lower.ends_with(e));
    if !(image_type || image_ext) {
        return Err(Rejection::NotAnImage { content_type, size });
    }

    if size < min_bytes {
        return Err(Rejection::TooSmall { size });
    }

    Ok(())
}

/// Walks a ranked candidate queue and returns the first candidate whose
/// download validates.
#[derive(Clone)]
pub struct Prober {
    fetcher: Arc<dyn ImageFetcher>,
    config: CreativeConfig,
}

impl Prober {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, config: CreativeConfig) -> Self {
        Self { fetcher, config }
    }

    pub async fn probe(&self, candidates: &[CreativeCandidate], ad_id: &str) -> ValidatedCreative {
        let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();
        self.probe_queue(&urls, ad_id).await
    }

    /// Probe plain URLs, e.g. the ranked list returned by a fallback lookup.
    pub async fn probe_urls(&self, urls: &[String], ad_id: &str) -> ValidatedCreative {
        let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
        self.probe_queue(&urls, ad_id).await
    }

    async fn probe_queue(&self, urls: &[&str], ad_id: &str) -> ValidatedCreative {
        if urls.is_empty() {
            debug!(ad_id, "no creative candidates to probe");
            return ValidatedCreative::not_found();
        }

        for (i, url) in urls.iter().map(|u| u.trim()).enumerate() {
            if let Some(bytes) = self.try_candidate(url, ad_id).await {
                info!(ad_id, url, attempt = i + 1, bytes = bytes.len(), "Found creative");
                return ValidatedCreative::found(url, bytes);
            }
            debug!(ad_id, url, attempt = i + 1, "Creative candidate rejected");
        }

        warn!(ad_id, candidates = urls.len(), "All creative candidates failed");
        ValidatedCreative::not_found()
    }

    /// Download one candidate, retrying transport failures. A download that
    /// fails validation is final for this candidate.
    async fn try_candidate(&self, url: &str, ad_id: &str) -> Option<Bytes> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            debug!(ad_id, url, "skipping non-http candidate");
            return None;
        }

        let attempts = self.config.probe_attempts.max(1);
        for attempt in 1..=attempts {
            match self.fetcher.fetch(url, self.config.probe_timeout).await {
                Ok(image) => {
                    return match validate(url, &image, self.config.min_creative_bytes) {
                        Ok(()) => Some(image.bytes),
                        Err(rejection) => {
                            debug!(ad_id, url, reason = %rejection, "download is not a creative");
                            None
                        }
                    };
                }
                Err(e) => {
                    debug!(ad_id, url, attempt, error = %e, "image fetch failed");
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_pause).await;
                    }
                }
            }
        }

        None
    }
}
