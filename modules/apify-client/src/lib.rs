//! Minimal Apify REST client: start an actor run, long-poll it to
//! completion and read back its default dataset.

pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{AdsLibraryInput, LibraryUrl, RunData, RunStatus};

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use types::ApiResponse;

const BASE_URL: &str = "https://api.apify.com/v2";

/// Seconds the API holds a run-status request open before answering.
const WAIT_FOR_FINISH_SECS: u32 = 60;

/// Actor ID for curious_coder/facebook-ads-library-scraper.
pub const ADS_LIBRARY_SCRAPER: &str = "curious_coder~facebook-ads-library-scraper";

pub struct ApifyClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send an authenticated request and decode the body. Non-2xx responses
    /// become `ApifyError::Api` carrying the response text.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = request.bearer_auth(&self.token).send().await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }

    /// Start an actor run. Returns as soon as the run is queued.
    pub async fn start_run<I: Serialize + ?Sized>(&self, actor_id: &str, input: &I) -> Result<RunData> {
        let request = self.http.post(self.endpoint(&format!("acts/{actor_id}/runs"))).json(input);
        let resp: ApiResponse<RunData> = self.send(request).await?;
        Ok(resp.data)
    }

    /// Long-poll a run until it reaches a terminal state. Only a succeeded
    /// run is returned as `Ok`.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData> {
        let url = self.endpoint(&format!("actor-runs/{run_id}"));
        loop {
            let request = self
                .http
                .get(&url)
                .query(&[("waitForFinish", WAIT_FOR_FINISH_SECS)]);
            let run = self.send::<ApiResponse<RunData>>(request).await?.data;

            if !run.is_terminal() {
                tracing::debug!(run_id, status = ?run.status, "Run still in progress");
                continue;
            }
            if run.status != RunStatus::Succeeded {
                return Err(ApifyError::RunFailed {
                    run_id: run.id,
                    status: run.status,
                });
            }
            return Ok(run);
        }
    }

    pub async fn get_dataset_items<T: DeserializeOwned>(&self, dataset_id: &str) -> Result<Vec<T>> {
        let request = self
            .http
            .get(self.endpoint(&format!("datasets/{dataset_id}/items")))
            .query(&[("format", "json")]);
        self.send(request).await
    }

    /// Start a run, wait for it and return its default dataset.
    pub async fn run_actor<I, T>(&self, actor_id: &str, input: &I) -> Result<Vec<T>>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let run = self.start_run(actor_id, input).await?;
        tracing::info!(actor_id, run_id = %run.id, "Apify run started");

        let run = self.wait_for_run(&run.id).await?;
        let dataset_id = run
            .default_dataset_id
            .as_deref()
            .ok_or_else(|| ApifyError::MissingDataset(run.id.clone()))?;
        tracing::info!(run_id = %run.id, dataset_id, "Run succeeded, reading dataset");

        self.get_dataset_items(dataset_id).await
    }

    /// Scrape ads library pages. Items are returned untyped; their shape
    /// varies between search results and single-ad detail pages.
    pub async fn scrape_ads_library(&self, actor_id: &str, input: &AdsLibraryInput) -> Result<Vec<Value>> {
        tracing::info!(
            actor_id,
            count = input.count,
            active_status = %input.active_status,
            "Starting ads library scrape"
        );

        let items: Vec<Value> = self.run_actor(actor_id, input).await?;
        tracing::info!(count = items.len(), "Fetched ads library items");
        Ok(items)
    }
}
