use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Lifecycle state of an actor run as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum RunStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
    TimingOut,
    TimedOut,
    Aborting,
    Aborted,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut | Self::Aborted)
    }
}

/// Actor run metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunData {
    pub id: String,
    pub status: RunStatus,
    pub default_dataset_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunData {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// A start URL entry for the ads library scraper input.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryUrl {
    pub url: String,
    pub method: String,
}

impl LibraryUrl {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
        }
    }
}

/// Input for the curious_coder/facebook-ads-library-scraper actor.
///
/// The actor takes ads library URLs (search pages or single-ad detail pages)
/// and returns one loosely structured JSON item per ad.
#[derive(Debug, Clone, Serialize)]
pub struct AdsLibraryInput {
    pub urls: Vec<LibraryUrl>,
    pub count: u32,
    #[serde(rename = "scrapeAdDetails")]
    pub scrape_ad_details: bool,
    #[serde(rename = "scrapePageAds.activeStatus")]
    pub active_status: String,
    pub period: String,
}

impl AdsLibraryInput {
    pub fn new(library_url: impl Into<String>, count: u32, active_status: impl Into<String>) -> Self {
        Self {
            urls: vec![LibraryUrl::get(library_url)],
            count,
            scrape_ad_details: true,
            active_status: active_status.into(),
            period: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ads_library_input_uses_actor_field_names() {
        let input = AdsLibraryInput::new("https://www.facebook.com/ads/library/?id=42", 1, "all");
        let value = serde_json::to_value(&input).unwrap();

        assert_eq!(value["urls"][0]["url"], "https://www.facebook.com/ads/library/?id=42");
        assert_eq!(value["urls"][0]["method"], "GET");
        assert_eq!(value["count"], 1);
        assert_eq!(value["scrapeAdDetails"], true);
        assert_eq!(value["scrapePageAds.activeStatus"], "all");
        assert_eq!(value["period"], "");
    }

    #[test]
    fn run_data_tolerates_missing_dataset() {
        let run: RunData = serde_json::from_value(serde_json::json!({
            "id": "run1",
            "status": "RUNNING",
        }))
        .unwrap();

        assert!(run.default_dataset_id.is_none());
        assert!(!run.is_terminal());
    }

    #[test]
    fn unrecognized_status_is_not_terminal() {
        let run: RunData = serde_json::from_value(serde_json::json!({
            "id": "run1",
            "status": "MIGRATING",
        }))
        .unwrap();

        assert_eq!(run.status, RunStatus::Unknown);
        assert!(!run.is_terminal());
    }

    #[test]
    fn timed_out_is_terminal() {
        let run: RunData = serde_json::from_value(serde_json::json!({
            "id": "run1",
            "status": "TIMED-OUT",
            "defaultDatasetId": "ds1",
            "startedAt": "2025-01-01T00:00:00Z",
        }))
        .unwrap();

        assert!(run.is_terminal());
        assert_eq!(run.status, RunStatus::TimedOut);
        assert_eq!(run.default_dataset_id.as_deref(), Some("ds1"));
        assert!(run.started_at.is_some());
    }
}
