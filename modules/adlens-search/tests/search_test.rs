//! Search runs end to end against a mocked scraper and image fetcher.

use std::sync::Arc;
use std::time::Duration;

use adlens_common::CreativeConfig;
use adlens_creative::testing::{fake_image, MockImageFetcher};
use adlens_creative::{CreativeResolver, DetailPageFallback};
use adlens_search::testing::{MockAnalyzer, MockGenerator, MockScraper};
use adlens_search::{
    AdSearchQuery, AdSearchRunner, DateRange, ReferenceImage, ScraperLookup, VariantStudio,
};
use bytes::Bytes;
use serde_json::{json, Value};

const CREATIVE: &str = "https://scontent.xx.fbcdn.net/v/t39.35426-6/creative_n.jpg";
const DETAIL: &str = "https://scontent.xx.fbcdn.net/v/t39.35426-6/detail_n.jpg";

fn config() -> CreativeConfig {
    CreativeConfig {
        retry_pause: Duration::ZERO,
        probe_attempts: 1,
        fallback_enabled: true,
        ..CreativeConfig::default()
    }
}

fn ad(id: &str, start: &str, snapshot: Value) -> Value {
    json!({ "ad_archive_id": id, "start_date": start, "page_name": "Career Seeking", "snapshot": snapshot })
}

fn with_creative(url: &str) -> Value {
    json!({ "cards": [{ "original_image_url": url }] })
}

#[tokio::test]
async fn search_filters_by_date_and_resolves_creatives() {
    let scraper = Arc::new(MockScraper::new().on_search(
        "careerseeking.co",
        vec![
            ad("1", "2024-05-10", with_creative(CREATIVE)),
            ad("2", "2023-01-01", with_creative(CREATIVE)),
            ad("3", "", json!({})),
            json!({ "page_name": "no id" }),
        ],
    ));
    let fetcher = Arc::new(MockImageFetcher::new().on_image(CREATIVE, fake_image("image/jpeg", 60_000)));
    let runner = AdSearchRunner::new(scraper.clone(), CreativeResolver::new(fetcher, config()));

    let query = AdSearchQuery::new("careerseeking.co")
        .date_range(Some(DateRange::parse("2024-05-01", "2024-05-31").unwrap()));
    let ads = runner.run(&query).await.unwrap();

    let ids: Vec<Option<&str>> = ads.iter().map(|a| a.summary.ad_archive_id.as_deref()).collect();
    assert_eq!(ids, vec![Some("1"), Some("3"), None]);

    assert_eq!(ads[0].creative_found, Some(true));
    assert_eq!(ads[0].creative_url.as_deref(), Some(CREATIVE));
    assert_eq!(ads[0].creative_bytes.as_ref().map(Bytes::len), Some(60_000));

    assert_eq!(ads[1].creative_found, Some(false));
    assert!(ads[1].creative_urls.is_empty());
    assert_eq!(ads[2].creative_found, None);

    assert_eq!(scraper.search_calls().len(), 1);
    assert!(scraper.search_calls()[0].contains("start_date[min]=2024-05-01"));
}

#[tokio::test]
async fn processed_ads_serialize_flat_without_bytes() {
    let scraper = Arc::new(MockScraper::new().on_search("x.co", vec![ad("9", "2024-01-01", with_creative(CREATIVE))]));
    let fetcher = Arc::new(MockImageFetcher::new().on_image(CREATIVE, fake_image("image/jpeg", 9_000)));
    let runner = AdSearchRunner::new(scraper, CreativeResolver::new(fetcher, config()));

    let ads = runner.run(&AdSearchQuery::new("x.co")).await.unwrap();
    let value = serde_json::to_value(&ads[0]).unwrap();

    assert_eq!(value["ad_archive_id"], "9");
    assert_eq!(value["page_name"], "Career Seeking");
    assert_eq!(value["creative_found"], true);
    assert_eq!(value["creative_urls"], json!([CREATIVE]));
    assert!(value.get("creative_bytes").is_none());
    assert!(value.get("summary").is_none());
}

#[tokio::test]
async fn scraper_failure_fails_the_run() {
    let runner = AdSearchRunner::new(
        Arc::new(MockScraper::new()),
        CreativeResolver::new(Arc::new(MockImageFetcher::new()), config()),
    );

    let err = runner.run(&AdSearchQuery::new("unknown.com")).await.unwrap_err();
    assert!(err.to_string().contains("Scraping error"));
}

#[tokio::test]
async fn fallback_goes_through_the_scraper_lookup() {
    let scraper = Arc::new(
        MockScraper::new()
            .on_search("careerseeking.co", vec![ad("5", "", json!({}))])
            .on_lookup(
                "5",
                vec![json!({ "ad_archive_id": "5", "snapshot": { "images": [{ "original_image_url": DETAIL }] } })],
            ),
    );
    let lookup = Arc::new(ScraperLookup(scraper.clone()));
    let resolver = CreativeResolver::new(Arc::new(MockImageFetcher::new()), config())
        .with_fallback(Arc::new(DetailPageFallback::new(lookup, &config())));
    let runner = AdSearchRunner::new(scraper.clone(), resolver);

    let ads = runner.run(&AdSearchQuery::new("careerseeking.co")).await.unwrap();

    assert_eq!(ads[0].creative_found, Some(false));
    assert_eq!(ads[0].creative_urls, vec![DETAIL.to_string()]);
    assert_eq!(ads[0].creative_url.as_deref(), Some(DETAIL));
    assert_eq!(scraper.lookup_calls(), vec!["5"]);
}

fn reference() -> Vec<ReferenceImage> {
    vec![ReferenceImage {
        name: "creative_1.jpg".into(),
        content_type: "image/jpeg".into(),
        bytes: Bytes::from_static(b"jpeg"),
    }]
}

const ANALYSIS: &str = "1. Create a job fair photo with the text \"Now Hiring\"\n\n2. Create an office scene with the text \"FAIL here\"\n";

#[tokio::test]
async fn studio_skips_failed_renders() {
    let generator = Arc::new(MockGenerator::new().failing_on("FAIL"));
    let studio = VariantStudio::new(Arc::new(MockAnalyzer::replying(ANALYSIS)), generator.clone());

    let variants = studio.generate(&reference(), 2).await.unwrap();

    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].index, 0);
    assert_eq!(variants[0].prompt, "Create a job fair photo with the text \"Now Hiring\"");
    assert_eq!(generator.prompts().len(), 2);
}

#[tokio::test]
async fn studio_errors_without_prompts_or_references() {
    let studio = VariantStudio::new(
        Arc::new(MockAnalyzer::replying("Sorry, no ideas.")),
        Arc::new(MockGenerator::new()),
    );
    assert!(studio.generate(&reference(), 2).await.is_err());
    assert!(studio.generate(&[], 2).await.is_err());

    let failing = VariantStudio::new(
        Arc::new(MockAnalyzer::failing("quota exceeded")),
        Arc::new(MockGenerator::new()),
    );
    let err = failing.generate(&reference(), 2).await.unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));
}

#[tokio::test]
async fn studio_prefers_structured_variants() {
    let analysis = "```json\n{\"instructions\": {\"palette\": \"warm\", \"variants\": [{\"headline\": \"One\"}, {\"headline\": \"Two\"}]}}\n```\nCreate a fallback poster with the text \"Unused\"";
    let generator = Arc::new(MockGenerator::new());
    let studio = VariantStudio::new(Arc::new(MockAnalyzer::replying(analysis)), generator.clone());

    let variants = studio.generate(&reference(), 2).await.unwrap();

    assert_eq!(variants.len(), 2);
    let second: Value = serde_json::from_str(&variants[1].prompt).unwrap();
    assert_eq!(second["instructions"]["variants"], json!([{ "headline": "Two" }]));
    assert_eq!(second["instructions"]["palette"], "warm");
    assert!(generator.prompts().iter().all(|p| !p.contains("Unused")));
}
