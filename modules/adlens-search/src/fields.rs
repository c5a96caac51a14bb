// Flattens a raw ads library item into the fields we report per ad.
//
// Scraper items are loosely structured: keys move between the item and its
// snapshot, arrive in snake_case or camelCase, and ids are sometimes numbers.
// Every lookup here is total; a missing or oddly typed field is just `None`.

use adlens_creative::{ad_id_of, snapshot_of};
use serde::Serialize;
use serde_json::{Map, Value};

const IMAGE_ENTRY_KEYS: &[&str] = &[
    "original_image_url",
    "original_picture_url",
    "original_picture",
    "resized_image_url",
    "resized_picture_url",
    "url",
    "src",
    "uri",
    "secure_url",
];

const SNAPSHOT_IMAGE_KEYS: &[&str] = &[
    "image_url",
    "picture_url",
    "picture",
    "thumbnail_url",
    "thumbnail",
    "photo_url",
    "media_url",
    "creative_url",
];

const ITEM_IMAGE_KEYS: &[&str] = &[
    "original_image_url",
    "image_url",
    "imageUrl",
    "picture",
    "thumbnailUrl",
    "creative_url",
];

const LAST_RESORT_IMAGE_KEYS: &[&str] = &["imageUrl", "image_url", "thumbnailUrl", "thumbnail_url", "image"];

const VIDEO_ENTRY_KEYS: &[&str] = &["video_hd_url", "video_sd_url", "video_preview_url", "url", "src"];

const VIDEO_KEYS: &[&str] = &["videoUrl", "video_url", "video", "video_hd_url", "video_sd_url"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdSummary {
    pub ad_archive_id: Option<String>,
    pub categories: Option<String>,
    pub collation_count: Option<u64>,
    pub collation_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub entity_type: Option<String>,
    pub is_active: Option<bool>,
    pub page_id: Option<String>,
    pub page_name: Option<String>,
    pub cta_text: Option<String>,
    pub cta_type: Option<String>,
    pub link_url: Option<String>,
    pub display_url: Option<String>,
    pub website_url: Option<String>,
    pub page_entity_type: Option<String>,
    pub page_profile_picture_url: Option<String>,
    pub page_profile_uri: Option<String>,
    pub state_media_run_label: Option<String>,
    pub total_active_time: Option<String>,
    pub original_image_url: Option<String>,
    pub video_url: Option<String>,
}

pub fn extract_fields(item: &Value) -> AdSummary {
    let empty = Map::new();
    let item_obj = item.as_object().unwrap_or(&empty);
    let snapshot = snapshot_of(item);
    let first_card = first_object(snapshot.get("cards"));

    AdSummary {
        ad_archive_id: ad_id_of(item),
        categories: categories(item_obj.get("categories")),
        collation_count: item_obj.get("collation_count").and_then(as_count),
        collation_id: first_text(item_obj, &["collation_id"]),
        start_date: first_text(item_obj, &["start_date", "startDate"]),
        end_date: first_text(item_obj, &["end_date", "endDate"]),
        entity_type: first_text(item_obj, &["entity_type"]),
        is_active: item_obj.get("is_active").and_then(Value::as_bool),
        page_id: first_text(item_obj, &["page_id", "pageId"]),
        page_name: first_text(item_obj, &["page_name", "pageName"]),
        cta_text: first_card
            .and_then(|card| first_text(card, &["cta_text"]))
            .or_else(|| first_text(&snapshot, &["cta_text"])),
        cta_type: first_card
            .and_then(|card| first_text(card, &["cta_type"]))
            .or_else(|| first_text(&snapshot, &["cta_type"])),
        link_url: first_text(&snapshot, &["link_url"])
            .or_else(|| first_card.and_then(|card| first_text(card, &["link_url"]))),
        display_url: first_text(&snapshot, &["caption"]),
        website_url: first_text(&snapshot, &["link_url", "website", "url"]),
        page_entity_type: first_object(snapshot.get("page_categories"))
            .and_then(|category| first_text(category, &["page_entity_type", "entity_type"]))
            .or_else(|| first_text(item_obj, &["page_entity_type"])),
        page_profile_picture_url: first_text(&snapshot, &["page_profile_picture_url"])
            .or_else(|| first_text(item_obj, &["page_profile_picture_url"])),
        page_profile_uri: first_text(&snapshot, &["page_profile_uri"])
            .or_else(|| first_text(item_obj, &["page_profile_uri"])),
        state_media_run_label: first_text(item_obj, &["state_media_run_label"]),
        total_active_time: first_text(item_obj, &["total_active_time"]),
        original_image_url: original_image_url(item_obj, &snapshot),
        video_url: video_url(item_obj, &snapshot),
    }
}

fn original_image_url(item: &Map<String, Value>, snapshot: &Map<String, Value>) -> Option<String> {
    entries(snapshot.get("images"))
        .find_map(|image| first_text(image, IMAGE_ENTRY_KEYS))
        .or_else(|| first_text(snapshot, SNAPSHOT_IMAGE_KEYS))
        .or_else(|| first_text(item, ITEM_IMAGE_KEYS))
        .or_else(|| first_text(item, LAST_RESORT_IMAGE_KEYS))
}

fn video_url(item: &Map<String, Value>, snapshot: &Map<String, Value>) -> Option<String> {
    entries(snapshot.get("videos"))
        .find_map(|video| first_text(video, VIDEO_ENTRY_KEYS))
        .or_else(|| first_text(item, VIDEO_KEYS))
        .or_else(|| first_text(snapshot, VIDEO_KEYS))
}

/// Object entries of a field that may hold one object or a list of them.
fn entries(value: Option<&Value>) -> Box<dyn Iterator<Item = &Map<String, Value>> + '_> {
    match value {
        Some(Value::Object(obj)) => Box::new(std::iter::once(obj)),
        Some(Value::Array(items)) => Box::new(items.iter().filter_map(Value::as_object)),
        _ => Box::new(std::iter::empty()),
    }
}

fn first_object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    entries(value).next()
}

/// First key holding a non-blank string or a number, rendered as text.
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| obj.get(*key).and_then(text_of))
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn categories(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Array(items) => {
            let joined = items.iter().filter_map(text_of).collect::<Vec<_>>().join(", ");
            (!joined.is_empty()).then_some(joined)
        }
        other => text_of(other),
    }
}
