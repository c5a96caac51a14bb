// Tree search over ad records.
//
// Three passes whose hits are concatenated in order:
//   1. known shapes: creatives[].thumbnail and object_story_spec image urls
//   2. direct fields: creative-typed keys on each creative object
//   3. deep search: every string leaf in the record, snapshot included
//
// Records are untyped JSON from the scraper. Every pass is total: a missing
// or malformed branch yields no hits, never an error.

use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::debug;

use crate::candidate::{CandidateKind, CreativeCandidate};
use crate::classify::is_creative_url;

/// Keys that hold a creative URL directly or as `{ "url": ... }`.
pub const DIRECT_FIELD_KEYS: &[&str] = &[
    "image_url",
    "image",
    "picture",
    "thumbnail",
    "creative_url",
    "media_url",
    "asset_url",
    "file_url",
    "source_url",
];

/// Domain markers for the direct-field pass. Looser than the classifier
/// because the key already says the value is creative media.
const DIRECT_FIELD_DOMAINS: &[&str] = &["fbcdn.net", "facebook.com"];

/// Recursion bound for the deep search.
pub const MAX_DEPTH: usize = 64;

/// The record's `snapshot` as an object.
///
/// The scraper sometimes ships the snapshot as a JSON-encoded string.
/// Absent, null, unparseable or non-object snapshots all become `{}`.
pub fn snapshot_of(record: &Value) -> Cow<'_, Map<String, Value>> {
    match record.get("snapshot") {
        Some(Value::Object(map)) => Cow::Borrowed(map),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Cow::Owned(map),
            Ok(_) => Cow::Owned(Map::new()),
            Err(e) => {
                debug!(error = %e, "snapshot string is not valid JSON, treating as empty");
                Cow::Owned(Map::new())
            }
        },
        _ => Cow::Owned(Map::new()),
    }
}

/// The record's ad archive id. The scraper emits it as a string or a
/// number, under `ad_archive_id` or `adId`.
pub fn ad_id_of(record: &Value) -> Option<String> {
    ["ad_archive_id", "adId"]
        .iter()
        .find_map(|key| match record.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Run all three search passes over one ad record.
pub fn extract_candidates(record: &Value, ad_id: &str) -> Vec<CreativeCandidate> {
    let snapshot = snapshot_of(record);

    let mut candidates = Vec::new();

    for (path, creative) in creative_objects(&snapshot) {
        known_shape_candidates(creative, &path, &mut candidates);
    }
    let known = candidates.len();

    // The `creative` object only gets the classifier-gated known shapes.
    for (path, creative) in creatives_entries(&snapshot) {
        candidates.extend(direct_field_candidates(creative, &path));
    }
    let direct = candidates.len() - known;

    let deep = deep_search_record(record, &snapshot);
    let deep_count = deep.len();
    candidates.extend(deep);

    debug!(
        ad_id,
        known_shape = known,
        direct_field = direct,
        deep_search = deep_count,
        "searched ad record for creative urls"
    );

    candidates
}

/// Every object in the snapshot's `creatives` (list or single object).
fn creatives_entries(snapshot: &Map<String, Value>) -> Vec<(String, &Map<String, Value>)> {
    let mut found = Vec::new();

    match snapshot.get("creatives") {
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                if let Value::Object(obj) = item {
                    found.push((format!("snapshot.creatives[{i}]"), obj));
                }
            }
        }
        Some(Value::Object(obj)) => found.push(("snapshot.creatives".to_string(), obj)),
        _ => {}
    }

    found
}

/// Creative objects in a snapshot with their paths: the `creatives` entries
/// and the `creative` object.
pub(crate) fn creative_objects(snapshot: &Map<String, Value>) -> Vec<(String, &Map<String, Value>)> {
    let mut found = creatives_entries(snapshot);

    if let Some(Value::Object(obj)) = snapshot.get("creative") {
        found.push(("snapshot.creative".to_string(), obj));
    }

    found
}

/// Known-shape pass for one creative object. Hits must pass the classifier.
pub(crate) fn known_shape_candidates(
    creative: &Map<String, Value>,
    path: &str,
    out: &mut Vec<CreativeCandidate>,
) {
    if let Some(Value::String(thumb)) = creative.get("thumbnail") {
        if is_creative_url(thumb) {
            out.push(CreativeCandidate::new(
                thumb.as_str(),
                format!("{path}.thumbnail"),
                CandidateKind::CreativeThumbnail,
            ));
        }
    }

    for (branch, kind) in [
        ("link_data", CandidateKind::LinkDataImage),
        ("video_data", CandidateKind::VideoDataImage),
    ] {
        let Some(url) = string_at(creative, &["object_story_spec", branch, "image", "url"]) else {
            continue;
        };
        if is_creative_url(url) {
            out.push(CreativeCandidate::new(
                url,
                format!("{path}.object_story_spec.{branch}.image.url"),
                kind,
            ));
        }
    }
}

/// Direct-field pass over one object's creative-typed keys.
pub fn direct_field_candidates(obj: &Map<String, Value>, path: &str) -> Vec<CreativeCandidate> {
    let mut found = Vec::new();

    for key in DIRECT_FIELD_KEYS {
        match obj.get(*key) {
            Some(Value::String(url)) if on_ads_domain(url) => {
                found.push(CreativeCandidate::new(
                    url.as_str(),
                    format!("{path}.{key}"),
                    CandidateKind::DirectField,
                ));
            }
            Some(Value::Object(nested)) => {
                if let Some(Value::String(url)) = nested.get("url") {
                    if on_ads_domain(url) {
                        found.push(CreativeCandidate::new(
                            url.as_str(),
                            format!("{path}.{key}.url"),
                            CandidateKind::NestedObject,
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    found
}

/// Deep search over an arbitrary value. Every string leaf that passes the
/// classifier becomes a `deep_search` candidate tagged with its path.
pub fn deep_search(value: &Value, path: &str) -> Vec<CreativeCandidate> {
    let mut found = Vec::new();
    walk(value, path, 0, &mut found);
    found
}

/// Deep search over a whole record, with the parsed snapshot standing in
/// for the raw `snapshot` field so string and object snapshots agree.
pub(crate) fn deep_search_record(
    record: &Value,
    snapshot: &Map<String, Value>,
) -> Vec<CreativeCandidate> {
    let Value::Object(fields) = record else {
        return deep_search(record, "");
    };

    let mut found = Vec::new();
    for (key, value) in fields {
        if key == "snapshot" {
            walk_object(snapshot, key, 1, &mut found);
        } else {
            walk(value, key, 1, &mut found);
        }
    }
    found
}

fn walk(value: &Value, path: &str, depth: usize, out: &mut Vec<CreativeCandidate>) {
    if depth > MAX_DEPTH {
        debug!(path, "deep search depth limit reached");
        return;
    }

    match value {
        Value::String(s) => {
            if is_creative_url(s) {
                out.push(CreativeCandidate::new(s.as_str(), path, CandidateKind::DeepSearch));
            }
        }
        Value::Object(map) => walk_object(map, path, depth, out),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk(item, &format!("{path}[{i}]"), depth + 1, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn walk_object(map: &Map<String, Value>, path: &str, depth: usize, out: &mut Vec<CreativeCandidate>) {
    for (key, value) in map {
        let child = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        walk(value, &child, depth + 1, out);
    }
}

fn string_at<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    let (last, parents) = keys.split_last()?;
    let mut current = obj;
    for key in parents {
        current = current.get(*key)?.as_object()?;
    }
    current.get(*last)?.as_str()
}

fn on_ads_domain(url: &str) -> bool {
    DIRECT_FIELD_DOMAINS.iter().any(|d| url.contains(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LINK_IMG: &str = "https://scontent.xx.fbcdn.net/v/t39.35426-6/link_n.jpg";
    const VIDEO_IMG: &str = "https://scontent.xx.fbcdn.net/v/t15.5256-10/poster_n.jpg";
    const THUMB: &str = "https://scontent.xx.fbcdn.net/v/t45.1600-4/ad_n.png";

    fn urls(candidates: &[CreativeCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.url.as_str()).collect()
    }

    #[test]
    fn missing_null_and_garbage_snapshots_are_empty() {
        assert!(snapshot_of(&json!({})).is_empty());
        assert!(snapshot_of(&json!({ "snapshot": null })).is_empty());
        assert!(snapshot_of(&json!({ "snapshot": "{not json" })).is_empty());
        assert!(snapshot_of(&json!({ "snapshot": "[1, 2]" })).is_empty());
        assert!(snapshot_of(&json!({ "snapshot": 7 })).is_empty());
        assert!(snapshot_of(&json!("just a string")).is_empty());
    }

    #[test]
    fn ad_id_accepts_strings_and_numbers() {
        assert_eq!(ad_id_of(&json!({ "ad_archive_id": "123" })), Some("123".to_string()));
        assert_eq!(ad_id_of(&json!({ "ad_archive_id": 456 })), Some("456".to_string()));
        assert_eq!(ad_id_of(&json!({ "adId": "789" })), Some("789".to_string()));
        assert_eq!(ad_id_of(&json!({ "ad_archive_id": "  " })), None);
        assert_eq!(ad_id_of(&json!({})), None);
    }

    #[test]
    fn string_snapshot_is_parsed() {
        let record = json!({ "snapshot": "{\"page_name\": \"Acme\"}" });
        assert_eq!(snapshot_of(&record).get("page_name"), Some(&json!("Acme")));
    }

    #[test]
    fn known_shape_pass_tags_each_location() {
        let creative = json!({
            "thumbnail": THUMB,
            "object_story_spec": {
                "link_data": { "image": { "url": LINK_IMG } },
                "video_data": { "image": { "url": VIDEO_IMG } }
            }
        });
        let mut out = Vec::new();
        known_shape_candidates(creative.as_object().unwrap(), "snapshot.creative", &mut out);

        let kinds: Vec<_> = out.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CandidateKind::CreativeThumbnail,
                CandidateKind::LinkDataImage,
                CandidateKind::VideoDataImage,
            ]
        );
        assert_eq!(out[1].source_path, "snapshot.creative.object_story_spec.link_data.image.url");
    }

    #[test]
    fn known_shape_pass_applies_classifier() {
        let creative = json!({ "thumbnail": "https://scontent.xx.fbcdn.net/v/t39.1/page_logo.png" });
        let mut out = Vec::new();
        known_shape_candidates(creative.as_object().unwrap(), "snapshot.creative", &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn direct_field_pass_uses_domain_test_only() {
        // "small" would fail the classifier but direct fields skip it.
        let obj = json!({
            "image_url": "https://scontent.xx.fbcdn.net/v/small.jpg",
            "picture": { "url": "https://www.facebook.com/ads/image/?d=1" },
            "media_url": "https://cdn.example.com/a.jpg",
            "unrelated": "https://scontent.xx.fbcdn.net/v/t39.1/x.jpg"
        });
        let found = direct_field_candidates(obj.as_object().unwrap(), "snapshot.creatives[0]");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, CandidateKind::DirectField);
        assert_eq!(found[0].source_path, "snapshot.creatives[0].image_url");
        assert_eq!(found[1].kind, CandidateKind::NestedObject);
        assert_eq!(found[1].source_path, "snapshot.creatives[0].picture.url");
    }

    #[test]
    fn deep_search_records_paths() {
        let value = json!({
            "cards": [
                { "title": "Hi" },
                { "resized_image_url": LINK_IMG }
            ]
        });
        let found = deep_search(&value, "snapshot");
        assert_eq!(urls(&found), vec![LINK_IMG]);
        assert_eq!(found[0].source_path, "snapshot.cards[1].resized_image_url");
        assert_eq!(found[0].kind, CandidateKind::DeepSearch);
    }

    #[test]
    fn deep_search_stops_at_depth_limit() {
        let mut value = json!({ "url": LINK_IMG });
        for _ in 0..(MAX_DEPTH + 10) {
            value = json!({ "next": value });
        }
        assert!(deep_search(&value, "").is_empty());

        let shallow = json!({ "a": { "b": [LINK_IMG] } });
        assert_eq!(deep_search(&shallow, "").len(), 1);
    }

    #[test]
    fn passes_are_concatenated_in_order() {
        let record = json!({
            "ad_archive_id": "123",
            "snapshot": {
                "creatives": [
                    { "thumbnail": THUMB, "image_url": LINK_IMG }
                ]
            }
        });
        let found = extract_candidates(&record, "123");
        let kinds: Vec<_> = found.iter().map(|c| c.kind).collect();

        // thumbnail via known shape, both keys again as direct fields, then
        // both again from the deep search.
        assert_eq!(
            kinds,
            vec![
                CandidateKind::CreativeThumbnail,
                CandidateKind::DirectField,
                CandidateKind::DirectField,
                CandidateKind::DeepSearch,
                CandidateKind::DeepSearch,
            ]
        );
    }

    #[test]
    fn single_creatives_object_is_searched() {
        let record = json!({
            "snapshot": { "creatives": { "thumbnail": THUMB } }
        });
        let found = extract_candidates(&record, "1");
        assert_eq!(found[0].kind, CandidateKind::CreativeThumbnail);
        assert_eq!(found[0].source_path, "snapshot.creatives.thumbnail");
    }

    #[test]
    fn creative_object_gets_no_direct_field_pass() {
        let logo = "https://scontent.xx.fbcdn.net/v/t39.30808-1/brand_logo_n.png";
        let real = "https://scontent.xx.fbcdn.net/v/t39.35426-6/real_creative_n.jpg";
        let record = json!({
            "snapshot": {
                "creative": { "thumbnail": logo },
                "cards": [{ "resized_image_url": real }]
            }
        });

        let found = extract_candidates(&record, "1");
        assert_eq!(urls(&found), vec![real]);
        assert_eq!(found[0].kind, CandidateKind::DeepSearch);
    }

    #[test]
    fn non_object_records_do_not_panic() {
        assert!(extract_candidates(&json!(null), "1").is_empty());
        assert!(extract_candidates(&json!([1, "two", null]), "1").is_empty());
        assert_eq!(extract_candidates(&json!([LINK_IMG]), "1").len(), 1);
    }
}
