use std::collections::HashSet;

use crate::candidate::{CandidateKind, CreativeCandidate};
use crate::classify::contains_any;

/// Non-creative markers re-checked on deep search hits. The deep search is
/// the widest net, so its hits get a second look after the classifier.
const DEEP_SEARCH_EXCLUDES: &[&str] = &[
    "icon",
    "avatar",
    "emoji",
    "badge",
    "1x1",
    "pixel",
    "spinner",
    "/photos/",
    "/profile/",
    "/pages/",
    "/groups/",
    "/events/",
    "logo",
    "brand",
    "company",
    "profile_picture",
    "page_profile",
    "video",
    "video_hd_url",
    "video_preview_image_url",
];

/// Deduplicate and order candidates into the probe queue.
///
/// Deep-search hits carrying excluded markers are dropped before
/// deduplication, so the first remaining occurrence of a URL keeps its
/// metadata. Order is provenance priority ascending, then `size_hint`
/// descending; the sort is stable so remaining ties keep insertion order.
pub fn rank(candidates: Vec<CreativeCandidate>) -> Vec<CreativeCandidate> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<CreativeCandidate> = candidates
        .into_iter()
        .filter(|c| !is_excluded_deep_hit(c))
        .filter(|c| seen.insert(c.url.clone()))
        .collect();

    ranked.sort_by_key(|c| (c.kind.priority(), std::cmp::Reverse(c.size_hint)));
    ranked
}

fn is_excluded_deep_hit(candidate: &CreativeCandidate) -> bool {
    candidate.kind == CandidateKind::DeepSearch
        && contains_any(&candidate.url.to_lowercase(), DEEP_SEARCH_EXCLUDES)
}
