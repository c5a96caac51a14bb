//! Coarse size estimates for ranking candidates.
//!
//! Only a tie-break signal inside one provenance tier. The real size is
//! known after the download.

/// Large image path class.
pub const LARGE_IMAGE_MARKER: &str = "/t39.";
/// Medium image path class.
pub const MEDIUM_IMAGE_MARKER: &str = "/t31.";
/// Static content CDN host prefix.
pub const STATIC_CONTENT_MARKER: &str = "scontent";

pub const LARGE_IMAGE_ESTIMATE: u64 = 100_000;
pub const MEDIUM_IMAGE_ESTIMATE: u64 = 50_000;
pub const STATIC_CONTENT_ESTIMATE: u64 = 25_000;
pub const UNKNOWN_ESTIMATE: u64 = 10_000;

pub fn estimate_size(url: &str) -> u64 {
    if url.contains(LARGE_IMAGE_MARKER) {
        LARGE_IMAGE_ESTIMATE
    } else if url.contains(MEDIUM_IMAGE_MARKER) {
        MEDIUM_IMAGE_ESTIMATE
    } else if url.contains(STATIC_CONTENT_MARKER) {
        STATIC_CONTENT_ESTIMATE
    } else {
        UNKNOWN_ESTIMATE
    }
}
