//! Creative extraction for ads library payloads.
//!
//! An ad record from the scraper is searched for image URLs, the hits are
//! ranked by provenance and estimated size, and the ranked queue is probed by
//! downloading candidates until one looks like a real creative.

pub mod candidate;
pub mod classify;
pub mod fallback;
pub mod pipeline;
pub mod probe;
pub mod rank;
pub mod search;
pub mod size;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use candidate::{CandidateKind, CreativeCandidate, ValidatedCreative};
pub use classify::is_creative_url;
pub use fallback::{AdLookup, DetailPageFallback, FallbackStrategy, NoFallback};
pub use pipeline::{CreativeOutcome, CreativeResolver};
pub use probe::{FetchedImage, HttpImageFetcher, ImageFetcher, Prober};
pub use rank::rank;
pub use search::{ad_id_of, extract_candidates, snapshot_of};
pub use size::estimate_size;
