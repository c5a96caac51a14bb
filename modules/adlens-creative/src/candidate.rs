use bytes::Bytes;
use serde::Serialize;

/// Where in an ad record a candidate URL was found.
///
/// Declaration order is ranking order: lower `priority()` is tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    /// `creative.thumbnail`
    CreativeThumbnail,
    /// `object_story_spec.link_data.image.url`
    LinkDataImage,
    /// `object_story_spec.video_data.image.url`
    VideoDataImage,
    /// A creative-typed key such as `image_url` holding a string.
    DirectField,
    /// Anything the unrestricted walk turned up.
    DeepSearch,
    /// A creative-typed key holding `{ "url": ... }`. Has no slot in the
    /// priority table and sorts after everything else.
    NestedObject,
}

impl CandidateKind {
    pub fn priority(self) -> u16 {
        match self {
            CandidateKind::CreativeThumbnail => 1,
            CandidateKind::LinkDataImage => 2,
            CandidateKind::VideoDataImage => 3,
            CandidateKind::DirectField => 4,
            CandidateKind::DeepSearch => 5,
            CandidateKind::NestedObject => 999,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CandidateKind::CreativeThumbnail => "creative_thumbnail",
            CandidateKind::LinkDataImage => "link_data_image",
            CandidateKind::VideoDataImage => "video_data_image",
            CandidateKind::DirectField => "direct_field",
            CandidateKind::DeepSearch => "deep_search",
            CandidateKind::NestedObject => "nested_object",
        }
    }
}

impl std::fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One URL discovered in an ad record, not yet confirmed as the creative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreativeCandidate {
    pub url: String,
    /// Dotted/bracketed path into the record. Diagnostic only.
    pub source_path: String,
    #[serde(rename = "type")]
    pub kind: CandidateKind,
    /// Rough byte-size estimate from URL patterns, not an observed size.
    pub size_hint: u64,
}

impl CreativeCandidate {
    pub fn new(url: impl Into<String>, source_path: impl Into<String>, kind: CandidateKind) -> Self {
        let url = url.into();
        let size_hint = crate::size::estimate_size(&url);
        Self {
            url,
            source_path: source_path.into(),
            kind,
            size_hint,
        }
    }

    pub fn with_size_hint(mut self, size_hint: u64) -> Self {
        self.size_hint = size_hint;
        self
    }
}

/// Result of probing a ranked candidate queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidatedCreative {
    pub found: bool,
    pub url: Option<String>,
    #[serde(skip)]
    pub bytes: Option<Bytes>,
}

impl ValidatedCreative {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn found(url: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            found: true,
            url: Some(url.into()),
            bytes: Some(bytes),
        }
    }
}
