// URL classification for creative candidates.
//
// The ads library exposes no "this is the creative" flag, so this is
// substring matching against known CDN layouts. A false negative only costs
// one more probe; a false positive ships a page logo as the ad.

/// Ads library image and content delivery domains.
pub const CDN_MARKERS: &[&str] = &["fbcdn.net", "facebook.com", "fbsbx.com"];

/// Substrings of assets that are never the creative. Video URLs are
/// handled elsewhere and must not be mistaken for image creatives.
pub const NON_CREATIVE_MARKERS: &[&str] = &[
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
    "thumbnail",
    "small",
    "tiny",
    "video",
    ".mp4",
    "video_hd_url",
    "video_preview_image_url",
];

/// Substrings seen on real creative assets. At least one must match.
pub const CREATIVE_MARKERS: &[&str] = &["scontent", "/t39.", "/t31.", "creative", "ad", "campaign"];

/// Whether `url` plausibly points at an ad creative rather than a logo,
/// avatar, tracking pixel or video.
pub fn is_creative_url(url: &str) -> bool {
    if url.is_empty() || !has_cdn_marker(url) {
        return false;
    }

    let lower = url.to_lowercase();
    if contains_any(&lower, NON_CREATIVE_MARKERS) {
        return false;
    }

    contains_any(&lower, CREATIVE_MARKERS)
}

pub fn has_cdn_marker(url: &str) -> bool {
    CDN_MARKERS.iter().any(|m| url.contains(m))
}

pub(crate) fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATIVE: &str = "https://scontent-iad3-1.xx.fbcdn.net/v/t39.35426-6/4511_n.jpg?stp=dst-jpg";

    #[test]
    fn accepts_static_content_creative() {
        assert!(is_creative_url(CREATIVE));
    }

    #[test]
    fn rejects_empty() {
        assert!(!is_creative_url(""));
    }

    #[test]
    fn rejects_urls_off_the_cdn() {
        for url in [
            "https://example.com/creative/ad.jpg",
            "https://cdn.shopify.com/s/files/campaign.png",
            "not a url at all",
        ] {
            assert!(!is_creative_url(url), "{url}");
        }
    }

    #[test]
    fn deny_list_beats_allow_list() {
        for url in [
            "https://scontent.xx.fbcdn.net/v/t39.1/avatar_ad.jpg",
            "https://scontent.xx.fbcdn.net/v/t39.1/brand_logo.png",
            "https://scontent.xx.fbcdn.net/v/t39.1/1x1.gif",
            "https://video.xx.fbcdn.net/v/t42.1/creative.mp4",
            "https://scontent.xx.fbcdn.net/v/t39.1/Profile_Picture.jpg",
            "https://www.facebook.com/pages/campaign",
        ] {
            assert!(!is_creative_url(url), "{url}");
        }
    }

    #[test]
    fn deny_list_is_case_insensitive() {
        assert!(!is_creative_url("https://scontent.xx.fbcdn.net/v/t39.1/LOGO.jpg"));
    }

    #[test]
    fn allow_list_is_mandatory() {
        // On the CDN, nothing denied, but no creative marker either.
        assert!(!is_creative_url("https://static.xx.fbcdn.net/rsrc.php/v3/yO/r/z.png"));
    }

    #[test]
    fn fbsbx_domain_counts_as_cdn() {
        assert!(is_creative_url("https://lookaside.fbsbx.com/creative/render?id=1"));
    }
}
