use std::time::Duration;

use crate::error::AdLensError;

/// Default ads library scraper actor on Apify.
pub const DEFAULT_ADS_ACTOR: &str = "curious_coder~facebook-ads-library-scraper";

/// Source domains whose ads often ship without a usable creative in the
/// search payload. Matched case-insensitively against the searched domain.
pub const DEFAULT_FALLBACK_DOMAINS: &[&str] = &[
    "CAREERSEEKING.CO",
    "HEALTHANDWEALTHGUIDE.COM",
    "INFORMATIONSPHERE.CO",
];

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Scraping
    pub apify_api_token: String,
    pub ads_actor_id: String,

    // Creative extraction tuning
    pub creative: CreativeConfig,
}

/// Thresholds for creative probing and the fallback lookup.
///
/// The byte threshold and retry counts are untuned; they are kept at the
/// values the ad viewer has always used but can be overridden per deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct CreativeConfig {
    /// Downloads smaller than this are treated as logos or profile pictures.
    pub min_creative_bytes: usize,
    /// Fetch attempts per candidate URL.
    pub probe_attempts: u32,
    /// Timeout for a single fetch attempt.
    pub probe_timeout: Duration,
    /// Fixed pause between attempts on the same URL.
    pub retry_pause: Duration,
    pub fallback_enabled: bool,
    pub fallback_domains: Vec<String>,
}

impl Default for CreativeConfig {
    fn default() -> Self {
        Self {
            min_creative_bytes: 5000,
            probe_attempts: 3,
            probe_timeout: Duration::from_secs(10),
            retry_pause: Duration::from_secs(1),
            fallback_enabled: false,
            fallback_domains: DEFAULT_FALLBACK_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

impl CreativeConfig {
    pub fn from_env() -> Result<Self, AdLensError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, AdLensError> {
        let defaults = Self::default();

        Ok(Self {
            min_creative_bytes: parse_or(&get, "CREATIVE_MIN_BYTES", defaults.min_creative_bytes)?,
            probe_attempts: parse_or(&get, "CREATIVE_PROBE_ATTEMPTS", defaults.probe_attempts)?
                .max(1),
            probe_timeout: get("CREATIVE_PROBE_TIMEOUT_SECS")
                .map(|v| parse_value::<u64>("CREATIVE_PROBE_TIMEOUT_SECS", &v))
                .transpose()?
                .map(Duration::from_secs)
                .unwrap_or(defaults.probe_timeout),
            retry_pause: get("CREATIVE_RETRY_PAUSE_MS")
                .map(|v| parse_value::<u64>("CREATIVE_RETRY_PAUSE_MS", &v))
                .transpose()?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_pause),
            fallback_enabled: parse_or(&get, "CREATIVE_FALLBACK_ENABLED", defaults.fallback_enabled)?,
            fallback_domains: match get("CREATIVE_FALLBACK_DOMAINS") {
                Some(list) => list
                    .split(',')
                    .map(|s| s.trim().to_uppercase())
                    .filter(|s| !s.is_empty())
                    .collect(),
                None => defaults.fallback_domains,
            },
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AdLensError> {
        dotenvy::dotenv().ok();

        let config = Self {
            apify_api_token: std::env::var("APIFY_API_TOKEN")
                .map_err(|_| AdLensError::Config("APIFY_API_TOKEN is required".to_string()))?,
            ads_actor_id: std::env::var("ADLENS_ADS_ACTOR")
                .unwrap_or_else(|_| DEFAULT_ADS_ACTOR.to_string()),
            creative: CreativeConfig::from_env()?,
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.len().min(5);
            format!("{}...({} chars)", &val[..n], val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  APIFY_API_TOKEN: {}", preview(&self.apify_api_token));
        tracing::info!("  ADLENS_ADS_ACTOR: {}", self.ads_actor_id);
        tracing::info!(
            min_bytes = self.creative.min_creative_bytes,
            attempts = self.creative.probe_attempts,
            timeout_secs = self.creative.probe_timeout.as_secs(),
            fallback_enabled = self.creative.fallback_enabled,
            "  creative probing"
        );
    }
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AdLensError> {
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AdLensError> {
    raw.trim()
        .parse()
        .map_err(|_| AdLensError::Config(format!("{key} has an invalid value: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = CreativeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CreativeConfig::default());
        assert_eq!(config.min_creative_bytes, 5000);
        assert_eq!(config.probe_attempts, 3);
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert!(!config.fallback_enabled);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = CreativeConfig::from_lookup(lookup(&[
            ("CREATIVE_MIN_BYTES", "8000"),
            ("CREATIVE_PROBE_ATTEMPTS", "5"),
            ("CREATIVE_PROBE_TIMEOUT_SECS", "3"),
            ("CREATIVE_RETRY_PAUSE_MS", "0"),
            ("CREATIVE_FALLBACK_ENABLED", "true"),
            ("CREATIVE_FALLBACK_DOMAINS", "example.com, other.co ,"),
        ]))
        .unwrap();

        assert_eq!(config.min_creative_bytes, 8000);
        assert_eq!(config.probe_attempts, 5);
        assert_eq!(config.probe_timeout, Duration::from_secs(3));
        assert_eq!(config.retry_pause, Duration::ZERO);
        assert!(config.fallback_enabled);
        assert_eq!(config.fallback_domains, vec!["EXAMPLE.COM", "OTHER.CO"]);
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let config =
            CreativeConfig::from_lookup(lookup(&[("CREATIVE_PROBE_ATTEMPTS", "0")])).unwrap();
        assert_eq!(config.probe_attempts, 1);
    }

    #[test]
    fn invalid_number_is_a_config_error() {
        let err = CreativeConfig::from_lookup(lookup(&[("CREATIVE_MIN_BYTES", "lots")]))
            .unwrap_err();
        assert!(matches!(err, AdLensError::Config(msg) if msg.contains("CREATIVE_MIN_BYTES")));
    }
}
