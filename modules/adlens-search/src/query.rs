use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use url::form_urlencoded;

use crate::dates::DateRange;

const ADS_LIBRARY_BASE: &str = "https://www.facebook.com/ads/library/";

pub const DEFAULT_COUNT: u32 = 10;
pub const DEFAULT_COUNTRY: &str = "US";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    #[default]
    Active,
    Inactive,
    All,
}

impl ActiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::All => "all",
        }
    }
}

impl fmt::Display for ActiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActiveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "all" => Ok(Self::All),
            other => Err(format!("unknown active status '{other}' (expected active, inactive or all)")),
        }
    }
}

/// One keyword search against the ads library.
#[derive(Debug, Clone, Serialize)]
pub struct AdSearchQuery {
    pub domain: String,
    pub count: u32,
    pub country: String,
    pub exact_phrase: bool,
    pub active_status: ActiveStatus,
    pub date_range: Option<DateRange>,
}

impl AdSearchQuery {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into().trim().to_string(),
            count: DEFAULT_COUNT,
            country: DEFAULT_COUNTRY.to_string(),
            exact_phrase: false,
            active_status: ActiveStatus::default(),
            date_range: None,
        }
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn exact_phrase(mut self, exact: bool) -> Self {
        self.exact_phrase = exact;
        self
    }

    pub fn active_status(mut self, status: ActiveStatus) -> Self {
        self.active_status = status;
        self
    }

    pub fn date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range;
        self
    }

    /// The ads library search page this query corresponds to.
    pub fn library_url(&self) -> String {
        let (term, search_type) = if self.exact_phrase {
            (format!("\"{}\"", self.domain), "keyword_exact_phrase")
        } else {
            (self.domain.clone(), "keyword_unordered")
        };
        let q: String = form_urlencoded::byte_serialize(term.as_bytes()).collect();

        let mut url = format!(
            "{ADS_LIBRARY_BASE}?active_status={}&ad_type=all&country={}&is_targeted_country=false&media_type=all&q={q}&search_type={search_type}",
            self.active_status,
            self.country.trim().to_uppercase(),
        );

        if let Some(range) = &self.date_range {
            url.push_str(&format!(
                "&start_date[min]={}&start_date[max]={}",
                range.start.format("%Y-%m-%d"),
                range.end.format("%Y-%m-%d"),
            ));
        }

        url
    }
}

/// Detail page for a single archived ad.
pub fn ad_detail_url(ad_id: &str) -> String {
    format!("{ADS_LIBRARY_BASE}?id={}", ad_id.trim())
}
