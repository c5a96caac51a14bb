pub mod dates;
pub mod fields;
pub mod query;
pub mod runner;
pub mod scraper;
pub mod variants;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use dates::{is_date_in_range, DateRange};
pub use fields::{extract_fields, AdSummary};
pub use query::{ActiveStatus, AdSearchQuery};
pub use runner::{AdSearchRunner, ProcessedAd};
pub use scraper::{AdScraper, ApifyAdScraper, ScraperLookup};
pub use variants::{
    build_prompt_text, extract_json_blocks, extract_prompts, structured_prompts, GeneratedVariant,
    ImageGenerator, PromptAnalyzer, ReferenceImage, VariantStudio,
};
