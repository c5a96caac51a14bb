use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdLensError {
    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
