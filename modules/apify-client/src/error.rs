use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApifyError>;

#[derive(Debug, Error)]
pub enum ApifyError {
    #[error("Request to Apify failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Apify returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Could not decode Apify response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Run {run_id} ended as {status:?}")]
    RunFailed {
        run_id: String,
        status: crate::types::RunStatus,
    },

    #[error("Run {0} finished without a default dataset")]
    MissingDataset(String),
}
