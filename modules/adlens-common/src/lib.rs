pub mod config;
pub mod error;

pub use config::{AppConfig, CreativeConfig};
pub use error::AdLensError;
