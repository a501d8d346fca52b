//! Loading the metrics document.
use crate::core::metrics::MetricsDocument;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};

/// Relative path of the document when no source is configured.
pub const DEFAULT_DATA_PATH: &str = "data/dashboard_data.json";

/// The only error the dashboard surfaces to the user. Any failure to read
/// or parse the document ends the run with this value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    #[error("could not read metrics from {location}: {reason}")]
    Unavailable { location: String, reason: String },
    #[error("malformed metrics document at {location}: {reason}")]
    Malformed { location: String, reason: String },
}

impl LoadFailure {
    pub fn reason(&self) -> &str {
        match self {
            LoadFailure::Unavailable { reason, .. } | LoadFailure::Malformed { reason, .. } => {
                reason
            }
        }
    }

    pub fn location(&self) -> &str {
        match self {
            LoadFailure::Unavailable { location, .. } | LoadFailure::Malformed { location, .. } => {
                location
            }
        }
    }
}

/// Where the metrics document comes from. Each call performs exactly one
/// read; there is no retry and no caching between calls.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Human readable location, used in logs and errors.
    fn location(&self) -> String;

    async fn load(&self) -> Result<MetricsDocument, LoadFailure>;
}

/// Parses the raw document text.
pub fn parse_document(location: &str, text: &str) -> Result<MetricsDocument, LoadFailure> {
    match serde_json::from_str::<MetricsDocument>(text) {
        Ok(doc) => {
            debug!(
                location,
                generated_date = %doc.metadata.generated_date,
                "Parsed metrics document"
            );
            Ok(doc)
        }
        Err(e) => {
            error!(error = ?e, location, "Failed to parse metrics document");
            Err(LoadFailure::Malformed {
                location: location.to_string(),
                reason: e.to_string(),
            })
        }
    }
}
