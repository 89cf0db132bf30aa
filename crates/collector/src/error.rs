use rubrik_client::ClientError;
use rubrik_metrics::MetricsError;
use thiserror::Error;

use crate::version::VersionParseError;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    VersionParse(#[from] VersionParseError),
    #[error("cluster api error: {0}")]
    Transport(#[from] ClientError),
    #[error("unexpected response shape from {endpoint}: {source}")]
    UnexpectedShape {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("report {0} not found on cluster")]
    MissingReport(&'static str),
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("authentication against the cluster failed")]
    AuthenticationFailed,
}

impl CollectorError {
    /// Fatal errors stop the scheduler and the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CollectorError::AuthenticationFailed)
    }

    /// Errors confined to one series; the rest of the batch is still processed.
    pub fn is_series_local(&self) -> bool {
        matches!(self, CollectorError::UnexpectedShape { .. })
    }
}
