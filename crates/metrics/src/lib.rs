pub mod api;
pub mod exporter;

pub use exporter::{
    BackupJobFailure, CapacitySample, ClusterEventFailure, ClusterInfo, EventObserved,
    ExporterMetrics, FailedBackupJob, FailedBackupJobActive, FailedConfigurationJob,
};

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("MetricsError::PrometheusErr: {0}")]
    PrometheusErr(String),
    #[error("MetricsError::FromUtf8Error: {0}")]
    FromUtf8Error(#[from] std::string::FromUtf8Error),
    #[error("MetricsError::Io: {0}")]
    Io(#[from] std::io::Error),
}
