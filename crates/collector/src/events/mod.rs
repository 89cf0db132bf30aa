//! Event reconciliation: listing, classifying and expanding CDM event series
//! into failure counters and active/resolved gauges.

pub mod backup_status;
pub mod classify;
pub mod cluster_events;
pub mod cursor;
pub mod failed_jobs;
pub mod model;
pub mod source;
pub mod suppression;

pub use backup_status::{BackupStatusCounter, CounterReport};
pub use classify::{SupportedEvents, Verdict, classify, normalize_event_name};
pub use cluster_events::ClusterEventCounter;
pub use cursor::{CursorPhase, WindowCursor};
pub use failed_jobs::{FailedBackupJobs, FailedConfigurationJobs, RescanReport};
pub use model::{EventDetail, EventSeries, EventSeriesSummary, EventStatus};
pub use source::{
    EventQuery, EventSource, EventType, LegacyEventSource, ModernEventSource, event_source_for,
    negotiate,
};
pub use suppression::{FailureRecord, Resolution, SuccessSuppressionResolver};
