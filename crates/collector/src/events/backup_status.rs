use rubrik_client::CdmClient;
use rubrik_metrics::{BackupJobFailure, EventObserved, ExporterMetrics};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    classify::{SupportedEvents, Verdict, classify, normalize_event_name},
    cursor::WindowCursor,
    model::{EventSeriesSummary, EventStatus},
    source::{EventQuery, EventSource, EventType, expand_or_skip, negotiate},
};
use crate::{
    clock::{Clock, format_timestamp},
    error::CollectorError,
    labels::{first_or_null, or_null},
    poller::Poller,
    version::Dialect,
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CounterReport {
    pub observed: usize,
    pub failures_counted: usize,
}

/// Incremental counters over the backup event stream: `rubrik_event_name` for
/// every event seen and `rubrik_backup_job_failures` for allow-listed failures.
///
/// A cycle that fails part way leaves the cursor where it was, so the next
/// cycle re-reads the window and may count some events twice. The counters
/// are upper bounds, never undercounts.
pub struct BackupStatusCounter {
    client: Arc<dyn CdmClient>,
    metrics: Arc<ExporterMetrics>,
    clock: Arc<dyn Clock>,
    supported: SupportedEvents,
    cursor: WindowCursor,
}

impl BackupStatusCounter {
    pub fn new(
        client: Arc<dyn CdmClient>,
        metrics: Arc<ExporterMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            metrics,
            clock,
            supported: SupportedEvents::default(),
            cursor: WindowCursor::new(),
        }
    }

    pub fn with_supported_events(mut self, supported: SupportedEvents) -> Self {
        self.supported = supported;
        self
    }

    pub fn cursor(&self) -> &WindowCursor {
        &self.cursor
    }

    pub async fn tick(&mut self) -> Result<CounterReport, CollectorError> {
        let source = negotiate(&self.client).await?;
        if source.dialect() == Dialect::Legacy {
            warn!("backup status counters require CDM 5.2 or newer, skipping cycle");
            return Ok(CounterReport::default());
        }

        let before_call = self.clock.now();
        let window_start = format_timestamp(self.cursor.window_start(before_call));

        // The first cycle only looks for failures, later cycles count every event.
        let mut query = EventQuery::of_type(EventType::Backup);
        if self.cursor.is_first_run() {
            query = query.with_status(EventStatus::Failure);
        }
        let query = query.before(window_start.as_str());

        debug!(since = %window_start, first_run = self.cursor.is_first_run(), "querying backup events");
        let summaries = source.list_series(&query).await?;

        let mut report = CounterReport::default();
        for summary in &summaries {
            if self.process(source.as_ref(), summary).await? {
                report.failures_counted += 1;
            }
            report.observed += 1;
        }

        self.cursor.advance(before_call);
        Ok(report)
    }

    /// Returns whether a failure was counted for `summary`.
    async fn process(
        &self,
        source: &dyn EventSource,
        summary: &EventSeriesSummary,
    ) -> Result<bool, CollectorError> {
        let verdict = classify(&summary.latest_status);
        if verdict == Verdict::Ignored {
            warn!(
                series_id = %summary.series_id,
                status = %summary.latest_status,
                "skipping event with unknown status"
            );
        }

        self.metrics.inc_event_observed(EventObserved {
            object_type: or_null(summary.object_type.as_deref()),
            event_name: or_null(summary.latest_event_name.as_deref()),
            event_status: summary.latest_status.as_str(),
        })?;

        if !verdict.is_active_failure() {
            return Ok(false);
        }

        let Some(event_name) = summary.latest_event_name.as_deref() else {
            return Ok(false);
        };
        if !self.supported.contains(event_name) {
            return Ok(false);
        }

        let Some(series) = expand_or_skip(source, &summary.series_id).await? else {
            return Ok(false);
        };

        let family = normalize_event_name(event_name);
        self.metrics.inc_backup_job_failure(BackupJobFailure {
            object_name: first_or_null(summary.object_name.as_deref(), series.object_name.as_deref()),
            object_type: or_null(summary.object_type.as_deref()),
            location: first_or_null(series.location.as_deref(), summary.location.as_deref()),
            event_family: &family,
        })?;

        Ok(true)
    }
}

#[async_trait::async_trait]
impl Poller for BackupStatusCounter {
    fn name(&self) -> &'static str {
        "backup_status"
    }

    async fn poll(&mut self) -> Result<(), CollectorError> {
        let report = self.tick().await?;
        info!(
            observed = report.observed,
            failures = report.failures_counted,
            "backup status cycle complete"
        );
        Ok(())
    }
}
