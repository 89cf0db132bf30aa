use rubrik_client::CdmClient;
use rubrik_metrics::{ClusterEventFailure, ExporterMetrics};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    backup_status::CounterReport,
    cursor::WindowCursor,
    model::EventStatus,
    source::{EventQuery, expand_or_skip, negotiate},
};
use crate::{
    clock::{Clock, format_timestamp},
    error::CollectorError,
    labels::{first_or_null, or_null},
    poller::Poller,
    version::Dialect,
};

const CLUSTER_OBJECT_TYPE: &str = "Cluster";

/// Counts failed cluster-level events (`rubrik_failed_cluster_event`) seen
/// since the previous successful cycle. Every listed series is expanded.
pub struct ClusterEventCounter {
    client: Arc<dyn CdmClient>,
    metrics: Arc<ExporterMetrics>,
    clock: Arc<dyn Clock>,
    cursor: WindowCursor,
}

impl ClusterEventCounter {
    pub fn new(
        client: Arc<dyn CdmClient>,
        metrics: Arc<ExporterMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            metrics,
            clock,
            cursor: WindowCursor::new(),
        }
    }

    pub fn cursor(&self) -> &WindowCursor {
        &self.cursor
    }

    pub async fn tick(&mut self) -> Result<CounterReport, CollectorError> {
        let source = negotiate(&self.client).await?;
        if source.dialect() == Dialect::Legacy {
            warn!("cluster event counters require CDM 5.2 or newer, skipping cycle");
            return Ok(CounterReport::default());
        }

        let before_call = self.clock.now();
        let window_start = format_timestamp(self.cursor.window_start(before_call));
        let query = EventQuery::default()
            .with_object_type(CLUSTER_OBJECT_TYPE)
            .with_status(EventStatus::Failure)
            .before(window_start.as_str());

        debug!(since = %window_start, "querying cluster events");
        let summaries = source.list_series(&query).await?;

        let mut report = CounterReport::default();
        for summary in &summaries {
            report.observed += 1;

            let Some(series) = expand_or_skip(source.as_ref(), &summary.series_id).await? else {
                continue;
            };
            if !series.has_failed_event() {
                continue;
            }

            self.metrics.inc_cluster_event_failure(ClusterEventFailure {
                object_name: first_or_null(series.object_name.as_deref(), summary.object_name.as_deref()),
                object_type: first_or_null(series.object_type.as_deref(), summary.object_type.as_deref()),
                event_name: or_null(summary.latest_event_name.as_deref()),
            })?;
            report.failures_counted += 1;
        }

        self.cursor.advance(before_call);
        Ok(report)
    }
}

#[async_trait::async_trait]
impl Poller for ClusterEventCounter {
    fn name(&self) -> &'static str {
        "cluster_events"
    }

    async fn poll(&mut self) -> Result<(), CollectorError> {
        let report = self.tick().await?;
        info!(
            observed = report.observed,
            failures = report.failures_counted,
            "cluster event cycle complete"
        );
        Ok(())
    }
}
