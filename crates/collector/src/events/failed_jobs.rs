use rubrik_client::CdmClient;
use rubrik_metrics::{ExporterMetrics, FailedBackupJob, FailedBackupJobActive, FailedConfigurationJob};
use std::sync::Arc;
use tracing::info;

use super::{
    model::{EventSeries, EventSeriesSummary, EventStatus},
    source::{EventQuery, EventSource, EventType, expand_or_skip, negotiate},
    suppression::{FailureRecord, SuccessSuppressionResolver},
};
use crate::{
    clock::{Clock, format_timestamp, lookback},
    error::CollectorError,
    labels::{first_or_null, or_null},
    poller::Poller,
    version::Dialect,
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RescanReport {
    pub listed: usize,
    pub failures: usize,
    pub still_active: usize,
}

/// A listed series whose history contains at least one `Failure`.
struct ConfirmedFailure {
    summary: EventSeriesSummary,
    series: EventSeries,
}

impl ConfirmedFailure {
    fn object_name(&self) -> Option<&str> {
        self.series
            .object_name
            .as_deref()
            .or(self.summary.object_name.as_deref())
    }

    fn object_id(&self) -> Option<&str> {
        self.series
            .object_id
            .as_deref()
            .or(self.summary.object_id.as_deref())
    }

    fn object_type(&self) -> Option<&str> {
        self.series
            .object_type
            .as_deref()
            .or(self.summary.object_type.as_deref())
    }

    fn severity(&self) -> &str {
        first_or_null(self.summary.severity.as_deref(), self.series.severity.as_deref())
    }
}

/// Lists the failures of the last lookback period and keeps those whose
/// series really reached `Failure`.
async fn confirmed_failures(
    source: &dyn EventSource,
    event_type: EventType,
    since: String,
    report: &mut RescanReport,
) -> Result<Vec<ConfirmedFailure>, CollectorError> {
    let query = EventQuery::of_type(event_type)
        .with_status(EventStatus::Failure)
        .before(since);
    let summaries = source.list_series(&query).await?;
    report.listed = summaries.len();

    let mut confirmed = Vec::new();
    for summary in summaries {
        let Some(series) = expand_or_skip(source, &summary.series_id).await? else {
            continue;
        };
        if series.has_failed_event() {
            confirmed.push(ConfirmedFailure { summary, series });
        }
    }
    report.failures = confirmed.len();
    Ok(confirmed)
}

/// Full rescan of backup failures. Publishes the permanent
/// `rubrik_failed_backup_job` record and the current
/// `rubrik_failed_backup_job_active` state of each failed object.
pub struct FailedBackupJobs {
    client: Arc<dyn CdmClient>,
    metrics: Arc<ExporterMetrics>,
    clock: Arc<dyn Clock>,
    resolver: SuccessSuppressionResolver,
}

impl FailedBackupJobs {
    pub fn new(
        client: Arc<dyn CdmClient>,
        metrics: Arc<ExporterMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            metrics,
            clock,
            resolver: SuccessSuppressionResolver::new(EventType::Backup),
        }
    }

    pub async fn tick(&self) -> Result<RescanReport, CollectorError> {
        let source = negotiate(&self.client).await?;
        let since = format_timestamp(self.clock.now() - lookback());

        let mut report = RescanReport::default();
        let failures =
            confirmed_failures(source.as_ref(), EventType::Backup, since, &mut report).await?;

        let mut active_states = Vec::with_capacity(failures.len());
        for failure in &failures {
            self.metrics.set_failed_backup_job(FailedBackupJob {
                object_name: or_null(failure.object_name()),
                object_id: or_null(failure.object_id()),
                object_type: or_null(failure.object_type()),
                severity: failure.severity(),
                location: first_or_null(
                    failure.series.location.as_deref(),
                    failure.summary.location.as_deref(),
                ),
                event_date: or_null(failure.summary.latest_time.as_deref()),
                event_name: or_null(failure.summary.latest_event_name.as_deref()),
                series_id: &failure.summary.series_id,
            })?;

            // The legacy API has no success lookup to resolve against.
            if source.dialect() == Dialect::Legacy {
                continue;
            }

            let record = FailureRecord {
                object_id: failure.object_id(),
                object_type: failure.object_type(),
                object_name: failure.object_name(),
                event_name: failure.summary.latest_event_name.as_deref(),
                time: failure.summary.latest_time.as_deref(),
            };
            let resolution = self.resolver.resolve(source.as_ref(), &record).await?;
            if resolution.is_active() {
                report.still_active += 1;
            }
            active_states.push((failure, resolution.is_active()));
        }

        // Swapped in only after every resolution succeeded.
        if source.dialect() == Dialect::Modern {
            self.metrics.reset_failed_backup_job_active();
            for (failure, active) in active_states {
                self.metrics.set_failed_backup_job_active(
                    FailedBackupJobActive {
                        object_name: or_null(failure.object_name()),
                        object_type: or_null(failure.object_type()),
                        object_id: or_null(failure.object_id()),
                    },
                    active,
                )?;
            }
        }

        Ok(report)
    }
}

#[async_trait::async_trait]
impl Poller for FailedBackupJobs {
    fn name(&self) -> &'static str {
        "failed_backup_jobs"
    }

    async fn poll(&mut self) -> Result<(), CollectorError> {
        let report = self.tick().await?;
        info!(
            listed = report.listed,
            failures = report.failures,
            active = report.still_active,
            "failed backup job rescan complete"
        );
        Ok(())
    }
}

/// Full rescan of configuration job failures into
/// `rubrik_failed_configuration_job`.
pub struct FailedConfigurationJobs {
    client: Arc<dyn CdmClient>,
    metrics: Arc<ExporterMetrics>,
    clock: Arc<dyn Clock>,
}

impl FailedConfigurationJobs {
    pub fn new(
        client: Arc<dyn CdmClient>,
        metrics: Arc<ExporterMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            metrics,
            clock,
        }
    }

    pub async fn tick(&self) -> Result<RescanReport, CollectorError> {
        let source = negotiate(&self.client).await?;
        let since = format_timestamp(self.clock.now() - lookback());

        let mut report = RescanReport::default();
        let failures =
            confirmed_failures(source.as_ref(), EventType::Configuration, since, &mut report)
                .await?;

        for failure in &failures {
            self.metrics
                .set_failed_configuration_job(FailedConfigurationJob {
                    object_name: or_null(failure.object_name()),
                    object_id: or_null(failure.object_id()),
                    object_type: or_null(failure.object_type()),
                    severity: failure.severity(),
                    event_date: or_null(failure.summary.latest_time.as_deref()),
                })?;
        }

        Ok(report)
    }
}

#[async_trait::async_trait]
impl Poller for FailedConfigurationJobs {
    fn name(&self) -> &'static str {
        "failed_configuration_jobs"
    }

    async fn poll(&mut self) -> Result<(), CollectorError> {
        let report = self.tick().await?;
        info!(
            listed = report.listed,
            failures = report.failures,
            "failed configuration job rescan complete"
        );
        Ok(())
    }
}
