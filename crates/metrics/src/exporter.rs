use prometheus::{
    Encoder, GaugeVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
    core::Collector, proto::MetricType,
};

use crate::MetricsError;

/// Labels of `rubrik_event_name`, one increment per event observed by the
/// backup status counter regardless of its outcome.
#[derive(Debug, Clone, Copy)]
pub struct EventObserved<'a> {
    pub object_type: &'a str,
    pub event_name: &'a str,
    pub event_status: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct BackupJobFailure<'a> {
    pub object_name: &'a str,
    pub object_type: &'a str,
    pub location: &'a str,
    pub event_family: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct ClusterEventFailure<'a> {
    pub object_name: &'a str,
    pub object_type: &'a str,
    pub event_name: &'a str,
}

/// Permanent record of a failed backup. Keyed by event date and series id so
/// that re-observing the same failure sets the same series again.
#[derive(Debug, Clone, Copy)]
pub struct FailedBackupJob<'a> {
    pub object_name: &'a str,
    pub object_id: &'a str,
    pub object_type: &'a str,
    pub severity: &'a str,
    pub location: &'a str,
    pub event_date: &'a str,
    pub event_name: &'a str,
    pub series_id: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct FailedBackupJobActive<'a> {
    pub object_name: &'a str,
    pub object_type: &'a str,
    pub object_id: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct FailedConfigurationJob<'a> {
    pub object_name: &'a str,
    pub object_id: &'a str,
    pub object_type: &'a str,
    pub severity: &'a str,
    pub event_date: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct ClusterInfo<'a> {
    pub id: &'a str,
    pub version: &'a str,
    pub api_version: &'a str,
    pub timezone: &'a str,
    pub location: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct CapacitySample<'a> {
    pub object_type: &'a str,
    pub object_name: &'a str,
    pub object_id: &'a str,
    pub location: &'a str,
}

/// Every series the exporter publishes. Each vector is internally
/// synchronized, so a single instance is shared by all pollers behind an `Arc`.
pub struct ExporterMetrics {
    cluster_name: String,
    registry: Registry,
    event_observed: IntCounterVec,
    backup_job_failures: IntCounterVec,
    cluster_event_failures: IntCounterVec,
    failed_backup_job: IntGaugeVec,
    failed_backup_job_active: IntGaugeVec,
    failed_configuration_job: IntGaugeVec,
    cluster_info: IntGaugeVec,
    capacity_local_used: GaugeVec,
    capacity_archive_used: GaugeVec,
}

impl std::fmt::Debug for ExporterMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterMetrics")
            .field("cluster_name", &self.cluster_name)
            .finish_non_exhaustive()
    }
}

impl ExporterMetrics {
    pub fn new(cluster_name: impl Into<String>) -> Result<Self, MetricsError> {
        let metrics = ExporterMetrics {
            cluster_name: cluster_name.into(),
            registry: Registry::new(),
            event_observed: IntCounterVec::new(
                Opts::new("rubrik_event_name", "Rubrik events encountered"),
                &["clusterName", "objectType", "eventName", "eventStatus"],
            )
            .map_err(prometheus_err)?,
            backup_job_failures: IntCounterVec::new(
                Opts::new(
                    "rubrik_backup_job_failures",
                    "Count of failed Rubrik Backup jobs by object and event.",
                ),
                &[
                    "clusterName",
                    "objectName",
                    "objectType",
                    "backupLocation",
                    "eventName",
                ],
            )
            .map_err(prometheus_err)?,
            cluster_event_failures: IntCounterVec::new(
                Opts::new(
                    "rubrik_failed_cluster_event",
                    "Information for failed Rubrik cluster Events.",
                ),
                &["clusterName", "objectName", "objectType", "eventName"],
            )
            .map_err(prometheus_err)?,
            failed_backup_job: IntGaugeVec::new(
                Opts::new(
                    "rubrik_failed_backup_job",
                    "Information for failed Rubrik Backup jobs.",
                ),
                &[
                    "clusterName",
                    "objectName",
                    "objectID",
                    "objectType",
                    "eventSeverity",
                    "location",
                    "eventDate",
                    "eventName",
                    "eventSeriesID",
                ],
            )
            .map_err(prometheus_err)?,
            failed_backup_job_active: IntGaugeVec::new(
                Opts::new(
                    "rubrik_failed_backup_job_active",
                    "Information if a backup job failure is currently in a failed state.",
                ),
                &["clusterName", "objectName", "objectType", "objectID"],
            )
            .map_err(prometheus_err)?,
            failed_configuration_job: IntGaugeVec::new(
                Opts::new(
                    "rubrik_failed_configuration_job",
                    "Information for failed Rubrik configuration jobs.",
                ),
                &[
                    "clusterName",
                    "objectName",
                    "objectID",
                    "objectType",
                    "eventSeverity",
                    "eventDate",
                ],
            )
            .map_err(prometheus_err)?,
            cluster_info: IntGaugeVec::new(
                Opts::new("rubrik_cluster_info", "Rubrik Cluster info."),
                &[
                    "clusterName",
                    "id",
                    "version",
                    "apiVersion",
                    "timezone",
                    "location",
                ],
            )
            .map_err(prometheus_err)?,
            capacity_local_used: GaugeVec::new(
                Opts::new(
                    "rubrik_object_capacity_local_used_bytes",
                    "Local storage consumption by protected object.",
                ),
                &["clusterName", "objectType", "objectName", "objectID", "location"],
            )
            .map_err(prometheus_err)?,
            capacity_archive_used: GaugeVec::new(
                Opts::new(
                    "rubrik_object_capacity_archive_used_bytes",
                    "Archive storage consumption by protected object.",
                ),
                &["clusterName", "objectType", "objectName", "objectID", "location"],
            )
            .map_err(prometheus_err)?,
        };

        metrics.register_all()?;
        Ok(metrics)
    }

    fn register_all(&self) -> Result<(), MetricsError> {
        let collectors: [Box<dyn Collector>; 9] = [
            Box::new(self.event_observed.clone()),
            Box::new(self.backup_job_failures.clone()),
            Box::new(self.cluster_event_failures.clone()),
            Box::new(self.failed_backup_job.clone()),
            Box::new(self.failed_backup_job_active.clone()),
            Box::new(self.failed_configuration_job.clone()),
            Box::new(self.cluster_info.clone()),
            Box::new(self.capacity_local_used.clone()),
            Box::new(self.capacity_archive_used.clone()),
        ];

        for collector in collectors {
            self.registry.register(collector).map_err(prometheus_err)?;
        }
        Ok(())
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn inc_event_observed(&self, labels: EventObserved<'_>) -> Result<(), MetricsError> {
        self.event_observed
            .get_metric_with_label_values(&[
                &self.cluster_name,
                labels.object_type,
                labels.event_name,
                labels.event_status,
            ])
            .map_err(prometheus_err)?
            .inc();
        Ok(())
    }

    pub fn inc_backup_job_failure(&self, labels: BackupJobFailure<'_>) -> Result<(), MetricsError> {
        self.backup_job_failures
            .get_metric_with_label_values(&[
                &self.cluster_name,
                labels.object_name,
                labels.object_type,
                labels.location,
                labels.event_family,
            ])
            .map_err(prometheus_err)?
            .inc();
        Ok(())
    }

    pub fn inc_cluster_event_failure(
        &self,
        labels: ClusterEventFailure<'_>,
    ) -> Result<(), MetricsError> {
        self.cluster_event_failures
            .get_metric_with_label_values(&[
                &self.cluster_name,
                labels.object_name,
                labels.object_type,
                labels.event_name,
            ])
            .map_err(prometheus_err)?
            .inc();
        Ok(())
    }

    pub fn set_failed_backup_job(&self, labels: FailedBackupJob<'_>) -> Result<(), MetricsError> {
        self.failed_backup_job
            .get_metric_with_label_values(&[
                &self.cluster_name,
                labels.object_name,
                labels.object_id,
                labels.object_type,
                labels.severity,
                labels.location,
                labels.event_date,
                labels.event_name,
                labels.series_id,
            ])
            .map_err(prometheus_err)?
            .set(1);
        Ok(())
    }

    pub fn set_failed_backup_job_active(
        &self,
        labels: FailedBackupJobActive<'_>,
        active: bool,
    ) -> Result<(), MetricsError> {
        self.failed_backup_job_active
            .get_metric_with_label_values(&[
                &self.cluster_name,
                labels.object_name,
                labels.object_type,
                labels.object_id,
            ])
            .map_err(prometheus_err)?
            .set(i64::from(active));
        Ok(())
    }

    /// Drops every active-state series so a rescan publishes only objects
    /// that are still inside the lookback window.
    pub fn reset_failed_backup_job_active(&self) {
        self.failed_backup_job_active.reset();
    }

    pub fn set_failed_configuration_job(
        &self,
        labels: FailedConfigurationJob<'_>,
    ) -> Result<(), MetricsError> {
        self.failed_configuration_job
            .get_metric_with_label_values(&[
                &self.cluster_name,
                labels.object_name,
                labels.object_id,
                labels.object_type,
                labels.severity,
                labels.event_date,
            ])
            .map_err(prometheus_err)?
            .set(1);
        Ok(())
    }

    pub fn set_cluster_info(&self, labels: ClusterInfo<'_>) -> Result<(), MetricsError> {
        self.cluster_info
            .get_metric_with_label_values(&[
                &self.cluster_name,
                labels.id,
                labels.version,
                labels.api_version,
                labels.timezone,
                labels.location,
            ])
            .map_err(prometheus_err)?
            .set(1);
        Ok(())
    }

    pub fn set_capacity(
        &self,
        labels: CapacitySample<'_>,
        local_bytes: f64,
        archive_bytes: f64,
    ) -> Result<(), MetricsError> {
        let values = [
            self.cluster_name.as_str(),
            labels.object_type,
            labels.object_name,
            labels.object_id,
            labels.location,
        ];
        self.capacity_local_used
            .get_metric_with_label_values(&values)
            .map_err(prometheus_err)?
            .set(local_bytes);
        self.capacity_archive_used
            .get_metric_with_label_values(&values)
            .map_err(prometheus_err)?
            .set(archive_bytes);
        Ok(())
    }

    /// Reads back the current value of the series of `name` whose labels
    /// include every pair in `labels`. `clusterName` is implied.
    pub fn sample(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let family = self
            .registry
            .gather()
            .into_iter()
            .find(|family| family.get_name() == name)?;
        let field_type = family.get_field_type();

        family
            .get_metric()
            .iter()
            .find(|metric| {
                let pairs = metric.get_label();
                labels.iter().all(|(key, value)| {
                    pairs
                        .iter()
                        .any(|pair| pair.get_name() == *key && pair.get_value() == *value)
                })
            })
            .map(|metric| match field_type {
                MetricType::COUNTER => metric.get_counter().get_value(),
                _ => metric.get_gauge().get_value(),
            })
    }

    /// Number of distinct label sets currently published under `name`.
    pub fn series_count(&self, name: &str) -> usize {
        self.registry
            .gather()
            .iter()
            .find(|family| family.get_name() == name)
            .map(|family| family.get_metric().len())
            .unwrap_or(0)
    }

    pub fn gather_metrics(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(prometheus_err)?;

        let res = String::from_utf8(buffer)?;

        Ok(res)
    }
}

fn prometheus_err(error: prometheus::Error) -> MetricsError {
    MetricsError::PrometheusErr(error.to_string())
}
