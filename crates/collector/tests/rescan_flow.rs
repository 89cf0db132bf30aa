mod common;

use common::{FakeCluster, ManualClock, Reply, latest_event, noon, page, series};
use rubrik_client::ApiVersion;
use rubrik_collector::events::{FailedBackupJobs, FailedConfigurationJobs};
use rubrik_metrics::ExporterMetrics;
use serde_json::json;
use std::sync::Arc;

fn web01_failure(cluster: &FakeCluster) {
    cluster.route(
        ApiVersion::V1,
        "event_status=Failure",
        page(vec![latest_event(
            "s1",
            "Failure",
            "Snapshot.BackupFailed",
            "VmwareVirtualMachine",
            "web01",
        )]),
    );
    cluster.route(ApiVersion::V1, "/event_series/s1", series(&["Failure"], "local"));
}

fn success_at(time: &str) -> Reply {
    page(vec![json!({
        "latestEvent": {
            "eventSeriesId": "s9",
            "eventStatus": "Success",
            "eventName": "Snapshot.BackupSucceeded",
            "objectId": "VmwareVirtualMachine:::web01",
            "objectType": "VmwareVirtualMachine",
            "objectName": "web01",
            "time": time
        }
    })])
}

fn active_state(metrics: &ExporterMetrics) -> Option<f64> {
    metrics.sample(
        "rubrik_failed_backup_job_active",
        &[
            ("objectName", "web01"),
            ("objectID", "VmwareVirtualMachine:::web01"),
        ],
    )
}

#[tokio::test]
async fn historical_record_is_stable_across_rescans() {
    let cluster = Arc::new(FakeCluster::with_version("5.3.0"));
    web01_failure(&cluster);
    cluster.route(ApiVersion::V1, "event_status=Success", page(Vec::new()));
    let Ok(metrics) = ExporterMetrics::new("lab") else {
        return;
    };
    let metrics = Arc::new(metrics);
    let rescan = FailedBackupJobs::new(
        cluster.clone(),
        metrics.clone(),
        Arc::new(ManualClock::at(noon())),
    );

    assert!(rescan.tick().await.is_ok());
    assert!(rescan.tick().await.is_ok());

    assert_eq!(metrics.series_count("rubrik_failed_backup_job"), 1);
    let record = metrics.sample(
        "rubrik_failed_backup_job",
        &[
            ("eventSeriesID", "s1"),
            ("eventDate", "2024-03-01T10:00:00.000Z"),
            ("eventSeverity", "Critical"),
            ("location", "local"),
        ],
    );
    assert_eq!(record, Some(1.0));
}

#[tokio::test]
async fn failure_without_later_success_stays_active() {
    let cluster = Arc::new(FakeCluster::with_version("5.3.0"));
    web01_failure(&cluster);
    cluster.route(ApiVersion::V1, "event_status=Success", page(Vec::new()));
    let Ok(metrics) = ExporterMetrics::new("lab") else {
        return;
    };
    let metrics = Arc::new(metrics);
    let rescan = FailedBackupJobs::new(
        cluster.clone(),
        metrics.clone(),
        Arc::new(ManualClock::at(noon())),
    );

    let report = rescan.tick().await;
    let Ok(report) = report else {
        assert!(report.is_ok());
        return;
    };

    assert_eq!(report.failures, 1);
    assert_eq!(report.still_active, 1);
    assert_eq!(active_state(&metrics), Some(1.0));

    let lookups = cluster.calls_to("event_status=Success");
    assert_eq!(lookups.len(), 1);
    assert!(
        lookups
            .iter()
            .all(|lookup| lookup.contains("before_date=2024-03-01T10%3A00%3A00.000Z"))
    );
}

#[tokio::test]
async fn later_success_of_the_same_family_resolves_the_failure() {
    let cluster = Arc::new(FakeCluster::with_version("5.3.0"));
    web01_failure(&cluster);
    cluster.route(
        ApiVersion::V1,
        "event_status=Success",
        success_at("2024-03-01T11:00:00.000Z"),
    );
    let Ok(metrics) = ExporterMetrics::new("lab") else {
        return;
    };
    let metrics = Arc::new(metrics);
    let rescan = FailedBackupJobs::new(
        cluster.clone(),
        metrics.clone(),
        Arc::new(ManualClock::at(noon())),
    );

    assert!(rescan.tick().await.is_ok());
    assert_eq!(active_state(&metrics), Some(0.0));
    assert_eq!(
        metrics.sample("rubrik_failed_backup_job", &[("eventSeriesID", "s1")]),
        Some(1.0)
    );

    // A new failure after the success flips the same series back to active.
    cluster.replace(
        ApiVersion::V1,
        "event_status=Success",
        success_at("2024-03-01T09:00:00.000Z"),
    );
    assert!(rescan.tick().await.is_ok());
    assert_eq!(active_state(&metrics), Some(1.0));
    assert_eq!(metrics.series_count("rubrik_failed_backup_job_active"), 1);
}

#[tokio::test]
async fn recovered_series_is_not_reported() {
    let cluster = Arc::new(FakeCluster::with_version("5.3.0"));
    cluster.route(
        ApiVersion::V1,
        "event_status=Failure",
        page(vec![latest_event(
            "s4",
            "Failure",
            "Snapshot.BackupFailed",
            "VmwareVirtualMachine",
            "db01",
        )]),
    );
    cluster.route(
        ApiVersion::V1,
        "/event_series/s4",
        series(&["Queued", "Running", "Success"], "local"),
    );
    let Ok(metrics) = ExporterMetrics::new("lab") else {
        return;
    };
    let metrics = Arc::new(metrics);
    let rescan = FailedBackupJobs::new(
        cluster.clone(),
        metrics.clone(),
        Arc::new(ManualClock::at(noon())),
    );

    let report = rescan.tick().await;
    assert_eq!(report.ok().map(|report| report.failures), Some(0));
    assert_eq!(metrics.series_count("rubrik_failed_backup_job"), 0);
}

#[tokio::test]
async fn malformed_series_detail_skips_only_that_series() {
    let cluster = Arc::new(FakeCluster::with_version("5.3.0"));
    cluster.route(
        ApiVersion::V1,
        "event_status=Failure",
        page(vec![
            latest_event("bad", "Failure", "Snapshot.BackupFailed", "VmwareVirtualMachine", "vm-a"),
            latest_event("s1", "Failure", "Snapshot.BackupFailed", "VmwareVirtualMachine", "web01"),
        ]),
    );
    cluster.route(
        ApiVersion::V1,
        "/event_series/bad",
        Reply::Json(json!({ "objectName": "vm-a" })),
    );
    cluster.route(ApiVersion::V1, "/event_series/s1", series(&["Failure"], "local"));
    cluster.route(ApiVersion::V1, "event_status=Success", page(Vec::new()));
    let Ok(metrics) = ExporterMetrics::new("lab") else {
        return;
    };
    let metrics = Arc::new(metrics);
    let rescan = FailedBackupJobs::new(
        cluster.clone(),
        metrics.clone(),
        Arc::new(ManualClock::at(noon())),
    );

    let report = rescan.tick().await;
    let Ok(report) = report else {
        assert!(report.is_ok());
        return;
    };
    assert_eq!(report.listed, 2);
    assert_eq!(report.failures, 1);
    assert_eq!(metrics.series_count("rubrik_failed_backup_job"), 1);
}

#[tokio::test]
async fn legacy_configuration_failures_use_the_internal_api() {
    let cluster = Arc::new(FakeCluster::with_version("4.2.3"));
    cluster.route(
        ApiVersion::Internal,
        "/event_series?",
        page(vec![json!({
            "eventSeriesId": "c1",
            "status": "Failure",
            "eventName": "Configuration.SlaUpdateFailed",
            "objectType": "SlaDomain",
            "time": "2019-05-06T20:11:12.000Z",
            "objectInfo": { "objectName": "Gold", "objectId": "SlaDomain:::1" }
        })]),
    );
    cluster.route(
        ApiVersion::Internal,
        "/event_series/c1",
        Reply::Json(json!({
            "eventSeverity": "Warning",
            "eventDetailList": [ { "status": "Running" }, { "status": "Failure" } ]
        })),
    );
    let Ok(metrics) = ExporterMetrics::new("lab") else {
        return;
    };
    let metrics = Arc::new(metrics);
    let rescan = FailedConfigurationJobs::new(
        cluster.clone(),
        metrics.clone(),
        Arc::new(ManualClock::at(noon())),
    );

    assert!(rescan.tick().await.is_ok());
    let record = metrics.sample(
        "rubrik_failed_configuration_job",
        &[
            ("objectName", "Gold"),
            ("objectID", "SlaDomain:::1"),
            ("objectType", "SlaDomain"),
            ("eventSeverity", "Warning"),
            ("eventDate", "2019-05-06T20:11:12.000Z"),
        ],
    );
    assert_eq!(record, Some(1.0));
    assert_eq!(
        cluster.calls_to("/event_series?"),
        vec!["/event_series?status=Failure&event_type=Configuration".to_owned()]
    );
    assert!(cluster.calls_to("/event/latest").is_empty());
}

#[tokio::test]
async fn legacy_backup_rescan_publishes_no_active_state() {
    let cluster = Arc::new(FakeCluster::with_version("5.0.4"));
    cluster.route(
        ApiVersion::Internal,
        "/event_series?",
        page(vec![json!({
            "eventSeriesId": "b1",
            "status": "Failure",
            "eventName": "Snapshot.BackupFailed",
            "objectType": "LinuxFileset",
            "eventDate": "2019-05-06T20:11:12.000Z",
            "objectInfo": { "objectName": "fileserver", "objectId": "Fileset:::7" }
        })]),
    );
    cluster.route(
        ApiVersion::Internal,
        "/event_series/b1",
        Reply::Json(json!({ "eventDetailList": [ { "status": "Failure" } ] })),
    );
    let Ok(metrics) = ExporterMetrics::new("lab") else {
        return;
    };
    let metrics = Arc::new(metrics);
    let rescan = FailedBackupJobs::new(
        cluster.clone(),
        metrics.clone(),
        Arc::new(ManualClock::at(noon())),
    );

    assert!(rescan.tick().await.is_ok());
    assert_eq!(metrics.series_count("rubrik_failed_backup_job"), 1);
    assert_eq!(metrics.series_count("rubrik_failed_backup_job_active"), 0);
}

#[tokio::test]
async fn objects_leaving_the_lookback_drop_their_active_state() {
    let cluster = Arc::new(FakeCluster::with_version("5.3.0"));
    web01_failure(&cluster);
    cluster.route(ApiVersion::V1, "event_status=Success", page(Vec::new()));
    let Ok(metrics) = ExporterMetrics::new("lab") else {
        return;
    };
    let metrics = Arc::new(metrics);
    let rescan = FailedBackupJobs::new(
        cluster.clone(),
        metrics.clone(),
        Arc::new(ManualClock::at(noon())),
    );

    assert!(rescan.tick().await.is_ok());
    assert_eq!(active_state(&metrics), Some(1.0));

    cluster.replace(ApiVersion::V1, "event_status=Failure", page(Vec::new()));
    assert!(rescan.tick().await.is_ok());
    assert_eq!(metrics.series_count("rubrik_failed_backup_job_active"), 0);
    assert_eq!(metrics.series_count("rubrik_failed_backup_job"), 1);
}

#[tokio::test]
async fn failed_rescan_keeps_the_previous_active_state() {
    let cluster = Arc::new(FakeCluster::with_version("5.3.0"));
    web01_failure(&cluster);
    cluster.route(ApiVersion::V1, "event_status=Success", page(Vec::new()));
    let Ok(metrics) = ExporterMetrics::new("lab") else {
        return;
    };
    let metrics = Arc::new(metrics);
    let rescan = FailedBackupJobs::new(
        cluster.clone(),
        metrics.clone(),
        Arc::new(ManualClock::at(noon())),
    );

    assert!(rescan.tick().await.is_ok());
    cluster.replace(ApiVersion::V1, "event_status=Success", Reply::Status(503));
    assert!(rescan.tick().await.is_err());
    assert_eq!(active_state(&metrics), Some(1.0));
}
