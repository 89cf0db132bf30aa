mod config;

use config::AppConfig;
use eyre::WrapErr;
use rubrik_client::{CdmClient, HttpCdmClient};
use rubrik_collector::{
    Clock, CollectorError, SystemClock,
    events::{BackupStatusCounter, ClusterEventCounter, FailedBackupJobs, FailedConfigurationJobs},
    health::HealthCheck,
    run_poller,
    stats::{CapacityReports, ClusterInfoPoller, fetch_cluster_details},
};
use rubrik_metrics::{ExporterMetrics, api::start_prometheus_metrics_api};
use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

const AUTHENTICATION_EXIT_CODE: i32 = 127;

const HEALTH_CHECK_PERIOD: Duration = Duration::from_secs(60);
const CLUSTER_INFO_PERIOD: Duration = Duration::from_secs(60);
const BACKUP_STATUS_PERIOD: Duration = Duration::from_secs(60);
const CONFIGURATION_JOBS_PERIOD: Duration = Duration::from_secs(5 * 60);
const CLUSTER_EVENTS_PERIOD: Duration = Duration::from_secs(5 * 60);
const FAILED_BACKUP_JOBS_PERIOD: Duration = Duration::from_secs(5 * 60);
const CAPACITY_PERIOD: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() {
    let log_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    if let Err(error) = run().await {
        error!(error = %error, "rubrik-exporter stopped");
        let authentication_failed = error
            .downcast_ref::<CollectorError>()
            .is_some_and(CollectorError::is_fatal);
        std::process::exit(if authentication_failed {
            AUTHENTICATION_EXIT_CODE
        } else {
            1
        });
    }
}

async fn run() -> eyre::Result<()> {
    let config = AppConfig::from_env()?;

    let client: Arc<dyn CdmClient> = Arc::new(
        HttpCdmClient::new(
            &config.node_ip,
            config.credentials.clone(),
            config.request_timeout,
            config.accept_invalid_certs,
        )
        .wrap_err("failed to build CDM http client")?,
    );

    // Rejected credentials surface here as a fatal error before anything is served.
    let version = HealthCheck::new(Arc::clone(&client)).check().await?;
    let cluster = fetch_cluster_details(client.as_ref()).await?;
    info!(cluster = %cluster.name, %version, node = %config.node_ip, "connected to cluster");

    let metrics = Arc::new(ExporterMetrics::new(cluster.name)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let mut pollers = JoinSet::new();
    pollers.spawn(run_poller(HealthCheck::new(Arc::clone(&client)), HEALTH_CHECK_PERIOD));
    pollers.spawn(run_poller(
        ClusterInfoPoller::new(Arc::clone(&client), Arc::clone(&metrics)),
        CLUSTER_INFO_PERIOD,
    ));
    pollers.spawn(run_poller(
        BackupStatusCounter::new(Arc::clone(&client), Arc::clone(&metrics), Arc::clone(&clock)),
        BACKUP_STATUS_PERIOD,
    ));
    pollers.spawn(run_poller(
        FailedConfigurationJobs::new(Arc::clone(&client), Arc::clone(&metrics), Arc::clone(&clock)),
        CONFIGURATION_JOBS_PERIOD,
    ));
    pollers.spawn(run_poller(
        ClusterEventCounter::new(Arc::clone(&client), Arc::clone(&metrics), Arc::clone(&clock)),
        CLUSTER_EVENTS_PERIOD,
    ));
    pollers.spawn(run_poller(
        FailedBackupJobs::new(Arc::clone(&client), Arc::clone(&metrics), Arc::clone(&clock)),
        FAILED_BACKUP_JOBS_PERIOD,
    ));
    pollers.spawn(run_poller(
        CapacityReports::new(Arc::clone(&client), Arc::clone(&metrics)),
        CAPACITY_PERIOD,
    ));

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let server = start_prometheus_metrics_api(addr, metrics);

    tokio::select! {
        served = server => {
            served.wrap_err("metrics server failed")?;
            info!("shutting down");
            Ok(())
        }
        Some(stopped) = pollers.join_next() => {
            let fatal = stopped.wrap_err("poller task panicked")?;
            Err(fatal.into())
        }
    }
}
