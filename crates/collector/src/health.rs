use rubrik_client::CdmClient;
use std::sync::Arc;
use tracing::debug;

use crate::{error::CollectorError, poller::Poller};

/// Probes the cluster with the configured credentials. Rejected credentials
/// are fatal; any other failure is reported and retried next cycle.
pub struct HealthCheck {
    client: Arc<dyn CdmClient>,
}

impl HealthCheck {
    pub fn new(client: Arc<dyn CdmClient>) -> Self {
        Self { client }
    }

    pub async fn check(&self) -> Result<String, CollectorError> {
        match self.client.cluster_version().await {
            Ok(version) => Ok(version),
            Err(error) if error.is_unauthorized() => Err(CollectorError::AuthenticationFailed),
            Err(error) => Err(CollectorError::Transport(error)),
        }
    }
}

#[async_trait::async_trait]
impl Poller for HealthCheck {
    fn name(&self) -> &'static str {
        "health_check"
    }

    async fn poll(&mut self) -> Result<(), CollectorError> {
        let version = self.check().await?;
        debug!(%version, "cluster reachable");
        Ok(())
    }
}
