use rubrik_client::{ApiVersion, CdmClient};
use rubrik_metrics::{ClusterInfo, ExporterMetrics};
use serde::Deserialize;
use std::sync::Arc;

use crate::{error::CollectorError, events::model::decode, labels::or_null, poller::Poller};

const CLUSTER_ENDPOINT: &str = "/cluster/me";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub timezone: Option<ClusterTimezone>,
    #[serde(default)]
    pub geolocation: Option<ClusterGeolocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClusterTimezone {
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClusterGeolocation {
    #[serde(default)]
    pub address: Option<String>,
}

pub async fn fetch_cluster_details(client: &dyn CdmClient) -> Result<ClusterDetails, CollectorError> {
    let payload = client.get(ApiVersion::V1, CLUSTER_ENDPOINT).await?;
    decode(CLUSTER_ENDPOINT, payload)
}

/// Publishes `rubrik_cluster_info`.
pub struct ClusterInfoPoller {
    client: Arc<dyn CdmClient>,
    metrics: Arc<ExporterMetrics>,
}

impl ClusterInfoPoller {
    pub fn new(client: Arc<dyn CdmClient>, metrics: Arc<ExporterMetrics>) -> Self {
        Self { client, metrics }
    }

    pub async fn tick(&self) -> Result<ClusterDetails, CollectorError> {
        let details = fetch_cluster_details(self.client.as_ref()).await?;
        self.metrics.set_cluster_info(ClusterInfo {
            id: &details.id,
            version: or_null(details.version.as_deref()),
            api_version: or_null(details.api_version.as_deref()),
            timezone: or_null(
                details
                    .timezone
                    .as_ref()
                    .and_then(|timezone| timezone.timezone.as_deref()),
            ),
            location: or_null(
                details
                    .geolocation
                    .as_ref()
                    .and_then(|geolocation| geolocation.address.as_deref()),
            ),
        })?;
        Ok(details)
    }
}

#[async_trait::async_trait]
impl Poller for ClusterInfoPoller {
    fn name(&self) -> &'static str {
        "cluster_info"
    }

    async fn poll(&mut self) -> Result<(), CollectorError> {
        self.tick().await.map(|_| ())
    }
}
