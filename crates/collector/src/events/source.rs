use rubrik_client::{ApiVersion, CdmClient};
use std::sync::Arc;
use tracing::{debug, warn};
use url::form_urlencoded;

use super::model::{
    EventPage, EventSeries, EventSeriesSummary, EventStatus, LatestEventEntry, LegacySeriesDetail,
    LegacySeriesEntry, ModernSeriesDetail, decode,
};
use crate::{
    error::CollectorError,
    version::{Dialect, select_dialect},
};

/// Page size of `/event/latest`; the endpoint has no cursor, so one page is
/// all a cycle ever reads.
const LATEST_EVENTS_LIMIT: &str = "9999";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Backup,
    Configuration,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Backup => "Backup",
            EventType::Configuration => "Configuration",
        }
    }
}

/// Filters of a listing query. The legacy dialect only honours `event_type`
/// and `event_status`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub event_type: Option<EventType>,
    pub event_status: Option<EventStatus>,
    pub object_type: Option<String>,
    pub object_ids: Option<String>,
    pub object_name: Option<String>,
    pub before_date: Option<String>,
}

impl EventQuery {
    pub fn of_type(event_type: EventType) -> Self {
        Self {
            event_type: Some(event_type),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.event_status = Some(status);
        self
    }

    pub fn with_object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    pub fn with_object_ids(mut self, object_ids: impl Into<String>) -> Self {
        self.object_ids = Some(object_ids.into());
        self
    }

    pub fn with_object_name(mut self, object_name: impl Into<String>) -> Self {
        self.object_name = Some(object_name.into());
        self
    }

    pub fn before(mut self, before_date: impl Into<String>) -> Self {
        self.before_date = Some(before_date.into());
        self
    }

    pub fn modern_endpoint(&self) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("limit", LATEST_EVENTS_LIMIT);
        if let Some(event_type) = self.event_type {
            params.append_pair("event_type", event_type.as_str());
        }
        if let Some(status) = &self.event_status {
            params.append_pair("event_status", status.as_str());
        }
        if let Some(object_ids) = &self.object_ids {
            params.append_pair("object_ids", object_ids);
        }
        if let Some(object_type) = &self.object_type {
            params.append_pair("object_type", object_type);
        }
        if let Some(object_name) = &self.object_name {
            params.append_pair("object_name", object_name);
        }
        params.append_pair("order_by_time", "asc");
        if let Some(before_date) = &self.before_date {
            params.append_pair("before_date", before_date);
        }
        format!("/event/latest?{}", params.finish())
    }

    pub fn legacy_endpoint(&self) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        if let Some(status) = &self.event_status {
            params.append_pair("status", status.as_str());
        }
        if let Some(event_type) = self.event_type {
            params.append_pair("event_type", event_type.as_str());
        }
        format!("/event_series?{}", params.finish())
    }
}

/// One API generation's way of listing and expanding event series.
#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    fn dialect(&self) -> Dialect;

    async fn list_series(
        &self,
        query: &EventQuery,
    ) -> Result<Vec<EventSeriesSummary>, CollectorError>;

    async fn expand_series(&self, series_id: &str) -> Result<EventSeries, CollectorError>;
}

pub struct ModernEventSource {
    client: Arc<dyn CdmClient>,
}

impl ModernEventSource {
    pub fn new(client: Arc<dyn CdmClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl EventSource for ModernEventSource {
    fn dialect(&self) -> Dialect {
        Dialect::Modern
    }

    async fn list_series(
        &self,
        query: &EventQuery,
    ) -> Result<Vec<EventSeriesSummary>, CollectorError> {
        let endpoint = query.modern_endpoint();
        let payload = self.client.get(ApiVersion::V1, &endpoint).await?;
        let page: EventPage = decode(&endpoint, payload)?;
        Ok(decode_entries::<LatestEventEntry>(&endpoint, page))
    }

    async fn expand_series(&self, series_id: &str) -> Result<EventSeries, CollectorError> {
        let endpoint = format!("/event_series/{series_id}");
        let payload = self.client.get(ApiVersion::V1, &endpoint).await?;
        let detail: ModernSeriesDetail = decode(&endpoint, payload)?;
        Ok(detail.into_series(series_id))
    }
}

pub struct LegacyEventSource {
    client: Arc<dyn CdmClient>,
}

impl LegacyEventSource {
    pub fn new(client: Arc<dyn CdmClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl EventSource for LegacyEventSource {
    fn dialect(&self) -> Dialect {
        Dialect::Legacy
    }

    async fn list_series(
        &self,
        query: &EventQuery,
    ) -> Result<Vec<EventSeriesSummary>, CollectorError> {
        if query.before_date.is_some() || query.object_type.is_some() {
            debug!("legacy event_series listing ignores time window and object filters");
        }
        let endpoint = query.legacy_endpoint();
        let payload = self.client.get(ApiVersion::Internal, &endpoint).await?;
        let page: EventPage = decode(&endpoint, payload)?;
        Ok(decode_entries::<LegacySeriesEntry>(&endpoint, page))
    }

    async fn expand_series(&self, series_id: &str) -> Result<EventSeries, CollectorError> {
        let endpoint = format!("/event_series/{series_id}");
        let payload = self.client.get(ApiVersion::Internal, &endpoint).await?;
        let detail: LegacySeriesDetail = decode(&endpoint, payload)?;
        Ok(detail.into_series(series_id))
    }
}

fn decode_entries<T>(endpoint: &str, page: EventPage) -> Vec<EventSeriesSummary>
where
    T: serde::de::DeserializeOwned + Into<EventSeriesSummary>,
{
    page.data
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| match decode::<T>(endpoint, item) {
            Ok(entry) => Some(entry.into()),
            Err(error) => {
                warn!(%error, "skipping undecodable event entry");
                None
            }
        })
        .collect()
}

pub fn event_source_for(dialect: Dialect, client: Arc<dyn CdmClient>) -> Box<dyn EventSource> {
    match dialect {
        Dialect::Legacy => Box::new(LegacyEventSource::new(client)),
        Dialect::Modern => Box::new(ModernEventSource::new(client)),
    }
}

/// Asks the cluster for its version and returns the matching source. A
/// version that does not parse aborts the cycle.
pub async fn negotiate(client: &Arc<dyn CdmClient>) -> Result<Box<dyn EventSource>, CollectorError> {
    let raw_version = client.cluster_version().await?;
    let dialect = select_dialect(&raw_version)?;
    debug!(version = %raw_version, ?dialect, "selected event dialect");
    Ok(event_source_for(dialect, Arc::clone(client)))
}

/// Expands a series, downgrading a malformed payload to a skipped series.
/// Transport failures still abort the cycle.
pub async fn expand_or_skip(
    source: &dyn EventSource,
    series_id: &str,
) -> Result<Option<EventSeries>, CollectorError> {
    match source.expand_series(series_id).await {
        Ok(series) => Ok(Some(series)),
        Err(error) if error.is_series_local() => {
            warn!(series_id, %error, "skipping event series");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}
