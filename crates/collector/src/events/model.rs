use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

use crate::error::CollectorError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventStatus {
    Success,
    Failure,
    Canceled,
    Canceling,
    Running,
    Queued,
    TaskSuccess,
    Info,
    Warning,
    Unknown(String),
}

impl EventStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EventStatus::Success => "Success",
            EventStatus::Failure => "Failure",
            EventStatus::Canceled => "Canceled",
            EventStatus::Canceling => "Canceling",
            EventStatus::Running => "Running",
            EventStatus::Queued => "Queued",
            EventStatus::TaskSuccess => "TaskSuccess",
            EventStatus::Info => "Info",
            EventStatus::Warning => "Warning",
            EventStatus::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for EventStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "Success" => EventStatus::Success,
            "Failure" => EventStatus::Failure,
            "Canceled" => EventStatus::Canceled,
            "Canceling" => EventStatus::Canceling,
            "Running" => EventStatus::Running,
            "Queued" => EventStatus::Queued,
            "TaskSuccess" => EventStatus::TaskSuccess,
            "Info" => EventStatus::Info,
            "Warning" => EventStatus::Warning,
            other => EventStatus::Unknown(other.to_owned()),
        }
    }
}

impl From<String> for EventStatus {
    fn from(raw: String) -> Self {
        EventStatus::from(raw.as_str())
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest state of one event series as returned by a listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSeriesSummary {
    pub series_id: String,
    pub object_name: Option<String>,
    pub object_id: Option<String>,
    pub object_type: Option<String>,
    pub location: Option<String>,
    pub latest_status: EventStatus,
    pub latest_event_name: Option<String>,
    /// Raw API date, published verbatim as the `eventDate` label.
    pub latest_time: Option<String>,
    pub severity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetail {
    pub status: EventStatus,
    pub time: Option<String>,
}

/// Full transition history of a series, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSeries {
    pub id: String,
    pub object_name: Option<String>,
    pub object_id: Option<String>,
    pub object_type: Option<String>,
    pub location: Option<String>,
    pub severity: Option<String>,
    pub details: Vec<EventDetail>,
}

impl EventSeries {
    pub fn has_failed_event(&self) -> bool {
        self.details
            .iter()
            .any(|detail| detail.status == EventStatus::Failure)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(endpoint: &str, payload: Value) -> Result<T, CollectorError> {
    serde_json::from_value(payload).map_err(|source| CollectorError::UnexpectedShape {
        endpoint: endpoint.to_owned(),
        source,
    })
}

/// Listing envelope shared by both dialects. Items are decoded one by one so a
/// single malformed entry does not sink the whole page.
#[derive(Debug, Deserialize)]
pub(crate) struct EventPage {
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LatestEventEntry {
    pub latest_event: LatestEvent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LatestEvent {
    pub event_series_id: String,
    #[serde(default)]
    pub event_status: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub event_severity: Option<String>,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

impl From<LatestEventEntry> for EventSeriesSummary {
    fn from(entry: LatestEventEntry) -> Self {
        let event = entry.latest_event;
        EventSeriesSummary {
            series_id: event.event_series_id,
            object_name: event.object_name,
            object_id: event.object_id,
            object_type: event.object_type,
            location: event.location,
            latest_status: status_or_unknown(event.event_status),
            latest_event_name: event.event_name,
            latest_time: event.time,
            severity: event.event_severity,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacySeriesEntry {
    pub event_series_id: String,
    #[serde(default)]
    pub object_info: Option<LegacyObjectInfo>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyObjectInfo {
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub object_id: Option<String>,
}

impl From<LegacySeriesEntry> for EventSeriesSummary {
    fn from(entry: LegacySeriesEntry) -> Self {
        let object_info = entry.object_info.unwrap_or_default();
        EventSeriesSummary {
            series_id: entry.event_series_id,
            object_name: object_info.object_name,
            object_id: object_info.object_id,
            object_type: entry.object_type,
            location: entry.location,
            latest_status: status_or_unknown(entry.status),
            latest_event_name: entry.event_name,
            // Backup series report `eventDate`, configuration series `time`.
            latest_time: entry.event_date.or(entry.time),
            severity: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModernSeriesDetail {
    pub event_detail_list: Vec<ModernDetail>,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub event_severity: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModernDetail {
    #[serde(default)]
    pub event_status: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacySeriesDetail {
    pub event_detail_list: Vec<LegacyDetail>,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub event_severity: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyDetail {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

impl ModernSeriesDetail {
    pub fn into_series(self, id: &str) -> EventSeries {
        EventSeries {
            id: id.to_owned(),
            object_name: self.object_name,
            object_id: self.object_id,
            object_type: self.object_type,
            location: self.location,
            severity: self.event_severity,
            details: self
                .event_detail_list
                .into_iter()
                .map(|detail| EventDetail {
                    status: status_or_unknown(detail.event_status),
                    time: detail.time,
                })
                .collect(),
        }
    }
}

impl LegacySeriesDetail {
    pub fn into_series(self, id: &str) -> EventSeries {
        EventSeries {
            id: id.to_owned(),
            object_name: self.object_name,
            object_id: self.object_id,
            object_type: self.object_type,
            location: self.location,
            severity: self.event_severity,
            details: self
                .event_detail_list
                .into_iter()
                .map(|detail| EventDetail {
                    status: status_or_unknown(detail.status),
                    time: detail.time,
                })
                .collect(),
        }
    }
}

fn status_or_unknown(raw: Option<String>) -> EventStatus {
    raw.map(EventStatus::from)
        .unwrap_or_else(|| EventStatus::Unknown(crate::labels::NULL_LABEL.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_strings_round_trip_through_the_enum() {
        assert_eq!(EventStatus::from("Canceling"), EventStatus::Canceling);
        assert_eq!(EventStatus::from("TaskSuccess").as_str(), "TaskSuccess");

        let unknown = EventStatus::from("Throttled");
        assert_eq!(unknown, EventStatus::Unknown("Throttled".to_owned()));
        assert_eq!(unknown.as_str(), "Throttled");
    }

    #[test]
    fn latest_event_without_object_fields_still_decodes() {
        let entry = decode::<LatestEventEntry>(
            "/event/latest",
            json!({
                "latestEvent": {
                    "eventSeriesId": "series-1",
                    "eventStatus": "Failure",
                    "eventName": "Snapshot.BackupFailed",
                    "time": "2024-03-01T10:00:00.000Z"
                }
            }),
        );
        assert!(entry.is_ok());
        let Ok(entry) = entry else { return };

        let summary = EventSeriesSummary::from(entry);
        assert_eq!(summary.series_id, "series-1");
        assert_eq!(summary.latest_status, EventStatus::Failure);
        assert_eq!(summary.object_type, None);
        assert_eq!(summary.location, None);
    }

    #[test]
    fn legacy_entry_reads_object_info_and_event_date() {
        let entry = decode::<LegacySeriesEntry>(
            "/event_series",
            json!({
                "eventSeriesId": "legacy-1",
                "status": "Failure",
                "location": "local",
                "eventDate": "2019-05-06T20:11:12.000Z",
                "objectInfo": { "objectName": "fileserver", "objectId": "Fileset:::7" }
            }),
        );
        let Ok(entry) = entry else {
            assert!(entry.is_ok());
            return;
        };

        let summary = EventSeriesSummary::from(entry);
        assert_eq!(summary.object_name.as_deref(), Some("fileserver"));
        assert_eq!(summary.object_id.as_deref(), Some("Fileset:::7"));
        assert_eq!(summary.latest_time.as_deref(), Some("2019-05-06T20:11:12.000Z"));
    }

    #[test]
    fn series_without_detail_list_is_an_unexpected_shape() {
        let result = decode::<ModernSeriesDetail>("/event_series/abc", json!({ "objectName": "vm" }));
        assert!(matches!(result, Err(CollectorError::UnexpectedShape { .. })));
    }

    #[test]
    fn series_reports_an_earlier_failure_behind_a_running_tail() {
        let detail = decode::<ModernSeriesDetail>(
            "/event_series/abc",
            json!({
                "eventDetailList": [
                    { "eventStatus": "Queued" },
                    { "eventStatus": "Failure" },
                    { "eventStatus": "Running" }
                ]
            }),
        );
        let Ok(detail) = detail else {
            assert!(detail.is_ok());
            return;
        };

        let series = detail.into_series("abc");
        assert!(series.has_failed_event());
        assert_eq!(series.details.len(), 3);
    }
}
