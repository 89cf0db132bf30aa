use tracing::debug;

use super::{
    classify::normalize_event_name,
    model::{EventSeriesSummary, EventStatus},
    source::{EventQuery, EventSource, EventType},
};
use crate::{clock::parse_timestamp, error::CollectorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No later success was found; the failure is still current.
    Active,
    Resolved,
}

impl Resolution {
    pub fn is_active(&self) -> bool {
        matches!(self, Resolution::Active)
    }
}

/// Object and event a failure was recorded against.
#[derive(Debug, Clone, Copy)]
pub struct FailureRecord<'a> {
    pub object_id: Option<&'a str>,
    pub object_type: Option<&'a str>,
    pub object_name: Option<&'a str>,
    pub event_name: Option<&'a str>,
    pub time: Option<&'a str>,
}

/// Decides whether a failure has been superseded by a success of the same
/// event family on the same object.
#[derive(Debug, Clone)]
pub struct SuccessSuppressionResolver {
    event_type: EventType,
}

impl Default for SuccessSuppressionResolver {
    fn default() -> Self {
        Self::new(EventType::Backup)
    }
}

impl SuccessSuppressionResolver {
    pub fn new(event_type: EventType) -> Self {
        Self { event_type }
    }

    pub fn success_query(&self, failure: &FailureRecord<'_>) -> Option<EventQuery> {
        // Without an object id any success on the cluster would match.
        let object_id = failure.object_id?;

        let mut query = EventQuery::of_type(self.event_type)
            .with_status(EventStatus::Success)
            .with_object_ids(object_id);
        if let Some(object_type) = failure.object_type {
            query = query.with_object_type(object_type);
        }
        if let Some(object_name) = failure.object_name {
            query = query.with_object_name(object_name);
        }
        if let Some(time) = failure.time {
            query = query.before(time);
        }
        Some(query)
    }

    pub async fn resolve(
        &self,
        source: &dyn EventSource,
        failure: &FailureRecord<'_>,
    ) -> Result<Resolution, CollectorError> {
        let Some(query) = self.success_query(failure) else {
            return Ok(Resolution::Active);
        };

        let candidates = source.list_series(&query).await?;
        let superseded = candidates
            .iter()
            .any(|candidate| supersedes(candidate, failure));

        if superseded {
            debug!(object_id = failure.object_id, "failure superseded by a later success");
            Ok(Resolution::Resolved)
        } else {
            Ok(Resolution::Active)
        }
    }
}

/// A candidate supersedes the failure when it is a success of the same event
/// family that happened after it. Timestamps that do not parse are not used
/// to reject a candidate.
pub fn supersedes(candidate: &EventSeriesSummary, failure: &FailureRecord<'_>) -> bool {
    if candidate.latest_status != EventStatus::Success {
        return false;
    }

    let same_family = match (failure.event_name, candidate.latest_event_name.as_deref()) {
        (Some(failed), Some(succeeded)) => {
            normalize_event_name(failed) == normalize_event_name(succeeded)
        }
        (None, _) => true,
        (Some(_), None) => false,
    };
    if !same_family {
        return false;
    }

    match (
        failure.time.and_then(parse_timestamp),
        candidate.latest_time.as_deref().and_then(parse_timestamp),
    ) {
        (Some(failed_at), Some(succeeded_at)) => succeeded_at > failed_at,
        _ => true,
    }
}
