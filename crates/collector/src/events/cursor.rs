use chrono::{DateTime, Utc};

use crate::clock::lookback;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    Bootstrapping,
    SteadyState,
}

/// Time boundary already covered by an incremental poller. Owned by exactly
/// one poller and only moved forward after a fully successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowCursor {
    last_collection_time: Option<DateTime<Utc>>,
    first_run: bool,
}

impl Default for WindowCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowCursor {
    pub fn new() -> Self {
        Self {
            last_collection_time: None,
            first_run: true,
        }
    }

    pub fn last_collection_time(&self) -> Option<DateTime<Utc>> {
        self.last_collection_time
    }

    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    pub fn phase(&self) -> CursorPhase {
        if self.first_run {
            CursorPhase::Bootstrapping
        } else {
            CursorPhase::SteadyState
        }
    }

    /// Start of the window to query. The first call pins the boundary one
    /// lookback period before `now`; retries after a failed first cycle reuse
    /// that same boundary.
    pub fn window_start(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        *self
            .last_collection_time
            .get_or_insert_with(|| now - lookback())
    }

    /// Records that every event before `covered_until` has been processed.
    /// `covered_until` must be the instant captured before the cycle's query.
    pub fn advance(&mut self, covered_until: DateTime<Utc>) {
        self.last_collection_time = Some(covered_until);
        self.first_run = false;
    }
}
