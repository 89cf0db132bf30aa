use std::collections::HashSet;

use super::model::EventStatus;

/// Backup event names whose failures are worth a series lookup and a
/// dedicated counter. Everything else only feeds `rubrik_event_name`.
pub const SUPPORTED_BACKUP_EVENTS: [&str; 6] = [
    "Mssql.LogBackupFailed",
    "Mssql.LogBackupSucceeded",
    "Snapshot.BackupFromLocationFailed",
    "Snapshot.BackupFromLocationSucceeded",
    "Snapshot.BackupFailed",
    "Snapshot.BackupSucceeded",
];

const OUTCOME_SUFFIXES: [&str; 2] = ["Failed", "Succeeded"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    ActiveFailure,
    NotFailure,
    Ignored,
}

impl Verdict {
    pub fn is_active_failure(&self) -> bool {
        matches!(self, Verdict::ActiveFailure)
    }
}

pub fn classify(status: &EventStatus) -> Verdict {
    match status {
        EventStatus::Success => Verdict::NotFailure,
        EventStatus::Failure | EventStatus::Canceled | EventStatus::Canceling => {
            Verdict::ActiveFailure
        }
        // In flight, not a failure yet.
        EventStatus::Running | EventStatus::Queued => Verdict::NotFailure,
        EventStatus::TaskSuccess | EventStatus::Info | EventStatus::Warning => Verdict::NotFailure,
        EventStatus::Unknown(_) => Verdict::Ignored,
    }
}

/// Family key of an event name: `Mssql.LogBackupFailed` and
/// `Mssql.LogBackupSucceeded` both become `Mssql.LogBackup`.
pub fn normalize_event_name(name: &str) -> String {
    let mut family = name.to_owned();
    loop {
        let stripped = OUTCOME_SUFFIXES
            .iter()
            .fold(family.clone(), |acc, suffix| acc.replace(suffix, ""));
        if stripped == family {
            return family;
        }
        family = stripped;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedEvents {
    names: HashSet<String>,
}

impl Default for SupportedEvents {
    fn default() -> Self {
        Self::new(SUPPORTED_BACKUP_EVENTS)
    }
}

impl SupportedEvents {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Matches the raw event name, before normalization.
    pub fn contains(&self, event_name: &str) -> bool {
        self.names.contains(event_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_covers_every_known_status() {
        let cases = [
            (EventStatus::Success, Verdict::NotFailure),
            (EventStatus::Failure, Verdict::ActiveFailure),
            (EventStatus::Canceled, Verdict::ActiveFailure),
            (EventStatus::Canceling, Verdict::ActiveFailure),
            (EventStatus::Running, Verdict::NotFailure),
            (EventStatus::Queued, Verdict::NotFailure),
            (EventStatus::TaskSuccess, Verdict::NotFailure),
            (EventStatus::Info, Verdict::NotFailure),
            (EventStatus::Warning, Verdict::NotFailure),
        ];

        for (status, verdict) in cases {
            assert_eq!(classify(&status), verdict, "{status}");
        }
    }

    #[test]
    fn unrecognized_statuses_are_ignored() {
        for raw in ["Throttled", "", "failure", "null"] {
            assert_eq!(classify(&EventStatus::from(raw)), Verdict::Ignored);
        }
    }

    #[test]
    fn failure_and_success_variants_share_a_family() {
        assert_eq!(
            normalize_event_name("Mssql.LogBackupFailed"),
            normalize_event_name("Mssql.LogBackupSucceeded")
        );
        assert_eq!(normalize_event_name("Snapshot.BackupFailed"), "Snapshot.Backup");
        assert_eq!(
            normalize_event_name("Snapshot.BackupFromLocationSucceeded"),
            "Snapshot.BackupFromLocation"
        );
        assert_eq!(normalize_event_name("Cluster.NodeDown"), "Cluster.NodeDown");
    }

    #[test]
    fn normalization_is_idempotent() {
        for name in [
            "Mssql.LogBackupFailed",
            "Snapshot.BackupSucceeded",
            "FaiFailedled",
            "SucSucceededceeded.Failed",
            "",
        ] {
            let once = normalize_event_name(name);
            assert_eq!(normalize_event_name(&once), once, "{name:?}");
        }
    }

    #[test]
    fn allow_list_matches_raw_names_only() {
        let supported = SupportedEvents::default();
        assert!(supported.contains("Snapshot.BackupFailed"));
        assert!(supported.contains("Mssql.LogBackupSucceeded"));
        assert!(!supported.contains("Snapshot.Backup"));
        assert!(!supported.contains("Vmware.DiskConsolidationFailed"));
    }
}
