use std::{fmt, str::FromStr};
use thiserror::Error;

/// Versions before this one only expose the legacy `internal` event endpoints.
const FIRST_MODERN_MAJOR: u32 = 5;
const FIRST_MODERN_MINOR: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClusterVersion {
    pub major: u32,
    pub minor: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse cluster version {raw:?}")]
pub struct VersionParseError {
    pub raw: String,
}

/// API flavour the event pollers speak for a given cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `internal` API, `/event_series` listing, detail status field `status`.
    Legacy,
    /// `v1` API, `/event/latest` listing, detail status field `eventStatus`.
    Modern,
}

impl FromStr for ClusterVersion {
    type Err = VersionParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let error = || VersionParseError {
            raw: raw.to_owned(),
        };

        let mut segments = raw.trim().split('.');
        let major = segments
            .next()
            .and_then(|segment| segment.parse::<u32>().ok())
            .ok_or_else(error)?;
        let minor = segments
            .next()
            .and_then(|segment| segment.parse::<u32>().ok())
            .ok_or_else(error)?;

        Ok(ClusterVersion { major, minor })
    }
}

impl fmt::Display for ClusterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl ClusterVersion {
    pub fn dialect(&self) -> Dialect {
        if (self.major == FIRST_MODERN_MAJOR && self.minor < FIRST_MODERN_MINOR)
            || self.major < FIRST_MODERN_MAJOR
        {
            Dialect::Legacy
        } else {
            Dialect::Modern
        }
    }
}

pub fn select_dialect(raw: &str) -> Result<Dialect, VersionParseError> {
    raw.parse::<ClusterVersion>().map(|version| version.dialect())
}
