//! Reconciliation engine and pollers that turn the CDM event stream and
//! report tables into Prometheus series.

pub mod clock;
pub mod error;
pub mod events;
pub mod health;
pub mod labels;
pub mod poller;
pub mod stats;
pub mod version;

pub use clock::{Clock, SystemClock};
pub use error::CollectorError;
pub use poller::{Poller, run_poller};
pub use version::{ClusterVersion, Dialect, VersionParseError};
