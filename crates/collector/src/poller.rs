use std::time::Duration;
use tracing::{debug, error, warn};

use crate::error::CollectorError;

/// One independently scheduled collection job. `poll` is a single cycle; any
/// state carried between cycles lives in the implementor.
#[async_trait::async_trait]
pub trait Poller: Send {
    fn name(&self) -> &'static str;

    async fn poll(&mut self) -> Result<(), CollectorError>;
}

/// Runs `poller` forever with a fixed sleep between cycles. A failed cycle is
/// logged and retried at the next tick; only a fatal error ends the loop and
/// is returned.
pub async fn run_poller<P: Poller>(mut poller: P, period: Duration) -> CollectorError {
    debug!(poller = poller.name(), period_secs = period.as_secs(), "poller started");

    loop {
        match poller.poll().await {
            Ok(()) => {}
            Err(fatal) if fatal.is_fatal() => {
                error!(poller = poller.name(), error = %fatal, "poller stopped");
                return fatal;
            }
            Err(error) => {
                warn!(poller = poller.name(), error = %error, "cycle aborted");
            }
        }

        tokio::time::sleep(period).await;
    }
}
