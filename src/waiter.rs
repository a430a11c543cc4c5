//! Polling for elements that render some time after the action that
//! produced them.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{PurgeError, Result};
use crate::host::{Descriptor, ElementHandle, Page};

/// Poll `page` every `poll_interval` until an element matching `descriptor`
/// shows up or `timeout` has elapsed.
///
/// Purely time-driven: there is no attempt limit. A lookup that errors is
/// not retried.
pub async fn wait_for_element<P: Page + ?Sized>(
    page: &P,
    descriptor: &Descriptor,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<ElementHandle> {
    let start = Instant::now();

    loop {
        match page.lookup_element(descriptor).await {
            Ok(Some(element)) => {
                info!(
                    selector = %descriptor,
                    waited_ms = start.elapsed().as_millis() as u64,
                    "Element found"
                );
                return Ok(element);
            }
            Ok(None) => {}
            Err(e) => {
                error!(selector = %descriptor, error = %e, "Error while waiting for element");
                return Err(e.into());
            }
        }

        if start.elapsed() >= timeout {
            warn!(
                selector = %descriptor,
                timeout_ms = timeout.as_millis() as u64,
                "Element not found within timeout"
            );
            return Err(PurgeError::NotFound {
                descriptor: descriptor.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Give the page time to finish reacting to the last action.
///
/// With a busy indicator the wait ends as soon as the indicator is gone,
/// capped at `budget`. Without one it is a flat `budget` wait.
pub async fn settle<P: Page + ?Sized>(
    page: &P,
    budget: Duration,
    busy_indicator: Option<&Descriptor>,
    poll_interval: Duration,
) {
    let Some(indicator) = busy_indicator else {
        tokio::time::sleep(budget).await;
        return;
    };

    let start = Instant::now();
    loop {
        match page.lookup_element(indicator).await {
            Ok(None) => {
                debug!(
                    selector = %indicator,
                    waited_ms = start.elapsed().as_millis() as u64,
                    "Page settled"
                );
                return;
            }
            Ok(Some(_)) => {}
            Err(e) => {
                // Can't tell whether the page is busy; use the whole budget.
                warn!(selector = %indicator, error = %e, "Busy indicator lookup failed");
                let remaining = budget.saturating_sub(start.elapsed());
                tokio::time::sleep(remaining).await;
                return;
            }
        }

        if start.elapsed() >= budget {
            debug!(selector = %indicator, "Settle budget used up, continuing");
            return;
        }
        tokio::time::sleep(poll_interval).await;
    }
}
