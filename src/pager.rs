use tracing::{error, info};

use crate::config::RunConfiguration;
use crate::host::Page;
use crate::waiter::{settle, wait_for_element};

/// Moves the calendar view forward one page.
pub struct Pager<'a, P: Page + ?Sized> {
    page: &'a P,
    config: &'a RunConfiguration,
}

impl<'a, P: Page + ?Sized> Pager<'a, P> {
    pub fn new(page: &'a P, config: &'a RunConfiguration) -> Self {
        Self { page, config }
    }

    /// Returns `false` when the view could not be advanced. Never errors.
    pub async fn advance(&self, current_page: u32) -> bool {
        let timings = &self.config.timings;
        info!(current_page, next_page = current_page + 1, "Navigating to next page");

        let next_button = match wait_for_element(
            self.page,
            &self.config.next_page_control(),
            timings.next_control_timeout,
            timings.poll_interval,
        )
        .await
        {
            Ok(button) => button,
            Err(e) => {
                error!(current_page, error = %e, "Error navigating to next page");
                return false;
            }
        };

        if let Err(e) = self.page.trigger_navigation(&next_button).await {
            error!(current_page, error = %e, "Error navigating to next page");
            return false;
        }
        info!("Next button clicked, waiting for page load");

        settle(
            self.page,
            timings.page_settle,
            self.config.busy_indicator().as_ref(),
            timings.poll_interval,
        )
        .await;

        info!(status = "success", new_page = current_page + 1, "Navigation completed");
        true
    }
}
