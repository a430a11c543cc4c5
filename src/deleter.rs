use tracing::{error, info, warn};

use crate::config::RunConfiguration;
use crate::error::{PurgeError, Result};
use crate::host::Page;
use crate::types::{CandidateEntry, DeletionOutcome};
use crate::waiter::wait_for_element;

/// Drives one entry through open → delete → (recurrence dialog).
pub struct EventDeleter<'a, P: Page + ?Sized> {
    page: &'a P,
    config: &'a RunConfiguration,
}

impl<'a, P: Page + ?Sized> EventDeleter<'a, P> {
    pub fn new(page: &'a P, config: &'a RunConfiguration) -> Self {
        Self { page, config }
    }

    /// Delete `entry` from the page.
    ///
    /// Anything that goes wrong before the delete control is clicked fails
    /// with [`PurgeError::DeleteFailed`]. Once it has been clicked the entry
    /// counts as deleted, even if the recurrence dialog can't be confirmed.
    pub async fn delete(
        &self,
        entry: &CandidateEntry,
        total_found: usize,
    ) -> Result<DeletionOutcome> {
        info!(
            event_index = entry.index + 1,
            total_found,
            event_text = entry.label.as_str(),
            "Attempting to delete event"
        );

        self.click_delete(entry).await.map_err(|cause| {
            error!(
                event_index = entry.index + 1,
                event_text = entry.label.as_str(),
                error = %cause,
                "Error deleting event"
            );
            PurgeError::delete_failed(entry.label.clone(), cause)
        })?;

        info!("Delete button clicked, checking for recurring event dialog");
        Ok(self.resolve_recurrence(entry).await)
    }

    async fn click_delete(&self, entry: &CandidateEntry) -> Result<()> {
        let timings = &self.config.timings;

        self.page.activate(&entry.element).await?;
        info!("Event clicked, waiting for delete button");

        let delete_button = wait_for_element(
            self.page,
            &self.config.delete_control(),
            timings.delete_control_timeout,
            timings.poll_interval,
        )
        .await?;
        self.page.activate(&delete_button).await?;
        Ok(())
    }

    async fn resolve_recurrence(&self, entry: &CandidateEntry) -> DeletionOutcome {
        let timings = &self.config.timings;
        // Flat wait even with a busy indicator configured.
        tokio::time::sleep(timings.dialog_settle).await;

        match self.recurrence_dialog_open().await {
            Ok(true) => {}
            Ok(false) => {
                info!(
                    status = "success",
                    event_text = entry.label.as_str(),
                    "Regular event deleted"
                );
                return DeletionOutcome::Single;
            }
            Err(e) => {
                error!(
                    event_text = entry.label.as_str(),
                    error = %e,
                    "Error handling deletion dialog"
                );
                return DeletionOutcome::Unconfirmed;
            }
        }

        info!("Recurring event dialog detected");
        let confirmed = async {
            let ok_button = wait_for_element(
                self.page,
                &self.config.recurring_ok(),
                timings.dialog_ok_timeout,
                timings.poll_interval,
            )
            .await?;
            self.page.activate(&ok_button).await?;
            Ok::<_, PurgeError>(())
        }
        .await;

        match confirmed {
            Ok(()) => {
                info!(
                    status = "success",
                    event_text = entry.label.as_str(),
                    "Recurring event deleted"
                );
                DeletionOutcome::Recurring
            }
            Err(e) => {
                warn!(
                    event_text = entry.label.as_str(),
                    error = %e,
                    "Could not confirm recurring deletion, counting it as deleted"
                );
                DeletionOutcome::Unconfirmed
            }
        }
    }

    /// The dialog counts only when it is present AND its text names one of
    /// the recurring-deletion labels.
    async fn recurrence_dialog_open(&self) -> Result<bool> {
        let Some(dialog) = self
            .page
            .lookup_element(&self.config.recurring_dialog())
            .await?
        else {
            return Ok(false);
        };

        let text = self.page.extract_text(&dialog).await?;
        let labels = &self.config.labels;
        Ok(text.contains(&labels.delete_recurring_event)
            || text.contains(&labels.delete_recurring_task))
    }
}
