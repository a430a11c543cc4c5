//! The deletion loop.
//!
//! ```text
//! Scanning(p) ──match──▶ Deleting(p) ──▶ Scanning(p)
//!      │                                   (same page: deletions shift the rest)
//!      └─none, p < max──▶ Paginating(p) ──ok──▶ Scanning(p + 1)
//!      └─none, p = max──▶ Done              └─fail──▶ Aborted
//! ```
//!
//! Strictly sequential: one scan, click or page change at a time, with a
//! settle pause between steps.

use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::RunConfiguration;
use crate::deleter::EventDeleter;
use crate::error::PurgeError;
use crate::finder::find_matches;
use crate::host::Page;
use crate::pager::Pager;
use crate::report::{RunReport, Termination};
use crate::types::{CandidateEntry, RunState, SearchQuery};
use crate::waiter::settle;

#[derive(Debug)]
enum State {
    Scanning(u32),
    Deleting {
        page: u32,
        entry: CandidateEntry,
        total_found: usize,
    },
    Paginating {
        page: u32,
        /// Leaving a page whose scan failed.
        recovering: bool,
    },
    Done,
    Aborted {
        page: u32,
    },
}

pub struct Sweep<'a, P: Page + ?Sized> {
    page: &'a P,
    config: &'a RunConfiguration,
    query: &'a SearchQuery,
}

impl<'a, P: Page + ?Sized> Sweep<'a, P> {
    pub fn new(page: &'a P, config: &'a RunConfiguration, query: &'a SearchQuery) -> Self {
        Self {
            page,
            config,
            query,
        }
    }

    /// Run from page 1 until the page budget is spent or navigation fails.
    ///
    /// Each call starts from fresh counters.
    pub async fn run(&self) -> RunReport {
        let mut run = RunState::new();
        let mut state = State::Scanning(1);

        info!(
            search = %self.query,
            max_pages = self.config.max_pages,
            start_time = %Utc::now().to_rfc3339(),
            "Starting calendar deletion process"
        );

        loop {
            state = match state {
                State::Scanning(page) => self.scan(&mut run, page).await,
                State::Deleting {
                    page,
                    entry,
                    total_found,
                } => self.delete(&mut run, page, entry, total_found).await,
                State::Paginating { page, recovering } => {
                    self.paginate(&mut run, page, recovering).await
                }
                State::Done => {
                    let pages = run.current_page;
                    info!(
                        status = "success",
                        pages,
                        total_deleted = run.total_deleted,
                        total_errors = run.total_errors,
                        completion_time = %Utc::now().to_rfc3339(),
                        "Calendar deletion finished"
                    );
                    return RunReport::from_state(run, Termination::Completed { pages });
                }
                State::Aborted { page } => {
                    error!(
                        page,
                        total_deleted = run.total_deleted,
                        total_errors = run.total_errors,
                        "Calendar deletion stopped"
                    );
                    return RunReport::from_state(run, Termination::Aborted { page });
                }
            };
        }
    }

    async fn scan(&self, run: &mut RunState, page: u32) -> State {
        let max_pages = self.config.max_pages;
        if page > max_pages {
            info!(status = "success", total_pages = max_pages, "All pages processed");
            return State::Done;
        }

        run.current_page = page;
        info!(current_page = page, max_pages, "Processing page");

        match find_matches(self.page, self.query, &self.config.selectors.entry_tag).await {
            Ok(entries) => {
                let total_found = entries.len();
                match entries.into_iter().next() {
                    Some(entry) => {
                        info!(
                            current_page = page,
                            match_count = total_found,
                            "Found matching events on page"
                        );
                        State::Deleting {
                            page,
                            entry,
                            total_found,
                        }
                    }
                    None => {
                        info!(current_page = page, "No matching events found on page");
                        self.next_page_or_done(page, false)
                    }
                }
            }
            Err(e) => {
                run.record_error(page, e.to_string());
                error!(current_page = page, error = %e, "Error processing page");
                if page < max_pages {
                    warn!("Attempting to continue with next page after error");
                } else {
                    error!(
                        total_deleted = run.total_deleted,
                        total_errors = run.total_errors,
                        "Error on final page, ending process"
                    );
                }
                self.next_page_or_done(page, true)
            }
        }
    }

    async fn delete(
        &self,
        run: &mut RunState,
        page: u32,
        entry: CandidateEntry,
        total_found: usize,
    ) -> State {
        run.deletion_attempts += 1;
        let timings = &self.config.timings;

        match EventDeleter::new(self.page, self.config)
            .delete(&entry, total_found)
            .await
        {
            Ok(outcome) => {
                run.total_deleted += 1;
                run.consecutive_failures = 0;
                info!(
                    status = "success",
                    current_page = page,
                    total_deleted = run.total_deleted,
                    remaining_on_page = total_found - 1,
                    ?outcome,
                    "Event deleted successfully"
                );
                self.pause(timings.after_delete).await;
                State::Scanning(page)
            }
            Err(e) => {
                run.record_error(page, e.to_string());
                run.consecutive_failures += 1;
                error!(
                    current_page = page,
                    total_errors = run.total_errors,
                    error = %e,
                    "Failed to delete event, continuing"
                );

                if let Some(limit) = self.config.max_consecutive_failures {
                    if run.consecutive_failures >= limit {
                        warn!(
                            current_page = page,
                            consecutive_failures = run.consecutive_failures,
                            "Too many failed deletions in a row, leaving page"
                        );
                        run.consecutive_failures = 0;
                        return self.next_page_or_done(page, true);
                    }
                }

                self.pause(timings.after_failure).await;
                State::Scanning(page)
            }
        }
    }

    async fn paginate(&self, run: &mut RunState, page: u32, recovering: bool) -> State {
        if !Pager::new(self.page, self.config).advance(page).await {
            let e = PurgeError::NavigationFailed { page };
            error!(
                current_page = page,
                error = %e,
                "Failed to navigate to next page, ending process"
            );
            return State::Aborted { page };
        }

        run.consecutive_failures = 0;
        let timings = &self.config.timings;
        let delay = if recovering {
            timings.after_recovery
        } else {
            timings.after_pagination
        };
        self.pause(delay).await;
        State::Scanning(page + 1)
    }

    fn next_page_or_done(&self, page: u32, recovering: bool) -> State {
        if page < self.config.max_pages {
            State::Paginating { page, recovering }
        } else {
            info!(max_pages = self.config.max_pages, "Reached maximum pages");
            State::Done
        }
    }

    async fn pause(&self, delay: Duration) {
        settle(
            self.page,
            delay,
            self.config.busy_indicator().as_ref(),
            self.config.timings.poll_interval,
        )
        .await;
    }
}
