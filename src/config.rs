//! Run options. Built once before the loop starts and never mutated.

use std::time::Duration;

use crate::error::{PurgeError, Result};
use crate::host::Descriptor;

pub const DEFAULT_NEXT_PAGE_LABEL: &str = "Next month";
pub const DEFAULT_DELETE_EVENT_LABEL: &str = "Delete event";
pub const DEFAULT_DELETE_TASK_LABEL: &str = "Delete task";
pub const DEFAULT_DELETE_RECURRING_EVENT_LABEL: &str = "Delete repeating event";
pub const DEFAULT_DELETE_RECURRING_TASK_LABEL: &str = "Delete recurring task";
pub const DEFAULT_MAX_PAGES: u32 = 12;

pub const DEFAULT_ENTRY_TAG: &str = "span";
pub const DEFAULT_RECURRING_DIALOG_SELECTOR: &str = r#"span.uW2Fw-k2Wrsb-fmcmS[jsname="MdSI6d"]"#;
pub const DEFAULT_RECURRING_OK_SELECTOR: &str = r#"[data-mdc-dialog-action="ok"]"#;

/// Accessible labels of the calendar controls the loop clicks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub next_page: String,
    pub delete_event: String,
    pub delete_task: String,
    pub delete_recurring_event: String,
    pub delete_recurring_task: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            next_page: DEFAULT_NEXT_PAGE_LABEL.to_string(),
            delete_event: DEFAULT_DELETE_EVENT_LABEL.to_string(),
            delete_task: DEFAULT_DELETE_TASK_LABEL.to_string(),
            delete_recurring_event: DEFAULT_DELETE_RECURRING_EVENT_LABEL.to_string(),
            delete_recurring_task: DEFAULT_DELETE_RECURRING_TASK_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    /// Tag whose text is matched against the search query.
    pub entry_tag: String,
    pub recurring_dialog: String,
    pub recurring_ok: String,
    /// Loading indicator. When set, settle waits end as soon as it is gone.
    /// The wait for the recurrence dialog stays flat regardless.
    pub busy_indicator: Option<String>,
}

impl Default for Selectors {
    fn default() -> Self {
        Selectors {
            entry_tag: DEFAULT_ENTRY_TAG.to_string(),
            recurring_dialog: DEFAULT_RECURRING_DIALOG_SELECTOR.to_string(),
            recurring_ok: DEFAULT_RECURRING_OK_SELECTOR.to_string(),
            busy_indicator: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub poll_interval: Duration,
    pub delete_control_timeout: Duration,
    /// Flat wait after clicking delete, before looking for the recurrence dialog.
    pub dialog_settle: Duration,
    pub dialog_ok_timeout: Duration,
    pub next_control_timeout: Duration,
    /// Wait after clicking "next" before the new page is considered ready.
    pub page_settle: Duration,
    pub after_delete: Duration,
    pub after_failure: Duration,
    pub after_pagination: Duration,
    /// Pause after paginating away from a page whose scan failed.
    pub after_recovery: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            poll_interval: Duration::from_millis(100),
            delete_control_timeout: Duration::from_millis(3000),
            dialog_settle: Duration::from_millis(500),
            dialog_ok_timeout: Duration::from_millis(2000),
            next_control_timeout: Duration::from_millis(3000),
            page_settle: Duration::from_millis(2000),
            after_delete: Duration::from_millis(800),
            after_failure: Duration::from_millis(1500),
            after_pagination: Duration::from_millis(2000),
            after_recovery: Duration::from_millis(3000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    pub labels: Labels,
    pub selectors: Selectors,
    pub timings: Timings,
    /// Number of calendar pages to visit, starting from the current one.
    pub max_pages: u32,
    /// Move on from a page after this many failed deletions in a row.
    /// `None` keeps retrying whatever entry comes first.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        RunConfiguration {
            labels: Labels::default(),
            selectors: Selectors::default(),
            timings: Timings::default(),
            max_pages: DEFAULT_MAX_PAGES,
            max_consecutive_failures: None,
        }
    }
}

impl RunConfiguration {
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(PurgeError::InvalidConfig(
                "max pages must be at least 1".to_string(),
            ));
        }
        if self.timings.poll_interval.is_zero() {
            return Err(PurgeError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.max_consecutive_failures == Some(0) {
            return Err(PurgeError::InvalidConfig(
                "max consecutive failures must be at least 1".to_string(),
            ));
        }

        let required = [
            ("next page label", &self.labels.next_page),
            ("delete event label", &self.labels.delete_event),
            ("delete task label", &self.labels.delete_task),
            ("recurring event label", &self.labels.delete_recurring_event),
            ("recurring task label", &self.labels.delete_recurring_task),
            ("entry tag", &self.selectors.entry_tag),
            ("recurring dialog selector", &self.selectors.recurring_dialog),
            ("recurring OK selector", &self.selectors.recurring_ok),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PurgeError::InvalidConfig(format!("{name} cannot be empty")));
            }
        }
        if let Some(busy) = &self.selectors.busy_indicator {
            if busy.trim().is_empty() {
                return Err(PurgeError::InvalidConfig(
                    "busy indicator selector cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn delete_control(&self) -> Descriptor {
        Descriptor::aria_label(
            "button",
            [
                self.labels.delete_event.clone(),
                self.labels.delete_task.clone(),
            ],
        )
    }

    pub fn next_page_control(&self) -> Descriptor {
        Descriptor::aria_label("button", [self.labels.next_page.clone()])
    }

    pub fn recurring_dialog(&self) -> Descriptor {
        Descriptor::css(self.selectors.recurring_dialog.clone())
    }

    pub fn recurring_ok(&self) -> Descriptor {
        Descriptor::css(self.selectors.recurring_ok.clone())
    }

    pub fn busy_indicator(&self) -> Option<Descriptor> {
        self.selectors.busy_indicator.clone().map(Descriptor::css)
    }
}
