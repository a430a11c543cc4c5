use serde::Serialize;

use crate::types::{ErrorRecord, RunState};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Termination {
    /// Ran out of matches or pages. `pages` is the last page scanned.
    Completed { pages: u32 },
    /// Could not move past `page`; the remaining pages were never scanned.
    Aborted { page: u32 },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub termination: Termination,
    pub total_deleted: u32,
    pub total_errors: u32,
    pub errors: Vec<ErrorRecord>,
    pub pages_scanned: u32,
    pub deletion_attempts: u32,
}

impl RunReport {
    pub(crate) fn from_state(state: RunState, termination: Termination) -> Self {
        RunReport {
            termination,
            total_deleted: state.total_deleted,
            total_errors: state.total_errors,
            errors: state.errors,
            pages_scanned: state.current_page,
            deletion_attempts: state.deletion_attempts,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.termination, Termination::Aborted { .. })
    }

    /// The summary shown to the user once the run is over.
    pub fn notification(&self) -> String {
        let mut message = match self.termination {
            Termination::Completed { pages } => format!(
                "Deletion complete! Processed {pages} page(s).\nTotal events deleted: {}",
                self.total_deleted
            ),
            Termination::Aborted { page } => format!(
                "Process stopped due to navigation error on page {page}.\nTotal events deleted: {}",
                self.total_deleted
            ),
        };
        if self.total_errors > 0 {
            message.push_str(&format!(
                "\nErrors encountered: {} (check the log for details)",
                self.total_errors
            ));
        }
        message
    }
}
