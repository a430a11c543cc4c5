use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PurgeError, Result};
use crate::host::ElementHandle;

/// Entry labels longer than this are cut when they show up in logs.
pub const LABEL_LOG_MAX_CHARS: usize = 100;

/// The text to look for in entry labels. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Surrounding whitespace is dropped; what remains must not be empty.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PurgeError::EmptyQuery);
        }
        Ok(SearchQuery(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One matching entry on the current page.
#[derive(Debug, Clone)]
pub struct CandidateEntry {
    pub element: ElementHandle,
    /// Visible label, already shortened for logging.
    pub label: String,
    /// Position within the current match set, 0 = first in document order.
    pub index: usize,
}

/// How a successful deletion went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    Single,
    /// The recurrence dialog showed up and was confirmed.
    Recurring,
    /// Delete was clicked but the follow-up dialog could not be handled.
    /// Still counted as deleted.
    Unconfirmed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorRecord {
    pub page: u32,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Counters for a single run. Owned by the loop and handed to each
/// transition by exclusive reference.
#[derive(Debug, Clone)]
pub struct RunState {
    pub current_page: u32,
    pub total_deleted: u32,
    pub total_errors: u32,
    pub errors: Vec<ErrorRecord>,
    pub deletion_attempts: u32,
    pub consecutive_failures: u32,
}

impl RunState {
    pub fn new() -> Self {
        RunState {
            current_page: 1,
            total_deleted: 0,
            total_errors: 0,
            errors: Vec::new(),
            deletion_attempts: 0,
            consecutive_failures: 0,
        }
    }

    pub fn record_error(&mut self, page: u32, message: impl Into<String>) {
        self.total_errors += 1;
        self.errors.push(ErrorRecord {
            page,
            message: message.into(),
            timestamp: Utc::now(),
        });
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorten a label for log output, marking the cut with `...`.
pub fn truncate_label(text: &str) -> String {
    if text.chars().count() > LABEL_LOG_MAX_CHARS {
        let head: String = text.chars().take(LABEL_LOG_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
