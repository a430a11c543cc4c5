//! Bulk deletion of calendar entries whose label contains a search text.
//!
//! The loop in [`sweep`] scans the visible calendar page, deletes the first
//! match, re-scans, and moves to the next page once nothing matches. It only
//! talks to the calendar through [`host::Page`]; [`dom::ChromePage`] provides
//! that on top of a Chrome tab.

pub mod config;
pub mod deleter;
pub mod dom;
pub mod error;
pub mod finder;
pub mod hands;
pub mod host;
pub mod pager;
pub mod preflight;
pub mod prompt;
pub mod report;
pub mod sweep;
pub mod types;
pub mod waiter;

pub use config::RunConfiguration;
pub use error::{PurgeError, Result};
pub use host::{Descriptor, ElementHandle, HostError, Page};
pub use report::{RunReport, Termination};
pub use sweep::Sweep;
pub use types::{CandidateEntry, DeletionOutcome, SearchQuery};
