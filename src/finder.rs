use tracing::{error, info};

use crate::error::{PurgeError, Result};
use crate::host::{Descriptor, HostError, Page};
use crate::types::{CandidateEntry, SearchQuery, truncate_label};

/// Scan the live page for entries whose label contains `query`.
///
/// Results are in document order. Every call re-reads the page, so the set
/// changes as entries get deleted.
pub async fn find_matches<P: Page + ?Sized>(
    page: &P,
    query: &SearchQuery,
    entry_tag: &str,
) -> Result<Vec<CandidateEntry>> {
    info!(search = %query, "Searching for matching events");

    let descriptor = Descriptor::text_contains(entry_tag, query.as_str());
    let entries = scan(page, &descriptor, query).await.map_err(|cause| {
        error!(search = %query, error = %cause, "Error during event search");
        PurgeError::ScanFailed {
            query: query.to_string(),
            cause,
        }
    })?;

    info!(
        selector = %descriptor,
        match_count = entries.len(),
        search = %query,
        "Event search completed"
    );
    Ok(entries)
}

async fn scan<P: Page + ?Sized>(
    page: &P,
    descriptor: &Descriptor,
    query: &SearchQuery,
) -> std::result::Result<Vec<CandidateEntry>, HostError> {
    let mut entries = Vec::new();
    for element in page.lookup_all(descriptor).await? {
        let text = page.extract_text(&element).await?;
        // Host matchers may be looser than a literal, case-sensitive test.
        if !text.contains(query.as_str()) {
            continue;
        }
        entries.push(CandidateEntry {
            element,
            label: truncate_label(&text),
            index: entries.len(),
        });
    }
    Ok(entries)
}
