use tracing::{info, warn};

use crate::error::Result;
use crate::host::Page;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCheck {
    Supported,
    Unsupported { host: String },
}

/// Check that the page is served from `expected_host`.
pub async fn check_host<P: Page + ?Sized>(page: &P, expected_host: &str) -> Result<HostCheck> {
    let host = page.current_host_identifier().await?;
    if host.contains(expected_host) {
        info!(host = host.as_str(), "Calendar page detected");
        Ok(HostCheck::Supported)
    } else {
        warn!(
            host = host.as_str(),
            expected = expected_host,
            "Current page may not be supported"
        );
        Ok(HostCheck::Unsupported { host })
    }
}
