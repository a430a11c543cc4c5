//! The seam between the purge loop and whatever renders the calendar.
//!
//! The loop only ever needs a handful of primitives: find an element, click
//! it, read its text. [`Page`] captures exactly those so the core can run
//! against a real Chrome tab ([`crate::dom::ChromePage`]) or an in-memory
//! calendar in tests.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural description of the element(s) to locate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Descriptor {
    /// Nodes matching a CSS selector.
    Css { selector: String },
    /// Nodes of `tag` whose `aria-label` equals one of `labels`.
    AriaLabel { tag: String, labels: Vec<String> },
    /// Nodes of `tag` whose own text contains `needle` (case-sensitive, literal).
    TextContains { tag: String, needle: String },
}

impl Descriptor {
    pub fn css(selector: impl Into<String>) -> Self {
        Descriptor::Css {
            selector: selector.into(),
        }
    }

    pub fn aria_label<I, S>(tag: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Descriptor::AriaLabel {
            tag: tag.into(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn text_contains(tag: impl Into<String>, needle: impl Into<String>) -> Self {
        Descriptor::TextContains {
            tag: tag.into(),
            needle: needle.into(),
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Css { selector } => f.write_str(selector),
            Descriptor::AriaLabel { tag, labels } => {
                let alternatives: Vec<String> = labels
                    .iter()
                    .map(|label| format!("{tag}[aria-label=\"{label}\"]"))
                    .collect();
                f.write_str(&alternatives.join(", "))
            }
            Descriptor::TextContains { tag, needle } => {
                write!(f, "//{tag}[contains(text(), '{needle}')]")
            }
        }
    }
}

/// Opaque reference to one live element.
///
/// Only meaningful until the page mutates; never keep one across a click,
/// a deletion or a page change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(token: impl Into<String>) -> Self {
        ElementHandle(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("page script failed: {0}")]
    Script(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("element {0} is no longer attached to the page")]
    Detached(ElementHandle),

    #[error("unexpected script result: {0}")]
    Decode(String),

    #[error("browser task panicked: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for HostError {
    fn from(err: tokio::task::JoinError) -> Self {
        HostError::Join(err.to_string())
    }
}

/// Primitive operations the purge loop consumes from the host environment.
///
/// Lookups are side-effect free. `activate` and `trigger_navigation` mutate
/// the page.
#[async_trait]
pub trait Page: Send + Sync {
    /// First element matching `descriptor`, in document order.
    async fn lookup_element(
        &self,
        descriptor: &Descriptor,
    ) -> Result<Option<ElementHandle>, HostError>;

    /// Every element matching `descriptor`, in document order.
    async fn lookup_all(&self, descriptor: &Descriptor) -> Result<Vec<ElementHandle>, HostError>;

    /// Simulated user click.
    async fn activate(&self, element: &ElementHandle) -> Result<(), HostError>;

    async fn extract_text(&self, element: &ElementHandle) -> Result<String, HostError>;

    async fn current_host_identifier(&self) -> Result<String, HostError>;

    /// Same as [`Page::activate`], for controls that change the calendar view.
    async fn trigger_navigation(&self, element: &ElementHandle) -> Result<(), HostError> {
        self.activate(element).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_display_reads_like_a_selector() {
        let d = Descriptor::aria_label("button", ["Delete event", "Delete task"]);
        assert_eq!(
            d.to_string(),
            "button[aria-label=\"Delete event\"], button[aria-label=\"Delete task\"]"
        );

        let d = Descriptor::text_contains("span", "Standup");
        assert_eq!(d.to_string(), "//span[contains(text(), 'Standup')]");
    }

    #[test]
    fn descriptor_serializes_with_kind_tag() {
        let d = Descriptor::css("[data-mdc-dialog-action=\"ok\"]");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "css");
        assert_eq!(json["selector"], "[data-mdc-dialog-action=\"ok\"]");
    }
}
