//! [`Page`] on top of a live Chrome tab.

use std::sync::Arc;

use async_trait::async_trait;
use headless_chrome::Tab;
use serde::de::DeserializeOwned;

use crate::host::{Descriptor, ElementHandle, HostError, Page};

/// Attribute used to give matched nodes a stable handle.
const REF_ATTR: &str = "data-purge-ref";

/// Finds nodes for a descriptor and tags each with `data-purge-ref`.
///
/// `text_contains` looks at the first text node only, the same thing XPath's
/// `contains(text(), ...)` does.
const LOOKUP_JS: &str = r#"
((descriptor, all) => {
  window.__purgeRef = window.__purgeRef || 0;
  const ownText = (el) => {
    const node = [...el.childNodes].find(c => c.nodeType === Node.TEXT_NODE);
    return node ? node.nodeValue : '';
  };
  let found;
  switch (descriptor.kind) {
    case 'css':
      found = [...document.querySelectorAll(descriptor.selector)];
      break;
    case 'aria_label':
      found = [...document.querySelectorAll(descriptor.tag)]
        .filter(el => descriptor.labels.includes(el.getAttribute('aria-label')));
      break;
    case 'text_contains':
      found = [...document.querySelectorAll(descriptor.tag)]
        .filter(el => ownText(el).includes(descriptor.needle));
      break;
    default:
      throw new Error('unknown descriptor kind: ' + descriptor.kind);
  }
  if (!all) found = found.slice(0, 1);
  return JSON.stringify(found.map(el => {
    if (!el.hasAttribute('data-purge-ref')) {
      el.setAttribute('data-purge-ref', 'p' + (window.__purgeRef++));
    }
    return el.getAttribute('data-purge-ref');
  }));
})
"#;

pub struct ChromePage {
    tab: Arc<Tab>,
}

impl ChromePage {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    /// Run `script` in the page and decode its JSON-string result.
    async fn evaluate_json<T>(&self, script: String) -> Result<T, HostError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || {
            let result = tab
                .evaluate(&script, false)
                .map_err(|e| HostError::Script(format!("{e:#}")))?;
            let raw = result
                .value
                .and_then(|v| v.as_str().map(String::from))
                .ok_or_else(|| HostError::Decode("script returned no string".to_string()))?;
            serde_json::from_str(&raw).map_err(|e| HostError::Decode(e.to_string()))
        })
        .await?
    }

    async fn lookup(
        &self,
        descriptor: &Descriptor,
        all: bool,
    ) -> Result<Vec<ElementHandle>, HostError> {
        let descriptor_json =
            serde_json::to_string(descriptor).map_err(|e| HostError::Decode(e.to_string()))?;
        let refs: Vec<String> = self
            .evaluate_json(format!("{LOOKUP_JS}({descriptor_json}, {all})"))
            .await?;
        Ok(refs.into_iter().map(ElementHandle::new).collect())
    }
}

fn ref_selector(element: &ElementHandle) -> String {
    format!("[{REF_ATTR}=\"{}\"]", element.as_str())
}

#[async_trait]
impl Page for ChromePage {
    async fn lookup_element(
        &self,
        descriptor: &Descriptor,
    ) -> Result<Option<ElementHandle>, HostError> {
        Ok(self.lookup(descriptor, false).await?.into_iter().next())
    }

    async fn lookup_all(&self, descriptor: &Descriptor) -> Result<Vec<ElementHandle>, HostError> {
        self.lookup(descriptor, true).await
    }

    async fn activate(&self, element: &ElementHandle) -> Result<(), HostError> {
        let tab = self.tab.clone();
        let element = element.clone();
        tokio::task::spawn_blocking(move || {
            let node = tab
                .find_element(&ref_selector(&element))
                .map_err(|_| HostError::Detached(element.clone()))?;
            node.click().map_err(|e| HostError::Browser(format!("{e:#}")))?;
            Ok(())
        })
        .await?
    }

    async fn extract_text(&self, element: &ElementHandle) -> Result<String, HostError> {
        let selector = serde_json::to_string(&ref_selector(element))
            .map_err(|e| HostError::Decode(e.to_string()))?;
        let text: Option<String> = self
            .evaluate_json(format!(
                "JSON.stringify((document.querySelector({selector}) || {{}}).textContent ?? null)"
            ))
            .await?;
        text.ok_or_else(|| HostError::Detached(element.clone()))
    }

    async fn current_host_identifier(&self) -> Result<String, HostError> {
        self.evaluate_json("JSON.stringify(window.location.hostname)".to_string())
            .await
    }
}
