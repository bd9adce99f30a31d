//! The browser seam used by site strategies and the orchestrator.
//!
//! Strategies never hold live DOM handles. Every query returns
//! [`ElementSnapshot`] values, plain data captured at query time, and
//! interaction goes back through the session by `(selector, index)`. This
//! keeps strategies free of browser lifetimes and lets the whole crawl be
//! driven by an in-memory session in tests.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::BrowserError;

/// Interval between polls while waiting for a selector to match.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A DOM element captured at query time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ElementSnapshot {
    /// Lower-case tag name.
    pub tag: String,
    /// Trimmed visible text.
    #[serde(default)]
    pub text: String,
    /// Attribute values. `href` and `src` hold the resolved absolute URL
    /// when the browser exposes one.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub natural_width: Option<u32>,
    #[serde(default)]
    pub natural_height: Option<u32>,
}

impl ElementSnapshot {
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Visible, enabled, and not marked disabled by attribute or class.
    #[must_use]
    pub fn is_interactable(&self) -> bool {
        let disabled_attr = self.attributes.contains_key("disabled")
            || self.attr("aria-disabled") == Some("true");
        let disabled_class = self
            .attr("class")
            .is_some_and(|c| c.to_ascii_lowercase().contains("disabled"));
        self.visible && self.enabled && !disabled_attr && !disabled_class
    }

    /// Declared pixel size, preferring the `width`/`height` attributes over
    /// the decoded natural size.
    #[must_use]
    pub fn declared_size(&self) -> Option<(u32, u32)> {
        let parse = |name: &str| self.attr(name).and_then(|v| v.trim().parse::<u32>().ok());
        let width = parse("width").or(self.natural_width)?;
        let height = parse("height").or(self.natural_height)?;
        Some((width, height))
    }
}

/// An exclusively-owned browser tab.
#[async_trait]
pub trait Session: Send {
    /// Navigate and wait for the navigation to settle.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Snapshot every element matching a CSS selector. An invalid selector
    /// yields an empty list rather than an error.
    async fn query(&mut self, selector: &str) -> Result<Vec<ElementSnapshot>, BrowserError>;

    /// Click the `index`-th match of `selector` through a script-dispatched
    /// click, which also works on elements covered by overlays.
    async fn click(&mut self, selector: &str, index: usize) -> Result<(), BrowserError>;

    /// Release the browser. Must be safe to call more than once.
    async fn close(&mut self) -> Result<(), BrowserError>;

    /// Poll `selector` until it matches or `timeout` elapses. Returns the
    /// matches, or an empty list on timeout.
    async fn wait_for(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<ElementSnapshot>, BrowserError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let found = self.query(selector).await?;
            if !found.is_empty() {
                return Ok(found);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(Vec::new());
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(attrs: &[(&str, &str)]) -> ElementSnapshot {
        ElementSnapshot {
            tag: "button".to_owned(),
            attributes: attrs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            visible: true,
            enabled: true,
            ..ElementSnapshot::default()
        }
    }

    #[test]
    fn plain_visible_button_is_interactable() {
        assert!(button(&[("class", "content_navigation__button")]).is_interactable());
    }

    #[test]
    fn disabled_attribute_blocks_interaction() {
        assert!(!button(&[("disabled", "")]).is_interactable());
        assert!(!button(&[("aria-disabled", "true")]).is_interactable());
    }

    #[test]
    fn disabled_class_blocks_interaction_case_insensitively() {
        assert!(!button(&[("class", "nav-button Nav--Disabled")]).is_interactable());
    }

    #[test]
    fn hidden_or_disabled_state_blocks_interaction() {
        let mut hidden = button(&[]);
        hidden.visible = false;
        assert!(!hidden.is_interactable());

        let mut disabled = button(&[]);
        disabled.enabled = false;
        assert!(!disabled.is_interactable());
    }

    #[test]
    fn declared_size_prefers_attributes_then_natural_size() {
        let mut img = button(&[("width", "400")]);
        img.natural_width = Some(1200);
        img.natural_height = Some(1600);
        assert_eq!(img.declared_size(), Some((400, 1600)));
    }

    #[test]
    fn declared_size_is_none_without_any_dimensions() {
        assert_eq!(button(&[]).declared_size(), None);
    }

    #[test]
    fn snapshot_deserializes_from_page_script_output() {
        let raw = serde_json::json!({
            "tag": "img",
            "text": "",
            "attributes": {"src": "https://cdn.example/p1.jpg", "alt": "Seite 1"},
            "visible": true,
            "enabled": true,
            "natural_width": 1400,
            "natural_height": null
        });
        let snap: ElementSnapshot = serde_json::from_value(raw).unwrap();
        assert_eq!(snap.attr("alt"), Some("Seite 1"));
        assert_eq!(snap.natural_width, Some(1400));
        assert_eq!(snap.natural_height, None);
    }
}
