//! Chrome/Chromium-backed [`Session`] over the DevTools protocol.

use async_trait::async_trait;
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;

use prospekt_core::AcquisitionConfig;

use crate::error::BrowserError;
use crate::session::{ElementSnapshot, Session};

/// Snapshot every match of a selector as JSON. `%SELECTOR%` is replaced by a
/// JSON string literal.
const QUERY_SCRIPT: &str = r"
(() => {
    let nodes;
    try {
        nodes = Array.from(document.querySelectorAll(%SELECTOR%));
    } catch (e) {
        return '[]';
    }
    return JSON.stringify(nodes.map((el) => {
        const attributes = {};
        for (const a of el.attributes) {
            attributes[a.name] = a.value;
        }
        if (typeof el.href === 'string' && el.href) {
            attributes.href = el.href;
        }
        if (el.tagName === 'IMG' && (el.currentSrc || el.src)) {
            attributes.src = el.currentSrc || el.src;
        }
        const rect = el.getBoundingClientRect();
        const style = window.getComputedStyle(el);
        return {
            tag: el.tagName.toLowerCase(),
            text: (el.innerText || el.textContent || '').trim(),
            attributes,
            visible: rect.width > 0 && rect.height > 0
                && style.visibility !== 'hidden' && style.display !== 'none',
            enabled: !el.disabled,
            natural_width: el.naturalWidth || null,
            natural_height: el.naturalHeight || null,
        };
    }));
})()
";

const CLICK_SCRIPT: &str = r"
(() => {
    const el = document.querySelectorAll(%SELECTOR%)[%INDEX%];
    if (!el) {
        return false;
    }
    el.click();
    return true;
})()
";

/// A headless (or headed) Chromium tab that owns its browser process.
pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch a browser sized to the configured viewport and open a blank tab.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Launch`] if the browser config is rejected or
    /// the executable cannot be started, and [`BrowserError::Cdp`] if the
    /// first tab cannot be opened.
    pub async fn launch(config: &AcquisitionConfig) -> Result<Self, BrowserError> {
        let viewport = config.viewport;
        tracing::info!(
            headless = config.headless,
            viewport = %viewport,
            "launching browser"
        );

        let mut builder = BrowserConfig::builder()
            .window_size(viewport.width, viewport.height)
            .viewport(CdpViewport {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            })
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg(format!("--user-agent={}", config.user_agent));

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder.build().map_err(BrowserError::Launch)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut browser = browser;
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(e.into());
            }
        };

        Ok(Self {
            browser: Some(browser),
            page,
            handler,
        })
    }
}

#[async_trait]
impl Session for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        tracing::debug!(url, "navigating");
        self.page.goto(url).await?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn query(&mut self, selector: &str) -> Result<Vec<ElementSnapshot>, BrowserError> {
        let script = QUERY_SCRIPT.replace("%SELECTOR%", &js_string(selector));
        let raw: String = self
            .page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|e| BrowserError::Script {
                selector: selector.to_owned(),
                reason: e.to_string(),
            })?;
        serde_json::from_str(&raw).map_err(|e| BrowserError::Script {
            selector: selector.to_owned(),
            reason: e.to_string(),
        })
    }

    async fn click(&mut self, selector: &str, index: usize) -> Result<(), BrowserError> {
        let script = CLICK_SCRIPT
            .replace("%SELECTOR%", &js_string(selector))
            .replace("%INDEX%", &index.to_string());
        let clicked: bool = self
            .page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|e| BrowserError::Script {
                selector: selector.to_owned(),
                reason: e.to_string(),
            })?;
        if clicked {
            Ok(())
        } else {
            Err(BrowserError::NoSuchElement {
                selector: selector.to_owned(),
                index,
            })
        }
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        tracing::debug!("closing browser");
        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            tracing::warn!(error = %e, "browser process did not exit cleanly");
        }
        self.handler.abort();
        closed.map(|_| ()).map_err(BrowserError::from)
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            tracing::warn!("browser session dropped without close; killing process");
            if let Some(child) = browser.get_mut_child() {
                if let Err(e) = child.inner.start_kill() {
                    tracing::warn!(error = %e, "failed to kill browser process");
                }
            }
        }
        self.handler.abort();
    }
}

#[cfg(test)]
impl ChromiumSession {
    fn process_id(&mut self) -> Option<u32> {
        self.browser.as_mut()?.get_mut_child()?.inner.id()
    }
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_owned())
}
