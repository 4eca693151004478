//! [`Browser`] backed by a local Chrome/Chromium driven over the DevTools
//! protocol.

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::EventLifecycleEvent;
use futures::StreamExt;
use tokio::{sync::RwLock, task::JoinHandle, time};

use super::{Browser, BrowserError, NavigateOptions, Page, Session, WaitUntil};

const LIFECYCLE_INIT: &str = "init";
const LIFECYCLE_NETWORK_IDLE: &str = "networkIdle";

#[derive(Debug, Clone)]
pub struct ChromiumConfig {
    pub headless: bool,
    /// Chrome/Chromium executable, auto-detected when `None`.
    pub chrome_path: Option<PathBuf>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Timeout for a single DevTools request.
    pub request_timeout: Duration,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            viewport_width: 1280,
            viewport_height: 800,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChromiumBrowser {
    config: ChromiumConfig,
}

impl ChromiumBrowser {
    pub fn new(config: ChromiumConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.config.viewport_width, self.config.viewport_height)
            .request_timeout(self.config.request_timeout)
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--mute-audio");
        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(chrome_path) = &self.config.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }
        builder.build().map_err(BrowserError::Launch)
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    fn name(&self) -> String {
        "chromium".to_string()
    }

    async fn launch(&self) -> Result<Arc<dyn Session>, BrowserError> {
        let (browser, mut handler) = CdpBrowser::launch(self.browser_config()?)
            .await
            .map_err(|err| BrowserError::Launch(err.to_string()))?;

        // the browser only makes progress while its handler is polled
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::debug!("chromium handler error: {:?}", err);
                }
            }
        });
        tracing::debug!("chromium: session launched");

        Ok(Arc::new(ChromiumSession {
            browser: RwLock::new(browser),
            handler,
        }))
    }
}

struct ChromiumSession {
    browser: RwLock<CdpBrowser>,
    handler: JoinHandle<()>,
}

#[async_trait]
impl Session for ChromiumSession {
    async fn new_page(&self) -> Result<Box<dyn Page>, BrowserError> {
        let page = self
            .browser
            .read()
            .await
            .new_page("about:blank")
            .await
            .map_err(|err| BrowserError::Protocol(err.to_string()))?;
        Ok(Box::new(ChromiumPage { page: Some(page) }))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        let mut browser = self.browser.write().await;
        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|err| BrowserError::Protocol(err.to_string()));
        if let Err(err) = browser.wait().await {
            tracing::warn!("chromium: failed waiting for browser exit: {:?}", err);
        }
        self.handler.abort();
        tracing::debug!("chromium: session closed");
        closed
    }
}

struct ChromiumPage {
    page: Option<chromiumoxide::Page>,
}

impl ChromiumPage {
    fn page(&self) -> Result<&chromiumoxide::Page, BrowserError> {
        self.page
            .as_ref()
            .ok_or_else(|| BrowserError::Protocol("page already closed".to_string()))
    }

    async fn evaluate_string(&self, script: String) -> Result<Option<String>, BrowserError> {
        let result = self
            .page()?
            .evaluate(script)
            .await
            .map_err(|err| BrowserError::Evaluation(err.to_string()))?;
        Ok(result
            .value()
            .and_then(|value| value.as_str())
            .map(str::to_string))
    }
}

fn js_string(value: &str) -> Result<String, BrowserError> {
    serde_json::to_string(value).map_err(|err| BrowserError::Evaluation(err.to_string()))
}

#[async_trait]
impl Page for ChromiumPage {
    async fn goto(&self, url: &str, options: &NavigateOptions) -> Result<(), BrowserError> {
        let page = self.page()?;
        let main_frame = page
            .mainframe()
            .await
            .map_err(|err| BrowserError::Protocol(err.to_string()))?;
        // subscribe before navigating so no lifecycle event is missed
        let mut lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|err| BrowserError::Protocol(err.to_string()))?;

        let navigation = async {
            page.goto(url)
                .await
                .map_err(|err| BrowserError::Navigation {
                    url: url.to_string(),
                    reason: err.to_string(),
                })?;
            if options.wait_until == WaitUntil::Load {
                return Ok(());
            }

            // `networkIdle` is only trusted for the loader started by this navigation
            let mut loader = None;
            while let Some(event) = lifecycle.next().await {
                if main_frame.as_ref().is_some_and(|frame| *frame != event.frame_id) {
                    continue;
                }
                match event.name.as_str() {
                    LIFECYCLE_INIT => loader = Some(event.loader_id.clone()),
                    LIFECYCLE_NETWORK_IDLE if loader.as_ref() == Some(&event.loader_id) => {
                        return Ok(());
                    }
                    _ => {}
                }
            }
            Err(BrowserError::Protocol(
                "page closed while waiting for network idle".to_string(),
            ))
        };

        time::timeout(options.timeout, navigation)
            .await
            .map_err(|_| BrowserError::Timeout(options.timeout))?
    }

    async fn text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        self.evaluate_string(format!(
            "(() => {{ const el = document.querySelector({}); \
             return el ? el.textContent : null; }})()",
            js_string(selector)?
        ))
        .await
    }

    async fn attribute(
        &self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        self.evaluate_string(format!(
            "(() => {{ const el = document.querySelector({}); \
             return el ? el.getAttribute({}) : null; }})()",
            js_string(selector)?,
            js_string(name)?
        ))
        .await
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        match self.page.take() {
            Some(page) => page
                .close()
                .await
                .map_err(|err| BrowserError::Protocol(err.to_string())),
            None => Ok(()),
        }
    }
}
