//! The headless-browser capability the scraper is written against.
//!
//! A [`Browser`] launches a [`Session`]; a session hands out isolated
//! [`Page`]s. The scraper shares one session between concurrent scrapes and
//! gives every URL its own page. Sessions are reference counted because pages
//! may be opened and closed from spawned tasks.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

pub mod chromium;

pub use chromium::{ChromiumBrowser, ChromiumConfig};

#[derive(Debug, Clone, thiserror::Error)]
pub enum BrowserError {
    #[error("launch failed: {0}")]
    Launch(String),
    #[error("navigation to '{url}' failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("evaluation failed: {0}")]
    Evaluation(String),
    #[error("{0}")]
    Protocol(String),
}

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// The `load` event fired.
    Load,
    /// `load` fired and no requests have been in flight for a short while.
    NetworkIdle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigateOptions {
    pub timeout: Duration,
    pub wait_until: WaitUntil,
}

#[async_trait]
pub trait Browser: Send + Sync {
    fn name(&self) -> String;
    async fn launch(&self) -> Result<Arc<dyn Session>, BrowserError>;
}

#[async_trait]
pub trait Session: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn Page>, BrowserError>;
    /// Tear the session down. Pages still open become unusable.
    async fn close(&self) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str, options: &NavigateOptions) -> Result<(), BrowserError>;
    /// Text content of the first element matching `selector`.
    async fn text(&self, selector: &str) -> Result<Option<String>, BrowserError>;
    /// Attribute `name` of the first element matching `selector`.
    async fn attribute(&self, selector: &str, name: &str)
        -> Result<Option<String>, BrowserError>;
    async fn close(&mut self) -> Result<(), BrowserError>;
}
