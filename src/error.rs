use std::time::Duration;

use crate::browser::BrowserError;

/// Errors that abort a whole [`crate::Scraper::scrape`] call.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("failed to launch browser session: {0}")]
    SessionLaunch(#[source] BrowserError),
}

/// Errors local to a single URL.
///
/// These never leave the scraper: they are turned into the `error` field of
/// the URL's [`crate::ScrapedMetadata`].
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error("{step} timed out after {timeout:?}")]
    Timeout {
        step: &'static str,
        timeout: Duration,
    },
    #[error("No title found")]
    NoTitle,
    #[error("no page slot available")]
    SlotUnavailable,
}
