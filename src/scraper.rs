use std::{sync::Arc, time::Duration};

use futures::stream::{self, StreamExt};
use tokio::{
    sync::Semaphore,
    time::{self, Instant},
};

use crate::{
    browser::{Browser, NavigateOptions, Page, Session, WaitUntil},
    error::{PageError, ScrapeError},
    extract::extract_metadata,
    metadata::{PageMetadata, ScrapedMetadata},
    normalize::normalize,
};

mod pages;
pub mod statistics;

use pages::{close_page, open_page};
use statistics::Statistics;

/// Upper bound on simultaneously open pages.
pub const MAX_CONCURRENT_PAGES: usize = 5;

pub struct Scraper {
    browser: Arc<dyn Browser>,
    concurrency: usize,
    navigation_timeout: Duration,
    settle_delay: Duration,
    page_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ScraperOptions {
    /// Size of each window of concurrently scraped URLs, clamped to
    /// `1..=MAX_CONCURRENT_PAGES`.
    pub concurrency: usize,
    /// Bound on waiting for a free page, opening it, navigating until the
    /// network is idle and closing it.
    pub navigation_timeout: Duration,
    /// Pause after the network went idle, for late client-side rendering.
    pub settle_delay: Duration,
    /// Bound on everything done for one URL.
    pub page_timeout: Duration,
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            concurrency: MAX_CONCURRENT_PAGES,
            navigation_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(2),
            page_timeout: Duration::from_secs(60),
        }
    }
}

impl Scraper {
    pub fn new(
        browser: Arc<dyn Browser>,
        ScraperOptions {
            concurrency,
            navigation_timeout,
            settle_delay,
            page_timeout,
        }: ScraperOptions,
    ) -> Self {
        Self {
            browser,
            concurrency: concurrency.clamp(1, MAX_CONCURRENT_PAGES),
            navigation_timeout,
            settle_delay,
            page_timeout,
        }
    }

    /// Scrape metadata for every URL in `urls`.
    ///
    /// Returns one result per input, in input order. Failures of single URLs
    /// are reported in their result; only a browser session that cannot be
    /// launched fails the call. URLs are handled in consecutive windows of at
    /// most `concurrency` URLs. A page counts against `concurrency` until its
    /// close succeeds, so a page that will not close keeps its slot.
    pub async fn scrape<S: AsRef<str>>(
        &self,
        urls: &[S],
    ) -> Result<Vec<ScrapedMetadata>, ScrapeError> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        tracing::info!(
            "scraping {} urls with '{}'",
            urls.len(),
            self.browser.name()
        );
        let starting_time = Instant::now();

        let session = self.browser.launch().await.map_err(|err| {
            tracing::error!("failed to launch browser session: {:?}", err);
            ScrapeError::SessionLaunch(err)
        })?;

        let slots = Arc::new(Semaphore::new(self.concurrency));
        let stats = Statistics::default();
        let mut results = Vec::with_capacity(urls.len());
        for (window_index, window) in urls.chunks(self.concurrency).enumerate() {
            tracing::debug!(window = window_index, size = window.len(), "scraping window");
            let window_results: Vec<ScrapedMetadata> = stream::iter(window)
                .map(|url| self.scrape_single(&session, &slots, url.as_ref(), &stats))
                .buffered(self.concurrency)
                .collect()
                .await;
            results.extend(window_results);
        }

        match time::timeout(self.navigation_timeout, session.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!("failed to close browser session: {:?}", err),
            Err(_) => tracing::warn!("timed out closing browser session"),
        }
        stats.write_to_log(starting_time.elapsed());

        Ok(results)
    }

    async fn scrape_single(
        &self,
        session: &Arc<dyn Session>,
        slots: &Arc<Semaphore>,
        url: &str,
        stats: &Statistics,
    ) -> ScrapedMetadata {
        let normalized = normalize(url);
        stats.scrape_started();
        match self.open_and_visit(session, slots, &normalized, stats).await {
            Ok(page) => {
                tracing::debug!(url = normalized, "scraped '{}'", page.title);
                ScrapedMetadata::succeeded(normalized, page)
            }
            Err(err) => {
                stats.scrape_failed();
                tracing::warn!(url = normalized, "Scraping error: {}", err);
                ScrapedMetadata::failed(normalized, err)
            }
        }
    }

    async fn open_and_visit(
        &self,
        session: &Arc<dyn Session>,
        slots: &Arc<Semaphore>,
        url: &str,
        stats: &Statistics,
    ) -> Result<PageMetadata, PageError> {
        let opened = open_page(session, slots, stats, self.navigation_timeout).await?;

        let outcome = time::timeout(self.page_timeout, self.visit(opened.page(), url))
            .await
            .unwrap_or(Err(PageError::Timeout {
                step: "scraping page",
                timeout: self.page_timeout,
            }));

        close_page(opened, url, self.navigation_timeout).await;

        outcome
    }

    async fn visit(&self, page: &dyn Page, url: &str) -> Result<PageMetadata, PageError> {
        tracing::debug!(url = url, "navigating");
        page.goto(
            url,
            &NavigateOptions {
                timeout: self.navigation_timeout,
                wait_until: WaitUntil::NetworkIdle,
            },
        )
        .await?;
        time::sleep(self.settle_delay).await;
        extract_metadata(page).await
    }
}
