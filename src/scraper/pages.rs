//! Page lifetimes.
//!
//! Every page holds a permit of the scraper's semaphore from the moment the
//! browser is asked for it until its `close` has returned `Ok`. Opening and
//! closing run on spawned tasks, so a caller that stops waiting does not drop
//! them halfway: a page that opens too late is closed by its opener, and a
//! page whose close hangs or fails keeps its permit.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{oneshot, OwnedSemaphorePermit, Semaphore},
    time,
};

use super::statistics::Statistics;
use crate::{
    browser::{BrowserError, Page, Session},
    error::PageError,
};

pub(crate) struct OpenPage {
    page: Box<dyn Page>,
    permit: OwnedSemaphorePermit,
    stats: Statistics,
}

impl OpenPage {
    pub(crate) fn page(&self) -> &dyn Page {
        self.page.as_ref()
    }

    async fn close(self) -> Result<(), BrowserError> {
        let OpenPage {
            mut page,
            permit,
            stats,
        } = self;
        match page.close().await {
            Ok(()) => {
                stats.page_closed();
                drop(permit);
                Ok(())
            }
            Err(err) => {
                // the page may still be open
                permit.forget();
                Err(err)
            }
        }
    }
}

/// Wait for a free slot and open a page in `session`.
///
/// Both the wait and the opening are bounded by `timeout`.
pub(crate) async fn open_page(
    session: &Arc<dyn Session>,
    slots: &Arc<Semaphore>,
    stats: &Statistics,
    timeout: Duration,
) -> Result<OpenPage, PageError> {
    let permit = time::timeout(timeout, Arc::clone(slots).acquire_owned())
        .await
        .map_err(|_| PageError::Timeout {
            step: "waiting for a free page",
            timeout,
        })?
        .map_err(|_| PageError::SlotUnavailable)?;

    let (tx, mut rx) = oneshot::channel();
    let session = Arc::clone(session);
    let stats = stats.clone();
    tokio::spawn(async move {
        let opened = session.new_page().await.map(|page| {
            stats.page_opened();
            OpenPage {
                page,
                permit,
                stats,
            }
        });
        if let Err(Ok(late)) = tx.send(opened) {
            tracing::debug!("closing page that opened after its scrape gave up");
            if let Err(err) = late.close().await {
                tracing::warn!("failed to close late page, keeping its slot: {}", err);
            }
        }
    });

    match time::timeout(timeout, &mut rx).await {
        Ok(Ok(opened)) => Ok(opened?),
        Ok(Err(_)) => Err(PageError::SlotUnavailable),
        Err(_) => {
            // after `close` a page is either received here or closed by its opener
            rx.close();
            match rx.try_recv() {
                Ok(opened) => Ok(opened?),
                Err(_) => Err(PageError::Timeout {
                    step: "opening page",
                    timeout,
                }),
            }
        }
    }
}

/// Close `opened`, waiting at most `timeout` for it.
pub(crate) async fn close_page(opened: OpenPage, url: &str, timeout: Duration) {
    let page_url = url.to_string();
    let closing = tokio::spawn(async move {
        if let Err(err) = opened.close().await {
            tracing::warn!(url = page_url, "failed to close page, keeping its slot: {}", err);
        }
    });
    match time::timeout(timeout, closing).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::error!(url = url, "page close task failed: {:?}", err),
        Err(_) => tracing::warn!(
            url = url,
            "page still closing after {:?}, keeping its slot",
            timeout
        ),
    }
}
