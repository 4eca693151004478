use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// Counters for one `scrape` call.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub num_scrapings: Arc<AtomicUsize>,
    pub num_scrape_errors: Arc<AtomicUsize>,
    pub open_pages: Arc<AtomicUsize>,
    pub peak_open_pages: Arc<AtomicUsize>,
}

impl Statistics {
    pub fn scrape_started(&self) {
        self.num_scrapings.fetch_add(1, Ordering::SeqCst);
    }

    pub fn scrape_failed(&self) {
        self.num_scrape_errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn page_opened(&self) {
        let open = self.open_pages.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_open_pages.fetch_max(open, Ordering::SeqCst);
    }

    pub fn page_closed(&self) {
        self.open_pages.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn write_to_log(&self, running_time: Duration) {
        let num_scrapes = self.num_scrapings.load(Ordering::Relaxed);
        let num_scrap_errors = self.num_scrape_errors.load(Ordering::Relaxed);
        let peak_pages = self.peak_open_pages.load(Ordering::Relaxed);
        tracing::info!(
            num_scrapings = num_scrapes,
            num_scrape_errors = num_scrap_errors,
            peak_open_pages = peak_pages,
            running_time = ?running_time,
            "statistics"
        );
    }
}
