//! An in-memory [`Browser`] serving fixed HTML documents.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use mediascraper::browser::{Browser, BrowserError, NavigateOptions, Page, Session};
use scraper::{Html, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Goto(String),
    Close(Option<String>),
}

#[derive(Debug, Clone)]
pub enum Site {
    Html {
        body: String,
        delay: Duration,
    },
    /// Navigation never finishes.
    Hang,
    /// Navigation fails with the given reason.
    Unreachable(&'static str),
}

/// How the n-th `new_page` call of a session misbehaves.
#[derive(Debug, Clone)]
pub enum OpenFault {
    Fail(&'static str),
    /// The page opens, after the given delay.
    Slow(Duration),
}

/// How closing the page of a URL misbehaves. The page stays open.
#[derive(Debug, Clone)]
pub enum CloseFault {
    Fail(&'static str),
    Hang,
}

#[derive(Debug, Clone)]
pub struct Navigation {
    pub url: String,
    pub options: NavigateOptions,
    pub loaded_at: Option<Instant>,
}

impl Site {
    pub fn html(body: &str) -> Site {
        Site::Html {
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(body: &str, delay: Duration) -> Site {
        Site::Html {
            body: body.to_string(),
            delay,
        }
    }
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub open_pages: AtomicUsize,
    pub peak_open_pages: AtomicUsize,
    pub sessions_launched: AtomicUsize,
    pub sessions_closed: AtomicUsize,
    pub pages_requested: AtomicUsize,
    pub events: Mutex<Vec<Event>>,
    pub navigations: Mutex<Vec<Navigation>>,
    /// When the document of a URL was first queried.
    pub first_queries: Mutex<HashMap<String, Instant>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn first_query(&self, url: &str) -> Option<Instant> {
        self.first_queries.lock().unwrap().get(url).copied()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn page_opened(&self) {
        let open = self.open_pages.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_open_pages.fetch_max(open, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct FakeBrowser {
    sites: Arc<HashMap<String, Site>>,
    pub recorder: Arc<Recorder>,
    fail_launch: bool,
    open_faults: HashMap<usize, OpenFault>,
    close_faults: HashMap<String, CloseFault>,
}

impl FakeBrowser {
    pub fn new<I: IntoIterator<Item = (String, Site)>>(sites: I) -> Self {
        Self {
            sites: Arc::new(sites.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn failing_launch() -> Self {
        Self {
            fail_launch: true,
            ..Default::default()
        }
    }

    /// Make the `ordinal`-th page requested from each session misbehave.
    pub fn with_open_fault(mut self, ordinal: usize, fault: OpenFault) -> Self {
        self.open_faults.insert(ordinal, fault);
        self
    }

    pub fn with_close_fault(mut self, url: &str, fault: CloseFault) -> Self {
        self.close_faults.insert(url.to_string(), fault);
        self
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    fn name(&self) -> String {
        "fake".to_string()
    }

    async fn launch(&self) -> Result<Arc<dyn Session>, BrowserError> {
        if self.fail_launch {
            return Err(BrowserError::Launch("no chrome binary".to_string()));
        }
        self.recorder.sessions_launched.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeSession {
            sites: self.sites.clone(),
            recorder: self.recorder.clone(),
            open_faults: self.open_faults.clone(),
            close_faults: Arc::new(self.close_faults.clone()),
            pages_requested: AtomicUsize::new(0),
        }))
    }
}

struct FakeSession {
    sites: Arc<HashMap<String, Site>>,
    recorder: Arc<Recorder>,
    open_faults: HashMap<usize, OpenFault>,
    close_faults: Arc<HashMap<String, CloseFault>>,
    pages_requested: AtomicUsize,
}

#[async_trait]
impl Session for FakeSession {
    async fn new_page(&self) -> Result<Box<dyn Page>, BrowserError> {
        let ordinal = self.pages_requested.fetch_add(1, Ordering::SeqCst);
        self.recorder.pages_requested.fetch_add(1, Ordering::SeqCst);
        match self.open_faults.get(&ordinal) {
            Some(OpenFault::Fail(reason)) => {
                return Err(BrowserError::Protocol(reason.to_string()));
            }
            Some(OpenFault::Slow(delay)) => tokio::time::sleep(*delay).await,
            None => {}
        }
        self.recorder.page_opened();
        Ok(Box::new(FakePage {
            sites: self.sites.clone(),
            recorder: self.recorder.clone(),
            close_faults: self.close_faults.clone(),
            url: Mutex::new(None),
            body: Mutex::new(None),
        }))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.recorder.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakePage {
    sites: Arc<HashMap<String, Site>>,
    recorder: Arc<Recorder>,
    close_faults: Arc<HashMap<String, CloseFault>>,
    url: Mutex<Option<String>>,
    body: Mutex<Option<String>>,
}

impl FakePage {
    fn select(
        &self,
        selector: &str,
        read: impl Fn(scraper::ElementRef<'_>) -> Option<String>,
    ) -> Result<Option<String>, BrowserError> {
        let selector =
            Selector::parse(selector).map_err(|err| BrowserError::Evaluation(err.to_string()))?;
        if let Some(url) = self.url.lock().unwrap().clone() {
            self.recorder
                .first_queries
                .lock()
                .unwrap()
                .entry(url)
                .or_insert_with(Instant::now);
        }
        let body = self.body.lock().unwrap();
        let Some(body) = body.as_deref() else {
            return Err(BrowserError::Evaluation("no document loaded".to_string()));
        };
        let document = Html::parse_document(body);
        Ok(document.select(&selector).next().and_then(read))
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str, options: &NavigateOptions) -> Result<(), BrowserError> {
        *self.url.lock().unwrap() = Some(url.to_string());
        self.recorder.record(Event::Goto(url.to_string()));
        let navigation = {
            let mut navigations = self.recorder.navigations.lock().unwrap();
            navigations.push(Navigation {
                url: url.to_string(),
                options: options.clone(),
                loaded_at: None,
            });
            navigations.len() - 1
        };

        let site = self.sites.get(url).cloned();
        let load = async {
            match site {
                Some(Site::Html { body, delay }) => {
                    tokio::time::sleep(delay).await;
                    *self.body.lock().unwrap() = Some(body);
                    self.recorder.navigations.lock().unwrap()[navigation].loaded_at =
                        Some(Instant::now());
                    Ok(())
                }
                Some(Site::Hang) => futures::future::pending().await,
                Some(Site::Unreachable(reason)) => Err(BrowserError::Navigation {
                    url: url.to_string(),
                    reason: reason.to_string(),
                }),
                None => Err(BrowserError::Navigation {
                    url: url.to_string(),
                    reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
                }),
            }
        };
        tokio::time::timeout(options.timeout, load)
            .await
            .map_err(|_| BrowserError::Timeout(options.timeout))?
    }

    async fn text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        self.select(selector, |el| Some(el.text().collect::<String>()))
    }

    async fn attribute(
        &self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        self.select(selector, |el| el.value().attr(name).map(str::to_string))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let url = self.url.lock().unwrap().clone();
        match url.as_ref().and_then(|url| self.close_faults.get(url)) {
            Some(CloseFault::Fail(reason)) => {
                return Err(BrowserError::Protocol(reason.to_string()));
            }
            Some(CloseFault::Hang) => futures::future::pending::<()>().await,
            None => {}
        }
        self.recorder.record(Event::Close(url));
        self.recorder.open_pages.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn page_with_title(title: &str) -> String {
    format!(
        r#"<html><head><meta property="og:image" content="https://img.test/{title}.png"></head>
<body><h1>{title}</h1></body></html>"#
    )
}
