//! A library for scraping media metadata (title, description, thumbnail)
//! from share pages with a headless browser.
//!
//! [`Scraper::scrape`] takes a batch of URLs, [normalizes](normalize::normalize)
//! them and renders each one in its own page of a shared browser session,
//! never more than [`MAX_CONCURRENT_PAGES`] at a time. Every URL yields a
//! [`ScrapedMetadata`], successful or not.

pub mod browser;
pub mod config;
mod error;
pub mod extract;
pub mod media;
mod metadata;
pub mod normalize;
pub mod scraper;

pub use browser::{Browser, ChromiumBrowser, ChromiumConfig, Page, Session};
pub use config::ScraperConfig;
pub use error::{PageError, ScrapeError};
pub use metadata::{PageMetadata, ScrapedMetadata};
pub use scraper::{Scraper, ScraperOptions, MAX_CONCURRENT_PAGES};
