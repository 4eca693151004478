//! Merging scrape results into stored media records.

use chrono::{DateTime, Utc};

use crate::{error::ScrapeError, metadata::ScrapedMetadata, scraper::Scraper};

/// Title a media item carries until its metadata has been scraped.
pub const PLACEHOLDER_TITLE: &str = "Processing...";

/// The metadata part of a stored media item.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub error: Option<String>,
    pub scraped_at: Option<DateTime<Utc>>,
}

impl MediaMetadata {
    pub fn pending<S: Into<String>>(url: S) -> MediaMetadata {
        Self {
            url: url.into(),
            title: PLACEHOLDER_TITLE.to_string(),
            description: None,
            thumbnail: None,
            error: None,
            scraped_at: None,
        }
    }

    pub fn needs_metadata(&self) -> bool {
        self.title.is_empty()
            || self.title == PLACEHOLDER_TITLE
            || self.thumbnail.is_none()
            || self.scraped_at.is_none()
    }

    pub fn apply(&mut self, result: &ScrapedMetadata) {
        self.apply_at(result, Utc::now());
    }

    /// Merge `result` into this record.
    ///
    /// A failed result only records its error, so an earlier good title,
    /// description or thumbnail survives it.
    pub fn apply_at(&mut self, result: &ScrapedMetadata, now: DateTime<Utc>) {
        self.scraped_at = Some(now);
        if let Some(error) = &result.error {
            self.error = Some(error.clone());
            return;
        }
        if !result.title.is_empty() {
            self.title = result.title.clone();
        }
        if result.description.is_some() {
            self.description = result.description.clone();
        }
        if result.thumbnail.is_some() {
            self.thumbnail = result.thumbnail.clone();
        }
        self.error = None;
    }
}

/// Scrape every record that [needs metadata](MediaMetadata::needs_metadata)
/// and merge the results back.
///
/// Returns the number of records that were scraped.
pub async fn enrich(
    scraper: &Scraper,
    records: &mut [MediaMetadata],
) -> Result<usize, ScrapeError> {
    let pending: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.needs_metadata())
        .map(|(index, _)| index)
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let urls: Vec<&str> = pending
        .iter()
        .map(|&index| records[index].url.as_str())
        .collect();
    let results = scraper.scrape(&urls).await?;

    let now = Utc::now();
    for (index, result) in pending.iter().zip(&results) {
        records[*index].apply_at(result, now);
    }
    Ok(pending.len())
}
