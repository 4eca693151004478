//! Metadata extraction from a rendered page.
//!
//! Every field has an ordered list of [`Extractor`]s. They are tried in turn
//! and the first non-blank value wins.

use crate::{
    browser::{BrowserError, Page},
    error::PageError,
    metadata::PageMetadata,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// Text content of the first element matching the selector.
    Text(&'static str),
    /// `content` of `<meta property="...">`.
    Meta(&'static str),
    /// An attribute of the first element matching the selector.
    Attribute {
        selector: &'static str,
        attribute: &'static str,
    },
}

pub const TITLE_EXTRACTORS: &[Extractor] = &[
    Extractor::Text("h1"),
    Extractor::Text(".video-title"),
    Extractor::Text(".title"),
    Extractor::Text(".file-name"),
    Extractor::Meta("og:title"),
];

pub const DESCRIPTION_EXTRACTORS: &[Extractor] = &[
    Extractor::Text(".description"),
    Extractor::Text(".desc"),
    Extractor::Text("#description"),
    Extractor::Meta("og:description"),
];

pub const THUMBNAIL_EXTRACTORS: &[Extractor] = &[
    Extractor::Meta("og:image"),
    Extractor::Attribute {
        selector: "video",
        attribute: "poster",
    },
    Extractor::Attribute {
        selector: "img",
        attribute: "src",
    },
];

impl Extractor {
    pub async fn apply(&self, page: &dyn Page) -> Result<Option<String>, BrowserError> {
        let value = match *self {
            Extractor::Text(selector) => page.text(selector).await?,
            Extractor::Meta(property) => {
                page.attribute(&format!("meta[property=\"{property}\"]"), "content")
                    .await?
            }
            Extractor::Attribute {
                selector,
                attribute,
            } => page.attribute(selector, attribute).await?,
        };
        Ok(value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()))
    }
}

/// First non-blank value produced by `extractors`, in order.
pub async fn first_match(
    page: &dyn Page,
    extractors: &[Extractor],
) -> Result<Option<String>, BrowserError> {
    for extractor in extractors {
        if let Some(value) = extractor.apply(page).await? {
            tracing::trace!(?extractor, "extracted '{}'", value);
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Read title, description and thumbnail from `page`.
///
/// A missing title is an error, the other fields are optional.
pub async fn extract_metadata(page: &dyn Page) -> Result<PageMetadata, PageError> {
    let title = first_match(page, TITLE_EXTRACTORS)
        .await?
        .ok_or(PageError::NoTitle)?;
    let description = first_match(page, DESCRIPTION_EXTRACTORS).await?;
    let thumbnail = first_match(page, THUMBNAIL_EXTRACTORS).await?;
    Ok(PageMetadata {
        title,
        description,
        thumbnail,
    })
}
