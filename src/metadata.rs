use serde::{Deserialize, Serialize};

/// Metadata read from a rendered page.
///
/// `title` is never empty; the optional fields are `None` rather than empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

/// Outcome of scraping one URL.
///
/// A successful result has a non-empty `title` and no `error`; a failed one
/// has an empty `title` and an `error` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedMetadata {
    /// The normalized URL that was visited.
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapedMetadata {
    pub fn succeeded<S: Into<String>>(url: S, page: PageMetadata) -> Self {
        Self {
            url: url.into(),
            title: page.title,
            description: page.description,
            thumbnail: page.thumbnail,
            error: None,
        }
    }

    pub fn failed<S: Into<String>, E: ToString>(url: S, error: E) -> Self {
        let mut error = error.to_string();
        if error.is_empty() {
            error = "unknown error".to_string();
        }
        Self {
            url: url.into(),
            title: String::new(),
            description: None,
            thumbnail: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
