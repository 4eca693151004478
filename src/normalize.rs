//! Canonicalization of share URLs.
//!
//! Share links come in many shapes (`terabox.com`, `www.terabox.com`,
//! mirror domains, tracking query parameters, fragments). They all carry the
//! share identifier in a `/s/<id>` path segment, so that identifier alone is
//! enough to rebuild a stable URL that is safe to use as a storage key.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Host every recognised share link is rewritten to.
pub const CANONICAL_SHARE_BASE: &str = "https://www.terabox.com/s/";

fn share_path() -> Option<&'static Regex> {
    static SHARE_PATH: OnceLock<Option<Regex>> = OnceLock::new();
    SHARE_PATH
        .get_or_init(|| match Regex::new(r"/s/([A-Za-z0-9_-]+)") {
            Ok(regex) => Some(regex),
            Err(err) => {
                tracing::error!("invalid share path pattern: {}", err);
                None
            }
        })
        .as_ref()
}

/// Normalize a share URL.
///
/// Returns `https://www.terabox.com/s/<id>` when the URL path contains a
/// `/s/<id>` segment, and the input unchanged in every other case,
/// including when the input does not parse as a URL.
pub fn normalize(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::debug!(url = url, "not normalizing unparsable url: {}", err);
            return url.to_string();
        }
    };

    match share_path()
        .and_then(|pattern| pattern.captures(parsed.path()))
        .and_then(|captures| captures.get(1))
    {
        Some(id) => format!("{}{}", CANONICAL_SHARE_BASE, id.as_str()),
        None => url.to_string(),
    }
}
