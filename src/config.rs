//! File based configuration.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    browser::ChromiumConfig,
    scraper::{ScraperOptions, MAX_CONCURRENT_PAGES},
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Scraper and browser settings, as read from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Pages scraped at the same time (at most 5)
    pub max_concurrent_pages: usize,
    /// Bound on opening a page and loading it until the network is idle (seconds)
    pub navigation_timeout_secs: u64,
    /// Extra wait after the network went idle (milliseconds)
    pub settle_delay_ms: u64,
    /// Bound on all work for a single URL (seconds)
    pub page_timeout_secs: u64,
    /// Run the browser without a window
    pub headless: bool,
    /// Chrome/Chromium executable, auto-detected when unset
    pub chrome_path: Option<PathBuf>,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pages: MAX_CONCURRENT_PAGES,
            navigation_timeout_secs: 30,
            settle_delay_ms: 2000,
            page_timeout_secs: 60,
            headless: true,
            chrome_path: None,
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

impl ScraperConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ScraperConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.max_concurrent_pages == 0 || self.max_concurrent_pages > MAX_CONCURRENT_PAGES {
            errors.push(format!(
                "max_concurrent_pages must be between 1 and {MAX_CONCURRENT_PAGES}"
            ));
        }
        if self.navigation_timeout_secs == 0 {
            errors.push("navigation_timeout_secs must be positive".to_string());
        }
        if self.page_timeout_secs == 0 {
            errors.push("page_timeout_secs must be positive".to_string());
        } else if self.page_timeout_secs < self.navigation_timeout_secs {
            errors.push(
                "page_timeout_secs must not be shorter than navigation_timeout_secs".to_string(),
            );
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            errors.push("viewport dimensions must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    pub fn options(&self) -> ScraperOptions {
        ScraperOptions {
            concurrency: self.max_concurrent_pages,
            navigation_timeout: Duration::from_secs(self.navigation_timeout_secs),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            page_timeout: Duration::from_secs(self.page_timeout_secs),
        }
    }

    pub fn chromium(&self) -> ChromiumConfig {
        ChromiumConfig {
            headless: self.headless,
            chrome_path: self.chrome_path.clone(),
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            request_timeout: Duration::from_secs(self.navigation_timeout_secs),
        }
    }
}
