//! Parser settings, read from a TOML file with environment overrides.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ParserError, ParserResult};
use crate::retry::RetryPolicy;

pub const WEBDRIVER_URL_ENV: &str = "PRICESCOUT_WEBDRIVER_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Address of the chromedriver (or any W3C WebDriver) server.
    pub webdriver_url: String,
    pub browser_args: Vec<String>,
    /// Turns off image and stylesheet loading through Chrome prefs.
    pub disable_images: bool,
    pub implicit_timeout_ms: u64,
    pub explicit_timeout_ms: u64,
    pub page_load_poll_ms: u64,
    pub retry: RetryPolicy,
    /// Whole search attempts made when a search comes back empty.
    pub search_attempts: u32,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            browser_args: vec![
                "--headless".to_string(),
                "--disable-gpu".to_string(),
                "--incognito".to_string(),
            ],
            disable_images: true,
            implicit_timeout_ms: 3_000,
            explicit_timeout_ms: 5_000,
            page_load_poll_ms: 100,
            retry: RetryPolicy::default(),
            search_attempts: 3,
        }
    }
}

impl ParserSettings {
    /// Reads `path` when given, otherwise starts from defaults, then applies
    /// the environment.
    pub fn load(path: Option<&Path>) -> ParserResult<Self> {
        let mut settings = match path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .map_err(|e| ParserError::Config(format!("{}: {e}", path.display())))?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };

        if let Ok(url) = env::var(WEBDRIVER_URL_ENV) {
            if !url.trim().is_empty() {
                settings.webdriver_url = url;
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml(raw: &str) -> ParserResult<Self> {
        toml::from_str(raw).map_err(|e| ParserError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ParserResult<()> {
        if self.retry.max_attempts == 0 {
            return Err(ParserError::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.search_attempts == 0 {
            return Err(ParserError::Config("search_attempts must be at least 1".into()));
        }
        if self.page_load_poll_ms == 0 {
            return Err(ParserError::Config("page_load_poll_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn implicit_timeout(&self) -> Duration {
        Duration::from_millis(self.implicit_timeout_ms)
    }

    pub fn explicit_timeout(&self) -> Duration {
        Duration::from_millis(self.explicit_timeout_ms)
    }

    pub fn page_load_poll(&self) -> Duration {
        Duration::from_millis(self.page_load_poll_ms)
    }
}
