//! The browser seam: what the extraction engine needs from a live page, and a
//! Chrome implementation over WebDriver.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thirtyfour::ChromiumLikeCapabilities;
use thirtyfour::prelude::*;
use tracing::{debug, info, warn};

use crate::config::ParserSettings;
use crate::error::BrowserError;

/// Page operations addressed by XPath locator. Every call re-locates its
/// element, so retrying a call after a stale reference starts from scratch.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn current_url(&self) -> Result<String, BrowserError>;

    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// `document.readyState` of the current page.
    async fn ready_state(&self) -> Result<String, BrowserError>;

    /// Text of the first element matching `locator`.
    async fn text(&self, locator: &str) -> Result<String, BrowserError>;

    /// `attribute` of every element matching `locator`, in document order.
    /// Elements without the attribute are skipped; no match gives an empty list.
    async fn attributes(&self, locator: &str, attribute: &str) -> Result<Vec<String>, BrowserError>;

    /// Replaces the content of the field matching `locator` with `text`.
    async fn type_text(&self, locator: &str, text: &str) -> Result<(), BrowserError>;

    async fn press_enter(&self, locator: &str) -> Result<(), BrowserError>;

    async fn click(&self, locator: &str) -> Result<(), BrowserError>;

    /// Ends the session. Calling it again, or after the session died, is fine.
    async fn quit(&mut self) -> Result<(), BrowserError>;
}

/// Quits `browser` on an error path where the quit result can't be returned.
/// A failed quit is logged. Returns whether the quit went through.
pub(crate) async fn quit_logged<B: Browser + ?Sized>(browser: &mut B, what: &str) -> bool {
    match browser.quit().await {
        Ok(()) => true,
        Err(err) => {
            warn!("Failed to quit {what}: {err}");
            false
        }
    }
}

/// A Chrome session driven through a WebDriver server.
pub struct ChromeSession {
    driver: Option<WebDriver>,
}

impl ChromeSession {
    pub async fn start(settings: &ParserSettings) -> Result<Self, BrowserError> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in &settings.browser_args {
            caps.add_arg(arg)?;
        }
        if settings.disable_images {
            caps.add_experimental_option(
                "prefs",
                json!({
                    "profile.managed_default_content_settings.images": 2,
                    "profile.managed_default_content_settings.stylesheets": 2,
                }),
            )?;
        }

        info!("Starting browser session at {}", settings.webdriver_url);
        let driver = WebDriver::new(settings.webdriver_url.as_str(), caps).await?;
        let mut session = Self { driver: Some(driver) };

        if let Err(err) = session.apply_timeouts(settings.implicit_timeout()).await {
            warn!("Browser session set-up failed, quitting: {err}");
            quit_logged(&mut session, "half-started browser session").await;
            return Err(err);
        }
        Ok(session)
    }

    async fn apply_timeouts(&self, implicit: Duration) -> Result<(), BrowserError> {
        self.driver()?.set_implicit_wait_timeout(implicit).await?;
        Ok(())
    }

    fn driver(&self) -> Result<&WebDriver, BrowserError> {
        self.driver.as_ref().ok_or(BrowserError::SessionClosed)
    }

    async fn find(&self, locator: &str) -> Result<WebElement, BrowserError> {
        Ok(self.driver()?.find(By::XPath(locator)).await?)
    }
}

#[async_trait]
impl Browser for ChromeSession {
    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.driver()?.current_url().await?.to_string())
    }

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.driver()?.goto(url).await?;
        Ok(())
    }

    async fn ready_state(&self) -> Result<String, BrowserError> {
        let ret = self
            .driver()?
            .execute("return document.readyState;", Vec::new())
            .await?;
        Ok(ret.json().as_str().unwrap_or_default().to_string())
    }

    async fn text(&self, locator: &str) -> Result<String, BrowserError> {
        Ok(self.find(locator).await?.text().await?)
    }

    async fn attributes(&self, locator: &str, attribute: &str) -> Result<Vec<String>, BrowserError> {
        let elements = self.driver()?.find_all(By::XPath(locator)).await?;
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            if let Some(value) = element.attr(attribute).await? {
                values.push(value);
            }
        }
        Ok(values)
    }

    async fn type_text(&self, locator: &str, text: &str) -> Result<(), BrowserError> {
        let field = self.find(locator).await?;
        field.clear().await?;
        field.send_keys(text).await?;
        Ok(())
    }

    async fn press_enter(&self, locator: &str) -> Result<(), BrowserError> {
        self.find(locator).await?.send_keys(Key::Enter).await?;
        Ok(())
    }

    async fn click(&self, locator: &str) -> Result<(), BrowserError> {
        self.find(locator).await?.click().await?;
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        match self.driver.take() {
            Some(driver) => {
                debug!("Quitting browser session");
                driver.quit().await?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        let Some(driver) = self.driver.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = driver.quit().await {
                        warn!("Failed to quit dropped browser session: {err}");
                    }
                });
            }
            Err(_) => warn!("Browser session dropped outside a runtime; leaving it to the driver"),
        }
    }
}
