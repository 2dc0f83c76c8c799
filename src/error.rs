//! Error types for browser operations and product extraction.

use std::num::ParseFloatError;

use thiserror::Error;

/// Failure of a single browser operation.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("stale element reference: {0}")]
    StaleElement(String),

    #[error("no element matches {0}")]
    NoSuchElement(String),

    #[error("browser session is closed")]
    SessionClosed,

    #[error("webdriver error: {0}")]
    WebDriver(#[from] Box<thirtyfour::error::WebDriverError>),

    #[error("{operation} failed after {attempts} attempts")]
    Exhausted {
        operation: String,
        attempts: u32,
        #[source]
        last: Box<BrowserError>,
    },
}

impl BrowserError {
    pub fn timeout(what: impl Into<String>) -> Self {
        Self::Timeout(what.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleElement(_))
    }

    /// Timeouts and stale references are expected to clear up on retry.
    pub fn is_transient(&self) -> bool {
        self.is_timeout() || self.is_stale()
    }
}

impl From<thirtyfour::error::WebDriverError> for BrowserError {
    fn from(err: thirtyfour::error::WebDriverError) -> Self {
        use thirtyfour::error::WebDriverErrorInner;

        match &*err {
            WebDriverErrorInner::NoSuchElement(..) => Self::NoSuchElement(err.to_string()),
            WebDriverErrorInner::StaleElementReference(..) => Self::StaleElement(err.to_string()),
            WebDriverErrorInner::Timeout(..) => Self::Timeout(err.to_string()),
            _ => Self::WebDriver(Box::new(err)),
        }
    }
}

/// Errors surfaced by the extraction engine.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{site}: price not found with {locator}")]
    PriceNotFound {
        site: String,
        locator: String,
        #[source]
        source: Option<BrowserError>,
    },

    #[error("{site}: availability not found with {locator}")]
    AvailabilityNotFound {
        site: String,
        locator: String,
        #[source]
        source: BrowserError,
    },

    #[error("{site}: title not found with {locator}")]
    TitleNotFound {
        site: String,
        locator: String,
        #[source]
        source: BrowserError,
    },

    #[error("price {input:?} does not match format {pattern:?}")]
    PriceFormat { pattern: String, input: String },

    #[error("matched price {matched:?} is not a number")]
    PriceParse {
        matched: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("{url} does not belong to {base_url}")]
    InvalidPage { url: String, base_url: String },

    #[error("{site}: unable to open search results ({stage})")]
    SearchOpen {
        site: String,
        stage: &'static str,
        #[source]
        source: Box<ParserError>,
    },

    #[error("found {found} products, {requested} requested")]
    InsufficientResults { requested: usize, found: usize },

    #[error("failed to load {url}")]
    PageLoad {
        url: String,
        #[source]
        source: BrowserError,
    },

    #[error("site profile field {field} is empty or invalid")]
    InvalidProfile { field: &'static str },

    #[error("invalid price format pattern")]
    InvalidPattern(#[from] regex::Error),

    #[error("unable to start browser session")]
    Session(#[source] BrowserError),

    #[error("profile store: {0}")]
    Store(String),

    #[error("configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

impl ParserError {
    /// True for the "element not found" family: price, availability and title.
    pub fn is_element_not_found(&self) -> bool {
        matches!(
            self,
            Self::PriceNotFound { .. } | Self::AvailabilityNotFound { .. } | Self::TitleNotFound { .. }
        )
    }

    pub fn is_price_format(&self) -> bool {
        matches!(self, Self::PriceFormat { .. } | Self::PriceParse { .. })
    }
}

pub type ParserResult<T> = Result<T, ParserError>;
