//! Product price scraping over a real browser.
//!
//! A [`Parser`] owns one WebDriver session and one [`SiteProfile`]. It can read
//! a single product page ([`Parser::extract_product`]) or run the site's own
//! search and read the first results ([`Parser::search_products`]).

pub mod browser;
pub mod config;
pub mod error;
pub mod logging;
pub mod parser;
pub mod price;
pub mod product;
pub mod profile;
pub mod retry;
pub mod sites;
pub mod store;

pub use browser::{Browser, ChromeSession};
pub use config::ParserSettings;
pub use error::{BrowserError, ParserError, ParserResult};
pub use parser::Parser;
pub use price::{Price, PriceFormat};
pub use product::{ExtractOptions, PriceDetails, ProductInfo};
pub use profile::{ProductLocators, SearchLocators, SiteProfile};
pub use retry::RetryPolicy;
pub use sites::{DefaultRules, SiteKind, SiteRules, SubmitStrategy};
pub use store::{JsonProfileStore, MemoryProfileStore, ProfileStore, resolve_profile};
