//! Site profiles: what to look for on a shop and where.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ParserError, ParserResult};
use crate::price::{Price, PriceFormat};

/// Extraction contract of one target website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Search entry point, and the domain every opened page must belong to.
    pub base_url: String,
    /// Regular expression locating the number inside a raw price string.
    pub price_format: String,
    pub product: ProductLocators,
    pub search: SearchLocators,
}

/// XPath locators of a product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLocators {
    pub price: String,
    pub price_without_sale: String,
    pub price_on_sale: String,
    pub availability: String,
    pub title: String,
    /// Literal text whose presence in the availability element means "in stock".
    pub available_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLocators {
    pub search_field: String,
    /// Absent for sites that only submit on Enter.
    pub submit_button: Option<String>,
    /// Matches every result link on the search results page.
    pub result_links: String,
    pub link_attribute: String,
}

impl SiteProfile {
    /// Checks that every field is filled in (only the submit button may be
    /// missing), the base URL parses and the price pattern compiles.
    pub fn validate(&self) -> ParserResult<()> {
        let required = [
            ("base_url", &self.base_url),
            ("price_format", &self.price_format),
            ("product.price", &self.product.price),
            ("product.price_without_sale", &self.product.price_without_sale),
            ("product.price_on_sale", &self.product.price_on_sale),
            ("product.availability", &self.product.availability),
            ("product.title", &self.product.title),
            ("product.available_text", &self.product.available_text),
            ("search.search_field", &self.search.search_field),
            ("search.result_links", &self.search.result_links),
            ("search.link_attribute", &self.search.link_attribute),
        ];
        if let Some(&(field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ParserError::InvalidProfile { field });
        }
        if self
            .search
            .submit_button
            .as_deref()
            .is_some_and(|button| button.trim().is_empty())
        {
            return Err(ParserError::InvalidProfile {
                field: "search.submit_button",
            });
        }

        self.base()?;
        self.compile_price_format()?;
        Ok(())
    }

    pub fn base(&self) -> ParserResult<Url> {
        Url::parse(&self.base_url).map_err(|_| ParserError::InvalidProfile { field: "base_url" })
    }

    pub fn compile_price_format(&self) -> ParserResult<PriceFormat> {
        PriceFormat::new(&self.price_format)
    }

    /// One-off normalization against this profile's price pattern.
    pub fn normalize_price(&self, raw: &str, ignore_format_errors: bool) -> ParserResult<Price> {
        self.compile_price_format()?.normalize(raw, ignore_format_errors)
    }

    /// Whether `url` is on this site: same host as the base URL, or a
    /// subdomain of it, ignoring a leading `www.`.
    pub fn owns(&self, url: &Url) -> bool {
        let Ok(base) = self.base() else {
            return false;
        };
        let (Some(site), Some(host)) = (base.host_str(), url.host_str()) else {
            return false;
        };
        let site = site.strip_prefix("www.").unwrap_or(site);
        let host = host.strip_prefix("www.").unwrap_or(host);

        host == site || host.ends_with(&format!(".{site}"))
    }
}

impl std::fmt::Display for SiteProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base_url)
    }
}

#[cfg(test)]
pub(crate) fn sample_profile() -> SiteProfile {
    SiteProfile {
        base_url: "https://shop.example.com/".into(),
        price_format: r"\d+".into(),
        product: ProductLocators {
            price: "//p[@class='price']".into(),
            price_without_sale: "//p[@class='old-price']".into(),
            price_on_sale: "//p[@class='sale-price']".into(),
            availability: "//p[@class='status']".into(),
            title: "//h1".into(),
            available_text: "In stock".into(),
        },
        search: SearchLocators {
            search_field: "//input[@name='q']".into(),
            submit_button: Some("//button[@type='submit']".into()),
            result_links: "//a[@class='tile']".into(),
            link_attribute: "href".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_profile_is_valid() {
        sample_profile().validate().unwrap();
    }

    #[test]
    fn missing_submit_button_is_allowed() {
        let mut profile = sample_profile();
        profile.search.submit_button = None;
        profile.validate().unwrap();
    }

    #[test]
    fn empty_fields_are_rejected() {
        let mut profile = sample_profile();
        profile.product.title = "  ".into();
        assert!(matches!(
            profile.validate(),
            Err(ParserError::InvalidProfile { field: "product.title" })
        ));

        let mut profile = sample_profile();
        profile.search.submit_button = Some(String::new());
        assert!(matches!(
            profile.validate(),
            Err(ParserError::InvalidProfile { field: "search.submit_button" })
        ));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let mut profile = sample_profile();
        profile.price_format = r"\d+(".into();
        assert!(matches!(profile.validate(), Err(ParserError::InvalidPattern(_))));
    }

    #[test]
    fn ownership_follows_host() {
        let profile = sample_profile();
        let owned = |url: &str| profile.owns(&Url::parse(url).unwrap());

        assert!(owned("https://shop.example.com/p/1"));
        assert!(owned("https://www.shop.example.com/p/1"));
        assert!(owned("https://m.shop.example.com/p/1"));
        assert!(!owned("https://example.com/p/1"));
        assert!(!owned("https://shop.example.com.evil.net/p/1"));
    }

    #[test]
    fn normalizes_with_own_pattern() {
        let price = sample_profile().normalize_price("1 234 грн", false).unwrap();
        assert_eq!(price, Price::Amount(1234.0));
    }
}
