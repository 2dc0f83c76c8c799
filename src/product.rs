use serde::{Deserialize, Serialize};

use crate::price::Price;

/// What could be read off one product page. `None` means the field was not
/// attempted or could not be determined, never a confirmed negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub url: String,
    pub price: Option<Price>,
    pub is_on_sale: Option<bool>,
    pub price_on_sale: Option<Price>,
    pub is_available: Option<bool>,
    pub title: Option<String>,
}

impl ProductInfo {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            price: None,
            is_on_sale: None,
            price_on_sale: None,
            is_available: None,
            title: None,
        }
    }
}

/// Regular price together with the sale price, when the product is on sale.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceDetails {
    pub price: Price,
    pub price_on_sale: Option<Price>,
}

impl PriceDetails {
    pub fn is_on_sale(&self) -> bool {
        self.price_on_sale.is_some()
    }
}

/// Caller knobs shared by single-page extraction and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Read only the regular price and the title.
    pub fast: bool,
    /// Keep unrecognised price text instead of failing.
    pub ignore_price_format_errors: bool,
    /// Surface field-level failures instead of leaving the field empty.
    pub fail_fast: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            fast: true,
            ignore_price_format_errors: true,
            fail_fast: false,
        }
    }
}

impl ExtractOptions {
    pub fn full(mut self) -> Self {
        self.fast = false;
        self
    }

    pub fn fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    pub fn strict_prices(mut self) -> Self {
        self.ignore_price_format_errors = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_serialize_as_null() {
        let mut info = ProductInfo::new("https://silpo.ua/product/1");
        info.price = Some(Price::Amount(399.0));
        info.title = Some("Сир домашній".into());

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["price"], 399.0);
        assert!(json["is_on_sale"].is_null());
        assert!(json["price_on_sale"].is_null());
        assert_eq!(json["title"], "Сир домашній");
    }

    #[test]
    fn option_builders() {
        let options = ExtractOptions::default().full().fail_fast();
        assert!(!options.fast);
        assert!(options.fail_fast);
        assert!(options.ignore_price_format_errors);
    }
}
