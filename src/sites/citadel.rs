//! citadelbuddekor.com.ua
//!
//! Prices read like `399 грн.`. The sale slot repeats the regular price for
//! products that are not discounted.

use super::{SiteRules, differs};
use crate::price::Price;
use crate::profile::{ProductLocators, SearchLocators, SiteProfile};

const PRODUCT_CARD: &str = r#"//div[contains(@class, "product-card__info")]"#;

pub fn profile() -> SiteProfile {
    SiteProfile {
        base_url: "https://citadelbuddekor.com.ua/".to_string(),
        price_format: r"\d+(\.\d+)?".to_string(),
        product: ProductLocators {
            price: format!(r#"{PRODUCT_CARD}//span[contains(@class, "price--current")]"#),
            price_without_sale: format!(r#"{PRODUCT_CARD}//span[contains(@class, "price--old")]"#),
            price_on_sale: format!(r#"{PRODUCT_CARD}//span[contains(@class, "price--sale")]"#),
            availability: format!(r#"{PRODUCT_CARD}//div[contains(@class, "stock")]"#),
            title: "//h1".to_string(),
            available_text: "В наявності".to_string(),
        },
        search: SearchLocators {
            search_field: r#"//form[contains(@class, "search")]//input[@name="q"]"#.to_string(),
            submit_button: Some(r#"//form[contains(@class, "search")]//button[@type="submit"]"#.to_string()),
            result_links: r#"//div[contains(@class, "product-tile")]//a[contains(@class, "product-tile__name")]"#
                .to_string(),
            link_attribute: "href".to_string(),
        },
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CitadelRules;

impl SiteRules for CitadelRules {
    fn counts_as_sale(&self, regular: &Price, sale: &Price) -> bool {
        differs(regular, sale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_hryvnia_prices() {
        let price = profile().normalize_price("245.00 грн.", false).unwrap();
        assert_eq!(price, Price::Amount(245.0));
    }

    #[test]
    fn equal_sale_is_not_a_sale() {
        assert!(!CitadelRules.counts_as_sale(&Price::Amount(399.0), &Price::Amount(399.0)));
        assert!(CitadelRules.counts_as_sale(&Price::Amount(281.0), &Price::Amount(245.0)));
    }
}
