//! silpo.ua
//!
//! Silpo swaps the price slots: the element the generic contract treats as
//! "price without sale" holds the regular price, and the generic "price"
//! element is only a fallback. Products not on sale render the same value in
//! the regular and sale slots. Search submits on Enter only.

use super::{PriceSlots, SiteRules, differs};
use crate::price::Price;
use crate::profile::{ProductLocators, SearchLocators, SiteProfile};

const PRODUCT_PAGE: &str = concat!(
    "/html/body/sf-shop-silpo-root/shop-silpo-root-shell/silpo-shell-main/div/div[3]",
    "/silpo-product-product-page/div/div/div/div/div[2]"
);

pub fn profile() -> SiteProfile {
    SiteProfile {
        base_url: "https://silpo.ua".to_string(),
        price_format: r"\d+".to_string(),
        product: ProductLocators {
            price: format!("{PRODUCT_PAGE}/div/div/div[1]/div"),
            price_without_sale: format!("{PRODUCT_PAGE}/div/div/div[1]/div[2]/div[1]"),
            price_on_sale: format!("{PRODUCT_PAGE}/div/div/div[1]/div[1]"),
            availability: format!(
                "{PRODUCT_PAGE}/div/div/div[2]/shop-silpo-common-page-add-to-basket/div/div/button"
            ),
            title: format!("{PRODUCT_PAGE}/div/h1"),
            available_text: "У кошик".to_string(),
        },
        search: SearchLocators {
            search_field: concat!(
                "/html/body/sf-shop-silpo-root/shop-silpo-root-shell/silpo-shell-main/div/div[1]",
                "/silpo-shell-header/silpo-shell-desktop-header/div/div/div[1]/div[3]",
                "/silpo-search-suggestion/silpo-search-input/div/input"
            )
            .to_string(),
            submit_button: None,
            result_links: "//shop-silpo-common-product-card/div/a".to_string(),
            link_attribute: "href".to_string(),
        },
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilpoRules;

impl SiteRules for SilpoRules {
    fn price_slots<'a>(&self, locators: &'a ProductLocators) -> PriceSlots<'a> {
        PriceSlots {
            primary: &locators.price_without_sale,
            fallback: &locators.price,
        }
    }

    fn counts_as_sale(&self, regular: &Price, sale: &Price) -> bool {
        differs(regular, sale)
    }
}
