//! rozetka.com.ua
//!
//! A product on sale shows two prices: `p[1]` is the crossed-out price and
//! `p[2]` the discounted one. A product not on sale shows a single `p`.
//! Everything else follows the generic contract.

use crate::profile::{ProductLocators, SearchLocators, SiteProfile};

const MAIN_INFO: &str =
    r##"//*[@id="#scrollArea"]/div[1]/div[2]/div/rz-product-main-info/div/div[2]/div/div[1]"##;
const HEADER_SEARCH: &str =
    "/html/body/rz-app-root/div/div[1]/rz-main-header/header/div/div/div/rz-search-suggest/form/div[1]";

pub fn profile() -> SiteProfile {
    SiteProfile {
        base_url: "https://rozetka.com.ua/ua/".to_string(),
        price_format: r"\d+".to_string(),
        product: ProductLocators {
            price: format!("{MAIN_INFO}/p"),
            price_without_sale: format!("{MAIN_INFO}/p[1]"),
            price_on_sale: format!("{MAIN_INFO}/p[2]"),
            availability: format!("{MAIN_INFO}/rz-status-label/p"),
            title: r##"//*[@id="#scrollArea"]/div[1]/div[2]/div/rz-title-block/div/div[1]/div/h1"##
                .to_string(),
            available_text: "Є в наявності".to_string(),
        },
        search: SearchLocators {
            search_field: format!("{HEADER_SEARCH}/div/div/input"),
            submit_button: Some(format!("{HEADER_SEARCH}/button")),
            // Category pages and plain search pages render result tiles differently.
            result_links: concat!(
                "/html/body/rz-app-root/div/div[1]/rz-category/div/main/rz-catalog-layout/div[2]",
                "/section/rz-category-goods//rz-product-tile/div/a[2]",
                " | ",
                "/html/body/rz-app-root/div/div[1]/rz-search/rz-catalog/div/div[2]",
                "/section//rz-button-product-page[2]/rz-indexed-link/a",
            )
            .to_string(),
            link_attribute: "href".to_string(),
        },
    }
}
