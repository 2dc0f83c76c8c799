//! epicentrk.ua
//!
//! The search form reacts to its submit button; Enter is kept as a fallback.

use super::{SiteRules, SubmitStrategy};
use crate::profile::{ProductLocators, SearchLocators, SiteProfile};

pub fn profile() -> SiteProfile {
    SiteProfile {
        base_url: "https://epicentrk.ua/".to_string(),
        price_format: r"\d+".to_string(),
        product: ProductLocators {
            price: "//div/div[1]/div[1]/data/data[1]".to_string(),
            price_without_sale: "//div/div[1]/div[1]/s/data".to_string(),
            price_on_sale: "//div/div[1]/div[2]/data/data[1]".to_string(),
            availability: r#"//*[@id="main"]/div[2]/div/div/button"#.to_string(),
            title: r#"//*[@id="__template"]/main/div[1]/div/div/div/header/div/div[1]/h1"#.to_string(),
            available_text: "КУПИТИ".to_string(),
        },
        search: SearchLocators {
            search_field: r#"//*[@id="global-site-header"]/header/div/div[3]/form/input"#.to_string(),
            submit_button: Some(
                r#"//*[@id="global-site-header"]/header/div/div[3]/form/button[2]"#.to_string(),
            ),
            result_links: "//div[3]/div/h2/a".to_string(),
            link_attribute: "href".to_string(),
        },
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EpicentrRules;

impl SiteRules for EpicentrRules {
    fn submit_strategy(&self) -> SubmitStrategy {
        SubmitStrategy::ButtonThenEnter
    }
}
