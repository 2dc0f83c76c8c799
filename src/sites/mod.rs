//! Per-site behaviour: a hand-authored profile plus the few rules where a
//! shop's markup departs from the generic extraction contract.

use std::fmt;
use std::str::FromStr;

use crate::price::Price;
use crate::profile::{ProductLocators, SiteProfile};

pub mod citadel;
pub mod epicentr;
pub mod rozetka;
pub mod silpo;

/// Order in which the two regular-price locators are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSlots<'a> {
    pub primary: &'a str,
    pub fallback: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitStrategy {
    /// Press Enter in the search field, click the button if that fails.
    #[default]
    EnterThenButton,
    /// Click the button, press Enter if that fails or there is no button.
    ButtonThenEnter,
}

/// Override hooks the engine consults. The defaults are the generic contract.
pub trait SiteRules: Send + Sync {
    fn price_slots<'a>(&self, locators: &'a ProductLocators) -> PriceSlots<'a> {
        PriceSlots {
            primary: &locators.price,
            fallback: &locators.price_without_sale,
        }
    }

    /// Whether a sale price read off the page is a real discount.
    fn counts_as_sale(&self, _regular: &Price, _sale: &Price) -> bool {
        true
    }

    fn submit_strategy(&self) -> SubmitStrategy {
        SubmitStrategy::default()
    }
}

/// Generic contract with no overrides, for ad-hoc profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRules;

impl SiteRules for DefaultRules {}

/// Sale price equal to the regular price is a rendering artefact, not a sale.
pub(crate) fn differs(regular: &Price, sale: &Price) -> bool {
    regular != sale
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    Rozetka,
    Silpo,
    Epicentr,
    Citadel,
}

impl SiteKind {
    pub const ALL: [SiteKind; 4] = [Self::Rozetka, Self::Silpo, Self::Epicentr, Self::Citadel];

    pub fn name(self) -> &'static str {
        match self {
            Self::Rozetka => "rozetka",
            Self::Silpo => "silpo",
            Self::Epicentr => "epicentr",
            Self::Citadel => "citadel",
        }
    }

    pub fn default_profile(self) -> SiteProfile {
        match self {
            Self::Rozetka => rozetka::profile(),
            Self::Silpo => silpo::profile(),
            Self::Epicentr => epicentr::profile(),
            Self::Citadel => citadel::profile(),
        }
    }

    pub fn rules(self) -> Box<dyn SiteRules> {
        match self {
            Self::Rozetka => Box::new(DefaultRules),
            Self::Silpo => Box::new(silpo::SilpoRules),
            Self::Epicentr => Box::new(epicentr::EpicentrRules),
            Self::Citadel => Box::new(citadel::CitadelRules),
        }
    }
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SiteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown site {s:?}"))
    }
}
