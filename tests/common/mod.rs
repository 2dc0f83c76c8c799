#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use pricescout::{
    Browser, BrowserError, ParserSettings, ProductLocators, RetryPolicy, SearchLocators, SiteProfile,
};

pub const BASE: &str = "https://shop.example.com/";
pub const RESULTS: &str = "https://shop.example.com/search";

pub const PRICE: &str = "//p[@class='price']";
pub const OLD_PRICE: &str = "//p[@class='old-price']";
pub const SALE_PRICE: &str = "//p[@class='sale-price']";
pub const STATUS: &str = "//p[@class='status']";
pub const TITLE: &str = "//h1";
pub const SEARCH_FIELD: &str = "//input[@name='q']";
pub const SEARCH_BUTTON: &str = "//button[@type='submit']";
pub const RESULT_LINKS: &str = "//a[@class='tile']";

pub fn profile() -> SiteProfile {
    SiteProfile {
        base_url: BASE.into(),
        price_format: r"\d+".into(),
        product: ProductLocators {
            price: PRICE.into(),
            price_without_sale: OLD_PRICE.into(),
            price_on_sale: SALE_PRICE.into(),
            availability: STATUS.into(),
            title: TITLE.into(),
            available_text: "In stock".into(),
        },
        search: SearchLocators {
            search_field: SEARCH_FIELD.into(),
            submit_button: Some(SEARCH_BUTTON.into()),
            result_links: RESULT_LINKS.into(),
            link_attribute: "href".into(),
        },
    }
}

pub fn settings() -> ParserSettings {
    ParserSettings {
        explicit_timeout_ms: 50,
        page_load_poll_ms: 1,
        retry: RetryPolicy::new(3, Duration::from_millis(1)),
        search_attempts: 3,
        ..ParserSettings::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    texts: HashMap<String, String>,
    links: HashMap<String, Vec<String>>,
    inputs: HashSet<String>,
    enter_goes_to: Option<String>,
    buttons: HashMap<String, String>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, locator: &str, text: &str) -> Self {
        self.texts.insert(locator.into(), text.into());
        self
    }

    pub fn links(mut self, locator: &str, hrefs: &[&str]) -> Self {
        self.links
            .insert(locator.into(), hrefs.iter().map(|href| href.to_string()).collect());
        self
    }

    pub fn input(mut self, locator: &str) -> Self {
        self.inputs.insert(locator.into());
        self
    }

    /// Pressing Enter in any input of this page loads `url`.
    pub fn on_enter(mut self, url: &str) -> Self {
        self.enter_goes_to = Some(url.into());
        self
    }

    pub fn button(mut self, locator: &str, url: &str) -> Self {
        self.buttons.insert(locator.into(), url.into());
        self
    }
}

#[derive(Default)]
struct State {
    current_url: String,
    pages: HashMap<String, FakePage>,
    faults: HashMap<String, VecDeque<BrowserError>>,
    navigations: Vec<String>,
    typed: Vec<String>,
    clicks: Vec<String>,
    enters: usize,
    quits: usize,
}

/// In-memory browser. Clones share state, so a test can keep a handle after
/// moving the browser into a parser.
#[derive(Clone)]
pub struct FakeBrowser {
    state: Arc<Mutex<State>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        let state = State {
            current_url: "about:blank".into(),
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn page(self, url: &str, page: FakePage) -> Self {
        self.lock().pages.insert(url.into(), page);
        self
    }

    /// Makes the next calls keyed by `key` fail with the given errors, in order.
    /// Keys are locators, or `"navigate"` / `"enter"`.
    pub fn fail(&self, key: &str, errors: impl IntoIterator<Item = BrowserError>) {
        self.lock()
            .faults
            .entry(key.into())
            .or_default()
            .extend(errors);
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.lock().typed.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.lock().clicks.clone()
    }

    pub fn enters(&self) -> usize {
        self.lock().enters
    }

    pub fn quits(&self) -> usize {
        self.lock().quits
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

impl State {
    fn fault(&mut self, key: &str) -> Result<(), BrowserError> {
        match self.faults.get_mut(key).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn page(&self) -> Option<&FakePage> {
        self.pages.get(&self.current_url)
    }
}

pub fn stale(locator: &str) -> BrowserError {
    BrowserError::StaleElement(locator.into())
}

pub fn timeout(locator: &str) -> BrowserError {
    BrowserError::timeout(locator)
}

fn missing(locator: &str) -> BrowserError {
    BrowserError::NoSuchElement(locator.into())
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.lock().current_url.clone())
    }

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        let mut state = self.lock();
        state.fault("navigate")?;
        state.navigations.push(url.into());
        state.current_url = url.into();
        Ok(())
    }

    async fn ready_state(&self) -> Result<String, BrowserError> {
        Ok("complete".into())
    }

    async fn text(&self, locator: &str) -> Result<String, BrowserError> {
        let mut state = self.lock();
        state.fault(locator)?;
        state
            .page()
            .and_then(|page| page.texts.get(locator).cloned())
            .ok_or_else(|| missing(locator))
    }

    async fn attributes(&self, locator: &str, _attribute: &str) -> Result<Vec<String>, BrowserError> {
        let mut state = self.lock();
        state.fault(locator)?;
        Ok(state
            .page()
            .and_then(|page| page.links.get(locator).cloned())
            .unwrap_or_default())
    }

    async fn type_text(&self, locator: &str, text: &str) -> Result<(), BrowserError> {
        let mut state = self.lock();
        state.fault(locator)?;
        if !state.page().is_some_and(|page| page.inputs.contains(locator)) {
            return Err(missing(locator));
        }
        state.typed.push(text.into());
        Ok(())
    }

    async fn press_enter(&self, locator: &str) -> Result<(), BrowserError> {
        let mut state = self.lock();
        state.fault("enter")?;
        let page = state.page().ok_or_else(|| missing(locator))?;
        if !page.inputs.contains(locator) {
            return Err(missing(locator));
        }
        let target = page
            .enter_goes_to
            .clone()
            .ok_or_else(|| missing("form submitted on Enter"))?;
        state.enters += 1;
        state.current_url = target;
        Ok(())
    }

    async fn click(&self, locator: &str) -> Result<(), BrowserError> {
        let mut state = self.lock();
        state.fault(locator)?;
        let target = state
            .page()
            .and_then(|page| page.buttons.get(locator).cloned())
            .ok_or_else(|| missing(locator))?;
        state.clicks.push(locator.into());
        state.current_url = target;
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        self.lock().quits += 1;
        Ok(())
    }
}
