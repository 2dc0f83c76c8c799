//! The extraction engine: one browser session, one site profile.
//!
//! Field readers (`price`, `price_on_sale`, `availability`, `title`) each
//! locate an element through the retry combinators and interpret its text.
//! [`Parser::extract_product`] runs them as independent probes over one page
//! and [`Parser::search_products`] drives the site's search form, collects
//! result links and extracts each of them.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::browser::{Browser, ChromeSession, quit_logged};
use crate::config::ParserSettings;
use crate::error::{BrowserError, ParserError, ParserResult};
use crate::price::{Price, PriceFormat};
use crate::product::{ExtractOptions, PriceDetails, ProductInfo};
use crate::profile::SiteProfile;
use crate::retry::{self, RetryPolicy};
use crate::sites::{SiteKind, SiteRules, SubmitStrategy};
use crate::store::{ProfileStore, resolve_profile};

pub struct Parser<B: Browser> {
    browser: B,
    profile: SiteProfile,
    rules: Box<dyn SiteRules>,
    base: Url,
    price_format: PriceFormat,
    retry: RetryPolicy,
    explicit_timeout: Duration,
    page_load_poll: Duration,
    search_attempts: u32,
}

impl Parser<ChromeSession> {
    /// Validates the profile, then starts a Chrome session for it.
    pub async fn launch(
        settings: &ParserSettings,
        profile: SiteProfile,
        rules: Box<dyn SiteRules>,
    ) -> ParserResult<Self> {
        profile.validate()?;
        let browser = ChromeSession::start(settings).await.map_err(ParserError::Session)?;
        Self::with_browser(browser, profile, rules, settings).await
    }

    /// Starts a session for one of the known sites, taking its profile from
    /// `store` (and seeding the store with the built-in profile on first use).
    pub async fn for_site(
        kind: SiteKind,
        settings: &ParserSettings,
        store: &dyn ProfileStore,
    ) -> ParserResult<Self> {
        let profile = resolve_profile(store, kind.default_profile())?;
        Self::launch(settings, profile, kind.rules()).await
    }
}

impl<B: Browser> Parser<B> {
    /// Takes ownership of an already running `browser`. The session is quit
    /// if the profile turns out to be unusable.
    pub async fn with_browser(
        mut browser: B,
        profile: SiteProfile,
        rules: Box<dyn SiteRules>,
        settings: &ParserSettings,
    ) -> ParserResult<Self> {
        let prepared = profile
            .validate()
            .and_then(|()| Ok((profile.base()?, profile.compile_price_format()?)));

        let (base, price_format) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                quit_logged(&mut browser, "browser after bad profile").await;
                return Err(err);
            }
        };

        Ok(Self {
            browser,
            profile,
            rules,
            base,
            price_format,
            retry: settings.retry,
            explicit_timeout: settings.explicit_timeout(),
            page_load_poll: settings.page_load_poll(),
            search_attempts: settings.search_attempts.max(1),
        })
    }

    pub async fn with_site(
        browser: B,
        kind: SiteKind,
        settings: &ParserSettings,
        store: &dyn ProfileStore,
    ) -> ParserResult<Self> {
        let profile = resolve_profile(store, kind.default_profile())?;
        Self::with_browser(browser, profile, kind.rules(), settings).await
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Ends the browser session.
    pub async fn close(mut self) -> ParserResult<()> {
        self.browser.quit().await?;
        Ok(())
    }

    /// Loads `url` unless the browser is already there. URLs outside the
    /// site's domain are rejected before the browser is touched.
    pub async fn open_page(&self, url: &str) -> ParserResult<()> {
        let target = Url::parse(url)
            .ok()
            .filter(|target| self.profile.owns(target))
            .ok_or_else(|| ParserError::InvalidPage {
                url: url.to_string(),
                base_url: self.profile.base_url.clone(),
            })?;
        let target = target.as_str();

        let current = self.browser.current_url().await?;
        if current == target {
            debug!("Already on {target}");
            return Ok(());
        }

        let browser = &self.browser;
        let (timeout, poll) = (self.explicit_timeout, self.page_load_poll);
        retry::on_timeout(&self.retry, "open page", move || async move {
            browser.navigate(target).await?;
            wait_until_loaded(browser, timeout, poll).await
        })
        .await
        .map_err(|source| ParserError::PageLoad {
            url: url.to_string(),
            source,
        })?;

        info!("Opened {target}");
        Ok(())
    }

    /// Regular price: the rules' primary slot, then the fallback slot.
    pub async fn price(&self, ignore_format_errors: bool) -> ParserResult<Price> {
        let slots = self.rules.price_slots(&self.profile.product);

        match self.read_price(slots.primary, ignore_format_errors).await {
            Err(err) if !err.is_price_format() => {
                warn!(
                    "{}: couldn't get price with {}, maybe product is not on sale: {err}",
                    self.profile, slots.primary
                );
                self.read_price(slots.fallback, ignore_format_errors).await
            }
            result => result,
        }
    }

    /// Sale price. Not finding one is the normal outcome for products that
    /// are not discounted.
    pub async fn price_on_sale(&self, ignore_format_errors: bool) -> ParserResult<Price> {
        self.read_price(&self.profile.product.price_on_sale, ignore_format_errors)
            .await
    }

    pub async fn price_details(&self, ignore_format_errors: bool) -> ParserResult<PriceDetails> {
        let price = self.price(ignore_format_errors).await?;

        let price_on_sale = match self.price_on_sale(ignore_format_errors).await {
            Ok(sale) if self.rules.counts_as_sale(&price, &sale) => Some(sale),
            Ok(sale) => {
                debug!("{}: sale price {sale} repeats the regular price", self.profile);
                None
            }
            Err(err) if err.is_element_not_found() => {
                debug!("{}: no sale price: {err}", self.profile);
                None
            }
            Err(err) => return Err(err),
        };

        Ok(PriceDetails { price, price_on_sale })
    }

    pub async fn availability(&self) -> ParserResult<bool> {
        let locators = &self.profile.product;
        let text = self
            .read_text("availability", &locators.availability)
            .await
            .map_err(|source| ParserError::AvailabilityNotFound {
                site: self.profile.base_url.clone(),
                locator: locators.availability.clone(),
                source,
            })?;
        Ok(text.contains(&locators.available_text))
    }

    pub async fn title(&self) -> ParserResult<String> {
        let locator = &self.profile.product.title;
        let text = self
            .read_text("title", locator)
            .await
            .map_err(|source| ParserError::TitleNotFound {
                site: self.profile.base_url.clone(),
                locator: locator.clone(),
                source,
            })?;
        Ok(text.trim().to_string())
    }

    /// Reads one product page. Fields are independent: a missing one is left
    /// empty unless `fail_fast` is set. Price format errors are always
    /// returned.
    pub async fn extract_product(&self, url: &str, options: ExtractOptions) -> ParserResult<ProductInfo> {
        self.open_page(url).await?;

        let ignore = options.ignore_price_format_errors;
        let mut info = ProductInfo::new(url);

        if options.fast {
            info.price = absorb(url, "price", self.price(ignore).await, options)?;
        } else {
            let details = absorb(url, "price", self.price_details(ignore).await, options)?;
            if let Some(details) = details {
                info.is_on_sale = Some(details.is_on_sale());
                info.price = Some(details.price);
                info.price_on_sale = details.price_on_sale;
            }
            info.is_available = absorb(url, "availability", self.availability().await, options)?;
        }

        info.title = absorb(url, "title", self.title().await, options)?;
        Ok(info)
    }

    /// Searches the site for `query` and extracts up to `n` of the results.
    ///
    /// Products that fail to extract are logged and skipped, and a short list
    /// is returned, unless `fail_fast` is set. Failing to reach the search form
    /// is always an error.
    pub async fn search_products(
        &self,
        query: &str,
        n: usize,
        options: ExtractOptions,
    ) -> ParserResult<Vec<ProductInfo>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let urls = self.collect_product_urls(query, n).await?;
        info!("{}: found {} product links for {query:?}", self.profile, urls.len());

        let mut products = Vec::with_capacity(urls.len());
        for url in &urls {
            match self.extract_product(url, options).await {
                Ok(product) => products.push(product),
                Err(err) if options.fail_fast => return Err(err),
                Err(err) => error!("{}: skipping {url}: {err}", self.profile),
            }
        }

        if products.len() < n {
            warn!("{}: parsed {} of {n} requested products", self.profile, products.len());
            if options.fail_fast {
                return Err(ParserError::InsufficientResults {
                    requested: n,
                    found: products.len(),
                });
            }
        }

        info!("Managed to parse {} products", products.len());
        Ok(products)
    }

    /// Runs the search and returns up to `n` distinct absolute product URLs.
    /// An empty result page is usually a rendering race, so the whole search
    /// is repeated a few times before giving up.
    pub async fn collect_product_urls(&self, query: &str, n: usize) -> ParserResult<Vec<String>> {
        for attempt in 1..=self.search_attempts {
            self.open_search_results(query).await?;

            match self.result_links(n).await {
                Ok(urls) if !urls.is_empty() => return Ok(urls),
                Ok(_) => warn!("{}: search for {query:?} returned no usable links", self.profile),
                Err(err) => warn!("{}: search for {query:?} returned no links: {err}", self.profile),
            }
            info!("Search attempt {attempt}/{} came back empty", self.search_attempts);
        }

        Err(ParserError::InsufficientResults { requested: n, found: 0 })
    }

    async fn open_search_results(&self, query: &str) -> ParserResult<()> {
        self.open_page(&self.profile.base_url)
            .await
            .map_err(|err| self.search_open("open site", err))?;

        let browser = &self.browser;
        let field = self.profile.search.search_field.as_str();
        self.guarded("type query", move || browser.type_text(field, query))
            .await
            .map_err(|err| self.search_open("type query", err.into()))?;

        self.submit_search()
            .await
            .map_err(|err| self.search_open("submit", err.into()))?;

        let (timeout, poll) = (self.explicit_timeout, self.page_load_poll);
        retry::on_timeout(&self.retry, "search results", move || {
            wait_until_loaded(browser, timeout, poll)
        })
        .await
        .map_err(|err| self.search_open("load results", err.into()))
    }

    async fn submit_search(&self) -> Result<(), BrowserError> {
        let field = self.profile.search.search_field.as_str();
        let button = self.profile.search.submit_button.as_deref();

        match (self.rules.submit_strategy(), button) {
            (SubmitStrategy::ButtonThenEnter, Some(button)) => match self.click(button).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    warn!("{}: unable to press search button, trying Enter: {err}", self.profile);
                    self.press_enter(field).await
                }
            },
            (_, button) => match (self.press_enter(field).await, button) {
                (Ok(()), _) => Ok(()),
                (Err(err), Some(button)) => {
                    warn!("{}: Enter did not submit, clicking search button: {err}", self.profile);
                    self.click(button).await
                }
                (Err(err), None) => Err(err),
            },
        }
    }

    async fn result_links(&self, n: usize) -> ParserResult<Vec<String>> {
        let browser = &self.browser;
        let search = &self.profile.search;
        let (locator, attribute) = (search.result_links.as_str(), search.link_attribute.as_str());

        let hrefs = self
            .guarded("collect result links", move || async move {
                let hrefs = browser.attributes(locator, attribute).await?;
                if hrefs.is_empty() {
                    return Err(BrowserError::timeout(format!("result links {locator}")));
                }
                Ok(hrefs)
            })
            .await?;

        let mut urls: Vec<String> = Vec::with_capacity(hrefs.len().min(n));
        for href in hrefs {
            match self.base.join(&href) {
                Ok(url) => {
                    let url = url.to_string();
                    if !urls.contains(&url) {
                        urls.push(url);
                    }
                }
                Err(err) => warn!("{}: ignoring result link {href:?}: {err}", self.profile),
            }
            if urls.len() == n {
                break;
            }
        }
        Ok(urls)
    }

    async fn read_price(&self, locator: &str, ignore_format_errors: bool) -> ParserResult<Price> {
        let raw = self
            .read_text("price", locator)
            .await
            .map_err(|source| ParserError::PriceNotFound {
                site: self.profile.base_url.clone(),
                locator: locator.to_string(),
                source: Some(source),
            })?;
        self.price_format.normalize(&raw, ignore_format_errors)
    }

    async fn read_text(&self, operation: &str, locator: &str) -> Result<String, BrowserError> {
        let browser = &self.browser;
        self.guarded(operation, move || browser.text(locator)).await
    }

    async fn press_enter(&self, locator: &str) -> Result<(), BrowserError> {
        let browser = &self.browser;
        self.guarded("press enter", move || browser.press_enter(locator)).await
    }

    async fn click(&self, locator: &str) -> Result<(), BrowserError> {
        let browser = &self.browser;
        self.guarded("click", move || browser.click(locator)).await
    }

    /// Retries `op` through both stale references and timeouts.
    async fn guarded<T, F, Fut>(&self, operation: &str, op: F) -> Result<T, BrowserError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, BrowserError>>,
    {
        let policy = &self.retry;
        let op = &op;
        retry::on_timeout(policy, operation, move || retry::on_stale(policy, operation, op)).await
    }

    fn search_open(&self, stage: &'static str, source: ParserError) -> ParserError {
        ParserError::SearchOpen {
            site: self.profile.base_url.clone(),
            stage,
            source: Box::new(source),
        }
    }
}

/// Keeps a field empty on "not found", unless the caller asked to fail fast.
fn absorb<T>(url: &str, field: &str, result: ParserResult<T>, options: ExtractOptions) -> ParserResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if options.fail_fast || !err.is_element_not_found() => Err(err),
        Err(err) => {
            warn!("{url}: {field} left empty: {err}");
            Ok(None)
        }
    }
}

async fn wait_until_loaded<B: Browser>(browser: &B, timeout: Duration, poll: Duration) -> Result<(), BrowserError> {
    let deadline = Instant::now() + timeout;
    loop {
        if browser.ready_state().await? == "complete" {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(BrowserError::timeout("document ready state"));
        }
        sleep(poll).await;
    }
}
