//! Cartwheel Sim
//!
//! A seeded, in-process storefront implementing the page seam. Runs against
//! it are deterministic and disposable: every session starts from the same
//! seeded account, catalog, and coupon, and tears down to nothing. Transient
//! surfaces settle over simulated time (one tick per page query), so the
//! harness's bounded waits are exercised for real.

pub mod catalog;
mod store;

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use cartwheel_core::config::Credentials;
use cartwheel_core::error::Result;
use cartwheel_core::locator::Locator;
use cartwheel_core::page::{ElementId, ElementState, Page, PageResult, SessionProvider};

pub use catalog::{demo_catalog, Product};
pub use store::{CartLineSnapshot, Interaction};

/// Everything a fresh storefront session starts from.
#[derive(Debug, Clone)]
pub struct SimSeed {
    /// Host the sim pretends to serve. Only the path of navigated URLs
    /// matters; any base resolves to the same views.
    pub base_url: String,

    /// The one account that can sign in.
    pub account: Credentials,

    /// The one coupon code the checkout accepts.
    pub discount_code: String,

    pub catalog: Vec<Product>,

    /// Country option codes to their region option codes.
    pub countries: BTreeMap<String, Vec<String>>,

    /// Queries a transient surface takes to settle.
    pub settle_ticks: u8,

    /// Fault knob: scheduled cart-row removals never complete.
    pub stuck_delete: bool,

    /// Fault knob: the header greets a different name.
    pub wrong_greeting: Option<String>,
}

impl Default for SimSeed {
    fn default() -> Self {
        let mut countries = BTreeMap::new();
        countries.insert("RO".to_string(), vec!["279".to_string(), "281".to_string()]);
        countries.insert("US".to_string(), vec!["12".to_string(), "43".to_string()]);
        Self {
            base_url: "https://sim.storefront.test".to_string(),
            account: Credentials::default(),
            discount_code: "20poff".to_string(),
            catalog: demo_catalog(),
            countries,
            settle_ticks: 2,
            stuck_delete: false,
            wrong_greeting: None,
        }
    }
}

/// One simulated storefront session.
pub struct SimStorefront {
    state: Mutex<store::StoreState>,
}

impl SimStorefront {
    pub fn new(seed: SimSeed) -> Self {
        Self {
            state: Mutex::new(store::StoreState::new(seed)),
        }
    }

    pub fn seeded() -> Self {
        Self::new(SimSeed::default())
    }

    /// Everything the session did, in order.
    pub fn journal(&self) -> Vec<Interaction> {
        self.state.lock().journal()
    }

    /// Clicks whose selector starts with the given prefix.
    pub fn clicks_on(&self, selector_prefix: &str) -> usize {
        self.journal()
            .iter()
            .filter(|i| i.is_click() && i.selector().starts_with(selector_prefix))
            .count()
    }

    pub fn cart_lines(&self) -> Vec<CartLineSnapshot> {
        self.state.lock().cart_lines()
    }

    pub fn orders_placed(&self) -> u32 {
        self.state.lock().orders_placed()
    }

    pub fn logged_in(&self) -> bool {
        self.state.lock().logged_in()
    }

    /// Current value of a checkout form field, if it was ever touched.
    pub fn form_value(&self, key: &str) -> Option<String> {
        self.state.lock().form_value(key)
    }

    pub fn applied_coupon(&self) -> Option<String> {
        self.state.lock().applied_coupon()
    }

    pub fn shipping_submitted(&self) -> bool {
        self.state.lock().shipping_submitted()
    }
}

#[async_trait]
impl Page for SimStorefront {
    async fn navigate(&self, url: &str) -> PageResult<()> {
        self.state.lock().navigate(url)
    }

    async fn current_url(&self) -> PageResult<String> {
        Ok(self.state.lock().current_url())
    }

    async fn is_ready(&self) -> PageResult<bool> {
        Ok(self.state.lock().is_ready())
    }

    async fn find(&self, locator: &Locator) -> PageResult<Option<ElementId>> {
        Ok(self.state.lock().find(locator))
    }

    async fn find_all(&self, locator: &Locator) -> PageResult<Vec<ElementId>> {
        Ok(self.state.lock().find_all(locator))
    }

    async fn find_in(&self, scope: ElementId, locator: &Locator) -> PageResult<Option<ElementId>> {
        Ok(self.state.lock().find_in(scope, locator))
    }

    async fn element_state(&self, id: ElementId) -> PageResult<ElementState> {
        Ok(self.state.lock().element_state(id))
    }

    async fn click(&self, id: ElementId) -> PageResult<()> {
        self.state.lock().click(id)
    }

    async fn clear(&self, id: ElementId) -> PageResult<()> {
        self.state.lock().clear(id)
    }

    async fn type_text(&self, id: ElementId, text: &str) -> PageResult<()> {
        self.state.lock().type_text(id, text)
    }

    async fn press_enter(&self, id: ElementId) -> PageResult<()> {
        self.state.lock().press_enter(id)
    }

    async fn select_value(&self, id: ElementId, value: &str) -> PageResult<()> {
        self.state.lock().select_value(id, value)
    }

    async fn submit_form(&self, id: ElementId) -> PageResult<()> {
        self.state.lock().submit_form(id)
    }

    async fn text(&self, id: ElementId) -> PageResult<String> {
        self.state.lock().text(id)
    }

    async fn screenshot(&self) -> PageResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn close(&mut self) -> PageResult<()> {
        Ok(())
    }
}

/// Hands the runner a fresh seeded storefront per scenario.
pub struct SimSession {
    seed: SimSeed,
}

impl SimSession {
    pub fn new(seed: SimSeed) -> Self {
        Self { seed }
    }
}

impl Default for SimSession {
    fn default() -> Self {
        Self::new(SimSeed::default())
    }
}

#[async_trait]
impl SessionProvider for SimSession {
    async fn open(&self) -> Result<Box<dyn Page>> {
        Ok(Box::new(SimStorefront::new(self.seed.clone())))
    }

    fn backend_name(&self) -> &'static str {
        "sim"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartwheel_core::selectors as sel;

    /// Query until the locator matches, bounded by a fixed number of
    /// queries. Each query advances simulated time by one tick.
    async fn find_within(page: &SimStorefront, locator: &Locator, queries: u32) -> Option<ElementId> {
        for _ in 0..queries {
            if let Some(id) = page.find(locator).await.unwrap() {
                return Some(id);
            }
        }
        None
    }

    async fn open_product(page: &SimStorefront, name: &str) {
        page.navigate("https://sim.storefront.test/").await.unwrap();
        let search = find_within(page, &Locator::css(sel::SEARCH_BOX), 5)
            .await
            .expect("search box");
        page.clear(search).await.unwrap();
        page.type_text(search, name).await.unwrap();
        page.press_enter(search).await.unwrap();
        let card = find_within(page, &Locator::css(sel::RESULT_CARD), 10)
            .await
            .expect("result card");
        page.click(card).await.unwrap();
    }

    #[tokio::test]
    async fn result_cards_appear_only_after_the_view_settles() {
        let page = SimStorefront::seeded();
        let search = find_within(&page, &Locator::css(sel::SEARCH_BOX), 5)
            .await
            .unwrap();
        page.type_text(search, "Overnight Duffle").await.unwrap();
        page.press_enter(search).await.unwrap();

        // First query lands mid-settle.
        assert!(page.find(&Locator::css(sel::RESULT_CARD)).await.unwrap().is_none());
        assert!(find_within(&page, &Locator::css(sel::RESULT_CARD), 5).await.is_some());
    }

    #[tokio::test]
    async fn unknown_item_yields_no_result_cards() {
        let page = SimStorefront::seeded();
        let search = find_within(&page, &Locator::css(sel::SEARCH_BOX), 5)
            .await
            .unwrap();
        page.type_text(search, "Quantum Unicycle").await.unwrap();
        page.press_enter(search).await.unwrap();
        assert!(find_within(&page, &Locator::css(sel::RESULT_CARD), 10).await.is_none());
    }

    #[tokio::test]
    async fn add_to_cart_without_required_options_adds_nothing() {
        let page = SimStorefront::seeded();
        open_product(&page, "Proteus Fitness Jackshirt").await;
        let add = find_within(&page, &Locator::css(sel::ADD_TO_CART), 10)
            .await
            .unwrap();
        page.click(add).await.unwrap();
        assert!(page.cart_lines().is_empty());
    }

    #[tokio::test]
    async fn add_to_cart_with_swatches_and_quantity() {
        let page = SimStorefront::seeded();
        open_product(&page, "Proteus Fitness Jackshirt").await;

        let size = find_within(&page, &sel::size_swatch("XL"), 10).await.unwrap();
        page.click(size).await.unwrap();
        let color = find_within(&page, &sel::color_swatch("Orange"), 10)
            .await
            .unwrap();
        page.click(color).await.unwrap();

        let qty = find_within(&page, &Locator::css(sel::QTY_INPUT), 5).await.unwrap();
        page.clear(qty).await.unwrap();
        page.type_text(qty, "3").await.unwrap();
        let add = find_within(&page, &Locator::css(sel::ADD_TO_CART), 5).await.unwrap();
        page.click(add).await.unwrap();

        let lines = page.cart_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].qty, 3);
        assert_eq!(lines[0].size.as_deref(), Some("XL"));
        assert_eq!(lines[0].color.as_deref(), Some("Orange"));
    }

    #[tokio::test]
    async fn swatch_for_a_missing_option_is_absent() {
        let page = SimStorefront::seeded();
        open_product(&page, "Proteus Fitness Jackshirt").await;
        assert!(find_within(&page, &sel::size_swatch("XXXL"), 10).await.is_none());
    }

    #[tokio::test]
    async fn login_settles_into_a_greeting() {
        let page = SimStorefront::seeded();
        page.navigate("https://sim.storefront.test/customer/account/login")
            .await
            .unwrap();
        let email = find_within(&page, &Locator::css(sel::LOGIN_EMAIL), 10)
            .await
            .unwrap();
        page.type_text(email, "test123@yahoo.com").await.unwrap();
        let pass = find_within(&page, &Locator::css(sel::LOGIN_PASSWORD), 5)
            .await
            .unwrap();
        page.type_text(pass, "Test123!").await.unwrap();
        let submit = find_within(&page, &Locator::css(sel::LOGIN_SUBMIT), 5)
            .await
            .unwrap();
        page.click(submit).await.unwrap();

        let greeting = find_within(&page, &Locator::css(sel::GREETING), 10)
            .await
            .expect("greeting");
        assert_eq!(page.text(greeting).await.unwrap(), "Welcome, Test Testing!");
        assert!(page.logged_in());
    }

    #[tokio::test]
    async fn wrong_password_never_produces_a_greeting() {
        let page = SimStorefront::seeded();
        page.navigate("https://sim.storefront.test/customer/account/login")
            .await
            .unwrap();
        let email = find_within(&page, &Locator::css(sel::LOGIN_EMAIL), 10)
            .await
            .unwrap();
        page.type_text(email, "test123@yahoo.com").await.unwrap();
        let pass = find_within(&page, &Locator::css(sel::LOGIN_PASSWORD), 5)
            .await
            .unwrap();
        page.type_text(pass, "nope").await.unwrap();
        let submit = find_within(&page, &Locator::css(sel::LOGIN_SUBMIT), 5)
            .await
            .unwrap();
        page.click(submit).await.unwrap();

        assert!(find_within(&page, &Locator::css(sel::GREETING), 10).await.is_none());
        assert!(!page.logged_in());
    }

    #[tokio::test]
    async fn region_select_appears_after_choosing_a_country() {
        let page = SimStorefront::seeded();
        page.navigate("https://sim.storefront.test/checkout/#shipping")
            .await
            .unwrap();
        assert!(find_within(&page, &Locator::css(sel::REGION_SELECT), 5).await.is_none());

        let country = find_within(&page, &Locator::css(sel::COUNTRY_SELECT), 10)
            .await
            .unwrap();
        page.select_value(country, "RO").await.unwrap();
        let region = find_within(&page, &Locator::css(sel::REGION_SELECT), 10)
            .await
            .expect("region select");
        page.select_value(region, "279").await.unwrap();
        assert_eq!(page.form_value("country_id").as_deref(), Some("RO"));
        assert_eq!(page.form_value("region_id").as_deref(), Some("279"));
    }

    #[tokio::test]
    async fn selecting_an_unknown_region_code_is_an_option_error() {
        let page = SimStorefront::seeded();
        page.navigate("https://sim.storefront.test/checkout/#shipping")
            .await
            .unwrap();
        let country = find_within(&page, &Locator::css(sel::COUNTRY_SELECT), 10)
            .await
            .unwrap();
        page.select_value(country, "RO").await.unwrap();
        let region = find_within(&page, &Locator::css(sel::REGION_SELECT), 10)
            .await
            .unwrap();
        let err = page.select_value(region, "999").await.unwrap_err();
        assert!(matches!(
            err,
            cartwheel_core::page::PageError::OptionNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn deleted_row_detaches_after_settling() {
        let page = SimStorefront::seeded();
        open_product(&page, "Overnight Duffle").await;
        let add = find_within(&page, &Locator::css(sel::ADD_TO_CART), 10).await.unwrap();
        page.click(add).await.unwrap();

        page.navigate("https://sim.storefront.test/checkout/cart/")
            .await
            .unwrap();
        let delete = find_within(&page, &Locator::css(sel::DELETE_ACTION), 10)
            .await
            .expect("delete control");
        page.click(delete).await.unwrap();

        let mut detached = false;
        for _ in 0..10 {
            if !page.element_state(delete).await.unwrap().attached {
                detached = true;
                break;
            }
        }
        assert!(detached, "row should detach once removal settles");
        assert!(page.cart_lines().is_empty());
    }

    #[tokio::test]
    async fn stuck_delete_keeps_the_row_attached() {
        let seed = SimSeed {
            stuck_delete: true,
            ..SimSeed::default()
        };
        let page = SimStorefront::new(seed);
        open_product(&page, "Overnight Duffle").await;
        let add = find_within(&page, &Locator::css(sel::ADD_TO_CART), 10).await.unwrap();
        page.click(add).await.unwrap();

        page.navigate("https://sim.storefront.test/checkout/cart/")
            .await
            .unwrap();
        let delete = find_within(&page, &Locator::css(sel::DELETE_ACTION), 10)
            .await
            .unwrap();
        page.click(delete).await.unwrap();
        for _ in 0..20 {
            assert!(page.element_state(delete).await.unwrap().attached);
        }
        assert_eq!(page.cart_lines().len(), 1);
    }

    #[tokio::test]
    async fn coupon_cancel_exists_only_while_a_coupon_is_applied() {
        let page = SimStorefront::seeded();
        page.navigate("https://sim.storefront.test/checkout/#shipping")
            .await
            .unwrap();
        let heading = find_within(&page, &Locator::css(sel::DISCOUNT_HEADING), 10)
            .await
            .unwrap();
        page.click(heading).await.unwrap();
        let code = find_within(&page, &Locator::css(sel::DISCOUNT_CODE), 10)
            .await
            .unwrap();
        assert!(page.find(&Locator::css(sel::DISCOUNT_CANCEL)).await.unwrap().is_none());

        page.type_text(code, "20poff").await.unwrap();
        let apply = find_within(&page, &Locator::css(sel::DISCOUNT_APPLY), 5)
            .await
            .unwrap();
        page.click(apply).await.unwrap();
        assert_eq!(page.applied_coupon().as_deref(), Some("20poff"));

        let cancel = find_within(&page, &Locator::css(sel::DISCOUNT_CANCEL), 10)
            .await
            .expect("cancel control");
        page.click(cancel).await.unwrap();
        assert_eq!(page.applied_coupon(), None);
    }

    #[tokio::test]
    async fn journal_records_canonical_selectors() {
        let page = SimStorefront::seeded();
        open_product(&page, "Overnight Duffle").await;
        assert_eq!(page.clicks_on(".swatch-option"), 0);
        assert_eq!(page.clicks_on(sel::RESULT_CARD), 1);
        let typed: Vec<_> = page
            .journal()
            .into_iter()
            .filter(|i| matches!(i, Interaction::Type { .. }))
            .collect();
        assert_eq!(
            typed,
            vec![Interaction::Type {
                selector: sel::SEARCH_BOX.to_string(),
                text: "Overnight Duffle".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn auth_link_reads_sign_in_only_when_signed_out() {
        let page = SimStorefront::seeded();
        assert!(find_within(&page, &sel::sign_in_link(), 5).await.is_some());
    }
}
