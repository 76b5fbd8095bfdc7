//! Storefront state machine
//!
//! Models the demo shop at the granularity the journeys observe: which
//! affordances exist on the current view, when overlays and flyouts settle,
//! and how cart, session, and checkout state react to interactions.
//!
//! Time advances one tick per page query. Transient surfaces (loading
//! overlay, flyout, row removal, document readiness) settle after the
//! seeded tick count, so polling waits against the sim genuinely wait.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use cartwheel_core::locator::{Locator, Narrowing};
use cartwheel_core::page::{ElementId, ElementState, PageError, PageResult};
use cartwheel_core::selectors as sel;

use crate::catalog::Product;
use crate::SimSeed;

/// Where the session currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum View {
    Home,
    SearchResults { hits: Vec<usize> },
    Product { item: usize },
    CartPage,
    Checkout,
    Confirmation,
    Login,
}

impl View {
    fn path(&self, catalog: &[Product]) -> String {
        match self {
            View::Home => "/".to_string(),
            View::SearchResults { .. } => "/catalogsearch/result/".to_string(),
            View::Product { item } => {
                let slug = catalog
                    .get(*item)
                    .map(|p| p.name.to_lowercase().replace(' ', "-"))
                    .unwrap_or_default();
                format!("/{slug}.html")
            }
            View::CartPage => sel::routes::CART.to_string(),
            View::Checkout => sel::routes::CHECKOUT_SHIPPING.to_string(),
            View::Confirmation => sel::routes::ORDER_SUCCESS.to_string(),
            View::Login => sel::routes::LOGIN.to_string(),
        }
    }
}

/// A header surface that opens over a settle delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Closed,
    Opening(u8),
    Open,
}

impl Panel {
    fn opening(settle: u8) -> Self {
        if settle == 0 {
            Panel::Open
        } else {
            Panel::Opening(settle)
        }
    }

    fn toggled(self, settle: u8) -> Self {
        match self {
            Panel::Closed => Panel::opening(settle),
            _ => Panel::Closed,
        }
    }

    fn tick(&mut self) {
        if let Panel::Opening(n) = self {
            *self = if *n <= 1 {
                Panel::Open
            } else {
                Panel::Opening(*n - 1)
            };
        }
    }
}

/// What a bound element is, independent of the selector that found it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Role {
    SearchBox,
    CartToggle,
    CartCounter,
    LoadingMask,
    ViewCartLink,
    FlyoutCheckout,
    ResultCard(usize),
    SizeSwatch(String),
    ColorSwatch(String),
    QtyInput,
    AddToCart,
    Row(u64),
    RowName(u64),
    DeleteButton(u64),
    GuestField(String),
    CountrySelect,
    RegionSelect,
    ShippingRadio,
    ShippingForm,
    PaymentForm,
    PlaceOrder,
    ConfirmationBanner,
    LoginEmail,
    LoginPassword,
    LoginSubmit,
    Greeting,
    AccountMenuToggle,
    SignInLink,
    SignOutLink,
    DiscountHeading,
    DiscountCode,
    DiscountApply,
    DiscountCancel,
}

impl Role {
    /// Selector recorded in the journal for this element.
    fn canonical_selector(&self) -> String {
        match self {
            Role::SearchBox => sel::SEARCH_BOX.to_string(),
            Role::CartToggle => sel::CART_TOGGLE.to_string(),
            Role::CartCounter => sel::CART_COUNTER.to_string(),
            Role::LoadingMask => sel::LOADING_MASK.to_string(),
            Role::ViewCartLink => sel::VIEW_CART_LINK.to_string(),
            Role::FlyoutCheckout => sel::FLYOUT_CHECKOUT.to_string(),
            Role::ResultCard(i) => format!("{}:nth({i})", sel::RESULT_CARD),
            Role::SizeSwatch(label) => sel::size_swatch(label).to_string(),
            Role::ColorSwatch(label) => sel::color_swatch(label).to_string(),
            Role::QtyInput => sel::QTY_INPUT.to_string(),
            Role::AddToCart => sel::ADD_TO_CART.to_string(),
            Role::Row(_) => sel::CART_ROW.to_string(),
            Role::RowName(_) => sel::CART_ROW_NAME.to_string(),
            Role::DeleteButton(_) => sel::DELETE_ACTION.to_string(),
            Role::GuestField(key) => sel::GUEST_FIELDS
                .iter()
                .find(|(k, _)| *k == key.as_str())
                .map(|(_, css)| css.to_string())
                .unwrap_or_else(|| key.clone()),
            Role::CountrySelect => sel::COUNTRY_SELECT.to_string(),
            Role::RegionSelect => sel::REGION_SELECT.to_string(),
            Role::ShippingRadio => sel::SHIPPING_RADIO.to_string(),
            Role::ShippingForm => sel::SHIPPING_FORM.to_string(),
            Role::PaymentForm => sel::PAYMENT_FORM.to_string(),
            Role::PlaceOrder => sel::PLACE_ORDER.to_string(),
            Role::ConfirmationBanner => sel::CONFIRMATION_BANNER.to_string(),
            Role::LoginEmail => sel::LOGIN_EMAIL.to_string(),
            Role::LoginPassword => sel::LOGIN_PASSWORD.to_string(),
            Role::LoginSubmit => sel::LOGIN_SUBMIT.to_string(),
            Role::Greeting => sel::GREETING.to_string(),
            Role::AccountMenuToggle => sel::ACCOUNT_MENU_TOGGLE.to_string(),
            Role::SignInLink | Role::SignOutLink => sel::AUTH_LINK.to_string(),
            Role::DiscountHeading => sel::DISCOUNT_HEADING.to_string(),
            Role::DiscountCode => sel::DISCOUNT_CODE.to_string(),
            Role::DiscountApply => sel::DISCOUNT_APPLY.to_string(),
            Role::DiscountCancel => sel::DISCOUNT_CANCEL.to_string(),
        }
    }
}

/// One recorded interaction, for test assertions over what a journey did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Navigate { path: String },
    Click { selector: String },
    Clear { selector: String },
    Type { selector: String, text: String },
    PressEnter { selector: String },
    Select { selector: String, value: String },
    Submit { selector: String },
}

impl Interaction {
    /// Selector the interaction targeted; empty for navigations.
    pub fn selector(&self) -> &str {
        match self {
            Interaction::Navigate { .. } => "",
            Interaction::Click { selector }
            | Interaction::Clear { selector }
            | Interaction::Type { selector, .. }
            | Interaction::PressEnter { selector }
            | Interaction::Select { selector, .. }
            | Interaction::Submit { selector } => selector,
        }
    }

    pub fn is_click(&self) -> bool {
        matches!(self, Interaction::Click { .. })
    }
}

#[derive(Debug, Clone)]
struct CartLine {
    id: u64,
    item: usize,
    qty: u32,
    size: Option<String>,
    color: Option<String>,
}

/// Cart contents as tests see them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineSnapshot {
    pub name: String,
    pub qty: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

pub(crate) struct StoreState {
    seed: SimSeed,
    view: View,
    epoch: u64,
    view_settle: u8,
    mask_ticks: u8,
    flyout: Panel,
    account_menu: Panel,
    discount_panel: Panel,

    // product page
    selected_size: Option<String>,
    selected_color: Option<String>,
    qty_text: String,

    // header search
    search_text: String,

    // auth
    login_email: String,
    login_password: String,
    pending_login: Option<(String, u8)>,
    session: Option<String>,

    // cart
    cart: Vec<CartLine>,
    next_line: u64,
    pending_removal: Vec<(u64, u8)>,

    // checkout
    form: BTreeMap<String, String>,
    region_options: Vec<String>,
    region_pending: u8,
    region_ready: bool,
    shipping_chosen: bool,
    shipping_submitted: bool,
    payment_submitted: bool,
    coupon_text: String,
    applied_coupon: Option<String>,
    orders_placed: u32,

    // element registry
    bindings: HashMap<u64, (Role, u64)>,
    bound_roles: HashMap<Role, (u64, u64)>,
    next_element: u64,

    journal: Vec<Interaction>,
}

impl StoreState {
    pub(crate) fn new(seed: SimSeed) -> Self {
        Self {
            seed,
            view: View::Home,
            epoch: 0,
            view_settle: 0,
            mask_ticks: 0,
            flyout: Panel::Closed,
            account_menu: Panel::Closed,
            discount_panel: Panel::Closed,
            selected_size: None,
            selected_color: None,
            qty_text: "1".to_string(),
            search_text: String::new(),
            login_email: String::new(),
            login_password: String::new(),
            pending_login: None,
            session: None,
            cart: Vec::new(),
            next_line: 1,
            pending_removal: Vec::new(),
            form: BTreeMap::new(),
            region_options: Vec::new(),
            region_pending: 0,
            region_ready: false,
            shipping_chosen: false,
            shipping_submitted: false,
            payment_submitted: false,
            coupon_text: String::new(),
            applied_coupon: None,
            orders_placed: 0,
            bindings: HashMap::new(),
            bound_roles: HashMap::new(),
            next_element: 1,
            journal: Vec::new(),
        }
    }

    fn settle(&self) -> u8 {
        self.seed.settle_ticks
    }

    /// Advance simulated time. Called once per page query so that bounded
    /// polls observe transitions instead of instantaneous state.
    fn tick(&mut self) {
        if self.view_settle > 0 {
            self.view_settle -= 1;
        }
        if self.mask_ticks > 0 {
            self.mask_ticks -= 1;
        }
        self.flyout.tick();
        self.account_menu.tick();
        self.discount_panel.tick();

        if let Some((name, left)) = self.pending_login.take() {
            if left <= 1 {
                info!(account = %name, "session established");
                self.session = Some(name);
            } else {
                self.pending_login = Some((name, left - 1));
            }
        }

        if self.region_pending > 0 {
            self.region_pending -= 1;
            if self.region_pending == 0 {
                self.region_ready = true;
            }
        }

        if !self.seed.stuck_delete {
            let mut done = Vec::new();
            for entry in &mut self.pending_removal {
                if entry.1 == 0 {
                    done.push(entry.0);
                } else {
                    entry.1 -= 1;
                }
            }
            if !done.is_empty() {
                self.cart.retain(|line| !done.contains(&line.id));
                self.pending_removal.retain(|(id, _)| !done.contains(id));
                debug!(removed = done.len(), left = self.cart.len(), "cart rows removed");
            }
        }
    }

    fn goto_view(&mut self, view: View) {
        debug!(?view, "view change");
        self.epoch += 1;
        self.view_settle = self.settle();
        self.mask_ticks = 0;
        self.flyout = Panel::Closed;
        self.account_menu = Panel::Closed;
        self.discount_panel = Panel::Closed;
        if view == View::Checkout && self.view != View::Checkout {
            self.region_pending = 0;
            self.region_ready = false;
            self.shipping_chosen = false;
            self.shipping_submitted = false;
            self.payment_submitted = false;
            self.coupon_text.clear();
        }
        self.view = view;
    }

    fn current_product(&self) -> Option<&Product> {
        match &self.view {
            View::Product { item } => self.seed.catalog.get(*item),
            _ => None,
        }
    }

    fn total_qty(&self) -> u32 {
        self.cart.iter().map(|line| line.qty).sum()
    }

    fn search_hits(&self, query: &str) -> Vec<usize> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.seed
            .catalog
            .iter()
            .enumerate()
            .filter(|(_, p)| p.name.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }

    fn greeting_name(&self) -> Option<&str> {
        self.session.as_deref()
    }

    // ---- element roles -------------------------------------------------

    fn roles_for(&self, locator: &Locator) -> Vec<Role> {
        if let Narrowing::Attr { name, value } = &locator.narrowing {
            if locator.css == ".swatch-option.color" && name == "option-label" {
                return vec![Role::ColorSwatch(value.clone())];
            }
            return Vec::new();
        }

        match locator.css.as_str() {
            sel::SEARCH_BOX | sel::SEARCH_BOX_BY_NAME => vec![Role::SearchBox],
            sel::CART_TOGGLE | sel::CART_TOGGLE_BY_CLASS => vec![Role::CartToggle],
            sel::CART_COUNTER => vec![Role::CartCounter],
            sel::LOADING_MASK => vec![Role::LoadingMask],
            sel::VIEW_CART_LINK => vec![Role::ViewCartLink],
            sel::FLYOUT_CHECKOUT => vec![Role::FlyoutCheckout],
            sel::RESULT_CARD => match &self.view {
                View::SearchResults { hits } => {
                    (0..hits.len()).map(Role::ResultCard).collect()
                }
                _ => Vec::new(),
            },
            ".swatch-option.text" => match &locator.narrowing {
                Narrowing::Text(label) => vec![Role::SizeSwatch(label.clone())],
                _ => self
                    .current_product()
                    .map(|p| p.sizes.iter().cloned().map(Role::SizeSwatch).collect())
                    .unwrap_or_default(),
            },
            ".swatch-option.color" => self
                .current_product()
                .map(|p| p.colors.iter().cloned().map(Role::ColorSwatch).collect())
                .unwrap_or_default(),
            sel::QTY_INPUT => vec![Role::QtyInput],
            sel::ADD_TO_CART => vec![Role::AddToCart],
            sel::CART_ROW => self.cart.iter().map(|l| Role::Row(l.id)).collect(),
            sel::CART_ROW_NAME => self.cart.iter().map(|l| Role::RowName(l.id)).collect(),
            sel::DELETE_ACTION => self.cart.iter().map(|l| Role::DeleteButton(l.id)).collect(),
            sel::COUNTRY_SELECT => vec![Role::CountrySelect],
            sel::REGION_SELECT => vec![Role::RegionSelect],
            sel::SHIPPING_RADIO => vec![Role::ShippingRadio],
            sel::SHIPPING_FORM => vec![Role::ShippingForm],
            sel::PAYMENT_FORM => vec![Role::PaymentForm],
            sel::PLACE_ORDER => vec![Role::PlaceOrder],
            sel::CONFIRMATION_BANNER => vec![Role::ConfirmationBanner],
            sel::LOGIN_EMAIL => vec![Role::LoginEmail],
            sel::LOGIN_PASSWORD => vec![Role::LoginPassword],
            sel::LOGIN_SUBMIT => vec![Role::LoginSubmit],
            sel::GREETING => vec![Role::Greeting],
            sel::ACCOUNT_MENU_TOGGLE => vec![Role::AccountMenuToggle],
            sel::AUTH_LINK => vec![Role::SignOutLink, Role::SignInLink],
            sel::DISCOUNT_HEADING => vec![Role::DiscountHeading],
            sel::DISCOUNT_CODE => vec![Role::DiscountCode],
            sel::DISCOUNT_APPLY => vec![Role::DiscountApply],
            sel::DISCOUNT_CANCEL => vec![Role::DiscountCancel],
            other => sel::GUEST_FIELDS
                .iter()
                .find(|(_, css)| *css == other)
                .map(|(key, _)| vec![Role::GuestField(key.to_string())])
                .unwrap_or_default(),
        }
    }

    /// Presence of a role in the current state: `None` when absent,
    /// otherwise `(visible, enabled)`.
    fn probe_role(&self, role: &Role) -> Option<(bool, bool)> {
        let settled = self.view_settle == 0;
        let mask_clear = self.mask_ticks == 0;
        let on_checkout = matches!(self.view, View::Checkout);

        match role {
            Role::SearchBox | Role::CartToggle => Some((true, true)),
            Role::LoadingMask => (self.mask_ticks > 0).then_some((true, true)),
            Role::CartCounter => (self.total_qty() > 0).then_some((mask_clear, true)),
            Role::ViewCartLink | Role::FlyoutCheckout => match self.flyout {
                Panel::Closed => None,
                Panel::Opening(_) => Some((false, false)),
                Panel::Open => Some((true, true)),
            },
            Role::ResultCard(i) => match &self.view {
                View::SearchResults { hits } if settled && *i < hits.len() => {
                    Some((true, true))
                }
                _ => None,
            },
            Role::SizeSwatch(label) => self
                .current_product()
                .filter(|_| settled)
                .filter(|p| p.sizes.iter().any(|s| s == label))
                .map(|_| (true, true)),
            Role::ColorSwatch(label) => self
                .current_product()
                .filter(|_| settled)
                .filter(|p| p.colors.iter().any(|c| c == label))
                .map(|_| (true, true)),
            Role::QtyInput | Role::AddToCart => {
                (self.current_product().is_some() && settled).then_some((true, true))
            }
            Role::Row(id) | Role::RowName(id) | Role::DeleteButton(id) => {
                (matches!(self.view, View::CartPage)
                    && settled
                    && self.cart.iter().any(|l| l.id == *id))
                .then_some((true, true))
            }
            Role::GuestField(_) | Role::CountrySelect => {
                (on_checkout && settled).then_some((true, true))
            }
            Role::RegionSelect => {
                (on_checkout && settled && self.region_ready).then_some((true, true))
            }
            Role::ShippingRadio | Role::ShippingForm => {
                (on_checkout && settled).then_some((mask_clear, true))
            }
            Role::PaymentForm => (on_checkout && settled && self.shipping_submitted)
                .then_some((mask_clear, mask_clear)),
            Role::PlaceOrder => (on_checkout && settled && self.payment_submitted)
                .then_some((mask_clear, mask_clear)),
            Role::ConfirmationBanner => {
                (matches!(self.view, View::Confirmation) && settled).then_some((true, true))
            }
            Role::LoginEmail | Role::LoginPassword | Role::LoginSubmit => {
                (matches!(self.view, View::Login) && settled).then_some((true, true))
            }
            Role::Greeting | Role::AccountMenuToggle => {
                self.session.is_some().then_some((true, true))
            }
            Role::SignInLink => self.session.is_none().then_some((true, true)),
            Role::SignOutLink => {
                if self.session.is_none() {
                    return None;
                }
                match self.account_menu {
                    Panel::Closed => None,
                    Panel::Opening(_) => Some((false, false)),
                    Panel::Open => Some((true, true)),
                }
            }
            Role::DiscountHeading => (on_checkout && settled).then_some((mask_clear, true)),
            Role::DiscountCode | Role::DiscountApply => {
                if !on_checkout || !settled {
                    return None;
                }
                match self.discount_panel {
                    Panel::Closed => None,
                    Panel::Opening(_) => Some((false, false)),
                    Panel::Open => Some((true, mask_clear)),
                }
            }
            Role::DiscountCancel => {
                if !on_checkout || !settled || self.applied_coupon.is_none() {
                    return None;
                }
                match self.discount_panel {
                    Panel::Open => Some((true, mask_clear)),
                    _ => None,
                }
            }
        }
    }

    fn role_text(&self, role: &Role) -> String {
        match role {
            Role::Greeting => self
                .greeting_name()
                .map(|name| format!("Welcome, {name}!"))
                .unwrap_or_default(),
            Role::CartCounter => self.total_qty().to_string(),
            Role::RowName(id) => self
                .cart
                .iter()
                .find(|l| l.id == *id)
                .and_then(|l| self.seed.catalog.get(l.item))
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            Role::SizeSwatch(label) => label.clone(),
            Role::ResultCard(i) => match &self.view {
                View::SearchResults { hits } => hits
                    .get(*i)
                    .and_then(|idx| self.seed.catalog.get(*idx))
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            },
            Role::SignInLink => "Sign In".to_string(),
            Role::SignOutLink => "Sign Out".to_string(),
            Role::ConfirmationBanner => "Thank you for your purchase!".to_string(),
            Role::DiscountHeading => "Apply Discount Code".to_string(),
            _ => String::new(),
        }
    }

    fn narrowing_matches(&self, locator: &Locator, role: &Role) -> bool {
        match &locator.narrowing {
            Narrowing::None | Narrowing::Attr { .. } => true,
            Narrowing::Text(text) => self.role_text(role) == *text,
        }
    }

    fn bind(&mut self, role: Role) -> ElementId {
        if let Some((id, epoch)) = self.bound_roles.get(&role) {
            if *epoch == self.epoch {
                return ElementId(*id);
            }
        }
        let id = self.next_element;
        self.next_element += 1;
        self.bindings.insert(id, (role.clone(), self.epoch));
        self.bound_roles.insert(role, (id, self.epoch));
        ElementId(id)
    }

    /// Role behind a handle, provided the element is still attached.
    fn attached_role(&self, id: ElementId) -> PageResult<Role> {
        match self.bindings.get(&id.0) {
            Some((role, epoch)) if *epoch == self.epoch && self.probe_role(role).is_some() => {
                Ok(role.clone())
            }
            _ => Err(PageError::StaleElement(id)),
        }
    }

    // ---- page queries --------------------------------------------------

    pub(crate) fn find(&mut self, locator: &Locator) -> Option<ElementId> {
        self.tick();
        let roles = self.roles_for(locator);
        for role in roles {
            if self.probe_role(&role).is_none() {
                continue;
            }
            if !self.narrowing_matches(locator, &role) {
                continue;
            }
            return Some(self.bind(role));
        }
        None
    }

    pub(crate) fn find_all(&mut self, locator: &Locator) -> Vec<ElementId> {
        self.tick();
        let matching: Vec<Role> = self
            .roles_for(locator)
            .into_iter()
            .filter(|role| {
                self.probe_role(role).is_some() && self.narrowing_matches(locator, role)
            })
            .collect();
        matching.into_iter().map(|role| self.bind(role)).collect()
    }

    pub(crate) fn find_in(&mut self, scope: ElementId, locator: &Locator) -> Option<ElementId> {
        self.tick();
        let (scope_role, epoch) = self.bindings.get(&scope.0)?.clone();
        if epoch != self.epoch {
            return None;
        }
        let line = match scope_role {
            Role::Row(id) => id,
            _ => return None,
        };
        let role = match locator.css.as_str() {
            sel::CART_ROW_NAME => Role::RowName(line),
            sel::DELETE_ACTION => Role::DeleteButton(line),
            _ => return None,
        };
        if self.probe_role(&role).is_none() || !self.narrowing_matches(locator, &role) {
            return None;
        }
        Some(self.bind(role))
    }

    pub(crate) fn element_state(&mut self, id: ElementId) -> ElementState {
        self.tick();
        match self.bindings.get(&id.0) {
            Some((role, epoch)) if *epoch == self.epoch => match self.probe_role(role) {
                Some((visible, enabled)) => ElementState {
                    attached: true,
                    visible,
                    enabled,
                },
                None => ElementState::detached(),
            },
            _ => ElementState::detached(),
        }
    }

    pub(crate) fn is_ready(&mut self) -> bool {
        self.tick();
        self.view_settle == 0
    }

    pub(crate) fn current_url(&self) -> String {
        format!(
            "{}{}",
            self.seed.base_url.trim_end_matches('/'),
            self.view.path(&self.seed.catalog)
        )
    }

    // ---- interactions --------------------------------------------------

    pub(crate) fn navigate(&mut self, url: &str) -> PageResult<()> {
        let path = path_of(url);
        self.journal.push(Interaction::Navigate { path: path.clone() });
        let view = if path.starts_with(sel::routes::LOGIN) {
            View::Login
        } else if path.starts_with("/checkout/cart") {
            View::CartPage
        } else if path.starts_with("/checkout/onepage/success") {
            View::Confirmation
        } else if path.starts_with("/checkout") {
            View::Checkout
        } else if path == "/" || path.is_empty() {
            View::Home
        } else {
            warn!(%path, "unknown route, landing on home");
            View::Home
        };
        self.goto_view(view);
        Ok(())
    }

    pub(crate) fn click(&mut self, id: ElementId) -> PageResult<()> {
        let role = self.attached_role(id)?;
        self.journal.push(Interaction::Click {
            selector: role.canonical_selector(),
        });
        let settle = self.settle();
        match role {
            Role::ResultCard(i) => {
                let item = match &self.view {
                    View::SearchResults { hits } => hits.get(i).copied(),
                    _ => None,
                };
                if let Some(item) = item {
                    self.goto_view(View::Product { item });
                    self.selected_size = None;
                    self.selected_color = None;
                    self.qty_text = "1".to_string();
                }
            }
            Role::SizeSwatch(label) => self.selected_size = Some(label),
            Role::ColorSwatch(label) => self.selected_color = Some(label),
            Role::AddToCart => self.add_current_to_cart(),
            Role::CartToggle => self.flyout = self.flyout.toggled(settle),
            Role::ViewCartLink => self.goto_view(View::CartPage),
            Role::FlyoutCheckout => self.goto_view(View::Checkout),
            Role::DeleteButton(line) => {
                if !self.pending_removal.iter().any(|(id, _)| *id == line) {
                    debug!(line, "cart row removal scheduled");
                    self.pending_removal.push((line, settle));
                }
            }
            Role::ShippingRadio => self.shipping_chosen = true,
            Role::PlaceOrder => self.place_order(),
            Role::LoginSubmit => self.submit_login(),
            Role::AccountMenuToggle => self.account_menu = self.account_menu.toggled(settle),
            Role::SignOutLink => {
                info!("signed out");
                self.session = None;
                self.pending_login = None;
                self.goto_view(View::Home);
            }
            Role::SignInLink => self.goto_view(View::Login),
            Role::DiscountHeading => self.discount_panel = self.discount_panel.toggled(settle),
            Role::DiscountApply => self.apply_coupon(),
            Role::DiscountCancel => {
                info!("coupon removed");
                self.applied_coupon = None;
                self.mask_ticks = settle;
            }
            // Focus-only targets: inputs, rows, banners.
            _ => {}
        }
        Ok(())
    }

    fn add_current_to_cart(&mut self) {
        let Some((item, product)) = (match &self.view {
            View::Product { item } => self.seed.catalog.get(*item).map(|p| (*item, p.clone())),
            _ => None,
        }) else {
            return;
        };
        let missing_size = !product.sizes.is_empty() && self.selected_size.is_none();
        let missing_color = !product.colors.is_empty() && self.selected_color.is_none();
        if missing_size || missing_color {
            warn!(product = %product.name, "add to cart ignored: required options not chosen");
            return;
        }
        let qty = self.qty_text.trim().parse().unwrap_or(1);
        let line = CartLine {
            id: self.next_line,
            item,
            qty,
            size: self.selected_size.clone(),
            color: self.selected_color.clone(),
        };
        self.next_line += 1;
        info!(product = %product.name, qty, "cart line added");
        self.cart.push(line);
        self.mask_ticks = self.settle();
    }

    fn place_order(&mut self) {
        if self.cart.is_empty() {
            warn!("place order ignored: cart is empty");
            return;
        }
        self.orders_placed += 1;
        info!(order = self.orders_placed, lines = self.cart.len(), "order placed");
        self.cart.clear();
        self.pending_removal.clear();
        self.applied_coupon = None;
        self.goto_view(View::Confirmation);
    }

    fn submit_login(&mut self) {
        let account = &self.seed.account;
        if self.login_email == account.email && self.login_password == account.password {
            let name = self
                .seed
                .wrong_greeting
                .clone()
                .unwrap_or_else(|| account.display_name.clone());
            let settle = self.settle();
            if settle == 0 {
                self.session = Some(name);
            } else {
                self.pending_login = Some((name, settle));
            }
            self.goto_view(View::Home);
        } else {
            warn!(email = %self.login_email, "login rejected");
        }
    }

    fn apply_coupon(&mut self) {
        let code = self.coupon_text.trim().to_string();
        if code == self.seed.discount_code {
            info!(%code, "coupon accepted");
            self.applied_coupon = Some(code);
        } else {
            warn!(%code, "coupon rejected");
        }
        self.mask_ticks = self.settle();
    }

    pub(crate) fn clear(&mut self, id: ElementId) -> PageResult<()> {
        let role = self.attached_role(id)?;
        self.journal.push(Interaction::Clear {
            selector: role.canonical_selector(),
        });
        match role {
            Role::SearchBox => self.search_text.clear(),
            Role::QtyInput => self.qty_text.clear(),
            Role::LoginEmail => self.login_email.clear(),
            Role::LoginPassword => self.login_password.clear(),
            Role::DiscountCode => self.coupon_text.clear(),
            Role::GuestField(key) => {
                self.form.insert(key, String::new());
            }
            other => {
                return Err(PageError::Unsupported(format!(
                    "clear on {}",
                    other.canonical_selector()
                )))
            }
        }
        Ok(())
    }

    pub(crate) fn type_text(&mut self, id: ElementId, text: &str) -> PageResult<()> {
        let role = self.attached_role(id)?;
        self.journal.push(Interaction::Type {
            selector: role.canonical_selector(),
            text: text.to_string(),
        });
        match role {
            Role::SearchBox => self.search_text.push_str(text),
            Role::QtyInput => self.qty_text.push_str(text),
            Role::LoginEmail => self.login_email.push_str(text),
            Role::LoginPassword => self.login_password.push_str(text),
            Role::DiscountCode => self.coupon_text.push_str(text),
            Role::GuestField(key) => {
                self.form.entry(key).or_default().push_str(text);
            }
            other => {
                return Err(PageError::Unsupported(format!(
                    "type into {}",
                    other.canonical_selector()
                )))
            }
        }
        Ok(())
    }

    pub(crate) fn press_enter(&mut self, id: ElementId) -> PageResult<()> {
        let role = self.attached_role(id)?;
        self.journal.push(Interaction::PressEnter {
            selector: role.canonical_selector(),
        });
        if role == Role::SearchBox {
            let query = self.search_text.clone();
            let hits = self.search_hits(&query);
            info!(%query, hits = hits.len(), "search submitted");
            self.goto_view(View::SearchResults { hits });
        }
        Ok(())
    }

    pub(crate) fn select_value(&mut self, id: ElementId, value: &str) -> PageResult<()> {
        let role = self.attached_role(id)?;
        self.journal.push(Interaction::Select {
            selector: role.canonical_selector(),
            value: value.to_string(),
        });
        match role {
            Role::CountrySelect => {
                let Some(regions) = self.seed.countries.get(value) else {
                    return Err(PageError::OptionNotFound {
                        value: value.to_string(),
                    });
                };
                self.region_options = regions.clone();
                self.form.insert(sel::COUNTRY_KEY.to_string(), value.to_string());
                let settle = self.settle();
                if settle == 0 {
                    self.region_ready = true;
                } else {
                    self.region_pending = settle;
                    self.region_ready = false;
                }
                Ok(())
            }
            Role::RegionSelect => {
                if !self.region_options.iter().any(|code| code == value) {
                    return Err(PageError::OptionNotFound {
                        value: value.to_string(),
                    });
                }
                self.form.insert(sel::REGION_KEY.to_string(), value.to_string());
                Ok(())
            }
            other => Err(PageError::Unsupported(format!(
                "select on {}",
                other.canonical_selector()
            ))),
        }
    }

    pub(crate) fn submit_form(&mut self, id: ElementId) -> PageResult<()> {
        let role = self.attached_role(id)?;
        self.journal.push(Interaction::Submit {
            selector: role.canonical_selector(),
        });
        match role {
            Role::ShippingForm => {
                info!("shipping method submitted");
                self.shipping_submitted = true;
                self.mask_ticks = self.settle();
                Ok(())
            }
            Role::PaymentForm => {
                info!("payment submitted");
                self.payment_submitted = true;
                self.mask_ticks = self.settle();
                Ok(())
            }
            other => Err(PageError::Unsupported(format!(
                "submit on {}",
                other.canonical_selector()
            ))),
        }
    }

    pub(crate) fn text(&mut self, id: ElementId) -> PageResult<String> {
        let role = self.attached_role(id)?;
        Ok(self.role_text(&role))
    }

    // ---- inspection ----------------------------------------------------

    pub(crate) fn journal(&self) -> Vec<Interaction> {
        self.journal.clone()
    }

    pub(crate) fn cart_lines(&self) -> Vec<CartLineSnapshot> {
        self.cart
            .iter()
            .map(|line| CartLineSnapshot {
                name: self
                    .seed
                    .catalog
                    .get(line.item)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                qty: line.qty,
                size: line.size.clone(),
                color: line.color.clone(),
            })
            .collect()
    }

    pub(crate) fn orders_placed(&self) -> u32 {
        self.orders_placed
    }

    pub(crate) fn logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub(crate) fn form_value(&self, key: &str) -> Option<String> {
        self.form.get(key).cloned()
    }

    pub(crate) fn applied_coupon(&self) -> Option<String> {
        self.applied_coupon.clone()
    }

    pub(crate) fn shipping_submitted(&self) -> bool {
        self.shipping_submitted
    }
}

/// Path (plus fragment) of an absolute or relative URL.
fn path_of(url: &str) -> String {
    let rest = match url.find("://") {
        Some(i) => &url[i + 3..],
        None => return url.to_string(),
    };
    match rest.find('/') {
        Some(i) => rest[i..].to_string(),
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_of_strips_scheme_and_host() {
        assert_eq!(path_of("https://shop.example/checkout/cart/"), "/checkout/cart/");
        assert_eq!(path_of("https://shop.example"), "/");
        assert_eq!(path_of("/checkout/#shipping"), "/checkout/#shipping");
    }

    #[test]
    fn panel_settles_through_opening() {
        let mut p = Panel::opening(2);
        assert_eq!(p, Panel::Opening(2));
        p.tick();
        assert_eq!(p, Panel::Opening(1));
        p.tick();
        assert_eq!(p, Panel::Open);
        assert_eq!(Panel::opening(0), Panel::Open);
    }

    #[test]
    fn toggling_an_open_panel_closes_it() {
        assert_eq!(Panel::Open.toggled(2), Panel::Closed);
        assert_eq!(Panel::Closed.toggled(0), Panel::Open);
    }
}
