//! End-to-end scenarios
//!
//! Each scenario is one shopper journey on one fresh session. Scenarios
//! abort on the first failing step; cleanup of remote state is left to
//! the cart-cleanup journey rather than bolted onto every scenario.

use cartwheel_core::outcome::StepResult;
use cartwheel_core::record::OrderDetails;
use cartwheel_core::selectors;
use tracing::info;

use crate::steps::{CartIntent, Shopper};

/// Controls every journey leans on, checked up front by the smoke
/// scenario: display name paired with the selector to probe.
const SMOKE_CHECKS: &[(&str, &str)] = &[
    ("search box", selectors::SEARCH_BOX_BY_NAME),
    ("cart toggle", selectors::CART_TOGGLE_BY_CLASS),
];

/// The five journeys the suite ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    StorefrontSmoke,
    GuestPurchase,
    SignedInPurchase,
    LoginRoundTrip,
    CartCleanup,
}

impl Scenario {
    /// Every scenario, in suite order. Smoke runs first so a broken
    /// storefront fails fast and cheap.
    pub fn all() -> [Scenario; 5] {
        [
            Scenario::StorefrontSmoke,
            Scenario::GuestPurchase,
            Scenario::SignedInPurchase,
            Scenario::LoginRoundTrip,
            Scenario::CartCleanup,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::StorefrontSmoke => "storefront-smoke",
            Scenario::GuestPurchase => "guest-purchase",
            Scenario::SignedInPurchase => "signed-in-purchase",
            Scenario::LoginRoundTrip => "login-round-trip",
            Scenario::CartCleanup => "cart-cleanup",
        }
    }

    pub fn from_name(name: &str) -> Option<Scenario> {
        Scenario::all().into_iter().find(|s| s.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::StorefrontSmoke => "storefront offers the controls every journey needs",
            Scenario::GuestPurchase => "guest buys two items and reaches the confirmation page",
            Scenario::SignedInPurchase => {
                "signed-in shopper buys three items and applies the discount code"
            }
            Scenario::LoginRoundTrip => "login shows the exact greeting and logout undoes it",
            Scenario::CartCleanup => "signed-in shopper clears the cart row by row",
        }
    }

    /// Drive the journey to completion on an open session.
    pub async fn run(&self, shopper: &Shopper<'_>) -> StepResult<()> {
        info!(scenario = self.name(), "journey start");
        match self {
            Scenario::StorefrontSmoke => storefront_smoke(shopper).await,
            Scenario::GuestPurchase => guest_purchase(shopper).await,
            Scenario::SignedInPurchase => signed_in_purchase(shopper).await,
            Scenario::LoginRoundTrip => login_round_trip(shopper).await,
            Scenario::CartCleanup => cart_cleanup(shopper).await,
        }
    }
}

/// The configurable item most journeys put in the cart.
fn jackshirt() -> CartIntent {
    CartIntent::with_options("Proteus Fitness Jackshirt", 3, "XL", "Orange")
}

/// The option-free item, exercising the no-swatch path.
fn duffle() -> CartIntent {
    CartIntent::simple("Overnight Duffle", 3)
}

async fn storefront_smoke(shopper: &Shopper<'_>) -> StepResult<()> {
    shopper.open_home().await?;
    for (what, css) in SMOKE_CHECKS {
        shopper.check_present(what, css).await?;
    }
    Ok(())
}

async fn guest_purchase(shopper: &Shopper<'_>) -> StepResult<()> {
    shopper.open_home().await?;
    shopper.add_item_to_cart(&jackshirt()).await?;
    shopper.add_item_to_cart(&duffle()).await?;
    shopper.go_to_checkout().await?;
    shopper.open_checkout_shipping().await?;

    let details = OrderDetails::load(&shopper.config().details_path)?;
    shopper.fill_guest_order_details(&details).await?;
    shopper.select_shipping_method().await?;
    shopper.submit_payment().await?;
    shopper.place_order().await?;
    shopper.confirm_order_placed().await
}

async fn signed_in_purchase(shopper: &Shopper<'_>) -> StepResult<()> {
    shopper.open_home().await?;
    shopper.log_in().await?;
    shopper.add_item_to_cart(&jackshirt()).await?;
    shopper.add_item_to_cart(&duffle()).await?;
    shopper
        .add_item_to_cart(&CartIntent::with_options(
            "Ina Compression Short",
            3,
            "28",
            "Red",
        ))
        .await?;
    shopper.go_to_checkout().await?;
    shopper.submit_shipping_form().await?;
    shopper.apply_discount_code().await
}

async fn login_round_trip(shopper: &Shopper<'_>) -> StepResult<()> {
    shopper.open_home().await?;
    shopper.log_in().await?;
    shopper.verify_greeting().await?;
    shopper.log_out().await?;
    shopper.verify_signed_out().await
}

async fn cart_cleanup(shopper: &Shopper<'_>) -> StepResult<()> {
    shopper.open_home().await?;
    shopper.log_in().await?;
    shopper.add_item_to_cart(&jackshirt()).await?;
    shopper.add_item_to_cart(&duffle()).await?;
    let removed = shopper.delete_all_cart_items().await?;
    info!(removed, "cart cleared");
    shopper.log_out().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Scenario::StorefrontSmoke, "storefront-smoke")]
    #[test_case(Scenario::GuestPurchase, "guest-purchase")]
    #[test_case(Scenario::SignedInPurchase, "signed-in-purchase")]
    #[test_case(Scenario::LoginRoundTrip, "login-round-trip")]
    #[test_case(Scenario::CartCleanup, "cart-cleanup")]
    fn names_round_trip(scenario: Scenario, name: &str) {
        assert_eq!(scenario.name(), name);
        assert_eq!(Scenario::from_name(name), Some(scenario));
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(Scenario::from_name("warehouse-audit"), None);
    }

    #[test]
    fn suite_order_starts_with_smoke() {
        assert_eq!(Scenario::all()[0], Scenario::StorefrontSmoke);
    }
}
