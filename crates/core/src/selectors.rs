//! Affordance map of the target storefront
//!
//! The selectors both backends honour. These mirror the demo shop's markup;
//! the simulated storefront recognises exactly this set, so a selector typo
//! fails the same way against either backend.

use crate::locator::Locator;

pub const SEARCH_BOX: &str = "#search";
/// Same control addressed by name, used by the smoke checks.
pub const SEARCH_BOX_BY_NAME: &str = "input[name='q']";
pub const RESULT_CARD: &str = ".product-item-info";
pub const QTY_INPUT: &str = "#qty";
pub const ADD_TO_CART: &str = "#product-addtocart-button";
pub const LOADING_MASK: &str = "div.loading-mask";

pub const CART_COUNTER: &str = ".counter-number";
pub const CART_TOGGLE: &str = "a.action.showcart";
/// Same control addressed by class alone, used by the smoke checks.
pub const CART_TOGGLE_BY_CLASS: &str = ".showcart";
pub const VIEW_CART_LINK: &str = "a.action.viewcart";
pub const FLYOUT_CHECKOUT: &str = "#top-cart-btn-checkout";
pub const CART_ROW: &str = ".cart.item";
pub const CART_ROW_NAME: &str = ".product-item-name";
pub const DELETE_ACTION: &str = ".action-delete";

pub const GUEST_EMAIL: &str = "#customer-email";
pub const COUNTRY_SELECT: &str = "select[name='country_id']";
pub const REGION_SELECT: &str = "select[name='region_id']";
pub const SHIPPING_RADIO: &str = "input[type='radio']";
pub const SHIPPING_FORM: &str = "#co-shipping-method-form";
pub const PAYMENT_FORM: &str = "#co-payment-form";
pub const PLACE_ORDER: &str = "button[title='Place Order']";
pub const CONFIRMATION_BANNER: &str = ".checkout-success";

pub const LOGIN_EMAIL: &str = "#email";
pub const LOGIN_PASSWORD: &str = "#pass";
pub const LOGIN_SUBMIT: &str = "#send2";
pub const GREETING: &str = ".logged-in";
pub const ACCOUNT_MENU_TOGGLE: &str = "span.customer-name button.action.switch";
pub const AUTH_LINK: &str = "li.authorization-link a";

pub const DISCOUNT_HEADING: &str = "#block-discount-heading";
pub const DISCOUNT_CODE: &str = "#discount-code";
pub const DISCOUNT_APPLY: &str = "button.action.action-apply";
pub const DISCOUNT_CANCEL: &str = "button.action.action-cancel";

/// Guest checkout text fields in fill order: record key to selector.
/// Country and region are selects and handled separately.
pub const GUEST_FIELDS: &[(&str, &str)] = &[
    ("customer-email", GUEST_EMAIL),
    ("firstname", "input[name='firstname']"),
    ("lastname", "input[name='lastname']"),
    ("company", "input[name='company']"),
    ("street[0]", "input[name='street[0]']"),
    ("street[1]", "input[name='street[1]']"),
    ("street[2]", "input[name='street[2]']"),
    ("city", "input[name='city']"),
    ("postcode", "input[name='postcode']"),
    ("telephone", "input[name='telephone']"),
];

/// Record keys for the country and region option codes.
pub const COUNTRY_KEY: &str = "country_id";
pub const REGION_KEY: &str = "region_id";

/// Size swatches carry their label as rendered text.
pub fn size_swatch(label: &str) -> Locator {
    Locator::with_text(".swatch-option.text", label)
}

/// Colour swatches carry their label in the `option-label` attribute.
pub fn color_swatch(label: &str) -> Locator {
    Locator::with_attr(".swatch-option.color", "option-label", label)
}

/// The header auth link reads "Sign In" only for signed-out visitors.
pub fn sign_in_link() -> Locator {
    Locator::with_text(AUTH_LINK, "Sign In")
}

/// Storefront routes, relative to the configured base URL.
pub mod routes {
    pub const HOME: &str = "/";
    pub const LOGIN: &str = "/customer/account/login";
    pub const CART: &str = "/checkout/cart/";
    pub const CHECKOUT_SHIPPING: &str = "/checkout/#shipping";
    pub const ORDER_SUCCESS: &str = "/checkout/onepage/success/";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_fields_cover_the_full_address_block() {
        let keys: Vec<&str> = GUEST_FIELDS.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys.first(), Some(&"customer-email"));
        assert!(keys.contains(&"street[2]"));
        assert_eq!(keys.len(), 10);
    }

    #[test]
    fn swatch_builders_narrow_the_right_way() {
        let size = size_swatch("XL");
        assert_eq!(size.css, ".swatch-option.text");
        let color = color_swatch("Orange");
        assert!(color.to_string().contains("option-label"));
    }
}
