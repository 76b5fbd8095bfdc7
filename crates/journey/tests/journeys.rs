//! End-to-end journeys against the seeded in-process storefront.
//!
//! Paused tokio time makes every bounded wait resolve instantly; the
//! storefront settles on query ticks, not wall-clock time.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use cartwheel_core::config::SuiteConfig;
use cartwheel_core::locator::Locator;
use cartwheel_core::outcome::{Probe, StepError};
use cartwheel_core::page::Page;
use cartwheel_core::record::OrderDetails;
use cartwheel_core::selectors;
use cartwheel_core::wait::Waiter;
use cartwheel_journey::{CartIntent, Runner, RunnerConfig, Scenario, Shopper, SuiteResult};
use cartwheel_sim::{SimSeed, SimSession, SimStorefront};

const FULL_DETAILS: &str = "\
customer-email,test123@yahoo.com
firstname,Test
lastname,Testing
company,Umbrella
street[0],123 Main St
street[1],Block 4
street[2],Apt 16
city,Bucharest
postcode,010101
telephone,0722000000
country_id,RO
region_id,279
";

fn write_details(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("order_details.csv");
    std::fs::write(&path, content).unwrap();
    path
}

fn suite_config(details: &Path) -> SuiteConfig {
    let mut config = SuiteConfig::default();
    config.base_url = SimSeed::default().base_url;
    config.details_path = details.to_path_buf();
    config
}

fn duffle() -> CartIntent {
    CartIntent::simple("Overnight Duffle", 3)
}

#[tokio::test(start_paused = true)]
async fn whole_suite_passes_and_writes_results() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let config = suite_config(&details);
    let provider = SimSession::default();

    let runner = Runner::with_config(
        &provider,
        &config,
        RunnerConfig {
            output_dir: dir.path().join("out"),
            stop_on_failure: false,
        },
    );
    let suite = runner.run_all().await.unwrap();

    assert_eq!(suite.total, 5);
    assert_eq!(suite.passed, 5);
    assert!(suite.all_passed());
    assert_eq!(suite.backend, "sim");

    let path = runner.write_results(&suite).unwrap();
    let raw = std::fs::read_to_string(path).unwrap();
    let back: SuiteResult = serde_json::from_str(&raw).unwrap();
    assert_eq!(back.results.len(), 5);
    assert_eq!(back.results[0].name, "storefront-smoke");
    assert!(back.results.iter().all(|r| r.error.is_none()));
}

#[tokio::test(start_paused = true)]
async fn guest_purchase_reaches_the_confirmation_page() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let config = suite_config(&details);
    let page = SimStorefront::seeded();

    let shopper = Shopper::new(&page, &config);
    Scenario::GuestPurchase.run(&shopper).await.unwrap();

    assert_eq!(page.orders_placed(), 1);
    assert!(page.cart_lines().is_empty(), "order clears the cart");
    let url = page.current_url().await.unwrap();
    assert!(url.contains("/checkout/onepage/success/"), "url: {url}");
    assert_eq!(page.form_value("country_id").as_deref(), Some("RO"));
    assert_eq!(page.form_value("region_id").as_deref(), Some("279"));
}

#[tokio::test(start_paused = true)]
async fn option_free_item_never_touches_a_swatch() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let config = suite_config(&details);
    let page = SimStorefront::seeded();

    let shopper = Shopper::new(&page, &config);
    shopper.open_home().await.unwrap();
    shopper.add_item_to_cart(&duffle()).await.unwrap();

    assert_eq!(page.clicks_on(".swatch-option"), 0);
    let lines = page.cart_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].name, "Overnight Duffle");
    assert_eq!(lines[0].qty, 3);
    assert_eq!(lines[0].size, None);
    assert_eq!(lines[0].color, None);
}

#[tokio::test(start_paused = true)]
async fn missing_record_key_skips_the_field_and_continues() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let config = suite_config(&details);
    let page = SimStorefront::seeded();

    let shopper = Shopper::new(&page, &config);
    shopper.open_checkout_shipping().await.unwrap();

    let record = OrderDetails::from_pairs([
        ("customer-email", "test123@yahoo.com"),
        ("firstname", "Test"),
        ("lastname", "Testing"),
        ("company", "Umbrella"),
        ("street[0]", "123 Main St"),
        ("street[1]", "Block 4"),
        ("street[2]", "Apt 16"),
        ("city", "Bucharest"),
        ("postcode", "010101"),
        ("country_id", "RO"),
        ("region_id", "279"),
    ]);
    let report = shopper.fill_guest_order_details(&record).await.unwrap();

    assert_eq!(report.skipped, vec!["telephone".to_string()]);
    assert!(report.filled.contains(&"city".to_string()));
    assert!(report.filled.contains(&"region_id".to_string()));
    assert_eq!(page.form_value("telephone"), None);
    assert_eq!(page.form_value("city").as_deref(), Some("Bucharest"));
}

#[tokio::test(start_paused = true)]
async fn deleting_from_an_empty_cart_clicks_nothing() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let config = suite_config(&details);
    let page = SimStorefront::seeded();

    let shopper = Shopper::new(&page, &config);
    let removed = shopper.delete_all_cart_items().await.unwrap();

    assert_eq!(removed, 0);
    assert!(
        !page.journal().iter().any(|i| i.is_click()),
        "an empty cart must not be clicked at"
    );
}

#[tokio::test(start_paused = true)]
async fn stuck_removal_exhausts_the_pass_cap() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let mut config = suite_config(&details);
    config.max_delete_passes = 3;

    let mut seed = SimSeed::default();
    seed.stuck_delete = true;
    let page = SimStorefront::new(seed);

    let shopper = Shopper::new(&page, &config);
    shopper.open_home().await.unwrap();
    shopper.add_item_to_cart(&duffle()).await.unwrap();

    let err = shopper.delete_all_cart_items().await.unwrap_err();
    match err {
        StepError::ExhaustedRetries { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(page.clicks_on(".action-delete"), 3, "one click per pass");
    assert_eq!(page.cart_lines().len(), 1, "the row never left");
}

#[tokio::test(start_paused = true)]
async fn login_round_trip_verifies_the_exact_greeting() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let config = suite_config(&details);
    let page = SimStorefront::seeded();

    let shopper = Shopper::new(&page, &config);
    Scenario::LoginRoundTrip.run(&shopper).await.unwrap();

    assert!(!page.logged_in(), "round trip ends signed out");
}

#[tokio::test(start_paused = true)]
async fn misrendered_greeting_fails_with_mismatch() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let config = suite_config(&details);

    let mut seed = SimSeed::default();
    seed.wrong_greeting = Some("Test Resting".to_string());
    let page = SimStorefront::new(seed);

    let shopper = Shopper::new(&page, &config);
    let err = Scenario::LoginRoundTrip.run(&shopper).await.unwrap_err();
    match err {
        StepError::Mismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, "Welcome, Test Testing!");
            assert_eq!(actual, "Welcome, Test Resting!");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn rejected_login_times_out_waiting_for_the_greeting() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let mut config = suite_config(&details);
    config.account.password = "NotThePassword1!".to_string();
    let page = SimStorefront::seeded();

    let shopper = Shopper::new(&page, &config);
    let err = Scenario::LoginRoundTrip.run(&shopper).await.unwrap_err();
    match err {
        StepError::Timeout { target, .. } => {
            assert!(target.contains(".logged-in"), "target: {target}")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!page.logged_in());
}

#[tokio::test(start_paused = true)]
async fn coupon_probe_tracks_panel_and_coupon_state() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let config = suite_config(&details);
    let page = SimStorefront::seeded();

    let shopper = Shopper::new(&page, &config);
    shopper.open_checkout_shipping().await.unwrap();

    assert_eq!(shopper.removable_coupon().await.unwrap(), Probe::Unknown);

    // Expand the panel by hand: no coupon on the order yet.
    let w = Waiter::new(&page);
    let heading = w
        .clickable(
            &Locator::css(selectors::DISCOUNT_HEADING),
            config.waits.long(),
        )
        .await
        .unwrap();
    page.click(heading).await.unwrap();
    assert_eq!(shopper.removable_coupon().await.unwrap(), Probe::Absent);

    // Collapse it again so the apply step drives the panel itself.
    page.click(heading).await.unwrap();

    shopper.apply_discount_code().await.unwrap();
    assert_eq!(page.applied_coupon().as_deref(), Some("20poff"));
    assert_eq!(shopper.removable_coupon().await.unwrap(), Probe::Present);
}

#[tokio::test(start_paused = true)]
async fn signed_in_purchase_submits_shipping_and_applies_the_code() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let config = suite_config(&details);
    let page = SimStorefront::seeded();

    let shopper = Shopper::new(&page, &config);
    Scenario::SignedInPurchase.run(&shopper).await.unwrap();

    assert!(page.logged_in());
    assert!(page.shipping_submitted());
    assert_eq!(page.applied_coupon().as_deref(), Some("20poff"));
    assert_eq!(page.cart_lines().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn cart_cleanup_empties_the_cart_and_signs_out() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let config = suite_config(&details);
    let page = SimStorefront::seeded();

    let shopper = Shopper::new(&page, &config);
    Scenario::CartCleanup.run(&shopper).await.unwrap();

    assert!(page.cart_lines().is_empty());
    assert!(!page.logged_in());
    assert_eq!(page.orders_placed(), 0);
}

#[tokio::test(start_paused = true)]
async fn failing_scenario_is_recorded_and_the_run_continues() {
    let dir = TempDir::new().unwrap();
    let details = write_details(&dir, FULL_DETAILS);
    let config = suite_config(&details);

    let mut seed = SimSeed::default();
    seed.wrong_greeting = Some("Best Testing".to_string());
    let provider = SimSession::new(seed);

    let runner = Runner::with_config(
        &provider,
        &config,
        RunnerConfig {
            output_dir: dir.path().join("out"),
            stop_on_failure: false,
        },
    );
    let suite = runner.run_all().await.unwrap();

    assert_eq!(suite.total, 5);
    assert_eq!(suite.failed, 1);
    assert!(!suite.all_passed());
    let failed = suite
        .results
        .iter()
        .find(|r| r.name == "login-round-trip")
        .unwrap();
    assert!(!failed.success);
    assert!(failed.error.as_deref().unwrap().contains("header greeting"));
    let cleanup = suite.results.iter().find(|r| r.name == "cart-cleanup");
    assert!(cleanup.is_some(), "run continues past the failure");
}
