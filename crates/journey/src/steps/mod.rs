//! Journey steps
//!
//! Each step is a short sequence of condition-gated waits and single
//! interactions against one open page. Steps never retry themselves and
//! never sleep for fixed durations; every pause is a bounded wait on an
//! explicit readiness condition.

mod auth;
mod cart;
mod catalog;
mod checkout;
mod discount;

use cartwheel_core::config::SuiteConfig;
use cartwheel_core::locator::Locator;
use cartwheel_core::outcome::{StepError, StepResult};
use cartwheel_core::page::Page;
use cartwheel_core::selectors::routes;
use cartwheel_core::wait::Waiter;
use tracing::debug;

/// One shopper driving one page through a journey.
pub struct Shopper<'a> {
    pub(crate) page: &'a dyn Page,
    pub(crate) config: &'a SuiteConfig,
}

impl<'a> Shopper<'a> {
    pub fn new(page: &'a dyn Page, config: &'a SuiteConfig) -> Self {
        Self { page, config }
    }

    pub fn config(&self) -> &SuiteConfig {
        self.config
    }

    pub(crate) fn waiter(&self) -> Waiter<'a> {
        Waiter::with_poll(self.page, self.config.waits.poll())
    }

    /// Open the storefront landing page.
    pub async fn open_home(&self) -> StepResult<()> {
        self.page.navigate(&self.config.url(routes::HOME)).await?;
        Ok(())
    }

    /// Presence check for one storefront control, reported by name.
    pub async fn check_present(&self, what: &str, css: &str) -> StepResult<()> {
        match self
            .waiter()
            .present(&Locator::css(css), self.config.waits.short())
            .await
        {
            Ok(_) => {
                debug!(what, css, "control present");
                Ok(())
            }
            Err(StepError::Timeout { .. }) => Err(StepError::not_found(format!("{what} ({css})"))),
            Err(e) => Err(e),
        }
    }
}

/// What to put in the cart and how: swatch options are chosen only when
/// the intent carries them, so option-free items never touch swatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartIntent {
    pub name: String,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartIntent {
    /// An item without configurable options.
    pub fn simple(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
            size: None,
            color: None,
        }
    }

    /// An item that needs a size and a color picked.
    pub fn with_options(
        name: impl Into<String>,
        quantity: u32,
        size: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity,
            size: Some(size.into()),
            color: Some(color.into()),
        }
    }
}

/// Which record keys the guest checkout fill consumed and which it
/// skipped because the record had no value for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub filled: Vec<String>,
    pub skipped: Vec<String>,
}
