//! Cartwheel Core Library
//!
//! Shared vocabulary for the cartwheel storefront test harness: the page
//! seam, condition-gated waits, step outcomes, locators, the storefront
//! affordance map, order-detail records, and suite configuration.

pub mod config;
pub mod error;
pub mod locator;
pub mod outcome;
pub mod page;
pub mod record;
pub mod selectors;
pub mod wait;

// Re-export commonly used types
pub use config::{BrowserOptions, Credentials, SuiteConfig, WaitBounds};
pub use error::{Error, Result};
pub use locator::{Locator, Narrowing};
pub use outcome::{Probe, StepError, StepResult};
pub use page::{ElementId, ElementState, Page, PageError, PageResult, SessionProvider};
pub use record::OrderDetails;
pub use wait::Waiter;

/// Cartwheel version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
