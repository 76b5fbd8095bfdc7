//! Suite configuration
//!
//! Everything a run needs injected: the storefront base URL, the test
//! account, the coupon code, wait bounds, and browser launch options. The
//! defaults point at the public demo shop the journeys were written for.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Suite configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Storefront under test
    pub base_url: String,

    /// Path to the order details fixture
    pub details_path: PathBuf,

    /// Account used by the signed-in journeys
    pub account: Credentials,

    /// Coupon code the storefront accepts
    pub discount_code: String,

    /// Wait bounds
    pub waits: WaitBounds,

    /// Cap on passes when clearing the cart row by row
    pub max_delete_passes: u32,

    /// Real-browser backend options
    pub browser: BrowserOptions,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://magento.softwaretestingboard.com".to_string(),
            details_path: PathBuf::from("fixtures/order_details.csv"),
            account: Credentials::default(),
            discount_code: "20poff".to_string(),
            waits: WaitBounds::default(),
            max_delete_passes: 25,
            browser: BrowserOptions::default(),
        }
    }
}

/// Storefront account the signed-in journeys use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,

    /// Name the storefront greets the account with
    pub display_name: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email: "test123@yahoo.com".to_string(),
            password: "Test123!".to_string(),
            display_name: "Test Testing".to_string(),
        }
    }
}

impl Credentials {
    /// The exact header greeting shown after login.
    pub fn expected_greeting(&self) -> String {
        format!("Welcome, {}!", self.display_name)
    }
}

/// Wait bounds, mirroring the storefront's observed latencies
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WaitBounds {
    /// Seconds for routine element waits
    pub short_secs: u64,

    /// Seconds for slow transitions: login, overlays, checkout loads
    pub long_secs: u64,

    /// Seconds for full document readiness
    pub page_load_secs: u64,

    /// Poll cadence in milliseconds
    pub poll_ms: u64,
}

impl Default for WaitBounds {
    fn default() -> Self {
        Self {
            short_secs: 10,
            long_secs: 20,
            page_load_secs: 100,
            poll_ms: 100,
        }
    }
}

impl WaitBounds {
    pub fn short(&self) -> Duration {
        Duration::from_secs(self.short_secs)
    }

    pub fn long(&self) -> Duration {
        Duration::from_secs(self.long_secs)
    }

    pub fn page_load(&self) -> Duration {
        Duration::from_secs(self.page_load_secs)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

/// Chrome launch options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserOptions {
    /// Chrome binary path; auto-detected when unset
    pub binary: Option<PathBuf>,

    /// Run headless
    pub headless: bool,

    /// Extra flags appended to the launch command
    pub extra_args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            binary: None,
            headless: true,
            extra_args: Vec::new(),
        }
    }
}

impl SuiteConfig {
    /// Load configuration from file, falling back to defaults when absent.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Absolute URL for a storefront route.
    pub fn url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}
