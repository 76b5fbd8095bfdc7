//! Chrome backend
//!
//! Drives a real Chromium over the DevTools protocol:
//!
//! ```text
//! ChromeBackend::open()
//!   ├── ChromeSession::launch()   spawn chrome, poll /json/version
//!   ├── CdpClient::connect()      websocket to the first page target
//!   └── CdpPage                   Page impl over Runtime/Input/Page domains
//! ```
//!
//! Each scenario gets its own browser process with a throwaway profile,
//! so nothing leaks between runs.

pub mod cdp;
pub mod chrome;
pub mod page;

pub use cdp::CdpClient;
pub use chrome::ChromeSession;
pub use page::CdpPage;

use async_trait::async_trait;

use cartwheel_core::config::{BrowserOptions, SuiteConfig};
use cartwheel_core::error::Result;
use cartwheel_core::page::{Page, SessionProvider};

/// Hands the runner a freshly launched Chrome per scenario.
pub struct ChromeBackend {
    options: BrowserOptions,
    base_url: String,
}

impl ChromeBackend {
    pub fn new(config: &SuiteConfig) -> Self {
        Self {
            options: config.browser.clone(),
            base_url: config.base_url.clone(),
        }
    }
}

#[async_trait]
impl SessionProvider for ChromeBackend {
    async fn open(&self) -> Result<Box<dyn Page>> {
        let session = ChromeSession::launch(&self.options).await?;
        let client = CdpClient::new();
        client.connect(session.ws_url()).await?;
        client.execute_void("Page.enable", None::<()>).await?;
        client.execute_void("Runtime.enable", None::<()>).await?;
        Ok(Box::new(CdpPage::new(
            client,
            session,
            self.base_url.clone(),
        )))
    }

    fn backend_name(&self) -> &'static str {
        "chrome"
    }
}
