//! The page-driving seam
//!
//! Journey steps talk to whichever backend renders the storefront through
//! [`Page`]. The simulated shop and the Chrome DevTools adapter both
//! implement it; steps never know which one they are driving.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::locator::Locator;

/// Driver-level failures from the rendering backend.
#[derive(Error, Debug, Clone)]
pub enum PageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    #[error("no option with value {value:?} in select")]
    OptionNotFound { value: String },

    #[error("element handle {0} is no longer attached")]
    StaleElement(ElementId),

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

pub type PageResult<T> = std::result::Result<T, PageError>;

/// Opaque handle to an element found on the live page.
///
/// Handles are valid for the current document only; a navigation or removal
/// leaves them dangling, which [`Page::element_state`] reports as detached.
/// Nothing caches handles across steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el#{}", self.0)
    }
}

/// Snapshot of an element's interactability at query time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementState {
    pub attached: bool,
    pub visible: bool,
    pub enabled: bool,
}

impl ElementState {
    pub fn clickable(&self) -> bool {
        self.attached && self.visible && self.enabled
    }

    /// State of a handle whose element left the document.
    pub fn detached() -> Self {
        Self::default()
    }
}

/// One open storefront page.
///
/// All methods take `&self`; implementations guard their own state. Queries
/// always resolve against the live document, never against cached structure.
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigate to an absolute URL or a path relative to the session base.
    async fn navigate(&self, url: &str) -> PageResult<()>;

    async fn current_url(&self) -> PageResult<String>;

    /// Whether `document.readyState` has reached `complete`.
    async fn is_ready(&self) -> PageResult<bool>;

    /// First match for the locator, if any.
    async fn find(&self, locator: &Locator) -> PageResult<Option<ElementId>>;

    /// All matches for the locator, in document order.
    async fn find_all(&self, locator: &Locator) -> PageResult<Vec<ElementId>>;

    /// First match for the locator underneath a previously found element.
    async fn find_in(&self, scope: ElementId, locator: &Locator) -> PageResult<Option<ElementId>>;

    async fn element_state(&self, id: ElementId) -> PageResult<ElementState>;

    async fn click(&self, id: ElementId) -> PageResult<()>;

    /// Empty a text input.
    async fn clear(&self, id: ElementId) -> PageResult<()>;

    /// Type into a focused input, appending to its current value.
    async fn type_text(&self, id: ElementId, text: &str) -> PageResult<()>;

    /// Press Enter with the element focused (submits its form).
    async fn press_enter(&self, id: ElementId) -> PageResult<()>;

    /// Choose a `<select>` option by its value attribute.
    async fn select_value(&self, id: ElementId, value: &str) -> PageResult<()>;

    /// Submit the form the element belongs to (or is).
    async fn submit_form(&self, id: ElementId) -> PageResult<()>;

    /// Rendered text content, trimmed.
    async fn text(&self, id: ElementId) -> PageResult<String>;

    /// PNG snapshot of the viewport, where the backend supports it.
    async fn screenshot(&self) -> PageResult<Option<Vec<u8>>>;

    /// Tear the session down. Idempotent.
    async fn close(&mut self) -> PageResult<()>;
}

/// Opens fresh sessions for the runner, one per scenario.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Open a new session on a blank page. A failure here is fatal to the
    /// whole run; the runner does not retry.
    async fn open(&self) -> crate::error::Result<Box<dyn Page>>;

    /// Short backend name for logs and results.
    fn backend_name(&self) -> &'static str;
}
