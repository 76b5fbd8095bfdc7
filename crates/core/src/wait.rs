//! Condition-gated waits
//!
//! Every interaction in a journey is gated on an explicit readiness
//! condition with a bounded timeout. A wait is a single attempt: it polls
//! until the condition holds or the deadline passes, then reports
//! [`StepError::Timeout`]. No retries, no backoff. The deadline is checked
//! before the first probe, so a zero timeout fails immediately without
//! touching the page.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::trace;

use crate::locator::Locator;
use crate::outcome::{StepError, StepResult};
use crate::page::{ElementId, Page};

/// Poll cadence used when none is configured.
pub const DEFAULT_POLL: Duration = Duration::from_millis(100);

/// Bounded polling against one page.
pub struct Waiter<'a> {
    page: &'a dyn Page,
    poll: Duration,
}

impl<'a> Waiter<'a> {
    pub fn new(page: &'a dyn Page) -> Self {
        Self {
            page,
            poll: DEFAULT_POLL,
        }
    }

    pub fn with_poll(page: &'a dyn Page, poll: Duration) -> Self {
        Self { page, poll }
    }

    /// Wait until the locator matches something.
    pub async fn present(&self, locator: &Locator, timeout: Duration) -> StepResult<ElementId> {
        trace!(%locator, ?timeout, "wait: present");
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(StepError::timeout(locator.to_string(), timeout));
            }
            if let Some(id) = self.page.find(locator).await? {
                return Ok(id);
            }
            sleep(self.poll).await;
        }
    }

    /// Wait until the locator matches something attached and visible.
    pub async fn visible(&self, locator: &Locator, timeout: Duration) -> StepResult<ElementId> {
        trace!(%locator, ?timeout, "wait: visible");
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(StepError::timeout(format!("{locator} visible"), timeout));
            }
            if let Some(id) = self.page.find(locator).await? {
                let state = self.page.element_state(id).await?;
                if state.attached && state.visible {
                    return Ok(id);
                }
            }
            sleep(self.poll).await;
        }
    }

    /// Wait until the locator matches something visible and enabled.
    pub async fn clickable(&self, locator: &Locator, timeout: Duration) -> StepResult<ElementId> {
        trace!(%locator, ?timeout, "wait: clickable");
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(StepError::timeout(format!("{locator} clickable"), timeout));
            }
            if let Some(id) = self.page.find(locator).await? {
                if self.page.element_state(id).await?.clickable() {
                    return Ok(id);
                }
            }
            sleep(self.poll).await;
        }
    }

    /// Wait until the locator matches nothing visible. An absent element
    /// counts as invisible.
    pub async fn invisible(&self, locator: &Locator, timeout: Duration) -> StepResult<()> {
        trace!(%locator, ?timeout, "wait: invisible");
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(StepError::timeout(format!("{locator} invisible"), timeout));
            }
            match self.page.find(locator).await? {
                None => return Ok(()),
                Some(id) => {
                    let state = self.page.element_state(id).await?;
                    if !state.attached || !state.visible {
                        return Ok(());
                    }
                }
            }
            sleep(self.poll).await;
        }
    }

    /// Wait until a previously found element is visible and enabled.
    pub async fn element_clickable(&self, id: ElementId, timeout: Duration) -> StepResult<()> {
        trace!(%id, ?timeout, "wait: element clickable");
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(StepError::timeout(format!("{id} clickable"), timeout));
            }
            if self.page.element_state(id).await?.clickable() {
                return Ok(());
            }
            sleep(self.poll).await;
        }
    }

    /// Wait until a previously found element leaves the document.
    pub async fn stale(&self, id: ElementId, timeout: Duration) -> StepResult<()> {
        trace!(%id, ?timeout, "wait: stale");
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(StepError::timeout(format!("{id} stale"), timeout));
            }
            if !self.page.element_state(id).await?.attached {
                return Ok(());
            }
            sleep(self.poll).await;
        }
    }

    /// Wait until the document has finished loading.
    pub async fn page_ready(&self, timeout: Duration) -> StepResult<()> {
        trace!(?timeout, "wait: page ready");
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(StepError::timeout("document readyState complete", timeout));
            }
            if self.page.is_ready().await? {
                return Ok(());
            }
            sleep(self.poll).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{ElementState, PageResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted page: the element appears after a fixed number of find
    /// calls and becomes visible/enabled a few queries later.
    struct ScriptedPage {
        state: Mutex<Script>,
    }

    #[derive(Default)]
    struct Script {
        finds: u32,
        appear_after: u32,
        interactable_after: u32,
        state_queries: u32,
        detach_after: Option<u32>,
        ready_after: u32,
        ready_queries: u32,
    }

    impl ScriptedPage {
        fn appearing_after(n: u32) -> Self {
            Self {
                state: Mutex::new(Script {
                    appear_after: n,
                    ..Script::default()
                }),
            }
        }

        fn finds(&self) -> u32 {
            self.state.lock().unwrap().finds
        }
    }

    #[async_trait]
    impl Page for ScriptedPage {
        async fn navigate(&self, _url: &str) -> PageResult<()> {
            Ok(())
        }

        async fn current_url(&self) -> PageResult<String> {
            Ok(String::new())
        }

        async fn is_ready(&self) -> PageResult<bool> {
            let mut s = self.state.lock().unwrap();
            s.ready_queries += 1;
            Ok(s.ready_queries > s.ready_after)
        }

        async fn find(&self, _locator: &Locator) -> PageResult<Option<ElementId>> {
            let mut s = self.state.lock().unwrap();
            s.finds += 1;
            if s.finds > s.appear_after {
                Ok(Some(ElementId(1)))
            } else {
                Ok(None)
            }
        }

        async fn find_all(&self, locator: &Locator) -> PageResult<Vec<ElementId>> {
            Ok(self.find(locator).await?.into_iter().collect())
        }

        async fn find_in(
            &self,
            _scope: ElementId,
            locator: &Locator,
        ) -> PageResult<Option<ElementId>> {
            self.find(locator).await
        }

        async fn element_state(&self, _id: ElementId) -> PageResult<ElementState> {
            let mut s = self.state.lock().unwrap();
            s.state_queries += 1;
            if let Some(detach_after) = s.detach_after {
                if s.state_queries > detach_after {
                    return Ok(ElementState::detached());
                }
            }
            let interactable = s.state_queries > s.interactable_after;
            Ok(ElementState {
                attached: true,
                visible: interactable,
                enabled: interactable,
            })
        }

        async fn click(&self, _id: ElementId) -> PageResult<()> {
            Ok(())
        }

        async fn clear(&self, _id: ElementId) -> PageResult<()> {
            Ok(())
        }

        async fn type_text(&self, _id: ElementId, _text: &str) -> PageResult<()> {
            Ok(())
        }

        async fn press_enter(&self, _id: ElementId) -> PageResult<()> {
            Ok(())
        }

        async fn select_value(&self, _id: ElementId, _value: &str) -> PageResult<()> {
            Ok(())
        }

        async fn submit_form(&self, _id: ElementId) -> PageResult<()> {
            Ok(())
        }

        async fn text(&self, _id: ElementId) -> PageResult<String> {
            Ok(String::new())
        }

        async fn screenshot(&self) -> PageResult<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn close(&mut self) -> PageResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_fails_without_probing() {
        let page = ScriptedPage::appearing_after(0);
        let waiter = Waiter::new(&page);
        let err = waiter
            .present(&Locator::css("#search"), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::Timeout { .. }));
        assert_eq!(page.finds(), 0, "the page must not be probed");
    }

    #[tokio::test(start_paused = true)]
    async fn present_resolves_once_the_element_appears() {
        let page = ScriptedPage::appearing_after(3);
        let waiter = Waiter::new(&page);
        let id = waiter
            .present(&Locator::css("#search"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(id, ElementId(1));
        assert_eq!(page.finds(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn present_times_out_and_names_the_target() {
        let page = ScriptedPage::appearing_after(u32::MAX);
        let waiter = Waiter::new(&page);
        let err = waiter
            .present(&Locator::css("a.action.showcart"), Duration::from_millis(350))
            .await
            .unwrap_err();
        match err {
            StepError::Timeout { target, waited } => {
                assert_eq!(target, "a.action.showcart");
                assert_eq!(waited, Duration::from_millis(350));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn clickable_waits_for_enabled_state() {
        let page = ScriptedPage {
            state: Mutex::new(Script {
                appear_after: 0,
                interactable_after: 2,
                ..Script::default()
            }),
        };
        let waiter = Waiter::new(&page);
        waiter
            .clickable(&Locator::css("#send2"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(page.state.lock().unwrap().state_queries > 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invisible_succeeds_immediately_when_absent() {
        let page = ScriptedPage::appearing_after(u32::MAX);
        let waiter = Waiter::new(&page);
        waiter
            .invisible(&Locator::css("div.loading-mask"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(page.finds(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_resolves_when_the_element_detaches() {
        let page = ScriptedPage {
            state: Mutex::new(Script {
                appear_after: 0,
                detach_after: Some(3),
                ..Script::default()
            }),
        };
        let waiter = Waiter::new(&page);
        waiter
            .stale(ElementId(1), Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn page_ready_polls_until_complete() {
        let page = ScriptedPage {
            state: Mutex::new(Script {
                ready_after: 4,
                ..Script::default()
            }),
        };
        let waiter = Waiter::new(&page);
        waiter.page_ready(Duration::from_secs(5)).await.unwrap();
        assert_eq!(page.state.lock().unwrap().ready_queries, 5);
    }
}
