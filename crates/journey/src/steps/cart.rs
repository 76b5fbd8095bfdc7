//! Cart flyout, cart page, and row deletion steps

use cartwheel_core::locator::Locator;
use cartwheel_core::outcome::{StepError, StepResult};
use cartwheel_core::selectors::{self, routes};
use tracing::{debug, info, warn};

use super::Shopper;

impl Shopper<'_> {
    /// Open the cart flyout and follow its View and Edit Cart link.
    pub async fn go_to_view_and_edit_cart(&self) -> StepResult<()> {
        let waits = &self.config.waits;
        let w = self.waiter();

        let toggle = w
            .clickable(&Locator::css(selectors::CART_TOGGLE), waits.short())
            .await?;
        self.page.click(toggle).await?;

        let view = w
            .clickable(&Locator::css(selectors::VIEW_CART_LINK), waits.short())
            .await?;
        self.page.click(view).await?;
        info!("opened the cart page");
        Ok(())
    }

    /// Head to checkout through the cart flyout. The cart counter must be
    /// showing and the loading overlay gone before the flyout is touched.
    pub async fn go_to_checkout(&self) -> StepResult<()> {
        let waits = &self.config.waits;
        let w = self.waiter();

        w.invisible(&Locator::css(selectors::LOADING_MASK), waits.long())
            .await?;
        w.visible(&Locator::css(selectors::CART_COUNTER), waits.long())
            .await?;

        let toggle = w
            .clickable(&Locator::css(selectors::CART_TOGGLE), waits.long())
            .await?;
        self.page.click(toggle).await?;

        let go = w
            .clickable(&Locator::css(selectors::FLYOUT_CHECKOUT), waits.long())
            .await?;
        self.page.click(go).await?;
        info!("continued to checkout");
        Ok(())
    }

    /// Clear the cart row by row from the cart page. Each pass removes the
    /// first delete control and waits for it to leave the document. The
    /// number of passes is capped; a cart that still has rows at the cap
    /// reports [`StepError::ExhaustedRetries`]. An already-empty cart is
    /// a no-op returning zero.
    pub async fn delete_all_cart_items(&self) -> StepResult<u32> {
        self.page.navigate(&self.config.url(routes::CART)).await?;
        let waits = &self.config.waits;
        let w = self.waiter();
        w.page_ready(waits.page_load()).await?;
        let cap = self.config.max_delete_passes;
        let mut removed = 0u32;

        for pass in 1..=cap {
            let buttons = self
                .page
                .find_all(&Locator::css(selectors::DELETE_ACTION))
                .await?;
            let Some(first) = buttons.first().copied() else {
                info!(removed, "cart is clear");
                return Ok(removed);
            };
            debug!(pass, rows = buttons.len(), "removing first cart row");

            w.element_clickable(first, waits.short()).await?;
            self.page.click(first).await?;
            match w.stale(first, waits.long()).await {
                Ok(()) => removed += 1,
                Err(StepError::Timeout { .. }) => {
                    warn!(pass, "cart row did not leave the document");
                }
                Err(e) => return Err(e),
            }
        }

        let leftover = self
            .page
            .find_all(&Locator::css(selectors::DELETE_ACTION))
            .await?;
        if leftover.is_empty() {
            info!(removed, "cart is clear");
            Ok(removed)
        } else {
            Err(StepError::ExhaustedRetries {
                operation: "clearing the cart".to_string(),
                attempts: cap,
            })
        }
    }

    /// Remove the cart row holding the named item. The name must match the
    /// row's product link text exactly.
    pub async fn delete_item_by_name(&self, name: &str) -> StepResult<()> {
        self.page.navigate(&self.config.url(routes::CART)).await?;
        let waits = &self.config.waits;
        let w = self.waiter();

        if let Err(e) = w
            .present(&Locator::css(selectors::CART_ROW), waits.short())
            .await
        {
            return match e {
                StepError::Timeout { .. } => {
                    Err(StepError::not_found(format!("cart row for {name:?}")))
                }
                other => Err(other),
            };
        }

        let rows = self
            .page
            .find_all(&Locator::css(selectors::CART_ROW))
            .await?;
        for row in rows {
            let Some(label) = self
                .page
                .find_in(row, &Locator::css(selectors::CART_ROW_NAME))
                .await?
            else {
                continue;
            };
            if self.page.text(label).await? != name {
                continue;
            }
            let Some(delete) = self
                .page
                .find_in(row, &Locator::css(selectors::DELETE_ACTION))
                .await?
            else {
                continue;
            };
            w.element_clickable(delete, waits.short()).await?;
            self.page.click(delete).await?;
            w.stale(delete, waits.long()).await?;
            info!(item = name, "removed cart row");
            return Ok(());
        }
        Err(StepError::not_found(format!("cart row for {name:?}")))
    }
}
