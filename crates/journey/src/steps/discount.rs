//! Discount code steps on the payment step of checkout

use cartwheel_core::locator::Locator;
use cartwheel_core::outcome::{Probe, StepError, StepResult};
use cartwheel_core::selectors;
use tracing::{debug, info, warn};

use super::Shopper;

impl Shopper<'_> {
    /// Whether a removable coupon is already on the order. Reports
    /// [`Probe::Unknown`] when the discount panel never becomes visible,
    /// which callers must not treat as "no coupon".
    pub async fn removable_coupon(&self) -> StepResult<Probe> {
        let waits = &self.config.waits;
        let w = self.waiter();

        match w
            .visible(&Locator::css(selectors::DISCOUNT_CODE), waits.short())
            .await
        {
            Ok(_) => {}
            Err(StepError::Timeout { .. }) => return Ok(Probe::Unknown),
            Err(e) => return Err(e),
        }
        Ok(
            match self
                .page
                .find(&Locator::css(selectors::DISCOUNT_CANCEL))
                .await?
            {
                Some(_) => Probe::Present,
                None => Probe::Absent,
            },
        )
    }

    /// Expand the discount panel and apply the configured code. A coupon
    /// already on the order is cancelled first so the apply cannot
    /// collide with it.
    pub async fn apply_discount_code(&self) -> StepResult<()> {
        let waits = &self.config.waits;
        let w = self.waiter();

        w.invisible(&Locator::css(selectors::LOADING_MASK), waits.long())
            .await?;
        let heading = w
            .clickable(&Locator::css(selectors::DISCOUNT_HEADING), waits.long())
            .await?;
        self.page.click(heading).await?;

        match self.removable_coupon().await? {
            Probe::Present => {
                let cancel = w
                    .clickable(&Locator::css(selectors::DISCOUNT_CANCEL), waits.short())
                    .await?;
                self.page.click(cancel).await?;
                w.invisible(&Locator::css(selectors::LOADING_MASK), waits.long())
                    .await?;
                info!("existing coupon removed");
            }
            Probe::Absent => debug!("no coupon on the order"),
            Probe::Unknown => warn!("discount panel never settled, applying anyway"),
        }

        let code = w
            .clickable(&Locator::css(selectors::DISCOUNT_CODE), waits.long())
            .await?;
        self.page.clear(code).await?;
        self.page
            .type_text(code, &self.config.discount_code)
            .await?;

        let apply = w
            .clickable(&Locator::css(selectors::DISCOUNT_APPLY), waits.short())
            .await?;
        self.page.click(apply).await?;
        w.invisible(&Locator::css(selectors::LOADING_MASK), waits.long())
            .await?;
        info!(code = %self.config.discount_code, "discount code applied");
        Ok(())
    }
}
