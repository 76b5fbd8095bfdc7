//! Guest details, shipping, payment, and order confirmation steps

use cartwheel_core::locator::Locator;
use cartwheel_core::outcome::{StepError, StepResult};
use cartwheel_core::record::OrderDetails;
use cartwheel_core::selectors::{self, routes};
use tracing::{info, warn};

use super::{FillReport, Shopper};

impl Shopper<'_> {
    /// Navigate to the shipping step and wait for the document to finish
    /// loading. Checkout is the slowest page on the storefront.
    pub async fn open_checkout_shipping(&self) -> StepResult<()> {
        self.page
            .navigate(&self.config.url(routes::CHECKOUT_SHIPPING))
            .await?;
        self.waiter()
            .page_ready(self.config.waits.page_load())
            .await
    }

    /// Fill the guest address form from the order details record. A key
    /// absent from the record skips its field with a warning and the fill
    /// carries on; everything already typed stays typed.
    pub async fn fill_guest_order_details(
        &self,
        details: &OrderDetails,
    ) -> StepResult<FillReport> {
        let waits = &self.config.waits;
        let w = self.waiter();
        let mut report = FillReport::default();

        for (key, css) in selectors::GUEST_FIELDS {
            let Some(value) = details.get(key) else {
                warn!(key, "order details key missing, field left untouched");
                report.skipped.push((*key).to_string());
                continue;
            };
            let field = w.clickable(&Locator::css(*css), waits.short()).await?;
            self.page.clear(field).await?;
            self.page.type_text(field, value).await?;
            report.filled.push((*key).to_string());
        }

        // Country is a select; the region select only exists once a
        // country with regions is chosen.
        match details.get(selectors::COUNTRY_KEY) {
            Some(country) => {
                let dropdown = w
                    .clickable(&Locator::css(selectors::COUNTRY_SELECT), waits.short())
                    .await?;
                self.page.select_value(dropdown, country).await?;
                report.filled.push(selectors::COUNTRY_KEY.to_string());

                match details.get(selectors::REGION_KEY) {
                    Some(region) => {
                        let dropdown = w
                            .clickable(&Locator::css(selectors::REGION_SELECT), waits.short())
                            .await?;
                        self.page.select_value(dropdown, region).await?;
                        report.filled.push(selectors::REGION_KEY.to_string());
                    }
                    None => {
                        warn!("order details carry no region, select left untouched");
                        report.skipped.push(selectors::REGION_KEY.to_string());
                    }
                }
            }
            None => {
                warn!("order details carry no country, selects left untouched");
                report.skipped.push(selectors::COUNTRY_KEY.to_string());
                report.skipped.push(selectors::REGION_KEY.to_string());
            }
        }

        info!(
            filled = report.filled.len(),
            skipped = report.skipped.len(),
            "guest order details filled"
        );
        Ok(report)
    }

    /// Pick the first offered shipping method and submit the shipping
    /// form. The loading overlay gates both interactions.
    pub async fn select_shipping_method(&self) -> StepResult<()> {
        let waits = &self.config.waits;
        let w = self.waiter();

        w.invisible(&Locator::css(selectors::LOADING_MASK), waits.long())
            .await?;
        let radio = w
            .clickable(&Locator::css(selectors::SHIPPING_RADIO), waits.long())
            .await?;
        self.page.click(radio).await?;

        let form = w
            .clickable(&Locator::css(selectors::SHIPPING_FORM), waits.long())
            .await?;
        self.page.submit_form(form).await?;
        info!("shipping method submitted");
        Ok(())
    }

    /// Submit the shipping form as it stands. Accounts with a saved
    /// address get a pre-selected method, so nothing needs picking.
    pub async fn submit_shipping_form(&self) -> StepResult<()> {
        let waits = &self.config.waits;
        let w = self.waiter();

        w.invisible(&Locator::css(selectors::LOADING_MASK), waits.long())
            .await?;
        let form = w
            .clickable(&Locator::css(selectors::SHIPPING_FORM), waits.long())
            .await?;
        self.page.submit_form(form).await?;
        info!("shipping form submitted");
        Ok(())
    }

    /// Submit the payment step once it renders.
    pub async fn submit_payment(&self) -> StepResult<()> {
        let waits = &self.config.waits;
        let w = self.waiter();

        let form = w
            .clickable(&Locator::css(selectors::PAYMENT_FORM), waits.long())
            .await?;
        self.page.submit_form(form).await?;
        info!("payment submitted");
        Ok(())
    }

    /// Press Place Order.
    pub async fn place_order(&self) -> StepResult<()> {
        let waits = &self.config.waits;
        let w = self.waiter();

        let button = w
            .clickable(&Locator::css(selectors::PLACE_ORDER), waits.long())
            .await?;
        self.page.click(button).await?;
        info!("place order pressed");
        Ok(())
    }

    /// Wait for the confirmation banner and verify the success route.
    pub async fn confirm_order_placed(&self) -> StepResult<()> {
        let waits = &self.config.waits;
        let w = self.waiter();

        w.present(&Locator::css(selectors::CONFIRMATION_BANNER), waits.long())
            .await?;
        let url = self.page.current_url().await?;
        if url.contains(routes::ORDER_SUCCESS) {
            info!(%url, "order confirmed");
            Ok(())
        } else {
            Err(StepError::mismatch(
                "post-order route",
                routes::ORDER_SUCCESS,
                url,
            ))
        }
    }
}
