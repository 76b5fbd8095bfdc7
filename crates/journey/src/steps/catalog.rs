//! Search and add-to-cart steps

use cartwheel_core::locator::Locator;
use cartwheel_core::outcome::{StepError, StepResult};
use cartwheel_core::selectors;
use tracing::{info, warn};

use super::{CartIntent, Shopper};

impl Shopper<'_> {
    /// Search the storefront for an item by name and open the first
    /// result. A search that returns nothing is a [`StepError::NotFound`]:
    /// the catalog does not offer the item, so the journey cannot continue.
    pub async fn search_item(&self, name: &str) -> StepResult<()> {
        let waits = &self.config.waits;
        let w = self.waiter();

        let search = w
            .clickable(&Locator::css(selectors::SEARCH_BOX), waits.short())
            .await?;
        self.page.clear(search).await?;
        self.page.type_text(search, name).await?;
        self.page.press_enter(search).await?;
        info!(item = name, "search submitted");

        match w
            .present(&Locator::css(selectors::RESULT_CARD), waits.short())
            .await
        {
            Ok(first) => {
                self.page.click(first).await?;
                info!(item = name, "opened first search result");
                Ok(())
            }
            Err(StepError::Timeout { .. }) => {
                warn!(item = name, "search returned no results");
                Err(StepError::not_found(format!("search result for {name:?}")))
            }
            Err(e) => Err(e),
        }
    }

    /// Put an item in the cart from its product page: pick swatches when
    /// the intent asks for them, set the quantity, add, and wait for the
    /// loading overlay to clear.
    pub async fn add_item_to_cart(&self, intent: &CartIntent) -> StepResult<()> {
        self.search_item(&intent.name).await?;

        let waits = &self.config.waits;
        let w = self.waiter();

        if let Some(size) = &intent.size {
            let swatch = w
                .clickable(&selectors::size_swatch(size), waits.short())
                .await?;
            self.page.click(swatch).await?;
        }
        if let Some(color) = &intent.color {
            let swatch = w
                .clickable(&selectors::color_swatch(color), waits.short())
                .await?;
            self.page.click(swatch).await?;
        }

        let qty = w
            .clickable(&Locator::css(selectors::QTY_INPUT), waits.short())
            .await?;
        self.page.clear(qty).await?;
        self.page.type_text(qty, &intent.quantity.to_string()).await?;

        let add = w
            .clickable(&Locator::css(selectors::ADD_TO_CART), waits.short())
            .await?;
        self.page.click(add).await?;
        w.invisible(&Locator::css(selectors::LOADING_MASK), waits.long())
            .await?;
        info!(item = %intent.name, qty = intent.quantity, "added to cart");
        Ok(())
    }
}
