//! Login, greeting, and logout steps

use cartwheel_core::locator::Locator;
use cartwheel_core::outcome::{StepError, StepResult};
use cartwheel_core::selectors::{self, routes};
use tracing::info;

use super::Shopper;

impl Shopper<'_> {
    /// Sign in with the configured account through the login page.
    pub async fn log_in(&self) -> StepResult<()> {
        self.page.navigate(&self.config.url(routes::LOGIN)).await?;
        let waits = &self.config.waits;
        let w = self.waiter();

        let email = w
            .clickable(&Locator::css(selectors::LOGIN_EMAIL), waits.long())
            .await?;
        self.page
            .type_text(email, &self.config.account.email)
            .await?;

        let password = w
            .clickable(&Locator::css(selectors::LOGIN_PASSWORD), waits.short())
            .await?;
        self.page
            .type_text(password, &self.config.account.password)
            .await?;

        let submit = w
            .clickable(&Locator::css(selectors::LOGIN_SUBMIT), waits.short())
            .await?;
        self.page.click(submit).await?;
        info!(account = %self.config.account.email, "login submitted");
        Ok(())
    }

    /// Read the header greeting once it is showing.
    pub async fn greeting_text(&self) -> StepResult<String> {
        let greeting = self
            .waiter()
            .clickable(&Locator::css(selectors::GREETING), self.config.waits.long())
            .await?;
        Ok(self.page.text(greeting).await?)
    }

    /// The greeting must spell out the configured account, word for word.
    pub async fn verify_greeting(&self) -> StepResult<()> {
        let expected = self.config.account.expected_greeting();
        let actual = self.greeting_text().await?;
        if actual == expected {
            info!(greeting = %actual, "greeting verified");
            Ok(())
        } else {
            Err(StepError::mismatch("header greeting", expected, actual))
        }
    }

    /// Sign out through the account menu in the header.
    pub async fn log_out(&self) -> StepResult<()> {
        let waits = &self.config.waits;
        let w = self.waiter();

        let toggle = w
            .clickable(
                &Locator::css(selectors::ACCOUNT_MENU_TOGGLE),
                waits.long(),
            )
            .await?;
        self.page.click(toggle).await?;

        let sign_out = w
            .clickable(&Locator::css(selectors::AUTH_LINK), waits.short())
            .await?;
        self.page.click(sign_out).await?;
        info!("signed out");
        Ok(())
    }

    /// After signing out the header must offer Sign In again.
    pub async fn verify_signed_out(&self) -> StepResult<()> {
        self.waiter()
            .present(&selectors::sign_in_link(), self.config.waits.long())
            .await?;
        info!("sign-in link back in the header");
        Ok(())
    }
}
