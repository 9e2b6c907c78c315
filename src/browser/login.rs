//! LinkedIn login with a bounded manual-intervention window for OTP/captcha.

use std::time::Duration;

use tokio::time::{Instant, sleep};

use super::driver::{BrowserError, PageDriver};
use crate::error::BotError;

const LOGIN_URL: &str = "https://www.linkedin.com/login";
const USERNAME_SELECTOR: &str = "#username";
const PASSWORD_SELECTOR: &str = "#password";
const SUBMIT_SELECTOR: &str = "button[type='submit']";

/// True when the URL points at an OTP/captcha/"verify you're human" page.
pub fn is_challenge_url(url: &str) -> bool {
    url.contains("/checkpoint/") || url.contains("/challenge") || url.contains("captcha")
}

/// True when the URL is a signed-in LinkedIn surface.
fn is_logged_in_url(url: &str) -> bool {
    url.contains("/feed") || url.contains("/my-items") || url.contains("/jobs")
}

/// Suspend automation and poll until the user clears the verification page.
///
/// Returns `Ok(true)` when the challenge disappeared within the window and
/// `Ok(false)` when the window expired with the challenge still up. The
/// caller decides how severe an expired window is (fatal at login, a failed
/// attempt mid-form).
pub async fn wait_for_manual_verification(
    driver: &impl PageDriver,
    window: Duration,
    poll: Duration,
) -> Result<bool, BrowserError> {
    eprintln!(
        "  ⚠ Verification required — complete it in the browser window ({}s)",
        window.as_secs()
    );
    let deadline = Instant::now() + window;
    loop {
        let url = driver.current_url().await?;
        if !is_challenge_url(&url) {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(poll).await;
    }
}

/// Log in with the configured credentials.
///
/// An unresolved verification challenge or an unexpected post-login page is
/// an [`BotError::Authentication`], which is fatal for the whole run.
pub async fn login(
    driver: &impl PageDriver,
    email: &str,
    password: &str,
    intervention_window: Duration,
    poll: Duration,
) -> Result<(), BotError> {
    driver.goto(LOGIN_URL).await?;

    // Already signed in from a previous browser profile.
    let url = driver.current_url().await?;
    if is_logged_in_url(&url) {
        return Ok(());
    }

    if driver.exists(USERNAME_SELECTOR).await? {
        driver.fill(USERNAME_SELECTOR, email).await?;
        driver.fill(PASSWORD_SELECTOR, password).await?;
        driver.click(SUBMIT_SELECTOR).await?;
    }

    let url = driver.current_url().await?;
    if is_challenge_url(&url) {
        let cleared = wait_for_manual_verification(driver, intervention_window, poll).await?;
        if !cleared {
            return Err(BotError::Authentication(
                "verification challenge not completed within the manual window".into(),
            ));
        }
    }

    let url = driver.current_url().await?;
    if is_logged_in_url(&url) {
        Ok(())
    } else {
        Err(BotError::Authentication(format!(
            "unexpected post-login page: {url}"
        )))
    }
}
