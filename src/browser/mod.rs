pub mod chrome;
pub mod driver;
pub mod login;

#[cfg(test)]
pub mod fake;

pub use chrome::{ChromePage, ChromeSession};
pub use driver::{BrowserError, PageDriver};
pub use login::{login, wait_for_manual_verification};
