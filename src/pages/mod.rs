//! Page objects for the Wikipedia Android app.
//!
//! Each screen is a [`Screen`]: a [`Page`] plus that screen's locators and
//! actions. Actions that move to another screen return the destination's page
//! object, built over the same session, so a scenario reads as a chain of
//! typed transitions:
//!
//! ```ignore
//! let search = HomePage::new(page).skip_onboarding().await?.click_search_box().await?;
//! ```

mod article;
mod home;
mod launch;
mod search;

pub use article::ArticlePage;
pub use home::HomePage;
pub use launch::{is_valid_activity, TARGET_PACKAGE, VALID_ACTIVITIES};
pub use search::SearchPage;

use crate::page::Page;

/// A page object bound to one screen of the app.
pub trait Screen<'s>: Sized {
    /// Wraps a page without checking which screen is showing.
    fn from_page(page: Page<'s>) -> Self;

    fn page(&self) -> &Page<'s>;

    /// Moves to another screen over the same session and wait policy.
    fn transition<T: Screen<'s>>(&self) -> T {
        T::from_page(*self.page())
    }
}
