use crate::error::Result;
use crate::locator::Locator;
use crate::page::Page;
use crate::pages::{Screen, SearchPage};

/// Main screen, with the search bar at the top.
#[derive(Debug, Clone, Copy)]
pub struct HomePage<'s> {
    page: Page<'s>,
}

impl<'s> Screen<'s> for HomePage<'s> {
    fn from_page(page: Page<'s>) -> Self {
        Self { page }
    }

    fn page(&self) -> &Page<'s> {
        &self.page
    }
}

impl<'s> HomePage<'s> {
    pub const SKIP_BUTTON: Locator =
        Locator::id("org.wikipedia:id/fragment_onboarding_skip_button");
    pub const SEARCH_CONTAINER: Locator = Locator::id("org.wikipedia:id/search_container");
    pub const SEARCH_TEXT: Locator = Locator::id("org.wikipedia:id/search_src_text");

    pub fn new(page: Page<'s>) -> Self {
        Self::from_page(page)
    }

    /// Dismiss the first-launch onboarding flow if it is showing.
    ///
    /// A missing skip button is the normal case after the first run and is not
    /// an error. Only session-level failures are returned.
    pub async fn skip_onboarding(self) -> Result<Self> {
        if self.page.probe(&Self::SKIP_BUTTON).await?.is_none() {
            tracing::info!("no onboarding screen");
            return Ok(self);
        }

        match self.page.click(&Self::SKIP_BUTTON).await {
            Ok(()) => tracing::info!("skipped onboarding"),
            Err(e) if e.is_transient() => {
                tracing::warn!("onboarding skip button went away before the tap: {e}")
            }
            Err(e) => return Err(e),
        }
        Ok(self)
    }

    /// Whether the search bar is visible, which confirms the home screen.
    pub async fn is_search_displayed(&self) -> bool {
        self.page.is_displayed(&Self::SEARCH_CONTAINER).await
    }

    /// Tap the search bar, which opens the search screen.
    pub async fn click_search_box(&self) -> Result<SearchPage<'s>> {
        self.page.click(&Self::SEARCH_CONTAINER).await?;
        tracing::info!("clicked search box");
        Ok(self.transition())
    }

    /// Open search and type `term` into it.
    pub async fn search_for(&self, term: &str) -> Result<SearchPage<'s>> {
        self.click_search_box()
            .await?
            .enter_search_text(term)
            .await
    }
}
