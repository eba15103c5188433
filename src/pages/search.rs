use crate::error::Result;
use crate::locator::Locator;
use crate::page::Page;
use crate::pages::{ArticlePage, Screen};

#[derive(Debug, Clone, Copy)]
pub struct SearchPage<'s> {
    page: Page<'s>,
}

impl<'s> Screen<'s> for SearchPage<'s> {
    fn from_page(page: Page<'s>) -> Self {
        Self { page }
    }

    fn page(&self) -> &Page<'s> {
        &self.page
    }
}

impl<'s> SearchPage<'s> {
    pub const SEARCH_INPUT: Locator = Locator::id("org.wikipedia:id/search_src_text");
    pub const SEARCH_RESULTS_LIST: Locator =
        Locator::id("org.wikipedia:id/search_results_list");
    pub const RESULT_TITLE: Locator = Locator::id("org.wikipedia:id/page_list_item_title");

    pub fn new(page: Page<'s>) -> Self {
        Self::from_page(page)
    }

    pub async fn is_search_input_displayed(&self) -> bool {
        self.page.is_displayed(&Self::SEARCH_INPUT).await
    }

    /// Replace the query with `text`. Results load as the app sees the input.
    pub async fn enter_search_text(self, text: &str) -> Result<Self> {
        self.page.type_text(&Self::SEARCH_INPUT, text).await?;
        tracing::info!(text, "entered search text");
        Ok(self)
    }

    pub async fn is_results_displayed(&self) -> bool {
        self.page.is_displayed(&Self::SEARCH_RESULTS_LIST).await
    }

    /// Title of the first result in the list.
    pub async fn first_result_text(&self) -> Result<String> {
        self.page.read_text(&Self::RESULT_TITLE).await
    }

    /// Open the first result's article.
    pub async fn click_first_result(&self) -> Result<ArticlePage<'s>> {
        self.page.click(&Self::RESULT_TITLE).await?;
        tracing::info!("clicked first result");
        Ok(self.transition())
    }
}
