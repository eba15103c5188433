use crate::locator::Locator;
use crate::page::Page;
use crate::pages::Screen;

/// An open article. Only its identity check is modelled.
#[derive(Debug, Clone, Copy)]
pub struct ArticlePage<'s> {
    page: Page<'s>,
}

impl<'s> Screen<'s> for ArticlePage<'s> {
    fn from_page(page: Page<'s>) -> Self {
        Self { page }
    }

    fn page(&self) -> &Page<'s> {
        &self.page
    }
}

impl<'s> ArticlePage<'s> {
    pub const ARTICLE_VIEW: Locator = Locator::id("org.wikipedia:id/page_web_view");

    pub async fn is_article_displayed(&self) -> bool {
        self.page.is_displayed(&Self::ARTICLE_VIEW).await
    }
}
