#![allow(dead_code)]

use std::time::Duration;

use droid_pages::testing::{FakeElement, ScriptedSession};
use droid_pages::{ArticlePage, HomePage, SearchPage, WaitPolicy};

pub const FIRST_RESULT: &str = "Python (programming language)";

/// Short waits so that absent-element paths stay cheap under a paused clock.
pub fn fast_wait() -> WaitPolicy {
    WaitPolicy::new(Duration::from_secs(2), Duration::from_millis(100))
}

/// The Wikipedia app as far as the search flow is concerned.
///
/// With `onboarding` the skip button is showing on launch and tapping it
/// removes it. Tapping the search bar opens the search input, typing into
/// it loads the results list, and tapping a result opens the article.
pub fn wikipedia_app(onboarding: bool) -> ScriptedSession {
    let session = ScriptedSession::new()
        .with_element(
            HomePage::SEARCH_CONTAINER,
            FakeElement::new()
                .text("Search Wikipedia")
                .on_click_reveal(SearchPage::SEARCH_INPUT),
        )
        .with_hidden_element(
            SearchPage::SEARCH_INPUT,
            FakeElement::new()
                .appears_after(2)
                .on_type_reveal(SearchPage::SEARCH_RESULTS_LIST)
                .on_type_reveal(SearchPage::RESULT_TITLE),
        )
        .with_hidden_element(SearchPage::SEARCH_RESULTS_LIST, FakeElement::new().appears_after(3))
        .with_hidden_element(
            SearchPage::RESULT_TITLE,
            FakeElement::new()
                .text(FIRST_RESULT)
                .on_click_reveal(ArticlePage::ARTICLE_VIEW),
        )
        .with_hidden_element(
            ArticlePage::ARTICLE_VIEW,
            FakeElement::new().appears_after(1),
        );

    if onboarding {
        session.with_element(
            HomePage::SKIP_BUTTON,
            FakeElement::new().on_click_remove(HomePage::SKIP_BUTTON),
        )
    } else {
        session
    }
}
