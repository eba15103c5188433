use std::time::Duration;

use crate::element::Element;
use crate::error::{Error, Result};
use crate::locator::Locator;
use crate::session::Session;
use crate::wait::WaitPolicy;

/// Locator-based primitives over a borrowed session.
///
/// A `Page` holds no UI state, only a window onto the session, so it is cheap
/// to copy and to construct speculatively. Every lookup goes through the
/// page's [`WaitPolicy`].
#[derive(Clone, Copy)]
pub struct Page<'s> {
    session: &'s dyn Session,
    wait: WaitPolicy,
}

impl<'s> Page<'s> {
    pub fn new(session: &'s dyn Session) -> Self {
        Self::with_wait(session, WaitPolicy::default())
    }

    pub fn with_wait(session: &'s dyn Session, wait: WaitPolicy) -> Self {
        Self { session, wait }
    }

    /// Returns the underlying session.
    pub fn session(&self) -> &'s dyn Session {
        self.session
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    /// True when both pages drive the very same session object.
    pub fn same_session(&self, other: &Page<'_>) -> bool {
        std::ptr::eq(
            self.session as *const dyn Session as *const (),
            other.session as *const dyn Session as *const (),
        )
    }

    // ── Lookups ─────────────────────────────────────────────────────

    /// Wait until an element matching `locator` is present in the UI tree.
    pub async fn find(&self, locator: &Locator) -> Result<Element<'s>> {
        self.locate(locator, self.wait)
            .await
            .map_err(|e| e.during("find"))
    }

    /// Like [`find`](Self::find) but with a one-off timeout.
    pub async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<Element<'s>> {
        self.locate(locator, self.wait.with_timeout(timeout))
            .await
            .map_err(|e| e.during("wait_for"))
    }

    /// Look for an element that may legitimately be absent.
    ///
    /// Absence after the full wait is `Ok(None)`. Failures that are not about
    /// the element itself, such as a lost session, still propagate.
    pub async fn probe(&self, locator: &Locator) -> Result<Option<Element<'s>>> {
        match self.locate(locator, self.wait).await {
            Ok(element) => Ok(Some(element)),
            Err(e) if e.is_transient() => {
                tracing::debug!(%locator, "optional element absent");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn locate(&self, locator: &Locator, wait: WaitPolicy) -> Result<Element<'s>> {
        let session = self.session;
        wait.until(|| async move {
            let id = session.find_element(locator).await?;
            Ok(Element::new(session, id, locator.clone()))
        })
        .await
    }

    // ── Actions ─────────────────────────────────────────────────────

    /// Wait until the element is present, visible and enabled, then tap it.
    pub async fn click(&self, locator: &Locator) -> Result<()> {
        let session = self.session;
        let element = self
            .wait
            .until(|| async move {
                let id = session.find_element(locator).await?;
                let element = Element::new(session, id, locator.clone());
                if element.is_clickable().await? {
                    Ok(element)
                } else {
                    Err(Error::not_interactable(locator, "not displayed or not enabled"))
                }
            })
            .await
            .map_err(|e| e.during("click"))?;

        element.click().await.map_err(|e| e.during("click"))?;
        tracing::debug!(%locator, "clicked");
        Ok(())
    }

    /// Replace the content of an input with `text`.
    pub async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        let element = self
            .locate(locator, self.wait)
            .await
            .map_err(|e| e.during("type_text"))?;
        element.clear().await.map_err(|e| e.during("type_text"))?;
        element
            .send_keys(text)
            .await
            .map_err(|e| e.during("type_text"))?;
        tracing::debug!(%locator, text, "typed text");
        Ok(())
    }

    // ── Observations ────────────────────────────────────────────────

    /// Whether the element is present and visible.
    ///
    /// Never fails: any error, including a timeout, reads as `false`. This is
    /// the screen-identity probe, and "not here" is an ordinary answer.
    pub async fn is_displayed(&self, locator: &Locator) -> bool {
        let outcome = match self.locate(locator, self.wait).await {
            Ok(element) => element.is_displayed().await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(visible) => visible,
            Err(e) if e.is_transient() => {
                tracing::debug!(%locator, "element is not visible: {e}");
                false
            }
            Err(e) => {
                // TODO: surface session-level failures instead of folding them into `false`
                tracing::warn!(%locator, "visibility check failed: {e}");
                false
            }
        }
    }

    /// Displayed text of the element.
    pub async fn read_text(&self, locator: &Locator) -> Result<String> {
        let element = self
            .locate(locator, self.wait)
            .await
            .map_err(|e| e.during("read_text"))?;
        element.text().await.map_err(|e| e.during("read_text"))
    }

    pub async fn current_package(&self) -> Result<String> {
        self.session.current_package().await
    }

    pub async fn current_activity(&self) -> Result<String> {
        self.session.current_activity().await
    }

    /// Wait until `expected` is the foreground package.
    pub async fn wait_for_package(&self, expected: &str, timeout: Duration) -> Result<()> {
        let session = self.session;
        let condition = format!("foreground package to be {expected}");
        self.wait
            .with_timeout(timeout)
            .until_true(&condition, || async move {
                Ok(session.current_package().await? == expected)
            })
            .await
    }
}

impl std::fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page").field("wait", &self.wait).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeElement, ScriptedSession};

    const BUTTON: Locator = Locator::id("org.wikipedia:id/button");
    const FIELD: Locator = Locator::id("org.wikipedia:id/field");
    const GHOST: Locator = Locator::id("org.wikipedia:id/ghost");

    fn quick() -> WaitPolicy {
        WaitPolicy::new(Duration::from_secs(2), Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn find_waits_for_late_elements() {
        let session =
            ScriptedSession::new().with_element(BUTTON, FakeElement::new().appears_after(5));
        let page = Page::with_wait(&session, quick());
        let element = page.find(&BUTTON).await.unwrap();
        assert_eq!(element.locator(), &BUTTON);
        assert_eq!(session.lookups(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn find_reports_the_operation_and_locator() {
        let session = ScriptedSession::new();
        let err = Page::with_wait(&session, quick())
            .read_text(&GHOST)
            .await
            .unwrap_err();
        match err {
            Error::ElementNotFound {
                action,
                locator,
                elapsed,
            } => {
                assert_eq!(action, "read_text");
                assert_eq!(locator, GHOST);
                assert!(elapsed >= Duration::from_secs(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn find_gives_up_within_one_poll_of_the_timeout() {
        let session = ScriptedSession::new();
        let wait = WaitPolicy::new(Duration::from_millis(1050), Duration::from_millis(200));
        let page = Page::with_wait(&session, wait);

        let start = tokio::time::Instant::now();
        let err = page.find(&GHOST).await.unwrap_err();
        let waited = start.elapsed();

        assert!(waited >= wait.timeout, "gave up early after {waited:?}");
        assert!(
            waited <= wait.timeout + wait.poll_interval,
            "overran the deadline: {waited:?}"
        );
        match err {
            Error::ElementNotFound { action, elapsed, .. } => {
                assert_eq!(action, "find");
                assert!(elapsed <= wait.timeout + wait.poll_interval);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn click_refuses_disabled_elements() {
        let session = ScriptedSession::new().with_element(BUTTON, FakeElement::new().disabled());
        let err = Page::with_wait(&session, quick())
            .click(&BUTTON)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotInteractable { action: "click", .. }));
        assert!(session.clicks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn type_text_replaces_existing_content() {
        let session =
            ScriptedSession::new().with_element(FIELD, FakeElement::new().text("old query"));
        let page = Page::with_wait(&session, quick());
        page.type_text(&FIELD, "Python programming").await.unwrap();
        assert_eq!(session.text_of(&FIELD).as_deref(), Some("Python programming"));
        assert_eq!(page.read_text(&FIELD).await.unwrap(), "Python programming");
    }

    #[tokio::test(start_paused = true)]
    async fn is_displayed_is_total_and_stable() {
        let session = ScriptedSession::new()
            .with_element(BUTTON, FakeElement::new())
            .with_element(FIELD, FakeElement::new().invisible());
        let page = Page::with_wait(&session, quick());

        for _ in 0..3 {
            assert!(page.is_displayed(&BUTTON).await);
            assert!(!page.is_displayed(&FIELD).await);
            assert!(!page.is_displayed(&GHOST).await);
        }

        session.lose_session();
        assert!(!page.is_displayed(&BUTTON).await);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_distinguishes_absence_from_failure() {
        let session = ScriptedSession::new().with_element(BUTTON, FakeElement::new());
        let page = Page::with_wait(&session, quick());

        assert!(page.probe(&BUTTON).await.unwrap().is_some());
        assert!(page.probe(&GHOST).await.unwrap().is_none());

        session.lose_session();
        assert!(matches!(
            page.probe(&BUTTON).await,
            Err(Error::SessionUnavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_package_polls_until_the_app_is_foreground() {
        let session = ScriptedSession::new().launching_for(3);
        let page = Page::with_wait(&session, quick());
        page.wait_for_package("org.wikipedia", Duration::from_secs(3))
            .await
            .unwrap();

        let never = ScriptedSession::new().with_package("com.android.settings");
        let err = Page::with_wait(&never, quick())
            .wait_for_package("org.wikipedia", Duration::from_secs(3))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[test]
    fn copies_share_the_session() {
        let one = ScriptedSession::new();
        let two = ScriptedSession::new();
        let page = Page::new(&one);
        let copy = page;
        assert!(page.same_session(&copy));
        assert!(!page.same_session(&Page::new(&two)));
    }
}
