use crate::error::Result;
use crate::locator::Locator;
use crate::session::{ElementId, Session};

/// A located element, borrowed from the session that found it.
#[derive(Clone)]
pub struct Element<'s> {
    session: &'s dyn Session,
    id: ElementId,
    locator: Locator,
}

impl<'s> Element<'s> {
    pub(crate) fn new(session: &'s dyn Session, id: ElementId, locator: Locator) -> Self {
        Self {
            session,
            id,
            locator,
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// The locator this element was found with.
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub async fn click(&self) -> Result<()> {
        self.session
            .click(&self.id)
            .await
            .map_err(|e| e.for_locator(&self.locator))
    }

    pub async fn clear(&self) -> Result<()> {
        self.session
            .clear(&self.id)
            .await
            .map_err(|e| e.for_locator(&self.locator))
    }

    /// Type text into this element without clearing it first.
    pub async fn send_keys(&self, text: &str) -> Result<()> {
        self.session
            .send_keys(&self.id, text)
            .await
            .map_err(|e| e.for_locator(&self.locator))
    }

    pub async fn text(&self) -> Result<String> {
        self.session
            .text(&self.id)
            .await
            .map_err(|e| e.for_locator(&self.locator))
    }

    pub async fn is_displayed(&self) -> Result<bool> {
        self.session
            .is_displayed(&self.id)
            .await
            .map_err(|e| e.for_locator(&self.locator))
    }

    pub async fn is_enabled(&self) -> Result<bool> {
        self.session
            .is_enabled(&self.id)
            .await
            .map_err(|e| e.for_locator(&self.locator))
    }

    /// Visible and enabled, the same test a tap needs to land.
    pub async fn is_clickable(&self) -> Result<bool> {
        Ok(self.is_displayed().await? && self.is_enabled().await?)
    }
}

impl std::fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("locator", &self.locator)
            .finish()
    }
}
