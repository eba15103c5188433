use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::locator::Locator;

/// Opaque reference to an element inside a remote session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live connection to an automation server controlling one app instance.
///
/// Each call is a single remote command with no waiting of its own; waits are
/// layered on top by [`crate::page::Page`].
#[async_trait]
pub trait Session: Send + Sync {
    /// Looks up the first element matching `locator` in the current UI tree.
    async fn find_element(&self, locator: &Locator) -> Result<ElementId>;

    async fn click(&self, element: &ElementId) -> Result<()>;

    async fn clear(&self, element: &ElementId) -> Result<()>;

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()>;

    async fn text(&self, element: &ElementId) -> Result<String>;

    async fn is_displayed(&self, element: &ElementId) -> Result<bool>;

    async fn is_enabled(&self, element: &ElementId) -> Result<bool>;

    /// Package of the app currently in the foreground.
    async fn current_package(&self) -> Result<String>;

    async fn current_activity(&self) -> Result<String>;

    /// Ends the remote session. Later calls fail with `SessionUnavailable`.
    async fn quit(&self) -> Result<()>;
}

/// Produces fresh sessions from some external configuration.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Session>>;
}
