use std::time::Duration;

use thiserror::Error;

use crate::locator::Locator;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Element not found during {action}: {locator} (waited {elapsed:?})")]
    ElementNotFound {
        action: &'static str,
        locator: Locator,
        elapsed: Duration,
    },

    #[error("Element not interactable during {action}: {locator} (waited {elapsed:?}): {reason}")]
    NotInteractable {
        action: &'static str,
        locator: Locator,
        elapsed: Duration,
        reason: String,
    },

    #[error("Timeout waiting for: {condition} (waited {elapsed:?})")]
    Timeout { condition: String, elapsed: Duration },

    #[error("No active automation session: {0}")]
    SessionUnavailable(String),

    #[error("Session creation failed: {0}")]
    SessionStart(String),

    #[error("WebDriver error `{code}`: {message}")]
    WebDriver { code: String, message: String },

    #[error("Unexpected response: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WebDriver transport error: {0}")]
    Transport(String),

    #[error("Command timed out after {0:?}")]
    CommandTimeout(Duration),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// An element lookup that found nothing yet.
    pub fn not_found(locator: &Locator) -> Self {
        Error::ElementNotFound {
            action: "find",
            locator: locator.clone(),
            elapsed: Duration::ZERO,
        }
    }

    /// An element that exists but cannot take input right now.
    pub fn not_interactable(locator: &Locator, reason: impl Into<String>) -> Self {
        Error::NotInteractable {
            action: "find",
            locator: locator.clone(),
            elapsed: Duration::ZERO,
            reason: reason.into(),
        }
    }

    /// Whether a bounded wait should keep polling after this failure.
    ///
    /// Element and condition misses qualify. Transport, protocol and session
    /// failures end the wait immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::ElementNotFound { .. } | Error::NotInteractable { .. } | Error::Timeout { .. }
        )
    }

    /// Records which page operation was being attempted.
    pub fn during(self, operation: &'static str) -> Self {
        match self {
            Error::ElementNotFound {
                locator, elapsed, ..
            } => Error::ElementNotFound {
                action: operation,
                locator,
                elapsed,
            },
            Error::NotInteractable {
                locator,
                elapsed,
                reason,
                ..
            } => Error::NotInteractable {
                action: operation,
                locator,
                elapsed,
                reason,
            },
            other => other,
        }
    }

    pub(crate) fn with_elapsed(self, waited: Duration) -> Self {
        match self {
            Error::ElementNotFound {
                action, locator, ..
            } => Error::ElementNotFound {
                action,
                locator,
                elapsed: waited,
            },
            Error::NotInteractable {
                action,
                locator,
                reason,
                ..
            } => Error::NotInteractable {
                action,
                locator,
                elapsed: waited,
                reason,
            },
            Error::Timeout { condition, .. } => Error::Timeout {
                condition,
                elapsed: waited,
            },
            other => other,
        }
    }

    /// Re-tags a raw WebDriver failure against the element it concerned.
    pub(crate) fn for_locator(self, locator: &Locator) -> Self {
        match self {
            Error::WebDriver { code, message } => match code.as_str() {
                "no such element" => Error::not_found(locator),
                "element not interactable"
                | "element click intercepted"
                | "stale element reference"
                | "invalid element state" => {
                    Error::not_interactable(locator, format!("{code}: {message}"))
                }
                _ => Error::WebDriver { code, message },
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
