use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Selection mechanisms understood by the Appium UiAutomator2 driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Android resource id, e.g. `org.wikipedia:id/search_container`.
    Id,
    /// Content description.
    AccessibilityId,
    /// Exact visible text.
    Text,
    #[serde(rename = "xpath")]
    XPath,
    ClassName,
    /// Raw `UiSelector` expression.
    #[serde(rename = "uiautomator")]
    UiAutomator,
}

impl Strategy {
    /// Name of the strategy in a find-element request.
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::AccessibilityId => "accessibility id",
            Self::Text | Self::UiAutomator => "-android uiautomator",
            Self::XPath => "xpath",
            Self::ClassName => "class name",
        }
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::AccessibilityId => "accessibility_id",
            Self::Text => "text",
            Self::XPath => "xpath",
            Self::ClassName => "class_name",
            Self::UiAutomator => "uiautomator",
        }
    }
}

/// How to find one UI element: a strategy plus its selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub strategy: Strategy,
    pub value: Cow<'static, str>,
}

impl Locator {
    pub const fn new(strategy: Strategy, value: &'static str) -> Self {
        Self {
            strategy,
            value: Cow::Borrowed(value),
        }
    }

    pub const fn id(value: &'static str) -> Self {
        Self::new(Strategy::Id, value)
    }

    pub const fn accessibility_id(value: &'static str) -> Self {
        Self::new(Strategy::AccessibilityId, value)
    }

    pub const fn text(value: &'static str) -> Self {
        Self::new(Strategy::Text, value)
    }

    pub const fn xpath(value: &'static str) -> Self {
        Self::new(Strategy::XPath, value)
    }

    /// Builds a locator from a runtime selector.
    pub fn owned(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: Cow::Owned(value.into()),
        }
    }

    /// The `(using, value)` pair sent with a find-element command.
    pub fn to_wire(&self) -> (&'static str, String) {
        let value = match self.strategy {
            Strategy::Text => format!(
                "new UiSelector().text(\"{}\")",
                self.value.replace('\\', "\\\\").replace('"', "\\\"")
            ),
            _ => self.value.to_string(),
        };
        (self.strategy.wire_name(), value)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.label(), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_and_owned_locators_compare_by_value() {
        const SEARCH: Locator = Locator::id("org.wikipedia:id/search_container");
        let runtime = Locator::owned(Strategy::Id, "org.wikipedia:id/search_container");
        assert_eq!(SEARCH, runtime);
        assert_ne!(SEARCH, Locator::accessibility_id("org.wikipedia:id/search_container"));
    }

    #[test]
    fn text_strategy_becomes_a_uiselector_query() {
        let locator = Locator::text(r#"Say "hi""#);
        let (using, value) = locator.to_wire();
        assert_eq!(using, "-android uiautomator");
        assert_eq!(value, r#"new UiSelector().text("Say \"hi\"")"#);
    }

    #[test]
    fn display_names_strategy_and_value() {
        assert_eq!(
            Locator::accessibility_id("Search Wikipedia").to_string(),
            "accessibility_id=Search Wikipedia"
        );
    }

    #[test]
    fn serializes_as_tagged_strategy() {
        let json = serde_json::to_value(Locator::xpath("//android.widget.TextView")).unwrap();
        assert_eq!(json["strategy"], "xpath");
        let back: Locator = serde_json::from_value(json).unwrap();
        assert_eq!(back, Locator::xpath("//android.widget.TextView"));
    }
}
