pub mod config;
pub mod driver;
pub mod element;
pub mod error;
pub mod locator;
pub mod logging;
pub mod page;
pub mod pages;
pub mod provider;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod wait;

pub use config::{AppiumConfig, ConfigBuilder};
pub use driver::AppiumDriver;
pub use element::Element;
pub use error::{Error, Result};
pub use locator::{Locator, Strategy};
pub use page::Page;
pub use pages::{ArticlePage, HomePage, Screen, SearchPage};
pub use provider::SessionProvider;
pub use session::{Connector, ElementId, Session};
pub use wait::WaitPolicy;
