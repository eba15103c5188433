use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use url::Url;

use crate::driver::AppiumDriver;
use crate::error::{Error, Result};
use crate::session::{Connector, Session};
use crate::wait::WaitPolicy;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:4723";
pub const APP_PACKAGE: &str = "org.wikipedia";
pub const APP_ACTIVITY: &str = "org.wikipedia.main.MainActivity";

pub const ENV_SERVER_URL: &str = "APPIUM_SERVER_URL";
pub const ENV_DEVICE_NAME: &str = "ANDROID_DEVICE_NAME";
pub const ENV_APP_PATH: &str = "APP_PATH";
pub const ENV_APP_PACKAGE: &str = "APP_PACKAGE";

/// Everything needed to start an Appium session against the app under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppiumConfig {
    pub server_url: String,
    pub platform_name: String,
    pub device_name: String,
    pub automation_name: String,
    /// APK to install. `None` launches an already installed app.
    pub app: Option<PathBuf>,
    pub app_package: String,
    pub app_activity: String,
    /// Keep app data between sessions.
    pub no_reset: bool,
    /// Uninstall the app after the session.
    pub full_reset: bool,
    pub new_command_timeout_secs: u64,
    pub auto_grant_permissions: bool,
    pub disable_window_animation: bool,
    /// Upper bound on a single WebDriver command, session creation included.
    pub command_timeout_ms: u64,
    pub element_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for AppiumConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            platform_name: "Android".to_string(),
            device_name: "emulator-5554".to_string(),
            automation_name: "UiAutomator2".to_string(),
            app: Some(default_app_path()),
            app_package: APP_PACKAGE.to_string(),
            app_activity: APP_ACTIVITY.to_string(),
            no_reset: false,
            full_reset: false,
            new_command_timeout_secs: 300,
            auto_grant_permissions: true,
            disable_window_animation: true,
            command_timeout_ms: 120_000,
            element_timeout_ms: 10_000,
            poll_interval_ms: 500,
        }
    }
}

/// `apps/wikipedia.apk` next to this crate's manifest.
pub fn default_app_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("apps")
        .join("wikipedia.apk")
}

impl AppiumConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    /// Apply `APPIUM_SERVER_URL`, `ANDROID_DEVICE_NAME`, `APP_PATH` and
    /// `APP_PACKAGE` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_SERVER_URL) {
            self.server_url = url;
        }
        if let Some(device) = lookup(ENV_DEVICE_NAME) {
            self.device_name = device;
        }
        if let Some(app) = lookup(ENV_APP_PATH) {
            self.app = if app.is_empty() {
                None
            } else {
                Some(PathBuf::from(app))
            };
        }
        if let Some(package) = lookup(ENV_APP_PACKAGE) {
            self.app_package = package;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.server()?;
        if self.app_package.trim().is_empty() {
            return Err(Error::Config("app_package must not be empty".into()));
        }
        if self.command_timeout_ms == 0 {
            return Err(Error::Config("command_timeout_ms must be positive".into()));
        }
        if self.element_timeout_ms == 0 || self.poll_interval_ms == 0 {
            return Err(Error::Config(
                "element_timeout_ms and poll_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Parsed server URL.
    pub fn server(&self) -> Result<Url> {
        let url = Url::parse(&self.server_url)
            .map_err(|e| Error::Config(format!("invalid server_url {:?}: {e}", self.server_url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::Config(format!("unsupported server_url scheme {other:?}"))),
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Wait policy handed to page objects built on sessions from this config.
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.element_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    /// W3C capabilities, vendor keys prefixed with `appium:`.
    pub fn capabilities(&self) -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert("platformName".into(), json!(self.platform_name));

        let mut vendor = |key: &str, value: Value| {
            caps.insert(format!("appium:{key}"), value);
        };
        vendor("deviceName", json!(self.device_name));
        vendor("automationName", json!(self.automation_name));
        if let Some(app) = &self.app {
            vendor("app", json!(app.to_string_lossy()));
        }
        vendor("appPackage", json!(self.app_package));
        vendor("appActivity", json!(self.app_activity));
        vendor("noReset", json!(self.no_reset));
        vendor("fullReset", json!(self.full_reset));
        vendor("newCommandTimeout", json!(self.new_command_timeout_secs));
        vendor("autoGrantPermissions", json!(self.auto_grant_permissions));
        vendor("disableWindowAnimation", json!(self.disable_window_animation));

        caps
    }
}

#[async_trait]
impl Connector for AppiumConfig {
    async fn connect(&self) -> Result<Box<dyn Session>> {
        let driver = AppiumDriver::start(self).await?;
        Ok(Box::new(driver))
    }
}

pub struct ConfigBuilder {
    config: AppiumConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppiumConfig::default(),
        }
    }

    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.config.device_name = name.into();
        self
    }

    pub fn app(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.app = Some(path.into());
        self
    }

    /// Launch the installed app instead of installing an APK.
    pub fn installed_app(mut self) -> Self {
        self.config.app = None;
        self
    }

    pub fn app_package(mut self, package: impl Into<String>) -> Self {
        self.config.app_package = package.into();
        self
    }

    pub fn app_activity(mut self, activity: impl Into<String>) -> Self {
        self.config.app_activity = activity.into();
        self
    }

    pub fn no_reset(mut self, no_reset: bool) -> Self {
        self.config.no_reset = no_reset;
        self
    }

    /// Set the per-command WebDriver timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout_ms = millis(timeout);
        self
    }

    /// Set the element wait used by page objects.
    pub fn element_timeout(mut self, timeout: Duration) -> Self {
        self.config.element_timeout_ms = millis(timeout);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = millis(interval);
        self
    }

    pub fn build_config(self) -> AppiumConfig {
        self.config
    }

    pub async fn connect(self) -> Result<AppiumDriver> {
        AppiumDriver::start(&self.build_config()).await
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
