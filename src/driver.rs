use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::error::{CmdError, ErrorStatus, WebDriver as WireError};
use fantoccini::wd::WebDriverCompatibleCommand;
use fantoccini::{Client, ClientBuilder};
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

use crate::config::AppiumConfig;
use crate::error::{Error, Result};
use crate::locator::Locator;
use crate::session::{ElementId, Session};

/// Key of the element reference object in W3C responses.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
/// Key used by servers still speaking the JSON Wire Protocol.
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// A command under `/session/{id}/`, issued through [`Client::issue_cmd`].
///
/// fantoccini's own locators cannot express the Appium strategies
/// (`accessibility id`, `-android uiautomator`) and it has no method for the
/// `appium/device/*` endpoints, so every session command goes through here.
#[derive(Debug)]
struct Command {
    method: Method,
    path: String,
    body: Option<Value>,
}

impl Command {
    fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }
}

impl WebDriverCompatibleCommand for Command {
    fn endpoint(
        &self,
        base_url: &Url,
        session_id: Option<&str>,
    ) -> std::result::Result<Url, url::ParseError> {
        let Some(session) = session_id else {
            return Err(url::ParseError::RelativeUrlWithoutBase);
        };
        base_url.join(&format!("session/{session}/{}", self.path))
    }

    fn method_and_body(&self, _request_url: &Url) -> (Method, Option<String>) {
        (self.method.clone(), self.body.as_ref().map(Value::to_string))
    }
}

/// A live Appium session, driven through a fantoccini WebDriver client.
pub struct AppiumDriver {
    client: Client,
    session_id: String,
    command_timeout: Duration,
    closed: AtomicBool,
}

impl AppiumDriver {
    /// Create a session on the configured server and launch the app.
    pub async fn start(config: &AppiumConfig) -> Result<Self> {
        config.validate()?;
        // fantoccini joins endpoints onto this URL, so keep any path prefix
        let mut server = config.server()?.to_string();
        if !server.ends_with('/') {
            server.push('/');
        }
        let command_timeout = config.command_timeout();

        tracing::info!(server = %server, device = %config.device_name, "creating Appium session");
        let connected = tokio::time::timeout(
            command_timeout,
            ClientBuilder::native()
                .capabilities(config.capabilities())
                .connect(&server),
        )
        .await;
        let client = match connected {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => return Err(Error::SessionStart(e.to_string())),
            Err(_) => {
                return Err(Error::SessionStart(format!(
                    "no answer from {server} within {command_timeout:?}"
                )))
            }
        };

        let session_id = client
            .session_id()
            .await
            .map_err(from_cmd_error)?
            .ok_or_else(|| Error::SessionStart("server returned no session id".into()))?;
        tracing::info!(%session_id, "session created");

        Ok(Self {
            client,
            session_id,
            command_timeout,
            closed: AtomicBool::new(false),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn issue(&self, command: Command) -> Result<Value> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::SessionUnavailable(format!(
                "session {} has been closed",
                self.session_id
            )));
        }

        tracing::trace!(method = %command.method, path = %command.path, "webdriver command");
        match tokio::time::timeout(self.command_timeout, self.client.issue_cmd(command)).await {
            Ok(result) => result.map_err(from_cmd_error),
            Err(_) => Err(Error::CommandTimeout(self.command_timeout)),
        }
    }

    async fn post(&self, path: String, body: Value) -> Result<()> {
        self.issue(Command::post(path, body)).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: String) -> Result<T> {
        let value = self.issue(Command::get(path)).await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl std::fmt::Debug for AppiumDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppiumDriver")
            .field("session_id", &self.session_id)
            .field("command_timeout", &self.command_timeout)
            .field("closed", &self.closed)
            .finish()
    }
}

#[async_trait]
impl Session for AppiumDriver {
    async fn find_element(&self, locator: &Locator) -> Result<ElementId> {
        let (using, value) = locator.to_wire();
        let reference = self
            .issue(Command::post(
                "element",
                json!({ "using": using, "value": value }),
            ))
            .await
            .map_err(|e| e.for_locator(locator))?;
        element_id(&reference)
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.post(format!("element/{element}/click"), json!({}))
            .await
    }

    async fn clear(&self, element: &ElementId) -> Result<()> {
        self.post(format!("element/{element}/clear"), json!({}))
            .await
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        self.post(format!("element/{element}/value"), json!({ "text": text }))
            .await
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        self.get(format!("element/{element}/text")).await
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        self.get(format!("element/{element}/displayed")).await
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        self.get(format!("element/{element}/enabled")).await
    }

    async fn current_package(&self) -> Result<String> {
        self.get("appium/device/current_package".into()).await
    }

    async fn current_activity(&self) -> Result<String> {
        self.get("appium/device/current_activity".into()).await
    }

    /// Deletes the session. A session the server already dropped, for
    /// instance after `newCommandTimeout`, counts as closed.
    async fn quit(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::info!(session_id = %self.session_id, "deleting session");
        match tokio::time::timeout(self.command_timeout, self.client.clone().close()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => match from_cmd_error(e) {
                Error::SessionUnavailable(reason) => {
                    tracing::info!(%reason, "session already ended on the server");
                    Ok(())
                }
                other => Err(other),
            },
            Err(_) => Err(Error::CommandTimeout(self.command_timeout)),
        }
    }
}

fn from_cmd_error(err: CmdError) -> Error {
    match err {
        CmdError::Standard(wire) => from_wire(wire),
        other => Error::Transport(other.to_string()),
    }
}

fn from_wire(wire: WireError) -> Error {
    let message = wire.message.to_string();
    match wire.error {
        ErrorStatus::InvalidSessionId => Error::SessionUnavailable(message),
        status => Error::WebDriver {
            code: error_code(&status).into_owned(),
            message,
        },
    }
}

/// W3C error code for the statuses the page layer reacts to.
fn error_code(status: &ErrorStatus) -> Cow<'static, str> {
    let code = match status {
        ErrorStatus::NoSuchElement => "no such element",
        ErrorStatus::ElementNotInteractable => "element not interactable",
        ErrorStatus::ElementClickIntercepted => "element click intercepted",
        ErrorStatus::StaleElementReference => "stale element reference",
        ErrorStatus::InvalidElementState => "invalid element state",
        ErrorStatus::InvalidSelector => "invalid selector",
        ErrorStatus::InvalidSessionId => "invalid session id",
        ErrorStatus::UnknownCommand => "unknown command",
        other => return Cow::Owned(format!("{other:?}")),
    };
    Cow::Borrowed(code)
}

fn element_id(reference: &Value) -> Result<ElementId> {
    reference
        .get(ELEMENT_KEY)
        .or_else(|| reference.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(ElementId::new)
        .ok_or_else(|| Error::Protocol(format!("no element reference in {reference}")))
}
