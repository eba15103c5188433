//! In-memory sessions for exercising page objects without a device.
//!
//! [`ScriptedSession`] keeps a flat map of locators to fake elements. Elements
//! can start hidden, show up only after a number of lookups, and reveal or
//! remove other elements when tapped or typed into, which is enough to script
//! screen transitions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::locator::Locator;
use crate::session::{Connector, ElementId, Session};

#[derive(Debug, Clone)]
pub struct FakeElement {
    text: String,
    displayed: bool,
    enabled: bool,
    appears_after: u32,
    on_click: Vec<Effect>,
    on_type: Vec<Effect>,
}

#[derive(Debug, Clone)]
enum Effect {
    Reveal(Locator),
    Remove(Locator),
}

impl Default for FakeElement {
    fn default() -> Self {
        Self {
            text: String::new(),
            displayed: true,
            enabled: true,
            appears_after: 0,
            on_click: Vec::new(),
            on_type: Vec::new(),
        }
    }
}

impl FakeElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Present in the tree but not visible.
    pub fn invisible(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Fail the first `lookups` finds after the element becomes present.
    pub fn appears_after(mut self, lookups: u32) -> Self {
        self.appears_after = lookups;
        self
    }

    pub fn on_click_reveal(mut self, locator: Locator) -> Self {
        self.on_click.push(Effect::Reveal(locator));
        self
    }

    pub fn on_click_remove(mut self, locator: Locator) -> Self {
        self.on_click.push(Effect::Remove(locator));
        self
    }

    pub fn on_type_reveal(mut self, locator: Locator) -> Self {
        self.on_type.push(Effect::Reveal(locator));
        self
    }
}

#[derive(Debug)]
struct Node {
    element: FakeElement,
    present: bool,
    misses: u32,
}

#[derive(Debug, Default)]
struct State {
    nodes: HashMap<Locator, Node>,
    handles: HashMap<ElementId, Locator>,
    next_handle: u64,
    lookups: usize,
    clicks: Vec<Locator>,
    package_checks: u32,
    closed: bool,
    lost: bool,
}

/// A [`Session`] over a scripted UI tree.
#[derive(Debug)]
pub struct ScriptedSession {
    state: Mutex<State>,
    package: String,
    activity: String,
    launching_for: u32,
    quits: Option<Arc<AtomicUsize>>,
}

impl Default for ScriptedSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            package: "org.wikipedia".to_string(),
            activity: ".main.MainActivity".to_string(),
            launching_for: 0,
            quits: None,
        }
    }

    /// Register an element that is on screen from the start.
    pub fn with_element(self, locator: Locator, element: FakeElement) -> Self {
        self.insert(locator, element, true)
    }

    /// Register an element that only exists once something reveals it.
    pub fn with_hidden_element(self, locator: Locator, element: FakeElement) -> Self {
        self.insert(locator, element, false)
    }

    fn insert(self, locator: Locator, element: FakeElement, present: bool) -> Self {
        self.state.lock().nodes.insert(
            locator,
            Node {
                element,
                present,
                misses: 0,
            },
        );
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = activity.into();
        self
    }

    /// Report the launcher as foreground package for the first `checks` queries.
    pub fn launching_for(mut self, checks: u32) -> Self {
        self.launching_for = checks;
        self
    }

    pub fn with_quit_counter(mut self, quits: Arc<AtomicUsize>) -> Self {
        self.quits = Some(quits);
        self
    }

    /// Make every later call fail as if the server dropped the session.
    pub fn lose_session(&self) {
        self.state.lock().lost = true;
    }

    /// Number of find-element calls served so far.
    pub fn lookups(&self) -> usize {
        self.state.lock().lookups
    }

    pub fn clicks(&self) -> Vec<Locator> {
        self.state.lock().clicks.clone()
    }

    /// Current text of an element, present or not.
    pub fn text_of(&self, locator: &Locator) -> Option<String> {
        self.state
            .lock()
            .nodes
            .get(locator)
            .map(|node| node.element.text.clone())
    }

    pub fn is_present(&self, locator: &Locator) -> bool {
        self.state
            .lock()
            .nodes
            .get(locator)
            .is_some_and(|node| node.present)
    }

    fn check_open(state: &State) -> Result<()> {
        if state.closed {
            Err(Error::SessionUnavailable("session has been quit".into()))
        } else if state.lost {
            Err(Error::SessionUnavailable("session lost".into()))
        } else {
            Ok(())
        }
    }

    /// Run `f` on the live node behind `element`.
    fn with_node<T>(
        &self,
        element: &ElementId,
        f: impl FnOnce(&mut State, &Locator) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.lock();
        Self::check_open(&state)?;
        let locator = state
            .handles
            .get(element)
            .cloned()
            .ok_or_else(|| wire("no such element", format!("unknown element {element}")))?;
        let present = state.nodes.get(&locator).is_some_and(|node| node.present);
        if !present {
            return Err(wire(
                "stale element reference",
                format!("{locator} is no longer attached"),
            ));
        }
        f(&mut *state, &locator)
    }
}

fn wire(code: &str, message: String) -> Error {
    Error::WebDriver {
        code: code.to_string(),
        message,
    }
}

fn apply(state: &mut State, effects: &[Effect]) {
    for effect in effects {
        match effect {
            Effect::Reveal(locator) => {
                if let Some(node) = state.nodes.get_mut(locator) {
                    node.present = true;
                }
            }
            Effect::Remove(locator) => {
                if let Some(node) = state.nodes.get_mut(locator) {
                    node.present = false;
                }
            }
        }
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn find_element(&self, locator: &Locator) -> Result<ElementId> {
        let mut state = self.state.lock();
        Self::check_open(&state)?;
        state.lookups += 1;

        let node = match state.nodes.get_mut(locator) {
            Some(node) if node.present => node,
            _ => return Err(Error::not_found(locator)),
        };
        if node.misses < node.element.appears_after {
            node.misses += 1;
            return Err(Error::not_found(locator));
        }

        state.next_handle += 1;
        let id = ElementId::new(format!("fake-{}", state.next_handle));
        state.handles.insert(id.clone(), locator.clone());
        Ok(id)
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.with_node(element, |state, locator| {
            let node = &state.nodes[locator];
            if !node.element.displayed || !node.element.enabled {
                return Err(wire(
                    "element not interactable",
                    format!("{locator} cannot be tapped"),
                ));
            }
            let effects = node.element.on_click.clone();
            state.clicks.push(locator.clone());
            apply(state, &effects);
            Ok(())
        })
    }

    async fn clear(&self, element: &ElementId) -> Result<()> {
        self.with_node(element, |state, locator| {
            if let Some(node) = state.nodes.get_mut(locator) {
                node.element.text.clear();
            }
            Ok(())
        })
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        self.with_node(element, |state, locator| {
            let effects = match state.nodes.get_mut(locator) {
                Some(node) => {
                    node.element.text.push_str(text);
                    node.element.on_type.clone()
                }
                None => Vec::new(),
            };
            apply(state, &effects);
            Ok(())
        })
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        self.with_node(element, |state, locator| {
            Ok(state.nodes[locator].element.text.clone())
        })
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        self.with_node(element, |state, locator| {
            Ok(state.nodes[locator].element.displayed)
        })
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        self.with_node(element, |state, locator| {
            Ok(state.nodes[locator].element.enabled)
        })
    }

    async fn current_package(&self) -> Result<String> {
        let mut state = self.state.lock();
        Self::check_open(&state)?;
        state.package_checks += 1;
        if state.package_checks <= self.launching_for {
            Ok("com.google.android.apps.nexuslauncher".to_string())
        } else {
            Ok(self.package.clone())
        }
    }

    async fn current_activity(&self) -> Result<String> {
        Self::check_open(&self.state.lock())?;
        Ok(self.activity.clone())
    }

    async fn quit(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        if let Some(quits) = &self.quits {
            quits.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Hands out a new [`ScriptedSession`] per connection and counts the traffic.
pub struct ScriptedConnector {
    factory: Box<dyn Fn() -> ScriptedSession + Send + Sync>,
    connects: Arc<AtomicUsize>,
    quits: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new(factory: impl Fn() -> ScriptedSession + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            connects: Arc::new(AtomicUsize::new(0)),
            quits: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn connects(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.connects)
    }

    pub fn quits(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.quits)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn Session>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let session = (self.factory)().with_quit_counter(Arc::clone(&self.quits));
        Ok(Box::new(session))
    }
}
