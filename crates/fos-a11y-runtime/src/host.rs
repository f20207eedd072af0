//! Host Environment
//!
//! Capability interface between the runtime and the document it runs in.
//! A real embedding backs this with the live DOM, style system, media
//! queries and event loop; tests use [`crate::sim::SimHost`].
//!
//! All calls happen on the UI thread, so implementations use interior
//! mutability and take `&self`.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::{A11yError, Result};

/// Opaque handle to a document element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Handle to an installed key listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Element tag and attributes
#[derive(Debug, Clone, Default)]
pub struct ElementSnapshot {
    pub tag: String,
    pub attributes: HashMap<String, String>,
}

impl ElementSnapshot {
    pub fn new(tag: &str) -> Self {
        Self { tag: tag.to_ascii_lowercase(), attributes: HashMap::new() }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

/// Computed style values relevant to perceivability
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".into(),
            visibility: "visible".into(),
            opacity: "1".into(),
        }
    }
}

/// Keyboard event delivered to key listeners
#[derive(Debug)]
pub struct KeyEvent {
    pub key: String,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    default_prevented: Cell<bool>,
}

impl KeyEvent {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.into(),
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
            default_prevented: Cell::new(false),
        }
    }

    pub fn shift(mut self) -> Self { self.shift = true; self }
    pub fn ctrl(mut self) -> Self { self.ctrl = true; self }
    pub fn alt(mut self) -> Self { self.alt = true; self }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Key listener callback
pub type KeyListener = Rc<dyn Fn(&KeyEvent)>;

/// Deferred callback run by the host's timer facility
pub type TimerCallback = Box<dyn FnOnce()>;

/// Host environment capabilities
pub trait Host {
    /// Whether a document is present at all
    fn is_available(&self) -> bool {
        true
    }

    /// Candidate focusable descendants of `container`, in document order
    fn query_focusable(&self, container: ElementId) -> Vec<ElementId>;

    /// Tag and attributes of an element
    fn element(&self, id: ElementId) -> Option<ElementSnapshot>;

    /// Computed style of an element
    fn computed_style(&self, id: ElementId) -> Option<ComputedStyle>;

    /// Whether `id` is `container` or one of its descendants
    fn contains(&self, container: ElementId, id: ElementId) -> bool;

    /// Currently focused element
    fn active_element(&self) -> Option<ElementId>;

    /// Move focus to an element
    fn focus(&self, id: ElementId);

    /// Create an element and append it to the document body
    fn create_body_element(&self, tag: &str) -> Result<ElementId>;

    /// Detach an element from the document
    fn remove_element(&self, id: ElementId);

    fn set_attribute(&self, id: ElementId, name: &str, value: &str);

    fn remove_attribute(&self, id: ElementId, name: &str);

    fn set_text_content(&self, id: ElementId, text: &str);

    /// Install a keydown listener on `target`
    fn add_key_listener(&self, target: ElementId, listener: KeyListener) -> ListenerId;

    fn remove_key_listener(&self, target: ElementId, id: ListenerId);

    /// Raise a cancellation signal scoped to `target`
    fn dispatch_cancel(&self, target: ElementId);

    /// Evaluate a media query; `None` if the host has no media facility
    fn media_matches(&self, query: &str) -> Option<bool>;

    /// Run `callback` after `delay`
    ///
    /// Callers must not hold borrows the callback needs; a host may run a
    /// zero-delay callback before this returns.
    fn schedule_timer(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    fn cancel_timer(&self, id: TimerId);
}

/// Host for environments without a document
///
/// Queries return nothing, mutations are dropped, and element creation
/// fails with [`A11yError::EnvironmentUnavailable`].
#[derive(Debug, Default)]
pub struct NullHost;

impl NullHost {
    pub fn new() -> Self { Self }
}

impl Host for NullHost {
    fn is_available(&self) -> bool { false }
    fn query_focusable(&self, _container: ElementId) -> Vec<ElementId> { Vec::new() }
    fn element(&self, _id: ElementId) -> Option<ElementSnapshot> { None }
    fn computed_style(&self, _id: ElementId) -> Option<ComputedStyle> { None }
    fn contains(&self, _container: ElementId, _id: ElementId) -> bool { false }
    fn active_element(&self) -> Option<ElementId> { None }
    fn focus(&self, _id: ElementId) {}
    fn create_body_element(&self, _tag: &str) -> Result<ElementId> { Err(A11yError::EnvironmentUnavailable) }
    fn remove_element(&self, _id: ElementId) {}
    fn set_attribute(&self, _id: ElementId, _name: &str, _value: &str) {}
    fn remove_attribute(&self, _id: ElementId, _name: &str) {}
    fn set_text_content(&self, _id: ElementId, _text: &str) {}
    fn add_key_listener(&self, _target: ElementId, _listener: KeyListener) -> ListenerId { ListenerId(0) }
    fn remove_key_listener(&self, _target: ElementId, _id: ListenerId) {}
    fn dispatch_cancel(&self, _target: ElementId) {}
    fn media_matches(&self, _query: &str) -> Option<bool> { None }
    fn schedule_timer(&self, _delay: Duration, _callback: TimerCallback) -> TimerId { TimerId(0) }
    fn cancel_timer(&self, _id: TimerId) {}
}
