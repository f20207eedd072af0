//! Focus Traps
//!
//! Confine Tab navigation to a container (dialog, menu, drawer) while it
//! is open.
//!
//! A trap cycles Tab / Shift+Tab at the first and last focusable element
//! and turns Escape into a cancellation signal on the container. It never
//! dismantles itself: the owner calls [`FocusTrap::dispose`] (or drops the
//! handle). Focus is not restored on dispose; callers that want the
//! previously focused element back must remember and refocus it.
//!
//! One trap per container. Traps on different containers are independent.
//! The container carries a marker attribute while trapped, so the rule holds
//! across controllers sharing a host.

use std::cell::RefCell;
use std::rc::Rc;

use crate::host::{ElementId, Host, KeyEvent, KeyListener, ListenerId};
use crate::visibility::VisibilityClassifier;
use crate::{A11yError, Result};

/// Set on a container while a trap is installed on it
pub const TRAP_MARKER: &str = "data-a11y-focus-trap";

/// Tab index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabIndex {
    NotFocusable,    // negative: focusable by script, skipped by Tab
    Sequential(i32), // 0 or positive
}

impl TabIndex {
    /// Parse a `tabindex` value; `None` if it is not an integer
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().parse::<i32>() {
            Ok(n) if n < 0 => Some(Self::NotFocusable),
            Ok(n) => Some(Self::Sequential(n)),
            Err(_) => None,
        }
    }

    pub fn is_focusable(&self) -> bool {
        matches!(self, Self::Sequential(_))
    }
}

/// What a trap does with a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapAction {
    /// Prevent default and move focus to the element
    Wrap(ElementId),
    /// Raise the container's cancellation signal
    Cancel,
    /// Leave the event alone
    PassThrough,
}

/// Decide how a trap with focus order `order` handles `event`
pub fn trap_action(order: &[ElementId], active: Option<ElementId>, event: &KeyEvent) -> TrapAction {
    match event.key.as_str() {
        "Escape" | "Esc" => TrapAction::Cancel,
        "Tab" => {
            let (Some(&first), Some(&last)) = (order.first(), order.last()) else {
                return TrapAction::PassThrough;
            };
            match active {
                Some(current) if event.shift && current == first => TrapAction::Wrap(last),
                Some(current) if !event.shift && current == last => TrapAction::Wrap(first),
                _ => TrapAction::PassThrough,
            }
        }
        _ => TrapAction::PassThrough,
    }
}

/// Whether an element is reachable with Tab
pub fn is_tabbable(host: &dyn Host, id: ElementId) -> bool {
    let Some(el) = host.element(id) else {
        return false;
    };
    if el.has_attribute("disabled") {
        return false;
    }

    let tab_index = el.attribute("tabindex").and_then(TabIndex::parse);
    if tab_index == Some(TabIndex::NotFocusable) {
        return false;
    }

    let natural = match el.tag.as_str() {
        "a" | "area" => el.has_attribute("href"),
        "button" | "select" | "textarea" => true,
        "input" => !el.attribute("type").is_some_and(|t| t.eq_ignore_ascii_case("hidden")),
        _ => false,
    };
    let editable = el
        .attribute("contenteditable")
        .is_some_and(|v| !v.trim().eq_ignore_ascii_case("false"));

    if !(natural || editable || tab_index.is_some_and(|t| t.is_focusable())) {
        return false;
    }
    VisibilityClassifier::is_perceivable(host, id)
}

/// Installs focus traps
pub struct FocusTrapController {
    host: Rc<dyn Host>,
}

impl FocusTrapController {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host }
    }

    /// Tab-reachable descendants of `container`, in document order
    pub fn focusable_elements(&self, container: ElementId) -> Vec<ElementId> {
        focusable_elements(self.host.as_ref(), container)
    }

    /// Whether any trap on this host is installed on `container`
    pub fn is_trapped(&self, container: ElementId) -> bool {
        self.host.element(container).is_some_and(|el| el.has_attribute(TRAP_MARKER))
    }

    /// Trap focus inside `container`
    ///
    /// Fails with [`A11yError::TrapAlreadyActive`] if the container already
    /// has a live trap, including one installed by another controller.
    /// Without a document this returns an inert trap.
    pub fn install(&self, container: ElementId) -> Result<FocusTrap> {
        if self.is_trapped(container) {
            return Err(A11yError::TrapAlreadyActive(container));
        }

        if !self.host.is_available() {
            tracing::debug!(container = %container, "no document, focus trap is inert");
            return Ok(FocusTrap {
                host: self.host.clone(),
                container,
                order: Rc::new(RefCell::new(Vec::new())),
                listener: None,
            });
        }

        let order = Rc::new(RefCell::new(self.focusable_elements(container)));

        {
            let order = order.borrow();
            let focus_inside = self
                .host
                .active_element()
                .is_some_and(|el| self.host.contains(container, el));
            match order.first() {
                Some(&first) if !focus_inside => self.host.focus(first),
                Some(_) => {}
                None => {
                    tracing::debug!(container = %container, "focus trap has no focusable elements");
                }
            }
        }

        let weak_host = Rc::downgrade(&self.host);
        let listener_order = order.clone();
        let listener: KeyListener = Rc::new(move |event: &KeyEvent| {
            let Some(host) = weak_host.upgrade() else {
                return;
            };
            let action = trap_action(&listener_order.borrow(), host.active_element(), event);
            tracing::trace!(container = %container, key = %event.key, ?action, "focus trap key");
            match action {
                TrapAction::Wrap(target) => {
                    event.prevent_default();
                    host.focus(target);
                }
                TrapAction::Cancel => host.dispatch_cancel(container),
                TrapAction::PassThrough => {}
            }
        });
        let listener = self.host.add_key_listener(container, listener);

        self.host.set_attribute(container, TRAP_MARKER, "");
        tracing::debug!(container = %container, elements = order.borrow().len(), "focus trap installed");

        Ok(FocusTrap {
            host: self.host.clone(),
            container,
            order,
            listener: Some(listener),
        })
    }
}

impl std::fmt::Debug for FocusTrapController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusTrapController").finish_non_exhaustive()
    }
}

fn focusable_elements(host: &dyn Host, container: ElementId) -> Vec<ElementId> {
    host.query_focusable(container)
        .into_iter()
        .filter(|&id| id != container && is_tabbable(host, id))
        .collect()
}

/// An installed focus trap; disposing (or dropping) removes it
#[must_use = "dropping a FocusTrap removes the trap immediately"]
pub struct FocusTrap {
    host: Rc<dyn Host>,
    container: ElementId,
    order: Rc<RefCell<Vec<ElementId>>>,
    listener: Option<ListenerId>,
}

impl FocusTrap {
    pub fn container(&self) -> ElementId {
        self.container
    }

    /// Focus order captured at install (or last refresh)
    pub fn elements(&self) -> Vec<ElementId> {
        self.order.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    /// Recompute the focus order after the container's content changed
    pub fn refresh(&self) {
        if self.listener.is_none() {
            return;
        }
        *self.order.borrow_mut() = focusable_elements(self.host.as_ref(), self.container);
    }

    /// Remove the trap
    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        self.host.remove_key_listener(self.container, listener);
        self.host.remove_attribute(self.container, TRAP_MARKER);
        tracing::debug!(container = %self.container, "focus trap disposed");
    }
}

impl Drop for FocusTrap {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for FocusTrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusTrap")
            .field("container", &self.container)
            .field("order", &self.order.borrow())
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}
