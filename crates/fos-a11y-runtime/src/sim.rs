//! Simulated Host
//!
//! In-memory document with a virtual clock, for tests and headless use.
//!
//! - Elements live in an arena; element 0 is `<body>`.
//! - Timers only fire from [`SimHost::advance`], in due-time order
//!   (ties in scheduling order).
//! - Key presses go to the focused element and bubble to the body.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::host::{
    ComputedStyle, ElementId, ElementSnapshot, Host, KeyEvent, KeyListener, ListenerId,
    TimerCallback, TimerId,
};
use crate::media_preferences::MediaPreferences;
use crate::Result;

/// Elements matched by the focusable candidate query
fn matches_focusable_selector(node: &SimNode) -> bool {
    let attr = |name: &str| node.attributes.contains_key(name);
    match node.tag.as_str() {
        "a" | "area" if attr("href") => true,
        "button" | "select" | "textarea" => true,
        "input" => node.attributes.get("type").is_none_or(|t| !t.eq_ignore_ascii_case("hidden")),
        _ => attr("tabindex") || attr("contenteditable"),
    }
}

#[derive(Debug)]
struct SimNode {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attributes: HashMap<String, String>,
    style: ComputedStyle,
    text: String,
    attached: bool,
}

impl SimNode {
    fn new(tag: &str, parent: Option<ElementId>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            parent,
            children: Vec::new(),
            attributes: HashMap::new(),
            style: ComputedStyle::default(),
            text: String::new(),
            attached: true,
        }
    }
}

struct PendingTimer {
    id: TimerId,
    due: Duration,
    seq: u64,
    callback: TimerCallback,
}

/// Simulated document host
pub struct SimHost {
    nodes: RefCell<Vec<SimNode>>,
    focused: Cell<Option<ElementId>>,
    listeners: RefCell<Vec<(ListenerId, ElementId, KeyListener)>>,
    timers: RefCell<Vec<PendingTimer>>,
    cancels: RefCell<Vec<ElementId>>,
    preferences: RefCell<MediaPreferences>,
    now: Cell<Duration>,
    next_id: Cell<u64>,
}

impl SimHost {
    /// New document containing only `<body>`
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            nodes: RefCell::new(vec![SimNode::new("body", None)]),
            focused: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
            timers: RefCell::new(Vec::new()),
            cancels: RefCell::new(Vec::new()),
            preferences: RefCell::new(MediaPreferences::default()),
            now: Cell::new(Duration::ZERO),
            next_id: Cell::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    pub fn body(&self) -> ElementId {
        ElementId(0)
    }

    /// Append a new `tag` element under `parent`
    pub fn append(&self, parent: ElementId, tag: &str) -> ElementId {
        let mut nodes = self.nodes.borrow_mut();
        let id = ElementId(nodes.len() as u64);
        let mut node = SimNode::new(tag, Some(parent));
        node.attached = nodes.get(parent.0 as usize).is_some_and(|p| p.attached);
        nodes.push(node);
        if let Some(p) = nodes.get_mut(parent.0 as usize) {
            p.children.push(id);
        }
        id
    }

    /// Set one computed style property (`display`, `visibility` or `opacity`)
    pub fn set_style(&self, id: ElementId, property: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let Some(node) = nodes.get_mut(id.0 as usize) else {
            return;
        };
        match property {
            "display" => node.style.display = value.into(),
            "visibility" => node.style.visibility = value.into(),
            "opacity" => node.style.opacity = value.into(),
            _ => {}
        }
    }

    pub fn attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.nodes.borrow().get(id.0 as usize)?.attributes.get(name).cloned()
    }

    pub fn text(&self, id: ElementId) -> String {
        self.nodes.borrow().get(id.0 as usize).map(|n| n.text.clone()).unwrap_or_default()
    }

    pub fn is_attached(&self, id: ElementId) -> bool {
        self.nodes.borrow().get(id.0 as usize).is_some_and(|n| n.attached)
    }

    pub fn set_preferences(&self, preferences: MediaPreferences) {
        *self.preferences.borrow_mut() = preferences;
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn listener_count(&self, target: ElementId) -> usize {
        self.listeners.borrow().iter().filter(|(_, t, _)| *t == target).count()
    }

    /// Containers that raised a cancellation signal, oldest first
    pub fn cancel_events(&self) -> Vec<ElementId> {
        self.cancels.borrow().clone()
    }

    /// Move the clock forward, firing every timer due on the way
    pub fn advance(&self, by: Duration) {
        let target = self.now.get() + by;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.seq))
                    .map(|(i, _)| i);
                due.map(|i| timers.swap_remove(i))
            };
            let Some(timer) = next else {
                break;
            };
            self.now.set(timer.due.max(self.now.get()));
            (timer.callback)();
        }
        self.now.set(target);
    }

    /// Dispatch a keydown to the focused element (or body), bubbling up
    ///
    /// Returns whether a listener called `prevent_default`.
    pub fn press(&self, event: KeyEvent) -> bool {
        let mut path = Vec::new();
        let mut current = Some(self.focused.get().unwrap_or(self.body()));
        while let Some(id) = current {
            path.push(id);
            current = self.nodes.borrow().get(id.0 as usize).and_then(|n| n.parent);
        }

        for target in path {
            let handlers: Vec<KeyListener> = self
                .listeners
                .borrow()
                .iter()
                .filter(|(_, t, _)| *t == target)
                .map(|(_, _, l)| l.clone())
                .collect();
            for handler in handlers {
                handler(&event);
            }
        }
        event.default_prevented()
    }

    pub fn press_key(&self, key: &str) -> bool {
        self.press(KeyEvent::new(key))
    }

    fn descendants(&self, root: ElementId, out: &mut Vec<ElementId>) {
        let children = match self.nodes.borrow().get(root.0 as usize) {
            Some(node) => node.children.clone(),
            None => return,
        };
        for child in children {
            out.push(child);
            self.descendants(child, out);
        }
    }
}

impl Host for SimHost {
    fn query_focusable(&self, container: ElementId) -> Vec<ElementId> {
        let mut all = Vec::new();
        self.descendants(container, &mut all);
        let nodes = self.nodes.borrow();
        all.into_iter()
            .filter(|id| nodes.get(id.0 as usize).is_some_and(|n| n.attached && matches_focusable_selector(n)))
            .collect()
    }

    fn element(&self, id: ElementId) -> Option<ElementSnapshot> {
        let nodes = self.nodes.borrow();
        let node = nodes.get(id.0 as usize)?;
        Some(ElementSnapshot { tag: node.tag.clone(), attributes: node.attributes.clone() })
    }

    fn computed_style(&self, id: ElementId) -> Option<ComputedStyle> {
        let nodes = self.nodes.borrow();
        let node = nodes.get(id.0 as usize)?;
        node.attached.then(|| node.style.clone())
    }

    fn contains(&self, container: ElementId, id: ElementId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(id);
        while let Some(el) = current {
            if el == container {
                return true;
            }
            current = nodes.get(el.0 as usize).and_then(|n| n.parent);
        }
        false
    }

    fn active_element(&self) -> Option<ElementId> {
        self.focused.get()
    }

    fn focus(&self, id: ElementId) {
        if self.is_attached(id) {
            self.focused.set(Some(id));
        }
    }

    fn create_body_element(&self, tag: &str) -> Result<ElementId> {
        Ok(self.append(self.body(), tag))
    }

    fn remove_element(&self, id: ElementId) {
        let mut subtree = vec![id];
        self.descendants(id, &mut subtree);

        let mut nodes = self.nodes.borrow_mut();
        let parent = nodes.get(id.0 as usize).and_then(|n| n.parent);
        if let Some(p) = parent.and_then(|p| nodes.get_mut(p.0 as usize)) {
            p.children.retain(|&c| c != id);
        }
        for el in &subtree {
            if let Some(node) = nodes.get_mut(el.0 as usize) {
                node.attached = false;
            }
        }
        if let Some(node) = nodes.get_mut(id.0 as usize) {
            node.parent = None;
        }
        drop(nodes);

        if self.focused.get().is_some_and(|f| subtree.contains(&f)) {
            self.focused.set(None);
        }
    }

    fn set_attribute(&self, id: ElementId, name: &str, value: &str) {
        if let Some(node) = self.nodes.borrow_mut().get_mut(id.0 as usize) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&self, id: ElementId, name: &str) {
        if let Some(node) = self.nodes.borrow_mut().get_mut(id.0 as usize) {
            node.attributes.remove(name);
        }
    }

    fn set_text_content(&self, id: ElementId, text: &str) {
        if let Some(node) = self.nodes.borrow_mut().get_mut(id.0 as usize) {
            node.text = text.to_string();
        }
    }

    fn add_key_listener(&self, target: ElementId, listener: KeyListener) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.borrow_mut().push((id, target, listener));
        id
    }

    fn remove_key_listener(&self, target: ElementId, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(l, t, _)| !(*l == id && *t == target));
    }

    fn dispatch_cancel(&self, target: ElementId) {
        self.cancels.borrow_mut().push(target);
    }

    fn media_matches(&self, query: &str) -> Option<bool> {
        Some(self.preferences.borrow().matches(query))
    }

    fn schedule_timer(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let seq = self.next_id();
        let id = TimerId(seq);
        self.timers.borrow_mut().push(PendingTimer { id, due: self.now.get() + delay, seq, callback });
        id
    }

    fn cancel_timer(&self, id: TimerId) {
        self.timers.borrow_mut().retain(|t| t.id != id);
    }
}

impl std::fmt::Debug for SimHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimHost")
            .field("nodes", &self.nodes.borrow().len())
            .field("focused", &self.focused.get())
            .field("timers", &self.timers.borrow().len())
            .field("now", &self.now.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_tree_and_contains() {
        let host = SimHost::new();
        let div = host.append(host.body(), "div");
        let button = host.append(div, "button");
        assert!(host.contains(div, button));
        assert!(host.contains(host.body(), button));
        assert!(!host.contains(button, div));
        assert_eq!(host.query_focusable(div), vec![button]);
    }

    #[test]
    fn test_timers_fire_in_order() {
        let host = SimHost::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, delay) in [("b", 20), ("a", 10), ("c", 20)] {
            let log = log.clone();
            host.schedule_timer(Duration::from_millis(delay), Box::new(move || log.borrow_mut().push(name)));
        }
        let cancelled = {
            let log = log.clone();
            host.schedule_timer(Duration::from_millis(5), Box::new(move || log.borrow_mut().push("x")))
        };
        host.cancel_timer(cancelled);

        host.advance(Duration::from_millis(15));
        assert_eq!(*log.borrow(), vec!["a"]);
        host.advance(Duration::from_millis(15));
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(host.now(), Duration::from_millis(30));
    }

    #[test]
    fn test_key_bubbling() {
        let host = SimHost::new();
        let div = host.append(host.body(), "div");
        let button = host.append(div, "button");
        host.focus(button);

        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        host.add_key_listener(div, Rc::new(move |event: &KeyEvent| {
            counter.set(counter.get() + 1);
            event.prevent_default();
        }));

        assert!(host.press_key("Tab"));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_remove_element_detaches_subtree() {
        let host = SimHost::new();
        let div = host.append(host.body(), "div");
        let button = host.append(div, "button");
        host.focus(button);
        host.remove_element(div);
        assert!(!host.is_attached(button));
        assert_eq!(host.active_element(), None);
        assert!(host.query_focusable(host.body()).is_empty());
    }
}
