//! Live Announcer
//!
//! Sends short messages to assistive technology through one persistent,
//! visually hidden live region.
//!
//! Each announcement clears the region, waits the relay delay, then writes
//! the message so screen readers see two distinct mutations (and re-read a
//! message identical to the previous one). An optional auto-clear follows.
//!
//! Only the latest announcement may touch the region: pending timers from
//! earlier calls are cancelled, and every callback also checks that its
//! generation is still current before writing.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::config::RuntimeConfig;
use crate::host::{ElementId, Host, TimerId};

/// Visually hidden, still exposed to assistive technology
const OFFSCREEN_STYLE: &str = "position:absolute;width:1px;height:1px;padding:0;margin:-1px;\
overflow:hidden;clip:rect(0,0,0,0);white-space:nowrap;border:0";

/// Live region politeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Politeness {
    #[default]
    Polite,
    Assertive,
}

impl Politeness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polite => "polite",
            Self::Assertive => "assertive",
        }
    }
}

#[derive(Debug, Default)]
struct AnnouncerState {
    region: Option<ElementId>,
    generation: u64,
    pending_relay: Option<TimerId>,
    pending_clear: Option<TimerId>,
    /// Set once the host reported no document; later calls are silent no-ops
    unavailable: bool,
}

impl AnnouncerState {
    fn cancel_pending(&mut self, host: &dyn Host) {
        if let Some(id) = self.pending_relay.take() {
            host.cancel_timer(id);
        }
        if let Some(id) = self.pending_clear.take() {
            host.cancel_timer(id);
        }
    }
}

/// Live region announcer
pub struct LiveAnnouncer {
    host: Rc<dyn Host>,
    config: RuntimeConfig,
    state: Rc<RefCell<AnnouncerState>>,
}

impl LiveAnnouncer {
    pub fn new(host: Rc<dyn Host>, config: RuntimeConfig) -> Self {
        Self { host, config, state: Rc::new(RefCell::new(AnnouncerState::default())) }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Live region element, once created
    pub fn region(&self) -> Option<ElementId> {
        self.state.borrow().region
    }

    /// Polite announcement with the configured auto-clear timeout
    pub fn announce_polite(&self, message: &str) {
        self.announce(message, Politeness::Polite, self.config.clear_timeout());
    }

    /// Announce `message`; a zero `timeout` leaves it in place until replaced
    pub fn announce(&self, message: &str, politeness: Politeness, timeout: Duration) {
        let mut state = self.state.borrow_mut();
        let Some(region) = self.ensure_region(&mut state) else {
            return;
        };

        state.cancel_pending(self.host.as_ref());
        state.generation += 1;
        let generation = state.generation;

        self.host.set_text_content(region, "");
        tracing::debug!(region = %region, politeness = politeness.as_str(), generation, "announce: {}", message);

        let relay = Relay {
            host: Rc::downgrade(&self.host),
            state: Rc::downgrade(&self.state),
            region,
            generation,
            politeness,
            message: message.to_string(),
            clear_after: timeout.saturating_sub(self.config.relay_delay()),
            auto_clear: !timeout.is_zero(),
        };
        drop(state);

        let timer = self.host.schedule_timer(self.config.relay_delay(), Box::new(move || relay.fire()));
        let mut state = self.state.borrow_mut();
        if state.generation == generation {
            state.pending_relay = Some(timer);
        }
    }

    /// Clear the region now and drop anything still scheduled
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.cancel_pending(self.host.as_ref());
        state.generation += 1;
        if let Some(region) = state.region {
            self.host.set_text_content(region, "");
        }
    }

    /// Remove the live region; the next announcement creates a fresh one
    pub fn teardown(&self) {
        let mut state = self.state.borrow_mut();
        state.cancel_pending(self.host.as_ref());
        state.generation += 1;
        if let Some(region) = state.region.take() {
            tracing::debug!(region = %region, "removing live region");
            self.host.remove_element(region);
        }
    }

    fn ensure_region(&self, state: &mut AnnouncerState) -> Option<ElementId> {
        if state.region.is_some() || state.unavailable {
            return state.region;
        }

        match self.host.create_body_element("div") {
            Ok(region) => {
                self.host.set_attribute(region, "aria-live", Politeness::Polite.as_str());
                self.host.set_attribute(region, "aria-atomic", "true");
                self.host.set_attribute(region, "role", "status");
                self.host.set_attribute(region, "style", OFFSCREEN_STYLE);
                tracing::debug!(region = %region, "created live region");
                state.region = Some(region);
                Some(region)
            }
            Err(err) => {
                tracing::warn!("live announcements disabled: {}", err);
                state.unavailable = true;
                None
            }
        }
    }
}

impl std::fmt::Debug for LiveAnnouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveAnnouncer")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Deferred write of one announcement
struct Relay {
    host: Weak<dyn Host>,
    state: Weak<RefCell<AnnouncerState>>,
    region: ElementId,
    generation: u64,
    politeness: Politeness,
    message: String,
    clear_after: Duration,
    auto_clear: bool,
}

impl Relay {
    fn fire(self) {
        let (Some(host), Some(state)) = (self.host.upgrade(), self.state.upgrade()) else {
            return;
        };
        {
            let mut st = state.borrow_mut();
            if st.generation != self.generation || st.region != Some(self.region) {
                return;
            }
            st.pending_relay = None;
        }

        host.set_attribute(self.region, "aria-live", self.politeness.as_str());
        host.set_text_content(self.region, &self.message);

        if !self.auto_clear {
            return;
        }
        let weak_host = self.host.clone();
        let weak_state = self.state.clone();
        let (region, generation) = (self.region, self.generation);
        let timer = host.schedule_timer(
            self.clear_after,
            Box::new(move || auto_clear(weak_host, weak_state, region, generation)),
        );
        let mut st = state.borrow_mut();
        if st.generation == generation && st.region == Some(region) {
            st.pending_clear = Some(timer);
        }
    }
}

fn auto_clear(host: Weak<dyn Host>, state: Weak<RefCell<AnnouncerState>>, region: ElementId, generation: u64) {
    let (Some(host), Some(state)) = (host.upgrade(), state.upgrade()) else {
        return;
    };
    {
        let mut st = state.borrow_mut();
        if st.generation != generation || st.region != Some(region) {
            return;
        }
        st.pending_clear = None;
    }
    host.set_text_content(region, "");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{
        ComputedStyle, ElementSnapshot, KeyListener, ListenerId, NullHost, TimerCallback,
    };
    use crate::sim::SimHost;
    use crate::Result;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_region_created_lazily() {
        let host = SimHost::new();
        let announcer = LiveAnnouncer::new(host.clone(), RuntimeConfig::default());
        assert!(announcer.region().is_none());

        announcer.announce_polite("Saved");
        let region = announcer.region().unwrap();
        assert_eq!(host.attribute(region, "aria-atomic").as_deref(), Some("true"));
        assert_eq!(host.attribute(region, "role").as_deref(), Some("status"));

        announcer.announce_polite("Saved again");
        assert_eq!(announcer.region(), Some(region));
    }

    #[test]
    fn test_clear_then_relay() {
        let host = SimHost::new();
        let announcer = LiveAnnouncer::new(host.clone(), RuntimeConfig::default());

        announcer.announce("Loading", Politeness::Assertive, Duration::ZERO);
        let region = announcer.region().unwrap();
        assert_eq!(host.text(region), "");

        host.advance(ms(99));
        assert_eq!(host.text(region), "");
        host.advance(ms(1));
        assert_eq!(host.text(region), "Loading");
        assert_eq!(host.attribute(region, "aria-live").as_deref(), Some("assertive"));

        // Zero timeout never clears
        host.advance(Duration::from_secs(60));
        assert_eq!(host.text(region), "Loading");
    }

    #[test]
    fn test_identical_message_is_cleared_first() {
        let host = SimHost::new();
        let announcer = LiveAnnouncer::new(host.clone(), RuntimeConfig::default());

        announcer.announce("Item added", Politeness::Polite, Duration::ZERO);
        host.advance(ms(100));
        let region = announcer.region().unwrap();
        assert_eq!(host.text(region), "Item added");

        announcer.announce("Item added", Politeness::Polite, Duration::ZERO);
        assert_eq!(host.text(region), "");
        host.advance(ms(100));
        assert_eq!(host.text(region), "Item added");
    }

    #[test]
    fn test_auto_clear() {
        let host = SimHost::new();
        let announcer = LiveAnnouncer::new(host.clone(), RuntimeConfig::default());

        announcer.announce("Done", Politeness::Polite, ms(1000));
        let region = announcer.region().unwrap();
        host.advance(ms(999));
        assert_eq!(host.text(region), "Done");
        host.advance(ms(1));
        assert_eq!(host.text(region), "");
    }

    #[test]
    fn test_timeout_shorter_than_relay_still_clears() {
        let host = SimHost::new();
        let announcer = LiveAnnouncer::new(host.clone(), RuntimeConfig::default());

        announcer.announce("Blink", Politeness::Polite, ms(10));
        let region = announcer.region().unwrap();
        host.advance(ms(100));
        assert_eq!(host.text(region), "");
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn test_newer_announcement_supersedes_relay() {
        let host = SimHost::new();
        let announcer = LiveAnnouncer::new(host.clone(), RuntimeConfig::default());

        announcer.announce("A", Politeness::Polite, ms(1000));
        host.advance(ms(50));
        announcer.announce("B", Politeness::Polite, ms(1000));
        let region = announcer.region().unwrap();

        for _ in 0..20 {
            host.advance(ms(10));
            assert_ne!(host.text(region), "A");
        }
        assert_eq!(host.text(region), "B");
    }

    #[test]
    fn test_clear_cancels_pending() {
        let host = SimHost::new();
        let announcer = LiveAnnouncer::new(host.clone(), RuntimeConfig::default());

        announcer.announce("Pending", Politeness::Polite, ms(1000));
        announcer.clear();
        assert_eq!(host.pending_timers(), 0);
        host.advance(ms(200));
        assert_eq!(host.text(announcer.region().unwrap()), "");
    }

    #[test]
    fn test_teardown_recreates_region() {
        let host = SimHost::new();
        let announcer = LiveAnnouncer::new(host.clone(), RuntimeConfig::immediate());

        announcer.announce_polite("One");
        let first = announcer.region().unwrap();
        announcer.teardown();
        assert!(announcer.region().is_none());
        assert!(!host.is_attached(first));

        announcer.announce_polite("Two");
        let second = announcer.region().unwrap();
        assert_ne!(first, second);
        host.advance(Duration::ZERO);
        assert_eq!(host.text(second), "Two");
    }

    /// Runs zero-delay timers before `schedule_timer` returns
    struct InlineTimers(Rc<SimHost>);

    impl Host for InlineTimers {
        fn query_focusable(&self, container: ElementId) -> Vec<ElementId> { self.0.query_focusable(container) }
        fn element(&self, id: ElementId) -> Option<ElementSnapshot> { self.0.element(id) }
        fn computed_style(&self, id: ElementId) -> Option<ComputedStyle> { self.0.computed_style(id) }
        fn contains(&self, container: ElementId, id: ElementId) -> bool { self.0.contains(container, id) }
        fn active_element(&self) -> Option<ElementId> { self.0.active_element() }
        fn focus(&self, id: ElementId) { self.0.focus(id) }
        fn create_body_element(&self, tag: &str) -> Result<ElementId> { self.0.create_body_element(tag) }
        fn remove_element(&self, id: ElementId) { self.0.remove_element(id) }
        fn set_attribute(&self, id: ElementId, name: &str, value: &str) { self.0.set_attribute(id, name, value) }
        fn remove_attribute(&self, id: ElementId, name: &str) { self.0.remove_attribute(id, name) }
        fn set_text_content(&self, id: ElementId, text: &str) { self.0.set_text_content(id, text) }
        fn add_key_listener(&self, target: ElementId, listener: KeyListener) -> ListenerId {
            self.0.add_key_listener(target, listener)
        }
        fn remove_key_listener(&self, target: ElementId, id: ListenerId) { self.0.remove_key_listener(target, id) }
        fn dispatch_cancel(&self, target: ElementId) { self.0.dispatch_cancel(target) }
        fn media_matches(&self, query: &str) -> Option<bool> { self.0.media_matches(query) }
        fn schedule_timer(&self, delay: Duration, callback: TimerCallback) -> TimerId {
            if delay.is_zero() {
                callback();
                TimerId(0)
            } else {
                self.0.schedule_timer(delay, callback)
            }
        }
        fn cancel_timer(&self, id: TimerId) { self.0.cancel_timer(id) }
    }

    #[test]
    fn test_host_running_timers_inline() {
        let sim = SimHost::new();
        let announcer = LiveAnnouncer::new(Rc::new(InlineTimers(sim.clone())), RuntimeConfig::immediate());

        announcer.announce("Now", Politeness::Assertive, ms(500));
        let region = announcer.region().unwrap();
        assert_eq!(sim.text(region), "Now");
        assert_eq!(sim.attribute(region, "aria-live").as_deref(), Some("assertive"));

        announcer.announce("Later", Politeness::Polite, ms(500));
        assert_eq!(sim.text(region), "Later");
        assert_eq!(sim.pending_timers(), 1);

        sim.advance(ms(500));
        assert_eq!(sim.text(region), "");
        announcer.clear();
        announcer.teardown();
        assert!(!sim.is_attached(region));
    }

    #[test]
    fn test_unavailable_environment_is_noop() {
        let announcer = LiveAnnouncer::new(Rc::new(NullHost::new()), RuntimeConfig::default());
        announcer.announce_polite("Nobody hears this");
        announcer.announce("Or this", Politeness::Assertive, ms(10));
        announcer.clear();
        announcer.teardown();
        assert!(announcer.region().is_none());
    }
}
