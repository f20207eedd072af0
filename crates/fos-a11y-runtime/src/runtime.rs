//! Runtime Lifecycle
//!
//! Bundles the stateful components over one host and keeps a per-UI-thread
//! instance for application code that has no handle to pass around.
//!
//! Lifecycle: [`A11yRuntime::install`] once at application start,
//! [`with_runtime`] from anywhere on the UI thread, and
//! [`A11yRuntime::shutdown`] at exit (or just let the thread end; the live
//! region is cheap to abandon).

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::announcer::{LiveAnnouncer, Politeness};
use crate::config::RuntimeConfig;
use crate::focus_trap::{FocusTrap, FocusTrapController};
use crate::host::{ElementId, Host};
use crate::media_preferences::PreferenceProbe;
use crate::visibility::VisibilityClassifier;
use crate::Result;

thread_local! {
    static RUNTIME: RefCell<Option<Rc<A11yRuntime>>> = const { RefCell::new(None) };
}

/// Accessibility runtime bound to one host
pub struct A11yRuntime {
    announcer: LiveAnnouncer,
    focus_traps: FocusTrapController,
    preferences: PreferenceProbe,
    host: Rc<dyn Host>,
}

impl A11yRuntime {
    pub fn new(host: Rc<dyn Host>, config: RuntimeConfig) -> Self {
        Self {
            announcer: LiveAnnouncer::new(host.clone(), config),
            focus_traps: FocusTrapController::new(host.clone()),
            preferences: PreferenceProbe::new(host.clone()),
            host,
        }
    }

    /// Make a runtime current for this thread, replacing any previous one
    pub fn install(host: Rc<dyn Host>, config: RuntimeConfig) -> Rc<Self> {
        let runtime = Rc::new(Self::new(host, config));
        let previous = RUNTIME.with(|slot| slot.borrow_mut().replace(runtime.clone()));
        if let Some(previous) = previous {
            previous.announcer.teardown();
        }
        tracing::debug!("accessibility runtime installed");
        runtime
    }

    /// Current runtime for this thread
    pub fn current() -> Option<Rc<Self>> {
        RUNTIME.with(|slot| slot.borrow().clone())
    }

    /// Drop the current runtime and remove its live region
    pub fn shutdown() {
        let previous = RUNTIME.with(|slot| slot.borrow_mut().take());
        if let Some(runtime) = previous {
            runtime.announcer.teardown();
            tracing::debug!("accessibility runtime shut down");
        }
    }

    pub fn announcer(&self) -> &LiveAnnouncer {
        &self.announcer
    }

    pub fn focus_traps(&self) -> &FocusTrapController {
        &self.focus_traps
    }

    pub fn preferences(&self) -> &PreferenceProbe {
        &self.preferences
    }

    pub fn announce(&self, message: &str, politeness: Politeness, timeout: Duration) {
        self.announcer.announce(message, politeness, timeout);
    }

    pub fn trap_focus(&self, container: ElementId) -> Result<FocusTrap> {
        self.focus_traps.install(container)
    }

    pub fn is_perceivable(&self, id: ElementId) -> bool {
        VisibilityClassifier::is_perceivable(self.host.as_ref(), id)
    }
}

impl std::fmt::Debug for A11yRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("A11yRuntime")
            .field("announcer", &self.announcer)
            .field("focus_traps", &self.focus_traps)
            .finish_non_exhaustive()
    }
}

/// Run `f` with the current runtime; `None` if none is installed
pub fn with_runtime<R>(f: impl FnOnce(&A11yRuntime) -> R) -> Option<R> {
    A11yRuntime::current().map(|runtime| f(&runtime))
}

/// Polite announcement through the current runtime, if any
pub fn announce(message: &str) {
    if with_runtime(|rt| rt.announcer().announce_polite(message)).is_none() {
        tracing::debug!("no accessibility runtime installed, dropping announcement");
    }
}
