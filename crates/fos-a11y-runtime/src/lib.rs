//! fOS Accessibility Runtime
//!
//! In-page accessibility helpers for fOS hosts.
//!
//! Features:
//! - WCAG contrast checking (relative luminance, AA/AAA thresholds)
//! - Visibility classification for assistive technology
//! - Media preference probing (reduced motion, contrast, color scheme)
//! - Live announcements through a single persistent live region
//! - Focus traps for dialogs, menus and drawers
//!
//! Everything runs on the host's UI thread. The host environment is
//! reached only through the [`Host`] capability trait, so the runtime
//! can be driven by a real document or by [`sim::SimHost`] in tests.

pub mod color;
pub mod config;
pub mod contrast;
pub mod host;
pub mod visibility;
pub mod media_preferences;
pub mod announcer;
pub mod focus_trap;
pub mod runtime;
pub mod sim;

pub use color::{Color, linearize, luminance};
pub use config::RuntimeConfig;
pub use contrast::{ContrastChecker, ContrastResult, TextSize};
pub use host::{
    ComputedStyle, ElementId, ElementSnapshot, Host, KeyEvent, KeyListener, ListenerId,
    NullHost, TimerCallback, TimerId,
};
pub use visibility::{HiddenReason, VisibilityClassifier};
pub use media_preferences::{ColorScheme, ContrastPreference, MediaPreferences, PreferenceProbe};
pub use announcer::{LiveAnnouncer, Politeness};
pub use focus_trap::{FocusTrap, FocusTrapController, TabIndex, TrapAction};
pub use runtime::{A11yRuntime, announce, with_runtime};

/// Accessibility runtime error
#[derive(Debug, thiserror::Error)]
pub enum A11yError {
    #[error("Invalid color format: {0:?} (expected 6 hex digits)")]
    InvalidColorFormat(String),

    #[error("No document environment available")]
    EnvironmentUnavailable,

    #[error("Focus trap already active on element {0}")]
    TrapAlreadyActive(ElementId),

    #[error("Invalid runtime configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias for runtime operations
pub type Result<T> = std::result::Result<T, A11yError>;
