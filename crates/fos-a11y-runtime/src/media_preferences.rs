//! Media Preferences
//!
//! User preference media features (reduced motion, contrast, color scheme)
//! and a probe that reads them from the host on every call.

use std::rc::Rc;

use crate::host::Host;

/// prefers-color-scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    Light,
    Dark,
    #[default]
    NoPreference,
}

impl ColorScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::NoPreference => "no-preference",
        }
    }
}

/// prefers-contrast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContrastPreference {
    #[default]
    NoPreference,
    More,
    Less,
    Custom,
}

/// Combined media preferences
#[derive(Debug, Clone, Default)]
pub struct MediaPreferences {
    /// prefers-reduced-motion
    pub reduced_motion: bool,
    /// prefers-contrast
    pub contrast: ContrastPreference,
    /// forced-colors
    pub forced_colors: bool,
    /// prefers-color-scheme
    pub color_scheme: ColorScheme,
}

impl MediaPreferences {
    pub fn new() -> Self { Self::default() }

    /// Evaluate a single `(feature: value)` media query
    ///
    /// Unknown features and malformed queries never match.
    pub fn matches(&self, query: &str) -> bool {
        let Some((feature, value)) = parse_feature(query) else {
            return false;
        };

        match (feature.as_str(), value.as_str()) {
            ("prefers-reduced-motion", "reduce") => self.reduced_motion,
            ("prefers-reduced-motion", "no-preference") => !self.reduced_motion,

            ("prefers-contrast", "more") => self.contrast == ContrastPreference::More,
            ("prefers-contrast", "less") => self.contrast == ContrastPreference::Less,
            ("prefers-contrast", "custom") => self.contrast == ContrastPreference::Custom,
            ("prefers-contrast", "no-preference") => self.contrast == ContrastPreference::NoPreference,

            ("forced-colors", "active") => self.forced_colors,
            ("forced-colors", "none") => !self.forced_colors,

            ("prefers-color-scheme", "dark") => self.color_scheme == ColorScheme::Dark,
            ("prefers-color-scheme", "light") => self.color_scheme == ColorScheme::Light,

            _ => false,
        }
    }
}

/// Split `(feature: value)` into lowercase parts
fn parse_feature(query: &str) -> Option<(String, String)> {
    let inner = query.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (feature, value) = inner.split_once(':')?;
    let feature = feature.trim().to_ascii_lowercase();
    let value = value.trim().to_ascii_lowercase();
    if feature.is_empty() || value.is_empty() {
        return None;
    }
    Some((feature, value))
}

/// Read-only preference queries against the host
///
/// Nothing is cached: the user can flip an OS setting at any time.
#[derive(Clone)]
pub struct PreferenceProbe {
    host: Rc<dyn Host>,
}

impl PreferenceProbe {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host }
    }

    fn query(&self, query: &str) -> bool {
        self.host.media_matches(query).unwrap_or(false)
    }

    pub fn prefers_reduced_motion(&self) -> bool {
        self.query("(prefers-reduced-motion: reduce)")
    }

    /// `prefers-contrast: more`, or forced colors in effect
    pub fn prefers_high_contrast(&self) -> bool {
        self.query("(prefers-contrast: more)") || self.prefers_forced_colors()
    }

    pub fn prefers_forced_colors(&self) -> bool {
        self.query("(forced-colors: active)")
    }

    pub fn color_scheme_preference(&self) -> ColorScheme {
        if self.query("(prefers-color-scheme: dark)") {
            ColorScheme::Dark
        } else if self.query("(prefers-color-scheme: light)") {
            ColorScheme::Light
        } else {
            ColorScheme::NoPreference
        }
    }

    /// Current preferences in one read
    pub fn snapshot(&self) -> MediaPreferences {
        let contrast = if self.query("(prefers-contrast: more)") {
            ContrastPreference::More
        } else if self.query("(prefers-contrast: less)") {
            ContrastPreference::Less
        } else if self.query("(prefers-contrast: custom)") {
            ContrastPreference::Custom
        } else {
            ContrastPreference::NoPreference
        };

        MediaPreferences {
            reduced_motion: self.prefers_reduced_motion(),
            contrast,
            forced_colors: self.prefers_forced_colors(),
            color_scheme: self.color_scheme_preference(),
        }
    }
}

impl std::fmt::Debug for PreferenceProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceProbe").finish_non_exhaustive()
    }
}
