//! Visibility Classification
//!
//! Decides whether a single element is perceivable by assistive technology.
//!
//! Only the element itself is inspected. A visible element inside a
//! `display: none` ancestor is still reported perceivable; callers that
//! need ancestor-aware visibility walk the parent chain themselves.

use crate::host::{ComputedStyle, ElementId, ElementSnapshot, Host};

/// Why an element is hidden from assistive technology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenReason {
    /// `display: none`
    DisplayNone,
    /// `visibility: hidden`
    VisibilityHidden,
    /// opacity resolves to 0
    Transparent,
    /// `hidden` attribute
    HiddenAttribute,
    /// `aria-hidden="true"`
    AriaHidden,
    /// Host does not know the element
    Unknown,
}

/// Visibility classifier
#[derive(Debug)]
pub struct VisibilityClassifier;

impl VisibilityClassifier {
    /// First rule that hides the element, if any
    ///
    /// A missing computed style (detached element) only skips the style
    /// rules; attribute markers still apply.
    pub fn hidden_reason(element: &ElementSnapshot, style: Option<&ComputedStyle>) -> Option<HiddenReason> {
        if let Some(style) = style {
            if style.display.trim().eq_ignore_ascii_case("none") {
                return Some(HiddenReason::DisplayNone);
            }
            if style.visibility.trim().eq_ignore_ascii_case("hidden") {
                return Some(HiddenReason::VisibilityHidden);
            }
            if opacity_is_zero(&style.opacity) {
                return Some(HiddenReason::Transparent);
            }
        }

        if element.has_attribute("hidden") {
            return Some(HiddenReason::HiddenAttribute);
        }
        if element
            .attribute("aria-hidden")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
        {
            return Some(HiddenReason::AriaHidden);
        }

        None
    }

    /// Whether the element is perceivable, reading state from the host
    pub fn is_perceivable(host: &dyn Host, id: ElementId) -> bool {
        let reason = match host.element(id) {
            Some(element) => Self::hidden_reason(&element, host.computed_style(id).as_ref()),
            None => Some(HiddenReason::Unknown),
        };
        if let Some(reason) = reason {
            tracing::trace!(element = %id, ?reason, "element not perceivable");
        }
        reason.is_none()
    }
}

fn opacity_is_zero(opacity: &str) -> bool {
    let opacity = opacity.trim();
    let value = match opacity.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().map(|p| p / 100.0),
        None => opacity.parse::<f64>(),
    };
    // Out-of-range values clamp, so anything <= 0 renders transparent
    value.is_ok_and(|v| v <= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(display: &str, visibility: &str, opacity: &str) -> ComputedStyle {
        ComputedStyle { display: display.into(), visibility: visibility.into(), opacity: opacity.into() }
    }

    #[test]
    fn test_visible_element() {
        let el = ElementSnapshot::new("button");
        assert_eq!(VisibilityClassifier::hidden_reason(&el, Some(&ComputedStyle::default())), None);
    }

    #[test]
    fn test_style_rules() {
        let el = ElementSnapshot::new("div");
        assert_eq!(
            VisibilityClassifier::hidden_reason(&el, Some(&style("none", "visible", "1"))),
            Some(HiddenReason::DisplayNone)
        );
        assert_eq!(
            VisibilityClassifier::hidden_reason(&el, Some(&style("block", "hidden", "1"))),
            Some(HiddenReason::VisibilityHidden)
        );
        for opacity in ["0", "0.0", " 0 ", "0%", "-1"] {
            assert_eq!(
                VisibilityClassifier::hidden_reason(&el, Some(&style("block", "visible", opacity))),
                Some(HiddenReason::Transparent),
                "opacity {opacity:?}"
            );
        }
        assert_eq!(VisibilityClassifier::hidden_reason(&el, Some(&style("block", "visible", "0.01"))), None);
        assert_eq!(VisibilityClassifier::hidden_reason(&el, Some(&style("inline", "collapse", ""))), None);
    }

    #[test]
    fn test_attribute_markers() {
        let hidden = ElementSnapshot::new("div").with_attribute("hidden", "");
        assert_eq!(VisibilityClassifier::hidden_reason(&hidden, None), Some(HiddenReason::HiddenAttribute));

        let aria = ElementSnapshot::new("div").with_attribute("aria-hidden", "true");
        assert_eq!(
            VisibilityClassifier::hidden_reason(&aria, Some(&ComputedStyle::default())),
            Some(HiddenReason::AriaHidden)
        );

        let aria_false = ElementSnapshot::new("div").with_attribute("aria-hidden", "false");
        assert_eq!(VisibilityClassifier::hidden_reason(&aria_false, None), None);
    }
}
