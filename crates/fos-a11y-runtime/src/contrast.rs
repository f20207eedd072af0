//! Contrast Checking
//!
//! WCAG 2.x contrast ratio and AA/AAA classification.

use serde::Serialize;

use crate::color::Color;
use crate::Result;

/// Text size class used to pick WCAG thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSize {
    #[default]
    Normal,
    /// 18pt regular or 14pt bold and above
    Large,
}

/// Outcome of a contrast check
///
/// `ratio` is rounded to two decimals for display. The flags are computed
/// from the unrounded ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContrastResult {
    pub ratio: f64,
    #[serde(rename = "wcagAA")]
    pub wcag_aa: bool,
    #[serde(rename = "wcagAAA")]
    pub wcag_aaa: bool,
}

impl ContrastResult {
    /// Build a result from an exact ratio
    pub fn from_ratio(ratio: f64, size: TextSize) -> Self {
        Self {
            ratio: (ratio * 100.0).round() / 100.0,
            wcag_aa: ContrastChecker::meets_aa(ratio, size),
            wcag_aaa: ContrastChecker::meets_aaa(ratio, size),
        }
    }
}

/// Contrast checker
#[derive(Debug)]
pub struct ContrastChecker;

impl ContrastChecker {
    /// Contrast ratio between two relative luminances, always >= 1
    pub fn contrast_ratio(l1: f64, l2: f64) -> f64 {
        let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Contrast ratio between two colors (symmetric)
    pub fn ratio(fg: Color, bg: Color) -> f64 {
        Self::contrast_ratio(fg.luminance(), bg.luminance())
    }

    /// Check if contrast meets WCAG AA (4.5:1 normal, 3:1 large)
    pub fn meets_aa(ratio: f64, size: TextSize) -> bool {
        match size {
            TextSize::Normal => ratio >= 4.5,
            TextSize::Large => ratio >= 3.0,
        }
    }

    /// Check if contrast meets WCAG AAA (7:1 normal, 4.5:1 large)
    pub fn meets_aaa(ratio: f64, size: TextSize) -> bool {
        match size {
            TextSize::Normal => ratio >= 7.0,
            TextSize::Large => ratio >= 4.5,
        }
    }

    /// Classify a pair of parsed colors for normal text
    pub fn classify_colors(fg: Color, bg: Color) -> ContrastResult {
        ContrastResult::from_ratio(Self::ratio(fg, bg), TextSize::Normal)
    }

    /// Classify two hex colors for normal text
    pub fn classify(fg: &str, bg: &str) -> Result<ContrastResult> {
        Self::classify_for(fg, bg, TextSize::Normal)
    }

    /// Classify two hex colors for the given text size
    pub fn classify_for(fg: &str, bg: &str, size: TextSize) -> Result<ContrastResult> {
        let fg = Color::from_hex(fg)?;
        let bg = Color::from_hex(bg)?;
        Ok(ContrastResult::from_ratio(Self::ratio(fg, bg), size))
    }
}
