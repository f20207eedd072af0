//! Color Math
//!
//! sRGB parsing, gamma decoding and relative luminance.

use std::fmt;
use std::str::FromStr;

use crate::A11yError;

/// 8-bit sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `rrggbb` or `#rrggbb`.
    ///
    /// Exactly six hex digits are required. Shorthand (`#fff`), alpha
    /// and named colors are rejected rather than guessed at.
    pub fn from_hex(input: &str) -> Result<Self, A11yError> {
        let digits = input.strip_prefix('#').unwrap_or(input);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(A11yError::InvalidColorFormat(input.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| A11yError::InvalidColorFormat(input.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Relative luminance of this color
    pub fn luminance(&self) -> f64 {
        luminance(*self)
    }
}

impl FromStr for Color {
    type Err = A11yError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// sRGB channel (0-255) to linear light (0.0-1.0)
pub fn linearize(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.03928 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
}

/// WCAG relative luminance
pub fn luminance(color: Color) -> f64 {
    0.2126 * linearize(color.r) + 0.7152 * linearize(color.g) + 0.0722 * linearize(color.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::from_hex("ff8000").unwrap(), Color::new(255, 128, 0));
        assert_eq!(Color::from_hex("#FF8000").unwrap(), Color::new(255, 128, 0));
        assert_eq!("0a0B0c".parse::<Color>().unwrap(), Color::new(10, 11, 12));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["12345", "1234567", "#fff", "", "#", "gg0000", "+f0000", "##ffffff", "ff 000"] {
            assert!(
                matches!(Color::from_hex(bad), Err(A11yError::InvalidColorFormat(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Color::new(255, 0, 16).to_string(), "#ff0010");
    }

    #[test]
    fn test_linearize_endpoints() {
        assert_eq!(linearize(0), 0.0);
        assert!((linearize(255) - 1.0).abs() < 1e-12);
        // 10/255 is below the 0.03928 knee
        assert_eq!(linearize(10), (10.0 / 255.0) / 12.92);
        assert_eq!(linearize(128), ((128.0 / 255.0 + 0.055) / 1.055f64).powf(2.4));
    }

    #[test]
    fn test_luminance() {
        assert_eq!(luminance(Color::BLACK), 0.0);
        assert!((luminance(Color::WHITE) - 1.0).abs() < 1e-12);
        assert!((luminance(Color::new(255, 0, 0)) - 0.2126).abs() < 1e-12);
        assert!((luminance(Color::new(0, 255, 0)) - 0.7152).abs() < 1e-12);
        assert!((Color::new(0, 0, 255).luminance() - 0.0722).abs() < 1e-12);
    }
}
