//! Presentation colors
//!
//! A color is a utility-class style tag such as `bg-yellow-300`. It has no
//! behavioral meaning; the only operation is [`Color::lighten`], applied once
//! per depth level when children are grown.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shade scale, darkest first
const SHADES: [u16; 10] = [900, 800, 700, 600, 500, 400, 300, 200, 100, 50];

/// Root color of a blank tree
pub const ROOT_COLOR: &str = "bg-white";

/// Colors of the three root children of a blank tree
pub const BRANCH_COLORS: [&str; 3] = ["bg-yellow-300", "bg-cyan-300", "bg-fuchsia-300"];

/// Presentation tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    #[inline]
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// One step lighter on the shade scale
    ///
    /// `bg-yellow-300` becomes `bg-yellow-200`; the lightest shade stays put.
    /// Tags without a trailing shade (e.g. `bg-white`) are returned unchanged.
    #[must_use]
    pub fn lighten(&self) -> Self {
        let Some((prefix, shade)) = self.split_shade() else {
            return self.clone();
        };
        let Some(pos) = SHADES.iter().position(|s| *s == shade) else {
            return self.clone();
        };
        let next = SHADES[(pos + 1).min(SHADES.len() - 1)];
        Self(format!("{prefix}-{next}"))
    }

    fn split_shade(&self) -> Option<(&str, u16)> {
        let (prefix, suffix) = self.0.rsplit_once('-')?;
        let shade = suffix.parse().ok()?;
        Some((prefix, shade))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lighten_steps_down_one_shade() {
        assert_eq!(Color::from("bg-yellow-300").lighten(), Color::from("bg-yellow-200"));
        assert_eq!(Color::from("bg-cyan-200").lighten(), Color::from("bg-cyan-100"));
        assert_eq!(Color::from("bg-cyan-100").lighten(), Color::from("bg-cyan-50"));
    }

    #[test]
    fn lighten_saturates_at_lightest() {
        assert_eq!(Color::from("bg-cyan-50").lighten(), Color::from("bg-cyan-50"));
    }

    #[test]
    fn lighten_keeps_unshaded_tags() {
        assert_eq!(Color::from(ROOT_COLOR).lighten(), Color::from(ROOT_COLOR));
        assert_eq!(Color::from("bg-gray-250").lighten(), Color::from("bg-gray-250"));
        assert_eq!(Color::from("").lighten(), Color::from(""));
    }
}
