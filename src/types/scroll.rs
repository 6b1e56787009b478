use std::fmt;

use serde::{Deserialize, Serialize};

/// Vertical scroll offset of the viewport, in whole pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScrollPosition {
    pub offset: u32,
}

impl ScrollPosition {
    /// The top of the document.
    pub const TOP: ScrollPosition = ScrollPosition { offset: 0 };

    pub fn new(offset: u32) -> Self {
        Self { offset }
    }

    /// Converts a raw viewport reading into a position.
    ///
    /// Fractional pixels are truncated, negative and NaN readings clamp to the top,
    /// and readings past `u32::MAX` saturate.
    pub fn from_pixels(y: f64) -> Self {
        if y.is_nan() || y <= 0.0 {
            return Self::TOP;
        }
        if y >= u32::MAX as f64 {
            return Self::new(u32::MAX);
        }
        Self::new(y.trunc() as u32)
    }

    /// Decodes a persisted value.
    ///
    /// Returns `None` for empty, non-numeric or non-finite input, which callers treat
    /// exactly like a value that was never written.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let value: f64 = trimmed.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(Self::from_pixels(value))
    }

    /// Encodes the position the way it is persisted: a base-10 integer string.
    pub fn encode(&self) -> String {
        self.offset.to_string()
    }
}

impl From<u32> for ScrollPosition {
    fn from(offset: u32) -> Self {
        Self::new(offset)
    }
}

impl fmt::Display for ScrollPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.offset)
    }
}
