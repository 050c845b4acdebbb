//! Year levels and the fixed label <-> internal tag map.
//!
//! Users pick `"Foundation"` or `"Year 1"`..`"Year 10"`; curriculum chunks are
//! tagged `"Foundation"` or `"Level 1"`..`"Level 10"`. The two spellings are a
//! bijection encoded by [`YearLevel`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

const FOUNDATION: &str = "Foundation";
const MAX_YEAR: u8 = 10;

/// A year level between Foundation (0) and Year 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearLevel(u8);

impl YearLevel {
    pub const FOUNDATION: Self = Self(0);

    /// `Year n`, for `1 <= n <= 10`.
    pub fn year(n: u8) -> Option<Self> {
        (1..=MAX_YEAR).contains(&n).then_some(Self(n))
    }

    /// Every level in display order: Foundation, Year 1, ..., Year 10.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=MAX_YEAR).map(Self)
    }

    /// Ordinal year; Foundation is 0.
    pub fn ordinal(self) -> u8 {
        self.0
    }

    /// User-facing label, e.g. `"Year 2"`.
    pub fn label(self) -> String {
        match self.0 {
            0 => FOUNDATION.to_string(),
            n => format!("Year {n}"),
        }
    }

    /// Tag used in the curriculum metadata, e.g. `"Level 2"`.
    pub fn internal_tag(self) -> String {
        match self.0 {
            0 => FOUNDATION.to_string(),
            n => format!("Level {n}"),
        }
    }

    pub fn from_label(label: &str) -> Result<Self, Error> {
        if label == FOUNDATION {
            return Ok(Self::FOUNDATION);
        }
        label
            .strip_prefix("Year ")
            .and_then(|n| n.parse::<u8>().ok())
            .and_then(Self::year)
            .ok_or_else(|| Error::InvalidInput(format!("unknown year level '{label}'")))
    }

    pub fn from_internal_tag(tag: &str) -> Option<Self> {
        if tag == FOUNDATION {
            return Some(Self::FOUNDATION);
        }
        tag.strip_prefix("Level ").and_then(|n| n.parse::<u8>().ok()).and_then(Self::year)
    }

    /// Used to pick the file name of a generated lesson (`Year_2`).
    pub fn file_label(self) -> String {
        self.label().replace(' ', "_")
    }
}

impl fmt::Display for YearLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for YearLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

impl TryFrom<String> for YearLevel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_label(&value)
    }
}

impl From<YearLevel> for String {
    fn from(level: YearLevel) -> Self {
        level.label()
    }
}
