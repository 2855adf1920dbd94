// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process-wide identity for forks, quests and objectives.
//!
//! Unlike node ids, a [`Guid`] survives graph edits and is meaningful across
//! characters, which is what lets a Return Quest node in one graph refer to a
//! quest authored in another.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Offsets of the dashes in the canonical `8-4-4-4-12` form
const DASH_OFFSETS: [usize; 4] = [8, 13, 18, 23];

/// Length of the canonical hyphenated form
const HYPHENATED_LEN: usize = 36;

/// 128-bit identifier. The all-zero value is the null sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Guid(Uuid);

impl Guid {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The null sentinel ("nothing selected")
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Whether this is the null sentinel
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Build from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse the canonical `8-4-4-4-12` hex form.
    ///
    /// Only the hyphenated form is accepted; braced, URN and dash-less
    /// spellings are rejected.
    pub fn parse(s: &str) -> Result<Self, GuidError> {
        if s.len() != HYPHENATED_LEN {
            return Err(GuidError::Length(s.len()));
        }

        for (offset, c) in s.char_indices() {
            let dash_expected = DASH_OFFSETS.contains(&offset);
            match (dash_expected, c) {
                (true, '-') => {}
                (true, _) => return Err(GuidError::MissingDash(offset)),
                (false, c) if c.is_ascii_hexdigit() => {}
                (false, _) => return Err(GuidError::InvalidCharacter(offset)),
            }
        }

        Uuid::try_parse(s)
            .map(Self)
            .map_err(|_| GuidError::InvalidCharacter(0))
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for Guid {
    type Err = GuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Guid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Error when parsing a [`Guid`] from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuidError {
    /// Wrong overall length
    #[error("Expected 36 characters, found {0}")]
    Length(usize),

    /// A dash is missing at one of the fixed offsets
    #[error("Expected '-' at offset {0}")]
    MissingDash(usize),

    /// A non-hex character where a digit was expected
    #[error("Invalid hex digit at offset {0}")]
    InvalidCharacter(usize),
}
