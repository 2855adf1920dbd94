// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flavors and the flavor-compatibility relation used by Flavor Match and
//! Flavor Check nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Taste category of a character: five primaries and six two-way
/// combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Flavor {
    /// Bitter
    #[default]
    Bitter,
    /// Salty
    Salty,
    /// Sour
    Sour,
    /// Sweet
    Sweet,
    /// Neutral (never combined)
    Neutral,
    /// Bitter and Salty
    BitterSalty,
    /// Bitter and Sweet
    BitterSweet,
    /// Bitter and Sour
    BitterSour,
    /// Salty and Sweet
    SaltySweet,
    /// Salty and Sour
    SaltySour,
    /// Sweet and Sour
    SweetSour,
}

impl Flavor {
    /// Every flavor, primaries first
    pub const ALL: [Flavor; 11] = [
        Flavor::Bitter,
        Flavor::Salty,
        Flavor::Sour,
        Flavor::Sweet,
        Flavor::Neutral,
        Flavor::BitterSalty,
        Flavor::BitterSweet,
        Flavor::BitterSour,
        Flavor::SaltySweet,
        Flavor::SaltySour,
        Flavor::SweetSour,
    ];

    /// The five primaries, in Flavor Check output order
    pub const PRIMARIES: [Flavor; 5] = [
        Flavor::Bitter,
        Flavor::Salty,
        Flavor::Sour,
        Flavor::Sweet,
        Flavor::Neutral,
    ];

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Flavor::Bitter => "Bitter",
            Flavor::Salty => "Salty",
            Flavor::Sour => "Sour",
            Flavor::Sweet => "Sweet",
            Flavor::Neutral => "Neutral",
            Flavor::BitterSalty => "BitterSalty",
            Flavor::BitterSweet => "BitterSweet",
            Flavor::BitterSour => "BitterSour",
            Flavor::SaltySweet => "SaltySweet",
            Flavor::SaltySour => "SaltySour",
            Flavor::SweetSour => "SweetSour",
        }
    }

    /// Look up a flavor by its display name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// The two base flavors of a combination, `None` for primaries
    pub fn components(self) -> Option<(Flavor, Flavor)> {
        match self {
            Flavor::BitterSalty => Some((Flavor::Bitter, Flavor::Salty)),
            Flavor::BitterSweet => Some((Flavor::Bitter, Flavor::Sweet)),
            Flavor::BitterSour => Some((Flavor::Bitter, Flavor::Sour)),
            Flavor::SaltySweet => Some((Flavor::Salty, Flavor::Sweet)),
            Flavor::SaltySour => Some((Flavor::Salty, Flavor::Sour)),
            Flavor::SweetSour => Some((Flavor::Sweet, Flavor::Sour)),
            _ => None,
        }
    }

    /// Whether this is one of the five primaries
    pub fn is_primary(self) -> bool {
        self.components().is_none()
    }

    /// Slot of this flavor on a Flavor Check node, `None` for combinations
    pub fn check_index(self) -> Option<usize> {
        Self::PRIMARIES.iter().position(|f| *f == self)
    }

    /// Whether the combination `self` is built from `base`
    fn contains(self, base: Flavor) -> bool {
        self.components()
            .is_some_and(|(a, b)| a == base || b == base)
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Flavor {
    fn from(name: String) -> Self {
        Self::from_name(&name).unwrap_or_else(|| {
            tracing::warn!("Unknown flavor {:?}, using {}", name, Flavor::default());
            Flavor::default()
        })
    }
}

impl From<Flavor> for String {
    fn from(flavor: Flavor) -> Self {
        flavor.name().to_string()
    }
}

/// The flavors of the two parties of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlavorPair {
    /// The player character's flavor
    pub main: Flavor,
    /// The NPC's flavor
    pub npc: Flavor,
}

impl FlavorPair {
    /// Create a new pair
    pub fn new(main: Flavor, npc: Flavor) -> Self {
        Self { main, npc }
    }

    /// Whether the two parties are compatible
    pub fn is_matching(self) -> bool {
        is_flavor_matching(self.main, self.npc)
    }
}

/// Flavor compatibility: equal flavors match, and a combination matches
/// each of its two base flavors. Symmetric by construction.
pub fn is_flavor_matching(lhs: Flavor, rhs: Flavor) -> bool {
    lhs == rhs || lhs.contains(rhs) || rhs.contains(lhs)
}
