// SPDX-License-Identifier: MIT OR Apache-2.0
//! Integer identifiers for nodes, pins and links.
//!
//! All three share one numeric space per character graph so that a link
//! endpoint can be resolved without knowing what kind of object it names.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// The reserved "no object" value. Never handed out by an allocator.
            pub const INVALID: Self = Self(0);

            /// Whether this is a real, allocated identifier
            pub fn is_valid(self) -> bool {
                self.0 != 0
            }

            /// Raw numeric value
            pub fn value(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

object_id!(
    /// Unique identifier for a node within one character graph
    NodeId
);
object_id!(
    /// Unique identifier for a pin within one character graph
    PinId
);
object_id!(
    /// Unique identifier for a link within one character graph
    LinkId
);

/// Identifier of a character, used as the owner key of quests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub u32);

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Largest identifier a saved graph may carry.
///
/// Scene files store identifiers as signed 32-bit integers. Keeping restored
/// graphs below this bound leaves the rest of the `u32` range to allocation.
pub const MAX_OBJECT_ID: u32 = i32::MAX as u32;

/// Monotonic per-character counter shared by nodes, pins and links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Create an allocator whose first identifier is 1
    pub fn new() -> Self {
        Self { next: 1 }
    }

    fn bump(&mut self) -> u32 {
        let id = self.next;
        // Unreachable from a restored graph: reseeding stops at MAX_OBJECT_ID
        self.next = self.next.saturating_add(1);
        id
    }

    /// Allocate a node identifier
    pub fn next_node(&mut self) -> NodeId {
        NodeId(self.bump())
    }

    /// Allocate a pin identifier
    pub fn next_pin(&mut self) -> PinId {
        PinId(self.bump())
    }

    /// Allocate a link identifier
    pub fn next_link(&mut self) -> LinkId {
        LinkId(self.bump())
    }

    /// The value the next allocation will return
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Restart the counter past `max_seen` so restored objects never collide
    /// with newly authored ones.
    ///
    /// Returns `false` and leaves the counter untouched when `max_seen` is
    /// above [`MAX_OBJECT_ID`].
    pub fn reseed(&mut self, max_seen: u32) -> bool {
        if max_seen > MAX_OBJECT_ID {
            return false;
        }
        self.next = max_seen + 1;
        true
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_id_space() {
        let mut ids = IdAllocator::new();
        let node = ids.next_node();
        let pin = ids.next_pin();
        let link = ids.next_link();
        assert_eq!(node.value(), 1);
        assert_eq!(pin.value(), 2);
        assert_eq!(link.value(), 3);
        assert_eq!(ids.peek(), 4);
    }

    #[test]
    fn test_reseed() {
        let mut ids = IdAllocator::new();
        assert!(ids.reseed(41));
        assert_eq!(ids.next_pin(), PinId(42));

        assert!(ids.reseed(0));
        assert_eq!(ids.next_node(), NodeId(1));
    }

    #[test]
    fn test_reseed_past_the_saved_range() {
        let mut ids = IdAllocator::new();
        assert!(ids.reseed(MAX_OBJECT_ID));
        assert_eq!(ids.next_link(), LinkId(MAX_OBJECT_ID + 1));

        assert!(!ids.reseed(u32::MAX));
        assert!(!ids.reseed(MAX_OBJECT_ID + 1));
        assert_eq!(ids.peek(), MAX_OBJECT_ID + 2);
    }

    #[test]
    fn test_exhausted_counter_does_not_overflow() {
        let mut ids = IdAllocator { next: u32::MAX };
        assert_eq!(ids.next_node(), NodeId(u32::MAX));
        assert_eq!(ids.peek(), u32::MAX);
    }

    #[test]
    fn test_invalid_is_never_allocated() {
        let mut ids = IdAllocator::new();
        assert!(!NodeId::INVALID.is_valid());
        assert!(ids.next_node().is_valid());
    }
}
