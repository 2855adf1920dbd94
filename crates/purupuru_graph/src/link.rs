// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the graph.

use crate::id::{LinkId, PinId};
use serde::{Deserialize, Serialize};

/// A directed edge from an output pin to an input pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Unique link ID
    #[serde(rename = "ID")]
    pub id: LinkId,
    /// Output pin the flow leaves from
    #[serde(rename = "StartPinID")]
    pub start: PinId,
    /// Input pin the flow enters
    #[serde(rename = "EndPinID")]
    pub end: PinId,
}

impl Link {
    /// Create a new link
    pub fn new(id: LinkId, start: PinId, end: PinId) -> Self {
        Self { id, start, end }
    }

    /// Check if this link touches a specific pin
    pub fn involves_pin(&self, pin_id: PinId) -> bool {
        self.start == pin_id || self.end == pin_id
    }

    /// Check if this link connects exactly these two pins, in either order
    pub fn connects(&self, a: PinId, b: PinId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }
}
