// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin definitions and the per-node pin layouts.

use crate::id::PinId;
use serde::{Deserialize, Serialize};

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinKind {
    /// Receives flow from a link
    Input,
    /// Sends flow along a link
    Output,
}

/// Data carried through a pin.
///
/// Only control flow exists today; typed data pins would be added here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PinType {
    /// Control-flow continuation
    #[default]
    Flow,
}

/// A connection point on a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    /// Unique pin ID
    pub id: PinId,
    /// Display name (may be empty)
    pub name: String,
    /// Direction
    pub kind: PinKind,
    /// Data type
    pub pin_type: PinType,
}

impl Pin {
    /// Create a new flow input
    pub fn input(id: PinId) -> Self {
        Self {
            id,
            name: String::new(),
            kind: PinKind::Input,
            pin_type: PinType::Flow,
        }
    }

    /// Create a new flow output
    pub fn output(id: PinId) -> Self {
        Self {
            id,
            name: String::new(),
            kind: PinKind::Output,
            pin_type: PinType::Flow,
        }
    }

    /// Set the display name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check if a link between this pin and `other` is type-compatible
    pub fn can_connect(&self, other: &Pin) -> bool {
        self.id.is_valid()
            && other.id.is_valid()
            && self.kind != other.kind
            && self.pin_type == other.pin_type
    }
}

/// Pin layout of a node. Fixed at spawn time, except that the output list of
/// [`PinTopology::InputOutputs`] grows and shrinks on Branch, Dialogue and
/// Dice nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinTopology {
    /// A lone output (the Entry node)
    Single(Pin),
    /// One input and one output
    InputOutput {
        /// Input pin
        input: Pin,
        /// Output pin
        output: Pin,
    },
    /// One input and exactly two outputs in fixed order
    ForkInputOutput {
        /// Input pin
        input: Pin,
        /// Output pins
        outputs: [Pin; 2],
    },
    /// One input and an ordered, variable-length list of outputs
    InputOutputs {
        /// Input pin
        input: Pin,
        /// Output pins
        outputs: Vec<Pin>,
    },
}

impl PinTopology {
    /// The input pin, if this layout has one
    pub fn input(&self) -> Option<&Pin> {
        match self {
            Self::Single(_) => None,
            Self::InputOutput { input, .. }
            | Self::ForkInputOutput { input, .. }
            | Self::InputOutputs { input, .. } => Some(input),
        }
    }

    /// All output pins in order
    pub fn outputs(&self) -> &[Pin] {
        match self {
            Self::Single(output) | Self::InputOutput { output, .. } => std::slice::from_ref(output),
            Self::ForkInputOutput { outputs, .. } => &outputs[..],
            Self::InputOutputs { outputs, .. } => outputs.as_slice(),
        }
    }

    /// Output pin at `index`
    pub fn output(&self, index: usize) -> Option<&Pin> {
        self.outputs().get(index)
    }

    /// Number of output pins
    pub fn output_count(&self) -> usize {
        self.outputs().len()
    }

    /// Every pin, input first
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.input().into_iter().chain(self.outputs())
    }

    /// Find a pin by ID
    pub fn pin(&self, pin_id: PinId) -> Option<&Pin> {
        self.pins().find(|p| p.id == pin_id)
    }

    /// Whether `pin_id` belongs to this layout
    pub fn contains(&self, pin_id: PinId) -> bool {
        self.pin(pin_id).is_some()
    }

    /// Whether `a` and `b` are this node's own input and one of its outputs,
    /// in either order
    pub fn pairs(&self, a: PinId, b: PinId) -> bool {
        let Some(input) = self.input() else {
            return false;
        };
        let is_output = |id: PinId| self.outputs().iter().any(|p| p.id == id);
        (input.id == a && is_output(b)) || (input.id == b && is_output(a))
    }

    /// Mutable access to a variable-length output list
    pub fn outputs_mut(&mut self) -> Option<&mut Vec<Pin>> {
        match self {
            Self::InputOutputs { outputs, .. } => Some(outputs),
            _ => None,
        }
    }

    /// Highest pin ID in this layout
    pub fn max_id(&self) -> u32 {
        self.pins().map(|p| p.id.value()).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fork() -> PinTopology {
        PinTopology::ForkInputOutput {
            input: Pin::input(PinId(2)),
            outputs: [
                Pin::output(PinId(3)).named("Others"),
                Pin::output(PinId(4)).named("First"),
            ],
        }
    }

    #[test]
    fn test_fork_layout() {
        let pins = fork();
        assert_eq!(pins.input().map(|p| p.id), Some(PinId(2)));
        assert_eq!(pins.output_count(), 2);
        assert_eq!(pins.output(1).map(|p| p.name.as_str()), Some("First"));
        assert_eq!(pins.pins().count(), 3);
        assert_eq!(pins.max_id(), 4);
    }

    #[test]
    fn test_single_has_no_input() {
        let pins = PinTopology::Single(Pin::output(PinId(1)));
        assert!(pins.input().is_none());
        assert_eq!(pins.output_count(), 1);
        assert!(!pins.pairs(PinId(1), PinId(1)));
    }

    #[test]
    fn test_pairs_in_either_order() {
        let pins = fork();
        assert!(pins.pairs(PinId(2), PinId(3)));
        assert!(pins.pairs(PinId(4), PinId(2)));
        assert!(!pins.pairs(PinId(3), PinId(4)));
        assert!(!pins.pairs(PinId(2), PinId(9)));
    }

    #[test]
    fn test_can_connect() {
        let input = Pin::input(PinId(1));
        let output = Pin::output(PinId(2));
        assert!(output.can_connect(&input));
        assert!(input.can_connect(&output));
        assert!(!input.can_connect(&Pin::input(PinId(3))));
        assert!(!output.can_connect(&Pin::input(PinId::INVALID)));
    }
}
