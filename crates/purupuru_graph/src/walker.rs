// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph walker: one transition from a node to the next.
//!
//! The walker applies variable assignments and fork flags to the
//! [`EvaluationState`]; everything else a node means (showing bubbles,
//! granting quests) is left to the caller.

use crate::character::{Character, NodeRef};
use crate::flavor::{Flavor, FlavorPair};
use crate::id::{LinkId, NodeId, PinId};
use crate::node::{BranchNode, Condition, NodeKind, NodeType, SetOperator, VariableNode};
use crate::pin::PinTopology;
use crate::quest::QuestStore;
use crate::state::EvaluationState;
use rand::Rng;
use thiserror::Error;

/// Why a transition could not be made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalkFault {
    /// The current node does not exist
    #[error("node {0} not found")]
    MissingNode(NodeId),
    /// A link ends at a pin no node carries
    #[error("link {link} ends at unknown pin {pin}")]
    DanglingLink {
        /// The link followed
        link: LinkId,
        /// Its unresolvable end
        pin: PinId,
    },
    /// A Dialogue node was reached without a choice
    #[error("dialogue requires a choice")]
    MissingChoice,
    /// The choice does not name a prompt
    #[error("choice {choice} out of range ({count} prompts)")]
    ChoiceOutOfRange {
        /// The supplied choice
        choice: usize,
        /// Number of prompts
        count: usize,
    },
    /// A Flavor Check met a combination flavor
    #[error("flavor check cannot route combination flavor {0}")]
    CombinationFlavor(Flavor),
    /// The node has no output to follow
    #[error("node {0} has no outputs")]
    NoOutputs(NodeId),
    /// The selected output does not exist
    #[error("node {node} has no output {index}")]
    MissingOutput {
        /// The node
        node: NodeId,
        /// The selected output
        index: usize,
    },
    /// An integer variable node divides by zero
    #[error("division by zero updating {0:?}")]
    DivisionByZero(String),
    /// The node never takes part in traversal
    #[error("{0} nodes are not traversable")]
    NotTraversable(NodeType),
}

/// Outcome of one transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The node reached
    Next(NodeRef),
    /// The chosen output is not linked: the story path ends here
    End,
    /// The graph could not be walked
    Broken(WalkFault),
}

impl Step {
    /// The node reached, if any
    pub fn target(&self) -> Option<NodeRef> {
        match self {
            Step::Next(node) => Some(*node),
            Step::End | Step::Broken(_) => None,
        }
    }

    /// Whether the path ended normally
    pub fn is_end(&self) -> bool {
        matches!(self, Step::End)
    }

    /// Whether the walk failed
    pub fn is_broken(&self) -> bool {
        matches!(self, Step::Broken(_))
    }
}

/// Index of the Branch output taken for `state`: the first expression whose
/// conditions all hold, else the trailing else output.
pub fn evaluate_branch(branch: &BranchNode, state: &EvaluationState) -> usize {
    branch
        .expressions
        .iter()
        .position(|expression| expression.iter().all(|c| condition_holds(c, state)))
        .unwrap_or(branch.expressions.len())
}

/// A boolean variable of the same name shadows the integer one and is
/// compared for equality regardless of the operator.
fn condition_holds(condition: &Condition, state: &EvaluationState) -> bool {
    match state.bool_value(&condition.variable) {
        Some(value) => i32::from(value) == condition.value,
        None => condition
            .operator
            .compare(state.int_value(&condition.variable), condition.value),
    }
}

/// Apply an integer variable node to the state
fn apply_int(node: &VariableNode<i32>, state: &mut EvaluationState) -> Result<(), WalkFault> {
    let current = state.int_value(&node.name);
    let value = match node.operator {
        SetOperator::Assign => node.value,
        SetOperator::Add => current.wrapping_add(node.value),
        SetOperator::Subtract => current.wrapping_sub(node.value),
        SetOperator::Multiply => current.wrapping_mul(node.value),
        SetOperator::Divide => {
            if node.value == 0 {
                return Err(WalkFault::DivisionByZero(node.name.clone()));
            }
            current.wrapping_div(node.value)
        }
    };
    state.set_int(node.name.clone(), value);
    Ok(())
}

/// Walks the graph of one character
#[derive(Debug, Clone, Copy)]
pub struct Walker<'a> {
    character: &'a Character,
    quests: &'a QuestStore,
}

impl<'a> Walker<'a> {
    /// Create a walker over `character`, resolving its Accept Quest nodes
    /// through `quests`
    pub fn new(character: &'a Character, quests: &'a QuestStore) -> Self {
        Self { character, quests }
    }

    /// Resolve a node of the walked character
    pub fn resolve(&self, node_id: NodeId) -> Option<NodeRef> {
        self.character
            .node_type(self.quests, node_id)
            .map(|node_type| NodeRef { id: node_id, node_type })
    }

    /// Move from `current` to the next node.
    ///
    /// `choice` is only read at Dialogue nodes; `rng` only at Dice nodes.
    pub fn advance<R: Rng>(
        &self,
        current: NodeId,
        state: &mut EvaluationState,
        flavors: FlavorPair,
        choice: Option<usize>,
        rng: &mut R,
    ) -> Step {
        let step = self.transition(current, state, flavors, choice, rng);
        match &step {
            Step::Next(next) => tracing::debug!("{} -> {} ({})", current, next.id, next.node_type),
            Step::End => tracing::debug!("{} -> end", current),
            Step::Broken(fault) => tracing::warn!("Walk of {} broke at {}: {}", self.character.name, current, fault),
        }
        step
    }

    fn transition<R: Rng>(
        &self,
        current: NodeId,
        state: &mut EvaluationState,
        flavors: FlavorPair,
        choice: Option<usize>,
        rng: &mut R,
    ) -> Step {
        let Some(node) = self.character.node(current) else {
            // Accept Quest nodes always continue through their single output
            return match self.quests.find_node(self.character.id(), current) {
                Some(quest) => self.follow(current, &quest.pins, 0),
                None => Step::Broken(WalkFault::MissingNode(current)),
            };
        };
        let Some(pins) = node.pins.as_ref() else {
            return Step::Broken(WalkFault::NotTraversable(node.node_type()));
        };

        let index = match &node.kind {
            NodeKind::Comment(_) => return Step::Broken(WalkFault::NotTraversable(NodeType::Comment)),
            NodeKind::Entry
            | NodeKind::Act(_)
            | NodeKind::ReturnQuest(_)
            | NodeKind::Objective(_) => 0,
            NodeKind::BoolVariable(variable) => {
                state.set_bool(variable.name.clone(), variable.value);
                0
            }
            NodeKind::IntVariable(variable) => {
                if let Err(fault) = apply_int(variable, state) {
                    return Step::Broken(fault);
                }
                0
            }
            NodeKind::Fork(fork) => {
                let first_visit = !state.is_fork_visited(fork.uuid);
                state.mark_fork_visited(fork.uuid);
                if first_visit { 1 } else { 0 }
            }
            NodeKind::Branch(branch) => evaluate_branch(branch, state),
            NodeKind::Dialogue(_) => {
                let Some(choice) = choice else {
                    return Step::Broken(WalkFault::MissingChoice);
                };
                let count = pins.output_count();
                if choice >= count {
                    return Step::Broken(WalkFault::ChoiceOutOfRange { choice, count });
                }
                choice
            }
            NodeKind::FlavorMatch => {
                if flavors.is_matching() { 0 } else { 1 }
            }
            NodeKind::FlavorCheck(check) => {
                let flavor = if check.checking_npc { flavors.npc } else { flavors.main };
                match flavor.check_index() {
                    Some(index) => index,
                    None => return Step::Broken(WalkFault::CombinationFlavor(flavor)),
                }
            }
            NodeKind::Dice => {
                let faces = pins.output_count();
                if faces == 0 {
                    return Step::Broken(WalkFault::NoOutputs(current));
                }
                rng.gen_range(0..faces)
            }
        };
        self.follow(current, pins, index)
    }

    fn follow(&self, node: NodeId, pins: &PinTopology, index: usize) -> Step {
        if pins.output_count() == 0 {
            return Step::Broken(WalkFault::NoOutputs(node));
        }
        let Some(pin) = pins.output(index) else {
            return Step::Broken(WalkFault::MissingOutput { node, index });
        };
        let Some(link) = self.character.links_from(pin.id).next() else {
            return Step::End;
        };
        match self.character.find_node_by_pin(self.quests, link.end) {
            Some(next) => Step::Next(next),
            None => Step::Broken(WalkFault::DanglingLink {
                link: link.id,
                pin: link.end,
            }),
        }
    }
}
