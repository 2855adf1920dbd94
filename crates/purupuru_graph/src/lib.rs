// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dialogue and quest graph model for `PuruPuru`.
//!
//! Every character owns a graph of typed nodes joined by links between flow
//! pins. Playback walks that graph one node at a time from its Entry node,
//! consulting and updating an [`EvaluationState`].
//!
//! ## Architecture
//!
//! - [`Character`]: per-character store of nodes, pins and links, with its
//!   own [`IdAllocator`]
//! - [`QuestStore`]: Accept Quest nodes shared by every character and
//!   referenced by [`Guid`]
//! - [`Walker`]: the transition function of the node state machine
//! - [`flavor`]: flavors and the compatibility relation

pub mod character;
pub mod flavor;
pub mod guid;
pub mod id;
pub mod link;
pub mod node;
pub mod pin;
pub mod quest;
pub mod state;
pub mod walker;

pub use character::{Character, LinkRejection, NodeRef, RestoreError};
pub use flavor::{is_flavor_matching, Flavor, FlavorPair};
pub use guid::{Guid, GuidError};
pub use id::{CharacterId, IdAllocator, LinkId, NodeId, PinId, MAX_OBJECT_ID};
pub use link::Link;
pub use node::{
    ActNode, BranchNode, Bubble, CommentNode, CompareOperator, Condition, DialogueNode, Expression,
    FlavorCheckNode, ForkNode, Node, NodeKind, NodeType, ObjectiveNode, ReturnQuestNode, SetOperator,
    Speaker, VariableNode,
};
pub use pin::{Pin, PinKind, PinTopology, PinType};
pub use quest::{AcceptQuestNode, ObjectiveSpec, QuestStore};
pub use state::EvaluationState;
pub use walker::{Step, WalkFault, Walker};
