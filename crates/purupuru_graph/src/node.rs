// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions: the closed set of node variants and their payloads.

use crate::guid::Guid;
use crate::id::NodeId;
use crate::pin::PinTopology;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminator of a node variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Traversal start point
    Entry,
    /// Fires one branch on first visit, the other afterwards
    Fork,
    /// Sets a boolean variable
    BoolVariable,
    /// Updates an integer variable
    IntVariable,
    /// Conditional branching over variables
    Branch,
    /// Player choice between prompts
    Dialogue,
    /// Branches on whether the two flavors are compatible
    FlavorMatch,
    /// Branches on one party's primary flavor
    FlavorCheck,
    /// A block of speech bubbles
    Act,
    /// Uniformly random branch
    Dice,
    /// Grants a quest (stored in the quest store)
    AcceptQuest,
    /// Completes or fails a quest
    ReturnQuest,
    /// Completes or fails a quest objective
    Objective,
    /// Annotation, never traversed
    Comment,
}

impl NodeType {
    /// Editor display name
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Entry => "Entry",
            NodeType::Fork => "Fork",
            NodeType::BoolVariable => "Set Variable(Boolean)",
            NodeType::IntVariable => "Set Variable(Integer)",
            NodeType::Branch => "Branch",
            NodeType::Dialogue => "Dialogue",
            NodeType::FlavorMatch => "Flavor Match",
            NodeType::FlavorCheck => "Flavor Check",
            NodeType::Act => "Act",
            NodeType::Dice => "Dice",
            NodeType::AcceptQuest => "Accept Quest",
            NodeType::ReturnQuest => "Return Quest",
            NodeType::Objective => "Objective",
            NodeType::Comment => "Comment",
        }
    }

    /// Whether playback stops on this node to present something
    pub fn is_interactive(self) -> bool {
        matches!(self, NodeType::Act | NodeType::Dialogue)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Assignment operator of a variable node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SetOperator {
    /// `=`
    #[default]
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Subtract,
    /// `*=`
    Multiply,
    /// `/=`
    Divide,
}

impl SetOperator {
    /// Every operator in menu order
    pub const ALL: [SetOperator; 5] = [
        SetOperator::Assign,
        SetOperator::Add,
        SetOperator::Subtract,
        SetOperator::Multiply,
        SetOperator::Divide,
    ];

    /// Canonical symbol
    pub fn symbol(self) -> &'static str {
        match self {
            SetOperator::Assign => "=",
            SetOperator::Add => "+=",
            SetOperator::Subtract => "-=",
            SetOperator::Multiply => "*=",
            SetOperator::Divide => "/=",
        }
    }

    /// Parse a symbol, `None` if unknown
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

impl From<String> for SetOperator {
    fn from(symbol: String) -> Self {
        Self::from_symbol(&symbol).unwrap_or_else(|| {
            tracing::warn!("Unknown set operator {:?}, using '='", symbol);
            Self::default()
        })
    }
}

impl From<SetOperator> for String {
    fn from(op: SetOperator) -> Self {
        op.symbol().to_string()
    }
}

/// Comparison operator of a branch condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CompareOperator {
    /// `==`
    #[default]
    Equal,
    /// `>`
    Greater,
    /// `<`
    Less,
    /// `>=`
    GreaterEqual,
    /// `<=`
    LessEqual,
    /// `<>`
    Different,
}

impl CompareOperator {
    /// Every operator in menu order
    pub const ALL: [CompareOperator; 6] = [
        CompareOperator::Equal,
        CompareOperator::Greater,
        CompareOperator::Less,
        CompareOperator::GreaterEqual,
        CompareOperator::LessEqual,
        CompareOperator::Different,
    ];

    /// Canonical symbol
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOperator::Equal => "==",
            CompareOperator::Greater => ">",
            CompareOperator::Less => "<",
            CompareOperator::GreaterEqual => ">=",
            CompareOperator::LessEqual => "<=",
            CompareOperator::Different => "<>",
        }
    }

    /// Parse a symbol, `None` if unknown
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Apply the comparison `lhs <op> rhs`
    pub fn compare(self, lhs: i32, rhs: i32) -> bool {
        match self {
            CompareOperator::Equal => lhs == rhs,
            CompareOperator::Greater => lhs > rhs,
            CompareOperator::Less => lhs < rhs,
            CompareOperator::GreaterEqual => lhs >= rhs,
            CompareOperator::LessEqual => lhs <= rhs,
            CompareOperator::Different => lhs != rhs,
        }
    }
}

impl From<String> for CompareOperator {
    fn from(symbol: String) -> Self {
        Self::from_symbol(&symbol).unwrap_or_else(|| {
            tracing::warn!("Unknown comparison {:?}, using '=='", symbol);
            Self::default()
        })
    }
}

impl From<CompareOperator> for String {
    fn from(op: CompareOperator) -> Self {
        op.symbol().to_string()
    }
}

/// Who speaks a bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Speaker {
    /// The player character
    MainCharacter,
    /// The character owning the graph
    Npc,
    /// Inner monologue
    #[default]
    Internal,
}

impl Speaker {
    /// Canonical name
    pub fn name(self) -> &'static str {
        match self {
            Speaker::MainCharacter => "MainCharacter",
            Speaker::Npc => "NPC",
            Speaker::Internal => "Internal",
        }
    }
}

impl From<String> for Speaker {
    fn from(name: String) -> Self {
        match name.as_str() {
            "MainCharacter" => Speaker::MainCharacter,
            "NPC" => Speaker::Npc,
            "Internal" => Speaker::Internal,
            _ => {
                tracing::warn!("Unknown speaker {:?}, using Internal", name);
                Speaker::default()
            }
        }
    }
}

impl From<Speaker> for String {
    fn from(speaker: Speaker) -> Self {
        speaker.name().to_string()
    }
}

/// Payload of a Set Variable node
#[derive(Debug, Clone, PartialEq)]
pub struct VariableNode<T> {
    /// Variable name
    pub name: String,
    /// Assignment operator (only `=` is meaningful for booleans)
    pub operator: SetOperator,
    /// Literal operand
    pub value: T,
}

impl<T: Default> Default for VariableNode<T> {
    fn default() -> Self {
        Self {
            name: "Your variable".to_string(),
            operator: SetOperator::Assign,
            value: T::default(),
        }
    }
}

/// One comparison inside a branch expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Variable to test
    #[serde(rename = "Name")]
    pub variable: String,
    /// Comparison (ignored when the variable is a boolean)
    #[serde(rename = "Operator")]
    pub operator: CompareOperator,
    /// Literal to compare against
    #[serde(rename = "Value")]
    pub value: i32,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            variable: "Variable Name".to_string(),
            operator: CompareOperator::Equal,
            value: 0,
        }
    }
}

/// Conjunction of conditions
pub type Expression = Vec<Condition>;

/// Payload of a Branch node. Output `i` belongs to expression `i`; the last
/// output is the unconditional else.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BranchNode {
    /// Expressions in evaluation order
    pub expressions: Vec<Expression>,
}

/// Payload of a Dialogue node. Output `i` belongs to prompt `i`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DialogueNode {
    /// Choices offered to the player
    pub prompts: Vec<String>,
}

/// Payload of a Fork node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkNode {
    /// Key of the visited flag in the evaluation state
    pub uuid: Guid,
}

/// A single line of an Act
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bubble {
    /// Who says it
    #[serde(rename = "Speaker")]
    pub speaker: Speaker,
    /// What is said
    #[serde(rename = "Line")]
    pub line: String,
}

impl Bubble {
    /// Create a new bubble
    pub fn new(speaker: Speaker, line: impl Into<String>) -> Self {
        Self {
            speaker,
            line: line.into(),
        }
    }
}

/// Payload of an Act node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActNode {
    /// Title shown in the editor
    pub title: String,
    /// Bubbles in playback order
    pub bubbles: Vec<Bubble>,
}

impl Default for ActNode {
    fn default() -> Self {
        Self {
            title: "Your title".to_string(),
            bubbles: Vec::new(),
        }
    }
}

/// Payload of a Flavor Check node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlavorCheckNode {
    /// Check the NPC's flavor instead of the main character's
    pub checking_npc: bool,
}

/// Payload of a Return Quest node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnQuestNode {
    /// Quest being returned (nil until selected)
    pub quest: Guid,
    /// Whether the quest succeeds or fails
    pub succeed: bool,
}

impl Default for ReturnQuestNode {
    fn default() -> Self {
        Self {
            quest: Guid::nil(),
            succeed: true,
        }
    }
}

/// Payload of an Objective node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectiveNode {
    /// Quest owning the objective (nil until selected)
    pub quest: Guid,
    /// Objective within the quest (nil until selected)
    pub objective: Guid,
    /// Whether the objective succeeds or fails
    pub succeed: bool,
}

impl Default for ObjectiveNode {
    fn default() -> Self {
        Self {
            quest: Guid::nil(),
            objective: Guid::nil(),
            succeed: true,
        }
    }
}

/// Payload of a Comment node
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    /// Free text
    pub text: String,
    /// Size of the framed area
    pub size: [f32; 2],
}

impl Default for CommentNode {
    fn default() -> Self {
        Self {
            text: "Your comment".to_string(),
            size: [0.0, 0.0],
        }
    }
}

/// Node variant with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Traversal start
    Entry,
    /// Boolean assignment
    BoolVariable(VariableNode<bool>),
    /// Integer update
    IntVariable(VariableNode<i32>),
    /// Conditional branch
    Branch(BranchNode),
    /// Player choice
    Dialogue(DialogueNode),
    /// First-visit fork
    Fork(ForkNode),
    /// Speech block
    Act(ActNode),
    /// Flavor compatibility branch
    FlavorMatch,
    /// Primary flavor branch
    FlavorCheck(FlavorCheckNode),
    /// Random branch
    Dice,
    /// Quest return
    ReturnQuest(ReturnQuestNode),
    /// Objective completion
    Objective(ObjectiveNode),
    /// Annotation
    Comment(CommentNode),
}

impl NodeKind {
    /// The discriminator of this variant
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Entry => NodeType::Entry,
            NodeKind::BoolVariable(_) => NodeType::BoolVariable,
            NodeKind::IntVariable(_) => NodeType::IntVariable,
            NodeKind::Branch(_) => NodeType::Branch,
            NodeKind::Dialogue(_) => NodeType::Dialogue,
            NodeKind::Fork(_) => NodeType::Fork,
            NodeKind::Act(_) => NodeType::Act,
            NodeKind::FlavorMatch => NodeType::FlavorMatch,
            NodeKind::FlavorCheck(_) => NodeType::FlavorCheck,
            NodeKind::Dice => NodeType::Dice,
            NodeKind::ReturnQuest(_) => NodeType::ReturnQuest,
            NodeKind::Objective(_) => NodeType::Objective,
            NodeKind::Comment(_) => NodeType::Comment,
        }
    }
}

/// A node instance in a character graph
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique node ID
    pub id: NodeId,
    /// Position on the canvas (opaque to the graph)
    pub position: [f32; 2],
    /// Variant and payload
    pub kind: NodeKind,
    /// Pin layout, `None` for comments
    pub pins: Option<PinTopology>,
}

impl Node {
    /// Create a new node at the origin
    pub fn new(id: NodeId, kind: NodeKind, pins: Option<PinTopology>) -> Self {
        Self {
            id,
            position: [0.0, 0.0],
            kind,
            pins,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// The discriminator of this node
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Highest identifier used by the node or its pins
    pub fn max_id(&self) -> u32 {
        let pins = self.pins.as_ref().map_or(0, PinTopology::max_id);
        self.id.value().max(pins)
    }
}
