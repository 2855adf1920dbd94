// SPDX-License-Identifier: MIT OR Apache-2.0
//! Character graph store: the nodes, pins and links of one character.
//!
//! Accept Quest nodes are the exception: they live in the shared
//! [`QuestStore`] and are resolved through it, which is why most lookups take
//! the store as a parameter.

use crate::flavor::Flavor;
use crate::guid::Guid;
use crate::id::{CharacterId, IdAllocator, LinkId, NodeId, PinId, MAX_OBJECT_ID};
use crate::link::Link;
use crate::node::{
    ActNode, BranchNode, Bubble, CommentNode, Condition, DialogueNode, FlavorCheckNode, ForkNode,
    Node, NodeKind, NodeType, ObjectiveNode, ReturnQuestNode, VariableNode,
};
use crate::pin::{Pin, PinKind, PinTopology};
use crate::quest::{AcceptQuestNode, QuestStore};
use indexmap::IndexMap;
use std::collections::HashSet;
use thiserror::Error;

/// Fewest faces a Dice node may have
pub const MIN_DICE_FACES: usize = 2;

/// Fewest prompts a Dialogue node may have
pub const MIN_DIALOGUE_PROMPTS: usize = 1;

/// A resolved node: its ID and variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    /// Node ID
    pub id: NodeId,
    /// Node variant
    pub node_type: NodeType,
}

/// Why a link between two pins was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinkRejection {
    /// A pin ID is the reserved invalid value
    #[error("invalid pin")]
    InvalidPin,
    /// No node of this character carries the pin
    #[error("pin not found: {0}")]
    PinNotFound(PinId),
    /// Both pins are inputs or both are outputs
    #[error("pins have the same direction")]
    SameKind,
    /// The pins carry different data types
    #[error("pin types are incompatible")]
    IncompatibleTypes,
    /// The pins are the input and an output of one node
    #[error("cannot link a node to itself")]
    SelfLoop,
    /// The exact same link already exists
    #[error("pins are already linked")]
    Duplicate,
    /// The input already has an incoming link
    #[error("input {0} is already linked")]
    InputOccupied(PinId),
}

/// Inconsistency found while rebuilding a character from saved parts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreError {
    /// Two objects share one identifier
    #[error("duplicate identifier {0}")]
    DuplicateId(u32),
    /// An object carries the reserved invalid identifier
    #[error("identifier 0 is reserved")]
    InvalidId,
    /// An identifier is above [`MAX_OBJECT_ID`], leaving no room to allocate
    #[error("identifier {0} is out of range")]
    IdOutOfRange(u32),
    /// The graph has no Entry node
    #[error("missing entry node")]
    MissingEntry,
    /// The graph has more than one Entry node
    #[error("more than one entry node")]
    MultipleEntries,
    /// A link references a pin that does not exist
    #[error("link {link} references unknown pin {pin}")]
    DanglingLink {
        /// The offending link
        link: LinkId,
        /// The unknown pin
        pin: PinId,
    },
    /// A link does not run from an output to an input
    #[error("link {0} does not run from an output to an input")]
    LinkDirection(LinkId),
}

/// The node graph of one character
#[derive(Debug, Clone)]
pub struct Character {
    id: CharacterId,
    /// Character name
    pub name: String,
    ids: IdAllocator,
    entry: NodeId,
    nodes: IndexMap<NodeId, Node>,
    links: IndexMap<LinkId, Link>,
}

impl Character {
    /// Create a character holding only its Entry node
    pub fn new(id: CharacterId, name: impl Into<String>) -> Self {
        let mut ids = IdAllocator::new();
        // The Entry pin is allocated before the node
        let output = Pin::output(ids.next_pin());
        let entry = ids.next_node();
        let mut nodes = IndexMap::new();
        nodes.insert(
            entry,
            Node::new(entry, NodeKind::Entry, Some(PinTopology::Single(output))).with_position(50.0, 50.0),
        );
        Self {
            id,
            name: name.into(),
            ids,
            entry,
            nodes,
            links: IndexMap::new(),
        }
    }

    /// Rebuild a character from saved nodes and links.
    ///
    /// Quests owned by `id` must already be in `quests`; their IDs share the
    /// character's ID space. Every ID must be valid and at most
    /// [`MAX_OBJECT_ID`]. The allocator restarts past every ID seen.
    pub fn from_parts(
        id: CharacterId,
        name: impl Into<String>,
        nodes: Vec<Node>,
        links: Vec<Link>,
        quests: &QuestStore,
    ) -> Result<Self, RestoreError> {
        let mut seen = HashSet::new();
        let mut claim = |value: u32| {
            if value == 0 {
                Err(RestoreError::InvalidId)
            } else if seen.insert(value) {
                Ok(())
            } else {
                Err(RestoreError::DuplicateId(value))
            }
        };

        let mut entry = None;
        let mut node_map = IndexMap::new();
        for node in nodes {
            claim(node.id.value())?;
            for pin in node.pins.iter().flat_map(PinTopology::pins) {
                claim(pin.id.value())?;
            }
            if node.node_type() == NodeType::Entry {
                if entry.is_some() {
                    return Err(RestoreError::MultipleEntries);
                }
                entry = Some(node.id);
            }
            node_map.insert(node.id, node);
        }
        for quest in quests.owned_by(id) {
            claim(quest.id.value())?;
            for pin in quest.pins.pins() {
                claim(pin.id.value())?;
            }
        }
        let entry = entry.ok_or(RestoreError::MissingEntry)?;

        let mut character = Self {
            id,
            name: name.into(),
            ids: IdAllocator::new(),
            entry,
            nodes: node_map,
            links: IndexMap::new(),
        };

        for link in links {
            claim(link.id.value())?;
            let start = character
                .find_pin(quests, link.start)
                .ok_or(RestoreError::DanglingLink { link: link.id, pin: link.start })?;
            let end = character
                .find_pin(quests, link.end)
                .ok_or(RestoreError::DanglingLink { link: link.id, pin: link.end })?;
            if start.kind != PinKind::Output || end.kind != PinKind::Input {
                return Err(RestoreError::LinkDirection(link.id));
            }
            character.links.insert(link.id, link);
        }

        let max_seen = seen.into_iter().max().unwrap_or(0);
        if !character.ids.reseed(max_seen) {
            return Err(RestoreError::IdOutOfRange(max_seen));
        }
        tracing::debug!(
            "Restored character {} ({}) with {} nodes and {} links",
            character.name,
            id,
            character.nodes.len(),
            character.links.len()
        );
        Ok(character)
    }

    /// Character identifier
    pub fn id(&self) -> CharacterId {
        self.id
    }

    /// The Entry node
    pub fn entry_node(&self) -> NodeId {
        self.entry
    }

    /// The value the next allocated identifier will take
    pub fn next_id(&self) -> u32 {
        self.ids.peek()
    }

    // ---- Spawning ----

    fn insert(&mut self, id: NodeId, kind: NodeKind, pins: Option<PinTopology>) -> NodeId {
        tracing::debug!("Spawned {} node {} in {}", kind.node_type(), id, self.name);
        self.nodes.insert(id, Node::new(id, kind, pins));
        id
    }

    fn input_output(&mut self) -> PinTopology {
        PinTopology::InputOutput {
            input: Pin::input(self.ids.next_pin()),
            output: Pin::output(self.ids.next_pin()),
        }
    }

    fn spawn_simple(&mut self, kind: NodeKind) -> NodeId {
        let id = self.ids.next_node();
        let pins = self.input_output();
        self.insert(id, kind, Some(pins))
    }

    /// Spawn a boolean Set Variable node
    pub fn spawn_bool_variable(&mut self) -> NodeId {
        self.spawn_simple(NodeKind::BoolVariable(VariableNode::default()))
    }

    /// Spawn an integer Set Variable node
    pub fn spawn_int_variable(&mut self) -> NodeId {
        self.spawn_simple(NodeKind::IntVariable(VariableNode::default()))
    }

    /// Spawn an Act node without bubbles
    pub fn spawn_act(&mut self) -> NodeId {
        self.spawn_simple(NodeKind::Act(ActNode::default()))
    }

    /// Spawn a Return Quest node with no quest selected
    pub fn spawn_return_quest(&mut self) -> NodeId {
        self.spawn_simple(NodeKind::ReturnQuest(ReturnQuestNode::default()))
    }

    /// Spawn an Objective node with no objective selected
    pub fn spawn_objective(&mut self) -> NodeId {
        self.spawn_simple(NodeKind::Objective(ObjectiveNode::default()))
    }

    /// Spawn a Branch node with one default condition and its `then`/`else`
    /// outputs
    pub fn spawn_branch(&mut self) -> NodeId {
        let id = self.ids.next_node();
        let pins = PinTopology::InputOutputs {
            input: Pin::input(self.ids.next_pin()),
            outputs: vec![
                Pin::output(self.ids.next_pin()).named("then"),
                Pin::output(self.ids.next_pin()).named("else"),
            ],
        };
        let branch = BranchNode {
            expressions: vec![vec![Condition::default()]],
        };
        self.insert(id, NodeKind::Branch(branch), Some(pins))
    }

    /// Spawn a Dialogue node with two prompts
    pub fn spawn_dialogue(&mut self) -> NodeId {
        let id = self.ids.next_node();
        let pins = PinTopology::InputOutputs {
            input: Pin::input(self.ids.next_pin()),
            outputs: vec![Pin::output(self.ids.next_pin()), Pin::output(self.ids.next_pin())],
        };
        let dialogue = DialogueNode {
            prompts: vec!["Something".to_string(), "Something else".to_string()],
        };
        self.insert(id, NodeKind::Dialogue(dialogue), Some(pins))
    }

    /// Spawn a Fork node with a fresh identity
    pub fn spawn_fork(&mut self) -> NodeId {
        let id = self.ids.next_node();
        let pins = PinTopology::ForkInputOutput {
            input: Pin::input(self.ids.next_pin()),
            outputs: [
                Pin::output(self.ids.next_pin()).named("Others"),
                Pin::output(self.ids.next_pin()).named("First"),
            ],
        };
        self.insert(id, NodeKind::Fork(ForkNode { uuid: Guid::new() }), Some(pins))
    }

    /// Spawn a Flavor Match node
    pub fn spawn_flavor_match(&mut self) -> NodeId {
        let id = self.ids.next_node();
        let pins = PinTopology::ForkInputOutput {
            input: Pin::input(self.ids.next_pin()),
            outputs: [
                Pin::output(self.ids.next_pin()).named("Flavor matching"),
                Pin::output(self.ids.next_pin()).named("else"),
            ],
        };
        self.insert(id, NodeKind::FlavorMatch, Some(pins))
    }

    /// Spawn a Flavor Check node checking the main character
    pub fn spawn_flavor_check(&mut self) -> NodeId {
        let id = self.ids.next_node();
        let input = Pin::input(self.ids.next_pin());
        let outputs = Flavor::PRIMARIES
            .iter()
            .map(|flavor| Pin::output(self.ids.next_pin()).named(flavor.name()))
            .collect();
        let pins = PinTopology::InputOutputs { input, outputs };
        self.insert(id, NodeKind::FlavorCheck(FlavorCheckNode::default()), Some(pins))
    }

    /// Spawn a Dice node with two faces
    pub fn spawn_dice(&mut self) -> NodeId {
        let id = self.ids.next_node();
        let pins = PinTopology::InputOutputs {
            input: Pin::input(self.ids.next_pin()),
            outputs: vec![Pin::output(self.ids.next_pin()), Pin::output(self.ids.next_pin())],
        };
        self.insert(id, NodeKind::Dice, Some(pins))
    }

    /// Spawn a Comment node (no pins)
    pub fn spawn_comment(&mut self) -> NodeId {
        let id = self.ids.next_node();
        self.insert(id, NodeKind::Comment(CommentNode::default()), None)
    }

    /// Spawn an Accept Quest node owned by this character
    pub fn spawn_accept_quest<'q>(&mut self, quests: &'q mut QuestStore) -> &'q mut AcceptQuestNode {
        quests.spawn(self.id, &mut self.ids)
    }

    // ---- Deletion ----

    fn unlink_pins(&mut self, pins: &[PinId]) -> usize {
        let before = self.links.len();
        self.links.retain(|_, link| !pins.iter().any(|p| link.involves_pin(*p)));
        before - self.links.len()
    }

    /// Delete a node and every link touching its pins. The Entry node cannot
    /// be deleted.
    pub fn delete_node(&mut self, node_id: NodeId) -> bool {
        if node_id == self.entry {
            tracing::debug!("Refusing to delete the entry node of {}", self.name);
            return false;
        }
        let Some(node) = self.nodes.shift_remove(&node_id) else {
            tracing::debug!("Cannot delete unknown node {} in {}", node_id, self.name);
            return false;
        };
        let pins: Vec<PinId> = node.pins.iter().flat_map(PinTopology::pins).map(|p| p.id).collect();
        let removed = self.unlink_pins(&pins);
        tracing::debug!("Deleted node {} and {} links in {}", node_id, removed, self.name);
        true
    }

    /// Delete an Accept Quest node owned by this character, with its links
    pub fn delete_accept_quest(&mut self, quests: &mut QuestStore, uuid: Guid) -> bool {
        if !quests.get(uuid).is_some_and(|q| q.owner == self.id) {
            tracing::debug!("Quest {} is not owned by {}", uuid, self.name);
            return false;
        }
        let Some(quest) = quests.remove(uuid) else {
            return false;
        };
        let pins: Vec<PinId> = quest.pins.pins().map(|p| p.id).collect();
        self.unlink_pins(&pins);
        true
    }

    /// Delete a link
    pub fn delete_link(&mut self, link_id: LinkId) -> bool {
        self.links.shift_remove(&link_id).is_some()
    }

    // ---- Linking ----

    /// Validate a link between two pins, returning the endpoints ordered as
    /// (output, input)
    pub fn check_link(&self, quests: &QuestStore, a: PinId, b: PinId) -> Result<(PinId, PinId), LinkRejection> {
        if !a.is_valid() || !b.is_valid() {
            return Err(LinkRejection::InvalidPin);
        }
        let pin_a = self.find_pin(quests, a).ok_or(LinkRejection::PinNotFound(a))?;
        let pin_b = self.find_pin(quests, b).ok_or(LinkRejection::PinNotFound(b))?;
        if pin_a.kind == pin_b.kind {
            return Err(LinkRejection::SameKind);
        }
        if pin_a.pin_type != pin_b.pin_type {
            return Err(LinkRejection::IncompatibleTypes);
        }
        if self.pins_of_pin_owner(quests, a).is_some_and(|pins| pins.pairs(a, b)) {
            return Err(LinkRejection::SelfLoop);
        }
        if self.links.values().any(|link| link.connects(a, b)) {
            return Err(LinkRejection::Duplicate);
        }
        let (start, end) = if pin_a.kind == PinKind::Output { (a, b) } else { (b, a) };
        if self.links.values().any(|link| link.end == end) {
            return Err(LinkRejection::InputOccupied(end));
        }
        Ok((start, end))
    }

    /// Whether a link between the two pins would be accepted
    pub fn can_create_link(&self, quests: &QuestStore, a: PinId, b: PinId) -> bool {
        self.check_link(quests, a, b).is_ok()
    }

    /// Link two pins in either order. Refused links leave the graph unchanged.
    pub fn create_link(&mut self, quests: &QuestStore, a: PinId, b: PinId) -> Option<LinkId> {
        match self.check_link(quests, a, b) {
            Ok((start, end)) => {
                let id = self.ids.next_link();
                self.links.insert(id, Link::new(id, start, end));
                Some(id)
            }
            Err(reason) => {
                tracing::debug!("Link {} -> {} refused in {}: {}", a, b, self.name, reason);
                None
            }
        }
    }

    // ---- Lookup ----

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// All nodes in creation order (Accept Quest nodes excluded)
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of nodes (Accept Quest nodes excluded)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a link by ID
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(&link_id)
    }

    /// All links in creation order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// The first link starting or ending at `pin_id`
    pub fn find_link_by_pin(&self, pin_id: PinId) -> Option<&Link> {
        self.links.values().find(|link| link.involves_pin(pin_id))
    }

    /// Links leaving an output pin, in creation order
    pub fn links_from(&self, pin_id: PinId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |link| link.start == pin_id)
    }

    /// Whether any link touches `pin_id`
    pub fn is_pin_linked(&self, pin_id: PinId) -> bool {
        self.find_link_by_pin(pin_id).is_some()
    }

    fn pins_of_pin_owner<'a>(&'a self, quests: &'a QuestStore, pin_id: PinId) -> Option<&'a PinTopology> {
        self.nodes
            .values()
            .filter_map(|node| node.pins.as_ref())
            .find(|pins| pins.contains(pin_id))
            .or_else(|| quests.find_by_pin(self.id, pin_id).map(|q| &q.pins))
    }

    /// Find a pin anywhere in this character's graph
    pub fn find_pin<'a>(&'a self, quests: &'a QuestStore, pin_id: PinId) -> Option<&'a Pin> {
        self.pins_of_pin_owner(quests, pin_id)?.pin(pin_id)
    }

    /// Find the node carrying `pin_id`
    pub fn find_node_by_pin(&self, quests: &QuestStore, pin_id: PinId) -> Option<NodeRef> {
        let local = self
            .nodes
            .values()
            .find(|node| node.pins.as_ref().is_some_and(|pins| pins.contains(pin_id)))
            .map(|node| NodeRef {
                id: node.id,
                node_type: node.node_type(),
            });
        local.or_else(|| {
            quests.find_by_pin(self.id, pin_id).map(|q| NodeRef {
                id: q.id,
                node_type: NodeType::AcceptQuest,
            })
        })
    }

    /// Variant of a node, including Accept Quest nodes owned by this
    /// character
    pub fn node_type(&self, quests: &QuestStore, node_id: NodeId) -> Option<NodeType> {
        self.nodes
            .get(&node_id)
            .map(Node::node_type)
            .or_else(|| quests.find_node(self.id, node_id).map(|_| NodeType::AcceptQuest))
    }

    /// Pin layout of a node, including Accept Quest nodes
    pub fn pins_of<'a>(&'a self, quests: &'a QuestStore, node_id: NodeId) -> Option<&'a PinTopology> {
        match self.nodes.get(&node_id) {
            Some(node) => node.pins.as_ref(),
            None => quests.find_node(self.id, node_id).map(|q| &q.pins),
        }
    }

    /// Highest identifier in use, Accept Quest nodes included
    pub fn max_id(&self, quests: &QuestStore) -> u32 {
        let nodes = self.nodes.values().map(Node::max_id);
        let links = self.links.values().map(|l| l.id.value());
        let owned = quests.owned_by(self.id).map(AcceptQuestNode::max_id);
        nodes.chain(links).chain(owned).max().unwrap_or(0)
    }

    // ---- Authoring edits ----

    fn remove_output(&mut self, node_id: NodeId, index: usize) -> Option<Pin> {
        let outputs = self.nodes.get_mut(&node_id)?.pins.as_mut()?.outputs_mut()?;
        if index >= outputs.len() {
            return None;
        }
        let pin = outputs.remove(index);
        self.unlink_pins(&[pin.id]);
        Some(pin)
    }

    /// Append an expression (with one default condition) before the else
    /// output of a Branch node
    pub fn add_expression(&mut self, node_id: NodeId) -> bool {
        let pin = Pin::output(self.ids.next_pin()).named("then");
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return false;
        };
        let NodeKind::Branch(branch) = &mut node.kind else {
            return false;
        };
        let Some(outputs) = node.pins.as_mut().and_then(PinTopology::outputs_mut) else {
            return false;
        };
        branch.expressions.push(vec![Condition::default()]);
        let else_index = outputs.len().saturating_sub(1);
        outputs.insert(else_index, pin);
        true
    }

    /// Remove expression `index` of a Branch node with its output and links
    pub fn remove_expression(&mut self, node_id: NodeId, index: usize) -> bool {
        let Some(NodeKind::Branch(branch)) = self.nodes.get_mut(&node_id).map(|n| &mut n.kind) else {
            return false;
        };
        if index >= branch.expressions.len() {
            return false;
        }
        branch.expressions.remove(index);
        self.remove_output(node_id, index).is_some()
    }

    /// Append a default condition to an expression of a Branch node
    pub fn add_condition(&mut self, node_id: NodeId, expression: usize) -> bool {
        match self.nodes.get_mut(&node_id).map(|n| &mut n.kind) {
            Some(NodeKind::Branch(branch)) => match branch.expressions.get_mut(expression) {
                Some(conditions) => {
                    conditions.push(Condition::default());
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Remove a condition from an expression. The last condition of an
    /// expression stays; remove the expression instead.
    pub fn remove_condition(&mut self, node_id: NodeId, expression: usize, condition: usize) -> bool {
        let Some(NodeKind::Branch(branch)) = self.nodes.get_mut(&node_id).map(|n| &mut n.kind) else {
            return false;
        };
        match branch.expressions.get_mut(expression) {
            Some(conditions) if conditions.len() > 1 && condition < conditions.len() => {
                conditions.remove(condition);
                true
            }
            _ => false,
        }
    }

    /// Append a prompt and its output to a Dialogue node
    pub fn add_prompt(&mut self, node_id: NodeId, text: impl Into<String>) -> bool {
        let pin = Pin::output(self.ids.next_pin());
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return false;
        };
        let NodeKind::Dialogue(dialogue) = &mut node.kind else {
            return false;
        };
        let Some(outputs) = node.pins.as_mut().and_then(PinTopology::outputs_mut) else {
            return false;
        };
        dialogue.prompts.push(text.into());
        outputs.push(pin);
        true
    }

    /// Remove prompt `index` of a Dialogue node with its output and links,
    /// keeping at least [`MIN_DIALOGUE_PROMPTS`]
    pub fn remove_prompt(&mut self, node_id: NodeId, index: usize) -> bool {
        let Some(NodeKind::Dialogue(dialogue)) = self.nodes.get_mut(&node_id).map(|n| &mut n.kind) else {
            return false;
        };
        if index >= dialogue.prompts.len() {
            return false;
        }
        if dialogue.prompts.len() <= MIN_DIALOGUE_PROMPTS {
            tracing::debug!("Dialogue node {} keeps its last prompt", node_id);
            return false;
        }
        dialogue.prompts.remove(index);
        self.remove_output(node_id, index).is_some()
    }

    /// Append a face to a Dice node
    pub fn add_dice_face(&mut self, node_id: NodeId) -> bool {
        let pin = Pin::output(self.ids.next_pin());
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return false;
        };
        if node.node_type() != NodeType::Dice {
            return false;
        }
        match node.pins.as_mut().and_then(PinTopology::outputs_mut) {
            Some(outputs) => {
                outputs.push(pin);
                true
            }
            None => false,
        }
    }

    /// Remove face `index` of a Dice node, keeping at least
    /// [`MIN_DICE_FACES`]
    pub fn remove_dice_face(&mut self, node_id: NodeId, index: usize) -> bool {
        let Some(node) = self.nodes.get(&node_id) else {
            return false;
        };
        let faces = node.pins.as_ref().map_or(0, PinTopology::output_count);
        if node.node_type() != NodeType::Dice || faces <= MIN_DICE_FACES {
            tracing::debug!("Dice node {} keeps its {} faces", node_id, faces);
            return false;
        }
        self.remove_output(node_id, index).is_some()
    }

    /// Append a bubble to an Act node
    pub fn add_bubble(&mut self, node_id: NodeId, bubble: Bubble) -> bool {
        match self.nodes.get_mut(&node_id).map(|n| &mut n.kind) {
            Some(NodeKind::Act(act)) => {
                act.bubbles.push(bubble);
                true
            }
            _ => false,
        }
    }

    /// Remove bubble `index` of an Act node
    pub fn remove_bubble(&mut self, node_id: NodeId, index: usize) -> Option<Bubble> {
        match self.nodes.get_mut(&node_id).map(|n| &mut n.kind) {
            Some(NodeKind::Act(act)) if index < act.bubbles.len() => Some(act.bubbles.remove(index)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character() -> (Character, QuestStore) {
        (Character::new(CharacterId(0), "Mochi"), QuestStore::new())
    }

    fn input_of(c: &Character, q: &QuestStore, id: NodeId) -> PinId {
        c.pins_of(q, id).and_then(PinTopology::input).map(|p| p.id).unwrap()
    }

    fn output_of(c: &Character, q: &QuestStore, id: NodeId, index: usize) -> PinId {
        c.pins_of(q, id).and_then(|p| p.output(index)).map(|p| p.id).unwrap()
    }

    fn all_ids(c: &Character, q: &QuestStore) -> Vec<u32> {
        let mut ids = Vec::new();
        for node in c.nodes() {
            ids.push(node.id.value());
            ids.extend(node.pins.iter().flat_map(PinTopology::pins).map(|p| p.id.value()));
        }
        for quest in q.owned_by(c.id()) {
            ids.push(quest.id.value());
            ids.extend(quest.pins.pins().map(|p| p.id.value()));
        }
        ids.extend(c.links().map(|l| l.id.value()));
        ids
    }

    #[test]
    fn test_entry_node() {
        let (c, q) = character();
        let entry = c.node(c.entry_node()).unwrap();
        assert_eq!(entry.node_type(), NodeType::Entry);
        assert_eq!(entry.position, [50.0, 50.0]);
        // Pin first, then node
        assert_eq!(output_of(&c, &q, c.entry_node(), 0), PinId(1));
        assert_eq!(c.entry_node(), NodeId(2));
    }

    #[test]
    fn test_spawn_topologies() {
        let (mut c, mut q) = character();
        let branch = c.spawn_branch();
        let fork = c.spawn_fork();
        let check = c.spawn_flavor_check();
        let dice = c.spawn_dice();
        let comment = c.spawn_comment();
        let quest = c.spawn_accept_quest(&mut q).id;

        let names = |id| -> Vec<String> {
            c.pins_of(&q, id).unwrap().outputs().iter().map(|p| p.name.clone()).collect()
        };
        assert_eq!(names(branch), ["then", "else"]);
        assert_eq!(names(fork), ["Others", "First"]);
        assert_eq!(names(check), ["Bitter", "Salty", "Sour", "Sweet", "Neutral"]);
        assert_eq!(c.pins_of(&q, dice).unwrap().output_count(), 2);
        assert!(c.pins_of(&q, comment).is_none());
        assert_eq!(c.node_type(&q, quest), Some(NodeType::AcceptQuest));
    }

    #[test]
    fn test_ids_unique_after_edits() {
        let (mut c, mut q) = character();
        let act = c.spawn_act();
        let branch = c.spawn_branch();
        c.spawn_accept_quest(&mut q);
        c.add_expression(branch);
        assert!(c.delete_node(act));
        let dialogue = c.spawn_dialogue();
        c.add_prompt(dialogue, "Another one");
        c.create_link(&q, output_of(&c, &q, c.entry_node(), 0), input_of(&c, &q, dialogue));

        let ids = all_ids(&c, &q);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.iter().all(|id| *id != 0));
        assert!(c.next_id() > c.max_id(&q));
    }

    #[test]
    fn test_link_swaps_endpoints() {
        let (mut c, q) = character();
        let act = c.spawn_act();
        let out = output_of(&c, &q, c.entry_node(), 0);
        let input = input_of(&c, &q, act);
        let link = c.create_link(&q, input, out).unwrap();
        let link = c.link(link).unwrap();
        assert_eq!((link.start, link.end), (out, input));
        assert!(c.is_pin_linked(out));
        assert_eq!(c.find_node_by_pin(&q, link.end).map(|n| n.id), Some(act));
    }

    #[test]
    fn test_link_rejections() {
        let (mut c, q) = character();
        let a = c.spawn_act();
        let b = c.spawn_act();
        let entry_out = output_of(&c, &q, c.entry_node(), 0);

        assert_eq!(c.check_link(&q, PinId::INVALID, entry_out), Err(LinkRejection::InvalidPin));
        assert_eq!(c.check_link(&q, PinId(999), entry_out), Err(LinkRejection::PinNotFound(PinId(999))));
        assert_eq!(
            c.check_link(&q, output_of(&c, &q, a, 0), entry_out),
            Err(LinkRejection::SameKind)
        );
        assert_eq!(
            c.check_link(&q, output_of(&c, &q, a, 0), input_of(&c, &q, a)),
            Err(LinkRejection::SelfLoop)
        );

        c.create_link(&q, entry_out, input_of(&c, &q, a)).unwrap();
        assert_eq!(
            c.check_link(&q, input_of(&c, &q, a), entry_out),
            Err(LinkRejection::Duplicate)
        );
        assert_eq!(
            c.check_link(&q, output_of(&c, &q, b, 0), input_of(&c, &q, a)),
            Err(LinkRejection::InputOccupied(input_of(&c, &q, a)))
        );

        let before = c.link_count();
        assert!(c.create_link(&q, output_of(&c, &q, b, 0), input_of(&c, &q, a)).is_none());
        assert_eq!(c.link_count(), before);

        // Fan-out from one output is allowed
        assert!(c.can_create_link(&q, entry_out, input_of(&c, &q, b)));
    }

    #[test]
    fn test_links_start_at_outputs() {
        let (mut c, mut q) = character();
        let branch = c.spawn_branch();
        let act = c.spawn_act();
        let quest = c.spawn_accept_quest(&mut q).id;
        c.create_link(&q, input_of(&c, &q, branch), output_of(&c, &q, c.entry_node(), 0));
        c.create_link(&q, output_of(&c, &q, branch, 0), input_of(&c, &q, quest));
        c.create_link(&q, input_of(&c, &q, act), output_of(&c, &q, quest, 0));
        assert_eq!(c.link_count(), 3);
        for link in c.links() {
            assert_eq!(c.find_pin(&q, link.start).unwrap().kind, PinKind::Output);
            assert_eq!(c.find_pin(&q, link.end).unwrap().kind, PinKind::Input);
        }
    }

    #[test]
    fn test_delete_cascades_links() {
        let (mut c, mut q) = character();
        let act = c.spawn_act();
        let dice = c.spawn_dice();
        let uuid = c.spawn_accept_quest(&mut q).uuid;
        let quest = q.get(uuid).unwrap().id;
        c.create_link(&q, output_of(&c, &q, c.entry_node(), 0), input_of(&c, &q, act));
        c.create_link(&q, output_of(&c, &q, act, 0), input_of(&c, &q, dice));
        c.create_link(&q, output_of(&c, &q, dice, 0), input_of(&c, &q, quest));
        let act_pins: Vec<PinId> = c.pins_of(&q, act).unwrap().pins().map(|p| p.id).collect();

        assert!(c.delete_node(act));
        assert!(!c.delete_node(act));
        assert!(c.links().all(|l| !act_pins.iter().any(|p| l.involves_pin(*p))));
        assert_eq!(c.link_count(), 1);

        assert!(c.delete_accept_quest(&mut q, uuid));
        assert_eq!(c.link_count(), 0);
        assert!(q.is_empty());
    }

    #[test]
    fn test_entry_cannot_be_deleted() {
        let (mut c, _) = character();
        assert!(!c.delete_node(c.entry_node()));
        assert_eq!(c.node_count(), 1);
    }

    #[test]
    fn test_branch_expression_edits() {
        let (mut c, q) = character();
        let branch = c.spawn_branch();
        let act = c.spawn_act();
        assert!(c.add_expression(branch));
        let outputs = c.pins_of(&q, branch).unwrap().outputs();
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[2].name, "else");

        let second = output_of(&c, &q, branch, 1);
        c.create_link(&q, second, input_of(&c, &q, act)).unwrap();
        assert!(c.remove_expression(branch, 1));
        assert!(!c.is_pin_linked(second));
        assert_eq!(c.pins_of(&q, branch).unwrap().output_count(), 2);

        assert!(c.add_condition(branch, 0));
        assert!(c.remove_condition(branch, 0, 1));
        assert!(!c.remove_condition(branch, 0, 0));
        assert!(!c.remove_expression(branch, 5));
    }

    #[test]
    fn test_dialogue_and_dice_edits() {
        let (mut c, q) = character();
        let dialogue = c.spawn_dialogue();
        let dice = c.spawn_dice();
        assert!(c.add_prompt(dialogue, "Another one"));
        assert_eq!(c.pins_of(&q, dialogue).unwrap().output_count(), 3);
        assert!(c.remove_prompt(dialogue, 0));
        match &c.node(dialogue).unwrap().kind {
            NodeKind::Dialogue(d) => assert_eq!(d.prompts, ["Something else", "Another one"]),
            other => panic!("unexpected {other:?}"),
        }

        assert!(!c.remove_dice_face(dice, 0));
        assert!(c.add_dice_face(dice));
        assert!(c.remove_dice_face(dice, 2));
        assert!(c.remove_prompt(dialogue, 1));
        assert!(!c.remove_prompt(dialogue, 0));
        assert_eq!(c.pins_of(&q, dialogue).unwrap().output_count(), MIN_DIALOGUE_PROMPTS);
        assert_eq!(c.pins_of(&q, dice).unwrap().output_count(), MIN_DICE_FACES);
        assert!(!c.add_dice_face(dialogue));
    }

    #[test]
    fn test_bubbles() {
        let (mut c, _) = character();
        let act = c.spawn_act();
        assert!(c.add_bubble(act, Bubble::new(crate::node::Speaker::Npc, "Hello")));
        assert!(c.remove_bubble(act, 1).is_none());
        assert_eq!(c.remove_bubble(act, 0).map(|b| b.line), Some("Hello".to_string()));
    }

    #[test]
    fn test_from_parts_roundtrip() {
        let (mut c, mut q) = character();
        let act = c.spawn_act();
        c.spawn_accept_quest(&mut q);
        c.create_link(&q, output_of(&c, &q, c.entry_node(), 0), input_of(&c, &q, act));

        let nodes: Vec<Node> = c.nodes().cloned().collect();
        let links: Vec<Link> = c.links().copied().collect();
        let restored = Character::from_parts(c.id(), "Mochi", nodes, links, &q).unwrap();
        assert_eq!(restored.entry_node(), c.entry_node());
        assert_eq!(restored.link_count(), 1);
        assert_eq!(restored.next_id(), c.max_id(&q) + 1);
    }

    #[test]
    fn test_from_parts_rejects_inconsistencies() {
        let (c, q) = character();
        let entry: Vec<Node> = c.nodes().cloned().collect();

        let dangling = vec![Link::new(LinkId(10), PinId(1), PinId(77))];
        assert_eq!(
            Character::from_parts(c.id(), "x", entry.clone(), dangling, &q).unwrap_err(),
            RestoreError::DanglingLink { link: LinkId(10), pin: PinId(77) }
        );

        let clash = vec![Link::new(LinkId(2), PinId(1), PinId(1))];
        assert_eq!(
            Character::from_parts(c.id(), "x", entry.clone(), clash, &q).unwrap_err(),
            RestoreError::DuplicateId(2)
        );

        assert_eq!(
            Character::from_parts(c.id(), "x", Vec::new(), Vec::new(), &q).unwrap_err(),
            RestoreError::MissingEntry
        );

        let mut twice = entry.clone();
        let mut second = entry[0].clone();
        second.id = NodeId(5);
        second.pins = Some(PinTopology::Single(Pin::output(PinId(6))));
        twice.push(second);
        assert_eq!(
            Character::from_parts(c.id(), "x", twice, Vec::new(), &q).unwrap_err(),
            RestoreError::MultipleEntries
        );
    }

    #[test]
    fn test_from_parts_rejects_reserved_id() {
        let (c, q) = character();
        let mut nodes: Vec<Node> = c.nodes().cloned().collect();
        nodes[0].id = NodeId::INVALID;
        assert_eq!(
            Character::from_parts(c.id(), "x", nodes, Vec::new(), &q).unwrap_err(),
            RestoreError::InvalidId
        );

        let mut act = Character::new(c.id(), "x");
        let act_id = act.spawn_act();
        let nodes: Vec<Node> = act.nodes().cloned().collect();
        let input = act.pins_of(&q, act_id).and_then(PinTopology::input).map(|p| p.id).unwrap();
        let links = vec![Link::new(LinkId::INVALID, PinId(1), input)];
        assert_eq!(
            Character::from_parts(c.id(), "x", nodes, links, &q).unwrap_err(),
            RestoreError::InvalidId
        );
    }

    #[test]
    fn test_from_parts_rejects_ids_without_room() {
        let (c, q) = character();
        for id in [u32::MAX, MAX_OBJECT_ID + 1] {
            let mut nodes: Vec<Node> = c.nodes().cloned().collect();
            nodes[0].id = NodeId(id);
            assert_eq!(
                Character::from_parts(c.id(), "x", nodes, Vec::new(), &q).unwrap_err(),
                RestoreError::IdOutOfRange(id)
            );
        }

        let mut nodes: Vec<Node> = c.nodes().cloned().collect();
        nodes[0].id = NodeId(MAX_OBJECT_ID);
        let mut restored = Character::from_parts(c.id(), "x", nodes, Vec::new(), &q).unwrap();
        let act = restored.spawn_act();
        let second = restored.spawn_act();
        assert_eq!(act, NodeId(MAX_OBJECT_ID + 1));
        assert_ne!(act, second);
        assert!(restored.node(NodeId(MAX_OBJECT_ID)).is_some());
    }
}
