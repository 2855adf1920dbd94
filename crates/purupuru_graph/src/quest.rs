// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cross-character quest registry.
//!
//! Accept Quest nodes live here rather than in a character graph: every
//! character may return a quest or resolve an objective authored by another
//! one, referencing it by [`Guid`]. Each quest remembers its owner so it can
//! be saved with, and its pins resolved against, the character that spawned
//! it.

use crate::guid::Guid;
use crate::id::{CharacterId, IdAllocator, NodeId, PinId};
use crate::pin::{Pin, PinTopology};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Label shown when a Return Quest node points at no known quest
pub const NO_QUEST_SELECTED: &str = "Select Quest";

/// Label shown when an Objective node points at no known objective
pub const NO_OBJECTIVE_SELECTED: &str = "Select Objective";

/// An objective of a quest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    /// Identity referenced by Objective nodes
    #[serde(rename = "UUID")]
    pub uuid: Guid,
    /// Title
    #[serde(rename = "Title")]
    pub title: String,
    /// Description
    #[serde(rename = "Description")]
    pub description: String,
    /// Whether completing the quest requires this objective
    #[serde(rename = "IsOptional")]
    pub is_optional: bool,
}

impl ObjectiveSpec {
    /// Create a new objective with a fresh identity
    pub fn new() -> Self {
        Self {
            uuid: Guid::new(),
            title: "Your Title".to_string(),
            description: "Write the objective's description".to_string(),
            is_optional: false,
        }
    }
}

impl Default for ObjectiveSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// An Accept Quest node
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptQuestNode {
    /// Node ID, allocated from the owner's counter
    pub id: NodeId,
    /// Position on the owner's canvas
    pub position: [f32; 2],
    /// Identity referenced by Return Quest and Objective nodes
    pub uuid: Guid,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Character that authored the quest
    pub owner: CharacterId,
    /// Objectives in display order
    pub objectives: Vec<ObjectiveSpec>,
    /// Input/output pins
    pub pins: PinTopology,
}

impl AcceptQuestNode {
    /// Append a new objective and return its identity
    pub fn add_objective(&mut self) -> Guid {
        let objective = ObjectiveSpec::new();
        let uuid = objective.uuid;
        self.objectives.push(objective);
        uuid
    }

    /// Remove an objective by identity
    pub fn remove_objective(&mut self, uuid: Guid) -> Option<ObjectiveSpec> {
        let index = self.objectives.iter().position(|o| o.uuid == uuid)?;
        Some(self.objectives.remove(index))
    }

    /// Find an objective by identity
    pub fn objective(&self, uuid: Guid) -> Option<&ObjectiveSpec> {
        self.objectives.iter().find(|o| o.uuid == uuid)
    }

    /// Highest identifier used by the node or its pins
    pub fn max_id(&self) -> u32 {
        self.id.value().max(self.pins.max_id())
    }
}

/// Registry of every Accept Quest node, keyed by quest identity
#[derive(Debug, Clone, Default)]
pub struct QuestStore {
    quests: IndexMap<Guid, AcceptQuestNode>,
}

impl QuestStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a quest owned by `owner`, drawing node and pin IDs from the
    /// owner's allocator
    pub fn spawn(&mut self, owner: CharacterId, ids: &mut IdAllocator) -> &mut AcceptQuestNode {
        let id = ids.next_node();
        let pins = PinTopology::InputOutput {
            input: Pin::input(ids.next_pin()),
            output: Pin::output(ids.next_pin()),
        };
        let quest = AcceptQuestNode {
            id,
            position: [0.0, 0.0],
            uuid: Guid::new(),
            title: "Your Title".to_string(),
            description: "Write the quest's description".to_string(),
            owner,
            objectives: Vec::new(),
            pins,
        };
        tracing::debug!("Spawned quest {} for character {}", quest.uuid, owner);
        self.quests.entry(quest.uuid).or_insert(quest)
    }

    /// Insert a fully built quest, replacing any quest with the same identity
    pub fn insert(&mut self, quest: AcceptQuestNode) -> Option<AcceptQuestNode> {
        self.quests.insert(quest.uuid, quest)
    }

    /// Remove a quest
    pub fn remove(&mut self, uuid: Guid) -> Option<AcceptQuestNode> {
        self.quests.shift_remove(&uuid)
    }

    /// Remove every quest authored by `owner`
    pub fn remove_owned_by(&mut self, owner: CharacterId) -> usize {
        let before = self.quests.len();
        self.quests.retain(|_, q| q.owner != owner);
        before - self.quests.len()
    }

    /// Get a quest by identity
    pub fn get(&self, uuid: Guid) -> Option<&AcceptQuestNode> {
        self.quests.get(&uuid)
    }

    /// Get a mutable quest by identity
    pub fn get_mut(&mut self, uuid: Guid) -> Option<&mut AcceptQuestNode> {
        self.quests.get_mut(&uuid)
    }

    /// All quests in creation order
    pub fn quests(&self) -> impl Iterator<Item = &AcceptQuestNode> {
        self.quests.values()
    }

    /// Quests authored by `owner`
    pub fn owned_by(&self, owner: CharacterId) -> impl Iterator<Item = &AcceptQuestNode> {
        self.quests.values().filter(move |q| q.owner == owner)
    }

    /// Find the quest node `node_id` of `owner`
    pub fn find_node(&self, owner: CharacterId, node_id: NodeId) -> Option<&AcceptQuestNode> {
        self.owned_by(owner).find(|q| q.id == node_id)
    }

    /// Find the quest node of `owner` carrying `pin_id`
    pub fn find_by_pin(&self, owner: CharacterId, pin_id: PinId) -> Option<&AcceptQuestNode> {
        self.owned_by(owner).find(|q| q.pins.contains(pin_id))
    }

    /// Identity of the quest node `node_id` of `owner`
    pub fn uuid_of(&self, owner: CharacterId, node_id: NodeId) -> Option<Guid> {
        self.find_node(owner, node_id).map(|q| q.uuid)
    }

    /// Title of a quest, or the "nothing selected" label
    pub fn quest_title(&self, quest: Guid) -> &str {
        if quest.is_nil() {
            return NO_QUEST_SELECTED;
        }
        self.get(quest).map_or(NO_QUEST_SELECTED, |q| q.title.as_str())
    }

    /// Title of an objective, or the "nothing selected" label
    pub fn objective_title(&self, quest: Guid, objective: Guid) -> &str {
        if quest.is_nil() || objective.is_nil() {
            return NO_OBJECTIVE_SELECTED;
        }
        self.get(quest)
            .and_then(|q| q.objective(objective))
            .map_or(NO_OBJECTIVE_SELECTED, |o| o.title.as_str())
    }

    /// Number of quests
    pub fn len(&self) -> usize {
        self.quests.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    /// Remove every quest
    pub fn clear(&mut self) {
        self.quests.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_allocates_from_owner() {
        let mut store = QuestStore::new();
        let mut ids = IdAllocator::new();
        let quest = store.spawn(CharacterId(3), &mut ids);
        assert_eq!(quest.id, NodeId(1));
        assert_eq!(quest.owner, CharacterId(3));
        assert!(!quest.uuid.is_nil());
        assert_eq!(quest.pins.max_id(), 3);
        assert_eq!(ids.peek(), 4);
    }

    #[test]
    fn test_titles() {
        let mut store = QuestStore::new();
        let mut ids = IdAllocator::new();
        let quest = store.spawn(CharacterId(0), &mut ids);
        quest.title = "Find the spoon".to_string();
        let objective = quest.add_objective();
        quest.objectives[0].title = "Search the kitchen".to_string();
        let uuid = quest.uuid;

        assert_eq!(store.quest_title(uuid), "Find the spoon");
        assert_eq!(store.quest_title(Guid::nil()), NO_QUEST_SELECTED);
        assert_eq!(store.quest_title(Guid::new()), NO_QUEST_SELECTED);
        assert_eq!(store.objective_title(uuid, objective), "Search the kitchen");
        assert_eq!(store.objective_title(uuid, Guid::nil()), NO_OBJECTIVE_SELECTED);
        assert_eq!(store.objective_title(Guid::new(), objective), NO_OBJECTIVE_SELECTED);
    }

    #[test]
    fn test_lookup_is_per_owner() {
        let mut store = QuestStore::new();
        let mut a = IdAllocator::new();
        let mut b = IdAllocator::new();
        store.spawn(CharacterId(0), &mut a);
        store.spawn(CharacterId(1), &mut b);

        // Both quests use node 1 and pins 2..3 of their own owners
        let first = store.find_by_pin(CharacterId(0), PinId(2)).unwrap();
        let second = store.find_by_pin(CharacterId(1), PinId(2)).unwrap();
        assert_ne!(first.uuid, second.uuid);

        assert_eq!(store.remove_owned_by(CharacterId(0)), 1);
        assert_eq!(store.len(), 1);
        assert!(store.find_node(CharacterId(0), NodeId(1)).is_none());
    }

    #[test]
    fn test_objectives() {
        let mut store = QuestStore::new();
        let mut ids = IdAllocator::new();
        let quest = store.spawn(CharacterId(0), &mut ids);
        let first = quest.add_objective();
        let second = quest.add_objective();
        assert_ne!(first, second);
        assert!(quest.remove_objective(first).is_some());
        assert!(quest.remove_objective(first).is_none());
        assert_eq!(quest.objectives.len(), 1);
        assert!(quest.objective(second).is_some());
    }
}
