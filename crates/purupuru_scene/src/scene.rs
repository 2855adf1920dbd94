// SPDX-License-Identifier: MIT OR Apache-2.0
//! A scene: every character of a story plus the quest store they share.

use crate::error::{Result, SceneError};
use purupuru_graph::{
    Character, CharacterId, EvaluationState, Flavor, FlavorPair, NodeKind, QuestStore, Walker,
};
use std::path::Path;

/// A character together with its scene-level attributes
#[derive(Debug, Clone)]
pub struct CharacterData {
    /// The character's graph
    pub character: Character,
    /// The character's own flavor, used as the NPC side of flavor nodes
    pub flavor: Flavor,
}

/// All characters of a story and the quests they author
#[derive(Debug, Clone, Default)]
pub struct Scene {
    characters: Vec<CharacterData>,
    quests: QuestStore,
    next_character: u32,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a character holding only its Entry node
    pub fn add_character(&mut self, name: impl Into<String>) -> CharacterId {
        let id = CharacterId(self.next_character);
        self.next_character += 1;
        let character = Character::new(id, name);
        tracing::info!("Added character {} ({})", character.name, id);
        self.characters.push(CharacterData {
            character,
            flavor: Flavor::default(),
        });
        id
    }

    /// Add a restored character, keeping its identifier
    pub(crate) fn insert_character(&mut self, data: CharacterData) {
        self.next_character = self.next_character.max(data.character.id().0 + 1);
        self.characters.push(data);
    }

    /// Allocate the identifier the next restored character will use
    pub(crate) fn reserve_character_id(&mut self) -> CharacterId {
        let id = CharacterId(self.next_character);
        self.next_character += 1;
        id
    }

    /// Remove a character and every quest it authored
    pub fn remove_character(&mut self, id: CharacterId) -> bool {
        let Some(index) = self.characters.iter().position(|c| c.character.id() == id) else {
            tracing::debug!("Cannot remove unknown character {}", id);
            return false;
        };
        let data = self.characters.remove(index);
        let quests = self.quests.remove_owned_by(id);
        tracing::info!("Removed character {} and {} quests", data.character.name, quests);
        true
    }

    /// Get a character
    pub fn character(&self, id: CharacterId) -> Option<&CharacterData> {
        self.characters.iter().find(|c| c.character.id() == id)
    }

    /// Get a mutable character
    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut CharacterData> {
        self.characters.iter_mut().find(|c| c.character.id() == id)
    }

    /// Find a character by name
    pub fn character_by_name(&self, name: &str) -> Option<&CharacterData> {
        self.characters.iter().find(|c| c.character.name == name)
    }

    /// Get a character and the quest store at once, as needed to spawn or
    /// link Accept Quest nodes
    pub fn character_and_quests_mut(
        &mut self,
        id: CharacterId,
    ) -> Option<(&mut CharacterData, &mut QuestStore)> {
        let data = self.characters.iter_mut().find(|c| c.character.id() == id)?;
        Some((data, &mut self.quests))
    }

    /// All characters in creation order
    pub fn characters(&self) -> impl Iterator<Item = &CharacterData> {
        self.characters.iter()
    }

    /// Number of characters
    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    /// The shared quest store
    pub fn quests(&self) -> &QuestStore {
        &self.quests
    }

    /// The shared quest store, mutably
    pub fn quests_mut(&mut self) -> &mut QuestStore {
        &mut self.quests
    }

    /// A walker over one character's graph
    pub fn walker(&self, id: CharacterId) -> Result<Walker<'_>> {
        let data = self.character(id).ok_or(SceneError::UnknownCharacter(id))?;
        Ok(Walker::new(&data.character, &self.quests))
    }

    /// The flavor pair of a conversation between the player and `id`
    pub fn flavor_pair(&self, id: CharacterId, main: Flavor) -> Result<FlavorPair> {
        let data = self.character(id).ok_or(SceneError::UnknownCharacter(id))?;
        Ok(FlavorPair::new(main, data.flavor))
    }

    /// Reset `state` for a new run: every variable any character sets starts
    /// as `false` or `0`. Fork flags are left unset.
    pub fn prepare_state(&self, state: &mut EvaluationState) {
        state.clear();
        for node in self.characters.iter().flat_map(|c| c.character.nodes()) {
            match &node.kind {
                NodeKind::BoolVariable(variable) => state.set_bool(variable.name.clone(), false),
                NodeKind::IntVariable(variable) => state.set_int(variable.name.clone(), 0),
                _ => {}
            }
        }
    }

    /// Remove every character and quest
    pub fn clear(&mut self) {
        self.characters.clear();
        self.quests.clear();
        self.next_character = 0;
    }

    /// Load a scene file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scene = crate::serializer::from_str(&content)?;
        tracing::info!(
            "Loaded {} characters and {} quests from {}",
            scene.character_count(),
            scene.quests.len(),
            path.display()
        );
        Ok(scene)
    }

    /// Replace this scene with the contents of a file. On failure the scene
    /// is left untouched.
    pub fn reload(&mut self, path: &Path) -> Result<()> {
        *self = Self::load(path)?;
        Ok(())
    }

    /// Save the scene to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = crate::serializer::to_string(self)?;
        std::fs::write(path, content)?;
        tracing::info!("Saved scene to {}", path.display());
        Ok(())
    }

    /// Write the distribution export to a file
    pub fn export_distribution(&self, path: &Path, pretty: bool) -> Result<()> {
        let content = crate::export::to_json(self, pretty)?;
        std::fs::write(path, content)?;
        tracing::info!("Exported scene to {}", path.display());
        Ok(())
    }

    /// Write every Act bubble line to a text file
    pub fn export_lines(&self, path: &Path) -> Result<()> {
        std::fs::write(path, crate::export::lines(self))?;
        tracing::info!("Exported dialogue lines to {}", path.display());
        Ok(())
    }
}
