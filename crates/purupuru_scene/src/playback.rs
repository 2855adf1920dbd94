// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless playback of one character's conversation.
//!
//! A [`Playback`] walks from the Entry node and stops only where the player
//! has something to see or decide: each bubble of an Act node, and the prompt
//! list of a Dialogue node. Everything in between is crossed automatically,
//! bounded by [`PlaybackSettings::max_auto_steps`].

use crate::error::{Result, SceneError};
use crate::scene::Scene;
use crate::settings::PlaybackSettings;
use purupuru_graph::{
    Bubble, CharacterId, EvaluationState, FlavorPair, Guid, NodeKind, NodeRef, NodeType, Step,
    WalkFault,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Where a playback session stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    /// Showing a bubble of an Act node
    Speaking,
    /// Waiting for a Dialogue choice
    Choosing,
    /// The path reached an output with no link
    Ended,
    /// The graph could not be walked
    Broken(WalkFault),
    /// Too many non-interactive nodes were crossed in one go
    Stalled,
}

/// A quest effect crossed during playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestEvent {
    /// An Accept Quest node offered its quest
    Accepted {
        /// Quest identity
        quest: Guid,
        /// Quest title
        title: String,
    },
    /// A Return Quest node closed a quest
    Returned {
        /// Quest identity
        quest: Guid,
        /// Quest title, or the unselected placeholder
        title: String,
        /// Whether the quest succeeded
        succeed: bool,
    },
    /// An Objective node settled one objective
    Objective {
        /// Quest identity
        quest: Guid,
        /// Objective identity
        objective: Guid,
        /// Objective title, or the unselected placeholder
        title: String,
        /// Whether the objective succeeded
        succeed: bool,
    },
}

/// A running conversation with one character
#[derive(Debug)]
pub struct Playback {
    character: CharacterId,
    flavors: FlavorPair,
    state: EvaluationState,
    rng: StdRng,
    max_auto_steps: usize,
    current: NodeRef,
    bubble: usize,
    playback_state: PlaybackState,
    quest_log: Vec<QuestEvent>,
}

impl Playback {
    /// Start a conversation with `character` and run to the first bubble,
    /// choice or ending
    pub fn start(scene: &Scene, character: CharacterId, settings: &PlaybackSettings) -> Result<Self> {
        let data = scene
            .character(character)
            .ok_or(SceneError::UnknownCharacter(character))?;
        let flavors = scene.flavor_pair(character, settings.main_character_flavor)?;
        let mut state = EvaluationState::new();
        scene.prepare_state(&mut state);
        let rng = match settings.dice_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let entry = NodeRef {
            id: data.character.entry_node(),
            node_type: NodeType::Entry,
        };

        tracing::debug!("Starting playback of {}", data.character.name);
        let mut playback = Self {
            character,
            flavors,
            state,
            rng,
            max_auto_steps: settings.max_auto_steps,
            current: entry,
            bubble: 0,
            playback_state: PlaybackState::Speaking,
            quest_log: Vec::new(),
        };
        playback.run_from(scene, entry)?;
        Ok(playback)
    }

    /// The node the session is showing, or stopped at
    pub fn current(&self) -> NodeRef {
        self.current
    }

    /// Where the session stands
    pub fn playback_state(&self) -> &PlaybackState {
        &self.playback_state
    }

    /// Whether no further input is accepted
    pub fn is_finished(&self) -> bool {
        !matches!(self.playback_state, PlaybackState::Speaking | PlaybackState::Choosing)
    }

    /// Variables and fork flags as they stand
    pub fn state(&self) -> &EvaluationState {
        &self.state
    }

    /// Quest effects crossed so far, oldest first
    pub fn quest_log(&self) -> &[QuestEvent] {
        &self.quest_log
    }

    /// The bubble being shown
    pub fn current_bubble<'s>(&self, scene: &'s Scene) -> Option<&'s Bubble> {
        if self.playback_state != PlaybackState::Speaking {
            return None;
        }
        act_bubbles(scene, self.character, self.current)?.get(self.bubble)
    }

    /// The prompts on offer
    pub fn prompts<'s>(&self, scene: &'s Scene) -> Option<&'s [String]> {
        if self.playback_state != PlaybackState::Choosing {
            return None;
        }
        dialogue_prompts(scene, self.character, self.current)
    }

    /// Move past the bubble being shown. After the last bubble of an Act
    /// node the walk continues to the next stop.
    pub fn next_bubble(&mut self, scene: &Scene) -> Result<()> {
        if self.playback_state != PlaybackState::Speaking {
            return Err(SceneError::UnexpectedInput("a bubble to advance"));
        }
        let count = act_bubbles(scene, self.character, self.current).map_or(0, <[Bubble]>::len);
        self.bubble += 1;
        if self.bubble < count {
            return Ok(());
        }
        self.leave(scene, None)
    }

    /// Pick a prompt of the Dialogue node on offer
    pub fn choose(&mut self, scene: &Scene, choice: usize) -> Result<()> {
        if self.playback_state != PlaybackState::Choosing {
            return Err(SceneError::UnexpectedInput("a dialogue choice"));
        }
        let count = dialogue_prompts(scene, self.character, self.current).map_or(0, <[String]>::len);
        if choice >= count {
            return Err(SceneError::ChoiceOutOfRange { choice, count });
        }
        self.leave(scene, Some(choice))
    }

    fn leave(&mut self, scene: &Scene, choice: Option<usize>) -> Result<()> {
        let walker = scene.walker(self.character)?;
        let step = walker.advance(self.current.id, &mut self.state, self.flavors, choice, &mut self.rng);
        match step {
            Step::Next(next) => self.run_from(scene, next),
            Step::End => {
                self.finish(PlaybackState::Ended);
                Ok(())
            }
            Step::Broken(fault) => {
                self.finish(PlaybackState::Broken(fault));
                Ok(())
            }
        }
    }

    fn run_from(&mut self, scene: &Scene, start: NodeRef) -> Result<()> {
        let walker = scene.walker(self.character)?;
        let mut node = start;
        let mut steps = 0;
        loop {
            self.current = node;
            match node.node_type {
                NodeType::Act
                    if act_bubbles(scene, self.character, node).is_some_and(|b| !b.is_empty()) =>
                {
                    self.bubble = 0;
                    self.playback_state = PlaybackState::Speaking;
                    return Ok(());
                }
                NodeType::Dialogue => {
                    // A loaded file may carry a Dialogue nothing can be chosen from
                    if dialogue_prompts(scene, self.character, node).is_some_and(|p| !p.is_empty()) {
                        self.playback_state = PlaybackState::Choosing;
                    } else {
                        self.finish(PlaybackState::Broken(WalkFault::NoOutputs(node.id)));
                    }
                    return Ok(());
                }
                _ => {}
            }
            if steps == self.max_auto_steps {
                self.finish(PlaybackState::Stalled);
                return Ok(());
            }
            steps += 1;

            self.record_quest_event(scene, node);
            match walker.advance(node.id, &mut self.state, self.flavors, None, &mut self.rng) {
                Step::Next(next) => node = next,
                Step::End => {
                    self.finish(PlaybackState::Ended);
                    return Ok(());
                }
                Step::Broken(fault) => {
                    self.finish(PlaybackState::Broken(fault));
                    return Ok(());
                }
            }
        }
    }

    fn record_quest_event(&mut self, scene: &Scene, node: NodeRef) {
        let quests = scene.quests();
        let event = match node.node_type {
            NodeType::AcceptQuest => quests.find_node(self.character, node.id).map(|quest| {
                QuestEvent::Accepted {
                    quest: quest.uuid,
                    title: quest.title.clone(),
                }
            }),
            NodeType::ReturnQuest | NodeType::Objective => scene
                .character(self.character)
                .and_then(|data| data.character.node(node.id))
                .and_then(|n| match &n.kind {
                    NodeKind::ReturnQuest(ret) => Some(QuestEvent::Returned {
                        quest: ret.quest,
                        title: quests.quest_title(ret.quest).to_string(),
                        succeed: ret.succeed,
                    }),
                    NodeKind::Objective(objective) => Some(QuestEvent::Objective {
                        quest: objective.quest,
                        objective: objective.objective,
                        title: quests.objective_title(objective.quest, objective.objective).to_string(),
                        succeed: objective.succeed,
                    }),
                    _ => None,
                }),
            _ => None,
        };
        if let Some(event) = event {
            tracing::debug!("Quest event: {:?}", event);
            self.quest_log.push(event);
        }
    }

    fn finish(&mut self, state: PlaybackState) {
        tracing::debug!("Playback stopped at {}: {:?}", self.current.id, state);
        self.playback_state = state;
    }
}

fn act_bubbles(scene: &Scene, character: CharacterId, node: NodeRef) -> Option<&[Bubble]> {
    match &scene.character(character)?.character.node(node.id)?.kind {
        NodeKind::Act(act) => Some(&act.bubbles),
        _ => None,
    }
}

fn dialogue_prompts(scene: &Scene, character: CharacterId, node: NodeRef) -> Option<&[String]> {
    match &scene.character(character)?.character.node(node.id)?.kind {
        NodeKind::Dialogue(dialogue) => Some(&dialogue.prompts),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use purupuru_graph::{NodeId, PinTopology, Speaker};

    fn seeded() -> PlaybackSettings {
        PlaybackSettings {
            dice_seed: Some(3),
            ..PlaybackSettings::default()
        }
    }

    fn link(scene: &mut Scene, id: CharacterId, from: NodeId, output: usize, to: NodeId) {
        let (data, quests) = scene.character_and_quests_mut(id).unwrap();
        let c = &mut data.character;
        let start = c.pins_of(quests, from).unwrap().output(output).unwrap().id;
        let end = c.pins_of(quests, to).unwrap().input().unwrap().id;
        c.create_link(quests, start, end).unwrap();
    }

    fn act(scene: &mut Scene, id: CharacterId, lines: &[&str]) -> NodeId {
        let c = &mut scene.character_mut(id).unwrap().character;
        let act = c.spawn_act();
        for line in lines {
            c.add_bubble(act, Bubble::new(Speaker::Npc, *line));
        }
        act
    }

    #[test]
    fn test_empty_character_ends() {
        let mut scene = Scene::new();
        let id = scene.add_character("Mochi");
        let playback = Playback::start(&scene, id, &seeded()).unwrap();
        assert!(playback.is_finished());
        assert_eq!(playback.playback_state(), &PlaybackState::Ended);
    }

    #[test]
    fn test_bubbles_then_choice() {
        let mut scene = Scene::new();
        let id = scene.add_character("Mochi");
        let entry = scene.character(id).unwrap().character.entry_node();
        let greeting = act(&mut scene, id, &["Hi", "Want tea?"]);
        let dialogue = scene.character_mut(id).unwrap().character.spawn_dialogue();
        let yes = act(&mut scene, id, &["Here you go"]);
        link(&mut scene, id, entry, 0, greeting);
        link(&mut scene, id, greeting, 0, dialogue);
        link(&mut scene, id, dialogue, 1, yes);

        let mut playback = Playback::start(&scene, id, &seeded()).unwrap();
        assert_eq!(playback.current_bubble(&scene).unwrap().line, "Hi");
        assert!(matches!(playback.choose(&scene, 0), Err(SceneError::UnexpectedInput(_))));
        playback.next_bubble(&scene).unwrap();
        assert_eq!(playback.current_bubble(&scene).unwrap().line, "Want tea?");
        playback.next_bubble(&scene).unwrap();

        assert_eq!(playback.playback_state(), &PlaybackState::Choosing);
        assert_eq!(playback.prompts(&scene).unwrap().len(), 2);
        assert!(matches!(
            playback.choose(&scene, 2),
            Err(SceneError::ChoiceOutOfRange { choice: 2, count: 2 })
        ));
        playback.choose(&scene, 1).unwrap();
        assert_eq!(playback.current().id, yes);
        playback.next_bubble(&scene).unwrap();
        assert_eq!(playback.playback_state(), &PlaybackState::Ended);
        assert!(playback.next_bubble(&scene).is_err());
    }

    #[test]
    fn test_act_without_bubbles_is_crossed() {
        let mut scene = Scene::new();
        let id = scene.add_character("Mochi");
        let entry = scene.character(id).unwrap().character.entry_node();
        let silent = act(&mut scene, id, &[]);
        let spoken = act(&mut scene, id, &["Hello"]);
        link(&mut scene, id, entry, 0, silent);
        link(&mut scene, id, silent, 0, spoken);

        let playback = Playback::start(&scene, id, &seeded()).unwrap();
        assert_eq!(playback.current().id, spoken);
    }

    #[test]
    fn test_quest_log() {
        let mut scene = Scene::new();
        let id = scene.add_character("Mochi");
        let entry = scene.character(id).unwrap().character.entry_node();
        let (data, quests) = scene.character_and_quests_mut(id).unwrap();
        let quest = data.character.spawn_accept_quest(quests);
        quest.title = "Find the cat".to_string();
        let (accept, uuid) = (quest.id, quest.uuid);
        let ret = data.character.spawn_return_quest();
        if let Some(NodeKind::ReturnQuest(r)) = data.character.node_mut(ret).map(|n| &mut n.kind) {
            r.quest = uuid;
        }
        link(&mut scene, id, entry, 0, accept);
        link(&mut scene, id, accept, 0, ret);

        let playback = Playback::start(&scene, id, &seeded()).unwrap();
        assert_eq!(
            playback.quest_log(),
            [
                QuestEvent::Accepted {
                    quest: uuid,
                    title: "Find the cat".to_string(),
                },
                QuestEvent::Returned {
                    quest: uuid,
                    title: "Find the cat".to_string(),
                    succeed: true,
                },
            ]
        );
    }

    #[test]
    fn test_step_limit_stalls() {
        let mut scene = Scene::new();
        let id = scene.add_character("Mochi");
        let entry = scene.character(id).unwrap().character.entry_node();
        let a = scene.character_mut(id).unwrap().character.spawn_bool_variable();
        let b = scene.character_mut(id).unwrap().character.spawn_bool_variable();
        link(&mut scene, id, entry, 0, a);
        link(&mut scene, id, a, 0, b);

        let settings = PlaybackSettings {
            max_auto_steps: 1,
            ..seeded()
        };
        let playback = Playback::start(&scene, id, &settings).unwrap();
        assert_eq!(playback.playback_state(), &PlaybackState::Stalled);
        assert_eq!(playback.current().id, a);
    }

    #[test]
    fn test_broken_walk_is_reported() {
        let mut scene = Scene::new();
        let id = scene.add_character("Mochi");
        let entry = scene.character(id).unwrap().character.entry_node();
        let gold = scene.character_mut(id).unwrap().character.spawn_int_variable();
        if let Some(NodeKind::IntVariable(v)) =
            scene.character_mut(id).unwrap().character.node_mut(gold).map(|n| &mut n.kind)
        {
            v.name = "gold".to_string();
            v.operator = purupuru_graph::SetOperator::Divide;
            v.value = 0;
        }
        link(&mut scene, id, entry, 0, gold);

        let playback = Playback::start(&scene, id, &seeded()).unwrap();
        assert!(matches!(
            playback.playback_state(),
            PlaybackState::Broken(WalkFault::DivisionByZero(_))
        ));
        assert!(playback.is_finished());
    }

    #[test]
    fn test_dialogue_without_prompts_is_a_dead_end() {
        let mut scene = Scene::new();
        let id = scene.add_character("Mochi");
        let entry = scene.character(id).unwrap().character.entry_node();
        let dialogue = scene.character_mut(id).unwrap().character.spawn_dialogue();
        link(&mut scene, id, entry, 0, dialogue);
        let node = scene.character_mut(id).unwrap().character.node_mut(dialogue).unwrap();
        if let NodeKind::Dialogue(d) = &mut node.kind {
            d.prompts.clear();
        }
        node.pins.as_mut().and_then(PinTopology::outputs_mut).unwrap().clear();

        let mut playback = Playback::start(&scene, id, &seeded()).unwrap();
        assert_eq!(
            playback.playback_state(),
            &PlaybackState::Broken(WalkFault::NoOutputs(dialogue))
        );
        assert!(playback.is_finished());
        assert!(playback.prompts(&scene).is_none());
        assert!(matches!(playback.choose(&scene, 0), Err(SceneError::UnexpectedInput(_))));
    }
}
