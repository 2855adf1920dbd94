// SPDX-License-Identifier: MIT OR Apache-2.0
//! One-way exports for the playback runtime.
//!
//! The distribution export replaces pins and links with the IDs of the nodes
//! each output leads to, so the runtime never resolves pins itself. An output
//! with nothing attached lists the single target `0`. Layout data and
//! comments are left out.

use crate::error::Result;
use crate::scene::{CharacterData, Scene};
use crate::serializer::{VariableType, VariableValue};
use purupuru_graph::{
    Bubble, Character, Condition, Flavor, Guid, NodeId, NodeKind, ObjectiveSpec, Pin, PinTopology,
    QuestStore, SetOperator,
};
use serde::Serialize;

/// Target ID written for an output with no link
pub const NO_TARGET: u32 = 0;

/// Targets of one output
pub type Targets = Vec<u32>;

/// The exported scene
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    /// Characters in scene order
    #[serde(rename = "Characters")]
    pub characters: Vec<ExportCharacter>,
}

/// One exported character
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportCharacter {
    pub name: String,
    pub flavor: Flavor,
    pub entry_node: ExportSingle,
    pub variable_nodes: Vec<ExportVariable>,
    pub act_nodes: Vec<ExportAct>,
    pub fork_nodes: Vec<ExportMulti>,
    pub branch_nodes: Vec<ExportBranch>,
    pub flavor_check_nodes: Vec<ExportFlavorCheck>,
    pub flavor_match_nodes: Vec<ExportMulti>,
    pub dialogue_nodes: Vec<ExportDialogue>,
    pub accept_quest_nodes: Vec<ExportAcceptQuest>,
    pub return_quest_nodes: Vec<ExportReturnQuest>,
    pub objective_nodes: Vec<ExportObjective>,
    pub dice_nodes: Vec<ExportMulti>,
}

/// A node with one output
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportSingle {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub outputs: Targets,
}

/// A node with several outputs and no payload worth exporting
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportMulti {
    #[serde(rename = "ID")]
    pub id: NodeId,
    #[serde(rename = "UUID", skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Guid>,
    pub outputs: Vec<Targets>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportVariable {
    #[serde(rename = "ID")]
    pub id: NodeId,
    #[serde(rename = "Type")]
    pub variable_type: VariableType,
    pub name: String,
    pub operator: SetOperator,
    pub value: VariableValue,
    pub outputs: Targets,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportAct {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub title: String,
    pub outputs: Targets,
    pub bubbles: Vec<Bubble>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportBranch {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub expressions: Vec<Vec<Condition>>,
    pub outputs: Vec<Targets>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportFlavorCheck {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub for_npc: bool,
    pub outputs: Vec<Targets>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportDialogue {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub prompts: Vec<String>,
    pub outputs: Vec<Targets>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportAcceptQuest {
    #[serde(rename = "ID")]
    pub id: NodeId,
    #[serde(rename = "UUID")]
    pub uuid: Guid,
    pub title: String,
    pub description: String,
    pub objectives: Vec<ObjectiveSpec>,
    pub outputs: Targets,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportReturnQuest {
    #[serde(rename = "ID")]
    pub id: NodeId,
    #[serde(rename = "QuestID")]
    pub quest_id: Guid,
    pub succeed: bool,
    pub outputs: Targets,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportObjective {
    #[serde(rename = "ID")]
    pub id: NodeId,
    #[serde(rename = "QuestID")]
    pub quest_id: Guid,
    #[serde(rename = "ObjectiveID")]
    pub objective_id: Guid,
    pub succeed: bool,
    pub outputs: Targets,
}

/// Resolves outputs to the nodes they lead to
struct TargetResolver<'a> {
    character: &'a Character,
    quests: &'a QuestStore,
}

impl TargetResolver<'_> {
    fn targets(&self, pin: &Pin) -> Targets {
        let targets: Targets = self
            .character
            .links_from(pin.id)
            .filter_map(|link| self.character.find_node_by_pin(self.quests, link.end))
            .map(|node| node.id.value())
            .collect();
        if targets.is_empty() {
            vec![NO_TARGET]
        } else {
            targets
        }
    }

    fn first(&self, pins: &PinTopology) -> Targets {
        pins.output(0).map_or_else(|| vec![NO_TARGET], |pin| self.targets(pin))
    }

    fn all(&self, pins: &PinTopology) -> Vec<Targets> {
        pins.outputs().iter().map(|pin| self.targets(pin)).collect()
    }
}

fn export_character(data: &CharacterData, quests: &QuestStore) -> ExportCharacter {
    let character = &data.character;
    let resolver = TargetResolver { character, quests };
    let entry = character.entry_node();
    let mut out = ExportCharacter {
        name: character.name.clone(),
        flavor: data.flavor,
        entry_node: ExportSingle {
            id: entry,
            outputs: character
                .pins_of(quests, entry)
                .map_or_else(|| vec![NO_TARGET], |pins| resolver.first(pins)),
        },
        variable_nodes: Vec::new(),
        act_nodes: Vec::new(),
        fork_nodes: Vec::new(),
        branch_nodes: Vec::new(),
        flavor_check_nodes: Vec::new(),
        flavor_match_nodes: Vec::new(),
        dialogue_nodes: Vec::new(),
        accept_quest_nodes: Vec::new(),
        return_quest_nodes: Vec::new(),
        objective_nodes: Vec::new(),
        dice_nodes: Vec::new(),
    };

    for node in character.nodes() {
        let Some(pins) = node.pins.as_ref() else {
            continue;
        };
        let id = node.id;
        match &node.kind {
            NodeKind::Entry | NodeKind::Comment(_) => {}
            NodeKind::BoolVariable(v) => out.variable_nodes.push(ExportVariable {
                id,
                variable_type: VariableType::Boolean,
                name: v.name.clone(),
                operator: v.operator,
                value: VariableValue::Boolean(v.value),
                outputs: resolver.first(pins),
            }),
            NodeKind::IntVariable(v) => out.variable_nodes.push(ExportVariable {
                id,
                variable_type: VariableType::Integer,
                name: v.name.clone(),
                operator: v.operator,
                value: VariableValue::Integer(v.value),
                outputs: resolver.first(pins),
            }),
            NodeKind::Act(act) => out.act_nodes.push(ExportAct {
                id,
                title: act.title.clone(),
                outputs: resolver.first(pins),
                bubbles: act.bubbles.clone(),
            }),
            NodeKind::Fork(fork) => out.fork_nodes.push(ExportMulti {
                id,
                uuid: Some(fork.uuid),
                outputs: resolver.all(pins),
            }),
            NodeKind::Branch(branch) => out.branch_nodes.push(ExportBranch {
                id,
                expressions: branch.expressions.clone(),
                outputs: resolver.all(pins),
            }),
            NodeKind::FlavorCheck(check) => out.flavor_check_nodes.push(ExportFlavorCheck {
                id,
                for_npc: check.checking_npc,
                outputs: resolver.all(pins),
            }),
            NodeKind::FlavorMatch => out.flavor_match_nodes.push(ExportMulti {
                id,
                uuid: None,
                outputs: resolver.all(pins),
            }),
            NodeKind::Dialogue(dialogue) => out.dialogue_nodes.push(ExportDialogue {
                id,
                prompts: dialogue.prompts.clone(),
                outputs: resolver.all(pins),
            }),
            NodeKind::ReturnQuest(ret) => out.return_quest_nodes.push(ExportReturnQuest {
                id,
                quest_id: ret.quest,
                succeed: ret.succeed,
                outputs: resolver.first(pins),
            }),
            NodeKind::Objective(objective) => out.objective_nodes.push(ExportObjective {
                id,
                quest_id: objective.quest,
                objective_id: objective.objective,
                succeed: objective.succeed,
                outputs: resolver.first(pins),
            }),
            NodeKind::Dice => out.dice_nodes.push(ExportMulti {
                id,
                uuid: None,
                outputs: resolver.all(pins),
            }),
        }
    }

    for quest in quests.owned_by(character.id()) {
        out.accept_quest_nodes.push(ExportAcceptQuest {
            id: quest.id,
            uuid: quest.uuid,
            title: quest.title.clone(),
            description: quest.description.clone(),
            objectives: quest.objectives.clone(),
            outputs: resolver.first(&quest.pins),
        });
    }

    out
}

/// Build the distribution view of `scene`
pub fn to_export(scene: &Scene) -> ExportDocument {
    ExportDocument {
        characters: scene
            .characters()
            .map(|data| export_character(data, scene.quests()))
            .collect(),
    }
}

/// Encode the distribution view as JSON
pub fn to_json(scene: &Scene, pretty: bool) -> Result<String> {
    let document = to_export(scene);
    let json = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    Ok(json)
}

/// Every Act bubble line, one per line, characters and nodes in scene order.
/// Line breaks inside a bubble are written as single spaces.
pub fn lines(scene: &Scene) -> String {
    let mut out = String::new();
    for node in scene.characters().flat_map(|c| c.character.nodes()) {
        if let NodeKind::Act(act) = &node.kind {
            for bubble in &act.bubbles {
                let parts = bubble.line.split(['\r', '\n']).filter(|part| !part.is_empty());
                for (index, part) in parts.enumerate() {
                    if index > 0 {
                        out.push(' ');
                    }
                    out.push_str(part);
                }
                out.push('\n');
            }
        }
    }
    out
}
