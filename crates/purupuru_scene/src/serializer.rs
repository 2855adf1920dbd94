// SPDX-License-Identifier: MIT OR Apache-2.0
//! Round-trip scene persistence.
//!
//! The document mirrors the editor's view of a character: one collection per
//! node variant, each record carrying its ID, canvas position, payload and
//! pin IDs, followed by the link list. Accept Quest nodes are written with the
//! character that owns them.

use crate::error::{Result, SceneError};
use crate::scene::{CharacterData, Scene};
use purupuru_graph::{
    AcceptQuestNode, ActNode, BranchNode, Bubble, CharacterId, Character, CommentNode, Condition,
    DialogueNode, Flavor, FlavorCheckNode, ForkNode, Guid, Link, Node, NodeId, NodeKind,
    ObjectiveNode, ObjectiveSpec, Pin, PinId, PinTopology, ReturnQuestNode, SetOperator,
    VariableNode,
};
use purupuru_graph::character::MIN_DICE_FACES;
use serde::{Deserialize, Serialize};

/// Current scene format version
pub const SCENE_FORMAT_VERSION: u32 = 1;

/// A whole scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Format version
    #[serde(rename = "Version")]
    pub version: u32,
    /// Characters in scene order
    #[serde(rename = "Characters")]
    pub characters: Vec<CharacterRecord>,
}

/// One character and everything it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CharacterRecord {
    /// Character name
    pub name: String,
    /// The character's own flavor
    #[serde(default)]
    pub flavor: Option<Flavor>,
    /// The Entry node
    pub entry_node: EntryRecord,
    /// Boolean and integer Set Variable nodes
    #[serde(default)]
    pub variable_nodes: Vec<VariableRecord>,
    /// Act nodes
    #[serde(default)]
    pub act_nodes: Vec<ActRecord>,
    /// Fork nodes
    #[serde(default)]
    pub fork_nodes: Vec<ForkRecord>,
    /// Branch nodes
    #[serde(default)]
    pub branch_nodes: Vec<BranchRecord>,
    /// Dialogue nodes
    #[serde(default)]
    pub dialogue_nodes: Vec<DialogueRecord>,
    /// Flavor Match nodes
    #[serde(default)]
    pub flavor_match_nodes: Vec<FlavorMatchRecord>,
    /// Flavor Check nodes
    #[serde(default)]
    pub flavor_check_nodes: Vec<FlavorCheckRecord>,
    /// Dice nodes
    #[serde(default)]
    pub dice_nodes: Vec<DiceRecord>,
    /// Accept Quest nodes owned by the character
    #[serde(default)]
    pub accept_quest_nodes: Vec<AcceptQuestRecord>,
    /// Return Quest nodes
    #[serde(default)]
    pub return_quest_nodes: Vec<ReturnQuestRecord>,
    /// Objective nodes
    #[serde(default)]
    pub objective_nodes: Vec<ObjectiveRecord>,
    /// Comments
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    /// Links
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Entry node record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntryRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub position: [f32; 2],
    pub output: PinId,
}

/// Which variable a Set Variable record updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    /// A boolean variable
    Boolean,
    /// An integer variable
    Integer,
}

/// Literal of a Set Variable record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// Boolean literal
    Boolean(bool),
    /// Integer literal
    Integer(i32),
}

/// Set Variable node record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VariableRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub position: [f32; 2],
    #[serde(rename = "Type")]
    pub variable_type: VariableType,
    pub name: String,
    pub operator: SetOperator,
    pub value: VariableValue,
    pub input: PinId,
    pub output: PinId,
}

/// Act node record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub position: [f32; 2],
    pub title: String,
    pub input: PinId,
    pub output: PinId,
    #[serde(default)]
    pub bubbles: Vec<Bubble>,
}

/// Fork node record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForkRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub position: [f32; 2],
    #[serde(rename = "UUID")]
    pub uuid: Guid,
    pub input: PinId,
    pub outputs: [PinId; 2],
}

/// Branch node record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BranchRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub position: [f32; 2],
    pub expressions: Vec<Vec<Condition>>,
    pub input: PinId,
    pub outputs: Vec<PinId>,
}

/// Dialogue node record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DialogueRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub position: [f32; 2],
    pub prompts: Vec<String>,
    pub input: PinId,
    pub outputs: Vec<PinId>,
}

/// Flavor Match node record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlavorMatchRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub position: [f32; 2],
    pub input: PinId,
    pub outputs: [PinId; 2],
}

/// Flavor Check node record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlavorCheckRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub position: [f32; 2],
    pub for_npc: bool,
    pub input: PinId,
    pub outputs: [PinId; 5],
}

/// Dice node record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiceRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub position: [f32; 2],
    pub input: PinId,
    pub outputs: Vec<PinId>,
}

/// Accept Quest node record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AcceptQuestRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub position: [f32; 2],
    #[serde(rename = "UUID")]
    pub uuid: Guid,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub objectives: Vec<ObjectiveSpec>,
    pub input: PinId,
    pub output: PinId,
}

/// Return Quest node record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReturnQuestRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub position: [f32; 2],
    #[serde(rename = "QuestID")]
    pub quest_id: Guid,
    pub succeed: bool,
    pub input: PinId,
    pub output: PinId,
}

/// Objective node record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectiveRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub position: [f32; 2],
    #[serde(rename = "QuestID")]
    pub quest_id: Guid,
    #[serde(rename = "ObjectiveID")]
    pub objective_id: Guid,
    pub succeed: bool,
    pub input: PinId,
    pub output: PinId,
}

/// Comment record
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommentRecord {
    #[serde(rename = "ID")]
    pub id: NodeId,
    pub comment: String,
    pub position: [f32; 2],
    pub size: [f32; 2],
}

// ---- Scene -> document ----

fn input_id(pins: &PinTopology) -> PinId {
    pins.input().map_or(PinId::INVALID, |p| p.id)
}

fn output_ids(pins: &PinTopology) -> Vec<PinId> {
    pins.outputs().iter().map(|p| p.id).collect()
}

fn fixed_outputs<const N: usize>(pins: &PinTopology) -> [PinId; N] {
    let mut ids = [PinId::INVALID; N];
    for (slot, pin) in ids.iter_mut().zip(pins.outputs()) {
        *slot = pin.id;
    }
    ids
}

fn character_record(data: &CharacterData, scene: &Scene) -> CharacterRecord {
    let character = &data.character;
    let entry = character.entry_node();
    let entry_node = EntryRecord {
        id: entry,
        position: character.node(entry).map_or([0.0, 0.0], |n| n.position),
        output: character
            .pins_of(scene.quests(), entry)
            .and_then(|p| p.output(0))
            .map_or(PinId::INVALID, |p| p.id),
    };

    let mut record = CharacterRecord {
        name: character.name.clone(),
        flavor: Some(data.flavor),
        entry_node,
        variable_nodes: Vec::new(),
        act_nodes: Vec::new(),
        fork_nodes: Vec::new(),
        branch_nodes: Vec::new(),
        dialogue_nodes: Vec::new(),
        flavor_match_nodes: Vec::new(),
        flavor_check_nodes: Vec::new(),
        dice_nodes: Vec::new(),
        accept_quest_nodes: Vec::new(),
        return_quest_nodes: Vec::new(),
        objective_nodes: Vec::new(),
        comments: Vec::new(),
        links: character.links().copied().collect(),
    };

    for node in character.nodes() {
        let (id, position) = (node.id, node.position);
        if let NodeKind::Comment(comment) = &node.kind {
            record.comments.push(CommentRecord {
                id,
                comment: comment.text.clone(),
                position,
                size: comment.size,
            });
            continue;
        }
        let Some(pins) = node.pins.as_ref() else {
            continue;
        };
        let input = input_id(pins);
        let output = pins.output(0).map_or(PinId::INVALID, |p| p.id);
        match &node.kind {
            NodeKind::Entry | NodeKind::Comment(_) => {}
            NodeKind::BoolVariable(variable) => record.variable_nodes.push(VariableRecord {
                id,
                position,
                variable_type: VariableType::Boolean,
                name: variable.name.clone(),
                operator: variable.operator,
                value: VariableValue::Boolean(variable.value),
                input,
                output,
            }),
            NodeKind::IntVariable(variable) => record.variable_nodes.push(VariableRecord {
                id,
                position,
                variable_type: VariableType::Integer,
                name: variable.name.clone(),
                operator: variable.operator,
                value: VariableValue::Integer(variable.value),
                input,
                output,
            }),
            NodeKind::Act(act) => record.act_nodes.push(ActRecord {
                id,
                position,
                title: act.title.clone(),
                input,
                output,
                bubbles: act.bubbles.clone(),
            }),
            NodeKind::Fork(fork) => record.fork_nodes.push(ForkRecord {
                id,
                position,
                uuid: fork.uuid,
                input,
                outputs: fixed_outputs(pins),
            }),
            NodeKind::Branch(branch) => record.branch_nodes.push(BranchRecord {
                id,
                position,
                expressions: branch.expressions.clone(),
                input,
                outputs: output_ids(pins),
            }),
            NodeKind::Dialogue(dialogue) => record.dialogue_nodes.push(DialogueRecord {
                id,
                position,
                prompts: dialogue.prompts.clone(),
                input,
                outputs: output_ids(pins),
            }),
            NodeKind::FlavorMatch => record.flavor_match_nodes.push(FlavorMatchRecord {
                id,
                position,
                input,
                outputs: fixed_outputs(pins),
            }),
            NodeKind::FlavorCheck(check) => record.flavor_check_nodes.push(FlavorCheckRecord {
                id,
                position,
                for_npc: check.checking_npc,
                input,
                outputs: fixed_outputs(pins),
            }),
            NodeKind::Dice => record.dice_nodes.push(DiceRecord {
                id,
                position,
                input,
                outputs: output_ids(pins),
            }),
            NodeKind::ReturnQuest(ret) => record.return_quest_nodes.push(ReturnQuestRecord {
                id,
                position,
                quest_id: ret.quest,
                succeed: ret.succeed,
                input,
                output,
            }),
            NodeKind::Objective(objective) => record.objective_nodes.push(ObjectiveRecord {
                id,
                position,
                quest_id: objective.quest,
                objective_id: objective.objective,
                succeed: objective.succeed,
                input,
                output,
            }),
        }
    }

    for quest in scene.quests().owned_by(character.id()) {
        record.accept_quest_nodes.push(AcceptQuestRecord {
            id: quest.id,
            position: quest.position,
            uuid: quest.uuid,
            title: quest.title.clone(),
            description: quest.description.clone(),
            objectives: quest.objectives.clone(),
            input: input_id(&quest.pins),
            output: quest.pins.output(0).map_or(PinId::INVALID, |p| p.id),
        });
    }

    record
}

/// Build the document describing `scene`
pub fn to_document(scene: &Scene) -> SceneDocument {
    SceneDocument {
        version: SCENE_FORMAT_VERSION,
        characters: scene.characters().map(|c| character_record(c, scene)).collect(),
    }
}

/// Encode `scene` as pretty RON
pub fn to_string(scene: &Scene) -> Result<String> {
    let config = ron::ser::PrettyConfig::default()
        .struct_names(false)
        .enumerate_arrays(false);
    Ok(ron::ser::to_string_pretty(&to_document(scene), config)?)
}

// ---- document -> Scene ----

fn input_output(input: PinId, output: PinId) -> Option<PinTopology> {
    Some(PinTopology::InputOutput {
        input: Pin::input(input),
        output: Pin::output(output),
    })
}

fn named_outputs<'a>(ids: &[PinId], names: impl IntoIterator<Item = &'a str>) -> Vec<Pin> {
    let mut names = names.into_iter();
    ids.iter()
        .map(|id| Pin::output(*id).named(names.next().unwrap_or_default()))
        .collect()
}

fn expect_outputs(name: &str, node: NodeId, found: usize, expected: usize) -> Result<()> {
    if found == expected {
        Ok(())
    } else {
        Err(SceneError::OutputCount {
            name: name.to_string(),
            node,
            found,
            expected,
        })
    }
}

fn restore_nodes(record: &CharacterRecord) -> Result<Vec<Node>> {
    let name = record.name.as_str();
    let mut nodes = Vec::new();

    let entry = &record.entry_node;
    nodes.push(
        Node::new(
            entry.id,
            NodeKind::Entry,
            Some(PinTopology::Single(Pin::output(entry.output))),
        )
        .with_position(entry.position[0], entry.position[1]),
    );

    for r in &record.variable_nodes {
        let kind = match (r.variable_type, r.value) {
            (VariableType::Boolean, VariableValue::Boolean(value)) => NodeKind::BoolVariable(VariableNode {
                name: r.name.clone(),
                operator: r.operator,
                value,
            }),
            (VariableType::Integer, VariableValue::Integer(value)) => NodeKind::IntVariable(VariableNode {
                name: r.name.clone(),
                operator: r.operator,
                value,
            }),
            (VariableType::Boolean, VariableValue::Integer(value)) => {
                tracing::warn!("Boolean variable {:?} holds integer {}, using {}", r.name, value, value != 0);
                NodeKind::BoolVariable(VariableNode {
                    name: r.name.clone(),
                    operator: r.operator,
                    value: value != 0,
                })
            }
            (VariableType::Integer, VariableValue::Boolean(value)) => {
                tracing::warn!("Integer variable {:?} holds boolean {}", r.name, value);
                NodeKind::IntVariable(VariableNode {
                    name: r.name.clone(),
                    operator: r.operator,
                    value: i32::from(value),
                })
            }
        };
        nodes.push(Node {
            id: r.id,
            position: r.position,
            kind,
            pins: input_output(r.input, r.output),
        });
    }

    for r in &record.act_nodes {
        nodes.push(Node {
            id: r.id,
            position: r.position,
            kind: NodeKind::Act(ActNode {
                title: r.title.clone(),
                bubbles: r.bubbles.clone(),
            }),
            pins: input_output(r.input, r.output),
        });
    }

    for r in &record.fork_nodes {
        nodes.push(Node {
            id: r.id,
            position: r.position,
            kind: NodeKind::Fork(ForkNode { uuid: r.uuid }),
            pins: Some(PinTopology::ForkInputOutput {
                input: Pin::input(r.input),
                outputs: [
                    Pin::output(r.outputs[0]).named("Others"),
                    Pin::output(r.outputs[1]).named("First"),
                ],
            }),
        });
    }

    for r in &record.branch_nodes {
        expect_outputs(name, r.id, r.outputs.len(), r.expressions.len() + 1)?;
        let mut outputs = named_outputs(&r.outputs, std::iter::repeat("then"));
        if let Some(last) = outputs.last_mut() {
            last.name = "else".to_string();
        }
        nodes.push(Node {
            id: r.id,
            position: r.position,
            kind: NodeKind::Branch(BranchNode {
                expressions: r.expressions.clone(),
            }),
            pins: Some(PinTopology::InputOutputs {
                input: Pin::input(r.input),
                outputs,
            }),
        });
    }

    for r in &record.dialogue_nodes {
        expect_outputs(name, r.id, r.outputs.len(), r.prompts.len())?;
        nodes.push(Node {
            id: r.id,
            position: r.position,
            kind: NodeKind::Dialogue(DialogueNode {
                prompts: r.prompts.clone(),
            }),
            pins: Some(PinTopology::InputOutputs {
                input: Pin::input(r.input),
                outputs: named_outputs(&r.outputs, std::iter::repeat("")),
            }),
        });
    }

    for r in &record.flavor_match_nodes {
        nodes.push(Node {
            id: r.id,
            position: r.position,
            kind: NodeKind::FlavorMatch,
            pins: Some(PinTopology::ForkInputOutput {
                input: Pin::input(r.input),
                outputs: [
                    Pin::output(r.outputs[0]).named("Flavor matching"),
                    Pin::output(r.outputs[1]).named("else"),
                ],
            }),
        });
    }

    for r in &record.flavor_check_nodes {
        nodes.push(Node {
            id: r.id,
            position: r.position,
            kind: NodeKind::FlavorCheck(FlavorCheckNode {
                checking_npc: r.for_npc,
            }),
            pins: Some(PinTopology::InputOutputs {
                input: Pin::input(r.input),
                outputs: named_outputs(&r.outputs, Flavor::PRIMARIES.iter().map(|f| f.name())),
            }),
        });
    }

    for r in &record.dice_nodes {
        if r.outputs.len() < MIN_DICE_FACES {
            expect_outputs(name, r.id, r.outputs.len(), MIN_DICE_FACES)?;
        }
        nodes.push(Node {
            id: r.id,
            position: r.position,
            kind: NodeKind::Dice,
            pins: Some(PinTopology::InputOutputs {
                input: Pin::input(r.input),
                outputs: named_outputs(&r.outputs, std::iter::repeat("")),
            }),
        });
    }

    for r in &record.return_quest_nodes {
        nodes.push(Node {
            id: r.id,
            position: r.position,
            kind: NodeKind::ReturnQuest(ReturnQuestNode {
                quest: r.quest_id,
                succeed: r.succeed,
            }),
            pins: input_output(r.input, r.output),
        });
    }

    for r in &record.objective_nodes {
        nodes.push(Node {
            id: r.id,
            position: r.position,
            kind: NodeKind::Objective(ObjectiveNode {
                quest: r.quest_id,
                objective: r.objective_id,
                succeed: r.succeed,
            }),
            pins: input_output(r.input, r.output),
        });
    }

    for r in &record.comments {
        nodes.push(Node {
            id: r.id,
            position: r.position,
            kind: NodeKind::Comment(CommentNode {
                text: r.comment.clone(),
                size: r.size,
            }),
            pins: None,
        });
    }

    Ok(nodes)
}

fn restore_quest(record: &AcceptQuestRecord, owner: CharacterId) -> AcceptQuestNode {
    AcceptQuestNode {
        id: record.id,
        position: record.position,
        uuid: record.uuid,
        title: record.title.clone(),
        description: record.description.clone(),
        owner,
        objectives: record.objectives.clone(),
        pins: PinTopology::InputOutput {
            input: Pin::input(record.input),
            output: Pin::output(record.output),
        },
    }
}

/// Rebuild a scene from a document. Nothing is kept from a document that
/// fails validation.
pub fn from_document(document: SceneDocument) -> Result<Scene> {
    if document.version > SCENE_FORMAT_VERSION {
        return Err(SceneError::UnsupportedVersion {
            found: document.version,
            supported: SCENE_FORMAT_VERSION,
        });
    }

    let mut scene = Scene::new();
    for record in &document.characters {
        let id = scene.reserve_character_id();
        for quest in &record.accept_quest_nodes {
            if scene.quests().get(quest.uuid).is_some() {
                return Err(SceneError::DuplicateQuest(quest.uuid));
            }
            scene.quests_mut().insert(restore_quest(quest, id));
        }

        let nodes = restore_nodes(record)?;
        let character = Character::from_parts(id, record.name.clone(), nodes, record.links.clone(), scene.quests())
            .map_err(|source| SceneError::Character {
                name: record.name.clone(),
                source,
            })?;
        scene.insert_character(CharacterData {
            character,
            flavor: record.flavor.unwrap_or_default(),
        });
    }
    Ok(scene)
}

/// Parse a scene from RON.
///
/// Accepts the versioned [`SceneDocument`] or a bare sequence of character
/// records, which is read as the current version.
pub fn from_str(content: &str) -> Result<Scene> {
    let document = if content.trim_start().starts_with('[') {
        let characters: Vec<CharacterRecord> = ron::from_str(content)?;
        tracing::debug!("Reading {} unversioned character records", characters.len());
        SceneDocument {
            version: SCENE_FORMAT_VERSION,
            characters,
        }
    } else {
        ron::from_str(content)?
    };
    from_document(document)
}
