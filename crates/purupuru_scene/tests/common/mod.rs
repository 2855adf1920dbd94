// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene builders shared by the integration tests.

#![allow(dead_code)]

use purupuru_graph::{
    Bubble, CharacterId, CompareOperator, Condition, Guid, LinkId, NodeId, NodeKind, SetOperator,
    Speaker,
};
use purupuru_scene::Scene;

/// Link output `output` of `from` to the input of `to`
pub fn link(scene: &mut Scene, id: CharacterId, from: NodeId, output: usize, to: NodeId) -> LinkId {
    let (data, quests) = scene.character_and_quests_mut(id).unwrap();
    let c = &mut data.character;
    let start = c.pins_of(quests, from).unwrap().output(output).unwrap().id;
    let end = c.pins_of(quests, to).unwrap().input().unwrap().id;
    c.create_link(quests, start, end).unwrap()
}

pub fn kind_mut(scene: &mut Scene, id: CharacterId, node: NodeId) -> &mut NodeKind {
    &mut scene.character_mut(id).unwrap().character.node_mut(node).unwrap().kind
}

pub fn entry(scene: &Scene, id: CharacterId) -> NodeId {
    scene.character(id).unwrap().character.entry_node()
}

pub fn act(scene: &mut Scene, id: CharacterId, lines: &[&str]) -> NodeId {
    let c = &mut scene.character_mut(id).unwrap().character;
    let act = c.spawn_act();
    for line in lines {
        c.add_bubble(act, Bubble::new(Speaker::Npc, *line));
    }
    act
}

/// Entry -> `gold += 10` -> Branch(`gold > 5`) -> then: Act(2 bubbles) -> Act
pub struct GoldScene {
    pub scene: Scene,
    pub id: CharacterId,
    pub gold: NodeId,
    pub branch: NodeId,
    pub reward: NodeId,
    pub after: NodeId,
}

pub fn gold_scene() -> GoldScene {
    let mut scene = Scene::new();
    let id = scene.add_character("Mochi");
    let start = entry(&scene, id);
    let gold = scene.character_mut(id).unwrap().character.spawn_int_variable();
    let branch = scene.character_mut(id).unwrap().character.spawn_branch();
    let reward = act(&mut scene, id, &["You found gold!", "Spend it well."]);
    let after = act(&mut scene, id, &["Bye"]);

    if let NodeKind::IntVariable(v) = kind_mut(&mut scene, id, gold) {
        v.name = "gold".to_string();
        v.operator = SetOperator::Add;
        v.value = 10;
    }
    if let NodeKind::Branch(b) = kind_mut(&mut scene, id, branch) {
        b.expressions = vec![vec![Condition {
            variable: "gold".to_string(),
            operator: CompareOperator::Greater,
            value: 5,
        }]];
    }
    link(&mut scene, id, start, 0, gold);
    link(&mut scene, id, gold, 0, branch);
    link(&mut scene, id, branch, 0, reward);
    link(&mut scene, id, reward, 0, after);

    GoldScene {
        scene,
        id,
        gold,
        branch,
        reward,
        after,
    }
}

/// Two characters: `Mochi` owns a quest with one objective, `Dango` settles
/// that objective and returns the quest.
pub struct QuestScene {
    pub scene: Scene,
    pub owner: CharacterId,
    pub helper: CharacterId,
    pub quest: Guid,
    pub objective: Guid,
    pub objective_node: NodeId,
    pub return_node: NodeId,
}

pub fn quest_scene() -> QuestScene {
    let mut scene = Scene::new();
    let owner = scene.add_character("Mochi");
    let helper = scene.add_character("Dango");

    let (data, quests) = scene.character_and_quests_mut(owner).unwrap();
    let quest = data.character.spawn_accept_quest(quests);
    quest.title = "Lost cat".to_string();
    quest.description = "Find Tama".to_string();
    let objective = quest.add_objective();
    quest.objectives[0].title = "Search the garden".to_string();
    let (accept, uuid) = (quest.id, quest.uuid);
    let start = entry(&scene, owner);
    link(&mut scene, owner, start, 0, accept);

    let helper_entry = entry(&scene, helper);
    let c = &mut scene.character_mut(helper).unwrap().character;
    let objective_node = c.spawn_objective();
    let return_node = c.spawn_return_quest();
    if let NodeKind::Objective(o) = kind_mut(&mut scene, helper, objective_node) {
        o.quest = uuid;
        o.objective = objective;
    }
    if let NodeKind::ReturnQuest(r) = kind_mut(&mut scene, helper, return_node) {
        r.quest = uuid;
        r.succeed = false;
    }
    link(&mut scene, helper, helper_entry, 0, objective_node);
    link(&mut scene, helper, objective_node, 0, return_node);

    QuestScene {
        scene,
        owner,
        helper,
        quest: uuid,
        objective,
        objective_node,
        return_node,
    }
}
