// SPDX-License-Identifier: MIT OR Apache-2.0
//! `PuruPuru` command line.
//!
//! Inspects scene files, writes the distribution and lines exports, and
//! plays a character's conversation in the terminal.

use clap::{Parser, Subcommand};
use purupuru_graph::Flavor;
use purupuru_scene::{Playback, PlaybackSettings, PlaybackState, QuestEvent, Scene, SceneError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "purupuru", version, about = "Branching dialogue and quest scenes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Playback settings file
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the characters and quests of a scene
    Info {
        /// Scene file
        scene: PathBuf,
    },

    /// Write the JSON distribution export
    Export {
        /// Scene file
        scene: PathBuf,
        /// Output file
        output: PathBuf,
        /// Pretty-print, overriding the settings
        #[arg(long)]
        pretty: bool,
    },

    /// Write every Act bubble line as text
    Lines {
        /// Scene file
        scene: PathBuf,
        /// Output file (standard output when omitted)
        output: Option<PathBuf>,
    },

    /// Play a character's conversation
    Play {
        /// Scene file
        scene: PathBuf,
        /// Character name
        character: String,
        /// Dialogue choices to make, in order (zero-based)
        #[arg(short, long, value_delimiter = ',')]
        choices: Vec<usize>,
        /// Player flavor, overriding the settings
        #[arg(long, value_parser = parse_flavor)]
        flavor: Option<Flavor>,
        /// Dice seed, overriding the settings
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn parse_flavor(name: &str) -> Result<Flavor, String> {
    Flavor::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = Flavor::ALL.iter().map(|f| f.name()).collect();
        format!("unknown flavor {name:?}, expected one of {}", known.join(", "))
    })
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let env_filter = ["purupuru_graph", "purupuru_scene", "purupuru_cli"]
        .iter()
        .filter_map(|target| format!("{target}={level}").parse::<Directive>().ok())
        .fold(tracing_subscriber::EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn load_settings(path: Option<&Path>) -> Result<PlaybackSettings, SceneError> {
    match path {
        Some(path) => PlaybackSettings::load(path),
        None => Ok(PlaybackSettings::default()),
    }
}

fn run(cli: Cli) -> Result<(), SceneError> {
    let settings = load_settings(cli.settings.as_deref())?;
    match cli.command {
        Commands::Info { scene } => cmd_info(&Scene::load(&scene)?),
        Commands::Export {
            scene,
            output,
            pretty,
        } => Scene::load(&scene)?.export_distribution(&output, pretty || settings.pretty_export)?,
        Commands::Lines { scene, output } => {
            let scene = Scene::load(&scene)?;
            match output {
                Some(output) => scene.export_lines(&output)?,
                None => print!("{}", purupuru_scene::export::lines(&scene)),
            }
        }
        Commands::Play {
            scene,
            character,
            choices,
            flavor,
            seed,
        } => {
            let settings = PlaybackSettings {
                main_character_flavor: flavor.unwrap_or(settings.main_character_flavor),
                dice_seed: seed.or(settings.dice_seed),
                ..settings
            };
            cmd_play(&Scene::load(&scene)?, &character, &choices, &settings)?;
        }
    }
    Ok(())
}

fn cmd_info(scene: &Scene) {
    for data in scene.characters() {
        let character = &data.character;
        println!("{} ({}, {})", character.name, character.id(), data.flavor);

        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for node in character.nodes() {
            *counts.entry(node.node_type().name()).or_default() += 1;
        }
        for (name, count) in counts {
            println!("  {name}: {count}");
        }
        println!("  Links: {}", character.link_count());
    }

    for quest in scene.quests().quests() {
        println!("Quest {:?} ({}) by {}", quest.title, quest.uuid, quest.owner);
        for objective in &quest.objectives {
            let optional = if objective.is_optional { " (optional)" } else { "" };
            println!("  - {}{optional}", objective.title);
        }
    }
}

fn cmd_play(
    scene: &Scene,
    name: &str,
    choices: &[usize],
    settings: &PlaybackSettings,
) -> Result<(), SceneError> {
    let Some(data) = scene.character_by_name(name) else {
        tracing::error!("No character named {name:?}");
        return Ok(());
    };
    let mut playback = Playback::start(scene, data.character.id(), settings)?;
    let mut choices = choices.iter().copied();
    let mut logged = 0;

    loop {
        for event in &playback.quest_log()[logged..] {
            print_quest_event(event);
        }
        logged = playback.quest_log().len();

        match playback.playback_state().clone() {
            PlaybackState::Speaking => {
                if let Some(bubble) = playback.current_bubble(scene) {
                    println!("[{}] {}", bubble.speaker.name(), bubble.line);
                }
                playback.next_bubble(scene)?;
            }
            PlaybackState::Choosing => {
                let prompts = playback.prompts(scene).unwrap_or_default();
                for (index, prompt) in prompts.iter().enumerate() {
                    println!("  {index}) {prompt}");
                }
                let Some(choice) = choices.next() else {
                    println!("(waiting for a choice)");
                    return Ok(());
                };
                println!("> {choice}");
                playback.choose(scene, choice)?;
            }
            PlaybackState::Ended => {
                println!("(end)");
                return Ok(());
            }
            PlaybackState::Broken(fault) => {
                println!("(broken: {fault})");
                return Ok(());
            }
            PlaybackState::Stalled => {
                println!("(stopped after {} steps without anything to show)", settings.max_auto_steps);
                return Ok(());
            }
        }
    }
}

fn print_quest_event(event: &QuestEvent) {
    match event {
        QuestEvent::Accepted { title, .. } => println!("* Quest accepted: {title}"),
        QuestEvent::Returned { title, succeed, .. } => {
            let outcome = if *succeed { "completed" } else { "failed" };
            println!("* Quest {outcome}: {title}");
        }
        QuestEvent::Objective { title, succeed, .. } => {
            let outcome = if *succeed { "done" } else { "failed" };
            println!("* Objective {outcome}: {title}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flavor() {
        assert_eq!(parse_flavor("Sweet"), Ok(Flavor::Sweet));
        assert!(parse_flavor("Umami").unwrap_err().contains("Bitter"));
    }

    #[test]
    fn test_play_arguments() {
        let cli = Cli::parse_from(["purupuru", "play", "scene.ron", "Mochi", "-c", "1,0", "--flavor", "Salty", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Play { character, choices, flavor, .. } => {
                assert_eq!(character, "Mochi");
                assert_eq!(choices, [1, 0]);
                assert_eq!(flavor, Some(Flavor::Salty));
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn test_missing_settings_use_defaults() {
        assert_eq!(load_settings(None).unwrap(), PlaybackSettings::default());
    }

    #[test]
    fn test_bad_settings_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playback.ron");
        std::fs::write(&path, "(version: 7)").unwrap();
        assert!(matches!(
            load_settings(Some(&path)),
            Err(SceneError::UnsupportedSettings { found: 7, .. })
        ));
    }
}
