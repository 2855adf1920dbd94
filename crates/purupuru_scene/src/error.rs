// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene error types.

use purupuru_graph::{CharacterId, Guid, NodeId, RestoreError};
use thiserror::Error;

/// Failure loading, saving or exporting a scene
#[derive(Debug, Error)]
pub enum SceneError {
    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The scene document is not valid RON for the scene format
    #[error("failed to parse scene: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// A scene or settings file could not be encoded as RON
    #[error("failed to encode RON: {0}")]
    Encode(#[from] ron::Error),
    /// The settings file is not valid RON for the settings format
    #[error("failed to parse settings: {0}")]
    Settings(#[source] ron::error::SpannedError),
    /// The distribution export could not be encoded as JSON
    #[error("failed to encode export: {0}")]
    Export(#[from] serde_json::Error),
    /// The document was written by a newer version
    #[error("scene version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the document
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },
    /// The settings file was written by a newer version
    #[error("settings version {found} is newer than supported version {supported}")]
    UnsupportedSettings {
        /// Version in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },
    /// A character's graph is inconsistent
    #[error("character {name:?}: {source}")]
    Character {
        /// Character name
        name: String,
        /// What is wrong
        #[source]
        source: RestoreError,
    },
    /// A node's output list does not fit its payload
    #[error("character {name:?}: node {node} has {found} outputs, expected {expected}")]
    OutputCount {
        /// Character name
        name: String,
        /// The node
        node: NodeId,
        /// Outputs found
        found: usize,
        /// Outputs required
        expected: usize,
    },
    /// Two Accept Quest nodes share one identity
    #[error("quest {0} is defined more than once")]
    DuplicateQuest(Guid),
    /// No character has this identifier
    #[error("unknown character {0}")]
    UnknownCharacter(CharacterId),
    /// A playback command does not fit what the session is showing
    #[error("playback is not waiting for {0}")]
    UnexpectedInput(&'static str),
    /// A dialogue choice names a prompt that does not exist
    #[error("choice {choice} is out of range for {count} prompts")]
    ChoiceOutOfRange {
        /// Requested prompt
        choice: usize,
        /// Prompts on offer
        count: usize,
    },
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
