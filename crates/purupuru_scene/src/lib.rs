// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scenes for `PuruPuru`: characters sharing one quest store, saved as RON,
//! exported for the playback runtime, and played back headlessly.
//!
//! ## Architecture
//!
//! - [`Scene`]: ordered characters and the shared quest store
//! - [`serializer`]: the round-trip RON document
//! - [`export`]: the one-way JSON distribution format and the lines export
//! - [`Playback`]: a conversation driven bubble by bubble and choice by choice
//! - [`PlaybackSettings`]: player flavor, dice seed and playback limits

pub mod error;
pub mod export;
pub mod playback;
pub mod scene;
pub mod serializer;
pub mod settings;

pub use error::{Result, SceneError};
pub use export::{to_export, to_json, ExportDocument, NO_TARGET};
pub use playback::{Playback, PlaybackState, QuestEvent};
pub use scene::{CharacterData, Scene};
pub use serializer::{SceneDocument, SCENE_FORMAT_VERSION};
pub use settings::{PlaybackSettings, SETTINGS_FORMAT_VERSION};
