//! Persisted editor preferences.
//!
//! Hosts usually configure each field through its block definition; these
//! preferences only fill the gaps, providing defaults for fields whose
//! definitions leave the tile width or grid size unset.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::field::ParsedFieldOptions;
use crate::tilemap::TileWidth;

/// Preferences persisted to disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PrefsData {
    /// Tile width for new fields that do not specify one
    #[serde(default)]
    pub default_tile_width: Option<u32>,

    /// Grid width for new fields that do not specify one
    #[serde(default)]
    pub default_grid_width: Option<u16>,

    /// Grid height for new fields that do not specify one
    #[serde(default)]
    pub default_grid_height: Option<u16>,
}

/// Runtime preferences resource
#[derive(Resource)]
pub struct EditorPrefs {
    /// The persisted preference data
    pub data: PrefsData,
    /// Path to the preferences file
    pub prefs_path: PathBuf,
    /// Whether preferences need to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for EditorPrefs {
    fn default() -> Self {
        Self {
            data: PrefsData::default(),
            prefs_path: crate::paths::prefs_file(),
            dirty: false,
        }
    }
}

impl EditorPrefs {
    /// Field options seeded from these preferences.
    pub fn default_options(&self) -> ParsedFieldOptions {
        let mut options = ParsedFieldOptions::default();
        if let Some(width) = self
            .data
            .default_tile_width
            .and_then(TileWidth::from_pixels)
        {
            options.tile_width = width;
        }
        if let Some(width) = self.data.default_grid_width {
            options.init_width = width;
        }
        if let Some(height) = self.data.default_grid_height {
            options.init_height = height;
        }
        options
    }
}

/// Message to trigger a preferences save
#[derive(Message)]
pub struct SavePrefsRequest;

pub struct PrefsPlugin;

impl Plugin for PrefsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EditorPrefs>()
            .add_message::<SavePrefsRequest>()
            .add_systems(Startup, load_prefs_system)
            .add_systems(
                Update,
                save_prefs_system.run_if(on_message::<SavePrefsRequest>),
            );
    }
}

/// Load preferences from disk
fn load_prefs() -> EditorPrefs {
    let prefs_path = crate::paths::prefs_file();

    let data = if prefs_path.exists() {
        match std::fs::read_to_string(&prefs_path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(data) => {
                    info!("Loaded preferences from {:?}", prefs_path);
                    data
                }
                Err(e) => {
                    warn!("Failed to parse preferences file, using defaults: {}", e);
                    PrefsData::default()
                }
            },
            Err(e) => {
                warn!("Failed to read preferences file, using defaults: {}", e);
                PrefsData::default()
            }
        }
    } else {
        info!("No preferences file found, using defaults");
        PrefsData::default()
    };

    EditorPrefs {
        data,
        prefs_path,
        dirty: false,
    }
}

/// Startup system to load preferences into the existing resource
fn load_prefs_system(mut prefs: ResMut<EditorPrefs>) {
    let loaded = load_prefs();
    prefs.data = loaded.data;
    prefs.prefs_path = loaded.prefs_path;
    prefs.dirty = false;
}

/// System to save preferences when requested
fn save_prefs_system(mut events: MessageReader<SavePrefsRequest>, mut prefs: ResMut<EditorPrefs>) {
    for _ in events.read() {
        if !prefs.dirty {
            continue;
        }
        match serde_json::to_string_pretty(&prefs.data) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&prefs.prefs_path, json) {
                    error!("Failed to save preferences: {}", e);
                } else {
                    info!("Preferences saved to {:?}", prefs.prefs_path);
                    prefs.dirty = false;
                }
            }
            Err(e) => {
                error!("Failed to serialize preferences: {}", e);
            }
        }
    }
}
