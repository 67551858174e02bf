//! Modal editor session contract.
//!
//! The modal tile editor itself lives in the host: this crate hands it a
//! snapshot of field state through the [`ActiveSession`] resource when an
//! [`OpenEditorRequest`] arrives, and takes the result back through an
//! [`EditorClosed`] message. Closing without a result is a cancelled session
//! and a no-op.

use bevy::prelude::*;

use crate::tilemap::{TileId, TilemapData};

use super::options::ParsedFieldOptions;

/// Message asking for the modal editor to open on a field.
#[derive(Message)]
pub struct OpenEditorRequest {
    pub field: Entity,
}

/// Message delivered when the modal editor closes.
#[derive(Message)]
pub struct EditorClosed {
    /// `None` means the session was cancelled
    pub result: Option<SessionResult>,
    /// Opaque editor state to restore on the next open
    pub persistent: Option<serde_json::Value>,
}

/// Message notifying the host that a field's literal text changed.
#[derive(Message)]
pub struct TilemapChanged {
    pub field: Entity,
    pub old_text: String,
    pub new_text: String,
}

/// Message notifying the host that project tile state moved (after an
/// undo/redo replay) so it can recompile. Never recorded in history.
#[derive(Message)]
pub struct RevisionChanged {
    pub revision: u64,
}

/// Message asking for the most recent tilemap change to be undone.
#[derive(Message)]
pub struct UndoRequest;

/// Message asking for the most recently undone change to be reapplied.
#[derive(Message)]
pub struct RedoRequest;

/// Snapshot handed to the modal editor while it is open.
///
/// Only one session runs at a time; a second open request while this
/// resource exists is rejected.
#[derive(Resource)]
pub struct ActiveSession {
    pub field: Entity,
    /// Field state with the full project tile palette merged in
    pub data: TilemapData,
    pub options: ParsedFieldOptions,
    /// Committed tile ids referenced by the other fields in the workspace,
    /// so the editor can warn before deleting a tile in use elsewhere
    pub project_references: Vec<String>,
    /// Editor state restored from the previous session on this field
    pub persistent: Option<serde_json::Value>,
    /// Project revision when the session opened, for staleness checks
    pub opened_at_revision: u64,
}

/// Everything the modal editor reports back from a completed session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    /// The edited tilemap, tileset included
    pub data: TilemapData,
    /// Committed tile ids the session deleted
    pub deleted_tiles: Vec<String>,
    /// Ids of tiles whose pixels the session touched
    pub edited_tiles: Vec<TileId>,
}

impl SessionResult {
    /// A result that leaves the tilemap as-is.
    pub fn unchanged(data: TilemapData) -> Self {
        Self {
            data,
            deleted_tiles: Vec::new(),
            edited_tiles: Vec::new(),
        }
    }
}
