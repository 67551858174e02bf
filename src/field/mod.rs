//! The tilemap field: an embeddable tilemap-editing control for one block
//! argument.
//!
//! A field holds a tilemap literal and its decoded value, renders a
//! thumbnail, and hands editing off to the host's modal editor through a
//! message-driven session flow. Closing a session reconciles the edited
//! tileset into the shared project and records a replayable change.
//!
//! ## Module Structure
//!
//! - [`options`] - Field configuration parsing
//! - [`component`] - The `TilemapField` component
//! - [`session`] - Messages and resources of the modal editor contract
//! - [`reconcile`] - Tileset reconciliation on session close
//! - [`history`] - Change records and the undo/redo history resource
//! - [`preview`] - Thumbnail rendering
//! - [`systems`] - Session flow, replay and repaint systems

mod component;
mod history;
mod options;
mod preview;
mod reconcile;
mod session;
mod systems;


pub use component::{DisplayMode, TilemapField};
pub use history::{FieldHistory, TilemapChange};
pub use options::{parse_field_options, FieldOptions, ParsedFieldOptions, TileWidthOption};
pub use preview::{render_thumbnail, FieldPreview, DEFAULT_PALETTE};
pub use reconcile::{reconcile_session, trim_tileset};
pub use session::{
    ActiveSession, EditorClosed, OpenEditorRequest, RedoRequest, RevisionChanged, SessionResult,
    TilemapChanged, UndoRequest,
};

use bevy::prelude::*;

pub struct TilemapFieldPlugin;

impl Plugin for TilemapFieldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FieldHistory>()
            .add_message::<OpenEditorRequest>()
            .add_message::<EditorClosed>()
            .add_message::<TilemapChanged>()
            .add_message::<RevisionChanged>()
            .add_message::<UndoRequest>()
            .add_message::<RedoRequest>()
            .add_systems(
                Update,
                (
                    systems::open_editor_system.run_if(on_message::<OpenEditorRequest>),
                    systems::close_editor_system.run_if(on_message::<EditorClosed>),
                    systems::handle_undo.run_if(on_message::<UndoRequest>),
                    systems::handle_redo.run_if(on_message::<RedoRequest>),
                    systems::repaint_previews,
                )
                    .chain(),
            );
    }
}
