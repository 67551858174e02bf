//! Systems driving the editor session flow, undo/redo replay and preview
//! repaints.

use bevy::prelude::*;

use crate::constants::PREVIEW_WIDTH;
use crate::project::TilemapProject;

use super::component::TilemapField;
use super::history::{FieldHistory, TilemapChange};
use super::preview::{render_thumbnail, FieldPreview};
use super::reconcile::reconcile_session;
use super::session::{
    ActiveSession, EditorClosed, OpenEditorRequest, RedoRequest, RevisionChanged, TilemapChanged,
    UndoRequest,
};

/// Opens an edit session: snapshots the field's state, merges in the full
/// project tile palette and publishes it as the [`ActiveSession`] resource.
pub fn open_editor_system(
    mut events: MessageReader<OpenEditorRequest>,
    mut commands: Commands,
    session: Option<Res<ActiveSession>>,
    project: Res<TilemapProject>,
    fields: Query<(Entity, &TilemapField)>,
) {
    let mut session_open = session.is_some();

    for event in events.read() {
        if session_open {
            warn!("edit session already in progress");
            continue;
        }
        let Ok((_, field)) = fields.get(event.field) else {
            warn!("open request for a despawned field");
            continue;
        };
        if field.is_raw_text() {
            // raw-text fields are not editable
            continue;
        }

        let mut data = field.state().clone();

        // offer every project tile of this width in the palette
        let all_tiles = project.project_tiles(data.tileset.tile_width, true);
        for tile in &all_tiles {
            if !data.tileset.contains(&tile.id) {
                data.tileset.tiles.push(tile.clone());
            }
        }
        for tile in data.tileset.tiles.iter_mut() {
            tile.weight = all_tiles
                .iter()
                .position(|t| t.id == tile.id)
                .map(|i| i as u32)
                .unwrap_or(u32::MAX);
        }

        commands.insert_resource(ActiveSession {
            field: event.field,
            data,
            options: field.options().clone(),
            project_references: collect_project_references(&fields, event.field),
            persistent: field.persistent.clone(),
            opened_at_revision: project.revision(),
        });
        session_open = true;
    }
}

/// Committed tile ids in use by every field other than the one opening a
/// session. Transparency tiles are synthetic and never reported.
fn collect_project_references(
    fields: &Query<(Entity, &TilemapField)>,
    opening: Entity,
) -> Vec<String> {
    let mut references: Vec<String> = Vec::new();
    for (entity, field) in fields.iter() {
        if entity == opening {
            continue;
        }
        for tile in &field.state().tileset.tiles {
            if let Some(id) = tile.id.as_committed()
                && !crate::project::is_transparency_id(id)
                && !references.iter().any(|r| r == id)
            {
                references.push(id.to_string());
            }
        }
    }
    references
}

/// Closes the active session: reconciles the result into the project,
/// re-encodes the field and records the change for undo.
pub fn close_editor_system(
    mut events: MessageReader<EditorClosed>,
    mut commands: Commands,
    session: Option<Res<ActiveSession>>,
    mut project: ResMut<TilemapProject>,
    mut fields: Query<&mut TilemapField>,
    mut history: ResMut<FieldHistory>,
    mut changed: MessageWriter<TilemapChanged>,
) {
    let Some(session) = session else {
        for _ in events.read() {
            warn!("editor closed with no active session");
        }
        return;
    };

    let mut session_closed = false;
    for event in events.read() {
        if session_closed {
            warn!("editor closed with no active session");
            continue;
        }
        session_closed = true;

        let Some(result) = &event.result else {
            debug!("edit session cancelled");
            continue;
        };
        let Ok(mut field) = fields.get_mut(session.field) else {
            warn!("field despawned while its edit session was open");
            continue;
        };

        let old_text = field.value();
        let old_revision = project.revision();
        project.push_undo();

        let data = reconcile_session(&mut project, result.clone());
        field.apply_session_result(data, event.persistent.clone());
        let new_text = field.value();

        if old_text != new_text {
            project.force_update();
        }

        let change = TilemapChange {
            field: session.field,
            old_text: old_text.clone(),
            new_text: new_text.clone(),
            old_revision,
            new_revision: project.revision(),
        };
        if change.is_inert() {
            // nothing to replay, so the project snapshot is dropped too
            project.discard_undo();
        } else {
            info!("tilemap field changed (revision {} -> {})", old_revision, project.revision());
            project.clear_redo();
            history.push(change);
            changed.write(TilemapChanged {
                field: session.field,
                old_text,
                new_text,
            });
        }
    }

    if session_closed {
        commands.remove_resource::<ActiveSession>();
    }
}

/// Replays the most recent change backwards: project state first, field
/// text second.
pub fn handle_undo(
    mut events: MessageReader<UndoRequest>,
    mut history: ResMut<FieldHistory>,
    mut project: ResMut<TilemapProject>,
    mut fields: Query<&mut TilemapField>,
    mut revisions: MessageWriter<RevisionChanged>,
) {
    for _ in events.read() {
        let Some(change) = history.pop_undo() else {
            continue;
        };

        project.undo();
        if let Ok(mut field) = fields.get_mut(change.field) {
            field.set_value(&change.old_text, &*project);
        }

        refresh_all_fields(&mut fields, &project);
        revisions.write(RevisionChanged {
            revision: project.revision(),
        });
        history.push_redo(change);
    }
}

/// Replays the most recently undone change forwards: field text first,
/// project state second.
pub fn handle_redo(
    mut events: MessageReader<RedoRequest>,
    mut history: ResMut<FieldHistory>,
    mut project: ResMut<TilemapProject>,
    mut fields: Query<&mut TilemapField>,
    mut revisions: MessageWriter<RevisionChanged>,
) {
    for _ in events.read() {
        let Some(change) = history.pop_redo() else {
            continue;
        };

        if let Ok(mut field) = fields.get_mut(change.field) {
            field.set_value(&change.new_text, &*project);
        }
        project.redo();

        refresh_all_fields(&mut fields, &project);
        revisions.write(RevisionChanged {
            revision: project.revision(),
        });
        history.push_undo(change);
    }
}

/// Tile identity assignment is global, so a replay must reconcile every
/// field in the workspace, not just the one named by the change.
fn refresh_all_fields(fields: &mut Query<&mut TilemapField>, project: &TilemapProject) {
    for mut field in fields.iter_mut() {
        field.refresh_tileset(project);
    }
}

/// Repaints thumbnails for stale or dirty fields.
pub fn repaint_previews(
    mut commands: Commands,
    project: Res<TilemapProject>,
    mut fields: Query<(Entity, &mut TilemapField)>,
) {
    let stamp = project.stamp();
    for (entity, mut field) in fields.iter_mut() {
        if field.seen_stamp != stamp {
            field.refresh_tileset(&*project);
            field.seen_stamp = stamp;
        }
        if !field.preview_dirty {
            continue;
        }
        field.preview_dirty = false;

        if field.is_raw_text() {
            commands.entity(entity).remove::<FieldPreview>();
        } else {
            let image = render_thumbnail(field.state(), PREVIEW_WIDTH);
            commands.entity(entity).insert(FieldPreview { image });
        }
    }
}
