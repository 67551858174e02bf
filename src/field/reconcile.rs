//! Tileset reconciliation, run once when an edit session closes.
//!
//! The modal editor works on a private copy of the tileset. Reconciliation
//! folds that copy back into the shared project: deletions first, then
//! edits, then commits of provisional tiles, and finally an orphan-trimming
//! pass over the local tileset. Commits must precede trimming so a freshly
//! created tile referenced by the grid is not mistaken for an orphan.

use bevy::prelude::*;

use crate::project::TilemapProject;
use crate::tilemap::{Bitmap, TileId, TilemapData};

use super::session::SessionResult;

/// Fold a completed session back into the project and return the finalized
/// field value.
pub fn reconcile_session(project: &mut TilemapProject, result: SessionResult) -> TilemapData {
    let SessionResult {
        mut data,
        deleted_tiles,
        edited_tiles,
    } = result;

    // 1. deletions; already-absent tiles are a no-op
    for id in &deleted_tiles {
        project.delete_tile(id);
    }

    // 2. edits. A provisional tile's latest pixels are committed wholesale
    // in step 3, so replaying its edit here would be redundant.
    for edited in &edited_tiles {
        let Some(id) = edited.as_committed() else {
            continue;
        };
        let Some(index) = data.tileset.position(edited) else {
            continue;
        };
        let Some(bitmap) = data.tileset.tiles[index].bitmap.clone() else {
            continue;
        };
        if let Some(updated) = project.update_tile(id, &bitmap) {
            data.tileset.tiles[index] = updated;
        }
    }

    // 3. commits and stub resolution, in tileset order
    let tile_px = data.tileset.tile_width.pixels();
    for tile in data.tileset.tiles.iter_mut() {
        match tile.id.clone() {
            TileId::Provisional(handle) => {
                let bitmap = tile
                    .bitmap
                    .take()
                    .unwrap_or_else(|| Bitmap::new(tile_px, tile_px));
                let committed = project.create_tile(&bitmap);
                debug!("committed provisional tile #{} as {:?}", handle, committed.id);
                *tile = committed;
            }
            TileId::Committed(id) => {
                if tile.bitmap.is_none()
                    && let Some(resolved) = project.resolve_tile(&id)
                {
                    *tile = resolved;
                }
                // an unresolvable stub is treated as already removed
            }
        }
    }

    // 4. drop tiles the grid no longer references
    trim_tileset(&mut data);

    // 5. persist named tilemaps; anonymous values live only in the literal
    if let Some(id) = data.tilemap_id.clone() {
        project.update_tilemap(&id, data.clone());
    }

    data
}

/// Remove tileset entries the grid does not reference and remap grid
/// indices onto the compacted tileset. Index 0 (transparency) always stays.
pub fn trim_tileset(data: &mut TilemapData) {
    let tile_count = data.tileset.tiles.len();
    if tile_count == 0 {
        return;
    }

    let mut used = vec![false; tile_count];
    used[0] = true;
    for &cell in data.grid.cells() {
        if (cell as usize) < tile_count {
            used[cell as usize] = true;
        }
    }

    let mut remap = vec![0u16; tile_count];
    let mut kept = Vec::with_capacity(tile_count);
    for (index, tile) in data.tileset.tiles.drain(..).enumerate() {
        if used[index] {
            remap[index] = kept.len() as u16;
            kept.push(tile);
        }
    }
    data.tileset.tiles = kept;

    for cell in data.grid.cells_mut() {
        // indices past the tileset point at nothing; clear them
        *cell = if (*cell as usize) < tile_count {
            remap[*cell as usize]
        } else {
            0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::{Tile, TileWidth};

    fn tile(id: TileId, bitmap: Option<Bitmap>) -> Tile {
        Tile {
            id,
            bitmap,
            weight: 0,
        }
    }

    fn committed(id: &str) -> TileId {
        TileId::Committed(id.to_string())
    }

    fn marked_bitmap(px: u16, value: u8) -> Bitmap {
        let mut b = Bitmap::new(px, px);
        b.set(0, 0, value);
        b
    }

    /// A project holding tiles `tile0`..`tile{n-1}` and a session tilemap
    /// whose tileset starts with the transparency tile.
    fn project_with_tiles(n: u8) -> (TilemapProject, TilemapData) {
        let mut project = TilemapProject::default();
        let mut data = TilemapData::blank(TileWidth::Sixteen, 4, 4);
        data.tileset
            .tiles
            .push(crate::project::transparency_tile(TileWidth::Sixteen));
        for i in 0..n {
            let t = project.create_tile(&marked_bitmap(16, i + 1));
            data.tileset.tiles.push(t);
        }
        (project, data)
    }

    #[test]
    fn test_reconcile_without_changes_only_trims() {
        let (mut project, mut data) = project_with_tiles(2);
        data.grid.set(0, 0, 1); // reference tile0, orphan tile1
        let revision = project.revision();

        let result = reconcile_session(&mut project, SessionResult::unchanged(data));

        assert_eq!(result.tileset.tiles.len(), 2); // transparency + tile0
        assert_eq!(result.tileset.tiles[1].id, committed("tile0"));
        // orphan trimming is local; the project is untouched
        assert_eq!(project.revision(), revision);
        assert!(project.resolve_tile("tile1").is_some());
    }

    #[test]
    fn test_deleted_tiles_leave_the_project() {
        let (mut project, data) = project_with_tiles(2);

        reconcile_session(
            &mut project,
            SessionResult {
                data,
                deleted_tiles: vec!["tile1".to_string(), "never-existed".to_string()],
                edited_tiles: vec![],
            },
        );

        assert!(project.resolve_tile("tile1").is_none());
        assert!(project.resolve_tile("tile0").is_some());
    }

    #[test]
    fn test_edited_tiles_write_back() {
        let (mut project, mut data) = project_with_tiles(1);
        data.grid.set(0, 0, 1);
        let edited = marked_bitmap(16, 9);
        data.tileset.tiles[1].bitmap = Some(edited.clone());

        reconcile_session(
            &mut project,
            SessionResult {
                data,
                deleted_tiles: vec![],
                edited_tiles: vec![committed("tile0")],
            },
        );

        assert_eq!(project.resolve_tile("tile0").unwrap().bitmap, Some(edited));
    }

    #[test]
    fn test_provisional_edit_is_subsumed_by_creation() {
        let (mut project, mut data) = project_with_tiles(0);
        data.tileset
            .tiles
            .push(tile(TileId::Provisional(0), Some(marked_bitmap(16, 5))));
        data.grid.set(0, 0, 1);

        let result = reconcile_session(
            &mut project,
            SessionResult {
                data,
                deleted_tiles: vec![],
                // the session reports the provisional tile as edited too
                edited_tiles: vec![TileId::Provisional(0)],
            },
        );

        // exactly one commit happened, carrying the edited pixels
        let committed_tile = &result.tileset.tiles[1];
        assert_eq!(committed_tile.id, committed("tile0"));
        assert_eq!(
            project.resolve_tile("tile0").unwrap().bitmap,
            Some(marked_bitmap(16, 5))
        );
        assert!(project.resolve_tile("tile1").is_none());
    }

    #[test]
    fn test_no_provisional_id_survives() {
        let (mut project, mut data) = project_with_tiles(1);
        data.tileset
            .tiles
            .push(tile(TileId::Provisional(0), Some(marked_bitmap(16, 3))));
        data.tileset
            .tiles
            .push(tile(TileId::Provisional(1), None));
        data.grid.set(0, 0, 2);
        data.grid.set(1, 0, 3);

        let result = reconcile_session(&mut project, SessionResult::unchanged(data));

        assert!(
            result
                .tileset
                .tiles
                .iter()
                .all(|t| !t.id.is_provisional())
        );
    }

    #[test]
    fn test_mixed_delete_create_and_trim_session() {
        // session: deleted `t3`, tileset [transparency, t1, provisional];
        // only the provisional tile is referenced by the grid
        let mut project = TilemapProject::default();
        let t1 = project.create_tile(&marked_bitmap(16, 1));
        project.create_tile(&marked_bitmap(16, 2)); // tile1, to be deleted
        let t3_id = "tile1".to_string();

        let mut data = TilemapData::blank(TileWidth::Sixteen, 4, 4);
        data.tileset
            .tiles
            .push(crate::project::transparency_tile(TileWidth::Sixteen));
        data.tileset.tiles.push(t1);
        data.tileset
            .tiles
            .push(tile(TileId::Provisional(0), Some(marked_bitmap(16, 7))));
        data.grid.set(2, 2, 2);

        let result = reconcile_session(
            &mut project,
            SessionResult {
                data,
                deleted_tiles: vec![t3_id.clone()],
                edited_tiles: vec![],
            },
        );

        assert!(project.resolve_tile(&t3_id).is_none());
        // the provisional tile got a fresh permanent id and survived the trim
        assert_eq!(result.tileset.tiles.len(), 2);
        assert_eq!(result.tileset.tiles[1].id, committed("tile2"));
        // tile0 was unreferenced by the grid: trimmed locally, kept globally
        assert!(result.tileset.position(&committed("tile0")).is_none());
        assert!(project.resolve_tile("tile0").is_some());
        // grid indices were remapped onto the compacted tileset
        assert_eq!(result.grid.get(2, 2), 1);
    }

    #[test]
    fn test_stub_tiles_resolve_against_project() {
        let (mut project, mut data) = project_with_tiles(1);
        data.tileset.tiles[1].bitmap = None;
        data.grid.set(0, 0, 1);

        let result = reconcile_session(&mut project, SessionResult::unchanged(data));
        assert_eq!(
            result.tileset.tiles[1].bitmap,
            Some(marked_bitmap(16, 1))
        );
    }

    #[test]
    fn test_unresolvable_stub_is_tolerated() {
        let (mut project, mut data) = project_with_tiles(0);
        data.tileset.tiles.push(tile(committed("ghost"), None));
        data.grid.set(0, 0, 1);

        let result = reconcile_session(&mut project, SessionResult::unchanged(data));
        assert_eq!(result.tileset.tiles[1].bitmap, None);
    }

    #[test]
    fn test_named_tilemap_is_persisted() {
        let (mut project, mut data) = project_with_tiles(1);
        data.tilemap_id = Some("level1".to_string());
        data.grid.set(3, 3, 1);

        let result = reconcile_session(&mut project, SessionResult::unchanged(data));

        let stored = project.get_tilemap("level1").unwrap();
        assert_eq!(stored, result);
    }

    #[test]
    fn test_trim_remaps_indices() {
        let mut data = TilemapData::blank(TileWidth::Sixteen, 2, 1);
        for i in 0..4u8 {
            data.tileset.tiles.push(tile(
                committed(&format!("tile{}", i)),
                Some(marked_bitmap(16, i + 1)),
            ));
        }
        data.grid.set(0, 0, 3);
        data.grid.set(1, 0, 9); // dangling index

        trim_tileset(&mut data);

        assert_eq!(data.tileset.tiles.len(), 2); // index 0 + tile2
        assert_eq!(data.tileset.tiles[1].id, committed("tile2"));
        assert_eq!(data.grid.get(0, 0), 1);
        assert_eq!(data.grid.get(1, 0), 0);
    }

    #[test]
    fn test_trim_empty_tileset_is_noop() {
        let mut data = TilemapData::blank(TileWidth::Sixteen, 2, 2);
        trim_tileset(&mut data);
        assert!(data.tileset.tiles.is_empty());
    }
}
