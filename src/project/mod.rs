//! The shared tilemap project: tile store, named tilemaps, revision counter
//! and snapshot-based undo/redo.
//!
//! The project is the single source of truth for committed tiles. Fields and
//! the codec never reach for a global; they receive the resource (or its
//! [`TileResolver`] view) explicitly.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::codec::TileResolver;
use crate::constants::MAX_PROJECT_HISTORY;
use crate::tilemap::{Bitmap, Tile, TileId, TileWidth, TilemapData};

pub struct ProjectPlugin;

impl Plugin for ProjectPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TilemapProject>();
    }
}

/// A committed tile as stored by the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTile {
    pub id: String,
    pub bitmap: Bitmap,
}

/// Snapshot of all mutable project state, kept for undo/redo.
#[derive(Debug, Clone)]
struct ProjectSnapshot {
    tiles: Vec<ProjectTile>,
    tilemaps: HashMap<String, TilemapData>,
    revision: u64,
}

/// Shared tilemap project resource.
#[derive(Resource, Default)]
pub struct TilemapProject {
    tiles: Vec<ProjectTile>,
    tilemaps: HashMap<String, TilemapData>,
    revision: u64,
    next_tile_index: u32,
    refresh_counter: u64,
    undo_stack: Vec<ProjectSnapshot>,
    redo_stack: Vec<ProjectSnapshot>,
}

impl TilemapProject {
    /// Look up a named tilemap. The returned value carries its id.
    pub fn get_tilemap(&self, id: &str) -> Option<TilemapData> {
        self.tilemaps.get(id).cloned().map(|mut data| {
            data.tilemap_id = Some(id.to_string());
            data
        })
    }

    /// Store a tilemap under a name, replacing any previous value.
    pub fn update_tilemap(&mut self, id: &str, mut data: TilemapData) {
        data.tilemap_id = Some(id.to_string());
        self.tilemaps.insert(id.to_string(), data);
        self.revision += 1;
    }

    /// Commit a new tile and mint its permanent id.
    pub fn create_tile(&mut self, bitmap: &Bitmap) -> Tile {
        let id = format!("tile{}", self.next_tile_index);
        self.next_tile_index += 1;
        self.tiles.push(ProjectTile {
            id: id.clone(),
            bitmap: bitmap.clone(),
        });
        self.revision += 1;
        Tile {
            id: TileId::Committed(id),
            bitmap: Some(bitmap.clone()),
            weight: 0,
        }
    }

    /// Replace the bitmap of a committed tile. Returns the updated record,
    /// or `None` if no tile has that id.
    pub fn update_tile(&mut self, id: &str, bitmap: &Bitmap) -> Option<Tile> {
        let tile = self.tiles.iter_mut().find(|t| t.id == id)?;
        tile.bitmap = bitmap.clone();
        self.revision += 1;
        Some(Tile {
            id: TileId::Committed(id.to_string()),
            bitmap: Some(bitmap.clone()),
            weight: 0,
        })
    }

    /// Remove a committed tile. A no-op (with no revision bump) if the tile
    /// is already absent.
    pub fn delete_tile(&mut self, id: &str) {
        let before = self.tiles.len();
        self.tiles.retain(|t| t.id != id);
        if self.tiles.len() != before {
            self.revision += 1;
        }
    }

    /// Materialize a committed tile from its id. Transparency tiles resolve
    /// even though they are never stored.
    pub fn resolve_tile(&self, id: &str) -> Option<Tile> {
        if let Some(width) = parse_transparency_id(id) {
            return Some(transparency_tile(width));
        }
        self.tiles.iter().find(|t| t.id == id).map(|t| Tile {
            id: TileId::Committed(t.id.clone()),
            bitmap: Some(t.bitmap.clone()),
            weight: 0,
        })
    }

    /// All committed tiles of the given width, in palette order, optionally
    /// led by the synthetic transparency tile.
    pub fn project_tiles(&self, tile_width: TileWidth, include_transparent: bool) -> Vec<Tile> {
        let px = tile_width.pixels();
        let mut tiles = Vec::new();
        if include_transparent {
            tiles.push(transparency_tile(tile_width));
        }
        tiles.extend(
            self.tiles
                .iter()
                .filter(|t| t.bitmap.width() == px && t.bitmap.height() == px)
                .map(|t| Tile {
                    id: TileId::Committed(t.id.clone()),
                    bitmap: Some(t.bitmap.clone()),
                    weight: 0,
                }),
        );
        for (weight, tile) in tiles.iter_mut().enumerate() {
            tile.weight = weight as u32;
        }
        tiles
    }

    /// Current revision. Bumped on every mutation; restored by undo/redo.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Request a repaint of dependent views without mutating tile state.
    pub fn force_update(&mut self) {
        self.refresh_counter += 1;
    }

    /// Staleness stamp for dependent views: changes whenever the project
    /// mutates or a refresh is forced.
    pub fn stamp(&self) -> (u64, u64) {
        (self.revision, self.refresh_counter)
    }

    /// Record the current state so the next batch of mutations can be
    /// undone as one step.
    ///
    /// Callers pair this with either [`Self::discard_undo`] (the batch
    /// turned out to be a no-op) or [`Self::clear_redo`] (the batch is
    /// real work, making the redo branch unreachable).
    pub fn push_undo(&mut self) {
        let snapshot = self.snapshot();
        self.undo_stack.push(snapshot);
        while self.undo_stack.len() > MAX_PROJECT_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Drop the snapshot most recently pushed by [`Self::push_undo`].
    pub fn discard_undo(&mut self) {
        self.undo_stack.pop();
    }

    /// Drop all redoable snapshots.
    pub fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    /// Restore the most recent snapshot. Returns false if there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.redo_stack.push(current);
        self.restore(snapshot);
        true
    }

    /// Reapply the most recently undone snapshot. Returns false if there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.undo_stack.push(current);
        self.restore(snapshot);
        true
    }

    /// A blank tilemap of the given dimensions.
    pub fn blank_tilemap(&self, tile_width: TileWidth, width: u16, height: u16) -> TilemapData {
        TilemapData::blank(tile_width, width, height)
    }

    fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            tiles: self.tiles.clone(),
            tilemaps: self.tilemaps.clone(),
            revision: self.revision,
        }
    }

    fn restore(&mut self, snapshot: ProjectSnapshot) {
        self.tiles = snapshot.tiles;
        self.tilemaps = snapshot.tilemaps;
        self.revision = snapshot.revision;
        self.refresh_counter += 1;
    }
}

impl TileResolver for TilemapProject {
    fn tilemap(&self, id: &str) -> Option<TilemapData> {
        self.get_tilemap(id)
    }

    fn tile(&self, id: &str) -> Option<Tile> {
        self.resolve_tile(id)
    }
}

/// The synthetic all-transparent tile for a given width.
pub fn transparency_tile(tile_width: TileWidth) -> Tile {
    let px = tile_width.pixels();
    Tile {
        id: TileId::Committed(format!("transparency{}", px)),
        bitmap: Some(Bitmap::new(px, px)),
        weight: 0,
    }
}

fn parse_transparency_id(id: &str) -> Option<TileWidth> {
    let px: u32 = id.strip_prefix("transparency")?.parse().ok()?;
    TileWidth::from_pixels(px)
}

/// True for the synthetic per-width transparency tile ids.
pub fn is_transparency_id(id: &str) -> bool {
    parse_transparency_id(id).is_some()
}
