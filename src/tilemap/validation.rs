//! Structural validation of decoded tilemaps.

use super::TilemapData;

/// Check that a tilemap value is structurally sound.
///
/// Rejects a zero-width or zero-height grid and a layer grid whose
/// dimensions differ from the index grid. A missing grid or tileset is
/// unrepresentable because [`TilemapData`] owns both.
pub fn check_tilemap(data: &TilemapData) -> bool {
    if data.grid.width() == 0 || data.grid.height() == 0 {
        return false;
    }

    if data.layers.width() != data.grid.width() || data.layers.height() != data.grid.height() {
        return false;
    }

    true
}
