//! Thumbnail rendering for field previews.
//!
//! Composes the tilemap (grid cells -> tile bitmaps -> palette) into a small
//! RGBA image by nearest-neighbor sampling. The host decides how to display
//! the image; raw-text fields render no thumbnail at all.

use bevy::prelude::*;
use image::{Rgba, RgbaImage};

use crate::tilemap::TilemapData;

/// Default 16-color palette. Index 0 is transparent.
pub const DEFAULT_PALETTE: [[u8; 4]; 16] = [
    [0x00, 0x00, 0x00, 0x00],
    [0xff, 0xff, 0xff, 0xff],
    [0xff, 0x21, 0x21, 0xff],
    [0xff, 0x93, 0xc4, 0xff],
    [0xff, 0x81, 0x35, 0xff],
    [0xff, 0xf6, 0x09, 0xff],
    [0x24, 0x9c, 0xa3, 0xff],
    [0x78, 0xdc, 0x52, 0xff],
    [0x00, 0x3f, 0xad, 0xff],
    [0x87, 0xf2, 0xff, 0xff],
    [0x8e, 0x2e, 0xc4, 0xff],
    [0xa4, 0x83, 0x9f, 0xff],
    [0x5c, 0x40, 0x6c, 0xff],
    [0xe5, 0xcd, 0xc4, 0xff],
    [0x91, 0x46, 0x3d, 0xff],
    [0x00, 0x00, 0x00, 0xff],
];

/// The rendered thumbnail attached next to a field.
#[derive(Component)]
pub struct FieldPreview {
    pub image: RgbaImage,
}

/// Render a square thumbnail of the tilemap.
///
/// Cells holding index 0, indices past the tileset, unresolved tile stubs
/// and transparent pixels all sample as transparent.
pub fn render_thumbnail(data: &TilemapData, size: u32) -> RgbaImage {
    let mut image = RgbaImage::new(size, size);

    let px = data.tileset.tile_width.pixels() as u32;
    let map_width = data.grid.width() as u32 * px;
    let map_height = data.grid.height() as u32 * px;
    if map_width == 0 || map_height == 0 || size == 0 {
        return image;
    }

    for y in 0..size {
        for x in 0..size {
            let sx = x * map_width / size;
            let sy = y * map_height / size;

            let index = data.grid.get((sx / px) as u16, (sy / px) as u16) as usize;
            if index == 0 || index >= data.tileset.tiles.len() {
                continue;
            }
            let Some(bitmap) = &data.tileset.tiles[index].bitmap else {
                continue;
            };

            let pixel = bitmap.get((sx % px) as u16, (sy % px) as u16);
            if pixel == 0 {
                continue;
            }
            image.put_pixel(x, y, Rgba(DEFAULT_PALETTE[(pixel & 0x0f) as usize]));
        }
    }

    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::{Bitmap, Tile, TileId, TileWidth, TilemapData};

    fn solid_tile(id: &str, color: u8) -> Tile {
        let mut bitmap = Bitmap::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                bitmap.set(x, y, color);
            }
        }
        Tile {
            id: TileId::Committed(id.to_string()),
            bitmap: Some(bitmap),
            weight: 0,
        }
    }

    #[test]
    fn test_blank_tilemap_renders_transparent() {
        let data = TilemapData::blank(TileWidth::Sixteen, 16, 16);
        let image = render_thumbnail(&data, 32);
        assert!(image.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_zero_size_grid_renders_without_panic() {
        let data = TilemapData::blank(TileWidth::Sixteen, 0, 0);
        let image = render_thumbnail(&data, 32);
        assert_eq!(image.dimensions(), (32, 32));
    }

    #[test]
    fn test_filled_cell_paints_palette_color() {
        let mut data = TilemapData::blank(TileWidth::Sixteen, 2, 2);
        data.tileset
            .tiles
            .push(crate::project::transparency_tile(TileWidth::Sixteen));
        data.tileset.tiles.push(solid_tile("tile0", 2));
        // fill the top-left cell only
        data.grid.set(0, 0, 1);

        let image = render_thumbnail(&data, 32);

        // top-left quadrant is palette color 2, the rest transparent
        assert_eq!(image.get_pixel(4, 4).0, DEFAULT_PALETTE[2]);
        assert_eq!(image.get_pixel(20, 20).0[3], 0);
        assert_eq!(image.get_pixel(20, 4).0[3], 0);
    }

    #[test]
    fn test_dangling_index_and_stub_are_transparent() {
        let mut data = TilemapData::blank(TileWidth::Sixteen, 2, 2);
        data.tileset
            .tiles
            .push(crate::project::transparency_tile(TileWidth::Sixteen));
        data.tileset.tiles.push(Tile {
            id: TileId::Committed("stub".to_string()),
            bitmap: None,
            weight: 0,
        });
        data.grid.set(0, 0, 1); // stub
        data.grid.set(1, 1, 9); // dangling

        let image = render_thumbnail(&data, 32);
        assert!(image.pixels().all(|p| p.0[3] == 0));
    }
}
