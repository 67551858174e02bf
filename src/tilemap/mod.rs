//! Core tilemap data model.
//!
//! A tilemap value is a grid of tile-index cells, a parallel grid of per-cell
//! layer flags, and a tileset: the ordered list of tile bitmaps the indices
//! refer to. Cell index 0 is reserved for transparency and always refers to
//! the first tileset entry.
//!
//! ## Module Structure
//!
//! - [`bitmap`] - Pixel bitmaps of 4-bit palette indices
//! - [`data`] - Tile, tileset and tilemap value types
//! - [`validation`] - Structural validation of decoded tilemaps

mod bitmap;
mod data;
mod validation;

pub use bitmap::Bitmap;
pub use data::{Tile, TileGrid, TileId, TileWidth, TilemapData, Tileset};
pub use validation::check_tilemap;
