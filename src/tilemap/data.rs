//! Tile, tileset and tilemap value types.

use super::Bitmap;

/// Supported tile pixel dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TileWidth {
    Eight,
    #[default]
    Sixteen,
    ThirtyTwo,
}

impl TileWidth {
    /// Edge length in pixels.
    pub const fn pixels(self) -> u16 {
        match self {
            TileWidth::Eight => 8,
            TileWidth::Sixteen => 16,
            TileWidth::ThirtyTwo => 32,
        }
    }

    /// Returns `None` for anything other than 8, 16 or 32.
    pub fn from_pixels(pixels: u32) -> Option<Self> {
        match pixels {
            8 => Some(TileWidth::Eight),
            16 => Some(TileWidth::Sixteen),
            32 => Some(TileWidth::ThirtyTwo),
            _ => None,
        }
    }
}

/// Identity of a tile record.
///
/// A tile created during an edit session holds a session-local handle until
/// the project assigns it a permanent id on commit. Provisional ids never
/// appear in a serialized literal or in the project tileset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TileId {
    /// Stable id assigned by the project
    Committed(String),
    /// Session-local handle for a tile not yet committed
    Provisional(u32),
}

impl TileId {
    pub fn is_provisional(&self) -> bool {
        matches!(self, TileId::Provisional(_))
    }

    /// The stable id string, if this tile has been committed.
    pub fn as_committed(&self) -> Option<&str> {
        match self {
            TileId::Committed(id) => Some(id),
            TileId::Provisional(_) => None,
        }
    }
}

/// A single tileset entry.
///
/// A tile without a bitmap is a stub reference: it names a project tile whose
/// pixel data is resolved lazily against the project store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub id: TileId,
    pub bitmap: Option<Bitmap>,
    /// Ordering hint for the editor palette, reassigned on every session open
    pub weight: u32,
}

/// Ordered tile collection referenced by index from a tilemap grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tileset {
    pub tile_width: TileWidth,
    pub tiles: Vec<Tile>,
}

impl Tileset {
    pub fn new(tile_width: TileWidth) -> Self {
        Self {
            tile_width,
            tiles: Vec::new(),
        }
    }

    /// Position of the tile with the given id, if present.
    pub fn position(&self, id: &TileId) -> Option<usize> {
        self.tiles.iter().position(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TileId) -> bool {
        self.position(id).is_some()
    }
}

/// The grid of tile-index cells.
///
/// Each cell holds an index into the tileset; 0 is the transparent/empty
/// cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: u16,
    height: u16,
    cells: Vec<u16>,
}

impl TileGrid {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width as usize * height as usize],
        }
    }

    /// Create a grid from raw cell data. Returns `None` if the buffer length
    /// does not match the dimensions.
    pub fn from_cells(width: u16, height: u16, cells: Vec<u16>) -> Option<Self> {
        if cells.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Tile index at (x, y). Out-of-range coordinates read as empty.
    pub fn get(&self, x: u16, y: u16) -> u16 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Set the tile index at (x, y). Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: u16, y: u16, index: u16) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.cells[y as usize * self.width as usize + x as usize] = index;
    }

    pub fn cells(&self) -> &[u16] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [u16] {
        &mut self.cells
    }
}

/// A complete tilemap value: index grid, layer flags and tileset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilemapData {
    pub grid: TileGrid,
    /// Per-cell layer flags; dimensions must match the grid
    pub layers: Bitmap,
    pub tileset: Tileset,
    /// Set when this value is a named project tilemap rather than an
    /// anonymous inline literal
    pub tilemap_id: Option<String>,
}

impl TilemapData {
    /// A blank all-zero tilemap with an empty tileset.
    pub fn blank(tile_width: TileWidth, width: u16, height: u16) -> Self {
        Self {
            grid: TileGrid::new(width, height),
            layers: Bitmap::new(width, height),
            tileset: Tileset::new(tile_width),
            tilemap_id: None,
        }
    }
}
