//! Field configuration options as supplied by block definitions.
//!
//! Block definitions hand options over as loosely typed strings (or numbers
//! for the tile width), so parsing is lenient: anything unrecognized falls
//! back to the defaults.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH};
use crate::tilemap::TileWidth;

/// Raw options as they appear in a block definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldOptions {
    #[serde(default)]
    pub init_width: Option<String>,
    #[serde(default)]
    pub init_height: Option<String>,
    #[serde(default)]
    pub tile_width: Option<TileWidthOption>,
    /// Restricts which gallery tiles the editor session offers
    #[serde(default)]
    pub filter: Option<String>,
}

/// The tile width option accepts both numeric and named string forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TileWidthOption {
    Number(u32),
    Named(String),
}

/// Validated options with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFieldOptions {
    pub init_width: u16,
    pub init_height: u16,
    pub tile_width: TileWidth,
    pub filter: Option<String>,
}

impl Default for ParsedFieldOptions {
    fn default() -> Self {
        Self {
            init_width: DEFAULT_GRID_WIDTH,
            init_height: DEFAULT_GRID_HEIGHT,
            tile_width: TileWidth::default(),
            filter: None,
        }
    }
}

/// Parse raw field options, falling back to defaults for anything missing
/// or unrecognized.
pub fn parse_field_options(opts: &FieldOptions) -> ParsedFieldOptions {
    let mut parsed = ParsedFieldOptions::default();

    if let Some(filter) = &opts.filter {
        parsed.filter = Some(filter.clone());
    }

    if let Some(tile_width) = &opts.tile_width {
        let resolved = match tile_width {
            TileWidthOption::Number(n) => TileWidth::from_pixels(*n),
            TileWidthOption::Named(name) => parse_named_tile_width(name),
        };
        if let Some(width) = resolved {
            parsed.tile_width = width;
        }
    }

    parsed.init_width = with_default(opts.init_width.as_deref(), parsed.init_width);
    parsed.init_height = with_default(opts.init_height.as_deref(), parsed.init_height);

    parsed
}

fn parse_named_tile_width(name: &str) -> Option<TileWidth> {
    match name.trim().to_lowercase().as_str() {
        "8" | "eight" => Some(TileWidth::Eight),
        "16" | "sixteen" => Some(TileWidth::Sixteen),
        "32" | "thirtytwo" => Some(TileWidth::ThirtyTwo),
        _ => None,
    }
}

fn with_default(raw: Option<&str>, default: u16) -> u16 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}
