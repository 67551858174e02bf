//! Centralized constants used across the crate.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Edge length of the rendered thumbnail in pixels.
///
/// 32 divides evenly by every supported tile size (8/16/32), so hosts can
/// scale the image without anti-aliasing artifacts.
pub const PREVIEW_WIDTH: u32 = 32;

/// Default grid width for a freshly created field, in tiles
pub const DEFAULT_GRID_WIDTH: u16 = 16;

/// Default grid height for a freshly created field, in tiles
pub const DEFAULT_GRID_HEIGHT: u16 = 16;

/// Maximum number of change records to keep in the field history
pub const MAX_HISTORY_SIZE: usize = 100;

/// Maximum number of project snapshots kept for undo
pub const MAX_PROJECT_HISTORY: usize = 100;
