//! The tilemap field component.
//!
//! A field owns the literal text of one block argument and its decoded
//! tilemap value. Text that decodes cleanly renders as a thumbnail preview;
//! text that decodes to a structurally invalid tilemap drops the field into
//! an uneditable raw-text mode that preserves the literal verbatim. Text
//! that cannot be decoded at all is replaced by the configured blank
//! default.

use bevy::prelude::*;

use crate::codec::{self, TileResolver};
use crate::tilemap::{check_tilemap, TilemapData};

use super::options::ParsedFieldOptions;

/// How the host should present the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Thumbnail preview, editable
    Preview,
    /// Degraded raw-text display, not editable
    RawText,
}

/// A tilemap-editing field attached to a block.
#[derive(Component)]
pub struct TilemapField {
    options: ParsedFieldOptions,
    state: TilemapData,
    display: DisplayMode,
    /// Literal preserved verbatim while in raw-text mode
    raw_text: String,
    /// Last literal that decoded cleanly; the fallback when the current
    /// state can no longer be encoded
    init_text: String,
    /// Opaque editor-session state carried across sessions
    pub(crate) persistent: Option<serde_json::Value>,
    pub(crate) preview_dirty: bool,
    /// Project stamp at the last repaint, for staleness detection
    pub(crate) seen_stamp: (u64, u64),
}

impl TilemapField {
    /// A fresh field holding the configured blank tilemap.
    pub fn new(options: ParsedFieldOptions) -> Self {
        let state = TilemapData::blank(options.tile_width, options.init_width, options.init_height);
        // a blank tilemap has no provisional tiles, so this cannot fail
        let init_text = codec::encode(&state).unwrap_or_default();
        Self {
            options,
            state,
            display: DisplayMode::Preview,
            raw_text: String::new(),
            init_text,
            persistent: None,
            preview_dirty: true,
            seen_stamp: (0, 0),
        }
    }

    /// A field initialized from existing literal text.
    pub fn from_text(
        options: ParsedFieldOptions,
        text: &str,
        resolver: &impl TileResolver,
    ) -> Self {
        let mut field = Self::new(options);
        if !text.trim().is_empty() {
            field.set_value(text, resolver);
        }
        field
    }

    /// Replace the field's value from literal text.
    pub fn set_value(&mut self, text: &str, resolver: &impl TileResolver) {
        let unescaped = codec::unescape_backticks(text);
        self.preview_dirty = true;

        if let Some(id) = codec::parse_reference(&unescaped) {
            if let Some(mut data) = resolver.tilemap(&id) {
                data.tilemap_id = Some(id);
                self.state = data;
                self.display = DisplayMode::Preview;
                self.init_text = unescaped;
                return;
            }
            warn!("no tilemap named `{}` in the project, using blank", id);
            self.state = self.blank_state();
            self.display = DisplayMode::Preview;
            return;
        }

        if unescaped.trim().is_empty() {
            self.state = self.blank_state();
            self.display = DisplayMode::Preview;
            return;
        }

        match codec::decode_inline(unescaped.trim(), resolver) {
            Ok(data) if check_tilemap(&data) => {
                self.state = data;
                self.display = DisplayMode::Preview;
                self.init_text = unescaped;
            }
            Ok(_) => {
                // decoded but structurally invalid; keep the literal around
                // untouched so nothing is lost on round-trip
                warn!("tilemap literal failed validation, switching to raw text display");
                self.display = DisplayMode::RawText;
                self.raw_text = text.to_string();
            }
            Err(e) => {
                warn!("undecodable tilemap literal ({}), using blank", e);
                self.state = self.blank_state();
                self.display = DisplayMode::Preview;
            }
        }
    }

    /// The field's current literal text.
    ///
    /// Raw-text mode returns the preserved literal. Otherwise the state is
    /// re-encoded; a state that can no longer be encoded falls back to the
    /// last literal that decoded cleanly.
    pub fn value(&self) -> String {
        if self.display == DisplayMode::RawText {
            return self.raw_text.clone();
        }
        match codec::encode(&self.state) {
            Ok(text) => text,
            Err(e) => {
                warn!("tilemap could not be re-encoded ({}), keeping last literal", e);
                self.init_text.clone()
            }
        }
    }

    /// Re-pull tile data from the project after tile identities may have
    /// shifted (undo/redo, another field's session).
    pub fn refresh_tileset(&mut self, resolver: &impl TileResolver) {
        if let Some(id) = self.state.tilemap_id.clone() {
            if let Some(data) = resolver.tilemap(&id) {
                self.state = data;
            }
        } else {
            for tile in self.state.tileset.tiles.iter_mut() {
                if let Some(id) = tile.id.as_committed()
                    && let Some(resolved) = resolver.tile(id)
                {
                    *tile = resolved;
                }
            }
        }
        self.preview_dirty = true;
    }

    /// Replace the state with a reconciled session result.
    pub fn apply_session_result(
        &mut self,
        data: TilemapData,
        persistent: Option<serde_json::Value>,
    ) {
        self.state = data;
        if persistent.is_some() {
            self.persistent = persistent;
        }
        self.preview_dirty = true;
    }

    /// Abbreviated text for hosts that cannot render a preview.
    pub fn display_text(&self) -> String {
        let text = if self.display == DisplayMode::RawText {
            &self.raw_text
        } else {
            &self.init_text
        };
        match text.find('(') {
            Some(i) => format!("{}(...)", &text[..i]),
            // truncate on a char boundary; raw literals can hold any UTF-8
            None => match text.char_indices().nth(16) {
                Some((i, _)) => format!("{}...", &text[..i]),
                None => text.clone(),
            },
        }
    }

    pub fn state(&self) -> &TilemapData {
        &self.state
    }

    pub fn options(&self) -> &ParsedFieldOptions {
        &self.options
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display
    }

    pub fn is_raw_text(&self) -> bool {
        self.display == DisplayMode::RawText
    }

    fn blank_state(&self) -> TilemapData {
        TilemapData::blank(
            self.options.tile_width,
            self.options.init_width,
            self.options.init_height,
        )
    }
}
