//! Tilefield: an embeddable tilemap field for block-based code editors.
//!
//! A *field* is a visual control living inside a code block. This crate
//! provides a tilemap-editing field: it renders a thumbnail of a tilemap (a
//! grid of indexed tile references plus the tile image set), hands editing
//! off to the host's modal tile editor, reconciles the edited tileset back
//! into a shared tilemap project, and serializes the value to a textual
//! literal for embedding in generated source code.
//!
//! Hosts add [`ProjectPlugin`] and [`TilemapFieldPlugin`] to their app,
//! spawn [`field::TilemapField`] components next to their blocks, and drive
//! the flow with the messages in [`field`]: `OpenEditorRequest` when the
//! user activates a field, `EditorClosed` when the modal editor finishes,
//! and `UndoRequest`/`RedoRequest` to replay changes.

pub mod codec;
pub mod config;
pub mod constants;
pub mod field;
pub mod paths;
pub mod project;
pub mod tilemap;

pub use config::PrefsPlugin;
pub use field::TilemapFieldPlugin;
pub use project::ProjectPlugin;
