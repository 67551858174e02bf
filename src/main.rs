//! Headless demo: drives a tilemap field through a full scripted edit
//! session, then replays it backwards and forwards.

use bevy::prelude::*;

use tilefield::config::EditorPrefs;
use tilefield::field::{
    ActiveSession, EditorClosed, FieldPreview, OpenEditorRequest, RedoRequest, SessionResult,
    TilemapField, UndoRequest,
};
use tilefield::project::TilemapProject;
use tilefield::tilemap::{Bitmap, Tile, TileId, TileWidth, TilemapData};
use tilefield::{PrefsPlugin, ProjectPlugin, TilemapFieldPlugin};

/// Set up file logging for debug builds
#[cfg(debug_assertions)]
fn setup_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use std::fs::OpenOptions;
    use std::io::Write;
    use tracing_subscriber::prelude::*;

    // Create logs directory if it doesn't exist
    let logs_dir = tilefield::paths::logs_dir();
    if std::fs::create_dir_all(&logs_dir).is_err() {
        eprintln!("Failed to create logs directory");
        return None;
    }

    let log_file_path = logs_dir.join("tilefield.log");

    // Append session separator to existing log file
    if let Ok(mut file) = OpenOptions::new().append(true).open(&log_file_path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let separator = "=".repeat(80);
        let _ = writeln!(
            file,
            "\n\n{}\n=== New Session Started at {} ===\n{}\n",
            separator, timestamp, separator
        );
    }

    // Set up file appender
    let file_appender = tracing_appender::rolling::never(logs_dir, "tilefield.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Configure file layer (no ANSI colors for file output)
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    // Configure stdout layer (with ANSI colors)
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_level(true);

    // Use env filter to control log levels
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tilefield=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Some(guard)
}

#[cfg(not(debug_assertions))]
fn setup_logging() -> Option<()> {
    None
}

fn main() {
    // Keep the guard alive for the duration of the program
    let _log_guard = setup_logging();

    if let Err(e) = tilefield::paths::ensure_directories() {
        eprintln!("Failed to create data directories: {}", e);
    }

    let mut app = App::new();
    app.add_plugins((PrefsPlugin, ProjectPlugin, TilemapFieldPlugin));

    // run startup so preferences are loaded
    app.update();

    // seed the project with one committed tile and a named tilemap
    {
        let mut project = app.world_mut().resource_mut::<TilemapProject>();
        let mut grass = Bitmap::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                grass.set(x, y, 7);
            }
        }
        let tile = project.create_tile(&grass);

        let mut level = TilemapData::blank(TileWidth::Sixteen, 8, 8);
        level
            .tileset
            .tiles
            .push(tilefield::project::transparency_tile(TileWidth::Sixteen));
        level.tileset.tiles.push(tile);
        for x in 0..8 {
            level.grid.set(x, 7, 1);
        }
        project.update_tilemap("level1", level);
    }

    // spawn a field bound to the named tilemap
    let field = {
        let options = app.world().resource::<EditorPrefs>().default_options();
        let world = app.world_mut();
        let project = world.resource::<TilemapProject>();
        let field = TilemapField::from_text(options, "tilemap`level1`", project);
        world.spawn(field).id()
    };
    app.update();
    log_field(&mut app, field, "initial");

    // open an edit session
    app.world_mut().write_message(OpenEditorRequest { field });
    app.update();

    // script the "modal editor": add a brick tile and paint a wall with it
    let mut data = app.world().resource::<ActiveSession>().data.clone();
    let mut brick = Bitmap::new(16, 16);
    for y in 0..16 {
        for x in 0..16 {
            brick.set(x, y, if (x / 4 + y / 4) % 2 == 0 { 2 } else { 14 });
        }
    }
    data.tileset.tiles.push(Tile {
        id: TileId::Provisional(0),
        bitmap: Some(brick),
        weight: 0,
    });
    let brick_index = (data.tileset.tiles.len() - 1) as u16;
    for y in 0..7 {
        data.grid.set(0, y, brick_index);
        data.grid.set(7, y, brick_index);
    }
    app.world_mut().write_message(EditorClosed {
        result: Some(SessionResult::unchanged(data)),
        persistent: None,
    });
    app.update();
    log_field(&mut app, field, "after session");

    // save the thumbnail so the result can be eyeballed
    if let Some(preview) = app.world().get::<FieldPreview>(field) {
        let path = tilefield::paths::logs_dir().join("preview.png");
        match preview.image.save(&path) {
            Ok(()) => info!("thumbnail written to {:?}", path),
            Err(e) => warn!("failed to write thumbnail: {}", e),
        }
    }

    // replay the session backwards, then forwards again
    app.world_mut().write_message(UndoRequest);
    app.update();
    log_field(&mut app, field, "after undo");

    app.world_mut().write_message(RedoRequest);
    app.update();
    log_field(&mut app, field, "after redo");
}

fn log_field(app: &mut App, field: Entity, label: &str) {
    let revision = app.world().resource::<TilemapProject>().revision();
    if let Some(field) = app.world().get::<TilemapField>(field) {
        info!(
            "{}: literal {:?}, tileset of {} tiles, project revision {}",
            label,
            field.value(),
            field.state().tileset.tiles.len(),
            revision
        );
    }
}
