//! Text literal codec for tilemap values.
//!
//! A tilemap embeds into generated source code in one of two forms:
//!
//! - the reference form `` tilemap`<id>` ``, naming a tilemap stored in the
//!   project, or
//! - an inline form: a base64 string over a little-endian binary layout
//!   (magic, version, tile width, grid, layer flags, tileset entries) with a
//!   trailing CRC32 of the payload.
//!
//! Decoding depends on a [`TileResolver`] to look up named tilemaps and to
//! materialize tiles serialized as id-only stubs.

use crate::tilemap::{
    check_tilemap, Bitmap, Tile, TileGrid, TileId, TileWidth, TilemapData, Tileset,
};

/// Magic number for inline literals ("TMAP" in ASCII)
const MAGIC: [u8; 4] = [b'T', b'M', b'A', b'P'];

/// Current inline literal format version
const VERSION: u16 = 1;

/// Resolver for project-owned tilemaps and tiles, injected into the codec.
pub trait TileResolver {
    /// Look up a named tilemap.
    fn tilemap(&self, id: &str) -> Option<TilemapData>;

    /// Materialize a committed tile from its stable id.
    fn tile(&self, id: &str) -> Option<Tile>;
}

/// Resolver with no project behind it; every lookup misses.
///
/// Useful for encoding-only callers and tests.
pub struct NoResolver;

impl TileResolver for NoResolver {
    fn tilemap(&self, _id: &str) -> Option<TilemapData> {
        None
    }

    fn tile(&self, _id: &str) -> Option<Tile> {
        None
    }
}

/// Error type for encoding a tilemap value into a literal
#[derive(Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// The tileset still holds a tile the project never committed
    ProvisionalTile(u32),
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::ProvisionalTile(handle) => {
                write!(f, "tileset holds uncommitted provisional tile #{}", handle)
            }
        }
    }
}

impl std::error::Error for EncodeError {}

/// Error type for decoding an inline literal
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    InvalidBase64,
    UnexpectedEof,
    InvalidMagicNumber,
    UnsupportedVersion(u16),
    InvalidTileWidth(u8),
    InvalidChecksum,
    InvalidTileId,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::InvalidBase64 => write!(f, "not valid base64"),
            DecodeError::UnexpectedEof => write!(f, "literal truncated"),
            DecodeError::InvalidMagicNumber => write!(f, "invalid magic number"),
            DecodeError::UnsupportedVersion(v) => write!(f, "unsupported version: {}", v),
            DecodeError::InvalidTileWidth(w) => write!(f, "invalid tile width: {}", w),
            DecodeError::InvalidChecksum => write!(f, "checksum mismatch"),
            DecodeError::InvalidTileId => write!(f, "tile id is not valid UTF-8"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode a tilemap literal.
///
/// Returns `None` when the text is neither a resolvable reference nor a
/// structurally valid inline literal; the caller substitutes its blank
/// default in that case.
pub fn decode(text: &str, resolver: &impl TileResolver) -> Option<TilemapData> {
    let text = unescape_backticks(text);

    if let Some(id) = parse_reference(&text) {
        let mut data = resolver.tilemap(&id)?;
        data.tilemap_id = Some(id);
        return Some(data);
    }

    match decode_inline(text.trim(), resolver) {
        Ok(data) if check_tilemap(&data) => Some(data),
        _ => None,
    }
}

/// Encode a tilemap value into a literal.
///
/// A value carrying a tilemap id emits the reference form; anything else is
/// serialized inline. Fails if the tileset still holds a provisional tile,
/// which signals a value the project has not committed yet.
pub fn encode(value: &TilemapData) -> Result<String, EncodeError> {
    if let Some(id) = &value.tilemap_id {
        return Ok(format!("tilemap`{}`", id));
    }
    encode_inline(value)
}

/// Extract the id from the reference form `` tilemap`<id>` ``.
pub fn parse_reference(text: &str) -> Option<String> {
    let rest = text.trim().strip_prefix("tilemap")?.trim_start();
    let rest = rest.strip_prefix('`')?;
    let (id, rest) = rest.split_once('`')?;
    if !rest.trim().is_empty() {
        return None;
    }
    Some(id.trim().to_string())
}

/// Backticks arrive HTML-escaped when the literal passed through markdown
/// content; undo that before parsing.
pub fn unescape_backticks(text: &str) -> String {
    text.replace("&#96;", "`")
}

fn encode_inline(value: &TilemapData) -> Result<String, EncodeError> {
    let mut payload = Vec::new();

    payload.extend_from_slice(&MAGIC);
    payload.extend_from_slice(&VERSION.to_le_bytes());
    payload.push(value.tileset.tile_width.pixels() as u8);

    payload.extend_from_slice(&value.grid.width().to_le_bytes());
    payload.extend_from_slice(&value.grid.height().to_le_bytes());
    for &cell in value.grid.cells() {
        payload.extend_from_slice(&cell.to_le_bytes());
    }
    payload.extend_from_slice(value.layers.pixels());

    payload.extend_from_slice(&(value.tileset.tiles.len() as u16).to_le_bytes());
    for tile in &value.tileset.tiles {
        let id = match &tile.id {
            TileId::Committed(id) => id,
            TileId::Provisional(handle) => return Err(EncodeError::ProvisionalTile(*handle)),
        };
        payload.extend_from_slice(&(id.len() as u16).to_le_bytes());
        payload.extend_from_slice(id.as_bytes());
        match &tile.bitmap {
            Some(bitmap) => {
                payload.push(1);
                payload.extend_from_slice(&bitmap.width().to_le_bytes());
                payload.extend_from_slice(&bitmap.height().to_le_bytes());
                payload.extend_from_slice(bitmap.pixels());
            }
            // stub reference, resolved against the project on decode
            None => payload.push(0),
        }
    }

    let checksum = crc32fast::hash(&payload);
    payload.extend_from_slice(&checksum.to_le_bytes());

    Ok(base64::encode_config(&payload, base64::URL_SAFE_NO_PAD))
}

/// Decode the inline form. Exposed within the crate so failures can be
/// logged with their cause at the call site.
pub(crate) fn decode_inline(
    text: &str,
    resolver: &impl TileResolver,
) -> Result<TilemapData, DecodeError> {
    let bytes = base64::decode_config(text, base64::URL_SAFE_NO_PAD)
        .map_err(|_| DecodeError::InvalidBase64)?;

    if bytes.len() < 4 {
        return Err(DecodeError::UnexpectedEof);
    }
    let (payload, checksum_bytes) = bytes.split_at(bytes.len() - 4);
    let expected = u32::from_le_bytes([
        checksum_bytes[0],
        checksum_bytes[1],
        checksum_bytes[2],
        checksum_bytes[3],
    ]);
    if crc32fast::hash(payload) != expected {
        return Err(DecodeError::InvalidChecksum);
    }

    let mut reader = Reader::new(payload);

    if reader.bytes(4)? != MAGIC {
        return Err(DecodeError::InvalidMagicNumber);
    }
    let version = reader.u16()?;
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    let tile_width_px = reader.u8()?;
    let tile_width = TileWidth::from_pixels(tile_width_px as u32)
        .ok_or(DecodeError::InvalidTileWidth(tile_width_px))?;

    let width = reader.u16()?;
    let height = reader.u16()?;
    let cell_count = width as usize * height as usize;
    // header dims are untrusted; the payload must hold at least the cells
    // (2 bytes each) and the layer bytes before anything is allocated
    if cell_count.saturating_mul(3) > reader.remaining() {
        return Err(DecodeError::UnexpectedEof);
    }
    let mut cells = Vec::with_capacity(cell_count);
    for _ in 0..cell_count {
        cells.push(reader.u16()?);
    }
    let grid = TileGrid::from_cells(width, height, cells).ok_or(DecodeError::UnexpectedEof)?;

    let layer_bytes = reader.bytes(cell_count)?.to_vec();
    let layers =
        Bitmap::from_pixels(width, height, layer_bytes).ok_or(DecodeError::UnexpectedEof)?;

    let tile_count = reader.u16()?;
    let mut tileset = Tileset::new(tile_width);
    for _ in 0..tile_count {
        let id_len = reader.u16()? as usize;
        let id = String::from_utf8(reader.bytes(id_len)?.to_vec())
            .map_err(|_| DecodeError::InvalidTileId)?;
        let tile = if reader.u8()? == 1 {
            let bw = reader.u16()?;
            let bh = reader.u16()?;
            // bounds-checked against the payload before the copy
            let pixels = reader.bytes(bw as usize * bh as usize)?.to_vec();
            let bitmap = Bitmap::from_pixels(bw, bh, pixels).ok_or(DecodeError::UnexpectedEof)?;
            Tile {
                id: TileId::Committed(id),
                bitmap: Some(bitmap),
                weight: 0,
            }
        } else {
            // id-only stub; tolerate a missing project entry and keep the
            // stub for lazy resolution later
            resolver.tile(&id).unwrap_or(Tile {
                id: TileId::Committed(id),
                bitmap: None,
                weight: 0,
            })
        };
        tileset.tiles.push(tile);
    }

    Ok(TilemapData {
        grid,
        layers,
        tileset,
        tilemap_id: None,
    })
}

/// Little-endian payload reader with bounds checking.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.pos + n > self.buf.len() {
            return Err(DecodeError::UnexpectedEof);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tilemap() -> TilemapData {
        let mut data = TilemapData::blank(TileWidth::Sixteen, 4, 3);
        let mut bitmap = Bitmap::new(16, 16);
        bitmap.set(0, 0, 2);
        bitmap.set(15, 15, 9);
        data.tileset.tiles.push(Tile {
            id: TileId::Committed("transparency16".to_string()),
            bitmap: Some(Bitmap::new(16, 16)),
            weight: 0,
        });
        data.tileset.tiles.push(Tile {
            id: TileId::Committed("tile1".to_string()),
            bitmap: Some(bitmap),
            weight: 0,
        });
        data.grid.set(1, 1, 1);
        data.grid.set(3, 2, 1);
        data.layers.set(1, 1, 1);
        data
    }

    #[test]
    fn test_inline_roundtrip() {
        let data = sample_tilemap();
        let text = encode(&data).unwrap();
        let decoded = decode(&text, &NoResolver).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_reference_form_roundtrip() {
        let mut data = sample_tilemap();
        data.tilemap_id = Some("level1".to_string());
        let text = encode(&data).unwrap();
        assert_eq!(text, "tilemap`level1`");
        assert_eq!(parse_reference(&text), Some("level1".to_string()));
    }

    #[test]
    fn test_parse_reference_tolerates_whitespace() {
        assert_eq!(
            parse_reference("  tilemap `level 1`  "),
            Some("level 1".to_string())
        );
        assert_eq!(parse_reference("tilemap``"), Some(String::new()));
    }

    #[test]
    fn test_parse_reference_rejects_other_text() {
        assert_eq!(parse_reference("sprite`foo`"), None);
        assert_eq!(parse_reference("tilemap`foo` bar"), None);
        assert_eq!(parse_reference("tilemap"), None);
    }

    #[test]
    fn test_unescape_backticks() {
        assert_eq!(
            parse_reference(&unescape_backticks("tilemap&#96;level1&#96;")),
            Some("level1".to_string())
        );
    }

    #[test]
    fn test_encode_fails_on_provisional_tile() {
        let mut data = sample_tilemap();
        data.tileset.tiles.push(Tile {
            id: TileId::Provisional(7),
            bitmap: Some(Bitmap::new(16, 16)),
            weight: 0,
        });
        assert_eq!(encode(&data), Err(EncodeError::ProvisionalTile(7)));
    }

    #[test]
    fn test_decode_garbage_is_none() {
        assert!(decode("not a tilemap at all", &NoResolver).is_none());
        assert!(decode("", &NoResolver).is_none());
    }

    #[test]
    fn test_decode_detects_corruption() {
        let text = encode(&sample_tilemap()).unwrap();
        // flip a character in the middle of the payload
        let mut corrupted: Vec<char> = text.chars().collect();
        let mid = corrupted.len() / 2;
        corrupted[mid] = if corrupted[mid] == 'A' { 'B' } else { 'A' };
        let corrupted: String = corrupted.into_iter().collect();

        let result = decode_inline(&corrupted, &NoResolver);
        assert!(matches!(
            result,
            Err(DecodeError::InvalidChecksum) | Err(DecodeError::InvalidBase64)
        ));
    }

    #[test]
    fn test_decode_detects_truncation() {
        let text = encode(&sample_tilemap()).unwrap();
        let truncated = &text[..text.len() / 2];
        assert!(decode(truncated, &NoResolver).is_none());
    }

    /// Checksum and base64-wrap a raw payload, as `encode_inline` would.
    fn literal_from_payload(payload: &[u8]) -> String {
        let mut bytes = payload.to_vec();
        bytes.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
        base64::encode_config(&bytes, base64::URL_SAFE_NO_PAD)
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut payload = b"XXXX".to_vec();
        payload.extend_from_slice(&VERSION.to_le_bytes());
        let text = literal_from_payload(&payload);

        assert_eq!(
            decode_inline(&text, &NoResolver),
            Err(DecodeError::InvalidMagicNumber)
        );
    }

    #[test]
    fn test_decode_rejects_oversized_grid_header() {
        // a valid header claiming a 65535x65535 grid with no data behind it
        // must fail before any cell storage is allocated
        let mut payload = MAGIC.to_vec();
        payload.extend_from_slice(&VERSION.to_le_bytes());
        payload.push(16);
        payload.extend_from_slice(&u16::MAX.to_le_bytes());
        payload.extend_from_slice(&u16::MAX.to_le_bytes());
        let text = literal_from_payload(&payload);

        assert_eq!(
            decode_inline(&text, &NoResolver),
            Err(DecodeError::UnexpectedEof)
        );
    }

    #[test]
    fn test_decode_rejects_oversized_tile_bitmap_header() {
        // 1x1 grid, one tile entry claiming a 65535x65535 bitmap
        let mut payload = MAGIC.to_vec();
        payload.extend_from_slice(&VERSION.to_le_bytes());
        payload.push(16);
        payload.extend_from_slice(&1u16.to_le_bytes());
        payload.extend_from_slice(&1u16.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes()); // the single cell
        payload.push(0); // the single layer byte
        payload.extend_from_slice(&1u16.to_le_bytes()); // tile count
        payload.extend_from_slice(&1u16.to_le_bytes()); // id length
        payload.push(b'a');
        payload.push(1); // has bitmap
        payload.extend_from_slice(&u16::MAX.to_le_bytes());
        payload.extend_from_slice(&u16::MAX.to_le_bytes());
        let text = literal_from_payload(&payload);

        assert_eq!(
            decode_inline(&text, &NoResolver),
            Err(DecodeError::UnexpectedEof)
        );
    }

    #[test]
    fn test_stub_tiles_survive_roundtrip_without_project() {
        let mut data = sample_tilemap();
        data.tileset.tiles.push(Tile {
            id: TileId::Committed("tile9".to_string()),
            bitmap: None,
            weight: 0,
        });

        let text = encode(&data).unwrap();
        let decoded = decode(&text, &NoResolver).unwrap();
        // the stub resolves to nothing, so it stays a stub
        assert_eq!(decoded, data);
    }
}
