//! Save states: the whole machine persisted to a file.
//!
//! Because every byte of console state lives in the arena, a save state is
//! just the arena blob plus the language tag, wrapped in a small header and
//! compressed. The arena layout itself (see [`crate::memory`]) is the
//! stable, versionless format; the header versions only this wrapper.
//!
//! ## File format
//!
//! ```text
//! +------------------+
//! | Magic "PYRS"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Pixel depth      |  u8 (PIXEL_BITS of the writing build: 6 or 8)
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```
//!
//! The pixel-depth byte rejects cross-depth loads early: a 6-bit image's
//! region offsets do not line up with an 8-bit build's.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::memory::MEMORY_BYTES;
use crate::PIXEL_BITS;

/// Magic bytes identifying a Pyrite save state file.
const MAGIC: &[u8; 4] = b"PYRS";
/// Current save state wrapper version.
const FORMAT_VERSION: u32 = 1;

/// Persisted machine state: the language tag and the full arena.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveState {
    pub language: u8,
    pub memory: Vec<u8>,
}

/// Save state to file with header and deflate compression.
pub fn save_to_file(state: &SaveState, path: &Path) -> Result<(), String> {
    let payload = bincode::serialize(state).map_err(|e| format!("Serialize error: {}", e))?;

    let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

    let mut out = Vec::with_capacity(9 + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.push(PIXEL_BITS as u8);
    out.extend_from_slice(&compressed);

    std::fs::write(path, &out).map_err(|e| format!("Write error: {}", e))
}

/// Load state from file, verifying magic, version, pixel depth, and arena
/// size.
pub fn load_from_file(path: &Path) -> Result<SaveState, String> {
    let data = std::fs::read(path).map_err(|e| format!("Read error: {}", e))?;

    if data.len() < 9 {
        return Err("File too small".into());
    }
    if &data[0..4] != MAGIC {
        return Err("Invalid save state file (bad magic)".into());
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(format!(
            "Unsupported save state version {} (expected {})",
            version, FORMAT_VERSION
        ));
    }
    let depth = data[8];
    if depth as usize != PIXEL_BITS {
        return Err(format!(
            "Pixel depth mismatch: save={} current={}",
            depth, PIXEL_BITS
        ));
    }

    let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[9..])
        .map_err(|e| format!("Decompress error: {:?}", e))?;

    let state: SaveState =
        bincode::deserialize(&decompressed).map_err(|e| format!("Deserialize error: {}", e))?;
    if state.memory.len() != MEMORY_BYTES {
        return Err(format!(
            "Save state arena is {} bytes; this build uses {}",
            state.memory.len(),
            MEMORY_BYTES
        ));
    }
    Ok(state)
}

/// Derive a save state path from a cartridge path.
/// `game.lua` → `game.state`
pub fn state_path(cart_path: &str) -> String {
    let p = Path::new(cart_path);
    let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or("cart");
    let dir = p.parent().unwrap_or(Path::new("."));
    dir.join(format!("{}.state", stem)).to_string_lossy().into_owned()
}
