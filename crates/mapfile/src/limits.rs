//! Structural constants of the world and mission formats.
//!
//! These caps mirror the fixed array sizes compiled into the target engine.
//! Decoders reject counts above them before allocating; encoders reject
//! trees that exceed them so a written file is always loadable.

/// Magic identifying a world file.
pub const WORLD_MAGIC: &[u8; 4] = b"WRLD";

/// Magic identifying a mission file.
pub const MISSION_MAGIC: &[u8; 4] = b"MSSN";

/// Format version written into new headers.
pub const FORMAT_VERSION: i32 = 7;

/// Version stamp for the placed-object block.
pub const OBJECT_LIST_VERSION: i32 = 3;

/// Version stamp for the effect block.
pub const EFFECT_LIST_VERSION: i32 = 1;

/// Fixed width of the map name buffer in the header (31 usable characters).
pub const MAP_NAME_LEN: usize = 32;

/// Fixed width of an include-file name buffer (31 usable characters).
pub const INCLUDE_NAME_LEN: usize = 32;

/// The engine's include-file table holds at most this many entries.
pub const MAX_INCLUDE_FILES: usize = 32;

/// Maximum entries in the texture list.
pub const MAX_TEXTURES: usize = 256;

/// Maximum placed objects per file.
pub const MAX_OBJECTS: usize = 4096;

/// Maximum effect entries per file.
pub const MAX_EFFECTS: usize = 1024;

/// Maximum scenario entries per file.
pub const MAX_SCENARIOS: usize = 64;

/// Maximum byte length of a length-prefixed string (one length byte).
pub const MAX_STRING_LEN: usize = 255;
