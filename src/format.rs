//! Binary tile file layout. All integers are little-endian.
//!
//! ```text
//! FileHeader        i64 version, i32 tile_count
//! Directory[n]      i32 tile_id, i64 offset               (rewritten once all tiles are out)
//! per tile:
//!   BlockHeader     i32 features, i32 coordinates, i32 string_slots, i32 reserved (= 0),
//!                   i64 coordinates_offset, i64 string_slots_offset, i64 characters_offset
//!   FeatureRecord   i64 id, i32 label_slot (-1 = none), u8 geometry,
//!                   i32 coordinate_start, i32 coordinate_count,
//!                   i32 property_slot_start, i32 property_count
//!   Coordinate      f64 lat, f64 lon
//!   StringSlot      i32 char_offset, i32 char_length
//!   Character       u16 dictionary code or UTF-16 code unit
//! ```
//!
//! Offsets in the directory and block header are absolute byte positions. Starts and counts
//! inside feature records are element indices into the tile's own regions.

pub mod patch;
pub mod reader;
pub mod writer;

use crate::data::osm::TileId;

pub const FORMAT_VERSION: i64 = 1;
pub const ABSENT_LABEL: i32 = -1;

pub const FILE_HEADER_SIZE: u64 = 12;
pub const DIRECTORY_ENTRY_SIZE: u64 = 12;
pub const BLOCK_HEADER_SIZE: u64 = 40;
pub const FEATURE_RECORD_SIZE: u64 = 29;
pub const COORDINATE_SIZE: u64 = 16;
pub const STRING_SLOT_SIZE: u64 = 8;
pub const CHARACTER_SIZE: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub tile_id: TileId,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub feature_count: i32,
    pub coordinate_count: i32,
    pub string_slot_count: i32,
    pub reserved: i32,
    pub coordinates_offset: i64,
    pub string_slots_offset: i64,
    pub characters_offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureRecord {
    pub id: i64,
    /// String slot of the label's value, or [`ABSENT_LABEL`].
    pub label_slot: i32,
    pub geometry: u8,
    pub coordinate_start: i32,
    pub coordinate_count: i32,
    pub property_slot_start: i32,
    pub property_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringSlot {
    pub char_offset: i32,
    pub char_length: i32,
}
