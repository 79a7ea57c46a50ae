//! Decodes a tile file back into its blocks and regions.

use std::fs;
use std::path::Path;

use crate::data::dictionary::{FeatureSubType, FeatureType};
use crate::data::feature::{Coordinate, GeometryType};
use crate::data::osm::TileId;
use crate::errors::{Error, ErrorKind, Result};

use super::{BlockHeader, DirectoryEntry, FeatureRecord, StringSlot, ABSENT_LABEL};

fn bad(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Format, message)
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    fn at(bytes: &'a [u8], position: u64) -> Result<Self> {
        let position = usize::try_from(position)?;
        if position > bytes.len() {
            return Err(bad(format!(
                "offset {} is past the end of the file ({} bytes)",
                position,
                bytes.len(),
            )));
        }
        Ok(ByteReader { bytes, position })
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.position + N;
        let chunk = self.bytes.get(self.position..end)
            .ok_or_else(|| bad(format!("unexpected end of file at byte {}", self.position)))?;
        self.position = end;
        let mut out = [0u8; N];
        out.copy_from_slice(chunk);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take()?))
    }
}

fn count(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| bad(format!("negative {} count {}", what, value)))
}

fn offset(value: i64, what: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| bad(format!("negative {} offset {}", what, value)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    Code(FeatureSubType),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileBlock {
    pub offset: u64,
    pub header: BlockHeader,
    pub records: Vec<FeatureRecord>,
    pub coordinates: Vec<Coordinate>,
    pub string_slots: Vec<StringSlot>,
    pub characters: Vec<u16>,
}

impl TileBlock {
    fn parse(bytes: &[u8], block_offset: u64) -> Result<Self> {
        let mut reader = ByteReader::at(bytes, block_offset)?;
        let header = BlockHeader {
            feature_count: reader.i32()?,
            coordinate_count: reader.i32()?,
            string_slot_count: reader.i32()?,
            reserved: reader.i32()?,
            coordinates_offset: reader.i64()?,
            string_slots_offset: reader.i64()?,
            characters_offset: reader.i64()?,
        };

        let feature_count = count(header.feature_count, "feature")?;
        let mut records = Vec::with_capacity(feature_count.min(bytes.len()));
        for _ in 0..feature_count {
            records.push(FeatureRecord {
                id: reader.i64()?,
                label_slot: reader.i32()?,
                geometry: reader.u8()?,
                coordinate_start: reader.i32()?,
                coordinate_count: reader.i32()?,
                property_slot_start: reader.i32()?,
                property_count: reader.i32()?,
            });
        }

        let mut reader = ByteReader::at(bytes, offset(header.coordinates_offset, "coordinate")?)?;
        let mut coordinates = Vec::new();
        for _ in 0..count(header.coordinate_count, "coordinate")? {
            coordinates.push(Coordinate {
                lat: reader.f64()?,
                lon: reader.f64()?,
            });
        }

        let mut reader = ByteReader::at(bytes, offset(header.string_slots_offset, "string slot")?)?;
        let mut string_slots = Vec::new();
        let mut character_count = 0usize;
        for _ in 0..count(header.string_slot_count, "string slot")? {
            let slot = StringSlot {
                char_offset: reader.i32()?,
                char_length: reader.i32()?,
            };
            let end = count(slot.char_offset, "character")? + count(slot.char_length, "character")?;
            character_count = character_count.max(end);
            string_slots.push(slot);
        }

        let mut reader = ByteReader::at(bytes, offset(header.characters_offset, "character")?)?;
        let mut characters = Vec::with_capacity(character_count.min(bytes.len()));
        for _ in 0..character_count {
            characters.push(reader.u16()?);
        }

        Ok(TileBlock {
            offset: block_offset,
            header,
            records,
            coordinates,
            string_slots,
            characters,
        })
    }

    pub fn slot_units(&self, slot: usize) -> Result<&[u16]> {
        let string_slot = self.string_slots.get(slot)
            .ok_or_else(|| bad(format!("string slot {} out of range", slot)))?;
        let start = count(string_slot.char_offset, "character")?;
        let end = start + count(string_slot.char_length, "character")?;
        self.characters.get(start..end)
            .ok_or_else(|| bad(format!("string slot {} points past the character region", slot)))
    }

    pub fn key(&self, slot: usize) -> Result<FeatureType> {
        match self.slot_units(slot)? {
            [code] => FeatureType::from_code(*code)
                .ok_or_else(|| bad(format!("unknown key code {} in slot {}", code, slot))),
            units => Err(bad(format!("key slot {} holds {} units", slot, units.len()))),
        }
    }

    /// A single unit in the value code block decodes as that code, anything else as literal
    /// text. A one-unit literal never falls into the block, see
    /// [`SUBTYPE_CODE_BASE`](crate::data::dictionary::SUBTYPE_CODE_BASE).
    pub fn value(&self, slot: usize) -> Result<DecodedValue> {
        let units = self.slot_units(slot)?;
        if let [code] = units {
            match FeatureSubType::from_code(*code) {
                Some(subtype) if subtype.is_known() => return Ok(DecodedValue::Code(subtype)),
                _ => (),
            }
        }
        String::from_utf16(units)
            .map(DecodedValue::Literal)
            .map_err(|_| bad(format!("string slot {} is not valid UTF-16", slot)))
    }

    pub fn properties(&self, record: &FeatureRecord) -> Result<Vec<(FeatureType, DecodedValue)>> {
        let start = count(record.property_slot_start, "property slot")?;
        (0..count(record.property_count, "property")?)
            .map(|property| {
                let slot = start + 2 * property;
                Ok((self.key(slot)?, self.value(slot + 1)?))
            })
            .collect()
    }

    pub fn label(&self, record: &FeatureRecord) -> Result<Option<DecodedValue>> {
        if record.label_slot == ABSENT_LABEL {
            return Ok(None);
        }
        Ok(Some(self.value(count(record.label_slot, "label slot")?)?))
    }

    pub fn geometry(&self, record: &FeatureRecord) -> Result<GeometryType> {
        GeometryType::from_code(record.geometry).ok_or_else(|| {
            bad(format!("feature {} has unknown geometry {}", record.id, record.geometry))
        })
    }

    pub fn coordinates_of(&self, record: &FeatureRecord) -> Result<&[Coordinate]> {
        let start = count(record.coordinate_start, "coordinate")?;
        let end = start + count(record.coordinate_count, "coordinate")?;
        self.coordinates.get(start..end)
            .ok_or_else(|| bad(format!("feature {} coordinates out of range", record.id)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileFile {
    pub version: i64,
    pub directory: Vec<DirectoryEntry>,
    pub tiles: Vec<TileBlock>,
}

impl TileFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::at(bytes, 0)?;
        let version = reader.i64()?;
        let tile_count = count(reader.i32()?, "tile")?;

        let mut directory = Vec::new();
        for _ in 0..tile_count {
            directory.push(DirectoryEntry {
                tile_id: reader.i32()?,
                offset: reader.i64()?,
            });
        }

        let tiles = directory.iter()
            .map(|entry| TileBlock::parse(bytes, offset(entry.offset, "tile")?))
            .collect::<Result<Vec<_>>>()?;

        Ok(TileFile {
            version,
            directory,
            tiles,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        Self::parse(&fs::read(path)?)
    }

    pub fn tile(&self, tile_id: TileId) -> Option<&TileBlock> {
        self.directory.iter()
            .position(|entry| entry.tile_id == tile_id)
            .map(|index| &self.tiles[index])
    }
}
