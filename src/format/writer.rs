use std::collections::HashMap;
use std::io::{Seek, Write};

use log::{debug, info};

use crate::data::osm::TileId;
use crate::data::OsmMapData;
use crate::errors::{Error, ErrorKind, Result};
use crate::tile::builder::build_tile_features;
use crate::tile::encoder::{encode_tile, EncodedTile};
use crate::tile::TileScope;

use super::patch::PatchWriter;

/// Writes a tile file in one forward pass, seeking back only to fill offset fields.
///
/// The directory is written with zero offsets by [`TileFileWriter::begin`] and rewritten
/// with the real block positions by [`TileFileWriter::finish`].
pub struct TileFileWriter<W> {
    out: PatchWriter<W>,
    directory_position: u64,
    tile_ids: Vec<TileId>,
    index_of: HashMap<TileId, usize>,
    offsets: Vec<Option<u64>>,
}

impl<W: Write + Seek> TileFileWriter<W> {
    pub fn begin(inner: W, version: i64, tile_ids: &[TileId]) -> Result<Self> {
        let mut out = PatchWriter::new(inner);
        out.write_i64(version)?;
        out.write_i32(i32::try_from(tile_ids.len())?)?;

        let directory_position = out.position()?;
        let mut index_of = HashMap::with_capacity(tile_ids.len());
        for (index, tile_id) in tile_ids.iter().enumerate() {
            if index_of.insert(*tile_id, index).is_some() {
                return Err(Error::new(ErrorKind::Format, format!("tile {} listed twice", tile_id)));
            }
            out.write_i32(*tile_id)?;
            out.write_i64(0)?;
        }

        Ok(TileFileWriter {
            out,
            directory_position,
            tile_ids: tile_ids.to_vec(),
            index_of,
            offsets: vec![None; tile_ids.len()],
        })
    }

    /// Appends one tile block and returns the position it starts at.
    pub fn write_tile(&mut self, tile_id: TileId, tile: &EncodedTile) -> Result<u64> {
        let index = *self.index_of.get(&tile_id).ok_or_else(|| {
            Error::new(ErrorKind::Format, format!("tile {} is not in the directory", tile_id))
        })?;
        if self.offsets[index].is_some() {
            return Err(Error::new(ErrorKind::Format, format!("tile {} written twice", tile_id)));
        }

        let out = &mut self.out;
        let start = out.position()?;

        out.write_i32(tile.feature_count()?)?;
        out.write_i32(tile.coordinate_count()?)?;
        out.write_i32(tile.string_slot_count()?)?;
        out.write_i32(0)?;
        let coordinates_at = out.reserve_i64()?;
        let string_slots_at = out.reserve_i64()?;
        let characters_at = out.reserve_i64()?;

        for record in &tile.records {
            out.write_i64(record.id)?;
            out.write_i32(record.label_slot)?;
            out.write_u8(record.geometry)?;
            out.write_i32(record.coordinate_start)?;
            out.write_i32(record.coordinate_count)?;
            out.write_i32(record.property_slot_start)?;
            out.write_i32(record.property_count)?;
        }

        out.fill_with_position(coordinates_at)?;
        for coordinate in &tile.coordinates {
            out.write_f64(coordinate.lat)?;
            out.write_f64(coordinate.lon)?;
        }

        out.fill_with_position(string_slots_at)?;
        for slot in &tile.string_slots {
            out.write_i32(slot.char_offset)?;
            out.write_i32(slot.char_length)?;
        }

        out.fill_with_position(characters_at)?;
        for unit in &tile.characters {
            out.write_u16(*unit)?;
        }

        let end = out.position()?;
        debug!(tile_id = tile_id, offset = start, bytes = end - start; "Wrote tile block");
        self.offsets[index] = Some(start);
        Ok(start)
    }

    /// Rewrites the directory with the real block offsets and hands the stream back.
    pub fn finish(mut self) -> Result<W> {
        self.out.seek_to(self.directory_position)?;
        for (tile_id, offset) in self.tile_ids.iter().zip(&self.offsets) {
            let offset = offset.ok_or_else(|| {
                Error::new(ErrorKind::Format, format!("tile {} was never written", tile_id))
            })?;
            self.out.write_i32(*tile_id)?;
            self.out.write_i64(i64::try_from(offset)?)?;
        }
        self.out.seek_to_end()?;
        self.out.flush()?;
        Ok(self.out.into_inner())
    }
}

/// Encodes every tile of `data`, in ascending tile id order, into `out`.
pub fn write_tile_file<W: Write + Seek>(
    out: W,
    version: i64,
    data: &OsmMapData,
    scope: TileScope,
) -> Result<W> {
    let tile_ids = data.tile_ids();
    let mut writer = TileFileWriter::begin(out, version, &tile_ids)?;
    for tile_id in &tile_ids {
        let features = build_tile_features(data, *tile_id, scope)?;
        let encoded = encode_tile(&features)?;
        writer.write_tile(*tile_id, &encoded)?;
    }
    let out = writer.finish()?;
    info!(
        tiles = tile_ids.len(),
        ways = data.ways.len(),
        nodes = data.nodes.len();
        "Wrote tile file"
    );
    Ok(out)
}
