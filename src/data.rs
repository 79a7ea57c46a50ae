use std::collections::BTreeMap;

use self::osm::{GeoNode, NodeId, TileId, Way};

pub mod dictionary;
pub mod feature;
pub mod osm;

/// Everything the ingest stage keeps from the element stream: every node by id, every way
/// in arrival order, and the node ids the tiling oracle placed into each tile.
#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Debug, Default, Clone, PartialEq)]
#[archive(check_bytes)]
pub struct OsmMapData {
    pub nodes: BTreeMap<NodeId, GeoNode>,
    pub ways: Vec<Way>,
    pub tiles: BTreeMap<TileId, Vec<NodeId>>,
}

impl OsmMapData {
    pub fn tile_ids(&self) -> Vec<TileId> {
        self.tiles.keys().copied().collect()
    }
}
