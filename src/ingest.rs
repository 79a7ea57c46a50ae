//! Collects the element stream into [`OsmMapData`].
//!
//! Any number of producers may feed one [`Aggregator`] at the same time: nodes are stored
//! by id with the last write winning, ways are appended in whatever order they arrive.
//! Tile grouping runs once, single-threaded, in [`Aggregator::finish`].

use std::collections::BTreeMap;
use std::sync::Mutex;

use dashmap::DashMap;
use log::info;

use crate::data::osm::{GeoNode, NodeId, OsmElement, TileId, Way};
use crate::data::OsmMapData;
use crate::errors::{Error, ErrorKind, Result};
use crate::tiling::TileOracle;

#[derive(Debug, Default)]
pub struct Aggregator {
    nodes: DashMap<NodeId, GeoNode>,
    ways: Mutex<Vec<Way>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&self, node: GeoNode) {
        self.nodes.insert(node.id, node);
    }

    pub fn add_way(&self, way: Way) -> Result<()> {
        self.ways.lock()
            .map_err(|_| Error::new(ErrorKind::Other, "way list poisoned by a failed producer"))?
            .push(way);
        Ok(())
    }

    pub fn add(&self, element: OsmElement) -> Result<()> {
        match element {
            OsmElement::Node(node) => {
                self.add_node(node);
                Ok(())
            },
            OsmElement::Way(way) => self.add_way(way),
        }
    }

    /// Drains one producer. The first upstream error aborts the producer and is returned.
    pub fn ingest<I>(&self, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<OsmElement>>,
    {
        for element in elements {
            self.add(element?)?;
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn finish<O: TileOracle + ?Sized>(self, oracle: &O) -> Result<OsmMapData> {
        let nodes: BTreeMap<NodeId, GeoNode> = self.nodes.into_iter().collect();
        let ways = self.ways.into_inner()
            .map_err(|_| Error::new(ErrorKind::Other, "way list poisoned by a failed producer"))?;

        let mut tiles: BTreeMap<TileId, Vec<NodeId>> = BTreeMap::new();
        for node in nodes.values() {
            let tile_id = oracle.tile_id(node.lat, node.lon)?;
            tiles.entry(tile_id).or_default().push(node.id);
        }

        info!(nodes = nodes.len(), ways = ways.len(), tiles = tiles.len(); "Aggregated elements");
        Ok(OsmMapData {
            nodes,
            ways,
            tiles,
        })
    }
}
