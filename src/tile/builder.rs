use std::collections::{BTreeMap, HashSet};

use log::debug;

use crate::data::feature::{Coordinate, Feature, GeometryType};
use crate::data::osm::{GeoNode, NodeId, Tag, TileId, Way};
use crate::data::OsmMapData;
use crate::errors::Result;

use super::TileScope;

const LABEL_KEY: &str = "name";

/// Features of one tile pass, in emission order, with the tile-local running totals.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TileFeatures {
    pub features: Vec<Feature>,
    pub coordinate_count: usize,
    pub property_count: usize,
}

impl TileFeatures {
    /// Appends a tag and, for `name`, points the label at it. A later `name` tag overrides
    /// an earlier one.
    fn push_own_tag(&mut self, feature: &mut Feature, tag: &Tag) {
        if tag.key == LABEL_KEY {
            feature.label = Some(self.property_count);
        }
        feature.push_property(&tag.key, &tag.value);
        self.property_count += 1;
    }

    fn push_way(&mut self, way: &Way, nodes: &BTreeMap<NodeId, GeoNode>) -> Result<()> {
        let mut feature = Feature::new(
            way.id,
            GeometryType::Polyline,
            self.coordinate_count,
            self.property_count,
        );

        for tag in &way.tags {
            self.push_own_tag(&mut feature, tag);
        }

        for node_id in &way.nodes {
            let Some(node) = nodes.get(node_id) else {
                debug!(way_id = way.id, node_id = *node_id; "Skipping reference to missing node");
                continue;
            };
            for tag in &node.tags {
                if !feature.has_key(&tag.key) {
                    feature.push_property(&tag.key, &tag.value);
                    self.property_count += 1;
                }
            }
            feature.coordinates.push(node.into());
            self.coordinate_count += 1;
        }

        let ends = (feature.coordinates.first(), feature.coordinates.last());
        if let (Some(first), Some(last)) = ends {
            if first == last {
                feature.geometry = GeometryType::Polygon;
            }
        }

        feature.validate()?;
        self.features.push(feature);
        Ok(())
    }

    fn push_point(&mut self, node: &GeoNode) -> Result<()> {
        let mut feature =
            Feature::new(node.id, GeometryType::Point, self.coordinate_count, self.property_count);
        for tag in &node.tags {
            self.push_own_tag(&mut feature, tag);
        }
        feature.coordinates.push(Coordinate::from(node));
        self.coordinate_count += 1;

        feature.validate()?;
        self.features.push(feature);
        Ok(())
    }
}

/// Builds the features of one tile pass.
///
/// Every way becomes a polyline or polygon feature. Every node that no way references
/// becomes a point feature, in ascending node id order. A property count mismatch on any
/// feature is returned as an error and must abort the run.
pub fn build_tile_features(
    data: &OsmMapData,
    tile_id: TileId,
    scope: TileScope,
) -> Result<TileFeatures> {
    let members: Option<HashSet<NodeId>> = match scope {
        TileScope::WholeDataset => None,
        TileScope::NodeMembership => Some(
            data.tiles.get(&tile_id)
                .map(|ids| ids.iter().copied().collect())
                .unwrap_or_default()
        ),
    };
    let in_tile = |node_id: &NodeId| members.as_ref().map_or(true, |ids| ids.contains(node_id));

    let mut tile = TileFeatures::default();
    let mut used: HashSet<NodeId> = HashSet::new();

    for way in &data.ways {
        used.extend(way.nodes.iter().copied());
        if way.nodes.iter().any(|node_id| in_tile(node_id)) || members.is_none() {
            tile.push_way(way, &data.nodes)?;
        }
    }

    for node in data.nodes.values() {
        if !used.contains(&node.id) && in_tile(&node.id) {
            tile.push_point(node)?;
        }
    }

    debug!(
        tile_id = tile_id,
        features = tile.features.len(),
        coordinates = tile.coordinate_count,
        properties = tile.property_count;
        "Built tile features"
    );
    Ok(tile)
}
