pub mod builder;
pub mod encoder;

use serde::Deserialize;

/// Which features a tile block carries.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TileScope {
    /// Every tile block holds every feature of the dataset; the tile grouping only decides
    /// which blocks exist.
    #[default]
    WholeDataset,
    /// Ways go into each tile holding one of their nodes, standalone nodes into their own tile.
    NodeMembership,
}
