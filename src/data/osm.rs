pub type NodeId = i64;
pub type WayId = i64;
pub type TileId = i32;

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Debug, Clone, PartialEq, Eq)]
#[archive(check_bytes)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Tag {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Debug, Clone, PartialEq)]
#[archive(check_bytes)]
pub struct GeoNode {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
    pub tags: Vec<Tag>,
}

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Debug, Clone, PartialEq)]
#[archive(check_bytes)]
pub struct Way {
    pub id: WayId,
    /// Referenced node ids, in path order.
    pub nodes: Vec<NodeId>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OsmElement {
    Node(GeoNode),
    Way(Way),
}
