use std::hash::Hash;

use crate::errors::{Error, ErrorKind, Result};

use super::osm::GeoNode;

#[derive(Debug, Clone, Copy)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl From<&GeoNode> for Coordinate {
    fn from(value: &GeoNode) -> Self {
        Coordinate {
            lat: value.lat,
            lon: value.lon,
        }
    }
}

impl Hash for Coordinate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.lat.to_bits().hash(state);
        self.lon.to_bits().hash(state);
    }
}

impl Eq for Coordinate {}

/// Bitwise equality, so a ring closes only on the exact same coordinate.
impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lon.to_bits() == other.lon.to_bits()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GeometryType {
    Point = 0,
    Polyline = 1,
    Polygon = 2,
}

impl GeometryType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(GeometryType::Point),
            1 => Some(GeometryType::Polyline),
            2 => Some(GeometryType::Polygon),
            _ => None,
        }
    }
}

/// One emittable map object of a tile.
///
/// `coordinate_start`, `property_start` and `label` are tile-local indices: the number of
/// coordinates or properties emitted by earlier features of the same tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: i64,
    pub geometry: GeometryType,
    pub coordinates: Vec<Coordinate>,
    pub property_keys: Vec<String>,
    pub property_values: Vec<String>,
    /// Tile-wide index of the property holding the display label.
    pub label: Option<usize>,
    pub coordinate_start: usize,
    pub property_start: usize,
}

impl Feature {
    pub fn new(
        id: i64,
        geometry: GeometryType,
        coordinate_start: usize,
        property_start: usize,
    ) -> Self {
        Feature {
            id,
            geometry,
            coordinates: Vec::new(),
            property_keys: Vec::new(),
            property_values: Vec::new(),
            label: None,
            coordinate_start,
            property_start,
        }
    }

    pub fn property_count(&self) -> usize {
        self.property_keys.len()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.property_keys.iter().any(|existing| existing == key)
    }

    pub fn push_property(&mut self, key: &str, value: &str) {
        self.property_keys.push(key.to_string());
        self.property_values.push(value.to_string());
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.property_keys.iter()
            .zip(self.property_values.iter())
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.property_keys.len() != self.property_values.len() {
            return Err(Error::new(
                ErrorKind::PropertyMismatch,
                format!(
                    "feature {} has {} property keys but {} values",
                    self.id,
                    self.property_keys.len(),
                    self.property_values.len(),
                ),
            ));
        }
        Ok(())
    }
}
