use std::iter;

use crate::data::dictionary::{FeatureSubType, FeatureType};
use crate::data::feature::Coordinate;
use crate::errors::{Error, ErrorKind, Result};
use crate::format::{FeatureRecord, StringSlot, ABSENT_LABEL};

use super::builder::TileFeatures;

/// The four regions of one tile block, ready to be written.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EncodedTile {
    pub records: Vec<FeatureRecord>,
    pub coordinates: Vec<Coordinate>,
    pub string_slots: Vec<StringSlot>,
    pub characters: Vec<u16>,
}

impl EncodedTile {
    pub fn feature_count(&self) -> Result<i32> {
        Ok(i32::try_from(self.records.len())?)
    }

    pub fn coordinate_count(&self) -> Result<i32> {
        Ok(i32::try_from(self.coordinates.len())?)
    }

    pub fn string_slot_count(&self) -> Result<i32> {
        Ok(i32::try_from(self.string_slots.len())?)
    }

    fn push_slot(&mut self, units: impl Iterator<Item = u16>) -> Result<()> {
        let start = self.characters.len();
        self.characters.extend(units);
        self.string_slots.push(StringSlot {
            char_offset: i32::try_from(start)?,
            char_length: i32::try_from(self.characters.len() - start)?,
        });
        Ok(())
    }

    /// Keys are always a single dictionary code. Values are a single code when listed,
    /// otherwise their UTF-16 text.
    fn push_property(&mut self, key: &str, value: &str) -> Result<()> {
        self.push_slot(iter::once(FeatureType::from_key(key).code()))?;
        let subtype = FeatureSubType::from_value(value);
        if subtype.is_known() {
            self.push_slot(iter::once(subtype.code()))
        } else {
            self.push_slot(value.encode_utf16())
        }
    }
}

pub fn encode_tile(tile: &TileFeatures) -> Result<EncodedTile> {
    let mut encoded = EncodedTile::default();

    for feature in &tile.features {
        feature.validate()?;
        if feature.coordinate_start != encoded.coordinates.len()
            || 2 * feature.property_start != encoded.string_slots.len() {
            return Err(Error::new(
                ErrorKind::Format,
                format!("feature {} does not start where the previous feature ended", feature.id),
            ));
        }

        let label_slot = match feature.label {
            Some(index) => i32::try_from(2 * index + 1)?,
            None => ABSENT_LABEL,
        };
        encoded.records.push(FeatureRecord {
            id: feature.id,
            label_slot,
            geometry: feature.geometry.code(),
            coordinate_start: i32::try_from(feature.coordinate_start)?,
            coordinate_count: i32::try_from(feature.coordinates.len())?,
            property_slot_start: i32::try_from(2 * feature.property_start)?,
            property_count: i32::try_from(feature.property_count())?,
        });

        encoded.coordinates.extend_from_slice(&feature.coordinates);
        for (key, value) in feature.properties() {
            encoded.push_property(key, value)?;
        }
    }

    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::feature::{Feature, GeometryType};

    fn tile_of(features: Vec<Feature>) -> TileFeatures {
        let coordinate_count = features.iter().map(|feature| feature.coordinates.len()).sum();
        let property_count = features.iter().map(|feature| feature.property_count()).sum();
        TileFeatures {
            features,
            coordinate_count,
            property_count,
        }
    }

    #[test]
    fn test_way_with_label() {
        let mut way = Feature::new(42, GeometryType::Polyline, 0, 0);
        way.coordinates = vec![
            Coordinate { lat: 0.0, lon: 0.0 },
            Coordinate { lat: 1.0, lon: 1.0 },
        ];
        way.push_property("highway", "secondary");
        way.push_property("name", "Main St");
        way.label = Some(1);

        let encoded = encode_tile(&tile_of(vec![way])).unwrap();

        assert_eq!(encoded.records, vec![FeatureRecord {
            id: 42,
            label_slot: 3,
            geometry: 1,
            coordinate_start: 0,
            coordinate_count: 2,
            property_slot_start: 0,
            property_count: 2,
        }]);
        assert_eq!(encoded.coordinates.len(), 2);
        assert_eq!(encoded.string_slots, vec![
            StringSlot { char_offset: 0, char_length: 1 },
            StringSlot { char_offset: 1, char_length: 1 },
            StringSlot { char_offset: 2, char_length: 1 },
            StringSlot { char_offset: 3, char_length: 7 },
        ]);
        let mut expected = vec![
            FeatureType::Highway.code(),
            FeatureSubType::Secondary.code(),
            FeatureType::Unknown.code(),
        ];
        expected.extend("Main St".encode_utf16());
        assert_eq!(encoded.characters, expected);
    }

    #[test]
    fn test_point_with_literal_value() {
        let mut point = Feature::new(7, GeometryType::Point, 0, 0);
        point.coordinates = vec![Coordinate { lat: 3.0, lon: 4.0 }];
        point.push_property("amenity", "cafe");

        let encoded = encode_tile(&tile_of(vec![point])).unwrap();

        let record = encoded.records[0];
        assert_eq!(record.label_slot, ABSENT_LABEL);
        assert_eq!(record.geometry, 0);
        assert_eq!(record.coordinate_count, 1);
        assert_eq!(record.property_count, 1);
        assert_eq!(encoded.string_slots[1], StringSlot { char_offset: 1, char_length: 4 });
        assert_eq!(encoded.characters[0], FeatureType::Amenity.code());
        assert_eq!(String::from_utf16(&encoded.characters[1..]).unwrap(), "cafe");
    }

    #[test]
    fn test_offsets_run_across_features() {
        let mut first = Feature::new(1, GeometryType::Polygon, 0, 0);
        first.coordinates = vec![Coordinate { lat: 0.0, lon: 0.0 }; 3];
        first.push_property("building", "yes");

        let mut second = Feature::new(2, GeometryType::Point, 3, 1);
        second.coordinates = vec![Coordinate { lat: 9.0, lon: 9.0 }];
        second.push_property("name", "Ünïcødé");
        second.label = Some(1);

        let encoded = encode_tile(&tile_of(vec![first, second])).unwrap();

        assert_eq!(encoded.string_slots[1].char_length, 3);
        let record = encoded.records[1];
        assert_eq!(record.coordinate_start, 3);
        assert_eq!(record.property_slot_start, 2);
        assert_eq!(record.label_slot, 3);
        let label = encoded.string_slots[3];
        let start = label.char_offset as usize;
        let end = start + label.char_length as usize;
        assert_eq!(String::from_utf16(&encoded.characters[start..end]).unwrap(), "Ünïcødé");
    }

    #[test]
    fn test_rejects_unpaired_properties() {
        let mut feature = Feature::new(1, GeometryType::Point, 0, 0);
        feature.push_property("amenity", "cafe");
        feature.property_keys.push("orphan".to_string());

        let err = encode_tile(&tile_of(vec![feature])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PropertyMismatch);
    }
}
