use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use log::info;

use crate::UserConfig;
use crate::data::OsmMapData;
use crate::errors::Result;
use crate::etl::parse_osm;
use crate::etl::Etl;
use crate::format::reader::TileFile;
use crate::format::writer::write_tile_file;

pub const ETL_NAME: &str = "tile_file";

/// Encodes the cached elements into the tile file.
///
/// The whole file is assembled in memory, so a failed run never leaves a partial file
/// behind.
pub struct TileFileEtl<'a> {
    config: &'a UserConfig,
}

impl<'a> TileFileEtl<'a> {
    pub fn new(config: &'a UserConfig) -> Self {
        TileFileEtl {
            config,
        }
    }

    /// Decodes every feature of the encoded file.
    fn verify(bytes: &[u8]) -> Result<()> {
        let file = TileFile::parse(bytes)?;
        let mut features = 0usize;
        let mut labels = 0usize;
        for tile in &file.tiles {
            for record in &tile.records {
                tile.geometry(record)?;
                tile.coordinates_of(record)?;
                tile.properties(record)?;
                if tile.label(record)?.is_some() {
                    labels += 1;
                }
                features += 1;
            }
        }
        info!(tiles = file.tiles.len(), features = features, labels = labels; "Verified tile file");
        Ok(())
    }
}

impl Etl for TileFileEtl<'_> {
    type Input = OsmMapData;
    type Output = Vec<u8>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn output_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.config.output_file_name)
    }

    /// Cached only while the tile file is at least as new as the element cache.
    fn is_cached(&self, dir: &Path) -> Result<bool> {
        let output = self.output_path(dir);
        let input = dir.join(parse_osm::OUTPUT_FILE_NAME);
        if !output.try_exists()? || !input.try_exists()? {
            return Ok(false);
        }
        Ok(fs::metadata(output)?.modified()? >= fs::metadata(input)?.modified()?)
    }

    fn extract(&mut self, dir: &Path) -> Result<Self::Input> {
        parse_osm::read_cache(dir)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let out = write_tile_file(
            Cursor::new(Vec::new()),
            self.config.format_version,
            &input,
            self.config.tile_scope,
        )?;
        Ok(out.into_inner())
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        if self.config.verify {
            Self::verify(&output)?;
        }
        let path = self.output_path(dir);
        fs::write(&path, &output)?;
        info!(path = &*path.to_string_lossy(), bytes = output.len(); "Wrote tile file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use crate::data::dictionary::{FeatureSubType, FeatureType};
    use crate::data::feature::GeometryType;
    use crate::errors::ErrorKind;
    use crate::etl::parse_osm::ParseOsmEtl;
    use crate::format::reader::DecodedValue;
    use crate::tiling::{GridTiler, TileOracle};

    const TOWN: &str = r#"<osm version="0.6">
  <node id="1" lat="51.50" lon="-0.12"/>
  <node id="2" lat="51.51" lon="-0.11"/>
  <node id="3" lat="51.52" lon="-0.12"/>
  <node id="4" lat="48.85" lon="2.35">
    <tag k="amenity" v="cafe"/>
    <tag k="name" v="Le Café"/>
  </node>
  <way id="100">
    <nd ref="1"/><nd ref="2"/>
    <tag k="highway" v="secondary"/>
    <tag k="name" v="Main St"/>
  </way>
  <way id="101">
    <nd ref="1"/><nd ref="2"/><nd ref="3"/><nd ref="1"/>
    <tag k="building" v="yes"/>
  </way>
</osm>"#;


    fn literal(text: &str) -> DecodedValue {
        DecodedValue::Literal(text.to_string())
    }

    fn run(dir: &Path, scope: &str) -> (UserConfig, TileFile) {
        let input = dir.join("town.osm");
        fs::write(&input, TOWN).unwrap();
        let user_config: UserConfig = serde_json::from_value(serde_json::json!({
            "data_paths": [input.to_string_lossy()],
            "dest_path": dir.to_string_lossy(),
            "tile_scope": scope,
            "format_version": 4,
        })).unwrap();

        let oracle = GridTiler::new(1.0).unwrap();
        ParseOsmEtl::new(&user_config, &oracle).process(dir).unwrap();
        let mut etl = TileFileEtl::new(&user_config);
        etl.process(dir).unwrap();
        assert!(etl.is_cached(dir).unwrap());

        let file = TileFile::read(&etl.output_path(dir)).unwrap();
        (user_config, file)
    }

    #[test]
    fn test_end_to_end_whole_dataset() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        let (_, file) = run(dir, "whole_dataset");

        assert_eq!(file.version, 4);
        // London and Paris fall into two different one-degree tiles.
        assert_eq!(file.tiles.len(), 2);
        for tile in &file.tiles {
            let ids: Vec<i64> = tile.records.iter().map(|record| record.id).collect();
            assert_eq!(ids, vec![100, 101, 4]);

            let street = &tile.records[0];
            assert_eq!(tile.geometry(street).unwrap(), GeometryType::Polyline);
            assert_eq!(tile.label(street).unwrap(), Some(literal("Main St")));

            let building = &tile.records[1];
            assert_eq!(tile.geometry(building).unwrap(), GeometryType::Polygon);
            assert_eq!(tile.coordinates_of(building).unwrap().len(), 4);
            assert_eq!(tile.properties(building).unwrap(), vec![
                (FeatureType::Building, literal("yes")),
            ]);

            let cafe = &tile.records[2];
            assert_eq!(tile.geometry(cafe).unwrap(), GeometryType::Point);
            assert_eq!(tile.properties(cafe).unwrap()[0], (FeatureType::Amenity, literal("cafe")));
            assert_eq!(tile.label(cafe).unwrap(), Some(literal("Le Café")));

            assert_eq!(
                tile.properties(street).unwrap()[0],
                (FeatureType::Highway, DecodedValue::Code(FeatureSubType::Secondary)),
            );
        }
    }

    #[test]
    fn test_end_to_end_node_membership() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        let (_, file) = run(dir, "node_membership");

        let oracle = GridTiler::new(1.0).unwrap();
        let london = file.tile(oracle.tile_id(51.5, -0.12).unwrap()).unwrap();
        let paris = file.tile(oracle.tile_id(48.85, 2.35).unwrap()).unwrap();
        let ids = |tile: &crate::format::reader::TileBlock| -> Vec<i64> {
            tile.records.iter().map(|record| record.id).collect()
        };
        assert_eq!(ids(london), vec![100, 101]);
        assert_eq!(ids(paris), vec![4]);
    }

    #[test]
    fn test_clean_invalidates_output() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        let (user_config, _) = run(dir, "whole_dataset");
        let etl = TileFileEtl::new(&user_config);
        assert!(etl.is_cached(dir).unwrap());

        etl.clean(dir).unwrap();
        assert!(!etl.is_cached(dir).unwrap());
    }

    #[test]
    fn test_undecodable_output_is_never_written() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        let user_config: UserConfig = serde_json::from_value(serde_json::json!({
            "data_paths": [],
            "dest_path": dir.to_string_lossy(),
        })).unwrap();
        let mut etl = TileFileEtl::new(&user_config);

        let err = etl.load(dir, vec![1, 0, 0, 0, 0, 0, 0, 0, 5, 0]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
        assert!(!etl.output_path(dir).exists());
    }

    #[test]
    fn test_missing_cache_fails() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        let user_config: UserConfig = serde_json::from_value(serde_json::json!({
            "data_paths": [],
            "dest_path": dir.to_string_lossy(),
        })).unwrap();
        let err = TileFileEtl::new(&user_config).process(dir).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert!(!dir.join(&user_config.output_file_name).exists());
    }
}
