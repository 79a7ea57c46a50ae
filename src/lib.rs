pub mod data;
pub mod errors;
pub mod etl;
pub mod format;
pub mod ingest;
pub mod tile;
pub mod tiling;

use serde::Deserialize;

use crate::tile::TileScope;

fn default_tile_size_deg() -> f64 {
    1.0
}

fn default_format_version() -> i64 {
    format::FORMAT_VERSION
}

fn default_output_file_name() -> String {
    "map.tiles".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_verify() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserConfig {
    /// `.osm` files, optionally xz-compressed (`.osm.xz`).
    pub data_paths: Vec<String>,
    pub dest_path: String,
    #[serde(default = "default_tile_size_deg")]
    pub tile_size_deg: f64,
    #[serde(default)]
    pub tile_scope: TileScope,
    #[serde(default = "default_format_version")]
    pub format_version: i64,
    #[serde(default = "default_output_file_name")]
    pub output_file_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Drop cached stage outputs before running.
    #[serde(default)]
    pub rebuild: bool,
    #[serde(default = "default_verify")]
    pub verify: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: UserConfig =
            serde_json::from_str(r#"{"data_paths": ["a.osm"], "dest_path": "out"}"#).unwrap();
        assert_eq!(config.data_paths, vec!["a.osm".to_string()]);
        assert_eq!(config.tile_size_deg, 1.0);
        assert_eq!(config.tile_scope, TileScope::WholeDataset);
        assert_eq!(config.format_version, 1);
        assert_eq!(config.output_file_name, "map.tiles");
        assert_eq!(config.log_level, "info");
        assert!(!config.rebuild);
        assert!(config.verify);
    }

    #[test]
    fn test_config_overrides() {
        let config: UserConfig = serde_json::from_str(r#"{
            "data_paths": [],
            "dest_path": "out",
            "tile_size_deg": 0.25,
            "tile_scope": "node_membership",
            "format_version": 3,
            "rebuild": true,
            "verify": false
        }"#).unwrap();
        assert_eq!(config.tile_size_deg, 0.25);
        assert_eq!(config.tile_scope, TileScope::NodeMembership);
        assert_eq!(config.format_version, 3);
        assert!(config.rebuild);
        assert!(!config.verify);
    }

    #[test]
    fn test_unknown_scope_is_rejected() {
        let result = serde_json::from_str::<UserConfig>(
            r#"{"data_paths": [], "dest_path": "out", "tile_scope": "tiles"}"#,
        );
        assert!(result.is_err());
    }
}
