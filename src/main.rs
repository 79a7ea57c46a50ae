use std::env;
use std::fs::{create_dir_all, File};
use std::io::{self, BufReader};
use std::path::PathBuf;

use log::info;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use map_tile_packer::UserConfig;
use map_tile_packer::errors::{Error, ErrorKind, Result};
use map_tile_packer::etl::parse_osm::ParseOsmEtl;
use map_tile_packer::etl::tile_file::TileFileEtl;
use map_tile_packer::etl::Etl;
use map_tile_packer::tiling::GridTiler;

const DEFAULT_CONFIG_PATH: &str = "config/default.json";

fn load_user_config(path: &str) -> Result<UserConfig> {
    let file = File::open(path).map_err(|err| {
        Error::new(ErrorKind::Io, format!("could not open config file {}: {}", path, err))
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn create_output_dir(config: &UserConfig) -> Result<PathBuf> {
    let output_dir = PathBuf::from(&config.dest_path);
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let user_config = load_user_config(&config_path)?;
    setup_logging(&user_config.log_level);
    info!(
        config_path = config_path.as_str(),
        inputs = user_config.data_paths.len();
        "Loaded config"
    );

    let oracle = GridTiler::new(user_config.tile_size_deg)?;
    let output_dir = create_output_dir(&user_config)?;

    let mut parse_osm = ParseOsmEtl::new(&user_config, &oracle);
    let mut tile_file = TileFileEtl::new(&user_config);
    if user_config.rebuild {
        parse_osm.clean(&output_dir)?;
        tile_file.clean(&output_dir)?;
    }

    parse_osm.process(&output_dir)?;
    tile_file.process(&output_dir)?;

    info!(path = &*tile_file.output_path(&output_dir).to_string_lossy(); "Tile file ready");
    Ok(())
}
