pub mod parse_osm;
pub mod tile_file;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{error, info};

use crate::errors::Result;

/// One cached stage of the pipeline. A stage whose output file already exists in the
/// working directory is skipped.
pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;
    fn output_path(&self, dir: &Path) -> PathBuf;

    fn extract(&mut self, dir: &Path) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()>;

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(self.output_path(dir).try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        let path = self.output_path(dir);
        if path.try_exists()? {
            fs::remove_file(&path)?;
            info!(etl_name = self.etl_name(); "Removed cached output");
        }
        Ok(())
    }

    fn process(&mut self, dir: &Path) -> Result<()> {
        let etl_name = self.etl_name().to_string();
        info!(etl_name = etl_name.as_str(); "Starting ETL process");
        if self.is_cached(dir)? {
            info!(etl_name = etl_name.as_str(); "Using cached value");
            return Ok(());
        }

        let started = Instant::now();
        let input = logged(&etl_name, "extract", self.extract(dir))?;
        let output = logged(&etl_name, "transform", self.transform(input))?;
        logged(&etl_name, "load", self.load(dir, output))?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(etl_name = etl_name.as_str(), elapsed_ms = elapsed_ms; "Process finished");
        Ok(())
    }
}

fn logged<T>(etl_name: &str, step: &str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => info!(etl_name = etl_name, step = step; "Step done"),
        Err(err) => error!(
            etl_name = etl_name,
            step = step,
            err = err.message.as_str();
            "Step failed with error"
        ),
    }
    result
}
