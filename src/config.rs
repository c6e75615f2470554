use std::str::FromStr;

use log::LevelFilter;
use serde::Deserialize;

use crate::error::Result;
use crate::storage::disk::DiskType;

#[derive(Debug, PartialEq, Deserialize)]
pub struct Config {
    pub log_level: String,

    /// Number of frames in the buffer pool.
    pub pool_size: usize,

    pub disk_type: DiskType,
    /// Directory holding the data file and its space map, only
    /// used by the file disk manager.
    pub data_dir: String,
}

impl Config {
    pub fn new(file: &str) -> Result<Config> {
        let mut cfg = config::Config::builder()
            .set_default("log_level", "info")?
            .set_default("pool_size", 64)?
            .set_default("disk_type", "memory")?
            .set_default("data_dir", "data")?;
        if !file.is_empty() {
            cfg = cfg.add_source(config::File::with_name(file))
        }
        cfg = cfg.add_source(config::Environment::with_prefix("SBOXPOOL"));
        Ok(cfg.build()?.try_deserialize()?)
    }

    /// Install env_logger with the configured level. Calling it more than
    /// once is harmless, later calls keep the first logger.
    pub fn init_logger(&self) -> Result<()> {
        let level = LevelFilter::from_str(&self.log_level)?;
        let _ = env_logger::Builder::new().filter_level(level).is_test(cfg!(test)).try_init();
        Ok(())
    }
}
