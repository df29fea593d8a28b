use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

/// Log file name inside the data directory. The terminal is owned by the UI,
/// so everything goes to a file.
pub const LOG_FILE_NAME: &str = "part-list-manager.log";

/// Install a file logger writing to `dir/part-list-manager.log`.
pub fn init_logging(dir: &Path, level: LevelFilter) -> Result<()> {
    fs::create_dir_all(dir).context("failed to create log directory")?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
        .context("failed to open log file")?;

    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level, config, file).context("failed to install logger")?;
    Ok(())
}
