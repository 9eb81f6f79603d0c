use std::fs;
use std::path::PathBuf;

use crate::config::{CONFIG_FILE_NAME, Config};
use crate::store::{SqliteStore, Store};

/// Creates the data directory, the database and a default config file.
pub fn run_init(data_dir: String) -> anyhow::Result<()> {
    let data_path = PathBuf::from(&data_dir);
    fs::create_dir_all(&data_path)?;

    let config = Config::load(&data_path)?;
    let db_path = config.db_path();

    if db_path.exists() {
        anyhow::bail!("Already initialized. Database exists at: {}", db_path.display());
    }

    let store = SqliteStore::open(&db_path, &config.storage)?;
    store.initialize()?;

    let config_path = config.config_path();
    if !config_path.exists() {
        fs::write(&config_path, config.to_toml()?)?;
    }

    tracing::info!(db = %db_path.display(), "initialized database");

    println!();
    println!("Initialized {}", data_path.display());
    println!("  Database: {}", db_path.display());
    println!("  Config:   {}", data_path.join(CONFIG_FILE_NAME).display());
    println!();

    Ok(())
}
