mod bookmark;
mod commands;
mod group;
mod init;
mod page;
mod path;
pub mod pickers;
mod user;

pub use bookmark::{run_bookmark_add, run_bookmark_list, run_bookmark_remove};
pub use commands::{BookmarkCommands, GroupCommands, PageCommands, PathCommands, UserCommands};
pub use group::{
    run_group_add_member, run_group_create, run_group_list, run_group_remove,
    run_group_remove_member,
};
pub use init::run_init;
pub use page::{
    run_page_create, run_page_extend, run_page_grant, run_page_list, run_page_remove,
    run_page_revert, run_page_show,
};
pub use path::run_path_check;
pub use user::{run_user_add, run_user_list};

use std::sync::Arc;

use crate::config::Config;
use crate::page::PageRepository;
use crate::store::SqliteStore;

/// Initialize store from data directory, checking it exists
pub fn init_store(data_dir: &str) -> anyhow::Result<(SqliteStore, Config)> {
    let config = Config::load(data_dir)?;
    let db_path = config.db_path();

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'pagewarden init' first.",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&db_path, &config.storage)?;
    Ok((store, config))
}

/// Opens the page repository over the store in `data_dir`.
pub fn init_repository(data_dir: &str) -> anyhow::Result<PageRepository> {
    let (store, config) = init_store(data_dir)?;
    Ok(PageRepository::new(Arc::new(store), config))
}
