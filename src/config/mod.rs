mod settings;

pub use settings::{
    CONFIG_FILE_NAME, CollisionPolicy, Config, DB_FILE_NAME, PaginationConfig, StorageConfig,
    TrashConfig,
};
