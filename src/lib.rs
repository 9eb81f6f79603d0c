//! # Pagewarden
//!
//! Access control and hierarchy operations for wiki pages stored in SQLite,
//! usable both as a library and through the `pagewarden` admin binary.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! pagewarden = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pagewarden::config::Config;
//! use pagewarden::page::{ListOptions, PageRepository};
//! use pagewarden::store::{SqliteStore, Store};
//! use pagewarden::types::Viewer;
//!
//! let config = Config::load("./data").unwrap();
//! let store = SqliteStore::open(config.db_path(), &config.storage).unwrap();
//! store.initialize().unwrap();
//!
//! let pages = PageRepository::new(Arc::new(store), config);
//! let list = pages
//!     .find_list_with_descendants("/docs/", &Viewer::user("alice"), &ListOptions::default())
//!     .unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod page;
pub mod store;
pub mod types;
