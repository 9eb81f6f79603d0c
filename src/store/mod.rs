pub mod path;
pub mod query;
mod schema;
mod sqlite;

pub use query::{PageQuery, PathFilter, Visibility};
pub use sqlite::SqliteStore;

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>>;

    // User group operations
    fn create_user_group(&self, group: &UserGroup) -> Result<()>;
    fn get_user_group(&self, id: &str) -> Result<Option<UserGroup>>;
    fn get_user_group_by_name(&self, name: &str) -> Result<Option<UserGroup>>;
    fn list_user_groups(&self, cursor: &str, limit: i32) -> Result<Vec<UserGroup>>;
    fn delete_user_group(&self, id: &str) -> Result<bool>;

    // Group membership (many-to-many)
    fn add_user_group_relation(&self, relation: &UserGroupRelation) -> Result<bool>;
    fn remove_user_group_relation(&self, group_id: &str, user_id: &str) -> Result<bool>;
    fn list_user_group_ids(&self, user_id: &str) -> Result<Vec<String>>;
    fn list_group_member_ids(&self, group_id: &str) -> Result<Vec<String>>;

    // Page operations
    fn create_page(&self, page: &Page) -> Result<()>;
    fn get_page(&self, id: &str) -> Result<Option<Page>>;
    fn get_page_by_path(&self, path: &str) -> Result<Option<Page>>;
    /// Returns one page of results and the total number of matches.
    fn query_pages(&self, query: &PageQuery) -> Result<(Vec<Page>, u64)>;
    fn update_page_grant(
        &self,
        id: &str,
        grant: Grant,
        granted_users: &BTreeSet<String>,
        granted_group: Option<&str>,
    ) -> Result<()>;
    /// Moves a page only if its stored path still equals `expected_path`.
    fn rename_page(&self, id: &str, expected_path: &str, new_path: &str) -> Result<()>;
    /// Moves a page and all its descendants in one transaction.
    /// Returns the number of descendants moved.
    fn rename_page_subtree(&self, id: &str, expected_path: &str, new_path: &str) -> Result<u64>;
    /// Sets one key of `extended` without touching the others.
    fn set_page_extended_field(&self, id: &str, key: &str, value: &Value) -> Result<()>;

    // Bookmark operations
    fn add_bookmark(&self, bookmark: &Bookmark) -> Result<bool>;
    fn get_bookmark(&self, page_id: &str, user_id: &str) -> Result<Option<Bookmark>>;
    fn delete_bookmark(&self, page_id: &str, user_id: &str) -> Result<bool>;
    /// Bookmarks of `user_id` whose page is visible under `visibility`.
    fn query_bookmarks(
        &self,
        user_id: &str,
        visibility: &Visibility,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<Bookmark>, u64)>;
}
