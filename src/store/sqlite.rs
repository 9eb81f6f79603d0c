use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{
    Connection, InterruptHandle, OptionalExtension, Row, params, params_from_iter,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Store;
use super::query::{PageQuery, PathFilter, Visibility, prefix_upper_bound};
use super::schema::SCHEMA;
use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::page::trash::TRASH_ROOT;
use crate::types::*;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

const PAGE_COLUMNS: &str = "p.id, p.path, p.grant_level, p.granted_group_id, p.creator_id,
        p.revision_id, p.extended, p.created_at, p.updated_at,
        (SELECT json_group_array(gu.user_id) FROM page_granted_users gu WHERE gu.page_id = p.id)";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::open(db_path, &StorageConfig::default())
    }

    pub fn open<P: AsRef<Path>>(db_path: P, config: &StorageConfig) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(config.busy_timeout())?;
        register_regexp(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Handle that aborts the statement currently running on this store.
    ///
    /// Getting the handle locks the connection, so a call made while another
    /// thread is querying waits for that query to finish. Take the handle once
    /// after opening the store and keep it. The interrupted operation fails
    /// with `Error::Database`.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn().get_interrupt_handle()
    }

    /// Explains why a conditional path update touched no row.
    fn stale_path_error(&self, id: &str) -> Result<Error> {
        Ok(match self.get_page(id)? {
            Some(page) => Error::Conflict(format!(
                "page {id} was moved concurrently (now at '{}')",
                page.path
            )),
            None => Error::NotFound,
        })
    }
}

/// Registers `regexp(pattern, text)` so `path REGEXP ?` works.
fn register_regexp(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let regex: Arc<Regex> =
                ctx.get_or_create_aux(0, |vr| -> std::result::Result<_, BoxError> {
                    Ok(Regex::new(vr.as_str()?)?)
                })?;
            let text = ctx
                .get_raw(1)
                .as_str()
                .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
            Ok(regex.is_match(text))
        },
    )
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Some(e.extended_code)
        }
        _ => None,
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        constraint_code(err),
        Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    constraint_code(err) == Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<Page> {
    let code: i64 = row.get(2)?;
    let grant = Grant::from_code(code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Integer,
            format!("unknown grant level {code}").into(),
        )
    })?;

    Ok(Page {
        id: row.get(0)?,
        path: row.get(1)?,
        grant,
        granted_group: row.get(3)?,
        creator: row.get(4)?,
        revision_id: row.get(5)?,
        extended: json_column(row, 6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
        granted_users: json_column(row, 9)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
    })
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<UserGroup> {
    Ok(UserGroup {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
    })
}

fn bookmark_from_row(row: &Row<'_>) -> rusqlite::Result<Bookmark> {
    Ok(Bookmark {
        page_id: row.get(0)?,
        user_id: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
    })
}

/// Renders the grant table as a predicate over the `pages p` alias.
fn visibility_clause(visibility: &Visibility, params: &mut Vec<SqlValue>) -> String {
    let public = Grant::Public.code();

    let Visibility::User { user_id, group_ids } = visibility else {
        return format!("p.grant_level = {public}");
    };

    params.extend(std::iter::repeat_n(SqlValue::Text(user_id.clone()), 4));

    let mut group_match = String::new();
    if !group_ids.is_empty() {
        let placeholders = vec!["?"; group_ids.len()].join(", ");
        group_match = format!(" OR p.granted_group_id IN ({placeholders})");
        params.extend(group_ids.iter().cloned().map(SqlValue::Text));
    }

    format!(
        "(p.grant_level = {public}
          OR (p.grant_level IN ({restricted}, {specified})
              AND (p.creator_id = ?
                   OR EXISTS (SELECT 1 FROM page_granted_users gu
                              WHERE gu.page_id = p.id AND gu.user_id = ?)))
          OR (p.grant_level = {owner} AND p.creator_id = ?)
          OR (p.grant_level = {group} AND (p.creator_id = ?{group_match})))",
        restricted = Grant::Restricted.code(),
        specified = Grant::Specified.code(),
        owner = Grant::Owner.code(),
        group = Grant::UserGroup.code(),
    )
}

fn path_clause(filter: &PathFilter, params: &mut Vec<SqlValue>) -> Option<String> {
    let PathFilter::Prefix {
        exact,
        pattern,
        range,
    } = filter
    else {
        return None;
    };

    let mut matching = String::new();
    let mut matching_params = Vec::new();
    if let Some(lower) = range {
        matching.push_str("p.path >= ? AND ");
        matching_params.push(SqlValue::Text(lower.clone()));
        if let Some(upper) = prefix_upper_bound(lower) {
            matching.push_str("p.path < ? AND ");
            matching_params.push(SqlValue::Text(upper));
        }
    }
    matching.push_str("p.path REGEXP ?");
    matching_params.push(SqlValue::Text(pattern.clone()));

    let clause = match exact {
        Some(exact) => {
            params.push(SqlValue::Text(exact.clone()));
            format!("(p.path = ? OR ({matching}))")
        }
        None => format!("({matching})"),
    };
    params.extend(matching_params);
    Some(clause)
}

fn not_trashed_clause() -> String {
    format!("NOT (p.path = '{TRASH_ROOT}' OR p.path GLOB '{TRASH_ROOT}/*')")
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3)",
            params![user.id, user.username, format_datetime(&user.created_at)],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                "SELECT id, username, created_at FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                "SELECT id, username, created_at FROM users WHERE username = ?1",
                params![username],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, username, created_at FROM users WHERE id > ?1 ORDER BY id LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cursor, limit], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // User group operations

    fn create_user_group(&self, group: &UserGroup) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO user_groups (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![group.id, group.name, format_datetime(&group.created_at)],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user_group(&self, id: &str) -> Result<Option<UserGroup>> {
        self.conn()
            .query_row(
                "SELECT id, name, created_at FROM user_groups WHERE id = ?1",
                params![id],
                group_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_user_group_by_name(&self, name: &str) -> Result<Option<UserGroup>> {
        self.conn()
            .query_row(
                "SELECT id, name, created_at FROM user_groups WHERE name = ?1",
                params![name],
                group_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_user_groups(&self, cursor: &str, limit: i32) -> Result<Vec<UserGroup>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, created_at FROM user_groups WHERE id > ?1 ORDER BY id LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cursor, limit], group_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_user_group(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM user_groups WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Group membership

    fn add_user_group_relation(&self, relation: &UserGroupRelation) -> Result<bool> {
        let result = self.conn().execute(
            "INSERT OR IGNORE INTO user_group_relations (group_id, user_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![
                relation.group_id,
                relation.user_id,
                format_datetime(&relation.created_at),
            ],
        );

        match result {
            Ok(rows) => Ok(rows > 0),
            Err(e) if is_foreign_key_violation(&e) => Err(Error::NotFound),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn remove_user_group_relation(&self, group_id: &str, user_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM user_group_relations WHERE group_id = ?1 AND user_id = ?2",
            params![group_id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn list_user_group_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT group_id FROM user_group_relations WHERE user_id = ?1 ORDER BY group_id",
        )?;

        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_group_member_ids(&self, group_id: &str) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT user_id FROM user_group_relations WHERE group_id = ?1 ORDER BY user_id",
        )?;

        let rows = stmt.query_map(params![group_id], |row| row.get(0))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Page operations

    fn create_page(&self, page: &Page) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO pages (id, path, grant_level, granted_group_id, creator_id, revision_id,
                                extended, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                page.id,
                page.path,
                page.grant.code(),
                page.granted_group,
                page.creator,
                page.revision_id,
                serde_json::to_string(&page.extended)?,
                format_datetime(&page.created_at),
                format_datetime(&page.updated_at),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(Error::PathCollision(page.path.clone()));
            }
            Err(e) if is_foreign_key_violation(&e) => {
                return Err(Error::BadRequest("granted group does not exist".to_string()));
            }
            Err(e) => return Err(Error::from(e)),
        }

        for user_id in &page.granted_users {
            tx.execute(
                "INSERT INTO page_granted_users (page_id, user_id) VALUES (?1, ?2)",
                params![page.id, user_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_page(&self, id: &str) -> Result<Option<Page>> {
        self.conn()
            .query_row(
                &format!("SELECT {PAGE_COLUMNS} FROM pages p WHERE p.id = ?1"),
                params![id],
                page_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_page_by_path(&self, path: &str) -> Result<Option<Page>> {
        self.conn()
            .query_row(
                &format!("SELECT {PAGE_COLUMNS} FROM pages p WHERE p.path = ?1"),
                params![path],
                page_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn query_pages(&self, query: &PageQuery) -> Result<(Vec<Page>, u64)> {
        let mut params = Vec::new();
        let mut conditions = Vec::new();

        if let Some(clause) = path_clause(&query.path, &mut params) {
            conditions.push(clause);
        }
        if query.exclude_trashed {
            conditions.push(not_trashed_clause());
        }
        conditions.push(visibility_clause(&query.visibility, &mut params));

        let where_sql = conditions.join(" AND ");
        tracing::debug!(filter = ?query.path, limit = query.limit, offset = query.offset, "query pages");

        let conn = self.conn();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM pages p WHERE {where_sql}"),
            params_from_iter(params.iter()),
            |row| row.get(0),
        )?;

        params.push(SqlValue::Integer(i64::from(query.limit)));
        params.push(SqlValue::Integer(i64::from(query.offset)));

        let mut stmt = conn.prepare(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages p WHERE {where_sql}
             ORDER BY p.path LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt.query_map(params_from_iter(params.iter()), page_from_row)?;
        let pages = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((pages, total as u64))
    }

    fn update_page_grant(
        &self,
        id: &str,
        grant: Grant,
        granted_users: &BTreeSet<String>,
        granted_group: Option<&str>,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE pages SET grant_level = ?1, granted_group_id = ?2, updated_at = ?3 WHERE id = ?4",
            params![grant.code(), granted_group, format_datetime(&Utc::now()), id],
        );

        let rows = match updated {
            Ok(rows) => rows,
            Err(e) if is_foreign_key_violation(&e) => {
                return Err(Error::BadRequest("granted group does not exist".to_string()));
            }
            Err(e) => return Err(Error::from(e)),
        };
        if rows == 0 {
            return Err(Error::NotFound);
        }

        tx.execute(
            "DELETE FROM page_granted_users WHERE page_id = ?1",
            params![id],
        )?;
        for user_id in granted_users {
            tx.execute(
                "INSERT INTO page_granted_users (page_id, user_id) VALUES (?1, ?2)",
                params![id, user_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn rename_page(&self, id: &str, expected_path: &str, new_path: &str) -> Result<()> {
        let result = self.conn().execute(
            "UPDATE pages SET path = ?1, updated_at = ?2 WHERE id = ?3 AND path = ?4",
            params![new_path, format_datetime(&Utc::now()), id, expected_path],
        );

        let rows = match result {
            Ok(rows) => rows,
            Err(e) if is_unique_violation(&e) => {
                return Err(Error::PathCollision(new_path.to_string()));
            }
            Err(e) => return Err(Error::from(e)),
        };

        if rows == 0 {
            return Err(self.stale_path_error(id)?);
        }
        Ok(())
    }

    fn rename_page_subtree(&self, id: &str, expected_path: &str, new_path: &str) -> Result<u64> {
        let old_prefix = format!("{expected_path}/");
        let new_prefix = format!("{new_path}/");
        let old_prefix_len = old_prefix.chars().count() as i64;
        let now = format_datetime(&Utc::now());

        let collision = |e: rusqlite::Error| {
            if is_unique_violation(&e) {
                Error::PathCollision(new_path.to_string())
            } else {
                Error::from(e)
            }
        };

        let moved = {
            let mut conn = self.conn();
            let tx = conn.transaction()?;

            let rows = tx
                .execute(
                    "UPDATE pages SET path = ?1, updated_at = ?2 WHERE id = ?3 AND path = ?4",
                    params![new_path, now, id, expected_path],
                )
                .map_err(collision)?;

            if rows == 0 {
                None
            } else {
                let moved = tx
                    .execute(
                        "UPDATE pages SET path = ?1 || substr(path, ?2), updated_at = ?3
                         WHERE substr(path, 1, ?4) = ?5",
                        params![new_prefix, old_prefix_len + 1, now, old_prefix_len, old_prefix],
                    )
                    .map_err(collision)?;
                tx.commit()?;
                Some(moved as u64)
            }
        };

        match moved {
            Some(moved) => Ok(moved),
            None => Err(self.stale_path_error(id)?),
        }
    }

    fn set_page_extended_field(&self, id: &str, key: &str, value: &Value) -> Result<()> {
        if key.is_empty() || key.contains('"') || key.chars().any(char::is_control) {
            return Err(Error::BadRequest(format!("invalid extended key '{key}'")));
        }

        let rows = self.conn().execute(
            "UPDATE pages SET extended = json_set(extended, ?1, json(?2)), updated_at = ?3
             WHERE id = ?4",
            params![
                format!("$.\"{key}\""),
                serde_json::to_string(value)?,
                format_datetime(&Utc::now()),
                id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Bookmark operations

    fn add_bookmark(&self, bookmark: &Bookmark) -> Result<bool> {
        let result = self.conn().execute(
            "INSERT OR IGNORE INTO bookmarks (page_id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![
                bookmark.page_id,
                bookmark.user_id,
                format_datetime(&bookmark.created_at),
            ],
        );

        match result {
            Ok(rows) => Ok(rows > 0),
            Err(e) if is_foreign_key_violation(&e) => Err(Error::NotFound),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_bookmark(&self, page_id: &str, user_id: &str) -> Result<Option<Bookmark>> {
        self.conn()
            .query_row(
                "SELECT page_id, user_id, created_at FROM bookmarks
                 WHERE page_id = ?1 AND user_id = ?2",
                params![page_id, user_id],
                bookmark_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn delete_bookmark(&self, page_id: &str, user_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM bookmarks WHERE page_id = ?1 AND user_id = ?2",
            params![page_id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn query_bookmarks(
        &self,
        user_id: &str,
        visibility: &Visibility,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<Bookmark>, u64)> {
        let mut params = vec![SqlValue::Text(user_id.to_string())];
        let where_sql = format!(
            "b.user_id = ? AND {} AND {}",
            not_trashed_clause(),
            visibility_clause(visibility, &mut params)
        );

        let conn = self.conn();
        let total: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM bookmarks b JOIN pages p ON p.id = b.page_id WHERE {where_sql}"
            ),
            params_from_iter(params.iter()),
            |row| row.get(0),
        )?;

        params.push(SqlValue::Integer(i64::from(limit)));
        params.push(SqlValue::Integer(i64::from(offset)));

        let mut stmt = conn.prepare(&format!(
            "SELECT b.page_id, b.user_id, b.created_at
             FROM bookmarks b JOIN pages p ON p.id = b.page_id
             WHERE {where_sql}
             ORDER BY b.created_at DESC, b.page_id LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt.query_map(params_from_iter(params.iter()), bookmark_from_row)?;
        let bookmarks = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((bookmarks, total as u64))
    }
}
