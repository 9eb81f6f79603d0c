use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Grant;
use crate::page::trash::is_trash_path;

/// Key under `extended` holding the page's Slack channel.
pub const SLACK_CHANNEL_KEY: &str = "slack";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub path: String,
    pub grant: Grant,
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub granted_users: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granted_group: Option<String>,
    pub creator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<String>,
    #[serde(default)]
    pub extended: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.grant == Grant::Public
    }

    /// Deleted pages live under `/trash`.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        is_trash_path(&self.path)
    }

    #[must_use]
    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator == user_id
    }

    /// Returns the configured Slack channel, or an empty string.
    #[must_use]
    pub fn slack_channel(&self) -> &str {
        self.extended
            .get(SLACK_CHANNEL_KEY)
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

/// Input for creating a page; id and timestamps are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewPage {
    pub path: String,
    pub grant: Grant,
    pub granted_users: BTreeSet<String>,
    pub granted_group: Option<String>,
    pub creator: String,
    pub revision_id: Option<String>,
    pub extended: Map<String, Value>,
}

impl NewPage {
    pub fn new(path: impl Into<String>, creator: impl Into<String>, grant: Grant) -> Self {
        Self {
            path: path.into(),
            grant,
            granted_users: BTreeSet::new(),
            granted_group: None,
            creator: creator.into(),
            revision_id: None,
            extended: Map::new(),
        }
    }

    #[must_use]
    pub fn with_granted_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.granted_users = users.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_granted_group(mut self, group_id: impl Into<String>) -> Self {
        self.granted_group = Some(group_id.into());
        self
    }

    #[must_use]
    pub fn with_extended(mut self, extended: Map<String, Value>) -> Self {
        self.extended = extended;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroupRelation {
    pub group_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub page_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// A paginated listing; `total_count` counts every visible match.
#[derive(Debug, Clone, Serialize)]
pub struct PageList {
    pub pages: Vec<Page>,
    pub total_count: u64,
    pub limit: u32,
    pub offset: u32,
}

impl PageList {
    pub fn paths(&self) -> Vec<&str> {
        self.pages.iter().map(|p| p.path.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookmarkList {
    pub bookmarks: Vec<Bookmark>,
    pub total_count: u64,
    pub limit: u32,
    pub offset: u32,
}
