pub const SCHEMA: &str = r#"
-- Local identities; the authentication layer may know more users than these
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS user_groups (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Group membership (many-to-many)
CREATE TABLE IF NOT EXISTS user_group_relations (
    group_id TEXT NOT NULL REFERENCES user_groups(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (group_id, user_id)
);

-- Pages. Trashed pages keep their row and move under /trash/.
CREATE TABLE IF NOT EXISTS pages (
    id TEXT PRIMARY KEY,
    path TEXT NOT NULL UNIQUE,

    -- 1 public, 2 restricted, 3 specified, 4 owner, 5 user group
    grant_level INTEGER NOT NULL DEFAULT 1 CHECK (grant_level BETWEEN 1 AND 5),
    granted_group_id TEXT REFERENCES user_groups(id) ON DELETE SET NULL,

    -- Opaque user id from the authentication layer (not a foreign key)
    creator_id TEXT NOT NULL,
    revision_id TEXT,

    -- Auxiliary fields, updated one key at a time with json_set()
    extended TEXT NOT NULL DEFAULT '{}' CHECK (json_valid(extended)),

    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS page_granted_users (
    page_id TEXT NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    PRIMARY KEY (page_id, user_id)
);

CREATE TABLE IF NOT EXISTS bookmarks (
    page_id TEXT NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (page_id, user_id)
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_pages_creator ON pages(creator_id);
CREATE INDEX IF NOT EXISTS idx_pages_granted_group ON pages(granted_group_id);
CREATE INDEX IF NOT EXISTS idx_page_granted_users_user ON page_granted_users(user_id);
CREATE INDEX IF NOT EXISTS idx_user_group_relations_user ON user_group_relations(user_id);
CREATE INDEX IF NOT EXISTS idx_bookmarks_user ON bookmarks(user_id);
"#;
