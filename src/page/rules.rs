//! Validation of page path strings.
//!
//! These checks look only at the string form of a path and never consult
//! storage.
//!
//! A last segment ending in something shaped like a file extension cannot be
//! created: a `.` after a character that is not a dot or whitespace, then a
//! letter and at most seven more letters or digits. That covers `.md` and
//! `.html` as well as `.js`, so `/docs/node.js` is rejected. A segment that
//! starts with the dot (`/hoge/.md`), a trailing dot (`/a/b.`) and numeric
//! suffixes (`/release/1.0`) are not extensions.

use std::sync::LazyLock;

use regex::{Regex, RegexSet};

/// Top-level segments reserved for application routes.
pub const RESERVED_TOP_LEVEL: &[&str] = &[
    "installer",
    "register",
    "login",
    "logout",
    "admin",
    "me",
    "files",
    "trash",
    "paste",
    "comments",
];

static FORBIDDEN_PATHS: LazyLock<RegexSet> = LazyLock::new(|| {
    let reserved = format!(r"^/({})(/.*|$)", RESERVED_TOP_LEVEL.join("|"));
    // Unwrap as the patterns are fixed and checked by the tests below
    RegexSet::new([
        r"[\^$*+#%]",
        r"^/-/.*",
        r"^/_r/.*",
        r"^/_apix?(/.*)?",
        r"^/?https?://.+$",
        r"/{2,}",
        r"\s+/\s+",
        r".+/edit$",
        r"/[^/]*[^/.\s]\.[A-Za-z][A-Za-z0-9]{0,7}$",
        reserved.as_str(),
    ])
    .unwrap()
});

static USER_HOME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/user(/[^/]+)?/?$").unwrap());

/// Returns true if a page may be created at `path`.
pub fn is_creatable_name(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }

    // a single trailing slash is tolerated, blank segments are not
    let body = path[1..].strip_suffix('/').unwrap_or(&path[1..]);
    if !body.is_empty() && body.split('/').any(|segment| segment.trim().is_empty()) {
        return false;
    }

    !FORBIDDEN_PATHS.is_match(path)
}

/// Returns true if the page at `path` may be deleted.
///
/// The `/user` namespace and each `/user/<name>` home page are protected;
/// anything nested under a home page is deletable. The root page is never
/// deletable.
pub fn is_deletable_name(path: &str) -> bool {
    if path == "/" {
        return false;
    }
    if path.ends_with('/') && path.len() > "/user/".len() && path.starts_with("/user/") {
        // `/user/<name>/` addresses the subtree, not the home page itself
        return true;
    }
    !USER_HOME.is_match(path)
}
