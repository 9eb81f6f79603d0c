//! Mapping between live paths and their soft-deleted counterparts.

pub const TRASH_ROOT: &str = "/trash";

/// Returns true if `path` is the trash root or lies beneath it.
pub fn is_trash_path(path: &str) -> bool {
    path == TRASH_ROOT
        || path
            .strip_prefix(TRASH_ROOT)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Relocates a live path under `/trash`. Trash paths are returned unchanged.
pub fn to_trash_path(path: &str) -> String {
    if is_trash_path(path) {
        return path.to_string();
    }
    if path.starts_with('/') {
        format!("{TRASH_ROOT}{path}")
    } else {
        format!("{TRASH_ROOT}/{path}")
    }
}

/// Strips exactly one leading `/trash` segment; other paths are unchanged.
pub fn from_trash_path(path: &str) -> String {
    if path == TRASH_ROOT {
        return "/".to_string();
    }
    match path.strip_prefix(TRASH_ROOT) {
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}
