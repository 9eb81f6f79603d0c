use regex::Regex;

use crate::error::{Error, Result};

pub const ROOT_PATH: &str = "/";

/// Normalizes a page path: leading `/`, no trailing `/`, no empty segments.
///
/// The root path `/` is returned as-is.
pub fn normalize_path(path: &str) -> Result<String> {
    let path = path.trim();

    if path.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".to_string()));
    }

    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return Ok(ROOT_PATH.to_string());
    }

    for segment in &segments {
        validate_segment(segment)?;
    }

    Ok(format!("/{}", segments.join("/")))
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.len() > 255 {
        return Err(Error::InvalidPath(
            "Path segment cannot exceed 255 characters".to_string(),
        ));
    }

    const INVALID_CHARS: &[char] = &['\0', '\n', '\r'];
    if segment.chars().any(|c| INVALID_CHARS.contains(&c)) {
        return Err(Error::InvalidPath(
            "Path segment contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

/// Removes one trailing `/` unless the path is the root.
pub fn strip_trailing_slash(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Builds an anchored pattern matching every path starting with `prefix`.
///
/// With `escape` set, the prefix is matched literally.
pub fn prefix_pattern(prefix: &str, escape: bool) -> Result<String> {
    let body = if escape {
        regex::escape(prefix)
    } else {
        prefix.to_string()
    };
    let pattern = format!("^{body}");

    Regex::new(&pattern)
        .map_err(|e| Error::InvalidPath(format!("invalid path pattern '{prefix}': {e}")))?;

    Ok(pattern)
}

/// Validates that a raw query prefix is usable before any storage access.
pub fn validate_query_prefix(prefix: &str) -> Result<()> {
    if prefix.trim().is_empty() {
        return Err(Error::InvalidPath("Path prefix cannot be empty".to_string()));
    }
    if !prefix.starts_with('/') {
        return Err(Error::InvalidPath(format!(
            "Path prefix must start with '/': '{prefix}'"
        )));
    }
    if prefix.contains(['\0', '\n', '\r']) {
        return Err(Error::InvalidPath(
            "Path prefix contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
