use std::collections::BTreeSet;

use crate::types::Viewer;

/// Visibility predicate applied inside listing queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    Anonymous,
    User {
        user_id: String,
        group_ids: BTreeSet<String>,
    },
}

impl Visibility {
    pub fn for_viewer(viewer: &Viewer, group_ids: BTreeSet<String>) -> Self {
        match viewer {
            Viewer::Anonymous => Visibility::Anonymous,
            Viewer::User(id) => Visibility::User {
                user_id: id.clone(),
                group_ids,
            },
        }
    }
}

/// Which paths a listing matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFilter {
    /// Every page.
    All,
    /// `path = exact` or `path` matches the anchored `pattern`.
    ///
    /// `range` is an optional literal prefix used to narrow the scan on the
    /// path index before the pattern is evaluated.
    Prefix {
        exact: Option<String>,
        pattern: String,
        range: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub path: PathFilter,
    pub visibility: Visibility,
    pub exclude_trashed: bool,
    pub limit: u32,
    pub offset: u32,
}

/// Smallest string greater than every string starting with `prefix`.
pub fn prefix_upper_bound(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        if let Some(next) = char::from_u32(last as u32 + 1) {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_upper_bound() {
        assert_eq!(prefix_upper_bound("/page1/").as_deref(), Some("/page10"));
        assert_eq!(prefix_upper_bound("/a").as_deref(), Some("/b"));
        assert_eq!(prefix_upper_bound(""), None);
    }

    #[test]
    fn test_visibility_for_viewer() {
        assert_eq!(
            Visibility::for_viewer(&Viewer::Anonymous, BTreeSet::new()),
            Visibility::Anonymous
        );
        let groups: BTreeSet<String> = ["g1".to_string()].into_iter().collect();
        assert_eq!(
            Visibility::for_viewer(&Viewer::user("u1"), groups.clone()),
            Visibility::User {
                user_id: "u1".to_string(),
                group_ids: groups,
            }
        );
    }
}
