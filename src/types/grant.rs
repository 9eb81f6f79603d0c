use std::fmt;

use serde::{Deserialize, Serialize};

/// Grant is the access level attached to a page.
///
/// Each level is evaluated on its own; there is no ordering between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    Public,
    Restricted,
    Specified,
    Owner,
    UserGroup,
}

impl Grant {
    pub const ALL: [Grant; 5] = [
        Grant::Public,
        Grant::Restricted,
        Grant::Specified,
        Grant::Owner,
        Grant::UserGroup,
    ];

    /// Integer stored in the `grant` column.
    pub const fn code(self) -> i64 {
        match self {
            Grant::Public => 1,
            Grant::Restricted => 2,
            Grant::Specified => 3,
            Grant::Owner => 4,
            Grant::UserGroup => 5,
        }
    }

    pub const fn from_code(code: i64) -> Option<Grant> {
        match code {
            1 => Some(Grant::Public),
            2 => Some(Grant::Restricted),
            3 => Some(Grant::Specified),
            4 => Some(Grant::Owner),
            5 => Some(Grant::UserGroup),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Grant::Public => "public",
            Grant::Restricted => "restricted",
            Grant::Specified => "specified",
            Grant::Owner => "owner",
            Grant::UserGroup => "user-group",
        }
    }

    /// Parses the CLI / config spelling of a grant.
    pub fn parse(s: &str) -> Option<Grant> {
        match s {
            "public" => Some(Grant::Public),
            "restricted" => Some(Grant::Restricted),
            "specified" => Some(Grant::Specified),
            "owner" => Some(Grant::Owner),
            "user-group" | "user_group" | "group" => Some(Grant::UserGroup),
            _ => None,
        }
    }

    /// Grants whose visibility depends on the `granted_users` set.
    #[must_use]
    pub const fn uses_granted_users(self) -> bool {
        matches!(self, Grant::Restricted | Grant::Specified)
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_mapping_is_stable() {
        assert_eq!(Grant::Public.code(), 1);
        assert_eq!(Grant::UserGroup.code(), 5);
        for grant in Grant::ALL {
            assert_eq!(Grant::from_code(grant.code()), Some(grant));
        }
        assert_eq!(Grant::from_code(0), None);
        assert_eq!(Grant::from_code(6), None);
    }

    #[test]
    fn test_parse_grant() {
        assert_eq!(Grant::parse("owner"), Some(Grant::Owner));
        assert_eq!(Grant::parse("user_group"), Some(Grant::UserGroup));
        assert_eq!(Grant::parse("everyone"), None);
    }
}
