use std::fmt;

/// The identity a visibility decision is made for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(String),
}

impl Viewer {
    pub fn user(id: impl Into<String>) -> Self {
        Viewer::User(id.into())
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(id),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Viewer::Anonymous)
    }
}

/// An absent identity is the anonymous viewer, never an error.
impl From<Option<String>> for Viewer {
    fn from(id: Option<String>) -> Self {
        id.map(Viewer::User).unwrap_or_default()
    }
}

impl From<Option<&str>> for Viewer {
    fn from(id: Option<&str>) -> Self {
        id.map(Viewer::user).unwrap_or_default()
    }
}

impl fmt::Display for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Viewer::Anonymous => f.write_str("anonymous"),
            Viewer::User(id) => write!(f, "user:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_identity_is_anonymous() {
        assert!(Viewer::from(None::<String>).is_anonymous());
        assert!(Viewer::from(None::<&str>).is_anonymous());
        assert_eq!(Viewer::from(Some("u1")).user_id(), Some("u1"));
        assert!(!Viewer::user("u1").is_anonymous());
    }

    #[test]
    fn test_display() {
        assert_eq!(Viewer::Anonymous.to_string(), "anonymous");
        assert_eq!(Viewer::user("u1").to_string(), "user:u1");
    }
}
