use std::fmt;

use inquire::Select;

use crate::store::Store;
use crate::types::{Page, User, UserGroup, Viewer};

/// Group with member count for display
pub struct GroupDisplay {
    pub group: UserGroup,
    pub members: usize,
}

impl fmt::Display for GroupDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.members == 1 { "member" } else { "members" };
        write!(f, "{} ({} {noun})", self.group.name, self.members)
    }
}

/// Validates a username typed on the command line.
pub fn validate_username(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        Err("Username cannot be empty".to_string())
    } else if name.contains(char::is_whitespace) {
        Err("Username cannot contain whitespace".to_string())
    } else if name.contains('/') {
        Err("Username cannot contain '/'".to_string())
    } else {
        Ok(())
    }
}

pub fn resolve_user(store: &dyn Store, username: &str) -> anyhow::Result<User> {
    store
        .get_user_by_username(username)?
        .ok_or_else(|| anyhow::anyhow!("User '{}' not found", username))
}

pub fn resolve_group(store: &dyn Store, name: &str) -> anyhow::Result<UserGroup> {
    store
        .get_user_group_by_name(name)?
        .ok_or_else(|| anyhow::anyhow!("Group '{}' not found", name))
}

/// Maps an optional `--as` username to a viewer; no username is anonymous.
pub fn resolve_viewer(store: &dyn Store, username: Option<&str>) -> anyhow::Result<Viewer> {
    match username {
        Some(name) => Ok(Viewer::user(resolve_user(store, name)?.id)),
        None => Ok(Viewer::Anonymous),
    }
}

/// Looks a page up by path without any grant check.
pub fn resolve_page(store: &dyn Store, path: &str) -> anyhow::Result<Page> {
    store
        .get_page_by_path(crate::store::path::strip_trailing_slash(path))?
        .ok_or_else(|| anyhow::anyhow!("Page '{}' not found", path))
}

/// Display a username for a user id, falling back to the id itself
pub fn display_user(store: &dyn Store, user_id: &str) -> String {
    match store.get_user(user_id) {
        Ok(Some(user)) => user.username,
        _ => user_id.to_string(),
    }
}

/// Interactive group picker
pub fn pick_group(store: &dyn Store) -> anyhow::Result<Option<UserGroup>> {
    let groups = store.list_user_groups("", 1000)?;

    if groups.is_empty() {
        println!("No groups found.");
        return Ok(None);
    }

    let mut options = Vec::with_capacity(groups.len());
    for group in groups {
        let members = store.list_group_member_ids(&group.id)?.len();
        options.push(GroupDisplay { group, members });
    }

    match Select::new("Select group:", options).prompt_skippable()? {
        Some(choice) => Ok(Some(choice.group)),
        None => Ok(None),
    }
}

pub fn get_or_pick_group(
    store: &dyn Store,
    name: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<Option<UserGroup>> {
    if let Some(name) = name {
        Ok(Some(resolve_group(store, &name)?))
    } else if non_interactive {
        anyhow::bail!("--name is required in non-interactive mode");
    } else {
        pick_group(store)
    }
}

/// Request confirmation for a destructive operation
pub fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        anyhow::bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}
