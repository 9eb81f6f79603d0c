use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::store::Store;
use crate::types::{UserGroup, UserGroupRelation};

use super::init_store;
use super::pickers::{confirm_action, display_user, get_or_pick_group, resolve_group, resolve_user};

#[derive(Serialize)]
struct GroupOutput {
    id: String,
    name: String,
    members: Vec<String>,
    created_at: String,
}

pub fn run_group_create(data_dir: String, name: String) -> anyhow::Result<()> {
    let (store, _) = init_store(&data_dir)?;

    if name.trim().is_empty() {
        anyhow::bail!("Group name cannot be empty");
    }
    if store.get_user_group_by_name(&name)?.is_some() {
        anyhow::bail!("Group '{}' already exists", name);
    }

    let group = UserGroup {
        id: Uuid::new_v4().to_string(),
        name: name.clone(),
        created_at: Utc::now(),
    };
    store.create_user_group(&group)?;

    println!("Created group \"{}\" ({})", name, group.id);

    Ok(())
}

pub fn run_group_list(data_dir: String, json: bool) -> anyhow::Result<()> {
    let (store, _) = init_store(&data_dir)?;
    let groups = store.list_user_groups("", 10000)?;

    let mut outputs = Vec::with_capacity(groups.len());
    for group in groups {
        let members = store
            .list_group_member_ids(&group.id)?
            .iter()
            .map(|id| display_user(&store, id))
            .collect();
        outputs.push(GroupOutput {
            id: group.id,
            name: group.name,
            members,
            created_at: group.created_at.to_rfc3339(),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
        return Ok(());
    }

    if outputs.is_empty() {
        println!("No groups found.");
        return Ok(());
    }

    for group in &outputs {
        println!("{}  [{}]", group.name, group.members.join(", "));
    }

    Ok(())
}

pub fn run_group_remove(
    data_dir: String,
    name: Option<String>,
    yes: bool,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let (store, _) = init_store(&data_dir)?;

    let Some(group) = get_or_pick_group(&store, name, non_interactive)? else {
        return Ok(());
    };

    let confirmed = confirm_action(
        &format!(
            "Remove group \"{}\"? Pages granted to it become visible to their creators only.",
            group.name
        ),
        yes,
        non_interactive,
    )?;
    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    store.delete_user_group(&group.id)?;
    println!("Removed group \"{}\"", group.name);

    Ok(())
}

pub fn run_group_add_member(data_dir: String, group: String, user: String) -> anyhow::Result<()> {
    let (store, _) = init_store(&data_dir)?;
    let group = resolve_group(&store, &group)?;
    let user = resolve_user(&store, &user)?;

    let added = store.add_user_group_relation(&UserGroupRelation {
        group_id: group.id.clone(),
        user_id: user.id.clone(),
        created_at: Utc::now(),
    })?;

    if added {
        println!("Added \"{}\" to \"{}\"", user.username, group.name);
    } else {
        println!("\"{}\" is already a member of \"{}\"", user.username, group.name);
    }

    Ok(())
}

pub fn run_group_remove_member(
    data_dir: String,
    group: String,
    user: String,
) -> anyhow::Result<()> {
    let (store, _) = init_store(&data_dir)?;
    let group = resolve_group(&store, &group)?;
    let user = resolve_user(&store, &user)?;

    if !store.remove_user_group_relation(&group.id, &user.id)? {
        anyhow::bail!("\"{}\" is not a member of \"{}\"", user.username, group.name);
    }

    println!("Removed \"{}\" from \"{}\"", user.username, group.name);

    Ok(())
}
