use std::collections::BTreeSet;

use serde_json::Value;

use crate::page::{ListOptions, PageRepository};
use crate::store::Store;
use crate::types::{Grant, NewPage, Page, PageList};

use super::init_repository;
use super::pickers::{
    confirm_action, display_user, resolve_group, resolve_page, resolve_user, resolve_viewer,
};

fn parse_grant(raw: &str) -> anyhow::Result<Grant> {
    Grant::parse(raw).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown grant '{}'. Expected one of: public, restricted, specified, owner, user-group",
            raw
        )
    })
}

/// Resolves usernames and a group name into the ids stored on a page.
fn resolve_grantees(
    store: &dyn Store,
    users: &[String],
    group: Option<&str>,
) -> anyhow::Result<(BTreeSet<String>, Option<String>)> {
    let mut user_ids = BTreeSet::new();
    for username in users {
        user_ids.insert(resolve_user(store, username)?.id);
    }
    let group_id = match group {
        Some(name) => Some(resolve_group(store, name)?.id),
        None => None,
    };
    Ok((user_ids, group_id))
}

fn print_page(store: &dyn Store, page: &Page) {
    println!("{}", page.path);
    println!("  id:       {}", page.id);
    println!("  grant:    {}", page.grant);
    println!("  creator:  {}", display_user(store, &page.creator));
    if !page.granted_users.is_empty() {
        let users: Vec<String> = page
            .granted_users
            .iter()
            .map(|id| display_user(store, id))
            .collect();
        println!("  users:    {}", users.join(", "));
    }
    if let Some(group) = &page.granted_group {
        let name = store
            .get_user_group(group)
            .ok()
            .flatten()
            .map(|g| g.name)
            .unwrap_or_else(|| group.clone());
        println!("  group:    {name}");
    }
    if !page.extended.is_empty() {
        println!("  extended: {}", Value::Object(page.extended.clone()));
    }
}

pub fn run_page_create(
    data_dir: String,
    path: String,
    creator: String,
    grant: String,
    users: Vec<String>,
    group: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let pages = init_repository(&data_dir)?;
    let store = pages.store().as_ref();

    let grant = parse_grant(&grant)?;
    let creator = resolve_user(store, &creator)?;
    let (granted_users, granted_group) = resolve_grantees(store, &users, group.as_deref())?;

    let mut new = NewPage::new(path, creator.id, grant).with_granted_users(granted_users);
    if let Some(group_id) = granted_group {
        new = new.with_granted_group(group_id);
    }

    let page = pages.create(new)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        println!("Created page {} ({})", page.path, page.grant);
    }

    Ok(())
}

pub fn run_page_show(
    data_dir: String,
    path: String,
    as_user: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let pages = init_repository(&data_dir)?;
    let store = pages.store().as_ref();
    let viewer = resolve_viewer(store, as_user.as_deref())?;

    let Some(page) = pages.find_by_path_and_viewer(&path, &viewer)? else {
        anyhow::bail!("Page '{}' not found", path);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print_page(store, &page);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn run_page_list(
    data_dir: String,
    prefix: String,
    as_user: Option<String>,
    start_with: bool,
    regex: bool,
    include_trashed: bool,
    limit: Option<String>,
    offset: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let pages = init_repository(&data_dir)?;
    let viewer = resolve_viewer(pages.store().as_ref(), as_user.as_deref())?;

    let mut options = ListOptions::parse(limit.as_deref(), offset.as_deref())?;
    if regex {
        options = options.unescaped();
    }
    if include_trashed {
        options = options.including_trashed();
    }

    let list = if start_with {
        pages.find_list_by_start_with(&prefix, &viewer, &options)?
    } else {
        pages.find_list_with_descendants(&prefix, &viewer, &options)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else {
        print_list(&list);
    }

    Ok(())
}

fn print_list(list: &PageList) {
    if list.pages.is_empty() {
        println!("No pages found.");
        return;
    }
    for page in &list.pages {
        println!("{}  [{}]", page.path, page.grant);
    }
    println!();
    println!(
        "{} of {} (offset {}, limit {})",
        list.pages.len(),
        list.total_count,
        list.offset,
        list.limit
    );
}

pub fn run_page_remove(
    data_dir: String,
    path: String,
    recursive: bool,
    yes: bool,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let pages = init_repository(&data_dir)?;
    let page = resolve_page(pages.store().as_ref(), &path)?;

    let what = if recursive {
        format!("{} and its descendants", page.path)
    } else {
        page.path.clone()
    };
    if !confirm_action(&format!("Move {what} to the trash?"), yes, non_interactive)? {
        println!("Cancelled.");
        return Ok(());
    }

    let trashed = remove(&pages, &page, recursive)?;
    println!("Moved {} to {}", page.path, trashed.path);

    Ok(())
}

fn remove(pages: &PageRepository, page: &Page, recursive: bool) -> crate::error::Result<Page> {
    if recursive {
        pages.soft_remove_with_descendants(page)
    } else {
        pages.soft_remove(page)
    }
}

pub fn run_page_revert(data_dir: String, path: String, recursive: bool) -> anyhow::Result<()> {
    let pages = init_repository(&data_dir)?;
    let page = resolve_page(pages.store().as_ref(), &path)?;

    if !page.is_deleted() {
        anyhow::bail!("Page '{}' is not in the trash", page.path);
    }

    let restored = if recursive {
        pages.revert_with_descendants(&page)?
    } else {
        pages.revert(&page)?
    };
    println!("Restored {} to {}", page.path, restored.path);

    Ok(())
}

pub fn run_page_extend(
    data_dir: String,
    path: String,
    key: String,
    value: String,
) -> anyhow::Result<()> {
    let pages = init_repository(&data_dir)?;
    let page = resolve_page(pages.store().as_ref(), &path)?;

    let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
    let page = pages.update_extended(&page, &key, value)?;

    println!("{}", Value::Object(page.extended));

    Ok(())
}

pub fn run_page_grant(
    data_dir: String,
    path: String,
    grant: String,
    users: Vec<String>,
    group: Option<String>,
) -> anyhow::Result<()> {
    let pages = init_repository(&data_dir)?;
    let store = pages.store().as_ref();
    let page = resolve_page(store, &path)?;

    let grant = parse_grant(&grant)?;
    let (granted_users, granted_group) = resolve_grantees(store, &users, group.as_deref())?;

    let page = pages.update_grant(&page, grant, granted_users, granted_group)?;
    println!("Set grant of {} to {}", page.path, page.grant);

    Ok(())
}
