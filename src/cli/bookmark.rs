use serde::Serialize;

use crate::page::{BookmarkService, ListOptions};
use crate::types::Viewer;

use super::init_repository;
use super::pickers::{resolve_page, resolve_user};

#[derive(Serialize)]
struct BookmarkOutput {
    page_id: String,
    path: String,
    created_at: String,
}

#[derive(Serialize)]
struct BookmarkListOutput {
    bookmarks: Vec<BookmarkOutput>,
    total_count: u64,
    limit: u32,
    offset: u32,
}

pub fn run_bookmark_add(data_dir: String, path: String, user: String) -> anyhow::Result<()> {
    let pages = init_repository(&data_dir)?;
    let user = resolve_user(pages.store().as_ref(), &user)?;
    let page = resolve_page(pages.store().as_ref(), &path)?;

    let bookmarks = BookmarkService::new(pages);
    match bookmarks.add(&page.id, &Viewer::user(user.id))? {
        Some(_) => println!("Bookmarked {} for \"{}\"", page.path, user.username),
        None => anyhow::bail!("Page '{}' not found", path),
    }

    Ok(())
}

pub fn run_bookmark_remove(data_dir: String, path: String, user: String) -> anyhow::Result<()> {
    let pages = init_repository(&data_dir)?;
    let user = resolve_user(pages.store().as_ref(), &user)?;
    let page = resolve_page(pages.store().as_ref(), &path)?;

    let bookmarks = BookmarkService::new(pages);
    if !bookmarks.remove(&page.id, &user.id)? {
        anyhow::bail!("\"{}\" has not bookmarked {}", user.username, page.path);
    }
    println!("Removed bookmark on {} for \"{}\"", page.path, user.username);

    Ok(())
}

pub fn run_bookmark_list(
    data_dir: String,
    user: String,
    limit: Option<String>,
    offset: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let pages = init_repository(&data_dir)?;
    let user = resolve_user(pages.store().as_ref(), &user)?;
    let options = ListOptions::parse(limit.as_deref(), offset.as_deref())?;

    let bookmarks = BookmarkService::new(pages.clone());
    let list = bookmarks.list_for_user(&user.id, &options)?;

    let mut outputs = Vec::with_capacity(list.bookmarks.len());
    for bookmark in list.bookmarks {
        let path = pages
            .find_by_id(&bookmark.page_id)?
            .map(|p| p.path)
            .unwrap_or_default();
        outputs.push(BookmarkOutput {
            page_id: bookmark.page_id,
            path,
            created_at: bookmark.created_at.to_rfc3339(),
        });
    }

    if json {
        let output = BookmarkListOutput {
            bookmarks: outputs,
            total_count: list.total_count,
            limit: list.limit,
            offset: list.offset,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if outputs.is_empty() {
        println!("No bookmarks found.");
        return Ok(());
    }
    for bookmark in &outputs {
        println!("{}", bookmark.path);
    }

    Ok(())
}
