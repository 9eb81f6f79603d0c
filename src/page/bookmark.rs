use chrono::Utc;

use super::options::ListOptions;
use super::repository::PageRepository;
use crate::error::Result;
use crate::types::{Bookmark, BookmarkList, Viewer};

/// Per-user bookmarks on pages the user can see.
#[derive(Clone)]
pub struct BookmarkService {
    pages: PageRepository,
}

impl BookmarkService {
    pub fn new(pages: PageRepository) -> Self {
        Self { pages }
    }

    /// Bookmarks a page for the viewer.
    ///
    /// Returns `None` for anonymous viewers and for pages the viewer cannot
    /// see. Adding the same bookmark twice keeps the first one.
    pub fn add(&self, page_id: &str, viewer: &Viewer) -> Result<Option<Bookmark>> {
        let Some(user_id) = viewer.user_id() else {
            return Ok(None);
        };
        if self.pages.find_by_id_and_viewer(page_id, viewer)?.is_none() {
            return Ok(None);
        }

        let store = self.pages.store();
        let added = store.add_bookmark(&Bookmark {
            page_id: page_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        })?;
        if added {
            tracing::debug!(page_id, user_id, "added bookmark");
        }

        store.get_bookmark(page_id, user_id)
    }

    pub fn remove(&self, page_id: &str, user_id: &str) -> Result<bool> {
        self.pages.store().delete_bookmark(page_id, user_id)
    }

    pub fn find(&self, page_id: &str, user_id: &str) -> Result<Option<Bookmark>> {
        self.pages.store().get_bookmark(page_id, user_id)
    }

    /// Lists the user's bookmarks, skipping pages they can no longer see.
    pub fn list_for_user(&self, user_id: &str, options: &ListOptions) -> Result<BookmarkList> {
        let (limit, offset) = options.resolve(&self.pages.config().pagination);
        let visibility = self.pages.visibility(&Viewer::user(user_id))?;

        let (bookmarks, total_count) =
            self.pages
                .store()
                .query_bookmarks(user_id, &visibility, limit, offset)?;

        Ok(BookmarkList {
            bookmarks,
            total_count,
            limit,
            offset,
        })
    }
}
