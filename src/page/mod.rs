//! Page access control and hierarchy operations.

pub mod access;
pub mod bookmark;
pub mod membership;
pub mod options;
pub mod repository;
pub mod rules;
pub mod trash;

pub use access::{can_view, can_view_with_groups};
pub use bookmark::BookmarkService;
pub use membership::{GroupMembership, StoreMembership};
pub use options::ListOptions;
pub use repository::PageRepository;
pub use rules::{is_creatable_name, is_deletable_name};
pub use trash::{from_trash_path, is_trash_path, to_trash_path};
