use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::access;
use super::membership::{GroupMembership, StoreMembership};
use super::options::ListOptions;
use super::rules::{is_creatable_name, is_deletable_name};
use super::trash::{from_trash_path, is_trash_path, to_trash_path};
use crate::config::{CollisionPolicy, Config};
use crate::error::{Error, Result};
use crate::store::path::{
    ROOT_PATH, normalize_path, prefix_pattern, strip_trailing_slash, validate_query_prefix,
};
use crate::store::{PageQuery, PathFilter, Store, Visibility};
use crate::types::{Grant, NewPage, Page, PageList, SLACK_CHANNEL_KEY, Viewer};

/// Highest `~<n>` suffix tried before a trash collision is reported.
const MAX_TRASH_SUFFIX: u32 = 1000;

/// Visibility-aware reads and path-rewriting writes over the page store.
#[derive(Clone)]
pub struct PageRepository {
    store: Arc<dyn Store>,
    membership: Arc<dyn GroupMembership>,
    config: Config,
}

impl PageRepository {
    /// Creates a repository resolving group membership from the same store.
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let membership = Arc::new(StoreMembership::new(Arc::clone(&store)));
        Self::with_membership(store, membership, config)
    }

    pub fn with_membership(
        store: Arc<dyn Store>,
        membership: Arc<dyn GroupMembership>,
        config: Config,
    ) -> Self {
        Self {
            store,
            membership,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolves the viewer's groups once for a whole query.
    pub(crate) fn visibility(&self, viewer: &Viewer) -> Result<Visibility> {
        let group_ids = match viewer.user_id() {
            Some(user_id) => self.membership.group_ids_of(user_id)?,
            None => BTreeSet::new(),
        };
        Ok(Visibility::for_viewer(viewer, group_ids))
    }

    pub fn can_view(&self, page: &Page, viewer: &Viewer) -> Result<bool> {
        access::can_view(page, viewer, self.membership.as_ref())
    }

    /// Fetches a page regardless of its grant.
    pub fn find_by_id(&self, id: &str) -> Result<Option<Page>> {
        self.store.get_page(id)
    }

    /// Returns `None` both for missing pages and pages the viewer may not see.
    pub fn find_by_id_and_viewer(&self, id: &str, viewer: &Viewer) -> Result<Option<Page>> {
        match self.store.get_page(id)? {
            Some(page) => self.visible(page, viewer),
            None => Ok(None),
        }
    }

    pub fn find_by_path_and_viewer(&self, path: &str, viewer: &Viewer) -> Result<Option<Page>> {
        match self.store.get_page_by_path(strip_trailing_slash(path))? {
            Some(page) => self.visible(page, viewer),
            None => Ok(None),
        }
    }

    fn visible(&self, page: Page, viewer: &Viewer) -> Result<Option<Page>> {
        Ok(self.can_view(&page, viewer)?.then_some(page))
    }

    /// Lists the page at `prefix` and everything beneath it.
    pub fn find_list_with_descendants(
        &self,
        prefix: &str,
        viewer: &Viewer,
        options: &ListOptions,
    ) -> Result<PageList> {
        validate_query_prefix(prefix)?;
        let base = strip_trailing_slash(prefix);

        let filter = if base == ROOT_PATH {
            PathFilter::All
        } else {
            let escape = options.is_reg_exp_escaped_from_path;
            let descendants = format!("{base}/");
            PathFilter::Prefix {
                exact: Some(base.to_string()),
                pattern: prefix_pattern(&descendants, escape)?,
                range: escape.then_some(descendants),
            }
        };

        self.list(base, filter, viewer, options)
    }

    /// Lists pages whose path starts with the partial pattern `pattern`.
    pub fn find_list_by_start_with(
        &self,
        pattern: &str,
        viewer: &Viewer,
        options: &ListOptions,
    ) -> Result<PageList> {
        validate_query_prefix(pattern)?;
        let base = strip_trailing_slash(pattern);

        let filter = if base == ROOT_PATH {
            PathFilter::All
        } else {
            PathFilter::Prefix {
                exact: Some(base.to_string()),
                pattern: prefix_pattern(base, false)?,
                range: None,
            }
        };

        self.list(base, filter, viewer, options)
    }

    fn list(
        &self,
        base: &str,
        path: PathFilter,
        viewer: &Viewer,
        options: &ListOptions,
    ) -> Result<PageList> {
        let (limit, offset) = options.resolve(&self.config.pagination);
        let query = PageQuery {
            path,
            visibility: self.visibility(viewer)?,
            exclude_trashed: !(options.include_trashed || is_trash_path(base)),
            limit,
            offset,
        };

        let (pages, total_count) = self.store.query_pages(&query)?;
        debug!(prefix = base, %viewer, total_count, returned = pages.len(), "listed pages");

        Ok(PageList {
            pages,
            total_count,
            limit,
            offset,
        })
    }

    /// Creates a page after validating and normalizing its path.
    ///
    /// The name rules run on the path as given, minus surrounding whitespace
    /// and one trailing slash, so normalization cannot turn a rejected path
    /// such as `/a//b` into an accepted one.
    pub fn create(&self, new: NewPage) -> Result<Page> {
        let raw = strip_trailing_slash(new.path.trim());
        if !is_creatable_name(raw) {
            return Err(Error::InvalidPath(format!(
                "Page cannot be created at '{raw}'"
            )));
        }
        let path = normalize_path(raw)?;
        if path == ROOT_PATH {
            return Err(Error::InvalidPath(
                "Page cannot be created at the root".to_string(),
            ));
        }
        if new.grant == Grant::UserGroup && new.granted_group.is_none() {
            return Err(Error::BadRequest(
                "user-group grant requires a granted group".to_string(),
            ));
        }

        let (granted_users, granted_group) =
            grantees(new.grant, new.granted_users, new.granted_group);
        let now = Utc::now();
        let page = Page {
            id: Uuid::new_v4().to_string(),
            path,
            grant: new.grant,
            granted_users,
            granted_group,
            creator: new.creator,
            revision_id: new.revision_id,
            extended: new.extended,
            created_at: now,
            updated_at: now,
        };

        self.store.create_page(&page)?;
        info!(id = %page.id, path = %page.path, grant = %page.grant, "created page");
        Ok(page)
    }

    /// Replaces the grant, its granted users and its granted group together.
    pub fn update_grant(
        &self,
        page: &Page,
        grant: Grant,
        granted_users: BTreeSet<String>,
        granted_group: Option<String>,
    ) -> Result<Page> {
        if grant == Grant::UserGroup && granted_group.is_none() {
            return Err(Error::BadRequest(
                "user-group grant requires a granted group".to_string(),
            ));
        }

        let (granted_users, granted_group) = grantees(grant, granted_users, granted_group);
        self.store
            .update_page_grant(&page.id, grant, &granted_users, granted_group.as_deref())?;
        self.reload(&page.id)
    }

    /// Moves a page into the trash. Already trashed pages are returned as-is.
    pub fn soft_remove(&self, page: &Page) -> Result<Page> {
        self.trash(page, false)
    }

    /// Moves a page and every live descendant into the trash together.
    pub fn soft_remove_with_descendants(&self, page: &Page) -> Result<Page> {
        self.trash(page, true)
    }

    fn trash(&self, page: &Page, subtree: bool) -> Result<Page> {
        if page.is_deleted() {
            return Ok(page.clone());
        }
        if !is_deletable_name(&page.path) {
            return Err(Error::InvalidPath(format!(
                "Page at '{}' cannot be deleted",
                page.path
            )));
        }

        let target = to_trash_path(&page.path);
        match self.config.trash.collision {
            CollisionPolicy::Reject => self.relocate(page, &target, subtree),
            CollisionPolicy::Suffix => {
                match self.relocate(page, &target, subtree) {
                    Err(Error::PathCollision(_)) => {}
                    other => return other,
                }
                for n in 1..=MAX_TRASH_SUFFIX {
                    match self.relocate(page, &format!("{target}~{n}"), subtree) {
                        Err(Error::PathCollision(_)) => continue,
                        other => return other,
                    }
                }
                Err(Error::PathCollision(target))
            }
        }
    }

    /// Moves a trashed page back to its live path.
    pub fn revert(&self, page: &Page) -> Result<Page> {
        self.restore(page, false)
    }

    pub fn revert_with_descendants(&self, page: &Page) -> Result<Page> {
        self.restore(page, true)
    }

    fn restore(&self, page: &Page, subtree: bool) -> Result<Page> {
        if !page.is_deleted() {
            return Ok(page.clone());
        }

        let target = from_trash_path(&page.path);
        if target == ROOT_PATH {
            return Err(Error::InvalidPath("The trash root cannot be reverted".to_string()));
        }
        self.relocate(page, &target, subtree)
    }

    fn relocate(&self, page: &Page, to: &str, subtree: bool) -> Result<Page> {
        let moved = if subtree {
            self.store.rename_page_subtree(&page.id, &page.path, to)
        } else {
            self.store.rename_page(&page.id, &page.path, to).map(|()| 0)
        };

        match moved {
            Ok(descendants) => {
                info!(id = %page.id, from = %page.path, to, descendants, "moved page");
                self.reload(&page.id)
            }
            Err(Error::PathCollision(path)) => {
                warn!(id = %page.id, from = %page.path, to = %path, "destination path is occupied");
                Err(Error::PathCollision(path))
            }
            Err(e) => Err(e),
        }
    }

    /// Sets one key of the page's `extended` document, keeping the others.
    pub fn update_extended(&self, page: &Page, key: &str, value: Value) -> Result<Page> {
        self.store.set_page_extended_field(&page.id, key, &value)?;
        self.reload(&page.id)
    }

    pub fn update_slack_channel(&self, page: &Page, channel: &str) -> Result<Page> {
        self.update_extended(page, SLACK_CHANNEL_KEY, Value::String(channel.to_string()))
    }

    fn reload(&self, id: &str) -> Result<Page> {
        self.store.get_page(id)?.ok_or(Error::NotFound)
    }
}

/// Drops grantees the grant has no use for.
///
/// Owner pages keep their user list even though only the creator can see
/// them, so switching back to restricted or specified restores the old set.
fn grantees(
    grant: Grant,
    users: BTreeSet<String>,
    group: Option<String>,
) -> (BTreeSet<String>, Option<String>) {
    let users = if grant.uses_granted_users() || grant == Grant::Owner {
        users
    } else {
        BTreeSet::new()
    };
    let group = if grant == Grant::UserGroup { group } else { None };
    (users, group)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::store::SqliteStore;

    fn repository(config: Config) -> (TempDir, PageRepository) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, PageRepository::new(Arc::new(store), config))
    }

    fn public(repo: &PageRepository, path: &str) -> Page {
        repo.create(NewPage::new(path, "alice", Grant::Public)).unwrap()
    }

    #[test]
    fn test_create_normalizes_and_validates() {
        let (_temp, repo) = repository(Config::default());

        let page = public(&repo, "/docs/intro/");
        assert_eq!(page.path, "/docs/intro");

        for bad in ["/", "/me", "/_api/x", "/a/edit", "/readme.md"] {
            let result = repo.create(NewPage::new(bad, "alice", Grant::Public));
            assert!(matches!(result, Err(Error::InvalidPath(_))), "{bad}");
        }

        let duplicate = repo.create(NewPage::new("/docs/intro", "bob", Grant::Public));
        assert!(matches!(duplicate, Err(Error::PathCollision(_))));

        let grouped = repo.create(NewPage::new("/g", "alice", Grant::UserGroup));
        assert!(matches!(grouped, Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_create_rejects_paths_normalization_would_repair() {
        let (_temp, repo) = repository(Config::default());

        for bad in [
            "http://demo.example.org/hoge",
            "/https://demo.example.org/hoge",
            "/a//b",
            "//a",
        ] {
            let result = repo.create(NewPage::new(bad, "alice", Grant::Public));
            assert!(matches!(result, Err(Error::InvalidPath(_))), "{bad}");
        }
        assert!(repo.find_by_path_and_viewer("/a/b", &Viewer::Anonymous).unwrap().is_none());
        assert!(
            repo.find_by_path_and_viewer("/https:/demo.example.org/hoge", &Viewer::Anonymous)
                .unwrap()
                .is_none()
        );

        assert_eq!(public(&repo, "  /a/b/ ").path, "/a/b");
    }

    #[test]
    fn test_owner_keeps_granted_users() {
        let (_temp, repo) = repository(Config::default());
        let page = repo
            .create(NewPage::new("/mine", "alice", Grant::Owner).with_granted_users(["bob"]))
            .unwrap();
        assert_eq!(page.granted_users.len(), 1);
        assert!(!repo.can_view(&page, &Viewer::user("bob")).unwrap());
        assert!(repo.can_view(&page, &Viewer::user("alice")).unwrap());
    }

    #[test]
    fn test_unused_grantees_dropped() {
        let (_temp, repo) = repository(Config::default());
        let page = repo
            .create(NewPage::new("/open", "alice", Grant::Public).with_granted_users(["bob"]))
            .unwrap();
        assert!(page.granted_users.is_empty());

        let page = repo
            .update_grant(
                &page,
                Grant::Restricted,
                ["bob".to_string()].into_iter().collect(),
                Some("g1".to_string()),
            )
            .unwrap();
        assert_eq!(page.granted_users.len(), 1);
        assert_eq!(page.granted_group, None);
    }

    #[test]
    fn test_soft_remove_and_revert() {
        let (_temp, repo) = repository(Config::default());
        let page = public(&repo, "/notes");

        let trashed = repo.soft_remove(&page).unwrap();
        assert_eq!(trashed.path, "/trash/notes");
        assert!(trashed.is_deleted());
        assert_eq!(repo.soft_remove(&trashed).unwrap().path, "/trash/notes");

        let restored = repo.revert(&trashed).unwrap();
        assert_eq!(restored.path, "/notes");
        assert_eq!(repo.revert(&restored).unwrap().path, "/notes");
    }

    #[test]
    fn test_user_home_not_deletable() {
        let (_temp, repo) = repository(Config::default());
        let home = public(&repo, "/user/alice");
        assert!(matches!(repo.soft_remove(&home), Err(Error::InvalidPath(_))));

        let nested = public(&repo, "/user/alice/memo");
        assert_eq!(repo.soft_remove(&nested).unwrap().path, "/trash/user/alice/memo");
    }

    #[test]
    fn test_stale_page_is_conflict() {
        let (_temp, repo) = repository(Config::default());
        let page = public(&repo, "/draft");

        repo.soft_remove(&page).unwrap();
        assert!(matches!(repo.soft_remove(&page), Err(Error::Conflict(_))));
    }

    #[test]
    fn test_trash_collision_suffix_policy() {
        let mut config = Config::default();
        config.trash.collision = CollisionPolicy::Suffix;
        let (_temp, repo) = repository(config);

        let first = public(&repo, "/memo");
        assert_eq!(repo.soft_remove(&first).unwrap().path, "/trash/memo");

        let second = public(&repo, "/memo");
        assert_eq!(repo.soft_remove(&second).unwrap().path, "/trash/memo~1");

        let third = public(&repo, "/memo");
        assert_eq!(repo.soft_remove(&third).unwrap().path, "/trash/memo~2");
    }

    #[test]
    fn test_trash_collision_reject_policy() {
        let (_temp, repo) = repository(Config::default());

        let first = public(&repo, "/memo");
        repo.soft_remove(&first).unwrap();

        let second = public(&repo, "/memo");
        assert!(matches!(
            repo.soft_remove(&second),
            Err(Error::PathCollision(path)) if path == "/trash/memo"
        ));
        assert_eq!(repo.find_by_id(&second.id).unwrap().unwrap().path, "/memo");
    }

    #[test]
    fn test_update_extended_and_slack_channel() {
        let (_temp, repo) = repository(Config::default());
        let page = repo
            .create(
                NewPage::new("/page/for/extended", "alice", Grant::Public)
                    .with_extended(json!({"hoge": 1}).as_object().cloned().unwrap()),
            )
            .unwrap();

        let page = repo.update_slack_channel(&page, "general").unwrap();
        assert_eq!(page.slack_channel(), "general");
        assert_eq!(page.extended.get("hoge"), Some(&json!(1)));

        let page = repo.update_extended(&page, "fuga", json!([1, 2])).unwrap();
        assert_eq!(page.extended.len(), 3);
    }

    #[test]
    fn test_find_by_path_hides_invisible_pages() {
        let (_temp, repo) = repository(Config::default());
        repo.create(NewPage::new("/secret", "alice", Grant::Owner))
            .unwrap();

        assert!(
            repo.find_by_path_and_viewer("/secret", &Viewer::user("alice"))
                .unwrap()
                .is_some()
        );
        assert!(
            repo.find_by_path_and_viewer("/secret/", &Viewer::user("bob"))
                .unwrap()
                .is_none()
        );
        assert!(
            repo.find_by_path_and_viewer("/secret", &Viewer::Anonymous)
                .unwrap()
                .is_none()
        );
    }
}
