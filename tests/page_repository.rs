//! Library-level tests for listings, visibility and trash moves.
//!
//! Each test opens its own SQLite database in a temp directory.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use pagewarden::config::{CollisionPolicy, Config};
use pagewarden::error::Error;
use pagewarden::page::{ListOptions, PageRepository};
use pagewarden::store::{SqliteStore, Store};
use pagewarden::types::{Grant, NewPage, Page, User, UserGroup, UserGroupRelation, Viewer};
use serde_json::json;
use tempfile::TempDir;

struct Fixture {
    _temp: TempDir,
    pages: PageRepository,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(Config::default())
    }

    fn with_config(config: Config) -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp.path().join("pages.db")).expect("open store");
        store.initialize().expect("initialize schema");
        Self {
            _temp: temp,
            pages: PageRepository::new(Arc::new(store), config),
        }
    }

    fn store(&self) -> &dyn Store {
        self.pages.store().as_ref()
    }

    fn page(&self, path: &str, grant: Grant, creator: &str) -> Page {
        self.pages
            .create(NewPage::new(path, creator, grant))
            .expect("create page")
    }

    fn public(&self, path: &str) -> Page {
        self.page(path, Grant::Public, "anyone")
    }

    fn group_with(&self, name: &str, members: &[&str]) -> String {
        let group = UserGroup {
            id: format!("{name}-id"),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.store().create_user_group(&group).unwrap();
        for member in members {
            if self.store().get_user(member).unwrap().is_none() {
                self.store()
                    .create_user(&User {
                        id: member.to_string(),
                        username: member.to_string(),
                        created_at: Utc::now(),
                    })
                    .unwrap();
            }
            self.store()
                .add_user_group_relation(&UserGroupRelation {
                    group_id: group.id.clone(),
                    user_id: member.to_string(),
                    created_at: Utc::now(),
                })
                .unwrap();
        }
        group.id
    }

    fn seed_hierarchy(&self) {
        self.pages
            .create(
                NewPage::new("/page/for/extended", "anyone", Grant::Public)
                    .with_extended(json!({"hoge": 1}).as_object().cloned().unwrap()),
            )
            .expect("create extended page");
        for path in ["/page1", "/page1/child1", "/page2", "/other"] {
            self.public(path);
        }
    }
}

fn defaults() -> ListOptions {
    ListOptions::default()
}

#[test]
fn test_descendants_include_the_page_itself() {
    let f = Fixture::new();
    f.seed_hierarchy();

    let list = f
        .pages
        .find_list_with_descendants("/page1/", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(list.paths(), vec!["/page1", "/page1/child1"]);
    assert_eq!(list.total_count, 2);

    let list = f
        .pages
        .find_list_with_descendants("/page/", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(list.paths(), vec!["/page/for/extended"]);
}

#[test]
fn test_descendants_do_not_match_sibling_prefixes() {
    let f = Fixture::new();
    f.public("/a");
    f.public("/a/b");
    f.public("/ab");
    f.public("/a-b");

    let list = f
        .pages
        .find_list_with_descendants("/a", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(list.paths(), vec!["/a", "/a/b"]);
}

#[test]
fn test_descendants_escape_metacharacters_by_default() {
    let f = Fixture::new();
    f.public("/notes (draft)");
    f.public("/notes (draft)/one");
    f.public("/notes d/two");

    let list = f
        .pages
        .find_list_with_descendants("/notes (draft)/", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(list.paths(), vec!["/notes (draft)", "/notes (draft)/one"]);
}

#[test]
fn test_descendants_unescaped_prefix_is_a_pattern() {
    let f = Fixture::new();
    f.seed_hierarchy();

    let options = defaults().unescaped();
    let list = f
        .pages
        .find_list_with_descendants("/page\\d/", &Viewer::Anonymous, &options)
        .unwrap();
    assert_eq!(list.paths(), vec!["/page1/child1"]);

    let invalid = f
        .pages
        .find_list_with_descendants("/page(/", &Viewer::Anonymous, &options);
    assert!(matches!(invalid, Err(Error::InvalidPath(_))));
}

#[test]
fn test_root_lists_every_live_page() {
    let f = Fixture::new();
    f.seed_hierarchy();

    let list = f
        .pages
        .find_list_with_descendants("/", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(list.total_count, 5);
}

#[test]
fn test_start_with_treats_argument_as_pattern() {
    let f = Fixture::new();
    f.seed_hierarchy();

    let list = f
        .pages
        .find_list_by_start_with("/page", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(list.total_count, 4);

    let list = f
        .pages
        .find_list_by_start_with("/page\\d{1}/", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(list.paths(), vec!["/page1", "/page1/child1", "/page2"]);
}

#[test]
fn test_start_with_invalid_pattern_fails_before_query() {
    let f = Fixture::new();
    let result = f
        .pages
        .find_list_by_start_with("/page[", &Viewer::Anonymous, &defaults());
    assert!(matches!(result, Err(Error::InvalidPath(_))));

    let result = f
        .pages
        .find_list_by_start_with("page", &Viewer::Anonymous, &defaults());
    assert!(matches!(result, Err(Error::InvalidPath(_))));
}

#[test]
fn test_listings_filter_by_grant() {
    let f = Fixture::new();
    let group = f.group_with("editors", &["gina"]);

    f.page("/grant/public", Grant::Public, "olive");
    f.pages
        .create(
            NewPage::new("/grant/restricted", "olive", Grant::Restricted)
                .with_granted_users(["rita"]),
        )
        .unwrap();
    f.pages
        .create(
            NewPage::new("/grant/specified", "olive", Grant::Specified)
                .with_granted_users(["sam"]),
        )
        .unwrap();
    f.page("/grant/owner", Grant::Owner, "olive");
    f.pages
        .create(NewPage::new("/grant/group", "olive", Grant::UserGroup).with_granted_group(&group))
        .unwrap();

    let paths = |viewer: Viewer| -> Vec<String> {
        f.pages
            .find_list_with_descendants("/grant", &viewer, &defaults())
            .unwrap()
            .pages
            .into_iter()
            .map(|p| p.path)
            .collect()
    };

    assert_eq!(paths(Viewer::Anonymous), vec!["/grant/public"]);
    assert_eq!(paths(Viewer::user("olive")).len(), 5);
    assert_eq!(
        paths(Viewer::user("rita")),
        vec!["/grant/public", "/grant/restricted"]
    );
    assert_eq!(
        paths(Viewer::user("sam")),
        vec!["/grant/public", "/grant/specified"]
    );
    assert_eq!(
        paths(Viewer::user("gina")),
        vec!["/grant/group", "/grant/public"]
    );
    assert_eq!(paths(Viewer::user("nobody")), vec!["/grant/public"]);
}

#[test]
fn test_listing_visibility_agrees_with_evaluator() {
    let f = Fixture::new();
    let group = f.group_with("team", &["gina"]);

    let mut pages = vec![
        f.page("/x/public", Grant::Public, "olive"),
        f.page("/x/owner", Grant::Owner, "olive"),
    ];
    pages.push(
        f.pages
            .create(NewPage::new("/x/restricted", "olive", Grant::Restricted).with_granted_users(["gina"]))
            .unwrap(),
    );
    pages.push(
        f.pages
            .create(NewPage::new("/x/group", "olive", Grant::UserGroup).with_granted_group(&group))
            .unwrap(),
    );

    for viewer in [
        Viewer::Anonymous,
        Viewer::user("olive"),
        Viewer::user("gina"),
        Viewer::user("nobody"),
    ] {
        let listed: BTreeSet<String> = f
            .pages
            .find_list_with_descendants("/x", &viewer, &defaults())
            .unwrap()
            .pages
            .into_iter()
            .map(|p| p.path)
            .collect();
        let expected: BTreeSet<String> = pages
            .iter()
            .filter(|p| f.pages.can_view(p, &viewer).unwrap())
            .map(|p| p.path.clone())
            .collect();
        assert_eq!(listed, expected, "{viewer}");
    }
}

#[test]
fn test_find_by_id_hides_invisible_pages() {
    let f = Fixture::new();
    let page = f.page("/secret", Grant::Owner, "olive");

    assert!(f.pages.find_by_id_and_viewer(&page.id, &Viewer::user("olive")).unwrap().is_some());
    assert!(f.pages.find_by_id_and_viewer(&page.id, &Viewer::user("bob")).unwrap().is_none());
    assert!(f.pages.find_by_id_and_viewer(&page.id, &Viewer::Anonymous).unwrap().is_none());
    assert!(f.pages.find_by_id_and_viewer("missing", &Viewer::user("olive")).unwrap().is_none());
    assert!(f.pages.find_by_id(&page.id).unwrap().is_some());
}

#[test]
fn test_group_membership_changes_take_effect() {
    let f = Fixture::new();
    let group = f.group_with("team", &["gina"]);
    let page = f
        .pages
        .create(NewPage::new("/team/plan", "olive", Grant::UserGroup).with_granted_group(&group))
        .unwrap();

    assert!(f.pages.can_view(&page, &Viewer::user("gina")).unwrap());

    f.store().remove_user_group_relation(&group, "gina").unwrap();
    assert!(!f.pages.can_view(&page, &Viewer::user("gina")).unwrap());
    assert!(
        f.pages
            .find_by_id_and_viewer(&page.id, &Viewer::user("gina"))
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_pagination_counts_before_slicing() {
    let f = Fixture::new();
    for i in 0..10 {
        f.public(&format!("/paged/{i:02}"));
    }

    let list = f
        .pages
        .find_list_with_descendants("/paged", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(list.total_count, 10);
    assert_eq!(list.pages.len(), 10);
    assert_eq!(list.limit, 50);

    let options = defaults().with_limit(3).with_offset(3);
    let list = f
        .pages
        .find_list_with_descendants("/paged", &Viewer::Anonymous, &options)
        .unwrap();
    assert_eq!(list.paths(), vec!["/paged/03", "/paged/04", "/paged/05"]);
    assert_eq!(list.total_count, 10);

    let beyond = defaults().with_offset(20);
    let list = f
        .pages
        .find_list_with_descendants("/paged", &Viewer::Anonymous, &beyond)
        .unwrap();
    assert!(list.pages.is_empty());
    assert_eq!(list.total_count, 10);
}

#[test]
fn test_pagination_counts_only_visible_pages() {
    let f = Fixture::new();
    for i in 0..4 {
        f.page(&format!("/mixed/public{i}"), Grant::Public, "olive");
        f.page(&format!("/mixed/owner{i}"), Grant::Owner, "olive");
    }

    let options = defaults().with_limit(2);
    let list = f
        .pages
        .find_list_with_descendants("/mixed", &Viewer::user("bob"), &options)
        .unwrap();
    assert_eq!(list.total_count, 4);
    assert_eq!(list.pages.len(), 2);
    assert!(list.pages.iter().all(|p| p.grant == Grant::Public));
}

#[test]
fn test_trashed_pages_are_excluded_unless_requested() {
    let f = Fixture::new();
    let doomed = f.public("/docs/old");
    f.public("/docs/new");
    f.pages.soft_remove(&doomed).unwrap();

    let list = f
        .pages
        .find_list_with_descendants("/", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(list.paths(), vec!["/docs/new"]);

    let list = f
        .pages
        .find_list_with_descendants("/", &Viewer::Anonymous, &defaults().including_trashed())
        .unwrap();
    assert_eq!(list.paths(), vec!["/docs/new", "/trash/docs/old"]);

    let list = f
        .pages
        .find_list_with_descendants("/trash", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(list.paths(), vec!["/trash/docs/old"]);
}

#[test]
fn test_soft_remove_frees_the_original_path() {
    let f = Fixture::new();
    let page = f.public("/reuse");

    let trashed = f.pages.soft_remove(&page).unwrap();
    assert_eq!(trashed.path, "/trash/reuse");
    assert_eq!(trashed.id, page.id);

    let replacement = f.public("/reuse");
    assert_ne!(replacement.id, page.id);

    let revert = f.pages.revert(&trashed);
    assert!(matches!(revert, Err(Error::PathCollision(path)) if path == "/reuse"));
}

#[test]
fn test_subtree_moves_into_and_out_of_trash() {
    let f = Fixture::new();
    let root = f.public("/project");
    f.public("/project/spec");
    f.public("/project/spec/v2");
    f.public("/projects");

    let trashed = f.pages.soft_remove_with_descendants(&root).unwrap();
    assert_eq!(trashed.path, "/trash/project");

    let live = f
        .pages
        .find_list_with_descendants("/", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(live.paths(), vec!["/projects"]);

    let restored = f.pages.revert_with_descendants(&trashed).unwrap();
    assert_eq!(restored.path, "/project");

    let list = f
        .pages
        .find_list_with_descendants("/project", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(
        list.paths(),
        vec!["/project", "/project/spec", "/project/spec/v2"]
    );
}

#[test]
fn test_suffix_policy_keeps_every_trashed_copy() {
    let mut config = Config::default();
    config.trash.collision = CollisionPolicy::Suffix;
    let f = Fixture::with_config(config);

    for _ in 0..3 {
        let page = f.public("/scratch");
        f.pages.soft_remove(&page).unwrap();
    }

    let list = f
        .pages
        .find_list_by_start_with("/trash/scratch", &Viewer::Anonymous, &defaults())
        .unwrap();
    assert_eq!(
        list.paths(),
        vec!["/trash/scratch", "/trash/scratch~1", "/trash/scratch~2"]
    );
}

#[test]
fn test_update_extended_merges_keys() {
    let f = Fixture::new();
    f.seed_hierarchy();
    let page = f
        .pages
        .find_by_path_and_viewer("/page/for/extended", &Viewer::Anonymous)
        .unwrap()
        .unwrap();
    assert_eq!(page.extended.get("hoge"), Some(&json!(1)));

    let updated = f.pages.update_slack_channel(&page, "#general").unwrap();
    assert_eq!(updated.slack_channel(), "#general");

    let stored = f.pages.find_by_id(&page.id).unwrap().unwrap();
    assert_eq!(stored.extended.get("hoge"), Some(&json!(1)));
    assert_eq!(stored.extended.get("slack"), Some(&json!("#general")));
    assert_eq!(stored.extended.len(), 2);

    let updated = f.pages.update_slack_channel(&stored, "#random").unwrap();
    assert_eq!(updated.slack_channel(), "#random");
    assert_eq!(updated.extended.get("hoge"), Some(&json!(1)));
}

#[test]
fn test_stale_page_cannot_be_moved_twice() {
    let f = Fixture::new();
    let page = f.public("/race");
    let first = f.pages.clone();
    let second = f.pages.clone();

    first.soft_remove(&page).unwrap();
    let lost = second.soft_remove(&page);
    assert!(matches!(lost, Err(Error::Conflict(_))));
    assert_eq!(f.pages.find_by_id(&page.id).unwrap().unwrap().path, "/trash/race");
}
