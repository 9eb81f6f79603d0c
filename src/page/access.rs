use std::collections::BTreeSet;

use super::membership::GroupMembership;
use crate::error::Result;
use crate::types::{Grant, Page, Viewer};

/// Returns true if `viewer` may see `page`.
///
/// Group membership is only resolved for `UserGroup` pages whose creator is
/// not the viewer.
pub fn can_view(page: &Page, viewer: &Viewer, membership: &dyn GroupMembership) -> Result<bool> {
    let Some(user_id) = viewer.user_id() else {
        return Ok(page.grant == Grant::Public);
    };

    match page.grant {
        Grant::UserGroup if !page.is_creator(user_id) => {
            let Some(group) = page.granted_group.as_deref() else {
                return Ok(false);
            };
            Ok(membership.group_ids_of(user_id)?.contains(group))
        }
        _ => Ok(can_view_with_groups(page, viewer, &BTreeSet::new())),
    }
}

/// Decides visibility against an already resolved set of group ids.
pub fn can_view_with_groups(page: &Page, viewer: &Viewer, group_ids: &BTreeSet<String>) -> bool {
    let Some(user_id) = viewer.user_id() else {
        return page.grant == Grant::Public;
    };

    match page.grant {
        Grant::Public => true,
        Grant::Restricted | Grant::Specified => {
            page.is_creator(user_id) || page.granted_users.contains(user_id)
        }
        Grant::Owner => page.is_creator(user_id),
        Grant::UserGroup => {
            page.is_creator(user_id)
                || page
                    .granted_group
                    .as_ref()
                    .is_some_and(|group| group_ids.contains(group))
        }
    }
}
