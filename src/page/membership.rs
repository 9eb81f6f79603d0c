use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::store::Store;

/// Resolves the groups a user belongs to.
///
/// Implementations must be read-only: repeated calls for the same user
/// within one decision return the same set.
pub trait GroupMembership: Send + Sync {
    fn group_ids_of(&self, user_id: &str) -> Result<BTreeSet<String>>;
}

/// Membership backed by the `user_group_relations` table.
#[derive(Clone)]
pub struct StoreMembership {
    store: Arc<dyn Store>,
}

impl StoreMembership {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl GroupMembership for StoreMembership {
    fn group_ids_of(&self, user_id: &str) -> Result<BTreeSet<String>> {
        Ok(self.store.list_user_group_ids(user_id)?.into_iter().collect())
    }
}
