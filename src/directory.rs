use std::collections::BTreeSet;

use tracing::debug;

use crate::data::{Identifier, InteractionRecord};

/// Distinct user identifiers in ascending natural order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserDirectory {
    users: Vec<Identifier>,
}

impl UserDirectory {
    /// Collect distinct `user_id` values; records without one are dropped.
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = InteractionRecord>,
    {
        let mut seen = BTreeSet::new();
        let mut missing = 0usize;
        for record in records {
            match record.user_id {
                Some(user_id) => {
                    seen.insert(user_id);
                }
                None => missing += 1,
            }
        }
        debug!(
            "[article_recs:directory] {} distinct user(s); dropped {} record(s) without user_id",
            seen.len(),
            missing
        );
        Self {
            users: seen.into_iter().collect(),
        }
    }

    /// Users in presentation order.
    pub fn users(&self) -> &[Identifier] {
        &self.users
    }

    /// Stored identifier equal to `user_id` by canonical form, so `42`
    /// resolves to a stored `"42"` and vice versa.
    pub fn resolve(&self, user_id: &Identifier) -> Option<&Identifier> {
        if let Ok(pos) = self.users.binary_search(user_id) {
            return Some(&self.users[pos]);
        }
        let key = user_id.canonical();
        self.users.iter().find(|stored| stored.canonical() == key)
    }

    /// Whether `user_id` is present, compared by canonical form.
    pub fn contains(&self, user_id: &Identifier) -> bool {
        self.resolve(user_id).is_some()
    }

    /// First user in presentation order, the default selection.
    pub fn first(&self) -> Option<&Identifier> {
        self.users.first()
    }

    /// Returns `true` when no user was found.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Number of distinct users.
    pub fn len(&self) -> usize {
        self.users.len()
    }
}
