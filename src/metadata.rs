use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::debug;

use crate::data::{ArticleRecord, Identifier};
use crate::types::CanonicalId;

/// How repeated `article_id` values are resolved while building the index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Later records replace earlier ones.
    #[default]
    LastWins,
    /// The first record for an id is kept; later ones are ignored.
    FirstWins,
}

/// Article metadata keyed by canonical article id.
///
/// Built once per load cycle and read-only afterwards. Keys keep the order in
/// which ids were first seen.
#[derive(Clone, Debug, Default)]
pub struct MetadataIndex {
    entries: IndexMap<CanonicalId, ArticleRecord>,
}

impl MetadataIndex {
    /// Build with the default `LastWins` policy.
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ArticleRecord>,
    {
        Self::build_with_policy(records, DuplicatePolicy::default())
    }

    /// Build with an explicit duplicate policy.
    ///
    /// Records without `article_id` are dropped.
    pub fn build_with_policy<I>(records: I, policy: DuplicatePolicy) -> Self
    where
        I: IntoIterator<Item = ArticleRecord>,
    {
        let mut entries = IndexMap::new();
        let mut missing_id = 0usize;
        let mut duplicates = 0usize;
        for record in records {
            let Some(key) = record.article_id.as_ref().map(Identifier::canonical) else {
                missing_id += 1;
                continue;
            };
            match entries.entry(key) {
                Entry::Vacant(entry) => {
                    entry.insert(record);
                }
                Entry::Occupied(mut entry) => {
                    duplicates += 1;
                    if policy == DuplicatePolicy::LastWins {
                        entry.insert(record);
                    }
                }
            }
        }
        debug!(
            "[article_recs:metadata] indexed {} article(s); dropped {} without id; {} duplicate id(s) resolved {:?}",
            entries.len(),
            missing_id,
            duplicates,
            policy
        );
        Self { entries }
    }

    /// Look up an article by identifier (numeric and string forms are equivalent).
    pub fn get(&self, article_id: &Identifier) -> Option<&ArticleRecord> {
        self.entries.get(&article_id.canonical())
    }

    /// Look up an article by its canonical string id.
    pub fn get_str(&self, canonical_id: &str) -> Option<&ArticleRecord> {
        self.entries.get(canonical_id)
    }

    /// Canonical ids in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns `true` when no article was indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of indexed articles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
