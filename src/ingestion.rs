use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::data::{ArticleRecord, InteractionRecord};
use crate::errors::SourceError;
use crate::source::format::{decode_rows, rows_into_records};
use crate::source::{SourceBackend, SourceParams};

/// Decoded rows of one source as held by the cache.
///
/// A failed load is memoized too: empty `rows` plus the `failure`.
#[derive(Clone, Debug)]
pub struct CachedRows {
    /// Rows in source order.
    pub rows: Arc<Vec<Value>>,
    /// Malformed lines dropped while decoding.
    pub skipped: usize,
    /// Source-level failure of the load that produced this entry.
    pub failure: Option<Arc<SourceError>>,
}

impl CachedRows {
    /// Entry for a successfully decoded source.
    pub fn loaded(rows: Vec<Value>, skipped: usize) -> Self {
        Self {
            rows: Arc::new(rows),
            skipped,
            failure: None,
        }
    }

    /// Entry for a load that degraded to empty.
    pub fn failed(failure: SourceError) -> Self {
        Self {
            rows: Arc::new(Vec::new()),
            skipped: 0,
            failure: Some(Arc::new(failure)),
        }
    }
}

/// In-memory memo of decoded sources keyed by exact `SourceParams`.
///
/// Cloning yields another handle to the same storage. Entries are written
/// once per distinct params, failed loads included, and replaced only after
/// `invalidate` or `clear`.
#[derive(Clone, Default)]
pub struct RecordCache {
    inner: Arc<RwLock<HashMap<SourceParams, CachedRows>>>,
}

impl RecordCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached rows for `params`, if any.
    pub fn get(&self, params: &SourceParams) -> Option<CachedRows> {
        let inner = self.inner.read().expect("record cache poisoned");
        inner.get(params).cloned()
    }

    /// Store rows for `params`, replacing any previous entry.
    pub fn insert(&self, params: SourceParams, rows: CachedRows) {
        let mut inner = self.inner.write().expect("record cache poisoned");
        inner.insert(params, rows);
    }

    /// Drop the entry for `params`. Returns `true` when one existed.
    pub fn invalidate(&self, params: &SourceParams) -> bool {
        let mut inner = self.inner.write().expect("record cache poisoned");
        inner.remove(params).is_some()
    }

    /// Remove all cached entries.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("record cache poisoned");
        inner.clear();
    }

    /// Whether `params` currently has an entry.
    pub fn contains(&self, params: &SourceParams) -> bool {
        let inner = self.inner.read().expect("record cache poisoned");
        inner.contains_key(params)
    }

    /// Returns `true` when the cache has no entries.
    pub fn is_empty(&self) -> bool {
        let inner = self.inner.read().expect("record cache poisoned");
        inner.is_empty()
    }

    /// Return the number of cached sources.
    pub fn len(&self) -> usize {
        let inner = self.inner.read().expect("record cache poisoned");
        inner.len()
    }
}

/// Outcome of one `RecordLoader::load_records` call.
///
/// A failed load carries an empty `records` list and the failure; it is never
/// returned as an `Err`.
#[derive(Debug)]
pub struct LoadReport<T> {
    /// Decoded records in source order.
    pub records: Vec<T>,
    /// Lines or rows dropped because they were malformed or mis-shaped.
    pub skipped: usize,
    /// Source-level failure, when the load degraded to empty.
    pub failure: Option<Arc<SourceError>>,
    /// Whether the rows came from the cache.
    pub from_cache: bool,
}

impl<T> LoadReport<T> {
    /// Returns `true` when the source was read without a source-level failure.
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

/// Reads sources through registered backends and memoizes decoded rows.
pub struct RecordLoader {
    cache: RecordCache,
    backends: Vec<Box<dyn SourceBackend>>,
}

impl RecordLoader {
    /// Create a loader over `cache` with no backends registered.
    pub fn new(cache: &RecordCache) -> Self {
        Self {
            cache: cache.clone(),
            backends: Vec::new(),
        }
    }

    /// Register a backend (builder form).
    pub fn with_backend(mut self, backend: impl SourceBackend + 'static) -> Self {
        self.register_backend(Box::new(backend));
        self
    }

    /// Register a backend. Earlier registrations win when several support a location.
    pub fn register_backend(&mut self, backend: Box<dyn SourceBackend>) {
        debug!("[article_recs:loader] registered backend '{}'", backend.id());
        self.backends.push(backend);
    }

    /// The cache this loader memoizes into.
    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// Load and decode records of type `T`, degrading to empty on failure.
    pub fn load_records<T: DeserializeOwned>(&self, params: &SourceParams) -> LoadReport<T> {
        let label = params.location.label();
        let (cached, from_cache) = self.fetch_rows(params);
        if let Some(failure) = cached.failure {
            return LoadReport {
                records: Vec::new(),
                skipped: 0,
                failure: Some(failure),
                from_cache,
            };
        }
        let (records, mismatched) = rows_into_records::<T>(&cached.rows, &label);
        let skipped = cached.skipped + mismatched;
        if skipped > 0 {
            warn!(
                "[article_recs:loader] {} skipped {} malformed record(s)",
                label, skipped
            );
        }
        LoadReport {
            records,
            skipped,
            failure: None,
            from_cache,
        }
    }

    /// Load user-interaction records.
    pub fn load_interactions(&self, params: &SourceParams) -> LoadReport<InteractionRecord> {
        self.load_records(params)
    }

    /// Load article-metadata records.
    pub fn load_articles(&self, params: &SourceParams) -> LoadReport<ArticleRecord> {
        self.load_records(params)
    }

    /// Drop the memoized rows for `params` so the next load re-reads the source.
    pub fn invalidate(&self, params: &SourceParams) -> bool {
        self.cache.invalidate(params)
    }

    /// Drop every memoized source.
    pub fn clear(&self) {
        self.cache.clear();
    }

    fn fetch_rows(&self, params: &SourceParams) -> (CachedRows, bool) {
        if let Some(cached) = self.cache.get(params) {
            match &cached.failure {
                Some(failure) => warn!(
                    "[article_recs:loader] serving memoized failure for {}: {}",
                    params.location, failure
                ),
                None => debug!(
                    "[article_recs:loader] cache hit for {} ({})",
                    params.location, params.format
                ),
            }
            return (cached, true);
        }
        let cached = match self.read_rows(params) {
            Ok(cached) => cached,
            Err(err) => {
                error!(
                    "[article_recs:loader] failed loading {}: {}",
                    params.location, err
                );
                CachedRows::failed(err)
            }
        };
        self.cache.insert(params.clone(), cached.clone());
        (cached, false)
    }

    fn read_rows(&self, params: &SourceParams) -> Result<CachedRows, SourceError> {
        let backend = self
            .backends
            .iter()
            .find(|backend| backend.supports(&params.location))
            .ok_or_else(|| SourceError::NoBackend {
                location: params.location.label(),
            })?;
        info!(
            "[article_recs:loader] reading {} via '{}' as {}",
            params.location,
            backend.id(),
            params.format
        );
        let text = backend.read(&params.location)?;
        let decoded = decode_rows(&text, params.format, &params.location.label())?;
        info!(
            "[article_recs:loader] loaded {} row(s) from {}",
            decoded.rows.len(),
            params.location
        );
        Ok(CachedRows::loaded(decoded.rows, decoded.skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Identifier;
    use crate::source::{FileBackend, RecordFormat, SourceLocation};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedBackend {
        body: Result<String, ()>,
        reads: Arc<AtomicUsize>,
    }

    impl SourceBackend for ScriptedBackend {
        fn id(&self) -> &str {
            "scripted"
        }

        fn supports(&self, _location: &SourceLocation) -> bool {
            true
        }

        fn read(&self, location: &SourceLocation) -> Result<String, SourceError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.body.clone().map_err(|_| SourceError::NotFound {
                location: location.label(),
            })
        }
    }

    fn scripted(body: Result<&str, ()>) -> (ScriptedBackend, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        (
            ScriptedBackend {
                body: body.map(str::to_string),
                reads: reads.clone(),
            },
            reads,
        )
    }

    fn params() -> SourceParams {
        SourceParams::new(SourceLocation::local("users.json"), RecordFormat::JsonLines)
    }

    #[test]
    fn second_load_with_same_params_is_served_from_cache() {
        let cache = RecordCache::new();
        let (backend, reads) = scripted(Ok("{\"user_id\": 1}\n{\"user_id\": 2}\n"));
        let loader = RecordLoader::new(&cache).with_backend(backend);

        let first = loader.load_interactions(&params());
        let second = loader.load_interactions(&params());

        assert_eq!(first.records.len(), 2);
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(second.records, first.records);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&params()));
    }

    #[test]
    fn different_format_is_a_separate_cache_entry() {
        let cache = RecordCache::new();
        let (backend, reads) = scripted(Ok("{\"user_id\": 1}"));
        let loader = RecordLoader::new(&cache).with_backend(backend);

        loader.load_interactions(&params());
        let as_json = SourceParams::new(SourceLocation::local("users.json"), RecordFormat::Json);
        let report = loader.load_interactions(&as_json);

        assert_eq!(report.records.len(), 1);
        assert_eq!(reads.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_forces_a_reread() {
        let cache = RecordCache::new();
        let (backend, reads) = scripted(Ok("{\"user_id\": 1}"));
        let loader = RecordLoader::new(&cache).with_backend(backend);

        loader.load_interactions(&params());
        assert!(loader.invalidate(&params()));
        assert!(!loader.invalidate(&params()));
        let report = loader.load_interactions(&params());

        assert!(!report.from_cache);
        assert_eq!(reads.load(Ordering::SeqCst), 2);

        loader.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn failures_degrade_to_empty_and_are_memoized() {
        let cache = RecordCache::new();
        let (backend, reads) = scripted(Err(()));
        let loader = RecordLoader::new(&cache).with_backend(backend);

        let report = loader.load_interactions(&params());
        assert!(report.records.is_empty());
        assert!(!report.is_ok());
        assert!(!report.from_cache);
        assert!(matches!(
            report.failure.as_deref(),
            Some(SourceError::NotFound { .. })
        ));

        let again = loader.load_interactions(&params());
        assert!(again.from_cache);
        assert!(again.records.is_empty());
        assert!(matches!(
            again.failure.as_deref(),
            Some(SourceError::NotFound { .. })
        ));
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&params()));

        assert!(loader.invalidate(&params()));
        loader.load_interactions(&params());
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_backend_is_reported_not_raised() {
        let cache = RecordCache::new();
        let loader = RecordLoader::new(&cache).with_backend(FileBackend::new());
        let report = loader.load_articles(&SourceParams::new(
            SourceLocation::blob("data", "articles.json"),
            RecordFormat::Json,
        ));
        assert!(report.records.is_empty());
        assert!(matches!(
            report.failure.as_deref(),
            Some(SourceError::NoBackend { .. })
        ));
    }

    #[test]
    fn skipped_counts_cover_bad_lines_and_bad_shapes() {
        let cache = RecordCache::new();
        let (backend, _) = scripted(Ok(
            "{\"user_id\": 1}\nnot json\n\"plain string\"\n{\"user_id\": \"u\"}\n",
        ));
        let loader = RecordLoader::new(&cache).with_backend(backend);

        let report = loader.load_interactions(&params());
        assert!(report.is_ok());
        assert_eq!(report.skipped, 2);
        assert_eq!(
            report
                .records
                .into_iter()
                .filter_map(|record| record.user_id)
                .collect::<Vec<_>>(),
            vec![Identifier::from(1), Identifier::from("u")]
        );
    }

    #[test]
    fn cache_handles_share_storage() {
        let cache = RecordCache::new();
        let other = cache.clone();
        cache.insert(
            params(),
            CachedRows::loaded(vec![serde_json::json!({"user_id": 5})], 0),
        );
        assert_eq!(other.len(), 1);
        assert_eq!(other.get(&params()).unwrap().rows.len(), 1);
    }
}
