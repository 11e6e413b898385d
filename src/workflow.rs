//! Load-once workflow joining records, users and recommendations.
//!
//! `Workflow::prepare` loads both sources through the shared `RecordCache`,
//! builds the `UserDirectory` and `MetadataIndex`, and stops early with a
//! `WorkflowHalt` when nothing useful can follow. The resulting `Prepared`
//! turns recommendation results into `ArticleCard`s.

use std::fmt;

use tracing::{error, info, warn};

use crate::client::RecommendationClient;
use crate::config::{AppConfig, BackendKind};
use crate::constants::render::{MISSING_TEXT, MISSING_URL};
use crate::data::{ArticleRecord, Identifier};
use crate::directory::UserDirectory;
use crate::errors::{RecommendError, WorkflowHalt};
use crate::ingestion::{RecordCache, RecordLoader};
use crate::metadata::MetadataIndex;
use crate::source::{BlobBackend, FileBackend};

/// One recommended article ready for display.
#[derive(Clone, Debug, PartialEq)]
pub enum ArticleCard {
    /// The article was found in the metadata index.
    Detailed {
        /// Identifier as returned by the endpoint.
        article_id: Identifier,
        /// Indexed metadata.
        record: ArticleRecord,
    },
    /// The endpoint returned an id with no metadata.
    Missing {
        /// Identifier as returned by the endpoint.
        article_id: Identifier,
    },
}

impl ArticleCard {
    /// Identifier as returned by the endpoint.
    pub fn article_id(&self) -> &Identifier {
        match self {
            ArticleCard::Detailed { article_id, .. } | ArticleCard::Missing { article_id } => {
                article_id
            }
        }
    }

    /// Whether metadata was found.
    pub fn is_detailed(&self) -> bool {
        matches!(self, ArticleCard::Detailed { .. })
    }

    /// Title, or `N/A`.
    pub fn title(&self) -> &str {
        self.field(|record| record.title.as_deref(), MISSING_TEXT)
    }

    /// Category, or `N/A`.
    pub fn category(&self) -> &str {
        self.field(|record| record.category.as_deref(), MISSING_TEXT)
    }

    /// Link target, or `#`.
    pub fn url(&self) -> &str {
        self.field(|record| record.url.as_deref(), MISSING_URL)
    }

    fn field<'a>(
        &'a self,
        pick: impl Fn(&'a ArticleRecord) -> Option<&'a str>,
        placeholder: &'static str,
    ) -> &'a str {
        match self {
            ArticleCard::Detailed { record, .. } => pick(record).unwrap_or(placeholder),
            ArticleCard::Missing { .. } => placeholder,
        }
    }
}

impl fmt::Display for ArticleCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleCard::Detailed { .. } => write!(
                f,
                "Title: {}\nCategory: {}\nURL: {}",
                self.title(),
                self.category(),
                self.url()
            ),
            ArticleCard::Missing { article_id } => write!(
                f,
                "Details for article ID {article_id} not found.\nArticle ID: {article_id}"
            ),
        }
    }
}

/// Owns the loader and client for one configuration.
pub struct Workflow {
    config: AppConfig,
    loader: RecordLoader,
    client: RecommendationClient,
    credential_problem: Option<String>,
}

impl Workflow {
    /// Build backends and the client. No source is read until `prepare`.
    pub fn new(config: AppConfig, cache: &RecordCache) -> Self {
        let mut file_backend = FileBackend::new();
        if let Some(dir) = &config.data_dir {
            file_backend = file_backend.with_base_dir(dir);
        }
        let mut loader = RecordLoader::new(cache).with_backend(file_backend);

        let mut credential_problem = None;
        if config.backend == BackendKind::Blob {
            let backend =
                match BlobBackend::from_connection_string(config.storage_connection_string.as_deref())
                {
                    Ok(backend) => backend,
                    Err(err) => {
                        error!("[article_recs:workflow] {}", err);
                        credential_problem = Some(err.to_string());
                        BlobBackend::new(None)
                    }
                };
            loader.register_backend(Box::new(backend.with_timeout(config.client.timeout)));
        }

        Self {
            client: RecommendationClient::new(config.client.clone()),
            config,
            loader,
            credential_problem,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Load both sources (memoized) and build the directory and index.
    pub fn prepare(&self) -> Result<Prepared<'_>, WorkflowHalt> {
        if self.config.backend == BackendKind::Blob {
            if self.config.storage_connection_string.is_none() {
                error!("[article_recs:workflow] storage connection string is not configured");
                return Err(WorkflowHalt::MissingStorageCredential);
            }
            if let Some(problem) = &self.credential_problem {
                return Err(WorkflowHalt::InvalidStorageCredential(problem.clone()));
            }
        }

        let interactions_params = self.config.interactions_params();
        let interactions = self.loader.load_interactions(&interactions_params);
        let directory = UserDirectory::build(interactions.records);
        if directory.is_empty() {
            warn!(
                "[article_recs:workflow] no user ids found or an error occurred loading them; cannot proceed"
            );
            return Err(WorkflowHalt::NoUsers {
                location: interactions_params.location.label(),
            });
        }

        let articles = self.loader.load_articles(&self.config.articles_params());
        let index = MetadataIndex::build_with_policy(articles.records, self.config.duplicate_policy);
        if index.is_empty() {
            warn!(
                "[article_recs:workflow] no article metadata found; recommendations will not show full details"
            );
        }

        info!(
            "[article_recs:workflow] ready with {} user(s) and {} article(s)",
            directory.len(),
            index.len()
        );
        Ok(Prepared {
            directory,
            index,
            client: &self.client,
            default_count: self.config.recommendation_count,
        })
    }

    /// Forget both memoized sources so the next `prepare` re-reads them.
    pub fn reload(&self) {
        let dropped_interactions = self.loader.invalidate(&self.config.interactions_params());
        let dropped_articles = self.loader.invalidate(&self.config.articles_params());
        info!(
            "[article_recs:workflow] reload requested (interactions cached: {}, articles cached: {})",
            dropped_interactions, dropped_articles
        );
    }
}

/// Derived state of one load cycle.
pub struct Prepared<'a> {
    directory: UserDirectory,
    index: MetadataIndex,
    client: &'a RecommendationClient,
    default_count: usize,
}

impl Prepared<'_> {
    /// Selectable users.
    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Article metadata.
    pub fn index(&self) -> &MetadataIndex {
        &self.index
    }

    /// Whether any article metadata was loaded.
    pub fn has_metadata(&self) -> bool {
        !self.index.is_empty()
    }

    /// Configured number of recommendations per request.
    pub fn default_count(&self) -> usize {
        self.default_count
    }

    /// Request `count` recommendations for `user_id` and join them with metadata.
    ///
    /// Cards keep the endpoint's order. An empty vector means the endpoint
    /// returned no recommendations.
    pub fn recommend_cards(
        &self,
        user_id: &Identifier,
        count: usize,
    ) -> Result<Vec<ArticleCard>, RecommendError> {
        let ids = self.client.recommend(user_id, count).inspect_err(|err| {
            error!("[article_recs:workflow] failed to retrieve recommendations: {}", err);
        })?;
        Ok(ids.into_iter().map(|id| self.card_for(id)).collect())
    }

    fn card_for(&self, article_id: Identifier) -> ArticleCard {
        match self.index.get(&article_id) {
            Some(record) => ArticleCard::Detailed {
                record: record.clone(),
                article_id,
            },
            None => {
                warn!(
                    "[article_recs:workflow] details for article ID {} not found",
                    article_id
                );
                ArticleCard::Missing { article_id }
            }
        }
    }
}
