//! `SourcingEngine`: normalize, schedule, assemble.

use std::sync::Arc;

use tracing::info;

use crate::search::assembler::{ResultAssembler, SearchResponse};
use crate::search::core::config::EngineConfig;
use crate::search::core::errors::SearchResult;
use crate::search::core::query::SearchRequest;
use crate::search::corpus::CorpusStore;
use crate::search::normalizer::QueryNormalizer;
use crate::search::recall::{
    CorpusRecall, ExternalRecall, InternalRecall, NoExternalRecall, WebRecall,
};
use crate::search::scheduler::ThresholdScheduler;
use crate::search::scoring::ScoringEngine;
use crate::web::WebSearchClient;

/// Entry point of the search subsystem. Cheap to share behind an `Arc`.
pub struct SourcingEngine {
    config: EngineConfig,
    normalizer: QueryNormalizer,
    scheduler: ThresholdScheduler,
    assembler: ResultAssembler,
    corpus: Arc<CorpusStore>,
}

impl SourcingEngine {
    /// Build an engine with the corpus scanner and, when enabled, the web provider.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the web client cannot be built.
    pub fn new(config: EngineConfig, corpus: Arc<CorpusStore>) -> SearchResult<Self> {
        config.validate()?;
        let scoring = Arc::new(ScoringEngine::new(config.scoring)?);
        let internal: Arc<dyn InternalRecall> =
            Arc::new(CorpusRecall::new(Arc::clone(&scoring), &config.search));
        let external: Arc<dyn ExternalRecall> = if config.web.enabled {
            let client = WebSearchClient::new(config.web.clone())?;
            Arc::new(WebRecall::new(Arc::new(client)))
        } else {
            Arc::new(NoExternalRecall)
        };
        Self::assemble_parts(config, corpus, scoring, internal, external)
    }

    /// Build an engine over caller-supplied recall providers.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_providers(
        config: EngineConfig,
        corpus: Arc<CorpusStore>,
        internal: Arc<dyn InternalRecall>,
        external: Arc<dyn ExternalRecall>,
    ) -> SearchResult<Self> {
        config.validate()?;
        let scoring = Arc::new(ScoringEngine::new(config.scoring)?);
        Self::assemble_parts(config, corpus, scoring, internal, external)
    }

    fn assemble_parts(
        config: EngineConfig,
        corpus: Arc<CorpusStore>,
        scoring: Arc<ScoringEngine>,
        internal: Arc<dyn InternalRecall>,
        external: Arc<dyn ExternalRecall>,
    ) -> SearchResult<Self> {
        let normalizer = QueryNormalizer::new(config.search.clone())?;
        let scheduler = ThresholdScheduler::new(internal, external, scoring, &config.search);
        Ok(Self {
            config,
            normalizer,
            scheduler,
            assembler: ResultAssembler::new(),
            corpus,
        })
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Corpus store the engine reads from.
    #[must_use]
    pub const fn corpus(&self) -> &Arc<CorpusStore> {
        &self.corpus
    }

    /// Whether the external provider is switched on.
    #[must_use]
    pub fn web_enabled(&self) -> bool {
        self.scheduler.external_enabled()
    }

    /// Run a search.
    ///
    /// Only request validation can fail; provider trouble degrades into warnings.
    ///
    /// # Errors
    /// Returns [`crate::search::SearchError::Validation`] for malformed requests.
    pub async fn search(&self, request: &SearchRequest) -> SearchResult<SearchResponse> {
        let query = Arc::new(self.normalizer.normalize(request)?);
        let snapshot = self.corpus.snapshot();

        let outcome = self.scheduler.run(Arc::clone(&query), snapshot).await;
        let response = self.assembler.assemble(&query, outcome);

        info!(
            q = %query.text,
            items = response.items.len(),
            passes = response.meta.passes.len(),
            elapsed_ms = response.meta.elapsed_ms,
            stop_reason = ?response.meta.stop_reason,
            "Search finished"
        );
        Ok(response)
    }
}
