//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::search::{CorpusLoader, CorpusStore, SourcingEngine};

/// Shared application state.
pub struct AppState {
    /// Search engine.
    pub engine: SourcingEngine,
    /// Source used by `POST /api/corpus/reload`.
    pub loader: Option<Arc<dyn CorpusLoader>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(engine: SourcingEngine, loader: Option<Arc<dyn CorpusLoader>>) -> Arc<Self> {
        Arc::new(Self { engine, loader })
    }

    /// Corpus store behind the engine.
    #[must_use]
    pub const fn corpus(&self) -> &Arc<CorpusStore> {
        self.engine.corpus()
    }
}
