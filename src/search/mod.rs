//! Progressive multi-source supplier search.
//!
//! ```text
//! SearchRequest -> QueryNormalizer -> ThresholdScheduler -> ResultAssembler -> SearchResponse
//!                                        |  per pass, concurrently:
//!                                        |    CorpusRecall (scored corpus scan)
//!                                        |    WebRecall    (unscored, sub-timeout)
//!                                        +-> ScoringEngine -> Deduplicator
//! ```

pub mod assembler;
pub mod core;
pub mod corpus;
pub mod dedupe;
pub mod engine;
pub mod normalizer;
pub mod recall;
pub mod scheduler;
pub mod scoring;

pub use assembler::{ResultAssembler, ResultItem, ResultMeta, SearchResponse};
pub use core::{
    Candidate, CorpusConfig, CorpusError, Customization, EngineConfig, Provenance, Query,
    RecallError, ScoreBreakdown, ScoredCandidate, ScoringWeights, SearchConfig, SearchError,
    SearchRequest, SearchResult, SourceKind,
};
pub use corpus::{
    CorpusLoader, CorpusRefresher, CorpusSnapshot, CorpusStats, CorpusStore, JsonFileLoader,
    SupplierRecord,
};
pub use dedupe::Deduplicator;
pub use engine::SourcingEngine;
pub use normalizer::QueryNormalizer;
pub use scheduler::{PassTrace, ProvidersUsed, StopReason, ThresholdScheduler};
pub use scoring::ScoringEngine;
