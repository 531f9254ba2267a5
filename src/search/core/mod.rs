//! Core search types, configuration, and errors.

pub mod candidate;
pub mod config;
pub mod errors;
pub mod query;

pub use candidate::{Candidate, Provenance, ScoreBreakdown, ScoredCandidate, SourceKind};
pub use config::{CorpusConfig, EngineConfig, ScoringWeights, SearchConfig};
pub use errors::{CorpusError, RecallError, SearchError, SearchResult};
pub use query::{Customization, Query, SearchRequest};
