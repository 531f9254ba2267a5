//! Supplier candidates produced by recall providers.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Coarse origin of a candidate.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// In-memory supplier corpus.
    Internal,
    /// External web search.
    Web,
}

impl SourceKind {
    /// Wire name of the source.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Web => "web",
        }
    }
}

/// Source-specific provenance of a candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Provenance {
    /// Corpus record.
    Internal {
        /// Corpus record identifier.
        record_id: String,
    },
    /// Web search hit.
    Web {
        /// Engine that returned the hit.
        engine: String,
        /// 1-based position in the engine's result list.
        position: usize,
    },
}

impl Provenance {
    /// Coarse origin of this provenance.
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::Internal { .. } => SourceKind::Internal,
            Self::Web { .. } => SourceKind::Web,
        }
    }
}

/// A supplier candidate in the common shape shared by all sources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Where the candidate came from.
    pub provenance: Provenance,
    /// Normalized `name|country|city` key.
    pub identity_key: String,
    /// Supplier name.
    pub name: String,
    /// Supplier country, empty when unknown.
    pub country: String,
    /// Supplier city.
    pub city: Option<String>,
    /// Product categories offered.
    pub product_types: Vec<String>,
    /// Materials worked with.
    pub materials: Vec<String>,
    /// Free-text description or snippet.
    pub description: String,
    /// Whether the supplier offers customization; `None` when unknown.
    pub customization: Option<bool>,
    /// Minimum order quantity.
    pub moq: Option<u32>,
    /// Typical lead time.
    pub lead_time_days: Option<u32>,
    /// Supplier or listing URL.
    pub url: Option<String>,
    /// Free-form tags.
    pub tags: BTreeSet<String>,
    /// Whether the supplier has been verified.
    pub verified: bool,
    /// Source-specific extras.
    pub extras: BTreeMap<String, serde_json::Value>,
    /// Original payload kept for provenance.
    pub raw: serde_json::Value,
}

impl Candidate {
    /// Coarse origin of the candidate.
    #[must_use]
    pub const fn source(&self) -> SourceKind {
        self.provenance.kind()
    }
}

/// Per-dimension sub-scores, each within 0-100.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Country match.
    pub country: f64,
    /// Product/category match.
    pub product: f64,
    /// Free-text similarity.
    pub text: f64,
    /// Customization fit.
    pub customization: f64,
    /// Quantity/MOQ fit.
    pub quantity: f64,
}

/// A candidate with its score. Built once by the scoring engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredCandidate {
    /// The scored candidate.
    pub candidate: Candidate,
    /// Weighted total, 0-100, two decimals.
    pub score: f64,
    /// Sub-scores behind the total.
    pub breakdown: ScoreBreakdown,
    /// Pass in which the candidate was first accepted (0 before acceptance).
    pub pass: usize,
    /// Position within that pass's combined recall order.
    pub recall_rank: usize,
}

impl ScoredCandidate {
    /// Identity key of the underlying candidate.
    #[must_use]
    pub fn identity_key(&self) -> &str {
        &self.candidate.identity_key
    }

    /// Copy tagged with the pass and recall position it was accepted in.
    #[must_use]
    pub fn accepted_in(mut self, pass: usize, recall_rank: usize) -> Self {
        self.pass = pass;
        self.recall_rank = recall_rank;
        self
    }
}
