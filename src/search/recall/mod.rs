//! Candidate generation.
//!
//! The scheduler drives one [`InternalRecall`] and one [`ExternalRecall`] per pass. Both are
//! object-safe traits returning boxed futures so tests can swap in scripted providers.

pub mod external;
pub mod internal;

pub use external::{ExternalBatch, WebRecall, recall_external};
pub use internal::{CorpusRecall, InternalBatch};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::search::core::candidate::Candidate;
use crate::search::core::errors::RecallError;
use crate::search::core::query::Query;
use crate::search::corpus::CorpusSnapshot;

/// Boxed future type for recall providers.
pub type RecallFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything a provider needs for one pass.
#[derive(Clone, Debug)]
pub struct RecallContext {
    /// Normalized query, shared by every pass.
    pub query: Arc<Query>,
    /// Snapshot acquired when the request started.
    pub snapshot: Arc<CorpusSnapshot>,
    /// Country restriction for this pass; cleared once relaxed.
    pub country_filter: Option<String>,
    /// 1-based pass number.
    pub pass: usize,
    /// Shared request deadline.
    pub deadline: Instant,
}

impl RecallContext {
    /// Time left before the request deadline.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Scans the corpus snapshot and returns already scored candidates.
pub trait InternalRecall: Send + Sync {
    /// Run one recall.
    fn recall<'a>(
        &'a self,
        ctx: &'a RecallContext,
    ) -> RecallFuture<'a, Result<InternalBatch, RecallError>>;
}

/// Asks an external capability for unscored candidates.
pub trait ExternalRecall: Send + Sync {
    /// Provider name used in diagnostics.
    fn name(&self) -> &str;

    /// Whether the provider is switched on.
    fn is_enabled(&self) -> bool;

    /// The provider's own sub-timeout.
    fn timeout(&self) -> Duration;

    /// Run one recall.
    fn recall<'a>(
        &'a self,
        ctx: &'a RecallContext,
    ) -> RecallFuture<'a, Result<Vec<Candidate>, RecallError>>;
}

/// External provider that is never enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoExternalRecall;

impl ExternalRecall for NoExternalRecall {
    fn name(&self) -> &str {
        "none"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn timeout(&self) -> Duration {
        Duration::ZERO
    }

    fn recall<'a>(
        &'a self,
        _ctx: &'a RecallContext,
    ) -> RecallFuture<'a, Result<Vec<Candidate>, RecallError>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}
