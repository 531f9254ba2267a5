//! Corpus scan recall.

use std::sync::Arc;

use tracing::debug;

use super::{InternalRecall, RecallContext, RecallFuture};
use crate::search::core::candidate::ScoredCandidate;
use crate::search::core::config::SearchConfig;
use crate::search::core::errors::RecallError;
use crate::search::dedupe::normalize_component;
use crate::search::scoring::ScoringEngine;

/// Result of one corpus scan.
#[derive(Clone, Debug, Default)]
pub struct InternalBatch {
    /// Scored candidates, best first, capped at the scan ceiling.
    pub items: Vec<ScoredCandidate>,
    /// Records examined before the scan finished or hit the deadline.
    pub scanned: usize,
    /// Whether the deadline cut the scan short.
    pub truncated: bool,
}

/// Scores every record of the request's snapshot on the blocking pool.
#[derive(Clone, Debug)]
pub struct CorpusRecall {
    scoring: Arc<ScoringEngine>,
    scan_ceiling: usize,
    deadline_check_every: usize,
}

impl CorpusRecall {
    /// Create a corpus recall provider.
    #[must_use]
    pub fn new(scoring: Arc<ScoringEngine>, config: &SearchConfig) -> Self {
        Self {
            scoring,
            scan_ceiling: config.scan_ceiling.max(1),
            deadline_check_every: config.deadline_check_every.max(1),
        }
    }

    fn scan(&self, ctx: &RecallContext) -> InternalBatch {
        let deadline = ctx.deadline.into_std();
        let wanted_country = ctx.country_filter.as_deref().map(normalize_component);
        let mut batch = InternalBatch::default();

        for (index, candidate) in ctx.snapshot.candidates().iter().enumerate() {
            if index % self.deadline_check_every == 0 && std::time::Instant::now() >= deadline {
                batch.truncated = true;
                break;
            }
            batch.scanned += 1;

            if let Some(wanted) = wanted_country.as_deref() {
                if normalize_component(&candidate.country) != wanted {
                    continue;
                }
            }

            batch
                .items
                .push(self.scoring.score_candidate(candidate.clone(), &ctx.query));
        }

        // Stable sort keeps corpus order among equal scores.
        batch.items.sort_by(|a, b| b.score.total_cmp(&a.score));
        batch.items.truncate(self.scan_ceiling);
        batch
    }
}

impl InternalRecall for CorpusRecall {
    fn recall<'a>(
        &'a self,
        ctx: &'a RecallContext,
    ) -> RecallFuture<'a, Result<InternalBatch, RecallError>> {
        Box::pin(async move {
            if ctx.snapshot.is_empty() {
                return Err(RecallError::CorpusUnavailable);
            }

            let this = self.clone();
            let owned = ctx.clone();
            let batch = tokio::task::spawn_blocking(move || this.scan(&owned))
                .await
                .map_err(|e| RecallError::Task(e.to_string()))?;

            debug!(
                pass = ctx.pass,
                scanned = batch.scanned,
                returned = batch.items.len(),
                truncated = batch.truncated,
                "Corpus scan finished"
            );
            Ok(batch)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::search::core::config::ScoringWeights;
    use crate::search::core::query::SearchRequest;
    use crate::search::corpus::CorpusSnapshot;
    use crate::search::corpus::tests::record;
    use crate::search::normalizer::QueryNormalizer;

    fn context(snapshot: CorpusSnapshot, request: &SearchRequest, deadline: Instant) -> RecallContext {
        let normalizer = QueryNormalizer::new(SearchConfig::default()).unwrap();
        let query = normalizer.normalize(request).unwrap();
        RecallContext {
            country_filter: query.country.clone(),
            query: Arc::new(query),
            snapshot: Arc::new(snapshot),
            pass: 1,
            deadline,
        }
    }

    fn provider(config: &SearchConfig) -> CorpusRecall {
        let scoring = Arc::new(ScoringEngine::new(ScoringWeights::default()).unwrap());
        CorpusRecall::new(scoring, config)
    }

    #[tokio::test]
    async fn test_recall_sorts_and_filters_by_country() {
        let snapshot = CorpusSnapshot::from_records(
            &[
                record("Hanoi Denim", "Vietnam", "jeans"),
                record("Acme Knits", "Vietnam", "hoodie"),
                record("Shenzhen Hoodies", "China", "hoodie"),
            ],
            1,
            "test",
        );
        let request = SearchRequest::new("hoodie").with_country("Vietnam");
        let ctx = context(snapshot, &request, Instant::now() + Duration::from_secs(5));

        let batch = provider(&SearchConfig::default()).recall(&ctx).await.unwrap();

        assert_eq!(batch.scanned, 3);
        assert!(!batch.truncated);
        let names: Vec<&str> = batch.items.iter().map(|c| c.candidate.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Knits", "Hanoi Denim"]);
    }

    #[tokio::test]
    async fn test_recall_caps_at_scan_ceiling() {
        let records: Vec<_> = (0..10)
            .map(|i| record(&format!("Factory {i}"), "Vietnam", "hoodie"))
            .collect();
        let snapshot = CorpusSnapshot::from_records(&records, 1, "test");
        let ctx = context(
            snapshot,
            &SearchRequest::new("hoodie"),
            Instant::now() + Duration::from_secs(5),
        );
        let config = SearchConfig {
            scan_ceiling: 3,
            ..SearchConfig::default()
        };

        let batch = provider(&config).recall(&ctx).await.unwrap();

        assert_eq!(batch.items.len(), 3);
        assert_eq!(batch.items[0].candidate.name, "Factory 0");
    }

    #[tokio::test]
    async fn test_recall_returns_partial_on_deadline() {
        let snapshot =
            CorpusSnapshot::from_records(&[record("Acme Knits", "Vietnam", "hoodie")], 1, "test");
        let ctx = context(snapshot, &SearchRequest::new("hoodie"), Instant::now());

        let batch = provider(&SearchConfig::default()).recall(&ctx).await.unwrap();

        assert!(batch.truncated);
        assert!(batch.items.is_empty());
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_unavailable() {
        let ctx = context(
            CorpusSnapshot::empty(),
            &SearchRequest::new("hoodie"),
            Instant::now() + Duration::from_secs(5),
        );

        let result = provider(&SearchConfig::default()).recall(&ctx).await;
        assert!(matches!(result, Err(RecallError::CorpusUnavailable)));
    }
}
