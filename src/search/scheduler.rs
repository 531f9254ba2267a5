//! Progressive threshold relaxation over concurrent recall passes.
//!
//! Each pass runs internal and external recall side by side, scores web candidates,
//! keeps the ones at or above the pass threshold and merges them into a single
//! accumulator. Passes are strictly sequential so the accumulator has one writer.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::search::core::candidate::ScoredCandidate;
use crate::search::core::config::SearchConfig;
use crate::search::core::errors::RecallError;
use crate::search::core::query::Query;
use crate::search::corpus::CorpusSnapshot;
use crate::search::dedupe::Deduplicator;
use crate::search::recall::{
    ExternalBatch, ExternalRecall, InternalBatch, InternalRecall, RecallContext, recall_external,
};
use crate::search::scoring::ScoringEngine;

/// Extra time granted to the corpus scan past the request deadline.
const INTERNAL_GRACE: Duration = Duration::from_millis(50);

/// Diagnostics for one pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PassTrace {
    /// 1-based pass number.
    pub pass: usize,
    /// Acceptance threshold of the pass.
    pub threshold: f64,
    /// Candidates returned by all providers.
    pub candidates: usize,
    /// Candidates at or above the threshold.
    pub kept: usize,
    /// Milliseconds since the request started, taken at the end of the pass.
    pub t_ms: u64,
    /// Provider failures and relaxations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Why the scheduler stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Enough unique results were accumulated.
    TargetReached,
    /// The time budget ran out.
    BudgetExhausted,
    /// Every threshold was tried.
    ThresholdsExhausted,
    /// The corpus was empty and no other provider could help.
    CorpusUnavailable,
}

/// Which providers contributed to the result.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ProvidersUsed {
    /// Corpus recall answered at least once.
    pub internal: bool,
    /// The web provider is enabled and answered at least once.
    pub web: bool,
}

/// Everything the scheduler hands to the assembler.
#[derive(Clone, Debug)]
pub struct ScheduleOutcome {
    /// Accepted candidates, best first.
    pub items: Vec<ScoredCandidate>,
    /// One entry per executed pass.
    pub passes: Vec<PassTrace>,
    /// Why the loop ended.
    pub stop_reason: StopReason,
    /// Provider usage.
    pub providers_used: ProvidersUsed,
    /// Candidates seen across all passes, duplicates included.
    pub total_considered: usize,
    /// First threshold of the schedule.
    pub threshold_start: f64,
    /// Threshold of the last executed pass.
    pub threshold_final: f64,
    /// Snapshot version the request ran against.
    pub corpus_version: u64,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// Build the descending threshold schedule `[start, start - step, ..., floor]`.
///
/// A start below the floor yields a single pass at the start value.
#[must_use]
pub fn threshold_schedule(start: f64, step: f64, floor: f64) -> Vec<f64> {
    let mut thresholds = vec![start];
    if step <= 0.0 || start <= floor {
        return thresholds;
    }
    let mut next = start - step;
    while next > floor {
        thresholds.push((next * 100.0).round() / 100.0);
        next -= step;
    }
    thresholds.push(floor);
    thresholds
}

/// Drives recall passes until the target count, the budget or the schedule runs out.
pub struct ThresholdScheduler {
    internal: Arc<dyn InternalRecall>,
    external: Arc<dyn ExternalRecall>,
    scoring: Arc<ScoringEngine>,
    relax_step: f64,
    threshold_floor: f64,
}

impl ThresholdScheduler {
    /// Create a scheduler over the given providers.
    #[must_use]
    pub fn new(
        internal: Arc<dyn InternalRecall>,
        external: Arc<dyn ExternalRecall>,
        scoring: Arc<ScoringEngine>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            internal,
            external,
            scoring,
            relax_step: config.relax_step,
            threshold_floor: config.threshold_floor,
        }
    }

    /// Whether the external provider is switched on.
    #[must_use]
    pub fn external_enabled(&self) -> bool {
        self.external.is_enabled()
    }

    /// Run the pass loop for one request.
    pub async fn run(&self, query: Arc<Query>, snapshot: Arc<CorpusSnapshot>) -> ScheduleOutcome {
        let started = Instant::now();
        let deadline = started + query.time_budget;
        let thresholds = threshold_schedule(query.min_score, self.relax_step, self.threshold_floor);
        let threshold_start = thresholds.first().copied().unwrap_or(query.min_score);

        let mut accepted = Deduplicator::new();
        let mut passes: Vec<PassTrace> = Vec::with_capacity(thresholds.len());
        let mut providers_used = ProvidersUsed::default();
        let mut total_considered = 0;
        let mut country_filter = query.country.clone();
        let mut relaxed_note: Option<String> = None;
        let mut stop_reason = StopReason::ThresholdsExhausted;

        for (index, &threshold) in thresholds.iter().enumerate() {
            if Instant::now() >= deadline {
                stop_reason = StopReason::BudgetExhausted;
                break;
            }

            let pass = index + 1;
            let ctx = RecallContext {
                query: Arc::clone(&query),
                snapshot: Arc::clone(&snapshot),
                country_filter: country_filter.clone(),
                pass,
                deadline,
            };

            let (internal, external) = tokio::join!(
                self.recall_internal(&ctx),
                recall_external(self.external.as_ref(), &ctx)
            );

            let mut notes: Vec<String> = relaxed_note.take().into_iter().collect();
            let mut corpus_unavailable = false;
            let mut ranked: Vec<ScoredCandidate> = Vec::new();

            match internal {
                Ok(batch) => {
                    providers_used.internal = true;
                    if batch.truncated {
                        notes.push(format!(
                            "internal: scan stopped at deadline after {} records",
                            batch.scanned
                        ));
                    }
                    ranked.extend(batch.items);
                }
                Err(RecallError::CorpusUnavailable) => {
                    corpus_unavailable = true;
                    notes.push("internal: corpus unavailable".to_string());
                }
                Err(error) => {
                    warn!(pass, %error, "Internal recall failed");
                    notes.push(format!("internal: {error}"));
                }
            }

            let ExternalBatch {
                candidates,
                note,
                succeeded,
            } = external;
            providers_used.web |= succeeded && self.external.is_enabled();
            notes.extend(note);
            ranked.extend(
                candidates
                    .into_iter()
                    .map(|candidate| self.scoring.score_candidate(candidate, &query)),
            );

            let seen = ranked.len();
            total_considered += seen;
            let mut kept = 0;
            for (rank, candidate) in ranked.into_iter().enumerate() {
                if candidate.score >= threshold {
                    kept += 1;
                    accepted.merge(candidate.accepted_in(pass, rank));
                }
            }

            let t_ms = elapsed_ms(started);
            debug!(
                pass,
                threshold,
                candidates = seen,
                kept,
                unique = accepted.len(),
                t_ms,
                "Pass finished"
            );
            passes.push(PassTrace {
                pass,
                threshold,
                candidates: seen,
                kept,
                t_ms,
                notes,
            });

            if accepted.len() >= query.target_count {
                stop_reason = StopReason::TargetReached;
                break;
            }
            if corpus_unavailable && !self.external.is_enabled() {
                stop_reason = StopReason::CorpusUnavailable;
                break;
            }
            if pass == 1 {
                if let Some(country) = country_filter.take() {
                    relaxed_note = Some(format!("country filter {country} relaxed"));
                }
            }
        }

        if stop_reason == StopReason::ThresholdsExhausted && passes.len() < thresholds.len() {
            stop_reason = StopReason::BudgetExhausted;
        }

        let threshold_final = passes.last().map_or(threshold_start, |p| p.threshold);
        ScheduleOutcome {
            items: accepted.into_sorted(),
            passes,
            stop_reason,
            providers_used,
            total_considered,
            threshold_start,
            threshold_final,
            corpus_version: snapshot.version(),
            elapsed: started.elapsed(),
        }
    }

    async fn recall_internal(&self, ctx: &RecallContext) -> Result<InternalBatch, RecallError> {
        let allowed = ctx.remaining() + INTERNAL_GRACE;
        match tokio::time::timeout(allowed, self.internal.recall(ctx)).await {
            Ok(result) => result,
            Err(_) => Err(RecallError::Timeout(
                u64::try_from(allowed.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
