//! Final response assembly: truncation, reasoning strings and diagnostics.

use serde::Serialize;

use crate::search::core::candidate::{ScoreBreakdown, ScoredCandidate, SourceKind};
use crate::search::core::query::Query;
use crate::search::scheduler::{PassTrace, ProvidersUsed, ScheduleOutcome, StopReason};

/// One ranked supplier in the response.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultItem {
    /// Supplier name.
    pub name: String,
    /// Supplier country.
    pub country: String,
    /// Total score, 0-100.
    pub score: f64,
    /// Sub-scores.
    pub breakdown: ScoreBreakdown,
    /// Short human-readable explanation.
    pub reasoning: String,
    /// Where the supplier came from.
    pub source: SourceKind,
    /// Supplier URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Minimum order quantity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moq: Option<u32>,
    /// Typical lead time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<u32>,
}

/// Diagnostics attached to every response.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultMeta {
    /// Wall-clock time spent on the request.
    pub elapsed_ms: u64,
    /// Per-pass trace.
    pub passes: Vec<PassTrace>,
    /// Provider usage.
    pub providers_used: ProvidersUsed,
    /// First acceptance threshold.
    pub threshold_start: f64,
    /// Threshold of the last pass run.
    pub threshold_final: f64,
    /// Candidates seen across all passes.
    pub total_considered: usize,
    /// Why the scheduler stopped.
    pub stop_reason: StopReason,
    /// Corpus snapshot version used.
    pub corpus_version: u64,
    /// Set when results are missing, incomplete or below `min_score`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Search response body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResponse {
    /// Ranked suppliers, best first.
    pub items: Vec<ResultItem>,
    /// Diagnostics.
    pub meta: ResultMeta,
}

/// Builds the immutable response from a scheduler outcome.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResultAssembler;

impl ResultAssembler {
    /// Create an assembler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Truncate to the target count, explain each item and attach diagnostics.
    #[must_use]
    pub fn assemble(&self, query: &Query, outcome: ScheduleOutcome) -> SearchResponse {
        let warning = warning(query, &outcome);
        let items: Vec<ResultItem> = outcome
            .items
            .into_iter()
            .take(query.target_count)
            .map(to_item)
            .collect();

        SearchResponse {
            items,
            meta: ResultMeta {
                elapsed_ms: u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
                passes: outcome.passes,
                providers_used: outcome.providers_used,
                threshold_start: outcome.threshold_start,
                threshold_final: outcome.threshold_final,
                total_considered: outcome.total_considered,
                stop_reason: outcome.stop_reason,
                corpus_version: outcome.corpus_version,
                warning,
            },
        }
    }
}

fn to_item(scored: ScoredCandidate) -> ResultItem {
    let reasoning = reasoning(&scored.breakdown);
    let source = scored.candidate.source();
    let candidate = scored.candidate;
    ResultItem {
        name: candidate.name,
        country: candidate.country,
        score: scored.score,
        breakdown: scored.breakdown,
        reasoning,
        source,
        url: candidate.url,
        moq: candidate.moq,
        lead_time_days: candidate.lead_time_days,
    }
}

/// Explain a breakdown in a short sentence list.
#[must_use]
pub fn reasoning(breakdown: &ScoreBreakdown) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(5);

    parts.push(
        if breakdown.country >= 100.0 {
            "country match"
        } else if breakdown.country >= 70.0 {
            "no country preference"
        } else {
            "different country"
        }
        .to_string(),
    );
    parts.push(
        if breakdown.product >= 100.0 {
            "exact category match"
        } else if breakdown.product >= 80.0 {
            "related category"
        } else {
            "category not matched"
        }
        .to_string(),
    );
    parts.push(format!("{:.0}% of query terms found", breakdown.text));

    if breakdown.customization >= 100.0 {
        parts.push("offers customization".to_string());
    } else if breakdown.customization <= 0.0 {
        parts.push("customization not confirmed".to_string());
    }

    if breakdown.quantity >= 100.0 {
        parts.push("quantity meets MOQ".to_string());
    } else if breakdown.quantity < 50.0 {
        parts.push("quantity below MOQ".to_string());
    }

    parts.join("; ")
}

fn warning(query: &Query, outcome: &ScheduleOutcome) -> Option<String> {
    let mut warnings: Vec<String> = Vec::new();

    if outcome.items.is_empty() {
        if outcome.stop_reason == StopReason::CorpusUnavailable
            || (!outcome.providers_used.internal && !outcome.providers_used.web)
        {
            warnings.push("supplier corpus unavailable; no results".to_string());
        } else {
            warnings.push("no supplier matched the query".to_string());
        }
    } else if outcome
        .items
        .first()
        .is_some_and(|best| best.score < query.min_score)
    {
        warnings.push(format!(
            "no supplier reached min_score {}; showing results down to threshold {}",
            query.min_score, outcome.threshold_final
        ));
    }

    if outcome.stop_reason == StopReason::BudgetExhausted {
        warnings.push(format!(
            "time budget of {} ms exhausted after {} pass(es); results may be incomplete",
            query.time_budget_ms(),
            outcome.passes.len()
        ));
    }

    (!warnings.is_empty()).then(|| warnings.join("; "))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::search::core::config::SearchConfig;
    use crate::search::core::query::SearchRequest;
    use crate::search::dedupe::tests::scored;
    use crate::search::normalizer::QueryNormalizer;

    fn query(request: &SearchRequest) -> Query {
        QueryNormalizer::new(SearchConfig::default())
            .unwrap()
            .normalize(request)
            .unwrap()
    }

    fn outcome(items: Vec<ScoredCandidate>, stop_reason: StopReason) -> ScheduleOutcome {
        ScheduleOutcome {
            items,
            passes: Vec::new(),
            stop_reason,
            providers_used: ProvidersUsed {
                internal: true,
                web: false,
            },
            total_considered: 0,
            threshold_start: 80.0,
            threshold_final: 50.0,
            corpus_version: 1,
            elapsed: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_truncates_to_target_count() {
        let q = query(&SearchRequest::new("hoodie").with_target_count(2));
        let items = vec![
            scored("A", "Vietnam", None, 95.0),
            scored("B", "Vietnam", None, 90.0),
            scored("C", "Vietnam", None, 85.0),
        ];

        let response =
            ResultAssembler::new().assemble(&q, outcome(items, StopReason::TargetReached));

        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[0].name, "A");
        assert_eq!(response.meta.elapsed_ms, 12);
        assert!(response.meta.warning.is_none());
    }

    #[test]
    fn test_warns_when_below_min_score() {
        let q = query(&SearchRequest::new("hoodie").with_min_score(95.0));
        let items = vec![scored("A", "Vietnam", None, 70.0)];

        let response =
            ResultAssembler::new().assemble(&q, outcome(items, StopReason::ThresholdsExhausted));

        let warning = response.meta.warning.unwrap();
        assert!(warning.contains("min_score 95"));
    }

    #[test]
    fn test_warns_on_empty_corpus() {
        let q = query(&SearchRequest::new("xyzzznonsense"));
        let mut empty = outcome(Vec::new(), StopReason::CorpusUnavailable);
        empty.providers_used.internal = false;

        let response = ResultAssembler::new().assemble(&q, empty);

        assert!(response.items.is_empty());
        assert!(response.meta.warning.unwrap().contains("corpus unavailable"));
    }

    #[test]
    fn test_warnings_are_joined() {
        let q = query(&SearchRequest::new("hoodie").with_min_score(95.0));
        let items = vec![scored("A", "Vietnam", None, 70.0)];

        let response =
            ResultAssembler::new().assemble(&q, outcome(items, StopReason::BudgetExhausted));

        let warning = response.meta.warning.unwrap();
        assert!(warning.contains("; time budget of 12000 ms exhausted"));
    }

    #[test]
    fn test_reasoning() {
        let breakdown = ScoreBreakdown {
            country: 100.0,
            product: 80.0,
            text: 50.0,
            customization: 0.0,
            quantity: 20.0,
        };
        assert_eq!(
            reasoning(&breakdown),
            "country match; related category; 50% of query terms found; \
             customization not confirmed; quantity below MOQ"
        );
    }

    #[test]
    fn test_item_serialization_skips_missing_fields() {
        let q = query(&SearchRequest::new("hoodie"));
        let response = ResultAssembler::new().assemble(
            &q,
            outcome(vec![scored("A", "Vietnam", None, 90.0)], StopReason::TargetReached),
        );

        let json = serde_json::to_value(&response).unwrap();
        let item = &json["items"][0];
        assert_eq!(item["source"], "internal");
        assert!(item.get("url").is_none());
        assert_eq!(json["meta"]["stop_reason"], "target_reached");
        assert!(json["meta"].get("warning").is_none());
    }
}
