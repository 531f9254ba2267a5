//! Weighted multi-factor supplier scoring.

use std::collections::BTreeSet;

use crate::search::core::candidate::{Candidate, ScoreBreakdown, ScoredCandidate};
use crate::search::core::config::ScoringWeights;
use crate::search::core::errors::SearchResult;
use crate::search::core::query::{Customization, Query};
use crate::search::dedupe::normalize_component;
use crate::search::normalizer::{Tokenizer, synonyms};

/// Country sub-score for an exact match.
const COUNTRY_MATCH: f64 = 100.0;
/// Country sub-score when the buyer wants another country.
const COUNTRY_MISMATCH: f64 = 20.0;
/// Country sub-score when the buyer has no preference.
const COUNTRY_ANY: f64 = 70.0;
/// Product sub-score for an exact category hit.
const PRODUCT_EXACT: f64 = 100.0;
/// Product sub-score for partial term overlap.
const PRODUCT_PARTIAL: f64 = 80.0;
/// Product sub-score without any overlap.
const PRODUCT_NONE: f64 = 30.0;
/// Sub-score used when a dimension cannot be evaluated.
const NEUTRAL: f64 = 50.0;
/// Lowest quantity sub-score when the order is below MOQ.
const QUANTITY_FLOOR: f64 = 20.0;

/// Pure scoring function over a fixed weight set.
#[derive(Clone, Debug)]
pub struct ScoringEngine {
    weights: ScoringWeights,
    tokenizer: Tokenizer,
}

impl ScoringEngine {
    /// Create a scoring engine.
    ///
    /// # Errors
    /// Returns an error if the weights are invalid or the tokenizer cannot be built.
    pub fn new(weights: ScoringWeights) -> SearchResult<Self> {
        weights.validate()?;
        Ok(Self {
            weights,
            tokenizer: Tokenizer::new()?,
        })
    }

    /// Compute the total score (0-100, two decimals) and its breakdown.
    #[must_use]
    pub fn score(&self, candidate: &Candidate, query: &Query) -> (f64, ScoreBreakdown) {
        let tokens = self.candidate_tokens(candidate);
        let breakdown = ScoreBreakdown {
            country: country_score(candidate, query),
            product: self.product_score(candidate, &tokens, query),
            text: text_score(&tokens, query),
            customization: customization_score(candidate, query),
            quantity: quantity_score(candidate, query),
        };
        (self.total(&breakdown), breakdown)
    }

    /// Score a candidate into a [`ScoredCandidate`] not yet accepted by any pass.
    #[must_use]
    pub fn score_candidate(&self, candidate: Candidate, query: &Query) -> ScoredCandidate {
        let (score, breakdown) = self.score(&candidate, query);
        ScoredCandidate {
            candidate,
            score,
            breakdown,
            pass: 0,
            recall_rank: 0,
        }
    }

    /// Weighted sum of a breakdown, clamped and rounded to two decimals.
    #[must_use]
    pub fn total(&self, breakdown: &ScoreBreakdown) -> f64 {
        let w = &self.weights;
        let raw = w.quantity.mul_add(
            breakdown.quantity,
            w.customization.mul_add(
                breakdown.customization,
                w.text.mul_add(
                    breakdown.text,
                    w.product
                        .mul_add(breakdown.product, w.country * breakdown.country),
                ),
            ),
        );
        round2(raw.clamp(0.0, 100.0))
    }

    fn candidate_tokens(&self, candidate: &Candidate) -> BTreeSet<String> {
        let mut tokens = BTreeSet::new();
        let mut add = |text: &str| tokens.extend(self.tokenizer.tokens(text));
        add(candidate.name.as_str());
        add(candidate.country.as_str());
        add(candidate.description.as_str());
        if let Some(city) = candidate.city.as_deref() {
            add(city);
        }
        for value in candidate
            .product_types
            .iter()
            .chain(&candidate.materials)
            .chain(&candidate.tags)
        {
            add(value.as_str());
        }
        tokens
    }

    fn product_score(
        &self,
        candidate: &Candidate,
        tokens: &BTreeSet<String>,
        query: &Query,
    ) -> f64 {
        let exact = candidate.product_types.iter().any(|category| {
            let category_tokens = self.tokenizer.tokens(category);
            !category_tokens.is_empty()
                && category_tokens
                    .iter()
                    .all(|token| query.category_terms.contains(token))
        });
        if exact {
            return PRODUCT_EXACT;
        }

        let partial = query
            .category_terms
            .iter()
            .chain(&query.expanded_terms)
            .any(|term| tokens.contains(term));
        if partial { PRODUCT_PARTIAL } else { PRODUCT_NONE }
    }
}

fn country_score(candidate: &Candidate, query: &Query) -> f64 {
    match query.country.as_deref() {
        None => COUNTRY_ANY,
        Some(wanted) if normalize_component(wanted) == normalize_component(&candidate.country) => {
            COUNTRY_MATCH
        }
        Some(_) => COUNTRY_MISMATCH,
    }
}

/// Share of query terms (or one of their synonyms) present in the candidate's tokens.
#[allow(clippy::cast_precision_loss)]
fn text_score(tokens: &BTreeSet<String>, query: &Query) -> f64 {
    if query.terms.is_empty() {
        return 0.0;
    }
    let hits = query
        .terms
        .iter()
        .filter(|term| {
            tokens.contains(term.as_str())
                || synonyms(term)
                    .iter()
                    .any(|synonym| tokens.contains(*synonym))
        })
        .count();
    100.0 * hits as f64 / query.terms.len() as f64
}

fn customization_score(candidate: &Candidate, query: &Query) -> f64 {
    match query.customization {
        Customization::Yes => {
            if candidate.customization == Some(true) {
                100.0
            } else {
                0.0
            }
        }
        Customization::Any | Customization::No => NEUTRAL,
    }
}

fn quantity_score(candidate: &Candidate, query: &Query) -> f64 {
    match (query.quantity, candidate.moq) {
        (Some(quantity), Some(moq)) if moq == 0 || quantity >= moq => 100.0,
        (Some(quantity), Some(moq)) => {
            (100.0 * f64::from(quantity) / f64::from(moq)).max(QUANTITY_FLOOR)
        }
        _ => NEUTRAL,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::search::core::candidate::Provenance;
    use crate::search::core::config::SearchConfig;
    use crate::search::core::query::SearchRequest;
    use crate::search::dedupe::identity_key;
    use crate::search::normalizer::QueryNormalizer;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(ScoringWeights::default()).unwrap()
    }

    fn query(request: &SearchRequest) -> Query {
        QueryNormalizer::new(SearchConfig::default())
            .unwrap()
            .normalize(request)
            .unwrap()
    }

    fn candidate(name: &str, country: &str, product_types: &[&str]) -> Candidate {
        Candidate {
            provenance: Provenance::Internal {
                record_id: "r1".to_string(),
            },
            identity_key: identity_key(name, country, None),
            name: name.to_string(),
            country: country.to_string(),
            city: None,
            product_types: product_types.iter().map(ToString::to_string).collect(),
            materials: Vec::new(),
            description: String::new(),
            customization: None,
            moq: None,
            lead_time_days: None,
            url: None,
            tags: BTreeSet::new(),
            verified: false,
            extras: BTreeMap::new(),
            raw: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_exact_match_scores_high() {
        let q = query(&SearchRequest::new("hoodie").with_country("Vietnam"));
        let c = candidate("Acme Knits", "Vietnam", &["hoodie"]);
        let (score, breakdown) = engine().score(&c, &q);
        assert!((breakdown.country - 100.0).abs() < f64::EPSILON);
        assert!((breakdown.product - 100.0).abs() < f64::EPSILON);
        assert!((breakdown.text - 100.0).abs() < f64::EPSILON);
        assert!((score - 92.5).abs() < 1e-9);
    }

    #[test]
    fn test_country_rules() {
        let c = candidate("Acme", "Vietnam", &[]);
        let any = query(&SearchRequest::new("tee"));
        let other = query(&SearchRequest::new("tee").with_country("China"));
        assert!((country_score(&c, &any) - 70.0).abs() < f64::EPSILON);
        assert!((country_score(&c, &other) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_product_partial_and_none() {
        let e = engine();
        let q = query(&SearchRequest::new("sweatshirt"));
        let mut partial = candidate("Acme", "Vietnam", &["fleece tops"]);
        partial.description = "hooded fleece for winter".to_string();
        let (_, b) = e.score(&partial, &q);
        assert!((b.product - 80.0).abs() < f64::EPSILON);

        let none = candidate("Acme", "Vietnam", &["ceramics"]);
        let (_, b) = e.score(&none, &q);
        assert!((b.product - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_synonym_category_is_exact() {
        let q = query(&SearchRequest::new("cotton").with_product_type("hoodie"));
        let c = candidate("Acme", "Vietnam", &["Hooded Sweatshirts"]);
        let (_, b) = engine().score(&c, &q);
        assert!((b.product - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_similarity_coverage() {
        let q = query(&SearchRequest::new("organic cotton hoodie"));
        let mut c = candidate("Acme", "Vietnam", &["sweatshirt"]);
        c.materials = vec!["organic cotton".to_string()];
        let (_, b) = engine().score(&c, &q);
        assert!((b.text - 100.0).abs() < 1e-9);

        c.materials.clear();
        let (_, b) = engine().score(&c, &q);
        assert!((b.text - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_customization_rules() {
        let mut c = candidate("Acme", "Vietnam", &[]);
        let yes = query(&SearchRequest::new("tee").with_customization(Customization::Yes));
        let any = query(&SearchRequest::new("tee"));
        assert!((customization_score(&c, &yes) - 0.0).abs() < f64::EPSILON);
        c.customization = Some(true);
        assert!((customization_score(&c, &yes) - 100.0).abs() < f64::EPSILON);
        assert!((customization_score(&c, &any) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_customization_no_is_neutral() {
        let no = query(&SearchRequest::new("tee").with_customization(Customization::No));
        let mut c = candidate("Acme", "Vietnam", &[]);
        for offered in [None, Some(true), Some(false)] {
            c.customization = offered;
            assert!((customization_score(&c, &no) - 50.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_customization_yes_needs_explicit_offer() {
        let yes = query(&SearchRequest::new("tee").with_customization(Customization::Yes));
        let mut c = candidate("Acme", "Vietnam", &[]);
        assert_eq!(c.customization, None);
        assert!(customization_score(&c, &yes).abs() < f64::EPSILON);
        c.customization = Some(false);
        assert!(customization_score(&c, &yes).abs() < f64::EPSILON);
    }

    #[test]
    fn test_quantity_rules() {
        let mut c = candidate("Acme", "Vietnam", &[]);
        let q = query(&SearchRequest::new("tee").with_quantity(500));
        assert!((quantity_score(&c, &q) - 50.0).abs() < f64::EPSILON);

        c.moq = Some(300);
        assert!((quantity_score(&c, &q) - 100.0).abs() < f64::EPSILON);
        c.moq = Some(1000);
        assert!((quantity_score(&c, &q) - 50.0).abs() < f64::EPSILON);
        c.moq = Some(100_000);
        assert!((quantity_score(&c, &q) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scores_bounded_and_deterministic() {
        let e = engine();
        let q = query(
            &SearchRequest::new("denim jeans")
                .with_country("Bangladesh")
                .with_quantity(10),
        );
        let mut c = candidate("Dhaka Denim", "Bangladesh", &["jeans"]);
        c.moq = Some(5000);
        let first = e.score(&c, &q);
        let second = e.score(&c, &q);
        assert_eq!(first, second);
        assert!((0.0..=100.0).contains(&first.0));
    }

    #[test]
    fn test_total_is_monotonic() {
        let e = engine();
        let base = ScoreBreakdown {
            country: 20.0,
            product: 30.0,
            text: 10.0,
            customization: 50.0,
            quantity: 20.0,
        };
        let improved = ScoreBreakdown {
            text: 60.0,
            ..base
        };
        assert!(e.total(&improved) >= e.total(&base));
        assert!((e.total(&base) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_rounding_two_decimals() {
        assert!((round2(12.345_67) - 12.35).abs() < 1e-9);
        assert!((round2(99.994) - 99.99).abs() < 1e-9);
    }
}
