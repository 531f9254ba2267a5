//! Query normalization: tokenization, synonym expansion, defaults, and validation.

use std::collections::BTreeSet;
use std::time::Duration;

use regex::Regex;

use crate::search::core::config::SearchConfig;
use crate::search::core::errors::{SearchError, SearchResult};
use crate::search::core::query::{Query, SearchRequest};

/// Terms carrying no product signal in a sourcing query.
const STOP_WORDS: &[&str] = &[
    "and", "for", "from", "in", "of", "on", "or", "the", "to", "with", "supplier", "manufacturer",
    "factory", "vendor", "maker", "company", "producer", "wholesale", "need", "looking",
];

/// Category synonym groups in stemmed form. Every member expands to its whole group.
const SYNONYM_GROUPS: &[&[&str]] = &[
    &["hoodie", "sweatshirt", "hooded", "pullover"],
    &["tshirt", "tee", "shirt"],
    &["jean", "denim", "trouser", "pant"],
    &["jacket", "outerwear", "coat", "parka"],
    &["knitwear", "knit", "sweater", "cardigan", "jumper"],
    &["sock", "hosiery"],
    &["bag", "handbag", "tote", "backpack"],
    &["footwear", "shoe", "sneaker", "boot"],
    &["cap", "hat", "headwear", "beanie"],
    &["dress", "gown"],
    &["activewear", "sportswear", "legging", "athleisure"],
    &["towel", "terry"],
];

/// Lowercasing, stemming tokenizer shared by query normalization and scoring.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    word: Regex,
}

impl Tokenizer {
    /// Build the tokenizer.
    ///
    /// # Errors
    /// Returns an error if the token pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            word: Regex::new(r"[\p{L}\p{N}]+")?,
        })
    }

    /// Split text into stemmed lowercase tokens of at least two characters.
    #[must_use]
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.word
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|token| token.chars().count() >= 2)
            .map(stem)
            .collect()
    }

    /// Token set of a text.
    #[must_use]
    pub fn token_set(&self, text: &str) -> BTreeSet<String> {
        self.tokens(text).into_iter().collect()
    }
}

/// Light plural stemmer: `-es` after sibilants, otherwise a trailing `-s`.
#[must_use]
pub fn stem(token: &str) -> String {
    if token.len() > 4
        && ["sses", "xes", "zes", "ches", "shes"]
            .iter()
            .any(|suffix| token.ends_with(suffix))
    {
        return token[..token.len() - 2].to_string();
    }
    if token.len() > 3 && token.ends_with('s') && !token.ends_with("ss") && !token.ends_with("us")
    {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}

/// Synonym group containing `term`, if any.
#[must_use]
pub fn synonyms(term: &str) -> &'static [&'static str] {
    SYNONYM_GROUPS
        .iter()
        .find(|group| group.contains(&term))
        .copied()
        .unwrap_or(&[])
}

/// Parses raw requests into canonical [`Query`] values.
#[derive(Clone, Debug)]
pub struct QueryNormalizer {
    config: SearchConfig,
    tokenizer: Tokenizer,
}

impl QueryNormalizer {
    /// Create a normalizer applying the given defaults and limits.
    ///
    /// # Errors
    /// Returns an error if the tokenizer cannot be built.
    pub fn new(config: SearchConfig) -> SearchResult<Self> {
        Ok(Self {
            config,
            tokenizer: Tokenizer::new()?,
        })
    }

    /// Validate a raw request and build its canonical query.
    ///
    /// # Errors
    /// Returns [`SearchError::Validation`] when the request is malformed.
    pub fn normalize(&self, request: &SearchRequest) -> SearchResult<Query> {
        let text = request.q.trim().to_string();
        let country = non_empty(request.country.as_deref());
        let product_type = non_empty(request.product_type.as_deref());

        if text.is_empty() && product_type.is_none() {
            return Err(SearchError::Validation(
                "either q or product_type is required".to_string(),
            ));
        }

        let quantity = match request.quantity {
            None => None,
            Some(q) if q > 0 => Some(u32::try_from(q).unwrap_or(u32::MAX)),
            Some(q) => {
                return Err(SearchError::Validation(format!(
                    "quantity must be > 0, got {q}"
                )));
            }
        };

        let min_score = request.min_score.unwrap_or(self.config.default_min_score);
        if !min_score.is_finite() || !(0.0..=100.0).contains(&min_score) {
            return Err(SearchError::Validation(format!(
                "min_score must be within 0..=100, got {min_score}"
            )));
        }

        let target_count = request
            .target_count
            .unwrap_or(self.config.default_target_count);
        if target_count == 0 || target_count > self.config.max_target_count {
            return Err(SearchError::Validation(format!(
                "target_count must be within 1..={}, got {target_count}",
                self.config.max_target_count
            )));
        }

        let budget_ms = match request.time_budget_ms {
            Some(0) => {
                return Err(SearchError::Validation(
                    "time_budget_ms must be > 0".to_string(),
                ));
            }
            Some(ms) => ms.min(self.config.max_time_budget_ms),
            None => self.config.default_time_budget_ms,
        };

        let mut terms: Vec<String> = Vec::new();
        for token in self.tokenizer.tokens(&text) {
            if STOP_WORDS.contains(&token.as_str()) || terms.contains(&token) {
                continue;
            }
            terms.push(token);
        }
        if terms.is_empty() {
            if let Some(product_type) = product_type.as_deref() {
                for token in self.tokenizer.tokens(product_type) {
                    if !terms.contains(&token) {
                        terms.push(token);
                    }
                }
            }
        }

        let expanded_terms = expand(terms.iter().map(String::as_str));
        let category_terms = match product_type.as_deref() {
            Some(product_type) => {
                let tokens = self.tokenizer.tokens(product_type);
                expand(tokens.iter().map(String::as_str))
            }
            None => expanded_terms.clone(),
        };

        Ok(Query {
            text,
            terms,
            expanded_terms,
            category_terms,
            country,
            product_type,
            quantity,
            customization: request.customization.unwrap_or_default(),
            min_score,
            target_count,
            time_budget: Duration::from_millis(budget_ms),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn expand<'a>(terms: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    let mut expanded = BTreeSet::new();
    for term in terms {
        expanded.insert(term.to_string());
        for synonym in synonyms(term) {
            expanded.insert((*synonym).to_string());
        }
    }
    expanded
}
