//! Request and canonical query types.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Customization requirement expressed by the buyer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Customization {
    /// No preference.
    #[default]
    Any,
    /// Supplier must offer customization.
    Yes,
    /// Buyer orders stock products.
    No,
}

impl Customization {
    /// Wire name of the requirement.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

/// Raw search request as received over HTTP.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query.
    #[serde(default)]
    pub q: String,
    /// Preferred supplier country.
    pub country: Option<String>,
    /// Product category.
    pub product_type: Option<String>,
    /// Requested order quantity.
    pub quantity: Option<i64>,
    /// Customization requirement.
    pub customization: Option<Customization>,
    /// Initial acceptance threshold (0-100).
    pub min_score: Option<f64>,
    /// Number of results wanted.
    pub target_count: Option<usize>,
    /// Wall-clock budget for the whole search.
    pub time_budget_ms: Option<u64>,
}

impl SearchRequest {
    /// Create a request with free text only.
    #[must_use]
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }

    /// Set the preferred country.
    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Set the product category.
    #[must_use]
    pub fn with_product_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = Some(product_type.into());
        self
    }

    /// Set the requested quantity.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Set the customization requirement.
    #[must_use]
    pub const fn with_customization(mut self, customization: Customization) -> Self {
        self.customization = Some(customization);
        self
    }

    /// Set the initial acceptance threshold.
    #[must_use]
    pub const fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    /// Set the number of results wanted.
    #[must_use]
    pub const fn with_target_count(mut self, target_count: usize) -> Self {
        self.target_count = Some(target_count);
        self
    }

    /// Set the time budget.
    #[must_use]
    pub const fn with_time_budget_ms(mut self, ms: u64) -> Self {
        self.time_budget_ms = Some(ms);
        self
    }
}

/// Canonical, validated query. Shared read-only for the lifetime of one request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Query {
    /// Original free text, trimmed.
    pub text: String,
    /// Normalized query terms in first-seen order.
    pub terms: Vec<String>,
    /// Terms plus their synonyms.
    pub expanded_terms: BTreeSet<String>,
    /// Category vocabulary derived from `product_type` (or the terms when absent).
    pub category_terms: BTreeSet<String>,
    /// Preferred supplier country as given.
    pub country: Option<String>,
    /// Product category as given.
    pub product_type: Option<String>,
    /// Requested order quantity.
    pub quantity: Option<u32>,
    /// Customization requirement.
    pub customization: Customization,
    /// Initial acceptance threshold.
    pub min_score: f64,
    /// Number of results wanted.
    pub target_count: usize,
    /// Wall-clock budget.
    pub time_budget: Duration,
}

impl Query {
    /// Time budget in whole milliseconds.
    #[must_use]
    pub fn time_budget_ms(&self) -> u64 {
        u64::try_from(self.time_budget.as_millis()).unwrap_or(u64::MAX)
    }

    /// Text sent to external search engines.
    #[must_use]
    pub fn web_query_text(&self, country: Option<&str>) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(4);
        if !self.text.is_empty() {
            parts.push(&self.text);
        }
        if let Some(product_type) = self.product_type.as_deref() {
            if !self.text.to_lowercase().contains(&product_type.to_lowercase()) {
                parts.push(product_type);
            }
        }
        if let Some(country) = country {
            parts.push(country);
        }
        parts.push("manufacturer supplier");
        parts.join(" ")
    }
}
