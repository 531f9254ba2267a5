//! Configuration for the sourcing engine.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::search::core::errors::{SearchError, SearchResult};
use crate::web::{SearchEngine, WebConfig};

/// Top-level configuration for the sourcing engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Query defaults and scheduler limits.
    pub search: SearchConfig,
    /// Scoring weights.
    pub scoring: ScoringWeights,
    /// External web provider settings.
    pub web: WebConfig,
    /// Corpus source settings.
    pub corpus: CorpusConfig,
}

impl EngineConfig {
    /// Build a configuration from defaults plus `SOURCING_*` environment overrides.
    ///
    /// # Errors
    /// Returns an error if an override cannot be parsed or the result is invalid.
    pub fn from_env() -> SearchResult<Self> {
        let mut config = Self::default();

        if let Some(path) = env_var("SOURCING_CORPUS_PATH") {
            config.corpus.path = Some(PathBuf::from(path));
        }
        if let Some(secs) = env_parse::<u64>("SOURCING_CORPUS_REFRESH_SECS")? {
            config.corpus.refresh_interval_seconds = Some(secs);
        }
        if let Some(enabled) = env_parse::<bool>("SOURCING_WEB_ENABLED")? {
            config.web.enabled = enabled;
        }
        if let Some(engine) = env_var("SOURCING_WEB_ENGINE") {
            config.web.engine = SearchEngine::from_name(&engine).ok_or_else(|| {
                SearchError::InvalidConfig(format!("SOURCING_WEB_ENGINE: unknown engine {engine}"))
            })?;
        }
        if let Some(ms) = env_parse::<u64>("SOURCING_WEB_TIMEOUT_MS")? {
            config.web.timeout_ms = ms;
        }
        if let Some(key) = env_var("SOURCING_BRAVE_API_KEY") {
            config.web.brave_api_key = Some(key);
        }
        if let Some(score) = env_parse::<f64>("SOURCING_MIN_SCORE")? {
            config.search.default_min_score = score;
        }
        if let Some(ms) = env_parse::<u64>("SOURCING_TIME_BUDGET_MS")? {
            config.search.default_time_budget_ms = ms;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> SearchResult<()> {
        self.search.validate()?;
        self.scoring.validate()?;

        if self.web.enabled && self.web.timeout_ms == 0 {
            return Err(SearchError::InvalidConfig(
                "web.timeout_ms must be > 0".to_string(),
            ));
        }
        if self.web.enabled
            && self.web.engine.requires_api_key()
            && self.web.brave_api_key.is_none()
        {
            return Err(SearchError::InvalidConfig(format!(
                "web.engine {} requires an API key",
                self.web.engine.name()
            )));
        }
        if self.corpus.refresh_interval_seconds == Some(0) {
            return Err(SearchError::InvalidConfig(
                "corpus.refresh_interval_seconds must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Query defaults and scheduler limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Acceptance threshold used when the request omits `min_score`.
    pub default_min_score: f64,
    /// Result count used when the request omits `target_count`.
    pub default_target_count: usize,
    /// Largest `target_count` a request may ask for.
    pub max_target_count: usize,
    /// Time budget used when the request omits `time_budget_ms`.
    pub default_time_budget_ms: u64,
    /// Upper clamp for requested time budgets.
    pub max_time_budget_ms: u64,
    /// Threshold decrement between passes.
    pub relax_step: f64,
    /// Lowest threshold the scheduler relaxes to.
    pub threshold_floor: f64,
    /// Maximum candidates returned by one internal recall.
    pub scan_ceiling: usize,
    /// Records scanned between two deadline checks.
    pub deadline_check_every: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_min_score: 80.0,
            default_target_count: 10,
            max_target_count: 100,
            default_time_budget_ms: 12_000,
            max_time_budget_ms: 60_000,
            relax_step: 5.0,
            threshold_floor: 50.0,
            scan_ceiling: 200,
            deadline_check_every: 64,
        }
    }
}

impl SearchConfig {
    fn validate(&self) -> SearchResult<()> {
        if !(0.0..=100.0).contains(&self.default_min_score) {
            return Err(SearchError::InvalidConfig(
                "search.default_min_score must be within 0..=100".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.threshold_floor) {
            return Err(SearchError::InvalidConfig(
                "search.threshold_floor must be within 0..=100".to_string(),
            ));
        }
        if self.relax_step <= 0.0 {
            return Err(SearchError::InvalidConfig(
                "search.relax_step must be > 0".to_string(),
            ));
        }
        if self.default_target_count == 0 || self.default_target_count > self.max_target_count {
            return Err(SearchError::InvalidConfig(
                "search.default_target_count must be within 1..=max_target_count".to_string(),
            ));
        }
        if self.default_time_budget_ms == 0
            || self.default_time_budget_ms > self.max_time_budget_ms
        {
            return Err(SearchError::InvalidConfig(
                "search.default_time_budget_ms must be within 1..=max_time_budget_ms".to_string(),
            ));
        }
        if self.scan_ceiling == 0 || self.deadline_check_every == 0 {
            return Err(SearchError::InvalidConfig(
                "search.scan_ceiling and search.deadline_check_every must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fixed weights of the five scoring dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Country match weight.
    pub country: f64,
    /// Product/category match weight.
    pub product: f64,
    /// Free-text similarity weight.
    pub text: f64,
    /// Customization fit weight.
    pub customization: f64,
    /// Quantity/MOQ fit weight.
    pub quantity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            country: 0.35,
            product: 0.30,
            text: 0.20,
            customization: 0.10,
            quantity: 0.05,
        }
    }
}

impl ScoringWeights {
    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.country + self.product + self.text + self.customization + self.quantity
    }

    /// Validate that weights are non-negative and sum to 1.0.
    ///
    /// # Errors
    /// Returns an error if a weight is negative or the sum drifts from 1.0.
    pub fn validate(&self) -> SearchResult<()> {
        let weights = [
            self.country,
            self.product,
            self.text,
            self.customization,
            self.quantity,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(SearchError::InvalidConfig(
                "scoring weights must be finite and non-negative".to_string(),
            ));
        }
        if (self.total() - 1.0).abs() > 1e-6 {
            return Err(SearchError::InvalidConfig(format!(
                "scoring weights must sum to 1.0, got {:.4}",
                self.total()
            )));
        }
        Ok(())
    }
}

/// Corpus source settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// JSON file holding supplier records.
    pub path: Option<PathBuf>,
    /// Periodic rescan interval; no background refresh when unset.
    pub refresh_interval_seconds: Option<u64>,
}

impl CorpusConfig {
    /// Refresh interval as a duration.
    #[must_use]
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_seconds.map(Duration::from_secs)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> SearchResult<Option<T>> {
    env_var(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|_| {
                SearchError::InvalidConfig(format!("{key}: cannot parse value {raw:?}"))
            })
        })
        .transpose()
}
