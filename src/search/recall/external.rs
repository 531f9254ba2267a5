//! Web search recall and the never-fail wrapper around external providers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use tracing::warn;

use super::{ExternalRecall, RecallContext, RecallFuture};
use crate::search::core::candidate::{Candidate, Provenance};
use crate::search::core::errors::RecallError;
use crate::search::dedupe::{identity_key, normalize_component};
use crate::web::{WebHit, WebQuery, WebSearchClient};

/// Countries recognised in titles and snippets: name, ISO 3166 alpha-2 code, aliases.
const COUNTRIES: &[(&str, &str, &[&str])] = &[
    ("Vietnam", "vn", &["vietnam", "viet nam"]),
    ("China", "cn", &["china", "chinese"]),
    ("Bangladesh", "bd", &["bangladesh"]),
    ("India", "in", &["india", "indian"]),
    ("Pakistan", "pk", &["pakistan"]),
    ("Turkey", "tr", &["turkey", "turkiye"]),
    ("Portugal", "pt", &["portugal", "portuguese"]),
    ("Italy", "it", &["italy", "italian"]),
    ("Indonesia", "id", &["indonesia"]),
    ("Cambodia", "kh", &["cambodia"]),
    ("Sri Lanka", "lk", &["sri lanka"]),
    ("Thailand", "th", &["thailand"]),
    ("Mexico", "mx", &["mexico"]),
    ("Morocco", "ma", &["morocco"]),
    ("Taiwan", "tw", &["taiwan"]),
    ("South Korea", "kr", &["south korea", "korea"]),
    ("Japan", "jp", &["japan"]),
    ("United States", "us", &["united states", "usa"]),
    ("United Kingdom", "gb", &["united kingdom", "uk"]),
    ("France", "fr", &["france"]),
    ("Germany", "de", &["germany"]),
    ("Spain", "es", &["spain"]),
    ("Poland", "pl", &["poland"]),
    ("Romania", "ro", &["romania"]),
];

/// Title separators; the supplier name is the first segment.
const TITLE_SEPARATORS: [&str; 4] = [" - ", " | ", " : ", " – "];

/// Detect a country mentioned in free text.
#[must_use]
pub fn detect_country(text: &str) -> Option<&'static str> {
    let haystack = format!(" {} ", normalize_component(text));
    COUNTRIES.iter().find_map(|(country, _, aliases)| {
        aliases
            .iter()
            .any(|alias| haystack.contains(&format!(" {alias} ")))
            .then_some(*country)
    })
}

/// Two-letter region code for a country name or alias.
#[must_use]
pub fn region_code(country: &str) -> Option<&'static str> {
    let wanted = normalize_component(country);
    COUNTRIES.iter().find_map(|(name, code, aliases)| {
        (normalize_component(name) == wanted || aliases.contains(&wanted.as_str()))
            .then_some(*code)
    })
}

/// Supplier name taken from a page title.
#[must_use]
pub fn name_from_title(title: &str) -> String {
    let cut = TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| title.find(sep))
        .min()
        .unwrap_or(title.len());
    let name = title[..cut].trim();
    let name = if name.is_empty() { title.trim() } else { name };
    name.to_string()
}

/// Convert a web hit into the common candidate shape.
#[must_use]
pub fn hit_to_candidate(hit: &WebHit) -> Candidate {
    let name = name_from_title(&hit.title);
    let country = detect_country(&format!("{} {}", hit.title, hit.description))
        .unwrap_or_default()
        .to_string();
    let description = if hit.description.is_empty() {
        hit.title.clone()
    } else {
        format!("{} {}", hit.title, hit.description)
    };

    let mut extras = BTreeMap::new();
    if !hit.domain.is_empty() {
        extras.insert("domain".to_string(), json!(hit.domain));
    }

    Candidate {
        provenance: Provenance::Web {
            engine: hit.engine.clone(),
            position: hit.position,
        },
        identity_key: identity_key(&name, &country, None),
        name,
        country,
        city: None,
        product_types: Vec::new(),
        materials: Vec::new(),
        description,
        customization: None,
        moq: None,
        lead_time_days: None,
        url: Some(hit.url.clone()),
        tags: BTreeSet::new(),
        verified: false,
        extras,
        raw: serde_json::to_value(hit).unwrap_or(serde_json::Value::Null),
    }
}

/// External recall backed by the web search client.
pub struct WebRecall {
    client: Arc<WebSearchClient>,
}

impl WebRecall {
    /// Wrap a web search client.
    #[must_use]
    pub const fn new(client: Arc<WebSearchClient>) -> Self {
        Self { client }
    }

    /// Engine query for one pass, scoped to the pass's country when it has a region code.
    fn web_query(&self, ctx: &RecallContext) -> WebQuery {
        let text = ctx.query.web_query_text(ctx.country_filter.as_deref());
        let query = self.client.query(text);
        match ctx.country_filter.as_deref().and_then(region_code) {
            Some(region) => query.with_region(region),
            None => query,
        }
    }
}

impl ExternalRecall for WebRecall {
    fn name(&self) -> &str {
        self.client.config().engine.name()
    }

    fn is_enabled(&self) -> bool {
        self.client.is_enabled()
    }

    fn timeout(&self) -> Duration {
        self.client.config().timeout()
    }

    fn recall<'a>(
        &'a self,
        ctx: &'a RecallContext,
    ) -> RecallFuture<'a, Result<Vec<Candidate>, RecallError>> {
        Box::pin(async move {
            let query = self.web_query(ctx);
            let deadline = Instant::now() + self.timeout().min(ctx.remaining());
            let hits = self.client.search(&query, deadline).await?;
            Ok(hits
                .iter()
                .filter(|hit| !name_from_title(&hit.title).is_empty())
                .map(hit_to_candidate)
                .collect())
        })
    }
}

/// Outcome of one guarded external recall.
#[derive(Clone, Debug, Default)]
pub struct ExternalBatch {
    /// Unscored candidates in provider order.
    pub candidates: Vec<Candidate>,
    /// Diagnostic recorded when the provider failed.
    pub note: Option<String>,
    /// Whether the provider was called and answered.
    pub succeeded: bool,
}

/// Run an external provider under `min(sub-timeout, remaining budget)`, converting every
/// failure into an empty batch with a note.
pub async fn recall_external(provider: &dyn ExternalRecall, ctx: &RecallContext) -> ExternalBatch {
    if !provider.is_enabled() {
        return ExternalBatch::default();
    }

    let limit = provider.timeout().min(ctx.remaining());
    if limit.is_zero() {
        return ExternalBatch {
            note: Some(format!("{}: skipped, no time left", provider.name())),
            ..ExternalBatch::default()
        };
    }

    let outcome = match tokio::time::timeout(limit, provider.recall(ctx)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(RecallError::Timeout(
            u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        )),
    };

    match outcome {
        Ok(candidates) => ExternalBatch {
            candidates,
            note: None,
            succeeded: true,
        },
        Err(error) => {
            warn!(provider = provider.name(), pass = ctx.pass, %error, "External recall failed");
            ExternalBatch {
                note: Some(format!("{}: {error}", provider.name())),
                ..ExternalBatch::default()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::search::core::config::SearchConfig;
    use crate::search::core::query::SearchRequest;
    use crate::search::corpus::CorpusSnapshot;
    use crate::search::normalizer::QueryNormalizer;
    use crate::search::recall::NoExternalRecall;

    /// Scripted external provider for scheduler tests.
    pub(crate) enum Scripted {
        Hits(Vec<Candidate>),
        Fail,
        Hang,
    }

    pub(crate) struct ScriptedRecall {
        pub(crate) script: Scripted,
        pub(crate) timeout: Duration,
    }

    impl ExternalRecall for ScriptedRecall {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_enabled(&self) -> bool {
            true
        }

        fn timeout(&self) -> Duration {
            self.timeout
        }

        fn recall<'a>(
            &'a self,
            _ctx: &'a RecallContext,
        ) -> RecallFuture<'a, Result<Vec<Candidate>, RecallError>> {
            Box::pin(async move {
                match &self.script {
                    Scripted::Hits(candidates) => Ok(candidates.clone()),
                    Scripted::Fail => Err(RecallError::Task("boom".to_string())),
                    Scripted::Hang => {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok(Vec::new())
                    }
                }
            })
        }
    }

    pub(crate) fn web_hit(title: &str, description: &str, position: usize) -> WebHit {
        WebHit {
            title: title.to_string(),
            url: format!("https://site{position}.example"),
            description: description.to_string(),
            domain: format!("site{position}.example"),
            position,
            engine: "DuckDuckGo".to_string(),
        }
    }

    fn context(deadline: Instant) -> RecallContext {
        let normalizer = QueryNormalizer::new(SearchConfig::default()).unwrap();
        let query = normalizer.normalize(&SearchRequest::new("hoodie")).unwrap();
        RecallContext {
            query: Arc::new(query),
            snapshot: Arc::new(CorpusSnapshot::empty()),
            country_filter: None,
            pass: 1,
            deadline,
        }
    }

    #[test]
    fn test_name_from_title() {
        assert_eq!(name_from_title("Saigon Knit Co - Hoodie Maker"), "Saigon Knit Co");
        assert_eq!(name_from_title("Dhaka Threads | Exporter - BD"), "Dhaka Threads");
        assert_eq!(name_from_title("Plain Name"), "Plain Name");
    }

    #[test]
    fn test_detect_country() {
        assert_eq!(detect_country("Hoodie factory in Viet Nam"), Some("Vietnam"));
        assert_eq!(detect_country("Knitwear exporter, Sri Lanka."), Some("Sri Lanka"));
        assert_eq!(detect_country("Indiana apparel"), None);
    }

    #[test]
    fn test_region_code() {
        assert_eq!(region_code("Vietnam"), Some("vn"));
        assert_eq!(region_code(" viet nam "), Some("vn"));
        assert_eq!(region_code("United Kingdom"), Some("gb"));
        assert_eq!(region_code("UK"), Some("gb"));
        assert_eq!(region_code("Atlantis"), None);
    }

    #[test]
    fn test_web_query_scoped_to_country() {
        let client = WebSearchClient::new(crate::web::WebConfig::default()).unwrap();
        let recall = WebRecall::new(Arc::new(client));

        let mut ctx = context(Instant::now() + Duration::from_secs(5));
        assert_eq!(recall.web_query(&ctx).region, None);

        ctx.country_filter = Some("Viet Nam".to_string());
        let query = recall.web_query(&ctx);
        assert_eq!(query.region.as_deref(), Some("vn"));
        assert!(query.query.contains("Viet Nam"));

        ctx.country_filter = Some("Atlantis".to_string());
        assert_eq!(recall.web_query(&ctx).region, None);
    }

    #[test]
    fn test_hit_to_candidate() {
        let hit = web_hit(
            "Saigon Knit Co - Hoodie Manufacturer",
            "Custom hoodies made in Vietnam",
            3,
        );
        let candidate = hit_to_candidate(&hit);

        assert_eq!(candidate.name, "Saigon Knit Co");
        assert_eq!(candidate.country, "Vietnam");
        assert_eq!(candidate.identity_key, "saigon knit co|vietnam|");
        assert_eq!(candidate.extras.get("domain"), Some(&json!("site3.example")));
        assert!(matches!(
            candidate.provenance,
            Provenance::Web { position: 3, .. }
        ));
    }

    #[tokio::test]
    async fn test_failure_becomes_note() {
        let provider = ScriptedRecall {
            script: Scripted::Fail,
            timeout: Duration::from_secs(1),
        };
        let ctx = context(Instant::now() + Duration::from_secs(5));

        let batch = recall_external(&provider, &ctx).await;

        assert!(batch.candidates.is_empty());
        assert!(!batch.succeeded);
        assert!(batch.note.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_sub_timeout_is_enforced() {
        let provider = ScriptedRecall {
            script: Scripted::Hang,
            timeout: Duration::from_millis(20),
        };
        let ctx = context(Instant::now() + Duration::from_secs(5));

        let started = Instant::now();
        let batch = recall_external(&provider, &ctx).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!batch.succeeded);
        assert!(batch.note.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_disabled_provider_is_silent() {
        let ctx = context(Instant::now() + Duration::from_secs(5));
        let batch = recall_external(&NoExternalRecall, &ctx).await;

        assert!(batch.candidates.is_empty());
        assert!(batch.note.is_none());
        assert!(!batch.succeeded);
    }
}
