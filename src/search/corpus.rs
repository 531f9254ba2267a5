//! Read-only supplier corpus snapshots with atomic swap on rescan.
//!
//! Searches grab an `Arc<CorpusSnapshot>` once and keep using it even if a rescan
//! publishes a newer snapshot while they run.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::search::core::candidate::{Candidate, Provenance};
use crate::search::core::errors::CorpusError;
use crate::search::dedupe::identity_key;

/// Boxed future type for corpus loading.
pub type LoadFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One supplier record as stored in the corpus file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierRecord {
    /// Stable record identifier.
    #[serde(default)]
    pub id: String,
    /// Supplier name.
    pub name: String,
    /// Supplier country.
    #[serde(default)]
    pub country: String,
    /// Supplier city.
    #[serde(default)]
    pub city: Option<String>,
    /// Single product category (legacy shape).
    #[serde(default)]
    pub product_type: Option<String>,
    /// Product categories.
    #[serde(default)]
    pub product_types: Vec<String>,
    /// Materials worked with.
    #[serde(default)]
    pub materials: Vec<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether customization is offered.
    #[serde(default)]
    pub customization: Option<bool>,
    /// Minimum order quantity.
    #[serde(default)]
    pub moq: Option<u32>,
    /// Typical lead time.
    #[serde(default)]
    pub lead_time_days: Option<u32>,
    /// Supplier website.
    #[serde(default)]
    pub url: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the supplier was verified.
    #[serde(default)]
    pub verified: bool,
}

impl SupplierRecord {
    /// All product categories, merging the legacy single-category field.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::with_capacity(self.product_types.len() + 1);
        for category in self.product_type.iter().chain(&self.product_types) {
            let trimmed = category.trim();
            if !trimmed.is_empty() && !categories.iter().any(|c| c == trimmed) {
                categories.push(trimmed.to_string());
            }
        }
        categories
    }

    /// Convert into the common candidate shape.
    #[must_use]
    pub fn to_candidate(&self, position: usize) -> Candidate {
        let record_id = if self.id.is_empty() {
            format!("row-{position}")
        } else {
            self.id.clone()
        };
        Candidate {
            provenance: Provenance::Internal { record_id },
            identity_key: identity_key(&self.name, &self.country, self.city.as_deref()),
            name: self.name.trim().to_string(),
            country: self.country.trim().to_string(),
            city: self.city.clone(),
            product_types: self.categories(),
            materials: self.materials.clone(),
            description: self.description.clone().unwrap_or_default(),
            customization: self.customization,
            moq: self.moq,
            lead_time_days: self.lead_time_days,
            url: self.url.clone(),
            tags: self.tags.iter().cloned().collect(),
            verified: self.verified,
            extras: BTreeMap::new(),
            raw: serde_json::to_value(self).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Accepted corpus file layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Bare(Vec<SupplierRecord>),
    Wrapped { suppliers: Vec<SupplierRecord> },
}

/// Immutable view of the corpus used by one or more searches.
#[derive(Clone, Debug)]
pub struct CorpusSnapshot {
    candidates: Vec<Candidate>,
    version: u64,
    loaded_at: DateTime<Utc>,
    source: String,
}

impl CorpusSnapshot {
    /// Snapshot that has never been loaded.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            version: 0,
            loaded_at: Utc::now(),
            source: "unloaded".to_string(),
        }
    }

    /// Build a snapshot from records.
    #[must_use]
    pub fn from_records(
        records: &[SupplierRecord],
        version: u64,
        source: impl Into<String>,
    ) -> Self {
        let candidates = records
            .iter()
            .enumerate()
            .filter(|(_, record)| !record.name.trim().is_empty())
            .map(|(position, record)| record.to_candidate(position))
            .collect();
        Self {
            candidates,
            version,
            loaded_at: Utc::now(),
            source: source.into(),
        }
    }

    /// Candidates in corpus order.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Monotonic snapshot version, 0 when never loaded.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Summary statistics.
    #[must_use]
    pub fn stats(&self) -> CorpusStats {
        let countries: BTreeSet<&str> = self
            .candidates
            .iter()
            .map(|c| c.country.as_str())
            .filter(|c| !c.is_empty())
            .collect();
        CorpusStats {
            records: self.candidates.len(),
            countries: countries.len(),
            version: self.version,
            loaded_at: self.loaded_at,
            source: self.source.clone(),
        }
    }
}

/// Corpus statistics exposed over HTTP.
#[derive(Clone, Debug, Serialize)]
pub struct CorpusStats {
    /// Number of records.
    pub records: usize,
    /// Number of distinct countries.
    pub countries: usize,
    /// Snapshot version.
    pub version: u64,
    /// When the snapshot was built.
    pub loaded_at: DateTime<Utc>,
    /// Where the records came from.
    pub source: String,
}

/// Source of supplier records.
pub trait CorpusLoader: Send + Sync {
    /// Load all supplier records.
    ///
    /// # Errors
    /// Returns an error if the source cannot be read or parsed.
    fn load(&self) -> LoadFuture<'_, Result<Vec<SupplierRecord>, CorpusError>>;

    /// Human-readable source description.
    fn describe(&self) -> String;
}

/// Loads records from a JSON file (bare array or `{"suppliers": [...]}`).
#[derive(Clone, Debug)]
pub struct JsonFileLoader {
    path: PathBuf,
}

impl JsonFileLoader {
    /// Create a loader for the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CorpusLoader for JsonFileLoader {
    fn load(&self) -> LoadFuture<'_, Result<Vec<SupplierRecord>, CorpusError>> {
        Box::pin(async move {
            let bytes = tokio::fs::read(&self.path).await?;
            let records = match serde_json::from_slice::<CorpusFile>(&bytes)? {
                CorpusFile::Bare(records) | CorpusFile::Wrapped { suppliers: records } => records,
            };
            Ok(records)
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Holder of the current snapshot. Readers clone the `Arc`; rescans swap it.
#[derive(Debug)]
pub struct CorpusStore {
    current: watch::Sender<Arc<CorpusSnapshot>>,
    next_version: AtomicU64,
}

impl Default for CorpusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusStore {
    /// Create a store holding an unloaded snapshot.
    #[must_use]
    pub fn new() -> Self {
        let (current, _) = watch::channel(Arc::new(CorpusSnapshot::empty()));
        Self {
            current,
            next_version: AtomicU64::new(1),
        }
    }

    /// Create a store pre-populated with records.
    #[must_use]
    pub fn with_records(records: &[SupplierRecord]) -> Self {
        let store = Self::new();
        store.replace(records, "inline");
        store
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CorpusSnapshot> {
        self.current.borrow().clone()
    }

    /// Publish a new snapshot built from `records`.
    pub fn replace(&self, records: &[SupplierRecord], source: &str) -> Arc<CorpusSnapshot> {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let snapshot = Arc::new(CorpusSnapshot::from_records(records, version, source));
        self.current.send_replace(Arc::clone(&snapshot));
        info!(version, records = snapshot.len(), source, "Corpus snapshot published");
        snapshot
    }

    /// Rescan from a loader. The previous snapshot stays current on failure.
    ///
    /// # Errors
    /// Returns an error if the loader fails.
    pub async fn reload(
        &self,
        loader: &dyn CorpusLoader,
    ) -> Result<Arc<CorpusSnapshot>, CorpusError> {
        let records = loader.load().await?;
        Ok(self.replace(&records, &loader.describe()))
    }
}

/// Periodic corpus rescan worker.
pub struct CorpusRefresher {
    store: Arc<CorpusStore>,
    loader: Arc<dyn CorpusLoader>,
    interval: Duration,
    shutdown: Arc<Notify>,
}

impl CorpusRefresher {
    /// Create a refresher.
    #[must_use]
    pub fn new(
        store: Arc<CorpusStore>,
        loader: Arc<dyn CorpusLoader>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            loader,
            interval,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a shutdown notifier to stop the refresher.
    #[must_use]
    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the refresher as a tokio task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        info!(
            interval = ?self.interval,
            source = %self.loader.describe(),
            "Starting corpus refresher"
        );

        loop {
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {
                    match self.store.reload(self.loader.as_ref()).await {
                        Ok(snapshot) => debug!(version = snapshot.version(), "Corpus refreshed"),
                        Err(err) => warn!(%err, "Corpus refresh failed, keeping previous snapshot"),
                    }
                }
                () = self.shutdown.notified() => {
                    info!("Corpus refresher shutting down");
                    break;
                }
            }
        }
    }
}
