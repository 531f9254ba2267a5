//! Startup helpers for the sourcing server.

use std::process::ExitCode;
use std::sync::Arc;

use crate::search::{
    CorpusLoader, CorpusRefresher, CorpusStore, EngineConfig, JsonFileLoader, SourcingEngine,
};
use crate::server::{self, AppState};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Run the server (used by the `sourcing-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting sourcing engine v{}", env!("CARGO_PKG_VERSION"));

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let port = get_port();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result = rt.block_on(async move {
        let (state, refresher) = initialize(config).await?;
        let served = server::run_server_with_shutdown(state, port, shutdown_signal()).await;
        if let Some(refresher) = refresher {
            refresher.notify_one();
        }
        served
    });

    if let Err(e) = result {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Build the engine, load the corpus and start the periodic refresher when configured.
///
/// A failed initial load is logged and the server starts on an empty corpus; searches
/// then answer with a warning until a reload succeeds.
///
/// Returns the shared state and, when a refresher was spawned, its shutdown notifier.
///
/// # Errors
/// Returns an error if the engine cannot be built.
pub async fn initialize(
    config: EngineConfig,
) -> Result<(Arc<AppState>, Option<Arc<tokio::sync::Notify>>), BoxError> {
    let store = Arc::new(CorpusStore::new());
    let loader: Option<Arc<dyn CorpusLoader>> = config
        .corpus
        .path
        .clone()
        .map(|path| Arc::new(JsonFileLoader::new(path)) as Arc<dyn CorpusLoader>);

    match loader.as_deref() {
        Some(loader) => match store.reload(loader).await {
            Ok(snapshot) => tracing::info!(records = snapshot.len(), "Corpus loaded"),
            Err(e) => tracing::warn!(error = %e, "Initial corpus load failed, starting empty"),
        },
        None => tracing::warn!("SOURCING_CORPUS_PATH not set, starting with an empty corpus"),
    }

    let refresher = match (loader.clone(), config.corpus.refresh_interval()) {
        (Some(loader), Some(interval)) => {
            let refresher = CorpusRefresher::new(Arc::clone(&store), loader, interval);
            let shutdown = refresher.shutdown_notifier();
            drop(refresher.spawn());
            Some(shutdown)
        }
        _ => None,
    };

    if config.web.enabled {
        tracing::info!(engine = config.web.engine.name(), "Web recall enabled");
    }

    let engine = SourcingEngine::new(config, store)?;
    Ok((AppState::new(engine, loader), refresher))
}

/// Resolve when the process receives Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Get configured server port.
#[must_use]
pub fn get_port() -> u16 {
    std::env::var("SOURCING_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_without_corpus_path() {
        let (state, refresher) = initialize(EngineConfig::default()).await.unwrap();

        assert!(refresher.is_none());
        assert!(state.loader.is_none());
        assert!(state.corpus().snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_with_missing_file_starts_empty() {
        let mut config = EngineConfig::default();
        config.corpus.path = Some(std::env::temp_dir().join("sourcing-engine-missing.json"));

        let (state, _) = initialize(config).await.unwrap();

        assert!(state.loader.is_some());
        assert!(state.corpus().snapshot().is_empty());
    }
}
