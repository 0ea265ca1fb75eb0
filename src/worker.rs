//! Off-thread index construction and the current index snapshot.
//!
//! Building an index is CPU-bound, so it runs on tokio's blocking pool and the
//! finished [`SearchIndex`] is handed back as an immutable [`IndexHandle`].
//! Readers clone the handle and query it without holding any lock. Concurrent
//! loads of the same artifact share one in-flight build, which runs as its own
//! task and installs its result even if every caller stops waiting.

use crate::artifact;
use crate::builder::{IndexBuilder, IndexHandle};
use crate::error::LoadError;
use crate::record::RawEntry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Type alias for shared index build futures.
type SharedBuild = Shared<BoxFuture<'static, Result<IndexHandle, LoadError>>>;

type CurrentSlot = Arc<RwLock<Option<Snapshot>>>;
type InFlight = Arc<Mutex<HashMap<PathBuf, SharedBuild>>>;

/// The installed snapshot and where it came from.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub index: IndexHandle,
    /// Artifact path, or `None` for indices built from in-memory entries.
    pub source: Option<PathBuf>,
}

/// Shared state holding the current index snapshot.
pub struct IndexState {
    builder: IndexBuilder,

    /// Currently installed snapshot
    current: CurrentSlot,

    /// In-flight artifact loads (can be awaited by multiple callers)
    in_flight: InFlight,
}

impl std::fmt::Debug for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fingerprint = self
            .current
            .try_read()
            .ok()
            .and_then(|current| current.as_ref().map(|s| s.index.fingerprint()));
        f.debug_struct("IndexState")
            .field("builder", &self.builder)
            .field("fingerprint", &fingerprint)
            .finish_non_exhaustive()
    }
}

impl IndexState {
    pub fn new(builder: IndexBuilder) -> Self {
        Self {
            builder,
            current: Arc::new(RwLock::new(None)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The current index, if one has been installed.
    pub async fn current(&self) -> Option<IndexHandle> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|snapshot| snapshot.index.clone())
    }

    pub async fn snapshot(&self) -> Option<Snapshot> {
        self.current.read().await.clone()
    }

    /// Replace the current snapshot.
    pub async fn install(&self, index: IndexHandle, source: Option<PathBuf>) {
        install_into(&self.current, index, source).await;
    }

    /// Build an index from in-memory entries on the blocking pool and install it.
    pub async fn build(&self, entries: Vec<RawEntry>) -> Result<IndexHandle, LoadError> {
        let builder = self.builder.clone();
        let index = tokio::task::spawn_blocking(move || builder.build(entries))
            .await
            .map_err(|e| LoadError::Worker(e.to_string()))?
            .map(Arc::new)?;

        self.install(index.clone(), None).await;
        Ok(index)
    }

    /// Load an artifact file, build it off-thread, and install the result.
    ///
    /// If a load of the same path is already running, waits for it instead of
    /// starting another. On failure the previous snapshot stays installed.
    /// Dropping the returned future does not cancel the build.
    pub async fn load(&self, path: &Path) -> Result<IndexHandle, LoadError> {
        let shared = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(existing) = in_flight.get(path) {
                tracing::debug!("Awaiting in-flight load of {}", path.display());
                existing.clone()
            } else {
                let shared = self.spawn_load(path.to_path_buf());
                in_flight.insert(path.to_path_buf(), shared.clone());
                shared
            }
        };

        shared.await
    }

    /// Check if a load of `path` is in progress.
    pub async fn is_loading(&self, path: &Path) -> bool {
        self.in_flight.lock().await.contains_key(path)
    }

    /// Start the build task. Must be called with the `in_flight` lock held, so
    /// the task cannot retire its entry before it has been inserted.
    fn spawn_load(&self, path: PathBuf) -> SharedBuild {
        let builder = self.builder.clone();
        let current = Arc::clone(&self.current);
        let in_flight = Arc::clone(&self.in_flight);

        tracing::info!("Starting index build for {}", path.display());

        let task = tokio::spawn(async move {
            let artifact_path = path.clone();
            let result = tokio::task::spawn_blocking(move || {
                artifact::load_index(&artifact_path, &builder)
            })
            .await
            .map_err(|e| LoadError::Worker(e.to_string()))
            .and_then(|built| built.map(Arc::new).map_err(LoadError::from));

            in_flight.lock().await.remove(&path);

            match &result {
                Ok(index) => install_into(&current, index.clone(), Some(path)).await,
                Err(e) => tracing::warn!("Failed to load index from {}: {}", path.display(), e),
            }

            result
        });

        let build: BoxFuture<'static, Result<IndexHandle, LoadError>> = Box::pin(async move {
            task.await
                .map_err(|e| LoadError::Worker(e.to_string()))?
        });

        build.shared()
    }
}

async fn install_into(current: &RwLock<Option<Snapshot>>, index: IndexHandle, source: Option<PathBuf>) {
    let mut current = current.write().await;
    let previous = current.as_ref().map(|s| s.index.fingerprint());
    tracing::debug!(
        previous = ?previous.map(|f| format!("{f:016x}")),
        next = %format!("{:016x}", index.fingerprint()),
        "Installing index snapshot"
    );
    *current = Some(Snapshot { index, source });
}
