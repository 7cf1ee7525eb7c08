use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::model::WeatherSnapshot;

/// Source of the weather data the entities project.
///
/// Implementations own fetching; entities only ever read the current
/// snapshot, which is replaced wholesale by `async_update`.
#[async_trait]
pub trait Collector: Send + Sync + Debug {
    /// The latest snapshot. Cheap to call; never blocks on I/O.
    fn snapshot(&self) -> Arc<WeatherSnapshot>;

    /// Refresh the snapshot from the collector's source.
    async fn async_update(&self) -> Result<()>;
}

/// Holds the current snapshot and swaps it atomically.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: RwLock<Arc<WeatherSnapshot>>,
}

impl SnapshotCell {
    pub fn new(snapshot: WeatherSnapshot) -> Self {
        Self { current: RwLock::new(Arc::new(snapshot)) }
    }

    pub fn load(&self) -> Arc<WeatherSnapshot> {
        self.current.read().clone()
    }

    pub fn store(&self, snapshot: WeatherSnapshot) {
        *self.current.write() = Arc::new(snapshot);
    }
}

/// Collector whose data is pushed in by its owner.
///
/// `async_update` is a no-op; new data arrives through [`MemoryCollector::replace`].
#[derive(Debug, Default)]
pub struct MemoryCollector {
    cell: SnapshotCell,
}

impl MemoryCollector {
    pub fn new(snapshot: WeatherSnapshot) -> Self {
        Self { cell: SnapshotCell::new(snapshot) }
    }

    pub fn replace(&self, snapshot: WeatherSnapshot) {
        self.cell.store(snapshot);
    }
}

#[async_trait]
impl Collector for MemoryCollector {
    fn snapshot(&self) -> Arc<WeatherSnapshot> {
        self.cell.load()
    }

    async fn async_update(&self) -> Result<()> {
        Ok(())
    }
}

/// Collector that re-reads a JSON snapshot dump on every update.
#[derive(Debug)]
pub struct JsonFileCollector {
    path: PathBuf,
    cell: SnapshotCell,
}

impl JsonFileCollector {
    /// Starts empty; nothing is read until the first `async_update`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cell: SnapshotCell::default() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Collector for JsonFileCollector {
    fn snapshot(&self) -> Arc<WeatherSnapshot> {
        self.cell.load()
    }

    async fn async_update(&self) -> Result<()> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read collector snapshot: {}", self.path.display()))?;

        let snapshot: WeatherSnapshot = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse collector snapshot: {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "loaded collector snapshot");
        self.cell.store(snapshot);

        Ok(())
    }
}
