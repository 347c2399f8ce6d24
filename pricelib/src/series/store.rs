use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};

use crate::series::codec;
use crate::series::errors::StoreError;
use crate::series::objects::{Observation, RetentionPolicy, Series};

/// Raw byte storage behind a [`SeriesStore`].
///
/// Backends only move bytes; the CSV schema, validation and reset policy live in the store,
/// so every backend behaves identically for corrupt or mismatched content.
pub trait StoreBackend {
    // Ok(None) when nothing has been persisted yet
    fn read(&self) -> Result<Option<Vec<u8>>, StoreError>;
    fn write(&mut self, contents: &[u8]) -> Result<(), StoreError>;
    fn describe(&self) -> String;
}

// CSV file on disk, replaced atomically on every write
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBackend { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl StoreBackend for FileBackend {
    fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read(&self.path)?))
    }

    fn write(&mut self, contents: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                log::info!("Creating store directory at {}...", parent.display());
                std::fs::create_dir_all(parent)?;
            }
        }

        // Write the full file next to the target, then swap it in with a rename so a reader
        // never sees a partially written row
        let temp_path = self.temp_path();
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    contents: Option<Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend { contents: None }
    }

    pub fn with_contents(contents: impl Into<Vec<u8>>) -> Self {
        MemoryBackend {
            contents: Some(contents.into()),
        }
    }

    pub fn contents(&self) -> Option<&[u8]> {
        self.contents.as_deref()
    }
}

impl StoreBackend for MemoryBackend {
    fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &[u8]) -> Result<(), StoreError> {
        self.contents = Some(contents.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}

/// Append-only time series with staleness detection and auto-reset.
///
/// The store never hands an error to its caller: unreadable, mismatched or stale content
/// is replaced by an empty series, and failed writes are logged while the in-memory series
/// stays authoritative for the current tick.
pub struct SeriesStore<B: StoreBackend> {
    backend: B,
    policy: RetentionPolicy,
    offset: FixedOffset,
    series: Series,
    loaded: bool,
    resets: u64,
}

impl<B: StoreBackend> SeriesStore<B> {
    // Nothing is read until the first load; an append before that loads implicitly
    pub fn open(backend: B, policy: RetentionPolicy, offset: FixedOffset) -> Self {
        SeriesStore {
            backend,
            policy,
            offset,
            series: Series::new(),
            loaded: false,
            resets: 0,
        }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // Last loaded or appended state, without touching the backend
    pub fn series(&self) -> &Series {
        &self.series
    }

    // How many times history has been discarded since the store was opened
    pub fn resets(&self) -> u64 {
        self.resets
    }

    // Current wall-clock time in the store's fixed offset
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    pub fn load(&mut self) -> &Series {
        let now = self.now();
        self.load_at(now)
    }

    /// Reads the persisted series, resetting when it is absent, unreadable, mismatched or stale.
    pub fn load_at(&mut self, now: DateTime<FixedOffset>) -> &Series {
        let contents = match self.backend.read() {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                log::info!("No series found at {}, starting empty", self.backend.describe());
                return self.start_empty();
            }
            Err(err) => {
                log::warn!("Failed to read {}: {}", self.backend.describe(), err);
                return self.reset();
            }
        };

        let series = match codec::decode(&contents, self.offset, &self.policy) {
            Ok(series) => series,
            Err(err) => {
                log::warn!("Discarding series at {}: {}", self.backend.describe(), err);
                return self.reset();
            }
        };

        if let Some(newest) = series.newest_timestamp() {
            if self.policy.is_stale(newest, now) {
                log::warn!(
                    "Newest observation at {} is older than {} minutes, resetting series",
                    newest.format(crate::series::TIMESTAMP_FORMAT),
                    self.policy.staleness.num_minutes()
                );
                return self.reset();
            }
        }

        log::debug!("Loaded {} observation(s) from {}", series.len(), self.backend.describe());
        self.series = series;
        self.loaded = true;
        &self.series
    }

    pub fn append(&mut self, observation: Observation) -> &Series {
        if !self.loaded {
            self.load();
        }
        if !self.series.push(observation, &self.policy) {
            log::warn!("Observation rejected, series left at {} entries", self.series.len());
        }
        self.persist();
        &self.series
    }

    // Discards all history and persists the empty series
    pub fn reset(&mut self) -> &Series {
        self.resets += 1;
        self.start_empty()
    }

    fn start_empty(&mut self) -> &Series {
        self.series = Series::new();
        self.loaded = true;
        self.persist();
        &self.series
    }

    fn persist(&mut self) {
        let result = codec::encode(&self.series).and_then(|bytes| self.backend.write(&bytes));
        if let Err(err) = result {
            log::error!("Failed to persist series to {}: {}", self.backend.describe(), err);
        }
    }
}
