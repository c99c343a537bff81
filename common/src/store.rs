use std::path::Path;

use eyre::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::fs::{read_to_string, try_exists, write};
use tracing::debug;

/// Samples collected for one thread count, serialized as `[threads, [samples...]]`
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSamples(pub usize, pub Vec<f64>);

impl ThreadSamples {
    pub fn threads(&self) -> usize {
        self.0
    }

    pub fn samples(&self) -> &[f64] {
        &self.1
    }
}

pub type SizeEntries = IndexMap<String, Vec<ThreadSamples>>;

/// Throughput samples keyed by test name, then dataset size, then thread count.
///
/// Key order follows insertion and survives a save/load cycle.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultStore {
    tests: IndexMap<String, SizeEntries>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a store from `path`, or returns an empty one if the file does not exist.
    /// A file that exists but cannot be read or parsed is an error.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let exists = try_exists(path)
            .await
            .context(format!("Check result file {}", path.display()))?;
        if !exists {
            debug!("No result file at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        Self::read(path).await
    }

    /// Reads every file and overlays them in order, see [`ResultStore::merge_store`]
    pub async fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut store = Self::new();
        for path in paths {
            store.merge_store(Self::read(path.as_ref()).await?);
        }
        Ok(store)
    }

    async fn read(path: &Path) -> Result<Self> {
        let data = read_to_string(path)
            .await
            .context(format!("Read result file {}", path.display()))?;
        serde_json::from_str(&data).context(format!("Parse result file {}", path.display()))
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = serde_json::to_string_pretty(self)?;
        write(path, data)
            .await
            .context(format!("Write result file {}", path.display()))?;
        debug!("Saved {} tests to {}", self.tests.len(), path.display());
        Ok(())
    }

    /// Entries for `(test, size)`, inserting empty ones if either key is new
    pub fn get_or_create(&mut self, test: &str, size: &str) -> &mut Vec<ThreadSamples> {
        self.tests
            .entry(test.to_owned())
            .or_default()
            .entry(size.to_owned())
            .or_default()
    }

    /// Extends the samples of an existing thread count, or appends a new entry for it
    pub fn merge_samples(&mut self, test: &str, size: &str, threads: usize, samples: Vec<f64>) {
        let entries = self.get_or_create(test, size);
        match entries.iter_mut().find(|entry| entry.0 == threads) {
            Some(entry) => entry.1.extend(samples),
            None => entries.push(ThreadSamples(threads, samples)),
        }
    }

    /// Overlays `other` onto `self` one size at a time. A size present in both
    /// stores is replaced wholesale by the entries from `other`.
    pub fn merge_store(&mut self, other: ResultStore) {
        for (test, sizes) in other.tests {
            let target = self.tests.entry(test).or_default();
            for (size, entries) in sizes {
                target.insert(size, entries);
            }
        }
    }

    pub fn get(&self, test: &str, size: &str) -> Option<&[ThreadSamples]> {
        self.tests
            .get(test)
            .and_then(|sizes| sizes.get(size))
            .map(|x| x.as_slice())
    }

    pub fn tests(&self) -> impl Iterator<Item = (&str, &SizeEntries)> {
        self.tests.iter().map(|(test, sizes)| (test.as_str(), sizes))
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
