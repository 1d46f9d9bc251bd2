use parking_lot::{Mutex, RwLock};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::builder::build_index;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::highlight::QueryResult;
use crate::persist::{load_index, IndexPaths};
use crate::{Index, IndexMeta};

/// Long-lived search service.
///
/// Holds the current index behind an `Arc`. Searches clone the `Arc` and run
/// without holding the lock; `init` builds a complete new index first and
/// only then swaps it in, so readers never see a partial build. Rebuilds
/// take turns on `building`, so the last `init` to start is the one left in place.
pub struct Engine {
    config: EngineConfig,
    current: RwLock<Option<Arc<Index>>>,
    building: Mutex<()>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, current: RwLock::new(None), building: Mutex::new(()) }
    }

    pub fn config(&self) -> &EngineConfig { &self.config }

    /// Rebuild from `corpus` into `output`. Blank arguments use the configured defaults.
    pub fn init(&self, corpus: &str, output: &str) -> Result<bool> {
        let corpus = self.config.resolve_corpus(corpus);
        let output = self.config.resolve_output(output);
        self.build_and_swap(&corpus, &output)
    }

    /// Rebuild from the configured corpus into the configured output.
    pub fn rebuild(&self) -> Result<bool> {
        self.build_and_swap(&self.config.corpus_path, &self.config.output_path)
    }

    fn build_and_swap(&self, corpus: &Path, output: &Path) -> Result<bool> {
        let _turn = self.building.lock();
        let index = Arc::new(build_index(corpus, output)?);
        *self.current.write() = Some(index);
        Ok(true)
    }

    /// The index searches run against. Falls back to whatever a previous
    /// process persisted under the configured output path.
    pub fn index(&self) -> Result<Arc<Index>> {
        if let Some(index) = self.current.read().clone() {
            return Ok(index);
        }
        let loaded = Arc::new(load_index(&IndexPaths::under(&self.config.output_path))?);
        tracing::debug!(num_docs = loaded.meta.num_docs, "loaded persisted index");
        let mut slot = self.current.write();
        // An init may have swapped a fresher index in while we were loading.
        Ok(slot.get_or_insert(loaded).clone())
    }

    pub fn search_result(&self, query: &str) -> Result<QueryResult> {
        self.index()?.query(query)
    }

    /// Search and serialize: `[{"filename", "lines": [{"line_number", "positions"}]}]`.
    pub fn search(&self, query: &str) -> Result<String> {
        self.search_result(query)?.to_json()
    }

    pub fn stats(&self) -> Result<IndexMeta> {
        Ok(self.index()?.meta.clone())
    }

    pub fn read_file(&self, path: &str) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    /// Contents of one corpus file, by name.
    pub fn dump(&self, filename: &str) -> Result<String> {
        Ok(fs::read_to_string(self.config.corpus_path.join(filename))?)
    }
}
