use std::path::{Path, PathBuf};

pub const DEFAULT_CORPUS_PATH: &str = "/golem/in";
pub const DEFAULT_OUTPUT_PATH: &str = "/golem/out";

/// Where the engine reads its corpus and keeps its index when a caller
/// leaves the location blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub corpus_path: PathBuf,
    /// The index itself lives in `<output_path>/index`.
    pub output_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { corpus_path: PathBuf::from(DEFAULT_CORPUS_PATH), output_path: PathBuf::from(DEFAULT_OUTPUT_PATH) }
    }
}

/// True for a non-empty string made only of whitespace. The empty string is
/// not blank: callers that pass `""` get `""`.
pub fn is_blank(arg: &str) -> bool {
    !arg.is_empty() && arg.chars().all(char::is_whitespace)
}

fn resolve(arg: &str, default: &Path) -> PathBuf {
    if is_blank(arg) { default.to_path_buf() } else { PathBuf::from(arg) }
}

impl EngineConfig {
    pub fn new(corpus_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self { corpus_path: corpus_path.into(), output_path: output_path.into() }
    }

    pub fn resolve_corpus(&self, arg: &str) -> PathBuf { resolve(arg, &self.corpus_path) }

    pub fn resolve_output(&self, arg: &str) -> PathBuf { resolve(arg, &self.output_path) }
}
