//! Search engine error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::DocId;

/// Errors surfaced by index building, loading and querying.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Corpus directory missing, unreadable, or holding no files
    #[error("cannot read corpus at {path}: {reason}")]
    CorpusAccess { path: PathBuf, reason: String },

    /// Malformed query (unterminated quote, unbalanced parenthesis, dangling operator)
    #[error("query syntax error at offset {offset}: {message}")]
    QuerySyntax { offset: usize, message: String },

    #[error("empty query")]
    EmptyQuery,

    /// Search attempted before any successful build
    #[error("no index has been built at {0}")]
    IndexNotBuilt(PathBuf),

    #[error("document {0} not found in document store")]
    DocumentNotFound(DocId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SearchError {
    pub(crate) fn corpus(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SearchError::CorpusAccess { path: path.into(), reason: reason.to_string() }
    }

    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        SearchError::QuerySyntax { offset, message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
