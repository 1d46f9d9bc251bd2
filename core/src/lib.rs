pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod index;
pub mod persist;
pub mod query;
pub mod tokenizer;

pub use builder::{build_in_memory, build_index, IndexBuilder};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Result, SearchError};
pub use highlight::{assemble, highlight, FileMatches, LineMatch, QueryResult};
pub use index::{DocId, DocStore, Document, Index, IndexMeta, InvertedIndex};
pub use query::{parse, Query, SearchHits};
pub use tokenizer::{tokenize, Token};
