use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::Result;
use crate::query::SearchHits;
use crate::tokenizer::tokenize;
use crate::Index;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMatch {
    pub line_number: u32,
    /// Character offsets where matched tokens start, left to right
    pub positions: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMatches {
    pub filename: String,
    pub lines: Vec<LineMatch>,
}

/// Matched lines grouped by file. A file appears once, at the position where
/// its first matching line was encountered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryResult {
    pub files: Vec<FileMatches>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool { self.files.is_empty() }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Start offsets of every token in `content` whose term is in `matched_terms`.
pub fn highlight(content: &str, matched_terms: &BTreeSet<String>) -> Vec<usize> {
    if matched_terms.is_empty() {
        return Vec::new();
    }
    tokenize(content)
        .filter(|t| matched_terms.contains(&t.term))
        .map(|t| t.start)
        .collect()
}

/// Resolve hits through the document store and group highlighted lines by file.
pub fn assemble(index: &Index, hits: &SearchHits) -> Result<QueryResult> {
    let mut result = QueryResult::default();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for &doc_id in &hits.doc_ids {
        let doc = index.docs.get(doc_id)?;
        let line = LineMatch {
            line_number: doc.line_number,
            positions: highlight(&doc.content, &hits.matched_terms),
        };
        let slot = *slots.entry(doc.filename.as_str()).or_insert_with(|| {
            result.files.push(FileMatches { filename: doc.filename.clone(), lines: Vec::new() });
            result.files.len() - 1
        });
        result.files[slot].lines.push(line);
    }
    Ok(result)
}

impl Index {
    /// Search and assemble in one step.
    pub fn query(&self, query: &str) -> Result<QueryResult> {
        let hits = self.search(query)?;
        assemble(self, &hits)
    }
}
