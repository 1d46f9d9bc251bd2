use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::{Result, SearchError};
use crate::tokenizer::terms;

pub type DocId = u32;

/// One line of one corpus file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: DocId,
    /// File name relative to the corpus root
    pub filename: String,
    /// 0-based line position within the file
    pub line_number: u32,
    /// Raw line text, line terminator included
    pub content: String,
}

/// Append-only `doc_id -> Document` store. Ids are dense, so the id is the slot.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DocStore {
    docs: Vec<Document>,
}

impl DocStore {
    pub fn new() -> Self { Self::default() }

    /// Id the next `push` will assign.
    pub fn next_id(&self) -> DocId { self.docs.len() as DocId }

    /// Append a line and return its freshly assigned id.
    pub fn push(&mut self, filename: &str, line_number: u32, content: String) -> DocId {
        let doc_id = self.next_id();
        self.docs.push(Document { doc_id, filename: filename.to_string(), line_number, content });
        doc_id
    }

    pub fn get(&self, doc_id: DocId) -> Result<&Document> {
        self.docs.get(doc_id as usize).ok_or(SearchError::DocumentNotFound(doc_id))
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Document> { self.docs.iter() }
}

/// Term -> postings. Each postings list is sorted ascending by doc id
/// because documents are inserted in id order.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<DocId>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Record every distinct term of `content` once for `doc_id`.
    /// Callers must add documents in increasing id order.
    pub fn add_document(&mut self, doc_id: DocId, content: &str) {
        let distinct: BTreeSet<String> = terms(content).collect();
        for term in distinct {
            self.postings.entry(term).or_default().push(doc_id);
        }
    }

    pub fn postings(&self, term: &str) -> &[DocId] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }
}

/// Descriptive header persisted next to the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

/// A fully built, read-only index: postings plus the document store they point into.
#[derive(Debug, Clone)]
pub struct Index {
    pub inverted: InvertedIndex,
    pub docs: DocStore,
    pub meta: IndexMeta,
}

impl Index {
    pub fn num_docs(&self) -> usize { self.docs.len() }
}
