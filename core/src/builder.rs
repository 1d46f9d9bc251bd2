use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;
use walkdir::WalkDir;

use crate::error::{Result, SearchError};
use crate::persist::commit_index;
use crate::{DocId, DocStore, Index, IndexMeta, InvertedIndex};

pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Accumulates documents and postings; `finish` seals them into an [`Index`].
#[derive(Default)]
pub struct IndexBuilder {
    inverted: InvertedIndex,
    docs: DocStore,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn add_line(&mut self, filename: &str, line_number: u32, content: String) -> DocId {
        self.inverted.add_document(self.docs.next_id(), &content);
        self.docs.push(filename, line_number, content)
    }

    /// Index every line of one file, in file order.
    pub fn add_file(&mut self, filename: &str, path: &Path) -> Result<u32> {
        let f = File::open(path).map_err(|e| SearchError::corpus(path, e))?;
        let mut text = String::new();
        BufReader::new(f).read_to_string(&mut text).map_err(|e| SearchError::corpus(path, e))?;
        let mut line_number = 0u32;
        for line in split_lines(&text) {
            self.add_line(filename, line_number, line);
            line_number += 1;
        }
        tracing::debug!(filename, lines = line_number, "ingested file");
        Ok(line_number)
    }

    pub fn finish(self) -> Index {
        let meta = IndexMeta {
            num_docs: self.docs.len() as u32,
            num_terms: self.inverted.num_terms() as u32,
            created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "".into()),
            version: INDEX_FORMAT_VERSION,
        };
        Index { inverted: self.inverted, docs: self.docs, meta }
    }
}

/// Split on `\n`, `\r\n` or a lone `\r`, rewriting each terminator to `\n`.
/// A final line without terminator is kept as is.
pub fn split_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let Some(i) = rest.find(|c: char| c == '\n' || c == '\r') else {
            let last = rest.to_string();
            rest = "";
            return Some(last);
        };
        let width = if rest[i..].starts_with("\r\n") { 2 } else { 1 };
        let line = format!("{}\n", &rest[..i]);
        rest = &rest[i + width..];
        Some(line)
    })
}

/// Regular files directly under `corpus_dir`, in directory-listing order.
fn corpus_files(corpus_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let md = fs::metadata(corpus_dir).map_err(|e| SearchError::corpus(corpus_dir, e))?;
    if !md.is_dir() {
        return Err(SearchError::corpus(corpus_dir, "not a directory"));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(corpus_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| SearchError::corpus(corpus_dir, e))?;
        let p = entry.path();
        if !p.is_file() {
            tracing::warn!(path = %p.display(), "skipping non-file corpus entry");
            continue;
        }
        files.push((entry.file_name().to_string_lossy().into_owned(), p.to_path_buf()));
    }
    if files.is_empty() {
        return Err(SearchError::corpus(corpus_dir, "directory contains no files"));
    }
    Ok(files)
}

/// Read the whole corpus into a fresh in-memory index without touching disk.
pub fn build_in_memory(corpus_dir: &Path) -> Result<Index> {
    let files = corpus_files(corpus_dir)?;
    let mut builder = IndexBuilder::new();
    for (filename, path) in &files {
        builder.add_file(filename, path)?;
    }
    Ok(builder.finish())
}

/// Build an index from every line of every file in `corpus_dir` and persist
/// it as `<output_dir>/index`, replacing any earlier index there.
///
/// The corpus is read completely before the old index is removed, so a
/// `CorpusAccess` failure leaves the previous index in place.
pub fn build_index(corpus_dir: &Path, output_dir: &Path) -> Result<Index> {
    tracing::info!(corpus = %corpus_dir.display(), output = %output_dir.display(), "building index");
    let index = build_in_memory(corpus_dir)?;
    let paths = commit_index(output_dir, &index)?;
    tracing::info!(
        num_docs = index.meta.num_docs,
        num_terms = index.meta.num_terms,
        path = %paths.root.display(),
        "index build complete"
    );
    Ok(index)
}
