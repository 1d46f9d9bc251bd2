use crate::error::{Result, SearchError};
use crate::{DocStore, Index, IndexMeta, InvertedIndex};
use std::fs::{self, create_dir_all, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Name of the index directory inside the output location.
pub const INDEX_DIR: &str = "index";
const STAGING_PREFIX: &str = "index.partial";
const BACKUP_PREFIX: &str = "index.old";

static COMMIT_SEQ: AtomicU64 = AtomicU64::new(0);

/// `<output>/<prefix>-<pid>-<seq>`, unique per commit within and across processes.
fn scratch_dir(output: &Path, prefix: &str, seq: u64) -> PathBuf {
    output.join(format!("{prefix}-{}-{seq}", std::process::id()))
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    /// `<output>/index`
    pub fn under<P: AsRef<Path>>(output: P) -> Self {
        Self::new(output.as_ref().join(INDEX_DIR))
    }
    fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn save_postings(paths: &IndexPaths, inverted: &InvertedIndex) -> Result<()> {
    write_bytes(&paths.postings(), &bincode::serialize(inverted)?)
}

pub fn load_postings(paths: &IndexPaths) -> Result<InvertedIndex> {
    Ok(bincode::deserialize(&read_bytes(&paths.postings())?)?)
}

pub fn save_docs(paths: &IndexPaths, docs: &DocStore) -> Result<()> {
    write_bytes(&paths.docs(), &bincode::serialize(docs)?)
}

pub fn load_docs(paths: &IndexPaths) -> Result<DocStore> {
    Ok(bincode::deserialize(&read_bytes(&paths.docs())?)?)
}

pub fn save_meta(paths: &IndexPaths, meta: &IndexMeta) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_bytes(&paths.meta(), json.as_bytes())
}

/// A missing `meta.json` means no build ever completed here.
pub fn load_meta(paths: &IndexPaths) -> Result<IndexMeta> {
    let mut f = match File::open(paths.meta()) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(SearchError::IndexNotBuilt(paths.root.clone()))
        }
        Err(e) => return Err(e.into()),
    };
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

/// Write all index files into `paths.root`. Meta goes last, so its presence marks a complete index.
pub fn save_index(paths: &IndexPaths, index: &Index) -> Result<()> {
    create_dir_all(&paths.root)?;
    save_postings(paths, &index.inverted)?;
    save_docs(paths, &index.docs)?;
    save_meta(paths, &index.meta)
}

pub fn load_index(paths: &IndexPaths) -> Result<Index> {
    let meta = load_meta(paths)?;
    let inverted = load_postings(paths)?;
    let docs = load_docs(paths)?;
    Ok(Index { inverted, docs, meta })
}

/// Persist `index` as `<output>/index`, destroying whatever was there.
///
/// Files are written to a staging directory private to this commit. The old
/// index is renamed aside before the staging directory is renamed into place,
/// so `<output>/index` never holds a mix of old and new files.
pub fn commit_index(output: &Path, index: &Index) -> Result<IndexPaths> {
    create_dir_all(output)?;
    let seq = COMMIT_SEQ.fetch_add(1, Ordering::Relaxed);
    let staging = IndexPaths::new(scratch_dir(output, STAGING_PREFIX, seq));
    if let Err(e) = save_index(&staging, index) {
        let _ = fs::remove_dir_all(&staging.root);
        return Err(e);
    }

    let target = IndexPaths::under(output);
    let backup = scratch_dir(output, BACKUP_PREFIX, seq);
    let had_previous = match fs::rename(&target.root, &backup) {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => return Err(e.into()),
    };
    fs::rename(&staging.root, &target.root)?;
    if had_previous {
        fs::remove_dir_all(&backup)?;
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_without_build_is_index_not_built() {
        let dir = tempdir().unwrap();
        let err = load_index(&IndexPaths::under(dir.path())).unwrap_err();
        assert!(matches!(err, SearchError::IndexNotBuilt(_)));
    }

    fn sample_index(line: &str) -> Index {
        let mut b = crate::IndexBuilder::new();
        b.add_line("a.txt", 0, line.to_string());
        b.finish()
    }

    #[test]
    fn commit_replaces_index_and_leaves_no_scratch_dirs() {
        let dir = tempdir().unwrap();
        commit_index(dir.path(), &sample_index("old words")).unwrap();
        commit_index(dir.path(), &sample_index("new words")).unwrap();

        let entries: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec![INDEX_DIR.to_string()]);

        let loaded = load_index(&IndexPaths::under(dir.path())).unwrap();
        assert_eq!(loaded.inverted.postings("new"), &[0]);
        assert!(loaded.inverted.postings("old").is_empty());
    }
}
