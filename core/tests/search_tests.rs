use ftse_core::config::EngineConfig;
use ftse_core::persist::{load_index, IndexPaths};
use ftse_core::{build_index, Engine, SearchError};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn write_corpus(dir: &Path) {
    fs::write(dir.join("a.txt"), "golem network\nhello golem\n").unwrap();
}

fn engine_for(corpus: &Path, out: &Path) -> Engine {
    Engine::new(EngineConfig::new(corpus, out))
}

#[test]
fn search_returns_grouped_highlights() {
    let corpus = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_corpus(corpus.path());

    let engine = engine_for(corpus.path(), out.path());
    assert!(engine.init(" ", " ").unwrap());

    let json: Value = serde_json::from_str(&engine.search("golem").unwrap()).unwrap();
    assert_eq!(
        json,
        json!([{
            "filename": "a.txt",
            "lines": [
                { "line_number": 0, "positions": [0] },
                { "line_number": 1, "positions": [6] }
            ]
        }])
    );
}

#[test]
fn empty_query_fails_and_unknown_term_is_empty() {
    let corpus = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_corpus(corpus.path());
    let engine = engine_for(corpus.path(), out.path());
    engine.init(" ", " ").unwrap();

    assert!(matches!(engine.search(""), Err(SearchError::EmptyQuery)));
    assert_eq!(engine.search("zzz_not_present").unwrap(), "[]");
    assert!(matches!(engine.search("(golem"), Err(SearchError::QuerySyntax { .. })));
}

#[test]
fn search_before_init_is_index_not_built() {
    let out = tempdir().unwrap();
    let engine = engine_for(Path::new("/nonexistent"), out.path());
    assert!(matches!(engine.search("golem"), Err(SearchError::IndexNotBuilt(_))));
}

#[test]
fn unreadable_corpus_keeps_previous_index() {
    let corpus = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_corpus(corpus.path());
    build_index(corpus.path(), out.path()).unwrap();

    let empty = tempdir().unwrap();
    let err = build_index(empty.path(), out.path()).unwrap_err();
    assert!(matches!(err, SearchError::CorpusAccess { .. }));
    let err = build_index(&corpus.path().join("missing"), out.path()).unwrap_err();
    assert!(matches!(err, SearchError::CorpusAccess { .. }));

    let index = load_index(&IndexPaths::under(out.path())).unwrap();
    assert_eq!(index.meta.num_docs, 2);
}

#[test]
fn rebuild_is_destructive_and_idempotent() {
    let corpus = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_corpus(corpus.path());
    fs::write(corpus.path().join("b.txt"), "Network of golems\n\nGOLEM").unwrap();

    let first = build_index(corpus.path(), out.path()).unwrap();
    let second = build_index(corpus.path(), out.path()).unwrap();
    for q in ["golem", "network", "golems OR hello", "NOT golem", "\"hello golem\""] {
        assert_eq!(first.query(q).unwrap(), second.query(q).unwrap(), "query {q}");
    }
    let leftovers: Vec<_> = fs::read_dir(out.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|name| name != "index")
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");

    // Drop a file and rebuild: its lines disappear.
    fs::remove_file(corpus.path().join("b.txt")).unwrap();
    let third = build_index(corpus.path(), out.path()).unwrap();
    assert_eq!(third.meta.num_docs, 2);
    let reloaded = load_index(&IndexPaths::under(out.path())).unwrap();
    assert!(reloaded.query("golems").unwrap().is_empty());
}

#[test]
fn every_token_of_every_line_is_findable() {
    let corpus = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(corpus.path().join("one.txt"), "A quick test, of THE engine\nline2 has 42 tokens\n").unwrap();
    fs::write(corpus.path().join("two.txt"), "naïve café-au-lait\n").unwrap();
    let index = build_index(corpus.path(), out.path()).unwrap();

    for doc in index.docs.iter() {
        for token in ftse_core::tokenize(&doc.content) {
            let result = index.query(&token.term).unwrap();
            let file = result.files.iter().find(|f| f.filename == doc.filename).unwrap();
            let line = file.lines.iter().find(|l| l.line_number == doc.line_number).unwrap();
            assert!(line.positions.contains(&token.start), "{} in {:?}", token.term, doc.content);
        }
    }
}

#[test]
fn persisted_index_serves_a_fresh_engine() {
    let corpus = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_corpus(corpus.path());
    engine_for(corpus.path(), out.path()).init(" ", " ").unwrap();

    let fresh = engine_for(corpus.path(), out.path());
    assert_eq!(fresh.stats().unwrap().num_docs, 2);
    assert!(fresh.search("hello").unwrap().contains("\"positions\":[0]"));
    assert_eq!(fresh.dump("a.txt").unwrap(), "golem network\nhello golem\n");
    let path = corpus.path().join("a.txt");
    assert_eq!(fresh.read_file(&path.to_string_lossy()).unwrap(), fresh.dump("a.txt").unwrap());
}

#[test]
fn overlapping_rebuilds_all_succeed() {
    let corpus = tempdir().unwrap();
    let out = tempdir().unwrap();
    for i in 0..30 {
        fs::write(corpus.path().join(format!("f{i}.txt")), format!("golem line {i}\nnetwork {i}\n")).unwrap();
    }
    let engine = Arc::new(engine_for(corpus.path(), out.path()));

    let builders: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..20 {
                    engine.init(" ", " ").unwrap();
                }
            })
        })
        .collect();
    for b in builders {
        b.join().unwrap();
    }

    let reloaded = load_index(&IndexPaths::under(out.path())).unwrap();
    assert_eq!(reloaded.meta.num_docs, 60);
    assert_eq!(engine.search_result("golem").unwrap().files.len(), 30);
}

#[test]
fn rebuild_uses_configured_paths() {
    let corpus = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_corpus(corpus.path());
    let engine = engine_for(corpus.path(), out.path());
    assert_eq!(engine.config().output_path, out.path());

    assert!(engine.rebuild().unwrap());
    assert!(out.path().join("index").join("meta.json").exists());
    assert_eq!(engine.stats().unwrap().num_docs, 2);
}

#[test]
fn concurrent_searches_see_whole_indexes_across_rebuilds() {
    let corpus = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_corpus(corpus.path());
    let engine = Arc::new(engine_for(corpus.path(), out.path()));
    engine.init(" ", " ").unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..50 {
                    let result = engine.search_result("golem").unwrap();
                    assert_eq!(result.files.len(), 1);
                    assert_eq!(result.files[0].lines.len(), 2);
                }
            })
        })
        .collect();
    for _ in 0..5 {
        engine.init(" ", " ").unwrap();
    }
    for r in readers {
        r.join().unwrap();
    }
}
