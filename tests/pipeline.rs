//! End-to-end index and search over a temporary workspace, wired the way the binary
//! wires it but with the mock embedder and the in-memory store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use codescope_core::Config;
use codescope_core::bootstrap::{create_indexer_config, create_retrieval_config};
use codescope_embed::mock::MockEmbedder;
use codescope_embed::{Embedder, ProviderConfig};
use codescope_index::{CodeIndexer, CodeRetriever, IndexProgress};
use codescope_store::{
    BoxFuture, CollectionSpec, InMemoryVectorStore, ScoredVectorPoint, VectorPoint, VectorStore,
    VectorStoreError,
};
use tokio_util::sync::CancellationToken;

/// In-memory store that counts upsert and search requests.
#[derive(Default)]
struct RecordingStore {
    inner: InMemoryVectorStore,
    upserts: AtomicUsize,
    searches: AtomicUsize,
}

impl VectorStore for RecordingStore {
    fn collection_info(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<Option<CollectionSpec>, VectorStoreError>> {
        self.inner.collection_info(collection)
    }

    fn create_collection(
        &self,
        spec: &CollectionSpec,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        self.inner.create_collection(spec)
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(collection, points)
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.inner.search(collection, vector, top_k)
    }

    fn delete_by_file(
        &self,
        collection: &str,
        file: &str,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        self.inner.delete_by_file(collection, file)
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        self.inner.delete_collection(collection)
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    root: PathBuf,
    store: Arc<RecordingStore>,
    mock: MockEmbedder,
    indexer: CodeIndexer,
    retriever: CodeRetriever,
    config: Config,
}

fn harness(files: &[(&str, String)], tweak: impl FnOnce(&mut Config)) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("repo");
    for (rel, content) in files {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    std::fs::create_dir_all(&root).unwrap();

    let mut config = Config {
        collection: "repo_vectors".into(),
        ..Config::default()
    };
    tweak(&mut config);
    config.validate().unwrap();

    let store = Arc::new(RecordingStore::default());
    let mock = MockEmbedder::new(32);
    let embedder = Arc::new(Embedder::new(ProviderConfig::Mock(mock.clone())));
    let indexer = CodeIndexer::new(
        store.clone(),
        embedder.clone(),
        create_indexer_config(&config).unwrap(),
    );
    let retriever = CodeRetriever::new(store.clone(), embedder, create_retrieval_config(&config));

    Harness {
        _dir: dir,
        root,
        store,
        mock,
        indexer,
        retriever,
        config,
    }
}

fn numbered(prefix: &str, lines: usize) -> String {
    (1..=lines)
        .map(|i| format!("{prefix} line {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn root(h: &Harness) -> &Path {
    &h.root
}

#[tokio::test]
async fn index_then_search_finds_each_file_once() {
    let h = harness(
        &[
            ("a.py", numbered("alpha", 65)),
            ("src/b.rs", "fn connect_database() {}\nfn retry_connection() {}".into()),
            ("web/c.ts", "export function renderButton() {}".into()),
        ],
        |_| {},
    );

    let report = h
        .indexer
        .index_workspace(root(&h), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.files_indexed, 3);
    assert_eq!(report.points_upserted, 5 + 1 + 1);

    let starts: Vec<usize> = h
        .store
        .inner
        .points(&h.config.collection)
        .iter()
        .filter(|p| p.payload.file == "a.py")
        .map(|p| p.payload.start)
        .collect();
    assert_eq!(starts, vec![1, 16, 31, 46, 61]);

    let results = h.retriever.search("alpha line 40").await.unwrap();
    assert_eq!(results[0].file, "a.py");
    let mut files: Vec<&str> = results.iter().map(|r| r.file.as_str()).collect();
    let total = files.len();
    files.sort_unstable();
    files.dedup();
    assert_eq!(files.len(), total);
    assert_eq!(
        results[0].open_target().resolve(root(&h)),
        root(&h).join("a.py")
    );
}

#[tokio::test]
async fn blank_query_never_reaches_the_store() {
    let h = harness(&[("a.py", "x = 1".into())], |_| {});
    h.indexer
        .index_workspace(root(&h), &CancellationToken::new())
        .await
        .unwrap();
    let calls_before = h.mock.calls();

    assert!(h.retriever.search("  ").await.unwrap().is_empty());
    assert_eq!(h.store.searches.load(Ordering::SeqCst), 0);
    assert_eq!(h.mock.calls(), calls_before);
}

#[tokio::test]
async fn upsert_calls_are_ceiling_of_chunks_over_batch() {
    // 10 files of one chunk, batch size 4
    let files: Vec<(String, String)> = (0..10)
        .map(|i| (format!("f{i:02}.go"), format!("package f{i}")))
        .collect();
    let refs: Vec<(&str, String)> = files.iter().map(|(p, c)| (p.as_str(), c.clone())).collect();
    let h = harness(&refs, |c| c.batch_size = 4);

    h.indexer
        .index_workspace(root(&h), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(h.store.upserts.load(Ordering::SeqCst), 3);
    assert_eq!(h.store.inner.points(&h.config.collection).len(), 10);
}

#[tokio::test]
async fn cancel_after_file_three_of_ten() {
    let files: Vec<(String, String)> = (0..10)
        .map(|i| (format!("f{i:02}.java"), format!("class F{i} {{}}")))
        .collect();
    let refs: Vec<(&str, String)> = files.iter().map(|(p, c)| (p.as_str(), c.clone())).collect();
    let h = harness(&refs, |c| c.batch_size = 1);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let indexer = CodeIndexer::new(
        h.store.clone(),
        Arc::new(Embedder::new(ProviderConfig::Mock(h.mock.clone()))),
        create_indexer_config(&h.config).unwrap(),
    )
    .with_progress(Arc::new(move |p: &IndexProgress| {
        if p.done == 3 {
            trigger.cancel();
        }
    }));
    let calls_before = h.mock.calls();

    let report = indexer.index_workspace(root(&h), &cancel).await.unwrap();

    assert!(report.cancelled);
    let mut indexed: Vec<String> = h
        .store
        .inner
        .points(&h.config.collection)
        .into_iter()
        .map(|p| p.payload.file)
        .collect();
    indexed.sort();
    assert_eq!(indexed, vec!["f00.java", "f01.java", "f02.java"]);
    assert_eq!(h.store.upserts.load(Ordering::SeqCst), 3);
    // init probe plus one embed per indexed file
    assert_eq!(h.mock.calls() - calls_before, 4);
}

#[tokio::test]
async fn incremental_update_and_removal() {
    let h = harness(
        &[("a.py", numbered("old", 65)), ("b.py", "def keep(): pass".into())],
        |_| {},
    );
    h.indexer
        .index_workspace(root(&h), &CancellationToken::new())
        .await
        .unwrap();

    std::fs::write(root(&h).join("a.py"), "def new_body(): pass").unwrap();
    h.indexer
        .update_files(root(&h), &[PathBuf::from("a.py")])
        .await
        .unwrap();
    assert_eq!(h.store.inner.count_for_file(&h.config.collection, "a.py"), 1);

    std::fs::remove_file(root(&h).join("b.py")).unwrap();
    h.indexer
        .remove_files(root(&h), &[root(&h).join("b.py")])
        .await
        .unwrap();
    assert_eq!(h.store.inner.count_for_file(&h.config.collection, "b.py"), 0);
    assert_eq!(h.store.inner.count_for_file(&h.config.collection, "a.py"), 1);
}

#[tokio::test]
async fn search_before_index_reports_missing_collection() {
    let h = harness(&[], |_| {});
    let err = h.retriever.search("anything").await.unwrap_err();
    assert!(err.to_string().contains("run index first"));
}
