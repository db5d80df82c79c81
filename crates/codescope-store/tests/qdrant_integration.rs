//! Requires Docker. Run with `cargo test -p codescope-store -- --ignored`.

use codescope_store::{
    ChunkPayload, CollectionSpec, DistanceMetric, EnsureOutcome, QdrantStore, VectorPoint,
    VectorStore, VectorStoreError,
};
use testcontainers::ContainerAsync;
use testcontainers::GenericImage;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;

const QDRANT_GRPC_PORT: ContainerPort = ContainerPort::Tcp(6334);

fn qdrant_image() -> GenericImage {
    GenericImage::new("qdrant/qdrant", "v1.16.0")
        .with_wait_for(WaitFor::message_on_stdout("gRPC listening"))
        .with_exposed_port(QDRANT_GRPC_PORT)
}

async fn setup() -> (QdrantStore, ContainerAsync<GenericImage>) {
    let container = qdrant_image().start().await.unwrap();
    let grpc_port = container.get_host_port_ipv4(6334).await.unwrap();
    let store = QdrantStore::new(&format!("http://127.0.0.1:{grpc_port}"), None).unwrap();
    (store, container)
}

fn point(vector: Vec<f32>, file: &str, start: usize) -> VectorPoint {
    VectorPoint::new(
        vector,
        ChunkPayload {
            file: file.into(),
            start,
            text: format!("// {file} line {start}"),
        },
    )
}

#[tokio::test]
#[ignore = "requires docker"]
async fn ensure_collection_is_idempotent_and_detects_mismatch() {
    let (store, _container) = setup().await;
    let spec = CollectionSpec::new("it_vectors", 4, DistanceMetric::Cosine);

    assert_eq!(
        store.ensure_collection(&spec).await.unwrap(),
        EnsureOutcome::Created
    );
    assert_eq!(
        store.ensure_collection(&spec).await.unwrap(),
        EnsureOutcome::Existing
    );
    assert_eq!(store.collection_info("it_vectors").await.unwrap(), Some(spec));

    let err = store
        .ensure_collection(&CollectionSpec::new("it_vectors", 8, DistanceMetric::Cosine))
        .await
        .unwrap_err();
    assert!(matches!(err, VectorStoreError::DimensionMismatch { .. }));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn upsert_search_and_delete_by_file() {
    let (store, _container) = setup().await;
    store
        .ensure_collection(&CollectionSpec::new("it_code", 3, DistanceMetric::Cosine))
        .await
        .unwrap();

    store
        .upsert(
            "it_code",
            vec![
                point(vec![1.0, 0.0, 0.0], "src/a.rs", 1),
                point(vec![0.9, 0.1, 0.0], "src/a.rs", 16),
                point(vec![0.0, 1.0, 0.0], "src/b.rs", 1),
            ],
        )
        .await
        .unwrap();

    let hits = store.search("it_code", vec![1.0, 0.0, 0.0], 10).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].payload.file, "src/a.rs");
    assert_eq!(hits[0].payload.start, 1);

    store.delete_by_file("it_code", "src/a.rs").await.unwrap();
    let hits = store.search("it_code", vec![1.0, 0.0, 0.0], 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].payload.file, "src/b.rs");

    store.delete_collection("it_code").await.unwrap();
    assert!(store.collection_info("it_code").await.unwrap().is_none());
}
