//! Property tests for the in-memory vector store.

use pdfrag_store::{ChunkInsert, MemoryVectorStore, VectorStore};
use proptest::prelude::*;

fn embeddings(dims: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-1.0f32..1.0, dims), 1..40)
}

fn inserts(vectors: &[Vec<f32>]) -> Vec<ChunkInsert> {
    vectors
        .iter()
        .enumerate()
        .map(|(i, v)| ChunkInsert {
            source: format!("doc{}.pdf", i % 3),
            page_number: 1,
            chunk_index: i,
            start_index: 0,
            content: format!("chunk {i}"),
            embedding: v.clone(),
        })
        .collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn results_are_sorted_and_bounded(
        vectors in embeddings(4),
        query in prop::collection::vec(-1.0f32..1.0, 4),
        k in 0usize..50,
    ) {
        let rt = runtime();
        let results = rt.block_on(async {
            let store = MemoryVectorStore::new();
            store.upsert("c", inserts(&vectors)).await.unwrap();
            store.query("c", &query, k).await.unwrap()
        });

        prop_assert_eq!(results.len(), k.min(vectors.len()));
        for pair in results.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
        for r in &results {
            prop_assert!(r.score >= -1.0 - 1e-4 && r.score <= 1.0 + 1e-4);
        }
    }

    #[test]
    fn chunk_counts_add_up(vectors in embeddings(3)) {
        let rt = runtime();
        let total: usize = rt.block_on(async {
            let store = MemoryVectorStore::new();
            store.upsert("c", inserts(&vectors)).await.unwrap();
            store.documents("c").await.unwrap()
        })
        .iter()
        .map(|d| d.chunk_count)
        .sum();

        prop_assert_eq!(total, vectors.len());
    }
}
