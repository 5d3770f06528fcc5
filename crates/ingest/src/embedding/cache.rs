use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lru::LruCache;
use tracing::debug;

use super::traits::{Embedder, EmbeddingError};

/// Bounded text → vector map with hit accounting.
///
/// Keys are the full input text, so two different strings never share a slot.
pub struct EmbeddingCache {
    entries: LruCache<String, Vec<f32>>,
    hits: u64,
    lookups: u64,
}

impl EmbeddingCache {
    /// A zero capacity is bumped to one entry.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            hits: 0,
            lookups: 0,
        }
    }

    pub fn lookup(&mut self, text: &str) -> Option<Vec<f32>> {
        self.lookups += 1;
        let found = self.entries.get(text).cloned();
        if found.is_some() {
            self.hits += 1;
        }
        found
    }

    pub fn insert(&mut self, text: &str, embedding: Vec<f32>) {
        self.entries.put(text.to_owned(), embedding);
    }

    pub fn hit_rate(&self) -> f64 {
        match self.lookups {
            0 => 0.0,
            n => self.hits as f64 / n as f64,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Caching embedder ────────────────────────────────────────────────

/// Answers repeated texts (typically re-asked questions) from memory and
/// forwards only the misses to the wrapped backend.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Mutex<EmbeddingCache>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(EmbeddingCache::new(capacity)),
        }
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        // A poisoned lock degrades to an uncached pass-through.
        let (cached, hit_rate): (Vec<Option<Vec<f32>>>, f64) = match self.cache.lock() {
            Ok(mut cache) => {
                let cached = texts.iter().map(|t| cache.lookup(t)).collect();
                (cached, cache.hit_rate())
            }
            Err(_) => (vec![None; texts.len()], 0.0),
        };
        let misses: Vec<&str> = texts
            .iter()
            .zip(&cached)
            .filter(|(_, hit)| hit.is_none())
            .map(|(text, _)| *text)
            .collect();
        debug!(
            hits = texts.len() - misses.len(),
            misses = misses.len(),
            hit_rate,
            "Embedding cache lookup"
        );
        if misses.is_empty() {
            return Ok(cached.into_iter().flatten().collect());
        }

        let computed = self.inner.embed_batch(&misses).await?;
        if computed.len() != misses.len() {
            return Err(EmbeddingError::CountMismatch {
                sent: misses.len(),
                received: computed.len(),
            });
        }
        if let Ok(mut cache) = self.cache.lock() {
            for (text, vector) in misses.iter().zip(&computed) {
                cache.insert(text, vector.clone());
            }
        }

        let mut computed = computed.into_iter();
        Ok(cached
            .into_iter()
            .filter_map(|hit| hit.or_else(|| computed.next()))
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let mut cache = EmbeddingCache::new(2);
        cache.insert("first", vec![1.0]);
        cache.insert("second", vec![2.0]);
        assert!(cache.lookup("first").is_some());

        cache.insert("third", vec![3.0]);

        assert_eq!(cache.len(), 2);
        assert!(cache.lookup("second").is_none());
        assert_eq!(cache.lookup("first"), Some(vec![1.0]));
    }

    #[test]
    fn zero_capacity_still_holds_one_entry() {
        let mut cache = EmbeddingCache::new(0);
        assert!(cache.is_empty());
        cache.insert("q", vec![0.5]);
        assert_eq!(cache.lookup("q"), Some(vec![0.5]));
    }

    #[test]
    fn hit_rate_counts_lookups() {
        let mut cache = EmbeddingCache::new(4);
        assert_eq!(cache.hit_rate(), 0.0);

        cache.insert("known", vec![1.0]);
        cache.lookup("known");
        cache.lookup("unknown");
        cache.lookup("known");
        cache.lookup("other");

        assert!((cache.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    struct LengthEmbedder {
        texts_seen: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.texts_seen.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn only_misses_reach_the_backend() {
        let inner = Arc::new(LengthEmbedder {
            texts_seen: AtomicUsize::new(0),
        });
        let cached = CachedEmbedder::new(inner.clone(), 16);

        let first = cached.embed_batch(&["one", "three"]).await.unwrap();
        assert_eq!(first, vec![vec![3.0], vec![5.0]]);
        assert_eq!(inner.texts_seen.load(Ordering::SeqCst), 2);

        let second = cached.embed_batch(&["three", "four", "one"]).await.unwrap();
        assert_eq!(second, vec![vec![5.0], vec![4.0], vec![3.0]]);
        assert_eq!(inner.texts_seen.load(Ordering::SeqCst), 3);

        let query = cached.embed_query("four").await.unwrap();
        assert_eq!(query, vec![4.0]);
        assert_eq!(inner.texts_seen.load(Ordering::SeqCst), 3);
        let hit_rate = cached.cache.lock().unwrap().hit_rate();
        assert!((hit_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(cached.dimensions(), 1);
    }
}
