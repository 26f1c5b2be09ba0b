//! Bounded LRU cache for query embeddings.
//!
//! Keyed by exact query text. Read-mostly: hits take the write path only to
//! refresh recency. The size cap keeps the cache from growing without bound
//! under a stream of distinct queries.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

pub struct EmbeddingCache {
    max_size: usize,
    entries: RwLock<HashMap<String, Vec<f32>>>,
    access_order: RwLock<VecDeque<String>>,
}

impl EmbeddingCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            entries: RwLock::new(HashMap::new()),
            access_order: RwLock::new(VecDeque::new()),
        }
    }

    pub fn get(&self, query: &str) -> Option<Vec<f32>> {
        // Recency is refreshed while the entries lock is still held, so a
        // concurrent `put` cannot evict between the lookup and the refresh
        // and leave a stale key in the order. Lock order (entries, then
        // access_order) matches `put`.
        let entries = self.entries.read().unwrap();
        let hit = entries.get(query).cloned();
        if hit.is_some() {
            let mut access_order = self.access_order.write().unwrap();
            access_order.retain(|k| k != query);
            access_order.push_front(query.to_string());
        }
        hit
    }

    pub fn put(&self, query: &str, embedding: Vec<f32>) {
        let mut entries = self.entries.write().unwrap();
        let mut access_order = self.access_order.write().unwrap();

        while !entries.contains_key(query) && entries.len() >= self.max_size {
            match access_order.pop_back() {
                Some(oldest) => {
                    entries.remove(&oldest);
                }
                None => break,
            }
        }

        entries.insert(query.to_string(), embedding);
        access_order.retain(|k| k != query);
        access_order.push_front(query.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
