use std::{
	collections::HashMap,
	sync::{Arc, Mutex, RwLock},
};

use time::{Duration, OffsetDateTime};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::retrieve::RetrievalResult;
use scout_domain::RetrievalFilter;

const RESULT_CACHE_SCHEMA_VERSION: i32 = 1;

/// TTL-bounded retrieval result cache. Reads are concurrent; writes go
/// through a per-key async mutex so each key is computed once per TTL window.
pub(crate) struct ResultCache {
	entries: RwLock<HashMap<String, CacheEntry>>,
	writers: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

struct CacheEntry {
	results: Vec<RetrievalResult>,
	expires_at: OffsetDateTime,
}

impl ResultCache {
	pub(crate) fn new() -> Self {
		Self { entries: RwLock::new(HashMap::new()), writers: Mutex::new(HashMap::new()) }
	}

	pub(crate) fn get(&self, key: &str, now: OffsetDateTime) -> Option<Vec<RetrievalResult>> {
		let expired = {
			let entries = self.entries.read().unwrap_or_else(|err| err.into_inner());
			let Some(entry) = entries.get(key) else {
				return None;
			};

			if entry.expires_at > now {
				return Some(entry.results.clone());
			}

			true
		};

		if expired {
			let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());

			// Re-check under the write lock; a fresh entry may have landed.
			if entries.get(key).map(|entry| entry.expires_at <= now).unwrap_or(false) {
				entries.remove(key);
			}
		}

		None
	}

	pub(crate) async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()> {
		let lock = {
			let mut writers = self.writers.lock().unwrap_or_else(|err| err.into_inner());

			writers.entry(key.to_string()).or_default().clone()
		};

		lock.lock_owned().await
	}

	pub(crate) fn store(
		&self,
		key: &str,
		results: Vec<RetrievalResult>,
		ttl_seconds: i64,
		now: OffsetDateTime,
	) {
		let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());

		entries.insert(
			key.to_string(),
			CacheEntry { results, expires_at: now + Duration::seconds(ttl_seconds) },
		);
	}
}

pub(crate) fn result_cache_key(
	query: &str,
	filter: &RetrievalFilter,
	top_k: u32,
	min_similarity: f32,
	embedding_version: &str,
) -> String {
	let payload = serde_json::json!({
		"kind": "retrieval",
		"schema_version": RESULT_CACHE_SCHEMA_VERSION,
		"query": query,
		"category": filter.category,
		"tier": filter.tier,
		"min_price": filter.min_price,
		"max_price": filter.max_price,
		"top_k": top_k,
		"min_similarity": min_similarity,
		"embedding_version": embedding_version,
	});

	blake3::hash(payload.to_string().as_bytes()).to_hex().to_string()
}
