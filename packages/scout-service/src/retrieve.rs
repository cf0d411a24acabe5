use std::{
	cmp::Ordering,
	collections::HashMap,
	sync::RwLock,
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, Result, ScoutService, cache, embedding_version};
use scout_domain::{CatalogItem, RetrievalFilter, cosine_similarity};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RetrieveRequest {
	pub query: String,
	#[serde(default)]
	pub filter: RetrievalFilter,
	#[serde(default)]
	pub top_k: Option<u32>,
	#[serde(default)]
	pub min_similarity: Option<f32>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RetrievalResult {
	pub item: CatalogItem,
	pub similarity: f32,
	pub rank: u32,
}

/// Precomputed catalog embeddings, tagged with the embedding version they
/// were produced under. A version change (provider, model, or width)
/// invalidates the whole snapshot rather than risking cross-version scores.
pub(crate) struct CatalogVectors {
	snapshot: RwLock<Option<VectorSnapshot>>,
}

struct VectorSnapshot {
	version: String,
	by_item: HashMap<String, Vec<f32>>,
}

impl CatalogVectors {
	pub(crate) fn new() -> Self {
		Self { snapshot: RwLock::new(None) }
	}

	fn lookup(&self, version: &str, items: &[CatalogItem]) -> HashMap<String, Vec<f32>> {
		let snapshot = self.snapshot.read().unwrap_or_else(|err| err.into_inner());
		let Some(snapshot) = snapshot.as_ref() else {
			return HashMap::new();
		};

		if snapshot.version != version {
			return HashMap::new();
		}

		items
			.iter()
			.filter_map(|item| {
				snapshot.by_item.get(&item.id).map(|vector| (item.id.clone(), vector.clone()))
			})
			.collect()
	}

	fn replace(&self, version: String, by_item: HashMap<String, Vec<f32>>) {
		let mut snapshot = self.snapshot.write().unwrap_or_else(|err| err.into_inner());

		*snapshot = Some(VectorSnapshot { version, by_item });
	}
}

impl ScoutService {
	/// Single-pass retrieval: embed the query, score every eligible catalog
	/// item, keep the top-K at or above the similarity floor.
	pub async fn retrieve(&self, req: RetrieveRequest) -> Result<Vec<RetrievalResult>> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidArgument { message: "query must be non-empty.".to_string() });
		}

		let top_k = req.top_k.unwrap_or(self.cfg.retrieval.top_k);

		if top_k == 0 {
			return Err(Error::InvalidArgument {
				message: "top_k must be greater than zero.".to_string(),
			});
		}

		let min_similarity = req.min_similarity.unwrap_or(self.cfg.retrieval.min_similarity);

		if !min_similarity.is_finite() {
			return Err(Error::InvalidArgument {
				message: "min_similarity must be a finite number.".to_string(),
			});
		}

		let version = embedding_version(&self.cfg);

		if !self.cfg.retrieval.cache.enabled {
			return self
				.retrieve_uncached(query, &req.filter, top_k, min_similarity, &version)
				.await;
		}

		let key = cache::result_cache_key(query, &req.filter, top_k, min_similarity, &version);

		if let Some(hit) = self.results.get(&key, OffsetDateTime::now_utc()) {
			return Ok(hit);
		}

		// One computation per key per TTL window; latecomers block here and
		// then reuse the winner's entry.
		let _writer = self.results.lock_key(&key).await;
		let now = OffsetDateTime::now_utc();

		if let Some(hit) = self.results.get(&key, now) {
			return Ok(hit);
		}

		let results =
			self.retrieve_uncached(query, &req.filter, top_k, min_similarity, &version).await?;

		self.results.store(&key, results.clone(), self.cfg.retrieval.cache.ttl_seconds, now);

		Ok(results)
	}

	/// Embeds every catalog item once and keeps the vectors for later
	/// retrievals. Optional: the default path recomputes per call, which is
	/// correct but pays one embedding round-trip per retrieval.
	pub async fn precompute_catalog_embeddings(&self) -> Result<usize> {
		let items = self.catalog.list_items(&RetrievalFilter::default());
		let version = embedding_version(&self.cfg);

		if items.is_empty() {
			self.catalog_vectors.replace(version, HashMap::new());

			return Ok(0);
		}

		let texts: Vec<String> = items.iter().map(CatalogItem::search_text).collect();
		let vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &texts)
			.await
			.map_err(|err| Error::EmbeddingUnavailable { message: err.to_string() })?;

		if vectors.len() != items.len() {
			return Err(Error::EmbeddingUnavailable {
				message: format!(
					"Embedding service returned {} vectors for {} inputs.",
					vectors.len(),
					items.len()
				),
			});
		}

		let count = items.len();
		let by_item: HashMap<String, Vec<f32>> =
			items.into_iter().map(|item| item.id).zip(vectors).collect();

		self.catalog_vectors.replace(version, by_item);

		tracing::info!(count, "Precomputed catalog embeddings.");

		Ok(count)
	}

	async fn retrieve_uncached(
		&self,
		query: &str,
		filter: &RetrievalFilter,
		top_k: u32,
		min_similarity: f32,
		version: &str,
	) -> Result<Vec<RetrievalResult>> {
		let query_vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &[query.to_string()])
			.await
			.map_err(|err| Error::EmbeddingUnavailable { message: err.to_string() })?;
		let Some(query_vector) = query_vectors.into_iter().next() else {
			return Err(Error::EmbeddingUnavailable {
				message: "Embedding service returned no vectors for the query.".to_string(),
			});
		};

		let items = self.catalog.list_items(filter);

		if items.is_empty() {
			return Ok(Vec::new());
		}

		let item_vectors = self.catalog_item_vectors(&items, version).await?;
		let mut scored = Vec::with_capacity(items.len());

		for (item, vector) in items.into_iter().zip(item_vectors) {
			let similarity = cosine_similarity(&query_vector, &vector)?;

			if similarity >= min_similarity {
				scored.push((item, similarity));
			}
		}

		// Descending similarity, id-ascending tie-break. Never arrival order.
		scored.sort_by(|(a_item, a_sim), (b_item, b_sim)| {
			cmp_score_desc(*a_sim, *b_sim).then_with(|| a_item.id.cmp(&b_item.id))
		});
		scored.truncate(top_k as usize);

		Ok(scored
			.into_iter()
			.enumerate()
			.map(|(idx, (item, similarity))| RetrievalResult {
				item,
				similarity,
				rank: idx as u32 + 1,
			})
			.collect())
	}

	/// Vectors for `items`, aligned by position: precomputed where the
	/// snapshot covers them, one batched embedding call for the rest.
	async fn catalog_item_vectors(
		&self,
		items: &[CatalogItem],
		version: &str,
	) -> Result<Vec<Vec<f32>>> {
		let mut by_item = self.catalog_vectors.lookup(version, items);
		let missing: Vec<&CatalogItem> =
			items.iter().filter(|item| !by_item.contains_key(&item.id)).collect();

		if !missing.is_empty() {
			let texts: Vec<String> =
				missing.iter().map(|item| item.search_text()).collect();
			let vectors = self
				.providers
				.embedding
				.embed(&self.cfg.providers.embedding, &texts)
				.await
				.map_err(|err| Error::EmbeddingUnavailable { message: err.to_string() })?;

			if vectors.len() != missing.len() {
				return Err(Error::EmbeddingUnavailable {
					message: format!(
						"Embedding service returned {} vectors for {} inputs.",
						vectors.len(),
						missing.len()
					),
				});
			}

			for (item, vector) in missing.into_iter().zip(vectors) {
				by_item.insert(item.id.clone(), vector);
			}
		}

		items
			.iter()
			.map(|item| {
				by_item.remove(&item.id).ok_or_else(|| Error::EmbeddingUnavailable {
					message: format!("No embedding was produced for item {:?}.", item.id),
				})
			})
			.collect()
	}
}

fn cmp_score_desc(a: f32, b: f32) -> Ordering {
	b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
