mod cache;
mod error;

pub mod decompose;
pub mod research;
pub mod retrieve;
pub mod synthesize;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

pub use decompose::Decomposition;
pub use error::{Error, Result};
pub use research::{
	ResearchFinding, ResearchMetadata, ResearchRequest, ResearchResponse, SourceRef, SubQuestion,
};
pub use retrieve::{RetrievalResult, RetrieveRequest};
pub use synthesize::SynthesisResult;

use crate::{cache::ResultCache, retrieve::CatalogVectors};
use scout_catalog::CatalogStore;
use scout_config::{CompletionProviderConfig, Config, EmbeddingProviderConfig};
use scout_providers::{completion, embedding};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(completion::complete(cfg, messages))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { embedding, completion }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), completion: provider }
	}
}

/// The research pipeline. Cheap to clone; all state behind the handle is
/// shared, so concurrent sub-question tasks see one result cache and one set
/// of precomputed catalog vectors.
#[derive(Clone)]
pub struct ScoutService {
	pub cfg: Arc<Config>,
	pub catalog: Arc<dyn CatalogStore>,
	pub providers: Providers,
	pub(crate) results: Arc<ResultCache>,
	pub(crate) catalog_vectors: Arc<CatalogVectors>,
}

impl ScoutService {
	pub fn new(cfg: Config, catalog: Arc<dyn CatalogStore>) -> Self {
		Self::with_providers(cfg, catalog, Providers::default())
	}

	pub fn with_providers(
		cfg: Config,
		catalog: Arc<dyn CatalogStore>,
		providers: Providers,
	) -> Self {
		Self {
			cfg: Arc::new(cfg),
			catalog,
			providers,
			results: Arc::new(ResultCache::new()),
			catalog_vectors: Arc::new(CatalogVectors::new()),
		}
	}
}

pub(crate) fn embedding_version(cfg: &Config) -> String {
	format!(
		"{}:{}:{}",
		cfg.providers.embedding.provider_id,
		cfg.providers.embedding.model,
		cfg.providers.embedding.dimensions
	)
}
