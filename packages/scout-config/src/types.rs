use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub catalog: Catalog,
	pub providers: Providers,
	pub retrieval: Retrieval,
	pub research: Research,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Catalog {
	/// Path to the catalog JSON file loaded at startup.
	pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub completion: CompletionProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	pub top_k: u32,
	pub min_similarity: f32,
	pub cache: RetrievalCache,
}

#[derive(Debug, Deserialize)]
pub struct RetrievalCache {
	pub enabled: bool,
	pub ttl_seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct Research {
	pub max_sub_questions: u32,
	pub per_question_top_k: u32,
	pub per_question_min_similarity: f32,
	pub sub_question_timeout_ms: u64,
}
