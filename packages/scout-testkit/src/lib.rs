//! Shared test plumbing: a small fixture catalog and a deterministic
//! keyword-axis embedding so similarity orderings are predictable without a
//! live embedding service.

use std::collections::BTreeMap;

use serde_json::Map;

use scout_catalog::InMemoryCatalog;
use scout_config::{
	Catalog, CompletionProviderConfig, Config, EmbeddingProviderConfig, Providers, Research,
	Retrieval, RetrievalCache, Service,
};
use scout_domain::CatalogItem;

pub const EMBEDDING_DIM: usize = 4;

const AXIS_KEYWORDS: [&[&str]; EMBEDDING_DIM] = [
	&["laptop", "notebook", "ultrabook"],
	&["tablet", "stylus"],
	&["earbuds", "headphones", "audio"],
	&["monitor", "display-panel"],
];

/// Maps text onto fixed keyword axes. Texts about the same kind of product
/// land on the same axis and score 1.0 against each other; unrelated texts
/// score 0.0; a text with no recognized keyword becomes the zero vector.
pub fn keyword_embedding(text: &str) -> Vec<f32> {
	let lowered = text.to_lowercase();
	let mut vector = vec![0.0_f32; EMBEDDING_DIM];

	for (axis, keywords) in AXIS_KEYWORDS.iter().enumerate() {
		for keyword in *keywords {
			vector[axis] += lowered.matches(*keyword).count() as f32;
		}
	}

	vector
}

pub fn fixture_items() -> Vec<CatalogItem> {
	vec![
		item("lap-001", "Aerolight 14", "laptop", "budget", 3999.0, &[
			("weight", "1.3kg"),
			("ram", "16GB"),
		]),
		item("lap-002", "Stellar 13", "laptop", "budget", 4500.0, &[
			("weight", "1.1kg"),
			("ram", "8GB"),
		]),
		item("lap-003", "Titan Creator 16", "laptop", "premium", 8999.0, &[
			("weight", "2.2kg"),
			("ram", "32GB"),
		]),
		item("tab-001", "Glide Tab 11", "tablet", "standard", 2200.0, &[("stylus", "included")]),
		item("aud-001", "Pulse Buds", "audio", "budget", 399.0, &[("earbuds", "wireless")]),
		item("mon-001", "Vista 27", "monitor", "standard", 1500.0, &[(
			"display-panel",
			"IPS",
		)]),
	]
}

pub fn fixture_catalog() -> InMemoryCatalog {
	InMemoryCatalog::new(fixture_items()).expect("Fixture catalog must build.")
}

pub fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		catalog: Catalog { path: "catalog.json".to_string() },
		providers: Providers {
			embedding: dummy_embedding_provider(),
			completion: dummy_completion_provider(),
		},
		retrieval: Retrieval {
			top_k: 5,
			min_similarity: 0.1,
			cache: RetrievalCache { enabled: true, ttl_seconds: 300 },
		},
		research: Research {
			max_sub_questions: 4,
			per_question_top_k: 3,
			per_question_min_similarity: 0.1,
			sub_question_timeout_ms: 2_000,
		},
	}
}

pub fn dummy_embedding_provider() -> EmbeddingProviderConfig {
	EmbeddingProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: "test-key".to_string(),
		path: "/v1/embeddings".to_string(),
		model: "test-embed".to_string(),
		dimensions: EMBEDDING_DIM as u32,
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

pub fn dummy_completion_provider() -> CompletionProviderConfig {
	CompletionProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: "test-key".to_string(),
		path: "/v1/chat/completions".to_string(),
		model: "test-chat".to_string(),
		temperature: 0.1,
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

fn item(
	id: &str,
	name: &str,
	category: &str,
	tier: &str,
	price: f64,
	spec: &[(&str, &str)],
) -> CatalogItem {
	CatalogItem {
		id: id.to_string(),
		name: name.to_string(),
		category: category.to_string(),
		tier: tier.to_string(),
		price,
		spec: spec
			.iter()
			.map(|(key, value)| (key.to_string(), value.to_string()))
			.collect::<BTreeMap<_, _>>(),
	}
}
