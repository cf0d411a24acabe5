mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Catalog, CompletionProviderConfig, Config, EmbeddingProviderConfig, Providers, Research,
	Retrieval, RetrievalCache, Service,
};

use std::{fs, path::Path};

/// Hard ceiling on research fan-out, independent of what the config asks for.
pub const MAX_SUB_QUESTIONS: u32 = 8;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::Read { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::Parse { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.catalog.path.trim().is_empty() {
		return Err(Error::Validation { message: "catalog.path must be non-empty.".to_string() });
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if !cfg.providers.completion.temperature.is_finite()
		|| cfg.providers.completion.temperature < 0.0
	{
		return Err(Error::Validation {
			message: "providers.completion.temperature must be zero or greater.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("completion", &cfg.providers.completion.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, timeout_ms) in [
		("providers.embedding", cfg.providers.embedding.timeout_ms),
		("providers.completion", cfg.providers.completion.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("{label}.timeout_ms must be greater than zero."),
			});
		}
	}

	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if !cfg.retrieval.min_similarity.is_finite() || cfg.retrieval.min_similarity > 1.0 {
		return Err(Error::Validation {
			message: "retrieval.min_similarity must be a finite number of at most 1.0.".to_string(),
		});
	}
	if cfg.retrieval.cache.ttl_seconds <= 0 {
		return Err(Error::Validation {
			message: "retrieval.cache.ttl_seconds must be greater than zero.".to_string(),
		});
	}

	if cfg.research.max_sub_questions == 0 {
		return Err(Error::Validation {
			message: "research.max_sub_questions must be greater than zero.".to_string(),
		});
	}
	if cfg.research.max_sub_questions > MAX_SUB_QUESTIONS {
		return Err(Error::Validation {
			message: format!("research.max_sub_questions must be at most {MAX_SUB_QUESTIONS}."),
		});
	}
	if cfg.research.per_question_top_k == 0 {
		return Err(Error::Validation {
			message: "research.per_question_top_k must be greater than zero.".to_string(),
		});
	}
	if !cfg.research.per_question_min_similarity.is_finite()
		|| cfg.research.per_question_min_similarity > 1.0
	{
		return Err(Error::Validation {
			message: "research.per_question_min_similarity must be a finite number of at most 1.0."
				.to_string(),
		});
	}
	if cfg.research.sub_question_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "research.sub_question_timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	// Providers are addressed as "{api_base}{path}"; a trailing slash on the
	// base would produce "//v1/..." URLs.
	for api_base in
		[&mut cfg.providers.embedding.api_base, &mut cfg.providers.completion.api_base]
	{
		while api_base.ends_with('/') {
			api_base.pop();
		}
	}
}
