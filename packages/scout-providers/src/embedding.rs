use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Embeds a batch of texts. The response's `data` array may arrive in any
/// order; vectors are returned aligned with `texts` via the per-item `index`.
pub async fn embed(
	cfg: &scout_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let vectors = parse_embedding_response(json, texts.len())?;

	for vector in &vectors {
		if vector.len() != cfg.dimensions as usize {
			return Err(eyre::eyre!(
				"Embedding vector has {} dimensions, expected {}.",
				vector.len(),
				cfg.dimensions,
			));
		}
	}

	Ok(vectors)
}

fn parse_embedding_response(json: Value, expected: usize) -> Result<Vec<Vec<f32>>> {
	let data = json
		.get("data")
		.and_then(Value::as_array)
		.ok_or_else(|| eyre::eyre!("Embedding response is missing a data array."))?;

	if data.len() != expected {
		return Err(eyre::eyre!(
			"Embedding response has {} entries for {expected} inputs.",
			data.len(),
		));
	}

	let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];

	for (fallback_index, entry) in data.iter().enumerate() {
		let index = entry
			.get("index")
			.and_then(Value::as_u64)
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let slot = slots
			.get_mut(index)
			.ok_or_else(|| eyre::eyre!("Embedding entry index {index} is out of range."))?;
		let values = entry
			.get("embedding")
			.and_then(Value::as_array)
			.ok_or_else(|| eyre::eyre!("Embedding entry is missing an embedding array."))?;
		let mut vector = Vec::with_capacity(values.len());

		for value in values {
			let number =
				value.as_f64().ok_or_else(|| eyre::eyre!("Embedding value must be numeric."))?;

			vector.push(number as f32);
		}

		if slot.replace(vector).is_some() {
			return Err(eyre::eyre!("Embedding entry index {index} appears twice."));
		}
	}

	slots
		.into_iter()
		.map(|slot| slot.ok_or_else(|| eyre::eyre!("Embedding response left an input unfilled.")))
		.collect()
}
