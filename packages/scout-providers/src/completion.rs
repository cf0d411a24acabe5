use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Requests a chat completion and returns the assistant text verbatim.
///
/// Callers own all structured interpretation of the reply; this layer only
/// guarantees there was a non-empty message to interpret.
pub async fn complete(
	cfg: &scout_config::CompletionProviderConfig,
	messages: &[Value],
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	extract_message_content(&json)
}

fn extract_message_content(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(Value::as_array)
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(Value::as_str)
		.ok_or_else(|| eyre::eyre!("Completion response is missing message content."))?;

	if content.trim().is_empty() {
		return Err(eyre::eyre!("Completion response content is empty."));
	}

	Ok(content.to_string())
}
