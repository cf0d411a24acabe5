use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ScoutService;

const FALLBACK_RATIONALE: &str = "direct research without decomposition";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Decomposition {
	pub sub_questions: Vec<String>,
	pub rationale: String,
	pub used_fallback: bool,
}

impl Decomposition {
	fn fallback(query: &str) -> Self {
		Self {
			sub_questions: vec![query.to_string()],
			rationale: FALLBACK_RATIONALE.to_string(),
			used_fallback: true,
		}
	}
}

#[derive(Debug, Deserialize)]
struct DecompositionPayload {
	#[serde(default)]
	sub_questions: Vec<String>,
	#[serde(default)]
	rationale: String,
}

impl ScoutService {
	/// Splits a complex query into 1..=`max_sub_questions` independently
	/// answerable sub-questions. Decomposition failure is a degraded mode:
	/// the original query becomes the single sub-question and the pipeline
	/// continues.
	pub(crate) async fn decompose(&self, query: &str, max_sub_questions: u32) -> Decomposition {
		let messages = build_decomposition_messages(query, max_sub_questions);
		let raw = match self
			.providers
			.completion
			.complete(&self.cfg.providers.completion, &messages)
			.await
		{
			Ok(raw) => raw,
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Decomposition completion failed; researching the query directly."
				);

				return Decomposition::fallback(query);
			},
		};
		let Some(payload) = parse_decomposition(&raw) else {
			tracing::warn!("Decomposition reply was not parseable; researching the query directly.");

			return Decomposition::fallback(query);
		};
		let mut sub_questions: Vec<String> = payload
			.sub_questions
			.into_iter()
			.map(|question| question.trim().to_string())
			.filter(|question| !question.is_empty())
			.collect();

		if sub_questions.is_empty() {
			tracing::warn!("Decomposition produced no usable sub-questions; researching directly.");

			return Decomposition::fallback(query);
		}

		sub_questions.truncate(max_sub_questions as usize);

		let rationale = if payload.rationale.trim().is_empty() {
			"decomposed for parallel research".to_string()
		} else {
			payload.rationale.trim().to_string()
		};

		Decomposition { sub_questions, rationale, used_fallback: false }
	}
}

fn build_decomposition_messages(query: &str, max_sub_questions: u32) -> Vec<Value> {
	let instruction = format!(
		"You split product research questions into at most {max_sub_questions} specific, \
		 independently answerable sub-questions. Reply with a JSON object of the form \
		 {{\"sub_questions\": [\"...\"], \"rationale\": \"...\"}} and nothing else. Simple \
		 questions may stay as a single sub-question."
	);

	vec![
		serde_json::json!({ "role": "system", "content": instruction }),
		serde_json::json!({ "role": "user", "content": query }),
	]
}

fn parse_decomposition(raw: &str) -> Option<DecompositionPayload> {
	let span = first_json_object(raw)?;

	serde_json::from_str(span).ok()
}

/// Returns the first balanced `{...}` span in `raw`, ignoring braces inside
/// JSON string literals. Completion replies routinely wrap the payload in
/// prose or code fences, so the span is located, not assumed.
pub(crate) fn first_json_object(raw: &str) -> Option<&str> {
	let start = raw.find('{')?;
	let mut depth = 0_usize;
	let mut in_string = false;
	let mut escaped = false;

	for (offset, ch) in raw[start..].char_indices() {
		if in_string {
			if escaped {
				escaped = false;
			} else if ch == '\\' {
				escaped = true;
			} else if ch == '"' {
				in_string = false;
			}

			continue;
		}

		match ch {
			'"' => in_string = true,
			'{' => depth += 1,
			'}' => {
				depth -= 1;

				if depth == 0 {
					return Some(&raw[start..start + offset + ch.len_utf8()]);
				}
			},
			_ => {},
		}
	}

	None
}
