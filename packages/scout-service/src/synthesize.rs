use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ScoutService, research::ResearchFinding};

const DEFAULT_CONFIDENCE: u8 = 8;
const FALLBACK_CONFIDENCE: u8 = 5;

static CONFIDENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)confidence[^0-9]*([0-9]{1,2})").expect("Confidence pattern must compile.")
});

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SynthesisResult {
	pub answer: String,
	pub confidence: u8,
	pub sub_question_count: usize,
	pub distinct_items_cited: usize,
	pub total_sources_used: usize,
	pub used_fallback: bool,
}

impl ScoutService {
	/// Combines all findings into one final answer. Never fails: if the
	/// completion service is down, the answer degrades to a deterministic
	/// concatenation of the per-question findings.
	pub(crate) async fn synthesize(
		&self,
		original_query: &str,
		findings: &[ResearchFinding],
	) -> SynthesisResult {
		let mut cited: BTreeSet<&str> = BTreeSet::new();
		let mut total_sources_used = 0;

		for finding in findings {
			for source in &finding.sources {
				cited.insert(source.item_id.as_str());

				total_sources_used += 1;
			}
		}

		let distinct_items_cited = cited.len();
		let sub_question_count = findings.len();
		let messages = build_synthesis_messages(original_query, findings);

		match self
			.providers
			.completion
			.complete(&self.cfg.providers.completion, &messages)
			.await
		{
			Ok(raw) if !raw.trim().is_empty() => SynthesisResult {
				confidence: parse_confidence(&raw).unwrap_or(DEFAULT_CONFIDENCE),
				answer: raw.trim().to_string(),
				sub_question_count,
				distinct_items_cited,
				total_sources_used,
				used_fallback: false,
			},
			Ok(_) => {
				tracing::warn!("Synthesis reply was empty; falling back to concatenated findings.");

				self.fallback_synthesis(
					original_query,
					findings,
					distinct_items_cited,
					total_sources_used,
				)
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Synthesis completion failed; falling back to concatenated findings."
				);

				self.fallback_synthesis(
					original_query,
					findings,
					distinct_items_cited,
					total_sources_used,
				)
			},
		}
	}

	fn fallback_synthesis(
		&self,
		original_query: &str,
		findings: &[ResearchFinding],
		distinct_items_cited: usize,
		total_sources_used: usize,
	) -> SynthesisResult {
		let mut answer = format!("Research summary for: {original_query}");

		for finding in findings {
			answer.push_str("\n\n");
			answer.push_str(&finding.sub_question.text);
			answer.push('\n');
			answer.push_str(&finding.answer);
		}

		SynthesisResult {
			answer,
			confidence: FALLBACK_CONFIDENCE,
			sub_question_count: findings.len(),
			distinct_items_cited,
			total_sources_used,
			used_fallback: true,
		}
	}
}

fn build_synthesis_messages(original_query: &str, findings: &[ResearchFinding]) -> Vec<Value> {
	let mut context = String::new();

	for finding in findings {
		context.push_str(&format!(
			"Sub-question {}: {}\nAnswer: {}\n",
			finding.sub_question.index + 1,
			finding.sub_question.text,
			finding.answer,
		));

		if finding.sources.is_empty() {
			context.push_str("Sources: none\n\n");
		} else {
			let sources = finding
				.sources
				.iter()
				.map(|source| format!("{} ({:.2})", source.item_id, source.similarity))
				.collect::<Vec<_>>()
				.join(", ");

			context.push_str(&format!("Sources: {sources}\n\n"));
		}
	}

	let instruction = "You synthesize product research findings into one coherent answer. \
	                   Reference the cited catalog items by name, reconcile any conflicts between \
	                   findings, and end with a line of the form \"Confidence: N/10\".";
	let user = format!("Original question: {original_query}\n\nFindings:\n{context}");

	vec![
		serde_json::json!({ "role": "system", "content": instruction }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

fn parse_confidence(raw: &str) -> Option<u8> {
	let captures = CONFIDENCE_PATTERN.captures(raw)?;
	let value: u8 = captures.get(1)?.as_str().parse().ok()?;

	Some(value.clamp(1, 10))
}
