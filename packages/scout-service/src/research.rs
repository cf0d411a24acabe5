use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{task::JoinHandle, time};

use crate::{
	Decomposition, Error, Result, RetrievalResult, RetrieveRequest, ScoutService, SynthesisResult,
};
use scout_config::MAX_SUB_QUESTIONS;
use scout_domain::RetrievalFilter;

pub(crate) const FAILED_ANSWER: &str = "Unable to research this sub-question.";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SubQuestion {
	pub text: String,
	pub index: usize,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SourceRef {
	pub item_id: String,
	pub similarity: f32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResearchFinding {
	pub sub_question: SubQuestion,
	pub answer: String,
	pub sources: Vec<SourceRef>,
	pub failed: bool,
}

impl ResearchFinding {
	fn failed(sub_question: SubQuestion) -> Self {
		Self {
			sub_question,
			answer: FAILED_ANSWER.to_string(),
			sources: Vec::new(),
			failed: true,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResearchRequest {
	pub query: String,
	#[serde(default)]
	pub filter: RetrievalFilter,
	#[serde(default)]
	pub max_sub_questions: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResearchMetadata {
	pub duration_ms: u64,
	pub step_count: usize,
	pub distinct_items_cited: usize,
	pub confidence: u8,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResearchResponse {
	pub decomposition: Decomposition,
	pub findings: Vec<ResearchFinding>,
	pub synthesis: SynthesisResult,
	pub metadata: ResearchMetadata,
}

/// Aborts the research task when the overall request is dropped, so a
/// disconnected caller does not leave sub-question work running.
struct AbortOnDrop(JoinHandle<ResearchFinding>);

impl Drop for AbortOnDrop {
	fn drop(&mut self) {
		self.0.abort();
	}
}

impl ScoutService {
	/// Deep-research entry point: decompose, research each sub-question
	/// concurrently, synthesize. Only up-front validation can fail; every
	/// downstream failure degrades into the response's flags.
	pub async fn research(&self, req: ResearchRequest) -> Result<ResearchResponse> {
		let started = Instant::now();
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidArgument { message: "query must be non-empty.".to_string() });
		}

		let max_sub_questions =
			req.max_sub_questions.unwrap_or(self.cfg.research.max_sub_questions);

		if max_sub_questions == 0 {
			return Err(Error::InvalidArgument {
				message: "max_sub_questions must be greater than zero.".to_string(),
			});
		}
		if max_sub_questions > MAX_SUB_QUESTIONS {
			return Err(Error::InvalidArgument {
				message: format!("max_sub_questions must be at most {MAX_SUB_QUESTIONS}."),
			});
		}

		let decomposition = self.decompose(query, max_sub_questions).await;
		let sub_questions: Vec<SubQuestion> = decomposition
			.sub_questions
			.iter()
			.enumerate()
			.map(|(index, text)| SubQuestion { text: text.clone(), index })
			.collect();
		let findings = self.research_all(sub_questions, &req.filter).await;
		let synthesis = self.synthesize(query, &findings).await;
		let metadata = ResearchMetadata {
			duration_ms: started.elapsed().as_millis() as u64,
			// Decomposition, one step per finding, synthesis.
			step_count: findings.len() + 2,
			distinct_items_cited: synthesis.distinct_items_cited,
			confidence: synthesis.confidence,
		};

		tracing::info!(
			sub_questions = findings.len(),
			duration_ms = metadata.duration_ms,
			used_fallback = synthesis.used_fallback,
			"Research request completed."
		);

		Ok(ResearchResponse { decomposition, findings, synthesis, metadata })
	}

	/// Fan-out/fan-in over the sub-questions. One task each, joined in input
	/// order, so the output is positionally identical to the input no matter
	/// which task finishes first. A failed task is data, not control flow.
	pub(crate) async fn research_all(
		&self,
		sub_questions: Vec<SubQuestion>,
		filter: &RetrievalFilter,
	) -> Vec<ResearchFinding> {
		let labels = sub_questions.clone();
		let timeout = Duration::from_millis(self.cfg.research.sub_question_timeout_ms);
		let mut handles = Vec::with_capacity(sub_questions.len());

		for sub_question in sub_questions {
			let service = self.clone();
			let filter = filter.clone();

			handles.push(AbortOnDrop(tokio::spawn(async move {
				let deadline_label = sub_question.clone();

				match time::timeout(timeout, service.research_sub_question(sub_question, &filter))
					.await
				{
					Ok(finding) => finding,
					Err(_) => {
						tracing::warn!(
							index = deadline_label.index,
							"Sub-question research timed out."
						);

						ResearchFinding::failed(deadline_label)
					},
				}
			})));
		}

		let mut findings = Vec::with_capacity(handles.len());

		for (mut handle, label) in handles.into_iter().zip(labels) {
			let finding = match (&mut handle.0).await {
				Ok(finding) => finding,
				Err(err) => {
					tracing::error!(
						error = %err,
						index = label.index,
						"Sub-question task failed to join."
					);

					ResearchFinding::failed(label)
				},
			};

			findings.push(finding);
		}

		findings
	}

	/// Researches one sub-question: small-K retrieval, then a short grounded
	/// answer citing only the retrieved items. Contained on every failure
	/// path; the caller always receives a finding.
	pub(crate) async fn research_sub_question(
		&self,
		sub_question: SubQuestion,
		filter: &RetrievalFilter,
	) -> ResearchFinding {
		let request = RetrieveRequest {
			query: sub_question.text.clone(),
			filter: filter.clone(),
			top_k: Some(self.cfg.research.per_question_top_k),
			min_similarity: Some(self.cfg.research.per_question_min_similarity),
		};
		let results = match self.retrieve(request).await {
			Ok(results) => results,
			Err(err) => {
				tracing::warn!(
					error = %err,
					index = sub_question.index,
					"Sub-question retrieval failed."
				);

				return ResearchFinding::failed(sub_question);
			},
		};

		if results.is_empty() {
			tracing::warn!(index = sub_question.index, "Sub-question matched no catalog items.");

			return ResearchFinding::failed(sub_question);
		}

		let sources = results
			.iter()
			.map(|result| SourceRef {
				item_id: result.item.id.clone(),
				similarity: result.similarity,
			})
			.collect();
		let messages = build_answer_messages(&sub_question.text, &results);

		match self
			.providers
			.completion
			.complete(&self.cfg.providers.completion, &messages)
			.await
		{
			Ok(answer) if !answer.trim().is_empty() => ResearchFinding {
				sub_question,
				answer: answer.trim().to_string(),
				sources,
				failed: false,
			},
			Ok(_) => {
				tracing::warn!(index = sub_question.index, "Sub-question answer was empty.");

				ResearchFinding::failed(sub_question)
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					index = sub_question.index,
					"Sub-question completion failed."
				);

				ResearchFinding::failed(sub_question)
			},
		}
	}
}

fn build_answer_messages(sub_question: &str, results: &[RetrievalResult]) -> Vec<Value> {
	let mut context = String::new();

	for result in results {
		context.push_str(&format!(
			"- [{}] {} ({}, {}, price {}): {}\n",
			result.item.id,
			result.item.name,
			result.item.category,
			result.item.tier,
			result.item.price,
			result
				.item
				.spec
				.iter()
				.map(|(key, value)| format!("{key}={value}"))
				.collect::<Vec<_>>()
				.join(", "),
		));
	}

	let instruction = "You answer one product research sub-question in 2-3 sentences. Cite only \
	                   the catalog items listed below, by id and name. If the items cannot answer \
	                   the question, say so briefly.";
	let user = format!("Sub-question: {sub_question}\n\nCatalog items:\n{context}");

	vec![
		serde_json::json!({ "role": "system", "content": instruction }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}
