use std::sync::Arc;

use serde_json::Value;

use scout_config::CompletionProviderConfig;
use scout_domain::RetrievalFilter;
use scout_service::{BoxFuture, CompletionProvider, Providers, ResearchRequest};
use scout_testkit::test_config;

use crate::acceptance::{
	FailingCompletion, FailingEmbedding, RoutedCompletion, build_service, default_service,
	keyword_providers, two_way_decomposition,
};

fn research_request(query: &str) -> ResearchRequest {
	ResearchRequest {
		query: query.to_string(),
		filter: RetrievalFilter::default(),
		max_sub_questions: None,
	}
}

#[tokio::test]
async fn multi_facet_research_cites_distinct_items() {
	let completion = RoutedCompletion::succeeding(
		&two_way_decomposition(),
		"The Aerolight 14 [lap-001] fits best.",
		"Students should pick the Aerolight 14; note takers the Glide Tab 11.\nConfidence: 9/10",
	);
	let service = default_service(keyword_providers(Arc::new(completion)));
	let response = service
		.research(research_request("Compare lightweight laptops under RM5000 for students"))
		.await
		.expect("Research must complete.");

	assert_eq!(response.findings.len(), 2);
	assert!(response.findings.iter().all(|finding| !finding.failed));

	// Laptop sub-question cites laptops, tablet sub-question cites the tablet.
	assert!(response.findings[0]
		.sources
		.iter()
		.any(|source| source.item_id.starts_with("lap-")));
	assert!(response.findings[1]
		.sources
		.iter()
		.any(|source| source.item_id == "tab-001"));

	assert!(!response.synthesis.used_fallback);
	assert!(response.synthesis.distinct_items_cited >= 2);
	assert_eq!(response.synthesis.confidence, 9);
	assert_eq!(response.metadata.confidence, 9);
	assert_eq!(response.metadata.distinct_items_cited, response.synthesis.distinct_items_cited);
	// Decomposition, two research steps, synthesis.
	assert_eq!(response.metadata.step_count, 4);
}

#[tokio::test]
async fn findings_keep_input_order_despite_mixed_failures() {
	let decomposition = serde_json::json!({
		"sub_questions": [
			"Which laptops are light?",
			"Which tablets take notes?",
			"Which quantum flux capacitors ship today?",
		],
		"rationale": "two real facets and one dud",
	})
	.to_string();
	let completion = RoutedCompletion::succeeding(&decomposition, "Cited answer.", "Done.");
	let service = default_service(keyword_providers(Arc::new(completion)));
	let response =
		service.research(research_request("laptops and tablets")).await.expect("Research must complete.");

	assert_eq!(response.findings.len(), 3);

	for (index, finding) in response.findings.iter().enumerate() {
		assert_eq!(finding.sub_question.index, index);
	}

	// The capacitor question matches nothing and degrades in place.
	assert!(!response.findings[0].failed);
	assert!(!response.findings[1].failed);
	assert!(response.findings[2].failed);
	assert!(response.findings[2].sources.is_empty());
	assert_eq!(response.findings[2].answer, "Unable to research this sub-question.");
}

#[tokio::test]
async fn embedding_outage_degrades_every_finding_but_research_completes() {
	let completion = RoutedCompletion::succeeding(
		&two_way_decomposition(),
		"unreachable",
		"Both facets failed; no recommendation.\nConfidence: 2/10",
	);
	let service = build_service(
		test_config(),
		Providers::new(Arc::new(FailingEmbedding), Arc::new(completion)),
	);
	let response = service
		.research(research_request("Compare lightweight laptops under RM5000"))
		.await
		.expect("Research must complete despite the embedding outage.");

	assert_eq!(response.findings.len(), 2);
	assert!(response.findings.iter().all(|finding| finding.failed));
	assert!(response.findings.iter().all(|finding| finding.sources.is_empty()));

	// Synthesis still ran over the degraded findings.
	assert!(!response.synthesis.used_fallback);
	assert_eq!(response.synthesis.distinct_items_cited, 0);
	assert_eq!(response.synthesis.confidence, 2);
}

#[tokio::test]
async fn total_outage_still_produces_a_full_response() {
	let service = build_service(
		test_config(),
		Providers::new(Arc::new(FailingEmbedding), Arc::new(FailingCompletion)),
	);
	let response = service
		.research(research_request("Compare lightweight laptops under RM5000"))
		.await
		.expect("Research must complete.");

	assert!(response.decomposition.used_fallback);
	assert_eq!(response.findings.len(), 1);
	assert!(response.findings[0].failed);
	assert!(response.synthesis.used_fallback);
	assert_eq!(response.synthesis.confidence, 5);
	assert!(!response.synthesis.answer.is_empty());
}

#[tokio::test]
async fn empty_catalog_slice_degrades_instead_of_failing() {
	let completion = RoutedCompletion::succeeding(&two_way_decomposition(), "ok", "Done.");
	let service = default_service(keyword_providers(Arc::new(completion)));
	let mut req = research_request("laptops for students");

	req.filter = RetrievalFilter { category: Some("drone".to_string()), ..RetrievalFilter::default() };

	let response = service.research(req).await.expect("Research must complete.");

	assert!(response.findings.iter().all(|finding| finding.failed));
}

/// Stalls until well past the per-question deadline.
struct StalledCompletion;

impl CompletionProvider for StalledCompletion {
	fn complete<'a>(
		&'a self,
		_cfg: &'a CompletionProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move {
			tokio::time::sleep(std::time::Duration::from_millis(200)).await;

			Ok("too late".to_string())
		})
	}
}

#[tokio::test]
async fn deadline_overrun_degrades_the_finding() {
	let mut cfg = test_config();

	cfg.research.sub_question_timeout_ms = 50;

	let service = build_service(cfg, keyword_providers(Arc::new(StalledCompletion)));
	let response = service
		.research(research_request("lightweight laptops"))
		.await
		.expect("Research must complete.");

	// Decomposition falls back (the stalled reply carries no JSON) and the
	// single research task hits the per-question deadline. Synthesis has no
	// such deadline: it eventually gets the stalled reply and, with no
	// confidence figure in it, reports the default.
	assert!(response.decomposition.used_fallback);
	assert_eq!(response.findings.len(), 1);
	assert!(response.findings[0].failed);
	assert!(!response.synthesis.used_fallback);
	assert_eq!(response.synthesis.confidence, 8);
}
