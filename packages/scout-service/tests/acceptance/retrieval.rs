use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use scout_domain::RetrievalFilter;
use scout_service::{Error, Providers, RetrieveRequest};
use scout_testkit::test_config;

use crate::acceptance::{
	FailingCompletion, FailingEmbedding, KeywordEmbedding, ShiftingWidthEmbedding, SpyEmbedding,
	build_service, default_service,
};

fn keyword_service() -> scout_service::ScoutService {
	default_service(Providers::new(Arc::new(KeywordEmbedding), Arc::new(FailingCompletion)))
}

fn request(query: &str) -> RetrieveRequest {
	RetrieveRequest {
		query: query.to_string(),
		filter: RetrievalFilter::default(),
		top_k: None,
		min_similarity: None,
	}
}

#[tokio::test]
async fn results_are_sorted_descending_with_id_tie_break() {
	let service = keyword_service();
	// Two keyword hits for laptops, one for tablets: distinct score bands.
	let results = service
		.retrieve(request("laptop laptop tablet"))
		.await
		.expect("Retrieval must succeed.");

	assert_eq!(results.len(), 4);

	for pair in results.windows(2) {
		assert!(pair[0].similarity >= pair[1].similarity);
	}

	// The three laptops tie on similarity; ids break the tie ascending.
	let ids: Vec<&str> = results.iter().map(|result| result.item.id.as_str()).collect();

	assert_eq!(ids, vec!["lap-001", "lap-002", "lap-003", "tab-001"]);

	for (idx, result) in results.iter().enumerate() {
		assert_eq!(result.rank, idx as u32 + 1);
	}
}

#[tokio::test]
async fn top_k_truncates_after_sorting() {
	let service = keyword_service();
	let mut req = request("laptop laptop tablet");

	req.top_k = Some(2);

	let results = service.retrieve(req).await.expect("Retrieval must succeed.");
	let ids: Vec<&str> = results.iter().map(|result| result.item.id.as_str()).collect();

	assert_eq!(ids, vec!["lap-001", "lap-002"]);
}

#[tokio::test]
async fn every_similarity_respects_the_floor() {
	let service = keyword_service();
	let mut req = request("laptop tablet");

	req.min_similarity = Some(0.5);

	let results = service.retrieve(req).await.expect("Retrieval must succeed.");

	assert!(!results.is_empty());

	for result in &results {
		assert!(result.similarity >= 0.5);
	}
}

#[tokio::test]
async fn unreachable_similarity_floor_yields_empty_not_error() {
	let service = keyword_service();
	let mut req = request("lightweight laptops");

	req.min_similarity = Some(1.1);

	let results = service.retrieve(req).await.expect("Retrieval must succeed.");

	assert!(results.is_empty());
}

#[tokio::test]
async fn zero_top_k_is_rejected_before_any_provider_call() {
	let calls = Arc::new(AtomicUsize::new(0));
	let service = default_service(Providers::new(
		Arc::new(SpyEmbedding { calls: calls.clone() }),
		Arc::new(FailingCompletion),
	));
	let mut req = request("laptops");

	req.top_k = Some(0);

	let err = service.retrieve(req).await.expect_err("Zero top_k must be rejected.");

	assert!(matches!(err, Error::InvalidArgument { .. }));
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_query_is_rejected() {
	let service = keyword_service();
	let err =
		service.retrieve(request("   ")).await.expect_err("Blank query must be rejected.");

	assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[tokio::test]
async fn embedding_outage_aborts_with_no_partial_results() {
	let service =
		default_service(Providers::new(Arc::new(FailingEmbedding), Arc::new(FailingCompletion)));
	let err = service
		.retrieve(request("lightweight laptops"))
		.await
		.expect_err("Embedding outage must abort retrieval.");

	assert!(matches!(err, Error::EmbeddingUnavailable { .. }));
}

#[tokio::test]
async fn structural_filter_narrows_the_candidate_set() {
	let service = keyword_service();
	let req = RetrieveRequest {
		query: "lightweight laptops".to_string(),
		filter: RetrievalFilter {
			category: Some("laptop".to_string()),
			max_price: Some(5000.0),
			..RetrievalFilter::default()
		},
		top_k: None,
		min_similarity: None,
	};
	let results = service.retrieve(req).await.expect("Retrieval must succeed.");
	let ids: Vec<&str> = results.iter().map(|result| result.item.id.as_str()).collect();

	assert_eq!(ids, vec!["lap-001", "lap-002"]);
}

#[tokio::test]
async fn zero_eligible_items_yield_empty_not_error() {
	let service = keyword_service();
	let req = RetrieveRequest {
		query: "laptops".to_string(),
		filter: RetrievalFilter { category: Some("drone".to_string()), ..RetrievalFilter::default() },
		top_k: None,
		min_similarity: None,
	};
	let results = service.retrieve(req).await.expect("Retrieval must succeed.");

	assert!(results.is_empty());
}

#[tokio::test]
async fn mismatched_vector_widths_surface_as_dimension_mismatch() {
	let service = default_service(Providers::new(
		Arc::new(ShiftingWidthEmbedding { calls: Arc::new(AtomicUsize::new(0)) }),
		Arc::new(FailingCompletion),
	));
	let err = service
		.retrieve(request("laptops"))
		.await
		.expect_err("Width drift must be rejected.");

	assert!(matches!(err, Error::DimensionMismatch { .. }));
}

#[tokio::test]
async fn cached_retrieval_skips_repeat_embedding_calls() {
	let calls = Arc::new(AtomicUsize::new(0));
	let service = default_service(Providers::new(
		Arc::new(SpyEmbedding { calls: calls.clone() }),
		Arc::new(FailingCompletion),
	));

	let first = service.retrieve(request("laptops")).await.expect("Retrieval must succeed.");

	// Query embedding plus one batched catalog call.
	assert_eq!(calls.load(Ordering::SeqCst), 2);

	let second = service.retrieve(request("laptops")).await.expect("Retrieval must succeed.");

	assert_eq!(calls.load(Ordering::SeqCst), 2);
	assert_eq!(first.len(), second.len());
}

#[tokio::test]
async fn cache_can_be_disabled() {
	let calls = Arc::new(AtomicUsize::new(0));
	let mut cfg = test_config();

	cfg.retrieval.cache.enabled = false;

	let service = build_service(
		cfg,
		Providers::new(
			Arc::new(SpyEmbedding { calls: calls.clone() }),
			Arc::new(FailingCompletion),
		),
	);

	service.retrieve(request("laptops")).await.expect("Retrieval must succeed.");
	service.retrieve(request("laptops")).await.expect("Retrieval must succeed.");

	assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn precomputed_catalog_embeddings_serve_later_retrievals() {
	let calls = Arc::new(AtomicUsize::new(0));
	let service = default_service(Providers::new(
		Arc::new(SpyEmbedding { calls: calls.clone() }),
		Arc::new(FailingCompletion),
	));
	let count =
		service.precompute_catalog_embeddings().await.expect("Precompute must succeed.");

	assert_eq!(count, 6);
	assert_eq!(calls.load(Ordering::SeqCst), 1);

	service.retrieve(request("laptops")).await.expect("Retrieval must succeed.");

	// Only the query needed embedding; catalog vectors came from the snapshot.
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}
