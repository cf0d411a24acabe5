use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use scout_service::{
	Error as ServiceError, ResearchRequest, ResearchResponse, RetrievalResult, RetrieveRequest,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/retrieve", post(retrieve))
		.route("/v1/research", post(research))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn retrieve(
	State(state): State<AppState>,
	Json(payload): Json<RetrieveRequest>,
) -> Result<Json<Vec<RetrievalResult>>, ApiError> {
	let response = state.service.retrieve(payload).await?;

	Ok(Json(response))
}

async fn research(
	State(state): State<AppState>,
	Json(payload): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>, ApiError> {
	let response = state.service.research(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let status = match &err {
			ServiceError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
			ServiceError::EmbeddingUnavailable { .. } => StatusCode::BAD_GATEWAY,
			ServiceError::DimensionMismatch { .. } | ServiceError::Catalog { .. } =>
				StatusCode::INTERNAL_SERVER_ERROR,
		};

		Self { status, message: err.to_string() }
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(ErrorBody { error: self.message })).into_response()
	}
}
